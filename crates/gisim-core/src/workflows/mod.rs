//! # Workflows Module
//!
//! This module provides the high-level simulation entry points that tie the
//! sample model and the scattering engine together into complete runs.
//!
//! ## Overview
//!
//! Workflows are the top-level API for users of the library. Each one takes a
//! sample description and an instrument, drives the engine through its phases
//! (sample processing, coefficient computation, partitioned evaluation), and
//! returns an organized result with a final run status.
//!
//! - **Scattering Workflow** ([`scatter`]) - Full grazing-incidence
//!   off-specular simulation over a two-dimensional detector.
//! - **Specular Workflow** ([`specular`]) - Reflectivity scan over a grid of
//!   incidence angles.

pub mod scatter;
pub mod specular;
