//! # GISim Core Library
//!
//! A library for simulating grazing-incidence small-angle scattering from
//! decorated multilayer samples, within the distorted-wave Born
//! approximation.
//!
//! ## Architectural Philosophy
//!
//! The library is designed with a strict three-layer architecture to keep
//! the sample description, the numerical engine, and the user-facing runs
//! cleanly separated.
//!
//! - **[`core`]: The Foundation.** Stateless data models for the sample
//!   (`MultiLayer`, `ParticleLayout`), pure mathematical descriptions of
//!   scatterers (`FormFactor`, `InterferenceFunction`), optical constants,
//!   and the instrument geometry.
//!
//! - **[`engine`]: The Logic Core.** The stateful computation layer: sample
//!   flattening into slices (`ProcessedSample`), the scalar and spin-matrix
//!   Fresnel solvers with per-wavevector memoization (`FresnelMap`), the
//!   coherence strategies, and the partitioned dispatcher.
//!
//! - **[`workflows`]: The Public API.** The highest-level, user-facing layer
//!   that ties `engine` and `core` together into complete simulations, from
//!   sample and beam definition to per-pixel intensities or a reflectivity
//!   curve.

pub mod core;
pub mod engine;
pub mod workflows;
