//! Stateless data model: materials, roughness, particles, and the sample
//! description consumed read-only by the engine.

pub mod formfactor;
pub mod instrument;
pub mod interference;
pub mod material;
pub mod roughness;
pub mod sample;
