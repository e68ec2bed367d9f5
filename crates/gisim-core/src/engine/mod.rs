//! The computation core: flattening the sample into slices, solving the
//! boundary-value problem for wave propagation, combining particle
//! scattering with structural interference, and dispatching the per-pixel
//! evaluation over workers.

pub mod config;
pub mod dispatch;
pub mod element;
pub mod error;
pub mod fresnel;
pub mod layer;
pub mod progress;
pub mod roughness;
pub mod slices;
pub mod state;
pub mod strategy;
