use nalgebra::Vector3;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

/// Optical constants (delta, beta) at the Cu K-alpha wavelength (1.5406 A),
/// for the materials that ship with the engine. The refractive index follows
/// the X-ray convention n = 1 - delta + i*beta.
static OPTICAL_CONSTANTS: phf::Map<&'static str, (f64, f64)> = phf::phf_map! {
    "vacuum" => (0.0, 0.0),
    "Si" => (7.6e-6, 1.73e-7),
    "SiO2" => (7.1e-6, 9.0e-8),
    "Ge" => (1.45e-5, 4.0e-7),
    "Au" => (2.99e-5, 2.21e-6),
    "Ag" => (2.98e-5, 2.67e-6),
    "Cu" => (2.45e-5, 5.05e-7),
    "Fe" => (2.26e-5, 2.9e-6),
    "Ni" => (2.55e-5, 4.3e-7),
    "Cr" => (2.12e-5, 2.1e-6),
    "Ti" => (1.39e-5, 9.3e-7),
    "Permalloy" => (2.4e-5, 2.0e-6),
};

/// A homogeneous medium: complex refractive index plus an optional
/// magnetization vector (A/m) for polarized-beam calculations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub refractive_index: Complex64,
    pub magnetization: Option<Vector3<f64>>,
}

impl Material {
    pub fn vacuum() -> Self {
        Self {
            refractive_index: Complex64::new(1.0, 0.0),
            magnetization: None,
        }
    }

    /// Builds a material from the X-ray optical constants delta and beta.
    pub fn from_delta_beta(delta: f64, beta: f64) -> Self {
        Self {
            refractive_index: Complex64::new(1.0 - delta, beta),
            magnetization: None,
        }
    }

    /// Looks up a built-in material by name (Cu K-alpha constants).
    pub fn from_name(name: &str) -> Option<Self> {
        OPTICAL_CONSTANTS
            .get(name)
            .map(|&(delta, beta)| Self::from_delta_beta(delta, beta))
    }

    pub fn with_magnetization(mut self, magnetization: Vector3<f64>) -> Self {
        self.magnetization = Some(magnetization);
        self
    }

    pub fn is_magnetic(&self) -> bool {
        self.magnetization
            .map(|m| m.norm() > 0.0)
            .unwrap_or(false)
    }

    /// n^2, the quantity that enters the wave equation.
    pub fn permittivity(&self) -> Complex64 {
        self.refractive_index * self.refractive_index
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::vacuum()
    }
}
