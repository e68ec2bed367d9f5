use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Self-affine fractal description of an interface: rms height sigma,
/// Hurst exponent, and lateral correlation length, all in the sample's
/// length unit (angstrom by convention).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Roughness {
    pub sigma: f64,
    pub hurst: f64,
    pub lateral_corr_length: f64,
}

impl Roughness {
    pub fn new(sigma: f64, hurst: f64, lateral_corr_length: f64) -> Self {
        Self {
            sigma,
            hurst,
            lateral_corr_length,
        }
    }

    /// Power spectrum of the height-height correlation at in-plane momentum k,
    /// following the k-correlation (self-affine) model.
    pub fn spectral_function(&self, k: f64) -> f64 {
        let h = self.hurst;
        let xi = self.lateral_corr_length;
        let prefactor = 4.0 * PI * h * self.sigma * self.sigma * xi * xi;
        prefactor / (1.0 + k * k * xi * xi).powf(1.0 + h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spectral_function_decays_with_momentum() {
        let r = Roughness::new(5.0, 0.5, 200.0);
        let low = r.spectral_function(1e-4);
        let high = r.spectral_function(1e-1);
        assert!(low > high);
        assert!(high > 0.0);
    }

    #[test]
    fn spectral_function_scales_with_sigma_squared() {
        let a = Roughness::new(2.0, 0.7, 100.0);
        let b = Roughness::new(4.0, 0.7, 100.0);
        let k = 1e-3;
        assert!((b.spectral_function(k) / a.spectral_function(k) - 4.0).abs() < 1e-12);
    }
}
