use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Monochromatic incident beam in grazing geometry. Angles in radians,
/// wavelength in the sample's length unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Beam {
    pub wavelength: f64,
    /// Grazing angle of incidence (positive, measured from the surface).
    pub alpha_i: f64,
    /// Azimuth of incidence.
    pub phi_i: f64,
    pub intensity: f64,
    /// Polarization direction for polarized (magnetic) runs; `None` means an
    /// unpolarized or scalar run.
    pub polarization: Option<Vector3<f64>>,
}

impl Beam {
    pub fn new(wavelength: f64, alpha_i: f64) -> Self {
        Self {
            wavelength,
            alpha_i,
            phi_i: 0.0,
            intensity: 1.0,
            polarization: None,
        }
    }

    pub fn with_polarization(mut self, direction: Vector3<f64>) -> Self {
        self.polarization = Some(direction);
        self
    }
}

/// Spherical detector: a rectangular grid of angular bins (phi, alpha_f).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SphericalDetector {
    pub n_phi: usize,
    pub phi_min: f64,
    pub phi_max: f64,
    pub n_alpha: usize,
    pub alpha_min: f64,
    pub alpha_max: f64,
}

impl SphericalDetector {
    pub fn new(
        n_phi: usize,
        phi_min: f64,
        phi_max: f64,
        n_alpha: usize,
        alpha_min: f64,
        alpha_max: f64,
    ) -> Self {
        Self {
            n_phi,
            phi_min,
            phi_max,
            n_alpha,
            alpha_min,
            alpha_max,
        }
    }

    pub fn n_pixels(&self) -> usize {
        self.n_phi * self.n_alpha
    }

    /// Center of bin (i_phi, i_alpha) and its angular bin sizes.
    pub fn bin(&self, i_phi: usize, i_alpha: usize) -> (f64, f64, f64, f64) {
        let d_phi = (self.phi_max - self.phi_min) / self.n_phi as f64;
        let d_alpha = (self.alpha_max - self.alpha_min) / self.n_alpha as f64;
        let phi = self.phi_min + (i_phi as f64 + 0.5) * d_phi;
        let alpha = self.alpha_min + (i_alpha as f64 + 0.5) * d_alpha;
        (phi, alpha, d_phi, d_alpha)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detector_pixel_count_is_grid_product() {
        let det = SphericalDetector::new(100, -0.05, 0.05, 50, 0.0, 0.04);
        assert_eq!(det.n_pixels(), 5000);
    }

    #[test]
    fn bin_centers_span_the_angular_ranges() {
        let det = SphericalDetector::new(2, 0.0, 1.0, 2, 0.0, 2.0);
        let (phi0, alpha0, d_phi, d_alpha) = det.bin(0, 0);
        assert!((phi0 - 0.25).abs() < 1e-12);
        assert!((alpha0 - 0.5).abs() < 1e-12);
        assert!((d_phi - 0.5).abs() < 1e-12);
        assert!((d_alpha - 1.0).abs() < 1e-12);
        let (phi1, alpha1, _, _) = det.bin(1, 1);
        assert!((phi1 - 0.75).abs() < 1e-12);
        assert!((alpha1 - 1.5).abs() < 1e-12);
    }
}
