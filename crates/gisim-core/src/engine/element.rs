use crate::core::instrument::{Beam, SphericalDetector};
use nalgebra::{Vector2, Vector3};
use num_complex::Complex64;
use std::f64::consts::PI;

/// One detector pixel of a simulation run: incident and scattered directions,
/// solid-angle weight, and a single intensity accumulator. Created before the
/// parallel phase; written only by the worker that owns its partition.
#[derive(Debug, Clone)]
pub struct SimulationElement {
    pub wavelength: f64,
    pub alpha_i: f64,
    pub phi_i: f64,
    pub alpha_f: f64,
    pub phi_f: f64,
    /// Solid angle of the pixel times the beam intensity.
    pub weight: f64,
    /// Incident spin state for polarized runs.
    pub beam_spinor: Vector2<Complex64>,
    intensity: f64,
}

impl SimulationElement {
    pub fn new(
        wavelength: f64,
        alpha_i: f64,
        phi_i: f64,
        alpha_f: f64,
        phi_f: f64,
        weight: f64,
    ) -> Self {
        Self {
            wavelength,
            alpha_i,
            phi_i,
            alpha_f,
            phi_f,
            weight,
            beam_spinor: Vector2::new(Complex64::new(1.0, 0.0), Complex64::new(0.0, 0.0)),
            intensity: 0.0,
        }
    }

    pub fn wavenumber(&self) -> f64 {
        2.0 * PI / self.wavelength
    }

    /// Incident wavevector; travels downward (negative z).
    pub fn k_i(&self) -> Vector3<f64> {
        let k0 = self.wavenumber();
        Vector3::new(
            k0 * self.alpha_i.cos() * self.phi_i.cos(),
            k0 * self.alpha_i.cos() * self.phi_i.sin(),
            -k0 * self.alpha_i.sin(),
        )
    }

    /// Mean scattered wavevector; travels upward (positive z).
    pub fn k_f(&self) -> Vector3<f64> {
        let k0 = self.wavenumber();
        Vector3::new(
            k0 * self.alpha_f.cos() * self.phi_f.cos(),
            k0 * self.alpha_f.cos() * self.phi_f.sin(),
            k0 * self.alpha_f.sin(),
        )
    }

    /// In-plane momentum transfer (qx, qy).
    pub fn q_parallel(&self) -> (f64, f64) {
        let ki = self.k_i();
        let kf = self.k_f();
        (kf.x - ki.x, kf.y - ki.y)
    }

    #[inline]
    pub fn add_intensity(&mut self, contribution: f64) {
        self.intensity += contribution;
    }

    pub fn intensity(&self) -> f64 {
        self.intensity
    }
}

/// Expands beam + detector into the flat element sequence the dispatcher
/// partitions. Row-major over (alpha_f, phi_f).
pub fn generate_elements(beam: &Beam, detector: &SphericalDetector) -> Vec<SimulationElement> {
    let spinor = beam_spinor(beam);
    let mut elements = Vec::with_capacity(detector.n_pixels());
    for i_alpha in 0..detector.n_alpha {
        for i_phi in 0..detector.n_phi {
            let (phi_f, alpha_f, d_phi, d_alpha) = detector.bin(i_phi, i_alpha);
            let solid_angle = d_phi * d_alpha * alpha_f.cos().abs();
            let mut element = SimulationElement::new(
                beam.wavelength,
                beam.alpha_i,
                beam.phi_i,
                alpha_f,
                phi_f,
                beam.intensity * solid_angle,
            );
            element.beam_spinor = spinor;
            elements.push(element);
        }
    }
    elements
}

/// Spin-1/2 state pointing along the beam polarization direction; defaults to
/// spin-up for unpolarized beams.
pub(crate) fn beam_spinor(beam: &Beam) -> Vector2<Complex64> {
    match beam.polarization {
        None => Vector2::new(Complex64::new(1.0, 0.0), Complex64::new(0.0, 0.0)),
        Some(dir) => {
            let n = dir.norm();
            if n == 0.0 {
                return Vector2::new(Complex64::new(1.0, 0.0), Complex64::new(0.0, 0.0));
            }
            let (x, y, z) = (dir.x / n, dir.y / n, dir.z / n);
            let theta = z.acos();
            let phi = y.atan2(x);
            Vector2::new(
                Complex64::new((theta / 2.0).cos(), 0.0),
                Complex64::from_polar((theta / 2.0).sin(), phi),
            )
        }
    }
}
