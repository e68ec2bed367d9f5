use nalgebra::Vector3;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Single-particle scattering amplitude as a function of momentum transfer.
///
/// The variant set is closed: grazing-incidence evaluation feeds complex
/// momentum components into the amplitude, so every shape here must have an
/// analytic continuation to complex q.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FormFactor {
    /// Full sphere of the given radius, resting on the layer bottom.
    Sphere { radius: f64 },
    /// Rectangular box with edges along the lab axes.
    Box { length: f64, width: f64, height: f64 },
}

/// sin(x)/x continued to complex argument.
fn sinc(x: Complex64) -> Complex64 {
    if x.norm() < 1e-12 {
        Complex64::new(1.0, 0.0)
    } else {
        x.sin() / x
    }
}

impl FormFactor {
    /// Scattering amplitude at momentum transfer q. Normalized so that
    /// evaluate(0) equals the particle volume.
    pub fn evaluate(&self, q: Vector3<Complex64>) -> Complex64 {
        match *self {
            FormFactor::Sphere { radius } => {
                let q_mag = (q.x * q.x + q.y * q.y + q.z * q.z).sqrt();
                let qr = q_mag * radius;
                let volume = self.volume();
                if qr.norm() < 1e-8 {
                    return Complex64::new(volume, 0.0);
                }
                // Center-of-sphere phase: the sphere sits on the layer bottom.
                let phase = (Complex64::i() * q.z * radius).exp();
                3.0 * volume * (qr.sin() - qr * qr.cos()) / (qr * qr * qr) * phase
            }
            FormFactor::Box {
                length,
                width,
                height,
            } => {
                let volume = self.volume();
                let phase = (Complex64::i() * q.z * (height / 2.0)).exp();
                volume
                    * sinc(q.x * (length / 2.0))
                    * sinc(q.y * (width / 2.0))
                    * sinc(q.z * (height / 2.0))
                    * phase
            }
        }
    }

    pub fn volume(&self) -> f64 {
        match *self {
            FormFactor::Sphere { radius } => 4.0 * PI * radius.powi(3) / 3.0,
            FormFactor::Box {
                length,
                width,
                height,
            } => length * width * height,
        }
    }

    /// Vertical extent of the particle.
    pub fn total_height(&self) -> f64 {
        match *self {
            FormFactor::Sphere { radius } => 2.0 * radius,
            FormFactor::Box { height, .. } => height,
        }
    }

    /// Horizontal cross-section area at height z above the particle bottom.
    /// Used for graded-density material averaging.
    pub fn cross_section(&self, z: f64) -> f64 {
        match *self {
            FormFactor::Sphere { radius } => {
                if z < 0.0 || z > 2.0 * radius {
                    0.0
                } else {
                    let dz = z - radius;
                    PI * (radius * radius - dz * dz)
                }
            }
            FormFactor::Box { length, width, height } => {
                if z < 0.0 || z > height {
                    0.0
                } else {
                    length * width
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn real_q(x: f64, y: f64, z: f64) -> Vector3<Complex64> {
        Vector3::new(
            Complex64::new(x, 0.0),
            Complex64::new(y, 0.0),
            Complex64::new(z, 0.0),
        )
    }

    #[test]
    fn forward_amplitude_equals_volume() {
        let sphere = FormFactor::Sphere { radius: 10.0 };
        let ff = sphere.evaluate(real_q(0.0, 0.0, 0.0));
        assert!((ff.re - sphere.volume()).abs() < 1e-6);
        assert!(ff.im.abs() < 1e-12);

        let cuboid = FormFactor::Box {
            length: 20.0,
            width: 10.0,
            height: 5.0,
        };
        let ff = cuboid.evaluate(real_q(0.0, 0.0, 0.0));
        assert!((ff.re - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn sphere_amplitude_decays_at_large_q() {
        let sphere = FormFactor::Sphere { radius: 10.0 };
        let small = sphere.evaluate(real_q(0.01, 0.0, 0.0)).norm();
        let large = sphere.evaluate(real_q(1.0, 0.0, 0.0)).norm();
        assert!(small > large);
    }

    #[test]
    fn sphere_cross_section_peaks_at_equator() {
        let sphere = FormFactor::Sphere { radius: 10.0 };
        let equator = sphere.cross_section(10.0);
        assert!((equator - PI * 100.0).abs() < 1e-9);
        assert!(sphere.cross_section(1.0) < equator);
        assert_eq!(sphere.cross_section(25.0), 0.0);
    }

    #[test]
    fn box_cross_section_is_constant_inside() {
        let b = FormFactor::Box {
            length: 4.0,
            width: 3.0,
            height: 2.0,
        };
        assert_eq!(b.cross_section(0.5), 12.0);
        assert_eq!(b.cross_section(1.9), 12.0);
        assert_eq!(b.cross_section(2.5), 0.0);
    }

    #[test]
    fn amplitude_is_finite_for_complex_qz() {
        let sphere = FormFactor::Sphere { radius: 10.0 };
        let q = Vector3::new(
            Complex64::new(0.01, 0.0),
            Complex64::new(0.0, 0.0),
            Complex64::new(0.05, 0.002),
        );
        let ff = sphere.evaluate(q);
        assert!(ff.re.is_finite() && ff.im.is_finite());
    }
}
