use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Structural factor encoding positional correlations between particles in a
/// layout. Evaluated at the in-plane momentum transfer; multiplies the
/// coherent part of the scattered intensity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum InterferenceFunction {
    /// Uncorrelated positions: S(q) = 1.
    None,
    /// Ideal 1D paracrystal along the in-plane direction: chains of particles
    /// with Gaussian-distributed nearest-neighbor distance.
    RadialParacrystal {
        peak_distance: f64,
        width: f64,
        damping_length: f64,
    },
    /// Finite 2D lattice: sum over reciprocal-lattice peaks with Gaussian
    /// broadening set by the position variance of the lattice sites.
    Lattice2d {
        length_1: f64,
        length_2: f64,
        /// Angle between the basis vectors, radians.
        angle: f64,
        /// In-plane positional disorder of lattice sites.
        position_variance: f64,
    },
}

impl InterferenceFunction {
    /// Dimensionality of the positional order this function describes.
    pub fn dimension(&self) -> u8 {
        match self {
            InterferenceFunction::None => 0,
            InterferenceFunction::RadialParacrystal { .. } => 1,
            InterferenceFunction::Lattice2d { .. } => 2,
        }
    }

    /// Evaluates the interference factor at in-plane momentum transfer
    /// (qx, qy). Finite and non-negative for non-degenerate parameters;
    /// degenerate widths and angles are rejected before evaluation.
    pub fn evaluate(&self, qx: f64, qy: f64) -> f64 {
        match *self {
            InterferenceFunction::None => 1.0,
            InterferenceFunction::RadialParacrystal {
                peak_distance,
                width,
                damping_length,
            } => {
                let q_par = (qx * qx + qy * qy).sqrt();
                // |FT of the Gaussian neighbor-distance distribution|, with an
                // overall exponential damping of long-range order.
                let mut phi_abs = (-0.5 * q_par * q_par * width * width).exp();
                if damping_length > 0.0 {
                    phi_abs *= (-peak_distance / damping_length).exp();
                }
                let cos_term = (q_par * peak_distance).cos();
                let denominator =
                    1.0 - 2.0 * phi_abs * cos_term + phi_abs * phi_abs;
                if denominator < 1e-30 {
                    (1.0 + phi_abs) / (1.0 - phi_abs)
                } else {
                    (1.0 - phi_abs * phi_abs) / denominator
                }
            }
            InterferenceFunction::Lattice2d {
                length_1,
                length_2,
                angle,
                position_variance,
            } => {
                lattice_sum(qx, qy, length_1, length_2, angle, position_variance)
            }
        }
    }
}

/// Reciprocal-space peak sum for the finite 2D lattice. Peaks within a fixed
/// cutoff around (qx, qy) contribute a normalized Gaussian each, damped by
/// the site Debye-Waller factor.
fn lattice_sum(
    qx: f64,
    qy: f64,
    length_1: f64,
    length_2: f64,
    angle: f64,
    position_variance: f64,
) -> f64 {
    let sin_a = angle.sin();
    // Reciprocal basis of the (a1, a2) in-plane lattice.
    let b1 = (
        2.0 * PI / length_1,
        -2.0 * PI / (length_1 * sin_a) * angle.cos(),
    );
    let b2 = (0.0, 2.0 * PI / (length_2 * sin_a));

    let q2 = qx * qx + qy * qy;
    let dw = (-q2 * position_variance).exp();
    // Peak width from the site disorder, floored to keep peaks integrable.
    let peak_sigma = (position_variance.sqrt() / (length_1 * length_2).sqrt())
        .max(1e-3 * (b1.0.hypot(b1.1)));

    let order_cutoff = 8;
    let mut total = 0.0;
    for h in -order_cutoff..=order_cutoff {
        for k in -order_cutoff..=order_cutoff {
            let gx = h as f64 * b1.0 + k as f64 * b2.0;
            let gy = h as f64 * b1.1 + k as f64 * b2.1;
            let dx = qx - gx;
            let dy = qy - gy;
            let d2 = dx * dx + dy * dy;
            total += (-0.5 * d2 / (peak_sigma * peak_sigma)).exp();
        }
    }
    let cell_area = length_1 * length_2 * sin_a;
    let gauss_norm = 1.0 / (2.0 * PI * peak_sigma * peak_sigma);
    let bragg = (2.0 * PI).powi(2) / cell_area * gauss_norm * total;
    (1.0 - dw) + dw * bragg
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_is_identity() {
        let f = InterferenceFunction::None;
        assert_eq!(f.evaluate(0.0, 0.0), 1.0);
        assert_eq!(f.evaluate(0.3, -0.1), 1.0);
        assert_eq!(f.dimension(), 0);
    }

    #[test]
    fn paracrystal_peaks_at_structure_period() {
        let f = InterferenceFunction::RadialParacrystal {
            peak_distance: 100.0,
            width: 5.0,
            damping_length: 0.0,
        };
        let q_peak = 2.0 * PI / 100.0;
        let on_peak = f.evaluate(q_peak, 0.0);
        let off_peak = f.evaluate(q_peak * 1.5, 0.0);
        assert!(on_peak > off_peak);
        assert!(on_peak > 1.0);
        assert_eq!(f.dimension(), 1);
    }

    #[test]
    fn paracrystal_tends_to_one_at_large_q() {
        let f = InterferenceFunction::RadialParacrystal {
            peak_distance: 100.0,
            width: 5.0,
            damping_length: 0.0,
        };
        let s = f.evaluate(10.0, 0.0);
        assert!((s - 1.0).abs() < 1e-6);
    }

    #[test]
    fn lattice_is_finite_and_positive() {
        let f = InterferenceFunction::Lattice2d {
            length_1: 80.0,
            length_2: 80.0,
            angle: PI / 2.0,
            position_variance: 4.0,
        };
        for &(qx, qy) in &[(0.0, 0.0), (0.05, 0.0), (0.1, 0.1)] {
            let s = f.evaluate(qx, qy);
            assert!(s.is_finite());
            assert!(s >= 0.0);
        }
        assert_eq!(f.dimension(), 2);
    }
}
