use crate::engine::error::EngineError;
use crate::engine::slices::{Slice, complex_sqrt_upper};
use nalgebra::{Matrix2, Vector3};
use num_complex::Complex64;

/// 2 m_n mu_n / hbar^2, in 1/(angstrom^2 tesla): converts magnetic induction
/// into the Zeeman shift of kz^2 for the two neutron spin eigenmodes.
const MAGNETIC_COUPLING: f64 = 2.9101e-5;

type CMatrix2 = Matrix2<Complex64>;

/// Spin-space reflection/transmission amplitudes of one slice, referenced to
/// the slice's top interface.
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixRtCoefficients {
    /// Vertical wavevectors of the two spin eigenmodes, Im >= 0.
    pub kz_eigen: [Complex64; 2],
    /// Downward amplitude operator acting on the incident spinor.
    pub t: CMatrix2,
    /// Upward amplitude operator acting on the incident spinor.
    pub r: CMatrix2,
}

fn identity() -> CMatrix2 {
    CMatrix2::identity()
}

/// b . sigma for a real unit vector b.
fn pauli_dot(b: Vector3<f64>) -> CMatrix2 {
    CMatrix2::new(
        Complex64::new(b.z, 0.0),
        Complex64::new(b.x, -b.y),
        Complex64::new(b.x, b.y),
        Complex64::new(-b.z, 0.0),
    )
}

/// Spectral decomposition of one slice's squared vertical wavevector
/// operator: kz^2 = a I + c (b . sigma), diagonalized by the projectors
/// (I +/- b.sigma)/2.
struct SliceModes {
    kz_plus: Complex64,
    kz_minus: Complex64,
    projector_plus: CMatrix2,
    projector_minus: CMatrix2,
}

impl SliceModes {
    fn new(a: Complex64, b_field: Vector3<f64>) -> Self {
        let b_norm = b_field.norm();
        if b_norm == 0.0 {
            let kz = complex_sqrt_upper(a);
            let half = identity() * Complex64::new(0.5, 0.0);
            return Self {
                kz_plus: kz,
                kz_minus: kz,
                projector_plus: half,
                projector_minus: half,
            };
        }
        let c = MAGNETIC_COUPLING * b_norm;
        let b_sigma = pauli_dot(b_field / b_norm);
        let half = Complex64::new(0.5, 0.0);
        Self {
            kz_plus: complex_sqrt_upper(a + c),
            kz_minus: complex_sqrt_upper(a - c),
            projector_plus: (identity() + b_sigma) * half,
            projector_minus: (identity() - b_sigma) * half,
        }
    }

    /// The kz operator K = kz+ P+ + kz- P-.
    fn kz_matrix(&self) -> CMatrix2 {
        self.projector_plus * self.kz_plus + self.projector_minus * self.kz_minus
    }

    /// exp(s i K t) for s = +/- 1.
    fn phase(&self, thickness: f64, sign: f64) -> CMatrix2 {
        let e_plus = (Complex64::i() * self.kz_plus * (sign * thickness)).exp();
        let e_minus = (Complex64::i() * self.kz_minus * (sign * thickness)).exp();
        self.projector_plus * e_plus + self.projector_minus * e_minus
    }

    fn mean_kz(&self) -> Complex64 {
        (self.kz_plus + self.kz_minus) * Complex64::new(0.5, 0.0)
    }
}

/// Matrix generalization of the scalar interface recursion: the two spin
/// eigenmodes of every slice are resolved from its local induction
/// (magnetization plus applied field), and the interface matching mixes them
/// through the 2x2 kz operators.
pub fn compute_matrix(
    slices: &[Slice],
    k: Vector3<f64>,
    external_field: Vector3<f64>,
    invert_field: bool,
) -> Result<Vec<MatrixRtCoefficients>, EngineError> {
    if slices.is_empty() {
        return Err(EngineError::Configuration(
            "cannot compute Fresnel coefficients for an empty slice stack".into(),
        ));
    }
    if !(k.x.is_finite() && k.y.is_finite() && k.z.is_finite()) {
        return Err(EngineError::Numerical(format!(
            "non-finite wavevector ({}, {}, {})",
            k.x, k.y, k.z
        )));
    }

    let k0_sq = Complex64::new(k.norm_squared(), 0.0);
    let k_par_sq = Complex64::new(k.x * k.x + k.y * k.y, 0.0);
    let field_sign = if invert_field { -1.0 } else { 1.0 };

    let modes: Vec<SliceModes> = slices
        .iter()
        .map(|slice| {
            let a = slice.material.permittivity() * k0_sq - k_par_sq;
            SliceModes::new(a, field_sign * slice.b_field(external_field))
        })
        .collect();

    let n = slices.len();
    if n == 1 {
        return Ok(vec![MatrixRtCoefficients {
            kz_eigen: [modes[0].kz_plus, modes[0].kz_minus],
            t: identity(),
            r: CMatrix2::zeros(),
        }]);
    }

    let mut down = vec![CMatrix2::zeros(); n];
    let mut up = vec![CMatrix2::zeros(); n];
    down[n - 1] = identity();

    for j in (0..n - 1).rev() {
        let k_above = modes[j].kz_matrix();
        let k_below = modes[j + 1].kz_matrix();
        let k_above_inv = k_above.try_inverse().ok_or_else(|| {
            EngineError::Numerical(format!("singular kz operator in slice {j}"))
        })?;
        let ratio = k_above_inv * k_below;
        let half = Complex64::new(0.5, 0.0);
        let a_plus = (identity() + ratio) * half;
        let mut a_minus = (identity() - ratio) * half;
        if let Some(roughness) = slices[j + 1].top_roughness {
            let sigma_sq = roughness.sigma * roughness.sigma;
            let damping = (-2.0 * modes[j].mean_kz() * modes[j + 1].mean_kz() * sigma_sq).exp();
            a_minus *= damping;
        }
        let d_bottom = a_plus * down[j + 1] + a_minus * up[j + 1];
        let u_bottom = a_minus * down[j + 1] + a_plus * up[j + 1];

        down[j] = modes[j].phase(slices[j].thickness, -1.0) * d_bottom;
        up[j] = modes[j].phase(slices[j].thickness, 1.0) * u_bottom;
    }

    let incoming_inv = down[0].try_inverse().ok_or_else(|| {
        EngineError::Numerical("degenerate wave field: no transmitted solution".into())
    })?;

    Ok((0..n)
        .map(|j| MatrixRtCoefficients {
            kz_eigen: [modes[j].kz_plus, modes[j].kz_minus],
            t: down[j] * incoming_inv,
            r: up[j] * incoming_inv,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::material::Material;
    use crate::engine::fresnel::scalar::compute_scalar;

    fn slice(thickness: f64, material: Material) -> Slice {
        Slice {
            thickness,
            material,
            top_roughness: None,
        }
    }

    fn grazing_k(alpha: f64) -> Vector3<f64> {
        let k0 = 2.0 * std::f64::consts::PI / 1.54;
        Vector3::new(k0 * alpha.cos(), 0.0, -k0 * alpha.sin())
    }

    #[test]
    fn reduces_to_scalar_solver_for_zero_magnetization() {
        let slices = vec![
            slice(0.0, Material::vacuum()),
            slice(150.0, Material::from_delta_beta(7.1e-6, 9.0e-8)),
            slice(0.0, Material::from_delta_beta(7.6e-6, 1.73e-7)),
        ];
        let k = grazing_k(0.01);
        let scalar = compute_scalar(&slices, k).unwrap();
        let matrix = compute_matrix(&slices, k, Vector3::zeros(), false).unwrap();

        for (s, m) in scalar.iter().zip(matrix.iter()) {
            assert!((m.kz_eigen[0] - s.kz).norm() < 1e-10);
            assert!((m.t[(0, 0)] - s.t).norm() < 1e-9);
            assert!((m.r[(0, 0)] - s.r).norm() < 1e-9);
            assert!(m.t[(0, 1)].norm() < 1e-12);
            assert!(m.r[(1, 0)].norm() < 1e-12);
        }
    }

    #[test]
    fn magnetized_layer_splits_the_eigenmodes() {
        let magnetized = Material::from_delta_beta(2.26e-5, 2.9e-6)
            .with_magnetization(Vector3::new(0.0, 1.0, 0.0));
        let slices = vec![
            slice(0.0, Material::vacuum()),
            slice(100.0, magnetized),
            slice(0.0, Material::from_delta_beta(7.6e-6, 1.73e-7)),
        ];
        // A strong applied field makes the Zeeman splitting visible.
        let field = Vector3::new(0.0, 5e6, 0.0);
        let coeffs = compute_matrix(&slices, grazing_k(0.01), field, false).unwrap();
        let film = &coeffs[1];
        assert!((film.kz_eigen[0] - film.kz_eigen[1]).norm() > 1e-9);
    }

    #[test]
    fn field_inversion_flips_the_quantization_axis() {
        let magnetized = Material::from_delta_beta(2.26e-5, 2.9e-6)
            .with_magnetization(Vector3::new(0.0, 1.0, 0.0));
        let slices = vec![
            slice(0.0, Material::vacuum()),
            slice(100.0, magnetized),
            slice(0.0, Material::from_delta_beta(7.6e-6, 1.73e-7)),
        ];
        let field = Vector3::new(0.0, 5e6, 0.0);
        let normal = compute_matrix(&slices, grazing_k(0.01), field, false).unwrap();
        let inverted = compute_matrix(&slices, grazing_k(0.01), field, true).unwrap();

        // The eigenvalues a +/- c are labelled by the local field direction
        // and do not move; the spin operators pick up the axis flip.
        assert!((normal[1].kz_eigen[0] - inverted[1].kz_eigen[0]).norm() < 1e-12);
        assert!((normal[1].kz_eigen[1] - inverted[1].kz_eigen[1]).norm() < 1e-12);
        assert!((normal[0].r - inverted[0].r).norm() > 1e-12);
        // For an axis along y the flip conjugates the spin-mixing entries.
        assert!((normal[0].r[(0, 1)] + inverted[0].r[(0, 1)]).norm() < 1e-12);
    }

    #[test]
    fn unpolarized_reflectivity_stays_bounded() {
        let magnetized = Material::from_delta_beta(2.26e-5, 2.9e-6)
            .with_magnetization(Vector3::new(1.0, 0.0, 0.0));
        let slices = vec![
            slice(0.0, Material::vacuum()),
            slice(80.0, magnetized),
            slice(0.0, Material::from_delta_beta(7.6e-6, 1.73e-7)),
        ];
        let field = Vector3::new(0.0, 1e6, 0.0);
        let coeffs = compute_matrix(&slices, grazing_k(0.008), field, false).unwrap();
        let r = coeffs[0].r;
        let spin_up = nalgebra::Vector2::new(Complex64::new(1.0, 0.0), Complex64::new(0.0, 0.0));
        let reflected = r * spin_up;
        let intensity = reflected.x.norm_sqr() + reflected.y.norm_sqr();
        assert!(intensity <= 1.0 + 1e-9);
        assert!(intensity >= 0.0);
    }

    #[test]
    fn empty_stack_is_a_configuration_error() {
        let result = compute_matrix(&[], grazing_k(0.01), Vector3::zeros(), false);
        assert!(matches!(result, Err(EngineError::Configuration(_))));
    }
}
