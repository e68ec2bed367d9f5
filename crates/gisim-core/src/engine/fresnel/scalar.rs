use crate::engine::error::EngineError;
use crate::engine::slices::{Slice, complex_sqrt_upper};
use nalgebra::Vector3;
use num_complex::Complex64;

/// Reflection/transmission amplitudes of one slice for one in-plane
/// wavevector, referenced to the slice's top interface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalarRtCoefficients {
    /// Vertical wavevector component inside the slice, Im(kz) >= 0.
    pub kz: Complex64,
    /// Downward (transmitted) amplitude.
    pub t: Complex64,
    /// Upward (reflected) amplitude.
    pub r: Complex64,
}

impl ScalarRtCoefficients {
    /// Total reflection amplitude of the stack is the upward amplitude in
    /// the ambient half-space.
    pub fn reflection(&self) -> Complex64 {
        self.r
    }
}

/// Computes per-slice amplitudes for a plane wave incident from the ambient
/// half-space, by the recursive interface-matrix method (Parratt scheme)
/// accumulated from the substrate upward. Rough interfaces damp the mixing
/// term with the Nevot-Croce factor.
pub fn compute_scalar(
    slices: &[Slice],
    k: Vector3<f64>,
) -> Result<Vec<ScalarRtCoefficients>, EngineError> {
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

    let kz: Vec<Complex64> = slices
        .iter()
        .map(|slice| complex_sqrt_upper(slice.material.permittivity() * k0_sq - k_par_sq))
        .collect();

    let n = slices.len();
    if n == 1 {
        return Ok(vec![ScalarRtCoefficients {
            kz: kz[0],
            t: Complex64::new(1.0, 0.0),
            r: Complex64::new(0.0, 0.0),
        }]);
    }

    // Downward/upward amplitudes at the top of each slice, built from the
    // substrate (d = 1, u = 0) upward and normalized at the end.
    let mut down = vec![Complex64::new(0.0, 0.0); n];
    let mut up = vec![Complex64::new(0.0, 0.0); n];
    down[n - 1] = Complex64::new(1.0, 0.0);

    for j in (0..n - 1).rev() {
        let kz_a = kz[j];
        let kz_b = kz[j + 1];
        if kz_a.norm() == 0.0 {
            return Err(EngineError::Numerical(format!(
                "vanishing vertical wavevector in slice {j}"
            )));
        }
        let ratio = kz_b / kz_a;
        let half = Complex64::new(0.5, 0.0);
        let a_plus = half * (Complex64::new(1.0, 0.0) + ratio);
        let mut a_minus = half * (Complex64::new(1.0, 0.0) - ratio);
        if let Some(roughness) = slices[j + 1].top_roughness {
            let sigma_sq = roughness.sigma * roughness.sigma;
            a_minus *= (-2.0 * kz_a * kz_b * sigma_sq).exp();
        }
        let d_bottom = a_plus * down[j + 1] + a_minus * up[j + 1];
        let u_bottom = a_minus * down[j + 1] + a_plus * up[j + 1];

        let phase = Complex64::i() * kz_a * slices[j].thickness;
        down[j] = d_bottom * (-phase).exp();
        up[j] = u_bottom * phase.exp();
    }

    let incoming = down[0];
    if incoming.norm() == 0.0 || !incoming.is_finite() {
        return Err(EngineError::Numerical(
            "degenerate wave field: no transmitted solution".into(),
        ));
    }

    Ok((0..n)
        .map(|j| ScalarRtCoefficients {
            kz: kz[j],
            t: down[j] / incoming,
            r: up[j] / incoming,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::material::Material;
    use crate::core::roughness::Roughness;

    fn slice(thickness: f64, material: Material) -> Slice {
        Slice {
            thickness,
            material,
            top_roughness: None,
        }
    }

    fn grazing_k(wavelength: f64, alpha: f64) -> Vector3<f64> {
        let k0 = 2.0 * std::f64::consts::PI / wavelength;
        Vector3::new(k0 * alpha.cos(), 0.0, -k0 * alpha.sin())
    }

    /// Critical angle for a non-absorbing medium with n = 1 - delta.
    fn critical_angle(delta: f64) -> f64 {
        (2.0 * delta).sqrt()
    }

    #[test]
    fn total_external_reflection_below_critical_angle() {
        let delta = 7.6e-6;
        let slices = vec![
            slice(0.0, Material::vacuum()),
            slice(0.0, Material::from_delta_beta(delta, 0.0)),
        ];
        for fraction in [0.3, 0.6, 0.9] {
            let alpha = critical_angle(delta) * fraction;
            let coeffs = compute_scalar(&slices, grazing_k(1.54, alpha)).unwrap();
            let r = coeffs[0].reflection().norm();
            assert!(
                (r - 1.0).abs() < 1e-10,
                "|R| = {r} at alpha = {alpha}"
            );
        }
    }

    #[test]
    fn reflectivity_falls_off_above_critical_angle() {
        let delta = 7.6e-6;
        let slices = vec![
            slice(0.0, Material::vacuum()),
            slice(0.0, Material::from_delta_beta(delta, 1.73e-7)),
        ];
        let alpha_c = critical_angle(delta);
        let r1 = compute_scalar(&slices, grazing_k(1.54, 2.0 * alpha_c)).unwrap()[0]
            .reflection()
            .norm();
        let r2 = compute_scalar(&slices, grazing_k(1.54, 4.0 * alpha_c)).unwrap()[0]
            .reflection()
            .norm();
        assert!(r1 < 1.0);
        assert!(r2 < r1);
    }

    #[test]
    fn single_interface_matches_closed_form_fresnel() {
        let n_sub = Complex64::new(1.0 - 1e-5, 1e-7);
        let slices = vec![
            slice(0.0, Material::vacuum()),
            slice(0.0, Material::from_delta_beta(1e-5, 1e-7)),
        ];
        let alpha: f64 = 0.01;
        let k = grazing_k(1.54, alpha);
        let k0 = k.norm();

        let kz_i = Complex64::new(k0 * alpha.sin(), 0.0);
        let kz_t = complex_sqrt_upper(
            n_sub * n_sub * k0 * k0 - Complex64::new(k0 * alpha.cos(), 0.0).powi(2),
        );
        let expected = (kz_i - kz_t) / (kz_i + kz_t);

        let coeffs = compute_scalar(&slices, k).unwrap();
        assert!((coeffs[0].reflection() - expected).norm() < 1e-10);
    }

    #[test]
    fn substrate_amplitudes_are_pure_transmission() {
        let slices = vec![
            slice(0.0, Material::vacuum()),
            slice(200.0, Material::from_delta_beta(7.1e-6, 9.0e-8)),
            slice(0.0, Material::from_delta_beta(7.6e-6, 1.73e-7)),
        ];
        let coeffs = compute_scalar(&slices, grazing_k(1.54, 0.01)).unwrap();
        let substrate = coeffs.last().unwrap();
        assert!(substrate.r.norm() < 1e-12);
        assert!(substrate.t.norm() > 0.0);
    }

    #[test]
    fn ambient_transmission_is_unity() {
        let slices = vec![
            slice(0.0, Material::vacuum()),
            slice(120.0, Material::from_delta_beta(2.99e-5, 2.21e-6)),
            slice(0.0, Material::from_delta_beta(7.6e-6, 1.73e-7)),
        ];
        let coeffs = compute_scalar(&slices, grazing_k(1.54, 0.02)).unwrap();
        assert!((coeffs[0].t - Complex64::new(1.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn thin_film_produces_kiessig_oscillations() {
        let slices = vec![
            slice(0.0, Material::vacuum()),
            slice(300.0, Material::from_delta_beta(7.1e-6, 9.0e-8)),
            slice(0.0, Material::from_delta_beta(7.6e-6, 1.73e-7)),
        ];
        // Reflectivity above the critical angle is non-monotonic for a film.
        let alphas: Vec<f64> = (0..200).map(|i| 0.005 + 1e-4 * i as f64).collect();
        let r: Vec<f64> = alphas
            .iter()
            .map(|&a| {
                compute_scalar(&slices, grazing_k(1.54, a)).unwrap()[0]
                    .reflection()
                    .norm_sqr()
            })
            .collect();
        let non_monotonic = r.windows(3).any(|w| w[1] > w[0] && w[1] > w[2]);
        assert!(non_monotonic);
    }

    #[test]
    fn roughness_damps_reflectivity() {
        let smooth = vec![
            slice(0.0, Material::vacuum()),
            slice(0.0, Material::from_delta_beta(7.6e-6, 1.73e-7)),
        ];
        let mut rough = smooth.clone();
        rough[1].top_roughness = Some(Roughness::new(8.0, 0.5, 500.0));

        let k = grazing_k(1.54, 0.012);
        let r_smooth = compute_scalar(&smooth, k).unwrap()[0].reflection().norm();
        let r_rough = compute_scalar(&rough, k).unwrap()[0].reflection().norm();
        assert!(r_rough < r_smooth);
    }

    #[test]
    fn empty_stack_is_a_configuration_error() {
        let result = compute_scalar(&[], Vector3::new(1.0, 0.0, -0.01));
        assert!(matches!(result, Err(EngineError::Configuration(_))));
    }

    #[test]
    fn non_finite_wavevector_is_a_numerical_error() {
        let slices = vec![
            slice(0.0, Material::vacuum()),
            slice(0.0, Material::from_delta_beta(7.6e-6, 0.0)),
        ];
        let result = compute_scalar(&slices, Vector3::new(f64::NAN, 0.0, -0.01));
        assert!(matches!(result, Err(EngineError::Numerical(_))));
    }
}
