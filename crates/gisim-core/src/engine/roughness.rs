use super::element::SimulationElement;
use super::error::EngineError;
use super::fresnel::FresnelMap;
use super::fresnel::scalar::ScalarRtCoefficients;
use super::slices::ProcessedSample;
use crate::core::roughness::Roughness;
use num_complex::Complex64;
use std::f64::consts::PI;

/// One rough interface of the slice stack: the slice whose top it is, its
/// depth below the sample surface, and the height statistics.
#[derive(Debug, Clone, Copy)]
struct RoughInterface {
    slice_index: usize,
    depth: f64,
    roughness: Roughness,
}

/// Diffuse scattering from rough interfaces, first-order distorted-wave
/// treatment: each interface radiates with an amplitude set by its
/// permittivity contrast and the local wave field, weighted by the
/// self-affine height power spectrum. Interfaces are coupled vertically
/// through the sample's cross-correlation length.
///
/// Runs alongside the particle computations and adds into the same per-pixel
/// accumulators. Spin-matrix samples are not handled here.
pub struct RoughSurfaceComputation<'a> {
    sample: &'a ProcessedSample,
    interfaces: Vec<RoughInterface>,
}

impl<'a> RoughSurfaceComputation<'a> {
    /// Returns `None` when no interface carries a finite rms roughness, or
    /// when the sample needs the spin-matrix solver.
    pub fn new(sample: &'a ProcessedSample) -> Option<Self> {
        if sample.polarized() {
            return None;
        }
        let mut interfaces = Vec::new();
        let mut depth = 0.0;
        for (slice_index, slice) in sample.slices().iter().enumerate().skip(1) {
            if let Some(roughness) = slice.top_roughness {
                if roughness.sigma > 0.0 {
                    interfaces.push(RoughInterface {
                        slice_index,
                        depth,
                        roughness,
                    });
                }
            }
            depth += slice.thickness;
        }
        if interfaces.is_empty() {
            None
        } else {
            Some(Self { sample, interfaces })
        }
    }

    /// Evaluates the owned range; any failure aborts this range only.
    pub fn run(
        &self,
        fresnel: &FresnelMap,
        elements: &mut [SimulationElement],
    ) -> Result<(), EngineError> {
        for element in elements.iter_mut() {
            let coeffs_in = fresnel.coefficients_in(element)?;
            let coeffs_out = fresnel.coefficients_out(element)?;
            let (Some(rt_in), Some(rt_out)) = (coeffs_in.as_scalar(), coeffs_out.as_scalar())
            else {
                return Err(EngineError::Numerical(
                    "diffuse interface term needs scalar coefficients".into(),
                ));
            };
            let diffuse = self.evaluate(element, rt_in, rt_out)?;
            element.add_intensity(element.weight * diffuse);
        }
        Ok(())
    }

    fn evaluate(
        &self,
        element: &SimulationElement,
        rt_in: &[ScalarRtCoefficients],
        rt_out: &[ScalarRtCoefficients],
    ) -> Result<f64, EngineError> {
        let (qx, qy) = element.q_parallel();
        let q_par = qx.hypot(qy);
        let k0 = element.wavenumber();
        let prefactor = k0 * k0 / (4.0 * PI);

        let slices = self.sample.slices();
        let mut amplitudes = Vec::with_capacity(self.interfaces.len());
        for iface in &self.interfaces {
            let above = &slices[iface.slice_index - 1].material;
            let below = &slices[iface.slice_index].material;
            let contrast = above.permittivity() - below.permittivity();
            let wave = interface_amplitude(
                &rt_in[iface.slice_index],
                &rt_out[iface.slice_index],
                iface.roughness.sigma,
            );
            amplitudes.push(prefactor * contrast * wave);
        }

        let mut intensity = 0.0;
        for (amplitude, iface) in amplitudes.iter().zip(&self.interfaces) {
            intensity += amplitude.norm_sqr() * iface.roughness.spectral_function(q_par);
        }
        for j in 0..self.interfaces.len() {
            for k in j + 1..self.interfaces.len() {
                let coupled = self.cross_spectrum(
                    &self.interfaces[j],
                    &self.interfaces[k],
                    q_par,
                );
                if coupled != 0.0 {
                    intensity += 2.0 * (amplitudes[j] * amplitudes[k].conj()).re * coupled;
                }
            }
        }
        if !intensity.is_finite() {
            return Err(EngineError::Numerical(
                "diffuse interface intensity is not finite".into(),
            ));
        }
        Ok(intensity)
    }

    /// Cross spectrum of two interfaces: the symmetrized single-interface
    /// spectra, damped exponentially in the vertical separation over the
    /// cross-correlation length. Zero without vertical correlation.
    fn cross_spectrum(&self, a: &RoughInterface, b: &RoughInterface, q_par: f64) -> f64 {
        let length = self.sample.cross_correlation_length();
        if length <= 0.0 {
            return 0.0;
        }
        let s_a = a.roughness.spectral_function(q_par);
        let s_b = b.roughness.spectral_function(q_par);
        let symmetrized = 0.5
            * (a.roughness.sigma / b.roughness.sigma * s_b
                + b.roughness.sigma / a.roughness.sigma * s_a);
        symmetrized * (-(a.depth - b.depth).abs() / length).exp()
    }
}

/// Distorted-wave factor of one interface: the four products of incoming and
/// time-reversed outgoing amplitudes, each damped by the Gaussian height
/// distribution at its own vertical momentum transfer. Coefficients are
/// referenced to slice tops, so the slice below the interface carries them
/// exactly at the interface.
fn interface_amplitude(
    rt_in: &ScalarRtCoefficients,
    rt_out: &ScalarRtCoefficients,
    sigma: f64,
) -> Complex64 {
    let half_sigma_sq = 0.5 * sigma * sigma;
    let damp = |qz: Complex64| (-(qz * qz) * half_sigma_sq).exp();
    let qz_sum = rt_in.kz + rt_out.kz;
    let qz_diff = rt_in.kz - rt_out.kz;
    (rt_in.t * rt_out.t + rt_in.r * rt_out.r) * damp(qz_sum)
        + (rt_in.r * rt_out.t + rt_in.t * rt_out.r) * damp(qz_diff)
}
