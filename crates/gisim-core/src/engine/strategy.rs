use super::element::SimulationElement;
use super::error::EngineError;
use super::fresnel::CoefficientSet;
use super::fresnel::magnetic::MatrixRtCoefficients;
use super::fresnel::scalar::ScalarRtCoefficients;
use crate::core::interference::InterferenceFunction;
use crate::core::sample::ParticleLayout;
use nalgebra::{Matrix2, Vector3};
use num_complex::Complex64;
use std::f64::consts::PI;

/// Combines per-particle scattering amplitudes with the layout's structural
/// interference factor. Bound at construction to one layer's layout and
/// validated there; evaluation is stateless.
pub struct CoherenceStrategy<'a> {
    layout: &'a ParticleLayout,
    /// Slice index of the hosting layer inside the processed sample.
    slice_index: usize,
}

impl<'a> CoherenceStrategy<'a> {
    pub fn new(
        layout: &'a ParticleLayout,
        layer_index: usize,
        layout_index: usize,
        slice_index: usize,
    ) -> Result<Self, EngineError> {
        if layout.position_variance < 0.0 {
            return Err(EngineError::NegativePositionVariance {
                layer_index,
                layout_index,
                variance: layout.position_variance,
            });
        }
        validate_interference(&layout.interference)?;
        let interference_dim = layout.interference.dimension();
        let arrangement_dim = layout.arrangement.dimension();
        if interference_dim != arrangement_dim {
            return Err(EngineError::DimensionalityMismatch {
                interference_dim,
                arrangement_dim,
            });
        }
        Ok(Self {
            layout,
            slice_index,
        })
    }

    /// Scattered intensity contribution of this layout for one detector
    /// element, under the decoupling combination
    /// `sum |F|^2 + |sum F|^2 (S(q) - 1)`, Debye-Waller damped. The
    /// per-particle amplitudes are the four-term distorted-wave sums.
    pub fn evaluate(
        &self,
        element: &SimulationElement,
        coeffs_in: &CoefficientSet,
        coeffs_out: &CoefficientSet,
    ) -> Result<f64, EngineError> {
        match (coeffs_in, coeffs_out) {
            (CoefficientSet::Scalar(cin), CoefficientSet::Scalar(cout)) => {
                self.evaluate_scalar(element, &cin[self.slice_index], &cout[self.slice_index])
            }
            (CoefficientSet::Matrix(cin), CoefficientSet::Matrix(cout)) => {
                self.evaluate_polarized(element, &cin[self.slice_index], &cout[self.slice_index])
            }
            _ => Err(EngineError::Numerical(
                "mismatched scalar/matrix coefficient sets".into(),
            )),
        }
    }

    fn evaluate_scalar(
        &self,
        element: &SimulationElement,
        rt_in: &ScalarRtCoefficients,
        rt_out: &ScalarRtCoefficients,
    ) -> Result<f64, EngineError> {
        let total_abundance = self.layout.total_abundance();
        if total_abundance <= 0.0 {
            return Ok(0.0);
        }

        let (qx, qy) = element.q_parallel();
        let dw = self.debye_waller(element);

        let mut incoherent = 0.0;
        let mut amplitude = Complex64::new(0.0, 0.0);
        for particle in &self.layout.particles {
            let ff = dwba_amplitude(&particle.form_factor, qx, qy, rt_in, rt_out);
            if !ff.is_finite() {
                return Err(EngineError::Numerical(
                    "form factor amplitude is not finite".into(),
                ));
            }
            let fraction = particle.abundance / total_abundance;
            amplitude += fraction * ff;
            incoherent += fraction * ff.norm_sqr();
        }

        let structure = self.layout.interference.evaluate(qx, qy);
        let coherent = amplitude.norm_sqr() * (structure - 1.0);
        Ok(total_abundance * dw * (incoherent + coherent))
    }

    fn evaluate_polarized(
        &self,
        element: &SimulationElement,
        rt_in: &MatrixRtCoefficients,
        rt_out: &MatrixRtCoefficients,
    ) -> Result<f64, EngineError> {
        let total_abundance = self.layout.total_abundance();
        if total_abundance <= 0.0 {
            return Ok(0.0);
        }

        let (qx, qy) = element.q_parallel();
        let dw = self.debye_waller(element);
        let spinor = element.beam_spinor;

        let mut incoherent = 0.0;
        let mut amplitude: Matrix2<Complex64> = Matrix2::zeros();
        for particle in &self.layout.particles {
            let ff = dwba_amplitude_polarized(&particle.form_factor, qx, qy, rt_in, rt_out);
            if ff.iter().any(|entry| !entry.is_finite()) {
                return Err(EngineError::Numerical(
                    "form factor amplitude is not finite".into(),
                ));
            }
            let fraction = Complex64::new(particle.abundance / total_abundance, 0.0);
            amplitude += ff * fraction;
            let scattered = ff * spinor;
            incoherent +=
                fraction.re * (scattered.x.norm_sqr() + scattered.y.norm_sqr());
        }

        let structure = self.layout.interference.evaluate(qx, qy);
        let mean_scattered = amplitude * spinor;
        let coherent = (mean_scattered.x.norm_sqr() + mean_scattered.y.norm_sqr())
            * (structure - 1.0);
        Ok(total_abundance * dw * (incoherent + coherent))
    }

    /// Positional-disorder damping exp(-q^2 sigma_pos^2).
    fn debye_waller(&self, element: &SimulationElement) -> f64 {
        if self.layout.position_variance == 0.0 {
            return 1.0;
        }
        let q = element.k_f() - element.k_i();
        (-q.norm_squared() * self.layout.position_variance).exp()
    }
}

/// Rejects interference parameters that would make the structure factor
/// degenerate (infinite peaks, collapsed lattice cells).
fn validate_interference(interference: &InterferenceFunction) -> Result<(), EngineError> {
    match *interference {
        InterferenceFunction::None => Ok(()),
        InterferenceFunction::RadialParacrystal {
            peak_distance,
            width,
            ..
        } => {
            if peak_distance <= 0.0 || width <= 0.0 {
                return Err(EngineError::Configuration(format!(
                    "radial paracrystal needs positive peak distance and width, \
                     got {peak_distance} and {width}"
                )));
            }
            Ok(())
        }
        InterferenceFunction::Lattice2d {
            length_1,
            length_2,
            angle,
            position_variance,
        } => {
            if length_1 <= 0.0 || length_2 <= 0.0 {
                return Err(EngineError::Configuration(format!(
                    "lattice basis lengths must be positive, got {length_1} and {length_2}"
                )));
            }
            if !(angle > 0.0 && angle < PI) {
                return Err(EngineError::Configuration(format!(
                    "lattice basis angle must lie strictly between 0 and pi, got {angle}"
                )));
            }
            if position_variance < 0.0 {
                return Err(EngineError::Configuration(format!(
                    "lattice position variance must be non-negative, got {position_variance}"
                )));
            }
            Ok(())
        }
    }
}

/// Four-term distorted-wave amplitude: the form factor is evaluated at the
/// four vertical momentum combinations, weighted by the transmitted and
/// reflected wave amplitudes for the incoming and time-reversed outgoing
/// directions.
fn dwba_amplitude(
    form_factor: &crate::core::formfactor::FormFactor,
    qx: f64,
    qy: f64,
    rt_in: &ScalarRtCoefficients,
    rt_out: &ScalarRtCoefficients,
) -> Complex64 {
    let kz_i = rt_in.kz;
    let kz_f = rt_out.kz;
    let q_par = |qz: Complex64| {
        Vector3::new(Complex64::new(qx, 0.0), Complex64::new(qy, 0.0), qz)
    };

    rt_in.t * rt_out.t * form_factor.evaluate(q_par(-(kz_i + kz_f)))
        + rt_in.r * rt_out.t * form_factor.evaluate(q_par(kz_i - kz_f))
        + rt_in.t * rt_out.r * form_factor.evaluate(q_par(kz_f - kz_i))
        + rt_in.r * rt_out.r * form_factor.evaluate(q_par(kz_i + kz_f))
}

/// Spin-space counterpart of the four-term sum: each term carries its own
/// product of 2x2 wave-amplitude operators around the (spin-independent)
/// shape amplitude.
fn dwba_amplitude_polarized(
    form_factor: &crate::core::formfactor::FormFactor,
    qx: f64,
    qy: f64,
    rt_in: &MatrixRtCoefficients,
    rt_out: &MatrixRtCoefficients,
) -> Matrix2<Complex64> {
    let kz_i = (rt_in.kz_eigen[0] + rt_in.kz_eigen[1]) * Complex64::new(0.5, 0.0);
    let kz_f = (rt_out.kz_eigen[0] + rt_out.kz_eigen[1]) * Complex64::new(0.5, 0.0);
    let q_par = |qz: Complex64| {
        Vector3::new(Complex64::new(qx, 0.0), Complex64::new(qy, 0.0), qz)
    };

    rt_out.t.transpose() * rt_in.t * form_factor.evaluate(q_par(-(kz_i + kz_f)))
        + rt_out.t.transpose() * rt_in.r * form_factor.evaluate(q_par(kz_i - kz_f))
        + rt_out.r.transpose() * rt_in.t * form_factor.evaluate(q_par(kz_f - kz_i))
        + rt_out.r.transpose() * rt_in.r * form_factor.evaluate(q_par(kz_i + kz_f))
}
