use crate::core::instrument::Beam;
use crate::core::sample::MultiLayer;
use crate::engine::config::SimulationOptions;
use crate::engine::element::beam_spinor;
use crate::engine::error::EngineError;
use crate::engine::fresnel::{magnetic::compute_matrix, scalar::compute_scalar};
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::slices::ProcessedSample;
use nalgebra::Vector3;
use tracing::{info, instrument};

/// Reflectivity curve |R(alpha)|^2 over a grid of incidence angles.
#[derive(Debug, Clone)]
pub struct SpecularResult {
    pub alpha_i: Vec<f64>,
    pub reflectivity: Vec<f64>,
}

/// Computes the specular reflectivity of the sample for each incidence
/// angle of the scan. Samples with magnetized layers or an applied field
/// are solved with the spin-matrix variant, projected on the beam's
/// incident spinor.
#[instrument(skip_all, name = "specular_workflow")]
pub fn run(
    sample: &MultiLayer,
    beam: &Beam,
    alpha_grid: &[f64],
    options: &SimulationOptions,
    reporter: &ProgressReporter,
) -> Result<SpecularResult, EngineError> {
    options.validate()?;
    reporter.report(Progress::StageStart { name: "Processing" });
    let processed = ProcessedSample::build(sample, options)?;
    reporter.report(Progress::StageFinish);

    let k0 = 2.0 * std::f64::consts::PI / beam.wavelength;
    let spinor = beam_spinor(beam);

    reporter.report(Progress::StageStart { name: "Reflectivity" });
    reporter.report(Progress::SweepStart {
        total_points: alpha_grid.len() as u64,
    });
    let mut reflectivity = Vec::with_capacity(alpha_grid.len());
    for &alpha in alpha_grid {
        let k = Vector3::new(k0 * alpha.cos(), 0.0, -k0 * alpha.sin());
        let value = if processed.polarized() {
            let coeffs = compute_matrix(
                processed.slices(),
                k,
                processed.external_field(),
                false,
            )?;
            (coeffs[0].r * spinor).norm_squared()
        } else {
            let coeffs = compute_scalar(processed.slices(), k)?;
            coeffs[0].reflection().norm_sqr()
        };
        reflectivity.push(value);
        reporter.report(Progress::PointsDone(1));
    }
    reporter.report(Progress::SweepFinish);
    reporter.report(Progress::StageFinish);
    info!(n_points = alpha_grid.len(), "reflectivity scan finished");

    Ok(SpecularResult {
        alpha_i: alpha_grid.to_vec(),
        reflectivity,
    })
}
