use crate::core::instrument::{Beam, SphericalDetector};
use crate::core::sample::MultiLayer;
use crate::engine::config::SimulationOptions;
use crate::engine::dispatch;
use crate::engine::element::generate_elements;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::slices::ProcessedSample;
use crate::engine::state::RunStatus;
use tracing::{info, instrument};

/// Per-pixel intensities of one run, row-major over the detector grid, plus
/// the run's final status. A failed run exposes no partial intensities.
#[derive(Debug, Clone)]
pub struct ScatteringResult {
    pub intensities: Vec<f64>,
    pub status: RunStatus,
}

/// Runs a full grazing-incidence scattering simulation: flattens the sample,
/// expands the detector into simulation elements, partitions them over the
/// configured workers, and collects the accumulated intensities.
///
/// Configuration faults fail fast with `Err`; faults inside a worker are
/// collected after all partitions complete and surface as a `Failed` status.
#[instrument(skip_all, name = "scattering_workflow")]
pub fn run(
    sample: &MultiLayer,
    beam: &Beam,
    detector: &SphericalDetector,
    options: &SimulationOptions,
    reporter: &ProgressReporter,
) -> Result<ScatteringResult, EngineError> {
    // === Phase 1: Flatten the sample ===
    reporter.report(Progress::StageStart { name: "Processing" });
    let processed = ProcessedSample::build(sample, options)?;
    info!(
        n_layers = sample.n_layers(),
        n_slices = processed.n_slices(),
        "sample processed"
    );
    reporter.report(Progress::StageFinish);

    // === Phase 2: Expand the detector ===
    let mut elements = generate_elements(beam, detector);
    info!(n_elements = elements.len(), "detector expanded");

    // === Phase 3: Partitioned evaluation ===
    reporter.report(Progress::StageStart { name: "Scattering" });
    let dispatch_result =
        dispatch::dispatch(sample, &processed, &mut elements, options, reporter);
    reporter.report(Progress::StageFinish);

    // === Phase 4: Collect ===
    match dispatch_result {
        Ok(()) => Ok(ScatteringResult {
            intensities: elements.iter().map(|e| e.intensity()).collect(),
            status: RunStatus::Completed,
        }),
        Err(EngineError::Worker {
            worker_index,
            message,
        }) => {
            info!(worker_index, "run failed in worker");
            Ok(ScatteringResult {
                intensities: Vec::new(),
                status: RunStatus::Failed { message },
            })
        }
        Err(other) => Err(other),
    }
}
