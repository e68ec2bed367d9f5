use super::config::SimulationOptions;
use super::error::EngineError;
use super::fresnel::FresnelMap;
use super::layer::build_layer_computations;
use super::element::SimulationElement;
use super::progress::{Progress, ProgressReporter};
use super::roughness::RoughSurfaceComputation;
use super::slices::ProcessedSample;
use crate::core::sample::MultiLayer;
use std::ops::Range;
use tracing::{debug, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Identity of one worker within a run's worker set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadInfo {
    pub n_workers: usize,
    pub worker_index: usize,
}

impl ThreadInfo {
    /// The contiguous element range this worker owns. Ranges of all workers
    /// tile `[0, total)` exactly, sizes differing by at most one.
    pub fn range(&self, total: usize) -> Range<usize> {
        let base = total / self.n_workers;
        let remainder = total % self.n_workers;
        let extra = self.worker_index.min(remainder);
        let begin = self.worker_index * base + extra;
        let len = base + usize::from(self.worker_index < remainder);
        begin..begin + len
    }
}

/// Partition descriptors for all workers.
pub fn partition(total: usize, n_workers: usize) -> Vec<Range<usize>> {
    (0..n_workers)
        .map(|worker_index| {
            ThreadInfo {
                n_workers,
                worker_index,
            }
            .range(total)
        })
        .collect()
}

/// Runs every (layer, layout) computation, plus the diffuse rough-interface
/// term where the sample has one, over every element, partitioned
/// over the configured worker count. Each worker owns its element range
/// exclusively and keeps a private Fresnel cache; the join is blocking.
/// The first recorded worker failure is returned after all partitions have
/// completed.
#[instrument(skip_all, name = "dispatch")]
pub fn dispatch(
    sample: &MultiLayer,
    processed: &ProcessedSample,
    elements: &mut [SimulationElement],
    options: &SimulationOptions,
    reporter: &ProgressReporter,
) -> Result<(), EngineError> {
    // Configuration faults surface here, before any element is touched.
    options.validate()?;
    build_layer_computations(sample, processed)?;

    let total = elements.len();
    let n_workers = options.n_workers.min(total.max(1));
    let ranges = partition(total, n_workers);
    debug!(total, n_workers, "partitioned detector elements");

    reporter.report(Progress::SweepStart {
        total_points: total as u64,
    });

    let mut chunks: Vec<(usize, &mut [SimulationElement])> = Vec::with_capacity(n_workers);
    let mut rest = elements;
    for (worker_index, range) in ranges.iter().enumerate() {
        let (chunk, tail) = rest.split_at_mut(range.len());
        chunks.push((worker_index, chunk));
        rest = tail;
    }

    #[cfg(feature = "parallel")]
    let results: Vec<Result<(), EngineError>> = chunks
        .into_par_iter()
        .map(|(worker_index, chunk)| {
            let n_elements = chunk.len() as u64;
            let result = run_partition(sample, processed, chunk, worker_index);
            reporter.report(Progress::PointsDone(n_elements));
            result
        })
        .collect();

    #[cfg(not(feature = "parallel"))]
    let results: Vec<Result<(), EngineError>> = chunks
        .into_iter()
        .map(|(worker_index, chunk)| {
            let n_elements = chunk.len() as u64;
            let result = run_partition(sample, processed, chunk, worker_index);
            reporter.report(Progress::PointsDone(n_elements));
            result
        })
        .collect();

    reporter.report(Progress::SweepFinish);

    results.into_iter().find(Result::is_err).unwrap_or(Ok(()))
}

/// Protected run of one partition: any engine fault becomes a worker-local
/// failure record instead of propagating across threads.
fn run_partition(
    sample: &MultiLayer,
    processed: &ProcessedSample,
    elements: &mut [SimulationElement],
    worker_index: usize,
) -> Result<(), EngineError> {
    let fresnel = FresnelMap::new(processed);
    let computations = build_layer_computations(sample, processed)
        .map_err(|e| worker_failure(worker_index, e))?;
    for computation in &computations {
        computation
            .run(&fresnel, elements)
            .map_err(|e| worker_failure(worker_index, e))?;
    }
    if let Some(rough) = RoughSurfaceComputation::new(processed) {
        rough
            .run(&fresnel, elements)
            .map_err(|e| worker_failure(worker_index, e))?;
    }
    Ok(())
}

fn worker_failure(worker_index: usize, source: EngineError) -> EngineError {
    EngineError::Worker {
        worker_index,
        message: source.to_string(),
    }
}
