use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Sample has no layers")]
    EmptySample,

    #[error("Layer {layer_index} has particles but {n_subslices} sub-slices requested")]
    InvalidSubSliceCount {
        layer_index: usize,
        n_subslices: usize,
    },

    #[error("Negative position variance {variance} in layout {layout_index} of layer {layer_index}")]
    NegativePositionVariance {
        layer_index: usize,
        layout_index: usize,
        variance: f64,
    },

    #[error(
        "Interference function dimension {interference_dim} does not match \
         particle arrangement dimension {arrangement_dim}"
    )]
    DimensionalityMismatch {
        interference_dim: u8,
        arrangement_dim: u8,
    },

    #[error("Numerical failure: {0}")]
    Numerical(String),

    #[error("Worker {worker_index} failed: {message}")]
    Worker {
        worker_index: usize,
        message: String,
    },
}
