use super::error::EngineError;
use serde::{Deserialize, Serialize};

/// Run-level options for one simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationOptions {
    /// Fold particle contributions into volume-averaged slice materials.
    pub use_average_materials: bool,
    /// Number of parallel workers the detector elements are partitioned over.
    pub n_workers: usize,
    /// Sub-slices per particle-bearing layer when averaging is on.
    pub n_subslices: usize,
}

impl SimulationOptions {
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.n_workers == 0 {
            return Err(EngineError::Configuration(
                "n_workers must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

impl Default for SimulationOptions {
    fn default() -> Self {
        Self {
            use_average_materials: false,
            n_workers: 1,
            n_subslices: 1,
        }
    }
}

#[derive(Default)]
pub struct SimulationOptionsBuilder {
    use_average_materials: Option<bool>,
    n_workers: Option<usize>,
    n_subslices: Option<usize>,
}

impl SimulationOptionsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn use_average_materials(mut self, enabled: bool) -> Self {
        self.use_average_materials = Some(enabled);
        self
    }

    pub fn n_workers(mut self, n: usize) -> Self {
        self.n_workers = Some(n);
        self
    }

    pub fn n_subslices(mut self, n: usize) -> Self {
        self.n_subslices = Some(n);
        self
    }

    pub fn build(self) -> Result<SimulationOptions, EngineError> {
        let options = SimulationOptions {
            use_average_materials: self.use_average_materials.unwrap_or(false),
            n_workers: self.n_workers.unwrap_or(1),
            n_subslices: self.n_subslices.unwrap_or(1),
        };
        options.validate()?;
        Ok(options)
    }
}
