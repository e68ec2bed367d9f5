/// Events emitted while a simulation runs. Stages are the coarse phases of a
/// workflow (sample processing, scattering, reflectivity); a sweep is the
/// enumerable pass over detector pixels, scan points, or worker partitions
/// inside a stage.
#[derive(Debug, Clone)]
pub enum Progress {
    StageStart { name: &'static str },
    StageFinish,

    SweepStart { total_points: u64 },
    /// This many more points of the current sweep are done.
    PointsDone(u64),
    SweepFinish,

    Message(String),
}

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

/// Forwards engine events to an optional front-end callback; reporting is a
/// no-op when nobody listens.
#[derive(Default)]
pub struct ProgressReporter<'a> {
    callback: Option<ProgressCallback<'a>>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: ProgressCallback<'a>) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    #[inline]
    pub fn report(&self, event: Progress) {
        if let Some(cb) = &self.callback {
            cb(event);
        }
    }
}
