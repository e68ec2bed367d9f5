/// Lifecycle of one simulation run, as seen by reporting layers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RunStatus {
    #[default]
    Idle,
    Running,
    Completed,
    Failed {
        message: String,
    },
}

impl RunStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, RunStatus::Failed { .. })
    }

    pub fn failure_message(&self) -> Option<&str> {
        match self {
            RunStatus::Failed { message } => Some(message),
            _ => None,
        }
    }
}
