use std::fmt;

#[derive(Debug)]
pub enum ReconError {
    /// A reconciliation run is already in progress on this reconciler.
    AlreadyRunning,
    /// A description backend failed mid-run.
    Backend(String),
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyRunning => write!(f, "a replace run is already in progress"),
            Self::Backend(msg) => write!(f, "description backend error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}
