use std::path::PathBuf;

use thiserror::Error;

use crate::guard::GuardError;

/// Error surface for the watcher runtime.
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("notify error: {0}")]
    Notify(#[from] notify::Error),

    #[error(transparent)]
    Guard(#[from] GuardError),

    #[error("publish error: {0}")]
    Publish(#[from] tracker_git::PublishError),

    #[error("none of the {requested} watch targets could be registered")]
    NoTargetsRegistered { requested: usize },

    #[error("{0}")]
    Join(String),
}

impl DaemonError {
    /// True when another live watcher already holds the lock.
    pub fn is_already_running(&self) -> bool {
        matches!(self, DaemonError::Guard(GuardError::AlreadyRunning { .. }))
    }
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> DaemonError {
    DaemonError::Io {
        path: path.into(),
        source,
    }
}
