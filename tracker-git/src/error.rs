//! Error types for tracker-git.

use std::path::PathBuf;

use thiserror::Error;

use tracker_core::PublishStep;

/// Hard failures of a publish attempt.
///
/// A git step that runs and exits non-zero is not an error; it is recorded in
/// the [`tracker_core::PublishResult`]. Only failing to launch git at all ends
/// up here.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("failed to spawn {program} for {step} of {path}: {source}")]
    Spawn {
        step: PublishStep,
        program: PathBuf,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PublishError {
    /// The changed file whose publish failed.
    pub fn path(&self) -> &std::path::Path {
        match self {
            PublishError::Spawn { path, .. } => path,
        }
    }
}
