//! Error types for tracker-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise while resolving tracker settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required value was empty after trimming.
    #[error("missing required value: {field}")]
    MissingField { field: &'static str },

    /// The watch list resolved to zero paths.
    #[error("no files to monitor")]
    NoTargets,

    /// `--path` must be absolute; git resolves relative paths against its cwd.
    #[error("repository path must be absolute: {path}")]
    RelativeRepoPath { path: PathBuf },

    /// The watch list named a file that could not be read.
    #[error("failed to read watch list at {path}: {source}")]
    WatchList {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
