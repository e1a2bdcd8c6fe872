//! Settings resolution: raw CLI values in, validated [`TrackerSettings`] out.
//!
//! The watch list is either a path to a file with one target per line, or a
//! comma-separated list of targets.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;
use crate::paths;
use crate::types::{RepositoryConfig, WatchTarget};

/// Unvalidated settings as they arrive from the command line.
#[derive(Debug, Clone, Default)]
pub struct RawSettings {
    pub files: String,
    pub user: String,
    pub branch: String,
    pub repo_path: Option<PathBuf>,
    pub lock_path: Option<PathBuf>,
    pub git_program: Option<PathBuf>,
    pub git_timeout: Option<Duration>,
    pub exit_on_spawn_failure: bool,
}

/// Everything the watcher needs, resolved once at startup.
#[derive(Debug, Clone)]
pub struct TrackerSettings {
    pub targets: Vec<WatchTarget>,
    pub repository: RepositoryConfig,
    pub lock_path: PathBuf,
    pub git_program: PathBuf,
    /// Per-step limit on git invocations. `None` waits forever.
    pub git_timeout: Option<Duration>,
    /// Stop the watcher when git cannot be spawned instead of logging and
    /// continuing.
    pub exit_on_spawn_failure: bool,
}

impl TrackerSettings {
    pub fn resolve(raw: RawSettings) -> Result<Self, ConfigError> {
        let user = required(&raw.user, "username")?;
        let branch = required(&raw.branch, "branch")?;

        if let Some(path) = raw.repo_path.as_ref() {
            if !path.is_absolute() {
                return Err(ConfigError::RelativeRepoPath { path: path.clone() });
            }
        }

        let targets = parse_watch_list(&raw.files)?
            .into_iter()
            .map(WatchTarget::from_path)
            .collect::<Vec<_>>();
        if targets.is_empty() {
            return Err(ConfigError::NoTargets);
        }

        Ok(Self {
            targets,
            repository: RepositoryConfig::new(user, branch, raw.repo_path),
            lock_path: raw.lock_path.unwrap_or_else(paths::default_lock_path),
            git_program: raw.git_program.unwrap_or_else(|| PathBuf::from("git")),
            git_timeout: raw.git_timeout,
            exit_on_spawn_failure: raw.exit_on_spawn_failure,
        })
    }
}

fn required(value: &str, field: &'static str) -> Result<String, ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::MissingField { field });
    }
    Ok(trimmed.to_string())
}

/// Expand a watch-list argument into paths, in order, without duplicates.
///
/// If `list` names an existing file its lines are the targets; otherwise it is
/// split on commas. Blank entries are skipped in both forms.
pub fn parse_watch_list(list: &str) -> Result<Vec<PathBuf>, ConfigError> {
    let list_file = Path::new(list.trim());
    let entries: Vec<String> = if list_file.is_file() {
        let content = std::fs::read_to_string(list_file).map_err(|source| {
            ConfigError::WatchList {
                path: list_file.to_path_buf(),
                source,
            }
        })?;
        content.lines().map(str::to_string).collect()
    } else {
        list.split(',').map(str::to_string).collect()
    };

    let mut seen = HashSet::new();
    Ok(entries
        .iter()
        .map(|entry| entry.trim())
        .filter(|entry| !entry.is_empty())
        .map(PathBuf::from)
        .filter(|path| seen.insert(path.clone()))
        .collect())
}
