//! Domain types for the dotfile tracker.
//!
//! All path fields use `PathBuf`; never `&str` or `String` for filesystem paths.
//! Everything here is immutable once built and serializable for status output.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::paths;

// ---------------------------------------------------------------------------
// Watch targets
// ---------------------------------------------------------------------------

/// A file or directory registered for write-complete notification.
///
/// Directories are watched recursively, files directly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct WatchTarget {
    pub path: PathBuf,
    pub recursive: bool,
}

impl WatchTarget {
    /// Build a target, probing the filesystem to decide whether it recurses.
    ///
    /// A path that does not exist (yet) is treated as a plain file.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let recursive = path.is_dir();
        Self { path, recursive }
    }
}

impl fmt::Display for WatchTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.recursive {
            write!(f, "{} (recursive)", self.path.display())
        } else {
            self.path.display().fmt(f)
        }
    }
}

// ---------------------------------------------------------------------------
// Repository identity
// ---------------------------------------------------------------------------

/// The git repository every change is published to.
///
/// `repo_path` is passed as `--git-dir`, `work_tree` as `--work-tree`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryConfig {
    pub user: String,
    pub branch: String,
    pub repo_path: PathBuf,
    pub work_tree: PathBuf,
}

impl RepositoryConfig {
    /// `/home/<user>/.dotfiles/` unless `repo_path` overrides it; the work tree
    /// is always `/home/<user>`.
    pub fn new(
        user: impl Into<String>,
        branch: impl Into<String>,
        repo_path: Option<PathBuf>,
    ) -> Self {
        let user = user.into();
        let repo_path = repo_path.unwrap_or_else(|| paths::default_repo_path(&user));
        let work_tree = paths::work_tree(&user);
        Self {
            user,
            branch: branch.into(),
            repo_path,
            work_tree,
        }
    }

    /// Replace the work tree. Used when the home layout is not `/home/<user>`.
    pub fn with_work_tree(mut self, work_tree: impl Into<PathBuf>) -> Self {
        self.work_tree = work_tree.into();
        self
    }

    /// True when `path` lies inside the git metadata directory.
    pub fn owns_metadata(&self, path: &Path) -> bool {
        path.starts_with(&self.repo_path)
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Kind of filesystem notification, reduced to what the tracker cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// A writer closed the file after writing to it.
    WriteComplete,
    Other,
}

/// One notification delivered by the OS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub path: PathBuf,
    pub kind: ChangeKind,
}

impl ChangeEvent {
    pub fn write_complete(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: ChangeKind::WriteComplete,
        }
    }

    pub fn other(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: ChangeKind::Other,
        }
    }

    pub fn is_write_complete(&self) -> bool {
        self.kind == ChangeKind::WriteComplete
    }
}

// ---------------------------------------------------------------------------
// Publish results
// ---------------------------------------------------------------------------

/// One step of the stage → commit → push sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PublishStep {
    Stage,
    Commit,
    Push,
}

impl PublishStep {
    /// Execution order.
    pub const ALL: [PublishStep; 3] = [PublishStep::Stage, PublishStep::Commit, PublishStep::Push];

    fn failed_outcome(self) -> PublishOutcome {
        match self {
            PublishStep::Stage => PublishOutcome::StageFailed,
            PublishStep::Commit => PublishOutcome::CommitFailed,
            PublishStep::Push => PublishOutcome::PushFailed,
        }
    }
}

impl fmt::Display for PublishStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublishStep::Stage => write!(f, "stage"),
            PublishStep::Commit => write!(f, "commit"),
            PublishStep::Push => write!(f, "push"),
        }
    }
}

/// Exit status of one spawned git step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum StepStatus {
    Succeeded,
    /// Non-zero exit. `code` is `None` when killed by a signal or timed out.
    Failed { code: Option<i32> },
}

impl StepStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, StepStatus::Succeeded)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StepReport {
    pub step: PublishStep,
    #[serde(flatten)]
    pub status: StepStatus,
}

/// Summary outcome of a publish attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PublishOutcome {
    #[default]
    Success,
    StageFailed,
    CommitFailed,
    PushFailed,
}

impl fmt::Display for PublishOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublishOutcome::Success => write!(f, "success"),
            PublishOutcome::StageFailed => write!(f, "stage failed"),
            PublishOutcome::CommitFailed => write!(f, "commit failed"),
            PublishOutcome::PushFailed => write!(f, "push failed"),
        }
    }
}

/// Result of one publish attempt for one path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishResult {
    pub path: PathBuf,
    pub outcome: PublishOutcome,
    pub steps: Vec<StepReport>,
}

impl PublishResult {
    /// Derive the outcome from the step reports: the earliest failed step wins.
    pub fn from_steps(path: impl Into<PathBuf>, steps: Vec<StepReport>) -> Self {
        let outcome = steps
            .iter()
            .find(|report| !report.status.is_success())
            .map(|report| report.step.failed_outcome())
            .unwrap_or_default();
        Self {
            path: path.into(),
            outcome,
            steps,
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome == PublishOutcome::Success
    }
}
