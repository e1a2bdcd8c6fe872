//! Stage → commit → push for one changed path.
//!
//! Each step runs whether or not the previous one succeeded; a failed step is
//! recorded and logged, never raised. Only a git executable that cannot be
//! spawned aborts the sequence, and that error is left to the caller to report.

use std::ffi::{OsStr, OsString};
use std::path::Path;

use tracker_core::paths::COMMIT_PREFIX;
use tracker_core::{PublishResult, PublishStep, RepositoryConfig, StepReport, StepStatus};

use crate::error::PublishError;
use crate::runner::{GitRunner, SystemGit};

/// `dotfile_tracker update: <path>`, byte-for-byte the path handed to `add`.
pub fn commit_message(path: &Path) -> OsString {
    let mut message = OsString::from(COMMIT_PREFIX);
    message.push(path.as_os_str());
    message
}

/// Publishes changed files to the configured repository.
#[derive(Debug, Clone)]
pub struct ChangePublisher<R = SystemGit> {
    repository: RepositoryConfig,
    runner: R,
}

impl ChangePublisher<SystemGit> {
    /// Publisher backed by `git` from `PATH`.
    pub fn system(repository: RepositoryConfig) -> Self {
        Self::new(repository, SystemGit::new())
    }
}

impl<R: GitRunner> ChangePublisher<R> {
    pub fn new(repository: RepositoryConfig, runner: R) -> Self {
        Self { repository, runner }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Publish `path` with the standard commit message.
    pub fn publish(&self, path: &Path) -> Result<PublishResult, PublishError> {
        self.post_change(path, &commit_message(path))
    }

    /// Run stage, commit and push for `path`, in that order.
    pub fn post_change(
        &self,
        path: &Path,
        commit_message: &OsStr,
    ) -> Result<PublishResult, PublishError> {
        let mut steps = Vec::with_capacity(PublishStep::ALL.len());

        for step in PublishStep::ALL {
            let args = self.step_args(step, path, commit_message);
            let exit = self.runner.run(&args).map_err(|source| PublishError::Spawn {
                step,
                program: self.runner.program().to_path_buf(),
                path: path.to_path_buf(),
                source,
            })?;

            let status = if exit.success() {
                StepStatus::Succeeded
            } else {
                tracing::warn!(
                    path = %path.display(),
                    step = %step,
                    code = ?exit.code,
                    timed_out = exit.timed_out,
                    "git step failed",
                );
                StepStatus::Failed { code: exit.code }
            };
            steps.push(StepReport { step, status });
        }

        let result = PublishResult::from_steps(path, steps);
        if result.is_success() {
            tracing::info!(path = %path.display(), "pushed changes");
        } else {
            tracing::warn!(
                path = %path.display(),
                outcome = %result.outcome,
                "failed to push changes",
            );
        }
        Ok(result)
    }

    /// Full argument vector for one step, scoped to the repository identity.
    pub fn step_args(
        &self,
        step: PublishStep,
        path: &Path,
        commit_message: &OsStr,
    ) -> Vec<OsString> {
        let mut args = self.base_args();
        match step {
            PublishStep::Stage => {
                args.push("add".into());
                args.push(path.into());
            }
            PublishStep::Commit => {
                args.push("commit".into());
                args.push("-m".into());
                args.push(commit_message.into());
            }
            PublishStep::Push => {
                args.push("push".into());
                args.push("origin".into());
                args.push(self.repository.branch.as_str().into());
            }
        }
        args
    }

    fn base_args(&self) -> Vec<OsString> {
        let mut git_dir = OsString::from("--git-dir=");
        git_dir.push(&self.repository.repo_path);
        let mut work_tree = OsString::from("--work-tree=");
        work_tree.push(&self.repository.work_tree);
        vec![git_dir, work_tree]
    }
}
