//! # tracker-git
//!
//! Publishes changed files to a git repository.
//!
//! [`ChangePublisher::post_change`] runs `add`, `commit` and `push` against a
//! repository addressed by explicit `--git-dir` / `--work-tree` arguments.
//! The git process itself sits behind [`GitRunner`] so tests can script it.

pub mod error;
pub mod publisher;
pub mod runner;

pub use error::PublishError;
pub use publisher::{commit_message, ChangePublisher};
pub use runner::{GitRunner, StepExit, SystemGit};
