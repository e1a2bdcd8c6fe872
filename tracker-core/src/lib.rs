//! Tracker core library — domain types, settings resolution, errors.
//!
//! - [`types`] — watch targets, repository identity, events, publish results
//! - [`config`] — [`TrackerSettings`] resolution and watch-list parsing
//! - [`paths`] — default repository and lock locations
//! - [`error`] — [`ConfigError`]

pub mod config;
pub mod error;
pub mod paths;
pub mod types;

pub use config::{parse_watch_list, RawSettings, TrackerSettings};
pub use error::ConfigError;
pub use types::{
    ChangeEvent, ChangeKind, PublishOutcome, PublishResult, PublishStep, RepositoryConfig,
    StepReport, StepStatus, WatchTarget,
};
