//! Watcher runtime: single-instance guard + filesystem watch + publish loop.

pub mod dispatcher;
mod error;
pub mod guard;
mod runtime;

pub use dispatcher::{
    ChangeHandler, DispatchOptions, DispatchState, DispatchStats, WatchDispatcher,
};
pub use error::DaemonError;
pub use guard::{acquire, inspect, Acquired, GuardError, LockStatus};
pub use runtime::{run, start_blocking, watch, LogFormat};
