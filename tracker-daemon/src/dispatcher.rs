//! Event loop turning write-complete notifications into publishes.
//!
//! One event is fully handled, including the blocking git push, before the
//! next is taken off the channel. That serialization is the only thing
//! keeping two git processes off the same index.

use std::path::Path;
use std::sync::Arc;

use notify::event::{AccessKind, AccessMode};
use notify::{Event, EventKind};
use serde::Serialize;
use tokio::sync::{broadcast, mpsc};

use tracker_core::{ChangeEvent, PublishResult, RepositoryConfig};
use tracker_git::{ChangePublisher, GitRunner, PublishError};

use crate::error::DaemonError;

/// Receives qualifying paths from the dispatcher.
pub trait ChangeHandler: Send + Sync + 'static {
    fn on_write_complete(&self, path: &Path) -> Result<PublishResult, PublishError>;
}

impl<R: GitRunner + 'static> ChangeHandler for ChangePublisher<R> {
    fn on_write_complete(&self, path: &Path) -> Result<PublishResult, PublishError> {
        self.publish(path)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchState {
    Idle,
    Publishing,
}

#[derive(Debug, Clone, Default)]
pub struct DispatchOptions {
    /// Return from the loop when git cannot be spawned. Default is to log the
    /// failure and keep watching.
    pub exit_on_spawn_failure: bool,
    /// Events inside this repository's metadata directory are dropped.
    pub repository: Option<RepositoryConfig>,
}

/// Counters for one dispatcher run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchStats {
    pub received: usize,
    pub discarded: usize,
    pub published: usize,
    pub failed: usize,
    pub spawn_failures: usize,
}

pub struct WatchDispatcher<H> {
    handler: Arc<H>,
    options: DispatchOptions,
    state: DispatchState,
    stats: DispatchStats,
}

impl<H: ChangeHandler> WatchDispatcher<H> {
    pub fn new(handler: Arc<H>, options: DispatchOptions) -> Self {
        Self {
            handler,
            options,
            state: DispatchState::Idle,
            stats: DispatchStats::default(),
        }
    }

    pub fn state(&self) -> DispatchState {
        self.state
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    /// Consume events until the channel closes or shutdown fires.
    ///
    /// Shutdown is only observed between events, so an in-flight publish
    /// always runs to completion.
    pub async fn run(
        &mut self,
        mut events: mpsc::UnboundedReceiver<notify::Result<Event>>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<DispatchStats, DaemonError> {
        loop {
            tokio::select! {
                biased;
                _ = shutdown.recv() => {
                    tracing::info!("shutdown requested; watcher stopping");
                    break;
                }
                event = events.recv() => {
                    let Some(event) = event else { break };
                    let event = match event {
                        Ok(event) => event,
                        Err(err) => {
                            tracing::warn!(error = %err, "watcher event error");
                            continue;
                        }
                    };
                    for change in translate(&event) {
                        self.dispatch(change).await?;
                    }
                }
            }
        }
        Ok(self.stats)
    }

    /// Handle a single event: discard it, or publish and wait for the result.
    pub async fn dispatch(
        &mut self,
        change: ChangeEvent,
    ) -> Result<Option<PublishResult>, DaemonError> {
        self.stats.received += 1;

        if !change.is_write_complete() {
            tracing::debug!(path = %change.path.display(), "discarding event");
            self.stats.discarded += 1;
            return Ok(None);
        }
        if self.is_ignored(&change.path) {
            tracing::debug!(path = %change.path.display(), "discarding repository metadata event");
            self.stats.discarded += 1;
            return Ok(None);
        }

        self.state = DispatchState::Publishing;
        tracing::debug!(path = %change.path.display(), "publishing");
        let handler = Arc::clone(&self.handler);
        let path = change.path.clone();
        let joined = tokio::task::spawn_blocking(move || handler.on_write_complete(&path)).await;
        self.state = DispatchState::Idle;

        let outcome =
            joined.map_err(|err| DaemonError::Join(format!("publish task join error: {err}")))?;
        match outcome {
            Ok(result) => {
                if result.is_success() {
                    self.stats.published += 1;
                } else {
                    self.stats.failed += 1;
                }
                Ok(Some(result))
            }
            Err(err) => {
                self.stats.spawn_failures += 1;
                tracing::error!(
                    path = %change.path.display(),
                    error = %err,
                    "failed to push changes",
                );
                if self.options.exit_on_spawn_failure {
                    return Err(err.into());
                }
                Ok(None)
            }
        }
    }

    fn is_ignored(&self, path: &Path) -> bool {
        self.options
            .repository
            .as_ref()
            .is_some_and(|repo| repo.owns_metadata(path))
    }
}

/// Split a notify event into one [`ChangeEvent`] per path.
pub fn translate(event: &Event) -> Vec<ChangeEvent> {
    let write_complete = is_write_complete(&event.kind);
    event
        .paths
        .iter()
        .map(|path| {
            if write_complete {
                ChangeEvent::write_complete(path)
            } else {
                ChangeEvent::other(path)
            }
        })
        .collect()
}

/// inotify `IN_CLOSE_WRITE`.
fn is_write_complete(kind: &EventKind) -> bool {
    matches!(kind, EventKind::Access(AccessKind::Close(AccessMode::Write)))
}
