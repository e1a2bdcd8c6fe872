use std::sync::Arc;

use notify::{recommended_watcher, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::{broadcast, mpsc};

use tracker_core::{TrackerSettings, WatchTarget};
use tracker_git::{ChangePublisher, SystemGit};

use crate::dispatcher::{ChangeHandler, DispatchOptions, DispatchStats, WatchDispatcher};
use crate::error::{io_err, DaemonError};
use crate::guard;

/// Log line format for [`start_blocking`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Start the watcher and block the current thread until it exits.
pub fn start_blocking(
    settings: TrackerSettings,
    log_format: LogFormat,
) -> Result<DispatchStats, DaemonError> {
    init_tracing(log_format);
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio-runtime", e))?;
    runtime.block_on(run(settings))
}

/// Claim the instance lock, then watch and publish until shutdown.
pub async fn run(settings: TrackerSettings) -> Result<DispatchStats, DaemonError> {
    let lock = guard::acquire(&settings.lock_path)?;
    tracing::info!(pid = lock.pid, lock = %lock.lock_path.display(), "instance lock acquired");
    tracing::info!(
        repo = %settings.repository.repo_path.display(),
        work_tree = %settings.repository.work_tree.display(),
        branch = %settings.repository.branch,
        "local git repository folder",
    );

    let runner = SystemGit::with_program(&settings.git_program).with_timeout(settings.git_timeout);
    let publisher = Arc::new(ChangePublisher::new(settings.repository.clone(), runner));
    let options = DispatchOptions {
        exit_on_spawn_failure: settings.exit_on_spawn_failure,
        repository: Some(settings.repository.clone()),
    };

    let (shutdown_tx, _) = broadcast::channel::<()>(4);
    let shutdown_rx = shutdown_tx.subscribe();
    let signal_handle = tokio::spawn(wait_for_signal(shutdown_tx));

    let result = watch(&settings.targets, publisher, options, shutdown_rx).await;
    signal_handle.abort();

    if let Ok(stats) = &result {
        tracing::info!(
            published = stats.published,
            failed = stats.failed,
            spawn_failures = stats.spawn_failures,
            "watcher stopped",
        );
    }
    result
}

/// Register `targets` with the OS and dispatch events to `handler`.
///
/// Returns when `shutdown` fires, the watcher's channel closes, or the
/// dispatcher gives up on a spawn failure.
pub async fn watch<H: ChangeHandler>(
    targets: &[WatchTarget],
    handler: Arc<H>,
    options: DispatchOptions,
    shutdown: broadcast::Receiver<()>,
) -> Result<DispatchStats, DaemonError> {
    let (event_tx, event_rx) = mpsc::unbounded_channel::<notify::Result<Event>>();
    let mut watcher: RecommendedWatcher = recommended_watcher(move |event| {
        let _ = event_tx.send(event);
    })?;

    let registered = register_targets(&mut watcher, targets);
    if registered == 0 {
        return Err(DaemonError::NoTargetsRegistered {
            requested: targets.len(),
        });
    }

    let mut dispatcher = WatchDispatcher::new(handler, options);
    let result = dispatcher.run(event_rx, shutdown).await;
    drop(watcher);
    result
}

/// Add a watch per target; returns how many succeeded.
///
/// A target that cannot be watched (missing path, permissions, inotify limit)
/// is logged and skipped.
fn register_targets(watcher: &mut impl Watcher, targets: &[WatchTarget]) -> usize {
    tracing::info!(count = targets.len(), "monitoring following files");
    let mut registered = 0;
    for target in targets {
        match watcher.watch(&target.path, recursive_mode(target)) {
            Ok(()) => {
                registered += 1;
                tracing::info!(path = %target.path.display(), recursive = target.recursive, "watching");
            }
            Err(err) => {
                tracing::warn!(path = %target.path.display(), error = %err, "cannot watch path");
            }
        }
    }
    registered
}

fn recursive_mode(target: &WatchTarget) -> RecursiveMode {
    if target.recursive {
        RecursiveMode::Recursive
    } else {
        RecursiveMode::NonRecursive
    }
}

async fn wait_for_signal(shutdown: broadcast::Sender<()>) {
    match terminate_signal().await {
        Ok(name) => {
            tracing::info!(signal = name, "received signal, finishing in-flight publish");
            let _ = shutdown.send(());
        }
        Err(err) => tracing::warn!(error = %err, "signal handler failed"),
    }
}

#[cfg(unix)]
async fn terminate_signal() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut term = signal(SignalKind::terminate())?;
    tokio::select! {
        ctrl_c = tokio::signal::ctrl_c() => ctrl_c.map(|()| "SIGINT"),
        _ = term.recv() => Ok("SIGTERM"),
    }
}

#[cfg(not(unix))]
async fn terminate_signal() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await.map(|()| "ctrl-c")
}

fn init_tracing(log_format: LogFormat) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt().with_env_filter(filter).with_target(false);
    let _ = match log_format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;
    use std::time::{Duration, Instant};

    use tempfile::TempDir;
    use tracker_core::{PublishResult, PublishStep, StepReport, StepStatus};
    use tracker_git::PublishError;

    #[derive(Default)]
    struct Recorder {
        paths: Mutex<Vec<PathBuf>>,
    }

    impl ChangeHandler for Recorder {
        fn on_write_complete(&self, path: &Path) -> Result<PublishResult, PublishError> {
            self.paths.lock().unwrap().push(path.to_path_buf());
            let steps = PublishStep::ALL
                .iter()
                .map(|step| StepReport {
                    step: *step,
                    status: StepStatus::Succeeded,
                })
                .collect();
            Ok(PublishResult::from_steps(path, steps))
        }
    }

    async fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        condition()
    }

    #[tokio::test]
    async fn unregistrable_targets_are_an_error() {
        let dir = TempDir::new().unwrap();
        let missing = WatchTarget::from_path(dir.path().join("does-not-exist"));
        let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let err = watch(
            &[missing],
            Arc::new(Recorder::default()),
            DispatchOptions::default(),
            shutdown_rx,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, DaemonError::NoTargetsRegistered { requested: 1 }), "got: {err}");
    }

    #[cfg(target_os = "linux")]
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn closing_a_written_file_under_a_watched_dir_publishes_it() {
        let home = TempDir::new().unwrap();
        let config = home.path().join(".config");
        std::fs::create_dir_all(config.join("nvim")).unwrap();
        let init = config.join("nvim").join("init.lua");

        let recorder = Arc::new(Recorder::default());
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let task = {
            let recorder = recorder.clone();
            let targets = vec![WatchTarget::from_path(&config)];
            tokio::spawn(async move {
                watch(&targets, recorder, DispatchOptions::default(), shutdown_rx).await
            })
        };

        // Give inotify time to register before writing.
        tokio::time::sleep(Duration::from_millis(200)).await;
        std::fs::write(&init, "vim.opt.number = true\n").unwrap();

        let published = wait_until(Duration::from_secs(5), || {
            recorder.paths.lock().unwrap().contains(&init)
        })
        .await;
        shutdown_tx.send(()).unwrap();
        let stats = task.await.unwrap().unwrap();

        assert!(published, "write to {} was not published", init.display());
        assert!(stats.published >= 1);
    }

    #[cfg(target_os = "linux")]
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn saving_a_watched_file_publishes_it_once() {
        let home = TempDir::new().unwrap();
        let bashrc = home.path().join(".bashrc");
        std::fs::write(&bashrc, "export EDITOR=vi\n").unwrap();

        let recorder = Arc::new(Recorder::default());
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let task = {
            let recorder = recorder.clone();
            let targets = vec![WatchTarget::from_path(&bashrc)];
            tokio::spawn(async move {
                watch(&targets, recorder, DispatchOptions::default(), shutdown_rx).await
            })
        };

        tokio::time::sleep(Duration::from_millis(200)).await;
        std::fs::write(&bashrc, "export EDITOR=nvim\n").unwrap();

        let published = wait_until(Duration::from_secs(5), || {
            !recorder.paths.lock().unwrap().is_empty()
        })
        .await;
        // Leave room for a duplicate to show up before counting.
        tokio::time::sleep(Duration::from_millis(300)).await;
        shutdown_tx.send(()).unwrap();
        let stats = task.await.unwrap().unwrap();

        assert!(published, "save of {} was not published", bashrc.display());
        assert_eq!(*recorder.paths.lock().unwrap(), vec![bashrc]);
        assert_eq!(stats.published, 1);
    }

    #[cfg(target_os = "linux")]
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn reading_a_watched_file_publishes_nothing() {
        let home = TempDir::new().unwrap();
        let bashrc = home.path().join(".bashrc");
        std::fs::write(&bashrc, "export EDITOR=vi\n").unwrap();

        let recorder = Arc::new(Recorder::default());
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let task = {
            let recorder = recorder.clone();
            let targets = vec![WatchTarget::from_path(&bashrc)];
            tokio::spawn(async move {
                watch(&targets, recorder, DispatchOptions::default(), shutdown_rx).await
            })
        };

        tokio::time::sleep(Duration::from_millis(200)).await;
        let _ = std::fs::read_to_string(&bashrc).unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;
        shutdown_tx.send(()).unwrap();
        task.await.unwrap().unwrap();

        assert!(recorder.paths.lock().unwrap().is_empty());
    }
}
