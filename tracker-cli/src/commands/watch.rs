//! `dotfile-tracker watch` — the long-running watcher.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use tracker_core::{RawSettings, TrackerSettings};
use tracker_daemon::{start_blocking, LogFormat};

/// Arguments for `dotfile-tracker watch`.
#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Files to monitor: a comma-separated list, or a path to a file with one
    /// target per line.
    #[arg(short = 'f', long)]
    pub files: String,

    /// System user; the work tree is /home/<user>.
    #[arg(short = 'u', long)]
    pub username: String,

    /// Git branch to push.
    #[arg(short = 'b', long)]
    pub branch: String,

    /// Absolute path of the git repository (default /home/<user>/.dotfiles).
    #[arg(short = 'p', long = "path")]
    pub repo_path: Option<PathBuf>,

    /// Instance lock file (default <tmp>/.dotfile_tracker.pid).
    #[arg(long)]
    pub lock_file: Option<PathBuf>,

    /// Git executable to run.
    #[arg(long, value_name = "PROGRAM")]
    pub git: Option<PathBuf>,

    /// Kill a git step that runs longer than this many seconds.
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub git_timeout: Option<u64>,

    /// Exit when git cannot be launched instead of logging and carrying on.
    #[arg(long)]
    pub exit_on_spawn_failure: bool,

    /// Emit log lines as JSON.
    #[arg(long)]
    pub json_logs: bool,
}

impl WatchArgs {
    pub fn run(self) -> Result<()> {
        let log_format = if self.json_logs {
            LogFormat::Json
        } else {
            LogFormat::Text
        };
        let settings = TrackerSettings::resolve(self.into_raw()).context("invalid configuration")?;

        match start_blocking(settings, log_format) {
            Ok(_) => Ok(()),
            Err(err) if err.is_already_running() => {
                println!("{} {err}", "[!]".yellow().bold());
                Ok(())
            }
            Err(err) => Err(err).context("watcher exited with error"),
        }
    }

    fn into_raw(self) -> RawSettings {
        RawSettings {
            files: self.files,
            user: self.username,
            branch: self.branch,
            repo_path: self.repo_path,
            lock_path: self.lock_file,
            git_program: self.git,
            git_timeout: self.git_timeout.map(Duration::from_secs),
            exit_on_spawn_failure: self.exit_on_spawn_failure,
        }
    }
}
