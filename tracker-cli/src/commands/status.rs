//! `dotfile-tracker status` — who holds the instance lock.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use tracker_core::paths::default_lock_path;
use tracker_daemon::{inspect, LockStatus};

/// Arguments for `dotfile-tracker status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Instance lock file (default <tmp>/.dotfile_tracker.pid).
    #[arg(long)]
    pub lock_file: Option<PathBuf>,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl StatusArgs {
    pub fn run(self) -> Result<()> {
        let lock_path = self.lock_file.unwrap_or_else(default_lock_path);
        let status = inspect(&lock_path).context("failed to read lock file")?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&status).context("failed to render status JSON")?
            );
            return Ok(());
        }

        print_status(&status);
        Ok(())
    }
}

fn print_status(status: &LockStatus) {
    match (status.running, status.pid) {
        (true, Some(pid)) => println!(
            "{} watcher running (pid {pid}, lock {})",
            "●".green(),
            status.lock_path.display()
        ),
        (false, Some(pid)) => println!(
            "{} watcher not running (stale pid {pid} in {})",
            "○".dimmed(),
            status.lock_path.display()
        ),
        _ => println!(
            "{} watcher not running (no pid in {})",
            "○".dimmed(),
            status.lock_path.display()
        ),
    }
}
