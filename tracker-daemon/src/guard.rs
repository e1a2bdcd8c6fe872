//! Single-instance guard backed by a pid file.
//!
//! The lock file holds one integer: the pid of the watcher that owns it. It is
//! never deleted; a stale pid left by a dead process is detected with a
//! zero-effect liveness probe on the next start.
//!
//! Known edge case: if the file holds the caller's own pid (a previous run
//! crashed and the pid was reused by this process), the probe succeeds and
//! `acquire` reports [`GuardError::AlreadyRunning`].

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GuardError {
    #[error("instance already running with pid {pid} (lock file {path})")]
    AlreadyRunning { pid: u32, path: PathBuf },

    #[error("lock file I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn lock_err(path: &Path, source: io::Error) -> GuardError {
    GuardError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Proof that this process now owns the lock file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Acquired {
    pub pid: u32,
    pub lock_path: PathBuf,
}

/// Read-only view of a lock file, for status reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LockStatus {
    pub lock_path: PathBuf,
    /// Pid recorded in the file, if it parses.
    pub pid: Option<u32>,
    /// Whether the recorded pid belongs to a live process.
    pub running: bool,
}

/// Claim `lock_path` for the current process.
///
/// Check-then-write is not atomic; two watchers started in the same instant
/// may both succeed.
pub fn acquire(lock_path: &Path) -> Result<Acquired, GuardError> {
    acquire_as(lock_path, std::process::id())
}

/// [`acquire`] on behalf of `pid`.
pub fn acquire_as(lock_path: &Path, pid: u32) -> Result<Acquired, GuardError> {
    if let Some(parent) = lock_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| lock_err(parent, e))?;
        }
    }

    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(lock_path)
        .map_err(|e| lock_err(lock_path, e))?;

    if let Some(holder) = read_pid(&file).map_err(|e| lock_err(lock_path, e))? {
        if is_process_alive(holder) {
            tracing::debug!(pid = holder, lock = %lock_path.display(), "lock held by live process");
            return Err(GuardError::AlreadyRunning {
                pid: holder,
                path: lock_path.to_path_buf(),
            });
        }
        tracing::debug!(pid = holder, lock = %lock_path.display(), "replacing stale lock");
    }

    write_pid(&mut file, pid).map_err(|e| lock_err(lock_path, e))?;
    Ok(Acquired {
        pid,
        lock_path: lock_path.to_path_buf(),
    })
}

/// Report who holds `lock_path` without touching it.
pub fn inspect(lock_path: &Path) -> Result<LockStatus, GuardError> {
    let pid = match File::open(lock_path) {
        Ok(file) => read_pid(&file).map_err(|e| lock_err(lock_path, e))?,
        Err(err) if err.kind() == io::ErrorKind::NotFound => None,
        Err(err) => return Err(lock_err(lock_path, err)),
    };
    Ok(LockStatus {
        lock_path: lock_path.to_path_buf(),
        pid,
        running: pid.is_some_and(is_process_alive),
    })
}

/// First line as a positive pid. Anything else means "no holder".
fn read_pid(file: &File) -> io::Result<Option<u32>> {
    let mut line = String::new();
    BufReader::new(file).read_line(&mut line)?;
    Ok(parse_pid(&line))
}

fn parse_pid(line: &str) -> Option<u32> {
    // pid 0 and negatives address process groups in kill(2).
    line.trim().parse::<i32>().ok().filter(|pid| *pid > 0).map(|pid| pid as u32)
}

fn write_pid(file: &mut File, pid: u32) -> io::Result<()> {
    file.set_len(0)?;
    file.seek(SeekFrom::Start(0))?;
    write!(file, "{pid}")?;
    file.flush()
}

/// Probe `pid` with signal 0. A process owned by another user still counts.
#[cfg(unix)]
pub fn is_process_alive(pid: u32) -> bool {
    use nix::errno::Errno;
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    let Ok(raw) = i32::try_from(pid) else {
        return false;
    };
    match kill(Pid::from_raw(raw), None) {
        Ok(()) => true,
        Err(Errno::EPERM) => true,
        Err(_) => false,
    }
}

#[cfg(not(unix))]
pub fn is_process_alive(pid: u32) -> bool {
    // Only the current process can be confirmed without a platform probe.
    pid == std::process::id()
}
