//! Well-known filesystem locations.
//!
//! Functions suffixed `_at` take the base directory explicitly so tests can
//! point them at a `TempDir`.

use std::path::{Path, PathBuf};

/// Parent of every user's home directory.
pub const HOME_ROOT: &str = "/home";

/// Repository metadata directory name inside a user's home.
pub const DEFAULT_REPO_DIR: &str = ".dotfiles";

/// Lock file name inside the temp directory.
pub const LOCK_FILE_NAME: &str = ".dotfile_tracker.pid";

/// Prefix of every commit message the tracker writes.
pub const COMMIT_PREFIX: &str = "dotfile_tracker update: ";

/// `/home/<user>`
pub fn work_tree(user: &str) -> PathBuf {
    Path::new(HOME_ROOT).join(user)
}

/// `/home/<user>/.dotfiles/`
///
/// The trailing separator is kept; git accepts it and it matches how the
/// path is echoed at startup.
pub fn default_repo_path(user: &str) -> PathBuf {
    work_tree(user).join(DEFAULT_REPO_DIR).join("")
}

/// `<tmp>/.dotfile_tracker.pid`
pub fn default_lock_path_at(tmp: &Path) -> PathBuf {
    tmp.join(LOCK_FILE_NAME)
}

/// `default_lock_path_at` using the process temp directory.
pub fn default_lock_path() -> PathBuf {
    default_lock_path_at(&std::env::temp_dir())
}
