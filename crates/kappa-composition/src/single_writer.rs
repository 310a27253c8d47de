//! Single-writer lock per category
//!
//! A category is edited by at most one process at a time. The lock is a file
//! created with create-new semantics, so acquisition is atomic on every
//! platform, and it is released when the guard drops.

use crate::error::CompositionError;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// File extension of lock files
pub const LOCK_EXTENSION: &str = "lock";

/// Guard holding `<dir>/<key>.lock`
///
/// Directories created by [`CategoryLock::acquire`] are removed again on
/// drop when they are empty.
#[derive(Debug)]
pub struct CategoryLock {
    path: PathBuf,
    created_dirs: Vec<PathBuf>,
}

impl CategoryLock {
    /// Acquire the lock for `key` inside `dir`
    ///
    /// # Errors
    /// - [`CompositionError::LockHeld`] if the lock file already exists
    /// - [`CompositionError::Io`] if the directory or file cannot be created
    pub fn acquire(dir: &Path, key: &str) -> Result<Self, CompositionError> {
        let created_dirs = create_missing_dirs(dir)?;
        let path = dir.join(format!("{key}.{LOCK_EXTENSION}"));

        let file = OpenOptions::new().write(true).create_new(true).open(&path);
        let mut file = match file {
            Ok(file) => file,
            Err(e) => {
                remove_empty_dirs(&created_dirs);
                return Err(if e.kind() == io::ErrorKind::AlreadyExists {
                    CompositionError::LockHeld { path }
                } else {
                    CompositionError::io(&path, e)
                });
            }
        };
        // Owner pid, informational only
        if let Err(e) = writeln!(file, "{}", std::process::id()) {
            tracing::warn!("Failed to record owner in {}: {}", path.display(), e);
        }

        tracing::debug!("Acquired lock {}", path.display());
        Ok(Self { path, created_dirs })
    }

    /// Lock file path
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for CategoryLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            tracing::warn!("Failed to release lock {}: {}", self.path.display(), e);
        } else {
            tracing::debug!("Released lock {}", self.path.display());
        }
        remove_empty_dirs(&self.created_dirs);
    }
}

/// Create `dir` and its missing ancestors; returns the created ones, deepest first
fn create_missing_dirs(dir: &Path) -> Result<Vec<PathBuf>, CompositionError> {
    let mut missing = Vec::new();
    let mut current = Some(dir);
    while let Some(path) = current {
        if path.as_os_str().is_empty() || path.exists() {
            break;
        }
        missing.push(path.to_path_buf());
        current = path.parent();
    }
    fs::create_dir_all(dir).map_err(|e| CompositionError::io(dir, e))?;
    Ok(missing)
}

fn remove_empty_dirs(dirs: &[PathBuf]) {
    for dir in dirs {
        // Fails on non-empty directories, which belong to someone else now
        if fs::remove_dir(dir).is_err() {
            break;
        }
    }
}
