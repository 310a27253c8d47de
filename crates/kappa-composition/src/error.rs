//! Errors for locking and staged commits

use std::io;
use std::path::PathBuf;

/// Errors from [`CategoryLock`](crate::CategoryLock) and
/// [`Transaction`](crate::Transaction)
#[derive(Debug, thiserror::Error)]
pub enum CompositionError {
    /// Another writer holds the lock
    #[error("lock {} is held by another writer", path.display())]
    LockHeld {
        /// Lock file path
        path: PathBuf,
    },

    /// Target changed between staging and commit
    #[error("{} was modified by another writer since it was staged", path.display())]
    Conflict {
        /// Target path
        path: PathBuf,
    },

    /// Filesystem access failed
    #[error("i/o error on {}: {source}", path.display())]
    Io {
        /// Path being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// Moving a staged file into place failed; earlier targets were restored
    #[error("commit failed on {}: {source}", path.display())]
    CommitFailed {
        /// Target that could not be replaced
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// Restoring an already replaced target failed during rollback
    #[error("rollback of {} failed after commit error on {failed}: {source}", path.display())]
    RollbackFailed {
        /// Target left in its new state
        path: PathBuf,
        /// Target whose commit failed first
        failed: String,
        /// Underlying error
        #[source]
        source: io::Error,
    },
}

impl CompositionError {
    /// Wrap an I/O error with its path
    #[inline]
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// True for lock contention and stale-write detection
    #[inline]
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::LockHeld { .. } | Self::Conflict { .. })
    }
}
