//! Staged multi-file commit
//!
//! Every staged target gets a temporary file next to it, so the final move is
//! a same-directory rename. The content hash observed at staging time is
//! checked again right before commit; any difference means a concurrent
//! writer touched the file and the whole commit is refused.
//!
//! A replaced file keeps its permissions; a new file gets `0644` on unix.

use crate::error::CompositionError;
use kappa_artifact::ContentHash;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

#[derive(Debug)]
struct Staged {
    target: PathBuf,
    /// Content at staging time; `None` if the target did not exist
    original: Option<Vec<u8>>,
    observed: Option<ContentHash>,
    content: Vec<u8>,
    temp: NamedTempFile,
}

/// Set of file replacements applied together
///
/// Dropping an uncommitted transaction discards all staged temporaries.
#[derive(Debug, Default)]
pub struct Transaction {
    staged: Vec<Staged>,
}

impl Transaction {
    /// Empty transaction
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of staged targets
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.staged.len()
    }

    /// Nothing staged
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }

    /// Content that `target` will have after commit, if staged
    #[must_use]
    pub fn staged_content(&self, target: &Path) -> Option<&[u8]> {
        self.find(target).map(|s| s.content.as_slice())
    }

    /// Stage `bytes` as the new content of `target`
    ///
    /// Staging the same target again replaces the staged content but keeps
    /// the hash observed the first time.
    ///
    /// # Errors
    /// Returns [`CompositionError::Io`] if the target cannot be read or the
    /// temporary file cannot be written (e.g. the parent directory is missing).
    pub fn stage_write(
        &mut self,
        target: impl Into<PathBuf>,
        bytes: impl Into<Vec<u8>>,
    ) -> Result<(), CompositionError> {
        let target = target.into();
        let content = bytes.into();
        let temp = write_temp(&target, &content)?;

        if let Some(index) = self.staged.iter().position(|s| s.target == target) {
            let staged = &mut self.staged[index];
            staged.content = content;
            staged.temp = temp;
            tracing::debug!("Restaged {}", target.display());
            return Ok(());
        }

        let original = read_optional(&target)?;
        let observed = original.as_deref().map(ContentHash::compute);
        tracing::debug!(
            "Staged {} ({} bytes, was {})",
            target.display(),
            content.len(),
            observed.map_or_else(|| "absent".to_string(), |h| h.short())
        );
        self.staged.push(Staged {
            target,
            original,
            observed,
            content,
            temp,
        });
        Ok(())
    }

    /// Stage `bytes` over a target that was read earlier with hash `base`
    ///
    /// # Errors
    /// Returns [`CompositionError::Conflict`] right away if the target no
    /// longer hashes to `base`, otherwise as [`Transaction::stage_write`].
    pub fn stage_replace(
        &mut self,
        target: impl Into<PathBuf>,
        bytes: impl Into<Vec<u8>>,
        base: ContentHash,
    ) -> Result<(), CompositionError> {
        let target = target.into();
        let current = match self.find(&target) {
            Some(staged) => staged.observed,
            None => read_optional(&target)?.as_deref().map(ContentHash::compute),
        };
        if current != Some(base) {
            return Err(CompositionError::Conflict { path: target });
        }
        self.stage_write(target, bytes)
    }

    /// Stage appending `line` (plus a newline) to `target`
    ///
    /// Appends to the already staged content when `target` was staged before,
    /// otherwise to the current file content; a missing file starts empty. A
    /// newline is inserted first when the base does not end with one.
    ///
    /// # Errors
    /// See [`Transaction::stage_write`].
    pub fn stage_append(
        &mut self,
        target: impl Into<PathBuf>,
        line: &str,
    ) -> Result<(), CompositionError> {
        let target = target.into();
        let mut content = match self.find(&target) {
            Some(staged) => staged.content.clone(),
            None => read_optional(&target)?.unwrap_or_default(),
        };
        if content.last().is_some_and(|b| *b != b'\n') {
            content.push(b'\n');
        }
        content.extend_from_slice(line.as_bytes());
        content.push(b'\n');
        self.stage_write(target, content)
    }

    /// Verify every target is unchanged, then move all staged files into place
    ///
    /// # Errors
    /// - [`CompositionError::Conflict`] if a target changed since staging;
    ///   nothing is written
    /// - [`CompositionError::CommitFailed`] if a rename fails; targets already
    ///   replaced are restored first
    /// - [`CompositionError::RollbackFailed`] if that restore fails too
    pub fn commit(self) -> Result<(), CompositionError> {
        for staged in &self.staged {
            let current = read_optional(&staged.target)?;
            if current.as_deref().map(ContentHash::compute) != staged.observed {
                tracing::warn!("Refusing commit: {} changed", staged.target.display());
                return Err(CompositionError::Conflict {
                    path: staged.target.clone(),
                });
            }
        }

        let count = self.staged.len();
        let mut applied: Vec<(PathBuf, Option<Vec<u8>>)> = Vec::with_capacity(count);
        for staged in self.staged {
            let Staged {
                target,
                original,
                temp,
                ..
            } = staged;
            if let Err(e) = temp.persist(&target) {
                tracing::warn!(
                    "Commit of {} failed, rolling back {} file(s)",
                    target.display(),
                    applied.len()
                );
                rollback(&applied, &target)?;
                return Err(CompositionError::CommitFailed {
                    path: target,
                    source: e.error,
                });
            }
            applied.push((target, original));
        }

        tracing::info!("Committed {} file(s)", count);
        Ok(())
    }

    fn find(&self, target: &Path) -> Option<&Staged> {
        self.staged.iter().find(|s| s.target == target)
    }
}

fn rollback(
    applied: &[(PathBuf, Option<Vec<u8>>)],
    failed: &Path,
) -> Result<(), CompositionError> {
    for (path, original) in applied.iter().rev() {
        if let Err(source) = restore(path, original.as_deref()) {
            return Err(CompositionError::RollbackFailed {
                path: path.clone(),
                failed: failed.display().to_string(),
                source,
            });
        }
        tracing::debug!("Restored {}", path.display());
    }
    Ok(())
}

fn restore(path: &Path, original: Option<&[u8]>) -> io::Result<()> {
    let Some(bytes) = original else {
        return fs::remove_file(path);
    };
    let mut temp = NamedTempFile::new_in(staging_dir(path))?;
    temp.write_all(bytes)?;
    if let Some(permissions) = target_permissions(path)? {
        temp.as_file().set_permissions(permissions)?;
    }
    temp.persist(path).map(|_| ()).map_err(|e| e.error)
}

fn staging_dir(target: &Path) -> &Path {
    match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Permissions a staged file must carry to replace `target`
fn target_permissions(target: &Path) -> io::Result<Option<fs::Permissions>> {
    match fs::metadata(target) {
        Ok(metadata) => Ok(Some(metadata.permissions())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(new_file_permissions()),
        Err(e) => Err(e),
    }
}

#[cfg(unix)]
fn new_file_permissions() -> Option<fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn new_file_permissions() -> Option<fs::Permissions> {
    None
}

fn write_temp(target: &Path, content: &[u8]) -> Result<NamedTempFile, CompositionError> {
    let dir = staging_dir(target);
    let mut temp = NamedTempFile::new_in(dir).map_err(|e| CompositionError::io(dir, e))?;
    temp.write_all(content)
        .and_then(|()| temp.flush())
        .map_err(|e| CompositionError::io(temp.path(), e))?;
    if let Some(permissions) =
        target_permissions(target).map_err(|e| CompositionError::io(target, e))?
    {
        temp.as_file()
            .set_permissions(permissions)
            .map_err(|e| CompositionError::io(temp.path(), e))?;
    }
    Ok(temp)
}

fn read_optional(path: &Path) -> Result<Option<Vec<u8>>, CompositionError> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(CompositionError::io(path, e)),
    }
}
