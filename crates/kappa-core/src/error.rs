//! Error types for Kappa Core
//!
//! Every engine operation returns [`KappaError`]. The crate errors below it
//! convert in through `#[from]`, and [`KappaError::kind`] classifies the
//! result for the command layer.

use crate::toolchain::ToolchainError;
use kappa_composition::CompositionError;
use kappa_constitutional::{ConfigError, ParseError, SerializeError};
use kappa_symbol::NameError;
use std::path::PathBuf;

/// Coarse classification of a [`KappaError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad user input
    Argument,
    /// Category, declaration, entry point or project absent
    NotFound,
    /// Target already present
    AlreadyExists,
    /// Source text does not parse
    Parse,
    /// Tree does not render to valid source
    Format,
    /// Filesystem failure
    Io,
    /// Lock held or file changed underneath a transaction
    Conflict,
    /// External `go` command failed
    Toolchain,
    /// Malformed `kappa.yaml`
    Config,
}

/// Main kappa error type
#[derive(Debug, thiserror::Error)]
pub enum KappaError {
    /// Category or property name rejected
    #[error("invalid name: {0}")]
    InvalidName(#[from] NameError),

    /// Any other rejected argument
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Directory is not a generated project
    #[error("{} is not a kappa project: {} is missing", root.display(), missing.display())]
    NotAProject { root: PathBuf, missing: PathBuf },

    /// Category has neither settings file nor declaration
    #[error("the category {category} doesn't exist")]
    CategoryNotFound { category: String },

    /// Category source exists but does not declare the expected struct
    #[error("{} does not declare {type_name}", path.display())]
    DeclarationNotFound { path: PathBuf, type_name: String },

    /// Entry file has no `func main`
    #[error("{} has no entry function `main`", path.display())]
    EntryPointNotFound { path: PathBuf },

    /// At least one artifact of the category exists
    #[error("category {category} already exists: {}", artifact.display())]
    CategoryExists { category: String, artifact: PathBuf },

    /// Field already declared
    #[error("the property {property} in category {category} exists already")]
    PropertyExists { category: String, property: String },

    /// Entry function already loads the application configuration
    #[error("{} already loads the application configuration", path.display())]
    AlreadyBootstrapped { path: PathBuf },

    /// Project directory already present
    #[error("{} already exists (use --forceCreate to replace it)", path.display())]
    ProjectExists { path: PathBuf },

    /// Reading or parsing a source file failed
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Rendering or staging a source file failed
    #[error(transparent)]
    Serialize(#[from] SerializeError),

    /// Lock or transaction failure
    #[error(transparent)]
    Composition(#[from] CompositionError),

    /// Tool configuration unusable
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// External toolchain failed
    #[error(transparent)]
    Toolchain(#[from] ToolchainError),

    /// Direct filesystem operation failed
    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Initialization failed and the created directory could not be removed
    #[error("{original}\nfailed to remove created directory {}: {cleanup}", path.display())]
    CleanupFailed {
        /// The failure that triggered the removal
        original: Box<KappaError>,
        path: PathBuf,
        cleanup: std::io::Error,
    },
}

/// Result alias for engine operations
pub type Result<T, E = KappaError> = std::result::Result<T, E>;

impl KappaError {
    /// Create IO error for path
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Classify the error
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidName(_) | Self::InvalidArgument(_) => ErrorKind::Argument,
            Self::NotAProject { .. }
            | Self::CategoryNotFound { .. }
            | Self::DeclarationNotFound { .. }
            | Self::EntryPointNotFound { .. } => ErrorKind::NotFound,
            Self::CategoryExists { .. }
            | Self::PropertyExists { .. }
            | Self::AlreadyBootstrapped { .. }
            | Self::ProjectExists { .. } => ErrorKind::AlreadyExists,
            Self::Parse(ParseError::Io { .. }) => ErrorKind::Io,
            Self::Parse(_) => ErrorKind::Parse,
            Self::Serialize(SerializeError::Format { .. }) => ErrorKind::Format,
            Self::Serialize(SerializeError::Stage(e)) | Self::Composition(e) => composition_kind(e),
            Self::Config(_) => ErrorKind::Config,
            Self::Toolchain(_) => ErrorKind::Toolchain,
            Self::Io { .. } => ErrorKind::Io,
            Self::CleanupFailed { original, .. } => original.kind(),
        }
    }

    /// Check if error reports a missing target
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// Check if error is a concurrent-writer conflict
    #[inline]
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        self.kind() == ErrorKind::Conflict
    }
}

fn composition_kind(error: &CompositionError) -> ErrorKind {
    match error {
        CompositionError::LockHeld { .. } | CompositionError::Conflict { .. } => {
            ErrorKind::Conflict
        }
        CompositionError::Io { .. }
        | CompositionError::CommitFailed { .. }
        | CompositionError::RollbackFailed { .. } => ErrorKind::Io,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_errors_are_argument_errors() {
        let err: KappaError = kappa_symbol::CategoryName::new("9lives").unwrap_err().into();
        assert_eq!(err.kind(), ErrorKind::Argument);
    }

    #[test]
    fn lock_held_is_conflict() {
        let err: KappaError = CompositionError::LockHeld {
            path: PathBuf::from(".kappa/locks/billing.lock"),
        }
        .into();
        assert!(err.is_conflict());
    }

    #[test]
    fn staged_conflict_is_conflict() {
        let err: KappaError = SerializeError::Stage(CompositionError::Conflict {
            path: PathBuf::from("pkg/infra/config/billing.go"),
        })
        .into();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn cleanup_failure_keeps_original_kind_and_message() {
        let err = KappaError::CleanupFailed {
            original: Box::new(KappaError::EntryPointNotFound {
                path: PathBuf::from("myapp/cmd/cli/main.go"),
            }),
            path: PathBuf::from("myapp"),
            cleanup: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.is_not_found());
        let text = err.to_string();
        assert!(text.starts_with("myapp/cmd/cli/main.go has no entry function `main`\n"));
        assert!(text.ends_with("failed to remove created directory myapp: denied"));
    }
}
