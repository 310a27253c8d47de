//! Error types for the Constitutional Layer
//!
//! - [`ConfigError`]: `kappa.yaml` cannot be read or is malformed
//! - [`ParseError`]: file → [`SourceFile`](kappa_artifact::SourceFile)
//! - [`SerializeError`]: [`SourceFile`](kappa_artifact::SourceFile) → staged file

use kappa_artifact::FormatError;
use kappa_composition::CompositionError;
use std::path::PathBuf;

/// Errors loading the tool configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error during file read
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML does not match the configuration schema
    #[error("malformed {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A value is present but unusable
    #[error("invalid `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Errors during file parsing (ingress)
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// Syntax error in source file
    #[error("syntax error in {path}: {source}")]
    Syntax {
        path: PathBuf,
        #[source]
        source: kappa_artifact::ParseError,
    },

    /// File is not valid UTF-8
    #[error("{path} is not valid UTF-8")]
    Encoding { path: PathBuf },

    /// IO error during file read
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ParseError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors during serialization (egress)
#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    /// Rendered tree is not valid source
    #[error("cannot render {path}: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: FormatError,
    },

    /// Staging the rendered bytes failed
    #[error(transparent)]
    Stage(#[from] CompositionError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_config_display() {
        let err = ConfigError::Invalid {
            field: "source_dir",
            reason: "must be relative".to_string(),
        };
        assert_eq!(err.to_string(), "invalid `source_dir`: must be relative");
    }

    #[test]
    fn stage_error_is_transparent() {
        let err: SerializeError = CompositionError::Conflict {
            path: PathBuf::from("config/billing.yaml"),
        }
        .into();
        assert!(err.to_string().starts_with("config/billing.yaml was modified"));
    }
}
