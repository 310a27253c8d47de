//! Constitutional Layer - Main entry point
//!
//! Provides the trusted boundary for:
//! - File → [`SourceFile`] parsing (ingress)
//! - [`SourceFile`] → staged file rendering (egress)

use crate::error::{ParseError, SerializeError};
use crate::layout::ProjectLayout;
use kappa_artifact::{ContentHash, Emitter, GoFormatter, SourceFile};
use kappa_composition::Transaction;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Result of parsing a file
#[derive(Debug, Clone)]
pub struct ParsedSource {
    /// File path
    pub path: PathBuf,
    /// Parsed tree, mutated in place by the engine
    pub file: SourceFile,
    /// Hash of the bytes that were parsed
    pub checksum: ContentHash,
}

/// Constitutional Layer - Trusted transformation boundary
///
/// Engine operations read and write project files only through this layer.
/// Writes are never applied directly; they are staged into a
/// [`Transaction`] owned by the caller.
#[derive(Clone)]
pub struct ConstitutionalLayer {
    layout: ProjectLayout,
    emitter: Arc<dyn Emitter>,
}

impl fmt::Debug for ConstitutionalLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstitutionalLayer")
            .field("root", &self.layout.root())
            .finish_non_exhaustive()
    }
}

impl ConstitutionalLayer {
    /// Create layer rendering with [`GoFormatter`]
    #[inline]
    #[must_use]
    pub fn new(layout: ProjectLayout) -> Self {
        Self::with_emitter(layout, Arc::new(GoFormatter::new()))
    }

    /// Create layer with a custom emitter
    #[inline]
    #[must_use]
    pub fn with_emitter(layout: ProjectLayout, emitter: Arc<dyn Emitter>) -> Self {
        Self { layout, emitter }
    }

    /// Project layout
    #[inline]
    #[must_use]
    pub fn layout(&self) -> &ProjectLayout {
        &self.layout
    }

    /// Read a text file; `None` when it does not exist
    ///
    /// # Errors
    /// - `ParseError::Io` if the read fails
    /// - `ParseError::Encoding` if the file is not UTF-8
    pub fn read_text(&self, path: &Path) -> Result<Option<String>, ParseError> {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ParseError::io_error(path, e)),
        };
        String::from_utf8(bytes)
            .map(Some)
            .map_err(|_| ParseError::Encoding {
                path: path.to_path_buf(),
            })
    }

    /// Parse a Go source file (Ingress); `None` when it does not exist
    ///
    /// # Errors
    /// - `ParseError::Syntax` if the file has invalid syntax
    /// - `ParseError::Io` / `ParseError::Encoding` if reading fails
    pub fn parse_ingress(&self, path: &Path) -> Result<Option<ParsedSource>, ParseError> {
        let Some(text) = self.read_text(path)? else {
            return Ok(None);
        };
        let checksum = ContentHash::compute(text.as_bytes());
        let file = SourceFile::parse(&text).map_err(|source| ParseError::Syntax {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!("Parsed {} ({})", path.display(), checksum.short());
        Ok(Some(ParsedSource {
            path: path.to_path_buf(),
            file,
            checksum,
        }))
    }

    /// Render a parsed file back over its origin (Egress)
    ///
    /// The commit is refused if the file changed since it was parsed.
    ///
    /// # Errors
    /// - `SerializeError::Format` if the tree does not render to valid source
    /// - `SerializeError::Stage` on staging failure or a detected conflict
    pub fn stage_egress(
        &self,
        tx: &mut Transaction,
        parsed: &ParsedSource,
    ) -> Result<(), SerializeError> {
        let text = self.render(&parsed.path, &parsed.file)?;
        tx.stage_replace(&parsed.path, text, parsed.checksum)?;
        Ok(())
    }

    /// Render a new file to `path` (Egress)
    ///
    /// The commit is refused if `path` comes into existence in the meantime.
    ///
    /// # Errors
    /// See [`ConstitutionalLayer::stage_egress`].
    pub fn stage_new(
        &self,
        tx: &mut Transaction,
        path: &Path,
        file: &SourceFile,
    ) -> Result<(), SerializeError> {
        let text = self.render(path, file)?;
        tx.stage_write(path, text)?;
        Ok(())
    }

    fn render(&self, path: &Path, file: &SourceFile) -> Result<String, SerializeError> {
        self.emitter
            .emit(file)
            .map_err(|source| SerializeError::Format {
                path: path.to_path_buf(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ToolConfig;
    use kappa_artifact::{Field, FormatError, Member};
    use pretty_assertions::assert_eq;

    const SOURCE: &str = "package config\n\ntype BillingConfig struct {\n}\n";

    fn layer(root: &Path) -> ConstitutionalLayer {
        ConstitutionalLayer::new(ProjectLayout::new(root, ToolConfig::default()))
    }

    #[test]
    fn ingress_then_egress() {
        let root = tempfile::tempdir().unwrap();
        let path = root.path().join("billing.go");
        std::fs::write(&path, SOURCE).unwrap();
        let layer = layer(root.path());

        let mut parsed = layer.parse_ingress(&path).unwrap().unwrap();
        let id = parsed.file.find_struct("BillingConfig").unwrap();
        parsed
            .file
            .push_member(id, Member::field(Field::new("Retries", "int")));

        let mut tx = Transaction::new();
        layer.stage_egress(&mut tx, &parsed).unwrap();
        tx.commit().unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "package config\n\ntype BillingConfig struct {\n\tRetries int\n}\n"
        );
    }

    #[test]
    fn missing_file_is_none() {
        let root = tempfile::tempdir().unwrap();
        let layer = layer(root.path());
        assert!(layer
            .parse_ingress(&root.path().join("absent.go"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn syntax_error_names_the_file() {
        let root = tempfile::tempdir().unwrap();
        let path = root.path().join("broken.go");
        std::fs::write(&path, "package config\n\ntype X struct {\n").unwrap();
        let err = layer(root.path()).parse_ingress(&path).unwrap_err();
        assert!(matches!(err, ParseError::Syntax { .. }));
        assert!(err.to_string().contains("broken.go"));
    }

    #[derive(Debug)]
    struct Refusing;

    impl Emitter for Refusing {
        fn emit(&self, _file: &SourceFile) -> Result<String, FormatError> {
            Err(FormatError::DanglingNode {
                kind: "member",
                id: 0,
            })
        }
    }

    #[test]
    fn emitter_failure_stages_nothing() {
        let root = tempfile::tempdir().unwrap();
        let layer = ConstitutionalLayer::with_emitter(
            ProjectLayout::new(root.path(), ToolConfig::default()),
            Arc::new(Refusing),
        );
        let mut tx = Transaction::new();
        let err = layer
            .stage_new(&mut tx, &root.path().join("x.go"), &SourceFile::new("config"))
            .unwrap_err();
        assert!(matches!(err, SerializeError::Format { .. }));
        assert!(tx.is_empty());
    }
}
