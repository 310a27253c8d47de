//! Error types for the artifact layer
//!
//! - [`ParseError`]: source text → [`SourceFile`](crate::SourceFile)
//! - [`FormatError`]: [`SourceFile`](crate::SourceFile) → canonical text

/// Errors while parsing Go source text
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// The tree-sitter grammar could not be loaded
    #[error("parser initialization failed: {0}")]
    ParserInit(String),

    /// tree-sitter produced no tree at all
    #[error("parse failed")]
    ParseFailed,

    /// Source contains a syntax error (1-based position)
    #[error("syntax error at {line}:{column}: {message}")]
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },
}

/// Errors while rendering a syntax tree back to text
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    /// The rendered text does not parse back as Go
    #[error("rendered source is not valid Go: {0}")]
    InvalidOutput(#[from] ParseError),

    /// A node id does not belong to the file being rendered
    #[error("dangling {kind} id {id}")]
    DanglingNode { kind: &'static str, id: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syntax_error_display() {
        let err = ParseError::Syntax {
            line: 3,
            column: 7,
            message: "unexpected input".to_string(),
        };
        assert_eq!(err.to_string(), "syntax error at 3:7: unexpected input");
    }

    #[test]
    fn format_error_wraps_parse_error() {
        let err: FormatError = ParseError::ParseFailed.into();
        assert!(err.to_string().contains("not valid Go"));
    }
}
