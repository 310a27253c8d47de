//! Kappa Constitutional Layer
//!
//! The trusted boundary between a generated project on disk and the
//! engine's in-memory syntax trees.
//!
//! # Core Operations
//!
//! - **Layout**: every project path derived from the root and `kappa.yaml`
//! - **Ingress**: read and parse Go sources into [`SourceFile`](kappa_artifact::SourceFile)
//! - **Egress**: render and stage files into a [`Transaction`](kappa_composition::Transaction)
//! - **Settings**: append `key: value` lines to category settings files
//!
//! # Architecture
//!
//! ```text
//! File System → parse_ingress → SourceFile → (engine edits)
//!             → stage_egress → Transaction → commit
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

// Core modules
pub mod config;
pub mod error;
pub mod layer;
pub mod layout;
pub mod settings;

// Re-exports for convenience
pub use config::{ToolConfig, CONFIG_FILE};
pub use error::{ConfigError, ParseError, SerializeError};
pub use layer::{ConstitutionalLayer, ParsedSource};
pub use layout::{ProjectLayout, ENTRY_FILE, LOCKS_DIR, SOURCE_EXTENSION};
pub use settings::{append_setting, setting_keys, setting_line};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
