//! Kappa Composition System
//!
//! Safe multi-file edits of a generated project.
//!
//! # Core Concepts
//!
//! - [`CategoryLock`]: single writer per category, held for the whole
//!   check-then-act sequence
//! - [`Transaction`]: stages several file replacements and commits them
//!   together after re-verifying each target's content hash
//!
//! # Example
//!
//! ```rust,ignore
//! use kappa_composition::{CategoryLock, Transaction};
//!
//! let _lock = CategoryLock::acquire(&locks_dir, "billing")?;
//! let mut tx = Transaction::new();
//! tx.stage_write(&source_path, rendered)?;
//! tx.stage_append(&settings_path, "retrydelay: 0")?;
//! tx.commit()?;
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod error;
mod single_writer;
mod transaction;

// Re-exports
pub use error::CompositionError;
pub use single_writer::{CategoryLock, LOCK_EXTENSION};
pub use transaction::Transaction;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
