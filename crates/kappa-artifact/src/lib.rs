//! Kappa Artifact Layer
//!
//! Owned, arena-backed model of a Go source file with round-trip support.
//!
//! # Core Concepts
//!
//! - [`SourceFile`]: package clause, [`ImportBlock`] and top-level items
//! - [`SourceFile::parse`]: tree-sitter ingress, untouched constructs kept verbatim
//! - [`Emitter`] / [`GoFormatter`]: `gofmt`-style egress, verified by re-parsing
//! - [`ContentHash`]: 32-byte Blake3 hash used for stale-write detection
//!
//! # Example
//!
//! ```rust,ignore
//! use kappa_artifact::{Field, Member, SourceFile};
//!
//! let mut file = SourceFile::parse(source)?;
//! let id = file.find_struct("BillingConfig").unwrap();
//! file.push_member(id, Member::field(Field::new("Retries", "int")));
//! let text = file.render()?;
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod error;
mod hash;
mod imports;
mod parse;
mod render;
mod tabwriter;
mod tree;

pub use error::{FormatError, ParseError};
pub use hash::ContentHash;
pub use imports::{is_std_path, ImportBlock, ImportSpec};
pub use parse::check_syntax;
pub use render::{Emitter, GoFormatter};
pub use tree::{
    quote, Expr, Field, FuncDecl, Item, ItemId, ItemKind, Member, MemberId, MemberKind,
    SourceFile, Stmt, StmtId, StmtKind, StructDecl,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
