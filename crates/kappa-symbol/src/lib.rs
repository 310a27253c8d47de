//! Kappa Symbol System
//!
//! Names are the identity of everything kappa generates.
//!
//! # Overview
//!
//! - **CategoryName** / **PropertyName**: lowercased, validated names
//! - **title_case** / **config_type_name** / **loader_name**: Go identifier derivation
//! - **TypeImportTable**: package qualifier → import path for declared types
//!
//! # Example
//!
//! ```rust
//! use kappa_symbol::{CategoryName, PropertyName};
//!
//! let category = CategoryName::new("Billing").unwrap();
//! assert_eq!(category.type_name(), "BillingConfig");
//!
//! let property = PropertyName::new("retrydelay").unwrap();
//! assert_eq!(property.field_name(), "Retrydelay");
//! ```

#![warn(missing_docs)]

pub mod name;
pub mod table;

// Re-exports
pub use name::{
    config_type_name, loader_name, title_case, CategoryName, NameError, PropertyName,
    CONFIG_TYPE_SUFFIX, LOADER_PREFIX,
};
pub use table::{qualifiers, TypeImportTable};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
