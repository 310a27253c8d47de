//! Kappa Core - project scaffolding and Go code generation
//!
//! The engine behind the `kappa` commands:
//! - Creates projects with an entry point bootstrapped to load its settings
//! - Creates configuration categories (settings file + Go struct + loader)
//! - Adds properties to categories (struct field + settings line)
//!
//! # Example
//!
//! ```rust,no_run
//! use kappa_core::{init_project, InitOptions, NoopToolchain, Project};
//!
//! # fn example() -> Result<(), kappa_core::KappaError> {
//! let layout = init_project(&InitOptions::new("myapp", "."), &NoopToolchain)?;
//!
//! let project = Project::open(layout.root())?;
//! project.create_category("billing")?;
//! let default = project.add_property("billing", "retrydelay", "int")?;
//! assert_eq!(default.as_str(), "0");
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
pub mod category;
pub mod entry;
pub mod error;
pub mod init;
pub mod locate;
pub mod project;
pub mod synth;
pub mod templates;
pub mod toolchain;

// Re-exports for convenience
pub use category::{add_property, build_category_file, category_exists, create_category, Seed};
pub use entry::{inject_bootstrap, Bootstrap, BootstrapRefusal, APPLICATION_CONFIG_VAR};
pub use error::{ErrorKind, KappaError};
pub use init::{init_project, validate_project_name, InitOptions, APPLICATION_CATEGORY};
pub use locate::{find_declaration, has_field, locate, Declaration};
pub use project::Project;
pub use synth::{default_value_for, synthesize_field, DefaultValue, PLACEHOLDER_VALUE};
pub use templates::ApplicationType;
pub use toolchain::{GoToolchain, NoopToolchain, Toolchain, ToolchainError};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for driving the engine
    pub use crate::{
        init_project, ApplicationType, DefaultValue, ErrorKind, InitOptions, KappaError, Project,
        Toolchain,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
