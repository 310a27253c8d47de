//! Paths of a generated project
//!
//! All filesystem addresses are derived from the project root and the
//! [`ToolConfig`]; the process working directory is never consulted or
//! changed.

use crate::config::ToolConfig;
use crate::error::ConfigError;
use kappa_symbol::CategoryName;
use std::path::{Path, PathBuf};

/// Directory holding transient lock files, relative to the project root
pub const LOCKS_DIR: &str = ".kappa/locks";

/// Extension of generated Go sources
pub const SOURCE_EXTENSION: &str = "go";

/// File name of an entry point inside `<entry_dir>/<type>/`
pub const ENTRY_FILE: &str = "main.go";

/// Project root plus configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    root: PathBuf,
    config: ToolConfig,
}

impl ProjectLayout {
    /// Layout for `root` with an explicit configuration
    #[inline]
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, config: ToolConfig) -> Self {
        Self {
            root: root.into(),
            config,
        }
    }

    /// Layout for `root`, reading `kappa.yaml` when present
    ///
    /// # Errors
    /// See [`ToolConfig::load`].
    pub fn load(root: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let root = root.into();
        let config = ToolConfig::load(&root)?;
        Ok(Self { root, config })
    }

    /// Project root
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ToolConfig {
        &self.config
    }

    /// Settings directory
    #[must_use]
    pub fn settings_dir(&self) -> PathBuf {
        self.root.join(&self.config.settings_dir)
    }

    /// Generated source directory
    #[must_use]
    pub fn source_dir(&self) -> PathBuf {
        self.root.join(&self.config.source_dir)
    }

    /// Reserved templates directory
    #[must_use]
    pub fn templates_dir(&self) -> PathBuf {
        self.root.join(&self.config.templates_dir)
    }

    /// Lock directory
    #[must_use]
    pub fn locks_dir(&self) -> PathBuf {
        self.root.join(LOCKS_DIR)
    }

    /// Settings file of `category`
    #[must_use]
    pub fn settings_path(&self, category: &CategoryName) -> PathBuf {
        self.root.join(self.settings_relative(category))
    }

    /// Settings file of `category` relative to the root, `/`-separated
    ///
    /// This is the path the generated loader passes to the configuration
    /// library, which resolves it against the working directory of the
    /// running program.
    #[must_use]
    pub fn settings_relative(&self, category: &CategoryName) -> String {
        format!(
            "{}/{}.{}",
            self.config.settings_dir.trim_end_matches('/'),
            category.as_str(),
            self.config.settings_extension
        )
    }

    /// Generated source file of `category`
    #[must_use]
    pub fn source_path(&self, category: &CategoryName) -> PathBuf {
        self.source_dir()
            .join(format!("{}.{SOURCE_EXTENSION}", category.as_str()))
    }

    /// Entry point of an application type (`cli`, `api`)
    #[must_use]
    pub fn entry_path(&self, app_type: &str) -> PathBuf {
        self.root
            .join(&self.config.entry_dir)
            .join(app_type)
            .join(ENTRY_FILE)
    }

    /// Go package name of the generated sources: last segment of `source_dir`
    #[must_use]
    pub fn source_package(&self) -> &str {
        self.config
            .source_dir
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or("config")
    }

    /// Import path of the generated package inside module `module`
    #[must_use]
    pub fn config_import_path(&self, module: &str) -> String {
        format!("{module}/{}", self.config.source_dir.trim_end_matches('/'))
    }

    /// Both category directories exist
    #[must_use]
    pub fn is_project(&self) -> bool {
        self.settings_dir().is_dir() && self.source_dir().is_dir()
    }
}
