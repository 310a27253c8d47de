//! Tool configuration (`kappa.yaml`)
//!
//! Every directory, suffix and library path the engine uses has a default;
//! a `kappa.yaml` in the project root may override any of them.

use crate::error::ConfigError;
use kappa_symbol::TypeImportTable;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path};

/// File name of the tool configuration in a project root
pub const CONFIG_FILE: &str = "kappa.yaml";

/// Tool configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolConfig {
    /// Settings files directory (`config`)
    pub settings_dir: String,
    /// Settings file extension without dot (`yaml`)
    pub settings_extension: String,
    /// Generated Go package directory (`pkg/infra/config`)
    pub source_dir: String,
    /// Entry points directory (`cmd`)
    pub entry_dir: String,
    /// Reserved templates directory (`templates`)
    pub templates_dir: String,
    /// Module path of the configuration library
    pub config_library: String,
    /// Module path of the web framework for api projects
    ///
    /// The api template is written against the gin API, so this must be gin
    /// or a fork exposing the same package.
    pub web_framework: String,
    /// Extra qualifier → import path entries, on top of the built-in ones
    pub type_imports: TypeImportTable,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            settings_dir: "config".to_string(),
            settings_extension: "yaml".to_string(),
            source_dir: "pkg/infra/config".to_string(),
            entry_dir: "cmd".to_string(),
            templates_dir: "templates".to_string(),
            config_library: "github.com/spf13/viper".to_string(),
            web_framework: "github.com/gin-gonic/gin".to_string(),
            type_imports: TypeImportTable::empty(),
        }
    }
}

impl ToolConfig {
    /// Load `<root>/kappa.yaml`, or defaults when the file is absent
    ///
    /// # Errors
    /// - [`ConfigError::Io`] if the file exists but cannot be read
    /// - [`ConfigError::Malformed`] on YAML or schema errors, including unknown keys
    /// - [`ConfigError::Invalid`] if a value fails [`ToolConfig::validate`]
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        let path = root.join(CONFIG_FILE);
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No {} in {}, using defaults", CONFIG_FILE, root.display());
                return Ok(Self::default());
            }
            Err(source) => return Err(ConfigError::Io { path, source }),
        };
        let config = Self::from_yaml(&text).map_err(|e| match e {
            ConfigError::Malformed { source, .. } => ConfigError::Malformed {
                path: path.clone(),
                source,
            },
            other => other,
        })?;
        tracing::debug!("Loaded {}", path.display());
        Ok(config)
    }

    /// Parse and validate configuration text
    ///
    /// # Errors
    /// See [`ToolConfig::load`].
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        // An empty document is null, which means "all defaults"
        let config: Self = if text.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(text).map_err(|source| ConfigError::Malformed {
                path: CONFIG_FILE.into(),
                source,
            })?
        };
        config.validate()?;
        Ok(config)
    }

    /// Check that every path is a non-empty relative path inside the project
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let dirs = [
            ("settings_dir", &self.settings_dir),
            ("source_dir", &self.source_dir),
            ("entry_dir", &self.entry_dir),
            ("templates_dir", &self.templates_dir),
        ];
        for (field, value) in dirs {
            check_relative(field, value)?;
        }
        if self.settings_extension.is_empty() || self.settings_extension.contains(['.', '/']) {
            return Err(ConfigError::Invalid {
                field: "settings_extension",
                reason: format!("{:?} is not a bare extension", self.settings_extension),
            });
        }
        for (field, value) in [
            ("config_library", &self.config_library),
            ("web_framework", &self.web_framework),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "must not be empty".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Built-in type imports extended by the configured ones
    #[must_use]
    pub fn type_import_table(&self) -> TypeImportTable {
        TypeImportTable::default().merged(&self.type_imports)
    }
}

fn check_relative(field: &'static str, value: &str) -> Result<(), ConfigError> {
    let path = Path::new(value);
    let inside = !value.is_empty()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if inside {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("{value:?} must be a relative path inside the project"),
        })
    }
}
