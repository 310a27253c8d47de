//! Project facade
//!
//! Entry point for the `config` commands: validates raw names, then runs the
//! category operations against one project root.

use crate::category;
use crate::error::{KappaError, Result};
use crate::locate::{find_declaration, Declaration};
use crate::synth::DefaultValue;
use kappa_constitutional::{ConstitutionalLayer, ProjectLayout};
use kappa_symbol::{CategoryName, PropertyName};
use std::path::PathBuf;

/// An existing generated project
#[derive(Debug, Clone)]
pub struct Project {
    layer: ConstitutionalLayer,
}

impl Project {
    /// Open the project at `root`, reading its `kappa.yaml`
    ///
    /// # Errors
    /// - [`KappaError::Config`] if `kappa.yaml` is malformed
    /// - [`KappaError::NotAProject`] if a category directory is missing
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let layout = ProjectLayout::load(root)?;
        for dir in [layout.settings_dir(), layout.source_dir()] {
            if !dir.is_dir() {
                return Err(KappaError::NotAProject {
                    root: layout.root().to_path_buf(),
                    missing: dir,
                });
            }
        }
        tracing::debug!("Opened project {}", layout.root().display());
        Ok(Self::from_layout(layout))
    }

    /// Wrap a layout without checking the directories
    #[inline]
    #[must_use]
    pub fn from_layout(layout: ProjectLayout) -> Self {
        Self {
            layer: ConstitutionalLayer::new(layout),
        }
    }

    /// Project layout
    #[inline]
    #[must_use]
    pub fn layout(&self) -> &ProjectLayout {
        self.layer.layout()
    }

    /// Filesystem boundary used by every operation
    #[inline]
    #[must_use]
    pub fn layer(&self) -> &ConstitutionalLayer {
        &self.layer
    }

    /// `config create <category>`
    ///
    /// # Errors
    /// See [`category::create_category`]; invalid names are argument errors.
    pub fn create_category(&self, category: &str) -> Result<CategoryName> {
        let category = CategoryName::new(category)?;
        category::create_category(&self.layer, &category)?;
        Ok(category)
    }

    /// `config add <category> <property> -t <type>`
    ///
    /// # Errors
    /// See [`category::add_property`]; invalid names are argument errors.
    pub fn add_property(
        &self,
        category: &str,
        property: &str,
        declared_type: &str,
    ) -> Result<DefaultValue> {
        let category = CategoryName::new(category)?;
        let property = PropertyName::new(property)?;
        category::add_property(&self.layer, &category, &property, declared_type)
    }

    /// Whether `category` is fully present
    ///
    /// # Errors
    /// See [`category::category_exists`].
    pub fn category_exists(&self, category: &str) -> Result<bool> {
        category::category_exists(&self.layer, &CategoryName::new(category)?)
    }

    /// Parse the source of `category` and locate its struct
    ///
    /// # Errors
    /// Returns [`KappaError::Parse`] if the source cannot be read or parsed.
    pub fn locate(&self, category: &str) -> Result<Option<Declaration>> {
        let category = CategoryName::new(category)?;
        let path = self.layout().source_path(&category);
        let Some(parsed) = self.layer.parse_ingress(&path)? else {
            return Ok(None);
        };
        Ok(find_declaration(&parsed.file, &category)
            .map(|id| Declaration::new(parsed.file, id)))
    }
}
