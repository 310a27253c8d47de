//! Project initializer
//!
//! Steps, in order, all addressed from the new project root:
//!
//! 1. create `<parent>/<name>` (replacing it with `force`)
//! 2. `go mod init <name>`
//! 3. write `cmd/<type>/main.go` from the template
//! 4. `go get` the configuration library (and web framework for api)
//! 5. create the `application` category seeded with `ApplicationName`
//! 6. inject the configuration bootstrap into the entry point
//! 7. create `templates/`
//! 8. `go mod tidy`
//!
//! Any failure after step 1 removes the project directory again.

use crate::category::{create_seeded, Seed};
use crate::entry::{inject_bootstrap, Bootstrap, APPLICATION_NAME_FIELD};
use crate::error::{KappaError, Result};
use crate::templates::ApplicationType;
use crate::toolchain::Toolchain;
use kappa_artifact::Field;
use kappa_composition::Transaction;
use kappa_constitutional::{ConstitutionalLayer, ProjectLayout, ToolConfig};
use kappa_symbol::CategoryName;
use std::path::{Path, PathBuf};

/// Category every project starts with
pub const APPLICATION_CATEGORY: &str = "application";

/// Settings key of the project name
pub const APPLICATION_NAME_KEY: &str = "applicationname";

/// Options of [`init_project`]
#[derive(Debug, Clone)]
pub struct InitOptions {
    /// Project directory name, also the Go module path
    pub name: String,
    /// Directory the project is created in
    pub parent: PathBuf,
    /// Replace an existing directory
    pub force: bool,
    /// Entry point template
    pub app_type: ApplicationType,
    /// Layout of the new project
    pub config: ToolConfig,
}

impl InitOptions {
    /// Defaults for `name` in `parent`
    #[must_use]
    pub fn new(name: impl Into<String>, parent: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            parent: parent.into(),
            force: false,
            app_type: ApplicationType::default(),
            config: ToolConfig::default(),
        }
    }

    /// Set the application type
    #[must_use]
    pub fn with_app_type(mut self, app_type: ApplicationType) -> Self {
        self.app_type = app_type;
        self
    }

    /// Replace an existing directory
    #[must_use]
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }
}

/// Create a new project, returning its layout
///
/// # Errors
/// - [`KappaError::InvalidArgument`] if the name is not a usable module name
/// - [`KappaError::ProjectExists`] if the directory exists and `force` is off
/// - any error of a later step; the directory is removed first, and
///   [`KappaError::CleanupFailed`] reports a failed removal
pub fn init_project(options: &InitOptions, toolchain: &dyn Toolchain) -> Result<ProjectLayout> {
    validate_project_name(&options.name)?;
    options.config.validate()?;
    let root = options.parent.join(&options.name);

    let exists = root.try_exists().map_err(|e| KappaError::io(&root, e))?;
    if exists {
        if !options.force {
            return Err(KappaError::ProjectExists { path: root });
        }
        tracing::info!("Removing existing {}", root.display());
        remove_existing(&root)?;
    }
    std::fs::create_dir(&root).map_err(|e| KappaError::io(&root, e))?;

    let layout = ProjectLayout::new(&root, options.config.clone());
    match populate(&layout, options, toolchain) {
        Ok(()) => {
            tracing::info!(
                "Initialized {} project {} in {}",
                options.app_type,
                options.name,
                root.display()
            );
            Ok(layout)
        }
        Err(original) => {
            tracing::warn!("Initialization failed, removing {}", root.display());
            match std::fs::remove_dir_all(&root) {
                Ok(()) => Err(original),
                Err(cleanup) => Err(KappaError::CleanupFailed {
                    original: Box::new(original),
                    path: root,
                    cleanup,
                }),
            }
        }
    }
}

fn remove_existing(path: &Path) -> Result<()> {
    let metadata = std::fs::symlink_metadata(path).map_err(|e| KappaError::io(path, e))?;
    let removed = if metadata.is_dir() {
        std::fs::remove_dir_all(path)
    } else {
        std::fs::remove_file(path)
    };
    removed.map_err(|e| KappaError::io(path, e))
}

fn populate(
    layout: &ProjectLayout,
    options: &InitOptions,
    toolchain: &dyn Toolchain,
) -> Result<()> {
    let root = layout.root();
    let config = layout.config();
    toolchain.mod_init(root, &options.name)?;

    let entry = layout.entry_path(options.app_type.as_str());
    create_dirs(entry.parent().unwrap_or(root))?;
    let mut tx = Transaction::new();
    tx.stage_write(&entry, options.app_type.entry_template(config))?;
    tx.commit()?;

    for dependency in options.app_type.dependencies(config) {
        toolchain.get(root, dependency)?;
    }

    create_dirs(&layout.settings_dir())?;
    create_dirs(&layout.source_dir())?;
    let layer = ConstitutionalLayer::new(layout.clone());
    let application = CategoryName::new(APPLICATION_CATEGORY)?;
    let seed = Seed {
        field: Field::new(APPLICATION_NAME_FIELD, "string")
            .with_tag(format!("`yaml:\"{APPLICATION_NAME_KEY}\"`")),
        key: APPLICATION_NAME_KEY.to_string(),
        value: options.name.clone(),
    };
    create_seeded(&layer, &application, Some(&seed))?;

    let bootstrap = Bootstrap::for_layer(&layer, &options.name, options.app_type);
    inject_bootstrap(&layer, &entry, &bootstrap)?;

    create_dirs(&layout.templates_dir())?;
    toolchain.mod_tidy(root)?;
    Ok(())
}

fn create_dirs(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path).map_err(|e| KappaError::io(path, e))
}

/// Project names become both a directory and a module path
///
/// # Errors
/// Returns [`KappaError::InvalidArgument`] for empty names, names that are
/// not a single path segment, or names with characters outside
/// `[A-Za-z0-9._-]`.
pub fn validate_project_name(name: &str) -> Result<()> {
    let invalid = |reason: &str| {
        Err(KappaError::InvalidArgument(format!(
            "project name {name:?} {reason}"
        )))
    };
    if name.is_empty() {
        return invalid("must not be empty");
    }
    if name == "." || name == ".." || name.starts_with('-') {
        return invalid("is not a directory name");
    }
    if let Some(ch) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')))
    {
        return invalid(&format!("contains invalid character {ch:?}"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toolchain::{NoopToolchain, ToolchainError};

    #[derive(Debug)]
    struct FailingTidy;

    impl Toolchain for FailingTidy {
        fn run(&self, _dir: &Path, args: &[&str]) -> Result<(), ToolchainError> {
            if args == ["mod", "tidy"] {
                Err(ToolchainError::Failed {
                    command: "go mod tidy".to_string(),
                    status: "exit status: 1".to_string(),
                    stderr: "no network".to_string(),
                })
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn project_names() {
        validate_project_name("myapp").unwrap();
        validate_project_name("my-app.v2").unwrap();
        for bad in ["", "..", "-x", "a/b", "my app", "app!"] {
            assert!(validate_project_name(bad).is_err(), "{bad:?}");
        }
    }

    #[test]
    fn creates_the_layout() {
        let parent = tempfile::tempdir().unwrap();
        let options = InitOptions::new("myapp", parent.path());
        let layout = init_project(&options, &NoopToolchain).unwrap();
        assert!(layout.entry_path("cli").is_file());
        assert!(layout.templates_dir().is_dir());
        assert!(layout.is_project());
        assert_eq!(
            std::fs::read_to_string(layout.settings_dir().join("application.yaml")).unwrap(),
            "applicationname: myapp\n"
        );
    }

    #[test]
    fn existing_directory_needs_force() {
        let parent = tempfile::tempdir().unwrap();
        let stale = parent.path().join("myapp").join("stale.txt");
        std::fs::create_dir_all(stale.parent().unwrap()).unwrap();
        std::fs::write(&stale, "old").unwrap();

        let options = InitOptions::new("myapp", parent.path());
        let err = init_project(&options, &NoopToolchain).unwrap_err();
        assert!(matches!(err, KappaError::ProjectExists { .. }));
        assert!(stale.exists());

        init_project(&options.with_force(true), &NoopToolchain).unwrap();
        assert!(!stale.exists());
    }

    #[test]
    fn force_replaces_a_plain_file() {
        let parent = tempfile::tempdir().unwrap();
        let squatter = parent.path().join("myapp");
        std::fs::write(&squatter, "not a project").unwrap();

        let options = InitOptions::new("myapp", parent.path()).with_force(true);
        let layout = init_project(&options, &NoopToolchain).unwrap();
        assert!(squatter.is_dir());
        assert!(layout.entry_path("cli").is_file());
    }

    #[test]
    fn failure_removes_the_directory() {
        let parent = tempfile::tempdir().unwrap();
        let options = InitOptions::new("myapp", parent.path());
        let err = init_project(&options, &FailingTidy).unwrap_err();
        assert!(matches!(err, KappaError::Toolchain(_)));
        assert!(!parent.path().join("myapp").exists());
    }
}
