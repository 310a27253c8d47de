//! Testing utilities for the kappa workspace
//!
//! Shared fakes, fixtures, and assertions.

#![allow(missing_docs)]

use kappa_constitutional::ProjectLayout;
use kappa_core::{init_project, ApplicationType, InitOptions, Project, Toolchain, ToolchainError};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;

/// A category source with fields in every shape the locator handles
pub const BILLING_SOURCE: &str = r#"package config

import "github.com/spf13/viper"

// BillingConfig holds payment settings
type BillingConfig struct {
	Region        string `yaml:"region"`
	Retries, Jobs int
	// deprecated
	Legacy bool `yaml:"legacy"` // kept for old files
}

// NewBillingConfig unmarshalls yaml data to struct and returns a pointer to it
func NewBillingConfig() (*BillingConfig, error) {
	viper.SetConfigFile("config/billing.yaml")
	err := viper.ReadInConfig()
	if err != nil {
		return nil, err
	}
	config := &BillingConfig{}
	err = viper.Unmarshal(config)
	if err != nil {
		return nil, err
	}
	return config, nil
}
"#;

/// One recorded toolchain invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub dir: PathBuf,
    pub args: Vec<String>,
}

/// Fake toolchain recording every command
///
/// `mod init` writes a minimal `go.mod`; a command starting with the
/// configured failure prefix fails.
#[derive(Debug, Default)]
pub struct RecordingToolchain {
    calls: Mutex<Vec<Invocation>>,
    fail_on: Option<Vec<String>>,
}

impl RecordingToolchain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail commands whose arguments start with `prefix`
    pub fn failing_on(prefix: &[&str]) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_on: Some(prefix.iter().map(|s| (*s).to_string()).collect()),
        }
    }

    /// Recorded argument lists, in call order
    pub fn commands(&self) -> Vec<Vec<String>> {
        self.invocations().into_iter().map(|i| i.args).collect()
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }
}

impl Toolchain for RecordingToolchain {
    fn run(&self, dir: &Path, args: &[&str]) -> Result<(), ToolchainError> {
        let args: Vec<String> = args.iter().map(|s| (*s).to_string()).collect();
        self.calls.lock().unwrap().push(Invocation {
            dir: dir.to_path_buf(),
            args: args.clone(),
        });

        if let Some(prefix) = &self.fail_on {
            if args.starts_with(prefix) {
                return Err(ToolchainError::Failed {
                    command: format!("go {}", args.join(" ")),
                    status: "exit status: 1".to_string(),
                    stderr: "recorded failure".to_string(),
                });
            }
        }
        if let [cmd, sub, module] = args.as_slice() {
            if cmd == "mod" && sub == "init" {
                let manifest = format!("module {module}\n\ngo 1.21\n");
                std::fs::write(dir.join("go.mod"), manifest).unwrap();
            }
        }
        Ok(())
    }
}

/// Freshly initialized project in a temporary directory
pub struct ScratchProject {
    _parent: TempDir,
    layout: ProjectLayout,
    pub toolchain: RecordingToolchain,
}

impl ScratchProject {
    /// `kappa init myapp` with a recording toolchain
    pub fn new(app_type: ApplicationType) -> Self {
        Self::named("myapp", app_type)
    }

    pub fn named(name: &str, app_type: ApplicationType) -> Self {
        let parent = tempfile::tempdir().unwrap();
        let toolchain = RecordingToolchain::new();
        let options = InitOptions::new(name, parent.path()).with_app_type(app_type);
        let layout = init_project(&options, &toolchain).unwrap();
        Self {
            _parent: parent,
            layout,
            toolchain,
        }
    }

    pub fn root(&self) -> &Path {
        self.layout.root()
    }

    pub fn layout(&self) -> &ProjectLayout {
        &self.layout
    }

    pub fn project(&self) -> Project {
        Project::open(self.root()).unwrap()
    }

    /// Read a file relative to the project root
    pub fn read(&self, relative: &str) -> String {
        std::fs::read_to_string(self.root().join(relative)).unwrap()
    }

    pub fn write(&self, relative: &str, contents: &str) {
        let path = self.root().join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    pub fn exists(&self, relative: &str) -> bool {
        self.root().join(relative).exists()
    }

    /// Every file and directory under the root with its contents
    pub fn snapshot(&self) -> BTreeMap<PathBuf, Option<Vec<u8>>> {
        snapshot(self.root())
    }
}

/// Recursive listing of `root`: files map to their bytes, directories to `None`
pub fn snapshot(root: &Path) -> BTreeMap<PathBuf, Option<Vec<u8>>> {
    let mut out = BTreeMap::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        for entry in std::fs::read_dir(&dir).unwrap() {
            let path = entry.unwrap().path();
            let relative = path.strip_prefix(root).unwrap().to_path_buf();
            if path.is_dir() {
                out.insert(relative, None);
                pending.push(path);
            } else {
                out.insert(relative, Some(std::fs::read(&path).unwrap()));
            }
        }
    }
    out
}

/// Assert that `text` contains every needle, in order
pub fn assert_in_order(text: &str, needles: &[&str]) {
    let mut from = 0;
    for needle in needles {
        match text[from..].find(needle) {
            Some(at) => from += at + needle.len(),
            None => panic!("{needle:?} not found after byte {from} in:\n{text}"),
        }
    }
}
