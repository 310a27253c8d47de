//! External Go toolchain
//!
//! The initializer only needs three module commands. They go through the
//! [`Toolchain`] trait so tests and `--no-toolchain` runs can skip the real
//! `go` binary.

use std::fmt;
use std::path::Path;
use std::process::Command;

/// Errors running the toolchain
#[derive(Debug, thiserror::Error)]
pub enum ToolchainError {
    /// Binary could not be started
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Command exited unsuccessfully
    #[error("`{command}` failed ({status}): {stderr}")]
    Failed {
        command: String,
        status: String,
        stderr: String,
    },
}

/// Runner for `go` subcommands inside a project directory
pub trait Toolchain: fmt::Debug + Send + Sync {
    /// Run `<toolchain> args...` with `dir` as working directory
    ///
    /// # Errors
    /// Returns [`ToolchainError`] on spawn failure or non-zero exit.
    fn run(&self, dir: &Path, args: &[&str]) -> Result<(), ToolchainError>;

    /// `go mod init <module>`
    ///
    /// # Errors
    /// See [`Toolchain::run`].
    fn mod_init(&self, dir: &Path, module: &str) -> Result<(), ToolchainError> {
        self.run(dir, &["mod", "init", module])
    }

    /// `go get <package>`
    ///
    /// # Errors
    /// See [`Toolchain::run`].
    fn get(&self, dir: &Path, package: &str) -> Result<(), ToolchainError> {
        self.run(dir, &["get", package])
    }

    /// `go mod tidy`
    ///
    /// # Errors
    /// See [`Toolchain::run`].
    fn mod_tidy(&self, dir: &Path) -> Result<(), ToolchainError> {
        self.run(dir, &["mod", "tidy"])
    }
}

/// Real toolchain spawning a binary (normally `go`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoToolchain {
    program: String,
}

impl GoToolchain {
    /// Toolchain running `program`
    #[inline]
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for GoToolchain {
    fn default() -> Self {
        Self::new("go")
    }
}

impl Toolchain for GoToolchain {
    fn run(&self, dir: &Path, args: &[&str]) -> Result<(), ToolchainError> {
        let command = command_line(&self.program, args);
        tracing::info!("Running `{}` in {}", command, dir.display());

        let output = Command::new(&self.program)
            .args(args)
            .current_dir(dir)
            .output()
            .map_err(|source| ToolchainError::Spawn {
                command: command.clone(),
                source,
            })?;

        if output.status.success() {
            tracing::debug!("`{}` succeeded", command);
            Ok(())
        } else {
            Err(ToolchainError::Failed {
                command,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}

/// Toolchain that runs nothing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoopToolchain;

impl Toolchain for NoopToolchain {
    fn run(&self, dir: &Path, args: &[&str]) -> Result<(), ToolchainError> {
        tracing::debug!(
            "Skipping `{}` in {}",
            command_line("go", args),
            dir.display()
        );
        Ok(())
    }
}

fn command_line(program: &str, args: &[&str]) -> String {
    std::iter::once(program)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_binary_is_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let toolchain = GoToolchain::new("kappa-no-such-toolchain-binary");
        let err = toolchain.mod_tidy(dir.path()).unwrap_err();
        match err {
            ToolchainError::Spawn { command, .. } => {
                assert_eq!(command, "kappa-no-such-toolchain-binary mod tidy");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn noop_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        NoopToolchain.mod_init(dir.path(), "myapp").unwrap();
        assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
    }

    #[test]
    fn command_line_joins_args() {
        assert_eq!(
            command_line("go", &["get", "github.com/spf13/viper"]),
            "go get github.com/spf13/viper"
        );
    }
}
