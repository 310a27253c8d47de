//! Entry-point mutator
//!
//! Makes the generated `main` load the application configuration before
//! anything else runs:
//!
//! ```text
//! applicationConfig, err := config.NewApplicationConfig()
//! if err != nil {
//!     log.Fatalf("Failed to read configuration file: %v", err)
//! }
//! ```

use crate::error::{KappaError, Result};
use crate::init::APPLICATION_CATEGORY;
use crate::templates::ApplicationType;
use kappa_artifact::{quote, Expr, SourceFile, Stmt, StmtId, StmtKind};
use kappa_composition::Transaction;
use kappa_constitutional::ConstitutionalLayer;
use kappa_symbol::{config_type_name, loader_name};
use std::path::Path;

/// Variable holding the loaded application configuration
pub const APPLICATION_CONFIG_VAR: &str = "applicationConfig";

/// Field of the application struct holding the project name
pub const APPLICATION_NAME_FIELD: &str = "ApplicationName";

/// Name of the entry function
pub const ENTRY_FUNC: &str = "main";

/// Why a tree could not be bootstrapped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapRefusal {
    /// No `func main`
    NoEntryFunction,
    /// `applicationConfig` is already declared in `main`
    AlreadyBootstrapped,
}

/// What to inject
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bootstrap {
    /// Package qualifier of the generated sources (`config`)
    pub package: String,
    /// Import path of the generated sources (`myapp/pkg/infra/config`)
    pub import_path: String,
    /// Loader of the application category (`NewApplicationConfig`)
    pub loader: String,
    /// Application type whose placeholder greeting is rewritten
    pub app_type: ApplicationType,
}

impl Bootstrap {
    /// Bootstrap of the `application` category for `module`
    #[must_use]
    pub fn for_layer(layer: &ConstitutionalLayer, module: &str, app_type: ApplicationType) -> Self {
        let layout = layer.layout();
        Self {
            package: layout.source_package().to_string(),
            import_path: layout.config_import_path(module),
            loader: loader_name(&config_type_name(APPLICATION_CATEGORY)),
            app_type,
        }
    }

    /// Rewrite `file` in place
    ///
    /// Returns whether the placeholder greeting was found and rewritten.
    ///
    /// # Errors
    /// Returns a [`BootstrapRefusal`] and leaves `file` untouched when there
    /// is no entry function or it is already bootstrapped.
    pub fn apply(&self, file: &mut SourceFile) -> Result<bool, BootstrapRefusal> {
        let main = file
            .find_func(ENTRY_FUNC)
            .ok_or(BootstrapRefusal::NoEntryFunction)?;
        let body: Vec<StmtId> = file
            .func_decl(main)
            .map(|f| f.body().to_vec())
            .unwrap_or_default();
        if body.iter().any(|id| declares_config(file.stmt(*id))) {
            return Err(BootstrapRefusal::AlreadyBootstrapped);
        }

        let greeting = quote(self.app_type.greeting());
        let placeholder = body
            .iter()
            .copied()
            .find(|id| file.stmt(*id).is_some_and(|s| is_greeting(s, &greeting)));
        if let Some(id) = placeholder {
            if let Some(stmt) = file.stmt_mut(id) {
                stmt.kind = StmtKind::Expr(Expr::call(
                    "fmt.Printf",
                    vec![
                        Expr::string(&format!("{} Welcome to %s!\n", self.app_type.greeting())),
                        Expr::ident(format!("{APPLICATION_CONFIG_VAR}.{APPLICATION_NAME_FIELD}")),
                    ],
                ));
            }
        }

        let load = file.alloc_stmt(Stmt::new(StmtKind::Define {
            names: vec![APPLICATION_CONFIG_VAR.to_string(), "err".to_string()],
            value: Expr::call(format!("{}.{}", self.package, self.loader), Vec::new()),
        }));
        let fatal = file.alloc_stmt(Stmt::new(StmtKind::Expr(Expr::call(
            "log.Fatalf",
            vec![
                Expr::string("Failed to read configuration file: %v"),
                Expr::ident("err"),
            ],
        ))));
        let check = file.alloc_stmt(Stmt::new(StmtKind::If {
            cond: Expr::binary(Expr::ident("err"), "!=", Expr::ident("nil")),
            body: vec![fatal],
        }));
        file.prepend_to_body(main, &[load, check]);

        let imports = file.imports_mut();
        imports.add("log");
        imports.add(&self.import_path);
        imports.normalize();
        Ok(placeholder.is_some())
    }
}

fn declares_config(stmt: Option<&Stmt>) -> bool {
    match stmt.map(|s| &s.kind) {
        Some(StmtKind::Define { names, .. } | StmtKind::Assign { names, .. }) => {
            names.iter().any(|n| n == APPLICATION_CONFIG_VAR)
        }
        Some(StmtKind::Verbatim { text, .. }) => text
            .split(":=")
            .next()
            .is_some_and(|lhs| lhs.split(',').any(|n| n.trim() == APPLICATION_CONFIG_VAR)),
        _ => false,
    }
}

fn is_greeting(stmt: &Stmt, greeting: &str) -> bool {
    match &stmt.kind {
        StmtKind::Expr(Expr::Call { callee, args }) => {
            callee == "fmt.Printf" && matches!(args.as_slice(), [Expr::Lit(lit)] if lit == greeting)
        }
        _ => false,
    }
}

/// Inject the configuration bootstrap into the entry file at `path`
///
/// # Errors
/// - [`KappaError::EntryPointNotFound`] if the file or its `main` is missing
/// - [`KappaError::AlreadyBootstrapped`] if `main` already loads the configuration
/// - [`KappaError::Parse`] / [`KappaError::Serialize`] on read or write failure
pub fn inject_bootstrap(
    layer: &ConstitutionalLayer,
    path: &Path,
    bootstrap: &Bootstrap,
) -> Result<()> {
    let mut parsed = layer
        .parse_ingress(path)?
        .ok_or_else(|| KappaError::EntryPointNotFound {
            path: path.to_path_buf(),
        })?;

    let rewritten = bootstrap.apply(&mut parsed.file).map_err(|refusal| match refusal {
        BootstrapRefusal::NoEntryFunction => KappaError::EntryPointNotFound {
            path: path.to_path_buf(),
        },
        BootstrapRefusal::AlreadyBootstrapped => KappaError::AlreadyBootstrapped {
            path: path.to_path_buf(),
        },
    })?;
    if !rewritten {
        tracing::warn!(
            "No `fmt.Printf({})` in {}; greeting left unchanged",
            quote(bootstrap.app_type.greeting()),
            path.display()
        );
    }

    let mut tx = Transaction::new();
    layer.stage_egress(&mut tx, &parsed)?;
    tx.commit()?;
    tracing::info!("Injected configuration bootstrap into {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kappa_constitutional::{ProjectLayout, ToolConfig};
    use pretty_assertions::assert_eq;

    const CLI_BOOTSTRAPPED: &str = r#"package main

import (
	"fmt"
	"log"
	"myapp/pkg/infra/config"
)

func main() {
	applicationConfig, err := config.NewApplicationConfig()
	if err != nil {
		log.Fatalf("Failed to read configuration file: %v", err)
	}
	fmt.Printf("Hello world! Welcome to %s!\n", applicationConfig.ApplicationName)
}
"#;

    fn layer(root: &Path) -> ConstitutionalLayer {
        ConstitutionalLayer::new(ProjectLayout::new(root, ToolConfig::default()))
    }

    fn bootstrap(layer: &ConstitutionalLayer, app_type: ApplicationType) -> Bootstrap {
        Bootstrap::for_layer(layer, "myapp", app_type)
    }

    #[test]
    fn cli_template_is_bootstrapped() {
        let root = tempfile::tempdir().unwrap();
        let layer = layer(root.path());
        let template = ApplicationType::Cli.entry_template(&ToolConfig::default());
        let mut file = SourceFile::parse(&template).unwrap();
        assert!(bootstrap(&layer, ApplicationType::Cli).apply(&mut file).unwrap());
        assert_eq!(file.render().unwrap(), CLI_BOOTSTRAPPED);
    }

    #[test]
    fn api_body_keeps_its_order() {
        let root = tempfile::tempdir().unwrap();
        let layer = layer(root.path());
        let template = ApplicationType::Api.entry_template(&ToolConfig::default());
        let mut file = SourceFile::parse(&template).unwrap();
        bootstrap(&layer, ApplicationType::Api).apply(&mut file).unwrap();
        let text = file.render().unwrap();

        let order = [
            "applicationConfig, err := config.NewApplicationConfig()",
            "if err != nil {",
            "fmt.Printf(\"Application launched! Welcome to %s!\\n\", applicationConfig.ApplicationName)",
            "r := gin.Default()",
            "r.GET(\"/\", func(c *gin.Context) {",
            "r.Run() // listen and serve on 0.0.0.0:8080 (for windows \"localhost:8080\")",
        ];
        let positions: Vec<usize> = order.iter().map(|s| text.find(s).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{text}");
        assert!(text.contains(
            "import (\n\t\"fmt\"\n\t\"log\"\n\t\"myapp/pkg/infra/config\"\n\t\"net/http\"\n\n\t\"github.com/gin-gonic/gin\"\n)\n"
        ));
    }

    #[test]
    fn second_injection_is_refused() {
        let root = tempfile::tempdir().unwrap();
        let layer = layer(root.path());
        let mut file = SourceFile::parse(CLI_BOOTSTRAPPED).unwrap();
        let before = file.clone();
        assert_eq!(
            bootstrap(&layer, ApplicationType::Cli).apply(&mut file),
            Err(BootstrapRefusal::AlreadyBootstrapped)
        );
        assert_eq!(file, before);
    }

    #[test]
    fn missing_main_is_not_found() {
        let root = tempfile::tempdir().unwrap();
        let layer = layer(root.path());
        let path = root.path().join("main.go");
        std::fs::write(&path, "package main\n\nfunc run() {}\n").unwrap();
        let err = inject_bootstrap(&layer, &path, &bootstrap(&layer, ApplicationType::Cli))
            .unwrap_err();
        assert!(matches!(err, KappaError::EntryPointNotFound { .. }));
        assert!(err.is_not_found());
    }

    #[test]
    fn injects_into_file() {
        let root = tempfile::tempdir().unwrap();
        let layer = layer(root.path());
        let path = root.path().join("main.go");
        std::fs::write(&path, ApplicationType::Cli.entry_template(&ToolConfig::default())).unwrap();
        inject_bootstrap(&layer, &path, &bootstrap(&layer, ApplicationType::Cli)).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), CLI_BOOTSTRAPPED);
    }
}
