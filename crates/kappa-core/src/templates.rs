//! Application types and their entry-point templates

use crate::category::package_qualifier;
use crate::error::KappaError;
use kappa_constitutional::ToolConfig;
use std::fmt;
use std::str::FromStr;

/// Kind of program a project starts as
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ApplicationType {
    /// Command line program
    #[default]
    Cli,
    /// HTTP service
    Api,
}

impl ApplicationType {
    /// All application types
    pub const ALL: [Self; 2] = [Self::Cli, Self::Api];

    /// Lowercase name, also the entry directory under `cmd/`
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cli => "cli",
            Self::Api => "api",
        }
    }

    /// Message printed by the template's placeholder statement
    #[inline]
    #[must_use]
    pub fn greeting(self) -> &'static str {
        match self {
            Self::Cli => "Hello world!",
            Self::Api => "Application launched!",
        }
    }

    /// Go modules fetched for this type, configuration library first
    #[must_use]
    pub fn dependencies(self, config: &ToolConfig) -> Vec<&str> {
        let mut deps = vec![config.config_library.as_str()];
        if self == Self::Api {
            deps.push(config.web_framework.as_str());
        }
        deps
    }

    /// Contents of `cmd/<type>/main.go` before the bootstrap is injected
    ///
    /// The api template calls the gin API through the `gin` qualifier; a
    /// framework path whose package is named differently is imported as `gin`.
    #[must_use]
    pub fn entry_template(self, config: &ToolConfig) -> String {
        match self {
            Self::Cli => format!(
                "package main\n\nimport (\n\t\"fmt\"\n)\n\nfunc main() {{\n\tfmt.Printf(\"{}\")\n}}\n",
                self.greeting()
            ),
            Self::Api => format!(
                r#"package main

import (
	"fmt"
	"net/http"

	{framework}
)

func main() {{
	fmt.Printf("{greeting}")
	r := gin.Default()
	r.GET("/", func(c *gin.Context) {{
		c.JSON(http.StatusOK, gin.H{{
			"hello": "Hello world!",
		}})
	}})
	r.Run() // listen and serve on 0.0.0.0:8080 (for windows "localhost:8080")
}}
"#,
                framework = gin_import(&config.web_framework),
                greeting = self.greeting()
            ),
        }
    }
}

const GIN_QUALIFIER: &str = "gin";

fn gin_import(path: &str) -> String {
    if package_qualifier(path) == GIN_QUALIFIER {
        format!("\"{path}\"")
    } else {
        format!("{GIN_QUALIFIER} \"{path}\"")
    }
}

impl fmt::Display for ApplicationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicationType {
    type Err = KappaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                KappaError::InvalidArgument(format!(
                    "unknown application type {s:?} (expected cli or api)"
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kappa_artifact::check_syntax;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("API".parse::<ApplicationType>().unwrap(), ApplicationType::Api);
        assert_eq!("cli".parse::<ApplicationType>().unwrap(), ApplicationType::Cli);
        assert!("web".parse::<ApplicationType>().is_err());
    }

    #[test]
    fn templates_are_valid_go() {
        let config = ToolConfig::default();
        for app_type in ApplicationType::ALL {
            let text = app_type.entry_template(&config);
            check_syntax(&text).unwrap();
            assert!(text.contains(&format!("fmt.Printf(\"{}\")", app_type.greeting())));
        }
    }

    #[test]
    fn renamed_framework_is_imported_as_gin() {
        let default = ApplicationType::Api.entry_template(&ToolConfig::default());
        assert!(default.contains("\t\"github.com/gin-gonic/gin\"\n"));

        let config = ToolConfig {
            web_framework: "example.com/forks/webkit/v2".to_string(),
            ..ToolConfig::default()
        };
        let text = ApplicationType::Api.entry_template(&config);
        check_syntax(&text).unwrap();
        assert!(text.contains("\tgin \"example.com/forks/webkit/v2\"\n"));
        assert!(text.contains("r := gin.Default()"));
    }

    #[test]
    fn api_depends_on_web_framework() {
        let config = ToolConfig::default();
        assert_eq!(ApplicationType::Cli.dependencies(&config), vec!["github.com/spf13/viper"]);
        assert_eq!(
            ApplicationType::Api.dependencies(&config),
            vec!["github.com/spf13/viper", "github.com/gin-gonic/gin"]
        );
    }
}
