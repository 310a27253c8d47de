//! Category and property names
//!
//! Names arrive from the command line in any case. They are lowercased and
//! then validated against `[a-z][a-z0-9_]*`; everything derived from them
//! (Go type names, field names, file names, settings keys) is a pure function
//! of the validated form.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Suffix of every generated configuration type
pub const CONFIG_TYPE_SUFFIX: &str = "Config";

/// Prefix of every generated loader function
pub const LOADER_PREFIX: &str = "New";

/// Errors for names that cannot become Go identifiers or file names
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NameError {
    /// Name is empty
    #[error("{kind} name must not be empty")]
    Empty {
        /// `category` or `property`
        kind: &'static str,
    },

    /// First character is not a letter
    #[error("{kind} name {name:?} must start with a letter")]
    InvalidStart {
        /// `category` or `property`
        kind: &'static str,
        /// Offending name
        name: String,
    },

    /// Name contains a character outside `[a-z0-9_]`
    #[error("{kind} name {name:?} contains invalid character {ch:?}")]
    InvalidChar {
        /// `category` or `property`
        kind: &'static str,
        /// Offending name
        name: String,
        /// First invalid character
        ch: char,
    },

    /// Go would leave `<name>.go` out of the package build
    #[error("{kind} name {name:?} ends in {suffix:?}, which Go excludes from package builds")]
    ExcludedFileName {
        /// `category`
        kind: &'static str,
        /// Offending name
        name: String,
        /// `_test` or the GOOS/GOARCH suffix
        suffix: String,
    },
}

const KNOWN_OS: &[&str] = &[
    "aix", "android", "darwin", "dragonfly", "freebsd", "hurd", "illumos", "ios", "js", "linux",
    "nacl", "netbsd", "openbsd", "plan9", "solaris", "wasip1", "windows", "zos",
];

const KNOWN_ARCH: &[&str] = &[
    "386", "amd64", "amd64p32", "arm", "armbe", "arm64", "arm64be", "loong64", "mips", "mipsle",
    "mips64", "mips64le", "mips64p32", "mips64p32le", "ppc", "ppc64", "ppc64le", "riscv",
    "riscv64", "s390", "s390x", "sparc", "sparc64", "wasm",
];

/// Suffix of a file stem that makes `go build` skip `<stem>.go`
///
/// `_test`, `_<GOOS>`, `_<GOARCH>` and `_<GOOS>_<GOARCH>`; the part before
/// the first underscore never counts.
fn build_excluded_suffix(stem: &str) -> Option<String> {
    if stem.ends_with("_test") {
        return Some("_test".to_string());
    }
    let (_, rest) = stem.split_once('_')?;
    let parts: Vec<&str> = rest.split('_').collect();
    let n = parts.len();
    if n >= 2 && KNOWN_OS.contains(&parts[n - 2]) && KNOWN_ARCH.contains(&parts[n - 1]) {
        return Some(format!("_{}_{}", parts[n - 2], parts[n - 1]));
    }
    let last = parts[n - 1];
    (KNOWN_OS.contains(&last) || KNOWN_ARCH.contains(&last)).then(|| format!("_{last}"))
}

fn validate(kind: &'static str, raw: &str) -> Result<String, NameError> {
    let name = raw.to_lowercase();
    let mut chars = name.chars();
    match chars.next() {
        None => return Err(NameError::Empty { kind }),
        Some(c) if !c.is_ascii_lowercase() => {
            return Err(NameError::InvalidStart { kind, name });
        }
        Some(_) => {}
    }
    if let Some(ch) = chars.find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_'))
    {
        return Err(NameError::InvalidChar { kind, name, ch });
    }
    Ok(name)
}

/// Lowercase `s`, then uppercase its first character
///
/// `billing` → `Billing`, `retryDelay` → `Retrydelay`
#[must_use]
pub fn title_case(s: &str) -> String {
    let lower = s.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Go type name generated for a category: `TitleCase(name) + "Config"`
#[must_use]
pub fn config_type_name(category: &str) -> String {
    let mut name = title_case(category);
    name.push_str(CONFIG_TYPE_SUFFIX);
    name
}

/// Loader function name for a generated type: `"New" + type name`
#[must_use]
pub fn loader_name(type_name: &str) -> String {
    format!("{LOADER_PREFIX}{type_name}")
}

/// Validated name of a configuration category
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CategoryName(String);

impl CategoryName {
    /// Lowercase and validate `raw`
    ///
    /// # Errors
    /// Returns [`NameError`] if `raw` does not match `[a-z][a-z0-9_]*`
    /// after lowercasing.
    ///
    /// Names ending in a suffix Go treats as a build constraint (`_test`,
    /// `_linux`, `_amd64`, ...) are rejected too, since the generated
    /// `<name>.go` would drop out of the package.
    pub fn new(raw: &str) -> Result<Self, NameError> {
        let name = validate("category", raw)?;
        if let Some(suffix) = build_excluded_suffix(&name) {
            return Err(NameError::ExcludedFileName {
                kind: "category",
                name,
                suffix,
            });
        }
        Ok(Self(name))
    }

    /// Lowercase identity; also the settings and source file stem
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Generated declaration name, e.g. `BillingConfig`
    #[inline]
    #[must_use]
    pub fn type_name(&self) -> String {
        config_type_name(&self.0)
    }

    /// Generated loader name, e.g. `NewBillingConfig`
    #[inline]
    #[must_use]
    pub fn loader_name(&self) -> String {
        loader_name(&self.type_name())
    }
}

/// Validated name of a property inside a category
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PropertyName(String);

impl PropertyName {
    /// Lowercase and validate `raw`
    ///
    /// # Errors
    /// Returns [`NameError`] if `raw` does not match `[a-z][a-z0-9_]*`
    /// after lowercasing.
    pub fn new(raw: &str) -> Result<Self, NameError> {
        validate("property", raw).map(Self)
    }

    /// Lowercase identity; also the settings key and tag value
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Exported Go field name, e.g. `Retrydelay`
    #[inline]
    #[must_use]
    pub fn field_name(&self) -> String {
        title_case(&self.0)
    }

    /// Raw tag literal, e.g. `` `yaml:"retrydelay"` ``
    #[must_use]
    pub fn tag(&self) -> String {
        format!("`yaml:\"{}\"`", self.0)
    }

    /// Case-insensitive match against a Go field name
    #[inline]
    #[must_use]
    pub fn matches(&self, field: &str) -> bool {
        field.to_lowercase() == self.0
    }
}

macro_rules! string_conversions {
    ($name:ident) => {
        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = NameError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = NameError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(&value)
            }
        }

        impl From<$name> for String {
            fn from(name: $name) -> Self {
                name.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_conversions!(CategoryName);
string_conversions!(PropertyName);

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn derives_go_names() {
        let category = CategoryName::new("Billing").unwrap();
        assert_eq!(category.as_str(), "billing");
        assert_eq!(category.type_name(), "BillingConfig");
        assert_eq!(category.loader_name(), "NewBillingConfig");

        let property = PropertyName::new("retryDelay").unwrap();
        assert_eq!(property.field_name(), "Retrydelay");
        assert_eq!(property.tag(), "`yaml:\"retrydelay\"`");
        assert!(property.matches("RetryDelay"));
    }

    #[test]
    fn title_case_lowercases_tail() {
        assert_eq!(title_case("api_keys"), "Api_keys");
        assert_eq!(title_case("HTTP"), "Http");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn rejects_invalid_names() {
        assert_eq!(
            CategoryName::new(""),
            Err(NameError::Empty { kind: "category" })
        );
        assert!(matches!(
            CategoryName::new("9lives"),
            Err(NameError::InvalidStart { .. })
        ));
        assert!(matches!(
            PropertyName::new("a-b"),
            Err(NameError::InvalidChar { ch: '-', .. })
        ));
        assert!(CategoryName::new("../etc").is_err());
    }

    #[test]
    fn rejects_build_excluded_categories() {
        for (raw, suffix) in [
            ("billing_test", "_test"),
            ("billing_linux", "_linux"),
            ("cache_amd64", "_amd64"),
            ("db_windows_arm64", "_windows_arm64"),
        ] {
            match CategoryName::new(raw) {
                Err(NameError::ExcludedFileName { suffix: found, .. }) => assert_eq!(found, suffix),
                other => panic!("{raw}: unexpected {other:?}"),
            }
        }
        // the leading segment is never a constraint
        for ok in ["linux", "test", "wasm_cache", "linux_users", "billing_tests"] {
            CategoryName::new(ok).unwrap();
        }
        PropertyName::new("retry_test").unwrap();
    }

    #[test]
    fn deserializes_through_validation() {
        let name: CategoryName = serde_yaml::from_str("Billing").unwrap();
        assert_eq!(name.as_str(), "billing");
        assert!(serde_yaml::from_str::<CategoryName>("bad name").is_err());
    }

    proptest! {
        #[test]
        fn valid_names_round_trip_through_title_case(raw in "[a-zA-Z][a-zA-Z0-9_]{0,15}") {
            let name = PropertyName::new(&raw).unwrap();
            let field = name.field_name();
            prop_assert!(name.matches(&field));
            prop_assert!(field.chars().next().unwrap().is_ascii_uppercase());
            prop_assert_eq!(field.to_lowercase(), raw.to_lowercase());
        }

        #[test]
        fn type_name_always_ends_with_suffix(raw in "[a-z][a-z0-9]{0,15}") {
            let category = CategoryName::new(&raw).unwrap();
            let type_name = category.type_name();
            prop_assert!(type_name.ends_with(CONFIG_TYPE_SUFFIX));
            prop_assert_eq!(category.loader_name(), format!("New{type_name}"));
        }
    }
}
