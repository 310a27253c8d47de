//! Settings file companion writer
//!
//! Settings files are flat `key: value` YAML documents kept next to the
//! generated structs. Lines are only ever appended.

use kappa_composition::{CompositionError, Transaction};
use std::path::Path;

/// One `key: value` line without trailing newline
#[inline]
#[must_use]
pub fn setting_line(key: &str, value: &str) -> String {
    format!("{key}: {value}")
}

/// Stage appending `key: value` to the settings file at `path`
///
/// The file is created when absent. No deduplication happens here; callers
/// check for the key under the category lock first.
///
/// # Errors
/// Returns [`CompositionError`] if staging fails.
pub fn append_setting(
    tx: &mut Transaction,
    path: &Path,
    key: &str,
    value: &str,
) -> Result<(), CompositionError> {
    tracing::debug!("Appending `{}` to {}", key, path.display());
    tx.stage_append(path, &setting_line(key, value))
}

/// Top-level keys of a settings document, lowercased, in file order
///
/// Documents that are not a mapping (empty, scalar, unparsable) have no keys.
#[must_use]
pub fn setting_keys(text: &str) -> Vec<String> {
    match serde_yaml::from_str::<serde_yaml::Value>(text) {
        Ok(serde_yaml::Value::Mapping(map)) => map
            .keys()
            .filter_map(|k| k.as_str().map(str::to_lowercase))
            .collect(),
        Ok(_) => Vec::new(),
        Err(e) => {
            tracing::debug!("Settings document is not valid YAML: {}", e);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn appends_to_file_without_trailing_newline() {
        let root = tempfile::tempdir().unwrap();
        let path = root.path().join("billing.yaml");
        std::fs::write(&path, "retries: 3").unwrap();

        let mut tx = Transaction::new();
        append_setting(&mut tx, &path, "retrydelay", "0").unwrap();
        tx.commit().unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "retries: 3\nretrydelay: 0\n");
        assert_eq!(setting_keys(&text), vec!["retries", "retrydelay"]);
    }

    #[test]
    fn creates_missing_file() {
        let root = tempfile::tempdir().unwrap();
        let path = root.path().join("network.yaml");
        let mut tx = Transaction::new();
        append_setting(&mut tx, &path, "host", "string_value").unwrap();
        tx.commit().unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "host: string_value\n");
    }

    #[test]
    fn keys_of_degenerate_documents() {
        assert!(setting_keys("").is_empty());
        assert!(setting_keys("just a scalar").is_empty());
        assert!(setting_keys("a: [").is_empty());
        assert_eq!(setting_keys("ApplicationName: x\n"), vec!["applicationname"]);
    }
}
