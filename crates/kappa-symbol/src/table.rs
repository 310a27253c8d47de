//! Type qualifier → import path table
//!
//! Declared property types are written verbatim into generated structs. When
//! a type names a package (`time.Duration`, `[]net.IP`), the generated file
//! needs the matching import; this table supplies it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Mapping from package qualifier to import path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeImportTable(BTreeMap<String, String>);

impl Default for TypeImportTable {
    fn default() -> Self {
        let mut table = BTreeMap::new();
        table.insert("time".to_string(), "time".to_string());
        Self(table)
    }
}

impl TypeImportTable {
    /// Table without any entry
    #[inline]
    #[must_use]
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    /// Add or replace an entry
    pub fn insert(&mut self, qualifier: impl Into<String>, path: impl Into<String>) {
        self.0.insert(qualifier.into(), path.into());
    }

    /// Entries of `other` override entries of `self`
    #[must_use]
    pub fn merged(mut self, other: &Self) -> Self {
        self.0
            .extend(other.0.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    /// Import path registered for `qualifier`
    #[inline]
    #[must_use]
    pub fn get(&self, qualifier: &str) -> Option<&str> {
        self.0.get(qualifier).map(String::as_str)
    }

    /// Import paths required by a declared type, in order of appearance
    ///
    /// Qualifiers without an entry are skipped.
    #[must_use]
    pub fn imports_for(&self, declared_type: &str) -> Vec<String> {
        let mut paths: Vec<String> = Vec::new();
        for qualifier in qualifiers(declared_type) {
            if let Some(path) = self.get(qualifier) {
                if !paths.iter().any(|p| p == path) {
                    paths.push(path.to_string());
                }
            }
        }
        paths
    }
}

/// Identifiers directly followed by `.` in a type expression
#[must_use]
pub fn qualifiers(declared_type: &str) -> Vec<&str> {
    let bytes = declared_type.as_bytes();
    let mut found = Vec::new();
    let mut start: Option<usize> = None;
    for (index, byte) in bytes.iter().enumerate() {
        let ident = byte.is_ascii_alphanumeric() || *byte == b'_';
        match (start, ident) {
            (None, true) => start = Some(index),
            (Some(begin), false) => {
                if *byte == b'.' && !bytes[begin].is_ascii_digit() {
                    found.push(&declared_type[begin..index]);
                }
                start = None;
            }
            _ => {}
        }
    }
    found
}
