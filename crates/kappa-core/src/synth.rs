//! Field synthesizer
//!
//! Builds the struct field and the settings default for a new property.

use kappa_artifact::{Field, ItemId, Member, MemberId, SourceFile};
use kappa_symbol::{PropertyName, TypeImportTable};
use std::fmt;

/// Settings value written for types that have no numeric zero
pub const PLACEHOLDER_VALUE: &str = "string_value";

/// Default value written to the settings file for a new property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefaultValue {
    /// `0`
    Int,
    /// `0.0`
    Float,
    /// [`PLACEHOLDER_VALUE`]
    Placeholder,
}

impl DefaultValue {
    /// Literal text of the value
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Int => "0",
            Self::Float => "0.0",
            Self::Placeholder => PLACEHOLDER_VALUE,
        }
    }
}

impl fmt::Display for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolve the default for a declared type by substring
///
/// `int` wins over `float`; anything else gets the placeholder.
#[must_use]
pub fn default_value_for(declared_type: &str) -> DefaultValue {
    if declared_type.contains("int") {
        DefaultValue::Int
    } else if declared_type.contains("float") {
        DefaultValue::Float
    } else {
        DefaultValue::Placeholder
    }
}

/// Field for `property`: title-cased name, type verbatim, `yaml` tag
#[must_use]
pub fn synthesize_field(property: &PropertyName, declared_type: &str) -> Field {
    Field::new(property.field_name(), declared_type).with_tag(property.tag())
}

/// Append `field` after the last member of the struct behind `id`
///
/// Returns `None` when `id` is not a struct. No existence check happens here.
pub fn append_field(file: &mut SourceFile, id: ItemId, field: Field) -> Option<MemberId> {
    file.push_member(id, Member::field(field))
}

/// Import every package the declared type refers to
///
/// Returns the paths that were newly added. Qualifiers missing from `table`
/// are skipped.
pub fn add_type_imports(
    file: &mut SourceFile,
    declared_type: &str,
    table: &TypeImportTable,
) -> Vec<String> {
    let added: Vec<String> = table
        .imports_for(declared_type)
        .into_iter()
        .filter(|path| file.imports_mut().add(path))
        .collect();
    for qualifier in kappa_symbol::qualifiers(declared_type) {
        if table.get(qualifier).is_none() {
            tracing::warn!(
                "No import known for `{}` in `{}`; add it to type_imports in kappa.yaml",
                qualifier,
                declared_type
            );
        }
    }
    added
}
