//! Declaration locator and field existence checker

use kappa_artifact::{Field, ItemId, ParseError, SourceFile};
use kappa_symbol::{CategoryName, PropertyName};

/// A category struct found in a parsed file
///
/// The id addresses the struct inside `file` and is meaningless for any
/// other tree.
#[derive(Debug, Clone)]
pub struct Declaration {
    file: SourceFile,
    id: ItemId,
}

impl Declaration {
    pub(crate) fn new(file: SourceFile, id: ItemId) -> Self {
        Self { file, id }
    }

    /// Parsed file holding the declaration
    #[inline]
    #[must_use]
    pub fn file(&self) -> &SourceFile {
        &self.file
    }

    /// Struct id inside [`Declaration::file`]
    #[inline]
    #[must_use]
    pub fn id(&self) -> ItemId {
        self.id
    }

    /// Fields in declaration order
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.file.fields(self.id)
    }

    /// Case-insensitive field lookup, see [`has_field`]
    #[must_use]
    pub fn has_field(&self, property: &PropertyName) -> bool {
        has_field(&self.file, self.id, property)
    }

    /// Give back the parsed file
    #[inline]
    #[must_use]
    pub fn into_file(self) -> SourceFile {
        self.file
    }
}

/// Parse `source` and find the struct declared for `category`
///
/// `Ok(None)` means the text parses but declares no such struct.
///
/// # Errors
/// Returns [`ParseError`] if `source` is not valid Go.
pub fn locate(source: &str, category: &CategoryName) -> Result<Option<Declaration>, ParseError> {
    let file = SourceFile::parse(source)?;
    Ok(find_declaration(&file, category).map(|id| Declaration { file, id }))
}

/// First top-level struct named `<Title>Config` in an already parsed file
#[must_use]
pub fn find_declaration(file: &SourceFile, category: &CategoryName) -> Option<ItemId> {
    file.find_struct(&category.type_name())
}

/// Whether the struct behind `id` already has a field for `property`
///
/// Every name of a multi-name field counts; embedded fields count by their
/// type name.
#[must_use]
pub fn has_field(file: &SourceFile, id: ItemId, property: &PropertyName) -> bool {
    file.fields(id)
        .flat_map(Field::identities)
        .any(|name| property.matches(name))
}
