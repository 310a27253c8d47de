//! Category synthesizer and the add-property operation
//!
//! A category is a settings file plus a Go file declaring `<Title>Config`
//! and its loader. Both operations follow the same sequence:
//!
//! 1. read-only pre-check (a missing category never takes a lock)
//! 2. acquire the category lock
//! 3. re-check under the lock
//! 4. stage every write into one [`Transaction`] and commit

use crate::error::{KappaError, Result};
use crate::locate::{find_declaration, has_field};
use crate::synth::{
    add_type_imports, append_field, default_value_for, synthesize_field, DefaultValue,
};
use kappa_artifact::{
    Expr, Field, FuncDecl, Item, ItemId, ItemKind, Member, SourceFile, Stmt, StmtKind, StructDecl,
};
use kappa_composition::{CategoryLock, Transaction};
use kappa_constitutional::{
    append_setting, setting_keys, ConstitutionalLayer, ParsedSource, ProjectLayout,
};
use kappa_symbol::{CategoryName, PropertyName};
use std::path::Path;

/// Initial field and settings line of a new category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seed {
    /// Field declared in the new struct
    pub field: Field,
    /// Settings key
    pub key: String,
    /// Settings value
    pub value: String,
}

/// Generated file for an empty category
///
/// ```text
/// type BillingConfig struct {
/// }
///
/// func NewBillingConfig() (*BillingConfig, error) { ... }
/// ```
#[must_use]
pub fn build_category_file(layout: &ProjectLayout, category: &CategoryName) -> SourceFile {
    let library = &layout.config().config_library;
    let lib = package_qualifier(library);
    let type_name = category.type_name();
    let loader = category.loader_name();

    let mut file = SourceFile::new(layout.source_package());
    file.imports_mut().add(library);
    file.push_item(Item::new(ItemKind::Struct(StructDecl::new(&type_name))));

    let set_file = Stmt::new(StmtKind::Expr(Expr::call(
        format!("{lib}.SetConfigFile"),
        vec![Expr::string(&layout.settings_relative(category))],
    )));
    let read = Stmt::new(StmtKind::Define {
        names: vec!["err".to_string()],
        value: Expr::call(format!("{lib}.ReadInConfig"), Vec::new()),
    });
    let alloc = Stmt::new(StmtKind::Define {
        names: vec!["config".to_string()],
        value: Expr::address_of_zero(&type_name),
    });
    let unmarshal = Stmt::new(StmtKind::Assign {
        names: vec!["err".to_string()],
        value: Expr::call(format!("{lib}.Unmarshal"), vec![Expr::ident("config")]),
    });
    let done = Stmt::new(StmtKind::Return(vec![
        Expr::ident("config"),
        Expr::ident("nil"),
    ]));

    let body = vec![
        file.alloc_stmt(set_file),
        file.alloc_stmt(read),
        return_on_error(&mut file),
        file.alloc_stmt(alloc),
        file.alloc_stmt(unmarshal),
        return_on_error(&mut file),
        file.alloc_stmt(done),
    ];
    let func = file.push_item(
        Item::new(ItemKind::Func(FuncDecl::new(
            &loader,
            format!("() (*{type_name}, error)"),
        )))
        .with_doc(format!(
            "// {loader} unmarshalls yaml data to struct and returns a pointer to it"
        )),
    );
    file.append_to_body(func, &body);
    file
}

/// `if err != nil { return nil, err }`
fn return_on_error(file: &mut SourceFile) -> kappa_artifact::StmtId {
    let ret = file.alloc_stmt(Stmt::new(StmtKind::Return(vec![
        Expr::ident("nil"),
        Expr::ident("err"),
    ])));
    file.alloc_stmt(Stmt::new(StmtKind::If {
        cond: Expr::binary(Expr::ident("err"), "!=", Expr::ident("nil")),
        body: vec![ret],
    }))
}

/// Package name a module path is referenced by: its last segment, skipping
/// a `/vN` major-version suffix
pub(crate) fn package_qualifier(path: &str) -> &str {
    let mut segments = path.trim_end_matches('/').rsplit('/');
    let last = segments.next().unwrap_or(path);
    let is_major = last.len() > 1
        && last.starts_with('v')
        && last[1..].bytes().all(|b| b.is_ascii_digit());
    if is_major {
        segments.next().unwrap_or(last)
    } else {
        last
    }
}

/// Whether both artifacts exist and the source declares the struct
///
/// # Errors
/// Returns [`KappaError::Parse`] if the source file exists but does not parse.
pub fn category_exists(layer: &ConstitutionalLayer, category: &CategoryName) -> Result<bool> {
    match load_declaration(layer, category) {
        Ok(_) => Ok(true),
        Err(e) if e.is_not_found() => Ok(false),
        Err(e) => Err(e),
    }
}

/// Create an empty category
///
/// # Errors
/// - [`KappaError::CategoryExists`] if either artifact is already present
/// - [`KappaError::Composition`] if the lock is held or the commit fails
pub fn create_category(layer: &ConstitutionalLayer, category: &CategoryName) -> Result<()> {
    create_seeded(layer, category, None)
}

/// Create a category whose struct starts with `seed`
///
/// # Errors
/// See [`create_category`].
pub fn create_seeded(
    layer: &ConstitutionalLayer,
    category: &CategoryName,
    seed: Option<&Seed>,
) -> Result<()> {
    let layout = layer.layout();
    let settings = layout.settings_path(category);
    let source = layout.source_path(category);

    ensure_absent(category, &[&settings, &source])?;
    let _lock = CategoryLock::acquire(&layout.locks_dir(), category.as_str())?;
    ensure_absent(category, &[&settings, &source])?;

    let mut file = build_category_file(layout, category);
    let mut tx = Transaction::new();
    match seed {
        Some(seed) => {
            if let Some(id) = find_declaration(&file, category) {
                append_field(&mut file, id, seed.field.clone());
            }
            append_setting(&mut tx, &settings, &seed.key, &seed.value)?;
        }
        None => tx.stage_write(&settings, Vec::new())?,
    }
    layer.stage_new(&mut tx, &source, &file)?;
    tx.commit()?;

    tracing::info!(
        "Created category {} ({}, {})",
        category,
        settings.display(),
        source.display()
    );
    Ok(())
}

fn ensure_absent(category: &CategoryName, artifacts: &[&Path]) -> Result<()> {
    for artifact in artifacts {
        let exists = artifact
            .try_exists()
            .map_err(|e| KappaError::io(*artifact, e))?;
        if exists {
            return Err(KappaError::CategoryExists {
                category: category.to_string(),
                artifact: artifact.to_path_buf(),
            });
        }
    }
    Ok(())
}

/// Add a property to an existing category
///
/// Returns the default value written to the settings file.
///
/// # Errors
/// - [`KappaError::InvalidArgument`] if `declared_type` is not a Go type
/// - [`KappaError::CategoryNotFound`] / [`KappaError::DeclarationNotFound`]
///   if the category is incomplete; nothing is written
/// - [`KappaError::PropertyExists`] if a field with that name exists
/// - [`KappaError::Composition`] if the lock is held or the commit fails
pub fn add_property(
    layer: &ConstitutionalLayer,
    category: &CategoryName,
    property: &PropertyName,
    declared_type: &str,
) -> Result<DefaultValue> {
    let declared_type = declared_type.trim();
    validate_type(declared_type)?;

    load_declaration(layer, category)?;
    let _lock = CategoryLock::acquire(&layer.layout().locks_dir(), category.as_str())?;
    let (mut parsed, id) = load_declaration(layer, category)?;

    if has_field(&parsed.file, id, property) {
        return Err(KappaError::PropertyExists {
            category: category.to_string(),
            property: property.to_string(),
        });
    }

    let settings = layer.layout().settings_path(category);
    let existing = layer.read_text(&settings)?.unwrap_or_default();
    if setting_keys(&existing).iter().any(|k| k == property.as_str()) {
        tracing::warn!(
            "{} already has a `{}` key; appending another",
            settings.display(),
            property
        );
    }

    let default = default_value_for(declared_type);
    append_field(&mut parsed.file, id, synthesize_field(property, declared_type)).ok_or_else(
        || KappaError::DeclarationNotFound {
            path: parsed.path.clone(),
            type_name: category.type_name(),
        },
    )?;
    let table = layer.layout().config().type_import_table();
    for path in add_type_imports(&mut parsed.file, declared_type, &table) {
        tracing::debug!("Imported {} for {}", path, declared_type);
    }

    let mut tx = Transaction::new();
    layer.stage_egress(&mut tx, &parsed)?;
    append_setting(&mut tx, &settings, property.as_str(), default.as_str())?;
    tx.commit()?;

    tracing::info!(
        "Added {} {} to category {} (default {})",
        property.field_name(),
        declared_type,
        category,
        default
    );
    Ok(default)
}

/// Parse the category source and find its struct
///
/// Read-only; safe to call without the lock.
fn load_declaration(
    layer: &ConstitutionalLayer,
    category: &CategoryName,
) -> Result<(ParsedSource, ItemId)> {
    let layout = layer.layout();
    let settings = layout.settings_path(category);
    if !settings
        .try_exists()
        .map_err(|e| KappaError::io(&settings, e))?
    {
        return Err(not_found(category));
    }
    let source = layout.source_path(category);
    let parsed = layer
        .parse_ingress(&source)?
        .ok_or_else(|| not_found(category))?;
    let id = find_declaration(&parsed.file, category).ok_or_else(|| {
        KappaError::DeclarationNotFound {
            path: source.clone(),
            type_name: category.type_name(),
        }
    })?;
    Ok((parsed, id))
}

fn not_found(category: &CategoryName) -> KappaError {
    KappaError::CategoryNotFound {
        category: category.to_string(),
    }
}

fn validate_type(declared_type: &str) -> Result<()> {
    let invalid = || KappaError::InvalidArgument(format!("{declared_type:?} is not a Go type"));
    if declared_type.is_empty()
        || declared_type.contains(['\n', '`', '{', '}', ';'])
        || declared_type.contains("//")
        || declared_type.contains("/*")
    {
        return Err(invalid());
    }
    let probe = format!("package probe\n\ntype probe struct {{\n\tfield {declared_type}\n}}\n");
    let file = SourceFile::parse(&probe).map_err(|_| invalid())?;
    let Some(id) = file.find_struct("probe") else {
        return Err(invalid());
    };
    // exactly one member: `field <type>` with nothing trailing
    let members = file.struct_decl(id).map(StructDecl::members).unwrap_or_default();
    match members {
        [only] => match file.member(*only).and_then(Member::as_field) {
            Some(field)
                if field.names == ["field"]
                    && field.ty == declared_type
                    && field.tag.is_none()
                    && field.comment.is_none() =>
            {
                Ok(())
            }
            _ => Err(invalid()),
        },
        _ => Err(invalid()),
    }
}
