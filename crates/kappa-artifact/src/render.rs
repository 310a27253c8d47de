//! Go egress: [`SourceFile`] → canonical text
//!
//! Output follows `gofmt` conventions: tab indentation, sorted import groups
//! separated by blank lines, and struct fields aligned in columns. The
//! rendered text is parsed back before it is returned, so an emitter never
//! hands out source that does not compile syntactically.

use crate::error::FormatError;
use crate::imports::{ImportBlock, ImportSpec};
use crate::parse::check_syntax;
use crate::tabwriter;
use crate::tree::{
    Expr, Field, FuncDecl, Item, ItemKind, MemberKind, SourceFile, StmtId, StmtKind, StructDecl,
};

/// Renders a syntax tree back to source text
pub trait Emitter: Send + Sync {
    /// Produce the text of `file`
    ///
    /// # Errors
    /// Returns [`FormatError`] if the tree references foreign nodes or the
    /// output is not valid source.
    fn emit(&self, file: &SourceFile) -> Result<String, FormatError>;
}

/// `gofmt`-style emitter
#[derive(Debug, Clone, Copy, Default)]
pub struct GoFormatter;

impl GoFormatter {
    /// Create formatter
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Emitter for GoFormatter {
    fn emit(&self, file: &SourceFile) -> Result<String, FormatError> {
        let out = Writer { file }.file()?;
        check_syntax(&out)?;
        Ok(out)
    }
}

impl SourceFile {
    /// Render with [`GoFormatter`]
    ///
    /// # Errors
    /// See [`Emitter::emit`].
    pub fn render(&self) -> Result<String, FormatError> {
        GoFormatter.emit(self)
    }
}

struct Writer<'f> {
    file: &'f SourceFile,
}

impl Writer<'_> {
    fn file(&self) -> Result<String, FormatError> {
        let mut out = String::new();
        if let Some(header) = self.file.header() {
            out.push_str(header);
            out.push('\n');
        }
        out.push_str("package ");
        out.push_str(self.file.package());
        out.push('\n');

        let imports = self.file.imports();
        if !imports.is_empty() {
            out.push('\n');
            write_imports(&mut out, imports);
        }

        for (index, (_, item)) in self.file.items().enumerate() {
            if index == 0 || item.blank_before {
                out.push('\n');
            }
            self.item(&mut out, item)?;
        }
        Ok(out)
    }

    fn item(&self, out: &mut String, item: &Item) -> Result<(), FormatError> {
        for line in &item.doc {
            out.push_str(line);
            out.push('\n');
        }
        match &item.kind {
            ItemKind::Struct(decl) => self.struct_decl(out, decl)?,
            ItemKind::Func(decl) => self.func_decl(out, decl)?,
            ItemKind::Comment(text) | ItemKind::Verbatim(text) => out.push_str(text),
        }
        out.push('\n');
        Ok(())
    }

    fn struct_decl(&self, out: &mut String, decl: &StructDecl) -> Result<(), FormatError> {
        out.push_str("type ");
        out.push_str(&decl.name);
        if decl.is_inline() {
            out.push_str(" struct{}");
            return Ok(());
        }
        out.push_str(" struct {\n");

        let mut section = Section::default();
        for (index, id) in decl.members().iter().enumerate() {
            let member = self.file.member(*id).ok_or(FormatError::DanglingNode {
                kind: "member",
                id: id.raw(),
            })?;
            if index > 0 && member.blank_before {
                section.push(vec![String::new()], None);
            }
            match &member.kind {
                MemberKind::Comment(text) => section.push(vec![text.clone()], None),
                MemberKind::Field(field) => {
                    let (cells, tail) = field_cells(field);
                    let multi_line = tail.is_some();
                    section.push(cells, tail);
                    // the next field starts a new alignment section
                    if multi_line {
                        section.flush(out);
                    }
                }
            }
        }
        section.flush(out);
        out.push('}');
        Ok(())
    }

    fn func_decl(&self, out: &mut String, decl: &FuncDecl) -> Result<(), FormatError> {
        out.push_str("func ");
        out.push_str(&decl.name);
        out.push_str(&decl.signature);
        if decl.is_inline() {
            out.push_str(" {}");
            return Ok(());
        }
        out.push_str(" {\n");
        self.block(out, decl.body(), 1)?;
        out.push('}');
        Ok(())
    }

    fn block(&self, out: &mut String, body: &[StmtId], depth: usize) -> Result<(), FormatError> {
        let indent = "\t".repeat(depth);
        for (index, id) in body.iter().enumerate() {
            let stmt = self.file.stmt(*id).ok_or(FormatError::DanglingNode {
                kind: "statement",
                id: id.raw(),
            })?;
            if index > 0 && stmt.blank_before {
                out.push('\n');
            }
            out.push_str(&indent);
            match &stmt.kind {
                StmtKind::Expr(expr) => out.push_str(&expr_text(expr)),
                StmtKind::Define { names, value } => {
                    out.push_str(&format!("{} := {}", names.join(", "), expr_text(value)));
                }
                StmtKind::Assign { names, value } => {
                    out.push_str(&format!("{} = {}", names.join(", "), expr_text(value)));
                }
                StmtKind::If { cond, body } => {
                    out.push_str(&format!("if {} {{\n", expr_text(cond)));
                    self.block(out, body, depth + 1)?;
                    out.push_str(&indent);
                    out.push('}');
                }
                StmtKind::Return(values) => {
                    out.push_str("return");
                    if !values.is_empty() {
                        let values: Vec<_> = values.iter().map(expr_text).collect();
                        out.push(' ');
                        out.push_str(&values.join(", "));
                    }
                }
                StmtKind::Comment(text) => out.push_str(text),
                StmtKind::Verbatim { text, indent: original } => {
                    out.push_str(&reindent(text, original, &indent));
                }
            }
            if let Some(comment) = &stmt.comment {
                out.push(' ');
                out.push_str(comment);
            }
            out.push('\n');
        }
        Ok(())
    }
}

fn write_imports(out: &mut String, imports: &ImportBlock) {
    for line in &imports.doc {
        out.push_str(line);
        out.push('\n');
    }
    if !imports.is_parenthesized() {
        if let Some(spec) = imports.groups().iter().flatten().next() {
            out.push_str("import ");
            out.push_str(&spec_text(spec));
            out.push('\n');
        }
        return;
    }
    out.push_str("import (\n");
    for (index, group) in imports.groups().iter().enumerate() {
        if index > 0 {
            out.push('\n');
        }
        for spec in group {
            for line in &spec.doc {
                out.push('\t');
                out.push_str(line);
                out.push('\n');
            }
            out.push('\t');
            out.push_str(&spec_text(spec));
            out.push('\n');
        }
    }
    out.push_str(")\n");
}

fn spec_text(spec: &ImportSpec) -> String {
    let mut text = String::new();
    if let Some(name) = &spec.name {
        text.push_str(name);
        text.push(' ');
    }
    text.push('"');
    text.push_str(&spec.path);
    text.push('"');
    if let Some(comment) = &spec.comment {
        text.push(' ');
        text.push_str(comment);
    }
    text
}

/// Struct rows waiting for column alignment
#[derive(Default)]
struct Section {
    rows: Vec<Vec<String>>,
    /// Continuation lines of a multi-line last cell, emitted unaligned
    tails: Vec<Option<String>>,
}

impl Section {
    fn push(&mut self, cells: Vec<String>, tail: Option<String>) {
        self.rows.push(cells);
        self.tails.push(tail);
    }

    fn flush(&mut self, out: &mut String) {
        let tails = std::mem::take(&mut self.tails);
        let lines = tabwriter::align(&std::mem::take(&mut self.rows));
        for (line, tail) in lines.into_iter().zip(tails) {
            if !line.is_empty() {
                out.push('\t');
                out.push_str(&line);
            }
            if let Some(tail) = tail {
                out.push('\n');
                out.push_str(&tail);
            }
            out.push('\n');
        }
    }
}

/// Cells of a field row, plus the lines after the first when the type spans
/// several lines
fn field_cells(field: &Field) -> (Vec<String>, Option<String>) {
    let mut cells = Vec::with_capacity(4);
    if !field.names.is_empty() {
        cells.push(field.names.join(", "));
    }
    let mut rest = vec![field.ty.clone()];
    rest.extend(field.tag.clone());
    rest.extend(field.comment.clone());
    if !rest.iter().any(|c| c.contains('\n')) {
        cells.extend(rest);
        return (cells, None);
    }
    let joined = rest.join(" ");
    let (first, tail) = joined.split_once('\n').unwrap_or((joined.as_str(), ""));
    cells.push(first.to_string());
    (cells, Some(tail.to_string()))
}

fn expr_text(expr: &Expr) -> String {
    match expr {
        Expr::Ident(text) | Expr::Lit(text) => text.clone(),
        Expr::Call { callee, args } => {
            let args: Vec<_> = args.iter().map(expr_text).collect();
            format!("{callee}({})", args.join(", "))
        }
        Expr::Unary { op, operand } => format!("{op}{}", expr_text(operand)),
        Expr::Binary { lhs, op, rhs } => {
            format!("{} {op} {}", expr_text(lhs), expr_text(rhs))
        }
        Expr::Composite(ty) => format!("{ty}{{}}"),
    }
}

/// Move continuation lines of a verbatim statement from `from` to `to`
fn reindent(text: &str, from: &str, to: &str) -> String {
    if from == to {
        return text.to_string();
    }
    let mut lines = text.split('\n');
    let mut out = lines.next().unwrap_or_default().to_string();
    for line in lines {
        out.push('\n');
        match line.strip_prefix(from) {
            Some(rest) => {
                out.push_str(to);
                out.push_str(rest);
            }
            None => out.push_str(line),
        }
    }
    out
}
