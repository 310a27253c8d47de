//! Go ingress: tree-sitter concrete syntax tree → [`SourceFile`]
//!
//! Struct type declarations, function declarations, imports and a few
//! statement shapes are lowered into the arena. Any other construct is
//! captured as its original text so rendering reproduces it unchanged.

use crate::error::ParseError;
use crate::imports::{ImportBlock, ImportSpec};
use crate::tree::{
    Expr, Field, FuncDecl, Item, ItemKind, Member, MemberId, MemberKind, SourceFile, Stmt, StmtId,
    StmtKind, StructDecl,
};
use tree_sitter::{Node, Parser, Tree};

/// Build a parser loaded with the Go grammar
pub(crate) fn go_parser() -> Result<Parser, ParseError> {
    let language: tree_sitter::Language = tree_sitter_go::LANGUAGE.into();
    let mut parser = Parser::new();
    parser
        .set_language(&language)
        .map_err(|e| ParseError::ParserInit(e.to_string()))?;
    Ok(parser)
}

fn parse_tree(source: &str) -> Result<Tree, ParseError> {
    let mut parser = go_parser()?;
    let tree = parser.parse(source, None).ok_or(ParseError::ParseFailed)?;
    if let Some(node) = first_error(tree.root_node()) {
        let pos = node.start_position();
        let message = if node.is_missing() {
            format!("missing {}", node.kind())
        } else {
            "unexpected input".to_string()
        };
        return Err(ParseError::Syntax {
            line: pos.row + 1,
            column: pos.column + 1,
            message,
        });
    }
    Ok(tree)
}

/// Check that `source` is syntactically valid Go
///
/// # Errors
/// Returns [`ParseError::Syntax`] pointing at the first error node.
pub fn check_syntax(source: &str) -> Result<(), ParseError> {
    parse_tree(source).map(|_| ())
}

fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    let children: Vec<_> = node.children(&mut cursor).collect();
    children.into_iter().find_map(first_error)
}

fn named_children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

fn start_row(node: Node<'_>) -> usize {
    node.start_position().row
}

fn end_row(node: Node<'_>) -> usize {
    node.end_position().row
}

impl SourceFile {
    /// Parse Go source text
    ///
    /// # Errors
    /// Returns [`ParseError::Syntax`] if the text is not valid Go.
    pub fn parse(source: &str) -> Result<Self, ParseError> {
        let tree = parse_tree(source)?;
        let mut lowering = Lowering {
            src: source,
            file: SourceFile::new(String::new()),
            groups: Vec::new(),
            parenthesized: false,
            import_doc: Vec::new(),
        };
        lowering.source_file(tree.root_node());

        let Lowering {
            mut file,
            groups,
            parenthesized,
            import_doc,
            ..
        } = lowering;
        let mut imports = ImportBlock::from_groups(groups, parenthesized);
        imports.doc = import_doc;
        *file.imports_mut() = imports;
        Ok(file)
    }
}

struct Lowering<'s> {
    src: &'s str,
    file: SourceFile,
    groups: Vec<Vec<ImportSpec>>,
    parenthesized: bool,
    import_doc: Vec<String>,
}

impl<'s> Lowering<'s> {
    fn text(&self, node: Node<'_>) -> &'s str {
        &self.src[node.byte_range()]
    }

    fn source_file(&mut self, root: Node<'_>) {
        let mut pending: Vec<Node<'_>> = Vec::new();
        let mut last_row: Option<usize> = None;
        let mut seen_package = false;

        for node in named_children(root) {
            if node.kind() == "comment" {
                pending.push(node);
                continue;
            }
            if !seen_package && node.kind() == "package_clause" {
                if let (Some(first), Some(last)) = (pending.first(), pending.last()) {
                    let mut header = self.src[first.start_byte()..last.end_byte()].to_string();
                    // Detached header (licence text) keeps its blank line
                    if start_row(node) > end_row(*last) + 1 {
                        header.push('\n');
                    }
                    self.file.set_header(Some(header));
                }
                pending.clear();
                let name = named_children(node)
                    .into_iter()
                    .find(|n| n.kind() == "package_identifier")
                    .map(|n| self.text(n).to_string())
                    .unwrap_or_default();
                self.file.set_package(name);
                seen_package = true;
                last_row = Some(end_row(node));
                continue;
            }

            let doc_nodes = self.flush_comments(&mut pending, start_row(node), &mut last_row);
            let first_row = doc_nodes.first().map_or(start_row(node), |n| start_row(*n));
            let doc: Vec<String> = doc_nodes.iter().map(|n| self.text(*n).to_string()).collect();

            if node.kind() == "import_declaration" {
                self.import_doc.extend(doc);
                self.import_declaration(node);
                last_row = Some(end_row(node));
                continue;
            }

            let blank_before = last_row.map_or(true, |row| first_row > row + 1);
            let kind = self.top_level(node);
            self.file.push_item(Item {
                kind,
                doc,
                blank_before,
            });
            last_row = Some(end_row(node));
        }

        for comment in pending {
            self.push_comment_item(comment, &mut last_row);
        }
    }

    /// Emit pending comments as free-standing items, except the contiguous
    /// run ending on the line above `decl_row`, which is returned as doc
    fn flush_comments<'t>(
        &mut self,
        pending: &mut Vec<Node<'t>>,
        decl_row: usize,
        last_row: &mut Option<usize>,
    ) -> Vec<Node<'t>> {
        let mut doc_start = pending.len();
        let mut expected = decl_row;
        while doc_start > 0 {
            let candidate = pending[doc_start - 1];
            let trailing = last_row.is_some_and(|row| start_row(candidate) <= row);
            if trailing || end_row(candidate) + 1 != expected {
                break;
            }
            expected = start_row(candidate);
            doc_start -= 1;
        }
        let doc = pending.split_off(doc_start);
        for comment in std::mem::take(pending) {
            self.push_comment_item(comment, last_row);
        }
        doc
    }

    fn push_comment_item(&mut self, comment: Node<'_>, last_row: &mut Option<usize>) {
        let text = self.text(comment);
        if *last_row == Some(start_row(comment)) {
            let last = self.file.item_ids().last().copied();
            if let Some(ItemKind::Verbatim(prev)) =
                last.and_then(|id| self.file.item_mut(id)).map(|item| &mut item.kind)
            {
                prev.push(' ');
                prev.push_str(text);
                *last_row = Some(end_row(comment));
                return;
            }
        }
        let blank_before = last_row.map_or(true, |row| start_row(comment) > row + 1);
        self.file.push_item(Item {
            kind: ItemKind::Comment(self.text(comment).to_string()),
            doc: Vec::new(),
            blank_before,
        });
        *last_row = Some(end_row(comment));
    }

    fn import_declaration(&mut self, node: Node<'_>) {
        let mut group: Vec<ImportSpec> = Vec::new();
        for child in named_children(node) {
            match child.kind() {
                "import_spec" => group.extend(self.import_spec(child)),
                "import_spec_list" => {
                    self.parenthesized = true;
                    self.import_spec_list(child, &mut group);
                }
                _ => {}
            }
        }
        if !group.is_empty() {
            self.groups.push(group);
        }
    }

    fn import_spec_list(&mut self, list: Node<'_>, group: &mut Vec<ImportSpec>) {
        let mut last_row: Option<usize> = None;
        let mut doc: Vec<String> = Vec::new();
        for child in named_children(list) {
            let row = start_row(child);
            let separated = last_row.is_some_and(|last| row > last + 1);
            if separated && !group.is_empty() && doc.is_empty() {
                self.groups.push(std::mem::take(group));
            }
            match child.kind() {
                "comment" => {
                    let text = self.text(child).to_string();
                    match group.last_mut() {
                        Some(spec) if last_row == Some(row) && spec.comment.is_none() => {
                            spec.comment = Some(text);
                        }
                        _ => doc.push(text),
                    }
                }
                "import_spec" => {
                    if let Some(mut spec) = self.import_spec(child) {
                        spec.doc = std::mem::take(&mut doc);
                        group.push(spec);
                    }
                }
                _ => {}
            }
            last_row = Some(end_row(child));
        }
    }

    fn import_spec(&self, node: Node<'_>) -> Option<ImportSpec> {
        let raw = self.text(node.child_by_field_name("path")?);
        let path = raw
            .strip_prefix('"')
            .and_then(|r| r.strip_suffix('"'))
            .or_else(|| raw.strip_prefix('`').and_then(|r| r.strip_suffix('`')))
            .unwrap_or(raw);
        let name = node
            .child_by_field_name("name")
            .map(|n| self.text(n).to_string());
        Some(ImportSpec {
            name,
            path: path.to_string(),
            comment: None,
            doc: Vec::new(),
        })
    }

    fn top_level(&mut self, node: Node<'_>) -> ItemKind {
        let lowered = match node.kind() {
            "type_declaration" => self.type_declaration(node),
            "function_declaration" => self.function_declaration(node),
            _ => None,
        };
        lowered.unwrap_or_else(|| ItemKind::Verbatim(self.text(node).to_string()))
    }

    /// Only `type Name struct { ... }` with a single spec is modelled
    fn type_declaration(&mut self, node: Node<'_>) -> Option<ItemKind> {
        let grouped = self
            .text(node)
            .strip_prefix("type")
            .is_some_and(|rest| rest.trim_start().starts_with('('));
        let children = named_children(node);
        let [spec] = children.as_slice() else {
            return None;
        };
        if grouped {
            return None;
        }
        if spec.kind() != "type_spec" || spec.child_by_field_name("type_parameters").is_some() {
            return None;
        }
        let name = self.text(spec.child_by_field_name("name")?).to_string();
        let ty = spec.child_by_field_name("type")?;
        if ty.kind() != "struct_type" {
            return None;
        }
        let list = named_children(ty)
            .into_iter()
            .find(|n| n.kind() == "field_declaration_list")?;
        let inline = start_row(list) == end_row(list);
        let members = self.struct_members(list);
        Some(ItemKind::Struct(StructDecl::parsed(name, members, inline)))
    }

    fn struct_members(&mut self, list: Node<'_>) -> Vec<MemberId> {
        let mut members = Vec::new();
        let mut last_row = start_row(list);
        // Field waiting for a possible trailing comment on its last line
        let mut open: Option<Member> = None;

        for child in named_children(list) {
            let row = start_row(child);
            let blank_before = (open.is_some() || !members.is_empty()) && row > last_row + 1;
            match child.kind() {
                "comment" => {
                    let text = self.text(child).to_string();
                    if let Some(MemberKind::Field(field)) = open.as_mut().map(|m| &mut m.kind) {
                        if row == last_row && field.comment.is_none() {
                            field.comment = Some(text);
                            last_row = end_row(child);
                            continue;
                        }
                    }
                    members.extend(open.take().map(|m| self.file.alloc_member(m)));
                    members.push(self.file.alloc_member(Member {
                        kind: MemberKind::Comment(text),
                        blank_before,
                    }));
                }
                "field_declaration" => {
                    members.extend(open.take().map(|m| self.file.alloc_member(m)));
                    open = Some(Member {
                        kind: MemberKind::Field(self.field_declaration(child)),
                        blank_before,
                    });
                }
                _ => {}
            }
            last_row = end_row(child);
        }
        members.extend(open.take().map(|m| self.file.alloc_member(m)));
        members
    }

    fn field_declaration(&self, node: Node<'_>) -> Field {
        let mut cursor = node.walk();
        let names: Vec<String> = node
            .children_by_field_name("name", &mut cursor)
            .map(|n| self.text(n).to_string())
            .collect();
        // Embedded pointer fields keep their `*`, which sits outside the type node
        let ty = node.child_by_field_name("type").map_or_else(String::new, |ty| {
            if names.is_empty() {
                self.src[node.start_byte()..ty.end_byte()].trim().to_string()
            } else {
                self.text(ty).to_string()
            }
        });
        let tag = node
            .child_by_field_name("tag")
            .map(|n| self.text(n).to_string());
        Field {
            names,
            ty,
            tag,
            comment: None,
        }
    }

    fn function_declaration(&mut self, node: Node<'_>) -> Option<ItemKind> {
        let name_node = node.child_by_field_name("name")?;
        let body = node.child_by_field_name("body")?;
        let name = self.text(name_node).to_string();
        let signature = self.src[name_node.end_byte()..body.start_byte()]
            .trim()
            .to_string();
        let inline = start_row(body) == end_row(body);
        let stmts = self.block(body);
        Some(ItemKind::Func(FuncDecl::parsed(name, signature, stmts, inline)))
    }

    fn block(&mut self, block: Node<'_>) -> Vec<StmtId> {
        let mut nodes = Vec::new();
        for child in named_children(block) {
            if child.kind() == "statement_list" {
                nodes.extend(named_children(child));
            } else {
                nodes.push(child);
            }
        }

        let mut ids: Vec<StmtId> = Vec::new();
        let mut last_row = start_row(block);
        for node in nodes {
            let row = start_row(node);
            if node.kind() == "empty_statement" {
                continue;
            }
            if node.kind() == "comment" && row == last_row {
                let text = self.text(node).to_string();
                if let Some(stmt) = ids.last().and_then(|id| self.file.stmt_mut(*id)) {
                    if stmt.comment.is_none() {
                        stmt.comment = Some(text);
                        last_row = end_row(node);
                        continue;
                    }
                }
            }
            let blank_before = !ids.is_empty() && row > last_row + 1;
            let kind = self.statement(node);
            ids.push(self.file.alloc_stmt(Stmt {
                kind,
                blank_before,
                comment: None,
            }));
            last_row = end_row(node);
        }
        ids
    }

    fn statement(&self, node: Node<'_>) -> StmtKind {
        let lowered = match node.kind() {
            "comment" => Some(StmtKind::Comment(self.text(node).to_string())),
            "expression_statement" => named_children(node)
                .first()
                .filter(|n| n.kind() == "call_expression")
                .and_then(|n| self.expr(*n))
                .map(StmtKind::Expr),
            "short_var_declaration" => self
                .binding(node)
                .map(|(names, value)| StmtKind::Define { names, value }),
            "assignment_statement" => node
                .child_by_field_name("operator")
                .filter(|op| self.text(*op) == "=")
                .and_then(|_| self.binding(node))
                .map(|(names, value)| StmtKind::Assign { names, value }),
            "return_statement" => self.return_values(node).map(StmtKind::Return),
            _ => None,
        };
        lowered.unwrap_or_else(|| StmtKind::Verbatim {
            text: self.text(node).to_string(),
            indent: self.line_indent(node),
        })
    }

    fn binding(&self, node: Node<'_>) -> Option<(Vec<String>, Expr)> {
        let left = node.child_by_field_name("left")?;
        let right = node.child_by_field_name("right")?;
        let names = named_children(left)
            .into_iter()
            .map(|n| (n.kind() == "identifier").then(|| self.text(n).to_string()))
            .collect::<Option<Vec<_>>>()?;
        let values = named_children(right);
        let [value] = values.as_slice() else {
            return None;
        };
        Some((names, self.expr(*value)?))
    }

    fn return_values(&self, node: Node<'_>) -> Option<Vec<Expr>> {
        let Some(list) = named_children(node).into_iter().next() else {
            return Some(Vec::new());
        };
        if list.kind() != "expression_list" {
            return None;
        }
        named_children(list)
            .into_iter()
            .map(|n| self.expr(n))
            .collect()
    }

    /// Single-line expressions built from identifiers, selectors, literals
    /// and calls of those
    fn expr(&self, node: Node<'_>) -> Option<Expr> {
        if start_row(node) != end_row(node) {
            return None;
        }
        match node.kind() {
            "identifier" | "int_literal" | "float_literal" | "nil" | "true" | "false" => {
                Some(Expr::Ident(self.text(node).to_string()))
            }
            "selector_expression" => {
                let operand = node.child_by_field_name("operand")?;
                match self.expr(operand)? {
                    Expr::Ident(_) => Some(Expr::Ident(self.text(node).to_string())),
                    _ => None,
                }
            }
            "interpreted_string_literal" | "raw_string_literal" => {
                Some(Expr::Lit(self.text(node).to_string()))
            }
            "call_expression" => {
                let function = node.child_by_field_name("function")?;
                let Expr::Ident(callee) = self.expr(function)? else {
                    return None;
                };
                let arguments = node.child_by_field_name("arguments")?;
                if self.text(arguments).contains("...") {
                    return None;
                }
                let args = named_children(arguments)
                    .into_iter()
                    .map(|arg| self.expr(arg))
                    .collect::<Option<Vec<_>>>()?;
                Some(Expr::Call { callee, args })
            }
            _ => None,
        }
    }

    fn line_indent(&self, node: Node<'_>) -> String {
        let start = node.start_byte();
        let line_start = self.src[..start].rfind('\n').map_or(0, |i| i + 1);
        self.src[line_start..start]
            .chars()
            .take_while(|c| *c == '\t' || *c == ' ')
            .collect()
    }
}
