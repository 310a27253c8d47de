//! Arena-backed syntax tree for one Go source file
//!
//! The tree only models what the engine edits: the package clause, the import
//! block, struct type declarations (with their members), function
//! declarations (with their statements), and a handful of statement and
//! expression shapes. Everything else is carried as verbatim source text.
//!
//! Nodes live in per-file arenas and are addressed by typed ids ([`ItemId`],
//! [`MemberId`], [`StmtId`]). An id is only meaningful for the file that
//! allocated it.

use crate::imports::ImportBlock;

macro_rules! node_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(u32);

        impl $name {
            #[inline]
            fn index(self) -> usize {
                self.0 as usize
            }

            /// Raw arena index
            #[inline]
            #[must_use]
            pub fn raw(self) -> u32 {
                self.0
            }
        }
    };
}

node_id!(
    /// Id of a top-level item
    ItemId
);
node_id!(
    /// Id of a struct member (field or comment line)
    MemberId
);
node_id!(
    /// Id of a statement inside a function body
    StmtId
);

/// Top-level declaration or comment
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    /// What the item is
    pub kind: ItemKind,
    /// Doc comment lines directly above the item
    pub doc: Vec<String>,
    /// A blank line separates this item from the previous one
    pub blank_before: bool,
}

impl Item {
    /// New item preceded by a blank line and without doc comment
    #[inline]
    #[must_use]
    pub fn new(kind: ItemKind) -> Self {
        Self {
            kind,
            doc: Vec::new(),
            blank_before: true,
        }
    }

    /// Attach doc comment lines (each including its `//`)
    #[inline]
    #[must_use]
    pub fn with_doc(mut self, line: impl Into<String>) -> Self {
        self.doc.push(line.into());
        self
    }
}

/// Kinds of top-level items
#[derive(Debug, Clone, PartialEq)]
pub enum ItemKind {
    /// `type Name struct { ... }`
    Struct(StructDecl),
    /// `func name(...) ... { ... }`
    Func(FuncDecl),
    /// Free-standing comment
    Comment(String),
    /// Any other declaration, reproduced as written
    Verbatim(String),
}

/// Struct type declaration
#[derive(Debug, Clone, PartialEq)]
pub struct StructDecl {
    /// Type name
    pub name: String,
    members: Vec<MemberId>,
    inline: bool,
}

impl StructDecl {
    /// Empty struct declaration
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
            inline: false,
        }
    }

    pub(crate) fn parsed(name: String, members: Vec<MemberId>, inline: bool) -> Self {
        Self {
            name,
            members,
            inline,
        }
    }

    /// Member ids in declaration order
    #[inline]
    #[must_use]
    pub fn members(&self) -> &[MemberId] {
        &self.members
    }

    /// Written as `struct{}` on one line
    #[inline]
    #[must_use]
    pub fn is_inline(&self) -> bool {
        self.inline && self.members.is_empty()
    }
}

/// Function declaration
#[derive(Debug, Clone, PartialEq)]
pub struct FuncDecl {
    /// Function name
    pub name: String,
    /// Everything between the name and the body, e.g. `() (*X, error)`
    pub signature: String,
    body: Vec<StmtId>,
    inline: bool,
}

impl FuncDecl {
    /// Function with an empty body
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, signature: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            signature: signature.into(),
            body: Vec::new(),
            inline: false,
        }
    }

    pub(crate) fn parsed(name: String, signature: String, body: Vec<StmtId>, inline: bool) -> Self {
        Self {
            name,
            signature,
            body,
            inline,
        }
    }

    /// Statement ids of the body in order
    #[inline]
    #[must_use]
    pub fn body(&self) -> &[StmtId] {
        &self.body
    }

    /// Written as `{}` on one line
    #[inline]
    #[must_use]
    pub fn is_inline(&self) -> bool {
        self.inline && self.body.is_empty()
    }
}

/// Struct member entry
#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    /// Field or comment
    pub kind: MemberKind,
    /// A blank line separates this member from the previous one
    pub blank_before: bool,
}

impl Member {
    /// Field member without preceding blank line
    #[inline]
    #[must_use]
    pub fn field(field: Field) -> Self {
        Self {
            kind: MemberKind::Field(field),
            blank_before: false,
        }
    }

    /// Field payload, if this member is a field
    #[inline]
    #[must_use]
    pub fn as_field(&self) -> Option<&Field> {
        match &self.kind {
            MemberKind::Field(field) => Some(field),
            MemberKind::Comment(_) => None,
        }
    }
}

/// Kinds of struct members
#[derive(Debug, Clone, PartialEq)]
pub enum MemberKind {
    /// A field line
    Field(Field),
    /// A comment line between fields
    Comment(String),
}

/// Struct field: `Names Type Tag // comment`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Field names; empty for an embedded field
    pub names: Vec<String>,
    /// Type expression as written
    pub ty: String,
    /// Raw tag literal including its quotes
    pub tag: Option<String>,
    /// Trailing same-line comment
    pub comment: Option<String>,
}

impl Field {
    /// Single-name field
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            names: vec![name.into()],
            ty: ty.into(),
            tag: None,
            comment: None,
        }
    }

    /// Attach a raw tag literal
    #[inline]
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Names compared by the existence checker; embedded fields use their type
    pub fn identities(&self) -> impl Iterator<Item = &str> {
        let embedded = self.names.is_empty().then(|| embedded_name(&self.ty));
        self.names.iter().map(String::as_str).chain(embedded)
    }
}

fn embedded_name(ty: &str) -> &str {
    let ty = ty.trim_start_matches('*');
    let ty = ty.split('[').next().unwrap_or(ty);
    ty.rsplit('.').next().unwrap_or(ty)
}

/// Statement inside a function body
#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    /// Statement shape
    pub kind: StmtKind,
    /// A blank line separates this statement from the previous one
    pub blank_before: bool,
    /// Trailing same-line comment
    pub comment: Option<String>,
}

impl Stmt {
    /// Statement without blank line or comment
    #[inline]
    #[must_use]
    pub fn new(kind: StmtKind) -> Self {
        Self {
            kind,
            blank_before: false,
            comment: None,
        }
    }
}

/// Statement shapes the engine understands
#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    /// Expression statement, practically always a call
    Expr(Expr),
    /// `a, b := value`
    Define { names: Vec<String>, value: Expr },
    /// `a, b = value`
    Assign { names: Vec<String>, value: Expr },
    /// `if cond { body }`
    If { cond: Expr, body: Vec<StmtId> },
    /// `return a, b`
    Return(Vec<Expr>),
    /// Comment line
    Comment(String),
    /// Anything else, as written. `indent` is the leading whitespace of the
    /// line the statement started on, so continuation lines can be re-indented.
    Verbatim { text: String, indent: String },
}

/// Expression shapes the engine synthesizes or recognizes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// Identifier, selector, number, `nil`: a single token-ish run of text
    Ident(String),
    /// String literal including its quotes
    Lit(String),
    /// `callee(args...)`
    Call { callee: String, args: Vec<Expr> },
    /// `op operand`, e.g. `&T{}`
    Unary { op: String, operand: Box<Expr> },
    /// `lhs op rhs`
    Binary {
        lhs: Box<Expr>,
        op: String,
        rhs: Box<Expr>,
    },
    /// Empty composite literal `T{}`
    Composite(String),
}

impl Expr {
    /// Identifier or selector expression
    #[inline]
    #[must_use]
    pub fn ident(text: impl Into<String>) -> Self {
        Self::Ident(text.into())
    }

    /// Interpreted string literal for `value`
    #[inline]
    #[must_use]
    pub fn string(value: &str) -> Self {
        Self::Lit(quote(value))
    }

    /// Call expression
    #[inline]
    #[must_use]
    pub fn call(callee: impl Into<String>, args: Vec<Expr>) -> Self {
        Self::Call {
            callee: callee.into(),
            args,
        }
    }

    /// Binary expression
    #[inline]
    #[must_use]
    pub fn binary(lhs: Expr, op: impl Into<String>, rhs: Expr) -> Self {
        Self::Binary {
            lhs: Box::new(lhs),
            op: op.into(),
            rhs: Box::new(rhs),
        }
    }

    /// `&T{}`
    #[inline]
    #[must_use]
    pub fn address_of_zero(ty: impl Into<String>) -> Self {
        Self::Unary {
            op: "&".to_string(),
            operand: Box::new(Self::Composite(ty.into())),
        }
    }
}

/// Quote `value` as a Go interpreted string literal
#[must_use]
pub fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Arena {
    items: Vec<Item>,
    members: Vec<Member>,
    stmts: Vec<Stmt>,
}

/// One Go source file
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    header: Option<String>,
    package: String,
    imports: ImportBlock,
    order: Vec<ItemId>,
    arena: Arena,
}

impl SourceFile {
    /// Empty file in `package`
    #[must_use]
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            header: None,
            package: package.into(),
            imports: ImportBlock::new(),
            order: Vec::new(),
            arena: Arena::default(),
        }
    }

    pub(crate) fn set_header(&mut self, header: Option<String>) {
        self.header = header;
    }

    /// Comments above the package clause, as written
    #[inline]
    #[must_use]
    pub fn header(&self) -> Option<&str> {
        self.header.as_deref()
    }

    /// Package name
    #[inline]
    #[must_use]
    pub fn package(&self) -> &str {
        &self.package
    }

    pub(crate) fn set_package(&mut self, package: String) {
        self.package = package;
    }

    /// Import block
    #[inline]
    #[must_use]
    pub fn imports(&self) -> &ImportBlock {
        &self.imports
    }

    /// Mutable import block
    #[inline]
    pub fn imports_mut(&mut self) -> &mut ImportBlock {
        &mut self.imports
    }

    /// Top-level item ids in file order
    #[inline]
    #[must_use]
    pub fn item_ids(&self) -> &[ItemId] {
        &self.order
    }

    /// Top-level items in file order
    pub fn items(&self) -> impl Iterator<Item = (ItemId, &Item)> {
        self.order
            .iter()
            .filter_map(|id| self.arena.items.get(id.index()).map(|item| (*id, item)))
    }

    /// Look up an item
    #[inline]
    #[must_use]
    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.arena.items.get(id.index())
    }

    pub(crate) fn item_mut(&mut self, id: ItemId) -> Option<&mut Item> {
        self.arena.items.get_mut(id.index())
    }

    /// Append a top-level item
    pub fn push_item(&mut self, item: Item) -> ItemId {
        let id = ItemId(alloc_index(self.arena.items.len()));
        self.arena.items.push(item);
        self.order.push(id);
        id
    }

    /// Struct declaration behind `id`
    #[must_use]
    pub fn struct_decl(&self, id: ItemId) -> Option<&StructDecl> {
        match &self.item(id)?.kind {
            ItemKind::Struct(decl) => Some(decl),
            _ => None,
        }
    }

    /// Function declaration behind `id`
    #[must_use]
    pub fn func_decl(&self, id: ItemId) -> Option<&FuncDecl> {
        match &self.item(id)?.kind {
            ItemKind::Func(decl) => Some(decl),
            _ => None,
        }
    }

    /// First top-level struct declaration named `name`
    #[must_use]
    pub fn find_struct(&self, name: &str) -> Option<ItemId> {
        self.items().find_map(|(id, item)| match &item.kind {
            ItemKind::Struct(decl) if decl.name == name => Some(id),
            _ => None,
        })
    }

    /// First top-level function declaration named `name`
    #[must_use]
    pub fn find_func(&self, name: &str) -> Option<ItemId> {
        self.items().find_map(|(id, item)| match &item.kind {
            ItemKind::Func(decl) if decl.name == name => Some(id),
            _ => None,
        })
    }

    /// Look up a struct member
    #[inline]
    #[must_use]
    pub fn member(&self, id: MemberId) -> Option<&Member> {
        self.arena.members.get(id.index())
    }

    /// Fields of the struct behind `id` in declaration order
    pub fn fields(&self, id: ItemId) -> impl Iterator<Item = &Field> {
        self.struct_decl(id)
            .map(StructDecl::members)
            .unwrap_or_default()
            .iter()
            .filter_map(|m| self.member(*m).and_then(Member::as_field))
    }

    /// Allocate a member without attaching it to a struct
    pub(crate) fn alloc_member(&mut self, member: Member) -> MemberId {
        let id = MemberId(alloc_index(self.arena.members.len()));
        self.arena.members.push(member);
        id
    }

    /// Append a member to the struct behind `id`
    ///
    /// Returns `None` when `id` is not a struct declaration.
    pub fn push_member(&mut self, id: ItemId, member: Member) -> Option<MemberId> {
        self.struct_decl(id)?;
        let member_id = self.alloc_member(member);
        match &mut self.arena.items.get_mut(id.index())?.kind {
            ItemKind::Struct(decl) => {
                decl.members.push(member_id);
                Some(member_id)
            }
            _ => None,
        }
    }

    /// Look up a statement
    #[inline]
    #[must_use]
    pub fn stmt(&self, id: StmtId) -> Option<&Stmt> {
        self.arena.stmts.get(id.index())
    }

    /// Mutable statement
    #[inline]
    pub fn stmt_mut(&mut self, id: StmtId) -> Option<&mut Stmt> {
        self.arena.stmts.get_mut(id.index())
    }

    /// Allocate a statement without placing it in a body
    pub fn alloc_stmt(&mut self, stmt: Stmt) -> StmtId {
        let id = StmtId(alloc_index(self.arena.stmts.len()));
        self.arena.stmts.push(stmt);
        id
    }

    /// Append allocated statements to the body of the function behind `id`
    ///
    /// Returns `None` when `id` is not a function declaration.
    pub fn append_to_body(&mut self, id: ItemId, stmts: &[StmtId]) -> Option<()> {
        match &mut self.arena.items.get_mut(id.index())?.kind {
            ItemKind::Func(decl) => {
                decl.body.extend_from_slice(stmts);
                Some(())
            }
            _ => None,
        }
    }

    /// Insert allocated statements at the start of the body behind `id`
    ///
    /// Returns `None` when `id` is not a function declaration.
    pub fn prepend_to_body(&mut self, id: ItemId, stmts: &[StmtId]) -> Option<()> {
        match &mut self.arena.items.get_mut(id.index())?.kind {
            ItemKind::Func(decl) => {
                let rest = std::mem::take(&mut decl.body);
                decl.body = stmts.iter().copied().chain(rest).collect();
                Some(())
            }
            _ => None,
        }
    }
}

fn alloc_index(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}
