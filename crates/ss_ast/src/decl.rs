//! Compilation units, declarations and members.

use serde::Serialize;
use swc_common::Span;

use crate::{Block, RawText, TypeRef};

/// A parsed source file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CompilationUnit {
    pub items: Vec<Item>,
}

impl CompilationUnit {
    /// Whether `using System;` (or `global using System;`) appears at file scope.
    pub fn imports_system(&self) -> bool {
        self.items.iter().any(|item| match item {
            Item::Using(using) => using.target == "System",
            _ => false,
        })
    }

    /// All declarations, depth first, including those inside namespaces and
    /// nested in other declarations.
    pub fn declarations(&self) -> Vec<&Declaration> {
        let mut out = Vec::new();
        collect_items(&self.items, &mut out);
        out
    }
}

fn collect_items<'a>(items: &'a [Item], out: &mut Vec<&'a Declaration>) {
    for item in items {
        match item {
            Item::Declaration(decl) => collect_decl(decl, out),
            Item::Namespace(ns) => collect_items(&ns.items, out),
            _ => {}
        }
    }
}

fn collect_decl<'a>(decl: &'a Declaration, out: &mut Vec<&'a Declaration>) {
    out.push(decl);
    for member in decl.members() {
        if let Member::Type(nested) = member {
            collect_decl(nested, out);
        }
    }
}

/// A top-level or namespace-level item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Item {
    Using(Using),
    Namespace(Namespace),
    Declaration(Declaration),
    /// A type or construct passed through verbatim (interfaces, enums, structs, ...).
    Raw(RawText),
    Comment(RawText),
}

/// `[global] using target;`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Using {
    pub global: bool,
    /// Everything between `using` and `;`, e.g. `System`, `static System.Math`.
    pub target: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Namespace {
    pub name: String,
    /// `namespace X;` rather than `namespace X { ... }`.
    pub file_scoped: bool,
    pub items: Vec<Item>,
}

/// The declaration form written in source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DeclKind {
    /// `class`
    Class,
    /// `record` / `record class`: immutable form.
    Record,
    /// `data class`: mutable form.
    Data,
}

/// How a shorthand property may be written after construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MutabilityMode {
    /// `{ get; init; }`
    InitOnce,
    /// `{ get; set; }`
    Mutable,
}

impl DeclKind {
    pub fn mutability(self) -> MutabilityMode {
        match self {
            DeclKind::Record => MutabilityMode::InitOnce,
            DeclKind::Data | DeclKind::Class => MutabilityMode::Mutable,
        }
    }
}

/// An entry in a declaration's base list.
///
/// `Base(x)` (a base class with primary arguments) keeps its argument text in
/// `args`; `IFoo` has none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BaseEntry {
    pub name: String,
    pub args: Option<String>,
}

/// A class declaration, in either grammar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Declaration {
    pub attributes: Vec<String>,
    pub modifiers: Vec<String>,
    pub kind: DeclKind,
    pub singleton: bool,
    pub name: String,
    /// `<T, U>` as written, if generic.
    pub type_params: Option<String>,
    /// The primary parameter list, if the declaration has one.
    pub params: Option<Vec<Parameter>>,
    /// Constructor accessibility from a `: public()` style base entry.
    pub ctor_access: Option<String>,
    pub bases: Vec<BaseEntry>,
    /// `where` clauses, one per entry, without the `where` keyword.
    pub constraints: Vec<String>,
    pub body: Vec<BodyItem>,
    /// The declaration exactly as written, for emitting it unchanged.
    pub source: RawText,
    #[serde(skip)]
    pub span: Span,
}

impl Declaration {
    /// The declared type as referenced from inside: `Name` or `Name<T>`.
    pub fn self_type(&self) -> String {
        match &self.type_params {
            Some(params) => format!("{}{}", self.name, params),
            None => self.name.clone(),
        }
    }

    /// Index of the first member in `body`, or `body.len()` if there is none.
    pub fn first_member_index(&self) -> usize {
        self.body
            .iter()
            .position(|item| matches!(item, BodyItem::Member(_)))
            .unwrap_or(self.body.len())
    }

    pub fn members(&self) -> impl Iterator<Item = &Member> {
        self.body.iter().filter_map(|item| match item {
            BodyItem::Member(member) => Some(member),
            _ => None,
        })
    }

    /// Instance (non-static) constructors with their body indices.
    pub fn instance_constructors(&self) -> impl Iterator<Item = (usize, &Constructor)> {
        self.body
            .iter()
            .enumerate()
            .filter_map(|(idx, item)| match item {
                BodyItem::Member(Member::Constructor(ctor)) if !ctor.is_static() => {
                    Some((idx, ctor))
                }
                _ => None,
            })
    }

    /// Whether a member with this name is declared in the body.
    pub fn declares_member(&self, name: &str) -> bool {
        self.members().any(|member| member.name() == Some(name))
    }

    /// The kind this declaration has once lowered: a record without a
    /// parameter list is already C#, every other form becomes a class.
    pub fn lowered_kind(&self) -> DeclKind {
        match self.kind {
            DeclKind::Record if self.params.is_none() => DeclKind::Record,
            _ => DeclKind::Class,
        }
    }

    /// True when nothing in this declaration uses extension syntax.
    pub fn is_baseline(&self) -> bool {
        self.kind == self.lowered_kind()
            && !self.singleton
            && self.params.is_none()
            && self.ctor_access.is_none()
            && self.bases.iter().all(|base| base.args.is_none())
            && self.body.iter().all(|item| match item {
                BodyItem::Statement(_) => false,
                BodyItem::Comment(_) => true,
                BodyItem::Member(member) => member.is_baseline(),
            })
    }
}

/// One entry of a class body, in source order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum BodyItem {
    Member(Member),
    /// A loose statement: an unnamed initializer if it precedes every member.
    Statement(RawText),
    Comment(RawText),
}

/// How a parameter is marked as null-asserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum NullMarker {
    /// `[ThrowArgumentNullException]`
    Attribute,
    /// `name!!`
    BangBang,
}

/// Whether an identifier starts with an uppercase letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Capitalization {
    Upper,
    Lower,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Parameter {
    /// Attributes other than the null-assertion marker, one per entry.
    pub attributes: Vec<String>,
    /// `ref`, `out`, `in`, `params`, `this`, `scoped`.
    pub modifiers: Vec<String>,
    pub ty: TypeRef,
    pub name: String,
    pub default: Option<String>,
    pub null_assertion: Option<NullMarker>,
    #[serde(skip)]
    pub span: Span,
}

impl Parameter {
    pub fn capitalization(&self) -> Capitalization {
        match self.name.trim_start_matches('@').chars().next() {
            Some(c) if c.is_uppercase() => Capitalization::Upper,
            _ => Capitalization::Lower,
        }
    }
}

/// `[modifiers] get;` inside an auto-property accessor list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Accessor {
    pub modifiers: Vec<String>,
    pub keyword: String,
}

impl Accessor {
    pub fn new(keyword: &str) -> Self {
        Self {
            modifiers: Vec::new(),
            keyword: keyword.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum PropertyBody {
    /// `{ get; set; }`
    Auto(Vec<Accessor>),
    /// `=> expr;`
    Expression(RawText),
    /// `{ get { ... } set { ... } }`, verbatim.
    Raw(RawText),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Property {
    pub attributes: Vec<String>,
    pub modifiers: Vec<String>,
    pub ty: TypeRef,
    pub name: String,
    pub body: PropertyBody,
    pub initializer: Option<RawText>,
    #[serde(skip)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    pub attributes: Vec<String>,
    pub modifiers: Vec<String>,
    pub ty: TypeRef,
    pub name: String,
    pub initializer: Option<RawText>,
    #[serde(skip)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Constructor {
    pub attributes: Vec<String>,
    pub modifiers: Vec<String>,
    pub name: String,
    pub params: Vec<Parameter>,
    /// `base(...)` or `this(...)`, without the leading colon.
    pub initializer: Option<String>,
    pub body: Block,
    #[serde(skip)]
    pub span: Span,
}

impl Constructor {
    pub fn is_static(&self) -> bool {
        self.modifiers.iter().any(|m| m == "static")
    }

    /// Accessibility as written; an unmarked constructor is private.
    pub fn is_private(&self) -> bool {
        !self
            .modifiers
            .iter()
            .any(|m| matches!(m.as_str(), "public" | "protected" | "internal"))
    }

    pub fn chains_to_this(&self) -> bool {
        self.initializer
            .as_deref()
            .is_some_and(|init| init.starts_with("this"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum MethodBody {
    Block(Block),
    /// `=> expr;`
    Expression(RawText),
    /// `;` (abstract, extern, partial)
    None,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Method {
    pub attributes: Vec<String>,
    pub modifiers: Vec<String>,
    pub return_type: TypeRef,
    pub name: String,
    pub type_params: Option<String>,
    pub params: Vec<Parameter>,
    pub constraints: Vec<String>,
    pub body: MethodBody,
    #[serde(skip)]
    pub span: Span,
}

impl Method {
    /// Whether `=> expr` must become `expr;` rather than `return expr;`.
    pub fn returns_nothing(&self) -> bool {
        let is_async = self.modifiers.iter().any(|m| m == "async");
        self.return_type.is_void()
            || (is_async && matches!(self.return_type.text.as_str(), "Task" | "ValueTask"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Member {
    Field(Field),
    Property(Property),
    Constructor(Constructor),
    Method(Method),
    /// A nested class declaration.
    Type(Box<Declaration>),
    /// Anything kept verbatim: events, indexers, operators, nested interfaces.
    Raw(RawText),
}

impl Member {
    pub fn name(&self) -> Option<&str> {
        match self {
            Member::Field(f) => Some(&f.name),
            Member::Property(p) => Some(&p.name),
            Member::Constructor(c) => Some(&c.name),
            Member::Method(m) => Some(&m.name),
            Member::Type(d) => Some(&d.name),
            Member::Raw(_) => None,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Member::Field(f) => f.span,
            Member::Property(p) => p.span,
            Member::Constructor(c) => c.span,
            Member::Method(m) => m.span,
            Member::Type(d) => d.span,
            Member::Raw(raw) => raw.span,
        }
    }

    pub fn params(&self) -> &[Parameter] {
        match self {
            Member::Constructor(c) => &c.params,
            Member::Method(m) => &m.params,
            _ => &[],
        }
    }

    fn is_baseline(&self) -> bool {
        match self {
            Member::Type(decl) => decl.is_baseline(),
            _ => self.params().iter().all(|p| p.null_assertion.is_none()),
        }
    }
}
