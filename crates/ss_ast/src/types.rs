//! Leaf nodes shared by declarations and statements.

use serde::Serialize;
use swc_common::{Span, DUMMY_SP};

/// A slice of source kept verbatim.
///
/// `column` is the visual column (tabs count as four) of the first character
/// in the original source; the emitter uses it to re-indent continuation
/// lines. `idents` lists the identifiers the slice mentions, in source order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawText {
    pub text: String,
    #[serde(skip)]
    pub span: Span,
    pub column: u32,
    #[serde(skip)]
    pub idents: Vec<String>,
}

impl RawText {
    pub fn new(text: impl Into<String>, span: Span, column: u32, idents: Vec<String>) -> Self {
        Self {
            text: text.into(),
            span,
            column,
            idents,
        }
    }

    /// Text that did not come from the source. Has no span and no identifiers.
    pub fn synthesized(text: impl Into<String>) -> Self {
        Self::new(text, DUMMY_SP, 0, Vec::new())
    }

    /// Whether `name` occurs as an identifier token (ignoring a leading `@`).
    pub fn mentions(&self, name: &str) -> bool {
        let name = name.trim_start_matches('@');
        self.idents
            .iter()
            .any(|ident| ident.trim_start_matches('@') == name)
    }
}

/// A type as written, with whitespace normalized (`Dictionary<string, int>?`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TypeRef {
    pub text: String,
}

/// Value types known without semantic analysis. Anything else is assumed to be
/// a reference type (or a type parameter), which admits `null` unless a
/// nullable context says otherwise.
const VALUE_TYPES: &[&str] = &[
    "bool", "byte", "sbyte", "char", "decimal", "double", "float", "int", "uint", "nint",
    "nuint", "long", "ulong", "short", "ushort", "Boolean", "Byte", "SByte", "Char", "Decimal",
    "Double", "Single", "Int16", "Int32", "Int64", "UInt16", "UInt32", "UInt64", "IntPtr",
    "UIntPtr", "DateTime", "DateTimeOffset", "DateOnly", "TimeOnly", "TimeSpan", "Guid",
    "Half", "Int128", "UInt128",
];

impl TypeRef {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// `T?`, for value and reference types alike.
    pub fn is_nullable_annotated(&self) -> bool {
        self.text.ends_with('?')
    }

    pub fn is_void(&self) -> bool {
        self.text == "void"
    }

    /// Whether a value of this type can be absent (`null`).
    ///
    /// With `nullable_context` set, only `?`-annotated types qualify, matching
    /// `#nullable enable`. Without it, every type that is not a known value
    /// type or a tuple qualifies.
    pub fn admits_absent(&self, nullable_context: bool) -> bool {
        if self.is_nullable_annotated() {
            return true;
        }
        if nullable_context {
            return false;
        }
        if self.text.starts_with('(') {
            return false;
        }
        let unrooted = self.text.strip_prefix("global::").unwrap_or(&self.text);
        let simple = unrooted.strip_prefix("System.").unwrap_or(unrooted);
        !VALUE_TYPES.contains(&simple)
    }
}

impl std::fmt::Display for TypeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

/// C# reserved keywords. An identifier spelled like one needs an `@` prefix.
pub const RESERVED_KEYWORDS: &[&str] = &[
    "abstract", "as", "base", "bool", "break", "byte", "case", "catch", "char", "checked",
    "class", "const", "continue", "decimal", "default", "delegate", "do", "double", "else",
    "enum", "event", "explicit", "extern", "false", "finally", "fixed", "float", "for",
    "foreach", "goto", "if", "implicit", "in", "int", "interface", "internal", "is", "lock",
    "long", "namespace", "new", "null", "object", "operator", "out", "override", "params",
    "private", "protected", "public", "readonly", "ref", "return", "sbyte", "sealed", "short",
    "sizeof", "stackalloc", "static", "string", "struct", "switch", "this", "throw", "true",
    "try", "typeof", "uint", "ulong", "unchecked", "unsafe", "ushort", "using", "virtual",
    "void", "volatile", "while",
];

pub fn is_reserved_keyword(word: &str) -> bool {
    RESERVED_KEYWORDS.contains(&word)
}

/// Lower the first character of an identifier, escaping the result with `@`
/// if it lands on a keyword. `FilePath` → `filePath`, `Class` → `@class`.
pub fn camel_case(name: &str) -> String {
    let bare = name.trim_start_matches('@');
    let mut chars = bare.chars();
    let lowered = match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect::<String>(),
        None => String::new(),
    };
    if is_reserved_keyword(&lowered) {
        format!("@{lowered}")
    } else {
        lowered
    }
}
