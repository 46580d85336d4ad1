//! Structured diagnostics shared by every stage.

use serde::Serialize;
use swc_common::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
        }
    }
}

/// Broad class of a diagnostic, deciding how the engine reacts to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Category {
    /// Likely mistake; the declaration is still desugared.
    Lint,
    /// Extension used in a shape it does not support.
    StructuralViolation,
    /// Extension used on something it cannot apply to.
    SemanticMismatch,
    /// A bug in the engine, not in the input.
    EngineDefect,
    Syntax,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DiagnosticCode {
    /// Initializer-shaped statement after a member.
    MisplacedInitializer,
    /// Initializer statement reads a shorthand property before it is assigned.
    InitializerReadsProperty,
    /// Singleton declares constructor parameters.
    SingletonParameters,
    /// Singleton constructor is not private.
    SingletonAccessibility,
    /// Singleton declares more than one constructor.
    SingletonConstructorCount,
    /// Singleton already declares the accessor name.
    SingletonMemberConflict,
    /// Shorthand property collides with a declared member.
    ShorthandConflict,
    /// Null assertion on a type that cannot be null.
    NullAssertionInadmissible,
    /// Null assertion on a method without a body.
    NullAssertionWithoutBody,
    /// Null assertion on an `out` parameter, which is unassigned on entry.
    NullAssertionOnOutput,
    /// A feature has no rewrite rule.
    UnorderedFeature,
    Syntax,
}

impl DiagnosticCode {
    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosticCode::MisplacedInitializer => "SS0001",
            DiagnosticCode::InitializerReadsProperty => "SS0002",
            DiagnosticCode::SingletonParameters => "SS0101",
            DiagnosticCode::SingletonAccessibility => "SS0102",
            DiagnosticCode::SingletonConstructorCount => "SS0103",
            DiagnosticCode::SingletonMemberConflict => "SS0104",
            DiagnosticCode::ShorthandConflict => "SS0105",
            DiagnosticCode::NullAssertionInadmissible => "SS0201",
            DiagnosticCode::NullAssertionWithoutBody => "SS0202",
            DiagnosticCode::NullAssertionOnOutput => "SS0203",
            DiagnosticCode::UnorderedFeature => "SS0900",
            DiagnosticCode::Syntax => "SS1000",
        }
    }

    pub fn category(self) -> Category {
        match self {
            DiagnosticCode::MisplacedInitializer | DiagnosticCode::InitializerReadsProperty => {
                Category::Lint
            }
            DiagnosticCode::SingletonParameters
            | DiagnosticCode::SingletonAccessibility
            | DiagnosticCode::SingletonConstructorCount
            | DiagnosticCode::SingletonMemberConflict
            | DiagnosticCode::ShorthandConflict
            | DiagnosticCode::NullAssertionWithoutBody => Category::StructuralViolation,
            DiagnosticCode::NullAssertionInadmissible | DiagnosticCode::NullAssertionOnOutput => {
                Category::SemanticMismatch
            }
            DiagnosticCode::UnorderedFeature => Category::EngineDefect,
            DiagnosticCode::Syntax => Category::Syntax,
        }
    }

    pub fn severity(self) -> Severity {
        match self.category() {
            Category::Lint => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

impl std::fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A located, coded message about one declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    #[serde(skip)]
    pub span: Span,
    pub severity: Severity,
    pub code: DiagnosticCode,
    pub message: String,
    /// Name of the declaration the diagnostic belongs to.
    pub declaration: Option<String>,
}

impl Diagnostic {
    /// A diagnostic whose severity follows from its code.
    pub fn new(code: DiagnosticCode, span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            severity: code.severity(),
            code,
            message: message.into(),
            declaration: None,
        }
    }

    pub fn in_declaration(mut self, name: impl Into<String>) -> Self {
        self.declaration = Some(name.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[{}]: {}", self.severity, self.code, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swc_common::DUMMY_SP;

    #[test]
    fn severity_follows_category() {
        let lint = Diagnostic::new(DiagnosticCode::MisplacedInitializer, DUMMY_SP, "late");
        assert_eq!(lint.severity, Severity::Warning);
        assert!(!lint.is_error());

        let hard = Diagnostic::new(DiagnosticCode::SingletonParameters, DUMMY_SP, "params");
        assert!(hard.is_error());
        assert_eq!(hard.to_string(), "error[SS0101]: params");
    }
}
