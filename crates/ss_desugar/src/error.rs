use ss_ast::{Diagnostic, DiagnosticCode, Feature};
use swc_common::Span;
use thiserror::Error;

/// Why a declaration could not be rewritten. The declaration is then emitted
/// as written and the error is reported as a [`Diagnostic`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    /// An extension is used in a shape it does not support.
    #[error("{message}")]
    StructuralViolation {
        code: DiagnosticCode,
        span: Span,
        message: String,
    },
    /// An extension is applied to something it cannot mean anything for.
    #[error("{message}")]
    SemanticMismatch {
        code: DiagnosticCode,
        span: Span,
        message: String,
    },
    /// A recognized feature has no rule, so its place in the rewrite is
    /// undefined. Always an engine bug.
    #[error("feature `{feature}` has no rewrite rule")]
    AmbiguousFeatureInteraction { feature: Feature, span: Span },
}

impl TransformError {
    pub fn structural(code: DiagnosticCode, span: Span, message: impl Into<String>) -> Self {
        TransformError::StructuralViolation {
            code,
            span,
            message: message.into(),
        }
    }

    pub fn semantic(code: DiagnosticCode, span: Span, message: impl Into<String>) -> Self {
        TransformError::SemanticMismatch {
            code,
            span,
            message: message.into(),
        }
    }

    pub fn code(&self) -> DiagnosticCode {
        match self {
            TransformError::StructuralViolation { code, .. }
            | TransformError::SemanticMismatch { code, .. } => *code,
            TransformError::AmbiguousFeatureInteraction { .. } => DiagnosticCode::UnorderedFeature,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            TransformError::StructuralViolation { span, .. }
            | TransformError::SemanticMismatch { span, .. }
            | TransformError::AmbiguousFeatureInteraction { span, .. } => *span,
        }
    }

    pub fn to_diagnostic(&self, declaration: &str) -> Diagnostic {
        Diagnostic::new(self.code(), self.span(), self.to_string()).in_declaration(declaration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ss_ast::Severity;
    use swc_common::DUMMY_SP;

    #[test]
    fn engine_defects_are_errors() {
        let err = TransformError::AmbiguousFeatureInteraction {
            feature: Feature::SingletonMarker,
            span: DUMMY_SP,
        };
        let diag = err.to_diagnostic("Config");
        assert_eq!(diag.code, DiagnosticCode::UnorderedFeature);
        assert_eq!(diag.severity, Severity::Error);
        assert_eq!(diag.declaration.as_deref(), Some("Config"));
        assert_eq!(diag.message, "feature `SingletonMarker` has no rewrite rule");
    }
}
