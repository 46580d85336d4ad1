//! Extension recognition: which features a declaration uses, and where.
//!
//! Everything here is syntactic. Ordering questions (is a statement part of
//! the unnamed initializer?) are answered once, by position in the body,
//! against [`Declaration::first_member_index`].

use ss_ast::{
    camel_case, BodyItem, Capitalization, Declaration, Diagnostic, DiagnosticCode, Feature,
    FeatureSet, Member, MethodBody, Parameter,
};

use crate::error::TransformError;
use crate::plan::Target;
use crate::DesugarOptions;

/// The recognizer's verdict on one declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recognition {
    pub features: FeatureSet,
    pub sites: Sites,
    /// Non-fatal findings (lints).
    pub diagnostics: Vec<Diagnostic>,
}

/// Where each recognized feature applies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sites {
    /// Indices of capitalized primary parameters.
    pub shorthand: Vec<usize>,
    /// Body items `0..initializer_end` form the unnamed initializer.
    pub initializer_end: usize,
    /// Null-asserted parameters, by the constructor or method that owns them.
    pub null_checks: Vec<NullSite>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NullSite {
    pub owner: Target,
    /// Parameter indices within the owner, in order.
    pub params: Vec<usize>,
}

/// Whether the header implies a constructor: a parameter list, a `: public()`
/// clause, or arguments passed to a base class.
pub fn has_primary_constructor(decl: &Declaration) -> bool {
    decl.params.is_some()
        || decl.ctor_access.is_some()
        || decl.bases.iter().any(|base| base.args.is_some())
}

pub fn recognize(
    decl: &Declaration,
    options: &DesugarOptions,
) -> Result<Recognition, TransformError> {
    let syntax = &options.syntax;
    let params: &[Parameter] = decl.params.as_deref().unwrap_or_default();
    let mut features = FeatureSet::new();
    let mut sites = Sites::default();
    let mut diagnostics = Vec::new();

    if has_primary_constructor(decl) {
        features.insert(Feature::PrimaryConstructor);
    }

    if syntax.property_shorthand {
        sites.shorthand = params
            .iter()
            .enumerate()
            .filter(|(_, param)| param.capitalization() == Capitalization::Upper)
            .map(|(idx, _)| idx)
            .collect();
        for &idx in &sites.shorthand {
            let param = &params[idx];
            if decl.declares_member(&param.name) {
                return Err(TransformError::structural(
                    DiagnosticCode::ShorthandConflict,
                    param.span,
                    format!(
                        "`{}` is both a shorthand parameter and a declared member",
                        param.name
                    ),
                ));
            }
        }
        if !sites.shorthand.is_empty() {
            features.insert(Feature::PropertyShorthand);
        }
    }

    if syntax.unnamed_initializer {
        let first_member = decl.first_member_index();
        sites.initializer_end = decl.body[..first_member]
            .iter()
            .rposition(|item| matches!(item, BodyItem::Statement(_)))
            .map_or(0, |idx| idx + 1);
        if sites.initializer_end > 0 {
            features.insert(Feature::UnnamedInitializer);
        }

        for item in &decl.body[..sites.initializer_end] {
            let BodyItem::Statement(stmt) = item else {
                continue;
            };
            for &idx in &sites.shorthand {
                let name = &params[idx].name;
                if stmt.mentions(name) {
                    diagnostics.push(Diagnostic::new(
                        DiagnosticCode::InitializerReadsProperty,
                        stmt.span,
                        format!(
                            "initializer reads `{name}` before the property is assigned; use `{}` to read the parameter",
                            camel_case(name)
                        ),
                    ));
                }
            }
        }

        for item in &decl.body[first_member..] {
            if let BodyItem::Statement(stmt) = item {
                diagnostics.push(Diagnostic::new(
                    DiagnosticCode::MisplacedInitializer,
                    stmt.span,
                    "statement after the first member is not part of the unnamed initializer; move it above every member",
                ));
            }
        }
    }

    if syntax.singleton && decl.singleton {
        check_singleton(decl)?;
        features.insert(Feature::SingletonMarker);
    }

    if syntax.null_assertion {
        sites.null_checks = null_sites(decl, options.nullable_context)?;
        if !sites.null_checks.is_empty() {
            features.insert(Feature::NullAssertion);
        }
    }

    let diagnostics = diagnostics
        .into_iter()
        .map(|diag| diag.in_declaration(&decl.name))
        .collect();
    Ok(Recognition {
        features,
        sites,
        diagnostics,
    })
}

fn check_singleton(decl: &Declaration) -> Result<(), TransformError> {
    if let Some(param) = decl.params.iter().flatten().next() {
        return Err(TransformError::structural(
            DiagnosticCode::SingletonParameters,
            param.span,
            format!("singleton `{}` cannot take constructor parameters", decl.name),
        ));
    }
    if let Some(access) = decl.ctor_access.as_deref().filter(|a| *a != "private") {
        return Err(TransformError::structural(
            DiagnosticCode::SingletonAccessibility,
            decl.span,
            format!(
                "the constructor of singleton `{}` must be private, not `{access}`",
                decl.name
            ),
        ));
    }

    let ctors: Vec<_> = decl.instance_constructors().map(|(_, ctor)| ctor).collect();
    let implicit = usize::from(has_primary_constructor(decl));
    if ctors.len() + implicit > 1 {
        let span = ctors.last().map_or(decl.span, |ctor| ctor.span);
        return Err(TransformError::structural(
            DiagnosticCode::SingletonConstructorCount,
            span,
            format!(
                "singleton `{}` declares {} constructors; it may have at most one",
                decl.name,
                ctors.len() + implicit
            ),
        ));
    }
    if let Some(ctor) = ctors.first() {
        if let Some(param) = ctor.params.first() {
            return Err(TransformError::structural(
                DiagnosticCode::SingletonParameters,
                param.span,
                format!(
                    "the constructor of singleton `{}` cannot take parameters",
                    decl.name
                ),
            ));
        }
        if !ctor.is_private() {
            return Err(TransformError::structural(
                DiagnosticCode::SingletonAccessibility,
                ctor.span,
                format!("the constructor of singleton `{}` must be private", decl.name),
            ));
        }
    }

    if decl.declares_member("Instance") {
        return Err(TransformError::structural(
            DiagnosticCode::SingletonMemberConflict,
            decl.span,
            format!(
                "singleton `{}` already declares a member named `Instance`",
                decl.name
            ),
        ));
    }
    Ok(())
}

fn null_sites(decl: &Declaration, nullable_context: bool) -> Result<Vec<NullSite>, TransformError> {
    let mut sites = Vec::new();

    let primary = decl.params.as_deref().unwrap_or_default();
    if let Some(site) = null_site(Target::Constructor, primary, nullable_context)? {
        sites.push(site);
    }

    for (idx, item) in decl.body.iter().enumerate() {
        let BodyItem::Member(member) = item else {
            continue;
        };
        let Some(site) = null_site(Target::Member(idx), member.params(), nullable_context)?
        else {
            continue;
        };
        if let Member::Method(method) = member {
            if method.body == MethodBody::None {
                let param = &method.params[site.params[0]];
                return Err(TransformError::structural(
                    DiagnosticCode::NullAssertionWithoutBody,
                    param.span,
                    format!(
                        "null assertion on `{}` needs a body to hold the guard, but `{}` has none",
                        param.name, method.name
                    ),
                ));
            }
        }
        sites.push(site);
    }
    Ok(sites)
}

fn null_site(
    owner: Target,
    params: &[Parameter],
    nullable_context: bool,
) -> Result<Option<NullSite>, TransformError> {
    let mut marked = Vec::new();
    for (idx, param) in params.iter().enumerate() {
        if param.null_assertion.is_none() {
            continue;
        }
        if param.modifiers.iter().any(|m| m == "out") {
            return Err(TransformError::semantic(
                DiagnosticCode::NullAssertionOnOutput,
                param.span,
                format!(
                    "`{}` is an `out` parameter and has no value on entry to check for null",
                    param.name
                ),
            ));
        }
        if !param.ty.admits_absent(nullable_context) {
            return Err(TransformError::semantic(
                DiagnosticCode::NullAssertionInadmissible,
                param.span,
                format!(
                    "`{}` has type `{}`, which cannot be null; the null assertion could never fire",
                    param.name, param.ty
                ),
            ));
        }
        marked.push(idx);
    }
    Ok((!marked.is_empty()).then_some(NullSite {
        owner,
        params: marked,
    }))
}

#[cfg(test)]
mod tests {
    use ss_ast::{DiagnosticCode, Feature, SsSyntax};
    use ss_parser::parse_unit;
    use swc_common::BytePos;

    use super::*;

    fn recognize_src(src: &str, options: &DesugarOptions) -> Result<Recognition, TransformError> {
        let unit = parse_unit(src, BytePos(1), &options.syntax).unwrap();
        recognize(unit.declarations()[0], options)
    }

    fn features(src: &str) -> FeatureSet {
        recognize_src(src, &DesugarOptions::default()).unwrap().features
    }

    fn error_code(src: &str) -> DiagnosticCode {
        recognize_src(src, &DesugarOptions::default())
            .unwrap_err()
            .code()
    }

    #[test]
    fn baseline_declaration_has_no_features() {
        let set = features("class C { int x; public C() { x = 1; } }");
        assert!(set.is_empty());
    }

    #[test]
    fn shorthand_sites_follow_capitalization() {
        let rec = recognize_src(
            "record class P(string Name, int age, string Email) { }",
            &DesugarOptions::default(),
        )
        .unwrap();
        assert_eq!(rec.sites.shorthand, vec![0, 2]);
        assert!(rec.features.contains(Feature::PropertyShorthand));
        assert!(rec.features.contains(Feature::PrimaryConstructor));
    }

    #[test]
    fn lowercase_parameters_are_not_shorthand() {
        let set = features("class P(string path) { }");
        assert!(!set.contains(Feature::PropertyShorthand));
        assert!(set.contains(Feature::PrimaryConstructor));
    }

    #[test]
    fn leading_statements_form_the_initializer() {
        let rec = recognize_src(
            "class A(string path) { // check\n Check(path); Log(); public void M() { } }",
            &DesugarOptions::default(),
        )
        .unwrap();
        assert_eq!(rec.sites.initializer_end, 3);
        assert!(rec.features.contains(Feature::UnnamedInitializer));
        assert!(rec.diagnostics.is_empty());
    }

    #[test]
    fn misplaced_statements_degrade_to_a_warning() {
        let rec = recognize_src(
            "class A(string path) { public void M() { } Check(path); }",
            &DesugarOptions::default(),
        )
        .unwrap();
        assert!(!rec.features.contains(Feature::UnnamedInitializer));
        assert_eq!(rec.diagnostics.len(), 1);
        assert_eq!(rec.diagnostics[0].code, DiagnosticCode::MisplacedInitializer);
        assert!(!rec.diagnostics[0].is_error());
        assert_eq!(rec.diagnostics[0].declaration.as_deref(), Some("A"));
    }

    #[test]
    fn initializer_reading_the_property_is_linted() {
        let rec = recognize_src(
            "record class A(string Path) { Check(Path); }",
            &DesugarOptions::default(),
        )
        .unwrap();
        assert_eq!(rec.diagnostics[0].code, DiagnosticCode::InitializerReadsProperty);
        assert!(rec.diagnostics[0].message.contains("`path`"));
    }

    #[test]
    fn disabled_features_are_not_recognized() {
        let options = DesugarOptions {
            syntax: SsSyntax {
                property_shorthand: false,
                unnamed_initializer: false,
                ..SsSyntax::default()
            },
            ..DesugarOptions::default()
        };
        let rec = recognize_src("record class A(string Path) { Check(Path); }", &options).unwrap();
        assert!(!rec.features.contains(Feature::PropertyShorthand));
        assert!(!rec.features.contains(Feature::UnnamedInitializer));
        assert!(rec.diagnostics.is_empty());
    }

    #[test]
    fn singleton_violations_are_hard_errors() {
        assert_eq!(
            error_code("singleton class S(int x) { }"),
            DiagnosticCode::SingletonParameters
        );
        assert_eq!(
            error_code("singleton class S { S(int x) { } }"),
            DiagnosticCode::SingletonParameters
        );
        assert_eq!(
            error_code("singleton class S { public S() { } }"),
            DiagnosticCode::SingletonAccessibility
        );
        assert_eq!(
            error_code("singleton class S : public() { }"),
            DiagnosticCode::SingletonAccessibility
        );
        assert_eq!(
            error_code("singleton class S { private S() { } private S(bool b) : this() { } }"),
            DiagnosticCode::SingletonConstructorCount
        );
        assert_eq!(
            error_code("singleton class S { public int Instance; }"),
            DiagnosticCode::SingletonMemberConflict
        );
    }

    #[test]
    fn valid_singletons() {
        assert!(features("singleton class S { }").contains(Feature::SingletonMarker));
        assert!(features("singleton class S { private S() { } static S() { } }")
            .contains(Feature::SingletonMarker));
        assert!(features("singleton class S : private() { }").contains(Feature::SingletonMarker));
    }

    #[test]
    fn null_assertion_sites() {
        let rec = recognize_src(
            "class N(string a!!) { public N(int id, [ThrowArgumentNullException] string b) : this(b) { } void M(string c!!) => Use(c); }",
            &DesugarOptions::default(),
        )
        .unwrap();
        assert!(rec.features.contains(Feature::NullAssertion));
        assert_eq!(
            rec.sites.null_checks,
            vec![
                NullSite {
                    owner: Target::Constructor,
                    params: vec![0]
                },
                NullSite {
                    owner: Target::Member(0),
                    params: vec![1]
                },
                NullSite {
                    owner: Target::Member(1),
                    params: vec![0]
                },
            ]
        );
    }

    #[test]
    fn null_assertion_on_value_type_is_a_semantic_error() {
        let err = recognize_src("class N { void M(int id!!) { } }", &DesugarOptions::default())
            .unwrap_err();
        assert!(matches!(err, TransformError::SemanticMismatch { .. }));
        assert_eq!(err.code(), DiagnosticCode::NullAssertionInadmissible);
        assert_eq!(
            features("class N { void M(int? id!!) { } }").len(),
            1
        );
    }

    #[test]
    fn null_assertion_on_out_parameter_is_a_semantic_error() {
        let err = recognize_src(
            "class N { bool TryGet(out string value!!) { value = \"x\"; return true; } }",
            &DesugarOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, TransformError::SemanticMismatch { .. }));
        assert_eq!(err.code(), DiagnosticCode::NullAssertionOnOutput);
        assert_eq!(
            features("class N { void M(ref string value!!) { } }").len(),
            1
        );
    }

    #[test]
    fn nullable_context_narrows_admissible_types() {
        let options = DesugarOptions {
            nullable_context: true,
            ..DesugarOptions::default()
        };
        assert!(recognize_src("class N { void M(string s!!) { } }", &options).is_err());
        assert!(recognize_src("class N { void M(string? s!!) { } }", &options).is_ok());
    }

    #[test]
    fn null_assertion_needs_a_body() {
        assert_eq!(
            error_code("abstract class N { public abstract void M(string s!!); }"),
            DiagnosticCode::NullAssertionWithoutBody
        );
    }

    #[test]
    fn shorthand_conflict() {
        assert_eq!(
            error_code("record class P(string Name) { public string Name => \"x\"; }"),
            DiagnosticCode::ShorthandConflict
        );
    }
}
