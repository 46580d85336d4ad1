//! Top-level desugaring entry points.
//!
//! Declarations are rewritten independently. One that fails keeps its
//! original text and reports an error; the rest of the unit goes on.

use std::collections::BTreeMap;

use serde::Serialize;
use ss_ast::{
    BodyItem, CompilationUnit, Declaration, Diagnostic, FeatureSet, Item, Member, Namespace,
    RawText, Span,
};
use tracing::{debug, debug_span, warn};

use crate::recognize::recognize;
use crate::rules::{apply_rules, Rule, RuleContext, RULES};
use crate::DesugarOptions;

/// A desugared compilation unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Desugared {
    pub unit: CompilationUnit,
    pub diagnostics: Vec<Diagnostic>,
    /// One entry per declaration, nested ones included, depth first.
    pub reports: Vec<DeclReport>,
}

impl Desugared {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

/// What happened to one declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeclReport {
    pub name: String,
    pub features: FeatureSet,
    /// False when the declaration was left as written.
    pub rewritten: bool,
    #[serde(skip)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rewritten {
    Baseline(Declaration),
    /// Original text of a declaration that could not be rewritten.
    Unchanged(RawText),
}

impl Rewritten {
    fn into_member(self) -> Member {
        match self {
            Rewritten::Baseline(decl) => Member::Type(Box::new(decl)),
            Rewritten::Unchanged(raw) => Member::Raw(raw),
        }
    }

    fn into_item(self) -> Item {
        match self {
            Rewritten::Baseline(decl) => Item::Declaration(decl),
            Rewritten::Unchanged(raw) => Item::Raw(raw),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclOutcome {
    pub result: Rewritten,
    pub diagnostics: Vec<Diagnostic>,
    pub reports: Vec<DeclReport>,
}

/// Rewrite one declaration (and its nested declarations) into baseline form.
///
/// `System` types in the synthesized code are fully qualified, since the
/// surrounding usings are unknown here. [`desugar_unit`] writes them
/// unqualified when the unit imports `System`.
pub fn desugar_declaration(decl: &Declaration, options: &DesugarOptions) -> DeclOutcome {
    desugar_with(decl, options, false, RULES)
}

pub fn desugar_unit(unit: &CompilationUnit, options: &DesugarOptions) -> Desugared {
    desugar_unit_with(unit, options, RULES)
}

pub(crate) fn desugar_unit_with(
    unit: &CompilationUnit,
    options: &DesugarOptions,
    rules: &[&dyn Rule],
) -> Desugared {
    let mut out = Desugared {
        unit: CompilationUnit::default(),
        diagnostics: Vec::new(),
        reports: Vec::new(),
    };
    let imports_system = unit.imports_system();
    out.unit.items = desugar_items(&unit.items, options, imports_system, rules, &mut out);
    out
}

fn desugar_items(
    items: &[Item],
    options: &DesugarOptions,
    imports_system: bool,
    rules: &[&dyn Rule],
    out: &mut Desugared,
) -> Vec<Item> {
    items
        .iter()
        .map(|item| match item {
            Item::Declaration(decl) => {
                let outcome = desugar_with(decl, options, imports_system, rules);
                out.diagnostics.extend(outcome.diagnostics);
                out.reports.extend(outcome.reports);
                outcome.result.into_item()
            }
            Item::Namespace(ns) => Item::Namespace(Namespace {
                name: ns.name.clone(),
                file_scoped: ns.file_scoped,
                items: desugar_items(&ns.items, options, imports_system, rules, out),
            }),
            other => other.clone(),
        })
        .collect()
}

pub(crate) fn desugar_with(
    decl: &Declaration,
    options: &DesugarOptions,
    imports_system: bool,
    rules: &[&dyn Rule],
) -> DeclOutcome {
    let span = debug_span!("declaration", name = %decl.name);
    let _enter = span.enter();

    let recognition = match recognize(decl, options) {
        Ok(recognition) => recognition,
        Err(err) => return unchanged(decl, FeatureSet::new(), err.to_diagnostic(&decl.name)),
    };
    debug!(features = %recognition.features, "recognized");

    let ctx = RuleContext::new(decl, &recognition, options, imports_system);
    let plan = match apply_rules(&ctx, rules) {
        Ok(plan) => plan,
        Err(err) => {
            return unchanged(
                decl,
                recognition.features.clone(),
                err.to_diagnostic(&decl.name),
            )
        }
    };

    let mut diagnostics = recognition.diagnostics.clone();
    let mut reports = vec![DeclReport {
        name: decl.name.clone(),
        features: recognition.features.clone(),
        rewritten: true,
        span: decl.span,
    }];
    let mut nested = BTreeMap::new();
    for (idx, item) in decl.body.iter().enumerate() {
        if let BodyItem::Member(Member::Type(inner)) = item {
            let outcome = desugar_with(inner, options, imports_system, rules);
            diagnostics.extend(outcome.diagnostics);
            reports.extend(outcome.reports);
            nested.insert(idx, outcome.result.into_member());
        }
    }

    DeclOutcome {
        result: Rewritten::Baseline(plan.assemble(&ctx, nested)),
        diagnostics,
        reports,
    }
}

fn unchanged(decl: &Declaration, features: FeatureSet, diagnostic: Diagnostic) -> DeclOutcome {
    warn!(
        declaration = %decl.name,
        code = %diagnostic.code,
        "left unchanged: {}",
        diagnostic.message
    );
    DeclOutcome {
        result: Rewritten::Unchanged(decl.source.clone()),
        diagnostics: vec![diagnostic],
        reports: vec![DeclReport {
            name: decl.name.clone(),
            features,
            rewritten: false,
            span: decl.span,
        }],
    }
}
