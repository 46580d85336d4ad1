use ss_ast::{BodyItem, Feature, Statement};

use super::{Rule, RuleContext};
use crate::error::TransformError;
use crate::plan::Plan;

/// Moves the leading statements of a class body, verbatim and in order, into
/// every constructor that construction runs through.
pub struct InitializerRule;

impl Rule for InitializerRule {
    fn feature(&self) -> Feature {
        Feature::UnnamedInitializer
    }

    fn apply(&self, ctx: &RuleContext<'_>, plan: &mut Plan) -> Result<(), TransformError> {
        let end = ctx.recognition.sites.initializer_end;
        let stmts: Vec<Statement> = ctx.decl.body[..end]
            .iter()
            .filter_map(|item| match item {
                BodyItem::Statement(raw) => Some(Statement::Source(raw.clone())),
                BodyItem::Comment(raw) => Some(Statement::Comment(raw.clone())),
                BodyItem::Member(_) => None,
            })
            .collect();

        for target in ctx.construction_targets() {
            plan.initializer.insert(target, stmts.clone());
        }
        plan.consumed = end;
        Ok(())
    }
}
