use ss_ast::Feature;

use super::{Rule, RuleContext};
use crate::error::TransformError;
use crate::plan::Plan;

/// Argument-null guards at the top of each owning constructor or method, in
/// parameter order. The marker itself is dropped from the parameter.
pub struct NullCheckRule;

impl Rule for NullCheckRule {
    fn feature(&self) -> Feature {
        Feature::NullAssertion
    }

    fn apply(&self, ctx: &RuleContext<'_>, plan: &mut Plan) -> Result<(), TransformError> {
        for site in &ctx.recognition.sites.null_checks {
            let guards = site
                .params
                .iter()
                .map(|&idx| ctx.null_guard(ctx.param_name(site.owner, idx)))
                .collect();
            plan.null_guards.insert(site.owner, guards);
        }
        plan.strip_null_markers = true;
        Ok(())
    }
}
