use ss_ast::{Accessor, Feature, MutabilityMode, Property, PropertyBody, Statement};

use super::{Rule, RuleContext};
use crate::error::TransformError;
use crate::plan::Plan;

/// One auto-property per capitalized primary parameter, assigned from the
/// (camelCased) constructor parameter in parameter order.
pub struct ShorthandRule;

impl Rule for ShorthandRule {
    fn feature(&self) -> Feature {
        Feature::PropertyShorthand
    }

    fn apply(&self, ctx: &RuleContext<'_>, plan: &mut Plan) -> Result<(), TransformError> {
        let setter = match ctx.decl.kind.mutability() {
            MutabilityMode::InitOnce => "init",
            MutabilityMode::Mutable => "set",
        };
        let params = ctx.primary_params();

        for &idx in &ctx.recognition.sites.shorthand {
            let param = &params[idx];
            plan.properties.push(Property {
                attributes: Vec::new(),
                modifiers: vec!["public".into()],
                ty: param.ty.clone(),
                name: param.name.clone(),
                body: PropertyBody::Auto(vec![Accessor::new("get"), Accessor::new(setter)]),
                initializer: None,
                span: param.span,
            });
            plan.property_assignments.push(Statement::Assign {
                target: param.name.clone(),
                value: ctx.param_names[idx].clone(),
            });
        }
        Ok(())
    }
}
