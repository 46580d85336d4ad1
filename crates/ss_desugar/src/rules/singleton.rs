use ss_ast::{Feature, Field, Property, PropertyBody, RawText, Statement, TypeRef, DUMMY_SP};

use super::{Rule, RuleContext};
use crate::error::TransformError;
use crate::plan::Plan;

/// Lazy single-instance scaffolding:
///
/// ```text
/// private static readonly Lazy<T> _lazyInstance = new Lazy<T>(() => new T(), true);
/// public static T Instance => _lazyInstance.Value;
/// ```
///
/// plus a guard in the private constructor that refuses a second instance.
/// The `true` flag selects `LazyThreadSafetyMode.ExecutionAndPublication`.
pub struct SingletonRule;

const HOLDER_NAME: &str = "_lazyInstance";

impl Rule for SingletonRule {
    fn feature(&self) -> Feature {
        Feature::SingletonMarker
    }

    fn apply(&self, ctx: &RuleContext<'_>, plan: &mut Plan) -> Result<(), TransformError> {
        let ty = ctx.decl.self_type();
        let lazy = format!("{}<{ty}>", ctx.system("Lazy"));
        let holder = holder_name(ctx);

        plan.holder = Some(Field {
            attributes: Vec::new(),
            modifiers: vec!["private".into(), "static".into(), "readonly".into()],
            ty: TypeRef::new(lazy.clone()),
            name: holder.clone(),
            initializer: Some(RawText::synthesized(format!(
                "new {lazy}(() => new {ty}(), true)"
            ))),
            span: DUMMY_SP,
        });

        plan.accessor = Some(Property {
            attributes: Vec::new(),
            modifiers: vec!["public".into(), "static".into()],
            ty: TypeRef::new(ty),
            name: "Instance".into(),
            body: PropertyBody::Expression(RawText::synthesized(format!("{holder}.Value"))),
            initializer: None,
            span: DUMMY_SP,
        });

        let guard = Statement::ThrowIf {
            condition: format!("{holder}.IsValueCreated"),
            exception: ctx.system("InvalidOperationException"),
            args: vec!["\"Singleton classes can only have one instance.\"".into()],
        };
        for target in ctx.construction_targets() {
            plan.singleton_guards.insert(target, guard.clone());
        }
        Ok(())
    }
}

/// `_lazyInstance`, or `_lazyInstance1`, `_lazyInstance2`, ... if taken.
fn holder_name(ctx: &RuleContext<'_>) -> String {
    let mut name = HOLDER_NAME.to_string();
    let mut n = 0;
    while ctx.decl.declares_member(&name) {
        n += 1;
        name = format!("{HOLDER_NAME}{n}");
    }
    name
}
