use std::collections::BTreeSet;

use ss_ast::{
    BaseEntry, Block, BodyItem, Feature, Field, Member, MethodBody, PropertyBody, RawText,
    Statement,
};

use super::{rename_ident, Rule, RuleContext};
use crate::error::TransformError;
use crate::plan::{Plan, PrimaryPlan};

/// Makes the constructor implied by a declaration header explicit.
///
/// - `: public()` picks the constructor's accessibility (default `public`,
///   `private` for singletons).
/// - `: Base(args)` becomes `: Base` plus `: base(args)` on the constructor.
/// - Field and property initializers that read a primary parameter move into
///   the constructor.
/// - Lowercase parameters still read by other members are captured in
///   `private readonly` fields.
pub struct PrimaryConstructorRule;

impl Rule for PrimaryConstructorRule {
    fn feature(&self) -> Feature {
        Feature::PrimaryConstructor
    }

    fn apply(&self, ctx: &RuleContext<'_>, plan: &mut Plan) -> Result<(), TransformError> {
        let decl = ctx.decl;
        let params = ctx.primary_params();
        let renamed: Vec<(&str, &str)> = params
            .iter()
            .zip(&ctx.param_names)
            .filter(|(param, name)| param.name != **name)
            .map(|(param, name)| (param.name.as_str(), name.as_str()))
            .collect();

        let access = decl.ctor_access.clone().unwrap_or_else(|| {
            if ctx.recognition.features.contains(Feature::SingletonMarker) {
                "private".to_string()
            } else {
                "public".to_string()
            }
        });

        let mut base_call = None;
        let bases: Vec<BaseEntry> = decl
            .bases
            .iter()
            .map(|base| {
                if let Some(args) = &base.args {
                    let args = renamed
                        .iter()
                        .fold(args.clone(), |text, (from, to)| rename_ident(&text, from, to));
                    base_call = Some(format!("base({args})"));
                }
                BaseEntry {
                    name: base.name.clone(),
                    args: None,
                }
            })
            .collect();

        let mut moved = BTreeSet::new();
        let mut moved_assignments = Vec::new();
        for (idx, item) in decl.body.iter().enumerate() {
            let BodyItem::Member(member) = item else {
                continue;
            };
            let (name, modifiers, init) = match member {
                Member::Field(field) => (&field.name, &field.modifiers, &field.initializer),
                Member::Property(prop) => (&prop.name, &prop.modifiers, &prop.initializer),
                _ => continue,
            };
            let Some(init) = init else {
                continue;
            };
            if modifiers.iter().any(|m| m == "static" || m == "const") {
                continue;
            }
            if !params.iter().any(|param| init.mentions(&param.name)) {
                continue;
            }
            let target = if ctx.param_names.contains(name) {
                format!("this.{name}")
            } else {
                name.clone()
            };
            moved.insert(idx);
            moved_assignments.push(Statement::Source(RawText::new(
                format!("{target} = {};", init.text),
                init.span,
                init.column,
                init.idents.clone(),
            )));
        }

        let mut captures = Vec::new();
        let mut capture_assignments = Vec::new();
        for (idx, param) in params.iter().enumerate() {
            if ctx.recognition.sites.shorthand.contains(&idx) || decl.declares_member(&param.name) {
                continue;
            }
            let read_by_members = decl.body.iter().enumerate().any(|(i, item)| {
                !moved.contains(&i)
                    && matches!(item, BodyItem::Member(member) if member_mentions(member, &param.name))
            });
            if !read_by_members {
                continue;
            }
            captures.push(Field {
                attributes: Vec::new(),
                modifiers: vec!["private".into(), "readonly".into()],
                ty: param.ty.clone(),
                name: param.name.clone(),
                initializer: None,
                span: param.span,
            });
            capture_assignments.push(Statement::Assign {
                target: format!("this.{}", param.name),
                value: ctx.param_names[idx].clone(),
            });
        }

        plan.primary = Some(PrimaryPlan {
            access,
            base_call,
            bases,
            captures,
            capture_assignments,
            moved,
            moved_assignments,
        });
        Ok(())
    }
}

/// Whether a member's code reads `name`. Constructors and nested types are
/// skipped: neither can see primary parameters.
fn member_mentions(member: &Member, name: &str) -> bool {
    match member {
        Member::Field(field) => field.initializer.as_ref().is_some_and(|i| i.mentions(name)),
        Member::Property(prop) => {
            prop.initializer.as_ref().is_some_and(|i| i.mentions(name))
                || match &prop.body {
                    PropertyBody::Auto(_) => false,
                    PropertyBody::Expression(raw) | PropertyBody::Raw(raw) => raw.mentions(name),
                }
        }
        Member::Method(method) => match &method.body {
            MethodBody::Block(block) => block_mentions(block, name),
            MethodBody::Expression(raw) => raw.mentions(name),
            MethodBody::None => false,
        },
        Member::Raw(raw) => raw.mentions(name),
        Member::Constructor(_) | Member::Type(_) => false,
    }
}

fn block_mentions(block: &Block, name: &str) -> bool {
    block.stmts.iter().any(|stmt| match stmt {
        Statement::Source(raw) | Statement::Return(raw) | Statement::Expr(raw) => {
            raw.mentions(name)
        }
        _ => false,
    })
}
