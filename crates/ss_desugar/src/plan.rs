//! The rewrite plan: fixed slots that rules fill in, assembled once.
//!
//! Every slot belongs to exactly one rule, so the order in which rules run
//! cannot change the plan. All ordering decisions live in [`Plan::assemble`]:
//!
//! - constructor body: singleton guard, null guards, initializer statements,
//!   property assignments, moved member initializers, captures, original body;
//! - members: singleton holder, captured fields, shorthand properties,
//!   synthesized constructor, original members, singleton accessor.

use std::collections::{BTreeMap, BTreeSet};

use ss_ast::{
    BaseEntry, Block, BodyItem, Constructor, Declaration, Feature, Field, Member,
    Method, MethodBody, Parameter, Property, Statement, DUMMY_SP,
};

use crate::rules::RuleContext;

/// A body that receives synthesized statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Target {
    /// The constructor synthesized from the header, or a parameterless one
    /// when the declaration has no constructor at all.
    Constructor,
    /// A constructor or method already in the body, by body index.
    Member(usize),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    // SingletonMarker
    pub holder: Option<Field>,
    pub accessor: Option<Property>,
    pub singleton_guards: BTreeMap<Target, Statement>,

    // NullAssertion
    pub null_guards: BTreeMap<Target, Vec<Statement>>,
    pub strip_null_markers: bool,

    // UnnamedInitializer
    pub initializer: BTreeMap<Target, Vec<Statement>>,
    /// Leading body items moved out of the class body.
    pub consumed: usize,

    // PropertyShorthand
    pub properties: Vec<Property>,
    pub property_assignments: Vec<Statement>,

    // PrimaryConstructor
    pub primary: Option<PrimaryPlan>,
}

/// The explicit form of a header-implied constructor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrimaryPlan {
    pub access: String,
    /// `base(...)` when the header passes arguments to a base class.
    pub base_call: Option<String>,
    /// The base list with primary arguments removed.
    pub bases: Vec<BaseEntry>,
    pub captures: Vec<Field>,
    pub capture_assignments: Vec<Statement>,
    /// Body indices of members whose initializer moved into the constructor.
    pub moved: BTreeSet<usize>,
    pub moved_assignments: Vec<Statement>,
}

impl Plan {
    /// Build the baseline declaration. `nested` holds the already rewritten
    /// nested types, by body index.
    pub fn assemble(
        self,
        ctx: &RuleContext<'_>,
        mut nested: BTreeMap<usize, Member>,
    ) -> Declaration {
        let decl = ctx.decl;
        let mut body = Vec::with_capacity(decl.body.len() + 4);

        if let Some(holder) = &self.holder {
            body.push(BodyItem::Member(Member::Field(holder.clone())));
        }
        if let Some(primary) = &self.primary {
            body.extend(
                primary
                    .captures
                    .iter()
                    .map(|field| BodyItem::Member(Member::Field(field.clone()))),
            );
        }
        body.extend(
            self.properties
                .iter()
                .map(|prop| BodyItem::Member(Member::Property(prop.clone()))),
        );
        if let Some(ctor) = self.synthesized_constructor(ctx) {
            body.push(BodyItem::Member(Member::Constructor(ctor)));
        }

        for (idx, item) in decl.body.iter().enumerate().skip(self.consumed) {
            let item = match item {
                BodyItem::Member(member) => {
                    BodyItem::Member(self.patch_member(idx, member, nested.remove(&idx)))
                }
                other => other.clone(),
            };
            body.push(item);
        }

        if let Some(accessor) = &self.accessor {
            body.push(BodyItem::Member(Member::Property(accessor.clone())));
        }

        let bases = match &self.primary {
            Some(primary) => primary.bases.clone(),
            None => decl.bases.clone(),
        };

        Declaration {
            attributes: decl.attributes.clone(),
            modifiers: decl.modifiers.clone(),
            kind: decl.lowered_kind(),
            singleton: false,
            name: decl.name.clone(),
            type_params: decl.type_params.clone(),
            params: None,
            ctor_access: None,
            bases,
            constraints: decl.constraints.clone(),
            body,
            source: decl.source.clone(),
            span: decl.span,
        }
    }

    /// Guards and initializer statements that open `target`'s body.
    fn prelude(&self, target: Target) -> Vec<Statement> {
        let mut stmts = Vec::new();
        stmts.extend(self.singleton_guards.get(&target).cloned());
        stmts.extend(self.null_guards.get(&target).into_iter().flatten().cloned());
        stmts.extend(self.initializer.get(&target).into_iter().flatten().cloned());
        stmts
    }

    fn synthesized_constructor(&self, ctx: &RuleContext<'_>) -> Option<Constructor> {
        let mut stmts = self.prelude(Target::Constructor);
        if self.primary.is_none() && stmts.is_empty() {
            return None;
        }

        stmts.extend(self.property_assignments.iter().cloned());
        let (access, initializer) = match &self.primary {
            Some(primary) => {
                stmts.extend(primary.moved_assignments.iter().cloned());
                stmts.extend(primary.capture_assignments.iter().cloned());
                (primary.access.clone(), primary.base_call.clone())
            }
            None if ctx.recognition.features.contains(Feature::SingletonMarker) => {
                ("private".to_string(), None)
            }
            None => ("public".to_string(), None),
        };

        let params = ctx
            .primary_params()
            .iter()
            .zip(&ctx.param_names)
            .map(|(param, name)| Parameter {
                name: name.clone(),
                ..self.strip_marker(param)
            })
            .collect();

        Some(Constructor {
            attributes: Vec::new(),
            modifiers: access.split_whitespace().map(str::to_string).collect(),
            name: ctx.decl.name.clone(),
            params,
            initializer,
            body: Block::new(stmts),
            span: DUMMY_SP,
        })
    }

    fn patch_member(&self, idx: usize, member: &Member, nested: Option<Member>) -> Member {
        let target = Target::Member(idx);
        match member {
            Member::Type(_) => nested.unwrap_or_else(|| member.clone()),
            Member::Constructor(ctor) => {
                let mut stmts = self.prelude(target);
                stmts.extend(ctor.body.stmts.iter().cloned());
                Member::Constructor(Constructor {
                    params: self.strip_markers(&ctor.params),
                    body: Block::new(stmts),
                    ..ctor.clone()
                })
            }
            Member::Method(method) => Member::Method(Method {
                params: self.strip_markers(&method.params),
                body: self.guarded_method_body(target, method),
                ..method.clone()
            }),
            Member::Field(field) if self.is_moved(idx) => Member::Field(Field {
                initializer: None,
                ..field.clone()
            }),
            Member::Property(prop) if self.is_moved(idx) => Member::Property(Property {
                initializer: None,
                ..prop.clone()
            }),
            other => other.clone(),
        }
    }

    fn guarded_method_body(&self, target: Target, method: &Method) -> MethodBody {
        let Some(guards) = self.null_guards.get(&target) else {
            return method.body.clone();
        };
        let mut stmts = guards.clone();
        match &method.body {
            MethodBody::Block(block) => stmts.extend(block.stmts.iter().cloned()),
            MethodBody::Expression(expr) if method.returns_nothing() => {
                stmts.push(Statement::Expr(expr.clone()))
            }
            MethodBody::Expression(expr) => stmts.push(Statement::Return(expr.clone())),
            MethodBody::None => return MethodBody::None,
        }
        MethodBody::Block(Block::new(stmts))
    }

    fn is_moved(&self, idx: usize) -> bool {
        self.primary
            .as_ref()
            .is_some_and(|primary| primary.moved.contains(&idx))
    }

    fn strip_marker(&self, param: &Parameter) -> Parameter {
        let mut param = param.clone();
        if self.strip_null_markers {
            param.null_assertion = None;
        }
        param
    }

    fn strip_markers(&self, params: &[Parameter]) -> Vec<Parameter> {
        params.iter().map(|param| self.strip_marker(param)).collect()
    }
}
