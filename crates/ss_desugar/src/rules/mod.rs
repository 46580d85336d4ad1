//! One rewrite rule per extension feature.

mod initializer;
mod null_check;
mod primary;
mod shorthand;
mod singleton;

pub use initializer::InitializerRule;
pub use null_check::NullCheckRule;
pub use primary::PrimaryConstructorRule;
pub use shorthand::ShorthandRule;
pub use singleton::SingletonRule;

use std::iter::Peekable;
use std::str::CharIndices;

use ss_ast::{camel_case, BodyItem, Declaration, Feature, Parameter, Statement};
use tracing::trace;

use crate::error::TransformError;
use crate::plan::{Plan, Target};
use crate::recognize::Recognition;
use crate::{DesugarOptions, NullGuardStyle};

/// A rewrite for one feature. Rules only fill their own [`Plan`] slots.
pub trait Rule: Send + Sync {
    fn feature(&self) -> Feature;

    fn apply(&self, ctx: &RuleContext<'_>, plan: &mut Plan) -> Result<(), TransformError>;
}

/// The registered rules.
pub static RULES: &[&dyn Rule] = &[
    &SingletonRule,
    &NullCheckRule,
    &InitializerRule,
    &ShorthandRule,
    &PrimaryConstructorRule,
];

/// Run every rule whose feature was recognized. A recognized feature without
/// a rule is an engine defect.
pub fn apply_rules(ctx: &RuleContext<'_>, rules: &[&dyn Rule]) -> Result<Plan, TransformError> {
    let features = &ctx.recognition.features;
    if let Some(feature) = features
        .iter()
        .find(|feature| !rules.iter().any(|rule| rule.feature() == *feature))
    {
        return Err(TransformError::AmbiguousFeatureInteraction {
            feature,
            span: ctx.decl.span,
        });
    }

    let mut plan = Plan::default();
    for rule in rules {
        if features.contains(rule.feature()) {
            trace!(feature = %rule.feature(), declaration = %ctx.decl.name, "applying rule");
            rule.apply(ctx, &mut plan)?;
        }
    }
    Ok(plan)
}

/// What rules may read: the declaration, what was recognized in it, and
/// facts derived from both.
pub struct RuleContext<'a> {
    pub decl: &'a Declaration,
    pub recognition: &'a Recognition,
    pub options: &'a DesugarOptions,
    /// `System` types may be written unqualified.
    pub imports_system: bool,
    /// Primary parameter names as the synthesized constructor spells them.
    pub param_names: Vec<String>,
}

impl<'a> RuleContext<'a> {
    pub fn new(
        decl: &'a Declaration,
        recognition: &'a Recognition,
        options: &'a DesugarOptions,
        imports_system: bool,
    ) -> Self {
        let params: &[Parameter] = decl.params.as_deref().unwrap_or_default();
        let mut param_names: Vec<String> = params.iter().map(|p| p.name.clone()).collect();
        for &idx in &recognition.sites.shorthand {
            let mut name = camel_case(&params[idx].name);
            while param_names.contains(&name) {
                name.push_str("Value");
            }
            param_names[idx] = name;
        }
        Self {
            decl,
            recognition,
            options,
            imports_system,
            param_names,
        }
    }

    pub fn primary_params(&self) -> &'a [Parameter] {
        self.decl.params.as_deref().unwrap_or_default()
    }

    /// `name` as a `System` type reference.
    pub fn system(&self, name: &str) -> String {
        if self.imports_system {
            name.to_string()
        } else {
            format!("System.{name}")
        }
    }

    /// The constructors every construction path runs through: the primary
    /// one, else each instance constructor that does not delegate with
    /// `this(...)`, else a synthesized parameterless one.
    pub fn construction_targets(&self) -> Vec<Target> {
        if crate::recognize::has_primary_constructor(self.decl) {
            return vec![Target::Constructor];
        }
        let targets: Vec<Target> = self
            .decl
            .instance_constructors()
            .filter(|(_, ctor)| !ctor.chains_to_this())
            .map(|(idx, _)| Target::Member(idx))
            .collect();
        if targets.is_empty() {
            vec![Target::Constructor]
        } else {
            targets
        }
    }

    /// The name of parameter `idx` of `owner` in the rewritten code.
    pub fn param_name(&self, owner: Target, idx: usize) -> &str {
        match owner {
            Target::Constructor => &self.param_names[idx],
            Target::Member(body_idx) => match self.decl.body.get(body_idx) {
                Some(BodyItem::Member(member)) => member
                    .params()
                    .get(idx)
                    .map_or("", |param| param.name.as_str()),
                _ => "",
            },
        }
    }

    pub fn null_guard(&self, name: &str) -> Statement {
        let exception = self.system("ArgumentNullException");
        match self.options.null_guard {
            NullGuardStyle::ThrowIfNull => Statement::Call {
                callee: format!("{exception}.ThrowIfNull"),
                args: vec![name.to_string(), format!("nameof({name})")],
            },
            NullGuardStyle::IfThrow => Statement::ThrowIf {
                condition: format!("{name} is null"),
                exception,
                args: vec![format!("nameof({name})")],
            },
        }
    }
}

/// Replace whole-word occurrences of `from` with `to`, skipping member
/// accesses (`x.from`) and the text of string and character literals. The
/// holes of interpolated strings (`$"{from}"`) are code and get renamed.
pub(crate) fn rename_ident(text: &str, from: &str, to: &str) -> String {
    let is_ident = |c: char| c.is_alphanumeric() || c == '_' || c == '@';
    let mut out = String::with_capacity(text.len());
    let mut chars = text.char_indices().peekable();
    let mut prev: Option<char> = None;

    while let Some((at, c)) = chars.next() {
        if c == '"' || c == '\'' {
            let prefix = match c {
                '"' => LiteralPrefix::before(&out),
                _ => LiteralPrefix::default(),
            };
            out.push(c);
            copy_literal(&mut chars, &mut out, c, prefix, from, to);
            prev = Some(c);
            continue;
        }
        if is_ident(c) && !prev.is_some_and(is_ident) {
            let end = text[at..]
                .find(|ch: char| !is_ident(ch))
                .map_or(text.len(), |len| at + len);
            let word = &text[at..end];
            let member_access = out.trim_end().ends_with('.');
            if word == from && !member_access {
                out.push_str(to);
            } else {
                out.push_str(word);
            }
            while chars.peek().is_some_and(|(next, _)| *next < end) {
                chars.next();
            }
            prev = word.chars().last();
            continue;
        }
        prev = Some(c);
        out.push(c);
    }
    out
}

type Chars<'a> = Peekable<CharIndices<'a>>;

/// `$` and `@` written directly before a string's opening quote.
#[derive(Debug, Clone, Copy, Default)]
struct LiteralPrefix {
    interpolated: bool,
    verbatim: bool,
}

impl LiteralPrefix {
    fn before(text: &str) -> Self {
        let mut prefix = Self::default();
        for c in text.chars().rev().take(2) {
            match c {
                '$' => prefix.interpolated = true,
                '@' => prefix.verbatim = true,
                _ => break,
            }
        }
        prefix
    }
}

/// Copy a literal after its opening `quote` through its closing one.
fn copy_literal(
    chars: &mut Chars<'_>,
    out: &mut String,
    quote: char,
    prefix: LiteralPrefix,
    from: &str,
    to: &str,
) {
    while let Some((_, c)) = chars.next() {
        if prefix.interpolated && c == '{' {
            if chars.peek().is_some_and(|(_, next)| *next == '{') {
                chars.next();
                out.push_str("{{");
                continue;
            }
            let (hole, closed) = interpolation_hole(chars);
            out.push('{');
            out.push_str(&rename_ident(&hole, from, to));
            if closed {
                out.push('}');
            }
            continue;
        }
        out.push(c);
        if c == '\\' && !prefix.verbatim {
            if let Some((_, escaped)) = chars.next() {
                out.push(escaped);
            }
        } else if c == quote {
            if prefix.verbatim && chars.peek().is_some_and(|(_, next)| *next == quote) {
                chars.next();
                out.push(quote);
            } else {
                return;
            }
        }
    }
}

/// The code of an interpolation hole up to its closing `}`, which is
/// consumed. The flag is false when the text ends first.
fn interpolation_hole(chars: &mut Chars<'_>) -> (String, bool) {
    let mut hole = String::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (_, c) in chars.by_ref() {
        match quote {
            Some(_) if escaped => escaped = false,
            Some(_) if c == '\\' => escaped = true,
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => match c {
                '"' | '\'' => quote = Some(c),
                '{' => depth += 1,
                '}' if depth == 0 => return (hole, true),
                '}' => depth -= 1,
                _ => {}
            },
        }
        hole.push(c);
    }
    (hole, false)
}
