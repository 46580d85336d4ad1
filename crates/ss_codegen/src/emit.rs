use ss_ast::{
    Block, BodyItem, Constructor, DeclKind, Declaration, Field, Item, Member, Method, MethodBody,
    Namespace, Parameter, Property, PropertyBody, Statement, Using,
};

use crate::text_writer::TextWriter;
use crate::EmitError;

pub(crate) struct Emitter<'a> {
    wr: TextWriter<'a>,
}

impl<'a> Emitter<'a> {
    pub fn new(wr: TextWriter<'a>) -> Self {
        Self { wr }
    }

    pub fn finish(self) -> String {
        self.wr.finish()
    }

    pub fn emit_items(&mut self, items: &[Item]) -> Result<(), EmitError> {
        let mut prev: Option<&Item> = None;
        for item in items {
            if let Some(prev) = prev {
                if separated(prev, item) {
                    self.wr.blank_line();
                }
            }
            self.emit_item(item)?;
            prev = Some(item);
        }
        Ok(())
    }

    fn emit_item(&mut self, item: &Item) -> Result<(), EmitError> {
        match item {
            Item::Using(using) => self.emit_using(using),
            Item::Namespace(ns) => self.emit_namespace(ns)?,
            Item::Declaration(decl) => self.emit_declaration(decl)?,
            Item::Raw(raw) | Item::Comment(raw) => self.wr.raw("", raw, ""),
        }
        Ok(())
    }

    fn emit_using(&mut self, using: &Using) {
        let global = if using.global { "global " } else { "" };
        self.wr.line(&format!("{global}using {};", using.target));
    }

    fn emit_namespace(&mut self, ns: &Namespace) -> Result<(), EmitError> {
        if ns.file_scoped {
            self.wr.line(&format!("namespace {};", ns.name));
            if !ns.items.is_empty() {
                self.wr.blank_line();
            }
            return self.emit_items(&ns.items);
        }
        self.wr.line(&format!("namespace {}", ns.name));
        self.wr.line("{");
        self.wr.indent();
        self.emit_items(&ns.items)?;
        self.wr.dedent();
        self.wr.line("}");
        Ok(())
    }

    pub fn emit_declaration(&mut self, decl: &Declaration) -> Result<(), EmitError> {
        if let Some(construct) = extension_construct(decl) {
            return Err(EmitError::ExtensionSyntax {
                declaration: decl.name.clone(),
                construct,
            });
        }

        self.emit_attributes(&decl.attributes);
        let keyword = match decl.kind {
            DeclKind::Record => "record",
            DeclKind::Class | DeclKind::Data => "class",
        };
        let mut header = prefixed(&decl.modifiers, keyword);
        header.push(' ');
        header.push_str(&decl.self_type());
        if !decl.bases.is_empty() {
            let bases: Vec<&str> = decl.bases.iter().map(|base| base.name.as_str()).collect();
            header.push_str(" : ");
            header.push_str(&bases.join(", "));
        }
        self.wr.line(&header);
        self.emit_constraints(&decl.constraints);

        self.wr.line("{");
        self.wr.indent();
        self.emit_body(&decl.body)?;
        self.wr.dedent();
        self.wr.line("}");
        Ok(())
    }

    fn emit_body(&mut self, body: &[BodyItem]) -> Result<(), EmitError> {
        let mut after_comment = true;
        for item in body {
            if !after_comment {
                self.wr.blank_line();
            }
            match item {
                BodyItem::Member(member) => self.emit_member(member)?,
                BodyItem::Statement(raw) | BodyItem::Comment(raw) => self.wr.raw("", raw, ""),
            }
            after_comment = matches!(item, BodyItem::Comment(_));
        }
        Ok(())
    }

    fn emit_member(&mut self, member: &Member) -> Result<(), EmitError> {
        match member {
            Member::Field(field) => self.emit_field(field),
            Member::Property(prop) => self.emit_property(prop),
            Member::Constructor(ctor) => self.emit_constructor(ctor),
            Member::Method(method) => self.emit_method(method),
            Member::Type(decl) => self.emit_declaration(decl)?,
            Member::Raw(raw) => self.wr.raw("", raw, ""),
        }
        Ok(())
    }

    fn emit_field(&mut self, field: &Field) {
        self.emit_attributes(&field.attributes);
        let decl = format!("{} {}", prefixed(&field.modifiers, &field.ty.text), field.name);
        match &field.initializer {
            Some(init) => self.wr.raw(&format!("{decl} = "), init, ";"),
            None => self.wr.line(&format!("{decl};")),
        }
    }

    fn emit_property(&mut self, prop: &Property) {
        self.emit_attributes(&prop.attributes);
        let decl = format!("{} {}", prefixed(&prop.modifiers, &prop.ty.text), prop.name);
        match &prop.body {
            PropertyBody::Auto(accessors) => {
                let accessors: Vec<String> = accessors
                    .iter()
                    .map(|acc| format!("{};", prefixed(&acc.modifiers, &acc.keyword)))
                    .collect();
                let line = format!("{decl} {{ {} }}", accessors.join(" "));
                match &prop.initializer {
                    Some(init) => self.wr.raw(&format!("{line} = "), init, ";"),
                    None => self.wr.line(&line),
                }
            }
            PropertyBody::Expression(expr) => self.wr.raw(&format!("{decl} => "), expr, ";"),
            PropertyBody::Raw(body) => {
                self.wr.line(&decl);
                let suffix = match &prop.initializer {
                    Some(init) => format!(" = {};", init.text),
                    None => String::new(),
                };
                self.wr.raw("", body, &suffix);
            }
        }
    }

    fn emit_constructor(&mut self, ctor: &Constructor) {
        self.emit_attributes(&ctor.attributes);
        let name = prefixed(&ctor.modifiers, &ctor.name);
        self.wr.line(&format!("{name}({})", params(&ctor.params)));
        if let Some(init) = &ctor.initializer {
            self.wr.indent();
            self.wr.line(&format!(": {init}"));
            self.wr.dedent();
        }
        self.emit_block(&ctor.body);
    }

    fn emit_method(&mut self, method: &Method) {
        self.emit_attributes(&method.attributes);
        let signature = format!(
            "{} {}{}({})",
            prefixed(&method.modifiers, &method.return_type.text),
            method.name,
            method.type_params.as_deref().unwrap_or_default(),
            params(&method.params),
        );
        let constrained = !method.constraints.is_empty();

        match &method.body {
            MethodBody::Block(block) => {
                self.wr.line(&signature);
                self.emit_constraints(&method.constraints);
                self.emit_block(block);
            }
            MethodBody::Expression(expr) if constrained => {
                self.wr.line(&signature);
                self.emit_constraints(&method.constraints);
                self.wr.indent();
                self.wr.raw("=> ", expr, ";");
                self.wr.dedent();
            }
            MethodBody::Expression(expr) => self.wr.raw(&format!("{signature} => "), expr, ";"),
            MethodBody::None if constrained => {
                self.wr.line(&signature);
                self.wr.indent();
                let last = method.constraints.len() - 1;
                for (idx, constraint) in method.constraints.iter().enumerate() {
                    let end = if idx == last { ";" } else { "" };
                    self.wr.line(&format!("where {constraint}{end}"));
                }
                self.wr.dedent();
            }
            MethodBody::None => self.wr.line(&format!("{signature};")),
        }
    }

    fn emit_block(&mut self, block: &Block) {
        self.wr.line("{");
        self.wr.indent();
        for stmt in &block.stmts {
            self.emit_statement(stmt);
        }
        self.wr.dedent();
        self.wr.line("}");
    }

    fn emit_statement(&mut self, stmt: &Statement) {
        match stmt {
            Statement::Source(raw) | Statement::Comment(raw) => self.wr.raw("", raw, ""),
            Statement::Assign { target, value } => self.wr.line(&format!("{target} = {value};")),
            Statement::Call { callee, args } => {
                self.wr.line(&format!("{callee}({});", args.join(", ")))
            }
            Statement::ThrowIf {
                condition,
                exception,
                args,
            } => self.wr.line(&format!(
                "if ({condition}) throw new {exception}({});",
                args.join(", ")
            )),
            Statement::Return(expr) => self.wr.raw("return ", expr, ";"),
            Statement::Expr(expr) => self.wr.raw("", expr, ";"),
        }
    }

    fn emit_attributes(&mut self, attributes: &[String]) {
        for attribute in attributes {
            self.wr.line(&format!("[{attribute}]"));
        }
    }

    fn emit_constraints(&mut self, constraints: &[String]) {
        self.wr.indent();
        for constraint in constraints {
            self.wr.line(&format!("where {constraint}"));
        }
        self.wr.dedent();
    }
}

/// Whether a blank line goes between two adjacent items.
fn separated(prev: &Item, next: &Item) -> bool {
    !matches!(
        (prev, next),
        (Item::Using(_), Item::Using(_)) | (Item::Comment(_), _)
    )
}

/// The first extension construct left in `decl`, if any.
fn extension_construct(decl: &Declaration) -> Option<&'static str> {
    if decl.kind == DeclKind::Data {
        return Some("a data class header");
    }
    if decl.singleton {
        return Some("the singleton marker");
    }
    if decl.params.is_some() {
        return Some("a primary parameter list");
    }
    if decl.ctor_access.is_some() {
        return Some("a constructor access clause");
    }
    if decl.bases.iter().any(|base| base.args.is_some()) {
        return Some("base-class arguments in the header");
    }
    let marked = decl
        .members()
        .flat_map(Member::params)
        .any(|param| param.null_assertion.is_some());
    if marked {
        return Some("a null assertion marker");
    }
    None
}

/// `modifiers` followed by `word`, space separated.
fn prefixed(modifiers: &[String], word: &str) -> String {
    let mut out = String::new();
    for modifier in modifiers {
        out.push_str(modifier);
        out.push(' ');
    }
    out.push_str(word);
    out
}

fn params(params: &[Parameter]) -> String {
    params.iter().map(param).collect::<Vec<_>>().join(", ")
}

fn param(param: &Parameter) -> String {
    let mut out = String::new();
    for attribute in &param.attributes {
        out.push_str(&format!("[{attribute}] "));
    }
    out.push_str(&prefixed(&param.modifiers, &param.ty.text));
    out.push(' ');
    out.push_str(&param.name);
    if let Some(default) = &param.default {
        out.push_str(" = ");
        out.push_str(default);
    }
    out
}

#[cfg(test)]
mod tests {
    use ss_ast::{BytePos, CompilationUnit, SsSyntax};
    use ss_desugar::{desugar_unit, DesugarOptions};
    use ss_parser::parse_unit;

    use crate::{emit_declaration, emit_unit, EmitConfig, EmitError, Newline};

    fn parse(src: &str) -> CompilationUnit {
        parse_unit(src, BytePos(1), &SsSyntax::default()).unwrap()
    }

    fn desugar(src: &str) -> String {
        let out = desugar_unit(&parse(src), &DesugarOptions::default());
        assert!(!out.has_errors(), "{:?}", out.diagnostics);
        emit_unit(&out.unit, &EmitConfig::default()).unwrap()
    }

    #[test]
    fn baseline_layout() {
        let src = "using System;
using System.IO;
namespace App {
// A plain class.
public sealed class Store<T> : IStore where T : class {
    private readonly List<T> items = new();
    public int Count { get; private set; }
    public string Name => \"store\";
    public Store(int capacity) : base() { Init(capacity); }
    public abstract void Reset();
}
}";
        let expected = "using System;
using System.IO;

namespace App
{
    // A plain class.
    public sealed class Store<T> : IStore
        where T : class
    {
        private readonly List<T> items = new();

        public int Count { get; private set; }

        public string Name => \"store\";

        public Store(int capacity)
            : base()
        {
            Init(capacity);
        }

        public abstract void Reset();
    }
}
";
        assert_eq!(emit_unit(&parse(src), &EmitConfig::default()).unwrap(), expected);
    }

    #[test]
    fn raw_members_keep_their_relative_indentation() {
        let src = "class A
{
        public int this[int i]
        {
            get { return i; }
        }
}";
        let expected = "class A
{
    public int this[int i]
    {
        get { return i; }
    }
}
";
        assert_eq!(emit_unit(&parse(src), &EmitConfig::default()).unwrap(), expected);
    }

    #[test]
    fn empty_class_gets_braces() {
        let out = emit_unit(&parse("class Empty { }"), &EmitConfig::default()).unwrap();
        assert_eq!(out, "class Empty\n{\n}\n");
    }

    #[test]
    fn extension_syntax_is_refused() {
        let cases = [
            ("data class P { }", "a data class header"),
            ("record class P(int X);", "a primary parameter list"),
            ("class P(int x) { }", "a primary parameter list"),
            ("singleton class S { }", "the singleton marker"),
            ("class D : Base(1) { }", "base-class arguments in the header"),
            ("class N { void M(string s!!) { } }", "a null assertion marker"),
        ];
        for (src, expected) in cases {
            let unit = parse(src);
            let err = emit_unit(&unit, &EmitConfig::default()).unwrap_err();
            let EmitError::ExtensionSyntax { construct, .. } = err;
            assert_eq!(construct, expected, "{src}");
        }
    }

    #[test]
    fn records_without_parameters_are_baseline() {
        let src = "public record Person\n{\n    public string Name { get; init; }\n}\n";
        let out = emit_unit(&parse(src), &EmitConfig::default()).unwrap();
        assert_eq!(out, src);
    }

    #[test]
    fn nested_extension_syntax_is_refused() {
        let unit = parse("class Outer { singleton class Inner { } }");
        let err = emit_unit(&unit, &EmitConfig::default()).unwrap_err();
        assert_eq!(
            err,
            EmitError::ExtensionSyntax {
                declaration: "Inner".into(),
                construct: "the singleton marker",
            }
        );
    }

    #[test]
    fn emitting_is_deterministic() {
        let unit = parse("class A { int x; void M() { x++; } }");
        let config = EmitConfig::default();
        let first = emit_unit(&unit, &config).unwrap();
        for _ in 0..4 {
            assert_eq!(emit_unit(&unit, &config).unwrap(), first);
        }
    }

    #[test]
    fn indent_width_and_crlf_are_configurable() {
        let config = EmitConfig {
            indent_width: 2,
            newline: Newline::CrLf,
        };
        let unit = parse("class A { int x; }");
        let decl = unit.declarations()[0];
        assert_eq!(
            emit_declaration(decl, &config).unwrap(),
            "class A\r\n{\r\n  int x;\r\n}\r\n"
        );
    }

    #[test]
    fn scenario_a_output() {
        let out = desugar(
            "using System;

public record class FileProcessor(string path)
{
    Validate(path);

    public string Path { get; } = path;
}",
        );
        let expected = "using System;

public class FileProcessor
{
    public FileProcessor(string path)
    {
        Validate(path);
        Path = path;
    }

    public string Path { get; }
}
";
        assert_eq!(out, expected);
    }

    #[test]
    fn scenario_b_output() {
        let out = desugar(
            "using System;

public record class FileProcessor(string Path) : public()
{
    Validate(path);
}",
        );
        let expected = "using System;

public class FileProcessor
{
    public string Path { get; init; }

    public FileProcessor(string path)
    {
        Validate(path);
        Path = path;
    }
}
";
        assert_eq!(out, expected);
    }

    #[test]
    fn scenario_c_output() {
        let out = desugar(
            "using System;

public singleton class Registry
{
    private readonly Dictionary<string, int> entries = new();
}",
        );
        let expected = "using System;

public class Registry
{
    private static readonly Lazy<Registry> _lazyInstance = new Lazy<Registry>(() => new Registry(), true);

    private Registry()
    {
        if (_lazyInstance.IsValueCreated) throw new InvalidOperationException(\"Singleton classes can only have one instance.\");
    }

    private readonly Dictionary<string, int> entries = new();

    public static Registry Instance => _lazyInstance.Value;
}
";
        assert_eq!(out, expected);
    }

    #[test]
    fn scenario_d_output() {
        let out = desugar(
            "using System;

public class Mailer
{
    public void Send([ThrowArgumentNullException] string to, string body) => Deliver(to, body);
}",
        );
        let expected = "using System;

public class Mailer
{
    public void Send(string to, string body)
    {
        ArgumentNullException.ThrowIfNull(to, nameof(to));
        Deliver(to, body);
    }
}
";
        assert_eq!(out, expected);
    }

    #[test]
    fn without_using_system_names_are_qualified() {
        let out = desugar("class M { void Run(string s!!) { Use(s); } }");
        assert!(out.contains("System.ArgumentNullException.ThrowIfNull(s, nameof(s));"));
    }

    #[test]
    fn desugared_output_is_a_fixed_point() {
        let first = desugar(
            "using System;

public data class Point(int X, int Y) : Shape(X)
{
    Check(x);

    public int Sum => X + Y;
}",
        );
        assert_eq!(desugar(&first), first);
    }
}
