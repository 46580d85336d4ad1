//! Class body members and parameter lists.

use ss_ast::{
    Accessor, BodyItem, Block, Constructor, Field, Member, Method, MethodBody, NullMarker,
    Parameter, Property, PropertyBody, RawText, Statement, TypeRef,
};

use crate::error::ParseError;
use crate::parser::Parser;

/// Modifiers that can only start a member, never a statement.
const MEMBER_MODIFIERS: &[&str] = &[
    "public", "private", "protected", "internal", "static", "readonly", "const", "virtual",
    "override", "abstract", "sealed", "async", "extern", "unsafe", "volatile", "partial",
    "required", "file",
];

/// Leading words of members the tree keeps verbatim.
const RAW_MEMBER_WORDS: &[&str] = &[
    "event", "delegate", "enum", "interface", "struct", "implicit", "explicit",
];

/// Words that can only start a statement inside a class body.
const STATEMENT_WORDS: &[&str] = &[
    "if", "for", "foreach", "while", "do", "switch", "throw", "return", "var", "try", "lock",
    "yield", "await", "checked", "unchecked", "goto", "break", "continue", "base", "this",
    "using", "fixed", "typeof", "nameof", "default", "new",
];

const PARAM_MODIFIERS: &[&str] = &["ref", "out", "in", "params", "this", "scoped", "readonly"];

const NULL_ASSERTION_ATTRIBUTES: &[&str] = &[
    "ThrowArgumentNullException",
    "ThrowArgumentNullExceptionAttribute",
];

impl Parser<'_> {
    pub(crate) fn parse_body_item(&mut self, class_name: &str) -> Result<BodyItem, ParseError> {
        if self.is_statement_start(class_name) {
            return Ok(BodyItem::Statement(self.parse_statement()?));
        }

        let start = self.pos;
        if self.is_declaration_start(start) {
            return Ok(BodyItem::Member(Member::Type(Box::new(
                self.parse_declaration()?,
            ))));
        }

        match self.parse_member(class_name) {
            Ok(Some(member)) => Ok(BodyItem::Member(member)),
            Ok(None) | Err(ParseError::Syntax { .. }) => {
                self.pos = start;
                Ok(BodyItem::Member(Member::Raw(self.parse_raw_item()?)))
            }
            Err(err) => Err(err),
        }
    }

    /// Decide, without consuming anything, whether the body entry at the
    /// cursor is a loose statement rather than a member.
    fn is_statement_start(&self, class_name: &str) -> bool {
        let tok = self.peek();
        if tok.is_punct("[") || tok.is_punct("~") {
            return false;
        }
        let Some(word) = tok.ident() else {
            // A tuple-typed member starts with `(`; everything else is code.
            return !self.starts_member_signature(self.pos);
        };
        if MEMBER_MODIFIERS.contains(&word) || RAW_MEMBER_WORDS.contains(&word) {
            return false;
        }
        if word == "new" {
            // `new` hides an inherited member only when another modifier follows.
            let next = self.peek_at(1).ident();
            return !next.is_some_and(|w| MEMBER_MODIFIERS.contains(&w));
        }
        if STATEMENT_WORDS.contains(&word) {
            return true;
        }
        if self.is_declaration_start(self.pos) {
            return false;
        }
        if word == class_name && self.peek_at(1).is_punct("(") {
            return match self.skip_group(self.pos + 1) {
                Some(after) => !(self.tok(after).is_punct("{")
                    || self.tok(after).is_punct(":")
                    || self.tok(after).is_punct("=>")),
                None => true,
            };
        }
        !self.starts_member_signature(self.pos)
    }

    /// A type followed by a member name (or `this[`/`operator`).
    fn starts_member_signature(&self, idx: usize) -> bool {
        match self.scan_type(idx) {
            Some(end) => {
                let next = self.tok(end);
                next.ident().is_some_and(|w| w != "is" && w != "as")
            }
            None => false,
        }
    }

    /// Parse a member the tree models. `Ok(None)` asks the caller to keep the
    /// member verbatim instead.
    fn parse_member(&mut self, class_name: &str) -> Result<Option<Member>, ParseError> {
        let start = self.pos;
        let attributes = self.parse_attribute_sections()?;
        let mut modifiers = Vec::new();
        while let Some(word) = self.peek().ident() {
            let is_modifier = MEMBER_MODIFIERS.contains(&word)
                || (word == "new" && self.peek_at(1).ident().is_some());
            if !is_modifier {
                break;
            }
            modifiers.push(word.to_string());
            self.bump();
        }

        if self.at_punct("~") {
            return Ok(None);
        }
        if let Some(word) = self.peek().ident() {
            if RAW_MEMBER_WORDS.contains(&word) {
                return Ok(None);
            }
        }

        if self.at_ident(class_name) && self.peek_at(1).is_punct("(") {
            return self
                .parse_constructor(start, attributes, modifiers)
                .map(|ctor| ctor.map(Member::Constructor));
        }

        let ty = self.parse_type()?;
        if self.at_ident("operator") || self.at_ident("this") {
            return Ok(None);
        }

        let name_start = self.pos;
        self.expect_ident()?;
        while self.at_punct(".") && self.peek_at(1).ident().is_some() {
            self.bump();
            self.bump();
        }
        let name = self.join(name_start, self.pos);

        if self.at_punct("(") || self.at_punct("<") {
            let type_params = self.parse_type_params()?;
            let params = self.parse_params()?;
            let constraints = self.parse_constraints(|t| {
                t.is_punct("{") || t.is_punct("=>") || t.is_punct(";")
            })?;
            let body = if self.at_punct("{") {
                MethodBody::Block(self.parse_block()?)
            } else if self.eat_punct("=>") {
                MethodBody::Expression(self.parse_expression_to_semicolon()?)
            } else {
                self.expect_punct(";")?;
                MethodBody::None
            };
            return Ok(Some(Member::Method(Method {
                attributes,
                modifiers,
                return_type: ty,
                name,
                type_params,
                params,
                constraints,
                body,
                span: self.span_of(start, self.pos),
            })));
        }

        if self.at_punct("{") {
            let body = self.parse_property_body()?;
            let initializer = if self.eat_punct("=") {
                Some(self.parse_expression_to_semicolon()?)
            } else {
                None
            };
            return Ok(Some(Member::Property(Property {
                attributes,
                modifiers,
                ty,
                name,
                body,
                initializer,
                span: self.span_of(start, self.pos),
            })));
        }

        if self.eat_punct("=>") {
            let expr = self.parse_expression_to_semicolon()?;
            return Ok(Some(Member::Property(Property {
                attributes,
                modifiers,
                ty,
                name,
                body: PropertyBody::Expression(expr),
                initializer: None,
                span: self.span_of(start, self.pos),
            })));
        }

        let initializer = if self.eat_punct("=") {
            Some(self.parse_expression_to_semicolon()?)
        } else {
            self.expect_punct(";")?;
            None
        };
        Ok(Some(Member::Field(Field {
            attributes,
            modifiers,
            ty,
            name,
            initializer,
            span: self.span_of(start, self.pos),
        })))
    }

    fn parse_constructor(
        &mut self,
        start: usize,
        attributes: Vec<String>,
        modifiers: Vec<String>,
    ) -> Result<Option<Constructor>, ParseError> {
        let name = self.expect_ident()?;
        let params = self.parse_params()?;

        let initializer = if self.eat_punct(":") {
            let keyword = self.expect_ident()?;
            if keyword != "base" && keyword != "this" {
                return Err(self.unexpected("`base` or `this`"));
            }
            if !self.at_punct("(") {
                return Err(self.unexpected("`(`"));
            }
            let open = self.pos;
            let close = self
                .skip_group(open)
                .ok_or_else(|| self.unexpected("`(`"))?;
            let args = self.slice(open + 1, close - 1).to_string();
            self.pos = close;
            Some(format!("{keyword}({args})"))
        } else {
            None
        };

        let body = if self.at_punct("{") {
            self.parse_block()?
        } else if self.eat_punct("=>") {
            Block::new(vec![Statement::Expr(self.parse_expression_to_semicolon()?)])
        } else {
            return Ok(None);
        };

        Ok(Some(Constructor {
            attributes,
            modifiers,
            name,
            params,
            initializer,
            body,
            span: self.span_of(start, self.pos),
        }))
    }

    pub(crate) fn parse_type(&mut self) -> Result<TypeRef, ParseError> {
        let end = self
            .scan_type(self.pos)
            .ok_or_else(|| self.unexpected("a type"))?;
        let ty = TypeRef::new(self.join(self.pos, end));
        self.pos = end;
        Ok(ty)
    }

    /// `(` params `)`.
    pub(crate) fn parse_params(&mut self) -> Result<Vec<Parameter>, ParseError> {
        self.expect_punct("(")?;
        let mut params = Vec::new();
        if self.eat_punct(")") {
            return Ok(params);
        }
        loop {
            params.push(self.parse_param()?);
            if self.eat_punct(")") {
                return Ok(params);
            }
            self.expect_punct(",")?;
        }
    }

    fn parse_param(&mut self) -> Result<Parameter, ParseError> {
        let start = self.pos;
        let mut null_assertion = None;
        let mut attributes = Vec::new();
        for attribute in self.parse_attribute_sections()? {
            if self.syntax.null_assertion && is_null_assertion_attribute(&attribute) {
                null_assertion = Some(NullMarker::Attribute);
            } else {
                attributes.push(attribute);
            }
        }

        let mut modifiers = Vec::new();
        while let Some(word) = self.peek().ident() {
            if !PARAM_MODIFIERS.contains(&word) {
                break;
            }
            modifiers.push(word.to_string());
            self.bump();
        }

        let ty = self.parse_type()?;
        let name = self.expect_ident()?;

        if self.syntax.null_assertion && self.at_punct("!") && self.peek_at(1).is_punct("!") {
            self.bump();
            self.bump();
            null_assertion = Some(NullMarker::BangBang);
        }

        let default = if self.eat_punct("=") {
            let from = self.pos;
            let to = self.scan_until(from, false, |t| t.is_punct(",") || t.is_punct(")"))?;
            self.pos = to;
            Some(self.slice(from, to).to_string())
        } else {
            None
        };

        Ok(Parameter {
            attributes,
            modifiers,
            ty,
            name,
            default,
            null_assertion,
            span: self.span_of(start, self.pos),
        })
    }

    /// `{ get; init; }` becomes [`PropertyBody::Auto`]; accessor lists with
    /// bodies are kept verbatim.
    fn parse_property_body(&mut self) -> Result<PropertyBody, ParseError> {
        let open = self.pos;
        let close = self
            .skip_group(open)
            .ok_or_else(|| self.unexpected("`}`"))?;

        let mut accessors = Vec::new();
        let mut i = open + 1;
        let mut auto = true;
        while i < close - 1 {
            let mut modifiers = Vec::new();
            while let Some(word) = self.tok(i).ident() {
                if !matches!(word, "private" | "protected" | "internal" | "public") {
                    break;
                }
                modifiers.push(word.to_string());
                i += 1;
            }
            let keyword = self.tok(i).ident().unwrap_or_default();
            if !matches!(keyword, "get" | "set" | "init") || !self.tok(i + 1).is_punct(";") {
                auto = false;
                break;
            }
            let has_comments = !self.tok(i).leading.is_empty();
            if has_comments {
                auto = false;
                break;
            }
            accessors.push(Accessor {
                modifiers,
                keyword: keyword.to_string(),
            });
            i += 2;
        }

        self.pos = close;
        if auto && !accessors.is_empty() && self.tok(close - 1).leading.is_empty() {
            Ok(PropertyBody::Auto(accessors))
        } else {
            Ok(PropertyBody::Raw(self.raw(open, close)))
        }
    }

    /// Expression text up to the `;` at depth 0, which is consumed.
    pub(crate) fn parse_expression_to_semicolon(&mut self) -> Result<RawText, ParseError> {
        let start = self.pos;
        let end = self.scan_until(start, false, |t| t.is_punct(";"))?;
        if end == start {
            return Err(self.unexpected("an expression"));
        }
        let raw = self.raw(start, end);
        self.pos = end + 1;
        Ok(raw)
    }
}

fn is_null_assertion_attribute(attribute: &str) -> bool {
    let head = attribute.split('(').next().unwrap_or_default().trim();
    let name = head.rsplit('.').next().unwrap_or(head).trim();
    NULL_ASSERTION_ATTRIBUTES.contains(&name)
}

#[cfg(test)]
mod tests {
    use ss_ast::{
        BodyItem, Declaration, Member, MethodBody, NullMarker, PropertyBody, SsSyntax,
        Statement,
    };
    use swc_common::BytePos;

    use crate::parse_unit;

    fn decl(src: &str) -> Declaration {
        let unit = parse_unit(src, BytePos(1), &SsSyntax::default()).unwrap();
        unit.declarations()[0].clone()
    }

    fn members(d: &Declaration) -> Vec<&Member> {
        d.members().collect()
    }

    #[test]
    fn leading_statement_then_members() {
        let d = decl(
            "public class FileProcessor(string filePath) : public()
{
    ValidateFilePath(filePath);

    public string FilePath { get; set; } = filePath;

    private void ValidateFilePath(string path)
    {
        if (string.IsNullOrEmpty(path) || !File.Exists(path))
            throw new ArgumentException(\"Invalid file path provided.\");
    }
}",
        );
        assert!(matches!(&d.body[0], BodyItem::Statement(s) if s.text == "ValidateFilePath(filePath);"));
        assert_eq!(d.first_member_index(), 1);
        let ms = members(&d);
        let Member::Property(prop) = ms[0] else {
            panic!("expected property");
        };
        assert_eq!(prop.name, "FilePath");
        assert_eq!(prop.initializer.as_ref().unwrap().text, "filePath");
        assert!(matches!(&prop.body, PropertyBody::Auto(a) if a.len() == 2));
        let Member::Method(method) = ms[1] else {
            panic!("expected method");
        };
        let MethodBody::Block(block) = &method.body else {
            panic!("expected block body");
        };
        assert_eq!(block.stmts.len(), 1);
        let Statement::Source(stmt) = &block.stmts[0] else {
            panic!("expected source statement");
        };
        assert!(stmt.text.starts_with("if (string.IsNullOrEmpty(path)"));
        assert!(stmt.text.ends_with("provided.\");"));
    }

    #[test]
    fn null_assertion_markers() {
        let d = decl(
            "class N { public N(int id, [ThrowArgumentNullException] string argument, string other!!) { } }",
        );
        let params = d.members().next().unwrap().params();
        assert_eq!(params[0].null_assertion, None);
        assert_eq!(params[1].null_assertion, Some(NullMarker::Attribute));
        assert!(params[1].attributes.is_empty());
        assert_eq!(params[2].null_assertion, Some(NullMarker::BangBang));
    }

    #[test]
    fn null_assertion_attribute_is_ordinary_when_disabled() {
        let syntax = SsSyntax {
            null_assertion: false,
            ..SsSyntax::default()
        };
        let unit = parse_unit(
            "class N { void M([ThrowArgumentNullException] string a) { } }",
            BytePos(1),
            &syntax,
        )
        .unwrap();
        let params = unit.declarations()[0].members().next().unwrap().params().to_vec();
        assert_eq!(params[0].null_assertion, None);
        assert_eq!(params[0].attributes, vec!["ThrowArgumentNullException"]);
    }

    #[test]
    fn constructors_are_told_apart_from_calls() {
        let d = decl("class C { C(); private C() : base(1) { Work(); } }");
        assert!(matches!(&d.body[0], BodyItem::Statement(s) if s.text == "C();"));
        let BodyItem::Member(Member::Constructor(ctor)) = &d.body[1] else {
            panic!("expected constructor");
        };
        assert_eq!(ctor.initializer.as_deref(), Some("base(1)"));
        assert!(ctor.is_private());
        assert_eq!(ctor.body.stmts.len(), 1);
    }

    #[test]
    fn statements_vs_fields() {
        let d = decl(
            "class C { Log.Write(1); count = 2; var x = 1; List<int> items = new(); int total; }",
        );
        assert!(matches!(d.body[0], BodyItem::Statement(_)));
        assert!(matches!(d.body[1], BodyItem::Statement(_)));
        assert!(matches!(d.body[2], BodyItem::Statement(_)));
        assert!(matches!(&d.body[3], BodyItem::Member(Member::Field(f)) if f.ty.text == "List<int>"));
        assert!(matches!(&d.body[4], BodyItem::Member(Member::Field(f)) if f.initializer.is_none()));
    }

    #[test]
    fn expression_bodies_and_raw_members() {
        let d = decl(
            "class C {
    public static C Instance => _lazy.Value;
    public int this[int i] => i;
    public event EventHandler Changed;
    public string Name { get { return _name; } set { _name = value; } }
    public abstract void Run();
    public int Twice(int x) => x * 2;
}",
        );
        let ms = members(&d);
        assert!(matches!(ms[0], Member::Property(p) if matches!(p.body, PropertyBody::Expression(_))));
        assert!(matches!(ms[1], Member::Raw(r) if r.text == "public int this[int i] => i;"));
        assert!(matches!(ms[2], Member::Raw(_)));
        assert!(matches!(ms[3], Member::Property(p) if matches!(p.body, PropertyBody::Raw(_))));
        assert!(matches!(ms[4], Member::Method(m) if m.body == MethodBody::None));
        assert!(matches!(ms[5], Member::Method(m) if matches!(m.body, MethodBody::Expression(_))));
    }

    #[test]
    fn generic_method_with_constraints() {
        let d = decl("class C { public T Make<T>(string key = \"a,b\") where T : new() { return new T(); } }");
        let Member::Method(m) = members(&d)[0] else {
            panic!("expected method");
        };
        assert_eq!(m.type_params.as_deref(), Some("<T>"));
        assert_eq!(m.params[0].default.as_deref(), Some("\"a,b\""));
        assert_eq!(m.constraints, vec!["T : new()"]);
    }

    #[test]
    fn comments_are_kept_as_items() {
        let d = decl("class C {\n    // first\n    Init();\n    /* doc */\n    int x;\n    // tail\n}");
        assert!(matches!(&d.body[0], BodyItem::Comment(c) if c.text == "// first"));
        assert!(matches!(d.body[1], BodyItem::Statement(_)));
        assert!(matches!(&d.body[2], BodyItem::Comment(c) if c.text == "/* doc */"));
        assert!(matches!(d.body[3], BodyItem::Member(_)));
        assert!(matches!(&d.body[4], BodyItem::Comment(c) if c.text == "// tail"));
    }
}
