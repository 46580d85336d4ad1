//! File-level items and class declarations.

use ss_ast::{
    BaseEntry, BodyItem, CompilationUnit, DeclKind, Declaration, Item, Namespace, RawText, Using,
};

use crate::error::ParseError;
use crate::parser::Parser;

/// Modifiers accepted in front of `class`.
const DECL_MODIFIERS: &[&str] = &[
    "public", "private", "protected", "internal", "abstract", "sealed", "static", "partial",
    "unsafe", "new", "file",
];

const ACCESS_WORDS: &[&str] = &["public", "private", "protected", "internal"];

impl Parser<'_> {
    pub(crate) fn parse_compilation_unit(mut self) -> Result<CompilationUnit, ParseError> {
        let items = self.parse_items(false)?;
        Ok(CompilationUnit { items })
    }

    /// Items up to end of file, or up to the closing `}` of a namespace.
    fn parse_items(&mut self, in_braces: bool) -> Result<Vec<Item>, ParseError> {
        let mut items = Vec::new();
        loop {
            items.extend(self.take_comments().into_iter().map(Item::Comment));

            if self.peek().is_eof() {
                if in_braces {
                    return Err(self.unexpected("`}`"));
                }
                return Ok(items);
            }
            if in_braces && self.at_punct("}") {
                return Ok(items);
            }

            let item = if self.at_using_directive() {
                Item::Using(self.parse_using()?)
            } else if self.at_ident("namespace") {
                Item::Namespace(self.parse_namespace()?)
            } else if self.at_attribute_with_target() {
                let start = self.pos;
                let end = self
                    .skip_group(start)
                    .ok_or_else(|| self.unexpected("`]`"))?;
                self.pos = end;
                Item::Raw(self.raw(start, end))
            } else if self.is_declaration_start(self.pos) {
                Item::Declaration(self.parse_declaration()?)
            } else {
                Item::Raw(self.parse_raw_item()?)
            };
            items.push(item);
        }
    }

    fn at_using_directive(&self) -> bool {
        let using_at = if self.at_ident("global") { 1 } else { 0 };
        self.peek_at(using_at).is_ident("using")
            && !self.peek_at(using_at + 1).is_punct("(")
            && !self.peek_at(using_at + 1).is_ident("var")
    }

    fn parse_using(&mut self) -> Result<Using, ParseError> {
        let global = self.eat_ident("global");
        self.bump();
        let start = self.pos;
        let end = self.scan_until(start, false, |t| t.is_punct(";"))?;
        let target = self.join(start, end);
        self.pos = end + 1;
        Ok(Using { global, target })
    }

    fn parse_namespace(&mut self) -> Result<Namespace, ParseError> {
        self.bump();
        let start = self.pos;
        let end = self.scan_until(start, false, |t| t.is_punct("{") || t.is_punct(";"))?;
        let name = self.join(start, end);
        self.pos = end;
        if self.eat_punct(";") {
            let items = self.parse_items(false)?;
            return Ok(Namespace {
                name,
                file_scoped: true,
                items,
            });
        }
        self.expect_punct("{")?;
        let items = self.parse_items(true)?;
        self.expect_punct("}")?;
        Ok(Namespace {
            name,
            file_scoped: false,
            items,
        })
    }

    /// `[assembly: ...]` and friends stand alone.
    fn at_attribute_with_target(&self) -> bool {
        self.at_punct("[")
            && self.peek_at(1).ident().is_some()
            && self.peek_at(2).is_punct(":")
    }

    /// Whether tokens from `idx` on read as a class declaration in either
    /// grammar: attributes, modifiers, then `class`, `record`, `data class`
    /// or (with the extension on) `singleton`.
    pub(crate) fn is_declaration_start(&self, idx: usize) -> bool {
        let mut i = idx;
        while self.tok(i).is_punct("[") {
            match self.skip_group(i) {
                Some(end) => i = end,
                None => return false,
            }
        }
        loop {
            let tok = self.tok(i);
            let Some(word) = tok.ident() else {
                return false;
            };
            match word {
                "class" => return true,
                "record" => return !self.tok(i + 1).is_ident("struct"),
                "data" => return self.tok(i + 1).is_ident("class"),
                "singleton" if self.syntax.singleton => {}
                w if DECL_MODIFIERS.contains(&w) => {}
                _ => return false,
            }
            i += 1;
        }
    }

    pub(crate) fn parse_attribute_sections(&mut self) -> Result<Vec<String>, ParseError> {
        let mut attributes = Vec::new();
        while self.eat_punct("[") {
            loop {
                let start = self.pos;
                let end =
                    self.scan_until(start, false, |t| t.is_punct(",") || t.is_punct("]"))?;
                if end > start {
                    attributes.push(self.slice(start, end).to_string());
                }
                self.pos = end;
                if self.eat_punct("]") {
                    break;
                }
                self.bump();
            }
        }
        Ok(attributes)
    }

    pub(crate) fn parse_declaration(&mut self) -> Result<Declaration, ParseError> {
        let start = self.pos;
        let attributes = self.parse_attribute_sections()?;

        let mut modifiers = Vec::new();
        let mut singleton = false;
        let kind = loop {
            let word = self.expect_ident()?;
            match word.as_str() {
                "class" => break DeclKind::Class,
                "record" => {
                    self.eat_ident("class");
                    break DeclKind::Record;
                }
                "data" => {
                    self.expect_keyword("class")?;
                    break DeclKind::Data;
                }
                "singleton" => singleton = true,
                _ => modifiers.push(word),
            }
        };

        let name = self.expect_ident()?;
        let type_params = self.parse_type_params()?;
        let params = if self.at_punct("(") {
            Some(self.parse_params()?)
        } else {
            None
        };

        let mut ctor_access = None;
        let mut bases = Vec::new();
        if self.eat_punct(":") {
            loop {
                let entry_start = self.pos;
                let entry_end = self.scan_until(entry_start, true, |t| {
                    t.is_punct(",") || t.is_punct("{") || t.is_punct(";") || t.is_ident("where")
                })?;
                if entry_end == entry_start {
                    return Err(self.unexpected("a base type"));
                }
                self.classify_base_entry(entry_start, entry_end, &mut ctor_access, &mut bases)?;
                self.pos = entry_end;
                if !self.eat_punct(",") {
                    break;
                }
            }
        }

        let constraints = self.parse_constraints(|t| t.is_punct("{") || t.is_punct(";"))?;

        let body = if self.eat_punct(";") {
            Vec::new()
        } else {
            self.expect_punct("{")?;
            let body = self.parse_class_body(&name)?;
            self.expect_punct("}")?;
            self.eat_punct(";");
            body
        };

        let end = self.pos;
        Ok(Declaration {
            attributes,
            modifiers,
            kind,
            singleton,
            name,
            type_params,
            params,
            ctor_access,
            bases,
            constraints,
            body,
            source: self.raw(start, end),
            span: self.span_of(start, end),
        })
    }

    fn expect_keyword(&mut self, word: &str) -> Result<(), ParseError> {
        if self.eat_ident(word) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("`{word}`")))
        }
    }

    /// `public()` sets the constructor's accessibility, `Base(x)` is a base
    /// class with primary arguments, anything else is a plain base type.
    fn classify_base_entry(
        &self,
        start: usize,
        end: usize,
        ctor_access: &mut Option<String>,
        bases: &mut Vec<BaseEntry>,
    ) -> Result<(), ParseError> {
        let last = end - 1;
        if self.tok(last).is_punct(")") {
            let open = (start..last)
                .find(|&i| self.tok(i).is_punct("(") && self.skip_group(i) == Some(end));
            if let Some(open) = open {
                let is_access = (start..open).all(|i| {
                    self.tok(i)
                        .ident()
                        .is_some_and(|w| ACCESS_WORDS.contains(&w))
                });
                if is_access && open > start {
                    if open + 1 != last {
                        return Err(crate::ParseError::syntax(
                            "a constructor access clause takes no arguments",
                            self.span_of(open, end),
                        ));
                    }
                    *ctor_access = Some(self.join(start, open));
                    return Ok(());
                }
                bases.push(BaseEntry {
                    name: self.join(start, open),
                    args: Some(self.slice(open + 1, last).to_string()),
                });
                return Ok(());
            }
        }
        bases.push(BaseEntry {
            name: self.join(start, end),
            args: None,
        });
        Ok(())
    }

    pub(crate) fn parse_type_params(&mut self) -> Result<Option<String>, ParseError> {
        if !self.at_punct("<") {
            return Ok(None);
        }
        let start = self.pos;
        let close = self.scan_until(start + 1, true, |t| t.is_punct(">"))?;
        self.pos = close + 1;
        Ok(Some(self.join(start, close + 1)))
    }

    /// Zero or more `where T : ...` clauses, ended by a token matching `stop`.
    pub(crate) fn parse_constraints(
        &mut self,
        stop: impl Fn(&ss_lexer::Token) -> bool,
    ) -> Result<Vec<String>, ParseError> {
        let mut constraints = Vec::new();
        while self.eat_ident("where") {
            let start = self.pos;
            let end = self.scan_until(start, true, |t| t.is_ident("where") || stop(t))?;
            constraints.push(self.join(start, end));
            self.pos = end;
        }
        Ok(constraints)
    }

    /// Class body entries up to (not including) the closing `}`.
    fn parse_class_body(&mut self, class_name: &str) -> Result<Vec<BodyItem>, ParseError> {
        let mut body = Vec::new();
        loop {
            body.extend(self.take_comments().into_iter().map(BodyItem::Comment));
            if self.at_punct("}") {
                return Ok(body);
            }
            if self.peek().is_eof() {
                return Err(self.unexpected("`}`"));
            }
            if self.eat_punct(";") {
                continue;
            }
            body.push(self.parse_body_item(class_name)?);
        }
    }

    /// Anything up to a `;` or a closing brace at depth 0, verbatim.
    pub(crate) fn parse_raw_item(&mut self) -> Result<RawText, ParseError> {
        let start = self.pos;
        let mut i = start;
        loop {
            let tok = self.tok(i);
            if tok.is_eof() {
                return Err(ParseError::syntax("unexpected end of file", tok.span));
            }
            if tok.is_punct(";") {
                i += 1;
                break;
            }
            if tok.is_punct("}") {
                return Err(ParseError::syntax("unexpected `}`", tok.span));
            }
            if crate::parser::is_open(tok) {
                let closing_brace = tok.is_punct("{");
                i = self
                    .skip_group(i)
                    .ok_or_else(|| ParseError::syntax("unclosed bracket", tok.span))?;
                if closing_brace {
                    if self.tok(i).is_punct(";") {
                        i += 1;
                    }
                    break;
                }
                continue;
            }
            i += 1;
        }
        self.pos = i;
        Ok(self.raw(start, i))
    }
}
