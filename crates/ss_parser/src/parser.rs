//! Token cursor shared by the item, member and statement parsers.

use ss_ast::{is_reserved_keyword, RawText, SsSyntax};
use ss_lexer::{Token, TokenKind};
use swc_common::{BytePos, Span};

use crate::error::ParseError;

/// Keywords that name types and may start a type reference.
const TYPE_KEYWORDS: &[&str] = &[
    "bool", "byte", "char", "decimal", "double", "float", "int", "long", "object", "sbyte",
    "short", "string", "uint", "ulong", "ushort", "void",
];

/// Operators joined with a space on both sides when re-rendering tokens.
const SPACED_OPS: &[&str] = &["=", "=>", ":", "==", "!=", "&&", "||", "??"];

pub(crate) struct Parser<'a> {
    pub(crate) tokens: Vec<Token>,
    pub(crate) pos: usize,
    source: &'a str,
    base: BytePos,
    pub(crate) syntax: &'a SsSyntax,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(
        tokens: Vec<Token>,
        source: &'a str,
        base: BytePos,
        syntax: &'a SsSyntax,
    ) -> Self {
        Self {
            tokens,
            pos: 0,
            source,
            base,
            syntax,
        }
    }

    pub(crate) fn peek(&self) -> &Token {
        self.peek_at(0)
    }

    /// The token `n` places ahead; clamps to the trailing EOF.
    pub(crate) fn peek_at(&self, n: usize) -> &Token {
        self.tok(self.pos + n)
    }

    pub(crate) fn tok(&self, idx: usize) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[idx.min(last)]
    }

    pub(crate) fn bump(&mut self) {
        if !self.peek().is_eof() {
            self.pos += 1;
        }
    }

    pub(crate) fn at_punct(&self, punct: &str) -> bool {
        self.peek().is_punct(punct)
    }

    pub(crate) fn at_ident(&self, word: &str) -> bool {
        self.peek().is_ident(word)
    }

    pub(crate) fn eat_punct(&mut self, punct: &str) -> bool {
        if self.at_punct(punct) {
            self.bump();
            true
        } else {
            false
        }
    }

    pub(crate) fn eat_ident(&mut self, word: &str) -> bool {
        if self.at_ident(word) {
            self.bump();
            true
        } else {
            false
        }
    }

    pub(crate) fn expect_punct(&mut self, punct: &str) -> Result<(), ParseError> {
        if self.eat_punct(punct) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("`{punct}`")))
        }
    }

    pub(crate) fn expect_ident(&mut self) -> Result<String, ParseError> {
        match self.peek().ident() {
            Some(word) => {
                let word = word.to_string();
                self.bump();
                Ok(word)
            }
            None => Err(self.unexpected("an identifier")),
        }
    }

    pub(crate) fn unexpected(&self, expected: &str) -> ParseError {
        let tok = self.peek();
        let found = if tok.is_eof() {
            "end of file".to_string()
        } else {
            format!("`{}`", tok.text())
        };
        ParseError::syntax(format!("expected {expected}, found {found}"), tok.span)
    }

    /// Drain the comments in front of the current token.
    pub(crate) fn take_comments(&mut self) -> Vec<RawText> {
        let pos = self.pos.min(self.tokens.len() - 1);
        std::mem::take(&mut self.tokens[pos].leading)
            .into_iter()
            .map(|trivia| RawText::new(trivia.text, trivia.span, trivia.column, Vec::new()))
            .collect()
    }

    fn offset(&self, pos: BytePos) -> usize {
        (pos.0 - self.base.0) as usize
    }

    /// Span covering tokens `from..to`.
    pub(crate) fn span_of(&self, from: usize, to: usize) -> Span {
        if to <= from {
            let at = self.tok(from).span.lo;
            return Span::new(at, at);
        }
        Span::new(self.tok(from).span.lo, self.tok(to - 1).span.hi)
    }

    /// The exact source text of tokens `from..to`, comments in between included.
    pub(crate) fn slice(&self, from: usize, to: usize) -> &'a str {
        let span = self.span_of(from, to);
        &self.source[self.offset(span.lo)..self.offset(span.hi)]
    }

    pub(crate) fn raw(&self, from: usize, to: usize) -> RawText {
        let idents = self.tokens[from..to.min(self.tokens.len())]
            .iter()
            .flat_map(token_idents)
            .collect();
        RawText::new(
            self.slice(from, to),
            self.span_of(from, to),
            self.tok(from).column,
            idents,
        )
    }

    /// Re-render tokens `from..to` with normalized spacing:
    /// `Dictionary<string, List<int>>?`, `T : class, new()`.
    pub(crate) fn join(&self, from: usize, to: usize) -> String {
        let mut out = String::new();
        for idx in from..to {
            let cur = self.tok(idx);
            if idx > from && needs_space(self.tok(idx - 1), cur) {
                out.push(' ');
            }
            out.push_str(cur.text());
        }
        out
    }

    /// Index just past the bracket group opening at `idx`; `None` if it never
    /// closes.
    pub(crate) fn skip_group(&self, idx: usize) -> Option<usize> {
        let mut depth = 0usize;
        let mut i = idx;
        loop {
            let tok = self.tok(i);
            if tok.is_eof() {
                return None;
            }
            if is_open(tok) {
                depth += 1;
            } else if is_close(tok) {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            i += 1;
        }
    }

    /// Scan a type reference starting at `idx` without consuming it. Returns
    /// the index just past it.
    pub(crate) fn scan_type(&self, idx: usize) -> Option<usize> {
        let mut i = idx;
        if self.tok(i).is_punct("(") {
            i += 1;
            loop {
                i = self.scan_type(i)?;
                if self.tok(i).ident().is_some() {
                    i += 1;
                }
                if self.tok(i).is_punct(",") {
                    i += 1;
                } else if self.tok(i).is_punct(")") {
                    i += 1;
                    break;
                } else {
                    return None;
                }
            }
        } else {
            let word = self.tok(i).ident()?;
            if is_reserved_keyword(word) && !TYPE_KEYWORDS.contains(&word) {
                return None;
            }
            i += 1;
            if self.tok(i).is_punct("::") && self.tok(i + 1).ident().is_some() {
                i += 2;
            }
            loop {
                if self.tok(i).is_punct("<") {
                    i += 1;
                    loop {
                        i = self.scan_type(i)?;
                        if self.tok(i).is_punct(",") {
                            i += 1;
                        } else if self.tok(i).is_punct(">") {
                            i += 1;
                            break;
                        } else {
                            return None;
                        }
                    }
                }
                if self.tok(i).is_punct(".") && self.tok(i + 1).ident().is_some() {
                    i += 2;
                    continue;
                }
                break;
            }
        }
        loop {
            if self.tok(i).is_punct("?") {
                i += 1;
            } else if self.tok(i).is_punct("[") {
                let mut j = i + 1;
                while self.tok(j).is_punct(",") {
                    j += 1;
                }
                if !self.tok(j).is_punct("]") {
                    break;
                }
                i = j + 1;
            } else {
                break;
            }
        }
        Some(i)
    }

    /// Index of the first token at or after `idx` that is at bracket depth 0
    /// and satisfies `stop`. Brackets include `<`/`>` when `angles` is set.
    pub(crate) fn scan_until(
        &self,
        idx: usize,
        angles: bool,
        stop: impl Fn(&Token) -> bool,
    ) -> Result<usize, ParseError> {
        let mut depth = 0usize;
        let mut i = idx;
        loop {
            let tok = self.tok(i);
            if tok.is_eof() {
                return Err(ParseError::syntax("unexpected end of file", tok.span));
            }
            if depth == 0 && stop(tok) {
                return Ok(i);
            }
            if is_open(tok) || (angles && tok.is_punct("<")) {
                depth += 1;
            } else if is_close(tok) || (angles && tok.is_punct(">")) {
                if depth == 0 {
                    return Err(ParseError::syntax(
                        format!("unbalanced `{}`", tok.text()),
                        tok.span,
                    ));
                }
                depth -= 1;
            }
            i += 1;
        }
    }
}

pub(crate) fn is_open(tok: &Token) -> bool {
    matches!(tok.kind, TokenKind::Punct("(" | "[" | "{"))
}

pub(crate) fn is_close(tok: &Token) -> bool {
    matches!(tok.kind, TokenKind::Punct(")" | "]" | "}"))
}

/// Identifiers a token mentions: itself, or those inside the holes of an
/// interpolated string.
fn token_idents(tok: &Token) -> Vec<String> {
    match &tok.kind {
        TokenKind::Ident(word) => vec![word.clone()],
        TokenKind::Str(text) if text.trim_start_matches('@').starts_with('$') => {
            interpolation_idents(text)
        }
        _ => Vec::new(),
    }
}

fn interpolation_idents(text: &str) -> Vec<String> {
    let mut idents = Vec::new();
    let mut depth = 0usize;
    let mut word = String::new();
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        let in_hole = depth > 0;
        if in_hole && (c.is_alphanumeric() || c == '_') {
            word.push(c);
            continue;
        }
        if !word.is_empty() {
            if !word.starts_with(|ch: char| ch.is_ascii_digit()) {
                idents.push(std::mem::take(&mut word));
            }
            word.clear();
        }
        match c {
            '{' if depth == 0 && chars.peek() == Some(&'{') => {
                chars.next();
            }
            '{' => depth += 1,
            '}' if depth > 0 => depth -= 1,
            _ => {}
        }
    }
    idents
}

fn needs_space(prev: &Token, cur: &Token) -> bool {
    if prev.is_punct(",") {
        return true;
    }
    if prev.is_word() && cur.is_word() {
        return true;
    }
    if let (TokenKind::Punct(p), true) = (&prev.kind, cur.is_word()) {
        if matches!(*p, "?" | "]" | ">" | ")") {
            return true;
        }
    }
    let spaced = |tok: &Token| matches!(tok.kind, TokenKind::Punct(p) if SPACED_OPS.contains(&p));
    spaced(prev) || spaced(cur)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ss_lexer::Lexer;

    fn with_parser<R>(src: &str, f: impl FnOnce(&Parser<'_>) -> R) -> R {
        let syntax = SsSyntax::default();
        let tokens = Lexer::tokenize(src, BytePos(1)).unwrap();
        let parser = Parser::new(tokens, src, BytePos(1), &syntax);
        f(&parser)
    }

    #[test]
    fn scan_type_handles_generics_arrays_and_nullables() {
        with_parser("Dictionary<string, List<int>>?[] x", |p| {
            let end = p.scan_type(0).unwrap();
            assert!(p.tok(end).is_ident("x"));
            assert_eq!(p.join(0, end), "Dictionary<string, List<int>>?[]");
        });
    }

    #[test]
    fn scan_type_handles_tuples() {
        with_parser("(int a, string? b) pair", |p| {
            let end = p.scan_type(0).unwrap();
            assert_eq!(p.join(0, end), "(int a, string? b)");
        });
    }

    #[test]
    fn scan_type_rejects_statement_keywords() {
        with_parser("return x;", |p| assert_eq!(p.scan_type(0), None));
    }

    #[test]
    fn interpolation_holes_count_as_mentions() {
        with_parser("Say($\"Hi {name.Trim()}, {{literal}}\");", |p| {
            let raw = p.raw(0, 5);
            assert!(raw.mentions("name"));
            assert!(raw.mentions("Trim"));
            assert!(!raw.mentions("literal"));
        });
    }

    #[test]
    fn slice_keeps_original_text() {
        with_parser("Foo( a,\n  b );", |p| {
            assert_eq!(p.slice(0, 7), "Foo( a,\n  b );");
            let raw = p.raw(0, 7);
            assert_eq!(raw.column, 0);
            assert!(raw.mentions("b"));
        });
    }
}
