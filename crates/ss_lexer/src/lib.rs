//! Lexer for sharpsugar's C#-shaped grammar.
//!
//! Produces a flat token stream for the parser. Comments and preprocessor
//! directives are not tokens; they ride along as [`Trivia`] on the token that
//! follows them, so the parser can decide where they belong.
//!
//! Every token records its swc_common [`Span`] (offset by the source file's
//! start position in the `SourceMap`) plus the 1-based line and the visual
//! column it starts at. Tabs count as four columns.

use swc_common::{BytePos, Span};
use thiserror::Error;

/// Multi-character punctuators, longest first. `>`-led operators are left out
/// on purpose so that `List<List<int>>` closes with two `>` tokens.
const PUNCTS: &[&str] = &[
    "??=", "=>", "==", "!=", "<=", "&&", "||", "??", "?.", "++", "--", "+=", "-=", "*=", "/=",
    "%=", "&=", "|=", "^=", "::", "->", "(", ")", "[", "]", "{", "}", ";", ",", ".", ":", "?",
    "=", "<", ">", "+", "-", "*", "/", "%", "!", "~", "&", "|", "^",
];

const TAB_WIDTH: u32 = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// Identifier or keyword, including a leading `@` when verbatim.
    Ident(String),
    Number(String),
    /// String literal of any flavour, quotes and prefixes included.
    Str(String),
    Char(String),
    Punct(&'static str),
    Eof,
}

/// A comment or preprocessor directive preceding a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trivia {
    pub text: String,
    pub span: Span,
    pub column: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    pub line: u32,
    pub column: u32,
    pub leading: Vec<Trivia>,
}

impl Token {
    pub fn is_punct(&self, punct: &str) -> bool {
        matches!(self.kind, TokenKind::Punct(p) if p == punct)
    }

    pub fn is_ident(&self, word: &str) -> bool {
        matches!(&self.kind, TokenKind::Ident(w) if w == word)
    }

    pub fn ident(&self) -> Option<&str> {
        match &self.kind {
            TokenKind::Ident(w) => Some(w),
            _ => None,
        }
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }

    /// Whether this token can be separated from a neighbouring word by a space
    /// only (identifiers, literals).
    pub fn is_word(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Ident(_) | TokenKind::Number(_) | TokenKind::Str(_) | TokenKind::Char(_)
        )
    }

    /// Source text of the token.
    pub fn text(&self) -> &str {
        match &self.kind {
            TokenKind::Ident(s) | TokenKind::Number(s) | TokenKind::Str(s) | TokenKind::Char(s) => {
                s
            }
            TokenKind::Punct(p) => p,
            TokenKind::Eof => "",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    #[error("unterminated {what} starting at line {line}")]
    Unterminated {
        what: &'static str,
        span: Span,
        line: u32,
    },
    #[error("unexpected character `{ch}` at line {line}")]
    UnexpectedChar { ch: char, span: Span, line: u32 },
}

impl LexError {
    pub fn span(&self) -> Span {
        match self {
            LexError::Unterminated { span, .. } | LexError::UnexpectedChar { span, .. } => *span,
        }
    }
}

/// Lexer over one source file.
pub struct Lexer<'src> {
    source: &'src str,
    /// Position of byte 0 of `source` in the source map.
    base: BytePos,
    pos: usize,
    line: u32,
    column: u32,
    /// Only whitespace seen since the last newline (directives must start a line).
    at_line_start: bool,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str, base: BytePos) -> Self {
        Self {
            source,
            base,
            pos: 0,
            line: 1,
            column: 0,
            at_line_start: true,
        }
    }

    /// Tokenize the whole source. The last token is always [`TokenKind::Eof`],
    /// carrying any trailing trivia.
    pub fn tokenize(source: &'src str, base: BytePos) -> Result<Vec<Token>, LexError> {
        let mut lexer = Lexer::new(source, base);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token()?;
            let is_eof = token.is_eof();
            tokens.push(token);
            if is_eof {
                return Ok(tokens);
            }
        }
    }

    pub fn next_token(&mut self) -> Result<Token, LexError> {
        let leading = self.skip_trivia()?;

        let start = self.pos;
        let line = self.line;
        let column = self.column;
        self.at_line_start = false;

        let Some(c) = self.peek() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                span: self.span(start, start),
                line,
                column,
                leading,
            });
        };

        let kind = if is_string_start(self.rest()) {
            TokenKind::Str(self.scan_string(start, line)?)
        } else if c == '\'' {
            TokenKind::Char(self.scan_char(start, line)?)
        } else if c.is_ascii_digit()
            || (c == '.' && self.peek_nth(1).is_some_and(|n| n.is_ascii_digit()))
        {
            TokenKind::Number(self.scan_number())
        } else if is_ident_start(c)
            || (c == '@' && self.peek_nth(1).is_some_and(is_ident_start))
        {
            TokenKind::Ident(self.scan_ident())
        } else if let Some(punct) = PUNCTS.iter().find(|p| self.rest().starts_with(**p)) {
            for _ in 0..punct.len() {
                self.bump();
            }
            TokenKind::Punct(*punct)
        } else {
            self.bump();
            return Err(LexError::UnexpectedChar {
                ch: c,
                span: self.span(start, self.pos),
                line,
            });
        };

        Ok(Token {
            kind,
            span: self.span(start, self.pos),
            line,
            column,
            leading,
        })
    }

    fn rest(&self) -> &'src str {
        &self.source[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        match c {
            '\n' => {
                self.line += 1;
                self.column = 0;
                self.at_line_start = true;
            }
            '\t' => self.column += TAB_WIDTH,
            _ => self.column += 1,
        }
        Some(c)
    }

    fn span(&self, start: usize, end: usize) -> Span {
        Span::new(
            self.base + BytePos(start as u32),
            self.base + BytePos(end as u32),
        )
    }

    fn skip_trivia(&mut self) -> Result<Vec<Trivia>, LexError> {
        let mut trivia = Vec::new();
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('/') if self.peek_nth(1) == Some('/') => {
                    trivia.push(self.take_line_trivia());
                }
                Some('#') if self.at_line_start => {
                    trivia.push(self.take_line_trivia());
                }
                Some('/') if self.peek_nth(1) == Some('*') => {
                    let start = self.pos;
                    let line = self.line;
                    let column = self.column;
                    self.bump();
                    self.bump();
                    loop {
                        if self.rest().starts_with("*/") {
                            self.bump();
                            self.bump();
                            break;
                        }
                        if self.bump().is_none() {
                            return Err(LexError::Unterminated {
                                what: "block comment",
                                span: self.span(start, self.pos),
                                line,
                            });
                        }
                    }
                    trivia.push(Trivia {
                        text: self.source[start..self.pos].to_string(),
                        span: self.span(start, self.pos),
                        column,
                    });
                }
                _ => return Ok(trivia),
            }
        }
    }

    /// `// ...` or `#directive ...` up to (not including) the newline.
    fn take_line_trivia(&mut self) -> Trivia {
        let start = self.pos;
        let column = self.column;
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.bump();
        }
        let text = self.source[start..self.pos].trim_end().to_string();
        Trivia {
            text,
            span: self.span(start, self.pos),
            column,
        }
    }

    fn scan_ident(&mut self) -> String {
        let start = self.pos;
        if self.peek() == Some('@') {
            self.bump();
        }
        while self.peek().is_some_and(is_ident_continue) {
            self.bump();
        }
        self.source[start..self.pos].to_string()
    }

    fn scan_number(&mut self) -> String {
        let start = self.pos;
        while let Some(c) = self.peek() {
            let continues = c.is_ascii_alphanumeric()
                || c == '_'
                || (c == '.' && self.peek_nth(1).is_some_and(|n| n.is_ascii_digit()));
            if !continues {
                break;
            }
            self.bump();
        }
        self.source[start..self.pos].to_string()
    }

    fn scan_char(&mut self, start: usize, line: u32) -> Result<String, LexError> {
        self.bump();
        loop {
            match self.bump() {
                Some('\\') => {
                    self.bump();
                }
                Some('\'') => break,
                Some('\n') | None => {
                    return Err(LexError::Unterminated {
                        what: "character literal",
                        span: self.span(start, self.pos),
                        line,
                    })
                }
                Some(_) => {}
            }
        }
        Ok(self.source[start..self.pos].to_string())
    }

    /// Any of `"..."`, `@"..."`, `$"..."`, `$@"..."`, `@$"..."`, `"""..."""`
    /// and `$$"""..."""`.
    fn scan_string(&mut self, start: usize, line: u32) -> Result<String, LexError> {
        let mut verbatim = false;
        let mut interpolated = false;
        while let Some(c) = self.peek() {
            match c {
                '@' => verbatim = true,
                '$' => interpolated = true,
                _ => break,
            }
            self.bump();
        }

        let quotes = self.rest().chars().take_while(|&c| c == '"').count();
        let unterminated = |lexer: &Self| LexError::Unterminated {
            what: "string literal",
            span: lexer.span(start, lexer.pos),
            line,
        };

        if quotes >= 3 {
            let fence = "\"".repeat(quotes);
            for _ in 0..quotes {
                self.bump();
            }
            loop {
                if self.rest().starts_with(&fence) {
                    for _ in 0..quotes {
                        self.bump();
                    }
                    break;
                }
                if self.bump().is_none() {
                    return Err(unterminated(&*self));
                }
            }
            return Ok(self.source[start..self.pos].to_string());
        }

        self.bump();
        loop {
            match self.peek() {
                None => return Err(unterminated(&*self)),
                Some('\n') if !verbatim => return Err(unterminated(&*self)),
                Some('\\') if !verbatim => {
                    self.bump();
                    self.bump();
                }
                Some('"') => {
                    self.bump();
                    if verbatim && self.peek() == Some('"') {
                        self.bump();
                        continue;
                    }
                    break;
                }
                Some('{') if interpolated => {
                    self.bump();
                    if self.peek() == Some('{') {
                        self.bump();
                        continue;
                    }
                    self.skip_interpolation(start, line)?;
                }
                Some(_) => {
                    self.bump();
                }
            }
        }
        Ok(self.source[start..self.pos].to_string())
    }

    /// Skip the code inside `{...}` of an interpolated string, stepping over
    /// nested strings so their braces and quotes do not count.
    fn skip_interpolation(&mut self, start: usize, line: u32) -> Result<(), LexError> {
        let mut depth = 1usize;
        while depth > 0 {
            if is_string_start(self.rest()) {
                let nested = self.pos;
                self.scan_string(nested, self.line)?;
                continue;
            }
            match self.bump() {
                Some('{') => depth += 1,
                Some('}') => depth -= 1,
                Some('\'') => {
                    let nested = self.pos - 1;
                    self.pos = nested;
                    self.column = self.column.saturating_sub(1);
                    self.scan_char(nested, self.line)?;
                }
                Some(_) => {}
                None => {
                    return Err(LexError::Unterminated {
                        what: "string interpolation",
                        span: self.span(start, self.pos),
                        line,
                    })
                }
            }
        }
        Ok(())
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn is_string_start(rest: &str) -> bool {
    let prefix_len = rest
        .chars()
        .take(3)
        .take_while(|&c| c == '@' || c == '$')
        .count();
    let after = &rest[prefix_len..];
    // `$$$"""` raw interpolations can carry more dollars than the take(3) window.
    let after = after.trim_start_matches('$');
    after.starts_with('"')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::tokenize(source, BytePos(1))
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn lexes_declaration_header() {
        assert_eq!(
            kinds("public record class A(string B) : public()"),
            vec![
                TokenKind::Ident("public".into()),
                TokenKind::Ident("record".into()),
                TokenKind::Ident("class".into()),
                TokenKind::Ident("A".into()),
                TokenKind::Punct("("),
                TokenKind::Ident("string".into()),
                TokenKind::Ident("B".into()),
                TokenKind::Punct(")"),
                TokenKind::Punct(":"),
                TokenKind::Ident("public".into()),
                TokenKind::Punct("("),
                TokenKind::Punct(")"),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn nested_generics_close_with_separate_tokens() {
        let ks = kinds("List<List<int>>");
        assert_eq!(ks[5], TokenKind::Punct(">"));
        assert_eq!(ks[6], TokenKind::Punct(">"));
    }

    #[test]
    fn comments_attach_to_next_token() {
        let tokens = Lexer::tokenize("// lead\n/* block */ x // tail\n", BytePos(1)).unwrap();
        assert_eq!(tokens[0].leading.len(), 2);
        assert_eq!(tokens[0].leading[0].text, "// lead");
        assert_eq!(tokens[0].leading[1].text, "/* block */");
        assert!(tokens[1].is_eof());
        assert_eq!(tokens[1].leading[0].text, "// tail");
    }

    #[test]
    fn strings_keep_their_braces_and_quotes() {
        let ks = kinds(r#"$"a {b("}")} c" @"x""y" "\"q""#);
        assert_eq!(ks[0], TokenKind::Str(r#"$"a {b("}")} c""#.into()));
        assert_eq!(ks[1], TokenKind::Str(r#"@"x""y""#.into()));
        assert_eq!(ks[2], TokenKind::Str(r#""\"q""#.into()));
    }

    #[test]
    fn raw_string_literal() {
        let ks = kinds("\"\"\"\n  say \"hi\"\n  \"\"\";");
        assert!(matches!(&ks[0], TokenKind::Str(s) if s.ends_with("\"\"\"")));
        assert_eq!(ks[1], TokenKind::Punct(";"));
    }

    #[test]
    fn directives_only_at_line_start() {
        let tokens = Lexer::tokenize("#nullable enable\nclass", BytePos(1)).unwrap();
        assert_eq!(tokens[0].leading[0].text, "#nullable enable");
        assert!(tokens[0].is_ident("class"));
    }

    #[test]
    fn columns_and_lines() {
        let tokens = Lexer::tokenize("a\n\tb", BytePos(1)).unwrap();
        assert_eq!((tokens[0].line, tokens[0].column), (1, 0));
        assert_eq!((tokens[1].line, tokens[1].column), (2, 4));
        assert_eq!(tokens[1].span.lo, BytePos(4));
    }

    #[test]
    fn verbatim_identifier() {
        assert_eq!(kinds("@class")[0], TokenKind::Ident("@class".into()));
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let err = Lexer::tokenize("\"abc\nd", BytePos(1)).unwrap_err();
        assert!(matches!(err, LexError::Unterminated { what: "string literal", .. }));
    }
}
