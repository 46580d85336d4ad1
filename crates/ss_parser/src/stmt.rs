//! Statements are kept verbatim; the parser only finds where each one ends.

use ss_ast::{Block, RawText, Statement};

use crate::error::ParseError;
use crate::parser::{is_close, is_open, Parser};

impl Parser<'_> {
    /// One statement starting at the cursor, returned as its exact source
    /// text. Compound statements (`if`/`else`, `try`/`catch`, `do`/`while`)
    /// are taken whole.
    pub(crate) fn parse_statement(&mut self) -> Result<RawText, ParseError> {
        let start = self.pos;
        let mut do_pending = self.tok(start).is_ident("do");
        let mut depth = 0usize;
        let mut i = start;

        loop {
            let tok = self.tok(i);
            if tok.is_eof() {
                return Err(ParseError::syntax("unterminated statement", tok.span));
            }

            let ended = if is_open(tok) {
                depth += 1;
                false
            } else if is_close(tok) {
                if depth == 0 {
                    return Err(ParseError::syntax(
                        format!("unexpected `{}`", tok.text()),
                        tok.span,
                    ));
                }
                depth -= 1;
                // `new Foo { }.Bar()`, `x => { };` and friends go on.
                depth == 0 && tok.is_punct("}") && {
                    let next = self.tok(i + 1);
                    next.is_word() || next.is_punct("{") || next.is_punct("}") || next.is_punct("[")
                        || next.is_eof()
                }
            } else {
                depth == 0 && tok.is_punct(";")
            };
            i += 1;

            if ended {
                let next = self.tok(i);
                if next.is_ident("else") || next.is_ident("catch") || next.is_ident("finally") {
                    continue;
                }
                if do_pending && next.is_ident("while") {
                    do_pending = false;
                    continue;
                }
                break;
            }
        }

        self.pos = i;
        Ok(self.raw(start, i))
    }

    /// `{` statements `}`. Comments between statements are kept in place.
    pub(crate) fn parse_block(&mut self) -> Result<Block, ParseError> {
        let mut stmts: Vec<Statement> = self
            .take_comments()
            .into_iter()
            .map(Statement::Comment)
            .collect();
        self.expect_punct("{")?;
        loop {
            stmts.extend(self.take_comments().into_iter().map(Statement::Comment));
            if self.eat_punct("}") {
                return Ok(Block::new(stmts));
            }
            if self.peek().is_eof() {
                return Err(self.unexpected("`}`"));
            }
            if self.eat_punct(";") {
                continue;
            }
            stmts.push(Statement::Source(self.parse_statement()?));
        }
    }
}
