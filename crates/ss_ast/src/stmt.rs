//! Statements inside constructor and method bodies.

use serde::Serialize;

use crate::RawText;

/// A statement in a baseline body.
///
/// Source statements are kept verbatim. The structured variants are what the
/// desugarer synthesizes; each is an ordinary baseline construct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Statement {
    /// A statement as written, including its terminator.
    Source(RawText),
    /// A line or block comment (or preprocessor directive) on its own line.
    Comment(RawText),
    /// `target = value;`
    Assign { target: String, value: String },
    /// `callee(args);`
    Call { callee: String, args: Vec<String> },
    /// `if (condition) throw new exception(args);`
    ThrowIf {
        condition: String,
        exception: String,
        args: Vec<String>,
    },
    /// `return expr;`
    Return(RawText),
    /// `expr;`
    Expr(RawText),
}

impl Statement {
    pub fn is_comment(&self) -> bool {
        matches!(self, Statement::Comment(_))
    }
}

/// A `{ ... }` body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Block {
    pub stmts: Vec<Statement>,
}

impl Block {
    pub fn new(stmts: Vec<Statement>) -> Self {
        Self { stmts }
    }

    /// Statements that are not comments.
    pub fn code(&self) -> impl Iterator<Item = &Statement> {
        self.stmts.iter().filter(|stmt| !stmt.is_comment())
    }
}
