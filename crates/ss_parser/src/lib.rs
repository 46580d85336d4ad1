//! C#-shaped parser with sharpsugar syntax extensions.
//!
//! Builds an [`ss_ast::CompilationUnit`] from source text. The extended
//! grammar adds, on top of ordinary class declarations:
//!
//! - `record class` / `data class` declarations with a primary parameter list
//! - loose statements at the top of a class body
//! - the `singleton` declaration modifier
//! - `[ThrowArgumentNullException]` and `name!!` on parameters
//!
//! Only what the desugarer needs is parsed structurally. Statements,
//! expressions, and members the tree does not model are kept as verbatim
//! [`ss_ast::RawText`], so unknown syntax passes through untouched.

mod error;
mod items;
mod members;
pub mod parse;
mod parser;
mod stmt;

pub use error::ParseError;
pub use parse::{parse_sharpsugar, parse_unit, Location, ParseResult};
