//! Canonical emitter for baseline C# trees.
//!
//! Layout is fixed: Allman braces, `indent_width` spaces per level, one blank
//! line between members and between top-level items (consecutive usings stay
//! together, and a comment stays attached to what follows it). Verbatim text
//! is re-indented relative to the column it started at in the source.
//!
//! The emitter knows nothing about extensions. A tree that still carries
//! extension syntax is refused with [`EmitError::ExtensionSyntax`].

mod emit;
pub mod text_writer;

use serde::{Deserialize, Serialize};
use ss_ast::{CompilationUnit, Declaration};
use thiserror::Error;

use crate::emit::Emitter;
use crate::text_writer::TextWriter;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Newline {
    #[default]
    Lf,
    CrLf,
}

impl Newline {
    pub fn as_str(self) -> &'static str {
        match self {
            Newline::Lf => "\n",
            Newline::CrLf => "\r\n",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitConfig {
    pub indent_width: usize,
    pub newline: Newline,
}

impl Default for EmitConfig {
    fn default() -> Self {
        Self {
            indent_width: 4,
            newline: Newline::Lf,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmitError {
    #[error("declaration `{declaration}` still uses {construct}; desugar it before emitting")]
    ExtensionSyntax {
        declaration: String,
        construct: &'static str,
    },
}

/// Serialize a compilation unit. Same tree, same bytes.
pub fn emit_unit(unit: &CompilationUnit, config: &EmitConfig) -> Result<String, EmitError> {
    let mut emitter = Emitter::new(TextWriter::new(config));
    emitter.emit_items(&unit.items)?;
    Ok(emitter.finish())
}

/// Serialize one declaration at the outermost indentation level.
pub fn emit_declaration(decl: &Declaration, config: &EmitConfig) -> Result<String, EmitError> {
    let mut emitter = Emitter::new(TextWriter::new(config));
    emitter.emit_declaration(decl)?;
    Ok(emitter.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emit_config_from_partial_json() {
        let config: EmitConfig = serde_json::from_str(r#"{ "newline": "crlf" }"#).unwrap();
        assert_eq!(config.newline, Newline::CrLf);
        assert_eq!(config.indent_width, 4);
    }
}
