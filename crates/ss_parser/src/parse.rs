use anyhow::Result;
use serde::Serialize;
use ss_ast::{CompilationUnit, SsSyntax};
use ss_lexer::Lexer;
use swc_common::{errors::Handler, sync::Lrc, BytePos, FileName, SourceMap, Span};

use crate::error::ParseError;
use crate::parser::Parser;

/// Result of parsing a sharpsugar source file.
pub struct ParseResult {
    pub unit: CompilationUnit,
    pub source_map: Lrc<SourceMap>,
    pub filename: String,
}

/// A resolved source position, 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Location {
    pub file: String,
    pub line: usize,
    pub column: usize,
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

impl ParseResult {
    pub fn locate(&self, span: Span) -> Location {
        locate(&self.source_map, &self.filename, span)
    }
}

fn locate(source_map: &SourceMap, filename: &str, span: Span) -> Location {
    if span.lo == BytePos(0) && span.hi == BytePos(0) {
        return Location {
            file: filename.to_string(),
            line: 0,
            column: 0,
        };
    }
    let loc = source_map.lookup_char_pos(span.lo);
    Location {
        file: filename.to_string(),
        line: loc.line,
        column: loc.col.0 + 1,
    }
}

/// Parse a source string with sharpsugar extensions.
///
/// The source is registered in a fresh `SourceMap` so spans in the tree (and
/// in diagnostics derived from it) can be resolved later. A syntax error is
/// rendered to stderr against that map and returned as an error.
pub fn parse_sharpsugar(source: &str, filename: &str, syntax: &SsSyntax) -> Result<ParseResult> {
    let source_map: Lrc<SourceMap> = Default::default();
    let source_file = source_map.new_source_file(
        Lrc::new(FileName::Custom(filename.to_string())),
        source.to_string(),
    );

    let unit = parse_unit(source, source_file.start_pos, syntax).map_err(|err| {
        let handler =
            Handler::with_emitter_writer(Box::new(std::io::stderr()), Some(source_map.clone()));
        handler.struct_span_err(err.span(), &err.to_string()).emit();
        let at = locate(&source_map, filename, err.span());
        anyhow::anyhow!("failed to parse {at}: {err}")
    })?;

    Ok(ParseResult {
        unit,
        source_map,
        filename: filename.to_string(),
    })
}

/// Parse without a source map. `base` is the position of the first byte of
/// `source`; spans in the tree are offset by it.
pub fn parse_unit(
    source: &str,
    base: BytePos,
    syntax: &SsSyntax,
) -> Result<CompilationUnit, ParseError> {
    let tokens = Lexer::tokenize(source, base)?;
    Parser::new(tokens, source, base, syntax).parse_compilation_unit()
}
