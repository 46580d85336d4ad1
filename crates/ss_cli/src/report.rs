//! Diagnostic output, as span-annotated snippets or as JSON lines.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use clap::ValueEnum;
use serde::Serialize;
use ss_ast::{Diagnostic, Severity};
use ss_parser::{Location, ParseResult};
use swc_common::errors::Handler;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum DiagnosticFormat {
    #[default]
    Human,
    Json,
}

#[derive(Serialize)]
struct JsonDiagnostic<'a> {
    #[serde(flatten)]
    location: Location,
    severity: Severity,
    code: &'static str,
    message: &'a str,
    declaration: Option<&'a str>,
}

/// Render `diagnostics` for one parsed file into a string, so that files
/// processed in parallel do not interleave on stderr.
pub fn render(
    parsed: &ParseResult,
    diagnostics: &[Diagnostic],
    format: DiagnosticFormat,
) -> serde_json::Result<String> {
    match format {
        DiagnosticFormat::Human => Ok(render_human(parsed, diagnostics)),
        DiagnosticFormat::Json => render_json(parsed, diagnostics),
    }
}

fn render_human(parsed: &ParseResult, diagnostics: &[Diagnostic]) -> String {
    let captured = Captured::default();
    let handler =
        Handler::with_emitter_writer(Box::new(captured.clone()), Some(parsed.source_map.clone()));
    for diagnostic in diagnostics {
        let message = format!("[{}] {}", diagnostic.code, diagnostic.message);
        let mut builder = match diagnostic.severity {
            Severity::Error => handler.struct_span_err(diagnostic.span, &message),
            Severity::Warning => handler.struct_span_warn(diagnostic.span, &message),
        };
        if let Some(name) = &diagnostic.declaration {
            builder.note(&format!("in declaration `{name}`"));
        }
        builder.emit();
    }
    drop(handler);
    captured.into_string()
}

fn render_json(parsed: &ParseResult, diagnostics: &[Diagnostic]) -> serde_json::Result<String> {
    let mut out = String::new();
    for diagnostic in diagnostics {
        let record = JsonDiagnostic {
            location: parsed.locate(diagnostic.span),
            severity: diagnostic.severity,
            code: diagnostic.code.as_str(),
            message: &diagnostic.message,
            declaration: diagnostic.declaration.as_deref(),
        };
        out.push_str(&serde_json::to_string(&record)?);
        out.push('\n');
    }
    Ok(out)
}

/// A `Write` sink the diagnostic handler can own while we keep a handle.
#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    fn into_string(self) -> String {
        let bytes = match self.0.lock() {
            Ok(buf) => buf.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut inner = self
            .0
            .lock()
            .map_err(|_| io::Error::other("diagnostic buffer poisoned"))?;
        inner.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ss_ast::{DiagnosticCode, SsSyntax};
    use ss_parser::parse_sharpsugar;

    fn parsed() -> ParseResult {
        parse_sharpsugar("class A\n{\n    Run();\n}\n", "a.cs", &SsSyntax::default()).unwrap()
    }

    fn lint(parsed: &ParseResult) -> Diagnostic {
        let decl = parsed.unit.declarations()[0];
        let ss_ast::BodyItem::Statement(stmt) = &decl.body[0] else {
            panic!("expected a loose statement");
        };
        Diagnostic::new(DiagnosticCode::MisplacedInitializer, stmt.span, "late statement")
            .in_declaration("A")
    }

    #[test]
    fn json_lines_carry_location_and_code() {
        let parsed = parsed();
        let out = render(&parsed, &[lint(&parsed)], DiagnosticFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(out.trim()).unwrap();
        assert_eq!(value["file"], "a.cs");
        assert_eq!(value["line"], 3);
        assert_eq!(value["column"], 5);
        assert_eq!(value["severity"], "warning");
        assert_eq!(value["code"], "SS0001");
        assert_eq!(value["declaration"], "A");
    }

    #[test]
    fn json_has_one_line_per_diagnostic() {
        let parsed = parsed();
        let diagnostics = [lint(&parsed), lint(&parsed).in_declaration("B")];
        let out = render(&parsed, &diagnostics, DiagnosticFormat::Json).unwrap();
        let declarations: Vec<String> = out
            .lines()
            .map(|line| {
                let value: serde_json::Value = serde_json::from_str(line).unwrap();
                value["declaration"].as_str().unwrap_or_default().to_string()
            })
            .collect();
        assert_eq!(declarations, vec!["A", "B"]);
    }

    #[test]
    fn human_output_names_code_and_declaration() {
        let parsed = parsed();
        let out = render(&parsed, &[lint(&parsed)], DiagnosticFormat::Human).unwrap();
        assert!(out.contains("[SS0001] late statement"), "{out}");
        assert!(out.contains("in declaration `A`"), "{out}");
    }
}
