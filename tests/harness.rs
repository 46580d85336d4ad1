//! Golden-file test harness for sharpsugar.
//!
//! Discovers `.input.cs` files under `tests/fixtures/`, runs the pipeline
//! (parse → desugar → emit), and compares the output against the matching
//! `.expected.cs` file. When a `.diagnostics` file sits next to the input,
//! the diagnostics (`CODE severity Declaration`, one per line) are compared
//! too. An `options.json` in a fixture directory holds `DesugarOptions` for
//! every input in it.
//!
//! Set `SS_UPDATE_FIXTURES=1` to overwrite expected files with actual output.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ss_ast::Diagnostic;
use ss_codegen::{emit_unit, EmitConfig};
use ss_desugar::{desugar_unit, DesugarOptions};
use ss_parser::parse_sharpsugar;

fn fixtures_dir() -> PathBuf {
    // CARGO_MANIFEST_DIR is crates/ss_test/, so go up two levels to workspace root.
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("tests")
        .join("fixtures")
}

fn collect_input_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = walkdir(dir)
        .into_iter()
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.ends_with(".input.cs"))
        })
        .collect();
    files.sort();
    files
}

fn walkdir(dir: &Path) -> Vec<PathBuf> {
    let mut result = Vec::new();
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                result.extend(walkdir(&path));
            } else {
                result.push(path);
            }
        }
    }
    result
}

fn sibling(input: &Path, suffix: &str) -> PathBuf {
    PathBuf::from(input.to_string_lossy().replace(".input.cs", suffix))
}

fn options_for(input: &Path) -> Result<DesugarOptions> {
    let path = input.with_file_name("options.json");
    if !path.exists() {
        return Ok(DesugarOptions::default());
    }
    let text = std::fs::read_to_string(&path)?;
    serde_json::from_str(&text).with_context(|| format!("invalid {}", path.display()))
}

struct Output {
    text: String,
    diagnostics: Vec<Diagnostic>,
}

fn run_pipeline(source: &str, filename: &str, options: &DesugarOptions) -> Result<Output> {
    let parsed = parse_sharpsugar(source, filename, &options.syntax)?;
    let desugared = desugar_unit(&parsed.unit, options);
    let text = emit_unit(&desugared.unit, &EmitConfig::default())?;
    Ok(Output {
        text,
        diagnostics: desugared.diagnostics,
    })
}

fn diagnostic_lines(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(|d| {
            format!(
                "{} {} {}\n",
                d.code,
                d.severity,
                d.declaration.as_deref().unwrap_or("-")
            )
        })
        .collect()
}

#[test]
fn golden_file_tests() {
    let fixtures = fixtures_dir();
    let input_files = collect_input_files(&fixtures);

    assert!(
        !input_files.is_empty(),
        "No test fixtures found in {}",
        fixtures.display()
    );

    let update_mode = std::env::var("SS_UPDATE_FIXTURES").is_ok();
    let mut failures = Vec::new();

    for input_path in &input_files {
        let expected_path = sibling(input_path, ".expected.cs");
        let diagnostics_path = sibling(input_path, ".diagnostics");
        let test_name = input_path
            .strip_prefix(&fixtures)
            .unwrap()
            .display()
            .to_string();

        let result = std::fs::read_to_string(input_path)
            .context("failed to read input")
            .and_then(|source| {
                let options = options_for(input_path)?;
                run_pipeline(&source, &input_path.display().to_string(), &options)
            });
        let actual = match result {
            Ok(output) => output,
            Err(e) => {
                failures.push(format!("{test_name}: pipeline failed: {e:#}"));
                continue;
            }
        };
        let actual_diagnostics = diagnostic_lines(&actual.diagnostics);

        if update_mode {
            if let Err(e) = std::fs::write(&expected_path, &actual.text) {
                failures.push(format!("{test_name}: failed to write expected: {e}"));
            }
            if !actual.diagnostics.is_empty() || diagnostics_path.exists() {
                if let Err(e) = std::fs::write(&diagnostics_path, &actual_diagnostics) {
                    failures.push(format!("{test_name}: failed to write diagnostics: {e}"));
                }
            }
            continue;
        }

        let expected = match std::fs::read_to_string(&expected_path) {
            Ok(s) => s,
            Err(e) => {
                failures.push(format!(
                    "{test_name}: missing expected file {}: {e}",
                    expected_path.display()
                ));
                continue;
            }
        };
        if actual.text.trim() != expected.trim() {
            failures.push(format!(
                "{test_name}: output mismatch\n--- expected ---\n{}\n--- actual ---\n{}",
                expected.trim(),
                actual.text.trim()
            ));
        }

        let expected_diagnostics = std::fs::read_to_string(&diagnostics_path).unwrap_or_default();
        if actual_diagnostics.trim() != expected_diagnostics.trim() {
            failures.push(format!(
                "{test_name}: diagnostics mismatch\n--- expected ---\n{}\n--- actual ---\n{}",
                expected_diagnostics.trim(),
                actual_diagnostics.trim()
            ));
        }
    }

    if !failures.is_empty() {
        panic!(
            "\n{} golden test(s) failed:\n\n{}",
            failures.len(),
            failures.join("\n\n")
        );
    }
}

/// Every output without errors is baseline: desugaring it again finds no
/// features and reproduces it byte for byte.
#[test]
fn outputs_are_fixed_points() {
    let fixtures = fixtures_dir();
    let mut failures = Vec::new();

    for input_path in collect_input_files(&fixtures) {
        let test_name = input_path
            .strip_prefix(&fixtures)
            .unwrap()
            .display()
            .to_string();
        let options = match options_for(&input_path) {
            Ok(options) => options,
            Err(e) => {
                failures.push(format!("{test_name}: {e:#}"));
                continue;
            }
        };
        let source = std::fs::read_to_string(&input_path).unwrap();
        let first = match run_pipeline(&source, &test_name, &options) {
            Ok(output) => output,
            Err(e) => {
                failures.push(format!("{test_name}: pipeline failed: {e:#}"));
                continue;
            }
        };
        if first.diagnostics.iter().any(Diagnostic::is_error) {
            continue;
        }

        let output_name = format!("{test_name}.output");
        let parsed = match parse_sharpsugar(&first.text, &output_name, &options.syntax) {
            Ok(parsed) => parsed,
            Err(e) => {
                failures.push(format!("{test_name}: output does not parse: {e:#}"));
                continue;
            }
        };
        let again = desugar_unit(&parsed.unit, &options);
        if let Some(report) = again.reports.iter().find(|r| !r.features.is_empty()) {
            failures.push(format!(
                "{test_name}: output still uses {} in `{}`",
                report.features, report.name
            ));
            continue;
        }
        match emit_unit(&again.unit, &EmitConfig::default()) {
            Ok(second) if second == first.text => {}
            Ok(second) => failures.push(format!(
                "{test_name}: second pass changed the output\n--- first ---\n{}\n--- second ---\n{}",
                first.text, second
            )),
            Err(e) => failures.push(format!("{test_name}: second pass failed to emit: {e}")),
        }
    }

    if !failures.is_empty() {
        panic!(
            "\n{} fixed-point test(s) failed:\n\n{}",
            failures.len(),
            failures.join("\n\n")
        );
    }
}

/// Canonically formatted baseline sources come back unchanged.
#[test]
fn roundtrip_tests() {
    let fixtures = fixtures_dir().join("roundtrip");
    let input_files = collect_input_files(&fixtures);
    assert!(!input_files.is_empty(), "no roundtrip fixtures");

    let mut failures = Vec::new();
    for input_path in &input_files {
        let test_name = input_path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .to_string();
        let source = std::fs::read_to_string(input_path).unwrap();
        match run_pipeline(&source, &test_name, &DesugarOptions::default()) {
            Ok(output) if output.text.trim() == source.trim() => {}
            Ok(output) => failures.push(format!(
                "{test_name}: baseline source changed\n--- input ---\n{}\n--- output ---\n{}",
                source.trim(),
                output.text.trim()
            )),
            Err(e) => failures.push(format!("{test_name}: pipeline failed: {e:#}")),
        }
    }

    if !failures.is_empty() {
        panic!(
            "\n{} roundtrip test(s) failed:\n\n{}",
            failures.len(),
            failures.join("\n\n")
        );
    }
}
