mod config;
mod report;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use ss_codegen::emit_unit;
use ss_desugar::desugar_unit;
use ss_parser::parse_sharpsugar;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::config::{Config, ConfigFlags};
use crate::report::DiagnosticFormat;

#[derive(Parser)]
#[command(name = "sharpsugar", about = "sharpsugar: C# with syntax extensions, desugared")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    #[command(flatten)]
    flags: ConfigFlags,
    /// Diagnostic output format.
    #[arg(long, value_enum, default_value_t, global = true)]
    diagnostics: DiagnosticFormat,
    /// More logging (`-v` debug, `-vv` trace). `SHARPSUGAR_LOG` takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse, desugar, and emit baseline C#.
    Desugar {
        /// Input files.
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        /// Output file (stdout if omitted). Only with a single input.
        #[arg(short, long, conflicts_with = "out_dir")]
        output: Option<PathBuf>,
        /// Write each output under this directory, keeping the file name.
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
    /// Report each declaration's extension features and any diagnostics.
    Check {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },
    /// Parse and dump the tree.
    Parse {
        input: PathBuf,
        /// Dump as JSON instead of Debug output.
        #[arg(long)]
        ast: bool,
    },
}

/// What one worker produced for one input file.
struct FileOutcome {
    path: PathBuf,
    /// Emitted source, or the `check` report.
    text: String,
    diagnostics: String,
    has_errors: bool,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = Config::load(&cli.flags)?;

    match cli.command {
        Commands::Desugar {
            inputs,
            output,
            out_dir,
        } => {
            if output.is_some() && inputs.len() > 1 {
                bail!("--output takes a single input; use --out-dir for several");
            }
            let outcomes = run_parallel(&inputs, |path| {
                desugar_file(path, &config, cli.diagnostics)
            });

            let mut failed = false;
            for outcome in outcomes {
                let Some(outcome) = reported(outcome) else {
                    failed = true;
                    continue;
                };
                eprint!("{}", outcome.diagnostics);
                failed |= outcome.has_errors;
                match (&output, &out_dir) {
                    (Some(path), _) => write_output(path, &outcome.text)?,
                    (None, Some(dir)) => {
                        let name = outcome
                            .path
                            .file_name()
                            .with_context(|| format!("{} has no file name", outcome.path.display()))?;
                        write_output(&dir.join(name), &outcome.text)?;
                    }
                    (None, None) => print!("{}", outcome.text),
                }
            }
            Ok(exit_code(failed))
        }
        Commands::Check { inputs } => {
            let outcomes = run_parallel(&inputs, |path| {
                check_file(path, &config, cli.diagnostics)
            });
            let mut failed = false;
            for outcome in outcomes {
                let Some(outcome) = reported(outcome) else {
                    failed = true;
                    continue;
                };
                eprint!("{}", outcome.diagnostics);
                print!("{}", outcome.text);
                failed |= outcome.has_errors;
            }
            Ok(exit_code(failed))
        }
        Commands::Parse { input, ast } => {
            let (source, filename) = read_input(&input)?;
            let parsed = parse_sharpsugar(&source, &filename, &config.desugar.syntax)?;
            if ast {
                let json = serde_json::to_string_pretty(&parsed.unit)?;
                println!("{json}");
            } else {
                println!("{:#?}", parsed.unit);
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env("SHARPSUGAR_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Run `work` on every input, one scoped thread per file. Results come back
/// in input order; a file that fails does not stop the others.
fn run_parallel<F>(inputs: &[PathBuf], work: F) -> Vec<Result<FileOutcome>>
where
    F: Fn(&Path) -> Result<FileOutcome> + Sync,
{
    let work = &work;
    std::thread::scope(|scope| {
        let handles: Vec<_> = inputs
            .iter()
            .map(|path| scope.spawn(move || work(path.as_path())))
            .collect();
        handles
            .into_iter()
            .map(|handle| match handle.join() {
                Ok(result) => result,
                Err(_) => bail!("worker thread panicked"),
            })
            .collect()
    })
}

/// Print a failed file's error and drop it.
fn reported(outcome: Result<FileOutcome>) -> Option<FileOutcome> {
    match outcome {
        Ok(outcome) => Some(outcome),
        Err(err) => {
            eprintln!("error: {err:#}");
            None
        }
    }
}

fn read_input(path: &Path) -> Result<(String, String)> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok((source, path.display().to_string()))
}

fn write_output(path: &Path, text: &str) -> Result<()> {
    std::fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))
}

fn desugar_file(path: &Path, config: &Config, format: DiagnosticFormat) -> Result<FileOutcome> {
    let (source, filename) = read_input(path)?;
    let parsed = parse_sharpsugar(&source, &filename, &config.desugar.syntax)?;
    let desugared = desugar_unit(&parsed.unit, &config.desugar);
    let rewritten = desugared.reports.iter().filter(|r| r.rewritten).count();
    info!(
        file = %filename,
        declarations = desugared.reports.len(),
        rewritten,
        "desugared"
    );
    let text = emit_unit(&desugared.unit, &config.emit)
        .with_context(|| format!("failed to emit {filename}"))?;
    Ok(FileOutcome {
        path: path.to_path_buf(),
        text,
        diagnostics: report::render(&parsed, &desugared.diagnostics, format)
            .context("failed to serialize diagnostics")?,
        has_errors: desugared.has_errors(),
    })
}

fn check_file(path: &Path, config: &Config, format: DiagnosticFormat) -> Result<FileOutcome> {
    let (source, filename) = read_input(path)?;
    let parsed = parse_sharpsugar(&source, &filename, &config.desugar.syntax)?;
    let desugared = desugar_unit(&parsed.unit, &config.desugar);

    let text = match format {
        DiagnosticFormat::Json => {
            let mut text = String::new();
            for report in &desugared.reports {
                let location = parsed.locate(report.span);
                let line = serde_json::json!({
                    "file": location.file,
                    "line": location.line,
                    "declaration": report,
                });
                text.push_str(&line.to_string());
                text.push('\n');
            }
            text
        }
        DiagnosticFormat::Human => {
            let mut text = String::new();
            for report in &desugared.reports {
                let location = parsed.locate(report.span);
                let features = if report.features.is_empty() {
                    "baseline".to_string()
                } else {
                    report.features.to_string()
                };
                let status = if report.rewritten { "" } else { " (left unchanged)" };
                text.push_str(&format!("{location}: {}: {features}{status}\n", report.name));
            }
            text
        }
    };
    debug!(file = %filename, "checked");

    Ok(FileOutcome {
        path: path.to_path_buf(),
        text,
        diagnostics: report::render(&parsed, &desugared.diagnostics, format)
            .context("failed to serialize diagnostics")?,
        has_errors: desugared.has_errors(),
    })
}

fn exit_code(failed: bool) -> ExitCode {
    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
