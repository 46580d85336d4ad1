use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use serde::Deserialize;
use ss_codegen::{EmitConfig, Newline};
use ss_desugar::{DesugarOptions, NullGuardStyle};

/// Contents of a `--config` file. Missing keys keep their defaults.
///
/// ```json
/// { "desugar": { "nullable_context": true, "syntax": { "singleton": false } },
///   "emit": { "indent_width": 2 } }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub desugar: DesugarOptions,
    pub emit: EmitConfig,
}

/// Command-line overrides, applied on top of the config file.
#[derive(Debug, Clone, Default, Args)]
pub struct ConfigFlags {
    /// JSON configuration file.
    #[arg(long, global = true)]
    pub config: Option<std::path::PathBuf>,
    /// Do not recognize capitalized parameters as property shorthand.
    #[arg(long, global = true)]
    pub no_shorthand: bool,
    /// Do not recognize loose statements as an unnamed initializer.
    #[arg(long, global = true)]
    pub no_initializer: bool,
    /// Do not recognize the `singleton` modifier.
    #[arg(long, global = true)]
    pub no_singleton: bool,
    /// Do not recognize null assertions.
    #[arg(long, global = true)]
    pub no_null_assertion: bool,
    /// Treat input as `#nullable enable`.
    #[arg(long, global = true)]
    pub nullable: bool,
    /// How null guards are written: `throw-if-null` or `if-throw`.
    #[arg(long, global = true)]
    pub null_guard: Option<NullGuardStyle>,
    /// Spaces per indentation level.
    #[arg(long, global = true)]
    pub indent_width: Option<usize>,
    /// Write `\r\n` line endings.
    #[arg(long, global = true)]
    pub crlf: bool,
}

impl Config {
    pub fn load(flags: &ConfigFlags) -> Result<Self> {
        let mut config = match &flags.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply(flags);
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("invalid config {}", path.display()))
    }

    fn apply(&mut self, flags: &ConfigFlags) {
        let syntax = &mut self.desugar.syntax;
        syntax.property_shorthand &= !flags.no_shorthand;
        syntax.unnamed_initializer &= !flags.no_initializer;
        syntax.singleton &= !flags.no_singleton;
        syntax.null_assertion &= !flags.no_null_assertion;
        self.desugar.nullable_context |= flags.nullable;
        if let Some(style) = flags.null_guard {
            self.desugar.null_guard = style;
        }
        if let Some(width) = flags.indent_width {
            self.emit.indent_width = width;
        }
        if flags.crlf {
            self.emit.newline = Newline::CrLf;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config: Config =
            serde_json::from_str(r#"{ "emit": { "newline": "crlf" } }"#).unwrap();
        assert_eq!(config.emit.newline, Newline::CrLf);
        assert_eq!(config.emit.indent_width, 4);
        assert_eq!(config.desugar, DesugarOptions::default());
    }

    #[test]
    fn flags_override_the_file() {
        let mut config: Config = serde_json::from_str(
            r#"{ "desugar": { "null_guard": "if-throw" }, "emit": { "indent_width": 2 } }"#,
        )
        .unwrap();
        config.apply(&ConfigFlags {
            no_singleton: true,
            nullable: true,
            null_guard: Some(NullGuardStyle::ThrowIfNull),
            ..ConfigFlags::default()
        });
        assert!(!config.desugar.syntax.singleton);
        assert!(config.desugar.syntax.property_shorthand);
        assert!(config.desugar.nullable_context);
        assert_eq!(config.desugar.null_guard, NullGuardStyle::ThrowIfNull);
        assert_eq!(config.emit.indent_width, 2);
    }

    #[test]
    fn unknown_file_is_an_error() {
        let flags = ConfigFlags {
            config: Some("does/not/exist.json".into()),
            ..ConfigFlags::default()
        };
        let err = Config::load(&flags).unwrap_err();
        assert!(err.to_string().starts_with("failed to read config"));
    }
}
