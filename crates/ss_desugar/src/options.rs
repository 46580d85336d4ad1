use serde::{Deserialize, Serialize};
use ss_ast::SsSyntax;

/// How a null assertion is spelled in the rewritten body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NullGuardStyle {
    /// `ArgumentNullException.ThrowIfNull(p, nameof(p));`
    #[default]
    ThrowIfNull,
    /// `if (p is null) throw new ArgumentNullException(nameof(p));`
    IfThrow,
}

impl std::str::FromStr for NullGuardStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "throw-if-null" => Ok(NullGuardStyle::ThrowIfNull),
            "if-throw" => Ok(NullGuardStyle::IfThrow),
            other => Err(format!(
                "unknown null guard style `{other}` (expected `throw-if-null` or `if-throw`)"
            )),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesugarOptions {
    pub syntax: SsSyntax,
    /// Treat the input as `#nullable enable`: only `T?` parameters admit null.
    pub nullable_context: bool,
    pub null_guard: NullGuardStyle,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_from_partial_json() {
        let opts: DesugarOptions =
            serde_json::from_str(r#"{ "null_guard": "if-throw", "syntax": { "singleton": false } }"#)
                .unwrap();
        assert_eq!(opts.null_guard, NullGuardStyle::IfThrow);
        assert!(!opts.syntax.singleton);
        assert!(opts.syntax.property_shorthand);
        assert!(!opts.nullable_context);
    }

    #[test]
    fn guard_style_parses_from_flag_text() {
        assert_eq!("if-throw".parse::<NullGuardStyle>(), Ok(NullGuardStyle::IfThrow));
        assert!("bogus".parse::<NullGuardStyle>().is_err());
    }
}
