use ss_ast::RawText;

use crate::EmitConfig;

/// Visual width of a tab when measuring source columns.
const TAB_WIDTH: u32 = 4;

/// Line-oriented output with an indentation level.
pub struct TextWriter<'a> {
    config: &'a EmitConfig,
    out: String,
    level: usize,
}

impl<'a> TextWriter<'a> {
    pub fn new(config: &'a EmitConfig) -> Self {
        Self {
            config,
            out: String::new(),
            level: 0,
        }
    }

    pub fn indent(&mut self) {
        self.level += 1;
    }

    pub fn dedent(&mut self) {
        self.level = self.level.saturating_sub(1);
    }

    /// One line at the current indentation. Empty lines get no indentation.
    pub fn line(&mut self, text: &str) {
        if !text.is_empty() {
            let width = self.level * self.config.indent_width;
            self.out.extend(std::iter::repeat(' ').take(width));
            self.out.push_str(text);
        }
        self.out.push('\n');
    }

    /// An empty separator line, never at the very start and never doubled.
    pub fn blank_line(&mut self) {
        if !self.out.is_empty() && !self.out.ends_with("\n\n") {
            self.out.push('\n');
        }
    }

    /// Verbatim text, re-indented to the current level, with `prefix` before
    /// its first line and `suffix` after its last.
    pub fn raw(&mut self, prefix: &str, raw: &RawText, suffix: &str) {
        let lines = reindent(raw);
        let last = lines.len() - 1;
        for (idx, text) in lines.iter().enumerate() {
            let mut line = String::new();
            if idx == 0 {
                line.push_str(prefix);
            }
            line.push_str(text);
            if idx == last {
                line.push_str(suffix);
            }
            self.line(&line);
        }
    }

    pub fn finish(self) -> String {
        match self.config.newline.as_str() {
            "\n" => self.out,
            newline => self.out.replace('\n', newline),
        }
    }
}

/// Split verbatim text into lines, removing from each continuation line the
/// indentation the first line had in the source.
pub fn reindent(raw: &RawText) -> Vec<String> {
    let mut lines = raw.text.lines();
    let mut out = vec![lines.next().unwrap_or_default().trim().to_string()];
    out.extend(
        lines.map(|line| strip_columns(line, raw.column).trim_end().to_string()),
    );
    out
}

/// `line` without up to `columns` visual columns of leading whitespace.
fn strip_columns(line: &str, columns: u32) -> &str {
    let mut col = 0;
    for (idx, c) in line.char_indices() {
        if col >= columns {
            return &line[idx..];
        }
        match c {
            ' ' => col += 1,
            '\t' => col += TAB_WIDTH,
            _ => return &line[idx..],
        }
    }
    ""
}

#[cfg(test)]
mod tests {
    use super::*;
    use ss_ast::DUMMY_SP;

    #[test]
    fn reindent_is_relative_to_the_first_column() {
        let raw = RawText::new(
            "if (ok)\n        {\n            Run();\n        }",
            DUMMY_SP,
            8,
            Vec::new(),
        );
        assert_eq!(reindent(&raw), vec!["if (ok)", "{", "    Run();", "}"]);
    }

    #[test]
    fn tabs_count_as_four_columns() {
        let raw = RawText::new("Call(a,\n\t\tb);", DUMMY_SP, 4, Vec::new());
        assert_eq!(reindent(&raw), vec!["Call(a,", "\tb);"]);
    }

    #[test]
    fn raw_gets_prefix_suffix_and_indentation() {
        let config = EmitConfig::default();
        let mut writer = TextWriter::new(&config);
        writer.indent();
        let raw = RawText::new("a +\n    b", DUMMY_SP, 0, Vec::new());
        writer.raw("return ", &raw, ";");
        assert_eq!(writer.finish(), "    return a +\n        b;\n");
    }

    #[test]
    fn crlf_newlines() {
        let config = EmitConfig {
            newline: crate::Newline::CrLf,
            ..EmitConfig::default()
        };
        let mut writer = TextWriter::new(&config);
        writer.line("a");
        writer.blank_line();
        writer.line("b");
        assert_eq!(writer.finish(), "a\r\n\r\nb\r\n");
    }
}
