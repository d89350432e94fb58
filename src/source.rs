//! Line-oriented file contents.
//!
//! Both the Lua source and the registration file are handled as an ordered
//! list of lines that keep their terminators, so unrelated lines are written
//! back byte-for-byte.

use anyhow::{Context, Result};
use std::path::Path;

/// An ordered, mutable sequence of lines including their terminators.
///
/// Inserting at index `i` shifts every line at `i` or later down by one;
/// callers holding indices into the same sequence must account for that.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceLines {
    lines: Vec<String>,
}

impl SourceLines {
    pub fn from_text(text: &str) -> Self {
        Self {
            lines: text.split_inclusive('\n').map(str::to_string).collect(),
        }
    }

    pub fn read(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(Self::from_text(&text))
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    /// Inserts `line` before `index`, terminating the preceding line first
    /// if it was the unterminated last line.
    pub fn insert(&mut self, index: usize, line: String) {
        if index > 0 && index == self.lines.len() && !self.lines[index - 1].ends_with('\n') {
            let ending = self.line_ending();
            self.lines[index - 1].push_str(ending);
        }
        self.lines.insert(index, line);
    }

    /// The terminator of the first terminated line, `\n` if there is none.
    pub fn line_ending(&self) -> &'static str {
        match self.lines.iter().find(|line| line.ends_with('\n')) {
            Some(line) if line.ends_with("\r\n") => "\r\n",
            _ => "\n",
        }
    }

    /// Replaces the line at `index` with the non-empty `replacement`,
    /// returning how many lines were added.
    pub fn splice(&mut self, index: usize, replacement: Vec<String>) -> usize {
        let added = replacement.len().saturating_sub(1);
        self.lines.splice(index..=index, replacement);
        added
    }

    pub fn to_text(&self) -> String {
        self.lines.concat()
    }

    /// Renders with `\n` terminators only.
    pub fn to_unix_text(&self) -> String {
        self.lines
            .iter()
            .map(|line| match line.strip_suffix("\r\n") {
                Some(body) => format!("{body}\n"),
                None => line.clone(),
            })
            .collect()
    }
}

/// Returns `line` without its terminator.
pub fn body(line: &str) -> &str {
    line.trim_end_matches(['\n', '\r'])
}

/// Leading whitespace of `line`.
pub fn indent_of(line: &str) -> &str {
    let trimmed = line.trim_start_matches([' ', '\t']);
    &line[..line.len() - trimmed.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_terminators_and_unterminated_tail() {
        let lines = SourceLines::from_text("a\nb\r\nc");
        assert_eq!(lines.iter().collect::<Vec<_>>(), vec!["a\n", "b\r\n", "c"]);
        assert_eq!(lines.to_text(), "a\nb\r\nc");
    }

    #[test]
    fn empty_text_has_no_lines() {
        assert!(SourceLines::from_text("").is_empty());
    }

    #[test]
    fn insert_at_end_terminates_previous_line() {
        let mut lines = SourceLines::from_text("local M = {}");
        lines.insert(1, "x\n".to_string());
        assert_eq!(lines.to_text(), "local M = {}\nx\n");
    }

    #[test]
    fn splice_reports_delta() {
        let mut lines = SourceLines::from_text("a\nb\nc\n");
        let delta = lines.splice(1, vec!["b1\n".into(), "b2\n".into(), "b3\n".into()]);
        assert_eq!(delta, 2);
        assert_eq!(lines.to_text(), "a\nb1\nb2\nb3\nc\n");
    }

    #[test]
    fn line_ending_follows_first_terminated_line() {
        assert_eq!(SourceLines::from_text("a\r\nb\n").line_ending(), "\r\n");
        assert_eq!(SourceLines::from_text("a\nb\r\n").line_ending(), "\n");
        assert_eq!(SourceLines::from_text("a").line_ending(), "\n");

        let mut lines = SourceLines::from_text("a\r\nb");
        lines.insert(2, "c\r\n".to_string());
        assert_eq!(lines.to_text(), "a\r\nb\r\nc\r\n");
    }

    #[test]
    fn unix_text_normalizes_crlf() {
        let lines = SourceLines::from_text("a\r\nb\n");
        assert_eq!(lines.to_unix_text(), "a\nb\n");
    }

    #[test]
    fn indent_is_leading_whitespace() {
        assert_eq!(indent_of("    { 'SFoo', 'awake' },\n"), "    ");
        assert_eq!(indent_of("\t\tx"), "\t\t");
        assert_eq!(indent_of("x"), "");
    }
}
