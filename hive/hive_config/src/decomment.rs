//! Full-line comment stripping.
//!
//! A line whose first non-blank characters are `//` is dropped entirely.
//! Trailing comments after code and block comments are not recognized. The
//! pass records which original line every surviving line came from, so that
//! later errors can point into the text the user actually wrote.

use crate::error::Location;

/// Text with full-line comments removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decommented {
    text: String,

    /// `line_map[i]` is the original line number of output line `i + 1`
    line_map: Vec<usize>,
}

impl Decommented {
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Original line number for a 1-based line of the stripped text.
    pub fn original_line(&self, line: usize) -> usize {
        match line.checked_sub(1).and_then(|i| self.line_map.get(i)) {
            Some(original) => *original,
            // Past the last kept line, e.g. an error at end of input
            None => self.line_map.last().map(|last| last + 1).unwrap_or(1),
        }
    }

    /// Map a location in the stripped text back to the original text.
    pub fn relocate(&self, location: Location) -> Location {
        Location::new(self.original_line(location.line), location.column)
    }
}

/// Strip full-line `//` comments from `source`.
pub fn decomment(source: &str) -> Decommented {
    let mut text = String::with_capacity(source.len());
    let mut line_map = Vec::new();

    for (index, line) in source.split_inclusive('\n').enumerate() {
        if line.trim_start().starts_with("//") {
            continue;
        }
        text.push_str(line);
        line_map.push(index + 1);
    }

    Decommented { text, line_map }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_full_line_comments_only() {
        let source = "// header\n{\n    // inner\n  \"Url\": \"http://x\" // kept\n}\n";
        let stripped = decomment(source);
        assert_eq!(stripped.text(), "{\n  \"Url\": \"http://x\" // kept\n}\n");
    }

    #[test]
    fn test_line_map_points_at_original_lines() {
        let source = "// one\n// two\na\n// three\nb";
        let stripped = decomment(source);
        assert_eq!(stripped.text(), "a\nb");
        assert_eq!(stripped.original_line(1), 3);
        assert_eq!(stripped.original_line(2), 5);
        assert_eq!(stripped.original_line(3), 6);
        assert_eq!(
            stripped.relocate(Location::new(2, 4)),
            Location::new(5, 4)
        );
    }

    #[test]
    fn test_all_comments() {
        let stripped = decomment("// a\n   // b\n");
        assert_eq!(stripped.text(), "");
        assert_eq!(stripped.original_line(1), 1);
    }

    #[test]
    fn test_block_comments_are_not_comments() {
        let stripped = decomment("/* not a comment */\n");
        assert_eq!(stripped.text(), "/* not a comment */\n");
    }
}
