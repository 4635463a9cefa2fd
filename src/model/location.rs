//! Source locations for descriptor elements.
//!
//! When location tracking is enabled, the processor attaches an
//! [`InputLocation`] to each parent, dependency, plugin, and profile it
//! parses so that later diagnostics can point back into the document.
//! Locations are recovered from the raw text with a pre-computed line index
//! rather than a position-tracking parser.

use std::fmt;

use serde::Serialize;

/// Location of an element in a descriptor document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputLocation {
    /// Printable source identity, usually the document path.
    pub source: String,
    /// 1-based line.
    pub line: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub col: Option<usize>,
}

impl InputLocation {
    pub fn new(source: impl Into<String>, line: usize) -> Self {
        Self {
            source: source.into(),
            line,
            col: None,
        }
    }

    pub fn with_col(mut self, col: usize) -> Self {
        self.col = Some(col);
        self
    }
}

impl fmt::Display for InputLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source, self.line)?;
        if let Some(col) = self.col {
            write!(f, ":{}", col)?;
        }
        Ok(())
    }
}

/// Build an index of line start byte offsets for O(log n) line lookups.
///
/// Line 1 starts at offset 0, line 2 starts after the first '\n', etc.
pub fn build_line_index(content: &str) -> Vec<usize> {
    let mut offsets = vec![0];
    for (i, c) in content.char_indices() {
        if c == '\n' {
            offsets.push(i + 1);
        }
    }
    offsets
}

/// Find the 1-based line number for a byte offset using binary search.
pub fn offset_to_line(line_index: &[usize], offset: usize) -> usize {
    match line_index.binary_search(&offset) {
        Ok(line) => line + 1,
        Err(line) => line,
    }
}

/// Find the byte offset of a JSON key after `from`.
///
/// Validates that the match is actually a key (followed by optional
/// whitespace and a colon) rather than a string value that happens to
/// contain the same text.
pub fn find_key_offset(content: &str, key: &str, from: usize) -> Option<usize> {
    let pattern = format!("\"{}\"", key);
    let remaining = &content[from..];
    let mut pos = 0;
    while let Some(rel) = remaining[pos..].find(&pattern) {
        let abs = pos + rel;
        let after = abs + pattern.len();
        if remaining[after..].trim_start().starts_with(':') {
            return Some(from + abs);
        }
        pos = abs + 1;
    }
    None
}

/// Find the byte offset of `"key": "value"` after `from`.
///
/// Used to locate list elements, which have no stable key path of their own:
/// the element is pinned by one of its distinguishing field values.
pub fn find_key_value_offset(content: &str, key: &str, value: &str, from: usize) -> Option<usize> {
    let mut search = from;
    while let Some(key_offset) = find_key_offset(content, key, search) {
        let after_key = key_offset + key.len() + 2;
        let rest = content[after_key..].trim_start_matches([':', ' ', '\t', '\n', '\r']);
        if rest.starts_with(&format!("\"{}\"", value)) {
            return Some(key_offset);
        }
        search = key_offset + 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_line_index() {
        let content = "line1\nline2\nline3";
        let index = build_line_index(content);
        assert_eq!(index, vec![0, 6, 12]);

        assert_eq!(offset_to_line(&index, 0), 1);
        assert_eq!(offset_to_line(&index, 3), 1);
        assert_eq!(offset_to_line(&index, 6), 2);
        assert_eq!(offset_to_line(&index, 12), 3);
    }

    #[test]
    fn test_find_key_skips_value_matches() {
        // The first occurrence of "parent" is a string value, not a key.
        let content = r#"{
  "name": "parent",
  "parent": { "groupId": "g" }
}"#;
        let offset = find_key_offset(content, "parent", 0).unwrap();
        let index = build_line_index(content);
        assert_eq!(offset_to_line(&index, offset), 3);
    }

    #[test]
    fn test_find_key_value() {
        let content = r#"{
  "dependencies": [
    { "groupId": "g", "artifactId": "first" },
    { "groupId": "g", "artifactId": "second" }
  ]
}"#;
        let index = build_line_index(content);
        let offset = find_key_value_offset(content, "artifactId", "second", 0).unwrap();
        assert_eq!(offset_to_line(&index, offset), 4);
    }

    #[test]
    fn test_location_display() {
        let loc = InputLocation::new("pom.json", 12).with_col(3);
        assert_eq!(loc.to_string(), "pom.json:12:3");
        let loc = InputLocation::new("pom.json", 12);
        assert_eq!(loc.to_string(), "pom.json:12");
    }
}
