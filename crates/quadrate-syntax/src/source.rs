//! Source text and positions.
//!
//! A [`SourceBuffer`] is an immutable view over the UTF-8 text of one Quadrate
//! file. It precomputes line starts so byte offsets can be turned into 1-based
//! line and column numbers for diagnostics without rescanning the text.
//!
//! # Examples
//!
//! ```rust
//! use quadrate_syntax::SourceBuffer;
//!
//! let src = SourceBuffer::with_name("fn main {\n  1 2 add\n}", "main.qd");
//! assert_eq!(src.line_col(12), (2, 3));
//! assert_eq!(src.line_text(2), Some("  1 2 add"));
//!
//! let span = src.span(12, 13);
//! assert_eq!((span.line, span.col), (2, 3));
//! ```

use serde::Serialize;

/// A region of source text.
///
/// `start..end` is a byte range into the buffer the span was produced from;
/// `line` and `col` locate `start` (both 1-based, columns counted in chars).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Span {
    /// Byte offset of the first byte
    pub start: usize,

    /// Byte offset one past the last byte
    pub end: usize,

    /// Line number of `start` (1-based)
    pub line: usize,

    /// Column number of `start` (1-based)
    pub col: usize,
}

impl Span {
    pub fn new(start: usize, end: usize, line: usize, col: usize) -> Self {
        Self {
            start,
            end,
            line,
            col,
        }
    }

    /// An empty span positioned at `start`.
    pub fn point(start: usize, line: usize, col: usize) -> Self {
        Self::new(start, start, line, col)
    }

    /// Joins two spans, keeping the position of `self` and the end of `other`.
    pub fn to(self, other: Span) -> Span {
        Span {
            end: other.end.max(self.start),
            ..self
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Immutable view over one file's source text.
#[derive(Debug, Clone)]
pub struct SourceBuffer<'src> {
    text: &'src str,
    name: Option<String>,
    line_starts: Vec<usize>,
}

impl<'src> SourceBuffer<'src> {
    pub fn new(text: &'src str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(text.match_indices('\n').map(|(i, _)| i + 1));
        Self {
            text,
            name: None,
            line_starts,
        }
    }

    /// Creates a buffer labelled with a file identifier.
    ///
    /// The name is only used when rendering diagnostics.
    pub fn with_name(text: &'src str, name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::new(text)
        }
    }

    pub fn text(&self) -> &'src str {
        self.text
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Resolves a byte offset to a 1-based `(line, column)` pair.
    ///
    /// Offsets past the end of the text clamp to the end. An offset that falls
    /// inside a multi-byte character resolves to that character's column.
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.text.len());
        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        let line_start = self.line_starts[line_idx];
        let col = self.text[line_start..]
            .char_indices()
            .take_while(|(i, _)| line_start + i < offset)
            .count();
        (line_idx + 1, col + 1)
    }

    /// Text of a 1-based line, without its line terminator.
    pub fn line_text(&self, line: usize) -> Option<&'src str> {
        let start = *self.line_starts.get(line.checked_sub(1)?)?;
        let end = self
            .line_starts
            .get(line)
            .map(|next| next - 1)
            .unwrap_or(self.text.len());
        Some(self.text[start..end].trim_end_matches('\r'))
    }

    /// Builds a span for the byte range `start..end`.
    pub fn span(&self, start: usize, end: usize) -> Span {
        let (line, col) = self.line_col(start);
        Span::new(start, end, line, col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_col_first_line() {
        let src = SourceBuffer::new("dup add");
        assert_eq!(src.line_col(0), (1, 1));
        assert_eq!(src.line_col(4), (1, 5));
    }

    #[test]
    fn test_line_col_after_newlines() {
        let src = SourceBuffer::new("a\nbc\n\nd");
        assert_eq!(src.line_col(2), (2, 1));
        assert_eq!(src.line_col(3), (2, 2));
        assert_eq!(src.line_col(5), (3, 1));
        assert_eq!(src.line_col(6), (4, 1));
    }

    #[test]
    fn test_line_col_counts_chars_not_bytes() {
        let src = SourceBuffer::new("\"héllo\" x");
        // 'x' sits after a two-byte character
        assert_eq!(src.line_col(9), (1, 9));
    }

    #[test]
    fn test_line_col_clamps_past_end() {
        let src = SourceBuffer::new("ab");
        assert_eq!(src.line_col(100), (1, 3));
    }

    #[test]
    fn test_line_text() {
        let src = SourceBuffer::new("fn f {\r\n  dup\n}");
        assert_eq!(src.line_text(1), Some("fn f {"));
        assert_eq!(src.line_text(2), Some("  dup"));
        assert_eq!(src.line_text(3), Some("}"));
        assert_eq!(src.line_text(0), None);
        assert_eq!(src.line_text(4), None);
    }

    #[test]
    fn test_span_join() {
        let a = Span::new(3, 5, 1, 4);
        let b = Span::new(10, 12, 2, 1);
        let joined = a.to(b);
        assert_eq!(joined, Span::new(3, 12, 1, 4));
        assert_eq!(joined.len(), 9);
    }
}
