//! Source text positions and ranges.

use std::fmt;

pub use text_size::TextRange;
pub use text_size::TextSize;

/// A line and column position in source text.
///
/// Both are 0-indexed internally and displayed 1-indexed.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct LineCol {
    /// 0-indexed line number
    pub line: u32,
    /// 0-indexed column (in UTF-8 bytes)
    pub col: u32,
}

impl LineCol {
    #[inline]
    pub const fn new(line: u32, col: u32) -> Self {
        Self { line, col }
    }

    /// 1-indexed line number (for display).
    #[inline]
    pub const fn display_line(self) -> u32 {
        self.line + 1
    }

    /// 1-indexed column number (for display).
    #[inline]
    pub const fn display_col(self) -> u32 {
        self.col + 1
    }
}

impl fmt::Debug for LineCol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for LineCol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.display_line(), self.display_col())
    }
}

/// Converts byte offsets of one source text into line/column positions.
#[derive(Clone, Debug)]
pub struct LineIndex {
    /// Byte offset of the start of each line
    line_starts: Vec<TextSize>,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let line_starts = std::iter::once(TextSize::from(0))
            .chain(
                text.match_indices('\n')
                    .map(|(offset, _)| TextSize::from((offset + 1) as u32)),
            )
            .collect();
        Self { line_starts }
    }

    /// Position of a byte offset.
    pub fn line_col(&self, offset: TextSize) -> LineCol {
        let line = self
            .line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1);
        let col = offset - self.line_starts[line];
        LineCol::new(line as u32, col.into())
    }

    /// Start position of a range.
    #[inline]
    pub fn start_of(&self, range: TextRange) -> LineCol {
        self.line_col(range.start())
    }

    /// Column (in bytes) at which `offset` sits on its line.
    #[inline]
    pub fn column(&self, offset: TextSize) -> u32 {
        self.line_col(offset).col
    }

    /// Number of lines.
    pub fn len(&self) -> usize {
        self.line_starts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.line_starts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_col_display_is_one_indexed() {
        assert_eq!(LineCol::new(0, 0).to_string(), "1:1");
        assert_eq!(LineCol::new(4, 9).to_string(), "5:10");
    }

    #[test]
    fn test_line_index_positions() {
        let index = LineIndex::new("module a {\n  prefix a;\n}\n");

        assert_eq!(index.line_col(TextSize::from(0)), LineCol::new(0, 0));
        assert_eq!(index.line_col(TextSize::from(13)), LineCol::new(1, 2));
        assert_eq!(index.line_col(TextSize::from(23)), LineCol::new(2, 0));
        assert_eq!(index.len(), 4);
    }

    #[test]
    fn test_start_of_range() {
        let index = LineIndex::new("a\nbc d");
        let range = TextRange::new(TextSize::from(5), TextSize::from(6));
        assert_eq!(index.start_of(range), LineCol::new(1, 3));
        assert_eq!(index.column(TextSize::from(5)), 3);
    }
}
