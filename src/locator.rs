//! Conversions between byte offsets in a fragment and document positions
use crate::{Position, Span};

/// Converts increasing byte offsets of a fragment into document positions.
///
/// Tokens arrive in source order, so the locator only ever scans forward from the last offset
/// it was asked about; a full parse therefore walks the text once, even for documents written
/// on a single very long line.
#[derive(Debug, Clone)]
pub struct Locator<'src> {
    source: &'src str,
    line_offset: usize,
    offset: usize,
    position: Position,
}
impl<'src> Locator<'src> {
    /// Creates a locator for a fragment starting at row `line_offset` of its document.
    #[must_use]
    pub fn new(source: &'src str, line_offset: usize) -> Self {
        Self {
            source,
            line_offset,
            offset: 0,
            position: Position::new(line_offset, 0),
        }
    }

    /// Returns the position of the given byte offset.
    ///
    /// Offsets past the end of the text are clamped to the end.
    /// Asking for an offset before the previous one restarts the scan from the beginning.
    pub fn position_at(&mut self, offset: usize) -> Position {
        let offset = offset.min(self.source.len());
        if offset < self.offset {
            self.offset = 0;
            self.position = Position::new(self.line_offset, 0);
        }

        for c in self.source[self.offset..offset].chars() {
            if c == '\n' {
                self.position.row += 1;
                self.position.column = 0;
            } else {
                self.position.column += 1;
            }
        }

        self.offset = offset;
        self.position
    }

    /// Returns the span between two byte offsets.
    pub fn span(&mut self, start: usize, end: usize) -> Span {
        let begin = self.position_at(start);
        let end = self.position_at(end);
        Span::new(begin, end)
    }
}

/// Random access from positions back to byte offsets of a fragment.
///
/// Used by callers that hold the source text and want to read back what a span covers.
#[derive(Debug, Clone)]
pub struct LineIndex<'src> {
    source: &'src str,
    line_offset: usize,
    line_starts: Vec<usize>,
}
impl<'src> LineIndex<'src> {
    /// Indexes the line starts of a fragment beginning at row `line_offset`.
    #[must_use]
    pub fn new(source: &'src str, line_offset: usize) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            source
                .char_indices()
                .filter(|(_, c)| *c == '\n')
                .map(|(i, _)| i + 1),
        );

        Self {
            source,
            line_offset,
            line_starts,
        }
    }

    /// Returns the byte offset of a position, if it lies within the fragment.
    #[must_use]
    pub fn offset_of(&self, position: Position) -> Option<usize> {
        let line = position.row.checked_sub(self.line_offset)?;
        let start = *self.line_starts.get(line)?;
        let end = self
            .line_starts
            .get(line + 1)
            .map_or(self.source.len(), |next| next - 1);

        let line_text = &self.source[start..end];
        if position.column == line_text.chars().count() {
            return Some(end);
        }

        line_text
            .char_indices()
            .nth(position.column)
            .map(|(i, _)| start + i)
    }

    /// Returns the position of a byte offset within the fragment.
    ///
    /// An offset inside a multi-byte character is the position of that character.
    #[must_use]
    pub fn position_of(&self, offset: usize) -> Position {
        let mut offset = offset.min(self.source.len());
        while !self.source.is_char_boundary(offset) {
            offset -= 1;
        }
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };

        let start = self.line_starts[line];
        let column = self.source[start..offset].chars().count();
        Position::new(line + self.line_offset, column)
    }

    /// Returns the text covered by a span, if both ends lie within the fragment.
    #[must_use]
    pub fn slice(&self, span: &Span) -> Option<&'src str> {
        let start = self.offset_of(span.begin)?;
        let end = self.offset_of(span.end)?;
        self.source.get(start..end)
    }

    /// The fragment this index was built over
    #[must_use]
    pub fn source(&self) -> &'src str {
        self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locator_counts_characters() {
        let src = "<a>\n  <é/>\n</a>";
        let mut locator = Locator::new(src, 0);
        assert_eq!(locator.position_at(0), Position::new(0, 0));
        assert_eq!(locator.position_at(6), Position::new(1, 2));

        // `é` is two bytes wide but one column
        let after = src.find("/>").unwrap();
        assert_eq!(locator.position_at(after), Position::new(1, 4));
    }

    #[test]
    fn test_locator_applies_line_offset() {
        let mut locator = Locator::new("x\ny", 10);
        assert_eq!(locator.position_at(2), Position::new(11, 0));
    }

    #[test]
    fn test_locator_rewinds() {
        let mut locator = Locator::new("ab\ncd", 0);
        assert_eq!(locator.position_at(4), Position::new(1, 1));
        assert_eq!(locator.position_at(1), Position::new(0, 1));
    }

    #[test]
    fn test_line_index_round_trip() {
        let src = "line1\nliné2\nline3";
        let index = LineIndex::new(src, 3);
        for offset in src.char_indices().map(|(i, _)| i).chain([src.len()]) {
            let position = index.position_of(offset);
            assert_eq!(index.offset_of(position), Some(offset));
        }

        assert_eq!(index.offset_of(Position::new(2, 0)), None);
        assert_eq!(index.offset_of(Position::new(4, 99)), None);
    }

    #[test]
    fn test_line_index_inside_a_character() {
        let index = LineIndex::new("a\nüb", 4);
        assert_eq!(index.position_of(3), Position::new(5, 0));
        assert_eq!(index.position_of(4), Position::new(5, 1));
        assert_eq!(index.position_of(99), Position::new(5, 2));
    }

    #[test]
    fn test_line_index_slice() {
        let src = "<a>\n<b/>\n</a>";
        let index = LineIndex::new(src, 0);
        let span = Span::new(Position::new(1, 0), Position::new(1, 4));
        assert_eq!(index.slice(&span), Some("<b/>"));
    }
}
