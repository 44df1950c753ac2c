//! Row/column positions and the spans built from them
use std::str::FromStr;

/// A location in the enclosing document: a 0-based row and a 0-based column.
///
/// The row already includes the line offset of the parsed fragment, so positions from
/// different fragments of the same host document compare correctly.
/// Columns count characters, not bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Position {
    /// The 0-based row
    pub row: usize,

    /// The 0-based column, in characters
    pub column: usize,
}
impl Position {
    /// Creates a new position
    #[must_use]
    pub const fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }

    /// Returns the position `columns` characters further along the same row.
    #[must_use]
    pub const fn offset_columns(self, columns: usize) -> Self {
        Self {
            row: self.row,
            column: self.column + columns,
        }
    }
}

/// Positions are written as `row/col`, the format used by the location pseudo-attributes.
impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.row, self.column)
    }
}

impl FromStr for Position {
    type Err = InvalidPosition;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (row, column) = s
            .split_once('/')
            .ok_or_else(|| InvalidPosition(s.to_string()))?;
        let row = row.trim().parse().map_err(|_| InvalidPosition(s.to_string()))?;
        let column = column
            .trim()
            .parse()
            .map_err(|_| InvalidPosition(s.to_string()))?;
        Ok(Self { row, column })
    }
}

/// A string could not be read as a `row/col` position.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid position `{0}`; expected `row/col`")]
pub struct InvalidPosition(pub String);

/// A half-open range of text between two positions, `begin <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Span {
    /// Where the span starts
    pub begin: Position,

    /// Where the span stops
    pub end: Position,
}
impl Span {
    /// Creates a span between two positions, in whichever order they are given.
    #[must_use]
    pub fn new(a: Position, b: Position) -> Self {
        if a <= b {
            Self { begin: a, end: b }
        } else {
            Self { begin: b, end: a }
        }
    }

    /// Creates an empty span at a single position - a cursor.
    #[must_use]
    pub const fn point(position: Position) -> Self {
        Self {
            begin: position,
            end: position,
        }
    }

    /// Return true if the span has no width
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.begin == self.end
    }

    /// Returns true if the position lies within the span, both ends included.
    #[must_use]
    pub fn contains(&self, position: Position) -> bool {
        self.begin <= position && position <= self.end
    }

    /// Returns true if the two spans are identical, or share at least some width.
    ///
    /// Touching spans do not intersect: `[0, 5)` and `[5, 7)` share only a boundary.
    /// An empty span intersects another span only when it lies strictly inside it.
    #[must_use]
    pub fn intersects(&self, other: &Span) -> bool {
        if self == other {
            return true;
        }

        let (lb, le) = (self.begin, self.end);
        let (rb, re) = (other.begin, other.end);
        (rb > lb && rb < le) || (re > lb && re < le) || (lb > rb && lb < re) || (le > rb && le < re)
    }

    /// Returns the overlapping part of two spans, if they overlap or touch.
    #[must_use]
    pub fn intersection(&self, other: &Span) -> Option<Span> {
        let begin = self.begin.max(other.begin);
        let end = self.end.min(other.end);
        (begin <= end).then_some(Span { begin, end })
    }

    /// Returns the smallest span covering both spans.
    #[must_use]
    pub fn cover(&self, other: &Span) -> Span {
        Span {
            begin: self.begin.min(other.begin),
            end: self.end.max(other.end),
        }
    }
}
impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.begin, self.end)
    }
}

/// Returns true if `inner` should be considered to fall within `outer`.
///
/// Spans that intersect always do. When `include_beginning` is set, an empty `inner` sitting
/// exactly on the beginning of a non-empty `outer` also does, so a cursor placed right before a
/// child element resolves to that child rather than to the text before it.
#[must_use]
pub fn region_intersects(outer: &Span, inner: &Span, include_beginning: bool) -> bool {
    outer.intersects(inner)
        || (include_beginning
            && inner.is_empty()
            && !outer.is_empty()
            && inner.begin == outer.begin)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(a: (usize, usize), b: (usize, usize)) -> Span {
        Span::new(Position::new(a.0, a.1), Position::new(b.0, b.1))
    }

    #[test]
    fn test_position_order() {
        assert!(Position::new(0, 10) < Position::new(1, 0));
        assert!(Position::new(2, 3) < Position::new(2, 4));
        assert_eq!(Position::new(1, 1), Position::new(1, 1));
    }

    #[test]
    fn test_position_text_form() {
        let position = Position::new(12, 4);
        assert_eq!(position.to_string(), "12/4");
        assert_eq!("12/4".parse::<Position>(), Ok(position));
        assert!("12".parse::<Position>().is_err());
        assert!("a/4".parse::<Position>().is_err());
    }

    #[test]
    fn test_span_new_orders_ends() {
        let s = span((3, 0), (1, 5));
        assert_eq!(s.begin, Position::new(1, 5));
        assert_eq!(s.end, Position::new(3, 0));
    }

    #[test]
    fn test_span_intersects() {
        let outer = span((0, 0), (0, 5));
        assert!(outer.intersects(&span((0, 0), (0, 5))));
        assert!(outer.intersects(&span((0, 2), (0, 7))));
        assert!(outer.intersects(&span((0, 0), (0, 3))));
        assert!(!outer.intersects(&span((0, 5), (0, 7))));
        assert!(!outer.intersects(&span((1, 0), (1, 7))));

        // a cursor only intersects when strictly inside
        assert!(outer.intersects(&Span::point(Position::new(0, 2))));
        assert!(!outer.intersects(&Span::point(Position::new(0, 0))));
        assert!(!outer.intersects(&Span::point(Position::new(0, 5))));
    }

    #[test]
    fn test_region_intersects_beginning() {
        let outer = span((0, 3), (0, 8));
        let cursor = Span::point(Position::new(0, 3));
        assert!(!region_intersects(&outer, &cursor, false));
        assert!(region_intersects(&outer, &cursor, true));

        let at_end = Span::point(Position::new(0, 8));
        assert!(!region_intersects(&outer, &at_end, true));

        let empty = Span::point(Position::new(0, 3));
        assert!(region_intersects(&empty, &cursor, true));
    }

    #[test]
    fn test_span_cover_and_intersection() {
        let a = span((0, 0), (0, 5));
        let b = span((0, 3), (2, 0));
        assert_eq!(a.cover(&b), span((0, 0), (2, 0)));
        assert_eq!(a.intersection(&b), Some(span((0, 3), (0, 5))));
        assert_eq!(a.intersection(&span((3, 0), (3, 1))), None);
        assert!(a.contains(Position::new(0, 5)));
        assert!(!a.contains(Position::new(0, 6)));
    }
}
