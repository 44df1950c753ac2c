//! The four tag positions recorded on every element
use crate::{Position, Span};

/// Namespace of the location pseudo-attributes.
///
/// Not expected to collide with any namespace used by document content.
pub const LOCATION_NAMESPACE: &str = "urn:x-markup-locator:location";

/// Which of the four recorded positions of an element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PositionField {
    /// Where the start tag begins, at its `<`
    OpenTagStart,

    /// Where the start tag ends, just after its `>`
    OpenTagEnd,

    /// Where the end tag begins
    CloseTagStart,

    /// Where the end tag ends
    CloseTagEnd,
}
impl PositionField {
    /// All fields, in document order
    pub const ALL: [PositionField; 4] = [
        Self::OpenTagStart,
        Self::OpenTagEnd,
        Self::CloseTagStart,
        Self::CloseTagEnd,
    ];

    /// Local name of the matching pseudo-attribute
    #[must_use]
    pub fn attribute_name(self) -> &'static str {
        match self {
            Self::OpenTagStart => "open_tag_start_pos",
            Self::OpenTagEnd => "open_tag_end_pos",
            Self::CloseTagStart => "close_tag_start_pos",
            Self::CloseTagEnd => "close_tag_end_pos",
        }
    }

    /// Field named by a pseudo-attribute local name
    #[must_use]
    pub fn from_attribute_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.attribute_name() == name)
    }
}

/// A position that is written once, and at most corrected once afterwards.
///
/// `unset -> set -> (corrected)`. A correction needs a recorded value to replace and only
/// applies to slots created as correctable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PositionSlot {
    value: Option<Position>,
    correctable: bool,
}
impl PositionSlot {
    /// A slot that accepts one later correction
    #[must_use]
    pub fn correctable() -> Self {
        Self {
            value: None,
            correctable: true,
        }
    }

    /// The recorded position, if any
    #[inline]
    #[must_use]
    pub fn get(&self) -> Option<Position> {
        self.value
    }

    /// Records the position unless one is already present. Returns true if it was written.
    pub fn record(&mut self, position: Position) -> bool {
        if self.value.is_some() {
            return false;
        }

        self.value = Some(position);
        true
    }

    /// Overwrites a recorded position, once. Returns true if it was written.
    pub fn correct(&mut self, position: Position) -> bool {
        if !self.correctable || self.value.is_none() {
            return false;
        }

        self.value = Some(position);
        self.correctable = false;
        true
    }

    /// Returns true if a correction would still be accepted
    #[must_use]
    pub fn may_correct(&self) -> bool {
        self.correctable && self.value.is_some()
    }
}

/// The start and end of an element's open and close tags.
///
/// For a self-closing tag both tags describe the same text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagPositions {
    /// Start of the open tag
    pub open_start: PositionSlot,

    /// End of the open tag
    pub open_end: PositionSlot,

    /// Start of the close tag; the one slot that may be corrected
    pub close_start: PositionSlot,

    /// End of the close tag
    pub close_end: PositionSlot,
}
impl Default for TagPositions {
    fn default() -> Self {
        Self {
            open_start: PositionSlot::default(),
            open_end: PositionSlot::default(),
            close_start: PositionSlot::correctable(),
            close_end: PositionSlot::default(),
        }
    }
}
impl TagPositions {
    /// Returns the recorded value of a field
    #[must_use]
    pub fn get(&self, field: PositionField) -> Option<Position> {
        self.slot(field).get()
    }

    fn slot(&self, field: PositionField) -> &PositionSlot {
        match field {
            PositionField::OpenTagStart => &self.open_start,
            PositionField::OpenTagEnd => &self.open_end,
            PositionField::CloseTagStart => &self.close_start,
            PositionField::CloseTagEnd => &self.close_end,
        }
    }

    /// The span of the open tag, once both ends are known
    #[must_use]
    pub fn open_tag(&self) -> Option<Span> {
        Some(Span::new(self.open_start.get()?, self.open_end.get()?))
    }

    /// The span of the close tag, once both ends are known
    #[must_use]
    pub fn close_tag(&self) -> Option<Span> {
        Some(Span::new(self.close_start.get()?, self.close_end.get()?))
    }

    /// Start of the open tag to end of the close tag
    #[must_use]
    pub fn extent(&self) -> Option<Span> {
        Some(Span::new(self.open_start.get()?, self.close_end.get()?))
    }

    /// True once all four positions are recorded
    #[must_use]
    pub fn is_complete(&self) -> bool {
        PositionField::ALL.iter().all(|f| self.get(*f).is_some())
    }

    /// If the close tag ended where the open tag did, the element was written as one
    /// self-closing tag; make its close tag start where the open tag starts.
    pub(crate) fn fix_self_closing(&mut self) -> bool {
        match (self.open_start.get(), self.open_end.get(), self.close_end.get()) {
            (Some(start), Some(open_end), Some(close_end)) if open_end == close_end => {
                self.close_start.correct(start)
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_records_once() {
        let mut slot = PositionSlot::default();
        assert!(slot.record(Position::new(0, 1)));
        assert!(!slot.record(Position::new(0, 2)));
        assert_eq!(slot.get(), Some(Position::new(0, 1)));
        assert!(!slot.correct(Position::new(0, 3)));
    }

    #[test]
    fn test_slot_corrects_once() {
        let mut slot = PositionSlot::correctable();
        assert!(!slot.correct(Position::new(0, 0)), "nothing to correct yet");
        assert_eq!(slot.get(), None);

        slot.record(Position::new(0, 4));
        assert!(slot.may_correct());
        assert!(slot.correct(Position::new(0, 0)));
        assert!(!slot.correct(Position::new(0, 9)));
        assert_eq!(slot.get(), Some(Position::new(0, 0)));
    }

    #[test]
    fn test_fix_self_closing() {
        let mut positions = TagPositions::default();
        positions.open_start.record(Position::new(0, 0));
        positions.open_end.record(Position::new(0, 4));
        positions.close_start.record(Position::new(0, 4));
        positions.close_end.record(Position::new(0, 4));

        assert!(positions.fix_self_closing());
        assert_eq!(positions.open_tag(), positions.close_tag());
        assert!(!positions.fix_self_closing());
    }

    #[test]
    fn test_field_names() {
        for field in PositionField::ALL {
            assert_eq!(
                PositionField::from_attribute_name(field.attribute_name()),
                Some(field)
            );
        }
        assert_eq!(PositionField::from_attribute_name("other"), None);
    }
}
