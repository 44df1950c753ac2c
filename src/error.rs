//! Error handling for parsing and querying
use crate::Position;

/// A result type for parsing, which can be either a successful value or an error.
pub type ParseResult<T> = std::result::Result<T, ParseError>;

/// A result type for queries against parsed trees.
pub type QueryResult<T> = std::result::Result<T, QueryError>;

/// Return early with a parse error at the given position.
///
/// - `bail!(position, kind)`
/// - `bail!(position, msg = "format {}", args)` for internal invariant failures
macro_rules! bail {
    ($position:expr, msg = $($arg:tt)*) => {
        return Err($crate::error::ParseError::at(
            $crate::error::ParseErrorKind::Internal(format!($($arg)*)),
            $position,
        ))
    };

    ($position:expr, $kind:expr) => {
        return Err($crate::error::ParseError::at($kind, $position))
    };
}
pub(crate) use bail;

/// An error that stopped the parse of a fragment.
///
/// The line and column are 1-based, and the line includes the fragment's line offset,
/// so they point into the enclosing document.
#[derive(Debug, thiserror::Error)]
#[error("{line}:{column} - {kind}")]
pub struct ParseError {
    /// The kind of error that occurred
    pub kind: ParseErrorKind,

    /// The 1-based line of the error in the enclosing document
    pub line: usize,

    /// The 1-based column of the error
    pub column: usize,
}
impl ParseError {
    /// Creates a new `ParseError` at a 0-based document position.
    #[must_use]
    pub fn at(kind: ParseErrorKind, position: Position) -> Self {
        Self {
            kind,
            line: position.row + 1,
            column: position.column + 1,
        }
    }

    /// Creates a `ParseError` from a tokenizer error, whose position is relative to the fragment.
    #[must_use]
    pub fn from_tokenizer(error: xmlparser::Error, line_offset: usize) -> Self {
        let pos = error.pos();
        Self {
            line: pos.row as usize + line_offset,
            column: pos.col as usize,
            kind: ParseErrorKind::Xml(error),
        }
    }

    /// Human-readable description of the error
    #[must_use]
    pub fn message(&self) -> String {
        self.kind.to_string()
    }

    /// The 0-based document position of the error, for moving a cursor to it.
    #[must_use]
    pub fn position(&self) -> Position {
        Position::new(self.line.saturating_sub(1), self.column.saturating_sub(1))
    }
}

/// The kind of error that occurred while parsing a fragment.
#[derive(Debug, thiserror::Error)]
pub enum ParseErrorKind {
    /// The tokenizer rejected the text
    #[error("XML parser error: {0}")]
    Xml(xmlparser::Error),

    /// A close tag did not match the open element
    #[error("Mismatched tag: expected </{expected}>, found </{found}>")]
    MismatchedCloseTag {
        /// Name of the element that is open
        expected: String,

        /// Name in the close tag
        found: String,
    },

    /// A tag in the document was not closed
    #[error("Unclosed tag: {0}")]
    UnclosedTag(String),

    /// The fragment contains no element at all
    #[error("No element found")]
    NoRootElement,

    /// A second element started after the root element closed
    #[error("Junk after document element")]
    MultipleRoots,

    /// A token appeared where it is not allowed
    #[error("Unexpected {0}")]
    UnexpectedToken(String),

    /// Character or entity references could not be decoded
    #[error("Invalid reference: {0}")]
    Entity(String),

    /// The builder's own bookkeeping went wrong
    #[error("{0}")]
    Internal(String),
}

/// An error raised by an operation on parsed trees.
///
/// Batch operations report these per item, and carry on with the remaining items.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// A query result cannot be traced back to a node in the tree, e.g. a computed string
    #[error("Result is not part of the parsed document")]
    UnresolvedReference,

    /// A query result is of a kind the tree does not materialize
    #[error("Unsupported node type: {0}")]
    UnsupportedNodeType(String),

    /// Unknown relative navigation direction
    #[error("Unknown direction \"{0}\"")]
    InvalidDirection(String),

    /// Unknown or malformed configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A path expression could not be read
    #[error("Invalid path expression `{expression}`: {message}")]
    PathSyntax {
        /// The expression that failed
        expression: String,

        /// What went wrong
        message: String,
    },

    /// A regular expression given to an extension function is invalid
    #[error("Invalid regular expression: {0}")]
    InvalidRegex(#[from] regex::Error),

    /// A relative path was requested from a node that does not enclose the target
    #[error("The relative root is not an ancestor of the node")]
    NotAnAncestor,

    /// A position needed by the operation was never recorded (the parse was aborted)
    #[error("Node has no recorded location")]
    MissingLocation,
}
impl QueryError {
    pub(crate) fn syntax(expression: &str, message: impl Into<String>) -> Self {
        Self::PathSyntax {
            expression: expression.to_string(),
            message: message.into(),
        }
    }
}
