//! Location-aware XML trees.
//!
//! Parses XML fragments into trees where every element knows exactly where its start and
//! end tags are written, then answers two kinds of question about them:
//! - Which element owns this span of text? See [`RegionMatcher`] and [`nodes_at_spans`]
//! - What path expression designates this element? See [`path_of`] and [`paths_of`]
//!
//! Positions are 0-based `(row, column)` pairs, with columns counted in characters. A fragment
//! embedded in a larger document is parsed with the row at which it starts, so every position
//! points into the enclosing document.
//!
//! ```rust
//! use markup_locator::{PathMode, PathOptions, Position, Tree, node_at, path_of};
//!
//! let tree = Tree::parse("<a>\n  <b/>\n  <b>text</b>\n</a>", 0).unwrap();
//!
//! let node = node_at([&tree], Position::new(2, 6)).unwrap();
//! let path = path_of(node, PathMode::Absolute, &PathOptions::default()).unwrap();
//! assert_eq!(path, "/a/b[2]");
//! ```
#![warn(missing_docs)]

mod error;
pub use error::{ParseError, ParseErrorKind, ParseResult, QueryError, QueryResult};

mod position;
pub use position::{InvalidPosition, Position, Span, region_intersects};

mod locator;
pub use locator::{LineIndex, Locator};

mod namespace;
pub use namespace::{NamespaceBinding, NamespaceScopes, XML_NAMESPACE};

mod node;
pub use node::*;

mod arena;
pub use arena::{NodeArena, NodeId};

mod builder;

mod document;
pub use document::{
    DEFAULT_CHUNK_SIZE, DocumentSet, Fragment, NodeRef, ParseOptions, Tree, parse,
    parse_with_abort, parse_with_cleanup,
};

mod matcher;
pub use matcher::{RegionMatch, RegionMatcher, SpanMatch, node_at, nodes_at_spans};

mod uniquify;
pub use uniquify::{NamespaceMap, NamespaceMapping, UniquifyOptions, unique_namespace_prefixes};

mod path;
pub use path::{PathGenerator, PathMode, PathOptions, path_of, paths_of, quote_literal};

mod select;
pub use select::{LocationPathEngine, PathEngine, QueryItem, execute_query, nodes_from_results};

mod navigate;
pub use navigate::{
    AttributePart, Direction, ElementPart, collapse_whitespace, element_preview, element_regions,
    regions_of_item, regions_of_results, relative_node, text_region,
};

pub mod functions;
