//! Finds the elements that own spans of text.
//!
//! The extent of every element is partitioned into regions: the element's own text before its
//! first child (which includes its start tag), each child's extent, the element's own text
//! between children, and finally its own text up to the end of its close tag.
//! ```text
//! <a x="1"><b/>hi</a>
//! [-------)          own
//!          [---)     <b>
//!              [----] own
//! ```
//! Regions and query spans are both sorted, so both lists are walked together and a child
//! is only descended into when some query span falls within it.
use crate::{NodeRef, Position, Span, Tree, region_intersects};

/// A query span that fell within one region of an element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionMatch<'a> {
    /// Index of the query span, in input order
    pub query: usize,

    /// The element owning the region
    pub node: NodeRef<'a>,

    /// The region that was matched
    pub region: Span,
}

/// The element owning a query span, and the part of the span it consumed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpanMatch<'a> {
    /// The smallest element containing the whole span
    pub node: NodeRef<'a>,

    /// The part of the query span lying within the element
    pub span: Span,
}

struct Region<'a> {
    span: Span,
    child: Option<NodeRef<'a>>,
    include_end: bool,
}
impl Region<'_> {
    fn hits(&self, query: &Span) -> bool {
        if self.span.is_empty() {
            return false;
        }

        region_intersects(&self.span, query, true)
            || (self.include_end && query.is_empty() && query.begin == self.span.end)
    }
}

/// Resolves a batch of query spans against one or more trees.
///
/// # Example
/// ```rust
/// use markup_locator::{Position, RegionMatcher, Span, Tree};
///
/// let tree = Tree::parse(r#"<a x="1"><b/>hi</a>"#, 0).unwrap();
/// let h = Span::new(Position::new(0, 13), Position::new(0, 14));
///
/// let mut matcher = RegionMatcher::new(&[h]);
/// let matches = matcher.match_spans([&tree]);
/// assert_eq!(matches[0].unwrap().node.element().name(), "a");
/// ```
#[derive(Debug, Clone)]
pub struct RegionMatcher {
    queries: Vec<Span>,
    order: Vec<usize>,
    visited: usize,
}
impl RegionMatcher {
    /// Creates a matcher for a list of disjoint spans.
    ///
    /// The spans are expected in document order; if they are not they are sorted, and results
    /// are still reported in input order.
    #[must_use]
    pub fn new(queries: &[Span]) -> Self {
        let mut order: Vec<usize> = (0..queries.len()).collect();
        order.sort_by_key(|i| queries[*i]);

        Self {
            queries: order.iter().map(|i| queries[*i]).collect(),
            order,
            visited: 0,
        }
    }

    /// Number of elements whose regions were scanned so far
    #[must_use]
    pub fn visited(&self) -> usize {
        self.visited
    }

    /// Returns every region matched by every query span.
    ///
    /// A span crossing the boundary between regions matches each of them.
    pub fn raw_matches<'a>(
        &mut self,
        trees: impl IntoIterator<Item = &'a Tree>,
    ) -> Vec<RegionMatch<'a>> {
        let mut out = vec![];
        let count = self.queries.len();
        let mut next = 0;

        for tree in trees {
            if next >= count {
                break;
            }

            let Some(extent) = tree.extent() else {
                log::debug!("skipping tree without a recorded extent");
                continue;
            };

            let root = tree.root();
            let region = Region {
                span: extent,
                child: Some(root),
                include_end: true,
            };

            let found = self.scan(&region, next, count);
            let (Some(&first), Some(&last)) = (found.first(), found.last()) else {
                log::trace!("no query span within tree at {extent}");
                continue;
            };

            if root.has_children() {
                self.visit(root, first, last + 1, true, &mut out);
            } else {
                self.push(&mut out, &found, root, extent);
            }
            next = last;
        }

        for m in &mut out {
            m.query = self.order[m.query];
        }
        out
    }

    /// Returns, in input order, the smallest element containing each query span.
    ///
    /// Spans that fall outside every tree get `None`.
    pub fn match_spans<'a>(
        &mut self,
        trees: impl IntoIterator<Item = &'a Tree>,
    ) -> Vec<Option<SpanMatch<'a>>> {
        let mut results: Vec<Option<SpanMatch<'a>>> = vec![None; self.queries.len()];
        let mut queries = vec![Span::default(); self.queries.len()];
        for (sorted, input) in self.order.iter().enumerate() {
            queries[*input] = self.queries[sorted];
        }

        for m in self.raw_matches(trees) {
            let query = queries[m.query];
            let consumed = if query.is_empty() {
                query
            } else {
                m.region.intersection(&query).unwrap_or(query)
            };

            let slot = &mut results[m.query];
            *slot = match slot.take() {
                None => Some(SpanMatch {
                    node: m.node,
                    span: consumed,
                }),

                Some(previous) => match previous.node.common_ancestor(&m.node) {
                    Some(node) => Some(SpanMatch {
                        node,
                        span: previous.span.cover(&consumed),
                    }),
                    None => Some(previous),
                },
            };
        }

        results
    }

    /// Walks the regions of `node` with the sorted queries `from..to`, all of which fall
    /// somewhere within the node.
    fn visit<'a>(
        &mut self,
        node: NodeRef<'a>,
        from: usize,
        to: usize,
        is_root: bool,
        out: &mut Vec<RegionMatch<'a>>,
    ) {
        self.visited += 1;
        log::trace!("visiting {node:?} with queries {from}..{to}");

        let mut next = from;
        for region in partition(node, is_root) {
            let found = self.scan(&region, next, to);
            let (Some(_), Some(&last)) = (found.first(), found.last()) else {
                continue;
            };

            match region.child {
                Some(child) if child.has_children() => {
                    self.visit(child, found[0], last + 1, false, out);
                }
                Some(child) => self.push(out, &found, child, region.span),
                None => self.push(out, &found, node, region.span),
            }

            // A span crossing into the next region must be matched there too
            next = last;
            if last + 1 == to && self.queries[last].end <= region.span.end {
                break;
            }
        }
    }

    /// Sorted queries from `from..to` falling within the region. Stops at the first miss
    /// after a hit, or at the first query starting past the region.
    fn scan(&self, region: &Region<'_>, from: usize, to: usize) -> Vec<usize> {
        let mut found = vec![];
        for i in from..to {
            let query = &self.queries[i];
            if query.begin > region.span.end {
                break;
            }

            if region.hits(query) {
                found.push(i);
            } else if !found.is_empty() {
                break;
            }
        }
        found
    }

    fn push<'a>(
        &self,
        out: &mut Vec<RegionMatch<'a>>,
        found: &[usize],
        node: NodeRef<'a>,
        region: Span,
    ) {
        out.extend(found.iter().map(|query| RegionMatch {
            query: *query,
            node,
            region,
        }));
    }
}

/// The regions of an element, in document order. Children without a recorded extent are
/// left inside the surrounding region.
fn partition(node: NodeRef<'_>, is_root: bool) -> Vec<Region<'_>> {
    let Some(extent) = node.extent() else {
        return vec![];
    };

    let mut regions = vec![];
    let mut cursor = extent.begin;
    for child in node.children() {
        let Some(child_extent) = child.extent() else {
            continue;
        };

        regions.push(Region {
            span: Span::new(cursor, child_extent.begin),
            child: None,
            include_end: false,
        });
        regions.push(Region {
            span: child_extent,
            child: Some(child),
            include_end: false,
        });
        cursor = child_extent.end;
    }

    regions.push(Region {
        span: Span::new(cursor, extent.end),
        child: None,
        include_end: is_root,
    });
    regions
}

/// Returns, in input order, the smallest element of any tree containing each span.
pub fn nodes_at_spans<'a>(
    trees: impl IntoIterator<Item = &'a Tree>,
    spans: &[Span],
) -> Vec<Option<SpanMatch<'a>>> {
    RegionMatcher::new(spans).match_spans(trees)
}

/// Returns the element owning a cursor position.
pub fn node_at<'a>(trees: impl IntoIterator<Item = &'a Tree>, position: Position) -> Option<NodeRef<'a>> {
    nodes_at_spans(trees, &[Span::point(position)])
        .pop()
        .flatten()
        .map(|m| m.node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DocumentSet, Fragment};

    fn p(column: usize) -> Position {
        Position::new(0, column)
    }

    fn name_at(tree: &Tree, span: Span) -> Option<String> {
        nodes_at_spans([tree], &[span])[0].map(|m| m.node.element().name().to_string())
    }

    #[test]
    fn test_text_belongs_to_parent() {
        let tree = Tree::parse(r#"<a x="1"><b/>hi</a>"#, 0).unwrap();
        let result = nodes_at_spans([&tree], &[Span::new(p(13), p(14))]);
        let m = result[0].unwrap();
        assert_eq!(m.node, tree.root());
        assert_eq!(m.span, Span::new(p(13), p(14)));
    }

    #[test]
    fn test_cursor_boundaries() {
        let tree = Tree::parse(r#"<a x="1"><b/>hi</a>"#, 0).unwrap();
        assert_eq!(name_at(&tree, Span::point(p(9))).as_deref(), Some("b"));
        assert_eq!(name_at(&tree, Span::point(p(11))).as_deref(), Some("b"));
        assert_eq!(name_at(&tree, Span::point(p(13))).as_deref(), Some("a"));
        assert_eq!(name_at(&tree, Span::point(p(0))).as_deref(), Some("a"));
        assert_eq!(name_at(&tree, Span::point(p(19))).as_deref(), Some("a"));
        assert_eq!(name_at(&tree, Span::point(p(20))), None);
    }

    #[test]
    fn test_open_tags_match_their_elements() {
        let tree = Tree::parse("<r><a><b/></a><c>t</c></r>", 0).unwrap();
        let nodes: Vec<_> = tree.descendants().collect();
        let spans: Vec<_> = nodes
            .iter()
            .map(|n| n.element().open_tag().unwrap())
            .collect();

        let mut matcher = RegionMatcher::new(&spans);
        let results = matcher.match_spans([&tree]);
        let found: Vec<_> = results.iter().map(|m| m.unwrap().node).collect();
        assert_eq!(found, nodes);
        assert_eq!(matcher.visited(), 2);
    }

    #[test]
    fn test_crossing_span_resolves_to_common_ancestor() {
        let tree = Tree::parse("<r><a><b/></a><c>t</c></r>", 0).unwrap();
        let result = nodes_at_spans([&tree], &[Span::new(p(8), p(16))]);
        let m = result[0].unwrap();
        assert_eq!(m.node, tree.root());
        assert_eq!(m.span, Span::new(p(8), p(16)));
    }

    #[test]
    fn test_results_keep_input_order() {
        let tree = Tree::parse("<r><a><b/></a><c>t</c></r>", 0).unwrap();
        let spans = [Span::point(p(17)), Span::point(p(7)), Span::point(p(1))];
        let names: Vec<_> = nodes_at_spans([&tree], &spans)
            .into_iter()
            .map(|m| m.unwrap().node.element().name().to_string())
            .collect();
        assert_eq!(names, ["c", "b", "r"]);
    }

    #[test]
    fn test_sparse_query_visits_only_ancestors() {
        let mut src = String::from("<root>");
        for _ in 0..200 {
            src.push_str("<item><x/></item>");
        }
        src.push_str("</root>");
        let tree = Tree::parse(&src, 0).unwrap();

        let target = tree.root().children().nth(150).unwrap();
        let x = target.children().next().unwrap();
        let cursor = Span::point(p(x.element().open_tag().unwrap().begin.column + 1));

        let mut matcher = RegionMatcher::new(&[cursor]);
        let result = matcher.match_spans([&tree]);
        assert_eq!(result[0].unwrap().node, x);
        assert_eq!(matcher.visited(), 2);
    }

    #[test]
    fn test_trees_without_queries_are_skipped() {
        let (set, errors) = DocumentSet::parse_fragments([
            Fragment::new("<a><b/></a>", 0),
            Fragment::new("<c><d/></c>", 5),
            Fragment::new("<e><f/></e>", 9),
        ]);
        assert!(errors.is_empty());

        let spans = [
            Span::point(Position::new(3, 0)),
            Span::point(Position::new(9, 4)),
        ];
        let mut matcher = RegionMatcher::new(&spans);
        let results = matcher.match_spans(&set);
        assert!(results[0].is_none());
        assert_eq!(results[1].unwrap().node.element().name(), "f");
        assert_eq!(matcher.visited(), 1);
    }
}
