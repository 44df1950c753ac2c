//! Moving between elements, and turning query results into spans of text to select.
use crate::{
    NodeRef, Position, PositionField, QueryItem, Span, Tree,
    error::{QueryError, QueryResult},
    locator::LineIndex,
};
use std::str::FromStr;

/// Which part of an element to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementPart {
    /// The name in the start tag
    Open,

    /// The name in the end tag; the start tag's name for a self-closing element
    Close,

    /// The names in both tags
    Names,

    /// Everything between the start and end tags
    Content,

    /// The whole element
    Entire,

    /// The attribute area of the start tag, between the name and the closing `>` or `/>`
    OpenAttributes,
}

/// Which part of an attribute to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributePart {
    /// Report the owning element instead, as for an element result
    Element,

    /// The attribute name
    Name,

    /// The value, without the quotes
    Value,

    /// The whole `name="value"`
    Entire,

    /// Nothing
    None,
}

/// A step from one element to a related one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// The next sibling element
    Next,

    /// The previous sibling element
    Previous,

    /// The parent element
    Parent,

    /// The element itself, with the part of it to report
    Current(ElementPart),
}
impl FromStr for Direction {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "next" => Self::Next,
            "prev" | "previous" => Self::Previous,
            "parent" => Self::Parent,
            "open" => Self::Current(ElementPart::Open),
            "close" => Self::Current(ElementPart::Close),
            "names" => Self::Current(ElementPart::Names),
            "content" => Self::Current(ElementPart::Content),
            "entire" => Self::Current(ElementPart::Entire),
            _ => return Err(QueryError::InvalidDirection(s.to_string())),
        })
    }
}

/// The element one step away from `node`.
#[must_use]
pub fn relative_node<'a>(node: NodeRef<'a>, direction: Direction) -> Option<NodeRef<'a>> {
    match direction {
        Direction::Next => node.next_sibling(),
        Direction::Previous => node.prev_sibling(),
        Direction::Parent => node.parent(),
        Direction::Current(_) => Some(node),
    }
}

fn required(position: Option<Position>) -> QueryResult<Position> {
    position.ok_or(QueryError::MissingLocation)
}

/// The spans of one part of an element.
///
/// # Errors
/// Returns [`QueryError::MissingLocation`] if a needed position was never recorded
pub fn element_regions(node: NodeRef<'_>, part: ElementPart) -> QueryResult<Vec<Span>> {
    let element = node.element();
    let name_len = element.name().char_len();
    let open_start = required(element.position(PositionField::OpenTagStart))?;
    let open_name = Span::new(
        open_start.offset_columns(1),
        open_start.offset_columns(1 + name_len),
    );

    let close_name = || -> QueryResult<Span> {
        if element.is_self_closing() {
            return Ok(open_name);
        }

        let close_start = required(element.position(PositionField::CloseTagStart))?;
        Ok(Span::new(
            close_start.offset_columns(2),
            close_start.offset_columns(2 + name_len),
        ))
    };

    Ok(match part {
        ElementPart::Open => vec![open_name],
        ElementPart::Close => vec![close_name()?],
        ElementPart::Names => {
            let close = close_name()?;
            if close == open_name {
                vec![open_name]
            } else {
                vec![open_name, close]
            }
        }

        ElementPart::Content => {
            if element.is_self_closing() {
                let at = element
                    .delimiter()
                    .or(element.position(PositionField::OpenTagEnd));
                vec![Span::point(required(at)?)]
            } else {
                let begin = required(element.position(PositionField::OpenTagEnd))?;
                let end = required(element.position(PositionField::CloseTagStart))?;
                vec![Span::new(begin, end)]
            }
        }

        ElementPart::Entire => vec![element.extent().ok_or(QueryError::MissingLocation)?],

        ElementPart::OpenAttributes => {
            let end = required(element.delimiter())?;
            vec![Span::new(open_name.end, end)]
        }
    })
}

/// The span of a run of text: an element's leading text, or the tail after it.
///
/// # Errors
/// Returns [`QueryError::MissingLocation`] if a needed position was never recorded, and
/// [`QueryError::UnresolvedReference`] for the tail of a root element
pub fn text_region(node: NodeRef<'_>, is_tail: bool) -> QueryResult<Span> {
    let element = node.element();
    if !is_tail {
        let begin = required(element.position(PositionField::OpenTagEnd))?;
        let end = match node.children().next() {
            Some(child) => child.position(PositionField::OpenTagStart),
            None => element.position(PositionField::CloseTagStart),
        };
        return Ok(Span::new(begin, required(end)?));
    }

    let parent = node.parent().ok_or(QueryError::UnresolvedReference)?;
    let begin = required(element.position(PositionField::CloseTagEnd))?;
    let end = match node.next_sibling() {
        Some(sibling) => sibling.position(PositionField::OpenTagStart),
        None => parent.position(PositionField::CloseTagStart),
    };
    Ok(Span::new(begin, required(end)?))
}

/// The spans to report for one query result.
///
/// # Errors
/// Returns an error if the item cannot be traced back to the tree, or a needed position is
/// missing
pub fn regions_of_item(
    tree: &Tree,
    item: &QueryItem,
    element_part: ElementPart,
    attribute_part: AttributePart,
) -> QueryResult<Vec<Span>> {
    let node = item.node(tree)?;
    match item {
        QueryItem::Attribute { name, .. } => {
            let Some(attribute) = node
                .element()
                .get_attribute(name.namespace.as_deref(), &name.local)
            else {
                return Err(QueryError::UnresolvedReference);
            };

            Ok(match attribute_part {
                AttributePart::Element => element_regions(node, element_part)?,
                AttributePart::Name => vec![attribute.name_span()],
                AttributePart::Value => vec![attribute.value_span()],
                AttributePart::Entire => vec![attribute.span()],
                AttributePart::None => vec![],
            })
        }

        QueryItem::Text { is_tail, .. } => Ok(vec![text_region(node, *is_tail)?]),
        _ => element_regions(node, element_part),
    }
}

/// The spans to report for a batch of query results, in result order.
///
/// Items that fail are skipped; the others are still reported.
pub fn regions_of_results(
    tree: &Tree,
    items: &[QueryItem],
    element_part: ElementPart,
    attribute_part: AttributePart,
) -> Vec<Span> {
    let mut regions = vec![];
    for item in items {
        match regions_of_item(tree, item, element_part, attribute_part) {
            Ok(spans) => regions.extend(spans),
            Err(e) => log::debug!("no region for query result: {e}"),
        }
    }
    regions
}

/// Collapses whitespace to single spaces and trims, cutting the result to `max_len`
/// characters followed by `...`.
#[must_use]
pub fn collapse_whitespace(text: &str, max_len: Option<usize>) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    match max_len {
        Some(max) if collapsed.chars().count() > max => {
            let mut cut: String = collapsed.chars().take(max).collect();
            cut.push_str("...");
            cut
        }
        _ => collapsed,
    }
}

/// A one-line preview of an element's source text.
///
/// `source` must be the text the tree was parsed from.
///
/// # Errors
/// Returns [`QueryError::MissingLocation`] if the element's extent is unknown or does not lie
/// within `source`
pub fn element_preview(
    source: &str,
    node: NodeRef<'_>,
    max_len: Option<usize>,
) -> QueryResult<String> {
    let extent = node.extent().ok_or(QueryError::MissingLocation)?;
    let index = LineIndex::new(source, node.tree().line_offset());
    let text = index.slice(&extent).ok_or(QueryError::MissingLocation)?;
    Ok(collapse_whitespace(text, max_len))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{NodeId, QualifiedName};

    const SOURCE: &str = r#"<root>
  <item id="1">one</item> tail
  <empty a='x'/>
</root>"#;

    fn p(row: usize, column: usize) -> Position {
        Position::new(row, column)
    }

    fn slices(tree: &Tree, spans: &[Span]) -> Vec<String> {
        let index = LineIndex::new(SOURCE, tree.line_offset());
        spans
            .iter()
            .map(|s| index.slice(s).unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_directions() {
        let tree = Tree::parse(SOURCE, 0).unwrap();
        let item = tree.root().children().next().unwrap();

        let next = relative_node(item, "next".parse().unwrap()).unwrap();
        assert_eq!(next.element().name(), "empty");
        assert_eq!(relative_node(next, "prev".parse().unwrap()), Some(item));
        assert_eq!(relative_node(item, "previous".parse().unwrap()), None);
        assert_eq!(relative_node(item, "parent".parse().unwrap()), Some(tree.root()));
        assert_eq!(relative_node(item, "names".parse().unwrap()), Some(item));

        let error = "sideways".parse::<Direction>().unwrap_err();
        assert!(matches!(error, QueryError::InvalidDirection(ref d) if d == "sideways"));
    }

    #[test]
    fn test_element_parts() {
        let tree = Tree::parse(SOURCE, 0).unwrap();
        let item = tree.root().children().next().unwrap();
        let region = |part| slices(&tree, &element_regions(item, part).unwrap());

        assert_eq!(region(ElementPart::Open), ["item"]);
        assert_eq!(region(ElementPart::Close), ["item"]);
        assert_eq!(region(ElementPart::Names).len(), 2);
        assert_eq!(region(ElementPart::Content), ["one"]);
        assert_eq!(region(ElementPart::Entire), [r#"<item id="1">one</item>"#]);
        assert_eq!(region(ElementPart::OpenAttributes), [r#" id="1""#]);
    }

    #[test]
    fn test_self_closing_parts() {
        let tree = Tree::parse(SOURCE, 0).unwrap();
        let empty = tree.root().children().nth(1).unwrap();
        let names = element_regions(empty, ElementPart::Names).unwrap();
        assert_eq!(names, [Span::new(p(2, 3), p(2, 8))]);
        assert_eq!(
            element_regions(empty, ElementPart::Content).unwrap(),
            [Span::point(p(2, 14))]
        );
    }

    #[test]
    fn test_result_regions() {
        let tree = Tree::parse(SOURCE, 0).unwrap();
        let attribute = |part| {
            regions_of_item(
                &tree,
                &QueryItem::Attribute {
                    owner: NodeId(2),
                    name: QualifiedName::new(None::<&str>, "a"),
                },
                ElementPart::Open,
                part,
            )
            .unwrap()
        };
        assert_eq!(slices(&tree, &attribute(AttributePart::Name)), ["a"]);
        assert_eq!(slices(&tree, &attribute(AttributePart::Value)), ["x"]);
        assert_eq!(slices(&tree, &attribute(AttributePart::Entire)), ["a='x'"]);
        assert_eq!(slices(&tree, &attribute(AttributePart::Element)), ["empty"]);
        assert!(attribute(AttributePart::None).is_empty());

        let items = [
            QueryItem::Text {
                owner: NodeId(1),
                is_tail: false,
            },
            QueryItem::Boolean(true),
            QueryItem::Text {
                owner: NodeId(1),
                is_tail: true,
            },
        ];
        let regions = regions_of_results(&tree, &items, ElementPart::Open, AttributePart::None);
        assert_eq!(slices(&tree, &regions), ["one", " tail\n  "]);
    }

    #[test]
    fn test_previews() {
        assert_eq!(collapse_whitespace("  a\n\tb   c ", None), "a b c");
        assert_eq!(collapse_whitespace("abcdef", Some(3)), "abc...");
        assert_eq!(collapse_whitespace("abc", Some(3)), "abc");

        let tree = Tree::parse(SOURCE, 7).unwrap();
        let preview = element_preview(SOURCE, tree.root(), Some(20)).unwrap();
        assert_eq!(preview, r#"<root> <item id="1">..."#);
    }
}
