use super::{
    Attribute, LOCATION_NAMESPACE, NodeName, PositionField, QualifiedName, TagPositions,
};
use crate::{NodeId, Position, Span};
use std::borrow::Cow;

/// An element of the tree, with a name, attributes, children and the positions of its tags:
/// `<name attr="value">text<child/>tail</name>`
///
/// Text is attached the way the tree stores it: text before the first child is the element's
/// `text`, text after a child is that child's `tail`.
///
/// Duplicate attributes are allowed (searches use the last attribute with the same name).
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub(crate) name: NodeName,
    pub(crate) namespace: Option<String>,
    pub(crate) attributes: Vec<Attribute>,
    pub(crate) text: Option<String>,
    pub(crate) tail: Option<String>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) positions: TagPositions,
    pub(crate) delimiter: Option<Position>,
}
impl Element {
    pub(crate) fn new(name: NodeName, namespace: Option<String>, parent: Option<NodeId>) -> Self {
        Self {
            name,
            namespace,
            attributes: vec![],
            text: None,
            tail: None,
            parent,
            children: vec![],
            positions: TagPositions::default(),
            delimiter: None,
        }
    }

    /// Get the name of the element, as written.
    #[must_use]
    pub fn name(&self) -> &NodeName {
        &self.name
    }

    /// Get the namespace URI of the element.
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Get the namespace-resolved name of the element.
    #[must_use]
    pub fn qualified_name(&self) -> QualifiedName {
        QualifiedName::new(self.namespace.clone(), self.name.local())
    }

    /// Get the attributes of the element, in source order.
    #[must_use]
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Get an attribute by namespace URI and local name.
    ///
    /// Searches the attributes in reverse order, so the last attribute with the same name is returned.
    #[must_use]
    pub fn get_attribute(&self, namespace: Option<&str>, local: &str) -> Option<&Attribute> {
        self.attributes
            .iter()
            .rev()
            .find(|a| a.namespace() == namespace && a.name().local() == local)
    }

    /// Get an attribute value by namespace URI and local name, including location pseudo-attributes.
    #[must_use]
    pub fn attribute(&self, namespace: Option<&str>, local: &str) -> Option<Cow<'_, str>> {
        if namespace == Some(LOCATION_NAMESPACE) {
            let field = PositionField::from_attribute_name(local)?;
            return self
                .positions
                .get(field)
                .map(|p| Cow::Owned(p.to_string()));
        }

        self.get_attribute(namespace, local)
            .map(|a| Cow::Borrowed(a.value()))
    }

    /// Location pseudo-attributes for every recorded position, as `({namespace}local, "row/col")`
    pub fn location_attributes(&self) -> impl Iterator<Item = (QualifiedName, String)> + '_ {
        PositionField::ALL.into_iter().filter_map(|field| {
            let position = self.positions.get(field)?;
            Some((
                QualifiedName::new(Some(LOCATION_NAMESPACE), field.attribute_name()),
                position.to_string(),
            ))
        })
    }

    /// The real attributes followed by the location pseudo-attributes.
    ///
    /// Lets generic code copy or serialize the element without losing its location.
    pub fn attributes_with_locations(&self) -> impl Iterator<Item = (QualifiedName, String)> + '_ {
        self.attributes
            .iter()
            .map(|a| (a.qualified_name(), a.value().to_string()))
            .chain(self.location_attributes())
    }

    /// Text directly after the start tag, before any child
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Text directly after this element's end tag, before the next sibling
    #[must_use]
    pub fn tail(&self) -> Option<&str> {
        self.tail.as_deref()
    }

    /// The parent element
    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// The child elements, in document order
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// The recorded tag positions
    #[must_use]
    pub fn positions(&self) -> &TagPositions {
        &self.positions
    }

    /// Returns the recorded value of a position field
    #[must_use]
    pub fn position(&self, field: PositionField) -> Option<Position> {
        self.positions.get(field)
    }

    /// Where the start tag's closing delimiter (`>` or `/>`) begins
    #[must_use]
    pub fn delimiter(&self) -> Option<Position> {
        self.delimiter
    }

    /// The span of the open tag
    #[must_use]
    pub fn open_tag(&self) -> Option<Span> {
        self.positions.open_tag()
    }

    /// The span of the close tag; same as the open tag for a self-closing element
    #[must_use]
    pub fn close_tag(&self) -> Option<Span> {
        self.positions.close_tag()
    }

    /// The rendered extent: start tag, content and end tag together
    #[must_use]
    pub fn extent(&self) -> Option<Span> {
        self.positions.extent()
    }

    /// True if the element was written as a single `<name/>` tag
    #[must_use]
    pub fn is_self_closing(&self) -> bool {
        matches!((self.open_tag(), self.close_tag()), (Some(open), Some(close)) if open == close)
    }
}
