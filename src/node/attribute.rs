use super::{NodeName, QualifiedName};
use crate::Span;

/// An attribute set on an element, with a name and value:
/// `name="value"`
///
/// Namespace declarations (`xmlns`, `xmlns:*`) never appear as attributes; they become
/// namespace bindings instead.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    name: NodeName,
    namespace: Option<String>,
    value: String,
    name_span: Span,
    value_span: Span,
}
impl Attribute {
    pub(crate) fn new(
        name: NodeName,
        namespace: Option<String>,
        value: String,
        name_span: Span,
        value_span: Span,
    ) -> Self {
        Self {
            name,
            namespace,
            value,
            name_span,
            value_span,
        }
    }

    /// Returns the name of the attribute, as written.
    #[must_use]
    pub fn name(&self) -> &NodeName {
        &self.name
    }

    /// Returns the namespace URI the attribute's prefix resolved to.
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Returns the namespace-resolved name of the attribute.
    #[must_use]
    pub fn qualified_name(&self) -> QualifiedName {
        QualifiedName::new(self.namespace.clone(), self.name.local())
    }

    /// Returns the decoded value of the attribute.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Where the name is written in the source
    #[must_use]
    pub fn name_span(&self) -> Span {
        self.name_span
    }

    /// Where the value is written in the source, excluding the quotes
    #[must_use]
    pub fn value_span(&self) -> Span {
        self.value_span
    }

    /// The whole `name="value"` declaration, closing quote included
    #[must_use]
    pub fn span(&self) -> Span {
        Span::new(self.name_span.begin, self.value_span.end.offset_columns(1))
    }
}
