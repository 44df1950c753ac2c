//! Prefix to namespace URI bindings, scoped to open elements
use std::collections::HashMap;

/// The URI permanently bound to the `xml` prefix.
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// A prefix bound to a namespace URI. A `None` prefix is the default namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamespaceBinding {
    /// The declared prefix, `None` for `xmlns="..."`
    pub prefix: Option<String>,

    /// The namespace URI
    pub uri: String,
}
impl NamespaceBinding {
    /// Create a new binding
    pub fn new(prefix: Option<impl Into<String>>, uri: impl Into<String>) -> Self {
        Self {
            prefix: prefix.map(Into::into),
            uri: uri.into(),
        }
    }
}
impl std::fmt::Display for NamespaceBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.prefix {
            Some(prefix) => write!(f, "xmlns:{prefix}=\"{}\"", self.uri),
            None => write!(f, "xmlns=\"{}\"", self.uri),
        }
    }
}

/// A stack of namespace frames, one per open element.
///
/// Lookups walk from the innermost frame outward, so closing an element makes any binding it
/// shadowed - including the default namespace - visible again.
/// Every distinct binding ever made is also kept in first-declaration order.
#[derive(Debug, Clone, Default)]
pub struct NamespaceScopes {
    frames: Vec<HashMap<Option<String>, String>>,
    document_order: Vec<NamespaceBinding>,
}
impl NamespaceScopes {
    /// Creates an empty stack
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a new, empty frame.
    pub fn push_scope(&mut self) {
        self.frames.push(HashMap::new());
    }

    /// Binds a prefix (or the default namespace) in the innermost frame.
    ///
    /// An empty URI undeclares the prefix for this scope. Binding with no frame open starts a
    /// document-level frame.
    pub fn bind(&mut self, prefix: Option<&str>, uri: &str) {
        if self.frames.is_empty() {
            self.push_scope();
        }

        if let Some(frame) = self.frames.last_mut() {
            frame.insert(prefix.map(str::to_string), uri.to_string());
        }

        if uri.is_empty() {
            return;
        }

        let binding = NamespaceBinding::new(prefix, uri);
        if !self.document_order.contains(&binding) {
            log::trace!("new namespace binding {binding}");
            self.document_order.push(binding);
        }
    }

    /// Resolves a prefix (or the default namespace) against the open frames.
    #[must_use]
    pub fn resolve(&self, prefix: Option<&str>) -> Option<&str> {
        if prefix == Some("xml") {
            return Some(XML_NAMESPACE);
        }

        let key = prefix.map(str::to_string);
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.get(&key))
            .map(String::as_str)
            .filter(|uri| !uri.is_empty())
    }

    /// Discards the innermost frame, returning its bindings.
    ///
    /// Returns `None` if no frame is open; that is a bug in the caller.
    pub fn pop_scope(&mut self) -> Option<Vec<NamespaceBinding>> {
        let frame = self.frames.pop()?;
        Some(
            frame
                .into_iter()
                .map(|(prefix, uri)| NamespaceBinding { prefix, uri })
                .collect(),
        )
    }

    /// Number of open frames
    #[must_use]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// All bindings visible right now, innermost winning
    #[must_use]
    pub fn in_scope(&self) -> Vec<NamespaceBinding> {
        let mut flattened: Vec<NamespaceBinding> = vec![];
        for frame in &self.frames {
            for (prefix, uri) in frame {
                flattened.retain(|b| &b.prefix != prefix);
                if !uri.is_empty() {
                    flattened.push(NamespaceBinding {
                        prefix: prefix.clone(),
                        uri: uri.clone(),
                    });
                }
            }
        }
        flattened
    }

    /// Every distinct binding made so far, in first-declaration order
    #[must_use]
    pub fn document_order(&self) -> &[NamespaceBinding] {
        &self.document_order
    }

    /// Consumes the stack, keeping only the document-order list
    #[must_use]
    pub fn into_document_order(self) -> Vec<NamespaceBinding> {
        self.document_order
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_innermost_first() {
        let mut scopes = NamespaceScopes::new();
        scopes.push_scope();
        scopes.bind(Some("p"), "urn:outer");
        scopes.push_scope();
        scopes.bind(Some("p"), "urn:inner");

        assert_eq!(scopes.resolve(Some("p")), Some("urn:inner"));
        scopes.pop_scope();
        assert_eq!(scopes.resolve(Some("p")), Some("urn:outer"));
        scopes.pop_scope();
        assert_eq!(scopes.resolve(Some("p")), None);
    }

    #[test]
    fn test_default_namespace_falls_back() {
        let mut scopes = NamespaceScopes::new();
        scopes.push_scope();
        scopes.bind(None, "urn:a");
        scopes.push_scope();
        scopes.push_scope();
        scopes.bind(None, "urn:b");

        assert_eq!(scopes.resolve(None), Some("urn:b"));
        scopes.pop_scope();
        assert_eq!(scopes.resolve(None), Some("urn:a"));
        scopes.pop_scope();
        assert_eq!(scopes.resolve(None), Some("urn:a"));
    }

    #[test]
    fn test_empty_uri_undeclares() {
        let mut scopes = NamespaceScopes::new();
        scopes.push_scope();
        scopes.bind(None, "urn:a");
        scopes.push_scope();
        scopes.bind(None, "");
        assert_eq!(scopes.resolve(None), None);
        scopes.pop_scope();
        assert_eq!(scopes.resolve(None), Some("urn:a"));
        assert_eq!(scopes.document_order().len(), 1);
    }

    #[test]
    fn test_document_order_is_distinct() {
        let mut scopes = NamespaceScopes::new();
        scopes.push_scope();
        scopes.bind(Some("a"), "urn:1");
        scopes.bind(None, "urn:d");
        scopes.push_scope();
        scopes.bind(Some("a"), "urn:1");
        scopes.bind(Some("a"), "urn:2");

        assert_eq!(
            scopes.document_order(),
            &[
                NamespaceBinding::new(Some("a"), "urn:1"),
                NamespaceBinding::new(None::<&str>, "urn:d"),
                NamespaceBinding::new(Some("a"), "urn:2"),
            ]
        );
    }

    #[test]
    fn test_xml_prefix_is_builtin() {
        let scopes = NamespaceScopes::new();
        assert_eq!(scopes.resolve(Some("xml")), Some(XML_NAMESPACE));
    }

    #[test]
    fn test_pop_more_than_pushed() {
        let mut scopes = NamespaceScopes::new();
        scopes.push_scope();
        assert!(scopes.pop_scope().is_some());
        assert!(scopes.pop_scope().is_none());
    }

    #[test]
    fn test_in_scope_flattens() {
        let mut scopes = NamespaceScopes::new();
        scopes.push_scope();
        scopes.bind(Some("a"), "urn:1");
        scopes.push_scope();
        scopes.bind(Some("a"), "urn:2");
        scopes.bind(Some("b"), "urn:3");

        let visible = scopes.in_scope();
        assert_eq!(visible.len(), 2);
        assert!(visible.contains(&NamespaceBinding::new(Some("a"), "urn:2")));
        assert!(visible.contains(&NamespaceBinding::new(Some("b"), "urn:3")));
    }
}
