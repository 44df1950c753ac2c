/// The name of a node as written in the source, with an optional prefix:
/// `prefix:local`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeName {
    prefix: Option<String>,
    local: String,
}
impl NodeName {
    /// Create a new node name. An empty prefix is treated as no prefix.
    pub fn new<T: Into<String>>(prefix: Option<T>, local: T) -> Self {
        Self {
            prefix: prefix.map(Into::into).filter(|p: &String| !p.is_empty()),
            local: local.into(),
        }
    }

    /// Splits a qualified name at its first `:`.
    #[must_use]
    pub fn parse(qualified: &str) -> Self {
        match qualified.split_once(':') {
            Some((prefix, local)) => Self::new(Some(prefix), local),
            None => Self::new(None, qualified),
        }
    }

    /// Compare the name with a prefix and local name.
    #[must_use]
    pub fn equals(&self, prefix: Option<&str>, local: &str) -> bool {
        self.prefix.as_deref() == prefix && self.local == local
    }

    /// Returns the prefix of the node name.
    #[must_use]
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Returns the local portion of the node name.
    #[must_use]
    pub fn local(&self) -> &str {
        &self.local
    }

    /// Number of characters the name occupies in the source
    #[must_use]
    pub fn char_len(&self) -> usize {
        let local = self.local.chars().count();
        match &self.prefix {
            Some(prefix) => prefix.chars().count() + 1 + local,
            None => local,
        }
    }
}
impl std::fmt::Display for NodeName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(prefix) = &self.prefix {
            write!(f, "{prefix}:{local}", local = self.local)
        } else {
            write!(f, "{local}", local = self.local)
        }
    }
}
impl PartialEq<&str> for NodeName {
    fn eq(&self, other: &&str) -> bool {
        self.to_string().as_str() == *other
    }
}
impl PartialEq<str> for NodeName {
    fn eq(&self, other: &str) -> bool {
        self.to_string().as_str() == other
    }
}
impl From<&str> for NodeName {
    fn from(name: &str) -> Self {
        NodeName::parse(name)
    }
}

/// A namespace-resolved name: a namespace URI (if any) and a local name.
///
/// Displayed in Clark notation, `{uri}local`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QualifiedName {
    /// The namespace URI
    pub namespace: Option<String>,

    /// The local name
    pub local: String,
}
impl QualifiedName {
    /// Create a new qualified name.
    pub fn new(namespace: Option<impl Into<String>>, local: impl Into<String>) -> Self {
        Self {
            namespace: namespace.map(Into::into),
            local: local.into(),
        }
    }

    /// Compare with a namespace and local name.
    #[must_use]
    pub fn equals(&self, namespace: Option<&str>, local: &str) -> bool {
        self.namespace.as_deref() == namespace && self.local == local
    }
}
impl std::fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.namespace {
            Some(namespace) => write!(f, "{{{namespace}}}{}", self.local),
            None => write!(f, "{}", self.local),
        }
    }
}
