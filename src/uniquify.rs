//! Collision-free prefixes for namespaces whose source prefixes are ambiguous or missing.
use crate::NamespaceBinding;
use std::collections::HashSet;

/// Options for [`unique_namespace_prefixes`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniquifyOptions {
    /// Name given to the default (unprefixed) namespace
    pub default_prefix: String,

    /// First numeric suffix appended when a prefix is bound to more than one URI
    pub start_index: usize,
}
impl Default for UniquifyOptions {
    fn default() -> Self {
        Self {
            default_prefix: "default".to_string(),
            start_index: 1,
        }
    }
}

/// One synthetic prefix of a [`NamespaceMap`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceMapping {
    /// The prefix to use in path expressions
    pub prefix: String,

    /// The namespace URI it stands for
    pub uri: String,

    /// The prefix the source used for the URI; `None` for the default namespace
    pub original: Option<String>,
}

/// A bijection from synthetic prefixes to `(uri, original prefix)`, in first-declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespaceMap {
    entries: Vec<NamespaceMapping>,
}
impl NamespaceMap {
    /// Iterates the mappings in first-declaration order
    pub fn iter(&self) -> std::slice::Iter<'_, NamespaceMapping> {
        self.entries.iter()
    }

    /// Number of synthetic prefixes
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Return true if len == 0
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The mapping of a synthetic prefix
    #[must_use]
    pub fn get(&self, prefix: &str) -> Option<&NamespaceMapping> {
        self.entries.iter().find(|e| e.prefix == prefix)
    }

    /// The URI a synthetic prefix stands for
    #[must_use]
    pub fn uri_for(&self, prefix: &str) -> Option<&str> {
        self.get(prefix).map(|e| e.uri.as_str())
    }

    /// The first synthetic prefix standing for a URI
    #[must_use]
    pub fn prefix_for_uri(&self, uri: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.uri == uri)
            .map(|e| e.prefix.as_str())
    }

    /// The source prefix behind a synthetic prefix
    #[must_use]
    pub fn original_prefix(&self, prefix: &str) -> Option<Option<&str>> {
        self.get(prefix).map(|e| e.original.as_deref())
    }

    /// `(prefix, uri)` pairs, the form path engines take
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|e| (e.prefix.as_str(), e.uri.as_str()))
    }
}
impl<'a> IntoIterator for &'a NamespaceMap {
    type Item = &'a NamespaceMapping;
    type IntoIter = std::slice::Iter<'a, NamespaceMapping>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Builds a collision-free prefix map from namespace bindings in document order.
///
/// - A prefix bound to a single URI keeps its name
/// - A prefix bound to several URIs keeps its name for the first, and gets a numeric suffix
///   for each other one, skipping names that are real prefixes or already taken
/// - The default namespace is named after [`UniquifyOptions::default_prefix`]
///
/// # Example
/// ```rust
/// use markup_locator::{NamespaceBinding, UniquifyOptions, unique_namespace_prefixes};
///
/// let bindings = [
///     NamespaceBinding::new(Some("p"), "u1"),
///     NamespaceBinding::new(Some("p"), "u2"),
/// ];
/// let map = unique_namespace_prefixes(&bindings, &UniquifyOptions::default());
/// assert_eq!(map.uri_for("p"), Some("u1"));
/// assert_eq!(map.uri_for("p1"), Some("u2"));
/// ```
#[must_use]
pub fn unique_namespace_prefixes(
    bindings: &[NamespaceBinding],
    options: &UniquifyOptions,
) -> NamespaceMap {
    let real: HashSet<&str> = bindings.iter().filter_map(|b| b.prefix.as_deref()).collect();

    //
    // Group the distinct URIs by prefix, in first-seen order
    let mut groups: Vec<(Option<&str>, Vec<&str>)> = vec![];
    for binding in bindings {
        let prefix = binding.prefix.as_deref();
        let uri = binding.uri.as_str();
        match groups.iter_mut().find(|(p, _)| *p == prefix) {
            Some((_, uris)) if uris.contains(&uri) => {}
            Some((_, uris)) => uris.push(uri),
            None => groups.push((prefix, vec![uri])),
        }
    }

    let mut assigned: HashSet<String> = HashSet::new();
    let mut entries = vec![];
    for (prefix, uris) in groups {
        let name = prefix.unwrap_or(&options.default_prefix);
        let bare_allowed = prefix.is_some() || !real.contains(name);

        let mut index = options.start_index;
        for (i, uri) in uris.into_iter().enumerate() {
            let synthetic = if i == 0 && bare_allowed && !assigned.contains(name) {
                name.to_string()
            } else {
                let mut candidate = format!("{name}{index}");
                while real.contains(candidate.as_str()) || assigned.contains(&candidate) {
                    index += 1;
                    candidate = format!("{name}{index}");
                }
                index += 1;

                log::debug!("namespace {uri} renamed from {name} to {candidate}");
                candidate
            };

            assigned.insert(synthetic.clone());
            entries.push(NamespaceMapping {
                prefix: synthetic,
                uri: uri.to_string(),
                original: prefix.map(str::to_string),
            });
        }
    }

    NamespaceMap { entries }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bind(prefix: Option<&str>, uri: &str) -> NamespaceBinding {
        NamespaceBinding::new(prefix, uri)
    }

    fn prefixes(map: &NamespaceMap) -> Vec<(&str, &str)> {
        map.pairs().collect()
    }

    #[test]
    fn test_single_uri_keeps_prefix() {
        let map = unique_namespace_prefixes(
            &[bind(Some("svg"), "urn:svg"), bind(Some("svg"), "urn:svg")],
            &UniquifyOptions::default(),
        );
        assert_eq!(prefixes(&map), [("svg", "urn:svg")]);
        assert_eq!(map.original_prefix("svg"), Some(Some("svg")));
    }

    #[test]
    fn test_suffix_skips_real_prefixes() {
        let map = unique_namespace_prefixes(
            &[
                bind(Some("p"), "u1"),
                bind(Some("p"), "u2"),
                bind(Some("p1"), "u3"),
                bind(Some("p"), "u4"),
            ],
            &UniquifyOptions::default(),
        );
        assert_eq!(
            prefixes(&map),
            [("p", "u1"), ("p2", "u2"), ("p3", "u4"), ("p1", "u3")]
        );
        assert_eq!(map.original_prefix("p3"), Some(Some("p")));
    }

    #[test]
    fn test_default_namespace() {
        let map = unique_namespace_prefixes(
            &[bind(None, "u1"), bind(Some("x"), "u2"), bind(None, "u3")],
            &UniquifyOptions::default(),
        );
        assert_eq!(
            prefixes(&map),
            [("default", "u1"), ("default1", "u3"), ("x", "u2")]
        );
        assert_eq!(map.original_prefix("default1"), Some(None));
        assert_eq!(map.prefix_for_uri("u3"), Some("default1"));
    }

    #[test]
    fn test_default_name_taken_by_real_prefix() {
        let options = UniquifyOptions {
            default_prefix: "d".to_string(),
            start_index: 0,
        };
        let map = unique_namespace_prefixes(&[bind(None, "u1"), bind(Some("d"), "u2")], &options);
        assert_eq!(prefixes(&map), [("d0", "u1"), ("d", "u2")]);
    }

    #[test]
    fn test_empty() {
        let map = unique_namespace_prefixes(&[], &UniquifyOptions::default());
        assert!(map.is_empty());
        assert_eq!(map.uri_for("p"), None);
    }
}
