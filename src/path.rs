//! Generates path expressions that designate exactly one element.
//!
//! Paths are written in the abbreviated location-path form: `/a/p:b[2][@id = "x"]`.
use crate::{
    Attribute, Element, NamespaceMap, NodeName, NodeRef, Tree, UniquifyOptions,
    error::{QueryError, QueryResult},
    unique_namespace_prefixes,
};
use serde::{Deserialize, Serialize};
use std::{borrow::Cow, collections::HashSet};

/// Options controlling the generated paths.
///
/// Unknown options are rejected when read from JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathOptions {
    /// Add a `[n]` predicate when siblings share the element's name
    pub include_sibling_index: bool,

    /// Add `[@name = "value"]` predicates for allowed attributes
    pub include_attributes: bool,

    /// Use collision-free prefixes instead of the prefixes written in the source
    pub remap_namespace_prefixes: bool,

    /// Compare element and attribute names case-sensitively
    pub case_sensitive: bool,

    /// Attribute names to include: `name`, `prefix:name`, `prefix:*`, `*:name` or `*`.
    /// An empty list includes none.
    pub attribute_allow_list: Vec<String>,

    /// Drop repeated paths from batch output
    pub unique: bool,

    /// Prefix given to the default namespace when remapping
    pub default_namespace_prefix: String,
}
impl Default for PathOptions {
    fn default() -> Self {
        Self {
            include_sibling_index: true,
            include_attributes: false,
            remap_namespace_prefixes: false,
            case_sensitive: true,
            attribute_allow_list: vec![],
            unique: true,
            default_namespace_prefix: "default".to_string(),
        }
    }
}
impl PathOptions {
    /// Reads options from a JSON object. Missing options keep their defaults.
    ///
    /// # Errors
    /// Returns [`QueryError::InvalidConfig`] for unknown options or mistyped values
    pub fn from_json(json: &str) -> QueryResult<Self> {
        serde_json::from_str(json).map_err(|e| QueryError::InvalidConfig(e.to_string()))
    }

    /// The uniquifier options matching these path options
    #[must_use]
    pub fn uniquify_options(&self) -> UniquifyOptions {
        UniquifyOptions {
            default_prefix: self.default_namespace_prefix.clone(),
            ..UniquifyOptions::default()
        }
    }
}

/// Where a generated path starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathMode<'a> {
    /// From the document root, with a leading `/`
    Absolute,

    /// From the given ancestor, without a leading `/`
    RelativeTo(NodeRef<'a>),
}

/// Writes path expressions with a fixed set of options.
#[derive(Debug, Clone, Copy)]
pub struct PathGenerator<'o> {
    options: &'o PathOptions,
    namespaces: Option<&'o NamespaceMap>,
}
impl<'o> PathGenerator<'o> {
    /// Creates a generator. With `namespaces`, names are written with the map's prefixes.
    #[must_use]
    pub fn new(options: &'o PathOptions, namespaces: Option<&'o NamespaceMap>) -> Self {
        Self {
            options,
            namespaces,
        }
    }

    /// Returns the path designating `node`.
    ///
    /// # Errors
    /// Returns [`QueryError::NotAnAncestor`] if a relative root does not enclose the node
    pub fn path(&self, node: NodeRef<'_>, mode: PathMode<'_>) -> QueryResult<String> {
        let stop = match mode {
            PathMode::Absolute => None,
            PathMode::RelativeTo(ancestor) => {
                if !ancestor.is_ancestor_of(&node) {
                    return Err(QueryError::NotAnAncestor);
                }
                if ancestor.id() == node.id() {
                    return Ok(".".to_string());
                }
                Some(ancestor.id())
            }
        };

        let mut segments: Vec<String> = node
            .ancestors()
            .take_while(|n| Some(n.id()) != stop)
            .map(|n| self.segment(n))
            .collect();
        segments.reverse();

        let path = segments.join("/");
        Ok(match stop {
            None => format!("/{path}"),
            Some(_) => path,
        })
    }

    /// One step of a path: name, sibling index and attribute predicates.
    #[must_use]
    pub fn segment(&self, node: NodeRef<'_>) -> String {
        let element = node.element();
        let mut segment = self.element_name(element);

        if self.options.include_sibling_index {
            let key = self.sibling_key(element);
            let before = node
                .prev_siblings()
                .filter(|n| self.sibling_key(n.element()) == key)
                .count();
            let after = node
                .next_siblings()
                .any(|n| self.sibling_key(n.element()) == key);

            if before > 0 || after {
                segment.push_str(&format!("[{}]", before + 1));
            }
        }

        if self.options.include_attributes {
            let clauses: Vec<String> = element
                .attributes()
                .iter()
                .filter(|a| self.allows(a.name()))
                .map(|a| format!("@{} = {}", self.attribute_name(a), quote_literal(a.value())))
                .collect();

            if !clauses.is_empty() {
                segment.push_str(&format!("[{}]", clauses.join(" and ")));
            }
        }

        segment
    }

    fn remapped(&self, namespace: Option<&str>, name: &NodeName) -> String {
        let prefix = namespace.and_then(|uri| self.namespaces?.prefix_for_uri(uri));
        match prefix {
            Some(prefix) => format!("{prefix}:{}", name.local()),
            None => name.to_string(),
        }
    }

    fn element_name(&self, element: &Element) -> String {
        self.remapped(element.namespace(), element.name())
    }

    fn attribute_name(&self, attribute: &Attribute) -> String {
        self.remapped(attribute.namespace(), attribute.name())
    }

    fn fold<'s>(&self, name: &'s str) -> Cow<'s, str> {
        if self.options.case_sensitive {
            Cow::Borrowed(name)
        } else {
            Cow::Owned(name.to_lowercase())
        }
    }

    /// Siblings with equal keys need an index to tell them apart
    fn sibling_key(&self, element: &Element) -> (Option<String>, String, String) {
        (
            element.namespace().map(str::to_string),
            self.fold(element.name().local()).into_owned(),
            self.fold(&self.element_name(element)).into_owned(),
        )
    }

    fn allows(&self, name: &NodeName) -> bool {
        self.options
            .attribute_allow_list
            .iter()
            .any(|rule| self.rule_matches(rule, name))
    }

    fn rule_matches(&self, rule: &str, name: &NodeName) -> bool {
        let eq = |a: &str, b: &str| self.fold(a) == self.fold(b);
        let prefix_is = |p: &str| name.prefix().is_some_and(|prefix| eq(prefix, p));

        if rule == "*" {
            return true;
        }

        match rule.split_once(':') {
            Some(("*", local)) => eq(local, name.local()),
            Some((prefix, "*")) => prefix_is(prefix),
            Some((prefix, local)) => prefix_is(prefix) && eq(local, name.local()),
            None => name.prefix().is_none() && eq(rule, name.local()),
        }
    }
}

/// Quotes a string as a path-expression literal.
///
/// Uses double quotes, single quotes if the value contains a double quote, and `concat()`
/// if it contains both.
#[must_use]
pub fn quote_literal(value: &str) -> String {
    if !value.contains('"') {
        return format!("\"{value}\"");
    }
    if !value.contains('\'') {
        return format!("'{value}'");
    }

    let mut parts = vec![];
    for (i, part) in value.split('"').enumerate() {
        if i > 0 {
            parts.push("'\"'".to_string());
        }
        if !part.is_empty() {
            parts.push(format!("\"{part}\""));
        }
    }
    format!("concat({})", parts.join(", "))
}

fn namespace_map(tree: &Tree, options: &PathOptions) -> NamespaceMap {
    unique_namespace_prefixes(tree.namespaces(), &options.uniquify_options())
}

/// Returns the path designating `node`.
///
/// # Errors
/// Returns [`QueryError::NotAnAncestor`] if a relative root does not enclose the node
///
/// # Example
/// ```rust
/// use markup_locator::{PathMode, PathOptions, Tree, path_of};
///
/// let tree = Tree::parse("<a><b/><b/></a>", 0).unwrap();
/// let second = tree.root().children().nth(1).unwrap();
/// let path = path_of(second, PathMode::Absolute, &PathOptions::default()).unwrap();
/// assert_eq!(path, "/a/b[2]");
/// ```
pub fn path_of(node: NodeRef<'_>, mode: PathMode<'_>, options: &PathOptions) -> QueryResult<String> {
    let map = options
        .remap_namespace_prefixes
        .then(|| namespace_map(node.tree(), options));
    PathGenerator::new(options, map.as_ref()).path(node, mode)
}

/// Returns one path per node, in order.
///
/// Namespace maps are built once per tree. With [`PathOptions::unique`], a path equal to an
/// earlier one is dropped. A node that fails does not stop the others.
pub fn paths_of(
    nodes: &[NodeRef<'_>],
    mode: PathMode<'_>,
    options: &PathOptions,
) -> Vec<QueryResult<String>> {
    let mut maps: Vec<(&Tree, NamespaceMap)> = vec![];
    let mut seen = HashSet::new();
    let mut paths = vec![];

    for node in nodes {
        let tree = node.tree();
        let map = if options.remap_namespace_prefixes {
            let index = match maps.iter().position(|(t, _)| std::ptr::eq(*t, tree)) {
                Some(index) => index,
                None => {
                    maps.push((tree, namespace_map(tree, options)));
                    maps.len() - 1
                }
            };
            Some(&maps[index].1)
        } else {
            None
        };

        let result = PathGenerator::new(options, map).path(*node, mode);
        if let Ok(path) = &result {
            if options.unique && !seen.insert(path.clone()) {
                continue;
            }
        }
        paths.push(result);
    }

    paths
}
