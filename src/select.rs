//! Query results, and evaluation of generated paths against a tree.
//!
//! [`PathEngine`] is the seam for a full path-expression engine supplied by the host.
//! [`LocationPathEngine`] only understands the paths this crate generates, which is enough to
//! re-enter a generated path and land back on its element.
use crate::{
    NamespaceMap, NodeId, NodeName, NodeRef, QualifiedName, Tree, UniquifyOptions,
    XML_NAMESPACE,
    error::{QueryError, QueryResult},
    unique_namespace_prefixes,
};

/// One item of a query result.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryItem {
    /// An element of the tree
    Element(NodeId),

    /// An attribute of an element
    Attribute {
        /// The element carrying the attribute
        owner: NodeId,

        /// The attribute's namespace-resolved name
        name: QualifiedName,
    },

    /// A run of text; the element's leading text, or its tail
    Text {
        /// The element owning the text
        owner: NodeId,

        /// True for the text after the element's end tag
        is_tail: bool,
    },

    /// A comment; comments are not part of the tree
    Comment(String),

    /// A computed string
    String(String),

    /// A computed number
    Number(f64),

    /// A computed boolean
    Boolean(bool),
}
impl QueryItem {
    /// The element this item belongs to.
    ///
    /// # Errors
    /// Returns [`QueryError::UnsupportedNodeType`] for comments and
    /// [`QueryError::UnresolvedReference`] for computed values
    pub fn node<'a>(&self, tree: &'a Tree) -> QueryResult<NodeRef<'a>> {
        let id = match self {
            Self::Element(id) => *id,
            Self::Attribute { owner, .. } | Self::Text { owner, .. } => *owner,
            Self::Comment(_) => return Err(QueryError::UnsupportedNodeType("comment".into())),
            Self::String(_) | Self::Number(_) | Self::Boolean(_) => {
                return Err(QueryError::UnresolvedReference);
            }
        };

        tree.get(id).ok_or(QueryError::UnresolvedReference)
    }
}

/// Evaluates path expressions against a tree.
pub trait PathEngine {
    /// Evaluates `expression` with `context` as the context node (the document if `None`).
    /// Prefixes in the expression are resolved through `namespaces`.
    ///
    /// # Errors
    /// Returns an error if the expression cannot be evaluated
    fn evaluate(
        &self,
        tree: &Tree,
        expression: &str,
        namespaces: &NamespaceMap,
        context: Option<NodeId>,
    ) -> QueryResult<Vec<QueryItem>>;
}

/// Evaluates an expression against a tree, with the tree's namespaces under collision-free
/// prefixes.
///
/// # Errors
/// Returns the engine's error
pub fn execute_query(
    engine: &impl PathEngine,
    tree: &Tree,
    expression: &str,
    context: Option<NodeRef<'_>>,
    options: &UniquifyOptions,
) -> QueryResult<Vec<QueryItem>> {
    let namespaces = unique_namespace_prefixes(tree.namespaces(), options);
    log::debug!("evaluating `{expression}` with {} prefixes", namespaces.len());
    engine.evaluate(tree, expression, &namespaces, context.map(|n| n.id()))
}

/// The elements behind query results, in result order without repeats.
///
/// Items that cannot be traced back to an element are skipped.
pub fn nodes_from_results<'a>(tree: &'a Tree, items: &[QueryItem]) -> Vec<NodeRef<'a>> {
    let mut nodes: Vec<NodeRef<'a>> = vec![];
    for item in items {
        match item.node(tree) {
            Ok(node) if nodes.contains(&node) => {}
            Ok(node) => nodes.push(node),
            Err(e) => log::debug!("skipping query result: {e}"),
        }
    }
    nodes
}

#[derive(Debug, Clone, PartialEq)]
enum NameTest {
    Current,
    Any,
    Name(NodeName),
}

#[derive(Debug, Clone, PartialEq)]
enum Predicate {
    Position(usize),
    Attributes(Vec<(NodeName, String)>),
}

#[derive(Debug, Clone, PartialEq)]
struct Step {
    test: NameTest,
    predicates: Vec<Predicate>,
}

/// A parsed location path: `/`-separated steps with positional and attribute predicates.
#[derive(Debug, Clone, PartialEq)]
struct LocationPath {
    absolute: bool,
    steps: Vec<Step>,
}

struct PathReader<'e> {
    expression: &'e str,
    position: usize,
}
impl<'e> PathReader<'e> {
    fn new(expression: &'e str) -> Self {
        Self {
            expression,
            position: 0,
        }
    }

    fn error(&self, message: impl Into<String>) -> QueryError {
        QueryError::syntax(self.expression, message)
    }

    fn rest(&self) -> &'e str {
        &self.expression[self.position..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.position += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn eat_str(&mut self, s: &str) -> bool {
        if self.rest().starts_with(s) {
            self.position += s.len();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, c: char) -> QueryResult<()> {
        if self.eat(c) {
            Ok(())
        } else {
            Err(self.error(format!("expected `{c}` at {}", self.position)))
        }
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        self.position += rest.len() - rest.trim_start().len();
    }

    fn read_while(&mut self, f: impl Fn(char) -> bool) -> &'e str {
        let rest = self.rest();
        let len = rest.find(|c| !f(c)).unwrap_or(rest.len());
        self.position += len;
        &rest[..len]
    }

    fn ncname(&mut self) -> QueryResult<&'e str> {
        match self.peek() {
            Some(c) if c.is_alphabetic() || c == '_' => {}
            _ => return Err(self.error(format!("expected a name at {}", self.position))),
        }
        Ok(self.read_while(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.')))
    }

    fn qname(&mut self) -> QueryResult<NodeName> {
        let first = self.ncname()?;
        if self.eat(':') {
            let local = self.ncname()?;
            Ok(NodeName::new(Some(first), local))
        } else {
            Ok(NodeName::new(None, first))
        }
    }

    fn literal(&mut self) -> QueryResult<String> {
        for quote in ['"', '\''] {
            if self.eat(quote) {
                let value = self.read_while(|c| c != quote);
                self.expect(quote)?;
                return Ok(value.to_string());
            }
        }

        if self.eat_str("concat(") {
            let mut value = String::new();
            loop {
                self.skip_whitespace();
                value.push_str(&self.literal()?);
                self.skip_whitespace();
                if !self.eat(',') {
                    break;
                }
            }
            self.expect(')')?;
            return Ok(value);
        }

        Err(self.error(format!("expected a string at {}", self.position)))
    }

    fn predicate(&mut self) -> QueryResult<Predicate> {
        self.skip_whitespace();
        let digits = self.read_while(|c| c.is_ascii_digit());
        if !digits.is_empty() {
            self.skip_whitespace();
            self.expect(']')?;
            return match digits.parse::<usize>() {
                Ok(n) if n > 0 => Ok(Predicate::Position(n)),
                _ => Err(self.error(format!("invalid position `{digits}`"))),
            };
        }

        let mut clauses = vec![];
        loop {
            self.skip_whitespace();
            self.expect('@')?;
            let name = self.qname()?;
            self.skip_whitespace();
            self.expect('=')?;
            self.skip_whitespace();
            clauses.push((name, self.literal()?));
            self.skip_whitespace();
            if !self.eat_str("and") {
                break;
            }
        }
        self.expect(']')?;
        Ok(Predicate::Attributes(clauses))
    }

    fn step(&mut self) -> QueryResult<Step> {
        let test = if self.eat('.') {
            NameTest::Current
        } else if self.eat('*') {
            NameTest::Any
        } else {
            NameTest::Name(self.qname()?)
        };

        let mut predicates = vec![];
        while self.eat('[') {
            predicates.push(self.predicate()?);
        }
        Ok(Step { test, predicates })
    }

    fn path(mut self) -> QueryResult<LocationPath> {
        self.skip_whitespace();
        let absolute = self.eat('/');

        let mut steps = vec![];
        loop {
            steps.push(self.step()?);
            if !self.eat('/') {
                break;
            }
        }

        self.skip_whitespace();
        if self.position != self.expression.len() {
            return Err(self.error(format!("unexpected text at {}", self.position)));
        }
        Ok(LocationPath { absolute, steps })
    }
}

/// Evaluates generated location paths.
///
/// Supports absolute and relative paths of element steps (`prefix:local`, `local`, `*` or
/// `.`), each with `[n]` and `[@name = "value" and ...]` predicates. An unprefixed name
/// matches elements in no namespace; the `xml` prefix is always bound.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocationPathEngine;
impl LocationPathEngine {
    fn resolve(
        name: &NodeName,
        namespaces: &NamespaceMap,
        expression: &str,
    ) -> QueryResult<Option<String>> {
        match name.prefix() {
            None => Ok(None),
            Some("xml") if namespaces.get("xml").is_none() => Ok(Some(XML_NAMESPACE.to_string())),
            Some(prefix) => namespaces
                .uri_for(prefix)
                .map(|uri| Some(uri.to_string()))
                .ok_or_else(|| QueryError::syntax(expression, format!("unbound prefix `{prefix}`"))),
        }
    }

    fn apply_step<'a>(
        step: &Step,
        candidates: Vec<NodeRef<'a>>,
        namespaces: &NamespaceMap,
        expression: &str,
    ) -> QueryResult<Vec<NodeRef<'a>>> {
        let mut nodes = match &step.test {
            NameTest::Current | NameTest::Any => candidates,
            NameTest::Name(name) => {
                let namespace = Self::resolve(name, namespaces, expression)?;
                candidates
                    .into_iter()
                    .filter(|n| {
                        let element = n.element();
                        element.namespace() == namespace.as_deref()
                            && element.name().local() == name.local()
                    })
                    .collect()
            }
        };

        for predicate in &step.predicates {
            nodes = match predicate {
                Predicate::Position(n) => nodes.get(n - 1).copied().into_iter().collect(),
                Predicate::Attributes(clauses) => {
                    let mut resolved = Vec::with_capacity(clauses.len());
                    for (name, value) in clauses {
                        let namespace = Self::resolve(name, namespaces, expression)?;
                        resolved.push((namespace, name.local(), value.as_str()));
                    }

                    nodes
                        .into_iter()
                        .filter(|n| {
                            resolved.iter().all(|(namespace, local, value)| {
                                n.element()
                                    .get_attribute(namespace.as_deref(), local)
                                    .is_some_and(|a| a.value() == *value)
                            })
                        })
                        .collect()
                }
            };
        }

        Ok(nodes)
    }
}
impl PathEngine for LocationPathEngine {
    fn evaluate(
        &self,
        tree: &Tree,
        expression: &str,
        namespaces: &NamespaceMap,
        context: Option<NodeId>,
    ) -> QueryResult<Vec<QueryItem>> {
        let path = PathReader::new(expression).path()?;

        // `None` stands for the document, whose only child is the root element
        let start = match (path.absolute, context) {
            (true, _) | (false, None) => None,
            (false, Some(id)) => Some(tree.get(id).ok_or(QueryError::UnresolvedReference)?),
        };

        let mut current: Vec<Option<NodeRef<'_>>> = vec![start];
        for step in &path.steps {
            let mut next: Vec<Option<NodeRef<'_>>> = vec![];
            for context in &current {
                let candidates: Vec<NodeRef<'_>> = match (&step.test, context) {
                    (NameTest::Current, Some(node)) => vec![*node],
                    (NameTest::Current, None) => vec![],
                    (_, Some(node)) => node.children().collect(),
                    (_, None) => vec![tree.root()],
                };

                for node in Self::apply_step(step, candidates, namespaces, expression)? {
                    if !next.contains(&Some(node)) {
                        next.push(Some(node));
                    }
                }
            }
            current = next;
        }

        let mut items: Vec<QueryItem> = current
            .into_iter()
            .flatten()
            .map(|n| QueryItem::Element(n.id()))
            .collect();
        items.sort_by_key(|item| match item {
            QueryItem::Element(id) => id.index(),
            _ => usize::MAX,
        });
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn select(tree: &Tree, expression: &str) -> QueryResult<Vec<String>> {
        let items = execute_query(
            &LocationPathEngine,
            tree,
            expression,
            None,
            &UniquifyOptions::default(),
        )?;
        Ok(nodes_from_results(tree, &items)
            .iter()
            .map(|n| format!("{}@{}", n.element().name(), n.id().index()))
            .collect())
    }

    #[test]
    fn test_absolute_steps() {
        let tree = Tree::parse("<a><b/><c><b/></c><b/></a>", 0).unwrap();
        assert_eq!(select(&tree, "/a").unwrap(), ["a@0"]);
        assert_eq!(select(&tree, "/a/b").unwrap(), ["b@1", "b@4"]);
        assert_eq!(select(&tree, "/a/b[2]").unwrap(), ["b@4"]);
        assert_eq!(select(&tree, "/a/*/b").unwrap(), ["b@3"]);
        assert!(select(&tree, "/b").unwrap().is_empty());
    }

    #[test]
    fn test_relative_steps() {
        let tree = Tree::parse("<a><c><b/><b/></c></a>", 0).unwrap();
        let c = tree.root().children().next().unwrap();
        let items = execute_query(
            &LocationPathEngine,
            &tree,
            "b[2]",
            Some(c),
            &UniquifyOptions::default(),
        )
        .unwrap();
        assert_eq!(items, [QueryItem::Element(NodeId(3))]);

        assert_eq!(select(&tree, ".").unwrap(), Vec::<String>::new());
        assert_eq!(select(&tree, "a/c").unwrap(), ["c@1"]);
    }

    #[test]
    fn test_attribute_predicates() {
        let tree = Tree::parse(
            r#"<a xmlns:q="urn:q"><b id="1" q:k='x"y'/><b id="2"/></a>"#,
            0,
        )
        .unwrap();
        assert_eq!(select(&tree, r#"/a/b[@id = "2"]"#).unwrap(), ["b@2"]);
        assert_eq!(
            select(&tree, r#"/a/b[@id = '1' and @q:k = 'x"y']"#).unwrap(),
            ["b@1"]
        );
        assert_eq!(
            select(&tree, r#"/a/b[@q:k = concat("x", '"', "y")]"#).unwrap(),
            ["b@1"]
        );
    }

    #[test]
    fn test_namespaced_steps() {
        let tree = Tree::parse(r#"<a xmlns="urn:d"><b/></a>"#, 0).unwrap();
        assert!(select(&tree, "/a").unwrap().is_empty());
        assert_eq!(select(&tree, "/default:a/default:b").unwrap(), ["b@1"]);

        let error = select(&tree, "/zz:a").unwrap_err();
        assert!(matches!(error, QueryError::PathSyntax { .. }));
    }

    #[test]
    fn test_xml_prefix_is_always_bound() {
        let tree = Tree::parse(r#"<a><b xml:lang="en"/><b xml:lang="fr"/></a>"#, 0).unwrap();
        assert_eq!(select(&tree, r#"/a/b[@xml:lang = "fr"]"#).unwrap(), ["b@2"]);
    }

    #[test]
    fn test_syntax_errors() {
        let tree = Tree::parse("<a/>", 0).unwrap();
        for expression in ["", "/a[", "/a[0]", "/a[@x = 1]", "/a b"] {
            assert!(
                matches!(select(&tree, expression), Err(QueryError::PathSyntax { .. })),
                "{expression}"
            );
        }
    }

    #[test]
    fn test_untraceable_results_are_skipped() {
        let tree = Tree::parse("<a><b/></a>", 0).unwrap();
        let items = [
            QueryItem::String("x".into()),
            QueryItem::Element(NodeId(1)),
            QueryItem::Comment("c".into()),
            QueryItem::Text {
                owner: NodeId(1),
                is_tail: true,
            },
            QueryItem::Number(1.0),
            QueryItem::Element(NodeId(9)),
        ];
        let nodes = nodes_from_results(&tree, &items);
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].id(), NodeId(1));

        assert!(matches!(
            items[2].node(&tree),
            Err(QueryError::UnsupportedNodeType(_))
        ));
        assert!(matches!(items[0].node(&tree), Err(QueryError::UnresolvedReference)));
    }
}
