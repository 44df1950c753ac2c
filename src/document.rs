use crate::{
    Element, NodeArena, NodeId, Position, PositionField, Span,
    builder::{RawAttribute, StartTag, TreeBuilder},
    error::{ParseError, ParseErrorKind, ParseResult, bail},
    locator::Locator,
    namespace::NamespaceBinding,
};
use htmlentity::entity::{ICodedDataTrait, decode};
use xmlparser::{ElementEnd, StrSpan, Token};

/// Default number of bytes between two checks of an abort predicate.
pub const DEFAULT_CHUNK_SIZE: usize = 8 * 1024;

/// Options for [`parse_with_abort`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// The row of the enclosing document at which the fragment starts
    pub line_offset: usize,

    /// How many bytes of input are processed between two checks of the abort predicate
    pub chunk_size: usize,
}
impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            line_offset: 0,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}
impl ParseOptions {
    /// Options for a fragment starting at the given row
    #[must_use]
    pub fn at_line(line_offset: usize) -> Self {
        Self {
            line_offset,
            ..Self::default()
        }
    }
}

/// An XML fragment that has been parsed into a tree of located elements.
///
/// The tree contains:
/// - Every element of the fragment, in document order, the root first
/// - For each element, its namespace-resolved name, attributes, text and four tag positions
/// - Every distinct `(prefix, uri)` binding declared anywhere, in first-declaration order
///
/// Other things to note:
/// - Comments, processing instructions and the DTD are skipped; entities are never fetched
/// - Positions are absolute within the enclosing document (they include the line offset)
/// - The tree is immutable once returned; edits to the text require a new parse
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    arena: NodeArena,
    namespaces: Vec<NamespaceBinding>,
    line_offset: usize,
    complete: bool,
}
impl Tree {
    pub(crate) fn from_parts(
        arena: NodeArena,
        namespaces: Vec<NamespaceBinding>,
        line_offset: usize,
        complete: bool,
    ) -> Self {
        Self {
            arena,
            namespaces,
            line_offset,
            complete,
        }
    }

    /// Parses a fragment starting at row `line_offset` of its document.
    ///
    /// # Errors
    /// Returns errors if the XML is malformed
    ///
    /// # Example
    /// ```rust
    /// use markup_locator::{Position, Tree};
    ///
    /// let tree = Tree::parse(r#"<a x="1"><b/>hi</a>"#, 0).unwrap();
    /// let root = tree.root();
    /// assert_eq!(root.element().name(), "a");
    /// assert_eq!(root.element().open_tag().unwrap().end, Position::new(0, 9));
    /// ```
    pub fn parse(text: &str, line_offset: usize) -> ParseResult<Self> {
        parse(text, line_offset)
    }

    /// The root element
    #[must_use]
    pub fn root(&self) -> NodeRef<'_> {
        NodeRef {
            tree: self,
            id: NodeId(0),
        }
    }

    /// Returns the element with the given id
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<NodeRef<'_>> {
        self.arena.get(id).map(|_| NodeRef { tree: self, id })
    }

    /// Every element, in document order
    pub fn descendants(&self) -> impl Iterator<Item = NodeRef<'_>> {
        self.arena.iter().map(|(id, _)| NodeRef { tree: self, id })
    }

    /// Number of elements in the tree
    #[must_use]
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    /// Always false; a tree has at least its root
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Distinct namespace bindings, in first-declaration order
    #[must_use]
    pub fn namespaces(&self) -> &[NamespaceBinding] {
        &self.namespaces
    }

    /// The row of the enclosing document at which the fragment starts
    #[must_use]
    pub fn line_offset(&self) -> usize {
        self.line_offset
    }

    /// False if the parse was aborted; some positions may then be missing
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// The extent of the root element
    #[must_use]
    pub fn extent(&self) -> Option<Span> {
        self.root().element().extent()
    }
}

/// A reference to an element within its tree, for navigation.
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    tree: &'a Tree,
    id: NodeId,
}
impl Eq for NodeRef<'_> {}
impl PartialEq for NodeRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && std::ptr::eq(self.tree, other.tree)
    }
}
impl std::fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NodeRef({}, <{}>)", self.id.0, self.element().name())
    }
}
impl<'a> NodeRef<'a> {
    /// The id of the element within its tree
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The tree owning the element
    #[must_use]
    pub fn tree(&self) -> &'a Tree {
        self.tree
    }

    /// The element itself
    #[must_use]
    pub fn element(&self) -> &'a Element {
        &self.tree.arena[self.id]
    }

    fn wrap(&self, id: NodeId) -> NodeRef<'a> {
        NodeRef {
            tree: self.tree,
            id,
        }
    }

    /// Returns the parent of this element.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        self.element().parent.map(|id| self.wrap(id))
    }

    /// Returns true if this is the root element.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.element().parent.is_none()
    }

    /// Returns the child elements.
    pub fn children(&self) -> impl DoubleEndedIterator<Item = NodeRef<'a>> + use<'a> {
        let tree = self.tree;
        self.element()
            .children
            .iter()
            .map(move |&id| NodeRef { tree, id })
    }

    /// Returns true if this element has child elements.
    #[must_use]
    pub fn has_children(&self) -> bool {
        !self.element().children.is_empty()
    }

    fn siblings(&self) -> (&'a [NodeId], usize) {
        let Some(parent) = self.element().parent else {
            return (&[], 0);
        };

        let siblings = self.tree.arena[parent].children.as_slice();
        let index = siblings.iter().position(|id| *id == self.id).unwrap_or(0);
        (siblings, index)
    }

    /// 0-based position among the parent's children
    #[must_use]
    pub fn index_in_parent(&self) -> usize {
        self.siblings().1
    }

    /// Returns an iterator over previous siblings, nearest first.
    pub fn prev_siblings(&self) -> impl Iterator<Item = NodeRef<'a>> + use<'a> {
        let (siblings, index) = self.siblings();
        let tree = self.tree;
        siblings[..index]
            .iter()
            .rev()
            .map(move |&id| NodeRef { tree, id })
    }

    /// Returns an iterator over next siblings, nearest first.
    pub fn next_siblings(&self) -> impl Iterator<Item = NodeRef<'a>> + use<'a> {
        let (siblings, index) = self.siblings();
        let tree = self.tree;
        siblings
            .get(index + 1..)
            .unwrap_or_default()
            .iter()
            .map(move |&id| NodeRef { tree, id })
    }

    /// Returns the previous sibling element.
    #[must_use]
    pub fn prev_sibling(&self) -> Option<Self> {
        self.prev_siblings().next()
    }

    /// Returns the next sibling element.
    #[must_use]
    pub fn next_sibling(&self) -> Option<Self> {
        self.next_siblings().next()
    }

    /// Returns an iterator over ancestors, starting at this element.
    pub fn ancestors(&self) -> impl Iterator<Item = NodeRef<'a>> + use<'a> {
        std::iter::successors(Some(*self), NodeRef::parent)
    }

    /// Returns true if `other` is this element or one of its descendants.
    #[must_use]
    pub fn is_ancestor_of(&self, other: &NodeRef<'_>) -> bool {
        std::ptr::eq(self.tree, other.tree) && other.ancestors().any(|a| a.id == self.id)
    }

    /// The innermost element enclosing both, if they share a tree
    #[must_use]
    pub fn common_ancestor(&self, other: &NodeRef<'a>) -> Option<Self> {
        if !std::ptr::eq(self.tree, other.tree) {
            return None;
        }

        self.ancestors().find(|a| a.is_ancestor_of(other))
    }

    /// This element and all its descendants, in document order
    pub fn descendants(&self) -> impl Iterator<Item = NodeRef<'a>> + use<'a> {
        let mut stack = vec![*self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children().rev());
            Some(node)
        })
    }

    /// Returns the recorded value of a position field
    #[must_use]
    pub fn position(&self, field: PositionField) -> Option<Position> {
        self.element().position(field)
    }

    /// The rendered extent of the element
    #[must_use]
    pub fn extent(&self) -> Option<Span> {
        self.element().extent()
    }
}

/// A fragment of a host document containing markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fragment<'a> {
    /// The markup text
    pub text: &'a str,

    /// The row of the host document at which the fragment starts
    pub line_offset: usize,
}
impl<'a> Fragment<'a> {
    /// Create a new fragment
    #[must_use]
    pub fn new(text: &'a str, line_offset: usize) -> Self {
        Self { text, line_offset }
    }
}

/// The independently parsed trees of one host document, in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentSet {
    trees: Vec<Tree>,
}
impl DocumentSet {
    /// Creates a set from trees, ordering them by where they start.
    #[must_use]
    pub fn new(mut trees: Vec<Tree>) -> Self {
        trees.sort_by_key(|tree| {
            (
                tree.root().position(PositionField::OpenTagStart),
                tree.line_offset,
            )
        });
        Self { trees }
    }

    /// Parses every fragment on its own. A fragment that fails to parse does not stop the
    /// others; its error is returned with the fragment's index.
    pub fn parse_fragments<'f>(
        fragments: impl IntoIterator<Item = Fragment<'f>>,
    ) -> (Self, Vec<(usize, ParseError)>) {
        let mut trees = vec![];
        let mut errors = vec![];
        for (i, fragment) in fragments.into_iter().enumerate() {
            match parse(fragment.text, fragment.line_offset) {
                Ok(tree) => trees.push(tree),
                Err(e) => {
                    log::debug!("fragment {i} failed to parse: {e}");
                    errors.push((i, e));
                }
            }
        }

        (Self::new(trees), errors)
    }

    /// The trees, in document order
    #[must_use]
    pub fn trees(&self) -> &[Tree] {
        &self.trees
    }

    /// Iterates the trees in document order
    pub fn iter(&self) -> std::slice::Iter<'_, Tree> {
        self.trees.iter()
    }

    /// Number of trees
    #[must_use]
    pub fn len(&self) -> usize {
        self.trees.len()
    }

    /// Return true if len == 0
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    /// The namespace bindings of all trees, in document order, without duplicates
    #[must_use]
    pub fn namespaces(&self) -> Vec<NamespaceBinding> {
        let mut bindings: Vec<NamespaceBinding> = vec![];
        for binding in self.trees.iter().flat_map(Tree::namespaces) {
            if !bindings.contains(binding) {
                bindings.push(binding.clone());
            }
        }
        bindings
    }

    /// The tree whose root extent contains the position
    #[must_use]
    pub fn tree_at(&self, position: Position) -> Option<&Tree> {
        self.trees
            .iter()
            .find(|tree| tree.extent().is_some_and(|e| e.contains(position)))
    }
}
impl<'a> IntoIterator for &'a DocumentSet {
    type Item = &'a Tree;
    type IntoIter = std::slice::Iter<'a, Tree>;

    fn into_iter(self) -> Self::IntoIter {
        self.trees.iter()
    }
}

/// Parses a fragment starting at row `line_offset` of its document.
///
/// # Errors
/// Returns errors if the XML is malformed. The parser does not attempt to recover.
pub fn parse(text: &str, line_offset: usize) -> ParseResult<Tree> {
    let options = ParseOptions::at_line(line_offset);
    match parse_with_abort(text, &options, || false)? {
        Some(tree) => Ok(tree),
        None => Err(ParseError::at(
            ParseErrorKind::NoRootElement,
            Position::new(line_offset, 0),
        )),
    }
}

/// Parses a fragment, asking `should_stop` before each chunk of input whether to give up.
///
/// An aborted parse is not an error: it returns whatever was built so far, marked incomplete,
/// or `None` if not even the root element had started.
///
/// # Errors
/// Returns errors if the XML is malformed
pub fn parse_with_abort(
    text: &str,
    options: &ParseOptions,
    mut should_stop: impl FnMut() -> bool,
) -> ParseResult<Option<Tree>> {
    let line_offset = options.line_offset;
    let chunk_size = options.chunk_size.max(1);

    let mut tokenizer = xmlparser::Tokenizer::from(text);
    let mut locator = Locator::new(text, line_offset);
    let mut builder = TreeBuilder::new();

    let mut state = ParserState::Prolog;
    let mut pending: Option<(Position, StartTag)> = None;
    let mut next_check = 0;

    loop {
        // Get the next token
        let Some(next) = tokenizer.next() else {
            break;
        };
        let next = next.map_err(|e| ParseError::from_tokenizer(e, line_offset))?;

        let start = token_start(&next);
        if start >= next_check {
            next_check = (start / chunk_size + 1) * chunk_size;
            if should_stop() {
                log::debug!("parse aborted at byte {start}");
                return Ok(builder.finish(line_offset, false));
            }
        }

        match state {
            ParserState::Prolog => match next {
                Token::ElementStart {
                    prefix,
                    local,
                    span,
                } => {
                    let at = locator.position_at(span.start());
                    pending = Some((at, start_tag(prefix, local)));
                    state = ParserState::TagAttributes;
                }

                Token::Declaration { .. }
                | Token::ProcessingInstruction { .. }
                | Token::Comment { .. } => {}

                Token::DtdStart { .. }
                | Token::EmptyDtd { .. }
                | Token::EntityDeclaration { .. }
                | Token::DtdEnd { .. } => {
                    log::trace!("skipping DTD token; entities are never resolved");
                }

                Token::Text { text } if text.as_str().trim().is_empty() => {}

                _ => {
                    let at = locator.position_at(start);
                    bail!(
                        at,
                        ParseErrorKind::UnexpectedToken(format!("{} in prolog", token_name(&next)))
                    );
                }
            },

            ParserState::TagAttributes => match next {
                Token::Attribute {
                    prefix,
                    local,
                    value,
                    ..
                } => {
                    let name_start = if prefix.is_empty() {
                        local.start()
                    } else {
                        prefix.start()
                    };
                    let name_span = locator.span(name_start, local.end());
                    let value_span = locator.span(value.start(), value.end());
                    let decoded = decode_text(value, &mut locator)?;

                    let Some((_, tag)) = pending.as_mut() else {
                        let at = locator.position_at(start);
                        bail!(at, msg = "Bug; Cannot apply attribute; no start tag!");
                    };

                    tag.attributes.push(RawAttribute {
                        prefix: prefix.as_str().to_string(),
                        local: local.as_str().to_string(),
                        value: decoded,
                        name_span,
                        value_span,
                    });
                }

                Token::ElementEnd { end, span } => {
                    let delimiter = locator.position_at(span.start());
                    let Some((at, mut tag)) = pending.take() else {
                        bail!(delimiter, msg = "Bug; Cannot finish start tag; no start tag!");
                    };

                    tag.delimiter = delimiter;
                    builder.start_element(tag, at)?;

                    let end_position = locator.position_at(span.end());
                    builder.mark_boundary(end_position);
                    state = ParserState::TagChildren;

                    match end {
                        ElementEnd::Open => {}
                        ElementEnd::Empty => {
                            builder.end_element(end_position)?;
                            if builder.depth() == 0 {
                                state = ParserState::Epilog;
                            }
                        }
                        ElementEnd::Close(..) => {
                            bail!(delimiter, msg = "Bug; Close tag inside a start tag!");
                        }
                    }
                }

                Token::Comment { .. } => {}

                _ => {
                    let at = locator.position_at(start);
                    bail!(
                        at,
                        ParseErrorKind::UnexpectedToken(format!(
                            "{} in tag attributes",
                            token_name(&next)
                        ))
                    );
                }
            },

            ParserState::TagChildren => match next {
                Token::ElementStart {
                    prefix,
                    local,
                    span,
                } => {
                    let at = locator.position_at(span.start());
                    pending = Some((at, start_tag(prefix, local)));
                    state = ParserState::TagAttributes;
                }

                Token::Text { text } => {
                    let at = locator.position_at(text.start());
                    let decoded = decode_text(text, &mut locator)?;
                    builder.characters(&decoded, at);
                }

                Token::Cdata { text, span } => {
                    let at = locator.position_at(span.start());
                    builder.characters(text.as_str(), at);
                }

                Token::Comment { .. } | Token::ProcessingInstruction { .. } => {}

                Token::ElementEnd {
                    end: ElementEnd::Close(prefix, local),
                    span,
                } => {
                    let at = locator.position_at(span.start());
                    let Some(current) = builder.current() else {
                        bail!(at, msg = "Bug; Cannot close tag; stack is empty!");
                    };

                    let prefix = (!prefix.is_empty()).then_some(prefix.as_str());
                    if !current.name().equals(prefix, local.as_str()) {
                        let expected = current.name().to_string();
                        let found = match prefix {
                            Some(prefix) => format!("{prefix}:{}", local.as_str()),
                            None => local.as_str().to_string(),
                        };
                        bail!(at, ParseErrorKind::MismatchedCloseTag { expected, found });
                    }

                    builder.end_element(at)?;
                    builder.mark_boundary(locator.position_at(span.end()));
                    if builder.depth() == 0 {
                        state = ParserState::Epilog;
                    }
                }

                _ => {
                    let at = locator.position_at(start);
                    bail!(
                        at,
                        ParseErrorKind::UnexpectedToken(format!("{} inside tag", token_name(&next)))
                    );
                }
            },

            ParserState::Epilog => match next {
                Token::Comment { .. } | Token::ProcessingInstruction { .. } => {}

                Token::Text { text } if text.as_str().trim().is_empty() => {}

                Token::ElementStart { span, .. } => {
                    let at = locator.position_at(span.start());
                    bail!(at, ParseErrorKind::MultipleRoots);
                }

                _ => {
                    let at = locator.position_at(start);
                    bail!(
                        at,
                        ParseErrorKind::UnexpectedToken(format!(
                            "{} after root element",
                            token_name(&next)
                        ))
                    );
                }
            },
        }
    }

    let end = locator.position_at(text.len());
    if let Some((_, tag)) = pending {
        bail!(end, ParseErrorKind::UnclosedTag(tag.local));
    }
    if let Some(current) = builder.current() {
        bail!(end, ParseErrorKind::UnclosedTag(current.name().to_string()));
    }
    if !builder.has_root() {
        bail!(end, ParseErrorKind::NoRootElement);
    }

    builder.end_document();
    Ok(builder.finish(line_offset, true))
}

/// Parses a fragment, and if that fails, parses the output of a tag-soup cleaner instead.
///
/// Positions of a tree built from cleaned text describe the cleaned text.
///
/// # Errors
/// Returns the original error if the cleaner declines, or the second error if the cleaned
/// text does not parse either
pub fn parse_with_cleanup(
    text: &str,
    line_offset: usize,
    cleaner: impl FnOnce(&str) -> Option<String>,
) -> ParseResult<Tree> {
    match parse(text, line_offset) {
        Ok(tree) => Ok(tree),
        Err(e) => {
            let Some(cleaned) = cleaner(text) else {
                return Err(e);
            };

            log::debug!("retrying with cleaned markup after: {e}");
            parse(&cleaned, line_offset)
        }
    }
}

#[derive(PartialEq, Debug)]
enum ParserState {
    Prolog,
    TagAttributes,
    TagChildren,
    Epilog,
}

fn start_tag(prefix: StrSpan<'_>, local: StrSpan<'_>) -> StartTag {
    StartTag {
        prefix: prefix.as_str().to_string(),
        local: local.as_str().to_string(),
        attributes: vec![],
        delimiter: Position::default(),
    }
}

/// Decodes character and entity references of a text or attribute value.
fn decode_text(raw: StrSpan<'_>, locator: &mut Locator<'_>) -> ParseResult<String> {
    let text = raw.as_str();
    if !text.contains('&') {
        return Ok(text.to_string());
    }

    decode(text.as_bytes()).to_string().map_err(|e| {
        ParseError::at(
            ParseErrorKind::Entity(e.to_string()),
            locator.position_at(raw.start()),
        )
    })
}

fn token_start(token: &Token<'_>) -> usize {
    match token {
        Token::Declaration { span, .. }
        | Token::ProcessingInstruction { span, .. }
        | Token::Comment { span, .. }
        | Token::DtdStart { span, .. }
        | Token::EmptyDtd { span, .. }
        | Token::EntityDeclaration { span, .. }
        | Token::DtdEnd { span }
        | Token::ElementStart { span, .. }
        | Token::Attribute { span, .. }
        | Token::ElementEnd { span, .. }
        | Token::Cdata { span, .. } => span.start(),
        Token::Text { text } => text.start(),
    }
}

fn token_name(token: &Token<'_>) -> &'static str {
    match token {
        Token::Declaration { .. } => "declaration",
        Token::ProcessingInstruction { .. } => "processing instruction",
        Token::Comment { .. } => "comment",
        Token::DtdStart { .. } | Token::EmptyDtd { .. } | Token::DtdEnd { .. } => "doctype",
        Token::EntityDeclaration { .. } => "entity declaration",
        Token::ElementStart { .. } => "start tag",
        Token::Attribute { .. } => "attribute",
        Token::ElementEnd { .. } => "end tag",
        Token::Text { .. } => "text",
        Token::Cdata { .. } => "CDATA section",
    }
}
