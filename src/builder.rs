//! Builds a [`Tree`] from start-element / end-element / character events, recording tag positions.
//!
//! Events only say where a token *starts*. Where a tag ends is learned when the next
//! significant event arrives: before handling any event, the builder finalizes the end of
//! whatever tag preceded it (see [`TreeBuilder::finalize_pending`]). The position used for
//! that is the boundary of the last tag token the driver reported, so comments and processing
//! instructions sitting between two tags never stretch a tag's recorded extent.
use crate::{
    Attribute, Element, NodeArena, NodeId, NodeName, Position, Span, Tree,
    error::{ParseResult, bail},
    namespace::NamespaceScopes,
};

/// Which tag of an element was completed most recently
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TagAction {
    Open,
    Close,
}

/// An attribute as read from a start tag, before namespace fixup.
#[derive(Debug, Clone)]
pub(crate) struct RawAttribute {
    pub prefix: String,
    pub local: String,
    pub value: String,
    pub name_span: Span,
    pub value_span: Span,
}

/// A complete start tag, as read by the driver.
#[derive(Debug, Clone)]
pub(crate) struct StartTag {
    pub prefix: String,
    pub local: String,
    pub attributes: Vec<RawAttribute>,
    pub delimiter: Position,
}

#[derive(Debug, Default)]
pub(crate) struct TreeBuilder {
    arena: NodeArena,
    open: Vec<NodeId>,
    scopes: NamespaceScopes,
    last_action: Option<TagAction>,
    boundary: Option<Position>,
}
impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// The innermost open element
    pub fn current(&self) -> Option<&Element> {
        self.open.last().and_then(|id| self.arena.get(*id))
    }

    /// True once the root element was started
    pub fn has_root(&self) -> bool {
        !self.arena.is_empty()
    }

    /// Number of elements still open
    pub fn depth(&self) -> usize {
        self.open.len()
    }

    /// Notes where the most recent tag token ended.
    pub fn mark_boundary(&mut self, position: Position) {
        self.boundary = Some(position);
    }

    /// Handles a complete start tag beginning at `at`.
    ///
    /// Declarations on the tag are bound before anything is resolved, so the tag's own name
    /// and attributes see them.
    pub fn start_element(&mut self, tag: StartTag, at: Position) -> ParseResult<NodeId> {
        if self.has_root() && self.open.is_empty() {
            bail!(at, crate::ParseErrorKind::MultipleRoots);
        }

        self.finalize_pending();
        self.last_action = Some(TagAction::Open);
        self.scopes.push_scope();

        //
        // First pass: bind namespace declarations
        for attr in &tag.attributes {
            match (attr.prefix.as_str(), attr.local.as_str()) {
                ("xmlns", prefix) => self.scopes.bind(Some(prefix), &attr.value),
                ("", "xmlns") => self.scopes.bind(None, &attr.value),
                _ => {}
            }
        }

        //
        // Second pass: re-key the remaining attributes with their resolved namespace
        let mut attributes = Vec::with_capacity(tag.attributes.len());
        for attr in tag.attributes {
            let namespace = match (attr.prefix.as_str(), attr.local.as_str()) {
                ("xmlns", _) | ("", "xmlns") => continue,
                ("", _) => None,
                (prefix, _) => self.scopes.resolve(Some(prefix)).map(str::to_string),
            };

            let name = NodeName::new(Some(attr.prefix), attr.local);
            attributes.push(Attribute::new(
                name,
                namespace,
                attr.value,
                attr.name_span,
                attr.value_span,
            ));
        }

        let prefix = (!tag.prefix.is_empty()).then_some(tag.prefix.as_str());
        let namespace = self.scopes.resolve(prefix).map(str::to_string);

        let parent = self.open.last().copied();
        let mut element = Element::new(NodeName::new(prefix, tag.local.as_str()), namespace, parent);
        element.attributes = attributes;
        element.delimiter = Some(tag.delimiter);
        element.positions.open_start.record(at);

        let id = self.arena.alloc(element);
        if let Some(parent) = parent {
            let Some(parent) = self.arena.get_mut(parent) else {
                bail!(at, msg = "Bug; Cannot append child; parent is missing!");
            };
            parent.children.push(id);
        }

        log::trace!("open <{}> at {at}", tag.local);
        self.open.push(id);
        Ok(id)
    }

    /// Handles an end tag (or the implicit end of a self-closing tag) at `at`.
    pub fn end_element(&mut self, at: Position) -> ParseResult<NodeId> {
        self.finalize_pending();
        self.last_action = Some(TagAction::Close);

        let Some(id) = self.open.pop() else {
            bail!(at, msg = "Bug; Cannot close tag; stack is empty!");
        };

        let Some(element) = self.arena.get_mut(id) else {
            bail!(at, msg = "Bug; Cannot close tag; element is missing!");
        };
        element.positions.close_start.record(at);

        if self.scopes.pop_scope().is_none() {
            bail!(at, msg = "Bug; Cannot close namespace scope; stack is empty!");
        }

        log::trace!("close <{}> at {at}", element.name);
        Ok(id)
    }

    /// Handles a run of character data starting at `at`.
    pub fn characters(&mut self, text: &str, at: Position) {
        self.finalize_pending();

        let Some(&current) = self.open.last() else {
            return;
        };

        let last_child = self.arena.get(current).and_then(|e| e.children.last().copied());
        let slot = match last_child {
            None => self.arena.get_mut(current).map(|e| &mut e.text),
            Some(child) => self.arena.get_mut(child).map(|e| &mut e.tail),
        };

        if let Some(slot) = slot {
            slot.get_or_insert_with(String::new).push_str(text);
        }
        log::trace!("{} characters at {at}", text.len());
    }

    /// Handles the end of the document: the root's close tag ends at the last boundary.
    pub fn end_document(&mut self) {
        let Some(boundary) = self.boundary else {
            return;
        };

        if !self.open.is_empty() {
            return;
        }

        if let Some(root) = self.arena.get_mut(NodeId(0)) {
            root.positions.close_end.record(boundary);
            root.positions.fix_self_closing();
        }
    }

    /// The end-position rule.
    ///
    /// If the current element has no children and no text yet, its start tag ends at the
    /// boundary. Otherwise, if its last child has no tail yet, whichever tag of that child
    /// completed last ends at the boundary. Writes never replace a recorded position; the
    /// only overwrite is the self-closing correction.
    fn finalize_pending(&mut self) {
        let Some(boundary) = self.boundary else {
            return;
        };
        let Some(&current) = self.open.last() else {
            return;
        };
        let Some(element) = self.arena.get_mut(current) else {
            return;
        };

        match element.children.last().copied() {
            None => {
                if element.text.is_none() {
                    element.positions.open_end.record(boundary);
                }
            }

            Some(last_child) => {
                let Some(child) = self.arena.get_mut(last_child) else {
                    return;
                };
                if child.tail.is_some() {
                    return;
                }

                match self.last_action {
                    Some(TagAction::Open) => {
                        child.positions.open_end.record(boundary);
                    }
                    Some(TagAction::Close) => {
                        child.positions.close_end.record(boundary);
                        if child.positions.fix_self_closing() {
                            log::trace!("<{}> is self-closing", child.name);
                        }
                    }
                    None => {}
                }
            }
        }
    }

    /// Finishes the build. Returns `None` if no element was ever started.
    pub fn finish(self, line_offset: usize, complete: bool) -> Option<Tree> {
        if self.arena.is_empty() {
            return None;
        }

        let namespaces = self.scopes.into_document_order();
        log::debug!(
            "built tree of {} elements, {} namespace bindings{}",
            self.arena.len(),
            namespaces.len(),
            if complete { "" } else { " (incomplete)" }
        );
        Some(Tree::from_parts(self.arena, namespaces, line_offset, complete))
    }
}
