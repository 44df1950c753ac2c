use crate::Element;

/// Identifies an element within the tree that owns it.
///
/// Ids are only meaningful for the tree they came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) usize);
impl NodeId {
    /// The position of the element in document order
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// An add-only arena owning every element of a tree.
///
/// Elements refer to their parent and children by [`NodeId`], so the tree has a single owner
/// and upward links are plain indices. Elements are allocated in document order; the root is
/// always the first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeArena(Vec<Element>);
impl NodeArena {
    /// Creates a new, empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self(vec![])
    }

    /// Moves an element into the arena and returns its id.
    pub fn alloc(&mut self, element: Element) -> NodeId {
        self.0.push(element);
        NodeId(self.0.len() - 1)
    }

    /// Returns the element with the given id.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Element> {
        self.0.get(id.0)
    }

    /// Returns the element with the given id, for the builder.
    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        self.0.get_mut(id.0)
    }

    /// Returns the number of elements in the arena.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Return true if len == 0
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates the elements in document order
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Element)> {
        self.0.iter().enumerate().map(|(i, e)| (NodeId(i), e))
    }
}
impl std::ops::Index<NodeId> for NodeArena {
    type Output = Element;

    fn index(&self, id: NodeId) -> &Self::Output {
        &self.0[id.0]
    }
}
