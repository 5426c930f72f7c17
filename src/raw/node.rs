use super::handle::Handle;

/// A slot of the tree's node graph.
///
/// The tree is a proper binary tree: every internal node owns exactly two children, and an
/// empty child slot is an explicit [`ExternalNode`] rather than a missing link.
pub(crate) enum Node<K, V> {
    Internal(InternalNode<K, V>),
    External(ExternalNode),
}

/// Key-bearing node. Children are handles into the owning arena; `parent` is a back-reference.
pub(crate) struct InternalNode<K, V> {
    key: K,
    value: V,
    // Length of the longest path down to an external node.
    height: usize,
    parent: Option<Handle>,
    left: Handle,
    right: Handle,
}

/// Sentinel marking an empty subtree. Height is always zero.
pub(crate) struct ExternalNode {
    parent: Option<Handle>,
}

impl<K, V> Node<K, V> {
    /// Creates a new external node.
    pub(crate) fn external(parent: Option<Handle>) -> Self {
        Node::External(ExternalNode { parent })
    }

    pub(crate) fn is_internal(&self) -> bool {
        matches!(self, Node::Internal(_))
    }

    pub(crate) fn is_external(&self) -> bool {
        matches!(self, Node::External(_))
    }

    /// Returns the internal node, panicking if this is external.
    pub(crate) fn as_internal(&self) -> &InternalNode<K, V> {
        match self {
            Node::Internal(internal) => internal,
            Node::External(_) => panic!("expected internal node"),
        }
    }

    /// Returns the internal node mutably, panicking if this is external.
    pub(crate) fn as_internal_mut(&mut self) -> &mut InternalNode<K, V> {
        match self {
            Node::Internal(internal) => internal,
            Node::External(_) => panic!("expected internal node"),
        }
    }

    /// Returns the internal node, if any.
    pub(crate) fn internal(&self) -> Option<&InternalNode<K, V>> {
        match self {
            Node::Internal(internal) => Some(internal),
            Node::External(_) => None,
        }
    }

    pub(crate) fn height(&self) -> usize {
        match self {
            Node::Internal(internal) => internal.height,
            Node::External(_) => 0,
        }
    }

    pub(crate) fn parent(&self) -> Option<Handle> {
        match self {
            Node::Internal(internal) => internal.parent,
            Node::External(external) => external.parent,
        }
    }

    pub(crate) fn set_parent(&mut self, parent: Option<Handle>) {
        match self {
            Node::Internal(internal) => internal.parent = parent,
            Node::External(external) => external.parent = parent,
        }
    }

    /// Returns `(left, right)` for an internal node.
    pub(crate) fn children(&self) -> Option<(Handle, Handle)> {
        self.internal().map(|internal| (internal.left, internal.right))
    }

    /// Consumes an internal node and returns its entry, panicking if this is external.
    pub(crate) fn into_entry(self) -> (K, V) {
        match self {
            Node::Internal(internal) => (internal.key, internal.value),
            Node::External(_) => panic!("expected internal node"),
        }
    }
}

impl<K, V> InternalNode<K, V> {
    /// Creates an internal node over two already-allocated children.
    pub(crate) fn new(key: K, value: V, height: usize, left: Handle, right: Handle) -> Self {
        Self {
            key,
            value,
            height,
            parent: None,
            left,
            right,
        }
    }

    #[inline]
    pub(crate) fn key(&self) -> &K {
        &self.key
    }

    #[inline]
    pub(crate) fn value(&self) -> &V {
        &self.value
    }

    pub(crate) fn value_mut(&mut self) -> &mut V {
        &mut self.value
    }

    /// Swaps in a new entry, returning the old one. Structure is left untouched.
    pub(crate) fn replace_entry(&mut self, key: K, value: V) -> (K, V) {
        (core::mem::replace(&mut self.key, key), core::mem::replace(&mut self.value, value))
    }

    pub(crate) fn height(&self) -> usize {
        self.height
    }

    pub(crate) fn set_height(&mut self, height: usize) {
        self.height = height;
    }

    pub(crate) fn parent(&self) -> Option<Handle> {
        self.parent
    }

    pub(crate) fn set_parent(&mut self, parent: Option<Handle>) {
        self.parent = parent;
    }

    #[inline]
    pub(crate) fn left(&self) -> Handle {
        self.left
    }

    pub(crate) fn set_left(&mut self, left: Handle) {
        self.left = left;
    }

    #[inline]
    pub(crate) fn right(&self) -> Handle {
        self.right
    }

    pub(crate) fn set_right(&mut self, right: Handle) {
        self.right = right;
    }
}
