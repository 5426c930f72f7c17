use alloc::vec::Vec;

use super::arena::Arena;
use super::handle::Handle;
use super::node::{InternalNode, Node};
use super::raw_avl_tree::{RawAvlTree, Stack};

/// In-order walk over the internal nodes of a subtree. External nodes are skipped.
///
/// Uses an explicit stack holding the pending left spine, so it never recurses.
pub(crate) struct InOrder<'a, K, V> {
    nodes: &'a Arena<Node<K, V>>,
    stack: Stack,
}

impl<'a, K, V> InOrder<'a, K, V> {
    pub(crate) fn new(nodes: &'a Arena<Node<K, V>>, root: Handle) -> Self {
        let mut walk = Self {
            nodes,
            stack: Stack::new(),
        };
        walk.descend(root);
        walk
    }

    /// Pushes `handle` and its chain of left descendants.
    fn descend(&mut self, mut handle: Handle) {
        while let Some((left, _)) = self.nodes.get(handle).children() {
            self.stack.push(handle);
            handle = left;
        }
    }
}

impl<'a, K, V> Iterator for InOrder<'a, K, V> {
    type Item = (Handle, &'a InternalNode<K, V>);

    fn next(&mut self) -> Option<Self::Item> {
        let handle = self.stack.pop()?;
        let internal = self.nodes.get(handle).as_internal();
        self.descend(internal.right());
        Some((handle, internal))
    }
}

impl<K, V> Clone for InOrder<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            nodes: self.nodes,
            stack: self.stack.clone(),
        }
    }
}

impl<K, V, C> RawAvlTree<K, V, C> {
    /// Walks the internal nodes in ascending order.
    pub(crate) fn inorder(&self) -> InOrder<'_, K, V> {
        InOrder::new(self.nodes(), self.root())
    }

    /// Linearizes the tree into a sorted sequence of borrowed entries. O(n).
    pub(crate) fn entries(&self) -> Vec<(&K, &V)> {
        let mut entries = Vec::with_capacity(self.len());
        entries.extend(self.inorder().map(|(_, node)| (node.key(), node.value())));
        entries
    }

    /// Moves every entry out in ascending order and leaves the tree empty. O(n).
    pub(crate) fn drain_inorder(&mut self) -> Vec<(K, V)> {
        let handles: Vec<Handle> = self.inorder().map(|(handle, _)| handle).collect();
        let entries: Vec<(K, V)> = handles.into_iter().map(|handle| self.take_node(handle).into_entry()).collect();
        self.clear();
        entries
    }
}
