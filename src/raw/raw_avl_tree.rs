use core::cmp::Ordering;

use smallvec::SmallVec;
use tracing::trace;

use super::arena::Arena;
use super::handle::Handle;
use super::node::{InternalNode, Node};
use crate::compare::Comparator;

/// Explicit stack for iterative descents. AVL height stays under 32 for any tree that fits in
/// the arena's practical range, so this rarely spills to the heap.
pub(crate) type Stack = SmallVec<[Handle; 32]>;

/// The arena-backed AVL tree behind [`AvlTree`](crate::AvlTree).
pub(crate) struct RawAvlTree<K, V, C> {
    /// Every node of the tree, internal and external.
    nodes: Arena<Node<K, V>>,
    /// Handle to the root node. An external root means the tree is empty.
    root: Handle,
    /// Number of internal (key-bearing) nodes.
    len: usize,
    comparator: C,
}

impl<K, V, C> RawAvlTree<K, V, C> {
    /// Creates a new, empty tree: a single external root.
    pub(crate) fn new(comparator: C) -> Self {
        Self::with_capacity(0, comparator)
    }

    /// Creates an empty tree with room for `capacity` entries without reallocating.
    pub(crate) fn with_capacity(capacity: usize, comparator: C) -> Self {
        let mut nodes = Arena::with_capacity(2 * capacity + 1);
        let root = nodes.alloc(Node::external(None));
        Self {
            nodes,
            root,
            len: 0,
            comparator,
        }
    }

    /// Installs a node graph built elsewhere. The caller guarantees that `root` has no parent and
    /// that `len` counts the internal nodes reachable from it.
    pub(crate) fn from_parts(nodes: Arena<Node<K, V>>, root: Handle, len: usize, comparator: C) -> Self {
        debug_assert!(nodes.get(root).parent().is_none(), "installed root must not have a parent");
        Self {
            nodes,
            root,
            len,
            comparator,
        }
    }

    /// Returns the number of entries in the tree.
    pub(crate) const fn len(&self) -> usize {
        self.len
    }

    pub(crate) const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Total number of nodes, internal and external.
    pub(crate) const fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of entries the tree can hold before its arena reallocates.
    pub(crate) fn capacity(&self) -> usize {
        self.nodes.capacity().saturating_sub(1) / 2
    }

    pub(crate) fn root(&self) -> Handle {
        self.root
    }

    pub(crate) fn comparator(&self) -> &C {
        &self.comparator
    }

    pub(crate) fn into_comparator(self) -> C {
        self.comparator
    }

    pub(crate) fn nodes(&self) -> &Arena<Node<K, V>> {
        &self.nodes
    }

    /// Returns a node by handle. Panics if the handle is not live.
    pub(crate) fn node(&self, handle: Handle) -> &Node<K, V> {
        self.nodes.get(handle)
    }

    /// Returns a node by handle, or `None` if the handle is not live in this tree.
    pub(crate) fn try_node(&self, handle: Handle) -> Option<&Node<K, V>> {
        self.nodes.try_get(handle)
    }

    pub(crate) fn internal(&self, handle: Handle) -> &InternalNode<K, V> {
        self.nodes.get(handle).as_internal()
    }

    /// Frees a node slot and returns its contents, without relinking anything.
    pub(crate) fn take_node(&mut self, handle: Handle) -> Node<K, V> {
        self.nodes.take(handle)
    }

    pub(crate) fn value_mut(&mut self, handle: Handle) -> &mut V {
        self.nodes.get_mut(handle).as_internal_mut().value_mut()
    }

    /// Height of the whole tree.
    pub(crate) fn height(&self) -> usize {
        self.nodes.get(self.root).height()
    }

    /// Drops every entry, leaving a single external root.
    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.root = self.nodes.alloc(Node::external(None));
        self.len = 0;
    }

    /// Returns the leftmost internal node of the subtree rooted at `handle`, if any.
    pub(crate) fn first_in(&self, mut handle: Handle) -> Option<Handle> {
        let mut first = None;
        while let Some((left, _)) = self.nodes.get(handle).children() {
            first = Some(handle);
            handle = left;
        }
        first
    }

    /// Returns the rightmost internal node of the subtree rooted at `handle`, if any.
    pub(crate) fn last_in(&self, mut handle: Handle) -> Option<Handle> {
        let mut last = None;
        while let Some((_, right)) = self.nodes.get(handle).children() {
            last = Some(handle);
            handle = right;
        }
        last
    }

    /// Returns the internal node that follows `handle` in order.
    pub(crate) fn successor(&self, handle: Handle) -> Option<Handle> {
        let right = self.internal(handle).right();
        if let Some(next) = self.first_in(right) {
            return Some(next);
        }

        let mut child = handle;
        let mut parent = self.nodes.get(handle).parent();
        while let Some(p) = parent {
            if self.internal(p).left() == child {
                return Some(p);
            }
            child = p;
            parent = self.nodes.get(p).parent();
        }
        None
    }

    // ─── Linking ──────────────────────────────────────────────────────────────

    /// Makes `child` the left child of `parent`, rewriting the child's back-reference.
    fn attach_left(&mut self, parent: Handle, child: Handle) {
        self.nodes.get_mut(parent).as_internal_mut().set_left(child);
        self.nodes.get_mut(child).set_parent(Some(parent));
    }

    /// Makes `child` the right child of `parent`, rewriting the child's back-reference.
    fn attach_right(&mut self, parent: Handle, child: Handle) {
        self.nodes.get_mut(parent).as_internal_mut().set_right(child);
        self.nodes.get_mut(child).set_parent(Some(parent));
    }

    /// Puts `new` in the slot `old` occupies under `parent` (or at the root).
    fn replace_child(&mut self, parent: Option<Handle>, old: Handle, new: Handle) {
        match parent {
            None => {
                self.root = new;
                self.nodes.get_mut(new).set_parent(None);
            }
            Some(parent) if self.internal(parent).left() == old => self.attach_left(parent, new),
            Some(parent) => self.attach_right(parent, new),
        }
    }

    fn update_height(&mut self, handle: Handle) {
        let internal = self.internal(handle);
        let left = self.nodes.get(internal.left()).height();
        let right = self.nodes.get(internal.right()).height();
        self.nodes.get_mut(handle).as_internal_mut().set_height(1 + left.max(right));
    }

    // ─── Rebalancing ──────────────────────────────────────────────────────────

    /// Rotates the right child of `handle` above it. Returns the new subtree root.
    fn rotate_left(&mut self, handle: Handle) -> Handle {
        trace!(node = handle.to_index(), "rotate left");
        let parent = self.nodes.get(handle).parent();
        let pivot = self.internal(handle).right();
        let inner = self.internal(pivot).left();

        self.attach_right(handle, inner);
        self.replace_child(parent, handle, pivot);
        self.attach_left(pivot, handle);

        self.update_height(handle);
        self.update_height(pivot);
        pivot
    }

    /// Rotates the left child of `handle` above it. Returns the new subtree root.
    fn rotate_right(&mut self, handle: Handle) -> Handle {
        trace!(node = handle.to_index(), "rotate right");
        let parent = self.nodes.get(handle).parent();
        let pivot = self.internal(handle).left();
        let inner = self.internal(pivot).right();

        self.attach_left(handle, inner);
        self.replace_child(parent, handle, pivot);
        self.attach_right(pivot, handle);

        self.update_height(handle);
        self.update_height(pivot);
        pivot
    }

    /// Restores the balance of `handle` with a single or double rotation.
    /// Returns whichever node now roots the subtree.
    fn restore_balance(&mut self, handle: Handle) -> Handle {
        let internal = self.internal(handle);
        let (left, right) = (internal.left(), internal.right());
        let left_height = self.nodes.get(left).height();
        let right_height = self.nodes.get(right).height();

        if left_height > right_height + 1 {
            let inner = self.internal(left);
            if self.nodes.get(inner.left()).height() < self.nodes.get(inner.right()).height() {
                self.rotate_left(left);
            }
            self.rotate_right(handle)
        } else if right_height > left_height + 1 {
            let inner = self.internal(right);
            if self.nodes.get(inner.right()).height() < self.nodes.get(inner.left()).height() {
                self.rotate_right(right);
            }
            self.rotate_left(handle)
        } else {
            handle
        }
    }

    /// Walks from `start` to the root, fixing heights and rotating where unbalanced.
    fn rebalance_from(&mut self, start: Option<Handle>) {
        let mut current = start;
        while let Some(handle) = current {
            self.update_height(handle);
            let subtree = self.restore_balance(handle);
            current = self.nodes.get(subtree).parent();
        }
    }

    // ─── Removal ──────────────────────────────────────────────────────────────

    /// Removes the internal node at `handle` and returns its entry.
    ///
    /// If one child is external the node is spliced out. Otherwise the in-order successor's
    /// entry moves into `handle` and the successor's node is spliced out instead.
    pub(crate) fn remove_at(&mut self, handle: Handle) -> (K, V) {
        let internal = self.internal(handle);
        let (left, right) = (internal.left(), internal.right());

        let (entry, parent) = if self.nodes.get(left).is_external() {
            self.remove_above_external(left)
        } else if self.nodes.get(right).is_external() {
            self.remove_above_external(right)
        } else {
            let successor = self.first_in(right).expect("internal right child has a first node");
            let edge = self.internal(successor).left();
            let ((key, value), parent) = self.remove_above_external(edge);
            let entry = self.nodes.get_mut(handle).as_internal_mut().replace_entry(key, value);
            (entry, parent)
        };

        self.len -= 1;
        self.rebalance_from(parent);
        entry
    }

    /// Removes the external node `edge` and its parent, promoting the parent's other child.
    /// Returns the removed entry and the parent of the removed internal node.
    fn remove_above_external(&mut self, edge: Handle) -> ((K, V), Option<Handle>) {
        let node = self.nodes.get(edge).parent().expect("external child of an internal node has a parent");
        let internal = self.internal(node);
        let sibling = if internal.left() == edge {
            internal.right()
        } else {
            internal.left()
        };
        let parent = internal.parent();

        self.replace_child(parent, node, sibling);
        self.nodes.free(edge);
        let entry = self.nodes.take(node).into_entry();
        (entry, parent)
    }
}

impl<K, V, C: Comparator<K>> RawAvlTree<K, V, C> {
    /// Returns the leftmost internal node whose key compares equal to `key`.
    pub(crate) fn find(&self, key: &K) -> Option<Handle> {
        let mut current = self.root;
        let mut found = None;
        while let Some((left, right)) = self.nodes.get(current).children() {
            current = match self.comparator.compare(key, self.internal(current).key()) {
                Ordering::Less => left,
                Ordering::Greater => right,
                Ordering::Equal => {
                    found = Some(current);
                    left
                }
            };
        }
        found
    }

    /// Inserts an entry and returns the node that holds it.
    ///
    /// Equal keys descend to the right, so a new entry lands after existing equal entries.
    pub(crate) fn insert(&mut self, key: K, value: V) -> Handle {
        let mut current = self.root;
        while let Some((left, right)) = self.nodes.get(current).children() {
            current = match self.comparator.compare(&key, self.internal(current).key()) {
                Ordering::Less => left,
                Ordering::Equal | Ordering::Greater => right,
            };
        }

        self.expand_external(current, key, value);
        self.len += 1;
        self.rebalance_from(self.nodes.get(current).parent());
        current
    }

    /// Turns the external node at `handle` into an internal node with two fresh external
    /// children. The handle is kept, so the parent's link stays valid.
    fn expand_external(&mut self, handle: Handle, key: K, value: V) {
        let parent = self.nodes.get(handle).parent();
        let left = self.nodes.alloc(Node::external(Some(handle)));
        let right = self.nodes.alloc(Node::external(Some(handle)));

        let mut internal = InternalNode::new(key, value, 1, left, right);
        internal.set_parent(parent);
        let old = self.nodes.replace(handle, Node::Internal(internal));
        debug_assert!(old.is_external(), "only an external node can be expanded");
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap, clippy::unreadable_literal)]
mod tests {
    use super::*;
    use crate::compare::Natural;
    use alloc::vec::Vec;
    use proptest::prelude::*;

    fn keys<V, C>(tree: &RawAvlTree<i32, V, C>) -> Vec<i32> {
        tree.inorder().map(|(_, node)| *node.key()).collect()
    }

    #[test]
    fn empty_tree_is_single_external_root() {
        let tree: RawAvlTree<i32, i32, Natural> = RawAvlTree::new(Natural);
        assert!(tree.is_empty());
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.height(), 0);
        assert!(tree.node(tree.root()).is_external());
        assert!(tree.find(&1).is_none());
        assert!(tree.check_invariants().is_ok());
    }

    #[test]
    fn ascending_inserts_rotate() {
        let mut tree = RawAvlTree::new(Natural);
        for key in 1..=3 {
            tree.insert(key, ());
        }
        // 1-2-3 in a line triggers a single left rotation around 1.
        let root = tree.internal(tree.root());
        assert_eq!(*root.key(), 2);
        assert_eq!(root.height(), 2);
        assert_eq!(tree.node_count(), 7);
        assert!(tree.check_invariants().is_ok());
    }

    #[test]
    fn zig_zag_inserts_double_rotate() {
        let mut tree = RawAvlTree::new(Natural);
        for key in [3, 1, 2] {
            tree.insert(key, ());
        }
        assert_eq!(*tree.internal(tree.root()).key(), 2);
        assert!(tree.check_invariants().is_ok());
    }

    #[test]
    fn inserted_handle_survives_rotations() {
        let mut tree = RawAvlTree::new(Natural);
        let handles: Vec<_> = (0..50).map(|key| (key, tree.insert(key, key * 10))).collect();
        for (key, handle) in handles {
            assert_eq!(*tree.internal(handle).key(), key);
            assert_eq!(*tree.internal(handle).value(), key * 10);
        }
    }

    #[test]
    fn duplicates_keep_insertion_order() {
        let mut tree = RawAvlTree::new(Natural);
        for (index, key) in [5, 3, 5, 8, 5, 1].into_iter().enumerate() {
            tree.insert(key, index);
        }
        let fives: Vec<usize> = tree
            .inorder()
            .filter(|(_, node)| *node.key() == 5)
            .map(|(_, node)| *node.value())
            .collect();
        assert_eq!(fives, [0, 2, 4]);

        let first = tree.find(&5).expect("5 is present");
        assert_eq!(*tree.internal(first).value(), 0);
    }

    #[test]
    fn remove_node_with_two_internal_children() {
        let mut tree = RawAvlTree::new(Natural);
        for key in [4, 2, 6, 1, 3, 5, 7] {
            tree.insert(key, key);
        }
        let root = tree.root();
        assert_eq!(tree.remove_at(root), (4, 4));
        assert_eq!(keys(&tree), [1, 2, 3, 5, 6, 7]);
        assert_eq!(tree.node_count(), 2 * 6 + 1);
        assert!(tree.check_invariants().is_ok());
    }

    #[test]
    fn remove_last_entry_leaves_external_root() {
        let mut tree = RawAvlTree::new(Natural);
        let handle = tree.insert(1, "one");
        assert_eq!(tree.remove_at(handle), (1, "one"));
        assert!(tree.is_empty());
        assert_eq!(tree.node_count(), 1);
        assert!(tree.node(tree.root()).is_external());
        assert!(tree.node(tree.root()).parent().is_none());
    }

    #[test]
    fn successor_walks_in_order() {
        let mut tree = RawAvlTree::new(Natural);
        for key in [8, 3, 10, 1, 6, 14, 4, 7, 13] {
            tree.insert(key, ());
        }
        let mut walked = Vec::new();
        let mut current = tree.first_in(tree.root());
        while let Some(handle) = current {
            walked.push(*tree.internal(handle).key());
            current = tree.successor(handle);
        }
        assert_eq!(walked, [1, 3, 4, 6, 7, 8, 10, 13, 14]);
        assert_eq!(tree.last_in(tree.root()).map(|h| *tree.internal(h).key()), Some(14));
    }

    #[derive(Clone, Debug)]
    enum Op {
        Insert(i32),
        Remove(i32),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            3 => (0i32..200).prop_map(Op::Insert),
            1 => (0i32..200).prop_map(Op::Remove),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        #[test]
        fn invariants_hold_after_every_operation(ops in prop::collection::vec(op_strategy(), 0..400)) {
            let mut tree = RawAvlTree::new(Natural);
            let mut model: Vec<i32> = Vec::new();

            for op in ops {
                match op {
                    Op::Insert(key) => {
                        tree.insert(key, key * 2);
                        let at = model.partition_point(|k| *k <= key);
                        model.insert(at, key);
                    }
                    Op::Remove(key) => {
                        if let Some(handle) = tree.find(&key) {
                            prop_assert_eq!(tree.remove_at(handle), (key, key * 2));
                            let at = model.binary_search(&key).expect("model holds the key");
                            model.remove(at);
                        } else {
                            prop_assert!(model.binary_search(&key).is_err());
                        }
                    }
                }
                prop_assert_eq!(tree.check_invariants(), Ok(()));
                prop_assert_eq!(tree.len(), model.len());
                prop_assert_eq!(tree.node_count(), 2 * model.len() + 1);
            }

            prop_assert_eq!(keys(&tree), model);
        }

        #[test]
        fn height_is_logarithmic(count in 1usize..2000) {
            let mut tree = RawAvlTree::new(Natural);
            for key in 0..count as i32 {
                tree.insert(key, ());
            }
            // AVL bound: h < 1.4405 * log2(n + 2), with log2 rounded up.
            let log2 = (count + 2).ilog2() as usize + 1;
            prop_assert!(tree.height() * 10_000 < 14_405 * log2);
        }
    }
}
