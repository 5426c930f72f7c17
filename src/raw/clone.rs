use tracing::debug;

use super::arena::Arena;
use super::handle::Handle;
use super::node::{InternalNode, Node};
use super::raw_avl_tree::RawAvlTree;

impl<K: Clone, V: Clone, C: Clone> Clone for RawAvlTree<K, V, C> {
    /// Deep-copies the node graph into a fresh arena: same shape, entries and heights, no shared
    /// storage. O(n) in the total number of nodes.
    fn clone(&self) -> Self {
        debug!(len = self.len(), nodes = self.node_count(), "cloning tree");

        let mut nodes = Arena::with_capacity(self.node_count());
        let root = clone_postorder(self.nodes(), &mut nodes, self.root());
        Self::from_parts(nodes, root, self.len(), self.comparator().clone())
    }
}

/// Post-order duplication: both children are copied before the node itself, so the copy can be
/// allocated with its final child handles and the children re-pointed at it.
///
/// Recursion depth is the height of the source, which is logarithmic for an AVL tree.
fn clone_postorder<K: Clone, V: Clone>(
    source: &Arena<Node<K, V>>,
    target: &mut Arena<Node<K, V>>,
    handle: Handle,
) -> Handle {
    let Node::Internal(internal) = source.get(handle) else {
        return target.alloc(Node::external(None));
    };

    for child in [internal.left(), internal.right()] {
        assert_eq!(
            source.get(child).parent(),
            Some(handle),
            "malformed tree: child {child:?} does not point back at its parent {handle:?}"
        );
    }

    let left = clone_postorder(source, target, internal.left());
    let right = clone_postorder(source, target, internal.right());

    let copy = InternalNode::new(
        internal.key().clone(),
        internal.value().clone(),
        internal.height(),
        left,
        right,
    );
    let copy = target.alloc(Node::Internal(copy));
    target.get_mut(left).set_parent(Some(copy));
    target.get_mut(right).set_parent(Some(copy));
    copy
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::compare::Natural;
    use alloc::string::String;
    use alloc::vec::Vec;
    use proptest::prelude::*;

    /// Walks both graphs in lockstep and asserts identical shape, entries and heights.
    fn assert_same_shape<K, V, C>(a: &RawAvlTree<K, V, C>, b: &RawAvlTree<K, V, C>, x: Handle, y: Handle)
    where
        K: PartialEq + core::fmt::Debug,
        V: PartialEq + core::fmt::Debug,
    {
        let (nx, ny) = (a.node(x), b.node(y));
        assert_eq!(nx.is_internal(), ny.is_internal());
        assert_eq!(nx.height(), ny.height());
        if let (Node::Internal(ix), Node::Internal(iy)) = (nx, ny) {
            assert_eq!(ix.key(), iy.key());
            assert_eq!(ix.value(), iy.value());
            assert_eq!(b.node(iy.left()).parent(), Some(y));
            assert_eq!(b.node(iy.right()).parent(), Some(y));
            assert_same_shape(a, b, ix.left(), iy.left());
            assert_same_shape(a, b, ix.right(), iy.right());
        }
    }

    fn tree_of(keys: &[i32]) -> RawAvlTree<i32, String, Natural> {
        let mut tree = RawAvlTree::new(Natural);
        for &key in keys {
            tree.insert(key, alloc::format!("v{key}"));
        }
        tree
    }

    #[test]
    fn clone_of_empty_tree_is_empty() {
        let tree = tree_of(&[]);
        let copy = tree.clone();
        assert!(copy.is_empty());
        assert_eq!(copy.node_count(), 1);
        assert!(copy.node(copy.root()).is_external());
        assert!(copy.node(copy.root()).parent().is_none());
    }

    #[test]
    fn clone_reproduces_shape() {
        let tree = tree_of(&[20, 8, 5, 30, 22, 40, 12, 10, 3, 5]);
        let copy = tree.clone();
        assert_eq!(copy.len(), tree.len());
        assert_eq!(copy.node_count(), tree.node_count());
        assert!(copy.node(copy.root()).parent().is_none());
        assert_same_shape(&tree, &copy, tree.root(), copy.root());
        assert_eq!(copy.check_invariants(), Ok(()));
    }

    #[test]
    fn clone_is_independent() {
        let mut tree = tree_of(&[1, 2, 3, 4, 5]);
        let mut copy = tree.clone();

        copy.insert(6, String::from("six"));
        let two = copy.find(&2).expect("2 is present");
        copy.remove_at(two);
        let three = copy.find(&3).expect("3 is present");
        *copy.value_mut(three) = String::from("changed");

        let keys: Vec<i32> = tree.inorder().map(|(_, n)| *n.key()).collect();
        assert_eq!(keys, [1, 2, 3, 4, 5]);
        assert_eq!(tree.internal(tree.find(&3).expect("3 is present")).value(), "v3");

        tree.insert(0, String::from("zero"));
        assert!(copy.find(&0).is_none());
    }

    #[test]
    #[should_panic(expected = "malformed tree")]
    fn broken_parent_link_is_fatal() {
        let mut nodes = Arena::new();
        // The left child never gets its back-reference set.
        let left = nodes.alloc(Node::<i32, ()>::external(None));
        let right = nodes.alloc(Node::external(None));
        let root = nodes.alloc(Node::Internal(InternalNode::new(1, (), 1, left, right)));
        nodes.get_mut(right).set_parent(Some(root));

        let mut target = Arena::new();
        let _ = clone_postorder(&nodes, &mut target, root);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        #[test]
        fn clone_matches_source(keys in prop::collection::vec(-100i32..100, 0..300)) {
            let tree = tree_of(&keys);
            let copy = tree.clone();
            assert_same_shape(&tree, &copy, tree.root(), copy.root());
            prop_assert_eq!(copy.entries(), tree.entries());
            prop_assert_eq!(copy.check_invariants(), Ok(()));
        }
    }
}
