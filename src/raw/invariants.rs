use core::cmp::Ordering;

use super::handle::Handle;
use super::raw_avl_tree::RawAvlTree;
use crate::avl_tree::Position;
use crate::compare::Comparator;
use crate::error::InvariantViolation;

/// Node tallies gathered while walking the graph.
#[derive(Default)]
struct Census {
    reachable: usize,
    internal: usize,
}

impl<K, V, C: Comparator<K>> RawAvlTree<K, V, C> {
    /// Checks every structural invariant: back-references, stored heights, the AVL balance
    /// condition, in-order key order and both counters. Reports the first violation found.
    pub(crate) fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let root = self.root();
        if self.node(root).parent().is_some() {
            return Err(InvariantViolation::RootHasParent(Position::new(root)));
        }

        let mut census = Census::default();
        self.check_subtree(root, &mut census)?;

        if census.internal != self.len() {
            return Err(InvariantViolation::LenMismatch {
                stored: self.len(),
                actual: census.internal,
            });
        }
        if census.reachable != self.node_count() {
            return Err(InvariantViolation::NodeCountMismatch {
                allocated: self.node_count(),
                reachable: census.reachable,
            });
        }

        let mut previous: Option<&K> = None;
        for (index, (_, node)) in self.inorder().enumerate() {
            if let Some(previous) = previous {
                if self.comparator().compare(previous, node.key()) == Ordering::Greater {
                    return Err(InvariantViolation::OutOfOrder { index });
                }
            }
            previous = Some(node.key());
        }

        Ok(())
    }

    /// Returns the actual height of the subtree at `handle`.
    fn check_subtree(&self, handle: Handle, census: &mut Census) -> Result<usize, InvariantViolation> {
        census.reachable += 1;
        let Some(internal) = self.node(handle).internal() else {
            return Ok(0);
        };
        census.internal += 1;

        for child in [internal.left(), internal.right()] {
            if self.node(child).parent() != Some(handle) {
                return Err(InvariantViolation::ParentMismatch {
                    position: Position::new(child),
                    expected: Position::new(handle),
                });
            }
        }

        let left = self.check_subtree(internal.left(), census)?;
        let right = self.check_subtree(internal.right(), census)?;

        let actual = 1 + left.max(right);
        if internal.height() != actual {
            return Err(InvariantViolation::HeightMismatch {
                position: Position::new(handle),
                stored: internal.height(),
                actual,
            });
        }
        if left.abs_diff(right) > 1 {
            return Err(InvariantViolation::Unbalanced {
                position: Position::new(handle),
                left,
                right,
            });
        }

        Ok(actual)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::compare::Natural;
    use crate::raw::arena::Arena;
    use crate::raw::node::{InternalNode, Node};

    fn leaf(nodes: &mut Arena<Node<i32, ()>>, key: i32) -> Handle {
        let l = nodes.alloc(Node::external(None));
        let r = nodes.alloc(Node::external(None));
        let h = nodes.alloc(Node::Internal(InternalNode::new(key, (), 1, l, r)));
        nodes.get_mut(l).set_parent(Some(h));
        nodes.get_mut(r).set_parent(Some(h));
        h
    }

    /// Builds `2` over two leaves by hand so individual fields can be corrupted.
    fn three_nodes(left_key: i32, height: usize) -> RawAvlTree<i32, (), Natural> {
        let mut nodes = Arena::new();
        let left = leaf(&mut nodes, left_key);
        let right = leaf(&mut nodes, 3);
        let root = nodes.alloc(Node::Internal(InternalNode::new(2, (), height, left, right)));
        nodes.get_mut(left).set_parent(Some(root));
        nodes.get_mut(right).set_parent(Some(root));
        RawAvlTree::from_parts(nodes, root, 3, Natural)
    }

    #[test]
    fn well_formed_graph_passes() {
        assert_eq!(three_nodes(1, 2).check_invariants(), Ok(()));
    }

    #[test]
    fn stale_height_is_reported() {
        let tree = three_nodes(1, 5);
        assert_eq!(
            tree.check_invariants(),
            Err(InvariantViolation::HeightMismatch {
                position: Position::new(tree.root()),
                stored: 5,
                actual: 2,
            })
        );
    }

    #[test]
    fn misordered_keys_are_reported() {
        let tree = three_nodes(7, 2);
        assert_eq!(tree.check_invariants(), Err(InvariantViolation::OutOfOrder { index: 1 }));
    }

    #[test]
    fn unbalanced_chain_is_reported() {
        let mut nodes = Arena::new();
        let mut below = nodes.alloc(Node::<i32, ()>::external(None));
        for (height, key) in (1..=3).zip([3, 2, 1]) {
            let empty = nodes.alloc(Node::external(None));
            let node = nodes.alloc(Node::Internal(InternalNode::new(key, (), height, empty, below)));
            nodes.get_mut(empty).set_parent(Some(node));
            nodes.get_mut(below).set_parent(Some(node));
            below = node;
        }
        let tree = RawAvlTree::from_parts(nodes, below, 3, Natural);
        assert!(matches!(
            tree.check_invariants(),
            Err(InvariantViolation::Unbalanced { left: 0, right: 2, .. })
        ));
    }

    #[test]
    fn wrong_len_is_reported() {
        let mut nodes = Arena::new();
        let root = leaf(&mut nodes, 1);
        let tree = RawAvlTree::from_parts(nodes, root, 4, Natural);
        assert_eq!(
            tree.check_invariants(),
            Err(InvariantViolation::LenMismatch { stored: 4, actual: 1 })
        );
    }

    #[test]
    fn broken_back_reference_is_reported() {
        let mut nodes = Arena::new();
        let root = leaf(&mut nodes, 1);
        let (left, _) = nodes.get(root).children().expect("leaf is internal");
        nodes.get_mut(left).set_parent(None);
        let tree = RawAvlTree::from_parts(nodes, root, 1, Natural);
        assert_eq!(
            tree.check_invariants(),
            Err(InvariantViolation::ParentMismatch {
                position: Position::new(left),
                expected: Position::new(root),
            })
        );
    }

    #[test]
    fn unreachable_nodes_are_reported() {
        let mut nodes = Arena::new();
        let root = leaf(&mut nodes, 1);
        let _orphan = leaf(&mut nodes, 9);
        let tree = RawAvlTree::from_parts(nodes, root, 1, Natural);
        assert_eq!(
            tree.check_invariants(),
            Err(InvariantViolation::NodeCountMismatch {
                allocated: 6,
                reachable: 3,
            })
        );
    }
}
