use alloc::vec::Vec;

use smallvec::SmallVec;

use super::{AvlTree, Position};
use crate::raw::Handle;

/// Where one node of an [`AvlTree`] sits in a drawing of the tree.
///
/// `column` is the node's index in the in-order sequence of *all* nodes, external ones included,
/// so no two nodes share a column and every parent lies strictly between its children. `depth`
/// is the number of edges from the root.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Placement {
    /// The node being placed.
    pub position: Position,
    /// Distance from the root.
    pub depth: usize,
    /// In-order index among all nodes.
    pub column: usize,
}

impl<K, V, C> AvlTree<K, V, C> {
    /// Computes a grid placement for every node, internal and external, in column order.
    ///
    /// This is all a renderer needs to draw the tree; use [`is_internal`](AvlTree::is_internal),
    /// [`key`](AvlTree::key) and [`value`](AvlTree::value) to label each placement.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_merge::AvlTree;
    ///
    /// let tree = AvlTree::from_sorted([(1, 'a'), (2, 'b'), (3, 'c')]);
    /// let layout = tree.layout();
    /// assert_eq!(layout.len(), tree.node_count());
    ///
    /// let labels: Vec<_> = layout.iter().map(|p| (tree.key(p.position), p.depth)).collect();
    /// assert_eq!(
    ///     labels,
    ///     [(None, 2), (Some(&1), 1), (None, 2), (Some(&2), 0), (None, 2), (Some(&3), 1), (None, 2)],
    /// );
    /// ```
    ///
    /// # Complexity
    ///
    /// O(n)
    #[must_use]
    pub fn layout(&self) -> Vec<Placement> {
        let mut placements = Vec::with_capacity(self.node_count());
        let mut pending: SmallVec<[(Handle, usize); 32]> = SmallVec::new();
        let mut next = Some((self.raw.root(), 0));

        loop {
            while let Some((handle, depth)) = next {
                pending.push((handle, depth));
                next = self.raw.node(handle).children().map(|(left, _)| (left, depth + 1));
            }
            let Some((handle, depth)) = pending.pop() else {
                break;
            };
            placements.push(Placement {
                position: Position::new(handle),
                depth,
                column: placements.len(),
            });
            next = self.raw.node(handle).children().map(|(_, right)| (right, depth + 1));
        }

        placements
    }
}
