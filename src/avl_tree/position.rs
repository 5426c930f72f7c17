use super::AvlTree;
use crate::raw::Handle;

/// An opaque reference to one node, internal or external, of an [`AvlTree`].
///
/// Positions are handed out by [`AvlTree::root`], [`AvlTree::insert`], [`AvlTree::find`] and the
/// navigation methods below. They are plain `Copy` values and do not borrow the tree; a position
/// is only meaningful for the tree that produced it, and only until that tree's next removal,
/// clear or merge. Using a position from another tree is a logic error.
///
/// The navigation methods panic on a position whose node has been freed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Position(Handle);

impl Position {
    pub(crate) const fn new(handle: Handle) -> Self {
        Position(handle)
    }

    pub(crate) const fn handle(self) -> Handle {
        self.0
    }
}

impl<K, V, C> AvlTree<K, V, C> {
    /// Returns the position of the root. The root of an empty tree is an external node.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_merge::AvlTree;
    ///
    /// let mut tree = AvlTree::new();
    /// assert!(tree.is_external(tree.root()));
    ///
    /// tree.insert(2, 'b');
    /// tree.insert(1, 'a');
    /// tree.insert(3, 'c');
    ///
    /// let root = tree.root();
    /// assert_eq!(tree.key(root), Some(&2));
    /// let left = tree.left(root).unwrap();
    /// assert_eq!(tree.value(left), Some(&'a'));
    /// assert_eq!(tree.parent(left), Some(root));
    /// ```
    #[must_use]
    pub fn root(&self) -> Position {
        Position::new(self.raw.root())
    }

    /// Returns `true` if `position` holds an entry.
    #[must_use]
    pub fn is_internal(&self, position: Position) -> bool {
        self.raw.node(position.handle()).is_internal()
    }

    /// Returns `true` if `position` is an empty child slot.
    #[must_use]
    pub fn is_external(&self, position: Position) -> bool {
        self.raw.node(position.handle()).is_external()
    }

    /// Returns `true` if `position` is internal and its left child is internal too.
    #[must_use]
    pub fn has_left(&self, position: Position) -> bool {
        self.left(position).is_some_and(|left| self.is_internal(left))
    }

    /// Returns `true` if `position` is internal and its right child is internal too.
    #[must_use]
    pub fn has_right(&self, position: Position) -> bool {
        self.right(position).is_some_and(|right| self.is_internal(right))
    }

    /// Returns the left child of an internal node, or `None` for an external node.
    ///
    /// The child may itself be external.
    #[must_use]
    pub fn left(&self, position: Position) -> Option<Position> {
        let (left, _) = self.raw.node(position.handle()).children()?;
        Some(Position::new(left))
    }

    /// Returns the right child of an internal node, or `None` for an external node.
    #[must_use]
    pub fn right(&self, position: Position) -> Option<Position> {
        let (_, right) = self.raw.node(position.handle()).children()?;
        Some(Position::new(right))
    }

    /// Returns the parent of `position`, or `None` for the root.
    #[must_use]
    pub fn parent(&self, position: Position) -> Option<Position> {
        self.raw.node(position.handle()).parent().map(Position::new)
    }

    /// Returns the key stored at `position`, or `None` for an external node.
    #[must_use]
    pub fn key(&self, position: Position) -> Option<&K> {
        self.raw.node(position.handle()).internal().map(|internal| internal.key())
    }

    /// Returns the value stored at `position`, or `None` for an external node.
    #[must_use]
    pub fn value(&self, position: Position) -> Option<&V> {
        self.raw.node(position.handle()).internal().map(|internal| internal.value())
    }

    /// Returns the height of the subtree rooted at `position`; 0 for an external node.
    #[must_use]
    pub fn height_at(&self, position: Position) -> usize {
        self.raw.node(position.handle()).height()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use static_assertions::assert_eq_size;

    assert_eq_size!(Position, Handle);
    assert_eq_size!(Position, Option<Position>);

    #[test]
    fn external_children_are_navigable() {
        let mut tree = AvlTree::new();
        let only = tree.insert(1, ());
        assert_eq!(tree.root(), only);
        assert!(!tree.has_left(only));
        assert!(!tree.has_right(only));

        let left = tree.left(only).expect("internal nodes have two children");
        assert!(tree.is_external(left));
        assert_eq!(tree.key(left), None);
        assert_eq!(tree.left(left), None);
        assert_eq!(tree.height_at(left), 0);
        assert_eq!(tree.parent(left), Some(only));
        assert_eq!(tree.parent(only), None);
    }

    #[test]
    fn heights_follow_rotations() {
        let mut tree = AvlTree::new();
        for key in 1..=3 {
            tree.insert(key, ());
        }
        let root = tree.root();
        assert_eq!(tree.key(root), Some(&2));
        assert_eq!(tree.height_at(root), 2);
        assert!(tree.has_left(root));
        assert!(tree.has_right(root));
    }

    #[test]
    #[should_panic]
    fn freed_position_panics() {
        let mut tree = AvlTree::new();
        tree.insert(1, ());
        let two = tree.insert(2, ());
        let _ = tree.left(two);
        tree.clear();
        let _ = tree.is_internal(two);
    }
}
