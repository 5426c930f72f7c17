use super::AvlTree;
use crate::compare::Natural;
use crate::raw::RawAvlTree;

impl<K, V> AvlTree<K, V> {
    /// Creates an empty tree with room for at least `capacity` entries before its node storage
    /// reallocates.
    ///
    /// Every entry costs one internal and one external node, so `2 * capacity + 1` node slots
    /// are reserved.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_merge::AvlTree;
    ///
    /// let tree: AvlTree<i32, i32> = AvlTree::with_capacity(32);
    /// assert!(tree.is_empty());
    /// assert!(tree.capacity() >= 32);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(capacity) for memory allocation.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_comparator(capacity, Natural)
    }
}

impl<K, V, C> AvlTree<K, V, C> {
    /// Creates an empty tree ordered by `comparator` with room for at least `capacity` entries.
    pub fn with_capacity_and_comparator(capacity: usize, comparator: C) -> Self {
        AvlTree {
            raw: RawAvlTree::with_capacity(capacity, comparator),
        }
    }

    /// Returns how many entries the tree can hold without reallocating its node storage.
    ///
    /// # Complexity
    ///
    /// O(1)
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.raw.capacity()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn reserved_capacity_is_not_reallocated() {
        let mut tree = AvlTree::with_capacity(100);
        let capacity = tree.capacity();
        assert!(capacity >= 100);
        for key in 0..100 {
            tree.insert(key, key);
        }
        assert_eq!(tree.capacity(), capacity);
    }

    #[test]
    fn capacity_with_custom_comparator() {
        let tree: AvlTree<i32, (), _> = AvlTree::with_capacity_and_comparator(8, |a: &i32, b: &i32| b.cmp(a));
        assert!(tree.capacity() >= 8);
        assert_eq!(tree.node_count(), 1);
    }
}
