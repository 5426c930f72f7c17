use alloc::vec::Vec;
use core::cmp::Ordering;
use core::fmt;
use core::hash::{Hash, Hasher};
use core::iter::FusedIterator;

use crate::compare::{Comparator, Natural};
use crate::error::{InvariantViolation, PositionError};
use crate::raw::{Handle, InOrder, RawAvlTree};

mod capacity;
mod layout;
mod position;

pub use layout::Placement;
pub use position::Position;

/// An ordered multimap based on an [AVL tree], with linear-time cloning and merging.
///
/// Entries are kept sorted by key under the tree's [`Comparator`] (the key's [`Ord`] order by
/// default). Equal keys are allowed; they are kept in insertion order, and [`merge`] places every
/// entry of its first argument before equal entries of its second.
///
/// The tree is a *proper* binary tree: every internal node has exactly two children, and empty
/// child slots are explicit external nodes. A tree holding `n` entries therefore has
/// `2n + 1` nodes (see [`node_count`]) and every node, internal or external, can be visited
/// through the read-only [`Position`] API.
///
/// Besides the usual single-entry operations, two whole-tree operations run in linear time:
///
/// - [`clone`](Clone::clone) copies the node graph exactly: same shape, entries and heights,
///   without sharing any storage with the source.
/// - [`merge`] and [`merge_owned`] combine two trees into a new, perfectly balanced tree without
///   performing any rotations.
///
/// It is a logic error for a key to be modified in such a way that its ordering relative to any
/// other key changes while it is in the tree, or to merge two trees whose comparators disagree.
/// The behavior resulting from such a logic error is not specified, but will not be undefined
/// behavior.
///
/// # Examples
///
/// ```
/// use avl_merge::AvlTree;
///
/// let mut capitals = AvlTree::new();
/// capitals.insert(20, "Sydney");
/// capitals.insert(8, "Beijing");
/// capitals.insert(5, "Shanghai");
/// capitals.insert(5, "Cairo");
///
/// assert_eq!(capitals.len(), 4);
/// assert_eq!(capitals.get(&8), Some(&"Beijing"));
///
/// // Equal keys keep their insertion order.
/// let entries: Vec<_> = capitals.iter().collect();
/// assert_eq!(entries, [(&5, &"Shanghai"), (&5, &"Cairo"), (&8, &"Beijing"), (&20, &"Sydney")]);
///
/// let mut animals = AvlTree::new();
/// animals.insert(5, "Dog");
/// animals.insert(40, "Fox");
///
/// let merged = AvlTree::merge(&capitals, &animals);
/// let keys: Vec<_> = merged.keys().copied().collect();
/// assert_eq!(keys, [5, 5, 5, 8, 20, 40]);
/// assert_eq!(merged.height(), 3);
/// ```
///
/// [AVL tree]: https://en.wikipedia.org/wiki/AVL_tree
/// [`merge`]: AvlTree::merge
/// [`merge_owned`]: AvlTree::merge_owned
/// [`node_count`]: AvlTree::node_count
pub struct AvlTree<K, V, C = Natural> {
    raw: RawAvlTree<K, V, C>,
}

/// An iterator over the entries of an `AvlTree`, in ascending key order.
///
/// This `struct` is created by the [`iter`](AvlTree::iter) method on [`AvlTree`].
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Iter<'a, K, V> {
    inner: InOrder<'a, K, V>,
    remaining: usize,
}

/// An iterator over the keys of an `AvlTree`, in ascending order.
///
/// This `struct` is created by the [`keys`](AvlTree::keys) method on [`AvlTree`].
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

/// An iterator over the values of an `AvlTree`, in key order.
///
/// This `struct` is created by the [`values`](AvlTree::values) method on [`AvlTree`].
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

/// An owning iterator over the entries of an `AvlTree`, in ascending key order.
///
/// This `struct` is created by the `into_iter` method on [`AvlTree`]
/// (provided by the [`IntoIterator`] trait).
pub struct IntoIter<K, V> {
    inner: alloc::vec::IntoIter<(K, V)>,
}

impl<K, V> AvlTree<K, V> {
    /// Makes a new, empty `AvlTree` ordered by `K`'s [`Ord`] implementation.
    ///
    /// The empty tree consists of a single external root node.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_merge::AvlTree;
    ///
    /// let mut tree = AvlTree::new();
    /// assert_eq!(tree.node_count(), 1);
    ///
    /// tree.insert(1, "a");
    /// assert_eq!(tree.node_count(), 3);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::with_comparator(Natural)
    }

    /// Builds a balanced tree from entries that are already sorted by key.
    ///
    /// See [`from_sorted_with_comparator`](AvlTree::from_sorted_with_comparator).
    pub fn from_sorted<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        I::IntoIter: ExactSizeIterator,
    {
        Self::from_sorted_with_comparator(entries, Natural)
    }
}

impl<K, V, C> AvlTree<K, V, C> {
    /// Makes a new, empty `AvlTree` ordered by `comparator`.
    pub fn with_comparator(comparator: C) -> Self {
        AvlTree {
            raw: RawAvlTree::new(comparator),
        }
    }

    /// Builds a perfectly balanced tree from entries already sorted under `comparator`, in
    /// O(n) and without rotations.
    ///
    /// For a run of `n` entries the root is the entry at offset `n / 2` (the upper middle when
    /// `n` is even) and both halves are built the same way, so the height is
    /// `ceil(log2(n + 1))`.
    ///
    /// Passing unsorted entries is a logic error: the tree will not be searchable.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_merge::AvlTree;
    ///
    /// let tree = AvlTree::from_sorted((0..15).map(|k| (k, k * k)));
    /// assert_eq!(tree.height(), 4);
    /// assert_eq!(tree.get(&7), Some(&49));
    /// ```
    pub fn from_sorted_with_comparator<I>(entries: I, comparator: C) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        I::IntoIter: ExactSizeIterator,
    {
        AvlTree {
            raw: RawAvlTree::from_sorted(entries, comparator),
        }
    }

    /// Returns the number of entries in the tree.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.raw.len()
    }

    /// Returns `true` if the tree contains no entries.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Returns the number of nodes, internal and external. Always `2 * len() + 1`.
    #[must_use]
    pub const fn node_count(&self) -> usize {
        self.raw.node_count()
    }

    /// Returns the height of the tree: the number of internal nodes on the longest path from
    /// the root to an external node. An empty tree has height 0.
    #[must_use]
    pub fn height(&self) -> usize {
        self.raw.height()
    }

    /// Returns the comparator that orders this tree.
    pub fn comparator(&self) -> &C {
        self.raw.comparator()
    }

    /// Removes every entry, leaving a single external root.
    pub fn clear(&mut self) {
        self.raw.clear();
    }

    /// Returns the entry with the smallest key. With duplicates, the first one inserted.
    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        self.raw.first_in(self.raw.root()).map(|handle| self.entry_of(handle))
    }

    /// Returns the entry with the largest key. With duplicates, the last one inserted.
    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        self.raw.last_in(self.raw.root()).map(|handle| self.entry_of(handle))
    }

    /// Gets an iterator over the entries of the tree, sorted by key.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_merge::AvlTree;
    ///
    /// let tree: AvlTree<_, _> = [(3, "c"), (1, "a"), (2, "b")].into_iter().collect();
    /// let mut iter = tree.iter();
    /// assert_eq!(iter.next(), Some((&1, &"a")));
    /// assert_eq!(iter.len(), 2);
    /// ```
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.raw.inorder(),
            remaining: self.raw.len(),
        }
    }

    /// Gets an iterator over the keys of the tree, in sorted order.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    /// Gets an iterator over the values of the tree, in order by key.
    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    fn entry_of(&self, handle: Handle) -> (&K, &V) {
        let internal = self.raw.internal(handle);
        (internal.key(), internal.value())
    }
}

impl<K, V, C: Comparator<K>> AvlTree<K, V, C> {
    /// Inserts an entry and returns its position.
    ///
    /// Existing entries are never replaced: an entry whose key equals existing keys is placed
    /// after all of them. The returned position keeps referring to this entry across later
    /// insertions; a removal may move the entry to another position.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_merge::AvlTree;
    ///
    /// let mut tree = AvlTree::new();
    /// let position = tree.insert(37, "a");
    /// assert_eq!(tree.key(position), Some(&37));
    ///
    /// tree.insert(37, "b");
    /// assert_eq!(tree.len(), 2);
    /// ```
    pub fn insert(&mut self, key: K, value: V) -> Position {
        Position::new(self.raw.insert(key, value))
    }

    /// Returns the position of the first entry whose key equals `key`.
    pub fn find(&self, key: &K) -> Option<Position> {
        self.raw.find(key).map(Position::new)
    }

    /// Returns the positions of all entries whose key equals `key`, in order.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_merge::AvlTree;
    ///
    /// let mut tree = AvlTree::new();
    /// tree.insert(5, "Shanghai");
    /// tree.insert(3, "London");
    /// tree.insert(5, "Cairo");
    ///
    /// let values: Vec<_> = tree.find_all(&5).into_iter().filter_map(|p| tree.value(p)).collect();
    /// assert_eq!(values, [&"Shanghai", &"Cairo"]);
    /// ```
    pub fn find_all(&self, key: &K) -> Vec<Position> {
        let mut positions = Vec::new();
        let mut current = self.raw.find(key);
        while let Some(handle) = current {
            if self.raw.comparator().compare(key, self.raw.internal(handle).key()) != Ordering::Equal {
                break;
            }
            positions.push(Position::new(handle));
            current = self.raw.successor(handle);
        }
        positions
    }

    /// Returns a reference to the value of the first entry whose key equals `key`.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.raw.find(key).map(|handle| self.raw.internal(handle).value())
    }

    /// Returns a mutable reference to the value of the first entry whose key equals `key`.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let handle = self.raw.find(key)?;
        Some(self.raw.value_mut(handle))
    }

    /// Returns `true` if the tree contains an entry with the given key.
    pub fn contains_key(&self, key: &K) -> bool {
        self.raw.find(key).is_some()
    }

    /// Removes the entry at `position` and returns it, rebalancing as needed.
    ///
    /// # Errors
    ///
    /// Returns [`PositionError::External`] if `position` is an external node and
    /// [`PositionError::Stale`] if it is not a live node of this tree.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_merge::{AvlTree, PositionError};
    ///
    /// let mut tree = AvlTree::new();
    /// let position = tree.insert(1, "one");
    /// assert_eq!(tree.remove_at(position), Ok((1, "one")));
    ///
    /// let root = tree.root();
    /// assert_eq!(tree.remove_at(root), Err(PositionError::External(root)));
    /// ```
    pub fn remove_at(&mut self, position: Position) -> Result<(K, V), PositionError> {
        let handle = position.handle();
        let Some(node) = self.raw.try_node(handle) else {
            return Err(PositionError::Stale(position));
        };
        if node.is_external() {
            return Err(PositionError::External(position));
        }
        Ok(self.raw.remove_at(handle))
    }

    /// Removes the first entry whose key equals `key` and returns it.
    pub fn remove(&mut self, key: &K) -> Option<(K, V)> {
        let handle = self.raw.find(key)?;
        Some(self.raw.remove_at(handle))
    }

    /// Verifies every structural invariant of the tree: parent back-references, stored heights,
    /// the AVL balance condition, key order and the entry and node counts.
    ///
    /// A tree built only through this crate's API always passes. The check is O(n).
    ///
    /// # Errors
    ///
    /// Returns the first [`InvariantViolation`] found.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        self.raw.check_invariants()
    }

    /// Merges two trees into a new, perfectly balanced tree holding clones of every entry of
    /// both. Neither input is modified. Runs in O(n + m).
    ///
    /// Both trees are linearized in order, interleaved by key, and the result is rebuilt from
    /// the merged sequence. Among entries with equal keys, all of `a`'s come before all of
    /// `b`'s. The result has `a.len() + b.len()` entries, height `ceil(log2(len + 1))`, and uses
    /// `a`'s comparator.
    ///
    /// `a` and `b` must be ordered the same way; this is not checked.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_merge::AvlTree;
    ///
    /// let a: AvlTree<_, _> = [(5, "x"), (1, "p")].into_iter().collect();
    /// let b: AvlTree<_, _> = [(5, "y"), (9, "q")].into_iter().collect();
    ///
    /// let merged = AvlTree::merge(&a, &b);
    /// let entries: Vec<_> = merged.iter().collect();
    /// assert_eq!(entries, [(&1, &"p"), (&5, &"x"), (&5, &"y"), (&9, &"q")]);
    /// assert_eq!(a.len(), 2);
    /// ```
    #[must_use]
    pub fn merge(a: &Self, b: &Self) -> Self
    where
        K: Clone,
        V: Clone,
        C: Clone,
    {
        AvlTree {
            raw: RawAvlTree::merge(&a.raw, &b.raw),
        }
    }

    /// Like [`merge`](AvlTree::merge), but consumes both trees and moves their entries instead
    /// of cloning them.
    #[must_use]
    pub fn merge_owned(a: Self, b: Self) -> Self {
        AvlTree {
            raw: RawAvlTree::merge_owned(a.raw, b.raw),
        }
    }
}

impl<K: Clone, V: Clone, C: Clone> Clone for AvlTree<K, V, C> {
    /// Copies the tree node for node in O(n): the clone has the same shape, entries and heights,
    /// and shares no storage with `self`.
    fn clone(&self) -> Self {
        AvlTree { raw: self.raw.clone() }
    }
}

impl<K: PartialEq, V: PartialEq, C> PartialEq for AvlTree<K, V, C> {
    /// Two trees are equal when they hold equal entries in the same order, whatever their shape.
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<K: Eq, V: Eq, C> Eq for AvlTree<K, V, C> {}

impl<K: Hash, V: Hash, C> Hash for AvlTree<K, V, C> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(self.len());
        for entry in self {
            entry.hash(state);
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug, C> fmt::Debug for AvlTree<K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, C: Default> Default for AvlTree<K, V, C> {
    /// Creates an empty `AvlTree`.
    fn default() -> AvlTree<K, V, C> {
        AvlTree::with_comparator(C::default())
    }
}

impl<K, V, C: Comparator<K> + Default> FromIterator<(K, V)> for AvlTree<K, V, C> {
    /// Sorts the entries (stably, so equal keys keep their order) and builds a balanced tree
    /// in one pass.
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let comparator = C::default();
        let mut entries: Vec<(K, V)> = iter.into_iter().collect();
        entries.sort_by(|a, b| comparator.compare(&a.0, &b.0));
        AvlTree::from_sorted_with_comparator(entries, comparator)
    }
}

impl<K, V, C: Comparator<K>> Extend<(K, V)> for AvlTree<K, V, C> {
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<'a, K, V, C> IntoIterator for &'a AvlTree<K, V, C> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

impl<K, V, C> IntoIterator for AvlTree<K, V, C> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    /// Gets an owning iterator over the entries of the tree, sorted by key.
    fn into_iter(mut self) -> IntoIter<K, V> {
        IntoIter {
            inner: self.raw.drain_inorder().into_iter(),
        }
    }
}

impl<K: Ord, V, const N: usize> From<[(K, V); N]> for AvlTree<K, V> {
    /// Converts a `[(K, V); N]` into an `AvlTree<K, V>`.
    ///
    /// ```
    /// use avl_merge::AvlTree;
    ///
    /// let tree = AvlTree::from([(1, 2), (3, 4), (1, 5)]);
    /// assert_eq!(tree.len(), 3);
    /// ```
    fn from(arr: [(K, V); N]) -> Self {
        AvlTree::from_iter(arr)
    }
}

impl<'a, K: 'a, V: 'a> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<(&'a K, &'a V)> {
        let (_, node) = self.inner.next()?;
        self.remaining -= 1;
        Some((node.key(), node.value()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {
    fn len(&self) -> usize {
        self.remaining
    }
}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Iter {
            inner: self.inner.clone(),
            remaining: self.remaining,
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Iter<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<&'a K> {
        self.inner.next().map(|(key, _)| key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}

impl<K, V> FusedIterator for Keys<'_, K, V> {}

impl<K, V> Clone for Keys<'_, K, V> {
    fn clone(&self) -> Self {
        Keys {
            inner: self.inner.clone(),
        }
    }
}

impl<K: fmt::Debug, V> fmt::Debug for Keys<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<&'a V> {
        self.inner.next().map(|(_, value)| value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}

impl<K, V> FusedIterator for Values<'_, K, V> {}

impl<K, V> Clone for Values<'_, K, V> {
    fn clone(&self) -> Self {
        Values {
            inner: self.inner.clone(),
        }
    }
}

impl<K, V: fmt::Debug> fmt::Debug for Values<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<(K, V)> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for IntoIter<K, V> {
    fn next_back(&mut self) -> Option<(K, V)> {
        self.inner.next_back()
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}

impl<K, V> FusedIterator for IntoIter<K, V> {}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for IntoIter<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.inner.as_slice()).finish()
    }
}
