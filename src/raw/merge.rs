use alloc::vec::Vec;
use core::cmp::Ordering;

use tracing::debug;

use super::arena::Arena;
use super::handle::Handle;
use super::node::{InternalNode, Node};
use super::raw_avl_tree::RawAvlTree;
use crate::compare::Comparator;

/// Merges two sorted sequences into one, in O(a + b).
///
/// When the heads compare equal the element from `a` is taken first, so equal elements keep
/// their relative order and all of `a`'s precede all of `b`'s.
pub(crate) fn interleave<T, F>(a: Vec<T>, b: Vec<T>, mut compare: F) -> Vec<T>
where
    F: FnMut(&T, &T) -> Ordering,
{
    let mut merged = Vec::with_capacity(a.len() + b.len());
    let mut a = a.into_iter().peekable();
    let mut b = b.into_iter().peekable();

    while let (Some(x), Some(y)) = (a.peek(), b.peek()) {
        if compare(x, y) == Ordering::Greater {
            merged.extend(b.next());
        } else {
            merged.extend(a.next());
        }
    }

    merged.extend(a);
    merged.extend(b);
    merged
}

impl<K, V, C> RawAvlTree<K, V, C> {
    /// Builds a perfectly balanced tree from entries already sorted under `comparator`.
    ///
    /// Each range of `count` entries is rooted at offset `count / 2`, the upper middle when
    /// `count` is even, so the left subtree is never smaller than the right one. No rotations are
    /// performed and the height is `ceil(log2(len + 1))`. O(len).
    pub(crate) fn from_sorted<I>(entries: I, comparator: C) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        I::IntoIter: ExactSizeIterator,
    {
        let mut entries = entries.into_iter();
        let len = entries.len();
        debug!(len, "rebuilding balanced tree from sorted entries");

        let mut nodes = Arena::with_capacity(2 * len + 1);
        let root = build_balanced(&mut nodes, &mut entries, len);
        Self::from_parts(nodes, root, len, comparator)
    }
}

/// Consumes exactly `count` entries from `entries` in order and returns the subtree root.
fn build_balanced<K, V, I>(nodes: &mut Arena<Node<K, V>>, entries: &mut I, count: usize) -> Handle
where
    I: Iterator<Item = (K, V)>,
{
    if count == 0 {
        return nodes.alloc(Node::external(None));
    }

    let left_count = count / 2;
    let left = build_balanced(nodes, entries, left_count);
    let (key, value) = entries.next().expect("`ExactSizeIterator` yielded fewer entries than its `len()`");
    let right = build_balanced(nodes, entries, count - left_count - 1);

    let height = 1 + nodes.get(left).height().max(nodes.get(right).height());
    let node = nodes.alloc(Node::Internal(InternalNode::new(key, value, height, left, right)));
    nodes.get_mut(left).set_parent(Some(node));
    nodes.get_mut(right).set_parent(Some(node));
    node
}

impl<K, V, C: Comparator<K>> RawAvlTree<K, V, C> {
    /// Merges two trees into a new balanced tree, leaving both inputs untouched.
    ///
    /// The result uses `a`'s comparator; `b` must be ordered the same way.
    pub(crate) fn merge(a: &Self, b: &Self) -> Self
    where
        K: Clone,
        V: Clone,
        C: Clone,
    {
        debug!(left = a.len(), right = b.len(), "merging trees");

        let merged = interleave(a.entries(), b.entries(), |x, y| a.comparator().compare(x.0, y.0));
        Self::from_sorted(
            merged.into_iter().map(|(key, value)| (key.clone(), value.clone())),
            a.comparator().clone(),
        )
    }

    /// Merges two trees into a new balanced tree, moving their entries instead of cloning them.
    pub(crate) fn merge_owned(mut a: Self, mut b: Self) -> Self {
        debug!(left = a.len(), right = b.len(), "merging owned trees");

        let left = a.drain_inorder();
        let right = b.drain_inorder();
        let comparator = a.into_comparator();
        let merged = interleave(left, right, |x, y| comparator.compare(&x.0, &y.0));
        Self::from_sorted(merged, comparator)
    }
}
