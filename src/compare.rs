use core::cmp::Ordering;

/// A total order over keys of type `K`, used by [`AvlTree`](crate::AvlTree) to place entries.
///
/// Any closure or function of type `Fn(&K, &K) -> Ordering` is a comparator, so a custom order
/// rarely needs a named type:
///
/// ```
/// use avl_merge::AvlTree;
///
/// let mut tree = AvlTree::with_comparator(|a: &i32, b: &i32| b.cmp(a));
/// tree.insert(1, "one");
/// tree.insert(3, "three");
/// tree.insert(2, "two");
///
/// let keys: Vec<_> = tree.keys().copied().collect();
/// assert_eq!(keys, [3, 2, 1]);
/// ```
///
/// Two trees can only be merged meaningfully when their comparators define the same order.
/// This is not checked.
pub trait Comparator<K: ?Sized> {
    /// Compares two keys.
    fn compare(&self, a: &K, b: &K) -> Ordering;
}

/// The natural order of `K`, as given by its [`Ord`] implementation.
///
/// This is the default comparator of [`AvlTree`](crate::AvlTree).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub struct Natural;

impl<K: Ord + ?Sized> Comparator<K> for Natural {
    #[inline]
    fn compare(&self, a: &K, b: &K) -> Ordering {
        a.cmp(b)
    }
}

impl<K: ?Sized, F> Comparator<K> for F
where
    F: Fn(&K, &K) -> Ordering,
{
    #[inline]
    fn compare(&self, a: &K, b: &K) -> Ordering {
        self(a, b)
    }
}
