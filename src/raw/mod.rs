mod arena;
mod clone;
mod handle;
mod invariants;
mod merge;
mod node;
mod raw_avl_tree;
mod traversal;

pub(crate) use handle::Handle;
pub(crate) use raw_avl_tree::RawAvlTree;
pub(crate) use traversal::InOrder;
