use thiserror::Error;

use crate::avl_tree::Position;

/// Error returned when a [`Position`] cannot be used for the requested operation.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Error)]
#[non_exhaustive]
pub enum PositionError {
    /// The position refers to an external (empty) node, which carries no entry.
    #[error("position {0:?} is an external node")]
    External(Position),

    /// The position does not refer to a live node of this tree.
    #[error("position {0:?} is not a node of this tree")]
    Stale(Position),
}

/// A broken structural invariant, as reported by
/// [`AvlTree::check_invariants`](crate::AvlTree::check_invariants).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Error)]
#[non_exhaustive]
pub enum InvariantViolation {
    #[error("root {0:?} has a parent reference")]
    RootHasParent(Position),

    /// A child's parent reference does not point at the node that owns it.
    #[error("node {position:?} does not point back at its parent {expected:?}")]
    ParentMismatch { position: Position, expected: Position },

    #[error("node {position:?} stores height {stored}, actual height is {actual}")]
    HeightMismatch {
        position: Position,
        stored: usize,
        actual: usize,
    },

    #[error("node {position:?} is unbalanced: left height {left}, right height {right}")]
    Unbalanced {
        position: Position,
        left: usize,
        right: usize,
    },

    /// The entry at in-order `index` compares less than its predecessor.
    #[error("entries out of order at in-order index {index}")]
    OutOfOrder { index: usize },

    #[error("entry count is {stored}, tree holds {actual} internal nodes")]
    LenMismatch { stored: usize, actual: usize },

    /// Allocated nodes that are not reachable from the root, or vice versa.
    #[error("arena holds {allocated} nodes, {reachable} are reachable from the root")]
    NodeCountMismatch { allocated: usize, reachable: usize },
}
