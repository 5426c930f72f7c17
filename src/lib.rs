//! An AVL-tree multimap with linear-time structural cloning and linear-time balanced merging.
//!
//! [`AvlTree`] keeps entries sorted by key, allows duplicate keys, and models the tree as a
//! *proper* binary tree: every internal node has two children, and empty child slots are explicit
//! external nodes that can be inspected through [`Position`]s.
//!
//! Two whole-tree operations run in O(n) instead of the O(n log n) of repeated insertion:
//!
//! - [`Clone`] duplicates the node graph exactly, keeping shape, entries and heights.
//! - [`AvlTree::merge`] linearizes both trees, interleaves them by key and rebuilds one
//!   perfectly balanced tree from the merged sequence. Ties keep the first tree's entries first.
//!
//! # Example
//!
//! ```
//! use avl_merge::AvlTree;
//!
//! let mut a = AvlTree::new();
//! a.insert(20, "Sydney");
//! a.insert(5, "Shanghai");
//!
//! let mut b = AvlTree::new();
//! b.insert(5, "Dog");
//! b.insert(7, "Lion");
//!
//! let copy = a.clone();
//! assert_eq!(copy, a);
//!
//! let merged = AvlTree::merge(&a, &b);
//! let entries: Vec<_> = merged.iter().collect();
//! assert_eq!(entries, [(&5, &"Shanghai"), (&5, &"Dog"), (&7, &"Lion"), (&20, &"Sydney")]);
//! assert_eq!(merged.check_invariants(), Ok(()));
//! ```
//!
//! # Features
//!
//! - **`no_std` compatible** - Only requires `alloc`, no standard library dependency
//! - **Custom orders** - Any [`Comparator`], including plain closures
//! - **Checked structure** - [`AvlTree::check_invariants`] verifies balance, heights, links and order
//! - **Drawable** - [`AvlTree::layout`] gives every node a grid placement
//!
//! # Logging
//!
//! Whole-tree operations emit [`tracing`](https://docs.rs/tracing) events at `DEBUG` level and
//! rotations at `TRACE` level. The crate never installs a subscriber.

#![no_std]
// These forbid rules and lint groups are meant to be very restrictive.
#![forbid(unsafe_code)]
#![forbid(keyword_idents)]
#![forbid(non_ascii_idents)]
#![forbid(unreachable_pub)]
#![warn(clippy::all)]
#![warn(clippy::cargo)]
#![warn(clippy::pedantic)]
// Enable coverage attributes for nightly builds.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

extern crate alloc;

mod compare;
mod error;
mod raw;

pub mod avl_tree;

pub use avl_tree::{AvlTree, Placement, Position};
pub use compare::{Comparator, Natural};
pub use error::{InvariantViolation, PositionError};
