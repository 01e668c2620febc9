//! Commit history traversal
//!
//! - `rev_list`: lazy walk over the commits reachable from a set of starts
//!
//! ## Algorithm
//!
//! The walk uses a priority queue ordered by commit timestamp. In topological
//! order a commit only enters the queue once all of its reachable children
//! have been produced, which keeps descendants ahead of their ancestors even
//! when commit clocks are skewed.

pub mod rev_list;
