//! History reconciliation
//!
//! Presents the history reachable from a local branch tip and its
//! remote-tracking counterpart as one ordered list of annotated rows.
//!
//! - `error`: errors that abort a reconciliation run
//! - `row`: a commit annotated with the heads pointing at it
//! - `sequence`: the ordered, deduplicated result of one run
//! - `reconcile`: a single reconciliation run against a repository
//! - `trigger`: publish/subscribe channel for repository change signals
//! - `model`: owns the current result, coalesces runs, follows the trigger
//! - `format`: turns rows into display columns

pub mod error;
pub mod format;
pub mod model;
pub mod reconcile;
pub mod row;
pub mod sequence;
pub mod trigger;
