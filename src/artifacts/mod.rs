//! Git data structures and algorithms
//!
//! - `branch`: Ref names and the rules used to resolve them
//! - `core`: Shared utilities (pager wrapper, etc.)
//! - `history`: Local/remote history reconciliation
//! - `log`: Commit graph traversal
//! - `objects`: Git object types (commit) and object ids

pub mod branch;
pub mod core;
pub mod history;
pub mod log;
pub mod objects;
