//! Repository access
//!
//! This module contains the read side of a Git repository:
//!
//! - `database`: Object database, loose and packed (commits are the only objects interpreted)
//! - `pack`: Packfile and pack index reader
//! - `refs`: Reference resolution (loose refs, packed refs, symbolic refs)
//! - `repository`: Repository discovery and identity

pub mod database;
pub mod pack;
pub mod refs;
pub mod repository;
