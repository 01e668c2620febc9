//! Command implementations
//!
//! - `porcelain`: the user-facing `log`, `heads` and `watch` commands

pub mod porcelain;
