//! Porcelain commands (user-facing operations)
//!
//! ## Commands
//!
//! - `log`: Show the reconciled local/remote history
//! - `heads`: Show what the local and remote heads resolve to
//! - `watch`: Keep showing the history as the heads move

pub mod heads;
pub mod log;
pub mod watch;
