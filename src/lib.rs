//! Reconciled local/remote commit history for git repositories
//!
//! - `areas`: on-disk repository access (object database, refs)
//! - `artifacts`: object model, graph traversal and history reconciliation
//! - `commands`: the `bit-history` command implementations

pub mod areas;
pub mod artifacts;
pub mod commands;

/// How `log` prints the reconciled history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum HistoryFormat {
    /// Short id, label, author and date in aligned columns
    #[default]
    Table,
    /// Short id and label only
    Oneline,
}
