use crate::areas::repository::RepositoryId;
use std::path::PathBuf;

/// Failure of a reconciliation run
///
/// Unresolved refs and missing parent commits are not errors: they are
/// recorded on the resulting sequence instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HistoryError {
    /// The object store or refs could not be read (permissions, corruption,
    /// missing directory)
    #[error("unable to read repository {}: {reason}", path.display())]
    RepositoryAccess { path: PathBuf, reason: String },
    #[error("no repository is bound to the history model")]
    Unbound,
    #[error("reconciliation run was cancelled: {0}")]
    Closed(String),
}

impl HistoryError {
    pub fn access(repository: &RepositoryId, error: anyhow::Error) -> Self {
        HistoryError::RepositoryAccess {
            path: repository.path().to_path_buf(),
            reason: format!("{error:#}"),
        }
    }
}
