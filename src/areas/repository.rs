use crate::areas::database::Database;
use crate::areas::refs::Refs;
use crate::artifacts::branch::ref_name::RefName;
use crate::artifacts::objects::object_id::ObjectId;
use anyhow::Context;
use std::path::{Path, PathBuf};

/// Identity of a repository: its canonical git directory
///
/// Two handles opened on the same repository (through the work tree or the
/// git directory itself) compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RepositoryId(PathBuf);

impl RepositoryId {
    pub fn new(git_dir: impl Into<PathBuf>) -> Self {
        RepositoryId(git_dir.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl std::fmt::Display for RepositoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Read-only handle on a repository's object database and refs
///
/// Holds no open file descriptors between calls: every read opens and
/// releases its file, so dropping the handle releases everything.
#[derive(Debug)]
pub struct Repository {
    path: Box<Path>,
    id: RepositoryId,
    database: Database,
    refs: Refs,
}

impl Repository {
    /// Open the repository at `path`
    ///
    /// `path` may be a work tree containing a `.git` directory, or a git
    /// directory itself (bare repository).
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let path = path
            .canonicalize()
            .with_context(|| format!("Unable to open repository at {}", path.display()))?;

        let git_dir = if path.join(".git").is_dir() {
            path.join(".git")
        } else if Self::is_git_dir(&path) {
            path.clone()
        } else {
            anyhow::bail!("not a git repository: {}", path.display());
        };

        if !Self::is_git_dir(&git_dir) {
            anyhow::bail!("not a git repository: {}", git_dir.display());
        }

        let database = Database::new(git_dir.join("objects").into_boxed_path());
        let refs = Refs::new(git_dir.clone().into_boxed_path());

        Ok(Repository {
            path: path.into_boxed_path(),
            id: RepositoryId::new(git_dir),
            database,
            refs,
        })
    }

    fn is_git_dir(path: &Path) -> bool {
        path.join("objects").is_dir() && path.join("HEAD").is_file()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn id(&self) -> &RepositoryId {
        &self.id
    }

    pub fn git_dir(&self) -> &Path {
        self.id.path()
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn refs(&self) -> &Refs {
        &self.refs
    }

    /// Resolve a ref name to a commit id, `None` when the ref does not exist
    pub fn resolve_head(&self, name: &RefName) -> anyhow::Result<Option<ObjectId>> {
        self.refs
            .resolve(name)
            .with_context(|| format!("Unable to resolve ref {name}"))
    }
}
