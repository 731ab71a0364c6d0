//! Repository discovery, initialization, refs, and checkout.
//!
//! The `Repository` struct ties the on-disk `.git` layout together: the
//! loose object store, the HEAD file, and loose refs under `refs/`.

mod checkout;
mod init;
mod refs;

use std::path::{Path, PathBuf};

use minigit_hash::ObjectId;
use minigit_loose::LooseObjectStore;

pub use checkout::checkout_commit;
pub use init::DEFAULT_BRANCH;
pub use refs::Head;

/// Errors from repository-level operations.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("not a git repository (or any of the parent directories): {0}")]
    NotARepository(PathBuf),

    #[error("invalid HEAD: {0}")]
    InvalidHead(String),

    #[error("invalid ref name: {0}")]
    InvalidRef(String),

    #[error("object not found: {0}")]
    MissingObject(ObjectId),

    #[error("object {oid} is a {actual}, expected {expected}")]
    WrongObjectType {
        oid: ObjectId,
        expected: &'static str,
        actual: &'static str,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Loose(#[from] minigit_loose::LooseError),

    #[error(transparent)]
    Index(#[from] minigit_index::IndexError),
}

/// An opened repository.
pub struct Repository {
    git_dir: PathBuf,
    work_tree: PathBuf,
    store: LooseObjectStore,
}

impl Repository {
    /// Open the repository whose work tree root is `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RepoError> {
        let work_tree = path.as_ref().to_path_buf();
        let git_dir = work_tree.join(".git");
        if !git_dir.join("HEAD").is_file() {
            return Err(RepoError::NotARepository(work_tree));
        }
        let store = LooseObjectStore::open(git_dir.join("objects"));
        Ok(Self {
            git_dir,
            work_tree,
            store,
        })
    }

    /// Walk up from `start` until a directory containing `.git/HEAD` is found.
    pub fn discover(start: impl AsRef<Path>) -> Result<Self, RepoError> {
        let start = if start.as_ref().is_absolute() {
            start.as_ref().to_path_buf()
        } else {
            std::env::current_dir()?.join(start.as_ref())
        };

        let mut dir: &Path = &start;
        loop {
            if dir.join(".git").join("HEAD").is_file() {
                return Self::open(dir);
            }
            match dir.parent() {
                Some(parent) => dir = parent,
                None => return Err(RepoError::NotARepository(start)),
            }
        }
    }

    /// Path to the `.git` directory.
    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    /// Path to the work tree root.
    pub fn work_tree(&self) -> &Path {
        &self.work_tree
    }

    /// The loose object store.
    pub fn store(&self) -> &LooseObjectStore {
        &self.store
    }

    /// Path to the index file.
    pub fn index_path(&self) -> PathBuf {
        self.git_dir.join("index")
    }
}
