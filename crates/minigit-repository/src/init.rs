use std::fs;
use std::path::Path;

use log::debug;

use crate::{RepoError, Repository};

/// The branch HEAD points at in a fresh repository.
pub const DEFAULT_BRANCH: &str = "master";

impl Repository {
    /// Initialize a repository at `path` (the work tree root).
    ///
    /// Creates the `.git/` structure:
    /// - `HEAD` pointing at the default branch
    /// - `objects/`
    /// - `refs/heads/`
    /// - an empty version-2 index
    ///
    /// Re-running init on an existing repository is a safe no-op; existing
    /// data is never overwritten.
    pub fn init(path: impl AsRef<Path>) -> Result<Self, RepoError> {
        let work_tree = path.as_ref().to_path_buf();
        let git_dir = work_tree.join(".git");

        if git_dir.join("HEAD").is_file() {
            return Self::open(&work_tree);
        }

        fs::create_dir_all(git_dir.join("objects"))?;
        fs::create_dir_all(git_dir.join("refs").join("heads"))?;

        fs::write(
            git_dir.join("HEAD"),
            format!("ref: refs/heads/{DEFAULT_BRANCH}\n"),
        )?;

        minigit_index::write_empty_index(git_dir.join("index"))?;

        debug!("initialized empty repository at {}", git_dir.display());

        Self::open(&work_tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_creates_layout() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();

        let git_dir = repo.git_dir();
        assert!(git_dir.join("objects").is_dir());
        assert!(git_dir.join("refs").join("heads").is_dir());
        assert!(git_dir.join("index").is_file());

        let head = fs::read_to_string(git_dir.join("HEAD")).unwrap();
        assert_eq!(head, "ref: refs/heads/master\n");
    }

    #[test]
    fn reinit_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        Repository::init(dir.path()).unwrap();

        // Point HEAD somewhere else, then re-init: the change must survive.
        let head_path = dir.path().join(".git").join("HEAD");
        fs::write(&head_path, "ref: refs/heads/other\n").unwrap();

        Repository::init(dir.path()).unwrap();
        assert_eq!(
            fs::read_to_string(&head_path).unwrap(),
            "ref: refs/heads/other\n"
        );
    }

    #[test]
    fn empty_index_is_readable() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        let index = minigit_index::Index::read_from(repo.index_path()).unwrap();
        assert!(index.is_empty());
    }

    #[test]
    fn open_fails_without_repository() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Repository::open(dir.path()),
            Err(RepoError::NotARepository(_))
        ));
    }

    #[test]
    fn discover_walks_up() {
        let dir = tempfile::tempdir().unwrap();
        Repository::init(dir.path()).unwrap();

        let nested = dir.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();

        let repo = Repository::discover(&nested).unwrap();
        assert_eq!(repo.git_dir(), dir.path().join(".git"));
    }
}
