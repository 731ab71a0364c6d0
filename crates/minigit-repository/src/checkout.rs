//! Checkout writer: materialize a commit's tree into the work tree.

use std::fs;
use std::path::Path;

use log::debug;
use minigit_hash::ObjectId;
use minigit_loose::LooseObjectStore;
use minigit_object::{Object, Tree};

use crate::{RepoError, Repository};

/// Materialize the tree of `commit_oid` into the repository's work tree.
///
/// Directories are created for `40000` entries, blobs are written verbatim,
/// and symlink entries are materialized as regular files holding the link
/// target. The executable bit is applied where the filesystem supports it.
/// Gitlink (submodule) entries become empty directories.
pub fn checkout_commit(repo: &Repository, commit_oid: &ObjectId) -> Result<(), RepoError> {
    let commit = match repo.store().read(commit_oid)? {
        Some(Object::Commit(c)) => c,
        Some(other) => {
            return Err(RepoError::WrongObjectType {
                oid: *commit_oid,
                expected: "commit",
                actual: other.object_type().as_str(),
            })
        }
        None => return Err(RepoError::MissingObject(*commit_oid)),
    };

    debug!(
        "checking out commit {} (tree {})",
        commit_oid, commit.tree
    );

    materialize_tree(repo.store(), &commit.tree, repo.work_tree())
}

fn read_tree(store: &LooseObjectStore, oid: &ObjectId) -> Result<Tree, RepoError> {
    match store.read(oid)? {
        Some(Object::Tree(t)) => Ok(t),
        Some(other) => Err(RepoError::WrongObjectType {
            oid: *oid,
            expected: "tree",
            actual: other.object_type().as_str(),
        }),
        None => Err(RepoError::MissingObject(*oid)),
    }
}

fn materialize_tree(
    store: &LooseObjectStore,
    tree_oid: &ObjectId,
    dir: &Path,
) -> Result<(), RepoError> {
    let tree = read_tree(store, tree_oid)?;

    for entry in tree.iter() {
        let target = dir.join(entry.name.to_string());

        if entry.mode.is_tree() {
            fs::create_dir_all(&target)?;
            materialize_tree(store, &entry.oid, &target)?;
        } else if entry.mode.is_gitlink() {
            // Submodules are not fetched; leave an empty directory.
            fs::create_dir_all(&target)?;
        } else {
            let blob = match store.read(&entry.oid)? {
                Some(Object::Blob(b)) => b,
                Some(other) => {
                    return Err(RepoError::WrongObjectType {
                        oid: entry.oid,
                        expected: "blob",
                        actual: other.object_type().as_str(),
                    })
                }
                None => return Err(RepoError::MissingObject(entry.oid)),
            };
            fs::write(&target, &blob.data)?;

            #[cfg(unix)]
            if entry.mode == minigit_object::FileMode::Executable {
                use std::os::unix::fs::PermissionsExt;
                fs::set_permissions(&target, fs::Permissions::from_mode(0o755))?;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bstr::BString;
    use minigit_object::{FileMode, ObjectType, TreeEntry};
    use minigit_utils::date::{GitDate, Signature};

    fn signature() -> Signature {
        Signature {
            name: BString::from("Test"),
            email: BString::from("test@example.com"),
            date: GitDate::new(1_700_000_000, 0),
        }
    }

    /// Build a commit whose tree is `src/hello.txt` + `run.sh` (executable).
    fn build_commit(store: &LooseObjectStore) -> ObjectId {
        let hello = store.write_raw(ObjectType::Blob, b"hello world\n").unwrap();
        let script = store.write_raw(ObjectType::Blob, b"#!/bin/sh\n").unwrap();

        let src_tree = Tree {
            entries: vec![TreeEntry {
                mode: FileMode::Regular,
                name: BString::from("hello.txt"),
                oid: hello,
            }],
        };
        let src_oid = store
            .write_raw(ObjectType::Tree, &src_tree.serialize_content())
            .unwrap();

        let root_tree = Tree {
            entries: vec![
                TreeEntry {
                    mode: FileMode::Tree,
                    name: BString::from("src"),
                    oid: src_oid,
                },
                TreeEntry {
                    mode: FileMode::Executable,
                    name: BString::from("run.sh"),
                    oid: script,
                },
            ],
        };
        let root_oid = store
            .write_raw(ObjectType::Tree, &root_tree.serialize_content())
            .unwrap();

        let commit = minigit_object::Commit {
            tree: root_oid,
            parents: Vec::new(),
            author: signature(),
            committer: signature(),
            message: BString::from("initial\n"),
        };
        store
            .write_raw(ObjectType::Commit, &commit.serialize_content())
            .unwrap()
    }

    #[test]
    fn checkout_materializes_files_and_directories() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        let commit_oid = build_commit(repo.store());

        checkout_commit(&repo, &commit_oid).unwrap();

        let hello = fs::read_to_string(dir.path().join("src").join("hello.txt")).unwrap();
        assert_eq!(hello, "hello world\n");
        assert!(dir.path().join("run.sh").is_file());
    }

    #[cfg(unix)]
    #[test]
    fn checkout_sets_executable_bit() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        let commit_oid = build_commit(repo.store());

        checkout_commit(&repo, &commit_oid).unwrap();

        let mode = fs::metadata(dir.path().join("run.sh"))
            .unwrap()
            .permissions()
            .mode();
        assert_ne!(mode & 0o111, 0);
    }

    #[test]
    fn checkout_missing_commit_errors() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        let ghost = ObjectId::from_hex("feedfacefeedfacefeedfacefeedfacefeedface").unwrap();

        assert!(matches!(
            checkout_commit(&repo, &ghost),
            Err(RepoError::MissingObject(_))
        ));
    }

    #[test]
    fn checkout_rejects_non_commit() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        let blob = repo.store().write_raw(ObjectType::Blob, b"x").unwrap();

        assert!(matches!(
            checkout_commit(&repo, &blob),
            Err(RepoError::WrongObjectType { .. })
        ));
    }
}
