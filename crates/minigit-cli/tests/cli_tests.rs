//! Integration tests driving the `minigit` binary in temporary repositories.

use std::path::Path;
use std::process::{Command, Output};

fn minigit(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_minigit"))
        .args(args)
        .current_dir(dir)
        .output()
        .expect("failed to run minigit")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

#[test]
fn init_creates_repository() {
    let dir = tempfile::tempdir().unwrap();
    let out = minigit(dir.path(), &["init"]);
    assert!(out.status.success());

    let git_dir = dir.path().join(".git");
    assert!(git_dir.join("objects").is_dir());
    assert!(git_dir.join("refs").is_dir());
    assert!(git_dir.join("index").is_file());
    assert_eq!(
        std::fs::read_to_string(git_dir.join("HEAD")).unwrap(),
        "ref: refs/heads/master\n"
    );
}

#[test]
fn hash_object_without_write() {
    let dir = tempfile::tempdir().unwrap();
    minigit(dir.path(), &["init"]);

    std::fs::write(dir.path().join("f.txt"), "hello\n").unwrap();
    let out = minigit(dir.path(), &["hash-object", "f.txt"]);
    assert!(out.status.success());
    assert_eq!(stdout(&out), "ce013625030ba8dba906f756967f9e9ca394464a");

    // Without -w nothing is persisted.
    let obj = dir
        .path()
        .join(".git/objects/ce/013625030ba8dba906f756967f9e9ca394464a");
    assert!(!obj.exists());
}

#[test]
fn hash_object_write_then_cat_file() {
    let dir = tempfile::tempdir().unwrap();
    minigit(dir.path(), &["init"]);

    std::fs::write(dir.path().join("f.txt"), "hello\n").unwrap();
    let out = minigit(dir.path(), &["hash-object", "-w", "f.txt"]);
    assert!(out.status.success());
    let oid = stdout(&out);
    assert_eq!(oid, "ce013625030ba8dba906f756967f9e9ca394464a");

    let obj = dir
        .path()
        .join(".git/objects/ce/013625030ba8dba906f756967f9e9ca394464a");
    assert!(obj.is_file());

    let out = minigit(dir.path(), &["cat-file", "-p", &oid]);
    assert!(out.status.success());
    assert_eq!(out.stdout, b"hello\n");

    let out = minigit(dir.path(), &["cat-file", "-t", &oid]);
    assert_eq!(stdout(&out), "blob");

    let out = minigit(dir.path(), &["cat-file", "-s", &oid]);
    assert_eq!(stdout(&out), "6");
}

#[test]
fn cat_file_missing_object_fails() {
    let dir = tempfile::tempdir().unwrap();
    minigit(dir.path(), &["init"]);

    let out = minigit(
        dir.path(),
        &["cat-file", "-p", "0123456789012345678901234567890123456789"],
    );
    assert!(!out.status.success());
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.starts_with("fatal:"), "stderr was: {stderr}");
}

#[test]
fn write_tree_of_empty_index() {
    let dir = tempfile::tempdir().unwrap();
    minigit(dir.path(), &["init"]);

    let out = minigit(dir.path(), &["write-tree"]);
    assert!(out.status.success());
    assert_eq!(stdout(&out), "4b825dc642cb6eb9a060e54bf8d69288fbee4904");
}

#[test]
fn commit_tree_and_ls_tree() {
    let dir = tempfile::tempdir().unwrap();
    minigit(dir.path(), &["init"]);

    let tree = stdout(&minigit(dir.path(), &["write-tree"]));

    let out = Command::new(env!("CARGO_BIN_EXE_minigit"))
        .args(["commit-tree", &tree, "-m", "initial"])
        .current_dir(dir.path())
        .env("GIT_AUTHOR_NAME", "A U Thor")
        .env("GIT_AUTHOR_EMAIL", "author@example.com")
        .env("GIT_AUTHOR_DATE", "1700000000 +0000")
        .env("GIT_COMMITTER_NAME", "A U Thor")
        .env("GIT_COMMITTER_EMAIL", "author@example.com")
        .env("GIT_COMMITTER_DATE", "1700000000 +0000")
        .output()
        .unwrap();
    assert!(out.status.success());
    let commit_oid = stdout(&out);

    let out = minigit(dir.path(), &["cat-file", "-p", &commit_oid]);
    let text = String::from_utf8_lossy(&out.stdout);
    assert!(text.starts_with(&format!("tree {tree}\n")));
    assert!(text.contains("author A U Thor <author@example.com> 1700000000 +0000\n"));
    assert!(text.ends_with("\ninitial\n"));

    // The empty tree lists nothing.
    let out = minigit(dir.path(), &["ls-tree", &tree]);
    assert!(out.status.success());
    assert_eq!(stdout(&out), "");
}

#[test]
fn commit_tree_with_parent() {
    let dir = tempfile::tempdir().unwrap();
    minigit(dir.path(), &["init"]);

    let tree = stdout(&minigit(dir.path(), &["write-tree"]));
    let first = stdout(&minigit(dir.path(), &["commit-tree", &tree, "-m", "one"]));
    let out = minigit(
        dir.path(),
        &["commit-tree", &tree, "-p", &first, "-m", "two"],
    );
    assert!(out.status.success());
    let second = stdout(&out);

    let out = minigit(dir.path(), &["cat-file", "-p", &second]);
    let text = String::from_utf8_lossy(&out.stdout);
    assert!(text.contains(&format!("parent {first}\n")));
}

#[test]
fn commit_tree_rejects_missing_tree() {
    let dir = tempfile::tempdir().unwrap();
    minigit(dir.path(), &["init"]);

    let out = minigit(
        dir.path(),
        &[
            "commit-tree",
            "0123456789012345678901234567890123456789",
            "-m",
            "x",
        ],
    );
    assert!(!out.status.success());
}

#[test]
fn clone_refuses_nonempty_destination() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("taken");
    std::fs::create_dir_all(&dest).unwrap();
    std::fs::write(dest.join("occupied"), "x").unwrap();

    let out = minigit(
        dir.path(),
        &["clone", "http://localhost:1/repo.git", "taken"],
    );
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("not an empty directory"), "stderr: {stderr}");
}

#[test]
fn commands_outside_repository_fail() {
    let dir = tempfile::tempdir().unwrap();
    let out = minigit(dir.path(), &["write-tree"]);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("not a git repository"), "stderr: {stderr}");
}
