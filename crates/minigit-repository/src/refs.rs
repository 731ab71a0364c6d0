//! HEAD and loose ref file I/O.

use std::fs;

use minigit_hash::ObjectId;

use crate::{RepoError, Repository};

/// The contents of the HEAD file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Head {
    /// `ref: refs/heads/<name>` — HEAD follows a branch.
    Symbolic(String),
    /// A bare 40-hex digest — detached HEAD.
    Detached(ObjectId),
}

impl Repository {
    /// Read and parse the HEAD file.
    pub fn head(&self) -> Result<Head, RepoError> {
        let raw = fs::read_to_string(self.git_dir().join("HEAD"))?;
        let line = raw.trim_end();

        if let Some(target) = line.strip_prefix("ref: ") {
            if target.is_empty() {
                return Err(RepoError::InvalidHead(raw));
            }
            return Ok(Head::Symbolic(target.to_string()));
        }

        match ObjectId::from_hex(line) {
            Ok(oid) => Ok(Head::Detached(oid)),
            Err(_) => Err(RepoError::InvalidHead(raw)),
        }
    }

    /// Resolve HEAD to a commit OID, if the branch it follows exists yet.
    pub fn resolve_head(&self) -> Result<Option<ObjectId>, RepoError> {
        match self.head()? {
            Head::Detached(oid) => Ok(Some(oid)),
            Head::Symbolic(refname) => self.read_ref(&refname),
        }
    }

    /// Point HEAD at a branch.
    pub fn set_head_symbolic(&self, refname: &str) -> Result<(), RepoError> {
        validate_refname(refname)?;
        fs::write(self.git_dir().join("HEAD"), format!("ref: {refname}\n"))?;
        Ok(())
    }

    /// Read a loose ref (e.g. `refs/heads/master`). `Ok(None)` if absent.
    pub fn read_ref(&self, refname: &str) -> Result<Option<ObjectId>, RepoError> {
        validate_refname(refname)?;
        let path = self.git_dir().join(refname);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(RepoError::Io(e)),
        };
        let oid = ObjectId::from_hex(raw.trim_end())
            .map_err(|_| RepoError::InvalidRef(format!("{refname}: bad digest")))?;
        Ok(Some(oid))
    }

    /// Write a loose ref as `<40-hex>\n`.
    pub fn write_ref(&self, refname: &str, oid: &ObjectId) -> Result<(), RepoError> {
        validate_refname(refname)?;
        let path = self.git_dir().join(refname);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, format!("{}\n", oid.to_hex()))?;
        Ok(())
    }
}

/// Reject ref names that would escape the `.git` directory or collide with
/// its files. Full ref-name syntax checking is not needed here: these names
/// come from the local CLI or an advertisement that already parsed.
fn validate_refname(refname: &str) -> Result<(), RepoError> {
    let ok = refname == "HEAD"
        || (refname.starts_with("refs/")
            && !refname.split('/').any(|c| c.is_empty() || c == "." || c == ".."));
    if !ok {
        return Err(RepoError::InvalidRef(refname.to_string()));
    }
    Ok(())
}
