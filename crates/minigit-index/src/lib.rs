//! Index (staging area) for minigit.
//!
//! Provides reading of the binary index file (`.git/index`, format version 2)
//! and the tree builder that turns the flat entry list into a tree-object DAG.
//! The index is consumed read-only; it is produced by external tooling, except
//! for the zero-entry file written on `init`.

mod read;
mod tree;
mod write;

use std::path::Path;

use bstr::BString;
use minigit_hash::ObjectId;
use minigit_loose::LooseObjectStore;
use minigit_object::FileMode;

pub use write::write_empty_index;

/// Errors from index operations.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("invalid index header: {0}")]
    InvalidHeader(String),

    #[error("unsupported index version: {0}")]
    UnsupportedVersion(u32),

    #[error("index checksum mismatch")]
    ChecksumMismatch,

    #[error("invalid index entry at offset {offset}: {reason}")]
    InvalidEntry { offset: usize, reason: String },

    #[error("invalid path in index: {0}")]
    InvalidPath(BString),

    #[error("duplicate entry name '{0}' in one directory")]
    DuplicateEntry(BString),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Loose(#[from] minigit_loose::LooseError),
}

/// A single staged entry: path, blob OID, and file mode.
///
/// The on-disk entry also carries stat data for worktree freshness checks;
/// nothing here consumes it, so it is dropped at parse time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub path: BString,
    pub oid: ObjectId,
    pub mode: FileMode,
}

/// The git index (staging area), read-only.
pub struct Index {
    entries: Vec<IndexEntry>,
}

impl Index {
    /// Read and parse the index file at `path`.
    ///
    /// A missing index file is treated as an empty index, matching the
    /// behaviour of a freshly initialized repository.
    pub fn read_from(path: impl AsRef<Path>) -> Result<Self, IndexError> {
        let data = match std::fs::read(path.as_ref()) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self {
                    entries: Vec::new(),
                })
            }
            Err(e) => return Err(IndexError::Io(e)),
        };
        read::parse_index(&data)
    }

    /// Parse an index from raw bytes.
    pub fn parse(data: &[u8]) -> Result<Self, IndexError> {
        read::parse_index(data)
    }

    /// Iterate entries in file order.
    pub fn iter(&self) -> impl Iterator<Item = &IndexEntry> {
        self.entries.iter()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Build and persist the tree-object DAG for the staged entries.
    ///
    /// Returns the OID of the root tree. Every intermediate tree is written
    /// through `store` bottom-up, so a parent tree is never persisted before
    /// its children.
    pub fn write_tree(&self, store: &LooseObjectStore) -> Result<ObjectId, IndexError> {
        tree::write_tree(&self.entries, store)
    }

    pub(crate) fn from_entries(entries: Vec<IndexEntry>) -> Self {
        Self { entries }
    }
}
