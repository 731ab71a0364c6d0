//! Empty-index writing (for `init` and fresh clones).

use std::path::Path;

use minigit_hash::hasher::Hasher;

use crate::IndexError;

/// Write a zero-entry version-2 index file at `path`.
///
/// Layout: `DIRC`, big-endian version 2, big-endian entry count 0, followed
/// by the SHA-1 checksum of those 12 bytes. With no entry data the header
/// checksum and the whole-content checksum coincide, so any conforming
/// reader accepts the file.
pub fn write_empty_index(path: impl AsRef<Path>) -> Result<(), IndexError> {
    let mut buf = Vec::with_capacity(32);
    buf.extend_from_slice(b"DIRC");
    buf.extend_from_slice(&2u32.to_be_bytes());
    buf.extend_from_slice(&0u32.to_be_bytes());

    let checksum = Hasher::digest(&buf);
    buf.extend_from_slice(checksum.as_bytes());

    std::fs::write(path.as_ref(), &buf)?;
    Ok(())
}
