//! Index file reading (version 2).

use bstr::BString;
use minigit_hash::hasher::Hasher;
use minigit_hash::ObjectId;
use minigit_object::FileMode;

use crate::{Index, IndexEntry, IndexError};

/// Magic bytes at the start of every index file.
const INDEX_SIGNATURE: &[u8; 4] = b"DIRC";

/// Size of the fixed portion of an on-disk entry before the path:
/// ctime(8) + mtime(8) + dev(4) + ino(4) + mode(4) + uid(4) + gid(4) +
/// size(4) + oid(20) + flags(2).
const ENTRY_PREFIX_SIZE: usize = 62;

/// SHA-1 checksum size at the end of the file.
const CHECKSUM_SIZE: usize = 20;

/// Parse an index file from raw bytes.
pub fn parse_index(data: &[u8]) -> Result<Index, IndexError> {
    if data.len() < 12 + CHECKSUM_SIZE {
        return Err(IndexError::InvalidHeader("index file too short".into()));
    }

    verify_checksum(data)?;

    let mut cursor = 0;

    let sig = &data[cursor..cursor + 4];
    if sig != INDEX_SIGNATURE {
        return Err(IndexError::InvalidHeader(format!(
            "bad signature: expected DIRC, got {:?}",
            sig
        )));
    }
    cursor += 4;

    let version = read_u32(&data[cursor..]);
    cursor += 4;

    if version != 2 {
        return Err(IndexError::UnsupportedVersion(version));
    }

    let entry_count = read_u32(&data[cursor..]) as usize;
    cursor += 4;

    let content_end = data.len() - CHECKSUM_SIZE;
    let mut entries = Vec::with_capacity(entry_count);

    for _ in 0..entry_count {
        let (entry, new_cursor) = parse_entry(data, cursor, content_end)?;
        entries.push(entry);
        cursor = new_cursor;
    }

    // Extension blocks (TREE cache etc.) may follow the entries; none of
    // them affect the staged entry list, so they are skipped wholesale.

    Ok(Index::from_entries(entries))
}

/// On-disk entry size using C git's formula:
/// `(prefix + name_len + 8) & ~7` — the path is NUL-padded so the whole
/// entry is a multiple of 8 bytes.
fn ondisk_entry_size(name_len: usize) -> usize {
    (ENTRY_PREFIX_SIZE + name_len + 8) & !7
}

/// Parse a single cache entry starting at `start`.
fn parse_entry(
    data: &[u8],
    start: usize,
    content_end: usize,
) -> Result<(IndexEntry, usize), IndexError> {
    if start + ENTRY_PREFIX_SIZE > content_end {
        return Err(IndexError::InvalidEntry {
            offset: start,
            reason: "entry too short".into(),
        });
    }

    // Bytes 0..24 are ctime/mtime/dev/ino; bytes 28..40 are uid/gid/size.
    // Only the mode (24..28) and OID (40..60) matter here.
    let mode_raw = read_u32(&data[start + 24..]);

    let oid =
        ObjectId::from_bytes(&data[start + 40..start + 60]).map_err(|_| IndexError::InvalidEntry {
            offset: start,
            reason: "invalid OID".into(),
        })?;

    // Flags (16 bits): low 12 bits are the name length (0xFFF for longer).
    let flags = read_u16(&data[start + 60..]);
    let name_len_field = (flags & 0x0FFF) as usize;

    // The path follows the prefix; padding provides NUL termination, so find
    // the actual length from the NUL when the field is saturated.
    let path_start = start + ENTRY_PREFIX_SIZE;
    let name_len = if name_len_field < 0x0FFF {
        if path_start + name_len_field > content_end {
            return Err(IndexError::InvalidEntry {
                offset: start,
                reason: "path exceeds index bounds".into(),
            });
        }
        name_len_field
    } else {
        data[path_start..content_end]
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| IndexError::InvalidEntry {
                offset: start,
                reason: "missing NUL in path".into(),
            })?
    };

    let path = BString::from(&data[path_start..path_start + name_len]);

    let entry_size = ondisk_entry_size(name_len);
    let cursor = start + entry_size;
    if cursor > content_end {
        return Err(IndexError::InvalidEntry {
            offset: start,
            reason: "entry padding exceeds index bounds".into(),
        });
    }

    let entry = IndexEntry {
        path,
        oid,
        mode: FileMode::from_raw(mode_raw),
    };

    Ok((entry, cursor))
}

/// Verify the SHA-1 checksum of the index file.
fn verify_checksum(data: &[u8]) -> Result<(), IndexError> {
    let content = &data[..data.len() - CHECKSUM_SIZE];
    let stored_checksum = &data[data.len() - CHECKSUM_SIZE..];

    let computed = Hasher::digest(content);
    if computed.as_bytes() != stored_checksum {
        return Err(IndexError::ChecksumMismatch);
    }

    Ok(())
}

fn read_u32(data: &[u8]) -> u32 {
    u32::from_be_bytes([data[0], data[1], data[2], data[3]])
}

fn read_u16(data: &[u8]) -> u16 {
    u16::from_be_bytes([data[0], data[1]])
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a v2 index file from (path, oid, mode) triples.
    pub(crate) fn build_index(entries: &[(&str, &str, u32)]) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"DIRC");
        buf.extend_from_slice(&2u32.to_be_bytes());
        buf.extend_from_slice(&(entries.len() as u32).to_be_bytes());

        for (path, oid_hex, mode) in entries {
            let start = buf.len();
            // ctime, mtime, dev, ino
            buf.extend_from_slice(&[0u8; 24]);
            buf.extend_from_slice(&mode.to_be_bytes());
            // uid, gid, size
            buf.extend_from_slice(&[0u8; 12]);
            buf.extend_from_slice(ObjectId::from_hex(oid_hex).unwrap().as_bytes());
            buf.extend_from_slice(&(path.len() as u16).to_be_bytes());
            buf.extend_from_slice(path.as_bytes());

            let entry_size = ondisk_entry_size(path.len());
            while buf.len() - start < entry_size {
                buf.push(0);
            }
        }

        let checksum = Hasher::digest(&buf);
        buf.extend_from_slice(checksum.as_bytes());
        buf
    }

    const OID_A: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    const OID_B: &str = "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";

    #[test]
    fn parse_two_entries() {
        let data = build_index(&[("a.txt", OID_A, 0o100644), ("b.txt", OID_B, 0o100755)]);
        let index = Index::parse(&data).unwrap();
        assert_eq!(index.len(), 2);

        let entries: Vec<_> = index.iter().collect();
        assert_eq!(entries[0].path, "a.txt");
        assert_eq!(entries[0].oid.to_hex(), OID_A);
        assert_eq!(entries[0].mode, FileMode::Regular);
        assert_eq!(entries[1].path, "b.txt");
        assert_eq!(entries[1].mode, FileMode::Executable);
    }

    #[test]
    fn order_is_preserved() {
        let data = build_index(&[("zebra", OID_A, 0o100644), ("apple", OID_B, 0o100644)]);
        let index = Index::parse(&data).unwrap();
        let paths: Vec<_> = index.iter().map(|e| e.path.clone()).collect();
        assert_eq!(paths, vec!["zebra", "apple"]);
    }

    #[test]
    fn empty_index() {
        let data = build_index(&[]);
        let index = Index::parse(&data).unwrap();
        assert!(index.is_empty());
    }

    #[test]
    fn rejects_bad_magic() {
        let mut data = build_index(&[]);
        data[0] = b'X';
        // Fix up the checksum so the magic is what fails.
        let content_len = data.len() - 20;
        let checksum = Hasher::digest(&data[..content_len]);
        data.truncate(content_len);
        data.extend_from_slice(checksum.as_bytes());

        assert!(matches!(
            Index::parse(&data),
            Err(IndexError::InvalidHeader(_))
        ));
    }

    #[test]
    fn rejects_unsupported_version() {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"DIRC");
        buf.extend_from_slice(&3u32.to_be_bytes());
        buf.extend_from_slice(&0u32.to_be_bytes());
        let checksum = Hasher::digest(&buf);
        buf.extend_from_slice(checksum.as_bytes());

        assert!(matches!(
            Index::parse(&buf),
            Err(IndexError::UnsupportedVersion(3))
        ));
    }

    #[test]
    fn rejects_checksum_mismatch() {
        let mut data = build_index(&[("a.txt", OID_A, 0o100644)]);
        let last = data.len() - 1;
        data[last] ^= 0xff;
        assert!(matches!(
            Index::parse(&data),
            Err(IndexError::ChecksumMismatch)
        ));
    }

    #[test]
    fn rejects_truncated_file() {
        assert!(Index::parse(b"DIRC").is_err());
    }

    #[test]
    fn entry_count_beyond_data_errors() {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"DIRC");
        buf.extend_from_slice(&2u32.to_be_bytes());
        buf.extend_from_slice(&5u32.to_be_bytes()); // claims 5 entries, has none
        let checksum = Hasher::digest(&buf);
        buf.extend_from_slice(checksum.as_bytes());

        assert!(matches!(
            Index::parse(&buf),
            Err(IndexError::InvalidEntry { .. })
        ));
    }
}
