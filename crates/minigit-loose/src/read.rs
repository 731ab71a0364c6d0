use std::fs::File;
use std::io::{ErrorKind, Read};

use flate2::read::ZlibDecoder;
use minigit_hash::hasher::Hasher;
use minigit_hash::ObjectId;
use minigit_object::header;
use minigit_object::{Object, ObjectType};

use crate::{LooseError, LooseObjectStore};

/// How many decompressed bytes to look at when only the framing prefix is
/// wanted. The prefix is the kind word, a space, a decimal size, and a NUL;
/// even a 20-digit size fits with room to spare.
const PREFIX_PEEK: u64 = 64;

impl LooseObjectStore {
    /// Check if a loose object exists.
    pub fn contains(&self, oid: &ObjectId) -> bool {
        self.object_path(oid).is_file()
    }

    /// Read a loose object by OID.
    ///
    /// Returns `Ok(None)` if the object does not exist.
    /// Returns `Err` if the object exists but is corrupt.
    pub fn read(&self, oid: &ObjectId) -> Result<Option<Object>, LooseError> {
        let Some(file) = self.open_object(oid)? else {
            return Ok(None);
        };
        let framed = inflate(ZlibDecoder::new(file), oid)?;
        Ok(Some(Object::parse(&framed)?))
    }

    /// Read just the kind and size without decompressing the full content.
    ///
    /// Returns `Ok(None)` if the object does not exist.
    pub fn read_header(&self, oid: &ObjectId) -> Result<Option<(ObjectType, usize)>, LooseError> {
        let Some(file) = self.open_object(oid)? else {
            return Ok(None);
        };
        // Cap the decompression at the prefix instead of inflating the
        // whole payload.
        let prefix = inflate(ZlibDecoder::new(file).take(PREFIX_PEEK), oid)?;
        let (obj_type, size, _) = header::decode_prefix(&prefix)?;
        Ok(Some((obj_type, size)))
    }

    /// Read a loose object and verify its hash matches the expected OID.
    ///
    /// Returns `Ok(None)` if the object does not exist.
    pub fn read_verified(&self, oid: &ObjectId) -> Result<Option<Object>, LooseError> {
        let Some(file) = self.open_object(oid)? else {
            return Ok(None);
        };
        let framed = inflate(ZlibDecoder::new(file), oid)?;

        // The digest of the framed form must reproduce the storage path.
        let actual = Hasher::digest(&framed);
        if actual != *oid {
            return Err(LooseError::HashMismatch {
                path: self.object_path(oid),
                expected: oid.to_hex(),
                actual: actual.to_hex(),
            });
        }

        Ok(Some(Object::parse(&framed)?))
    }

    /// Open the object file, mapping absence to `None`.
    fn open_object(&self, oid: &ObjectId) -> Result<Option<File>, LooseError> {
        match File::open(self.object_path(oid)) {
            Ok(file) => Ok(Some(file)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Drain a decompressor, tagging any zlib failure with the object id.
fn inflate<R: Read>(mut reader: R, oid: &ObjectId) -> Result<Vec<u8>, LooseError> {
    let mut out = Vec::new();
    reader
        .read_to_end(&mut out)
        .map_err(|e| LooseError::Decompress {
            oid: oid.to_hex(),
            source: e,
        })?;
    Ok(out)
}
