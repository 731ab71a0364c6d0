//! Pack unpacking: decode every entry of an in-memory pack and persist the
//! reconstructed objects as loose objects.
//!
//! A pack received over the wire carries no `.idx` sidecar, so entries are
//! decoded in a single forward pass. Base objects are persisted as they are
//! parsed; delta entries are buffered and resolved afterwards — `OFS_DELTA`
//! against the entry at the backward offset, `REF_DELTA` against any object
//! already persisted (from this pack or before it).

use std::collections::HashMap;
use std::io::Read;

use flate2::bufread::ZlibDecoder;
use log::debug;
use minigit_hash::hasher::Hasher;
use minigit_hash::ObjectId;
use minigit_loose::LooseObjectStore;
use minigit_object::ObjectType;

use crate::delta::apply_delta;
use crate::entry::parse_entry_header;
use crate::{
    PackEntryType, PackError, MAX_DELTA_CHAIN_DEPTH, PACK_HEADER_SIZE, PACK_SIGNATURE,
    PACK_TRAILER_SIZE, PACK_VERSION,
};

/// One decoded pack entry awaiting resolution.
struct RawEntry {
    offset: u64,
    entry_type: PackEntryType,
    /// Decompressed entry body: object payload for bases, delta stream for
    /// delta entries.
    data: Vec<u8>,
    /// Filled in once the entry's full payload is known and persisted.
    resolved: Option<(ObjectType, ObjectId)>,
}

/// Decode `data` as a packfile and persist every contained object into
/// `store`. Returns the OIDs in pack entry order.
pub fn unpack_into(data: &[u8], store: &LooseObjectStore) -> Result<Vec<ObjectId>, PackError> {
    let num_objects = validate_header(data)?;
    verify_trailer(data)?;

    let content_end = data.len() - PACK_TRAILER_SIZE;
    let mut entries: Vec<RawEntry> = Vec::with_capacity(num_objects);
    let mut pos = PACK_HEADER_SIZE;

    for _ in 0..num_objects {
        let offset = pos as u64;
        if pos >= content_end {
            return Err(PackError::InvalidHeader(format!(
                "pack ends after {} of {} declared objects",
                entries.len(),
                num_objects
            )));
        }

        let header = parse_entry_header(&data[pos..content_end], offset)?;
        pos += header.header_size;

        // There is no length field for the compressed body; the streaming
        // decoder reports exactly how many input bytes the deflate stream
        // occupied so the cursor lands on the next entry.
        let mut decoder = ZlibDecoder::new(&data[pos..content_end]);
        let mut body = Vec::with_capacity(header.uncompressed_size);
        decoder
            .read_to_end(&mut body)
            .map_err(|_| PackError::CorruptEntry(offset))?;
        if body.len() != header.uncompressed_size {
            return Err(PackError::CorruptEntry(offset));
        }
        pos += decoder.total_in() as usize;

        // Base objects are persisted immediately; deltas wait for their base.
        let resolved = match header.entry_type.to_object_type() {
            Some(obj_type) => {
                let oid = store.write_raw(obj_type, &body)?;
                Some((obj_type, oid))
            }
            None => None,
        };

        entries.push(RawEntry {
            offset,
            entry_type: header.entry_type,
            data: body,
            resolved,
        });
    }

    if pos != content_end {
        return Err(PackError::InvalidHeader(format!(
            "{} bytes of trailing garbage after the last entry",
            content_end - pos
        )));
    }

    let mut resolver = Resolver::new(entries, store);
    resolver.resolve_deltas()?;

    debug!(
        "unpacked {} objects ({} deltas)",
        num_objects,
        resolver.delta_count()
    );

    Ok(resolver.into_oids())
}

/// Validate the 12-byte pack header; returns the declared object count.
fn validate_header(data: &[u8]) -> Result<usize, PackError> {
    if data.len() < PACK_HEADER_SIZE + PACK_TRAILER_SIZE {
        return Err(PackError::InvalidHeader("pack file too small".into()));
    }
    if &data[0..4] != PACK_SIGNATURE {
        return Err(PackError::InvalidHeader("bad PACK signature".into()));
    }
    let version = u32::from_be_bytes([data[4], data[5], data[6], data[7]]);
    if version != PACK_VERSION {
        return Err(PackError::UnsupportedVersion(version));
    }
    Ok(u32::from_be_bytes([data[8], data[9], data[10], data[11]]) as usize)
}

/// Verify the trailing SHA-1 over everything before it.
fn verify_trailer(data: &[u8]) -> Result<(), PackError> {
    let content = &data[..data.len() - PACK_TRAILER_SIZE];
    let expected = ObjectId::from_bytes(&data[data.len() - PACK_TRAILER_SIZE..])?;
    let actual = Hasher::digest(content);
    if actual != expected {
        return Err(PackError::ChecksumMismatch { expected, actual });
    }
    Ok(())
}

struct Resolver<'a> {
    entries: Vec<RawEntry>,
    /// Entry start offset → entry index (OFS_DELTA bases).
    by_offset: HashMap<u64, usize>,
    /// OID → entry index for entries persisted so far (REF_DELTA bases).
    by_oid: HashMap<ObjectId, usize>,
    store: &'a LooseObjectStore,
}

impl<'a> Resolver<'a> {
    fn new(entries: Vec<RawEntry>, store: &'a LooseObjectStore) -> Self {
        let by_offset = entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.offset, i))
            .collect();
        let by_oid = entries
            .iter()
            .enumerate()
            .filter_map(|(i, e)| e.resolved.map(|(_, oid)| (oid, i)))
            .collect();
        Self {
            entries,
            by_offset,
            by_oid,
            store,
        }
    }

    fn delta_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.entry_type.to_object_type().is_none())
            .count()
    }

    /// Resolve delta entries in passes until fixpoint.
    ///
    /// A pass that completes no entry while some remain means a REF_DELTA
    /// base is not obtainable at all.
    fn resolve_deltas(&mut self) -> Result<(), PackError> {
        loop {
            let mut progress = false;
            let mut pending = None;

            for idx in 0..self.entries.len() {
                if self.entries[idx].resolved.is_some() {
                    continue;
                }
                match self.resolve_entry(idx, 0)? {
                    Some(_) => progress = true,
                    None => pending = Some(idx),
                }
            }

            let Some(unresolved) = pending else {
                return Ok(());
            };
            if !progress {
                return Err(self.unresolved_error(unresolved));
            }
        }
    }

    /// An entry only stays pending because some REF_DELTA along its chain
    /// has no obtainable base; chase the chain to name it. Offsets strictly
    /// decrease along OFS links, so the walk terminates.
    fn unresolved_error(&self, mut idx: usize) -> PackError {
        loop {
            match self.entries[idx].entry_type {
                PackEntryType::RefDelta { base_oid } => {
                    if self.by_oid.contains_key(&base_oid) {
                        idx = self.by_oid[&base_oid];
                    } else {
                        return PackError::MissingBase(base_oid);
                    }
                }
                PackEntryType::OfsDelta { base_offset } => match self.by_offset.get(&base_offset) {
                    Some(&base_idx) => idx = base_idx,
                    None => return PackError::CorruptEntry(self.entries[idx].offset),
                },
                _ => return PackError::CorruptEntry(self.entries[idx].offset),
            }
        }
    }

    /// Resolve the payload of entry `idx`, following delta chains.
    ///
    /// Returns `Ok(None)` when a REF_DELTA base is not yet available (the
    /// caller retries on a later pass). Resolved payloads are persisted and
    /// memoized immediately.
    fn resolve_entry(
        &mut self,
        idx: usize,
        depth: usize,
    ) -> Result<Option<(ObjectType, Vec<u8>)>, PackError> {
        if depth > MAX_DELTA_CHAIN_DEPTH {
            return Err(PackError::DeltaChainTooDeep {
                offset: self.entries[idx].offset,
                max_depth: MAX_DELTA_CHAIN_DEPTH,
            });
        }

        if let Some((obj_type, _)) = self.entries[idx].resolved {
            return Ok(Some((obj_type, self.entries[idx].data.clone())));
        }

        let base = match self.entries[idx].entry_type {
            PackEntryType::OfsDelta { base_offset } => {
                let base_idx = *self
                    .by_offset
                    .get(&base_offset)
                    .ok_or(PackError::CorruptEntry(self.entries[idx].offset))?;
                self.resolve_entry(base_idx, depth + 1)?
            }
            PackEntryType::RefDelta { base_oid } => {
                if let Some(&base_idx) = self.by_oid.get(&base_oid) {
                    self.resolve_entry(base_idx, depth + 1)?
                } else if let Some(obj) = self.store.read(&base_oid)? {
                    Some((obj.object_type(), obj.serialize_content()))
                } else {
                    // Base not in this pack and not in the store yet.
                    None
                }
            }
            // Bases were persisted up front.
            _ => unreachable!("base entries are resolved before delta passes"),
        };

        let Some((base_type, base_data)) = base else {
            return Ok(None);
        };

        let target = apply_delta(&base_data, &self.entries[idx].data)?;

        // A delta of a tree is a tree: the reconstructed payload takes the
        // kind of its ultimate base.
        let oid = self.store.write_raw(base_type, &target)?;
        self.entries[idx].data = target.clone();
        self.entries[idx].resolved = Some((base_type, oid));
        self.by_oid.insert(oid, idx);

        Ok(Some((base_type, target)))
    }

    fn into_oids(self) -> Vec<ObjectId> {
        self.entries
            .into_iter()
            .map(|e| e.resolved.expect("all entries resolved").1)
            .collect()
    }
}
