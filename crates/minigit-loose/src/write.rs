use std::fs;
use std::io::Write;

use flate2::write::ZlibEncoder;
use minigit_hash::hasher::Hasher;
use minigit_hash::ObjectId;
use minigit_object::header;
use minigit_object::{Object, ObjectType};

use crate::{LooseError, LooseObjectStore};

impl LooseObjectStore {
    /// Write an object to the loose store. Returns the OID.
    ///
    /// No-op if the object already exists (idempotent).
    pub fn write(&self, obj: &Object) -> Result<ObjectId, LooseError> {
        self.write_raw(obj.object_type(), &obj.serialize_content())
    }

    /// Write raw content with a known type. Returns the OID.
    ///
    /// The object lands under its fan-out path via a temp file in the same
    /// directory plus a rename, so readers never observe a half-written
    /// object.
    pub fn write_raw(&self, obj_type: ObjectType, content: &[u8]) -> Result<ObjectId, LooseError> {
        let framed = header::frame(obj_type, content);
        let oid = Hasher::digest(&framed);

        let final_path = self.object_path(&oid);
        if final_path.is_file() {
            // Content-addressed: equal path means equal bytes.
            return Ok(oid);
        }
        if let Some(fanout_dir) = final_path.parent() {
            fs::create_dir_all(fanout_dir)?;
        }

        // Stage the compressed bytes next to the final path, on the same
        // filesystem, under a name no reader will ever look up.
        let tmp_path = final_path.with_extension(format!("tmp{}", std::process::id()));
        let mut encoder = ZlibEncoder::new(fs::File::create(&tmp_path)?, self.compression_level);
        encoder.write_all(&framed)?;
        encoder.finish()?;

        // Loose objects are read-only (0444), matching C git.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&tmp_path, fs::Permissions::from_mode(0o444))?;
        }

        // Publish. Losing a rename race to another writer of the same digest
        // still counts as success, since both staged the same bytes.
        if let Err(rename_err) = fs::rename(&tmp_path, &final_path) {
            let _ = fs::remove_file(&tmp_path);
            if !final_path.is_file() {
                return Err(rename_err.into());
            }
        }

        Ok(oid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_known_blob() {
        let dir = tempfile::tempdir().unwrap();
        let store = LooseObjectStore::open(dir.path());

        let oid = store.write_raw(ObjectType::Blob, b"hello\n").unwrap();
        assert_eq!(oid.to_hex(), "ce013625030ba8dba906f756967f9e9ca394464a");

        let path = store.object_path(&oid);
        assert!(path.is_file());
        assert!(path.ends_with("ce/013625030ba8dba906f756967f9e9ca394464a"));
    }

    #[test]
    fn write_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = LooseObjectStore::open(dir.path());

        let oid1 = store.write_raw(ObjectType::Blob, b"content").unwrap();
        let bytes_before = fs::read(store.object_path(&oid1)).unwrap();

        let oid2 = store.write_raw(ObjectType::Blob, b"content").unwrap();
        assert_eq!(oid1, oid2);

        let bytes_after = fs::read(store.object_path(&oid2)).unwrap();
        assert_eq!(bytes_before, bytes_after);
    }

    #[test]
    fn no_temp_files_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let store = LooseObjectStore::open(dir.path());
        let oid = store.write_raw(ObjectType::Blob, b"x").unwrap();

        // The fan-out directory must hold exactly the final object.
        let fanout_dir = store.object_path(&oid);
        let fanout_dir = fanout_dir.parent().unwrap();
        let names: Vec<_> = fs::read_dir(fanout_dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec![oid.to_hex()[2..].to_string()]);
    }

    #[test]
    fn write_object_wrapper_matches_raw() {
        let dir = tempfile::tempdir().unwrap();
        let store = LooseObjectStore::open(dir.path());

        let obj = Object::Blob(minigit_object::Blob::from(b"same bytes".as_slice()));
        let via_object = store.write(&obj).unwrap();
        let via_raw = store.write_raw(ObjectType::Blob, b"same bytes").unwrap();
        assert_eq!(via_object, via_raw);
        assert_eq!(via_object, obj.compute_oid());
    }
}
