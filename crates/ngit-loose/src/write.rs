use std::fs;
use std::path::Path;

use ngit_hash::hasher::Hasher;
use ngit_hash::ObjectId;
use ngit_object::{header, ObjectType};

use crate::{zlib, LooseError, LooseObjectStore};

impl LooseObjectStore {
    /// Write a payload with a known kind into the store. Returns the OID.
    ///
    /// No-op if the object already exists: identical bytes hash to the same
    /// OID, so the existing file already holds this content. The file lands
    /// via a temp file and rename so a concurrent reader never sees a partial
    /// object.
    pub fn write(&self, obj_type: ObjectType, payload: &[u8]) -> Result<ObjectId, LooseError> {
        let hdr = header::write_header(obj_type, payload.len());

        let oid = {
            let mut hasher = Hasher::new();
            hasher.update(&hdr);
            hasher.update(payload);
            hasher.finalize()
        };

        if self.contains(&oid) {
            return Ok(oid);
        }

        let final_path = self.object_path(&oid);
        if let Some(parent) = final_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut framed = Vec::with_capacity(hdr.len() + payload.len());
        framed.extend_from_slice(&hdr);
        framed.extend_from_slice(payload);
        let compressed = zlib::deflate(&framed, self.compression_level)?;

        let tmp_path = self
            .objects_dir()
            .join(format!("tmp_obj_{}", std::process::id()));
        fs::write(&tmp_path, &compressed)?;
        finalize_object(&tmp_path, &final_path)?;

        Ok(oid)
    }
}

/// Move a temp file to its final destination.
///
/// If the destination appeared in the meantime (a racing writer), the content
/// is identical by content addressing; drop the temp file and succeed.
fn finalize_object(tmp: &Path, final_path: &Path) -> Result<(), LooseError> {
    match fs::rename(tmp, final_path) {
        Ok(()) => Ok(()),
        Err(_) if final_path.exists() => {
            let _ = fs::remove_file(tmp);
            Ok(())
        }
        Err(e) => {
            let _ = fs::remove_file(tmp);
            Err(LooseError::Io(e))
        }
    }
}
