use std::fs;
use std::io::Read;

use flate2::read::ZlibDecoder;
use ngit_hash::ObjectId;
use ngit_object::{header, Object, ObjectType};

use crate::{zlib, LooseError, LooseObjectStore};

impl LooseObjectStore {
    /// Check if a loose object exists.
    pub fn contains(&self, oid: &ObjectId) -> bool {
        self.object_path(oid).is_file()
    }

    /// Read a loose object by OID.
    ///
    /// Returns `Ok(None)` if the object does not exist, an error if it exists
    /// but is corrupt.
    pub fn read(&self, oid: &ObjectId) -> Result<Option<Object>, LooseError> {
        let compressed = match fs::read(self.object_path(oid)) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(LooseError::Io(e)),
        };

        let decompressed = zlib::inflate(&compressed).map_err(|e| LooseError::Decompress {
            oid: oid.to_hex(),
            source: e,
        })?;
        Ok(Some(Object::parse(&decompressed)?))
    }

    /// Read just the kind and size without decompressing the full payload.
    ///
    /// Returns `Ok(None)` if the object does not exist.
    pub fn read_header(
        &self,
        oid: &ObjectId,
    ) -> Result<Option<(ObjectType, usize)>, LooseError> {
        let compressed = match fs::read(self.object_path(oid)) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(LooseError::Io(e)),
        };

        // Inflate just enough to cover the frame header. Headers are under
        // 32 bytes; 64 leaves room for absurd-but-legal sizes.
        let mut decoder = ZlibDecoder::new(&compressed[..]);
        let mut buf = [0u8; 64];
        let mut filled = 0;
        loop {
            if filled >= buf.len() {
                return Err(LooseError::Corrupt {
                    oid: oid.to_hex(),
                    reason: "frame header exceeds 64 bytes".into(),
                });
            }
            let n = decoder
                .read(&mut buf[filled..])
                .map_err(|e| LooseError::Decompress {
                    oid: oid.to_hex(),
                    source: e,
                })?;
            if n == 0 {
                return Err(LooseError::Corrupt {
                    oid: oid.to_hex(),
                    reason: "EOF before header NUL terminator".into(),
                });
            }
            filled += n;
            if buf[..filled].contains(&0) {
                break;
            }
        }

        let (obj_type, size, _header_len) = header::parse_header(&buf[..filled])?;
        Ok(Some((obj_type, size)))
    }
}
