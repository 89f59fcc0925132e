//! Pack file reading.

use std::io::Read;
use std::path::{Path, PathBuf};

use flate2::bufread::ZlibDecoder;
use memmap2::Mmap;
use ngit_hash::ObjectId;

use crate::entry::parse_entry_header;
use crate::index::PackIndex;
use crate::{
    PackError, PackHit, PackedObject, PACK_HEADER_SIZE, PACK_SIGNATURE, PACK_VERSION,
};

/// A memory-mapped pack file paired with its index.
pub struct PackFile {
    data: Mmap,
    index: PackIndex,
    pack_path: PathBuf,
    num_objects: u32,
}

impl PackFile {
    /// Open a pack file and its companion `.idx`.
    pub fn open(pack_path: impl AsRef<Path>) -> Result<Self, PackError> {
        let pack_path = pack_path.as_ref().to_path_buf();
        let idx_path = pack_path.with_extension("idx");

        let file = std::fs::File::open(&pack_path)?;
        let data = unsafe { Mmap::map(&file)? };

        if data.len() < PACK_HEADER_SIZE {
            return Err(PackError::InvalidHeader("file too small".into()));
        }
        if &data[0..4] != PACK_SIGNATURE {
            return Err(PackError::InvalidHeader("bad PACK signature".into()));
        }
        let version = u32::from_be_bytes([data[4], data[5], data[6], data[7]]);
        if version != PACK_VERSION {
            return Err(PackError::UnsupportedVersion(version));
        }
        let num_objects = u32::from_be_bytes([data[8], data[9], data[10], data[11]]);

        let index = PackIndex::open(&idx_path)?;
        if index.num_objects() != num_objects {
            return Err(PackError::InvalidHeader(format!(
                "pack has {} objects but index has {}",
                num_objects,
                index.num_objects()
            )));
        }

        Ok(Self {
            data,
            index,
            pack_path,
            num_objects,
        })
    }

    /// Read an object by OID. Returns `None` if the OID is not in this pack.
    pub fn read_object(&self, oid: &ObjectId) -> Result<Option<PackedObject>, PackError> {
        match self.index.lookup(oid)? {
            Some(hit) => self.read_at(hit).map(Some),
            None => Ok(None),
        }
    }

    /// Decode the entry at a looked-up position.
    ///
    /// The remaining pack buffer is handed to zlib, which consumes only the
    /// entry's compressed span; the inflated length is then checked against
    /// the size declared in the entry header.
    pub fn read_at(&self, hit: PackHit) -> Result<PackedObject, PackError> {
        let offset = hit.offset;
        if offset as usize >= self.data.len() {
            return Err(PackError::CorruptEntry(offset));
        }

        let entry = parse_entry_header(&self.data[offset as usize..], offset)?;
        let data_start = offset as usize + entry.header_len;

        let mut decoder = ZlibDecoder::new(&self.data[data_start..]);
        let mut payload = Vec::with_capacity(entry.size);
        decoder
            .read_to_end(&mut payload)
            .map_err(|_| PackError::CorruptEntry(offset))?;

        if payload.len() != entry.size {
            return Err(PackError::SizeMismatch {
                offset,
                declared: entry.size,
                actual: payload.len(),
            });
        }

        Ok(PackedObject {
            obj_type: entry.obj_type,
            size: entry.size,
            data: payload,
        })
    }

    /// Check if this pack contains the given OID.
    pub fn contains(&self, oid: &ObjectId) -> bool {
        matches!(self.index.lookup(oid), Ok(Some(_)))
    }

    /// Number of objects in this pack.
    pub fn num_objects(&self) -> u32 {
        self.num_objects
    }

    /// The companion index.
    pub fn index(&self) -> &PackIndex {
        &self.index
    }

    /// Path to the `.pack` file.
    pub fn path(&self) -> &Path {
        &self.pack_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::encode_entry_header;
    use crate::{IDX_SIGNATURE, IDX_VERSION};
    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use ngit_hash::hasher::Hasher;
    use ngit_object::ObjectType;
    use std::io::Write;

    fn compress(data: &[u8]) -> Vec<u8> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    fn kind_code(ty: ObjectType) -> u8 {
        match ty {
            ObjectType::Commit => 1,
            ObjectType::Tree => 2,
            ObjectType::Blob => 3,
            ObjectType::Tag => 4,
        }
    }

    fn build_idx(entries: &[(ObjectId, u32, u32)], pack_checksum: &[u8]) -> Vec<u8> {
        let mut sorted: Vec<_> = entries.to_vec();
        sorted.sort_by(|a, b| a.0.cmp(&b.0));

        let mut buf = Vec::new();
        buf.extend_from_slice(&IDX_SIGNATURE);
        buf.extend_from_slice(&IDX_VERSION.to_be_bytes());

        let mut fanout = [0u32; 256];
        for (oid, _, _) in &sorted {
            fanout[oid.first_byte() as usize] += 1;
        }
        for i in 1..256 {
            fanout[i] += fanout[i - 1];
        }
        for count in fanout {
            buf.extend_from_slice(&count.to_be_bytes());
        }
        for (oid, _, _) in &sorted {
            buf.extend_from_slice(oid.as_bytes());
        }
        for (_, _, crc) in &sorted {
            buf.extend_from_slice(&crc.to_be_bytes());
        }
        for (_, offset, _) in &sorted {
            buf.extend_from_slice(&offset.to_be_bytes());
        }
        buf.extend_from_slice(pack_checksum);
        let idx_checksum = Hasher::digest(&buf);
        buf.extend_from_slice(idx_checksum.as_bytes());
        buf
    }

    /// Build a `.pack`/`.idx` pair holding the given non-delta objects.
    fn build_test_pack(
        dir: &Path,
        objects: &[(ObjectType, &[u8])],
    ) -> (PathBuf, Vec<ObjectId>) {
        let pack_path = dir.join("test.pack");
        let idx_path = dir.join("test.idx");

        let mut pack_data = Vec::new();
        pack_data.extend_from_slice(PACK_SIGNATURE);
        pack_data.extend_from_slice(&PACK_VERSION.to_be_bytes());
        pack_data.extend_from_slice(&(objects.len() as u32).to_be_bytes());

        let mut entries: Vec<(ObjectId, u32, u32)> = Vec::new();
        for (obj_type, payload) in objects {
            let offset = pack_data.len() as u32;
            let header = encode_entry_header(kind_code(*obj_type), payload.len() as u64);
            let compressed = compress(payload);

            let mut crc = crc32fast::Hasher::new();
            crc.update(&header);
            crc.update(&compressed);

            let oid = Hasher::hash_object(obj_type.as_str(), payload);

            pack_data.extend_from_slice(&header);
            pack_data.extend_from_slice(&compressed);
            entries.push((oid, offset, crc.finalize()));
        }

        let pack_checksum = Hasher::digest(&pack_data);
        pack_data.extend_from_slice(pack_checksum.as_bytes());
        std::fs::write(&pack_path, &pack_data).unwrap();

        let oids: Vec<ObjectId> = entries.iter().map(|(oid, _, _)| *oid).collect();
        std::fs::write(&idx_path, build_idx(&entries, pack_checksum.as_bytes())).unwrap();

        (pack_path, oids)
    }

    #[test]
    fn read_single_blob() {
        let dir = tempfile::tempdir().unwrap();
        let payload = b"Hello, packfile world!";
        let (pack_path, oids) = build_test_pack(dir.path(), &[(ObjectType::Blob, payload)]);

        let pack = PackFile::open(&pack_path).unwrap();
        assert_eq!(pack.num_objects(), 1);

        let obj = pack.read_object(&oids[0]).unwrap().unwrap();
        assert_eq!(obj.obj_type, ObjectType::Blob);
        assert_eq!(obj.size, payload.len());
        assert_eq!(obj.data, payload);
    }

    #[test]
    fn read_multiple_objects_and_recompute_oids() {
        let dir = tempfile::tempdir().unwrap();
        let objects: Vec<(ObjectType, &[u8])> = vec![
            (ObjectType::Blob, b"blob payload".as_slice()),
            (ObjectType::Blob, b"another blob".as_slice()),
            (
                ObjectType::Commit,
                b"tree 4b825dc642cb6eb9a060e54bf8d69288fbee4904\nauthor T <t@t.io> 0 +0000\ncommitter T <t@t.io> 0 +0000\n\npacked commit\n"
                    .as_slice(),
            ),
        ];
        let (pack_path, oids) = build_test_pack(dir.path(), &objects);

        let pack = PackFile::open(&pack_path).unwrap();
        assert_eq!(pack.num_objects(), 3);

        for (i, (obj_type, payload)) in objects.iter().enumerate() {
            let obj = pack.read_object(&oids[i]).unwrap().unwrap();
            assert_eq!(obj.obj_type, *obj_type);
            assert_eq!(obj.data, *payload);
            // The payload re-hashes to the OID the index found it under.
            assert_eq!(Hasher::hash_object(obj.obj_type.as_str(), &obj.data), oids[i]);
        }
    }

    #[test]
    fn missing_object_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let (pack_path, _) = build_test_pack(dir.path(), &[(ObjectType::Blob, b"x")]);

        let pack = PackFile::open(&pack_path).unwrap();
        let missing = ObjectId::from_hex("0000000000000000000000000000000000000001").unwrap();
        assert!(!pack.contains(&missing));
        assert!(pack.read_object(&missing).unwrap().is_none());
    }

    #[test]
    fn delta_entry_fails_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let pack_path = dir.path().join("test.pack");
        let idx_path = dir.path().join("test.idx");

        // One OFS_DELTA entry (kind 6) pointing nowhere in particular.
        let delta_body = [0u8; 4];
        let mut pack_data = Vec::new();
        pack_data.extend_from_slice(PACK_SIGNATURE);
        pack_data.extend_from_slice(&PACK_VERSION.to_be_bytes());
        pack_data.extend_from_slice(&1u32.to_be_bytes());

        let offset = pack_data.len() as u32;
        pack_data.extend_from_slice(&encode_entry_header(6, delta_body.len() as u64));
        pack_data.push(0x01); // base offset varint
        pack_data.extend_from_slice(&compress(&delta_body));
        let pack_checksum = Hasher::digest(&pack_data);
        pack_data.extend_from_slice(pack_checksum.as_bytes());
        std::fs::write(&pack_path, &pack_data).unwrap();

        let oid = ObjectId::from_hex("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa").unwrap();
        std::fs::write(
            &idx_path,
            build_idx(&[(oid, offset, 0)], pack_checksum.as_bytes()),
        )
        .unwrap();

        let pack = PackFile::open(&pack_path).unwrap();
        assert!(matches!(
            pack.read_object(&oid),
            Err(PackError::DeltaUnsupported(o)) if o == offset as u64
        ));
    }

    #[test]
    fn size_mismatch_detected() {
        let dir = tempfile::tempdir().unwrap();
        let pack_path = dir.path().join("test.pack");
        let idx_path = dir.path().join("test.idx");

        // Declare 3 bytes, compress 5.
        let mut pack_data = Vec::new();
        pack_data.extend_from_slice(PACK_SIGNATURE);
        pack_data.extend_from_slice(&PACK_VERSION.to_be_bytes());
        pack_data.extend_from_slice(&1u32.to_be_bytes());
        let offset = pack_data.len() as u32;
        pack_data.extend_from_slice(&encode_entry_header(3, 3));
        pack_data.extend_from_slice(&compress(b"12345"));
        let pack_checksum = Hasher::digest(&pack_data);
        pack_data.extend_from_slice(pack_checksum.as_bytes());
        std::fs::write(&pack_path, &pack_data).unwrap();

        let oid = ObjectId::from_hex("bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb").unwrap();
        std::fs::write(
            &idx_path,
            build_idx(&[(oid, offset, 0)], pack_checksum.as_bytes()),
        )
        .unwrap();

        let pack = PackFile::open(&pack_path).unwrap();
        assert!(matches!(
            pack.read_object(&oid),
            Err(PackError::SizeMismatch {
                declared: 3,
                actual: 5,
                ..
            })
        ));
    }

    #[test]
    fn bad_pack_header() {
        let dir = tempfile::tempdir().unwrap();
        let pack_path = dir.path().join("bad.pack");
        std::fs::write(&pack_path, b"NOPE\x00\x00\x00\x02\x00\x00\x00\x00").unwrap();
        assert!(matches!(
            PackFile::open(&pack_path),
            Err(PackError::InvalidHeader(_))
        ));

        let pack_path = dir.path().join("v3.pack");
        std::fs::write(&pack_path, b"PACK\x00\x00\x00\x03\x00\x00\x00\x00").unwrap();
        assert!(matches!(
            PackFile::open(&pack_path),
            Err(PackError::UnsupportedVersion(3))
        ));
    }
}
