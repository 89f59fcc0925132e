//! Pack index (v2) reading and lookup.
//!
//! Layout:
//!
//! ```text
//! Header:  \xff tOc (4 bytes) | version (4 bytes = 2)
//! Fanout:  256 × 4-byte big-endian cumulative counts
//! OIDs:    N × 20-byte sorted OIDs
//! CRC32:   N × 4-byte CRC32 values
//! Offsets: N × 4-byte offsets (high bit set → 64-bit table, rejected here)
//! Trailer: 20-byte pack checksum | 20-byte index checksum
//! ```

use std::path::{Path, PathBuf};

use memmap2::Mmap;
use ngit_hash::ObjectId;

use crate::{PackError, PackHit, IDX_SIGNATURE, IDX_VERSION};

const HASH_LEN: usize = 20;
const FANOUT_OFFSET: usize = 8;
const FANOUT_LEN: usize = 256 * 4;

/// A memory-mapped pack index providing OID → offset lookup.
pub struct PackIndex {
    data: Mmap,
    num_objects: u32,
    oid_offset: usize,
    crc_offset: usize,
    offset_offset: usize,
    idx_path: PathBuf,
}

impl PackIndex {
    /// Open and validate a pack index file.
    pub fn open(idx_path: impl AsRef<Path>) -> Result<Self, PackError> {
        let idx_path = idx_path.as_ref().to_path_buf();
        let file = std::fs::File::open(&idx_path)?;
        let data = unsafe { Mmap::map(&file)? };

        // header(8) + fanout(1024) + trailer(2 × 20)
        if data.len() < FANOUT_OFFSET + FANOUT_LEN + 2 * HASH_LEN {
            return Err(PackError::InvalidIndex("file too small".into()));
        }
        if data[0..4] != IDX_SIGNATURE {
            return Err(PackError::InvalidIndex("bad signature".into()));
        }
        let version = read_u32(&data, 4);
        if version != IDX_VERSION {
            return Err(PackError::InvalidIndex(format!(
                "unsupported version {version}, expected {IDX_VERSION}"
            )));
        }

        let num_objects = read_u32(&data, FANOUT_OFFSET + 255 * 4);
        let n = num_objects as usize;

        let oid_offset = FANOUT_OFFSET + FANOUT_LEN;
        let crc_offset = oid_offset + n * HASH_LEN;
        let offset_offset = crc_offset + n * 4;

        let min_size = offset_offset + n * 4 + 2 * HASH_LEN;
        if data.len() < min_size {
            return Err(PackError::InvalidIndex(format!(
                "file too small: {} < {min_size}",
                data.len()
            )));
        }

        Ok(Self {
            data,
            num_objects,
            oid_offset,
            crc_offset,
            offset_offset,
            idx_path,
        })
    }

    /// Look up an OID.
    ///
    /// Fails with [`PackError::LargePackUnsupported`] when the matched entry
    /// needs the 64-bit offset table.
    pub fn lookup(&self, oid: &ObjectId) -> Result<Option<PackHit>, PackError> {
        let (lo, hi) = self.fanout_range(oid.first_byte());
        let target = oid.as_bytes();

        let mut low = lo;
        let mut high = hi;
        while low < high {
            let mid = low + (high - low) / 2;
            match self.oid_bytes_at(mid).cmp(target) {
                std::cmp::Ordering::Less => low = mid + 1,
                std::cmp::Ordering::Greater => high = mid,
                std::cmp::Ordering::Equal => {
                    return Ok(Some(PackHit {
                        crc32: self.crc32_at(mid),
                        offset: self.offset_at(mid)?,
                    }));
                }
            }
        }
        Ok(None)
    }

    /// All OIDs whose raw bytes start with `prefix`, in index order.
    pub fn lookup_prefix(&self, prefix: &[u8]) -> Vec<ObjectId> {
        if prefix.is_empty() {
            return Vec::new();
        }
        let (lo, hi) = self.fanout_range(prefix[0]);
        let mut out = Vec::new();
        for i in lo..hi {
            let bytes = self.oid_bytes_at(i);
            if bytes[..prefix.len().min(bytes.len())] == *prefix {
                if let Ok(oid) = ObjectId::from_bytes(bytes) {
                    out.push(oid);
                }
            }
        }
        out
    }

    /// The OID at the given sorted position.
    pub fn oid_at(&self, index: u32) -> ObjectId {
        ObjectId::from_bytes(self.oid_bytes_at(index as usize)).expect("index OID is 20 bytes")
    }

    /// Total number of objects in this index.
    pub fn num_objects(&self) -> u32 {
        self.num_objects
    }

    /// Path to the `.idx` file.
    pub fn path(&self) -> &Path {
        &self.idx_path
    }

    /// Iterate `(oid, hit)` pairs in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, Result<PackHit, PackError>)> + '_ {
        (0..self.num_objects).map(|i| {
            let oid = self.oid_at(i);
            let hit = self.offset_at(i as usize).map(|offset| PackHit {
                crc32: self.crc32_at(i as usize),
                offset,
            });
            (oid, hit)
        })
    }

    /// Fan-out range for a first byte: `[fanout[p-1], fanout[p])`.
    fn fanout_range(&self, first_byte: u8) -> (usize, usize) {
        let end = read_u32(&self.data, FANOUT_OFFSET + first_byte as usize * 4) as usize;
        let start = if first_byte == 0 {
            0
        } else {
            read_u32(&self.data, FANOUT_OFFSET + (first_byte as usize - 1) * 4) as usize
        };
        (start, end)
    }

    fn oid_bytes_at(&self, index: usize) -> &[u8] {
        let start = self.oid_offset + index * HASH_LEN;
        &self.data[start..start + HASH_LEN]
    }

    fn crc32_at(&self, index: usize) -> u32 {
        read_u32(&self.data, self.crc_offset + index * 4)
    }

    fn offset_at(&self, index: usize) -> Result<u64, PackError> {
        let val = read_u32(&self.data, self.offset_offset + index * 4);
        if val & 0x8000_0000 != 0 {
            return Err(PackError::LargePackUnsupported);
        }
        Ok(val as u64)
    }
}

fn read_u32(data: &[u8], pos: usize) -> u32 {
    u32::from_be_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]])
}
