//! Pack file and pack index reading.
//!
//! A pack aggregates many objects into one file (`.pack`) with a companion
//! index (`.idx`) that maps OIDs to offsets through a 256-bucket fan-out
//! table. This crate decodes both formats for non-delta entries; deltified
//! entries (offset-delta and ref-delta) are detected and rejected cleanly,
//! as are indices that need the 64-bit offset extension.

pub mod entry;
pub mod index;
pub mod pack;

use ngit_object::ObjectType;

/// Errors that can occur during pack operations.
#[derive(Debug, thiserror::Error)]
pub enum PackError {
    #[error("invalid pack header: {0}")]
    InvalidHeader(String),

    #[error("invalid pack index: {0}")]
    InvalidIndex(String),

    #[error("unsupported pack version: {0}")]
    UnsupportedVersion(u32),

    #[error("deltified entry at offset {0}: delta reconstruction is not supported")]
    DeltaUnsupported(u64),

    #[error("reserved entry kind 5 at offset {0}")]
    ReservedKind(u64),

    #[error("pack uses 64-bit offsets (pack exceeds 2 GiB)")]
    LargePackUnsupported,

    #[error("corrupt pack entry at offset {0}")]
    CorruptEntry(u64),

    #[error("entry size mismatch at offset {offset}: header says {declared}, inflated {actual} bytes")]
    SizeMismatch {
        offset: u64,
        declared: usize,
        actual: usize,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A non-delta object decoded from a pack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedObject {
    pub obj_type: ObjectType,
    /// Uncompressed payload size as declared by the entry header.
    pub size: usize,
    /// The payload (no framing header).
    pub data: Vec<u8>,
}

/// An index lookup result: where the entry lives and its recorded CRC32.
///
/// The CRC is carried for future verification; nothing in the read path
/// checks it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackHit {
    pub crc32: u32,
    pub offset: u64,
}

/// Pack format constants.
pub const PACK_SIGNATURE: &[u8; 4] = b"PACK";
pub const PACK_VERSION: u32 = 2;
pub const PACK_HEADER_SIZE: usize = 12;

/// Pack index v2 constants.
pub const IDX_SIGNATURE: [u8; 4] = [0xff, 0x74, 0x4f, 0x63]; // "\377tOc"
pub const IDX_VERSION: u32 = 2;
