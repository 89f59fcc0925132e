//! DIRC (v2/v3) index file parsing.

use bstr::BString;
use ngit_hash::ObjectId;

use crate::entry::{EntryFlags, EntryMode, IndexEntry, StatData};
use crate::extensions::CacheTree;
use crate::{Index, IndexError, Stage};

const INDEX_SIGNATURE: &[u8; 4] = b"DIRC";

/// Size of the fixed-offset portion of an entry: stat data (40), OID (20),
/// flags (2).
const ENTRY_FIXED_LEN: usize = 62;

/// Name-length value meaning "read the name up to its NUL terminator".
const NAME_LEN_MASK: u16 = 0x0fff;

/// The trailing SHA-1 over the index content; read, never verified here.
const TRAILER_LEN: usize = 20;

/// Parse an index file from raw bytes.
pub fn parse_index(data: &[u8]) -> Result<Index, IndexError> {
    if data.len() < 12 + TRAILER_LEN {
        return Err(IndexError::InvalidHeader("index file too short".into()));
    }

    if &data[0..4] != INDEX_SIGNATURE {
        return Err(IndexError::InvalidHeader(format!(
            "bad signature: {:?}",
            &data[0..4]
        )));
    }
    let version = read_u32(data, 4);
    if !(2..=3).contains(&version) {
        return Err(IndexError::UnsupportedVersion(version));
    }
    let entry_count = read_u32(data, 8) as usize;

    let content_end = data.len() - TRAILER_LEN;
    let mut cursor = 12;

    let mut entries = Vec::with_capacity(entry_count);
    for _ in 0..entry_count {
        let (entry, next) = parse_entry(data, cursor, version, content_end)?;
        entries.push(entry);
        cursor = next;
    }

    // Extensions: 4-byte signature + big-endian length, until only the
    // trailing checksum remains.
    let mut cache_tree = None;
    let mut skipped = Vec::new();
    while cursor + 8 <= content_end {
        let sig: [u8; 4] = data[cursor..cursor + 4].try_into().expect("4 bytes");
        let ext_len = read_u32(data, cursor + 4) as usize;
        cursor += 8;

        if cursor + ext_len > content_end {
            return Err(IndexError::InvalidExtension {
                sig: String::from_utf8_lossy(&sig).into_owned(),
                reason: "extension data exceeds index bounds".into(),
            });
        }
        let ext_data = &data[cursor..cursor + ext_len];

        if &sig == b"TREE" {
            cache_tree = Some(CacheTree::parse(ext_data)?);
        } else {
            skipped.push(sig);
        }
        cursor += ext_len;
    }

    let checksum = ObjectId::from_bytes(&data[data.len() - TRAILER_LEN..])
        .map_err(|_| IndexError::InvalidHeader("truncated checksum".into()))?;

    Ok(Index::from_parts(
        version, entries, cache_tree, skipped, checksum,
    ))
}

/// On-disk entry size: the fixed portion, the optional extended flags word,
/// the name, and NUL padding to the next 8-byte boundary (at least one NUL).
fn ondisk_entry_len(name_len: usize, extended: bool) -> usize {
    let fixed = ENTRY_FIXED_LEN + if extended { 2 } else { 0 };
    (fixed + name_len + 8) & !7
}

fn parse_entry(
    data: &[u8],
    start: usize,
    version: u32,
    content_end: usize,
) -> Result<(IndexEntry, usize), IndexError> {
    if start + ENTRY_FIXED_LEN > content_end {
        return Err(IndexError::InvalidEntry {
            offset: start,
            reason: "entry truncated".into(),
        });
    }

    let stat = StatData {
        ctime_secs: read_u32(data, start),
        ctime_nsecs: read_u32(data, start + 4),
        mtime_secs: read_u32(data, start + 8),
        mtime_nsecs: read_u32(data, start + 12),
        dev: read_u32(data, start + 16),
        ino: read_u32(data, start + 20),
        uid: read_u32(data, start + 28),
        gid: read_u32(data, start + 32),
        size: read_u32(data, start + 36),
    };
    let mode_raw = read_u32(data, start + 24);
    let mode = EntryMode::from_raw(mode_raw, start)?;

    let oid = ObjectId::from_bytes(&data[start + 40..start + 60])
        .map_err(|_| IndexError::InvalidEntry {
            offset: start,
            reason: "invalid OID".into(),
        })?;

    let flags_raw = read_u16(data, start + 60);
    let assume_valid = flags_raw & 0x8000 != 0;
    let extended = flags_raw & 0x4000 != 0;
    let stage = Stage::from_bits(((flags_raw >> 12) & 0x03) as u8);
    let name_len_field = flags_raw & NAME_LEN_MASK;

    let mut name_start = start + ENTRY_FIXED_LEN;
    if extended {
        if version < 3 {
            return Err(IndexError::InvalidEntry {
                offset: start,
                reason: "extended flags in a version 2 index".into(),
            });
        }
        if name_start + 2 > content_end {
            return Err(IndexError::InvalidEntry {
                offset: start,
                reason: "truncated extended flags".into(),
            });
        }
        // The extended word carries intent-to-add / skip-worktree bits; they
        // do not affect reading.
        name_start += 2;
    }

    let name_len = if name_len_field < NAME_LEN_MASK {
        let len = name_len_field as usize;
        if name_start + len > content_end {
            return Err(IndexError::InvalidEntry {
                offset: start,
                reason: "name exceeds index bounds".into(),
            });
        }
        len
    } else {
        // Overlong name: scan for the NUL terminator.
        data[name_start..content_end]
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| IndexError::InvalidEntry {
                offset: start,
                reason: "missing NUL for overlong name".into(),
            })?
    };

    let path = BString::from(&data[name_start..name_start + name_len]);

    let next = start + ondisk_entry_len(name_len, extended);
    if next > content_end {
        return Err(IndexError::InvalidEntry {
            offset: start,
            reason: "entry padding exceeds index bounds".into(),
        });
    }

    let entry = IndexEntry {
        path,
        oid,
        mode,
        stage,
        stat,
        flags: EntryFlags {
            assume_valid,
            extended,
        },
    };

    Ok((entry, next))
}

fn read_u32(data: &[u8], pos: usize) -> u32 {
    u32::from_be_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]])
}

fn read_u16(data: &[u8], pos: usize) -> u16 {
    u16::from_be_bytes([data[pos], data[pos + 1]])
}
