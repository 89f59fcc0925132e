//! Index entry types.

use bstr::BString;
use ngit_hash::ObjectId;

use crate::{IndexError, Stage};

/// The entry kinds the index supports: a type nibble plus, for regular
/// files, one of two permission sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryMode {
    /// Regular file, 0644.
    Regular,
    /// Regular file, 0755.
    Executable,
    /// Symbolic link.
    Symlink,
    /// Submodule (gitlink) — detected, not followed.
    Gitlink,
}

impl EntryMode {
    /// Decode the on-disk mode word: a 4-bit type (1000 regular, 1010
    /// symlink, 1110 gitlink) and 9 permission bits, which must be 0644 or
    /// 0755 for regular files. Anything else is an unsupported entry.
    pub fn from_raw(raw: u32, offset: usize) -> Result<Self, IndexError> {
        let kind = (raw >> 12) & 0xf;
        let perms = raw & 0o777;
        match kind {
            0b1000 => match perms {
                0o644 => Ok(Self::Regular),
                0o755 => Ok(Self::Executable),
                _ => Err(IndexError::UnsupportedEntry { offset, mode: raw }),
            },
            0b1010 => Ok(Self::Symlink),
            0b1110 => Ok(Self::Gitlink),
            _ => Err(IndexError::UnsupportedEntry { offset, mode: raw }),
        }
    }

    /// The canonical on-disk mode word.
    pub fn raw(&self) -> u32 {
        match self {
            Self::Regular => 0o100644,
            Self::Executable => 0o100755,
            Self::Symlink => 0o120000,
            Self::Gitlink => 0o160000,
        }
    }

    pub fn is_gitlink(&self) -> bool {
        matches!(self, Self::Gitlink)
    }

    pub fn is_symlink(&self) -> bool {
        matches!(self, Self::Symlink)
    }
}

/// Filesystem stat data cached per entry for change detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatData {
    pub ctime_secs: u32,
    pub ctime_nsecs: u32,
    pub mtime_secs: u32,
    pub mtime_nsecs: u32,
    pub dev: u32,
    pub ino: u32,
    pub uid: u32,
    pub gid: u32,
    /// On-disk size truncated to 32 bits.
    pub size: u32,
}

/// Decoded flag bits of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EntryFlags {
    /// Assume-valid bit: skip change detection for this entry.
    pub assume_valid: bool,
    /// Extended bit: a second flags word follows (v3 only).
    pub extended: bool,
}

/// A single index entry, in on-disk field order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    /// Path relative to the worktree root; raw bytes.
    pub path: BString,
    pub oid: ObjectId,
    pub mode: EntryMode,
    pub stage: Stage,
    pub stat: StatData,
    pub flags: EntryFlags,
}
