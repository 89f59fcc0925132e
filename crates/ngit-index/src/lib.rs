//! The staging index (`.git/index`).
//!
//! This crate reads DIRC version 2 and 3 index files: the ordered entry list
//! with its 8-byte alignment rules, the `TREE` cache-tree extension, and
//! nothing else — the index is rewritten atomically by external tooling, so
//! there is no writer here. It also hosts the ignore matcher, which answers
//! "is this path ignored?" against the worktree's `.gitignore` files.

pub mod entry;
pub mod extensions;
pub mod ignore;
mod read;

use std::path::Path;

use bstr::{BStr, ByteSlice};
use ngit_hash::ObjectId;

pub use entry::{EntryFlags, EntryMode, IndexEntry, StatData};
pub use extensions::CacheTree;
pub use ignore::IgnoreMatcher;

/// Errors from index parsing.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("invalid index header: {0}")]
    InvalidHeader(String),

    #[error("unsupported index version: {0}")]
    UnsupportedVersion(u32),

    #[error("invalid index entry at offset {offset}: {reason}")]
    InvalidEntry { offset: usize, reason: String },

    #[error("unsupported index entry at offset {offset}: mode {mode:o}")]
    UnsupportedEntry { offset: usize, mode: u32 },

    #[error("invalid '{sig}' extension: {reason}")]
    InvalidExtension { sig: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Merge stage of an index entry (bits 12–13 of the flags word).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Normal entry (stage 0).
    Normal,
    /// Common ancestor in a conflict (stage 1).
    Base,
    /// Our side of a conflict (stage 2).
    Ours,
    /// Their side of a conflict (stage 3).
    Theirs,
}

impl Stage {
    pub fn as_u8(&self) -> u8 {
        match self {
            Stage::Normal => 0,
            Stage::Base => 1,
            Stage::Ours => 2,
            Stage::Theirs => 3,
        }
    }

    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => Stage::Normal,
            1 => Stage::Base,
            2 => Stage::Ours,
            _ => Stage::Theirs,
        }
    }
}

/// A parsed index: entries in on-disk order plus the optional cache tree.
pub struct Index {
    version: u32,
    entries: Vec<IndexEntry>,
    cache_tree: Option<CacheTree>,
    /// Signatures of extensions that were skipped unparsed.
    skipped_extensions: Vec<[u8; 4]>,
}

impl Index {
    /// An empty in-memory index (a repository with nothing staged).
    pub fn empty() -> Self {
        Self {
            version: 2,
            entries: Vec::new(),
            cache_tree: None,
            skipped_extensions: Vec::new(),
        }
    }

    /// Read the index from a file.
    pub fn read_from(path: impl AsRef<Path>) -> Result<Self, IndexError> {
        let file = std::fs::File::open(path.as_ref())?;
        let data = unsafe { memmap2::Mmap::map(&file) }?;
        read::parse_index(&data)
    }

    /// Parse an index from raw bytes.
    pub fn parse(data: &[u8]) -> Result<Self, IndexError> {
        read::parse_index(data)
    }

    /// Index format version (2 or 3).
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in the order they appear on disk. That order is authoritative
    /// for staging output.
    pub fn iter(&self) -> impl Iterator<Item = &IndexEntry> {
        self.entries.iter()
    }

    /// Find the stage-0 entry for a path.
    pub fn get(&self, path: &BStr) -> Option<&IndexEntry> {
        self.entries
            .iter()
            .find(|e| e.path.as_bstr() == path && e.stage == Stage::Normal)
    }

    /// Whether any entry for `path` is conflicted (stage 1–3).
    pub fn has_conflict(&self, path: &BStr) -> bool {
        self.entries
            .iter()
            .any(|e| e.path.as_bstr() == path && e.stage != Stage::Normal)
    }

    /// The `TREE` extension, if present and parsed.
    pub fn cache_tree(&self) -> Option<&CacheTree> {
        self.cache_tree.as_ref()
    }

    /// Signatures of extensions that were skipped by length.
    pub fn skipped_extensions(&self) -> &[[u8; 4]] {
        &self.skipped_extensions
    }

    /// The trailing checksum slot is read but deliberately not verified.
    pub(crate) fn from_parts(
        version: u32,
        entries: Vec<IndexEntry>,
        cache_tree: Option<CacheTree>,
        skipped_extensions: Vec<[u8; 4]>,
        _checksum: ObjectId,
    ) -> Self {
        Self {
            version,
            entries,
            cache_tree,
            skipped_extensions,
        }
    }
}
