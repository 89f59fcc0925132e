use bstr::{BStr, BString, ByteSlice};
use ngit_hash::ObjectId;

use crate::ObjectError;

/// File mode for tree entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileMode {
    /// Subdirectory (040000)
    Tree,
    /// Regular file (100644)
    Regular,
    /// Executable file (100755)
    Executable,
    /// Symbolic link (120000)
    Symlink,
    /// Submodule link (160000)
    Gitlink,
    /// Anything else, preserved so re-encoding is byte-exact.
    Unknown(u32),
}

impl FileMode {
    /// Parse from octal ASCII bytes (e.g. `b"100644"`, `b"40000"`).
    pub fn from_bytes(s: &[u8]) -> Result<Self, ObjectError> {
        let raw = parse_octal(s).ok_or_else(|| ObjectError::InvalidTreeEntry {
            offset: 0,
            reason: format!("invalid mode: {:?}", String::from_utf8_lossy(s)),
        })?;
        Ok(Self::from_raw(raw))
    }

    pub fn from_raw(raw: u32) -> Self {
        match raw {
            0o040000 => Self::Tree,
            0o100644 => Self::Regular,
            0o100755 => Self::Executable,
            0o120000 => Self::Symlink,
            0o160000 => Self::Gitlink,
            other => Self::Unknown(other),
        }
    }

    pub fn raw(&self) -> u32 {
        match self {
            Self::Tree => 0o040000,
            Self::Regular => 0o100644,
            Self::Executable => 0o100755,
            Self::Symlink => 0o120000,
            Self::Gitlink => 0o160000,
            Self::Unknown(v) => *v,
        }
    }

    /// Octal ASCII form as stored in tree payloads (no leading zero for
    /// subtrees: `40000`, not `040000`).
    pub fn as_bytes(&self) -> Vec<u8> {
        format!("{:o}", self.raw()).into_bytes()
    }

    pub fn is_tree(&self) -> bool {
        matches!(self, Self::Tree)
    }

    pub fn is_blob(&self) -> bool {
        matches!(self, Self::Regular | Self::Executable)
    }

    pub fn is_symlink(&self) -> bool {
        matches!(self, Self::Symlink)
    }

    pub fn is_gitlink(&self) -> bool {
        matches!(self, Self::Gitlink)
    }
}

fn parse_octal(s: &[u8]) -> Option<u32> {
    if s.is_empty() {
        return None;
    }
    let mut val: u32 = 0;
    for &b in s {
        if !(b'0'..=b'7').contains(&b) {
            return None;
        }
        val = val.checked_mul(8)?.checked_add(u32::from(b - b'0'))?;
    }
    Some(val)
}

/// A single entry in a tree object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub mode: FileMode,
    /// Raw name bytes; may contain anything other than NUL.
    pub name: BString,
    pub oid: ObjectId,
}

/// A tree object — a directory listing, kept in on-disk order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Tree {
    pub entries: Vec<TreeEntry>,
}

impl Tree {
    /// Parse a tree payload.
    ///
    /// Each entry is `<mode-octal> <name>\0<20-byte-oid>`. The walk is over
    /// bytes, not lines: entries embed raw digest bytes and names may contain
    /// newlines.
    pub fn parse(payload: &[u8]) -> Result<Self, ObjectError> {
        let mut entries = Vec::new();
        let mut pos = 0;

        while pos < payload.len() {
            let space_pos = payload[pos..]
                .iter()
                .position(|&b| b == b' ')
                .ok_or_else(|| ObjectError::InvalidTreeEntry {
                    offset: pos,
                    reason: "missing space after mode".into(),
                })?
                + pos;

            let mode =
                FileMode::from_bytes(&payload[pos..space_pos]).map_err(|_| {
                    ObjectError::InvalidTreeEntry {
                        offset: pos,
                        reason: "invalid mode".into(),
                    }
                })?;

            let name_start = space_pos + 1;
            let nul_pos = payload[name_start..]
                .iter()
                .position(|&b| b == 0)
                .ok_or_else(|| ObjectError::InvalidTreeEntry {
                    offset: name_start,
                    reason: "missing NUL after name".into(),
                })?
                + name_start;

            let name = BString::from(&payload[name_start..nul_pos]);

            let oid_start = nul_pos + 1;
            let oid_end = oid_start + 20;
            if oid_end > payload.len() {
                return Err(ObjectError::InvalidTreeEntry {
                    offset: oid_start,
                    reason: "truncated OID".into(),
                });
            }
            let oid = ObjectId::from_bytes(&payload[oid_start..oid_end])?;

            entries.push(TreeEntry { mode, name, oid });
            pos = oid_end;
        }

        Ok(Self { entries })
    }

    /// Re-encode the payload in stored entry order.
    ///
    /// Decoding then re-encoding any tree read from disk is byte-identical;
    /// this codec never re-sorts.
    pub fn serialize_payload(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for entry in &self.entries {
            out.extend_from_slice(&entry.mode.as_bytes());
            out.push(b' ');
            out.extend_from_slice(&entry.name);
            out.push(0);
            out.extend_from_slice(entry.oid.as_bytes());
        }
        out
    }

    /// Lookup an entry by name.
    pub fn find(&self, name: &BStr) -> Option<&TreeEntry> {
        self.entries.iter().find(|e| e.name.as_bstr() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TreeEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
