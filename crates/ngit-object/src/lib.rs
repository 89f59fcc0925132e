//! The four git object kinds and their payload codecs.
//!
//! An object on disk is `"<kind> <length>\0" || payload`; the object id is
//! the SHA-1 of that framing. This crate decodes the framing and the payload
//! formats of commits, trees, and tags. All parsing is byte-position
//! arithmetic on raw buffers: tree entry names and messages are byte strings,
//! not UTF-8.

mod blob;
mod commit;
pub mod header;
mod tag;
mod tree;

pub use blob::Blob;
pub use commit::Commit;
pub use tag::Tag;
pub use tree::{FileMode, Tree, TreeEntry};

use bstr::BString;
use ngit_hash::{HashError, ObjectId};

/// Errors produced by object decoding.
#[derive(Debug, thiserror::Error)]
pub enum ObjectError {
    #[error("invalid object kind: {0}")]
    InvalidKind(BString),

    #[error("invalid object header: {0}")]
    InvalidHeader(String),

    #[error("object size mismatch: header says {declared}, payload is {actual} bytes")]
    SizeMismatch { declared: usize, actual: usize },

    #[error("invalid tree entry at offset {offset}: {reason}")]
    InvalidTreeEntry { offset: usize, reason: String },

    #[error("invalid commit: missing '{field}' header")]
    MissingCommitField { field: &'static str },

    #[error("invalid tag: missing '{field}' header")]
    MissingTagField { field: &'static str },

    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    #[error(transparent)]
    Hash(#[from] HashError),
}

/// The four kinds of objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectType {
    Blob,
    Tree,
    Commit,
    Tag,
}

impl ObjectType {
    /// Parse from the kind token in object headers.
    pub fn from_bytes(s: &[u8]) -> Result<Self, ObjectError> {
        match s {
            b"blob" => Ok(Self::Blob),
            b"tree" => Ok(Self::Tree),
            b"commit" => Ok(Self::Commit),
            b"tag" => Ok(Self::Tag),
            _ => Err(ObjectError::InvalidKind(BString::from(s))),
        }
    }

    /// The canonical byte representation.
    pub fn as_bytes(&self) -> &'static [u8] {
        match self {
            Self::Blob => b"blob",
            Self::Tree => b"tree",
            Self::Commit => b"commit",
            Self::Tag => b"tag",
        }
    }

    /// The canonical string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blob => "blob",
            Self::Tree => "tree",
            Self::Commit => "commit",
            Self::Tag => "tag",
        }
    }
}

impl std::fmt::Display for ObjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ObjectType {
    type Err = ObjectError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_bytes(s.as_bytes())
    }
}

/// A fully parsed object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Object {
    Blob(Blob),
    Tree(Tree),
    Commit(Commit),
    Tag(Tag),
}

impl Object {
    /// Parse a framed object (`"<kind> <length>\0" || payload`).
    ///
    /// The declared length must equal the payload length exactly.
    pub fn parse(data: &[u8]) -> Result<Self, ObjectError> {
        let (obj_type, declared, header_len) = header::parse_header(data)?;
        let payload = &data[header_len..];
        if payload.len() != declared {
            return Err(ObjectError::SizeMismatch {
                declared,
                actual: payload.len(),
            });
        }
        Self::parse_payload(obj_type, payload)
    }

    /// Parse a bare payload with a known kind (no framing header).
    pub fn parse_payload(obj_type: ObjectType, payload: &[u8]) -> Result<Self, ObjectError> {
        match obj_type {
            ObjectType::Blob => Ok(Self::Blob(Blob::parse(payload))),
            ObjectType::Tree => Ok(Self::Tree(Tree::parse(payload)?)),
            ObjectType::Commit => Ok(Self::Commit(Commit::parse(payload)?)),
            ObjectType::Tag => Ok(Self::Tag(Tag::parse(payload)?)),
        }
    }

    /// Serialize to the canonical framed form (header + payload).
    pub fn serialize(&self) -> Vec<u8> {
        let payload = self.serialize_payload();
        let hdr = header::write_header(self.object_type(), payload.len());
        let mut out = Vec::with_capacity(hdr.len() + payload.len());
        out.extend_from_slice(&hdr);
        out.extend_from_slice(&payload);
        out
    }

    /// Serialize just the payload (no framing header).
    pub fn serialize_payload(&self) -> Vec<u8> {
        match self {
            Self::Blob(b) => b.data.to_vec(),
            Self::Tree(t) => t.serialize_payload(),
            Self::Commit(c) => c.serialize_payload(),
            Self::Tag(t) => t.serialize_payload(),
        }
    }

    pub fn object_type(&self) -> ObjectType {
        match self {
            Self::Blob(_) => ObjectType::Blob,
            Self::Tree(_) => ObjectType::Tree,
            Self::Commit(_) => ObjectType::Commit,
            Self::Tag(_) => ObjectType::Tag,
        }
    }

    /// Compute the OID by hashing the canonical framing.
    pub fn compute_oid(&self) -> ObjectId {
        let payload = self.serialize_payload();
        ngit_hash::hasher::Hasher::hash_object(self.object_type().as_str(), &payload)
    }
}
