//! Unified object database.
//!
//! Reads search the loose store first, then every pack under
//! `objects/pack/`. Writes always land in the loose store; the hash/write
//! pipeline optionally runs the line-ending filter first (see [`filter`]).

pub mod cache;
pub mod filter;

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use ngit_config::Config;
use ngit_hash::hasher::Hasher;
use ngit_hash::ObjectId;
use ngit_loose::LooseObjectStore;
use ngit_object::{Object, ObjectType};
use ngit_pack::pack::PackFile;

pub use cache::ObjectCache;

/// Errors from object database operations.
#[derive(Debug, thiserror::Error)]
pub enum OdbError {
    #[error("object not found: {0}")]
    NotFound(String),

    #[error("ambiguous object prefix {prefix}: matches {count} objects")]
    AmbiguousPrefix { prefix: String, count: usize },

    #[error(transparent)]
    Loose(#[from] ngit_loose::LooseError),

    #[error(transparent)]
    Pack(#[from] ngit_pack::PackError),

    #[error("object parse error: {0}")]
    Object(#[from] ngit_object::ObjectError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Object database over one `objects/` directory.
pub struct ObjectDatabase {
    loose: LooseObjectStore,
    packs: Vec<PackFile>,
    objects_dir: PathBuf,
}

impl ObjectDatabase {
    /// Open the database, discovering any packs present.
    pub fn open(objects_dir: impl AsRef<Path>) -> Result<Self, OdbError> {
        let objects_dir = objects_dir.as_ref().to_path_buf();
        let loose = LooseObjectStore::open(&objects_dir);
        let packs = discover_packs(&objects_dir)?;
        Ok(Self {
            loose,
            packs,
            objects_dir,
        })
    }

    /// Read an object: loose path first, then each pack.
    pub fn read(&self, oid: &ObjectId) -> Result<Option<Object>, OdbError> {
        if let Some(obj) = self.loose.read(oid)? {
            return Ok(Some(obj));
        }
        for pack in &self.packs {
            if let Some(packed) = pack.read_object(oid)? {
                return Ok(Some(Object::parse_payload(packed.obj_type, &packed.data)?));
            }
        }
        Ok(None)
    }

    /// Read just kind and size.
    pub fn read_header(&self, oid: &ObjectId) -> Result<Option<(ObjectType, usize)>, OdbError> {
        if let Some(info) = self.loose.read_header(oid)? {
            return Ok(Some(info));
        }
        for pack in &self.packs {
            if let Some(packed) = pack.read_object(oid)? {
                return Ok(Some((packed.obj_type, packed.size)));
            }
        }
        Ok(None)
    }

    /// Whether the object exists in either store.
    pub fn contains(&self, oid: &ObjectId) -> bool {
        self.loose.contains(oid) || self.packs.iter().any(|p| p.contains(oid))
    }

    /// Hash a payload through the canonical framing, optionally running the
    /// content filter first. Returns the OID together with the (possibly
    /// filtered) bytes so a caller can write exactly what was hashed.
    pub fn hash_object<'a>(
        obj_type: ObjectType,
        data: &'a [u8],
        config: &Config,
        filename: Option<&str>,
        apply_filters: bool,
    ) -> (ObjectId, Cow<'a, [u8]>) {
        let content = filter::filter_content(data, config, filename, apply_filters);
        let oid = Hasher::hash_object(obj_type.as_str(), &content);
        (oid, content)
    }

    /// Hash and write a payload into the loose store.
    pub fn write_object(
        &self,
        obj_type: ObjectType,
        data: &[u8],
        config: &Config,
        filename: Option<&str>,
        apply_filters: bool,
    ) -> Result<ObjectId, OdbError> {
        let content = filter::filter_content(data, config, filename, apply_filters);
        Ok(self.loose.write(obj_type, &content)?)
    }

    /// Resolve an abbreviated lowercase hex prefix to a unique OID.
    pub fn resolve_prefix(&self, prefix: &str) -> Result<ObjectId, OdbError> {
        if prefix.len() < 4
            || prefix.len() > 40
            || !prefix.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
        {
            return Err(OdbError::NotFound(prefix.to_string()));
        }

        let mut matches: Vec<ObjectId> = Vec::new();

        // Loose: list the shard directory for the first two characters.
        let shard = self.objects_dir.join(&prefix[..2]);
        if let Ok(entries) = std::fs::read_dir(&shard) {
            for entry in entries.flatten() {
                let name = entry.file_name();
                let Some(rest) = name.to_str() else { continue };
                let full = format!("{}{}", &prefix[..2], rest);
                if full.starts_with(prefix) {
                    if let Ok(oid) = ObjectId::from_hex(&full) {
                        matches.push(oid);
                    }
                }
            }
        }

        // Packs: prefix search over the sorted OID tables.
        let prefix_bytes = hex_prefix_to_bytes(prefix);
        for pack in &self.packs {
            for oid in pack.index().lookup_prefix(&prefix_bytes) {
                if oid.starts_with_hex(prefix) {
                    matches.push(oid);
                }
            }
        }

        matches.sort();
        matches.dedup();
        match matches.len() {
            0 => Err(OdbError::NotFound(prefix.to_string())),
            1 => Ok(matches[0]),
            count => Err(OdbError::AmbiguousPrefix {
                prefix: prefix.to_string(),
                count,
            }),
        }
    }

    /// The objects directory.
    pub fn objects_dir(&self) -> &Path {
        &self.objects_dir
    }

    /// Number of packs discovered at open time.
    pub fn pack_count(&self) -> usize {
        self.packs.len()
    }
}

/// Open every `*.pack` under `objects/pack/`.
fn discover_packs(objects_dir: &Path) -> Result<Vec<PackFile>, OdbError> {
    let pack_dir = objects_dir.join("pack");
    if !pack_dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut packs = Vec::new();
    let mut paths: Vec<PathBuf> = std::fs::read_dir(&pack_dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "pack"))
        .collect();
    paths.sort();

    for path in paths {
        packs.push(PackFile::open(&path)?);
    }
    Ok(packs)
}

/// Convert a lowercase hex prefix to raw bytes; an odd trailing nibble is
/// padded with zero, which the byte-wise prefix compare tolerates because
/// the caller re-checks against the hex form.
fn hex_prefix_to_bytes(prefix: &str) -> Vec<u8> {
    let digits: Vec<u8> = prefix
        .bytes()
        .map(|b| match b {
            b'0'..=b'9' => b - b'0',
            _ => b - b'a' + 10,
        })
        .collect();
    digits
        .chunks(2)
        .map(|pair| (pair[0] << 4) | pair.get(1).copied().unwrap_or(0))
        .collect()
}
