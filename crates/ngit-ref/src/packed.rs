//! The `packed-refs` file.
//!
//! Format:
//! ```text
//! # pack-refs with: peeled fully-peeled sorted
//! <hex-oid> <refname>
//! ^<hex-oid>   (peeled target of the annotated tag above)
//! ```

use std::fs;
use std::path::Path;

use bstr::ByteSlice;
use ngit_hash::ObjectId;

use crate::RefError;

/// One entry of the packed-refs file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedRef {
    pub name: String,
    pub oid: ObjectId,
    /// For annotated tags: the commit the tag peels to.
    pub peeled: Option<ObjectId>,
}

/// All refs recorded in `packed-refs`.
#[derive(Debug, Clone, Default)]
pub struct PackedRefs {
    refs: Vec<PackedRef>,
}

impl PackedRefs {
    /// Parse packed-refs content.
    pub fn parse(data: &[u8]) -> Result<Self, RefError> {
        let mut refs: Vec<PackedRef> = Vec::new();

        for line in data.lines() {
            if line.is_empty() || line.starts_with(b"#") {
                continue;
            }

            // Peeled line, attaches to the preceding ref.
            if let Some(hex) = line.strip_prefix(b"^") {
                let hex = std::str::from_utf8(hex.trim()).map_err(|_| RefError::Parse {
                    name: "packed-refs".into(),
                    reason: "non-UTF-8 peeled OID".into(),
                })?;
                let peeled = ObjectId::from_hex(hex)?;
                if let Some(last) = refs.last_mut() {
                    last.peeled = Some(peeled);
                }
                continue;
            }

            let space = line.find_byte(b' ').ok_or_else(|| RefError::Parse {
                name: "packed-refs".into(),
                reason: format!("malformed line: {:?}", line.as_bstr()),
            })?;

            let hex = std::str::from_utf8(&line[..space]).map_err(|_| RefError::Parse {
                name: "packed-refs".into(),
                reason: "non-UTF-8 OID".into(),
            })?;
            let oid = ObjectId::from_hex(hex)?;

            let name = std::str::from_utf8(line[space + 1..].trim()).map_err(|_| {
                RefError::Parse {
                    name: "packed-refs".into(),
                    reason: "non-UTF-8 ref name".into(),
                }
            })?;

            refs.push(PackedRef {
                name: name.to_string(),
                oid,
                peeled: None,
            });
        }

        Ok(Self { refs })
    }

    /// Load from disk; a missing file is an empty set.
    pub fn load(git_dir: &Path) -> Result<Self, RefError> {
        let path = git_dir.join("packed-refs");
        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(RefError::IoPath {
                    path,
                    source: e,
                })
            }
        };
        Self::parse(&data)
    }

    /// Find a ref by full name.
    pub fn find(&self, name: &str) -> Option<&PackedRef> {
        self.refs.iter().find(|pr| pr.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PackedRef> {
        self.refs.iter()
    }

    pub fn len(&self) -> usize {
        self.refs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }
}
