use std::fs;
use std::path::Path;

use bstr::ByteSlice;
use ngit_hash::ObjectId;

use crate::{RefError, Reference};

/// Read a loose ref file.
///
/// The file contains either `ref: <target-ref>` (symbolic) or a hex OID
/// (direct), with optional surrounding whitespace.
pub(crate) fn read_loose_ref(
    git_dir: &Path,
    name: &str,
) -> Result<Option<Reference>, RefError> {
    let path = git_dir.join(name);
    let contents = match fs::read(&path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(RefError::IoPath {
                path,
                source: e,
            })
        }
    };

    let trimmed = contents.trim();

    if let Some(target) = trimmed.strip_prefix(b"ref: ") {
        let target = std::str::from_utf8(target.trim()).map_err(|_| RefError::Parse {
            name: name.to_string(),
            reason: "non-UTF-8 symbolic target".into(),
        })?;
        return Ok(Some(Reference::Symbolic {
            name: name.to_string(),
            target: target.to_string(),
        }));
    }

    let hex = std::str::from_utf8(trimmed).map_err(|_| RefError::Parse {
        name: name.to_string(),
        reason: "non-UTF-8 ref content".into(),
    })?;
    let oid = ObjectId::from_hex(hex).map_err(|_| RefError::Parse {
        name: name.to_string(),
        reason: format!("expected an OID, got {hex:?}"),
    })?;
    Ok(Some(Reference::Direct {
        name: name.to_string(),
        target: oid,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    const OID_HEX: &str = "da39a3ee5e6b4b0d3255bfef95601890afd80709";

    #[test]
    fn read_direct_ref() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("refs/heads")).unwrap();
        fs::write(dir.path().join("refs/heads/main"), format!("{OID_HEX}\n")).unwrap();

        let reference = read_loose_ref(dir.path(), "refs/heads/main")
            .unwrap()
            .unwrap();
        assert_eq!(
            reference.target_oid().unwrap(),
            ObjectId::from_hex(OID_HEX).unwrap()
        );
        assert_eq!(reference.name(), "refs/heads/main");
    }

    #[test]
    fn read_symbolic_ref() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("HEAD"), "ref: refs/heads/main\n").unwrap();

        let reference = read_loose_ref(dir.path(), "HEAD").unwrap().unwrap();
        match reference {
            Reference::Symbolic { target, .. } => assert_eq!(target, "refs/heads/main"),
            _ => panic!("expected symbolic reference"),
        }
    }

    #[test]
    fn missing_ref_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_loose_ref(dir.path(), "refs/heads/none")
            .unwrap()
            .is_none());
    }

    #[test]
    fn garbage_content_errors() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("BROKEN"), "neither ref nor oid\n").unwrap();
        assert!(matches!(
            read_loose_ref(dir.path(), "BROKEN"),
            Err(RefError::Parse { .. })
        ));
    }
}
