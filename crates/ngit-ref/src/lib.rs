//! Reference reading.
//!
//! A ref lives either as a loose file under the git directory (`HEAD`,
//! `refs/heads/main`, ...) containing a hex OID or a `ref: <target>`
//! pointer, or as a line in `packed-refs`. Resolution always tries the loose
//! file first.

mod loose;
pub mod packed;

use std::path::{Path, PathBuf};

use ngit_hash::ObjectId;

pub use packed::{PackedRef, PackedRefs};

/// Symbolic chains longer than this are treated as broken.
const MAX_SYMREF_DEPTH: usize = 10;

/// Errors from reference operations.
#[derive(Debug, thiserror::Error)]
pub enum RefError {
    #[error("reference not found: {0}")]
    NotFound(String),

    #[error("malformed reference {name}: {reason}")]
    Parse { name: String, reason: String },

    #[error("symbolic reference chain too deep starting at {0}")]
    ChainTooDeep(String),

    #[error("io error on {}: {source}", path.display())]
    IoPath {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Hash(#[from] ngit_hash::HashError),
}

/// A reference: either direct (an OID) or symbolic (another ref name).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    Direct { name: String, target: ObjectId },
    Symbolic { name: String, target: String },
}

impl Reference {
    pub fn name(&self) -> &str {
        match self {
            Reference::Direct { name, .. } => name,
            Reference::Symbolic { name, .. } => name,
        }
    }

    pub fn is_symbolic(&self) -> bool {
        matches!(self, Reference::Symbolic { .. })
    }

    /// The target OID for a direct ref.
    pub fn target_oid(&self) -> Option<ObjectId> {
        match self {
            Reference::Direct { target, .. } => Some(*target),
            Reference::Symbolic { .. } => None,
        }
    }
}

/// Read access to the refs of one git directory.
pub struct RefStore {
    git_dir: PathBuf,
}

impl RefStore {
    pub fn new(git_dir: impl AsRef<Path>) -> Self {
        Self {
            git_dir: git_dir.as_ref().to_path_buf(),
        }
    }

    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    /// Read one ref by full name (`HEAD`, `refs/heads/main`, ...).
    ///
    /// The loose file wins over a packed entry of the same name. Returns
    /// `Ok(None)` when the ref exists in neither place.
    pub fn read(&self, name: &str) -> Result<Option<Reference>, RefError> {
        if let Some(reference) = loose::read_loose_ref(&self.git_dir, name)? {
            return Ok(Some(reference));
        }

        let packed = PackedRefs::load(&self.git_dir)?;
        Ok(packed.find(name).map(|pr| Reference::Direct {
            name: name.to_string(),
            target: pr.oid,
        }))
    }

    /// Resolve a ref name to an OID, following symbolic chains.
    pub fn resolve_to_oid(&self, name: &str) -> Result<ObjectId, RefError> {
        let mut current = name.to_string();
        for _ in 0..MAX_SYMREF_DEPTH {
            match self.read(&current)? {
                Some(Reference::Direct { target, .. }) => return Ok(target),
                Some(Reference::Symbolic { target, .. }) => current = target,
                None => return Err(RefError::NotFound(current)),
            }
        }
        Err(RefError::ChainTooDeep(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const OID_HEX: &str = "da39a3ee5e6b4b0d3255bfef95601890afd80709";

    #[test]
    fn loose_wins_over_packed() {
        let dir = tempfile::tempdir().unwrap();
        let git_dir = dir.path();

        let loose_oid = "1111111111111111111111111111111111111111";
        fs::create_dir_all(git_dir.join("refs/heads")).unwrap();
        fs::write(git_dir.join("refs/heads/main"), format!("{loose_oid}\n")).unwrap();
        fs::write(
            git_dir.join("packed-refs"),
            format!("{OID_HEX} refs/heads/main\n"),
        )
        .unwrap();

        let store = RefStore::new(git_dir);
        let resolved = store.resolve_to_oid("refs/heads/main").unwrap();
        assert_eq!(resolved.to_hex(), loose_oid);
    }

    #[test]
    fn falls_back_to_packed() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("packed-refs"),
            format!("{OID_HEX} refs/tags/v1.0\n"),
        )
        .unwrap();

        let store = RefStore::new(dir.path());
        assert_eq!(
            store.resolve_to_oid("refs/tags/v1.0").unwrap().to_hex(),
            OID_HEX
        );
    }

    #[test]
    fn missing_everywhere_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = RefStore::new(dir.path());
        assert!(matches!(
            store.resolve_to_oid("refs/heads/absent"),
            Err(RefError::NotFound(_))
        ));
    }

    #[test]
    fn symbolic_chain_resolves() {
        let dir = tempfile::tempdir().unwrap();
        let git_dir = dir.path();
        fs::create_dir_all(git_dir.join("refs/heads")).unwrap();
        fs::write(git_dir.join("HEAD"), "ref: refs/heads/main\n").unwrap();
        fs::write(git_dir.join("refs/heads/main"), format!("{OID_HEX}\n")).unwrap();

        let store = RefStore::new(git_dir);
        assert_eq!(store.resolve_to_oid("HEAD").unwrap().to_hex(), OID_HEX);
    }

    #[test]
    fn symref_cycle_detected() {
        let dir = tempfile::tempdir().unwrap();
        let git_dir = dir.path();
        fs::create_dir_all(git_dir.join("refs/heads")).unwrap();
        fs::write(git_dir.join("refs/heads/a"), "ref: refs/heads/b\n").unwrap();
        fs::write(git_dir.join("refs/heads/b"), "ref: refs/heads/a\n").unwrap();

        let store = RefStore::new(git_dir);
        assert!(matches!(
            store.resolve_to_oid("refs/heads/a"),
            Err(RefError::ChainTooDeep(_))
        ));
    }
}
