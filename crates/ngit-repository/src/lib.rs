//! Repository discovery and the central `Repository` facade.
//!
//! The facade composes the object database, refs, index, config, and ignore
//! matcher. Config and the ignore matcher are loaded lazily on first use and
//! cached; every cache-touching operation therefore takes `&mut self`. A
//! `Repository` holds no locks and spawns no threads — callers that share
//! one across threads must synchronize externally.

mod discover;
mod status;

use std::path::{Path, PathBuf};

use ngit_config::Config;
use ngit_hash::ObjectId;
use ngit_index::{IgnoreMatcher, Index};
use ngit_object::{Commit, Object, ObjectType, Tag, Tree};
use ngit_odb::{ObjectCache, ObjectDatabase};
use ngit_ref::{RefError, RefStore, Reference};

pub use discover::{dir_exists, file_exists, find_repo};
pub use status::{FileStatus, StageChange, StatusEntry};

/// Errors from repository-level operations.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("not a git repository (or any of the parent directories): {}", .0.display())]
    NotARepository(PathBuf),

    #[error("object not found: {0}")]
    ObjectNotFound(String),

    #[error("object {oid} is a {actual}, expected {expected}")]
    UnexpectedType {
        oid: ObjectId,
        expected: ObjectType,
        actual: ObjectType,
    },

    #[error("invalid HEAD: {0}")]
    InvalidHead(String),

    #[error(transparent)]
    Ref(#[from] RefError),

    #[error(transparent)]
    Odb(#[from] ngit_odb::OdbError),

    #[error(transparent)]
    Index(#[from] ngit_index::IndexError),

    #[error(transparent)]
    Config(#[from] ngit_config::ConfigError),

    #[error(transparent)]
    Object(#[from] ngit_object::ObjectError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Where HEAD points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Head {
    /// Symbolic ref into `refs/heads/`.
    Branch { name: String, commit: ObjectId },
    /// Symbolic ref into `refs/tags/`.
    Tag { name: String, commit: ObjectId },
    /// A bare commit OID.
    Detached { commit: ObjectId },
}

impl Head {
    /// The commit HEAD ultimately points at.
    pub fn commit(&self) -> ObjectId {
        match self {
            Head::Branch { commit, .. } | Head::Tag { commit, .. } | Head::Detached { commit } => {
                *commit
            }
        }
    }
}

/// The central repository handle.
pub struct Repository {
    git_dir: PathBuf,
    work_tree: Option<PathBuf>,
    odb: ObjectDatabase,
    refs: RefStore,
    /// Loaded on first use.
    config: Option<Config>,
    /// Built on first use; also depends on config (ignore case).
    ignore: Option<IgnoreMatcher>,
    cache: ObjectCache,
}

impl Repository {
    const OBJECT_CACHE_SIZE: usize = 512;

    /// Open a repository whose `.git` directory is already known.
    pub fn open(git_dir: impl AsRef<Path>) -> Result<Self, RepoError> {
        let git_dir = git_dir.as_ref().to_path_buf();
        if !git_dir.join("objects").is_dir() {
            return Err(RepoError::NotARepository(git_dir));
        }
        let work_tree = git_dir.parent().map(Path::to_path_buf);
        let odb = ObjectDatabase::open(git_dir.join("objects"))?;
        let refs = RefStore::new(&git_dir);
        Ok(Self {
            git_dir,
            work_tree,
            odb,
            refs,
            config: None,
            ignore: None,
            cache: ObjectCache::new(Self::OBJECT_CACHE_SIZE),
        })
    }

    /// Discover the repository by walking up from `start`.
    pub fn discover(start: impl AsRef<Path>) -> Result<Self, RepoError> {
        let start = start.as_ref();
        let git_dir =
            find_repo(start).ok_or_else(|| RepoError::NotARepository(start.to_path_buf()))?;
        Self::open(git_dir)
    }

    // --- Accessors ---

    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    pub fn work_tree(&self) -> Option<&Path> {
        self.work_tree.as_deref()
    }

    pub fn odb(&self) -> &ObjectDatabase {
        &self.odb
    }

    pub fn refs(&self) -> &RefStore {
        &self.refs
    }

    /// The merged configuration, loaded on first call.
    pub fn config(&mut self) -> Result<&Config, RepoError> {
        if self.config.is_none() {
            self.config = Some(Config::load(&self.git_dir)?);
        }
        Ok(self.config.as_ref().expect("just loaded"))
    }

    /// The ignore matcher, built (one worktree walk) on first call.
    pub fn ignore_matcher(&mut self) -> Result<&IgnoreMatcher, RepoError> {
        if self.ignore.is_none() {
            let ignore_case = self.config()?.ignore_case();
            let work_tree = self
                .work_tree
                .clone()
                .ok_or_else(|| RepoError::NotARepository(self.git_dir.clone()))?;
            let mut matcher = IgnoreMatcher::new(work_tree, ignore_case);
            matcher.init()?;
            self.ignore = Some(matcher);
        }
        Ok(self.ignore.as_ref().expect("just built"))
    }

    // --- Objects ---

    /// Read an object from loose or packed storage.
    pub fn get_object(&mut self, oid: &ObjectId) -> Result<Object, RepoError> {
        if let Some(obj) = self.cache.get(oid) {
            return Ok(obj.clone());
        }
        let obj = self
            .odb
            .read(oid)?
            .ok_or_else(|| RepoError::ObjectNotFound(oid.to_hex()))?;
        self.cache.insert(*oid, obj.clone());
        Ok(obj)
    }

    pub fn get_commit(&mut self, oid: &ObjectId) -> Result<Commit, RepoError> {
        match self.get_object(oid)? {
            Object::Commit(commit) => Ok(commit),
            other => Err(RepoError::UnexpectedType {
                oid: *oid,
                expected: ObjectType::Commit,
                actual: other.object_type(),
            }),
        }
    }

    pub fn get_tree(&mut self, oid: &ObjectId) -> Result<Tree, RepoError> {
        match self.get_object(oid)? {
            Object::Tree(tree) => Ok(tree),
            other => Err(RepoError::UnexpectedType {
                oid: *oid,
                expected: ObjectType::Tree,
                actual: other.object_type(),
            }),
        }
    }

    pub fn get_tag(&mut self, oid: &ObjectId) -> Result<Tag, RepoError> {
        match self.get_object(oid)? {
            Object::Tag(tag) => Ok(tag),
            other => Err(RepoError::UnexpectedType {
                oid: *oid,
                expected: ObjectType::Tag,
                actual: other.object_type(),
            }),
        }
    }

    /// Hash a payload the way `write_object` would, without writing.
    pub fn hash_object(
        &mut self,
        obj_type: ObjectType,
        data: &[u8],
        filename: Option<&str>,
        apply_filters: bool,
    ) -> Result<ObjectId, RepoError> {
        self.config()?;
        let config = self.config.as_ref().expect("just loaded");
        let (oid, _) = ObjectDatabase::hash_object(obj_type, data, config, filename, apply_filters);
        Ok(oid)
    }

    /// Hash a payload and write it as a loose object.
    pub fn write_object(
        &mut self,
        obj_type: ObjectType,
        data: &[u8],
        filename: Option<&str>,
        apply_filters: bool,
    ) -> Result<ObjectId, RepoError> {
        self.config()?;
        let config = self.config.as_ref().expect("just loaded");
        Ok(self
            .odb
            .write_object(obj_type, data, config, filename, apply_filters)?)
    }

    // --- Index ---

    /// Parse `.git/index`; a missing file is an empty index.
    pub fn get_index(&self) -> Result<Index, RepoError> {
        let path = self.git_dir.join("index");
        if !path.is_file() {
            return Ok(Index::empty());
        }
        Ok(Index::read_from(path)?)
    }

    // --- Refs ---

    /// Resolve `refs/<name>` to an OID: loose file first, then packed-refs.
    pub fn get_ref(&self, name: &str) -> Result<ObjectId, RepoError> {
        Ok(self.refs.resolve_to_oid(&format!("refs/{name}"))?)
    }

    /// Resolve a branch head.
    pub fn get_branch(&self, name: &str) -> Result<ObjectId, RepoError> {
        self.get_ref(&format!("heads/{name}"))
    }

    /// Resolve HEAD.
    ///
    /// A symbolic HEAD into `refs/heads/` or `refs/tags/` yields the branch
    /// or tag shape; a bare OID yields a detached HEAD. The resolved commit
    /// must actually be a commit object. Anything else is an invalid HEAD.
    pub fn get_head(&mut self) -> Result<Head, RepoError> {
        let head = match self.refs.read("HEAD") {
            Ok(Some(head)) => head,
            Ok(None) => return Err(RepoError::InvalidHead("missing HEAD file".into())),
            Err(RefError::Parse { reason, .. }) => return Err(RepoError::InvalidHead(reason)),
            Err(e) => return Err(e.into()),
        };

        let head = match head {
            Reference::Symbolic { target, .. } => {
                if let Some(name) = target.strip_prefix("refs/heads/") {
                    let commit = self.refs.resolve_to_oid(&target)?;
                    Head::Branch {
                        name: name.to_string(),
                        commit,
                    }
                } else if let Some(name) = target.strip_prefix("refs/tags/") {
                    let commit = self.refs.resolve_to_oid(&target)?;
                    Head::Tag {
                        name: name.to_string(),
                        commit,
                    }
                } else {
                    return Err(RepoError::InvalidHead(format!(
                        "HEAD points outside refs/heads/ and refs/tags/: {target}"
                    )));
                }
            }
            Reference::Direct { target, .. } => Head::Detached { commit: target },
        };

        // Whatever shape HEAD has, it must lead to a commit.
        self.get_commit(&head.commit())?;
        Ok(head)
    }

    // --- Status ---

    /// Compute content status between the index, HEAD's tree, and the
    /// working tree. An unborn HEAD (no commits yet) compares against an
    /// empty tree.
    pub fn status(&mut self) -> Result<Vec<StatusEntry>, RepoError> {
        let index = self.get_index()?;
        let root_tree = match self.get_head() {
            Ok(head) => {
                let commit = self.get_commit(&head.commit())?;
                Some(commit.tree)
            }
            Err(RepoError::Ref(RefError::NotFound(_))) => None,
            Err(e) => return Err(e),
        };
        self.working_dir_status(&index, root_tree)
    }

    /// Status against an explicit index and root tree; `None` means the
    /// empty tree.
    pub fn working_dir_status(
        &mut self,
        index: &Index,
        root_tree: Option<ObjectId>,
    ) -> Result<Vec<StatusEntry>, RepoError> {
        status::working_dir_status(self, index, root_tree)
    }
}
