//! Content status between the index, HEAD's tree, and the working tree.

use std::path::Path;

use bstr::{BStr, BString, ByteSlice};
use ngit_hash::ObjectId;
use ngit_object::{FileMode, ObjectType};

use crate::{RepoError, Repository};

/// How a staged path differs from HEAD's tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageChange {
    Added,
    Modified,
    Deleted,
}

/// The state of one path in the status report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    /// In the index, differing from HEAD's tree.
    Staged(StageChange),
    /// In the index, but the working-tree content differs from it.
    Modified,
    /// In the working tree, absent from the index, not ignored.
    Untracked,
}

/// One status record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    /// Worktree-relative path, `/`-separated.
    pub path: BString,
    pub oid: ObjectId,
    pub status: FileStatus,
}

/// Compute the status records.
///
/// `root_tree` is HEAD's tree, or `None` on an unborn branch (everything in
/// the index is then a staged addition).
pub(crate) fn working_dir_status(
    repo: &mut Repository,
    index: &ngit_index::Index,
    root_tree: Option<ObjectId>,
) -> Result<Vec<StatusEntry>, RepoError> {
    // Flatten HEAD's tree to (path, oid) leaves.
    let mut tree_entries: Vec<(BString, ObjectId)> = Vec::new();
    if let Some(tree_oid) = root_tree {
        flatten_tree(repo, &tree_oid, BStr::new(""), &mut tree_entries)?;
    }

    let mut records = Vec::new();

    // Index vs tree: additions and modifications, in index order.
    for entry in index.iter() {
        match tree_entries.iter().find(|(path, _)| path == &entry.path) {
            None => records.push(StatusEntry {
                path: entry.path.clone(),
                oid: entry.oid,
                status: FileStatus::Staged(StageChange::Added),
            }),
            Some((_, tree_oid)) if *tree_oid != entry.oid => records.push(StatusEntry {
                path: entry.path.clone(),
                oid: entry.oid,
                status: FileStatus::Staged(StageChange::Modified),
            }),
            Some(_) => {}
        }
    }

    // Tree vs index: deletions, in tree order.
    for (path, oid) in &tree_entries {
        if index.get(path.as_bstr()).is_none() {
            records.push(StatusEntry {
                path: path.clone(),
                oid: *oid,
                status: FileStatus::Staged(StageChange::Deleted),
            });
        }
    }

    // Working tree vs index: unstaged modifications and untracked files.
    if repo.work_tree().is_some() {
        let files = worktree_files(repo)?;
        for path in files {
            let data = read_worktree_file(repo, path.as_bstr())?;
            match index.get(path.as_bstr()) {
                Some(entry) => {
                    if entry.mode.is_gitlink() {
                        continue;
                    }
                    let filename = path.to_str_lossy().into_owned();
                    let oid = repo.hash_object(
                        ObjectType::Blob,
                        &data,
                        Some(&filename),
                        !entry.mode.is_symlink(),
                    )?;
                    if oid != entry.oid {
                        records.push(StatusEntry {
                            path: path.clone(),
                            oid,
                            status: FileStatus::Modified,
                        });
                    }
                }
                None => {
                    let filename = path.to_str_lossy().into_owned();
                    let oid =
                        repo.hash_object(ObjectType::Blob, &data, Some(&filename), true)?;
                    records.push(StatusEntry {
                        path: path.clone(),
                        oid,
                        status: FileStatus::Untracked,
                    });
                }
            }
        }
    }

    Ok(records)
}

/// Recursively flatten a tree into `(path, oid)` leaves, joining subtree
/// names with `/`. Gitlinks surface as leaves; their targets are not
/// repository objects.
fn flatten_tree(
    repo: &mut Repository,
    tree_oid: &ObjectId,
    prefix: &BStr,
    out: &mut Vec<(BString, ObjectId)>,
) -> Result<(), RepoError> {
    let tree = repo.get_tree(tree_oid)?;
    for entry in tree.iter() {
        let mut path = BString::from(prefix);
        if !path.is_empty() {
            path.push(b'/');
        }
        path.extend_from_slice(&entry.name);

        if entry.mode == FileMode::Tree {
            flatten_tree(repo, &entry.oid, path.as_bstr(), out)?;
        } else {
            out.push((path, entry.oid));
        }
    }
    Ok(())
}

/// Collect worktree-relative paths of all non-ignored files, sorted.
fn worktree_files(repo: &mut Repository) -> Result<Vec<BString>, RepoError> {
    let work_tree = match repo.work_tree() {
        Some(wt) => wt.to_path_buf(),
        None => return Ok(Vec::new()),
    };
    repo.ignore_matcher()?;
    let matcher = repo
        .ignore
        .as_ref()
        .expect("matcher built by ignore_matcher()");

    let mut files = Vec::new();
    collect_files(&work_tree, BStr::new(""), matcher, &mut files)?;
    files.sort();
    Ok(files)
}

fn collect_files(
    dir: &Path,
    prefix: &BStr,
    matcher: &ngit_index::IgnoreMatcher,
    out: &mut Vec<BString>,
) -> Result<(), RepoError> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        if name == ".git" {
            continue;
        }

        let mut rel = BString::from(prefix);
        if !rel.is_empty() {
            rel.push(b'/');
        }
        rel.extend_from_slice(name.to_string_lossy().as_bytes());

        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            if !matcher.is_ignored_dir(rel.as_bstr()) {
                collect_files(&entry.path(), rel.as_bstr(), matcher, out)?;
            }
        } else if !matcher.is_ignored(rel.as_bstr()) {
            out.push(rel);
        }
    }
    Ok(())
}

/// Read a worktree file's content for hashing; symlinks contribute their
/// target path bytes, the way the object store records them.
fn read_worktree_file(repo: &Repository, rel: &BStr) -> Result<Vec<u8>, RepoError> {
    let work_tree = repo.work_tree().expect("caller checked work tree");
    let full = work_tree.join(rel.to_str_lossy().as_ref());
    let meta = std::fs::symlink_metadata(&full)?;
    if meta.file_type().is_symlink() {
        let target = std::fs::read_link(&full)?;
        Ok(target.to_string_lossy().into_owned().into_bytes())
    } else {
        Ok(std::fs::read(&full)?)
    }
}
