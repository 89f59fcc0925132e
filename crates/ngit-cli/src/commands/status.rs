use std::io::{self, Write};

use anyhow::Result;
use clap::Args;
use ngit_ref::{RefError, Reference};
use ngit_repository::{FileStatus, Head, RepoError, StageChange, StatusEntry};

use super::open_repo;

#[derive(Args)]
pub struct StatusArgs {}

pub fn run(_args: &StatusArgs) -> Result<i32> {
    let mut repo = open_repo()?;

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match repo.get_head() {
        Ok(Head::Branch { name, .. }) => writeln!(out, "On branch {name}")?,
        Ok(Head::Tag { name, .. }) => writeln!(out, "HEAD detached at {name}")?,
        Ok(Head::Detached { commit }) => {
            writeln!(out, "HEAD detached at {}", &commit.to_hex()[..7])?
        }
        Err(RepoError::Ref(RefError::NotFound(_))) => {
            // Unborn branch: name it from the symbolic HEAD if possible.
            match repo.refs().read("HEAD")? {
                Some(Reference::Symbolic { target, .. }) => {
                    let name = target.strip_prefix("refs/heads/").unwrap_or(&target);
                    writeln!(out, "On branch {name}")?;
                    writeln!(out)?;
                    writeln!(out, "No commits yet")?;
                }
                _ => writeln!(out, "No commits yet")?,
            }
        }
        Err(e) => return Err(e.into()),
    }

    let records = repo.status()?;

    let staged: Vec<&StatusEntry> = records
        .iter()
        .filter(|r| matches!(r.status, FileStatus::Staged(_)))
        .collect();
    let unstaged: Vec<&StatusEntry> = records
        .iter()
        .filter(|r| r.status == FileStatus::Modified)
        .collect();
    let untracked: Vec<&StatusEntry> = records
        .iter()
        .filter(|r| r.status == FileStatus::Untracked)
        .collect();

    if !staged.is_empty() {
        writeln!(out)?;
        writeln!(out, "Changes to be committed:")?;
        for record in &staged {
            let label = match record.status {
                FileStatus::Staged(StageChange::Added) => "new file:",
                FileStatus::Staged(StageChange::Modified) => "modified:",
                FileStatus::Staged(StageChange::Deleted) => "deleted:",
                _ => unreachable!("filtered to staged records"),
            };
            writeln!(out, "\t{label}   {}", record.path)?;
        }
    }

    if !unstaged.is_empty() {
        writeln!(out)?;
        writeln!(out, "Changes not staged for commit:")?;
        for record in &unstaged {
            writeln!(out, "\tmodified:   {}", record.path)?;
        }
    }

    if !untracked.is_empty() {
        writeln!(out)?;
        writeln!(out, "Untracked files:")?;
        for record in &untracked {
            writeln!(out, "\t{}", record.path)?;
        }
    }

    if staged.is_empty() && unstaged.is_empty() && untracked.is_empty() {
        writeln!(out)?;
        writeln!(out, "nothing to commit, working tree clean")?;
    }

    Ok(0)
}
