use std::collections::{BinaryHeap, HashSet};
use std::io::{self, Write};

use anyhow::Result;
use bstr::ByteSlice;
use clap::Args;
use ngit_hash::ObjectId;
use ngit_object::Commit;

use super::open_repo;

#[derive(Args)]
pub struct LogArgs {}

/// Walk order: newest committer timestamp first, OID as a tie-breaker so the
/// output is stable.
#[derive(PartialEq, Eq)]
struct QueuedCommit {
    time: i64,
    oid: ObjectId,
}

impl Ord for QueuedCommit {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.time
            .cmp(&other.time)
            .then_with(|| self.oid.cmp(&other.oid))
    }
}

impl PartialOrd for QueuedCommit {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

pub fn run(_args: &LogArgs) -> Result<i32> {
    let mut repo = open_repo()?;
    let head = repo.get_head()?;

    let stdout = io::stdout();
    let mut out = stdout.lock();

    let start = head.commit();
    let first = repo.get_commit(&start)?;
    let mut queue = BinaryHeap::new();
    let mut seen = HashSet::new();
    queue.push(QueuedCommit {
        time: first.committer.date.timestamp,
        oid: start,
    });
    seen.insert(start);

    while let Some(QueuedCommit { oid, .. }) = queue.pop() {
        let commit = repo.get_commit(&oid)?;
        print_commit(&mut out, &oid, &commit)?;

        for parent in &commit.parents {
            if seen.insert(*parent) {
                let parent_commit = repo.get_commit(parent)?;
                queue.push(QueuedCommit {
                    time: parent_commit.committer.date.timestamp,
                    oid: *parent,
                });
            }
        }
    }

    Ok(0)
}

fn print_commit(out: &mut impl Write, oid: &ObjectId, commit: &Commit) -> Result<()> {
    writeln!(out, "commit {}", oid.to_hex())?;
    writeln!(out, "Author:     {}", commit.author.who())?;
    writeln!(out, "AuthorDate: {}", commit.author.date.format_default())?;
    writeln!(out, "Commit:     {}", commit.committer.who())?;
    writeln!(out, "CommitDate: {}", commit.committer.date.format_default())?;
    writeln!(out)?;
    for line in commit.message.lines() {
        write!(out, "    ")?;
        out.write_all(line)?;
        writeln!(out)?;
    }
    writeln!(out)?;
    Ok(())
}
