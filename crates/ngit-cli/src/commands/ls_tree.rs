use std::io::{self, Write};

use anyhow::Result;
use clap::Args;
use ngit_hash::ObjectId;
use ngit_repository::Repository;

use super::{open_repo, resolve_object};

#[derive(Args)]
pub struct LsTreeArgs {
    /// Recurse into subtrees, joining names with '/'
    #[arg(short = 'r')]
    recursive: bool,

    /// The tree to list (full or abbreviated OID)
    object: String,
}

pub fn run(args: &LsTreeArgs) -> Result<i32> {
    let mut repo = open_repo()?;
    let oid = resolve_object(&repo, &args.object)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    print_tree(&mut repo, &oid, "", args.recursive, &mut out)?;
    Ok(0)
}

fn print_tree(
    repo: &mut Repository,
    oid: &ObjectId,
    prefix: &str,
    recursive: bool,
    out: &mut impl Write,
) -> Result<()> {
    let tree = repo.get_tree(oid)?;
    for entry in tree.iter() {
        let name = if prefix.is_empty() {
            entry.name.to_string()
        } else {
            format!("{prefix}/{}", entry.name)
        };

        if recursive && entry.mode.is_tree() {
            print_tree(repo, &entry.oid, &name, recursive, out)?;
        } else {
            writeln!(out, "{:06o} {} {}", entry.mode.raw(), entry.oid, name)?;
        }
    }
    Ok(())
}
