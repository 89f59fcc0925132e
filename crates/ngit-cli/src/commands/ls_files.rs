use std::io::{self, Write};

use anyhow::Result;
use clap::Args;

use super::open_repo;

#[derive(Args)]
pub struct LsFilesArgs {}

pub fn run(_args: &LsFilesArgs) -> Result<i32> {
    let repo = open_repo()?;
    let index = repo.get_index()?;

    let stdout = io::stdout();
    let mut out = stdout.lock();

    // Index order is the on-disk order; print it as-is.
    for entry in index.iter() {
        out.write_all(&entry.path)?;
        writeln!(out)?;
    }
    Ok(0)
}
