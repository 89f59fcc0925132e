use std::io::{self, Write};

use anyhow::Result;
use bstr::BStr;
use clap::Args;

use super::open_repo;

#[derive(Args)]
pub struct CheckIgnoreArgs {
    /// Worktree-relative path to test
    path: String,
}

pub fn run(args: &CheckIgnoreArgs) -> Result<i32> {
    let mut repo = open_repo()?;
    let matcher = repo.ignore_matcher()?;

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if matcher.is_ignored(BStr::new(&args.path)) {
        writeln!(out, "Ignored")?;
        Ok(0)
    } else {
        writeln!(out, "Not ignored")?;
        Ok(1)
    }
}
