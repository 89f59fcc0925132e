use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use ngit_object::ObjectType;

use super::open_repo;

#[derive(Args)]
pub struct HashObjectArgs {
    /// Object kind to hash as
    #[arg(short = 't', default_value = "blob")]
    obj_type: ObjectType,

    /// Also write the object into the object database
    #[arg(short = 'w')]
    write: bool,

    /// Skip the line-ending filter
    #[arg(long)]
    no_filters: bool,

    /// File to hash
    file: PathBuf,
}

pub fn run(args: &HashObjectArgs) -> Result<i32> {
    let mut repo = open_repo()?;

    let data = std::fs::read(&args.file)?;
    let filename = args
        .file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned());
    let apply_filters = !args.no_filters;

    let oid = if args.write {
        repo.write_object(args.obj_type, &data, filename.as_deref(), apply_filters)?
    } else {
        repo.hash_object(args.obj_type, &data, filename.as_deref(), apply_filters)?
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "{}", oid.to_hex())?;
    Ok(0)
}
