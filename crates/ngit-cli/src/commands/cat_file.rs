use std::io::{self, Write};

use anyhow::{anyhow, Result};
use clap::{ArgGroup, Args};
use ngit_object::Object;

use super::{open_repo, resolve_object};

#[derive(Args)]
#[command(group(
    ArgGroup::new("selector")
        .required(true)
        .args(["type_only", "size", "pretty"])
))]
pub struct CatFileArgs {
    /// Show the object's type
    #[arg(short = 't')]
    type_only: bool,

    /// Show the object's size
    #[arg(short = 's')]
    size: bool,

    /// Pretty-print the object's content
    #[arg(short = 'p')]
    pretty: bool,

    /// The object to inspect (full or abbreviated OID)
    object: String,
}

pub fn run(args: &CatFileArgs) -> Result<i32> {
    let mut repo = open_repo()?;
    let oid = resolve_object(&repo, &args.object)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if args.type_only || args.size {
        let (obj_type, size) = repo
            .odb()
            .read_header(&oid)?
            .ok_or_else(|| anyhow!("object not found: {}", oid.to_hex()))?;
        if args.type_only {
            writeln!(out, "{obj_type}")?;
        } else {
            writeln!(out, "{size}")?;
        }
        return Ok(0);
    }

    let obj = repo.get_object(&oid)?;
    match &obj {
        Object::Blob(blob) => {
            out.write_all(&blob.data)?;
        }
        Object::Tree(tree) => {
            for entry in tree.iter() {
                writeln!(out, "{:o} {} {}", entry.mode.raw(), entry.oid, entry.name)?;
            }
        }
        Object::Commit(_) | Object::Tag(_) => {
            out.write_all(&obj.serialize_payload())?;
        }
    }
    Ok(0)
}
