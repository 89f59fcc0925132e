pub mod cat_file;
pub mod check_ignore;
pub mod hash_object;
pub mod log;
pub mod ls_files;
pub mod ls_tree;
pub mod status;

use anyhow::Result;
use clap::Subcommand;
use ngit_hash::ObjectId;
use ngit_repository::Repository;

use crate::Cli;

#[derive(Subcommand)]
pub enum Commands {
    /// Show commit logs starting from HEAD
    Log(log::LogArgs),
    /// Show the working tree status
    Status(status::StatusArgs),
    /// Provide content, type, or size for a repository object
    CatFile(cat_file::CatFileArgs),
    /// Compute the object ID of a file, optionally writing the blob
    HashObject(hash_object::HashObjectArgs),
    /// Check whether a path is excluded by the ignore rules
    CheckIgnore(check_ignore::CheckIgnoreArgs),
    /// List the paths staged in the index
    LsFiles(ls_files::LsFilesArgs),
    /// List the contents of a tree object
    LsTree(ls_tree::LsTreeArgs),
}

pub fn run(cli: Cli) -> Result<i32> {
    match &cli.command {
        Commands::Log(args) => log::run(args),
        Commands::Status(args) => status::run(args),
        Commands::CatFile(args) => cat_file::run(args),
        Commands::HashObject(args) => hash_object::run(args),
        Commands::CheckIgnore(args) => check_ignore::run(args),
        Commands::LsFiles(args) => ls_files::run(args),
        Commands::LsTree(args) => ls_tree::run(args),
    }
}

/// Discover the repository from the current directory.
pub fn open_repo() -> Result<Repository> {
    Ok(Repository::discover(".")?)
}

/// Resolve an object argument: a full 40-char OID, or an abbreviated unique
/// prefix across loose and packed storage.
pub fn resolve_object(repo: &Repository, spec: &str) -> Result<ObjectId> {
    if ngit_hash::is_hex_oid(spec) {
        return Ok(ObjectId::from_hex(spec)?);
    }
    Ok(repo.odb().resolve_prefix(spec)?)
}
