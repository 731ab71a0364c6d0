pub mod cat_file;
pub mod clone;
pub mod commit_tree;
pub mod hash_object;
pub mod init;
pub mod ls_tree;
pub mod write_tree;

use anyhow::Result;
use clap::Subcommand;

use crate::Cli;

#[derive(Subcommand)]
pub enum Commands {
    /// Create an empty repository in the current directory
    Init(init::InitArgs),
    /// Provide content, type, or size for a repository object
    CatFile(cat_file::CatFileArgs),
    /// Compute an object ID and optionally create a blob from a file
    HashObject(hash_object::HashObjectArgs),
    /// List the contents of a tree object
    LsTree(ls_tree::LsTreeArgs),
    /// Create a tree object from the current index
    WriteTree(write_tree::WriteTreeArgs),
    /// Create a new commit object
    CommitTree(commit_tree::CommitTreeArgs),
    /// Clone a repository over smart HTTP into a new directory
    Clone(clone::CloneArgs),
}

pub fn open_repo() -> Result<minigit_repository::Repository> {
    Ok(minigit_repository::Repository::discover(".")?)
}

pub fn run(cli: Cli) -> Result<i32> {
    match &cli.command {
        Commands::Init(args) => init::run(args),
        Commands::CatFile(args) => cat_file::run(args),
        Commands::HashObject(args) => hash_object::run(args),
        Commands::LsTree(args) => ls_tree::run(args),
        Commands::WriteTree(args) => write_tree::run(args),
        Commands::CommitTree(args) => commit_tree::run(args),
        Commands::Clone(args) => clone::run(args),
    }
}
