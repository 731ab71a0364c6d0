use std::io::{self, Write};

use anyhow::{anyhow, Result};
use bstr::ByteSlice;
use clap::Args;
use minigit_hash::ObjectId;
use minigit_object::Object;

use super::open_repo;

#[derive(Args)]
pub struct LsTreeArgs {
    /// List only filenames
    #[arg(long)]
    name_only: bool,

    /// Tree object ID (40 hex digits)
    tree: String,
}

pub fn run(args: &LsTreeArgs) -> Result<i32> {
    let repo = open_repo()?;
    let oid = ObjectId::from_hex(&args.tree)
        .map_err(|_| anyhow!("not a valid object name: {}", args.tree))?;

    let tree = match repo.store().read(&oid)? {
        Some(Object::Tree(t)) => t,
        Some(other) => {
            return Err(anyhow!(
                "not a tree object: {} is a {}",
                oid,
                other.object_type()
            ))
        }
        None => return Err(anyhow!("object not found: {}", oid)),
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();

    for entry in tree.iter() {
        if args.name_only {
            writeln!(out, "{}", entry.name.as_bstr())?;
        } else {
            let type_name = if entry.mode.is_tree() {
                "tree"
            } else if entry.mode.is_gitlink() {
                "commit"
            } else {
                "blob"
            };
            writeln!(
                out,
                "{:06o} {} {}\t{}",
                entry.mode.raw(),
                type_name,
                entry.oid,
                entry.name.as_bstr(),
            )?;
        }
    }

    Ok(0)
}
