use std::io::{self, Write};

use anyhow::{anyhow, bail, Result};
use bstr::ByteSlice;
use clap::Args;
use minigit_hash::ObjectId;
use minigit_object::Object;

use super::open_repo;

#[derive(Args)]
pub struct CatFileArgs {
    /// Show object type
    #[arg(short = 't', conflicts_with_all = ["size", "pretty"])]
    type_only: bool,

    /// Show object size
    #[arg(short = 's', conflicts_with_all = ["type_only", "pretty"])]
    size: bool,

    /// Pretty-print the object content
    #[arg(short = 'p', conflicts_with_all = ["type_only", "size"])]
    pretty: bool,

    /// Object ID (40 hex digits)
    object: String,
}

pub fn run(args: &CatFileArgs) -> Result<i32> {
    let repo = open_repo()?;
    let store = repo.store();
    let oid = ObjectId::from_hex(&args.object)
        .map_err(|_| anyhow!("not a valid object name: {}", args.object))?;

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if args.type_only || args.size {
        let (obj_type, size) = store
            .read_header(&oid)?
            .ok_or_else(|| anyhow!("object not found: {}", oid))?;
        if args.type_only {
            writeln!(out, "{obj_type}")?;
        } else {
            writeln!(out, "{size}")?;
        }
        return Ok(0);
    }

    if !args.pretty {
        bail!("one of -t, -s, or -p is required");
    }

    let obj = store
        .read(&oid)?
        .ok_or_else(|| anyhow!("object not found: {}", oid))?;
    pretty_print(&obj, &mut out)?;
    Ok(0)
}

fn pretty_print(obj: &Object, out: &mut impl Write) -> Result<()> {
    match obj {
        Object::Blob(blob) => {
            out.write_all(&blob.data)?;
        }
        Object::Tree(tree) => {
            for entry in tree.iter() {
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
        // Commit and tag payloads are already readable text.
        Object::Commit(_) | Object::Tag(_) => {
            out.write_all(&obj.serialize_content())?;
        }
    }
    Ok(())
}
