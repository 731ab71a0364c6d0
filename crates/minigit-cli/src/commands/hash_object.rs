use std::io::{self, Read, Write};

use anyhow::{bail, Result};
use clap::Args;
use minigit_hash::hasher::Hasher;
use minigit_object::ObjectType;

use super::open_repo;

#[derive(Args)]
pub struct HashObjectArgs {
    /// Actually write the object into the object database
    #[arg(short = 'w')]
    write: bool,

    /// Read the object from stdin instead of a file
    #[arg(long)]
    stdin: bool,

    /// File to hash
    #[arg(value_name = "file", required_unless_present = "stdin")]
    file: Option<String>,
}

pub fn run(args: &HashObjectArgs) -> Result<i32> {
    let data = if args.stdin {
        let mut buf = Vec::new();
        io::stdin().read_to_end(&mut buf)?;
        buf
    } else {
        match &args.file {
            Some(file) => std::fs::read(file)?,
            None => bail!("no input: pass a file or --stdin"),
        }
    };

    // Hashing alone needs no repository; only -w does.
    let oid = if args.write {
        let repo = open_repo()?;
        repo.store().write_raw(ObjectType::Blob, &data)?
    } else {
        Hasher::hash_object("blob", &data)
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "{oid}")?;

    Ok(0)
}
