use std::io::{self, Write};

use anyhow::Result;
use clap::Args;
use minigit_index::Index;

use super::open_repo;

#[derive(Args)]
pub struct WriteTreeArgs {}

pub fn run(_args: &WriteTreeArgs) -> Result<i32> {
    let repo = open_repo()?;

    let index = Index::read_from(repo.index_path())?;
    let oid = index.write_tree(repo.store())?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "{oid}")?;

    Ok(0)
}
