use std::io::{self, Write};

use anyhow::Result;
use clap::Args;
use minigit_repository::Repository;

#[derive(Args)]
pub struct InitArgs {}

pub fn run(_args: &InitArgs) -> Result<i32> {
    let repo = Repository::init(".")?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    writeln!(
        out,
        "Initialized empty Git repository in {}",
        repo.git_dir().display()
    )?;

    Ok(0)
}
