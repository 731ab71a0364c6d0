use std::io::{self, Write};

use anyhow::{anyhow, bail, Result};
use bstr::BString;
use clap::Args;
use minigit_hash::ObjectId;
use minigit_object::{Commit, ObjectType};
use minigit_utils::date::{GitDate, Signature};

use super::open_repo;

#[derive(Args)]
pub struct CommitTreeArgs {
    /// Tree object ID
    tree: String,

    /// Parent commit(s)
    #[arg(short = 'p', num_args = 1, value_name = "parent")]
    parent: Vec<String>,

    /// Commit message
    #[arg(short = 'm', required = true)]
    message: String,
}

pub fn run(args: &CommitTreeArgs) -> Result<i32> {
    let repo = open_repo()?;
    let store = repo.store();

    let tree_oid = ObjectId::from_hex(&args.tree)
        .map_err(|_| anyhow!("not a valid object name: {}", args.tree))?;
    if !store.contains(&tree_oid) {
        bail!("not a valid object name: {}", args.tree);
    }

    let parents: Vec<ObjectId> = args
        .parent
        .iter()
        .map(|p| {
            ObjectId::from_hex(p).map_err(|_| anyhow!("not a valid object name: {}", p))
        })
        .collect::<Result<_>>()?;

    let mut message = BString::from(args.message.as_str());
    if !message.ends_with(b"\n") {
        message.push(b'\n');
    }

    let author = signature_from_env("GIT_AUTHOR_NAME", "GIT_AUTHOR_EMAIL", "GIT_AUTHOR_DATE")?;
    let committer = signature_from_env(
        "GIT_COMMITTER_NAME",
        "GIT_COMMITTER_EMAIL",
        "GIT_COMMITTER_DATE",
    )?;

    let commit = Commit {
        tree: tree_oid,
        parents,
        author,
        committer,
        message,
    };

    let oid = store.write_raw(ObjectType::Commit, &commit.serialize_content())?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "{oid}")?;

    Ok(0)
}

/// Build an identity from the standard environment variables, with the date
/// in raw `"<secs> <±HHMM>"` format, defaulting to the current time.
fn signature_from_env(name_var: &str, email_var: &str, date_var: &str) -> Result<Signature> {
    let name = std::env::var(name_var).unwrap_or_else(|_| "Unknown".to_string());
    let email = std::env::var(email_var).unwrap_or_else(|_| "unknown@unknown".to_string());

    let date = match std::env::var(date_var) {
        Ok(raw) => GitDate::parse_raw(&raw)?,
        Err(_) => GitDate::now(),
    };

    Ok(Signature {
        name: BString::from(name),
        email: BString::from(email),
        date,
    })
}
