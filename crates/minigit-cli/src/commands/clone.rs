use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{bail, Result};
use bstr::ByteSlice;
use clap::Args;
use minigit_hash::ObjectId;
use minigit_protocol::{fetch, refs::RefAdvertisement};
use minigit_repository::Repository;
use minigit_transport::GitUrl;

#[derive(Args)]
pub struct CloneArgs {
    /// Repository URL (http or https)
    repository: String,

    /// Destination directory
    directory: String,
}

pub fn run(args: &CloneArgs) -> Result<i32> {
    let dest = PathBuf::from(&args.directory);
    if dest.exists() && std::fs::read_dir(&dest)?.next().is_some() {
        bail!(
            "destination path '{}' already exists and is not an empty directory",
            dest.display()
        );
    }

    let stderr = io::stderr();
    let mut err = stderr.lock();
    writeln!(err, "Cloning into '{}'...", dest.display())?;

    let url = GitUrl::parse(&args.repository)?;

    // Refs discovery, then the want/done exchange for HEAD.
    let advert = minigit_protocol::refs::discover_refs(&url)?;
    let Some(head_oid) = advert.head() else {
        bail!("remote advertised no HEAD: nothing to clone");
    };

    std::fs::create_dir_all(&dest)?;
    let repo = Repository::init(&dest)?;

    let pack = fetch::fetch_pack(&url, &head_oid)?;
    let oids = minigit_pack::unpack::unpack_into(&pack, repo.store())?;
    writeln!(err, "Receiving objects: {} objects unpacked.", oids.len())?;

    // Point HEAD at the remote's default branch and materialize it.
    let branch_ref = determine_branch(&advert, &head_oid);
    repo.write_ref(&branch_ref, &head_oid)?;
    repo.set_head_symbolic(&branch_ref)?;

    minigit_repository::checkout_commit(&repo, &head_oid)?;

    Ok(0)
}

/// Pick the branch HEAD should follow: the `symref=HEAD:...` capability when
/// the server sends one, otherwise the first `refs/heads/*` advertisement
/// matching HEAD's object ID, otherwise the default branch name.
fn determine_branch(advert: &RefAdvertisement, head_oid: &ObjectId) -> String {
    for cap in advert.capabilities.split(' ') {
        if let Some(target) = cap.strip_prefix("symref=HEAD:") {
            if target.starts_with("refs/heads/") {
                return target.to_string();
            }
        }
    }

    for (oid, name) in &advert.refs {
        if oid == head_oid && name.starts_with(b"refs/heads/") {
            return name.to_str_lossy().into_owned();
        }
    }

    format!("refs/heads/{}", minigit_repository::DEFAULT_BRANCH)
}
