//! Smart HTTP request/response plumbing.
//!
//! The smart protocol needs exactly two HTTP exchanges per clone:
//! a GET of `/info/refs?service=git-upload-pack` and a POST of the
//! want/done request to `/git-upload-pack`. Both responses are buffered
//! fully in memory before the caller parses them.

use log::debug;

use crate::{GitUrl, TransportError};

const UPLOAD_PACK: &str = "git-upload-pack";

fn client() -> Result<reqwest::blocking::Client, TransportError> {
    Ok(reqwest::blocking::Client::builder()
        .user_agent(concat!("minigit/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

/// Check the response status, mapping non-success to `TransportError::Http`.
fn check_status(resp: &reqwest::blocking::Response) -> Result<(), TransportError> {
    let status = resp.status();
    if !status.is_success() {
        return Err(TransportError::Http {
            status: status.as_u16(),
            message: status
                .canonical_reason()
                .unwrap_or("unknown status")
                .to_string(),
        });
    }
    Ok(())
}

/// GET `<remote>/info/refs?service=git-upload-pack`, returning the raw body.
pub fn info_refs(url: &GitUrl) -> Result<Vec<u8>, TransportError> {
    let endpoint = format!("{}/info/refs?service={}", url.base(), UPLOAD_PACK);
    debug!("GET {endpoint}");

    let resp = client()?.get(&endpoint).send()?;
    check_status(&resp)?;

    let body = resp.bytes()?.to_vec();
    debug!("info/refs response: {} bytes", body.len());
    Ok(body)
}

/// POST the upload-pack request body, returning the raw response body
/// (acknowledgment pkt-lines followed by the pack stream).
pub fn upload_pack(url: &GitUrl, body: Vec<u8>) -> Result<Vec<u8>, TransportError> {
    let endpoint = format!("{}/{}", url.base(), UPLOAD_PACK);
    debug!("POST {endpoint} ({} bytes)", body.len());

    let resp = client()?
        .post(&endpoint)
        .header("Content-Type", format!("application/x-{UPLOAD_PACK}-request"))
        .header("Accept", format!("application/x-{UPLOAD_PACK}-result"))
        .body(body)
        .send()?;
    check_status(&resp)?;

    let body = resp.bytes()?.to_vec();
    debug!("upload-pack response: {} bytes", body.len());
    Ok(body)
}
