//! Upload-pack client: request a pack for the wanted commit and locate the
//! pack bytes in the response.

use log::debug;
use minigit_hash::ObjectId;
use minigit_transport::{http, GitUrl};

use crate::pktline::PktLineWriter;
use crate::ProtocolError;

/// Build the upload-pack request body:
///
/// ```text
/// pkt("want <40-hex>\n") flush pkt("done\n") flush
/// ```
pub fn build_upload_pack_request(want: &ObjectId) -> Result<Vec<u8>, ProtocolError> {
    let mut body = Vec::new();
    let mut writer = PktLineWriter::new(&mut body);

    writer.write_text(&format!("want {}", want))?;
    writer.write_flush()?;
    writer.write_text("done")?;
    writer.write_flush()?;

    Ok(body)
}

/// Locate the raw pack bytes in an upload-pack response.
///
/// The response opens with a short pkt-line acknowledgment (`NAK` for a
/// full clone) followed by the pack stream; the pack is found by scanning
/// for the `PACK` magic.
pub fn extract_pack(response: &[u8]) -> Result<&[u8], ProtocolError> {
    let start = response
        .windows(4)
        .position(|w| w == b"PACK")
        .ok_or_else(|| ProtocolError::Protocol("no PACK data in upload-pack response".into()))?;
    Ok(&response[start..])
}

/// Request the pack containing everything reachable from `want`.
///
/// Returns the raw pack bytes, trailer included, ready for unpacking.
pub fn fetch_pack(url: &GitUrl, want: &ObjectId) -> Result<Vec<u8>, ProtocolError> {
    let request = build_upload_pack_request(want)?;
    let response = http::upload_pack(url, request)?;
    let pack = extract_pack(&response)?;
    debug!("received pack: {} bytes", pack.len());
    Ok(pack.to_vec())
}
