//! Refs discovery: fetch and parse the `/info/refs` advertisement.

use bstr::{BStr, BString, ByteSlice};
use log::debug;
use minigit_hash::ObjectId;
use minigit_transport::{http, GitUrl};

use crate::pktline::{PktLine, PktLineReader};
use crate::ProtocolError;

/// The parsed ref advertisement from a remote.
#[derive(Debug, Default)]
pub struct RefAdvertisement {
    /// Advertised refs in wire order: (OID, refname).
    pub refs: Vec<(ObjectId, BString)>,
    /// The server's capability string (opaque here; the first advertised
    /// line carries it after a NUL byte).
    pub capabilities: String,
}

impl RefAdvertisement {
    /// Look up a ref by exact name.
    pub fn get(&self, name: &str) -> Option<ObjectId> {
        self.refs
            .iter()
            .find(|(_, n)| n.as_bstr() == BStr::new(name))
            .map(|(oid, _)| *oid)
    }

    /// The OID advertised for `HEAD`, if any.
    pub fn head(&self) -> Option<ObjectId> {
        self.get("HEAD")
    }
}

/// Fetch and parse `<remote>/info/refs?service=git-upload-pack`.
pub fn discover_refs(url: &GitUrl) -> Result<RefAdvertisement, ProtocolError> {
    let body = http::info_refs(url)?;
    let mut reader = PktLineReader::new(&body[..]);
    let advert = parse_ref_advertisement(&mut reader)?;
    debug!("discovered {} refs from {}", advert.refs.len(), url);
    Ok(advert)
}

/// Parse a v1 ref advertisement from a pkt-line stream.
///
/// Over smart HTTP the stream opens with a `# service=git-upload-pack` line
/// and a flush before the refs; both are skipped. The first real line carries
/// the capability list after a NUL byte, and its ref name is `HEAD`.
pub fn parse_ref_advertisement<R: std::io::Read>(
    reader: &mut PktLineReader<R>,
) -> Result<RefAdvertisement, ProtocolError> {
    let mut advert = RefAdvertisement::default();
    let mut after_service = false;
    let mut first_ref = true;

    loop {
        match reader.read_pkt()? {
            PktLine::Flush => {
                // The flush right after the service announcement separates
                // it from the ref section; any other flush ends the refs.
                if after_service {
                    after_service = false;
                    continue;
                }
                break;
            }
            PktLine::Data(data) => {
                let line = strip_newline(&data);

                if line.starts_with(b"#") {
                    after_service = true;
                    continue;
                }
                if line.is_empty() {
                    continue;
                }

                let line = if first_ref {
                    first_ref = false;
                    match line.iter().position(|&b| b == 0) {
                        Some(nul_pos) => {
                            advert.capabilities =
                                String::from_utf8_lossy(&line[nul_pos + 1..]).into_owned();
                            &line[..nul_pos]
                        }
                        None => line,
                    }
                } else {
                    line
                };

                parse_ref_line(line, &mut advert.refs)?;
            }
        }
    }

    Ok(advert)
}

/// Parse a single ref advertisement line: `<40-hex-oid> <refname>`
fn parse_ref_line(
    line: &[u8],
    refs: &mut Vec<(ObjectId, BString)>,
) -> Result<(), ProtocolError> {
    let space_pos = line.iter().position(|&b| b == b' ').ok_or_else(|| {
        ProtocolError::Protocol(format!(
            "invalid ref line (no space): {}",
            String::from_utf8_lossy(line)
        ))
    })?;

    let oid_hex = &line[..space_pos];
    let refname = &line[space_pos + 1..];

    let oid_str = std::str::from_utf8(oid_hex)
        .map_err(|_| ProtocolError::Protocol("invalid UTF-8 in OID".into()))?;

    let oid = ObjectId::from_hex(oid_str).map_err(|e| {
        ProtocolError::Protocol(format!("invalid OID in ref advertisement: {}", e))
    })?;

    refs.push((oid, BString::from(refname)));
    Ok(())
}

fn strip_newline(data: &[u8]) -> &[u8] {
    if data.last() == Some(&b'\n') {
        &data[..data.len() - 1]
    } else {
        data
    }
}
