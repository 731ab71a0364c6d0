//! Object framing: the `"<kind> <size>\0"` prefix.
//!
//! The framed form (prefix + payload) is the byte sequence that gets hashed
//! for an object's identity and zlib-compressed for its on-disk form, so
//! encoding and decoding here must agree byte-for-byte.

use crate::{ObjectError, ObjectType};

/// Render the `"<kind> <size>\0"` prefix for a payload of `size` bytes.
pub fn encode_prefix(obj_type: ObjectType, size: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(16);
    out.extend_from_slice(obj_type.as_bytes());
    out.push(b' ');
    out.extend_from_slice(size.to_string().as_bytes());
    out.push(0);
    out
}

/// Frame a payload: `"<kind> <size>\0<payload>"`.
pub fn frame(obj_type: ObjectType, content: &[u8]) -> Vec<u8> {
    let mut out = encode_prefix(obj_type, content.len());
    out.extend_from_slice(content);
    out
}

/// Decode the `"<kind> <size>\0"` prefix of a framed object.
///
/// Returns the kind, the declared payload size, and the prefix length
/// (terminator included). The payload itself is not inspected, so this also
/// works on a truncated buffer that holds only the first few dozen bytes.
pub fn decode_prefix(data: &[u8]) -> Result<(ObjectType, usize, usize), ObjectError> {
    let nul_pos = data
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| ObjectError::InvalidHeader("missing null terminator".into()))?;

    let mut fields = data[..nul_pos].splitn(2, |&b| b == b' ');
    let kind = fields
        .next()
        .filter(|k| !k.is_empty())
        .ok_or_else(|| ObjectError::InvalidHeader("empty header".into()))?;
    let size_field = fields
        .next()
        .ok_or_else(|| ObjectError::InvalidHeader("missing space in header".into()))?;

    let obj_type = ObjectType::from_bytes(kind)?;
    let declared = parse_decimal(size_field)?;

    Ok((obj_type, declared, nul_pos + 1))
}

/// Split framed bytes into kind and payload.
///
/// The declared size must match the payload length exactly; anything else
/// means the framing is corrupt.
pub fn split(data: &[u8]) -> Result<(ObjectType, &[u8]), ObjectError> {
    let (obj_type, declared, prefix_len) = decode_prefix(data)?;
    let payload = &data[prefix_len..];
    if payload.len() != declared {
        return Err(ObjectError::SizeMismatch {
            declared,
            actual: payload.len(),
        });
    }
    Ok((obj_type, payload))
}

/// ASCII decimal with overflow checking. Sizes in object headers carry no
/// sign, no leading whitespace, and no digit separators.
fn parse_decimal(field: &[u8]) -> Result<usize, ObjectError> {
    if field.is_empty() {
        return Err(ObjectError::InvalidHeader("empty size field".into()));
    }
    let mut value: usize = 0;
    for &b in field {
        if !b.is_ascii_digit() {
            return Err(ObjectError::InvalidHeader(format!(
                "invalid size: {}",
                String::from_utf8_lossy(field)
            )));
        }
        value = value
            .checked_mul(10)
            .and_then(|v| v.checked_add(usize::from(b - b'0')))
            .ok_or_else(|| ObjectError::InvalidHeader("size overflows usize".into()))?;
    }
    Ok(value)
}
