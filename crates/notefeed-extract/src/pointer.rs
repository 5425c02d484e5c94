//! Pointer codec
//!
//! Two bech32 variants are understood:
//!
//! - `note1<payload>`: the payload is the bare 32-byte id
//! - `nevent1<payload>`: the payload is a sequence of TLV records
//!   (`0` id, `1` relay hint, `2` author, `3` kind as big-endian u32);
//!   unknown record types are skipped

use crate::error::{DecodeError, EncodeError};
use bech32::{Bech32, Hrp};
use notefeed_model::{PointerKind, Reference};

const TLV_ID: u8 = 0;
const TLV_RELAY: u8 = 1;
const TLV_AUTHOR: u8 = 2;
const TLV_KIND: u8 = 3;

/// Decode `<prefix>1<payload>` text into a reference
///
/// `pointer` is the full token without the `nostr:` scheme.
///
/// # Errors
/// Any checksum, prefix, length or TLV structure failure.
pub fn decode_pointer(pointer: &str) -> Result<Reference, DecodeError> {
    let prefix = pointer
        .split_once('1')
        .map_or(pointer, |(prefix, _)| prefix);
    let kind = PointerKind::from_prefix(prefix)
        .ok_or_else(|| DecodeError::UnsupportedPrefix(prefix.to_string()))?;

    let (hrp, data) = bech32::decode(pointer)?;
    let hrp = hrp.to_string().to_lowercase();
    if hrp != kind.prefix() {
        return Err(DecodeError::UnexpectedPrefix {
            expected: kind.prefix().to_string(),
            actual: hrp,
        });
    }

    let mut reference = Reference {
        pointer: pointer.to_string(),
        pointer_kind: kind,
        target_id: None,
        target_author: None,
        relays: Vec::new(),
        kind: None,
    };

    match kind {
        PointerKind::Note => {
            reference.target_id = Some(hex_32("id", &data)?);
        }
        PointerKind::Event => {
            for (tag, value) in tlv_records(&data)? {
                match tag {
                    TLV_ID if reference.target_id.is_none() => {
                        reference.target_id = Some(hex_32("id", value)?);
                    }
                    TLV_RELAY => {
                        reference
                            .relays
                            .push(String::from_utf8_lossy(value).into_owned());
                    }
                    TLV_AUTHOR if reference.target_author.is_none() => {
                        reference.target_author = Some(hex_32("author", value)?);
                    }
                    TLV_KIND if reference.kind.is_none() => {
                        if let Ok(bytes) = <[u8; 4]>::try_from(value) {
                            reference.kind = Some(u32::from_be_bytes(bytes));
                        }
                    }
                    _ => {}
                }
            }
            if reference.target_id.is_none() {
                return Err(DecodeError::MissingField("id"));
            }
        }
    }

    Ok(reference)
}

fn hex_32(field: &'static str, bytes: &[u8]) -> Result<String, DecodeError> {
    if bytes.len() != 32 {
        return Err(DecodeError::InvalidLength {
            field,
            actual: bytes.len(),
        });
    }
    Ok(hex::encode(bytes))
}

fn tlv_records(data: &[u8]) -> Result<Vec<(u8, &[u8])>, DecodeError> {
    let mut records = Vec::new();
    let mut offset = 0;
    while offset < data.len() {
        let header = data
            .get(offset..offset + 2)
            .ok_or(DecodeError::Truncated(offset))?;
        let (tag, len) = (header[0], usize::from(header[1]));
        let start = offset + 2;
        let value = data
            .get(start..start + len)
            .ok_or(DecodeError::Truncated(offset))?;
        records.push((tag, value));
        offset = start + len;
    }
    Ok(records)
}

/// Encode a bare id as `note1...`
///
/// # Errors
/// Fails if `id` is not 32 bytes of hex.
pub fn encode_note(id: &str) -> Result<String, EncodeError> {
    let bytes = decode_hex_32("id", id)?;
    Ok(bech32::encode::<Bech32>(hrp(PointerKind::Note), &bytes)?)
}

/// Encode an id with optional hints as `nevent1...`
///
/// # Errors
/// Fails if `id`/`author` are not 32 bytes of hex or a relay hint exceeds 255 bytes.
pub fn encode_nevent(
    id: &str,
    author: Option<&str>,
    relays: &[&str],
    kind: Option<u32>,
) -> Result<String, EncodeError> {
    let mut data = Vec::with_capacity(34 * 2 + 6);
    push_record(&mut data, TLV_ID, &decode_hex_32("id", id)?);
    for relay in relays {
        if relay.len() > usize::from(u8::MAX) {
            return Err(EncodeError::RelayTooLong(relay.len()));
        }
        push_record(&mut data, TLV_RELAY, relay.as_bytes());
    }
    if let Some(author) = author {
        push_record(&mut data, TLV_AUTHOR, &decode_hex_32("author", author)?);
    }
    if let Some(kind) = kind {
        push_record(&mut data, TLV_KIND, &kind.to_be_bytes());
    }
    Ok(bech32::encode::<Bech32>(hrp(PointerKind::Event), &data)?)
}

fn hrp(kind: PointerKind) -> Hrp {
    Hrp::parse_unchecked(kind.prefix())
}

fn push_record(data: &mut Vec<u8>, tag: u8, value: &[u8]) {
    data.push(tag);
    // Callers bound every value to 255 bytes
    data.push(u8::try_from(value.len()).unwrap_or(u8::MAX));
    data.extend_from_slice(value);
}

fn decode_hex_32(field: &'static str, value: &str) -> Result<[u8; 32], EncodeError> {
    let bytes = hex::decode(value).map_err(|e| EncodeError::invalid_hex(field, e.to_string()))?;
    <[u8; 32]>::try_from(bytes.as_slice())
        .map_err(|_| EncodeError::invalid_hex(field, format!("expected 32 bytes, got {}", bytes.len())))
}
