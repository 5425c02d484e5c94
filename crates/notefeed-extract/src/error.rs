//! Error types for pointer decoding and encoding
//!
//! Decoding errors never leave the extractor: a pointer that fails to
//! decode is dropped from the extraction result.

/// Errors while decoding an embedded pointer
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// Bech32 checksum or charset failure
    #[error("bech32 decode failed: {0}")]
    Bech32(#[from] bech32::DecodeError),

    /// Human-readable part does not match the textual prefix
    #[error("unexpected prefix: expected {expected}, got {actual}")]
    UnexpectedPrefix { expected: String, actual: String },

    /// Prefix is not a supported pointer variant
    #[error("unsupported pointer prefix: '{0}'")]
    UnsupportedPrefix(String),

    /// Fixed-size field has the wrong length
    #[error("invalid {field} length: expected 32, got {actual}")]
    InvalidLength { field: &'static str, actual: usize },

    /// Required TLV record missing
    #[error("missing {0} record")]
    MissingField(&'static str),

    /// TLV record runs past the end of the payload
    #[error("truncated record at offset {0}")]
    Truncated(usize),
}

/// Errors while encoding a pointer
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    /// Id or author is not 32 bytes of hex
    #[error("invalid hex {field}: {message}")]
    InvalidHex { field: &'static str, message: String },

    /// Relay hint longer than a TLV record can carry
    #[error("relay hint too long: {0} bytes")]
    RelayTooLong(usize),

    /// Underlying bech32 encoder failed
    #[error("bech32 encode failed: {0}")]
    Bech32(#[from] bech32::EncodeError),
}

impl EncodeError {
    pub(crate) fn invalid_hex(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidHex {
            field,
            message: message.into(),
        }
    }
}
