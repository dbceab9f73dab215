//! Decoder - Wire Framing
//!
//! Reverses `"0" + base64std(zlib(json))` into a generic JSON document.
//! Each stage aborts the decode on failure. No partial results.

use std::io::Write;

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use flate2::write::ZlibEncoder;
use flate2::{Compression, Decompress, FlushDecompress, Status};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::ParserConfig;
use crate::FORMAT_MARKER;

/// Standard alphabet, `=` padding optional on decode, always written on encode.
const BLUEPRINT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

const INFLATE_CHUNK: usize = 32 * 1024;

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("Missing version marker")]
    MissingMarker,

    #[error("Unsupported version marker: {found:?}")]
    UnsupportedMarker { found: char },

    #[error("Invalid encoding: {0}")]
    InvalidEncoding(#[from] base64::DecodeError),

    #[error("Decompression failure: {0}")]
    Decompression(#[from] flate2::DecompressError),

    #[error("Decompression failure: stream ended before completion")]
    TruncatedStream,

    #[error("Decompression failure: payload exceeds {limit} bytes")]
    DecompressedTooLarge { limit: usize },

    #[error("Malformed document: {0}")]
    MalformedDocument(#[from] serde_json::Error),
}

impl FormatError {
    /// Stable, caller-facing cause shared by every variant of one stage.
    pub fn reason(&self) -> &'static str {
        match self {
            FormatError::MissingMarker | FormatError::UnsupportedMarker { .. } => {
                "unsupported or missing version marker"
            }
            FormatError::InvalidEncoding(_) => "invalid encoding",
            FormatError::Decompression(_)
            | FormatError::TruncatedStream
            | FormatError::DecompressedTooLarge { .. } => "decompression failure",
            FormatError::MalformedDocument(_) => "malformed document",
        }
    }
}

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Compression error: {0}")]
    Compression(#[from] std::io::Error),
}

/// Decode a blueprint string with the default limits.
pub fn decode(raw: &str) -> Result<Value, FormatError> {
    decode_with(raw, &ParserConfig::default())
}

/// Decode a blueprint string.
///
/// Stages run in order: marker check, base64, zlib inflate, JSON parse.
pub fn decode_with(raw: &str, config: &ParserConfig) -> Result<Value, FormatError> {
    let payload = strip_marker(raw)?;

    let compressed = BLUEPRINT_BASE64.decode(payload)?;
    debug!(encoded = payload.len(), compressed = compressed.len(), "base64 decoded");

    let json = inflate(&compressed, config.max_decompressed_bytes)?;
    debug!(inflated = json.len(), "payload inflated");

    let document = serde_json::from_slice(&json)?;
    Ok(document)
}

/// Encode a document into a blueprint string.
pub fn encode<T: Serialize>(document: &T) -> Result<String, EncodeError> {
    let json = serde_json::to_vec(document)?;

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&json)?;
    let compressed = encoder.finish()?;

    let mut raw = String::with_capacity(1 + compressed.len().div_ceil(3) * 4);
    raw.push(FORMAT_MARKER);
    BLUEPRINT_BASE64.encode_string(&compressed, &mut raw);
    Ok(raw)
}

fn strip_marker(raw: &str) -> Result<&str, FormatError> {
    let mut chars = raw.chars();
    match chars.next() {
        None => Err(FormatError::MissingMarker),
        Some(FORMAT_MARKER) => Ok(chars.as_str()),
        Some(found) => Err(FormatError::UnsupportedMarker { found }),
    }
}

/// Inflate a complete zlib stream. A stream that stops before its end marker is
/// rejected rather than returned partially.
fn inflate(compressed: &[u8], limit: Option<usize>) -> Result<Vec<u8>, FormatError> {
    let mut inflater = Decompress::new(true);
    let initial = compressed.len().saturating_mul(4);
    let mut output = Vec::with_capacity(limit.map_or(initial, |l| initial.min(l.saturating_add(1))));

    loop {
        if output.len() == output.capacity() {
            output.reserve(INFLATE_CHUNK);
        }

        let before_in = inflater.total_in();
        let before_out = inflater.total_out();
        let input = &compressed[before_in as usize..];
        let status = inflater.decompress_vec(input, &mut output, FlushDecompress::None)?;

        if let Some(limit) = limit {
            if output.len() > limit {
                warn!(limit, "decompressed payload exceeds limit");
                return Err(FormatError::DecompressedTooLarge { limit });
            }
        }

        match status {
            Status::StreamEnd => return Ok(output),
            Status::Ok | Status::BufError => {
                let stalled = inflater.total_in() == before_in && inflater.total_out() == before_out;
                if stalled {
                    return Err(FormatError::TruncatedStream);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn frame(bytes: &[u8]) -> String {
        format!("0{}", BLUEPRINT_BASE64.encode(bytes))
    }

    fn zlib(bytes: &[u8]) -> Vec<u8> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(bytes).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_decode_encoded_document() {
        let doc = json!({"blueprint": {"label": "Test Blueprint", "entities": []}});
        let raw = encode(&doc).unwrap();

        assert!(raw.starts_with('0'));
        assert_eq!(decode(&raw).unwrap(), doc);
    }

    #[test]
    fn test_empty_string_missing_marker() {
        let err = decode("").unwrap_err();
        assert!(matches!(err, FormatError::MissingMarker));
        assert_eq!(err.reason(), "unsupported or missing version marker");
    }

    #[test]
    fn test_unknown_marker_rejected() {
        let raw = encode(&json!({})).unwrap();
        let swapped = format!("1{}", &raw[1..]);

        let err = decode(&swapped).unwrap_err();
        assert!(matches!(err, FormatError::UnsupportedMarker { found: '1' }));
    }

    #[test]
    fn test_invalid_alphabet() {
        let err = decode("0!@#$%^&*()").unwrap_err();
        assert!(matches!(err, FormatError::InvalidEncoding(_)));
        assert_eq!(err.reason(), "invalid encoding");
    }

    #[test]
    fn test_padding_optional() {
        let doc = json!({"blueprint": {}});
        let raw = encode(&doc).unwrap();
        let unpadded = raw.trim_end_matches('=');

        assert_eq!(decode(unpadded).unwrap(), doc);
    }

    #[test]
    fn test_not_zlib() {
        let err = decode(&frame(b"not a zlib stream")).unwrap_err();
        assert!(matches!(err, FormatError::Decompression(_)));
        assert_eq!(err.reason(), "decompression failure");
    }

    #[test]
    fn test_truncated_stream() {
        let compressed = zlib(br#"{"blueprint": {"label": "cut short"}}"#);
        let cut = &compressed[..compressed.len() - 6];

        let err = decode(&frame(cut)).unwrap_err();
        assert_eq!(err.reason(), "decompression failure");
    }

    #[test]
    fn test_empty_payload() {
        let err = decode("0").unwrap_err();
        assert!(matches!(err, FormatError::TruncatedStream));
    }

    #[test]
    fn test_malformed_json() {
        let err = decode(&frame(&zlib(b"{\"blueprint\": "))).unwrap_err();
        assert!(matches!(err, FormatError::MalformedDocument(_)));
        assert_eq!(err.reason(), "malformed document");
    }

    #[test]
    fn test_invalid_utf8_is_malformed() {
        let err = decode(&frame(&zlib(&[0xff, 0xfe, 0x7b]))).unwrap_err();
        assert_eq!(err.reason(), "malformed document");
    }

    #[test]
    fn test_decompression_cap() {
        let doc = json!({"blueprint": {"description": "x".repeat(4096)}});
        let raw = encode(&doc).unwrap();

        let err = decode_with(&raw, &ParserConfig::with_max_decompressed_bytes(1024)).unwrap_err();
        assert!(matches!(err, FormatError::DecompressedTooLarge { limit: 1024 }));

        assert_eq!(decode_with(&raw, &ParserConfig::unbounded()).unwrap(), doc);
    }

    #[test]
    fn test_large_payload_inflates_across_chunks() {
        let doc = json!({"blueprint": {"description": "ab".repeat(INFLATE_CHUNK * 3)}});
        let raw = encode(&doc).unwrap();

        assert_eq!(decode(&raw).unwrap(), doc);
    }
}
