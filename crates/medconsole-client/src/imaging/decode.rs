use std::sync::Arc;

use base64::Engine as _;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use thiserror::Error;
use tracing::warn;

use super::resource::{Blob, DICOM_MIME, ResourceHandle, ResourceStore};

/// Shortest cleaned payload worth decoding. Anything smaller cannot hold a
/// Part 10 preamble and header.
pub const MIN_PAYLOAD_CHARS: usize = 100;

const STANDARD_ANY_PADDING: GeneralPurpose = GeneralPurpose::new(
    &base64::alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Image payload is empty")]
    Empty,

    #[error("Image payload is too short ({len} characters, need at least {min})")]
    TooShort { len: usize, min: usize },

    #[error("Image payload is not valid Base64: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("Image payload decoded to zero bytes")]
    EmptyBinary,
}

/// Strips an optional data-URL prefix and every whitespace character.
pub fn clean_payload(raw: &str) -> String {
    let raw = raw.trim();
    let body = raw.split_once("base64,").map_or(raw, |(_, rest)| rest);
    body.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Decodes a Base64 payload to bytes without allocating a resource.
pub fn decode_bytes(raw: &str) -> Result<Vec<u8>, DecodeError> {
    if raw.trim().is_empty() {
        return Err(DecodeError::Empty);
    }
    let cleaned = clean_payload(raw);
    if cleaned.len() < MIN_PAYLOAD_CHARS {
        return Err(DecodeError::TooShort {
            len: cleaned.len(),
            min: MIN_PAYLOAD_CHARS,
        });
    }
    let bytes = STANDARD_ANY_PADDING.decode(cleaned.as_bytes())?;
    if bytes.is_empty() {
        return Err(DecodeError::EmptyBinary);
    }
    Ok(bytes)
}

/// Decodes `raw` and registers the bytes with `store` as an
/// `application/dicom` blob. Nothing is allocated on failure.
pub fn decode_payload(
    raw: &str,
    store: &Arc<dyn ResourceStore>,
) -> Result<ResourceHandle, DecodeError> {
    let bytes = decode_bytes(raw).inspect_err(|e| warn!(error = %e, "Image payload rejected"))?;
    Ok(ResourceHandle::allocate(store, Blob::new(DICOM_MIME, bytes)))
}
