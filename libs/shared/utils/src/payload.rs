use base64::{engine::general_purpose::STANDARD, Engine};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum PayloadError {
    #[error("invalid base64: {0}")]
    Encoding(#[from] base64::DecodeError),
    #[error("file is empty")]
    Empty,
}

/// Decodes a base64 upload, accepting an optional `data:<mime>;base64,` prefix.
pub fn decode_base64_payload(file_data: &str) -> Result<Vec<u8>, PayloadError> {
    let payload = file_data
        .split_once(";base64,")
        .map(|(_, data)| data)
        .unwrap_or(file_data);

    let bytes = STANDARD.decode(payload.trim())?;
    if bytes.is_empty() {
        return Err(PayloadError::Empty);
    }
    Ok(bytes)
}
