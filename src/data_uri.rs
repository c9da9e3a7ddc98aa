//! `data:<mime>;base64,<payload>` strings.

use base64::{Engine, engine::general_purpose::STANDARD};

use crate::error::CropError;

const SCHEME: &str = "data:";
const BASE64_MARKER: &str = ";base64";

pub fn encode(mime_type: &str, bytes: &[u8]) -> String {
    format!("{SCHEME}{mime_type}{BASE64_MARKER},{}", STANDARD.encode(bytes))
}

pub fn is_data_uri(source: &str) -> bool {
    source
        .get(..SCHEME.len())
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case(SCHEME))
}

/// Splits a base64 data URI into its media type and decoded payload.
pub fn decode(uri: &str) -> Result<(String, Vec<u8>), CropError> {
    if !is_data_uri(uri) {
        return Err(CropError::InvalidDataUri("missing data: scheme".into()));
    }
    let (header, payload) = uri[SCHEME.len()..]
        .split_once(',')
        .ok_or_else(|| CropError::InvalidDataUri("missing ',' separator".into()))?;
    let mime_type = header
        .strip_suffix(BASE64_MARKER)
        .ok_or_else(|| CropError::InvalidDataUri("only base64 payloads are supported".into()))?;
    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| CropError::InvalidDataUri(e.to_string()))?;
    Ok((mime_type.to_owned(), bytes))
}
