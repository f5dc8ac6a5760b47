//! `data:` URI parsing for captured camera frames.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;

/// Why a string is not an acceptable image data URI.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DataUriError {
    /// Missing the `data:` scheme.
    #[error("not a data URI")]
    MissingScheme,

    /// No `,` separating the header from the payload.
    #[error("data URI has no payload")]
    MissingPayload,

    /// Only base64 payloads are accepted.
    #[error("data URI payload is not base64-encoded")]
    NotBase64,

    /// Media type is absent or not `image/*`.
    #[error("unsupported media type: {0:?}")]
    UnsupportedMediaType(String),

    /// Payload could not be decoded.
    #[error("invalid base64 payload: {0}")]
    InvalidPayload(String),

    /// Payload decodes to zero bytes.
    #[error("image payload is empty")]
    EmptyPayload,
}

/// A parsed `data:<mime>;base64,<payload>` image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    media_type: String,
    data: String,
}

impl DataUri {
    /// Parses and validates an image data URI.
    ///
    /// # Errors
    ///
    /// Returns [`DataUriError`] if the string is not a base64 `image/*`
    /// data URI or its payload does not decode.
    pub fn parse(uri: &str) -> Result<Self, DataUriError> {
        let rest = uri
            .trim()
            .strip_prefix("data:")
            .ok_or(DataUriError::MissingScheme)?;
        let (header, payload) = rest.split_once(',').ok_or(DataUriError::MissingPayload)?;

        let mut params = header.split(';');
        let media_type = params.next().unwrap_or_default().trim().to_ascii_lowercase();
        if !params.any(|p| p.trim().eq_ignore_ascii_case("base64")) {
            return Err(DataUriError::NotBase64);
        }
        if !media_type.starts_with("image/") || media_type.len() == "image/".len() {
            return Err(DataUriError::UnsupportedMediaType(media_type));
        }

        let decoded = STANDARD
            .decode(payload.trim())
            .map_err(|e| DataUriError::InvalidPayload(e.to_string()))?;
        if decoded.is_empty() {
            return Err(DataUriError::EmptyPayload);
        }

        Ok(Self {
            media_type,
            data: payload.trim().to_string(),
        })
    }

    /// Builds a data URI from raw image bytes.
    #[must_use]
    pub fn from_bytes(media_type: &str, bytes: &[u8]) -> Self {
        Self {
            media_type: media_type.to_ascii_lowercase(),
            data: STANDARD.encode(bytes),
        }
    }

    /// Media type, e.g. `image/jpeg`.
    #[must_use]
    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    /// The base64 payload.
    #[must_use]
    pub fn data(&self) -> &str {
        &self.data
    }

    /// Decodes the payload.
    ///
    /// # Errors
    ///
    /// Returns [`DataUriError::InvalidPayload`] if the payload is not valid
    /// base64 (only possible for values not built through [`Self::parse`]).
    pub fn bytes(&self) -> Result<Vec<u8>, DataUriError> {
        STANDARD
            .decode(&self.data)
            .map_err(|e| DataUriError::InvalidPayload(e.to_string()))
    }
}

impl std::fmt::Display for DataUri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "data:{};base64,{}", self.media_type, self.data)
    }
}
