//! Raster transport encoding.
//!
//! Rasters cross every public boundary as data URLs:
//! `data:<media-type>;base64,<payload>`. The media type travels with the
//! bytes so receivers never have to guess the container format.

use std::fmt;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Media type used for every raster the engine produces.
pub const PNG_MEDIA_TYPE: &str = "image/png";

/// An encoded raster: media type plus container bytes.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EncodedRaster {
    media_type: String,
    payload: Vec<u8>,
}

impl EncodedRaster {
    /// Wrap already-encoded container bytes.
    pub fn from_bytes(media_type: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            media_type: media_type.into(),
            payload,
        }
    }

    /// Wrap PNG bytes.
    pub fn png(payload: Vec<u8>) -> Self {
        Self::from_bytes(PNG_MEDIA_TYPE, payload)
    }

    /// Parse a `data:<type>;base64,<payload>` string.
    pub fn parse(data_url: &str) -> Result<Self, ModelError> {
        let rest = data_url
            .trim()
            .strip_prefix("data:")
            .ok_or_else(|| ModelError::invalid_encoding("expected a data URL (data:...;base64,...)"))?;

        let (media_type, encoded) = rest
            .split_once(";base64,")
            .ok_or_else(|| ModelError::invalid_encoding("data URL is not base64 encoded"))?;

        let media_type = media_type.trim();
        if media_type.is_empty() {
            return Err(ModelError::invalid_encoding("data URL has no media type"));
        }
        if encoded.is_empty() {
            return Err(ModelError::invalid_encoding("data URL has an empty payload"));
        }

        let payload = BASE64
            .decode(encoded)
            .map_err(|e| ModelError::invalid_encoding(format!("bad base64 payload: {e}")))?;

        Ok(Self {
            media_type: media_type.to_string(),
            payload,
        })
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    /// Raw container bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.payload
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.payload
    }

    pub fn is_png(&self) -> bool {
        self.media_type.eq_ignore_ascii_case(PNG_MEDIA_TYPE)
    }

    /// Render as a data URL string.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, BASE64.encode(&self.payload))
    }
}

impl fmt::Display for EncodedRaster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_data_url())
    }
}

// Payloads are large; keep debug output readable.
impl fmt::Debug for EncodedRaster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncodedRaster")
            .field("media_type", &self.media_type)
            .field("bytes", &self.payload.len())
            .finish()
    }
}

impl TryFrom<String> for EncodedRaster {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<EncodedRaster> for String {
    fn from(value: EncodedRaster) -> Self {
        value.to_data_url()
    }
}

impl std::str::FromStr for EncodedRaster {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
