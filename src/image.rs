use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;

use crate::error::GenerationError;

pub const PNG_MIME: &str = "image/png";

/// Encoded bitmap plus its mime type, as exchanged with the generative API.
#[derive(Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl std::fmt::Debug for InlineImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InlineImage")
            .field("mime_type", &self.mime_type)
            .field("bytes", &self.data.len())
            .finish()
    }
}

impl InlineImage {
    pub fn new(mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data,
        }
    }

    pub fn png(data: Vec<u8>) -> Self {
        Self::new(PNG_MIME, data)
    }

    /// Decode a base64 payload as returned in an `inlineData` part.
    pub fn from_base64(mime_type: impl Into<String>, b64: &str) -> Result<Self, GenerationError> {
        let data = B64
            .decode(b64.trim())
            .map_err(|e| GenerationError::Rasterization(format!("invalid base64 image: {e}")))?;
        Ok(Self::new(mime_type, data))
    }

    /// Parse a `data:<mime>;base64,<payload>` URL.
    ///
    /// ```
    /// use archigen::InlineImage;
    /// let img = InlineImage::from_data_url("data:image/jpeg;base64,AAEC").unwrap();
    /// assert_eq!(img.mime_type, "image/jpeg");
    /// assert_eq!(img.data, vec![0, 1, 2]);
    /// ```
    pub fn from_data_url(url: &str) -> Result<Self, GenerationError> {
        let rest = url
            .strip_prefix("data:")
            .ok_or_else(|| GenerationError::Rasterization("not a data url".into()))?;
        let (meta, payload) = rest
            .split_once(',')
            .ok_or_else(|| GenerationError::Rasterization("data url has no payload".into()))?;
        let mime = meta.strip_suffix(";base64").ok_or_else(|| {
            GenerationError::Rasterization("only base64 data urls are supported".into())
        })?;
        Self::from_base64(mime, payload)
    }

    pub fn to_base64(&self) -> String {
        B64.encode(&self.data)
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.to_base64())
    }

    /// File extension matching the mime type.
    pub fn extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            "image/jpeg" | "image/jpg" => "jpg",
            "image/webp" => "webp",
            "image/gif" => "gif",
            _ => "png",
        }
    }
}

/// Guess a mime type from a file name.
pub fn mime_for_path(path: &std::path::Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => PNG_MIME,
    }
}
