//! Core data types: source images, requests, and generated artifacts.

use crate::error::GenerationError;
use base64::Engine;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// Image types the remote model accepts as inline input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Png,
    Jpeg,
    Webp,
    Heic,
    Heif,
}

impl MediaType {
    /// MIME string sent on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Png => "image/png",
            MediaType::Jpeg => "image/jpeg",
            MediaType::Webp => "image/webp",
            MediaType::Heic => "image/heic",
            MediaType::Heif => "image/heif",
        }
    }

    /// Parse a MIME type, accepting the common `image/jpg` alias.
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/png" => Some(MediaType::Png),
            "image/jpeg" | "image/jpg" => Some(MediaType::Jpeg),
            "image/webp" => Some(MediaType::Webp),
            "image/heic" => Some(MediaType::Heic),
            "image/heif" => Some(MediaType::Heif),
            _ => None,
        }
    }

    /// Guess from a file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(MediaType::Png),
            "jpg" | "jpeg" => Some(MediaType::Jpeg),
            "webp" => Some(MediaType::Webp),
            "heic" => Some(MediaType::Heic),
            "heif" => Some(MediaType::Heif),
            _ => None,
        }
    }

    /// Sniff the type from magic bytes.
    ///
    /// `None` when the bytes match no known format; `Some(Err(name))` when
    /// they match a format the model does not accept. HEIC/HEIF are not
    /// recognised by the `image` crate; callers fall back to the file
    /// extension for those.
    pub fn sniff(bytes: &[u8]) -> Option<Result<Self, String>> {
        let format = image::guess_format(bytes).ok()?;
        Some(match format {
            image::ImageFormat::Png => Ok(MediaType::Png),
            image::ImageFormat::Jpeg => Ok(MediaType::Jpeg),
            image::ImageFormat::WebP => Ok(MediaType::Webp),
            other => Err(format!("{other:?}").to_ascii_uppercase()),
        })
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An image supplied for editing, already base64-encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    /// Base64 payload, optionally still wrapped in a `data:` URL
    pub encoded: String,
    /// Declared image type
    pub media_type: MediaType,
}

impl SourceImage {
    /// Create from an encoded payload and a MIME string.
    ///
    /// Fails when the MIME type is not one the model understands.
    pub fn new(encoded: impl Into<String>, mime: &str) -> Result<Self, GenerationError> {
        let media_type = MediaType::from_mime(mime)
            .ok_or_else(|| GenerationError::UnsupportedMediaType(mime.to_string()))?;
        Ok(Self {
            encoded: encoded.into(),
            media_type,
        })
    }

    /// Create from raw image bytes.
    pub fn from_bytes(bytes: &[u8], media_type: MediaType) -> Self {
        Self {
            encoded: base64::engine::general_purpose::STANDARD.encode(bytes),
            media_type,
        }
    }

    /// Parse a `data:<mime>;base64,<payload>` URL.
    pub fn from_data_url(url: &str) -> Result<Self, GenerationError> {
        let header = url
            .strip_prefix("data:")
            .and_then(|rest| rest.split_once(',').map(|(header, _)| header))
            .ok_or_else(|| GenerationError::InvalidRequest("not a data URL".to_string()))?;
        let mime = header.split(';').next().unwrap_or_default();
        Self::new(url, mime)
    }

    /// Read an image file, detecting its type from content then extension.
    pub fn from_path(path: &Path) -> Result<Self, GenerationError> {
        let bytes = std::fs::read(path).map_err(|e| {
            GenerationError::InvalidRequest(format!("Failed to read {}: {e}", path.display()))
        })?;
        let media_type = match MediaType::sniff(&bytes) {
            Some(Ok(media_type)) => media_type,
            Some(Err(format)) => {
                return Err(GenerationError::UnsupportedMediaType(format!(
                    "{} is a {format} image; use PNG, JPEG, WebP, HEIC or HEIF",
                    path.display()
                )))
            }
            None => path
                .extension()
                .and_then(|ext| ext.to_str())
                .and_then(MediaType::from_extension)
                .ok_or_else(|| {
                    GenerationError::UnsupportedMediaType(format!(
                        "{} is not a PNG, JPEG, WebP, HEIC or HEIF image",
                        path.display()
                    ))
                })?,
        };
        Ok(Self::from_bytes(&bytes, media_type))
    }

    /// The payload with any `scheme,` prefix removed.
    pub fn payload(&self) -> &str {
        strip_data_url_prefix(&self.encoded)
    }
}

/// Drop everything up to and including the first comma, if there is one.
pub fn strip_data_url_prefix(encoded: &str) -> &str {
    match encoded.split_once(',') {
        Some((_, payload)) if !payload.is_empty() => payload,
        _ => encoded,
    }
}

/// A single generate or edit request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRequest {
    /// Natural-language prompt or edit instruction
    pub instruction: String,
    /// Image to edit; `None` for text-to-image generation
    pub source_image: Option<SourceImage>,
}

impl ImageRequest {
    /// Text-to-image request.
    pub fn generate(instruction: impl Into<String>) -> Self {
        Self {
            instruction: instruction.into(),
            source_image: None,
        }
    }

    /// Edit request for an existing image.
    pub fn edit(instruction: impl Into<String>, source: SourceImage) -> Self {
        Self {
            instruction: instruction.into(),
            source_image: Some(source),
        }
    }

    /// Returns true if this request carries an image to edit.
    pub fn is_edit(&self) -> bool {
        self.source_image.is_some()
    }
}

/// The image payload returned by the model.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "artifact should be saved or displayed"]
pub struct Artifact {
    /// Declared MIME type of the payload
    pub media_type: String,
    /// Base64-encoded image bytes
    pub encoded: String,
}

impl Artifact {
    /// Render as `data:<mediaType>;base64,<encodedBytes>`.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.encoded)
    }

    /// Decode the payload into raw bytes.
    pub fn decode(&self) -> Result<Vec<u8>, GenerationError> {
        base64::engine::general_purpose::STANDARD
            .decode(self.encoded.as_bytes())
            .map_err(|e| GenerationError::Decode(e.to_string()))
    }

    /// File extension matching the media type (`png` when unknown).
    pub fn extension(&self) -> &'static str {
        match MediaType::from_mime(&self.media_type) {
            Some(MediaType::Jpeg) => "jpg",
            Some(MediaType::Webp) => "webp",
            Some(MediaType::Heic) => "heic",
            Some(MediaType::Heif) => "heif",
            Some(MediaType::Png) | None => "png",
        }
    }

    /// Decode and write the image to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> crate::error::Result<()> {
        let bytes = self.decode()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }
}

/// A successful result together with the prompt that produced it.
#[derive(Debug, Clone)]
pub struct GeneratedImage {
    pub artifact: Artifact,
    pub prompt: String,
    pub created_at: SystemTime,
}

impl GeneratedImage {
    pub fn new(artifact: Artifact, prompt: impl Into<String>) -> Self {
        Self {
            artifact,
            prompt: prompt.into(),
            created_at: SystemTime::now(),
        }
    }

    /// Download file name: `<prefix>-<unix millis>.<ext>`.
    pub fn file_name(&self, prefix: &str) -> String {
        let millis = self
            .created_at
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        format!("{prefix}-{millis}.{}", self.artifact.extension())
    }
}
