//! Opaque binary attachments exchanged with the backend.
use anyhow::{anyhow, Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Largest image accepted by the entry form.
pub const MAX_IMAGE_BYTES: u64 = 10 * 1024 * 1024;

/// A binary object reference: either raw bytes on their way up, or a URL the
/// backend already serves the object from.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExternalBlob {
    Bytes(#[serde(with = "base64_bytes")] Vec<u8>),
    Url(String),
}

impl std::fmt::Debug for ExternalBlob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExternalBlob::Bytes(bytes) => write!(f, "ExternalBlob::Bytes({} bytes)", bytes.len()),
            ExternalBlob::Url(url) => write!(f, "ExternalBlob::Url({})", url),
        }
    }
}

impl ExternalBlob {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        ExternalBlob::Bytes(bytes)
    }

    pub fn from_url(url: impl Into<String>) -> Self {
        ExternalBlob::Url(url.into())
    }

    /// Raw contents. URL-backed blobs are downloaded.
    pub async fn get_bytes(&self, http: &reqwest::Client) -> Result<Vec<u8>> {
        match self {
            ExternalBlob::Bytes(bytes) => Ok(bytes.clone()),
            ExternalBlob::Url(url) => {
                let res = http
                    .get(url)
                    .send()
                    .await
                    .with_context(|| format!("failed to fetch attachment {}", url))?;
                if !res.status().is_success() {
                    return Err(anyhow!("attachment fetch error {}: {}", res.status(), url));
                }
                Ok(res.bytes().await?.to_vec())
            }
        }
    }

    /// A URL that can be opened directly. Byte-backed blobs become `data:` URLs.
    pub fn direct_url(&self) -> String {
        match self {
            ExternalBlob::Url(url) => url.clone(),
            ExternalBlob::Bytes(bytes) => format!(
                "data:{};base64,{}",
                sniff_image_type(bytes).unwrap_or("application/octet-stream"),
                STANDARD.encode(bytes)
            ),
        }
    }
}

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        STANDARD.decode(text).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BlobError {
    #[error("Please select an image file")]
    NotAnImage,
    #[error("Image size must be less than 10MB")]
    TooLarge,
}

/// A file the user picked for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Read a file from disk, inferring its content type from the extension.
    pub async fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| anyhow!("invalid file name"))?
            .to_string();
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read file: {}", path.display()))?;
        Ok(Self {
            name,
            content_type: content_type_for(path).to_string(),
            bytes,
        })
    }

    pub fn validate(&self) -> Result<(), BlobError> {
        if !self.content_type.starts_with("image/") {
            return Err(BlobError::NotAnImage);
        }
        if self.bytes.len() as u64 > MAX_IMAGE_BYTES {
            return Err(BlobError::TooLarge);
        }
        Ok(())
    }

    pub fn size_kib(&self) -> f64 {
        self.bytes.len() as f64 / 1024.0
    }
}

pub fn content_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|s| s.to_ascii_lowercase())
    {
        Some(ext) if ext == "jpg" || ext == "jpeg" => "image/jpeg",
        Some(ext) if ext == "png" => "image/png",
        Some(ext) if ext == "gif" => "image/gif",
        Some(ext) if ext == "webp" => "image/webp",
        Some(ext) if ext == "heic" => "image/heic",
        _ => "application/octet-stream",
    }
}

fn sniff_image_type(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some("image/png")
    } else if bytes.starts_with(b"GIF8") {
        Some("image/gif")
    } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some("image/webp")
    } else {
        None
    }
}
