use image::ImageFormat;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{instrument, warn};

use crate::{AppError, ErrorKind, MAX_IMAGE_BYTES};

const FALLBACK_FILE_NAME: &str = "image";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UploadError {
    #[error("selected file is empty")]
    Empty,
    #[error("image size {size} bytes exceeds maximum of {max} bytes")]
    TooLarge { size: usize, max: usize },
    #[error("unsupported image format")]
    UnsupportedFormat,
}

impl From<UploadError> for AppError {
    fn from(e: UploadError) -> Self {
        let kind = match &e {
            UploadError::TooLarge { .. } => ErrorKind::ImageTooLarge,
            UploadError::Empty | UploadError::UnsupportedFormat => ErrorKind::ImageFormatUnsupported,
        };
        AppError::new(kind, e.to_string())
    }
}

/// The photo attached to a registration.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedFile {
    pub file_name: String,
    pub mime_type: String,
    #[serde(with = "serde_bytes")]
    pub bytes: Vec<u8>,
}

// Keep raw bytes out of logs.
impl std::fmt::Debug for SelectedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectedFile")
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .field("size_bytes", &self.bytes.len())
            .finish()
    }
}

impl SelectedFile {
    /// Accepts JPEG, PNG and WebP images up to [`MAX_IMAGE_BYTES`], sniffing
    /// the format from the content rather than trusting the file name.
    #[instrument(skip(bytes), fields(size = bytes.len()))]
    pub fn inspect(file_name: &str, bytes: Vec<u8>) -> Result<Self, UploadError> {
        if bytes.is_empty() {
            return Err(UploadError::Empty);
        }
        if bytes.len() > MAX_IMAGE_BYTES {
            warn!(size = bytes.len(), "rejected oversized image");
            return Err(UploadError::TooLarge {
                size: bytes.len(),
                max: MAX_IMAGE_BYTES,
            });
        }

        let format = image::guess_format(&bytes).map_err(|e| {
            warn!(error = %e, "could not detect image format");
            UploadError::UnsupportedFormat
        })?;

        let mime_type = match format {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
            ImageFormat::WebP => "image/webp",
            other => {
                warn!(format = ?other, "rejected unsupported image format");
                return Err(UploadError::UnsupportedFormat);
            }
        };

        Ok(Self {
            file_name: sanitize_file_name(file_name),
            mime_type: mime_type.to_string(),
            bytes,
        })
    }

    #[must_use]
    pub fn size_bytes(&self) -> usize {
        self.bytes.len()
    }
}

// Shells may hand over full paths (e.g. `C:\fakepath\photo.png`); only the
// last component is sent.
fn sanitize_file_name(raw: &str) -> String {
    let name = raw
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim()
        .chars()
        .filter(|c| !c.is_control())
        .collect::<String>();

    if name.is_empty() {
        FALLBACK_FILE_NAME.to_string()
    } else {
        name
    }
}
