//! The currently chosen image.
//!
//! An `ImageSource` owns the image bytes plus a preview resource: a temporary
//! file holding the same bytes, exposed as a `file://` display URL. The
//! preview lives exactly as long as the `ImageSource`; replacing the image
//! drops the old value and removes its preview file.
//!
//! No validation is performed on the bytes. A non-image file is accepted and
//! only fails once something tries to decode it.

use anyhow::{anyhow, Context, Result};
use sha2::{Digest, Sha256};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use url::Url;

/// File name given to camera captures.
pub const CAPTURED_FILE_NAME: &str = "captured_image.png";

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";
const PREVIEW_PREFIX: &str = "ai-dentifier-preview-";

pub struct ImageSource {
    bytes: Vec<u8>,
    file_name: String,
    content_type: String,
    /// Short SHA-256 of the bytes. Logs use this instead of content.
    digest: String,
    preview: Preview,
}

struct Preview {
    // Deleted when dropped.
    file: NamedTempFile,
    url: Url,
}

impl ImageSource {
    /// Read any file from disk. The content type is guessed from the extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes =
            std::fs::read(path).with_context(|| format!("read image file {}", path.display()))?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        Self::from_bytes(bytes, file_name, guess_content_type(path))
    }

    /// Wrap a PNG produced by a camera capture.
    pub fn captured_png(bytes: Vec<u8>) -> Result<Self> {
        Self::from_bytes(bytes, CAPTURED_FILE_NAME.to_string(), "image/png".to_string())
    }

    pub fn from_bytes(bytes: Vec<u8>, file_name: String, content_type: String) -> Result<Self> {
        let digest = short_digest(&bytes);
        let preview = Preview::create(&bytes, &file_name)?;
        log::debug!(
            "image {} ({}, {} bytes) previewed at {}",
            digest,
            content_type,
            bytes.len(),
            preview.url
        );
        Ok(Self {
            bytes,
            file_name,
            content_type,
            digest,
            preview,
        })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn digest(&self) -> &str {
        &self.digest
    }

    /// `file://` URL of the preview copy.
    pub fn display_url(&self) -> &Url {
        &self.preview.url
    }

    pub fn preview_path(&self) -> &Path {
        self.preview.file.path()
    }
}

impl std::fmt::Debug for ImageSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageSource")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .field("digest", &self.digest)
            .finish()
    }
}

impl Preview {
    fn create(bytes: &[u8], file_name: &str) -> Result<Self> {
        let suffix = Path::new(file_name)
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();
        let mut file = tempfile::Builder::new()
            .prefix(PREVIEW_PREFIX)
            .suffix(&suffix)
            .tempfile()
            .context("create preview file")?;
        file.write_all(bytes).context("write preview file")?;
        file.flush().context("flush preview file")?;
        let url = Url::from_file_path(file.path())
            .map_err(|_| anyhow!("preview path {} is not absolute", file.path().display()))?;
        Ok(Self { file, url })
    }
}

fn guess_content_type(path: &Path) -> String {
    image::ImageFormat::from_path(path)
        .map(|format| format.to_mime_type().to_string())
        .unwrap_or_else(|_| FALLBACK_CONTENT_TYPE.to_string())
}

fn short_digest(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    hex::encode(&digest[..6])
}
