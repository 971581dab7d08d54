//! Photo storage seam. Uploads go to an external bucket and come back as a
//! public URL that the record keeps as its photo reference.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("photo storage is not configured")]
    NotConfigured,

    #[error("upload failed: {0}")]
    Upload(String),
}

/// Photo bytes as received from the admin form.
#[derive(Debug, Clone)]
pub struct PhotoUpload {
    pub data: Vec<u8>,
}

/// A photo that passed type sniffing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckedPhoto {
    pub mime_type: &'static str,
    pub extension: &'static str,
}

#[async_trait]
pub trait PhotoStorage: Send + Sync {
    /// Stores `data` under a name derived from `suggested_name` and returns the
    /// public reference.
    async fn upload(
        &self,
        data: Vec<u8>,
        suggested_name: &str,
        content_type: &str,
    ) -> Result<String, StorageError>;
}

/// Used when no bucket is configured: every upload fails, records without a
/// photo still work.
pub struct UnconfiguredPhotoStorage;

#[async_trait]
impl PhotoStorage for UnconfiguredPhotoStorage {
    async fn upload(&self, _: Vec<u8>, _: &str, _: &str) -> Result<String, StorageError> {
        Err(StorageError::NotConfigured)
    }
}

/// Accepts JPEG, PNG and WebP up to `max_bytes`, judged by content rather than
/// by file name.
pub fn check_photo(data: &[u8], max_bytes: usize) -> Result<CheckedPhoto, String> {
    if data.is_empty() {
        return Err("Photo is empty".to_string());
    }
    if data.len() > max_bytes {
        return Err(format!("Photo exceeds {} byte limit", max_bytes));
    }

    let kind = infer::get(data).ok_or_else(|| "Unrecognized photo type".to_string())?;
    match kind.mime_type() {
        "image/jpeg" | "image/png" | "image/webp" => Ok(CheckedPhoto {
            mime_type: kind.mime_type(),
            extension: kind.extension(),
        }),
        other => Err(format!("Photo must be JPEG, PNG or WebP, got {}", other)),
    }
}
