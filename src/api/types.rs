// API payload types

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::storage::{bytes_to_mib, ImageStore, StoredImage};

/// Result of a successful upload
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    pub filename: String,
    pub original_name: String,
    /// MiB
    pub size: f64,
    /// Location on the server's filesystem
    pub path: String,
    pub upload_date: DateTime<Utc>,
}

impl FileInfo {
    pub fn new(store: &ImageStore, image: &StoredImage, original_name: String) -> Self {
        Self {
            filename: image.filename.clone(),
            original_name,
            size: bytes_to_mib(image.size_bytes),
            path: store.root().join(&image.filename).display().to_string(),
            upload_date: Utc::now(),
        }
    }
}

/// One listing entry
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageInfo {
    pub filename: String,
    /// MiB
    pub size: f64,
    pub upload_date: DateTime<Utc>,
    /// Public URL of the static route
    pub url: String,
}

impl ImageInfo {
    pub fn new(store: &ImageStore, image: StoredImage) -> Self {
        Self {
            url: store.public_url(&image.filename),
            size: bytes_to_mib(image.size_bytes),
            upload_date: image.modified,
            filename: image.filename,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthData {
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct Banner {
    pub message: &'static str,
}
