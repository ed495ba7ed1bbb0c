//! Filesystem operations behind the image API.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use super::error::StorageError;
use super::whitelist;
use crate::logger;

const BYTES_PER_MIB: f64 = 1_048_576.0;

/// Suffix of in-flight uploads. Not whitelisted, so list never shows them.
const PART_SUFFIX: &str = ".part";

/// Size in mebibytes, as reported by the API
#[allow(clippy::cast_precision_loss)]
pub fn bytes_to_mib(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_MIB
}

/// Metadata of a file sitting in the storage directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub filename: String,
    pub size_bytes: u64,
    /// Filesystem modification time, reported as the upload date
    pub modified: DateTime<Utc>,
}

/// Handle on the storage directory
#[derive(Debug, Clone)]
pub struct ImageStore {
    root: PathBuf,
    public_prefix: String,
}

impl ImageStore {
    pub fn new(root: impl Into<PathBuf>, public_prefix: &str) -> Self {
        Self {
            root: root.into(),
            public_prefix: public_prefix.trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn public_prefix(&self) -> &str {
        &self.public_prefix
    }

    /// URL under which the static route serves `filename`
    pub fn public_url(&self, filename: &str) -> String {
        format!("{}/{filename}", self.public_prefix)
    }

    /// Create the storage directory if it is missing. Called once at startup.
    pub fn ensure_root(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.root)
    }

    /// `image-<uuid v4><ext>`
    pub fn generate_name(ext: &str) -> String {
        format!("image-{}{ext}", Uuid::new_v4())
    }

    /// Validate the client filename and open a fresh file for it.
    ///
    /// Nothing touches the disk when the extension is rejected. Bytes go to a
    /// hidden `.<name>.part` file (opened with `create_new`) that only takes
    /// its final name in [`PendingUpload::finish`].
    pub async fn begin_upload(&self, original_name: &str) -> Result<PendingUpload, StorageError> {
        let ext = whitelist::allowed_extension(original_name)
            .ok_or_else(|| StorageError::UnsupportedExtension(original_name.to_string()))?;

        let filename = Self::generate_name(&ext);
        let path = self.root.join(&filename);
        let part_path = self.root.join(format!(".{filename}{PART_SUFFIX}"));
        let file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&part_path)
            .await
            .map_err(StorageError::io("Failed to create file"))?;

        Ok(PendingUpload {
            file: Some(file),
            part_path,
            path,
            filename,
            written: 0,
            settled: false,
        })
    }

    /// Whitelisted files directly inside the storage directory, newest first.
    ///
    /// Entries that vanish or cannot be stat'ed mid-scan are skipped.
    pub async fn list(&self) -> Result<Vec<StoredImage>, StorageError> {
        let mut dir = fs::read_dir(&self.root)
            .await
            .map_err(StorageError::io("Failed to list images"))?;

        let mut images = Vec::new();
        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(StorageError::io("Failed to list images"))?
        {
            let Ok(filename) = entry.file_name().into_string() else {
                continue;
            };
            if !whitelist::is_allowed(&filename) {
                continue;
            }
            let Ok(meta) = fs::metadata(entry.path()).await else {
                continue;
            };
            if !meta.is_file() {
                continue;
            }

            images.push(StoredImage {
                filename,
                size_bytes: meta.len(),
                modified: meta.modified().map_or_else(|_| Utc::now(), DateTime::from),
            });
        }

        images.sort_by(|a, b| {
            b.modified
                .cmp(&a.modified)
                .then_with(|| a.filename.cmp(&b.filename))
        });
        Ok(images)
    }

    /// Map a bare filename to its path inside the storage directory.
    ///
    /// Rejects anything that is not a single normal path component.
    pub fn resolve(&self, name: &str) -> Result<PathBuf, StorageError> {
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\', '\0']) {
            return Err(StorageError::InvalidName(name.to_string()));
        }

        let path = self.root.join(name);
        if path.parent() != Some(self.root.as_path()) {
            return Err(StorageError::InvalidName(name.to_string()));
        }
        Ok(path)
    }

    /// Delete a stored file. No extension check: any existing name can go.
    pub async fn remove(&self, name: &str) -> Result<(), StorageError> {
        let path = self.resolve(name)?;
        let meta = fs::symlink_metadata(&path)
            .await
            .map_err(not_found_or(name, "Failed to delete file"))?;
        if meta.is_dir() {
            return Err(StorageError::NotFound(name.to_string()));
        }

        fs::remove_file(&path)
            .await
            .map_err(not_found_or(name, "Failed to delete file"))
    }

    /// Full content of a stored file
    pub async fn read(&self, name: &str) -> Result<Vec<u8>, StorageError> {
        if name.ends_with(PART_SUFFIX) {
            return Err(StorageError::NotFound(name.to_string()));
        }
        let path = self.resolve(name)?;
        let meta = fs::metadata(&path)
            .await
            .map_err(not_found_or(name, "Failed to read file"))?;
        if !meta.is_file() {
            return Err(StorageError::NotFound(name.to_string()));
        }

        fs::read(&path)
            .await
            .map_err(not_found_or(name, "Failed to read file"))
    }
}

fn not_found_or(name: &str, context: &'static str) -> impl FnOnce(std::io::Error) -> StorageError {
    let name = name.to_string();
    move |e| {
        if e.kind() == ErrorKind::NotFound {
            StorageError::NotFound(name)
        } else {
            StorageError::io(context)(e)
        }
    }
}

/// A file being written by an upload in progress.
///
/// Dropping it before [`finish`](Self::finish) succeeds deletes the partial
/// file, which also covers a request future cancelled mid-body.
#[derive(Debug)]
pub struct PendingUpload {
    file: Option<fs::File>,
    part_path: PathBuf,
    path: PathBuf,
    filename: String,
    written: u64,
    /// Committed or already cleaned up; `Drop` has nothing left to do
    settled: bool,
}

impl PendingUpload {
    pub const fn written(&self) -> u64 {
        self.written
    }

    pub async fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), StorageError> {
        let file = self.file.as_mut().ok_or_else(closed_handle)?;
        file.write_all(chunk)
            .await
            .map_err(StorageError::io("Failed to save file"))?;
        self.written += chunk.len() as u64;
        Ok(())
    }

    /// Flush, stat and move the file to its final name. On failure the
    /// partial file is removed.
    pub async fn finish(mut self) -> Result<StoredImage, StorageError> {
        let result = self.commit().await;
        match result {
            Ok(image) => Ok(image),
            Err(e) => {
                self.abort().await;
                Err(e)
            }
        }
    }

    async fn commit(&mut self) -> Result<StoredImage, StorageError> {
        let mut file = self.file.take().ok_or_else(closed_handle)?;
        file.flush()
            .await
            .map_err(StorageError::io("Failed to save file"))?;
        let meta = file
            .metadata()
            .await
            .map_err(StorageError::io("Failed to read file info"))?;
        drop(file);

        fs::rename(&self.part_path, &self.path)
            .await
            .map_err(StorageError::io("Failed to save file"))?;
        self.settled = true;

        Ok(StoredImage {
            filename: self.filename.clone(),
            size_bytes: meta.len(),
            modified: meta.modified().map_or_else(|_| Utc::now(), DateTime::from),
        })
    }

    /// Close the handle and delete whatever was written so far
    pub async fn abort(mut self) {
        drop(self.file.take());
        self.settled = true;
        let result = fs::remove_file(&self.part_path).await;
        self.log_discard(result);
    }

    fn log_discard(&self, result: std::io::Result<()>) {
        match result {
            Ok(()) => logger::log_warning(&format!(
                "Discarded partial upload '{}' after {} bytes",
                self.filename, self.written
            )),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => logger::log_warning(&format!(
                "Failed to remove partial upload '{}': {e}",
                self.part_path.display()
            )),
        }
    }
}

impl Drop for PendingUpload {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        // Reached when the upload future is dropped; no runtime to await on here
        drop(self.file.take());
        let result = std::fs::remove_file(&self.part_path);
        self.log_discard(result);
    }
}

fn closed_handle() -> StorageError {
    StorageError::io("Failed to save file")(std::io::Error::other("upload file already closed"))
}
