use hyper::StatusCode;
use thiserror::Error;

/// Failures of storage operations.
///
/// `Io` carries the user-facing description of the step that failed; the
/// underlying error is kept as the source for logging.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("file not found: {0}")]
    NotFound(String),

    #[error("invalid filename: {0:?}")]
    InvalidName(String),

    #[error("unsupported file extension: {0:?}")]
    UnsupportedExtension(String),

    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
}

impl StorageError {
    /// Wraps an I/O error with the step that produced it
    pub fn io(context: &'static str) -> impl FnOnce(std::io::Error) -> Self {
        move |source| Self::Io { context, source }
    }

    pub const fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidName(_) | Self::UnsupportedExtension(_) => StatusCode::BAD_REQUEST,
            Self::Io { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to return to clients
    pub fn public_message(&self) -> String {
        match self {
            Self::NotFound(_) => "File not found.".to_string(),
            Self::InvalidName(_) => "Invalid filename.".to_string(),
            Self::UnsupportedExtension(_) => {
                "Unsupported file type. (only png, jpg, jpeg, gif, bmp, webp are allowed)"
                    .to_string()
            }
            Self::Io { context, .. } => format!("{context}."),
        }
    }
}
