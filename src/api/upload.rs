//! Multipart intake for `POST /api/upload-image`.
//!
//! The request body is streamed straight into the storage directory. The
//! size cap applies to the whole body. A declared `Content-Length` over the
//! cap is already answered by the router; here multer enforces the cap while
//! streaming, so bodies without a (truthful) length are cut off too.

use http_body_util::BodyExt;
use hyper::body::{Body, Bytes};
use hyper::header::CONTENT_TYPE;
use hyper::{Request, StatusCode};
use multer::{Constraints, Multipart, SizeLimit};
use thiserror::Error;

use crate::config::UploadConfig;
use crate::storage::{ImageStore, StorageError, StoredImage};

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("missing or non-multipart Content-Type")]
    ContentType,

    #[error("no file in multipart field '{0}'")]
    MissingField(String),

    #[error("request body exceeds {limit} bytes")]
    TooLarge { limit: u64 },

    #[error("malformed multipart body: {0}")]
    Multipart(#[source] multer::Error),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl UploadError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::ContentType | Self::MissingField(_) | Self::Multipart(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Storage(e) => e.status(),
        }
    }

    pub fn public_message(&self) -> String {
        match self {
            Self::ContentType | Self::MissingField(_) | Self::Multipart(_) => {
                "Image file not found in request.".to_string()
            }
            Self::TooLarge { limit } => {
                format!("File is too large. (limit: {limit} bytes)")
            }
            Self::Storage(e) => e.public_message(),
        }
    }
}

/// A file that made it to disk
#[derive(Debug)]
pub struct ReceivedUpload {
    pub image: StoredImage,
    pub original_name: String,
}

/// Stream the configured file field of a multipart request into `store`.
///
/// Fields with other names are skipped. The first matching field wins.
pub async fn receive<B>(
    req: Request<B>,
    store: &ImageStore,
    config: &UploadConfig,
) -> Result<ReceivedUpload, UploadError>
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>> + 'static,
{
    let limit = config.max_body_size;

    let boundary = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|ct| multer::parse_boundary(ct).ok())
        .ok_or(UploadError::ContentType)?;

    let constraints = Constraints::new().size_limit(SizeLimit::new().whole_stream(limit));
    let mut multipart =
        Multipart::with_constraints(req.into_body().into_data_stream(), boundary, constraints);

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| classify(e, limit))?
    {
        if field.name() != Some(config.field_name.as_str()) {
            continue;
        }
        let Some(original_name) = field.file_name().map(ToString::to_string) else {
            return Err(UploadError::MissingField(config.field_name.clone()));
        };

        let mut pending = store.begin_upload(&original_name).await?;
        loop {
            match field.chunk().await {
                Ok(Some(chunk)) => {
                    if let Err(e) = pending.write_chunk(&chunk).await {
                        pending.abort().await;
                        return Err(e.into());
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    pending.abort().await;
                    return Err(classify(e, limit));
                }
            }
        }

        let image = pending.finish().await?;
        return Ok(ReceivedUpload {
            image,
            original_name,
        });
    }

    Err(UploadError::MissingField(config.field_name.clone()))
}

fn classify(error: multer::Error, limit: u64) -> UploadError {
    match error {
        multer::Error::StreamSizeExceeded { .. } | multer::Error::FieldSizeExceeded { .. } => {
            UploadError::TooLarge { limit }
        }
        other => UploadError::Multipart(other),
    }
}
