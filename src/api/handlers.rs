// Image API handlers
// Each handler converts every failure into the JSON envelope; nothing escapes.

use chrono::{SecondsFormat, Utc};
use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::{Request, Response, StatusCode};

use super::response::{failure, json_response, success, success_message};
use super::types::{Banner, FileInfo, HealthData, ImageInfo};
use super::upload;
use crate::config::AppState;
use crate::logger;
use crate::storage::StorageError;

/// `GET /`
pub fn banner() -> Response<Full<Bytes>> {
    json_response(
        StatusCode::OK,
        &Banner {
            message: "Image host API server is running!",
        },
    )
}

/// `GET /api/health`
pub fn health() -> Response<Full<Bytes>> {
    success(
        "Server is running normally.",
        HealthData {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        },
    )
}

/// `POST /api/upload-image`
pub async fn upload_image<B>(req: Request<B>, state: &AppState) -> Response<Full<Bytes>>
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>> + 'static,
{
    match upload::receive(req, &state.store, &state.config.upload).await {
        Ok(received) => {
            logger::log_image_stored(
                &received.image.filename,
                &received.original_name,
                received.image.size_bytes,
            );
            let info = FileInfo::new(&state.store, &received.image, received.original_name);
            success("Image uploaded successfully.", info)
        }
        Err(e) => {
            if e.status().is_server_error() {
                logger::log_error(&format!("Upload failed: {e}"));
            } else {
                logger::log_warning(&format!("Upload rejected: {e}"));
            }
            failure(e.status(), &e.public_message())
        }
    }
}

/// `GET /api/images`
pub async fn list_images(state: &AppState) -> Response<Full<Bytes>> {
    match state.store.list().await {
        Ok(images) => {
            let infos: Vec<ImageInfo> = images
                .into_iter()
                .map(|image| ImageInfo::new(&state.store, image))
                .collect();
            success("Image list retrieved successfully.", infos)
        }
        Err(e) => {
            logger::log_error(&format!("Listing failed: {e}"));
            failure(e.status(), &e.public_message())
        }
    }
}

/// `DELETE /api/delete-image/:filename`, `raw_name` still percent-encoded
pub async fn delete_image(raw_name: &str, state: &AppState) -> Response<Full<Bytes>> {
    if raw_name.is_empty() {
        return failure(StatusCode::BAD_REQUEST, "Filename is required.");
    }
    let Ok(name) = urlencoding::decode(raw_name) else {
        let e = StorageError::InvalidName(raw_name.to_string());
        return failure(e.status(), &e.public_message());
    };

    match state.store.remove(&name).await {
        Ok(()) => {
            logger::log_image_deleted(&name);
            success_message("Image deleted successfully.")
        }
        Err(e) => {
            if e.status().is_server_error() {
                logger::log_error(&format!("Delete failed: {e}"));
            }
            failure(e.status(), &e.public_message())
        }
    }
}
