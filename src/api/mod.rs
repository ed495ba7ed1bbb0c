// API module entry
// JSON endpoints under /api plus the root banner

mod handlers;
mod response;
mod types;
mod upload;

use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::{Method, Request, Response};

use crate::config::AppState;

pub use handlers::banner;
pub use response::{failure, method_not_allowed, not_found};

const DELETE_ROUTE: &str = "/api/delete-image";

/// API route handler
///
/// Dispatches to handler functions based on request path and method
pub async fn handle_api<B>(req: Request<B>, state: &AppState) -> Response<Full<Bytes>>
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>> + 'static,
{
    let path = req.uri().path().to_owned();
    let method = req.method().clone();

    match (method, path.as_str()) {
        (Method::GET, "/api/health") => handlers::health(),
        (Method::POST, "/api/upload-image") => handlers::upload_image(req, state).await,
        (Method::GET, "/api/images") => handlers::list_images(state).await,
        (Method::DELETE, p) if delete_target(p).is_some() => {
            let raw = delete_target(p).unwrap_or_default();
            handlers::delete_image(raw, state).await
        }
        (_, p) => allowed_methods(p).map_or_else(not_found, method_not_allowed),
    }
}

/// Filename segment of a delete route; `Some("")` when it is missing
fn delete_target(path: &str) -> Option<&str> {
    let rest = path.strip_prefix(DELETE_ROUTE)?;
    if rest.is_empty() {
        Some("")
    } else {
        rest.strip_prefix('/')
    }
}

/// Methods a known API path accepts, for 405 answers
fn allowed_methods(path: &str) -> Option<&'static str> {
    match path {
        "/api/health" | "/api/images" => Some("GET, OPTIONS"),
        "/api/upload-image" => Some("POST, OPTIONS"),
        p if delete_target(p).is_some() => Some("DELETE, OPTIONS"),
        _ => None,
    }
}
