//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: preflight, body size guard, route
//! matching, CORS headers and the access log line.

use crate::api;
use crate::config::AppState;
use crate::handler::static_files;
use crate::http::cors;
use crate::logger::{self, AccessLogEntry};
use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::header::{HeaderName, CONTENT_LENGTH, IF_NONE_MATCH, RANGE};
use hyper::{Method, Request, Response, StatusCode};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Request headers the static route looks at
pub struct RequestContext<'a> {
    pub is_head: bool,
    pub if_none_match: Option<&'a str>,
    pub range: Option<&'a str>,
}

impl<'a> RequestContext<'a> {
    fn from_request<B>(req: &'a Request<B>) -> Self {
        Self {
            is_head: req.method() == Method::HEAD,
            if_none_match: header_str(req, &IF_NONE_MATCH),
            range: header_str(req, &RANGE),
        }
    }
}

fn header_str<'a, B>(req: &'a Request<B>, name: &HeaderName) -> Option<&'a str> {
    req.headers().get(name).and_then(|v| v.to_str().ok())
}

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    remote_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>> + 'static,
{
    let started = Instant::now();
    let entry = state.config.logging.access_log.then(|| {
        AccessLogEntry::from_request(
            remote_addr.to_string(),
            req.method(),
            req.uri(),
            req.version(),
            req.headers(),
        )
    });

    let mut response = dispatch(req, &state).await;
    cors::apply(&mut response);

    if let Some(mut entry) = entry {
        entry.status = response.status().as_u16();
        entry.body_bytes = response
            .body()
            .size_hint()
            .exact()
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(0);
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

async fn dispatch<B>(req: Request<B>, state: &AppState) -> Response<Full<Bytes>>
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>> + 'static,
{
    if req.method() == Method::OPTIONS {
        return cors::build_preflight_response();
    }
    if let Some(resp) = check_body_size(&req, state.config.upload.max_body_size) {
        return resp;
    }

    let path = req.uri().path().to_owned();

    if path == "/" {
        return match *req.method() {
            Method::GET | Method::HEAD => api::banner(),
            _ => api::method_not_allowed("GET, OPTIONS"),
        };
    }

    if path == "/api" || path.starts_with("/api/") {
        return api::handle_api(req, state).await;
    }

    if let Some(name) = static_target(&path, state.store.public_prefix()) {
        return match *req.method() {
            Method::GET | Method::HEAD => {
                let ctx = RequestContext::from_request(&req);
                static_files::serve_upload(&ctx, &state.store, name).await
            }
            _ => api::method_not_allowed("GET, HEAD, OPTIONS"),
        };
    }

    api::not_found()
}

/// Reject a declared `Content-Length` above the cap before reading the body
fn check_body_size<B>(req: &Request<B>, max_body_size: u64) -> Option<Response<Full<Bytes>>> {
    let size_str = req.headers().get(CONTENT_LENGTH)?.to_str().ok()?;
    match size_str.parse::<u64>() {
        Ok(size) if size > max_body_size => {
            logger::log_warning(&format!(
                "Request body too large: {size} bytes (max: {max_body_size})"
            ));
            Some(api::failure(
                StatusCode::PAYLOAD_TOO_LARGE,
                &format!("File is too large. (limit: {max_body_size} bytes)"),
            ))
        }
        Ok(_) => None,
        Err(_) => Some(api::failure(
            StatusCode::BAD_REQUEST,
            "Invalid Content-Length header.",
        )),
    }
}

/// Path remainder under the public prefix, e.g. `/uploads/a.png` -> `a.png`
fn static_target<'p>(path: &'p str, prefix: &str) -> Option<&'p str> {
    path.strip_prefix(prefix)?.strip_prefix('/')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use http_body_util::BodyExt;
    use hyper::header::{ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_RANGE, CONTENT_TYPE, ETAG};
    use hyper::HeaderMap;
    use serde_json::Value;
    use tempfile::TempDir;

    const BOUNDARY: &str = "----image-host-test";

    struct Reply {
        status: StatusCode,
        headers: HeaderMap,
        body: Bytes,
    }

    impl Reply {
        fn json(&self) -> Value {
            serde_json::from_slice(&self.body).unwrap()
        }
    }

    fn test_state(dir: &TempDir) -> Arc<AppState> {
        let mut config = Config::default();
        config.storage.upload_dir = dir.path().to_string_lossy().into_owned();
        config.logging.access_log = false;
        Arc::new(AppState::new(config))
    }

    fn upload_body(field: &str, filename: &str, data: &[u8]) -> Vec<u8> {
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    async fn send(state: &Arc<AppState>, req: Request<Full<Bytes>>) -> Reply {
        let addr: SocketAddr = "127.0.0.1:40000".parse().unwrap();
        let response = handle_request(req, Arc::clone(state), addr).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        Reply {
            status,
            headers,
            body,
        }
    }

    async fn get(state: &Arc<AppState>, uri: &str) -> Reply {
        let req = Request::get(uri).body(Full::new(Bytes::new())).unwrap();
        send(state, req).await
    }

    async fn delete(state: &Arc<AppState>, uri: &str) -> Reply {
        let req = Request::delete(uri).body(Full::new(Bytes::new())).unwrap();
        send(state, req).await
    }

    async fn upload(state: &Arc<AppState>, filename: &str, data: &[u8]) -> Reply {
        let body = upload_body("image", filename, data);
        let req = Request::post("/api/upload-image")
            .header(
                CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .header(CONTENT_LENGTH, body.len())
            .body(Full::new(Bytes::from(body)))
            .unwrap();
        send(state, req).await
    }

    fn stored_files(dir: &TempDir) -> Vec<String> {
        std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_upload_png_scenario() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir);
        let data: Vec<u8> = (0..2_097_152u32).map(|i| (i % 251) as u8).collect();

        let reply = upload(&state, "photo.PNG", &data).await;
        assert_eq!(reply.status, StatusCode::OK);
        let json = reply.json();
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["originalName"], "photo.PNG");
        assert!((json["data"]["size"].as_f64().unwrap() - 2.0).abs() < 1e-9);

        let filename = json["data"]["filename"].as_str().unwrap().to_string();
        let id = filename
            .strip_prefix("image-")
            .and_then(|f| f.strip_suffix(".png"))
            .unwrap();
        assert!(uuid::Uuid::parse_str(id).is_ok());
        assert!(json["data"]["path"].as_str().unwrap().ends_with(&filename));
        assert!(json["data"]["uploadDate"].is_string());

        assert_eq!(std::fs::read(dir.path().join(&filename)).unwrap(), data);

        let listing = get(&state, "/api/images").await.json();
        let entry = &listing["data"][0];
        assert_eq!(entry["filename"], filename.as_str());
        assert!((entry["size"].as_f64().unwrap() - 2.0).abs() < 1e-9);
        assert_eq!(entry["url"], format!("/uploads/{filename}"));
    }

    #[tokio::test]
    async fn test_upload_pdf_rejected() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir);

        let reply = upload(&state, "doc.pdf", b"%PDF-1.4").await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST);
        assert_eq!(reply.json()["success"], false);
        assert!(stored_files(&dir).is_empty());
    }

    #[tokio::test]
    async fn test_upload_over_limit_rejected() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir);
        let data = vec![0u8; 10 * 1024 * 1024 + 1];

        let reply = upload(&state, "big.png", &data).await;
        assert_eq!(reply.status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(reply.json()["success"], false);
        assert!(stored_files(&dir).is_empty());
    }

    #[tokio::test]
    async fn test_upload_without_image_field() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir);
        let body = upload_body("file", "a.png", b"png");
        let req = Request::post("/api/upload-image")
            .header(
                CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Full::new(Bytes::from(body)))
            .unwrap();

        let reply = send(&state, req).await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST);
        assert_eq!(reply.json()["success"], false);
        assert!(stored_files(&dir).is_empty());
    }

    #[tokio::test]
    async fn test_delete_lifecycle() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir);
        let uploaded = upload(&state, "cat.gif", b"GIF89a").await.json();
        let filename = uploaded["data"]["filename"].as_str().unwrap().to_string();

        let reply = delete(&state, &format!("/api/delete-image/{filename}")).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(
            reply.json(),
            serde_json::json!({"success": true, "message": "Image deleted successfully."})
        );
        assert!(stored_files(&dir).is_empty());
        assert_eq!(get(&state, "/api/images").await.json()["data"], serde_json::json!([]));

        let again = delete(&state, &format!("/api/delete-image/{filename}")).await;
        assert_eq!(again.status, StatusCode::NOT_FOUND);
        assert_eq!(again.json()["success"], false);
    }

    #[tokio::test]
    async fn test_delete_unknown_is_404_and_mutates_nothing() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir);
        std::fs::write(dir.path().join("keep.png"), b"x").unwrap();

        let reply = delete(&state, "/api/delete-image/image-never-uploaded.png").await;
        assert_eq!(reply.status, StatusCode::NOT_FOUND);
        assert_eq!(reply.json()["success"], false);
        assert_eq!(stored_files(&dir), vec!["keep.png".to_string()]);
    }

    #[tokio::test]
    async fn test_delete_requires_plain_filename() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir);

        assert_eq!(
            delete(&state, "/api/delete-image/").await.status,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            delete(&state, "/api/delete-image/..%2Fconfig.toml").await.status,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            delete(&state, "/api/delete-image/a/b.png").await.status,
            StatusCode::BAD_REQUEST
        );
    }

    #[tokio::test]
    async fn test_delete_non_whitelisted_file() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir);
        std::fs::write(dir.path().join("notes.txt"), b"x").unwrap();

        let reply = delete(&state, "/api/delete-image/notes.txt").await;
        assert_eq!(reply.status, StatusCode::OK);
        assert!(stored_files(&dir).is_empty());
    }

    #[tokio::test]
    async fn test_list_missing_directory_is_500() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.storage.upload_dir = dir.path().join("gone").to_string_lossy().into_owned();
        config.logging.access_log = false;
        let state = Arc::new(AppState::new(config));

        let reply = get(&state, "/api/images").await;
        assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(reply.json()["success"], false);
    }

    #[tokio::test]
    async fn test_health_and_banner() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir);

        let health = get(&state, "/api/health").await;
        assert_eq!(health.status, StatusCode::OK);
        let json = health.json();
        assert_eq!(json["success"], true);
        let ts = json["data"]["timestamp"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(ts).is_ok());

        let banner = get(&state, "/").await;
        assert_eq!(banner.status, StatusCode::OK);
        assert!(banner.json()["message"].is_string());
    }

    #[tokio::test]
    async fn test_cors_on_every_response() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir);

        let preflight = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/upload-image")
            .header("origin", "http://localhost:5173")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let reply = send(&state, preflight).await;
        assert_eq!(reply.status, StatusCode::NO_CONTENT);
        assert_eq!(reply.headers[ACCESS_CONTROL_ALLOW_ORIGIN], "*");

        let missing = get(&state, "/nowhere").await;
        assert_eq!(missing.status, StatusCode::NOT_FOUND);
        assert_eq!(missing.headers[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    }

    #[tokio::test]
    async fn test_wrong_method() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir);

        let req = Request::post("/api/images")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let reply = send(&state, req).await;
        assert_eq!(reply.status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(reply.headers["allow"], "GET, OPTIONS");
    }

    #[tokio::test]
    async fn test_static_serving() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir);
        std::fs::write(dir.path().join("pic.png"), b"0123456789").unwrap();

        let full = get(&state, "/uploads/pic.png").await;
        assert_eq!(full.status, StatusCode::OK);
        assert_eq!(full.headers[CONTENT_TYPE], "image/png");
        assert_eq!(&full.body[..], b"0123456789");

        let etag = full.headers[ETAG].to_str().unwrap().to_string();
        let req = Request::get("/uploads/pic.png")
            .header(IF_NONE_MATCH, etag)
            .body(Full::new(Bytes::new()))
            .unwrap();
        assert_eq!(send(&state, req).await.status, StatusCode::NOT_MODIFIED);

        let req = Request::get("/uploads/pic.png")
            .header(RANGE, "bytes=2-4")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let partial = send(&state, req).await;
        assert_eq!(partial.status, StatusCode::PARTIAL_CONTENT);
        assert_eq!(partial.headers[CONTENT_RANGE], "bytes 2-4/10");
        assert_eq!(&partial.body[..], b"234");

        let req = Request::head("/uploads/pic.png")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let head = send(&state, req).await;
        assert_eq!(head.status, StatusCode::OK);
        assert_eq!(head.headers[CONTENT_LENGTH], "10");
        assert!(head.body.is_empty());
    }

    #[tokio::test]
    async fn test_static_confined_to_storage_dir() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir);
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub").join("inner.png"), b"x").unwrap();

        assert_eq!(
            get(&state, "/uploads/sub/inner.png").await.status,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get(&state, "/uploads/..%2FCargo.toml").await.status,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get(&state, "/uploads/missing.png").await.status,
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_static_target() {
        assert_eq!(static_target("/uploads/a.png", "/uploads"), Some("a.png"));
        assert_eq!(static_target("/uploads/", "/uploads"), Some(""));
        assert_eq!(static_target("/uploads", "/uploads"), None);
        assert_eq!(static_target("/uploadsx/a.png", "/uploads"), None);
    }
}
