// API response utility functions module
// Every API answer uses the `{success, message, data?}` envelope

use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderValue, ALLOW, CONTENT_TYPE};
use hyper::{Response, StatusCode};
use serde::Serialize;

/// Uniform JSON response shape
#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

/// Serialize `body` as the JSON response
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    let json = match serde_json::to_vec(body) {
        Ok(j) => j,
        Err(e) => {
            logger::log_error(&format!("Failed to serialize response: {e}"));
            return Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .header(CONTENT_TYPE, "application/json")
                .body(Full::new(Bytes::from_static(
                    br#"{"success":false,"message":"Internal server error"}"#,
                )))
                .unwrap_or_else(|_| Response::new(Full::new(Bytes::from("Error"))));
        }
    };

    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "application/json; charset=utf-8")
        .body(Full::new(Bytes::from(json)))
        .unwrap_or_else(|e| {
            logger::log_error(&format!("Failed to build response: {e}"));
            Response::new(Full::new(Bytes::from("Error")))
        })
}

/// 200 with a payload
pub fn success<T: Serialize>(message: &str, data: T) -> Response<Full<Bytes>> {
    json_response(
        StatusCode::OK,
        &Envelope {
            success: true,
            message: message.to_string(),
            data: Some(data),
        },
    )
}

/// 200 without `data`
pub fn success_message(message: &str) -> Response<Full<Bytes>> {
    json_response(
        StatusCode::OK,
        &Envelope::<()> {
            success: true,
            message: message.to_string(),
            data: None,
        },
    )
}

pub fn failure(status: StatusCode, message: &str) -> Response<Full<Bytes>> {
    json_response(
        status,
        &Envelope::<()> {
            success: false,
            message: message.to_string(),
            data: None,
        },
    )
}

pub fn not_found() -> Response<Full<Bytes>> {
    failure(StatusCode::NOT_FOUND, "Route not found.")
}

/// 405 with the methods the path does accept
pub fn method_not_allowed(allow: &'static str) -> Response<Full<Bytes>> {
    let mut response = failure(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed.");
    response
        .headers_mut()
        .insert(ALLOW, HeaderValue::from_static(allow));
    response
}
