//! Static file serving module
//!
//! Serves stored images under the public prefix with `ETag`, `HEAD` and
//! single-range support. Only direct children of the storage directory are
//! reachable.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;

use crate::handler::router::RequestContext;
use crate::http::{self, cache, mime, RangeOutcome};
use crate::logger;
use crate::storage::{ImageStore, StorageError};

/// Serve `raw_name` (the percent-encoded path remainder after the prefix)
pub async fn serve_upload(
    ctx: &RequestContext<'_>,
    store: &ImageStore,
    raw_name: &str,
) -> Response<Full<Bytes>> {
    let Ok(name) = urlencoding::decode(raw_name) else {
        return http::build_404_response();
    };

    match store.read(&name).await {
        Ok(content) => build_static_file_response(ctx, Bytes::from(content), mime::content_type_for(&name)),
        Err(StorageError::NotFound(_) | StorageError::InvalidName(_)) => {
            http::build_404_response()
        }
        Err(e) => {
            logger::log_error(&format!("Failed to serve '{name}': {e}"));
            http::build_500_response()
        }
    }
}

fn build_static_file_response(
    ctx: &RequestContext<'_>,
    data: Bytes,
    content_type: &str,
) -> Response<Full<Bytes>> {
    let etag = cache::generate_etag(&data);
    if cache::etag_matches(ctx.if_none_match, &etag) {
        return http::build_304_response(&etag);
    }

    match http::evaluate_range(ctx.range, data.len()) {
        RangeOutcome::Full => http::build_file_response(data, content_type, &etag, ctx.is_head),
        RangeOutcome::Partial(range) => {
            http::build_partial_response(&data, range, content_type, &etag, ctx.is_head)
        }
        RangeOutcome::Unsatisfiable => http::build_416_response(data.len()),
    }
}
