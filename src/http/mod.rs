//! HTTP protocol layer module
//!
//! Protocol helpers decoupled from the image API: CORS, content types,
//! conditional requests, byte ranges and plain response builders.

pub mod cache;
pub mod cors;
pub mod mime;
pub mod range;
pub mod response;

pub use range::{evaluate_range, RangeOutcome};
pub use response::{
    build_304_response, build_404_response, build_416_response, build_500_response,
    build_file_response, build_partial_response,
};
