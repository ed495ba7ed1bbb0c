//! Request handler module
//!
//! Entry point for every request: CORS, size guard, dispatch to the JSON API
//! or the static upload route, and access logging.

pub mod router;
pub mod static_files;

// Re-export main entry point
pub use router::handle_request;
