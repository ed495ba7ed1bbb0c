//! Image storage module
//!
//! Filesystem-backed store for uploaded images. The storage directory listing is
//! the only source of truth: there is no index and no in-memory state.

mod error;
mod store;
pub mod whitelist;

pub use error::StorageError;
pub use store::{bytes_to_mib, ImageStore, StoredImage};
