//! MIME type detection module
//!
//! Content-Type for stored files, inferred from the extension alone.

use crate::storage::whitelist::extension_of;

/// Content-Type for a stored filename, case-insensitive on the extension
pub fn content_type_for(filename: &str) -> &'static str {
    let ext = extension_of(filename);
    match ext.as_deref() {
        // Images
        Some(".png") => "image/png",
        Some(".jpg" | ".jpeg") => "image/jpeg",
        Some(".gif") => "image/gif",
        Some(".bmp") => "image/bmp",
        Some(".webp") => "image/webp",
        Some(".svg") => "image/svg+xml",
        Some(".ico") => "image/x-icon",
        Some(".tif" | ".tiff") => "image/tiff",
        Some(".avif") => "image/avif",

        // Anything else that ended up in the directory
        Some(".txt") => "text/plain; charset=utf-8",
        Some(".json") => "application/json",
        Some(".pdf") => "application/pdf",

        _ => "application/octet-stream",
    }
}
