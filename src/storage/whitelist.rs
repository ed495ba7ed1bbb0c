//! Extension whitelist shared by upload validation and listing.

/// Permitted image extensions, lower-case with leading dot
pub const ALLOWED_EXTENSIONS: [&str; 6] = [".png", ".jpg", ".jpeg", ".gif", ".bmp", ".webp"];

/// Lower-cased extension of the last path component, including the dot.
///
/// Client-supplied names may carry a directory part, only the final component counts.
/// ```text
/// "photo.PNG"      -> Some(".png")
/// "a.tar.gz"       -> Some(".gz")
/// "README"         -> None
/// "dir.d/noext"    -> None
/// ```
pub fn extension_of(name: &str) -> Option<String> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    base.rfind('.').map(|idx| base[idx..].to_ascii_lowercase())
}

/// Returns the normalized extension when `name` is an allowed image file
pub fn allowed_extension(name: &str) -> Option<String> {
    extension_of(name).filter(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
}

pub fn is_allowed(name: &str) -> bool {
    allowed_extension(name).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("photo.PNG").as_deref(), Some(".png"));
        assert_eq!(extension_of("archive.tar.gz").as_deref(), Some(".gz"));
        assert_eq!(extension_of("C:\\Users\\me\\cat.JpEg").as_deref(), Some(".jpeg"));
        assert_eq!(extension_of("some.dir/noext"), None);
        assert_eq!(extension_of("README"), None);
    }

    #[test]
    fn test_whitelist_case_insensitive() {
        for name in ["a.png", "b.JPG", "c.jpeg", "d.Gif", "e.bmp", "f.WEBP"] {
            assert!(is_allowed(name), "{name} should be allowed");
        }
    }

    #[test]
    fn test_whitelist_rejects() {
        for name in ["doc.pdf", "image.svg", "noext", "png", "evil.png.exe", "trailing."] {
            assert!(!is_allowed(name), "{name} should be rejected");
        }
    }

    #[test]
    fn test_allowed_extension_is_normalized() {
        assert_eq!(allowed_extension("Holiday.WebP").as_deref(), Some(".webp"));
        assert_eq!(allowed_extension("doc.pdf"), None);
    }
}
