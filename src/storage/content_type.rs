//! Content-type inference for restored objects

use std::path::Path;

/// Fallback for unknown or missing extensions
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Best-effort MIME type from a file extension (case-insensitive)
pub fn content_type_for(path: &Path) -> &'static str {
    let ext = match path.extension() {
        Some(ext) => ext.to_string_lossy().to_ascii_lowercase(),
        None => return DEFAULT_CONTENT_TYPE,
    };

    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "html" => "text/html",
        "css" => "text/css",
        "js" => "application/javascript",
        "json" => "application/json",
        "zip" => "application/zip",
        _ => DEFAULT_CONTENT_TYPE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_extensions() {
        assert_eq!(content_type_for(Path::new("covers/a.JPG")), "image/jpeg");
        assert_eq!(content_type_for(Path::new("covers/a.jpeg")), "image/jpeg");
        assert_eq!(content_type_for(Path::new("shots/b.webp")), "image/webp");
        assert_eq!(content_type_for(Path::new("logo.svg")), "image/svg+xml");
        assert_eq!(content_type_for(Path::new("data.json")), "application/json");
    }

    #[test]
    fn test_unknown_extension_falls_back() {
        assert_eq!(content_type_for(Path::new("game.iso")), DEFAULT_CONTENT_TYPE);
        assert_eq!(content_type_for(Path::new("README")), DEFAULT_CONTENT_TYPE);
    }
}
