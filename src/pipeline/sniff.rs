//! Content-type detection from the byte prefix
//!
//! The crawler does not trust response headers for dispatch decisions; the
//! type is sniffed from the first bytes of the body. Only the types the
//! pipeline actually dispatches on are distinguished: images go to the
//! analyzers, a handful of binary/document types go to file persistence,
//! markup goes to link extraction, everything else falls back to a plain
//! or opaque type.

/// Number of leading bytes consulted when sniffing
const SNIFF_LEN: usize = 512;

// Tags whose appearance at the start of a document identify HTML.
const HTML_PREFIXES: &[&str] = &[
    "<!doctype html", "<html", "<head", "<body", "<script", "<iframe", "<h1", "<div", "<font",
    "<table", "<a", "<style", "<title", "<b", "<br", "<p", "<!--",
];

/// Detects the content type of a payload from its leading bytes
pub fn detect_content_type(body: &[u8]) -> &'static str {
    let prefix = &body[..body.len().min(SNIFF_LEN)];

    if let Some(t) = match_magic(prefix) {
        return t;
    }
    if looks_like_html(prefix) {
        return "text/html";
    }
    if std::str::from_utf8(prefix).is_ok() && !has_binary_bytes(prefix) {
        return "text/plain";
    }
    "application/octet-stream"
}

/// Whether a sniffed content type carries extractable markup
pub fn is_markup(content_type: &str) -> bool {
    content_type.starts_with("text/html")
}

/// Whether a sniffed content type is an image the analyzers understand
pub fn is_image(content_type: &str) -> bool {
    content_type.starts_with("image/")
}

/// Whether a sniffed content type should be handed to file persistence
pub fn is_archivable(content_type: &str) -> bool {
    matches!(
        content_type,
        "application/pdf"
            | "application/zip"
            | "application/x-gzip"
            | "video/mp4"
            | "text/plain"
    )
}

fn match_magic(prefix: &[u8]) -> Option<&'static str> {
    if prefix.starts_with(b"\x89PNG\r\n\x1a\n") {
        return Some("image/png");
    }
    if prefix.starts_with(b"\xff\xd8\xff") {
        return Some("image/jpeg");
    }
    if prefix.starts_with(b"GIF87a") || prefix.starts_with(b"GIF89a") {
        return Some("image/gif");
    }
    if prefix.starts_with(b"%PDF-") {
        return Some("application/pdf");
    }
    if prefix.starts_with(b"PK\x03\x04") {
        return Some("application/zip");
    }
    if prefix.starts_with(b"\x1f\x8b") {
        return Some("application/x-gzip");
    }
    // ISO base media: size box then "ftyp".
    if prefix.len() >= 12 && &prefix[4..8] == b"ftyp" {
        return Some("video/mp4");
    }
    None
}

fn looks_like_html(prefix: &[u8]) -> bool {
    let Ok(text) = std::str::from_utf8(prefix) else {
        return false;
    };
    let trimmed = text.trim_start().to_lowercase();
    HTML_PREFIXES.iter().any(|p| {
        trimmed.starts_with(p)
            && trimmed[p.len()..]
                .chars()
                .next()
                .map(|c| c == '>' || c.is_whitespace() || c == '/')
                .unwrap_or(true)
    })
}

fn has_binary_bytes(prefix: &[u8]) -> bool {
    prefix
        .iter()
        .any(|&b| b < 0x09 || (0x0e..0x20).contains(&b) || b == 0x7f)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_html_documents() {
        assert_eq!(
            detect_content_type(b"<!DOCTYPE html><html><body></body></html>"),
            "text/html"
        );
        assert_eq!(detect_content_type(b"  \n<html lang=\"en\">"), "text/html");
        assert_eq!(detect_content_type(b"<div class=\"x\">hi</div>"), "text/html");
    }

    #[test]
    fn detects_image_magic_numbers() {
        assert_eq!(
            detect_content_type(b"\x89PNG\r\n\x1a\n____"),
            "image/png"
        );
        assert_eq!(detect_content_type(b"\xff\xd8\xff\xe0rest"), "image/jpeg");
        assert_eq!(detect_content_type(b"GIF89a___"), "image/gif");
    }

    #[test]
    fn detects_documents_and_archives() {
        assert_eq!(detect_content_type(b"%PDF-1.7 ..."), "application/pdf");
        assert_eq!(detect_content_type(b"PK\x03\x04rest"), "application/zip");
        assert_eq!(detect_content_type(b"\x1f\x8b\x08rest"), "application/x-gzip");
    }

    #[test]
    fn plain_text_falls_through() {
        assert_eq!(detect_content_type(b"hello, plain world"), "text/plain");
    }

    #[test]
    fn binary_noise_is_opaque() {
        assert_eq!(
            detect_content_type(&[0x00, 0x01, 0x02, 0xfe, 0xff]),
            "application/octet-stream"
        );
    }

    #[test]
    fn dispatch_predicates() {
        assert!(is_markup("text/html"));
        assert!(!is_markup("text/plain"));
        assert!(is_image("image/jpeg"));
        assert!(is_archivable("application/pdf"));
        assert!(!is_archivable("text/html"));
    }
}
