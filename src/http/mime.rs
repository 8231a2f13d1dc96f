//! MIME type detection module
//!
//! Resolves the Content-Type from the file extension, falling back to
//! signature sniffing over the leading bytes of the payload.

use std::path::Path;

/// Number of leading bytes inspected when sniffing
pub const SNIFF_LEN: usize = 512;

/// Fallback when neither the extension nor the content identifies the type
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Get MIME Content-Type based on file extension
///
/// Matching is case-insensitive. Returns `None` for unknown extensions so the
/// caller can fall back to sniffing.
///
/// # Examples
/// ```
/// use optserve::http::mime::content_type_for_extension;
/// assert_eq!(content_type_for_extension("html"), Some("text/html; charset=utf-8"));
/// assert_eq!(content_type_for_extension("MP4"), Some("video/mp4"));
/// assert_eq!(content_type_for_extension("xyz"), None);
/// ```
pub fn content_type_for_extension(extension: &str) -> Option<&'static str> {
    let ext = extension.to_ascii_lowercase();
    let mime = match ext.as_str() {
        // Text
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "txt" | "md" => "text/plain; charset=utf-8",
        "csv" => "text/csv; charset=utf-8",
        "xml" => "application/xml",

        // JavaScript/WASM
        "js" | "mjs" => "text/javascript; charset=utf-8",
        "json" | "map" => "application/json",
        "wasm" => "application/wasm",

        // Images
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "webp" => "image/webp",
        "avif" => "image/avif",

        // Video
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "ogv" => "video/ogg",
        "mov" => "video/quicktime",
        "avi" => "video/x-msvideo",

        // Audio
        "mp3" => "audio/mpeg",
        "ogg" => "audio/ogg",
        "wav" => "audio/wav",
        "flac" => "audio/flac",
        "m4a" => "audio/mp4",

        // Fonts
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "otf" => "font/otf",
        "eot" => "application/vnd.ms-fontobject",

        // Documents
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "gz" | "gzip" => "application/gzip",
        "tar" => "application/x-tar",

        _ => return None,
    };
    Some(mime)
}

/// Look up the Content-Type for a logical filename by its extension
pub fn content_type_for_name(name: &str) -> Option<&'static str> {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .and_then(content_type_for_extension)
}

/// Detect the Content-Type from the payload's leading bytes
///
/// Only the first [`SNIFF_LEN`] bytes are examined. Always returns a type,
/// defaulting to [`OCTET_STREAM`].
pub fn sniff(data: &[u8]) -> &'static str {
    let head = &data[..data.len().min(SNIFF_LEN)];

    if let Some(mime) = sniff_markup(head) {
        return mime;
    }
    if let Some(mime) = sniff_signature(head) {
        return mime;
    }

    // Byte order marks
    if head.starts_with(&[0xEF, 0xBB, 0xBF]) {
        return "text/plain; charset=utf-8";
    }
    if head.starts_with(&[0xFE, 0xFF]) {
        return "text/plain; charset=utf-16be";
    }
    if head.starts_with(&[0xFF, 0xFE]) {
        return "text/plain; charset=utf-16le";
    }

    if !head.is_empty() && !head.iter().copied().any(is_binary_byte) {
        return "text/plain; charset=utf-8";
    }

    OCTET_STREAM
}

/// Resolve the media type for a payload
///
/// Precedence: the extension table, then content sniffing.
pub fn detect(name: &str, data: &[u8]) -> &'static str {
    content_type_for_name(name).unwrap_or_else(|| sniff(data))
}

fn sniff_markup(head: &[u8]) -> Option<&'static str> {
    const HTML_TAGS: &[&[u8]] = &[
        b"<!doctype html",
        b"<html",
        b"<head",
        b"<script",
        b"<iframe",
        b"<h1",
        b"<div",
        b"<font",
        b"<table",
        b"<a",
        b"<style",
        b"<title",
        b"<b",
        b"<body",
        b"<br",
        b"<p",
        b"<!--",
    ];

    let start = head
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(head.len());
    let text = &head[start..];

    for tag in HTML_TAGS {
        if starts_with_ignore_case(text, tag) {
            // Tag must be terminated by a space or '>'
            if matches!(text.get(tag.len()), Some(b' ' | b'>')) {
                return Some("text/html; charset=utf-8");
            }
        }
    }

    if text.starts_with(b"<?xml") {
        return Some("text/xml; charset=utf-8");
    }
    None
}

fn sniff_signature(head: &[u8]) -> Option<&'static str> {
    let mime = if head.starts_with(b"%PDF-") {
        "application/pdf"
    } else if head.starts_with(b"%!PS-Adobe-") {
        "application/postscript"
    } else if head.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        "image/png"
    } else if head.starts_with(&[0xFF, 0xD8, 0xFF]) {
        "image/jpeg"
    } else if head.starts_with(b"GIF87a") || head.starts_with(b"GIF89a") {
        "image/gif"
    } else if head.starts_with(b"BM") {
        "image/bmp"
    } else if head.starts_with(&[0x00, 0x00, 0x01, 0x00]) || head.starts_with(&[0x00, 0x00, 0x02, 0x00]) {
        "image/x-icon"
    } else if riff_kind(head, b"WEBP") {
        "image/webp"
    } else if riff_kind(head, b"WAVE") {
        "audio/wave"
    } else if riff_kind(head, b"AVI ") {
        "video/avi"
    } else if head.starts_with(b"OggS\x00") {
        "application/ogg"
    } else if head.starts_with(b"ID3") {
        "audio/mpeg"
    } else if head.starts_with(&[0x1A, 0x45, 0xDF, 0xA3]) {
        "video/webm"
    } else if is_mp4(head) {
        "video/mp4"
    } else if head.starts_with(b"wOFF") {
        "font/woff"
    } else if head.starts_with(b"wOF2") {
        "font/woff2"
    } else if head.starts_with(&[0x1F, 0x8B, 0x08]) {
        "application/x-gzip"
    } else if head.starts_with(b"PK\x03\x04") || head.starts_with(b"PK\x05\x06") {
        "application/zip"
    } else if head.starts_with(b"Rar!\x1A\x07") {
        "application/x-rar-compressed"
    } else if head.starts_with(b"\x00asm") {
        "application/wasm"
    } else {
        return None;
    };
    Some(mime)
}

fn riff_kind(head: &[u8], kind: &[u8; 4]) -> bool {
    head.len() >= 12 && head.starts_with(b"RIFF") && &head[8..12] == kind
}

/// ISO base media file: a box size followed by `ftyp`
fn is_mp4(head: &[u8]) -> bool {
    if head.len() < 12 || &head[4..8] != b"ftyp" {
        return false;
    }
    let box_size = u32::from_be_bytes([head[0], head[1], head[2], head[3]]);
    usize::try_from(box_size).is_ok_and(|size| size % 4 == 0 && size <= head.len())
}

fn starts_with_ignore_case(haystack: &[u8], prefix: &[u8]) -> bool {
    haystack.len() >= prefix.len() && haystack[..prefix.len()].eq_ignore_ascii_case(prefix)
}

/// Control bytes that never appear in plain text
const fn is_binary_byte(b: u8) -> bool {
    matches!(b, 0x00..=0x08 | 0x0B | 0x0E..=0x1A | 0x1C..=0x1F)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_types() {
        assert_eq!(content_type_for_extension("html"), Some("text/html; charset=utf-8"));
        assert_eq!(content_type_for_extension("CSS"), Some("text/css; charset=utf-8"));
        assert_eq!(content_type_for_extension("json"), Some("application/json"));
        assert_eq!(content_type_for_extension("png"), Some("image/png"));
        assert_eq!(content_type_for_extension("mp4"), Some("video/mp4"));
    }

    #[test]
    fn test_unknown_extension() {
        assert_eq!(content_type_for_extension("xyz"), None);
        assert_eq!(content_type_for_name("Makefile"), None);
        assert_eq!(content_type_for_name("assets/app.min.js"), Some("text/javascript; charset=utf-8"));
    }

    #[test]
    fn test_sniff_signatures() {
        assert_eq!(sniff(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0]), "image/png");
        assert_eq!(sniff(&[0xFF, 0xD8, 0xFF, 0xE0]), "image/jpeg");
        assert_eq!(sniff(b"GIF89a\x01\x00"), "image/gif");
        assert_eq!(sniff(b"%PDF-1.7\n"), "application/pdf");
        assert_eq!(sniff(b"RIFF\x00\x00\x00\x00WEBPVP8 "), "image/webp");
        assert_eq!(sniff(b"\x00\x00\x00\x18ftypmp42\x00\x00\x00\x00mp42isom"), "video/mp4");
        assert_eq!(sniff(b"\x00asm\x01\x00\x00\x00"), "application/wasm");
    }

    #[test]
    fn test_sniff_markup() {
        assert_eq!(sniff(b"  <!DOCTYPE HTML><html>"), "text/html; charset=utf-8");
        assert_eq!(sniff(b"<p>hello</p>"), "text/html; charset=utf-8");
        assert_eq!(sniff(b"<?xml version=\"1.0\"?>"), "text/xml; charset=utf-8");
        // <pre is not <p
        assert_eq!(sniff(b"<pre>x</pre>"), "text/plain; charset=utf-8");
    }

    #[test]
    fn test_sniff_text_and_binary() {
        assert_eq!(sniff(b"just some words\n"), "text/plain; charset=utf-8");
        assert_eq!(sniff(&[0x00, 0x01, 0x02, 0x03]), OCTET_STREAM);
        assert_eq!(sniff(b""), OCTET_STREAM);
    }

    #[test]
    fn test_sniff_bounded_prefix() {
        let mut data = vec![b'a'; SNIFF_LEN];
        data.push(0x00);
        assert_eq!(sniff(&data), "text/plain; charset=utf-8");
    }

    #[test]
    fn test_detect_prefers_extension() {
        assert_eq!(detect("page.html", b"\x00\x01"), "text/html; charset=utf-8");
        assert_eq!(detect("blob", b"GIF87a"), "image/gif");
    }
}
