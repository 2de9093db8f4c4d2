//! Image source resolution for export.
//!
//! Element images and page backgrounds reference their pixels by string:
//! a `data:` URI, a local path (optionally `file://`), or an `http(s)` URL.
//! The exporter never touches the network itself; remote sources must be
//! fetched by the host beforehand and handed over via [`PreloadedAssets`].

use std::collections::HashMap;
use std::path::Path;

use crate::error::{RenderError, RenderResult};

/// Supported image formats, detected from content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// PNG with alpha support.
    Png,
    /// JPEG (no alpha).
    Jpeg,
    /// WebP (alpha support).
    WebP,
    /// GIF (first frame only).
    Gif,
    /// Unknown/other format.
    Unknown,
}

impl ImageFormat {
    /// Detect format from magic bytes.
    #[must_use]
    pub fn from_magic_bytes(data: &[u8]) -> Self {
        if data.len() < 4 {
            return Self::Unknown;
        }

        // PNG: 89 50 4E 47
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Self::Png;
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Self::Jpeg;
        }

        if data.starts_with(b"GIF8") {
            return Self::Gif;
        }

        // WebP: RIFF....WEBP
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            return Self::WebP;
        }

        Self::Unknown
    }
}

/// Resolves an image source string to encoded image bytes.
pub trait AssetSource: Send + Sync {
    /// Load the bytes behind `src`.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Resource`] if the source cannot be resolved.
    fn load(&self, src: &str) -> RenderResult<Vec<u8>>;
}

/// Resolves data URIs and local files. Remote URLs are refused.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineAssets;

impl AssetSource for InlineAssets {
    fn load(&self, src: &str) -> RenderResult<Vec<u8>> {
        let src = src.trim();
        if src.starts_with("data:") {
            return decode_data_uri(src);
        }
        if src.starts_with("http://") || src.starts_with("https://") {
            return Err(RenderError::Resource(format!(
                "Remote image was not prefetched: {src}"
            )));
        }
        let path = src.strip_prefix("file://").unwrap_or(src);
        std::fs::read(Path::new(path))
            .map_err(|e| RenderError::Resource(format!("Failed to read {path}: {e}")))
    }
}

/// Bytes fetched ahead of export, keyed by their source string.
///
/// Sources that were not preloaded fall through to [`InlineAssets`].
#[derive(Debug, Clone, Default)]
pub struct PreloadedAssets {
    entries: HashMap<String, Vec<u8>>,
}

impl PreloadedAssets {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the bytes for `src`.
    pub fn insert(&mut self, src: impl Into<String>, bytes: Vec<u8>) {
        self.entries.insert(src.into(), bytes);
    }

    /// Whether `src` was preloaded.
    #[must_use]
    pub fn contains(&self, src: &str) -> bool {
        self.entries.contains_key(src)
    }

    /// Number of preloaded sources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was preloaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl AssetSource for PreloadedAssets {
    fn load(&self, src: &str) -> RenderResult<Vec<u8>> {
        match self.entries.get(src) {
            Some(bytes) => Ok(bytes.clone()),
            None => InlineAssets.load(src),
        }
    }
}

/// Load and decode the image behind `src` to straight-alpha RGBA.
///
/// # Errors
///
/// Returns [`RenderError::Resource`] if the source cannot be resolved or
/// decoded.
pub fn load_rgba(assets: &dyn AssetSource, src: &str) -> RenderResult<image::RgbaImage> {
    let bytes = assets.load(src)?;
    decode_image(&bytes)
}

/// Decode encoded image bytes to straight-alpha RGBA.
///
/// # Errors
///
/// Returns [`RenderError::Resource`] if the bytes are not a decodable image.
pub fn decode_image(data: &[u8]) -> RenderResult<image::RgbaImage> {
    let format = ImageFormat::from_magic_bytes(data);
    let img = image::load_from_memory(data)
        .map_err(|e| RenderError::Resource(format!("Failed to decode {format:?} image: {e}")))?;
    Ok(img.to_rgba8())
}

/// Decode the payload of a `data:` URI (base64 or percent-encoded).
///
/// # Errors
///
/// Returns [`RenderError::Resource`] if the URI is malformed.
pub fn decode_data_uri(uri: &str) -> RenderResult<Vec<u8>> {
    let uri_data = uri
        .strip_prefix("data:")
        .ok_or_else(|| RenderError::Resource("Not a data URI".to_string()))?;

    let (metadata, encoded_data) = uri_data
        .split_once(',')
        .ok_or_else(|| RenderError::Resource("Invalid data URI: missing comma".to_string()))?;

    if metadata.contains(";base64") {
        use base64::Engine;
        // editors sometimes wrap long payloads
        let compact: String = encoded_data.split_whitespace().collect();
        base64::engine::general_purpose::STANDARD
            .decode(compact)
            .map_err(|e| RenderError::Resource(format!("Failed to decode base64: {e}")))
    } else {
        percent_decode(encoded_data)
    }
}

fn percent_decode(input: &str) -> RenderResult<Vec<u8>> {
    let bytes = input.as_bytes();
    let mut result = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' {
            let byte = bytes
                .get(i + 1..i + 3)
                .and_then(|hex| std::str::from_utf8(hex).ok())
                .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                .ok_or_else(|| RenderError::Resource("Invalid URL encoding".to_string()))?;
            result.push(byte);
            i += 3;
        } else {
            result.push(bytes[i]);
            i += 1;
        }
    }

    Ok(result)
}
