//! The persisted canvas document.
//!
//! This is the JSON a host stores between sessions:
//!
//! ```json
//! { "elements": [ ... ], "background": "#ffffff", "blurAmount": 0 }
//! ```
//!
//! `page` is optional and defaults to A4 at 96 DPI.

use serde::{Deserialize, Serialize};

use crate::{CanvasError, CanvasResult, Element};

/// A4 width in CSS pixels at 96 DPI.
pub const A4_WIDTH: f32 = 794.0;

/// A4 height in CSS pixels at 96 DPI.
pub const A4_HEIGHT: f32 = 1123.0;

/// Largest accepted page edge in pixels.
pub const MAX_PAGE_EDGE: f32 = 14_400.0;

/// Largest background blur radius in pixels.
pub const MAX_BLUR: f32 = 10.0;

/// Page size and frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageSettings {
    /// Page width in pixels.
    pub width: f32,
    /// Page height in pixels.
    pub height: f32,
    /// Colour of the page border.
    pub border_color: String,
    /// Page border width in pixels (0 = none).
    pub border_width: f32,
}

impl Default for PageSettings {
    fn default() -> Self {
        Self {
            width: A4_WIDTH,
            height: A4_HEIGHT,
            border_color: "#000000".to_string(),
            border_width: 0.0,
        }
    }
}

impl PageSettings {
    /// Check that `width` x `height` is a usable page.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::InvalidPageSize`] for non-finite, non-positive
    /// or oversized dimensions.
    pub fn validate_size(width: f32, height: f32) -> CanvasResult<()> {
        let ok = |edge: f32| (1.0..=MAX_PAGE_EDGE).contains(&edge);
        if ok(width) && ok(height) {
            Ok(())
        } else {
            Err(CanvasError::InvalidPageSize { width, height })
        }
    }

    /// Whether the page is wider than tall.
    #[must_use]
    pub fn is_landscape(&self) -> bool {
        self.width > self.height
    }
}

/// Elements plus page background, as persisted by the host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CanvasDocument {
    /// Elements (any order; `zIndex` decides paint order).
    pub elements: Vec<Element>,
    /// Background: colour, data URI, file path or URL. Empty means white.
    pub background: String,
    /// Background blur radius in pixels.
    pub blur_amount: f32,
    /// Page size and border.
    pub page: PageSettings,
}

impl CanvasDocument {
    /// Document on the default page.
    #[must_use]
    pub fn new(elements: Vec<Element>, background: impl Into<String>, blur_amount: f32) -> Self {
        Self {
            elements,
            background: background.into(),
            blur_amount,
            page: PageSettings::default(),
        }
    }

    /// Parse a stored document.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::Serialization`] if `json` is not a document.
    pub fn from_json(json: &str) -> CanvasResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parse a stored document, treating malformed input as empty.
    #[must_use]
    pub fn from_json_lenient(json: &str) -> Self {
        if json.trim().is_empty() {
            return Self::default();
        }
        match Self::from_json(json) {
            Ok(document) => document,
            Err(e) => {
                tracing::warn!("Discarding malformed canvas document: {e}");
                Self::default()
            }
        }
    }

    /// Serialize to pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::Serialization`] if serialization fails.
    pub fn to_json(&self) -> CanvasResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Visible elements, back to front. Ties keep list order.
    #[must_use]
    pub fn paint_order(&self) -> Vec<&Element> {
        let mut visible: Vec<&Element> = self.elements.iter().filter(|e| e.visible).collect();
        visible.sort_by_key(|e| e.transform.z_index);
        visible
    }

    /// Remote (`http`/`https`) image sources used by the page, deduplicated.
    #[must_use]
    pub fn remote_sources(&self) -> Vec<&str> {
        let mut sources: Vec<&str> = Vec::new();
        let candidates = std::iter::once(self.background.as_str()).chain(
            self.elements
                .iter()
                .filter(|e| e.visible)
                .filter_map(|e| e.image.as_deref()),
        );
        for src in candidates {
            let remote = src.starts_with("http://") || src.starts_with("https://");
            if remote && !sources.contains(&src) {
                sources.push(src);
            }
        }
        sources
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::ElementKind;

    #[test]
    fn test_parse_stored_document() {
        let json = r##"{
            "elements": [
                {"id": "b", "type": "circle", "x": 0, "y": 0, "width": 10, "height": 10, "zIndex": 2},
                {"id": "a", "type": "text", "x": 0, "y": 0, "width": 10, "height": 10, "zIndex": 1, "text": "hi"}
            ],
            "background": "#fafafa",
            "blurAmount": 3
        }"##;
        let document = CanvasDocument::from_json(json).expect("parse");
        assert_eq!(document.elements.len(), 2);
        assert_eq!(document.background, "#fafafa");
        assert_eq!(document.blur_amount, 3.0);
        assert_eq!(document.page, PageSettings::default());

        let order: Vec<_> = document.paint_order().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(order, vec!["a", "b"]);
    }

    #[test]
    fn test_lenient_parse_never_fails() {
        assert_eq!(CanvasDocument::from_json_lenient(""), CanvasDocument::default());
        assert_eq!(CanvasDocument::from_json_lenient("{not json"), CanvasDocument::default());
        assert!(CanvasDocument::from_json("{not json").is_err());
    }

    #[test]
    fn test_paint_order_skips_hidden() {
        let mut hidden = Element::new(ElementKind::Rectangle);
        hidden.visible = false;
        let shown = Element::new(ElementKind::Star);
        let document = CanvasDocument::new(vec![hidden, shown.clone()], "", 0.0);

        let order = document.paint_order();
        assert_eq!(order.len(), 1);
        assert_eq!(order[0].id, shown.id);
    }

    #[test]
    fn test_remote_sources_deduplicated() {
        let document = CanvasDocument::new(
            vec![
                Element::image("https://cdn.example.com/a.png"),
                Element::image("https://cdn.example.com/a.png"),
                Element::image("data:image/png;base64,AAAA"),
            ],
            "http://cdn.example.com/bg.jpg",
            0.0,
        );
        assert_eq!(
            document.remote_sources(),
            vec!["http://cdn.example.com/bg.jpg", "https://cdn.example.com/a.png"]
        );
    }

    #[test]
    fn test_page_size_validation() {
        assert!(PageSettings::validate_size(A4_WIDTH, A4_HEIGHT).is_ok());
        assert!(PageSettings::validate_size(0.0, 100.0).is_err());
        assert!(PageSettings::validate_size(f32::NAN, 100.0).is_err());
        assert!(PageSettings::validate_size(100.0, MAX_PAGE_EDGE * 2.0).is_err());
    }
}
