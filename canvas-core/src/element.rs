//! Canvas elements - the building blocks of a page.
//!
//! Elements serialize flat and camelCased (`backgroundColor`, `zIndex`, ...) so
//! documents written by older editors load unchanged.

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Smallest width an interactive resize may produce.
pub const MIN_WIDTH: f32 = 50.0;

/// Smallest height an interactive resize may produce.
pub const MIN_HEIGHT: f32 = 30.0;

/// Fill given to freshly added shapes.
pub const DEFAULT_SHAPE_FILL: &str = "#3b82f6";

/// Placeholder content of a freshly added text element.
pub const DEFAULT_TEXT: &str = "New Text";

/// Unique identifier for an element.
///
/// New ids are UUIDs, but any string is accepted when loading so that ids
/// minted by other editors survive a round trip.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(String);

impl ElementId {
    /// Create a new unique element ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wrap an existing identifier.
    #[must_use]
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ElementId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ElementId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// The type of content an element contains. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    /// Rich text block.
    Text,
    /// Rectangle, optionally with rounded corners.
    Rectangle,
    /// Ellipse inscribed in the element box.
    Circle,
    /// Isosceles triangle pointing up.
    Triangle,
    /// Hexagon inscribed in the element box.
    Hexagon,
    /// Five-pointed star.
    Star,
    /// Bitmap image.
    Image,
}

impl ElementKind {
    /// Whether this kind is painted on the scratch raster during export.
    #[must_use]
    pub fn is_raster(self) -> bool {
        !matches!(self, Self::Text)
    }

    /// Whether this kind is a vector shape.
    #[must_use]
    pub fn is_shape(self) -> bool {
        matches!(
            self,
            Self::Rectangle | Self::Circle | Self::Triangle | Self::Hexagon | Self::Star
        )
    }
}

/// Position, size and paint order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Transform {
    /// X position (pixels from the page's left edge).
    pub x: f32,
    /// Y position (pixels from the page's top edge).
    pub y: f32,
    /// Width in pixels.
    pub width: f32,
    /// Height in pixels.
    pub height: f32,
    /// Z-index for layering (ascending = back to front).
    pub z_index: i32,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 100.0,
            height: 100.0,
            z_index: 0,
        }
    }
}

/// Font weight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum FontWeight {
    /// Regular weight.
    #[default]
    Normal,
    /// Bold weight.
    Bold,
}

impl From<String> for FontWeight {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "bold" | "bolder" | "600" | "700" | "800" | "900" => Self::Bold,
            _ => Self::Normal,
        }
    }
}

/// Font slant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum FontStyle {
    /// Upright.
    #[default]
    Normal,
    /// Italic / oblique.
    Italic,
}

impl From<String> for FontStyle {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "italic" | "oblique" => Self::Italic,
            _ => Self::Normal,
        }
    }
}

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum TextAlign {
    /// Flush left.
    #[default]
    Left,
    /// Centered.
    Center,
    /// Flush right.
    Right,
}

impl From<String> for TextAlign {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "center" => Self::Center,
            "right" | "end" => Self::Right,
            _ => Self::Left,
        }
    }
}

/// Text decoration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum TextDecoration {
    /// No decoration.
    #[default]
    None,
    /// Underlined text.
    Underline,
}

impl From<String> for TextDecoration {
    fn from(value: String) -> Self {
        if value.to_ascii_lowercase().contains("underline") {
            Self::Underline
        } else {
            Self::None
        }
    }
}

/// List marker applied to every line of a text element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum ListStyle {
    /// Plain paragraphs.
    #[default]
    None,
    /// Bulleted list.
    Disc,
    /// Numbered list.
    Decimal,
}

impl From<String> for ListStyle {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "disc" => Self::Disc,
            "decimal" => Self::Decimal,
            _ => Self::None,
        }
    }
}

/// Decorative frame drawn around the element box.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum FrameType {
    /// No frame.
    #[default]
    None,
    /// Soft drop shadow.
    Shadow,
    /// Solid border.
    Border,
}

impl From<String> for FrameType {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "shadow" => Self::Shadow,
            "border" => Self::Border,
            _ => Self::None,
        }
    }
}

/// Visual style of an element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ElementStyle {
    /// Text color.
    pub color: String,
    /// Fill color (`transparent` for none).
    pub background_color: String,
    /// Font size in CSS pixels.
    pub font_size: f32,
    /// CSS font family list.
    pub font_family: String,
    /// Font weight.
    pub font_weight: FontWeight,
    /// Font slant.
    pub font_style: FontStyle,
    /// Horizontal alignment.
    pub text_align: TextAlign,
    /// Underline flag.
    pub text_decoration: TextDecoration,
    /// List marker.
    pub list_style: ListStyle,
    /// Extra spacing between characters in pixels.
    pub letter_spacing: f32,
    /// Line height multiplier.
    pub line_height: f32,
    /// Border width in pixels (0 = no border).
    pub border_width: f32,
    /// Border color.
    pub border_color: String,
    /// Corner radius in pixels.
    pub border_radius: f32,
    /// Opacity as an integer percentage.
    #[serde(deserialize_with = "deserialize_opacity")]
    pub opacity: u8,
    /// Decorative frame.
    pub frame_type: FrameType,
}

impl Default for ElementStyle {
    fn default() -> Self {
        Self {
            color: "#000000".to_string(),
            background_color: "transparent".to_string(),
            font_size: 16.0,
            font_family: "Arial, sans-serif".to_string(),
            font_weight: FontWeight::Normal,
            font_style: FontStyle::Normal,
            text_align: TextAlign::Left,
            text_decoration: TextDecoration::None,
            list_style: ListStyle::None,
            letter_spacing: 0.0,
            line_height: 1.5,
            border_width: 0.0,
            border_color: "#000000".to_string(),
            border_radius: 0.0,
            opacity: 100,
            frame_type: FrameType::None,
        }
    }
}

impl ElementStyle {
    /// Opacity as a 0.0..=1.0 factor.
    #[must_use]
    pub fn alpha(&self) -> f32 {
        f32::from(self.opacity.min(100)) / 100.0
    }

    /// Whether a border should be painted.
    #[must_use]
    pub fn has_border(&self) -> bool {
        self.border_width > 0.0 && !self.border_color.trim().is_empty()
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn deserialize_opacity<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    if raw.is_nan() {
        return Ok(100);
    }
    Ok(raw.round().clamp(0.0, 100.0) as u8)
}

const fn default_visible() -> bool {
    true
}

/// A canvas element with content, geometry and style.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    /// Unique identifier.
    #[serde(default)]
    pub id: ElementId,
    /// Element content type.
    #[serde(rename = "type")]
    pub kind: ElementKind,
    /// Position, size and paint order.
    #[serde(flatten)]
    pub transform: Transform,
    /// Visual style.
    #[serde(flatten)]
    pub style: ElementStyle,
    /// Locked elements cannot be dragged or resized.
    #[serde(default)]
    pub locked: bool,
    /// Hidden elements stay in the store but are not exported.
    #[serde(default = "default_visible")]
    pub visible: bool,
    /// Rich text content as HTML (text elements).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Image source: data URI, file path or remote URL (image elements).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl Element {
    /// Create a new element with the defaults for its kind.
    #[must_use]
    pub fn new(kind: ElementKind) -> Self {
        let (width, height) = match kind {
            ElementKind::Text => (200.0, 100.0),
            ElementKind::Image => (200.0, 200.0),
            _ => (100.0, 100.0),
        };
        let mut style = ElementStyle::default();
        if kind.is_shape() {
            style.background_color = DEFAULT_SHAPE_FILL.to_string();
        }

        Self {
            id: ElementId::new(),
            kind,
            transform: Transform {
                x: 50.0,
                y: 50.0,
                width,
                height,
                z_index: 0,
            },
            style,
            locked: false,
            visible: true,
            text: (kind == ElementKind::Text).then(|| DEFAULT_TEXT.to_string()),
            image: None,
        }
    }

    /// Create a text element with the given HTML content.
    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        let mut element = Self::new(ElementKind::Text);
        element.text = Some(content.into());
        element
    }

    /// Create an image element pointing at `src`.
    #[must_use]
    pub fn image(src: impl Into<String>) -> Self {
        let mut element = Self::new(ElementKind::Image);
        element.image = Some(src.into());
        element
    }

    /// Set the transform.
    #[must_use]
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Set position and size, keeping the z-index.
    #[must_use]
    pub fn with_bounds(mut self, x: f32, y: f32, width: f32, height: f32) -> Self {
        self.transform.x = x;
        self.transform.y = y;
        self.transform.width = width;
        self.transform.height = height;
        self
    }

    /// Set the style.
    #[must_use]
    pub fn with_style(mut self, style: ElementStyle) -> Self {
        self.style = style;
        self
    }

    /// Check if a point (in page coordinates) is within this element.
    #[must_use]
    pub fn contains_point(&self, x: f32, y: f32) -> bool {
        let t = &self.transform;
        x >= t.x && x <= t.x + t.width && y >= t.y && y <= t.y + t.height
    }
}

/// A partial update merged into an element by [`ElementStore::update`].
///
/// Absent fields are left untouched. Identity, kind and paint order are not
/// patchable; use the store's reorder operation for the latter.
///
/// [`ElementStore::update`]: crate::store::ElementStore::update
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[allow(missing_docs)]
pub struct ElementPatch {
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub width: Option<f32>,
    pub height: Option<f32>,
    pub color: Option<String>,
    pub background_color: Option<String>,
    pub font_size: Option<f32>,
    pub font_family: Option<String>,
    pub font_weight: Option<FontWeight>,
    pub font_style: Option<FontStyle>,
    pub text_align: Option<TextAlign>,
    pub text_decoration: Option<TextDecoration>,
    pub list_style: Option<ListStyle>,
    pub letter_spacing: Option<f32>,
    pub line_height: Option<f32>,
    pub border_width: Option<f32>,
    pub border_color: Option<String>,
    pub border_radius: Option<f32>,
    pub opacity: Option<u8>,
    pub frame_type: Option<FrameType>,
    pub locked: Option<bool>,
    pub visible: Option<bool>,
    pub text: Option<String>,
    pub image: Option<String>,
}

impl ElementPatch {
    /// Patch that only moves the element.
    #[must_use]
    pub fn position(x: f32, y: f32) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Self::default()
        }
    }

    /// Patch that moves and resizes the element.
    #[must_use]
    pub fn bounds(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            width: Some(width),
            height: Some(height),
            ..Self::default()
        }
    }

    /// Patch that replaces the text content.
    #[must_use]
    pub fn text(html: impl Into<String>) -> Self {
        Self {
            text: Some(html.into()),
            ..Self::default()
        }
    }

    /// Merge the present fields into `element`.
    pub fn apply_to(&self, element: &mut Element) {
        fn set<T: Clone>(slot: &mut T, value: Option<&T>) {
            if let Some(value) = value {
                slot.clone_from(value);
            }
        }

        let t = &mut element.transform;
        set(&mut t.x, self.x.as_ref());
        set(&mut t.y, self.y.as_ref());
        set(&mut t.width, self.width.as_ref());
        set(&mut t.height, self.height.as_ref());

        let s = &mut element.style;
        set(&mut s.color, self.color.as_ref());
        set(&mut s.background_color, self.background_color.as_ref());
        set(&mut s.font_size, self.font_size.as_ref());
        set(&mut s.font_family, self.font_family.as_ref());
        set(&mut s.font_weight, self.font_weight.as_ref());
        set(&mut s.font_style, self.font_style.as_ref());
        set(&mut s.text_align, self.text_align.as_ref());
        set(&mut s.text_decoration, self.text_decoration.as_ref());
        set(&mut s.list_style, self.list_style.as_ref());
        set(&mut s.letter_spacing, self.letter_spacing.as_ref());
        set(&mut s.line_height, self.line_height.as_ref());
        set(&mut s.border_width, self.border_width.as_ref());
        set(&mut s.border_color, self.border_color.as_ref());
        set(&mut s.border_radius, self.border_radius.as_ref());
        if let Some(opacity) = self.opacity {
            s.opacity = opacity.min(100);
        }
        set(&mut s.frame_type, self.frame_type.as_ref());

        set(&mut element.locked, self.locked.as_ref());
        set(&mut element.visible, self.visible.as_ref());
        if let Some(text) = &self.text {
            element.text = Some(text.clone());
        }
        if let Some(image) = &self.image {
            element.image = Some(image.clone());
        }
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_defaults() {
        let text = Element::new(ElementKind::Text);
        assert_eq!(text.transform.width, 200.0);
        assert_eq!(text.transform.height, 100.0);
        assert_eq!(text.text.as_deref(), Some(DEFAULT_TEXT));
        assert_eq!(text.style.background_color, "transparent");

        let star = Element::new(ElementKind::Star);
        assert_eq!(star.transform.width, 100.0);
        assert_eq!(star.transform.height, 100.0);
        assert_eq!(star.style.background_color, DEFAULT_SHAPE_FILL);
        assert!(star.text.is_none());

        let image = Element::image("data:image/png;base64,AAAA");
        assert_eq!(image.transform.width, 200.0);
        assert_eq!(image.transform.height, 200.0);
    }

    #[test]
    fn test_flat_camel_case_serialization() {
        let mut element = Element::new(ElementKind::Rectangle);
        element.transform.z_index = 3;
        let json = serde_json::to_value(&element).expect("serialize");

        assert_eq!(json["type"], "rectangle");
        assert_eq!(json["zIndex"], 3);
        assert_eq!(json["backgroundColor"], DEFAULT_SHAPE_FILL);
        assert_eq!(json["fontWeight"], "normal");
        assert!(json.get("text").is_none());
    }

    #[test]
    fn test_lenient_deserialization() {
        let json = r##"{
            "id": "lx2k9abc",
            "type": "text",
            "x": 10, "y": 20, "width": 300, "height": 80,
            "text": "<b>Hi</b>",
            "fontWeight": "700",
            "textAlign": "justify",
            "opacity": 55.6
        }"##;
        let element: Element = serde_json::from_str(json).expect("deserialize");

        assert_eq!(element.id.as_str(), "lx2k9abc");
        assert_eq!(element.style.font_weight, FontWeight::Bold);
        assert_eq!(element.style.text_align, TextAlign::Left);
        assert_eq!(element.style.opacity, 56);
        assert!(element.visible);
        assert!(!element.locked);
        assert_eq!(element.transform.z_index, 0);
        assert_eq!(element.style.font_size, 16.0);
    }

    #[test]
    fn test_patch_merges_present_fields_only() {
        let mut element = Element::new(ElementKind::Circle);
        let patch = ElementPatch {
            background_color: Some("#ff0000".to_string()),
            opacity: Some(250),
            ..ElementPatch::default()
        };
        patch.apply_to(&mut element);

        assert_eq!(element.style.background_color, "#ff0000");
        assert_eq!(element.style.opacity, 100);
        assert_eq!(element.transform.x, 50.0);
        assert_eq!(element.style.color, "#000000");
    }

    #[test]
    fn test_contains_point() {
        let element = Element::new(ElementKind::Rectangle).with_bounds(10.0, 10.0, 100.0, 50.0);
        assert!(element.contains_point(50.0, 30.0));
        assert!(!element.contains_point(5.0, 30.0));
        assert!(!element.contains_point(50.0, 70.0));
    }
}
