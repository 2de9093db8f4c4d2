//! Export planning: from a document snapshot to an ordered list of layers.
//!
//! Text elements become [`TextBlock`]s written as native PDF text. Runs of
//! consecutive shape and image elements are flattened onto one
//! [`ScratchCanvas`] and become a single [`RasterTile`]. Layers are kept in
//! paint order so text and raster content interleave exactly as stacked on
//! the canvas.

use canvas_core::document::MAX_BLUR;
use canvas_core::{CanvasDocument, Element, ElementId, PageSettings, RichText, TextAlign, TextDecoration};

use crate::assets::{self, AssetSource};
use crate::color::Rgba;
use crate::error::{RenderError, RenderResult};
use crate::raster::{RasterTile, ScratchCanvas};
use crate::text::{self, FontFace, LINE_SPACING, TEXT_PADDING};

/// Font size used when an element carries none.
pub const DEFAULT_FONT_SIZE: f32 = 16.0;

/// One positioned line of text.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    /// Line content.
    pub text: String,
    /// Left edge of the line in page pixels, after alignment.
    pub x: f32,
    /// Baseline in page pixels from the top of the page.
    pub baseline: f32,
    /// Measured width in pixels.
    pub width: f32,
}

/// A text element resolved for PDF output.
#[derive(Debug, Clone)]
pub struct TextBlock {
    /// Source element.
    pub element: ElementId,
    /// Element box `(x, y, width, height)` in page pixels.
    pub frame: (f32, f32, f32, f32),
    /// Opaque box fill, if any.
    pub fill: Option<Rgba>,
    /// Opaque box outline colour and width, if any.
    pub border: Option<(Rgba, f32)>,
    /// Font face.
    pub face: FontFace,
    /// Font size in pixels.
    pub font_size: f32,
    /// Opaque text colour.
    pub color: Rgba,
    /// Draw an underline below each line.
    pub underline: bool,
    /// Wrapped lines, top to bottom.
    pub lines: Vec<PlacedLine>,
}

/// A layer of the exported page.
#[derive(Debug, Clone)]
pub enum Layer {
    /// Flattened shapes, images or background image.
    Raster(RasterTile),
    /// Native text.
    Text(TextBlock),
}

/// Everything the PDF writer needs, back to front.
#[derive(Debug, Clone)]
pub struct ExportPlan {
    /// Page width in pixels.
    pub page_width: f32,
    /// Page height in pixels.
    pub page_height: f32,
    /// Solid page colour beneath all layers.
    pub background: Rgba,
    /// Layers in paint order.
    pub layers: Vec<Layer>,
    /// Page frame colour and width, if any.
    pub border: Option<(Rgba, f32)>,
}

impl ExportPlan {
    /// Number of raster layers.
    #[must_use]
    pub fn raster_count(&self) -> usize {
        self.layers
            .iter()
            .filter(|layer| matches!(layer, Layer::Raster(_)))
            .count()
    }

    /// Text blocks in paint order.
    pub fn text_blocks(&self) -> impl Iterator<Item = &TextBlock> {
        self.layers.iter().filter_map(|layer| match layer {
            Layer::Text(block) => Some(block),
            Layer::Raster(_) => None,
        })
    }
}

/// Build the export plan for `document`.
///
/// Asset failures are logged and painted around; they never fail the plan.
///
/// # Errors
///
/// Returns [`RenderError::InvalidPage`] for an unusable page size and
/// [`RenderError::Export`] if a scratch canvas cannot be allocated.
pub fn plan(
    document: &CanvasDocument,
    assets: &dyn AssetSource,
    scale: f32,
) -> RenderResult<ExportPlan> {
    let page = &document.page;
    PageSettings::validate_size(page.width, page.height).map_err(|_| RenderError::InvalidPage {
        width: page.width,
        height: page.height,
    })?;

    let mut layers = Vec::new();
    let background = match resolve_background(document, assets, scale)? {
        Background::Color(color) => color,
        Background::Image(tile) => {
            layers.push(Layer::Raster(tile));
            Rgba::WHITE
        }
    };

    let mut scratch: Option<ScratchCanvas> = None;
    for element in document.paint_order() {
        if element.kind.is_raster() {
            if scratch.is_none() {
                scratch = Some(ScratchCanvas::new(page.width, page.height, scale)?);
            }
            if let Some(canvas) = scratch.as_mut() {
                canvas.paint_element(element, assets);
            }
            continue;
        }
        flush(&mut scratch, &mut layers);
        if let Some(block) = text_block(element, background) {
            layers.push(Layer::Text(block));
        }
    }
    flush(&mut scratch, &mut layers);

    let border = (page.border_width > 0.0)
        .then(|| Rgba::parse(&page.border_color))
        .flatten()
        .filter(|color| !color.is_transparent())
        .map(|color| (color.over(background), page.border_width));

    tracing::debug!(
        "Planned export: {} layers on {}x{} page",
        layers.len(),
        page.width,
        page.height
    );
    Ok(ExportPlan {
        page_width: page.width,
        page_height: page.height,
        background,
        layers,
        border,
    })
}

fn flush(scratch: &mut Option<ScratchCanvas>, layers: &mut Vec<Layer>) {
    if let Some(tile) = scratch.take().and_then(ScratchCanvas::into_tile) {
        layers.push(Layer::Raster(tile));
    }
}

enum Background {
    Color(Rgba),
    Image(RasterTile),
}

fn resolve_background(
    document: &CanvasDocument,
    assets: &dyn AssetSource,
    scale: f32,
) -> RenderResult<Background> {
    let source = document.background.trim();
    if source.is_empty() {
        return Ok(Background::Color(Rgba::WHITE));
    }
    if let Some(color) = Rgba::parse(source) {
        return Ok(Background::Color(color.over(Rgba::WHITE)));
    }

    let image = match assets::load_rgba(assets, source) {
        Ok(image) => image,
        Err(e) => {
            tracing::warn!("Background image unavailable, exporting on white: {e}");
            return Ok(Background::Color(Rgba::WHITE));
        }
    };
    let page = &document.page;
    let mut canvas = ScratchCanvas::new(page.width, page.height, scale)?;
    let blur = document.blur_amount.clamp(0.0, MAX_BLUR);
    if let Err(e) = canvas.paint_background(&image, blur) {
        tracing::warn!("Background image unusable, exporting on white: {e}");
        return Ok(Background::Color(Rgba::WHITE));
    }
    Ok(canvas
        .into_tile()
        .map_or(Background::Color(Rgba::WHITE), Background::Image))
}

/// Resolve a text element, or `None` if it has no text.
fn text_block(element: &Element, page: Rgba) -> Option<TextBlock> {
    let html = element.text.as_deref().filter(|html| !html.is_empty())?;
    let style = &element.style;
    let t = element.transform;
    let alpha = style.alpha();
    let blend = |color: Rgba| color.with_opacity(alpha).over(page);

    let face = FontFace::resolve(&style.font_family, style.font_weight, style.font_style);
    let font_size = if style.font_size > 0.0 {
        style.font_size
    } else {
        DEFAULT_FONT_SIZE
    };

    let plain = RichText::from_html(html).plain_text();
    let plain = text::sanitize(plain.trim_matches('\n'));
    let max_width = t.width - 2.0 * TEXT_PADDING;

    #[allow(clippy::cast_precision_loss)]
    let lines = text::wrap_lines(&plain, face, font_size, max_width)
        .into_iter()
        .enumerate()
        .map(|(index, line)| {
            let width = face.text_width(&line, font_size);
            let x = match style.text_align {
                TextAlign::Left => t.x + TEXT_PADDING,
                TextAlign::Center => t.x + (t.width - width) / 2.0,
                TextAlign::Right => t.x + t.width - TEXT_PADDING - width,
            };
            let baseline =
                (index as f32).mul_add(font_size * LINE_SPACING, t.y + font_size + TEXT_PADDING);
            PlacedLine {
                text: line,
                x,
                baseline,
                width,
            }
        })
        .collect();

    let fill = Rgba::parse(&style.background_color)
        .filter(|color| !color.is_transparent())
        .map(blend);
    let border = style
        .has_border()
        .then(|| Rgba::parse(&style.border_color))
        .flatten()
        .map(|color| (blend(color), style.border_width));
    let color = blend(Rgba::parse(&style.color).unwrap_or(Rgba::BLACK));

    Some(TextBlock {
        element: element.id.clone(),
        frame: (t.x, t.y, t.width, t.height),
        fill,
        border,
        face,
        font_size,
        color,
        underline: style.text_decoration == TextDecoration::Underline,
        lines,
    })
}
