//! Offscreen raster canvas for shapes, images and page backgrounds.
//!
//! Geometry is given in page pixels; the canvas itself is allocated at
//! `scale` device pixels per page pixel. Finished canvases are cropped to
//! their painted area and embedded in the PDF as one image each.

use image::imageops::{self, FilterType};
use image::RgbaImage;
use tiny_skia::{
    FillRule, FilterQuality, IntSize, Paint, Path, PathBuilder, Pixmap, PixmapPaint, Rect, Stroke,
    Transform,
};

use canvas_core::{Element, ElementKind};

use crate::assets::{self, AssetSource};
use crate::color::Rgba;
use crate::error::{RenderError, RenderResult};

/// Fill of the box drawn in place of an image that failed to load.
pub const PLACEHOLDER_FILL: Rgba = Rgba::rgb(0xcc, 0xcc, 0xcc);

/// Outline of the image placeholder.
pub const PLACEHOLDER_STROKE: Rgba = Rgba::rgb(0x99, 0x99, 0x99);

/// Outline width of the image placeholder in pixels.
pub const PLACEHOLDER_STROKE_WIDTH: f32 = 2.0;

/// Hexagon vertices as fractions of the element box.
const HEXAGON: [(f32, f32); 6] = [
    (0.5, 0.05),
    (0.95, 0.25),
    (0.95, 0.75),
    (0.5, 0.95),
    (0.05, 0.75),
    (0.05, 0.25),
];

/// Five-pointed star vertices as fractions of the element box.
const STAR: [(f32, f32); 10] = [
    (0.5, 0.1),
    (0.61, 0.35),
    (0.88, 0.35),
    (0.67, 0.52),
    (0.78, 0.78),
    (0.5, 0.6),
    (0.22, 0.78),
    (0.33, 0.52),
    (0.12, 0.35),
    (0.39, 0.35),
];

const TRIANGLE: [(f32, f32); 3] = [(0.5, 0.0), (1.0, 1.0), (0.0, 1.0)];

/// A painted, cropped region of a scratch canvas.
#[derive(Debug, Clone)]
pub struct RasterTile {
    /// Left edge in page pixels.
    pub x: f32,
    /// Top edge in page pixels.
    pub y: f32,
    /// Width in page pixels.
    pub width: f32,
    /// Height in page pixels.
    pub height: f32,
    /// Straight-alpha pixels at the canvas resolution.
    pub image: RgbaImage,
}

/// Full-page offscreen bitmap.
pub struct ScratchCanvas {
    pixmap: Pixmap,
    scale: f32,
    painted: usize,
}

impl std::fmt::Debug for ScratchCanvas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScratchCanvas")
            .field("width", &self.pixmap.width())
            .field("height", &self.pixmap.height())
            .field("scale", &self.scale)
            .field("painted", &self.painted)
            .finish()
    }
}

impl ScratchCanvas {
    /// Allocate a transparent canvas covering a `page_width` x `page_height`
    /// pixel page.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Export`] if the bitmap cannot be allocated.
    pub fn new(page_width: f32, page_height: f32, scale: f32) -> RenderResult<Self> {
        let width = device_extent(page_width * scale);
        let height = device_extent(page_height * scale);
        let pixmap = Pixmap::new(width, height).ok_or_else(|| {
            RenderError::Export(format!("Cannot allocate {width}x{height} scratch canvas"))
        })?;
        Ok(Self {
            pixmap,
            scale,
            painted: 0,
        })
    }

    /// Device pixels per page pixel.
    #[must_use]
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Canvas size in device pixels.
    #[must_use]
    pub fn device_size(&self) -> (u32, u32) {
        (self.pixmap.width(), self.pixmap.height())
    }

    /// Whether nothing has been painted yet.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.painted == 0
    }

    fn page_transform(&self) -> Transform {
        Transform::from_scale(self.scale, self.scale)
    }

    /// Paint a background image over white, cover-scaled to the page and
    /// Gaussian-blurred by `blur` page pixels.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Resource`] if the image is empty.
    pub fn paint_background(&mut self, image: &RgbaImage, blur: f32) -> RenderResult<()> {
        let (width, height) = self.device_size();
        let mut cover = cover_fit(image, width, height)?;
        if blur > 0.0 {
            cover = imageops::blur(&cover, blur * self.scale);
        }
        let layer = to_pixmap(&cover)?;
        self.pixmap.fill(Rgba::WHITE.to_skia());
        self.pixmap.draw_pixmap(
            0,
            0,
            layer.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
        self.painted += 1;
        Ok(())
    }

    /// Paint a shape or image element. Text elements are ignored.
    pub fn paint_element(&mut self, element: &Element, assets: &dyn AssetSource) {
        match element.kind {
            ElementKind::Text => {}
            ElementKind::Image => self.paint_image(element, assets),
            _ => self.paint_shape(element),
        }
    }

    fn paint_shape(&mut self, element: &Element) {
        let Some(path) = shape_path(element) else {
            tracing::debug!("Skipping degenerate shape {}", element.id);
            return;
        };
        let alpha = element.style.alpha();

        match Rgba::parse(&element.style.background_color) {
            Some(fill) if !fill.is_transparent() => self.fill(&path, fill.with_opacity(alpha)),
            Some(_) => {}
            None => tracing::warn!(
                "Unrecognized fill colour '{}' on {}",
                element.style.background_color,
                element.id
            ),
        }
        self.stroke_border(element, &path, alpha);
        self.painted += 1;
    }

    fn paint_image(&mut self, element: &Element, assets: &dyn AssetSource) {
        let Some(src) = element.image.as_deref().filter(|src| !src.trim().is_empty()) else {
            tracing::debug!("Image element {} has no source", element.id);
            return;
        };
        let t = element.transform;
        let Some(rect) = Rect::from_xywh(t.x, t.y, t.width, t.height) else {
            return;
        };
        let outline = PathBuilder::from_rect(rect);
        let alpha = element.style.alpha();

        let decoded = assets::load_rgba(assets, src).and_then(|image| to_pixmap(&image));
        match decoded {
            Ok(image) => {
                #[allow(clippy::cast_precision_loss)]
                let (sx, sy) = (
                    t.width / image.width() as f32,
                    t.height / image.height() as f32,
                );
                let transform =
                    Transform::from_row(sx, 0.0, 0.0, sy, t.x, t.y).post_scale(self.scale, self.scale);
                let paint = PixmapPaint {
                    opacity: alpha,
                    quality: FilterQuality::Bilinear,
                    ..PixmapPaint::default()
                };
                self.pixmap
                    .draw_pixmap(0, 0, image.as_ref(), &paint, transform, None);
                self.stroke_border(element, &outline, alpha);
            }
            Err(e) => {
                tracing::warn!("Image for element {} unavailable, drawing placeholder: {e}", element.id);
                self.fill(&outline, PLACEHOLDER_FILL.with_opacity(alpha));
                self.stroke(
                    &outline,
                    PLACEHOLDER_STROKE.with_opacity(alpha),
                    PLACEHOLDER_STROKE_WIDTH,
                );
            }
        }
        self.painted += 1;
    }

    fn stroke_border(&mut self, element: &Element, path: &Path, alpha: f32) {
        if !element.style.has_border() {
            return;
        }
        match Rgba::parse(&element.style.border_color) {
            Some(color) => self.stroke(path, color.with_opacity(alpha), element.style.border_width),
            None => tracing::warn!(
                "Unrecognized border colour '{}' on {}",
                element.style.border_color,
                element.id
            ),
        }
    }

    fn fill(&mut self, path: &Path, color: Rgba) {
        let mut paint = Paint::default();
        paint.set_color(color.to_skia());
        paint.anti_alias = true;
        self.pixmap
            .fill_path(path, &paint, FillRule::Winding, self.page_transform(), None);
    }

    fn stroke(&mut self, path: &Path, color: Rgba, width: f32) {
        let mut paint = Paint::default();
        paint.set_color(color.to_skia());
        paint.anti_alias = true;
        let stroke = Stroke {
            width,
            ..Stroke::default()
        };
        self.pixmap
            .stroke_path(path, &paint, &stroke, self.page_transform(), None);
    }

    /// Crop to the painted pixels. `None` if nothing visible was painted.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn into_tile(self) -> Option<RasterTile> {
        let (x0, y0, x1, y1) = self.painted_bounds()?;
        let stride = self.pixmap.width();
        let pixels = self.pixmap.pixels();
        let image = RgbaImage::from_fn(x1 - x0, y1 - y0, |x, y| {
            let index = ((y0 + y) * stride + x0 + x) as usize;
            let color = pixels[index].demultiply();
            image::Rgba([color.red(), color.green(), color.blue(), color.alpha()])
        });
        Some(RasterTile {
            x: x0 as f32 / self.scale,
            y: y0 as f32 / self.scale,
            width: (x1 - x0) as f32 / self.scale,
            height: (y1 - y0) as f32 / self.scale,
            image,
        })
    }

    /// Bounding box of non-transparent pixels, as `(x0, y0, x1, y1)` with
    /// exclusive upper bounds.
    fn painted_bounds(&self) -> Option<(u32, u32, u32, u32)> {
        if self.painted == 0 {
            return None;
        }
        let width = self.pixmap.width();
        let mut bounds: Option<(u32, u32, u32, u32)> = None;
        for (index, pixel) in self.pixmap.pixels().iter().enumerate() {
            if pixel.alpha() == 0 {
                continue;
            }
            #[allow(clippy::cast_possible_truncation)]
            let (x, y) = (index as u32 % width, index as u32 / width);
            bounds = Some(match bounds {
                None => (x, y, x + 1, y + 1),
                Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x + 1), y1.max(y + 1)),
            });
        }
        bounds
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn device_extent(length: f32) -> u32 {
    if length.is_finite() {
        length.ceil().max(1.0) as u32
    } else {
        1
    }
}

/// Outline of a shape element in page pixels.
fn shape_path(element: &Element) -> Option<Path> {
    let t = element.transform;
    let rect = Rect::from_xywh(t.x, t.y, t.width, t.height)?;
    match element.kind {
        ElementKind::Rectangle => {
            let radius = element
                .style
                .border_radius
                .min(t.width / 2.0)
                .min(t.height / 2.0);
            if radius > 0.0 {
                rounded_rect(rect, radius)
            } else {
                Some(PathBuilder::from_rect(rect))
            }
        }
        ElementKind::Circle => PathBuilder::from_oval(rect),
        ElementKind::Triangle => polygon(rect, &TRIANGLE),
        ElementKind::Hexagon => polygon(rect, &HEXAGON),
        ElementKind::Star => polygon(rect, &STAR),
        ElementKind::Text | ElementKind::Image => None,
    }
}

fn polygon(rect: Rect, points: &[(f32, f32)]) -> Option<Path> {
    let at = |(fx, fy): (f32, f32)| {
        (
            rect.width().mul_add(fx, rect.x()),
            rect.height().mul_add(fy, rect.y()),
        )
    };
    let mut pb = PathBuilder::new();
    let (first, rest) = points.split_first()?;
    let (x, y) = at(*first);
    pb.move_to(x, y);
    for point in rest {
        let (x, y) = at(*point);
        pb.line_to(x, y);
    }
    pb.close();
    pb.finish()
}

/// Rectangle with quadratic corners.
fn rounded_rect(rect: Rect, r: f32) -> Option<Path> {
    let (x, y, right, bottom) = (rect.left(), rect.top(), rect.right(), rect.bottom());
    let mut pb = PathBuilder::new();
    pb.move_to(x + r, y);
    pb.line_to(right - r, y);
    pb.quad_to(right, y, right, y + r);
    pb.line_to(right, bottom - r);
    pb.quad_to(right, bottom, right - r, bottom);
    pb.line_to(x + r, bottom);
    pb.quad_to(x, bottom, x, bottom - r);
    pb.line_to(x, y + r);
    pb.quad_to(x, y, x + r, y);
    pb.close();
    pb.finish()
}

/// Scale `image` to cover `width` x `height` and crop the centre.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn cover_fit(image: &RgbaImage, width: u32, height: u32) -> RenderResult<RgbaImage> {
    let (iw, ih) = image.dimensions();
    if iw == 0 || ih == 0 {
        return Err(RenderError::Resource("Background image is empty".to_string()));
    }
    let scale = (width as f32 / iw as f32).max(height as f32 / ih as f32);
    let sw = ((iw as f32 * scale).ceil() as u32).max(width);
    let sh = ((ih as f32 * scale).ceil() as u32).max(height);
    let resized = imageops::resize(image, sw, sh, FilterType::Triangle);
    Ok(imageops::crop_imm(&resized, (sw - width) / 2, (sh - height) / 2, width, height).to_image())
}

/// Convert straight-alpha RGBA into a premultiplied pixmap.
#[allow(clippy::cast_possible_truncation)]
fn to_pixmap(image: &RgbaImage) -> RenderResult<Pixmap> {
    let size = IntSize::from_wh(image.width(), image.height())
        .ok_or_else(|| RenderError::Resource("Image has no pixels".to_string()))?;
    let mut data = image.as_raw().clone();
    for px in data.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        for channel in &mut px[..3] {
            *channel = ((u16::from(*channel) * a + 127) / 255) as u8;
        }
    }
    Pixmap::from_vec(data, size)
        .ok_or_else(|| RenderError::Resource("Image dimensions too large".to_string()))
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::assets::{InlineAssets, PreloadedAssets};
    use canvas_core::ElementStyle;

    fn shape(kind: ElementKind, fill: &str) -> Element {
        Element::new(kind)
            .with_bounds(10.0, 20.0, 40.0, 30.0)
            .with_style(ElementStyle {
                background_color: fill.to_string(),
                ..ElementStyle::default()
            })
    }

    fn pixel(canvas: &ScratchCanvas, x: u32, y: u32) -> (u8, u8, u8, u8) {
        let c = canvas.pixmap.pixel(x, y).expect("in bounds").demultiply();
        (c.red(), c.green(), c.blue(), c.alpha())
    }

    fn png(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, image::Rgba(color));
        let mut out = std::io::Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).expect("encode");
        out.into_inner()
    }

    #[test]
    fn test_blank_canvas_has_no_tile() {
        let canvas = ScratchCanvas::new(100.0, 100.0, 1.0).expect("canvas");
        assert!(canvas.is_blank());
        assert!(canvas.into_tile().is_none());
    }

    #[test]
    fn test_rectangle_fill_and_crop() {
        let mut canvas = ScratchCanvas::new(100.0, 100.0, 1.0).expect("canvas");
        canvas.paint_element(&shape(ElementKind::Rectangle, "#ff0000"), &InlineAssets);
        assert_eq!(pixel(&canvas, 30, 35), (255, 0, 0, 255));
        assert_eq!(pixel(&canvas, 5, 5).3, 0);

        let tile = canvas.into_tile().expect("tile");
        assert_eq!((tile.x, tile.y, tile.width, tile.height), (10.0, 20.0, 40.0, 30.0));
        assert_eq!(tile.image.dimensions(), (40, 30));
    }

    #[test]
    fn test_scale_multiplies_device_pixels() {
        let mut canvas = ScratchCanvas::new(100.0, 50.0, 2.0).expect("canvas");
        assert_eq!(canvas.device_size(), (200, 100));
        canvas.paint_element(&shape(ElementKind::Rectangle, "#000"), &InlineAssets);
        let tile = canvas.into_tile().expect("tile");
        assert_eq!(tile.image.dimensions(), (80, 60));
        assert_eq!((tile.x, tile.width), (10.0, 40.0));
    }

    #[test]
    fn test_opacity_scales_alpha() {
        let mut element = shape(ElementKind::Circle, "#0000ff");
        element.style.opacity = 50;
        let mut canvas = ScratchCanvas::new(100.0, 100.0, 1.0).expect("canvas");
        canvas.paint_element(&element, &InlineAssets);
        let (_, _, b, a) = pixel(&canvas, 30, 35);
        assert!(b >= 250, "blue {b}");
        assert!((120..=135).contains(&a), "alpha {a}");
    }

    #[test]
    fn test_star_and_hexagon_cover_their_centre() {
        for kind in [ElementKind::Star, ElementKind::Hexagon, ElementKind::Triangle] {
            let mut canvas = ScratchCanvas::new(100.0, 100.0, 1.0).expect("canvas");
            canvas.paint_element(&shape(kind, "#00ff00"), &InlineAssets);
            assert_eq!(pixel(&canvas, 30, 35).1, 255, "{kind:?}");
        }
    }

    #[test]
    fn test_border_only_shape() {
        let mut element = shape(ElementKind::Rectangle, "transparent");
        element.style.border_width = 4.0;
        element.style.border_color = "#000000".to_string();
        let mut canvas = ScratchCanvas::new(100.0, 100.0, 1.0).expect("canvas");
        canvas.paint_element(&element, &InlineAssets);
        assert_eq!(pixel(&canvas, 30, 35).3, 0);
        assert_eq!(pixel(&canvas, 10, 35).3, 255);
    }

    #[test]
    fn test_failed_image_draws_placeholder() {
        let element = Element::image("/definitely/missing.png").with_bounds(0.0, 0.0, 50.0, 50.0);
        let mut canvas = ScratchCanvas::new(100.0, 100.0, 1.0).expect("canvas");
        canvas.paint_element(&element, &InlineAssets);
        assert_eq!(pixel(&canvas, 25, 25), (0xcc, 0xcc, 0xcc, 255));
        assert_eq!(pixel(&canvas, 0, 25).0, 0x99);
    }

    #[test]
    fn test_image_stretched_into_box() {
        let mut assets = PreloadedAssets::new();
        assets.insert("https://cdn.example.com/a.png", png(2, 2, [0, 200, 0, 255]));
        let element = Element::image("https://cdn.example.com/a.png")
            .with_bounds(20.0, 20.0, 60.0, 40.0);
        let mut canvas = ScratchCanvas::new(100.0, 100.0, 1.0).expect("canvas");
        canvas.paint_element(&element, &assets);
        assert_eq!(pixel(&canvas, 50, 40), (0, 200, 0, 255));
        assert_eq!(pixel(&canvas, 10, 10).3, 0);
    }

    #[test]
    fn test_background_covers_page() {
        let image = RgbaImage::from_pixel(10, 40, image::Rgba([10, 20, 30, 255]));
        let mut canvas = ScratchCanvas::new(80.0, 60.0, 1.0).expect("canvas");
        canvas.paint_background(&image, 3.0).expect("background");
        let tile = canvas.into_tile().expect("tile");
        assert_eq!(tile.image.dimensions(), (80, 60));
        let [r, g, b, a] = tile.image.get_pixel(40, 30).0;
        assert_eq!(a, 255);
        assert!(r.abs_diff(10) <= 1 && g.abs_diff(20) <= 1 && b.abs_diff(30) <= 1);
    }

    #[test]
    fn test_cover_fit_crops_centre() {
        let image = RgbaImage::from_fn(4, 2, |x, _| {
            if x < 2 {
                image::Rgba([255, 0, 0, 255])
            } else {
                image::Rgba([0, 0, 255, 255])
            }
        });
        let fitted = cover_fit(&image, 2, 2).expect("fit");
        assert_eq!(fitted.dimensions(), (2, 2));
        assert!(cover_fit(&RgbaImage::new(0, 0), 2, 2).is_err());
    }
}
