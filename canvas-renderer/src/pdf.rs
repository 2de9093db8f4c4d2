//! Write an [`ExportPlan`] as a single-page PDF.
//!
//! The page is assembled directly as PDF objects through the `lopdf` layer
//! that printpdf is built on. Raster tiles become RGB image XObjects with a
//! separate `DeviceGray` soft mask stream carrying their alpha.
//!
//! Page pixels map to points at 96 DPI (1 px = 0.75 pt). PDF space has its
//! origin at the bottom-left, so every y coordinate is flipped against the
//! page height.

use printpdf::lopdf::content::{Content, Operation};
use printpdf::lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat};

use crate::color::Rgba;
use crate::error::{RenderError, RenderResult};
use crate::layout::{ExportPlan, Layer, TextBlock};
use crate::raster::RasterTile;
use crate::text::PT_PER_PX;

/// Convert page pixels to PDF points.
#[must_use]
pub fn px_to_pt(px: f32) -> f32 {
    px * PT_PER_PX
}

fn real(value: f32) -> Object {
    Object::Real(value.into())
}

fn name(value: &str) -> Object {
    Object::Name(value.as_bytes().to_vec())
}

fn int(value: u32) -> Object {
    Object::Integer(i64::from(value))
}

/// Encode `text` for a base-14 font with `WinAnsiEncoding`.
///
/// Latin-1 maps directly, the common typographic punctuation maps to its
/// WinAnsi slot and anything else becomes `?`.
#[must_use]
pub fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\u{20}'..='\u{7e}' | '\u{a0}'..='\u{ff}' => u8::try_from(u32::from(c)).unwrap_or(b'?'),
            '\u{20ac}' => 0x80,
            '\u{2026}' => 0x85,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201c}' => 0x93,
            '\u{201d}' => 0x94,
            '\u{2022}' => 0x95,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            _ => b'?',
        })
        .collect()
}

struct PageWriter {
    doc: Document,
    page_height: f32,
    ops: Vec<Operation>,
    fonts: Vec<(&'static str, String, ObjectId)>,
    images: Vec<(String, ObjectId)>,
}

impl PageWriter {
    fn new(page_height: f32) -> Self {
        Self {
            doc: Document::with_version("1.5"),
            page_height,
            ops: Vec::new(),
            fonts: Vec::new(),
            images: Vec::new(),
        }
    }

    fn op(&mut self, operator: &str, operands: Vec<Object>) {
        self.ops.push(Operation::new(operator, operands));
    }

    fn x(x: f32) -> Object {
        real(px_to_pt(x))
    }

    fn y(&self, y: f32) -> Object {
        real(px_to_pt(self.page_height - y))
    }

    fn font(&mut self, base_font: &'static str) -> String {
        if let Some((_, resource, _)) = self.fonts.iter().find(|(known, _, _)| *known == base_font) {
            return resource.clone();
        }
        let mut dict = Dictionary::new();
        dict.set("Type", name("Font"));
        dict.set("Subtype", name("Type1"));
        dict.set("BaseFont", name(base_font));
        dict.set("Encoding", name("WinAnsiEncoding"));
        let id = self.doc.add_object(dict);
        let resource = format!("F{}", self.fonts.len() + 1);
        self.fonts.push((base_font, resource.clone(), id));
        resource
    }

    fn set_fill(&mut self, color: Rgba) {
        let (r, g, b) = color.unit_rgb();
        self.op("rg", vec![real(r), real(g), real(b)]);
    }

    fn set_stroke(&mut self, color: Rgba, line_px: f32) {
        let (r, g, b) = color.unit_rgb();
        self.op("RG", vec![real(r), real(g), real(b)]);
        self.op("w", vec![real(px_to_pt(line_px))]);
    }

    fn rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        let bottom = self.y(y + height);
        self.op(
            "re",
            vec![Self::x(x), bottom, real(px_to_pt(width)), real(px_to_pt(height))],
        );
    }

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Rgba) {
        self.set_fill(color);
        self.rect(x, y, width, height);
        self.op("f", Vec::new());
    }

    fn stroke_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Rgba, line_px: f32) {
        self.set_stroke(color, line_px);
        self.rect(x, y, width, height);
        self.op("S", Vec::new());
    }

    fn raster(&mut self, tile: &RasterTile) {
        let (width, height) = tile.image.dimensions();
        if width == 0 || height == 0 {
            return;
        }
        let pixels = tile.image.as_raw();
        let rgb: Vec<u8> = pixels
            .chunks_exact(4)
            .flat_map(|px| [px[0], px[1], px[2]])
            .collect();
        let alpha: Vec<u8> = pixels.chunks_exact(4).map(|px| px[3]).collect();

        let mut dict = Dictionary::new();
        dict.set("Type", name("XObject"));
        dict.set("Subtype", name("Image"));
        dict.set("Width", int(width));
        dict.set("Height", int(height));
        dict.set("ColorSpace", name("DeviceRGB"));
        dict.set("BitsPerComponent", Object::Integer(8));
        if alpha.iter().any(|&a| a < u8::MAX) {
            let mut mask = Dictionary::new();
            mask.set("Type", name("XObject"));
            mask.set("Subtype", name("Image"));
            mask.set("Width", int(width));
            mask.set("Height", int(height));
            mask.set("ColorSpace", name("DeviceGray"));
            mask.set("BitsPerComponent", Object::Integer(8));
            let mask_id = self.doc.add_object(Stream::new(mask, alpha));
            dict.set("SMask", Object::Reference(mask_id));
        }
        let image_id = self.doc.add_object(Stream::new(dict, rgb));
        let resource = format!("Im{}", self.images.len() + 1);
        self.images.push((resource.clone(), image_id));

        let bottom = self.y(tile.y + tile.height);
        self.op("q", Vec::new());
        self.op(
            "cm",
            vec![
                real(px_to_pt(tile.width)),
                real(0.0),
                real(0.0),
                real(px_to_pt(tile.height)),
                Self::x(tile.x),
                bottom,
            ],
        );
        self.op("Do", vec![name(&resource)]);
        self.op("Q", Vec::new());
    }

    fn text(&mut self, block: &TextBlock) {
        let (x, y, width, height) = block.frame;
        if let Some(fill) = block.fill {
            self.fill_rect(x, y, width, height, fill);
        }
        if let Some((color, line_px)) = block.border {
            self.stroke_rect(x, y, width, height, color, line_px);
        }

        let font = self.font(block.face.base_font());
        let size_pt = px_to_pt(block.font_size);
        for line in block.lines.iter().filter(|line| !line.text.trim().is_empty()) {
            self.set_fill(block.color);
            let baseline = self.y(line.baseline);
            self.op("BT", Vec::new());
            self.op("Tf", vec![name(&font), real(size_pt)]);
            self.op("Td", vec![Self::x(line.x), baseline]);
            self.op(
                "Tj",
                vec![Object::String(win_ansi(&line.text), StringFormat::Literal)],
            );
            self.op("ET", Vec::new());

            if block.underline {
                let offset = line.baseline + block.font_size * 0.12;
                let thickness = (block.font_size * 0.06).max(1.0);
                self.set_stroke(block.color, thickness);
                let rule_y = self.y(offset);
                self.op("m", vec![Self::x(line.x), rule_y.clone()]);
                self.op("l", vec![Self::x(line.x + line.width), rule_y]);
                self.op("S", Vec::new());
            }
        }
    }

    fn finish(mut self, title: &str, page_width: f32) -> RenderResult<Vec<u8>> {
        let content = Content {
            operations: std::mem::take(&mut self.ops),
        }
        .encode()
        .map_err(|e| RenderError::Export(format!("Cannot encode page content: {e}")))?;
        let content_id = self.doc.add_object(Stream::new(Dictionary::new(), content));

        let mut fonts = Dictionary::new();
        for (_, resource, id) in &self.fonts {
            fonts.set(resource.as_str(), Object::Reference(*id));
        }
        let mut images = Dictionary::new();
        for (resource, id) in &self.images {
            images.set(resource.as_str(), Object::Reference(*id));
        }
        let mut resources = Dictionary::new();
        resources.set("Font", fonts);
        resources.set("XObject", images);

        let pages_id = self.doc.new_object_id();
        let mut page = Dictionary::new();
        page.set("Type", name("Page"));
        page.set("Parent", Object::Reference(pages_id));
        page.set(
            "MediaBox",
            vec![
                real(0.0),
                real(0.0),
                real(px_to_pt(page_width)),
                real(px_to_pt(self.page_height)),
            ],
        );
        page.set("Contents", Object::Reference(content_id));
        page.set("Resources", resources);
        let page_id = self.doc.add_object(page);

        let mut pages = Dictionary::new();
        pages.set("Type", name("Pages"));
        pages.set("Kids", vec![Object::Reference(page_id)]);
        pages.set("Count", Object::Integer(1));
        self.doc.objects.insert(pages_id, Object::Dictionary(pages));

        let mut catalog = Dictionary::new();
        catalog.set("Type", name("Catalog"));
        catalog.set("Pages", Object::Reference(pages_id));
        let catalog_id = self.doc.add_object(catalog);

        let mut info = Dictionary::new();
        info.set("Title", Object::string_literal(win_ansi(title)));
        info.set("Producer", Object::string_literal("canvas-renderer"));
        let info_id = self.doc.add_object(info);

        self.doc.trailer.set("Root", Object::Reference(catalog_id));
        self.doc.trailer.set("Info", Object::Reference(info_id));
        self.doc.compress();

        let mut bytes = Vec::new();
        self.doc
            .save_to(&mut bytes)
            .map_err(|e| RenderError::Export(format!("PDF save failed: {e}")))?;
        Ok(bytes)
    }
}

/// Render `plan` to PDF bytes.
///
/// # Errors
///
/// Returns [`RenderError::Export`] if the page content cannot be encoded or
/// the document cannot be serialized.
pub fn write_pdf(plan: &ExportPlan, title: &str) -> RenderResult<Vec<u8>> {
    let mut page = PageWriter::new(plan.page_height);
    page.fill_rect(0.0, 0.0, plan.page_width, plan.page_height, plan.background);

    for layer in &plan.layers {
        match layer {
            Layer::Raster(tile) => page.raster(tile),
            Layer::Text(block) => page.text(block),
        }
    }

    if let Some((color, width)) = plan.border {
        let inset = width / 2.0;
        page.stroke_rect(
            inset,
            inset,
            plan.page_width - width,
            plan.page_height - width,
            color,
            width,
        );
    }
    page.finish(title, plan.page_width)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan_with(layers: Vec<Layer>) -> ExportPlan {
        ExportPlan {
            page_width: 200.0,
            page_height: 100.0,
            background: Rgba::WHITE,
            layers,
            border: Some((Rgba::BLACK, 2.0)),
        }
    }

    #[test]
    fn test_px_to_pt() {
        assert!((px_to_pt(96.0) - 72.0).abs() < 1e-4);
        // A4 at 96 DPI
        assert!((px_to_pt(794.0) - 595.5).abs() < 0.1);
        assert!((px_to_pt(1123.0) - 842.25).abs() < 0.1);
    }

    #[test]
    fn test_win_ansi() {
        assert_eq!(win_ansi("Hi!"), b"Hi!".to_vec());
        assert_eq!(win_ansi("caf\u{e9}"), vec![b'c', b'a', b'f', 0xe9]);
        assert_eq!(win_ansi("\u{2014}\u{4e2d}"), vec![0x97, b'?']);
    }

    #[test]
    fn test_empty_plan_is_a_pdf() {
        let bytes = write_pdf(&plan_with(Vec::new()), "Empty").expect("pdf");
        assert!(bytes.starts_with(b"%PDF-"));

        let doc = Document::load_mem(&bytes).expect("parse");
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn test_opaque_tile_has_no_mask() {
        let tile = RasterTile {
            x: 10.0,
            y: 10.0,
            width: 4.0,
            height: 2.0,
            image: image::RgbaImage::from_pixel(4, 2, image::Rgba([0, 0, 255, 255])),
        };
        let bytes = write_pdf(&plan_with(vec![Layer::Raster(tile)]), "Opaque").expect("pdf");
        let doc = Document::load_mem(&bytes).expect("parse");

        let images: Vec<&Stream> = doc
            .objects
            .values()
            .filter_map(|object| object.as_stream().ok())
            .filter(|stream| {
                stream
                    .dict
                    .get(b"Subtype")
                    .and_then(Object::as_name)
                    .is_ok_and(|subtype| subtype == b"Image")
            })
            .collect();
        assert_eq!(images.len(), 1);
        assert!(images[0].dict.get(b"SMask").is_err());
    }
}
