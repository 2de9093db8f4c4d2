//! Text metrics and line wrapping for native PDF text.
//!
//! Export writes text with the PDF base-14 fonts, so widths come from their
//! published AFM metrics (units of 1/1000 em, printable ASCII). Italic and
//! oblique cuts reuse the upright widths.

use canvas_core::{FontStyle, FontWeight};

/// Horizontal text padding inside a text element, in pixels.
pub const TEXT_PADDING: f32 = 8.0;

/// Distance between consecutive baselines as a multiple of the font size.
pub const LINE_SPACING: f32 = 1.2;

/// Points per CSS pixel.
pub const PT_PER_PX: f32 = 0.75;

/// Base-14 font families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontFamily {
    /// Helvetica (sans serif, the fallback).
    Helvetica,
    /// Times (serif).
    Times,
    /// Courier (monospace).
    Courier,
}

impl FontFamily {
    /// Map a CSS `font-family` list to the closest base-14 family.
    #[must_use]
    pub fn from_css(family: &str) -> Self {
        let family = family.to_ascii_lowercase();
        for candidate in family.split(',') {
            let name = candidate.trim().trim_matches(|c| c == '"' || c == '\'');
            if name.contains("courier") || name.contains("mono") {
                return Self::Courier;
            }
            if name.contains("times") || name.contains("georgia") || name == "serif" {
                return Self::Times;
            }
            if name.contains("arial")
                || name.contains("helvetica")
                || name.contains("sans")
                || name.contains("verdana")
            {
                return Self::Helvetica;
            }
        }
        Self::Helvetica
    }
}

/// A concrete base-14 face.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FontFace {
    /// Family.
    pub family: FontFamily,
    /// Bold cut.
    pub bold: bool,
    /// Italic/oblique cut.
    pub italic: bool,
}

impl FontFace {
    /// Resolve the face for an element style.
    #[must_use]
    pub fn resolve(family: &str, weight: FontWeight, style: FontStyle) -> Self {
        Self {
            family: FontFamily::from_css(family),
            bold: weight == FontWeight::Bold,
            italic: style == FontStyle::Italic,
        }
    }

    /// PDF standard-14 base font name for this face.
    #[must_use]
    pub fn base_font(self) -> &'static str {
        match (self.family, self.bold, self.italic) {
            (FontFamily::Helvetica, false, false) => "Helvetica",
            (FontFamily::Helvetica, true, false) => "Helvetica-Bold",
            (FontFamily::Helvetica, false, true) => "Helvetica-Oblique",
            (FontFamily::Helvetica, true, true) => "Helvetica-BoldOblique",
            (FontFamily::Times, false, false) => "Times-Roman",
            (FontFamily::Times, true, false) => "Times-Bold",
            (FontFamily::Times, false, true) => "Times-Italic",
            (FontFamily::Times, true, true) => "Times-BoldItalic",
            (FontFamily::Courier, false, false) => "Courier",
            (FontFamily::Courier, true, false) => "Courier-Bold",
            (FontFamily::Courier, false, true) => "Courier-Oblique",
            (FontFamily::Courier, true, true) => "Courier-BoldOblique",
        }
    }

    /// Advance width of `c` in 1/1000 em.
    #[must_use]
    pub fn glyph_width(self, c: char) -> u16 {
        let table = match (self.family, self.bold) {
            (FontFamily::Courier, _) => return 600,
            (FontFamily::Helvetica, false) => &HELVETICA,
            (FontFamily::Helvetica, true) => &HELVETICA_BOLD,
            (FontFamily::Times, false) => &TIMES_ROMAN,
            (FontFamily::Times, true) => &TIMES_BOLD,
        };
        let code = u32::from(c);
        match code {
            32..=126 => table[(code - 32) as usize],
            // no-break space
            0xA0 => table[0],
            // unknown glyphs measured like a lowercase 'n'
            _ => table[(u32::from('n') - 32) as usize],
        }
    }

    /// Width of `text` in pixels at `font_size` pixels.
    #[must_use]
    pub fn text_width(self, text: &str, font_size: f32) -> f32 {
        let units: u32 = text.chars().map(|c| u32::from(self.glyph_width(c))).sum();
        #[allow(clippy::cast_precision_loss)]
        let units = units as f32;
        units * font_size / 1000.0
    }
}

/// Break `text` into lines no wider than `max_width` pixels.
///
/// Hard line breaks are kept, including empty lines. Within a paragraph,
/// words are added greedily; a single word wider than the limit gets a line
/// of its own rather than being split.
#[must_use]
pub fn wrap_lines(text: &str, face: FontFace, font_size: f32, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut current = String::new();
        for word in paragraph.split(' ') {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };
            if face.text_width(&candidate, font_size) > max_width && !current.is_empty() {
                lines.push(std::mem::replace(&mut current, word.to_string()));
            } else {
                current = candidate;
            }
        }
        lines.push(current);
    }
    lines
}

/// Tabs and stray control characters become spaces.
#[must_use]
pub fn sanitize(text: &str) -> String {
    text.chars()
        .map(|c| if c != '\n' && c.is_control() { ' ' } else { c })
        .collect()
}

#[rustfmt::skip]
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

#[rustfmt::skip]
const TIMES_ROMAN: [u16; 95] = [
    250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 278, 278, 564, 564, 564, 444,
    921, 722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889, 722, 722,
    556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611, 333, 278, 333, 469, 500,
    333, 444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778, 500, 500,
    500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444, 480, 200, 480, 541,
];

#[rustfmt::skip]
const TIMES_BOLD: [u16; 95] = [
    250, 333, 555, 500, 500, 1000, 833, 278, 333, 333, 500, 570, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 333, 333, 570, 570, 570, 500,
    930, 722, 667, 722, 722, 667, 611, 778, 778, 389, 500, 778, 667, 944, 722, 778,
    611, 778, 722, 556, 667, 722, 722, 1000, 722, 722, 667, 333, 278, 333, 581, 500,
    333, 500, 556, 444, 556, 444, 333, 500, 556, 278, 333, 556, 278, 833, 556, 500,
    556, 556, 444, 389, 333, 556, 500, 722, 500, 500, 444, 394, 220, 394, 520,
];
