//! Rich text as a list of styled runs.
//!
//! Text elements persist their content as the small HTML dialect a
//! contenteditable surface produces. [`RichText`] parses that into runs,
//! applies inline formatting to character ranges and writes HTML back.
//! Line breaks are `'\n'` characters inside run text.

use serde::{Deserialize, Serialize};

/// Inline attributes of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct RunStyle {
    /// Bold weight.
    pub bold: bool,
    /// Italic slant.
    pub italic: bool,
    /// Underlined.
    pub underline: bool,
    /// CSS colour overriding the element colour.
    pub color: Option<String>,
}

/// A span of text sharing one style.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRun {
    /// Run content; may contain `'\n'`.
    pub text: String,
    /// Inline style.
    pub style: RunStyle,
}

/// A character range over [`RichText::plain_text`].
///
/// Offsets count Unicode scalar values, not bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextRange {
    /// First character (inclusive).
    pub start: usize,
    /// End character (exclusive).
    pub end: usize,
}

impl TextRange {
    /// Range between two offsets, in either order.
    #[must_use]
    pub fn new(anchor: usize, focus: usize) -> Self {
        Self {
            start: anchor.min(focus),
            end: anchor.max(focus),
        }
    }

    /// Whether the range selects nothing (a caret).
    #[must_use]
    pub fn is_collapsed(&self) -> bool {
        self.start >= self.end
    }
}

/// A formatting command applied to a range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "format", content = "value", rename_all = "snake_case")]
pub enum InlineFormat {
    /// Toggle bold.
    Bold,
    /// Toggle italic.
    Italic,
    /// Toggle underline.
    Underline,
    /// Set a colour.
    Color(String),
}

impl InlineFormat {
    fn present(&self, style: &RunStyle) -> bool {
        match self {
            Self::Bold => style.bold,
            Self::Italic => style.italic,
            Self::Underline => style.underline,
            Self::Color(color) => style.color.as_deref() == Some(color.as_str()),
        }
    }

    fn set(&self, style: &mut RunStyle, on: bool) {
        match self {
            Self::Bold => style.bold = on,
            Self::Italic => style.italic = on,
            Self::Underline => style.underline = on,
            Self::Color(color) => style.color = Some(color.clone()),
        }
    }
}

/// Parsed rich text content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RichText {
    runs: Vec<TextRun>,
}

impl RichText {
    /// Unstyled text.
    #[must_use]
    pub fn plain(text: impl Into<String>) -> Self {
        let mut rich = Self {
            runs: vec![TextRun {
                text: text.into(),
                style: RunStyle::default(),
            }],
        };
        rich.normalize();
        rich
    }

    /// Parse element HTML.
    ///
    /// Understands `b/strong`, `i/em`, `u`, `font color`, `span style`,
    /// `br`, `div` and `p`; other tags are dropped with their content kept.
    /// Leading and trailing line breaks are trimmed.
    #[must_use]
    pub fn from_html(html: &str) -> Self {
        let mut parser = HtmlParser::default();
        parser.feed(html);
        let mut rich = Self { runs: parser.runs };
        rich.trim_newlines();
        rich.normalize();
        rich
    }

    /// Serialize back to HTML. Single-line unstyled text stays plain.
    #[must_use]
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for run in &self.runs {
            let mut closing = Vec::new();
            if let Some(color) = &run.style.color {
                out.push_str("<span style=\"color: ");
                out.push_str(&escape(color));
                out.push_str(";\">");
                closing.push("</span>");
            }
            for (on, open, close) in [
                (run.style.bold, "<b>", "</b>"),
                (run.style.italic, "<i>", "</i>"),
                (run.style.underline, "<u>", "</u>"),
            ] {
                if on {
                    out.push_str(open);
                    closing.push(close);
                }
            }
            for (i, line) in run.text.split('\n').enumerate() {
                if i > 0 {
                    out.push_str("<br>");
                }
                out.push_str(&escape(line));
            }
            for close in closing.iter().rev() {
                out.push_str(close);
            }
        }
        out
    }

    /// The runs in order.
    #[must_use]
    pub fn runs(&self) -> &[TextRun] {
        &self.runs
    }

    /// Text without markup; lines separated by `'\n'`.
    #[must_use]
    pub fn plain_text(&self) -> String {
        self.runs.iter().map(|run| run.text.as_str()).collect()
    }

    /// Number of characters.
    #[must_use]
    pub fn char_len(&self) -> usize {
        self.runs.iter().map(|run| run.text.chars().count()).sum()
    }

    /// Whether `range` selects at least one character inside the text.
    #[must_use]
    pub fn fits(&self, range: TextRange) -> bool {
        !range.is_collapsed() && range.end <= self.char_len()
    }

    /// Whether every character in `range` already carries `format`.
    #[must_use]
    pub fn has_format(&self, range: TextRange, format: &InlineFormat) -> bool {
        if !self.fits(range) {
            return false;
        }
        let mut pos = 0;
        for run in &self.runs {
            let len = run.text.chars().count();
            let overlaps = pos < range.end && pos + len > range.start;
            if overlaps && !format.present(&run.style) {
                return false;
            }
            pos += len;
        }
        true
    }

    /// Apply `format` to `range`.
    ///
    /// Bold, italic and underline toggle: they are removed when the whole
    /// range already has them and set otherwise. Colour is always set.
    /// Returns `false` and leaves the text untouched when the range is
    /// collapsed or extends past the end.
    pub fn apply(&mut self, range: TextRange, format: &InlineFormat) -> bool {
        if !self.fits(range) {
            return false;
        }
        let on = matches!(format, InlineFormat::Color(_)) || !self.has_format(range, format);
        let first = self.split_at(range.start);
        let last = self.split_at(range.end);
        for run in &mut self.runs[first..last] {
            format.set(&mut run.style, on);
        }
        self.normalize();
        true
    }

    /// Ensure a run boundary at character `offset`; returns the index of
    /// the run starting there.
    fn split_at(&mut self, offset: usize) -> usize {
        let mut pos = 0;
        for i in 0..self.runs.len() {
            if offset == pos {
                return i;
            }
            let len = self.runs[i].text.chars().count();
            if offset < pos + len {
                let run = &mut self.runs[i];
                let byte = run
                    .text
                    .char_indices()
                    .nth(offset - pos)
                    .map_or(run.text.len(), |(byte, _)| byte);
                let tail = TextRun {
                    text: run.text.split_off(byte),
                    style: run.style.clone(),
                };
                self.runs.insert(i + 1, tail);
                return i + 1;
            }
            pos += len;
        }
        self.runs.len()
    }

    fn normalize(&mut self) {
        let mut merged: Vec<TextRun> = Vec::with_capacity(self.runs.len());
        for run in self.runs.drain(..) {
            if run.text.is_empty() {
                continue;
            }
            match merged.last_mut() {
                Some(last) if last.style == run.style => last.text.push_str(&run.text),
                _ => merged.push(run),
            }
        }
        self.runs = merged;
    }

    fn trim_newlines(&mut self) {
        while let Some(first) = self.runs.first_mut() {
            let trimmed = first.text.trim_start_matches('\n');
            if trimmed.is_empty() {
                self.runs.remove(0);
            } else {
                first.text = trimmed.to_string();
                break;
            }
        }
        while let Some(last) = self.runs.last_mut() {
            let trimmed = last.text.trim_end_matches('\n');
            if trimmed.is_empty() {
                self.runs.pop();
            } else {
                last.text = trimmed.to_string();
                break;
            }
        }
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Single-pass tag/text tokenizer with a style stack.
#[derive(Debug, Default)]
struct HtmlParser {
    runs: Vec<TextRun>,
    stack: Vec<(String, RunStyle)>,
}

impl HtmlParser {
    fn style(&self) -> RunStyle {
        self.stack
            .last()
            .map(|(_, style)| style.clone())
            .unwrap_or_default()
    }

    fn feed(&mut self, html: &str) {
        let mut rest = html;
        while !rest.is_empty() {
            match rest.find('<') {
                Some(0) => match rest.find('>') {
                    Some(end) => {
                        self.tag(&rest[1..end]);
                        rest = &rest[end + 1..];
                    }
                    None => {
                        // Unterminated tag: treat the remainder as text.
                        self.text(rest);
                        rest = "";
                    }
                },
                Some(start) => {
                    self.text(&rest[..start]);
                    rest = &rest[start..];
                }
                None => {
                    self.text(rest);
                    rest = "";
                }
            }
        }
    }

    fn ends_line(&self) -> bool {
        self.runs
            .last()
            .map_or(true, |run| run.text.is_empty() || run.text.ends_with('\n'))
    }

    fn push(&mut self, text: &str) {
        let style = self.style();
        match self.runs.last_mut() {
            Some(last) if last.style == style => last.text.push_str(text),
            _ => self.runs.push(TextRun {
                text: text.to_string(),
                style,
            }),
        }
    }

    fn text(&mut self, raw: &str) {
        let decoded = decode_entities(raw);
        if !decoded.is_empty() {
            self.push(&decoded);
        }
    }

    fn tag(&mut self, inner: &str) {
        let inner = inner.trim();
        if inner.starts_with('!') || inner.starts_with('?') {
            return;
        }
        let (closing, body) = match inner.strip_prefix('/') {
            Some(body) => (true, body),
            None => (false, inner),
        };
        let body = body.trim_end_matches('/');
        let name_end = body
            .find(|c: char| c.is_whitespace())
            .unwrap_or(body.len());
        let name = body[..name_end].to_ascii_lowercase();
        let attrs = &body[name_end..];

        if closing {
            if matches!(name.as_str(), "div" | "p") && !self.ends_line() {
                self.push("\n");
            }
            if let Some(pos) = self.stack.iter().rposition(|(open, _)| *open == name) {
                self.stack.truncate(pos);
            }
            return;
        }

        let mut style = self.style();
        match name.as_str() {
            "br" => {
                self.push("\n");
                return;
            }
            "img" | "hr" | "input" | "meta" | "link" | "wbr" => return,
            "div" | "p" => {
                if !self.ends_line() {
                    self.push("\n");
                }
            }
            "b" | "strong" => style.bold = true,
            "i" | "em" => style.italic = true,
            "u" | "ins" => style.underline = true,
            "font" => {
                if let Some(color) = attribute(attrs, "color") {
                    style.color = Some(color);
                }
            }
            _ => {}
        }
        if let Some(css) = attribute(attrs, "style") {
            apply_css(&css, &mut style);
        }
        self.stack.push((name, style));
    }
}

/// Value of attribute `name` (quoted or bare).
fn attribute(attrs: &str, name: &str) -> Option<String> {
    let lower = attrs.to_ascii_lowercase();
    let mut search = 0;
    while let Some(found) = lower[search..].find(name) {
        let at = search + found;
        search = at + name.len();
        let boundary = at == 0 || lower[..at].ends_with(|c: char| c.is_whitespace());
        let after = lower[search..].trim_start();
        if !boundary || !after.starts_with('=') {
            continue;
        }
        let value_start = attrs.len() - after.len() + 1;
        let value = attrs[value_start..].trim_start();
        return Some(match value.chars().next() {
            Some(quote @ ('"' | '\'')) => value[1..]
                .split(quote)
                .next()
                .unwrap_or_default()
                .to_string(),
            _ => value
                .split(|c: char| c.is_whitespace())
                .next()
                .unwrap_or_default()
                .to_string(),
        });
    }
    None
}

fn apply_css(css: &str, style: &mut RunStyle) {
    for declaration in css.split(';') {
        let Some((property, value)) = declaration.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match property.trim().to_ascii_lowercase().as_str() {
            "color" => style.color = Some(value.to_string()),
            "font-weight" => {
                let value = value.to_ascii_lowercase();
                style.bold = value == "bold"
                    || value == "bolder"
                    || value.parse::<u16>().is_ok_and(|weight| weight >= 600);
            }
            "font-style" => style.italic = value.eq_ignore_ascii_case("italic"),
            "text-decoration" | "text-decoration-line" => {
                style.underline = value.to_ascii_lowercase().contains("underline");
            }
            _ => {}
        }
    }
}

fn decode_entities(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest
            .find(';')
            .filter(|&end| end <= 10)
            .and_then(|end| decode_entity(&rest[1..end]).map(|c| (c, end)));
        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &rest[end + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        _ => {
            let numeric = name.strip_prefix('#')?;
            let code = match numeric.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => numeric.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bold() -> RunStyle {
        RunStyle {
            bold: true,
            ..RunStyle::default()
        }
    }

    #[test]
    fn test_plain_text_round_trip() {
        let rich = RichText::from_html("Hello World");
        assert_eq!(rich.plain_text(), "Hello World");
        assert_eq!(rich.to_html(), "Hello World");
        assert_eq!(rich.char_len(), 11);
    }

    #[test]
    fn test_parse_inline_tags() {
        let rich = RichText::from_html("a<b>b<i>c</i></b><font color=\"#ff0000\">d</font>");
        let runs = rich.runs();
        assert_eq!(runs.len(), 4);
        assert_eq!(runs[1].text, "b");
        assert_eq!(runs[1].style, bold());
        assert!(runs[2].style.bold && runs[2].style.italic);
        assert_eq!(runs[3].style.color.as_deref(), Some("#ff0000"));
    }

    #[test]
    fn test_parse_span_styles() {
        let rich = RichText::from_html(
            "<span style=\"font-weight: 700; text-decoration: underline; color: rgb(1, 2, 3)\">x</span>",
        );
        let style = &rich.runs()[0].style;
        assert!(style.bold);
        assert!(style.underline);
        assert!(!style.italic);
        assert_eq!(style.color.as_deref(), Some("rgb(1, 2, 3)"));
    }

    #[test]
    fn test_line_structure() {
        assert_eq!(
            RichText::from_html("<div>one</div><div>two</div>").plain_text(),
            "one\ntwo"
        );
        assert_eq!(RichText::from_html("one<div>two</div>").plain_text(), "one\ntwo");
        assert_eq!(
            RichText::from_html("one<div><br></div><div>three</div>").plain_text(),
            "one\n\nthree"
        );
        assert_eq!(RichText::from_html("<p>a</p><p>b</p>").plain_text(), "a\nb");
        assert_eq!(RichText::from_html("<br><br>x<br>").plain_text(), "x");
    }

    #[test]
    fn test_entities_and_unknown_tags() {
        let rich = RichText::from_html("<a href=\"#\">Fish &amp; chips&nbsp;&#8364;5 &bogus; &lt;3</a>");
        assert_eq!(rich.plain_text(), "Fish & chips €5 &bogus; <3");
    }

    #[test]
    fn test_apply_bold_to_range() {
        let mut rich = RichText::from_html("Hello World");
        assert!(rich.apply(TextRange::new(6, 11), &InlineFormat::Bold));
        assert_eq!(rich.to_html(), "Hello <b>World</b>");

        // whole range already bold: toggles off
        assert!(rich.apply(TextRange::new(6, 11), &InlineFormat::Bold));
        assert_eq!(rich.to_html(), "Hello World");
        assert_eq!(rich.runs().len(), 1);
        assert_eq!(rich.runs()[0].style, RunStyle::default());
    }

    #[test]
    fn test_apply_partial_overlap_sets() {
        let mut rich = RichText::from_html("ab<b>cd</b>");
        rich.apply(TextRange::new(1, 3), &InlineFormat::Bold);
        assert_eq!(rich.to_html(), "a<b>bcd</b>");
    }

    #[test]
    fn test_consecutive_formats_compose() {
        let mut rich = RichText::from_html("styled");
        let range = TextRange::new(0, 6);
        rich.apply(range, &InlineFormat::Bold);
        rich.apply(range, &InlineFormat::Italic);
        rich.apply(range, &InlineFormat::Color("#00ff00".to_string()));

        let style = &rich.runs()[0].style;
        assert!(style.bold && style.italic);
        assert_eq!(style.color.as_deref(), Some("#00ff00"));
        assert_eq!(
            RichText::from_html(&rich.to_html()),
            rich,
            "HTML output parses back to the same runs"
        );
    }

    #[test]
    fn test_apply_rejects_bad_ranges() {
        let mut rich = RichText::from_html("short");
        assert!(!rich.apply(TextRange::new(2, 2), &InlineFormat::Bold));
        assert!(!rich.apply(TextRange::new(3, 40), &InlineFormat::Bold));
        assert_eq!(rich.to_html(), "short");
    }

    #[test]
    fn test_multibyte_offsets() {
        let mut rich = RichText::plain("héllo wörld");
        rich.apply(TextRange::new(6, 11), &InlineFormat::Underline);
        assert_eq!(rich.to_html(), "héllo <u>wörld</u>");
    }

    #[test]
    fn test_multiline_html_output() {
        let mut rich = RichText::from_html("line one<br>line two");
        rich.apply(TextRange::new(0, 4), &InlineFormat::Italic);
        assert_eq!(rich.to_html(), "<i>line</i> one<br>line two");
    }
}
