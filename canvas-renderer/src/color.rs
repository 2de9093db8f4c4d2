//! CSS colour parsing.
//!
//! Element styles store colours as CSS strings. Export needs them as RGBA:
//! `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa`, `rgb()`, `rgba()`,
//! `transparent` and a handful of named colours are understood.

/// An 8-bit straight-alpha colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel (255 = opaque).
    pub a: u8,
}

impl Rgba {
    /// Opaque white.
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    /// Opaque black.
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    /// Fully transparent.
    pub const TRANSPARENT: Self = Self {
        r: 0,
        g: 0,
        b: 0,
        a: 0,
    };

    /// Opaque colour from channels.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parse a CSS colour string. Returns `None` for anything unrecognized.
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        let value = input.trim().to_ascii_lowercase();
        if let Some(hex) = value.strip_prefix('#') {
            return parse_hex(hex);
        }
        if let Some(args) = value
            .strip_prefix("rgba(")
            .or_else(|| value.strip_prefix("rgb("))
        {
            return parse_rgb_function(args.strip_suffix(')')?);
        }
        named(&value)
    }

    /// Whether nothing would be painted.
    #[must_use]
    pub fn is_transparent(self) -> bool {
        self.a == 0
    }

    /// Multiply alpha by `opacity` (0.0..=1.0).
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn with_opacity(self, opacity: f32) -> Self {
        let a = (f32::from(self.a) * opacity.clamp(0.0, 1.0)).round() as u8;
        Self { a, ..self }
    }

    /// The opaque colour seen when this colour is painted over `base`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn over(self, base: Self) -> Self {
        let alpha = f32::from(self.a) / 255.0;
        let mix = |top: u8, bottom: u8| {
            f32::from(top)
                .mul_add(alpha, f32::from(bottom) * (1.0 - alpha))
                .round() as u8
        };
        Self::rgb(mix(self.r, base.r), mix(self.g, base.g), mix(self.b, base.b))
    }

    /// Channels as 0.0..=1.0 floats (r, g, b).
    #[must_use]
    pub fn unit_rgb(self) -> (f32, f32, f32) {
        (
            f32::from(self.r) / 255.0,
            f32::from(self.g) / 255.0,
            f32::from(self.b) / 255.0,
        )
    }

    /// Convert for tiny-skia paints.
    #[must_use]
    pub fn to_skia(self) -> tiny_skia::Color {
        tiny_skia::Color::from_rgba8(self.r, self.g, self.b, self.a)
    }
}

fn parse_hex(hex: &str) -> Option<Rgba> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let nibble = |i: usize| u8::from_str_radix(&hex[i..=i], 16).ok().map(|v| v * 17);
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    match hex.len() {
        3 => Some(Rgba::rgb(nibble(0)?, nibble(1)?, nibble(2)?)),
        4 => Some(Rgba {
            a: nibble(3)?,
            ..Rgba::rgb(nibble(0)?, nibble(1)?, nibble(2)?)
        }),
        6 => Some(Rgba::rgb(byte(0)?, byte(2)?, byte(4)?)),
        8 => Some(Rgba {
            a: byte(6)?,
            ..Rgba::rgb(byte(0)?, byte(2)?, byte(4)?)
        }),
        _ => None,
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn parse_rgb_function(args: &str) -> Option<Rgba> {
    let parts: Vec<&str> = args
        .split(|c: char| c == ',' || c == '/' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .collect();
    if parts.len() != 3 && parts.len() != 4 {
        return None;
    }
    let channel = |part: &str| -> Option<u8> {
        let value = match part.strip_suffix('%') {
            Some(pct) => pct.parse::<f32>().ok()? * 2.55,
            None => part.parse::<f32>().ok()?,
        };
        Some(value.round().clamp(0.0, 255.0) as u8)
    };
    let alpha = match parts.get(3) {
        Some(part) => {
            let value = match part.strip_suffix('%') {
                Some(pct) => pct.parse::<f32>().ok()? / 100.0,
                None => part.parse::<f32>().ok()?,
            };
            (value.clamp(0.0, 1.0) * 255.0).round() as u8
        }
        None => 255,
    };
    Some(Rgba {
        r: channel(parts[0])?,
        g: channel(parts[1])?,
        b: channel(parts[2])?,
        a: alpha,
    })
}

fn named(name: &str) -> Option<Rgba> {
    Some(match name {
        "transparent" => Rgba::TRANSPARENT,
        "black" => Rgba::BLACK,
        "white" => Rgba::WHITE,
        "red" => Rgba::rgb(255, 0, 0),
        "green" => Rgba::rgb(0, 128, 0),
        "blue" => Rgba::rgb(0, 0, 255),
        "yellow" => Rgba::rgb(255, 255, 0),
        "orange" => Rgba::rgb(255, 165, 0),
        "purple" => Rgba::rgb(128, 0, 128),
        "gray" | "grey" => Rgba::rgb(128, 128, 128),
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_forms() {
        assert_eq!(Rgba::parse("#3b82f6"), Some(Rgba::rgb(0x3b, 0x82, 0xf6)));
        assert_eq!(Rgba::parse("#FFF"), Some(Rgba::WHITE));
        assert_eq!(Rgba::parse("#0008").map(|c| c.a), Some(0x88));
        assert_eq!(Rgba::parse("#11223380").map(|c| c.a), Some(0x80));
        assert_eq!(Rgba::parse("#12345"), None);
        assert_eq!(Rgba::parse("#gggggg"), None);
    }

    #[test]
    fn test_rgb_functions() {
        assert_eq!(Rgba::parse("rgb(1, 2, 3)"), Some(Rgba::rgb(1, 2, 3)));
        assert_eq!(
            Rgba::parse("rgba(255, 0, 0, 0.5)"),
            Some(Rgba {
                r: 255,
                g: 0,
                b: 0,
                a: 128
            })
        );
        assert_eq!(Rgba::parse("rgb(100% 0% 0%)"), Some(Rgba::rgb(255, 0, 0)));
        assert_eq!(Rgba::parse("rgb(1, 2)"), None);
    }

    #[test]
    fn test_names_and_garbage() {
        assert_eq!(Rgba::parse(" Transparent "), Some(Rgba::TRANSPARENT));
        assert_eq!(Rgba::parse("grey"), Some(Rgba::rgb(128, 128, 128)));
        assert_eq!(Rgba::parse("url(x.png)"), None);
        assert_eq!(Rgba::parse(""), None);
    }

    #[test]
    fn test_over_blends_towards_base() {
        let half_black = Rgba::BLACK.with_opacity(0.5);
        assert_eq!(half_black.over(Rgba::WHITE), Rgba::rgb(127, 127, 127));
        assert_eq!(Rgba::BLACK.over(Rgba::WHITE), Rgba::BLACK);
    }
}
