//! Color types and parsing
//!
//! Palette entries are plain RGB triples; alpha never reaches the palette
//! because the encoder treats it as a visibility gate.
//!
//! Parsing supports:
//! - Hex: `#RGB`, `#RGBA`, `#RRGGBB`, `#RRGGBBAA` (alpha is dropped)
//! - Functional: `rgb()`, `rgba()`, `hsl()`, `hsla()`, `hwb()`, `oklch()`
//! - Named: `red`, `black`, etc.

use std::fmt;

use image::Rgba;
use lightningcss::traits::Parse;
use lightningcss::values::color::CssColor;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Error type for color parsing failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorError {
    /// Input string was empty
    #[error("empty color string")]
    Empty,
    /// Invalid length (must be 3, 4, 6, or 8 hex chars after #)
    #[error("invalid color length {0}, expected 3, 4, 6, or 8")]
    InvalidLength(usize),
    /// Contains non-hex characters
    #[error("invalid hex character '{0}'")]
    InvalidHex(char),
    /// CSS parsing error from lightningcss
    #[error("CSS parse error: {0}")]
    CssParse(String),
}

/// An opaque palette color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Drop the alpha channel of an image pixel.
    pub fn from_rgba(rgba: Rgba<u8>) -> Self {
        Self { r: rgba[0], g: rgba[1], b: rgba[2] }
    }

    pub fn to_rgba(self) -> Rgba<u8> {
        Rgba([self.r, self.g, self.b, 255])
    }

    /// Lowercase `#rrggbb`, the form used by the payload and SVG fills.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Multiply every channel by `factor`, rounding and clamping to [0, 255].
    pub fn shade(self, factor: f64) -> Self {
        let scale = |c: u8| (c as f64 * factor).round().clamp(0.0, 255.0) as u8;
        Self { r: scale(self.r), g: scale(self.g), b: scale(self.b) }
    }

    /// Squared euclidean distance in RGB space.
    pub fn distance_sq(self, other: Rgb) -> u32 {
        let dr = self.r as i32 - other.r as i32;
        let dg = self.g as i32 - other.g as i32;
        let db = self.b as i32 - other.b as i32;
        (dr * dr + dg * dg + db * db) as u32
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl std::str::FromStr for Rgb {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_color(s).map(Rgb::from_rgba)
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Rgb {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Parse a CSS color string into an RGBA color.
///
/// # Examples
///
/// ```
/// use pixelrun::color::parse_color;
///
/// let red = parse_color("#F00").unwrap();
/// assert_eq!(red, image::Rgba([255, 0, 0, 255]));
///
/// let blue = parse_color("blue").unwrap();
/// assert_eq!(blue, image::Rgba([0, 0, 255, 255]));
/// ```
///
/// # Errors
///
/// Returns `ColorError` if the input is invalid or unparseable.
pub fn parse_color(s: &str) -> Result<Rgba<u8>, ColorError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(ColorError::Empty);
    }

    // Fast path for hex colors
    if let Some(hex) = s.strip_prefix('#') {
        return parse_hex_color(hex);
    }

    parse_css_color(s)
}

/// Parse a strict `#rrggbb` palette entry as found in payloads.
///
/// Unlike [`parse_color`], only the six-digit form is accepted so that a
/// payload re-packs byte-for-byte.
pub fn parse_palette_hex(s: &str) -> Result<Rgb, ColorError> {
    let hex = s.strip_prefix('#').ok_or(ColorError::InvalidLength(s.len()))?;
    if hex.len() != 6 {
        return Err(ColorError::InvalidLength(hex.len()));
    }
    if let Some(c) = hex.chars().find(|c| !c.is_ascii_hexdigit() || c.is_ascii_uppercase()) {
        return Err(ColorError::InvalidHex(c));
    }
    Ok(Rgb::new(parse_hex_pair(&hex[0..2])?, parse_hex_pair(&hex[2..4])?, parse_hex_pair(&hex[4..6])?))
}

/// Parse the digits of a hex color (after the `#`)
fn parse_hex_color(hex: &str) -> Result<Rgba<u8>, ColorError> {
    if let Some(c) = hex.chars().find(|c| !c.is_ascii_hexdigit()) {
        return Err(ColorError::InvalidHex(c));
    }

    let digits: Vec<u8> =
        hex.chars().map(parse_hex_digit).collect::<Result<Vec<_>, _>>()?;

    match digits.len() {
        // #RGB / #RGBA -> doubled digits
        3 => Ok(Rgba([digits[0] * 17, digits[1] * 17, digits[2] * 17, 255])),
        4 => Ok(Rgba([digits[0] * 17, digits[1] * 17, digits[2] * 17, digits[3] * 17])),
        6 => Ok(Rgba([
            digits[0] * 16 + digits[1],
            digits[2] * 16 + digits[3],
            digits[4] * 16 + digits[5],
            255,
        ])),
        8 => Ok(Rgba([
            digits[0] * 16 + digits[1],
            digits[2] * 16 + digits[3],
            digits[4] * 16 + digits[5],
            digits[6] * 16 + digits[7],
        ])),
        len => Err(ColorError::InvalidLength(len)),
    }
}

/// Parse a CSS color using lightningcss (rgb, hsl, hwb, oklch, named colors)
fn parse_css_color(s: &str) -> Result<Rgba<u8>, ColorError> {
    let css_color = CssColor::parse_string(s).map_err(|e| ColorError::CssParse(e.to_string()))?;
    css_color_to_rgba(css_color)
}

/// Convert a lightningcss CssColor to RGBA
fn css_color_to_rgba(color: CssColor) -> Result<Rgba<u8>, ColorError> {
    use lightningcss::values::color::FloatColor;

    let rgb_color = color
        .to_rgb()
        .map_err(|_| ColorError::CssParse("cannot convert color to RGB".to_string()))?;

    match rgb_color {
        CssColor::RGBA(rgba) => Ok(Rgba([rgba.red, rgba.green, rgba.blue, rgba.alpha])),
        CssColor::Float(float_color) => match float_color.as_ref() {
            FloatColor::RGB(rgb) => {
                let r = (rgb.r * 255.0).round() as u8;
                let g = (rgb.g * 255.0).round() as u8;
                let b = (rgb.b * 255.0).round() as u8;
                let a = (rgb.alpha * 255.0).round() as u8;
                Ok(Rgba([r, g, b, a]))
            }
            _ => Err(ColorError::CssParse("unexpected float color format".to_string())),
        },
        _ => Err(ColorError::CssParse("color conversion did not produce RGB".to_string())),
    }
}

/// Parse a single hex digit (0-9, A-F, a-f) to u8 (0-15)
fn parse_hex_digit(c: char) -> Result<u8, ColorError> {
    match c {
        '0'..='9' => Ok(c as u8 - b'0'),
        'a'..='f' => Ok(c as u8 - b'a' + 10),
        'A'..='F' => Ok(c as u8 - b'A' + 10),
        _ => Err(ColorError::InvalidHex(c)),
    }
}

/// Parse a two-character hex string to u8 (0-255)
fn parse_hex_pair(s: &str) -> Result<u8, ColorError> {
    let mut high = 0;
    for c in s.chars() {
        high = high * 16 + parse_hex_digit(c)?;
    }
    Ok(high)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_short_hex() {
        assert_eq!(parse_color("#000").unwrap(), Rgba([0, 0, 0, 255]));
        assert_eq!(parse_color("#f0a").unwrap(), Rgba([255, 0, 170, 255]));
    }

    #[test]
    fn test_parse_long_hex_with_alpha() {
        assert_eq!(parse_color("#11223380").unwrap(), Rgba([0x11, 0x22, 0x33, 0x80]));
    }

    #[test]
    fn test_parse_hex_errors() {
        assert_eq!(parse_color(""), Err(ColorError::Empty));
        assert_eq!(parse_color("#12"), Err(ColorError::InvalidLength(2)));
        assert_eq!(parse_color("#12345g"), Err(ColorError::InvalidHex('g')));
    }

    #[test]
    fn test_parse_named_and_functional() {
        assert_eq!(parse_color("black").unwrap(), Rgba([0, 0, 0, 255]));
        assert_eq!(parse_color("rgb(0, 255, 0)").unwrap(), Rgba([0, 255, 0, 255]));
    }

    #[test]
    fn test_rgb_hex_is_lowercase() {
        assert_eq!(Rgb::new(255, 171, 0).to_hex(), "#ffab00");
        assert_eq!(Rgb::new(1, 2, 3).to_string(), "#010203");
    }

    #[test]
    fn test_palette_hex_is_strict() {
        assert_eq!(parse_palette_hex("#ff0000").unwrap(), Rgb::new(255, 0, 0));
        assert!(parse_palette_hex("#f00").is_err());
        assert!(parse_palette_hex("ff0000").is_err());
        assert_eq!(parse_palette_hex("#FF0000"), Err(ColorError::InvalidHex('F')));
    }

    #[test]
    fn test_shade_rounds_and_clamps() {
        assert_eq!(Rgb::new(100, 200, 255).shade(0.5), Rgb::new(50, 100, 128));
        assert_eq!(Rgb::new(200, 200, 200).shade(2.0), Rgb::new(255, 255, 255));
    }

    #[test]
    fn test_serde_as_hex_string() {
        let json = serde_json::to_string(&Rgb::new(0, 0, 255)).unwrap();
        assert_eq!(json, "\"#0000ff\"");
        let back: Rgb = serde_json::from_str("\"#00f\"").unwrap();
        assert_eq!(back, Rgb::new(0, 0, 255));
    }
}
