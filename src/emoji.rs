//! Emoji art output: terminal preview and emoji-grid SVG.
//!
//! Each visible pixel becomes one colored-square emoji, picked either by
//! hue category or by nearest reference color.

use std::fmt::Write;

use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::color::Rgb;
use crate::error::Result;
use crate::palette::rgb_to_hsl;
use crate::quantize::nearest;
use crate::svg::{close_document, escape_xml, open_document, Frame};

/// Available emoji for color mapping
const BLACK: &str = "⬛";
const WHITE: &str = "⬜";
const RED: &str = "🟥";
const ORANGE: &str = "🟧";
const YELLOW: &str = "🟨";
const GREEN: &str = "🟩";
const BLUE: &str = "🟦";
const PURPLE: &str = "🟪";
const BROWN: &str = "🟫";

/// Emoji and the color they are drawn with in common emoji fonts.
const REFERENCE: [(&str, Rgb); 9] = [
    (BLACK, Rgb::new(0x31, 0x37, 0x3d)),
    (WHITE, Rgb::new(0xe6, 0xe7, 0xe8)),
    (RED, Rgb::new(0xdd, 0x2e, 0x44)),
    (ORANGE, Rgb::new(0xf4, 0x90, 0x0c)),
    (YELLOW, Rgb::new(0xfd, 0xcb, 0x58)),
    (GREEN, Rgb::new(0x78, 0xb1, 0x59)),
    (BLUE, Rgb::new(0x55, 0xac, 0xee)),
    (PURPLE, Rgb::new(0xaa, 0x8e, 0xd6)),
    (BROWN, Rgb::new(0xc1, 0x69, 0x4f)),
];

/// How pixel colors are turned into emoji.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmojiMapping {
    /// Hue/lightness categories
    #[default]
    Hue,
    /// Closest reference color by squared RGB distance
    Nearest,
    /// The same glyph for every visible pixel
    Glyph(String),
}

impl EmojiMapping {
    pub fn emoji_for(&self, color: Rgb) -> &str {
        match self {
            EmojiMapping::Hue => color_to_emoji(color.to_rgba()),
            EmojiMapping::Nearest => nearest_emoji(color),
            EmojiMapping::Glyph(glyph) => glyph,
        }
    }
}

/// Convert an RGBA color to the closest emoji representation.
///
/// # Color Mapping
///
/// - Transparent pixels (alpha < 128) -> ⬜ (white square, visually "empty")
/// - Black/very dark (lightness < 15%) -> ⬛
/// - White/very light (lightness > 85%) -> ⬜
/// - Low saturation (< 15%) -> grayscale (⬛ or ⬜ based on lightness)
/// - Hue-based mapping for saturated colors:
///   - Red: 0-15° or 345-360°
///   - Orange: 15-45°
///   - Yellow: 45-75°
///   - Green: 75-165°
///   - Blue: 165-255°
///   - Purple: 255-345°
///
/// # Examples
///
/// ```
/// use pixelrun::emoji::color_to_emoji;
/// use image::Rgba;
///
/// assert_eq!(color_to_emoji(Rgba([255, 0, 0, 255])), "🟥");
/// assert_eq!(color_to_emoji(Rgba([255, 0, 0, 0])), "⬜");
/// assert_eq!(color_to_emoji(Rgba([0, 0, 0, 255])), "⬛");
/// ```
pub fn color_to_emoji(color: Rgba<u8>) -> &'static str {
    if color[3] < 128 {
        return WHITE;
    }

    let (h, s, l) = rgb_to_hsl(Rgb::from_rgba(color));
    let h = h * 360.0;

    if l < 0.15 {
        return BLACK;
    }
    if l > 0.85 {
        return WHITE;
    }
    if s < 0.15 {
        return if l < 0.5 { BLACK } else { WHITE };
    }

    // Brown is dark, not fully saturated orange
    if l >= 0.2 && l < 0.5 && h >= 15.0 && h < 50.0 && s < 0.7 {
        return BROWN;
    }

    hue_to_emoji(h)
}

/// Map a hue value (0-360) to the closest emoji color.
fn hue_to_emoji(hue: f64) -> &'static str {
    let h = hue % 360.0;

    if h < 15.0 || h >= 345.0 {
        RED
    } else if h < 45.0 {
        ORANGE
    } else if h < 75.0 {
        YELLOW
    } else if h < 165.0 {
        GREEN
    } else if h < 255.0 {
        BLUE
    } else {
        PURPLE
    }
}

/// Emoji whose reference color is nearest to `color`.
pub fn nearest_emoji(color: Rgb) -> &'static str {
    let colors: Vec<Rgb> = REFERENCE.iter().map(|(_, c)| *c).collect();
    REFERENCE[nearest(color, &colors)].0
}

/// Render an RGBA image to emoji art for the terminal.
///
/// Each pixel becomes one emoji; pixels below `alpha_threshold` print as ⬜.
/// Rows are separated by newlines.
pub fn render_emoji_art(image: &RgbaImage, mapping: &EmojiMapping, alpha_threshold: u8) -> String {
    let mut output = String::new();
    for row in image.rows() {
        for pixel in row {
            if pixel[3] < alpha_threshold.max(1) {
                output.push_str(WHITE);
            } else {
                output.push_str(mapping.emoji_for(Rgb::from_rgba(*pixel)));
            }
        }
        output.push('\n');
    }
    output
}

/// Emoji grid SVG settings.
#[derive(Debug, Clone, PartialEq)]
pub struct EmojiSvgOptions {
    /// Cell size in pixels
    pub scale: u32,
    pub mapping: EmojiMapping,
    pub alpha_threshold: u8,
    pub background: Option<Rgb>,
    pub title: Option<String>,
}

impl Default for EmojiSvgOptions {
    fn default() -> Self {
        Self {
            scale: 16,
            mapping: EmojiMapping::default(),
            alpha_threshold: crate::encoder::DEFAULT_ALPHA_THRESHOLD,
            background: None,
            title: None,
        }
    }
}

/// Render an image as a grid of `<text>` emoji, one per visible pixel.
pub fn render_emoji_svg(image: &RgbaImage, options: &EmojiSvgOptions) -> Result<String> {
    let scale = options.scale.max(1);
    let threshold = options.alpha_threshold.max(1);
    let mut out = String::new();
    let frame = Frame {
        width: image.width() * scale,
        height: image.height() * scale,
        background: options.background,
        filter: None,
        title: options.title.as_deref(),
        desc: None,
    };
    open_document(&mut out, &frame)?;
    writeln!(out, r#"<g font-size="{}" text-anchor="middle" dominant-baseline="central">"#, scale)?;

    let half = scale as f64 / 2.0;
    let mut cells = 0usize;
    for (x, y, pixel) in image.enumerate_pixels() {
        if pixel[3] < threshold {
            continue;
        }
        let glyph = options.mapping.emoji_for(Rgb::from_rgba(*pixel));
        let cx = crate::svg::fmt_num(x as f64 * scale as f64 + half);
        let cy = crate::svg::fmt_num(y as f64 * scale as f64 + half);
        writeln!(out, r#"<text x="{}" y="{}">{}</text>"#, cx, cy, escape_xml(glyph))?;
        cells += 1;
    }

    writeln!(out, "</g>")?;
    close_document(&mut out)?;
    log::debug!("emoji grid: {} cells", cells);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transparent() {
        assert_eq!(color_to_emoji(Rgba([255, 0, 0, 0])), WHITE);
        assert_eq!(color_to_emoji(Rgba([128, 128, 128, 127])), WHITE);
    }

    #[test]
    fn test_opaque_boundary() {
        assert_eq!(color_to_emoji(Rgba([0, 0, 0, 128])), BLACK);
        assert_eq!(color_to_emoji(Rgba([255, 0, 0, 128])), RED);
    }

    #[test]
    fn test_lightness_extremes() {
        assert_eq!(color_to_emoji(Rgba([30, 30, 30, 255])), BLACK);
        assert_eq!(color_to_emoji(Rgba([230, 230, 230, 255])), WHITE);
        assert_eq!(color_to_emoji(Rgba([100, 100, 100, 255])), BLACK);
        assert_eq!(color_to_emoji(Rgba([160, 160, 160, 255])), WHITE);
    }

    #[test]
    fn test_hues() {
        assert_eq!(color_to_emoji(Rgba([200, 50, 50, 255])), RED);
        assert_eq!(color_to_emoji(Rgba([255, 165, 0, 255])), ORANGE);
        assert_eq!(color_to_emoji(Rgba([255, 230, 0, 255])), YELLOW);
        assert_eq!(color_to_emoji(Rgba([50, 200, 50, 255])), GREEN);
        assert_eq!(color_to_emoji(Rgba([0, 128, 255, 255])), BLUE);
        assert_eq!(color_to_emoji(Rgba([200, 50, 200, 255])), PURPLE);
    }

    #[test]
    fn test_brown() {
        assert_eq!(color_to_emoji(Rgba([139, 90, 43, 255])), BROWN);
        assert_eq!(color_to_emoji(Rgba([150, 100, 50, 255])), BROWN);
    }

    #[test]
    fn test_nearest_emoji() {
        assert_eq!(nearest_emoji(Rgb::new(0, 0, 0)), BLACK);
        assert_eq!(nearest_emoji(Rgb::new(255, 255, 255)), WHITE);
        assert_eq!(nearest_emoji(Rgb::new(0x55, 0xac, 0xee)), BLUE);
        assert_eq!(nearest_emoji(Rgb::new(230, 40, 60)), RED);
    }

    #[test]
    fn test_render_emoji_art() {
        let mut image = RgbaImage::new(3, 2);
        image.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        image.put_pixel(1, 0, Rgba([0, 255, 0, 255]));
        image.put_pixel(2, 0, Rgba([0, 0, 255, 255]));
        image.put_pixel(0, 1, Rgba([0, 0, 0, 255]));
        image.put_pixel(1, 1, Rgba([255, 255, 255, 255]));

        let output = render_emoji_art(&image, &EmojiMapping::Hue, 1);
        assert_eq!(output, "🟥🟩🟦\n⬛⬜⬜\n");

        let output = render_emoji_art(&image, &EmojiMapping::Glyph("🐸".to_string()), 1);
        assert_eq!(output, "🐸🐸🐸\n🐸🐸⬜\n");
    }

    #[test]
    fn test_render_emoji_svg() {
        let mut image = RgbaImage::new(2, 1);
        image.put_pixel(1, 0, Rgba([255, 0, 0, 255]));
        let options = EmojiSvgOptions { scale: 10, ..Default::default() };
        let svg = render_emoji_svg(&image, &options).unwrap();

        assert!(svg.contains(r#"width="20" height="10""#));
        assert!(svg.contains(r#"<text x="15" y="5">🟥</text>"#));
        assert_eq!(svg.matches("<text").count(), 1);
    }
}
