//! Raster to run model encoding.
//!
//! Alpha is a visibility gate, never blended: a pixel is visible when its
//! alpha reaches the threshold. Invisible pixels either take the configured
//! substitute color or become gaps that no run covers.

use std::borrow::Cow;
use std::collections::HashMap;

use image::{imageops, RgbaImage};

use crate::color::Rgb;
use crate::error::{Error, Result};
use crate::models::{Run, RunModel};
use crate::quantize::{self, ColorMap, Histogram, Quantizer};

/// Default visibility threshold: any non-zero alpha is visible.
pub const DEFAULT_ALPHA_THRESHOLD: u8 = 1;

/// Encoder settings.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeOptions {
    /// Quantize to at most this many colors
    pub max_colors: Option<usize>,
    pub quantizer: Quantizer,
    /// Crop to the bounding box of pixels with non-zero alpha first
    pub trim_transparent: bool,
    /// Color for invisible pixels; `None` turns them into gaps
    pub transparent_substitute: Option<Rgb>,
    pub alpha_threshold: u8,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            max_colors: None,
            quantizer: Quantizer::default(),
            trim_transparent: false,
            transparent_substitute: None,
            alpha_threshold: DEFAULT_ALPHA_THRESHOLD,
        }
    }
}

/// Encode `image` into a run model.
///
/// ```
/// use image::{Rgba, RgbaImage};
/// use pixelrun::encoder::{encode, EncodeOptions};
///
/// let red = Rgba([255, 0, 0, 255]);
/// let blue = Rgba([0, 0, 255, 255]);
/// let img = RgbaImage::from_fn(2, 2, |x, y| if (x, y) == (0, 1) { blue } else { red });
/// let model = encode(&img, &EncodeOptions::default()).unwrap();
/// assert_eq!(model.palette().len(), 2);
/// assert_eq!(model.run_count(), 3);
/// ```
pub fn encode(image: &RgbaImage, options: &EncodeOptions) -> Result<RunModel> {
    if image.width() == 0 || image.height() == 0 {
        return Err(Error::invalid_image(format!(
            "image has zero size ({}x{})",
            image.width(),
            image.height()
        )));
    }

    let image: Cow<'_, RgbaImage> = if options.trim_transparent {
        let (x, y, w, h) = trim_bounds(image);
        if (w, h) == image.dimensions() {
            Cow::Borrowed(image)
        } else {
            log::debug!("trimmed {}x{} to {}x{} at ({}, {})", image.width(), image.height(), w, h, x, y);
            Cow::Owned(imageops::crop_imm(image, x, y, w, h).to_image())
        }
    } else {
        Cow::Borrowed(image)
    };

    let threshold = options.alpha_threshold;
    let mut histogram = Histogram::new();
    let mut has_invisible = false;
    for px in image.pixels() {
        if px[3] >= threshold {
            *histogram.entry(Rgb::from_rgba(*px)).or_insert(0) += 1;
        } else {
            has_invisible = true;
        }
    }

    let mut color_map = match options.max_colors {
        Some(0) => return Err(Error::PaletteOverflow { colors: histogram.len(), limit: 0 }),
        Some(max) => {
            let substitute = options.transparent_substitute.filter(|_| has_invisible);
            let budget = if substitute.is_some() { max - 1 } else { max };
            let mut reduced = quantize::reduce(&histogram, budget, options.quantizer);
            if let (Some(sub), true) = (substitute, reduced.is_empty()) {
                reduced.push(sub);
            }
            log::debug!(
                "quantized {} colors to {} ({})",
                histogram.len(),
                reduced.len(),
                options.quantizer
            );
            Some(ColorMap::new(reduced))
        }
        None => None,
    };

    let model = encode_with(image.width(), image.height(), |x, y| {
        let px = image.get_pixel(x, y);
        if px[3] >= threshold {
            let rgb = Rgb::from_rgba(*px);
            Some(color_map.as_mut().map_or(rgb, |m| m.map(rgb)))
        } else {
            options.transparent_substitute
        }
    })?;

    log::debug!(
        "encoded {}x{}: {} colors, {} runs",
        model.width(),
        model.height(),
        model.palette().len(),
        model.run_count()
    );
    Ok(model)
}

/// Bounding box `(x, y, width, height)` of pixels with non-zero alpha.
/// A fully transparent image yields its top-left pixel.
pub fn trim_bounds(image: &RgbaImage) -> (u32, u32, u32, u32) {
    let mut bounds: Option<(u32, u32, u32, u32)> = None;
    for (x, y, px) in image.enumerate_pixels() {
        if px[3] == 0 {
            continue;
        }
        bounds = Some(match bounds {
            None => (x, y, x, y),
            Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
        });
    }
    match bounds {
        Some((x0, y0, x1, y1)) => (x0, y0, x1 - x0 + 1, y1 - y0 + 1),
        None => (0, 0, 1, 1),
    }
}

/// Run-length scan over an effective-color function (`None` is a gap).
///
/// Palette slots are assigned by first appearance in row-major order.
pub(crate) fn encode_with<F>(width: u32, height: u32, mut effective: F) -> Result<RunModel>
where
    F: FnMut(u32, u32) -> Option<Rgb>,
{
    let mut palette = PaletteBuilder::default();
    let mut rows = Vec::with_capacity(height as usize);

    for y in 0..height {
        let mut row: Vec<Run> = Vec::new();
        let mut current: Option<(u32, Rgb)> = None;
        for x in 0..width {
            let color = effective(x, y);
            match (current, color) {
                (Some((_, c)), Some(n)) if c == n => continue,
                (Some((start, c)), _) => row.push(Run::new(start, x - start, palette.index_of(c))),
                (None, _) => {}
            }
            current = color.map(|c| (x, c));
        }
        if let Some((start, c)) = current {
            row.push(Run::new(start, width - start, palette.index_of(c)));
        }
        rows.push(row);
    }

    Ok(RunModel::new(width, height, palette.colors, rows)?)
}

#[derive(Default)]
struct PaletteBuilder {
    colors: Vec<Rgb>,
    index: HashMap<Rgb, u32>,
}

impl PaletteBuilder {
    fn index_of(&mut self, color: Rgb) -> u32 {
        let next = self.colors.len() as u32;
        *self.index.entry(color).or_insert_with(|| {
            self.colors.push(color);
            next
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);
    const CLEAR: Rgba<u8> = Rgba([0, 0, 0, 0]);

    fn image(rows: &[&[Rgba<u8>]]) -> RgbaImage {
        RgbaImage::from_fn(rows[0].len() as u32, rows.len() as u32, |x, y| rows[y as usize][x as usize])
    }

    fn lengths(model: &RunModel) -> Vec<Vec<(u32, u32, u32)>> {
        model.rows().iter().map(|r| r.iter().map(|run| (run.x, run.len, run.index)).collect()).collect()
    }

    #[test]
    fn test_first_appearance_palette() {
        let model = encode(&image(&[&[RED, RED], &[BLUE, RED]]), &EncodeOptions::default()).unwrap();
        assert_eq!(model.palette(), &[Rgb::new(255, 0, 0), Rgb::new(0, 0, 255)]);
        assert_eq!(lengths(&model), vec![vec![(0, 2, 0)], vec![(0, 1, 1), (1, 1, 0)]]);
    }

    #[test]
    fn test_zero_size_is_invalid() {
        let err = encode(&RgbaImage::new(0, 3), &EncodeOptions::default()).unwrap_err();
        assert!(matches!(err, Error::InvalidImage(_)));
    }

    #[test]
    fn test_invisible_pixels_become_gaps() {
        let model = encode(&image(&[&[CLEAR, RED, CLEAR, RED, RED]]), &EncodeOptions::default()).unwrap();
        assert_eq!(lengths(&model), vec![vec![(1, 1, 0), (3, 2, 0)]]);
        assert!(!model.is_full_coverage());
    }

    #[test]
    fn test_substitute_fills_gaps() {
        let options = EncodeOptions { transparent_substitute: Some(Rgb::new(0, 0, 0)), ..Default::default() };
        let model = encode(&image(&[&[CLEAR, RED, CLEAR, CLEAR]]), &options).unwrap();
        assert_eq!(model.palette(), &[Rgb::new(0, 0, 0), Rgb::new(255, 0, 0)]);
        assert_eq!(lengths(&model), vec![vec![(0, 1, 0), (1, 1, 1), (2, 2, 0)]]);
        assert!(model.is_full_coverage());
    }

    #[test]
    fn test_alpha_threshold() {
        let faint = Rgba([0, 0, 255, 10]);
        let options = EncodeOptions { alpha_threshold: 11, ..Default::default() };
        let model = encode(&image(&[&[RED, faint]]), &options).unwrap();
        assert_eq!(lengths(&model), vec![vec![(0, 1, 0)]]);

        let model = encode(&image(&[&[RED, faint]]), &EncodeOptions::default()).unwrap();
        assert_eq!(model.palette().len(), 2);
    }

    #[test]
    fn test_trim() {
        let img = image(&[&[CLEAR, CLEAR, CLEAR], &[CLEAR, RED, BLUE], &[CLEAR, CLEAR, CLEAR]]);
        assert_eq!(trim_bounds(&img), (1, 1, 2, 1));
        let options = EncodeOptions { trim_transparent: true, ..Default::default() };
        let model = encode(&img, &options).unwrap();
        assert_eq!((model.width(), model.height()), (2, 1));
    }

    #[test]
    fn test_trim_fully_transparent() {
        let img = RgbaImage::new(3, 3);
        let options = EncodeOptions { trim_transparent: true, ..Default::default() };
        let model = encode(&img, &options).unwrap();
        assert_eq!((model.width(), model.height()), (1, 1));
        assert!(model.is_empty());
    }

    #[test]
    fn test_quantize_limits_palette() {
        let img = RgbaImage::from_fn(16, 16, |x, y| Rgba([(x * 16) as u8, (y * 16) as u8, 0, 255]));
        for quantizer in [Quantizer::MedianCut, Quantizer::Octree] {
            let options = EncodeOptions { max_colors: Some(5), quantizer, ..Default::default() };
            let model = encode(&img, &options).unwrap();
            assert!(model.palette().len() <= 5, "{}", quantizer);
            assert!(model.is_full_coverage());
        }
    }

    #[test]
    fn test_quantize_reserves_substitute_slot() {
        let img = RgbaImage::from_fn(8, 2, |x, y| {
            if y == 1 && x > 5 {
                CLEAR
            } else {
                Rgba([(x * 30) as u8, 200, (y * 90) as u8, 255])
            }
        });
        let options = EncodeOptions {
            max_colors: Some(3),
            transparent_substitute: Some(Rgb::new(1, 2, 3)),
            ..Default::default()
        };
        let model = encode(&img, &options).unwrap();
        assert!(model.palette().len() <= 3);
        assert!(model.palette().contains(&Rgb::new(1, 2, 3)));

        let options = EncodeOptions { max_colors: Some(1), ..options };
        let model = encode(&img, &options).unwrap();
        assert_eq!(model.palette(), &[Rgb::new(1, 2, 3)]);
    }

    #[test]
    fn test_zero_max_colors() {
        let options = EncodeOptions { max_colors: Some(0), ..Default::default() };
        let err = encode(&image(&[&[RED]]), &options).unwrap_err();
        assert!(matches!(err, Error::PaletteOverflow { colors: 1, limit: 0 }));
    }
}
