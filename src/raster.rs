//! PNG rasterization of run models.
//!
//! Rendering happens at one pixel per source pixel and is then scaled up with
//! nearest-neighbor sampling. Voxel layers are snapped to the pixel grid and
//! painted far to near, the same order the SVG renderer uses.

use image::{Rgba, RgbaImage};

use crate::color::Rgb;
use crate::error::Result;
use crate::models::RunModel;
use crate::output::scale_image;
use crate::svg::{resolve_palette, VoxelConfig};
use crate::transforms::{Orientation, PlacedRun};

/// Raster render settings.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RasterOptions {
    /// Output pixels per source pixel; 0 and 1 both mean unscaled
    pub scale: u32,
    pub voxel: Option<VoxelConfig>,
    pub orientation: Orientation,
    pub palette_override: Option<Vec<Rgb>>,
    /// Fill behind the art; transparent when `None`
    pub background: Option<Rgb>,
}

/// Rasterize `model` into an RGBA image.
pub fn rasterize(model: &RunModel, options: &RasterOptions) -> Result<RgbaImage> {
    let palette = resolve_palette(model, options.palette_override.as_deref())?;
    let (w, h) = options.orientation.output_size(model.width(), model.height());
    let mut image = match options.background {
        Some(bg) => RgbaImage::from_pixel(w, h, bg.to_rgba()),
        None => RgbaImage::new(w, h),
    };

    let runs: Vec<PlacedRun> = options.orientation.place(model).collect();
    match options.voxel {
        None => {
            for run in &runs {
                fill(&mut image, run, 0, 0, palette[run.index as usize].to_rgba());
            }
        }
        Some(voxel) => {
            for z in (0..voxel.thickness.max(1)).rev() {
                let shade = voxel.shade(z);
                let (dx, dy) = voxel.offset(z);
                let (dx, dy) = (dx.round() as i64, dy.round() as i64);
                for run in &runs {
                    let color = palette[run.index as usize].shade(shade).to_rgba();
                    fill(&mut image, run, dx, dy, color);
                }
            }
        }
    }

    Ok(scale_image(image, options.scale))
}

/// Paint one placed run offset by `(dx, dy)`, clipped to the image.
fn fill(image: &mut RgbaImage, run: &PlacedRun, dx: i64, dy: i64, color: Rgba<u8>) {
    let (iw, ih) = (image.width() as i64, image.height() as i64);
    let x0 = (run.x as i64 + dx).max(0);
    let y0 = (run.y as i64 + dy).max(0);
    let x1 = (run.x as i64 + dx + run.width() as i64).min(iw);
    let y1 = (run.y as i64 + dy + run.height() as i64).min(ih);
    for y in y0..y1 {
        for x in x0..x1 {
            image.put_pixel(x as u32, y as u32, color);
        }
    }
}
