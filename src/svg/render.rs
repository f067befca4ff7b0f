//! Static SVG rendering in flat and voxel modes.

use std::fmt::Write;

use serde::{Deserialize, Serialize};

use super::{close_document, fmt_num, open_document, write_runs, Frame, SvgFilter};
use crate::color::Rgb;
use crate::error::{Error, Result};
use crate::models::RunModel;
use crate::transforms::Orientation;

/// Default SVG units per pixel.
pub const DEFAULT_SCALE: u32 = 10;

/// Extruded-block look: the run set drawn `thickness` times, each copy offset
/// by `(dx, dy)` pixels per layer and darkened with distance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoxelConfig {
    pub thickness: u32,
    pub dx: f64,
    pub dy: f64,
    /// Shade multiplier of the farthest layer
    pub shade_min: f64,
    /// Shade multiplier of the nearest layer
    pub shade_max: f64,
}

impl Default for VoxelConfig {
    fn default() -> Self {
        Self { thickness: 3, dx: 0.35, dy: -0.55, shade_min: 0.70, shade_max: 1.00 }
    }
}

impl VoxelConfig {
    /// Shade multiplier of layer `z` (0 = nearest).
    pub fn shade(&self, z: u32) -> f64 {
        let t = if self.thickness > 1 { z as f64 / (self.thickness - 1) as f64 } else { 0.0 };
        self.shade_min + (self.shade_max - self.shade_min) * (1.0 - t)
    }

    /// Offset of layer `z` in pixels.
    pub fn offset(&self, z: u32) -> (f64, f64) {
        (self.dx * z as f64, self.dy * z as f64)
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.thickness == 0 {
            return Err("voxel thickness must be at least 1".to_string());
        }
        if !(self.dx.is_finite() && self.dy.is_finite()) {
            return Err("voxel offsets must be finite".to_string());
        }
        if self.shade_min < 0.0 || self.shade_max < 0.0 {
            return Err("voxel shades must be non-negative".to_string());
        }
        Ok(())
    }
}

/// Static render settings.
#[derive(Debug, Clone, PartialEq)]
pub struct SvgOptions {
    pub scale: u32,
    /// Voxel mode when set, flat mode otherwise
    pub voxel: Option<VoxelConfig>,
    pub orientation: Orientation,
    /// Replacement colors by palette slot
    pub palette_override: Option<Vec<Rgb>>,
    pub background: Option<Rgb>,
    pub filter: Option<SvgFilter>,
    pub title: Option<String>,
    pub desc: Option<String>,
}

impl Default for SvgOptions {
    fn default() -> Self {
        Self {
            scale: DEFAULT_SCALE,
            voxel: None,
            orientation: Orientation::default(),
            palette_override: None,
            background: None,
            filter: None,
            title: None,
            desc: None,
        }
    }
}

impl SvgOptions {
    pub(crate) fn frame(&self, width: u32, height: u32) -> Frame<'_> {
        let (w, h) = self.orientation.output_size(width, height);
        Frame {
            width: w * self.scale,
            height: h * self.scale,
            background: self.background,
            filter: self.filter,
            title: self.title.as_deref(),
            desc: self.desc.as_deref(),
        }
    }
}

/// Render `model` as a standalone SVG document.
///
/// Gaps in the model are simply not drawn.
pub fn render(model: &RunModel, options: &SvgOptions) -> Result<String> {
    let palette = resolve_palette(model, options.palette_override.as_deref())?;

    let mut out = String::new();
    open_document(&mut out, &options.frame(model.width(), model.height()))?;
    write_body(&mut out, model, palette, options)?;
    close_document(&mut out)?;
    Ok(out)
}

pub(crate) fn resolve_palette<'a>(model: &'a RunModel, palette_override: Option<&'a [Rgb]>) -> Result<&'a [Rgb]> {
    match palette_override {
        Some(p) if p.len() != model.palette().len() => {
            Err(Error::PaletteSizeMismatch { expected: model.palette().len(), found: p.len() })
        }
        Some(p) => Ok(p),
        None => Ok(model.palette()),
    }
}

/// Flat groups, or the voxel layer stack drawn far to near.
pub(crate) fn write_body(
    out: &mut String,
    model: &RunModel,
    palette: &[Rgb],
    options: &SvgOptions,
) -> std::fmt::Result {
    let scale = options.scale;
    let Some(voxel) = options.voxel else {
        return write_runs(out, model, palette, options.orientation, scale);
    };

    let thickness = voxel.thickness.max(1);
    for z in (0..thickness).rev() {
        let shade = voxel.shade(z);
        let shaded: Vec<Rgb> = palette.iter().map(|c| c.shade(shade)).collect();
        if z == 0 {
            writeln!(out, "<g>")?;
        } else {
            let (dx, dy) = voxel.offset(z);
            writeln!(
                out,
                r#"<g transform="translate({},{})">"#,
                fmt_num(dx * scale as f64),
                fmt_num(dy * scale as f64)
            )?;
        }
        write_runs(out, model, &shaded, options.orientation, scale)?;
        writeln!(out, "</g>")?;
    }
    Ok(())
}
