//! Multi-item runs: error policy and seeded variant export.
//!
//! Every variant gets its own [`StdRng`] derived from the batch seed and the
//! variant number, so a given `(seed, index)` always yields the same file no
//! matter how rayon schedules the work.

use std::fmt;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::color::Rgb;
use crate::error::Result;
use crate::gif::render_gif;
use crate::models::RunModel;
use crate::output::{save_png, variant_path, write_text};
use crate::palette::{PaletteShift, PaletteVariation};
use crate::raster::{rasterize, RasterOptions};
use crate::svg::{render, SvgFilter, SvgOptions, VoxelConfig, DEFAULT_SCALE};
use crate::transforms::{Orientation, OrientationOdds};

/// What to do when one item of a batch fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Log the failure and continue with the next item
    #[default]
    Skip,
    /// Stop at the first failure
    Abort,
}

/// Outcome counts of a batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub succeeded: usize,
    pub failed: usize,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} succeeded, {} failed", self.succeeded, self.failed)
    }
}

/// Run `f` on every item in order.
///
/// Under [`ErrorPolicy::Abort`] the first error is returned as is; under
/// [`ErrorPolicy::Skip`] it is logged and counted.
pub fn run_batch<T, F>(items: &[T], policy: ErrorPolicy, label: impl Fn(&T) -> String, mut f: F) -> Result<BatchReport>
where
    F: FnMut(&T) -> Result<()>,
{
    let mut report = BatchReport::default();
    for item in items {
        match f(item) {
            Ok(()) => report.succeeded += 1,
            Err(e) => match policy {
                ErrorPolicy::Abort => return Err(e),
                ErrorPolicy::Skip => {
                    log::warn!("skipping {}: {}", label(item), e);
                    report.failed += 1;
                }
            },
        }
    }
    Ok(report)
}

/// Variant output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Svg,
    Png,
    /// Hue sweep animation
    Gif,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Svg => "svg",
            ExportFormat::Png => "png",
            ExportFormat::Gif => "gif",
        }
    }
}

/// Flat rects or extruded voxel look.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    #[default]
    Rect,
    Voxel,
}

/// Everything needed to render numbered variants of one model.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantSpec {
    pub format: ExportFormat,
    pub mode: RenderMode,
    pub voxel: VoxelConfig,
    pub scale: u32,
    pub count: usize,
    pub seed: u64,
    pub variation: PaletteVariation,
    pub odds: OrientationOdds,
    pub background: Option<Rgb>,
    pub filter: Option<SvgFilter>,
    /// Frames per GIF variant
    pub gif_frames: usize,
    pub frame_ms: u32,
}

impl Default for VariantSpec {
    fn default() -> Self {
        Self {
            format: ExportFormat::default(),
            mode: RenderMode::default(),
            voxel: VoxelConfig::default(),
            scale: DEFAULT_SCALE,
            count: 1,
            seed: 0,
            variation: PaletteVariation::default(),
            odds: OrientationOdds::default(),
            background: None,
            filter: None,
            gif_frames: 12,
            frame_ms: 100,
        }
    }
}

impl VariantSpec {
    fn voxel(&self) -> Option<VoxelConfig> {
        match self.mode {
            RenderMode::Rect => None,
            RenderMode::Voxel => Some(self.voxel),
        }
    }
}

/// Random generator of variant `index` in a batch seeded with `seed`.
pub fn variant_rng(seed: u64, index: usize) -> StdRng {
    StdRng::seed_from_u64(seed ^ (index as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15))
}

/// Parameters drawn for one still variant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Variant {
    pub index: usize,
    pub shift: PaletteShift,
    pub orientation: Orientation,
}

/// Draw the palette shift, then the orientation, of variant `index`.
pub fn plan_variant(spec: &VariantSpec, index: usize) -> Variant {
    let mut rng = variant_rng(spec.seed, index);
    let shift = spec.variation.sample(&mut rng);
    let orientation = spec.odds.sample(&mut rng);
    Variant { index, shift, orientation }
}

/// Render variant `index` (1-based) into `dir`, returning the written path.
pub fn render_variant(model: &RunModel, spec: &VariantSpec, index: usize, dir: &Path) -> Result<PathBuf> {
    let path = variant_path(dir, index, spec.format.extension());
    match spec.format {
        ExportFormat::Svg => {
            let variant = plan_variant(spec, index);
            let options = SvgOptions {
                scale: spec.scale,
                voxel: spec.voxel(),
                orientation: variant.orientation,
                palette_override: Some(variant.shift.apply(model.palette())),
                background: spec.background,
                filter: spec.filter,
                ..Default::default()
            };
            write_text(&path, &render(model, &options)?)?;
        }
        ExportFormat::Png => {
            let variant = plan_variant(spec, index);
            let options = raster_options(spec, variant.orientation, variant.shift.apply(model.palette()));
            save_png(&rasterize(model, &options)?, &path)?;
        }
        ExportFormat::Gif => {
            let mut rng = variant_rng(spec.seed, index);
            let orientation = spec.odds.sample(&mut rng);
            let count = spec.gif_frames.max(1);
            let frames = (0..count)
                .map(|i| {
                    let shift = spec.variation.hue_sweep(i, count, &mut rng);
                    rasterize(model, &raster_options(spec, orientation, shift.apply(model.palette())))
                })
                .collect::<Result<Vec<_>>>()?;
            render_gif(&frames, spec.frame_ms, true, &path)?;
        }
    }
    Ok(path)
}

fn raster_options(spec: &VariantSpec, orientation: Orientation, palette: Vec<Rgb>) -> RasterOptions {
    RasterOptions {
        scale: spec.scale,
        voxel: spec.voxel(),
        orientation,
        palette_override: Some(palette),
        background: spec.background,
    }
}

/// Render variants `1..=spec.count` in parallel.
pub fn export_variants(model: &RunModel, spec: &VariantSpec, dir: &Path, policy: ErrorPolicy) -> Result<BatchReport> {
    let indices: Vec<usize> = (1..=spec.count).collect();
    match policy {
        ErrorPolicy::Abort => {
            let written =
                indices.par_iter().map(|&i| render_variant(model, spec, i, dir)).collect::<Result<Vec<_>>>()?;
            Ok(BatchReport { succeeded: written.len(), failed: 0 })
        }
        ErrorPolicy::Skip => {
            let results: Vec<(usize, Result<PathBuf>)> =
                indices.par_iter().map(|&i| (i, render_variant(model, spec, i, dir))).collect();
            let mut report = BatchReport::default();
            for (i, result) in results {
                match result {
                    Ok(_) => report.succeeded += 1,
                    Err(e) => {
                        log::warn!("skipping variant {}: {}", i, e);
                        report.failed += 1;
                    }
                }
            }
            Ok(report)
        }
    }
}
