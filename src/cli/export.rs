//! Export command: seeded palette and orientation variants

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Args;

use crate::batch::{export_variants, ErrorPolicy, ExportFormat, RenderMode, VariantSpec};
use crate::color::Rgb;
use crate::config::CliOverrides;
use crate::source::load_model;
use crate::svg::SvgFilter;

use super::{load_settings, report_exit, EXIT_ERROR};

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// runs.json, packed.txt, or an image to encode first
    pub input: PathBuf,

    /// Output directory
    #[arg(short, long, default_value = "variants")]
    pub output: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value_t = ExportFormat::Svg)]
    pub format: ExportFormat,

    /// Flat rects or extruded voxels
    #[arg(long, value_enum, default_value_t = RenderMode::Rect)]
    pub mode: RenderMode,

    /// Number of variants (img_001 .. img_N)
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..=100_000))]
    pub count: u32,

    /// Seed; the same seed and count give the same files
    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    /// Chance of a horizontal flip per variant (bare flag: always)
    #[arg(long, num_args = 0..=1, default_missing_value = "1.0")]
    pub flip_x: Option<f64>,

    /// Chance of a vertical flip per variant (bare flag: always)
    #[arg(long, num_args = 0..=1, default_missing_value = "1.0")]
    pub flip_y: Option<f64>,

    /// Chance of a quarter turn per variant (bare flag: always)
    #[arg(long, num_args = 0..=1, default_missing_value = "1.0")]
    pub rot90: Option<f64>,

    /// Frames per GIF variant
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=1000))]
    pub frames: Option<u32>,

    /// Delay between GIF frames
    #[arg(long)]
    pub frame_ms: Option<u32>,

    /// Units (or pixels) per source pixel
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=1024))]
    pub scale: Option<u32>,

    /// Background fill behind the art
    #[arg(long)]
    pub bg: Option<Rgb>,

    /// Cosmetic filter on the whole drawing (SVG only)
    #[arg(long, value_enum)]
    pub filter: Option<SvgFilter>,

    /// What to do when one variant fails
    #[arg(long, value_enum, default_value_t = ErrorPolicy::Skip)]
    pub on_error: ErrorPolicy,
}

/// Execute the export command
pub fn run_export(args: &ExportArgs, config_path: Option<&Path>) -> ExitCode {
    let overrides = CliOverrides {
        scale: args.scale,
        background: args.bg,
        filter: args.filter,
        frames: args.frames.map(|n| n as usize),
        frame_ms: args.frame_ms,
        ..Default::default()
    };
    let mut config = match load_settings(config_path, &overrides) {
        Ok(config) => config,
        Err(code) => return code,
    };
    for (odds, flag) in [
        (&mut config.variation.flip_x, args.flip_x),
        (&mut config.variation.flip_y, args.flip_y),
        (&mut config.variation.rot90, args.rot90),
    ] {
        if let Some(p) = flag {
            if !(0.0..=1.0).contains(&p) {
                eprintln!("Error: flip and rotation chances must be between 0 and 1, got {}", p);
                return ExitCode::from(super::EXIT_INVALID_ARGS);
            }
            *odds = p;
        }
    }

    let model = match load_model(&args.input, &config.encode_options()) {
        Ok(model) => model,
        Err(e) => {
            eprintln!("Error: {}: {}", args.input.display(), e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let spec = VariantSpec {
        format: args.format,
        mode: args.mode,
        voxel: config.voxel,
        scale: config.svg.scale,
        count: args.count as usize,
        seed: args.seed,
        variation: config.variation.palette(),
        odds: config.variation.odds(),
        background: config.svg.background,
        filter: config.svg.filter,
        gif_frames: config.animation.frames,
        frame_ms: config.animation.frame_ms,
    };
    log::info!("exporting {} {} variants to {}", spec.count, spec.format.extension(), args.output.display());

    match export_variants(&model, &spec, &args.output, args.on_error) {
        Ok(report) => report_exit(&report),
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}
