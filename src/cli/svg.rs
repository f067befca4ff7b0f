//! Svg command: static SVG (or PNG) rendering of one or more inputs

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Args;

use crate::batch::{run_batch, ErrorPolicy};
use crate::color::Rgb;
use crate::config::{CliOverrides, PxrConfig};
use crate::error::Result;
use crate::models::RunModel;
use crate::output::{output_path, save_png, write_text};
use crate::palette::PaletteShift;
use crate::quantize::Quantizer;
use crate::raster::{rasterize, RasterOptions};
use crate::source::{expand_inputs, load_model};
use crate::svg::{render, SvgFilter, SvgOptions};

use super::{load_settings, report_exit, OrientationArgs, TrimArgs, EXIT_ERROR, EXIT_INVALID_ARGS};

#[derive(Args, Debug)]
pub struct SvgArgs {
    /// Images, layer directories, runs.json or packed.txt files
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Output file or directory.
    /// If omitted: {input_stem}.svg next to the input
    /// If file (single input): output.svg
    /// If file (multiple): output_{input_stem}.svg
    /// If directory (ends with /): dir/{input_stem}.svg
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Units per source pixel
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=1024))]
    pub scale: Option<u32>,

    /// Minimum alpha of a visible pixel
    #[arg(long)]
    pub alpha: Option<u8>,

    /// Extruded voxel look, using the [voxel] settings
    #[arg(long)]
    pub voxel: bool,

    #[command(flatten)]
    pub orientation: OrientationArgs,

    /// Hue rotation in degrees
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub hue: f64,

    /// Saturation multiplier
    #[arg(long, default_value_t = 1.0)]
    pub sat: f64,

    /// Lightness multiplier
    #[arg(long, default_value_t = 1.0)]
    pub lum: f64,

    /// Background fill behind the art
    #[arg(long)]
    pub bg: Option<Rgb>,

    /// Cosmetic filter on the whole drawing
    #[arg(long, value_enum)]
    pub filter: Option<SvgFilter>,

    /// Document title
    #[arg(long)]
    pub title: Option<String>,

    /// Document description
    #[arg(long)]
    pub desc: Option<String>,

    /// Quantize raster inputs to at most this many colors
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
    pub max_colors: Option<u16>,

    /// Palette reduction algorithm
    #[arg(long, value_enum)]
    pub quantizer: Option<Quantizer>,

    #[command(flatten)]
    pub trim: TrimArgs,

    /// Write PNG instead of SVG
    #[arg(long)]
    pub png: bool,

    /// What to do when one input fails
    #[arg(long, value_enum, default_value_t = ErrorPolicy::Skip)]
    pub on_error: ErrorPolicy,
}

/// Execute the svg command
pub fn run_svg(args: &SvgArgs, config_path: Option<&Path>) -> ExitCode {
    let overrides = CliOverrides {
        scale: args.scale,
        alpha_threshold: args.alpha,
        max_colors: args.max_colors.map(usize::from),
        quantizer: args.quantizer,
        trim: args.trim.trim_override(),
        background: args.bg,
        filter: args.filter,
        ..Default::default()
    };
    let config = match load_settings(config_path, &overrides) {
        Ok(config) => config,
        Err(code) => return code,
    };

    let inputs = expand_inputs(&args.inputs);
    if inputs.is_empty() {
        eprintln!("Error: No input files found");
        return ExitCode::from(EXIT_INVALID_ARGS);
    }
    let single = inputs.len() == 1;
    let shift = PaletteShift { hue_deg: args.hue, sat_scale: args.sat, lum_scale: args.lum };

    let result = run_batch(
        &inputs,
        args.on_error,
        |input| input.display().to_string(),
        |input| render_one(input, args, &config, shift, single),
    );
    match result {
        Ok(report) => report_exit(&report),
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

fn render_one(input: &Path, args: &SvgArgs, config: &PxrConfig, shift: PaletteShift, single: bool) -> Result<()> {
    let model = load_model(input, &config.encode_options())?;
    let palette_override = (!shift.is_identity()).then(|| shift.apply(model.palette()));
    let voxel = args.voxel.then_some(config.voxel);

    let path = if args.png {
        let options = RasterOptions {
            scale: config.svg.scale,
            voxel,
            orientation: args.orientation.orientation(),
            palette_override,
            background: config.svg.background,
        };
        let path = output_path(input, args.output.as_deref(), "png", single);
        save_png(&rasterize(&model, &options)?, &path)?;
        path
    } else {
        let options = SvgOptions {
            scale: config.svg.scale,
            voxel,
            orientation: args.orientation.orientation(),
            palette_override,
            background: config.svg.background,
            filter: config.svg.filter,
            title: args.title.clone(),
            desc: args.desc.clone(),
        };
        let path = output_path(input, args.output.as_deref(), "svg", single);
        write_text(&path, &render(&model, &options)?)?;
        path
    };

    print_summary(&model, &path);
    Ok(())
}

fn print_summary(model: &RunModel, path: &Path) {
    println!(
        "{}x{} palette={} runs={} -> {}",
        model.width(),
        model.height(),
        model.palette().len(),
        model.run_count(),
        path.display()
    );
}
