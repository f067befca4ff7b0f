//! Gif command: animated GIF to animated SVG

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Args;

use crate::color::Rgb;
use crate::config::CliOverrides;
use crate::gif::load_gif_frames;
use crate::output::{output_path, write_text};
use crate::svg::{render_animated, AnimatedOptions, SvgFilter};

use super::{load_settings, OrientationArgs, EXIT_ERROR, EXIT_SUCCESS};

#[derive(Args, Debug)]
pub struct GifArgs {
    /// Animated GIF
    pub input: PathBuf,

    /// Output file (default: input with a .svg extension)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Units per source pixel
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=1024))]
    pub scale: Option<u32>,

    /// Minimum alpha of a visible pixel
    #[arg(long)]
    pub alpha: Option<u8>,

    /// Playback rate (default: from the GIF frame delays)
    #[arg(long)]
    pub fps: Option<f64>,

    /// Read at most this many frames
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_frames: Option<u32>,

    /// Draw unchanging pixels once and toggle only per-frame differences
    #[arg(long, conflicts_with = "full")]
    pub static_base: bool,

    /// Toggle every frame in full
    #[arg(long)]
    pub full: bool,

    /// Extruded voxel look, using the [voxel] settings
    #[arg(long)]
    pub voxel: bool,

    #[command(flatten)]
    pub orientation: OrientationArgs,

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
}

/// Execute the gif command
pub fn run_gif(args: &GifArgs, config_path: Option<&Path>) -> ExitCode {
    let static_base = match (args.static_base, args.full) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    };
    let overrides = CliOverrides {
        scale: args.scale,
        alpha_threshold: args.alpha,
        fps: args.fps,
        max_frames: args.max_frames.map(|n| n as usize),
        static_base,
        background: args.bg,
        filter: args.filter,
        ..Default::default()
    };
    let config = match load_settings(config_path, &overrides) {
        Ok(config) => config,
        Err(code) => return code,
    };

    let frames = match load_gif_frames(&args.input, config.animation.max_frames) {
        Ok(frames) => frames,
        Err(e) => {
            eprintln!("Error: {}: {}", args.input.display(), e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let options = AnimatedOptions {
        fps: config.animation.fps,
        use_static_base: config.animation.static_base,
        alpha_threshold: config.encode.alpha_threshold,
        scale: config.svg.scale,
        orientation: args.orientation.orientation(),
        voxel: args.voxel.then_some(config.voxel),
        background: config.svg.background,
        filter: config.svg.filter,
        title: args.title.clone(),
        desc: args.desc.clone(),
    };
    let svg = match render_animated(&frames, &options) {
        Ok(svg) => svg,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let path = output_path(&args.input, args.output.as_deref(), "svg", true);
    if let Err(e) = write_text(&path, &svg) {
        eprintln!("Error: Failed to write {}: {}", path.display(), e);
        return ExitCode::from(EXIT_ERROR);
    }

    let (w, h) = frames.dimensions();
    println!(
        "{}x{} frames={} fps={} -> {}",
        w,
        h,
        frames.len(),
        crate::svg::fmt_num(frames.fps(config.animation.fps)),
        path.display()
    );
    ExitCode::from(EXIT_SUCCESS)
}
