//! Command-line interface implementation
//!
//! This module provides the CLI entry point and dispatches to submodules
//! for specific command implementations.

mod animate;
mod decode;
mod emoji;
mod encode;
mod export;
mod svg;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};

use crate::batch::BatchReport;
use crate::config::{load_config, merge_cli_overrides, CliOverrides, ConfigError, PxrConfig};
use crate::transforms::Orientation;

/// Exit codes
pub(crate) const EXIT_SUCCESS: u8 = 0;
pub(crate) const EXIT_ERROR: u8 = 1;
pub(crate) const EXIT_INVALID_ARGS: u8 = 2;

/// Pixelrun - palette-indexed run-length codec and renderer for pixel art
#[derive(Parser)]
#[command(name = "pxr")]
#[command(about = "Pixelrun - encode pixel art as palette runs and render it to SVG, PNG, GIF or a self-decoding script")]
#[command(version)]
pub struct Cli {
    /// More log output (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Settings file (default: nearest pxr.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Encode an image or layer directory into runs.json, packed.txt and a bootloader snippet
    Encode(encode::EncodeArgs),
    /// Render images, runs.json or packed.txt files as static SVG (or PNG)
    Svg(svg::SvgArgs),
    /// Convert an animated GIF into an animated SVG
    Gif(animate::GifArgs),
    /// Render seeded palette/orientation variants of one model
    Export(export::ExportArgs),
    /// Render an image as emoji, to the terminal or as SVG
    Emoji(emoji::EmojiArgs),
    /// Unpack a packed payload into runs.json
    Decode(decode::DecodeArgs),
}

/// Flip and rotation flags shared by the render commands.
#[derive(Args, Debug, Clone, Default)]
pub struct OrientationArgs {
    /// Mirror horizontally
    #[arg(long)]
    pub flip_x: bool,

    /// Mirror vertically
    #[arg(long)]
    pub flip_y: bool,

    /// Rotate a quarter turn
    #[arg(long)]
    pub rot90: bool,
}

impl OrientationArgs {
    pub fn orientation(&self) -> Orientation {
        Orientation { flip_x: self.flip_x, flip_y: self.flip_y, rot90: self.rot90 }
    }
}

/// Transparent-border cropping flags shared by the raster commands.
#[derive(Args, Debug, Clone, Default)]
pub struct TrimArgs {
    /// Crop fully transparent borders first (the default)
    #[arg(long)]
    pub trim: bool,

    /// Keep transparent borders
    #[arg(long, conflicts_with = "trim")]
    pub no_trim: bool,
}

impl TrimArgs {
    /// `None` when neither flag was given, so pxr.toml decides.
    pub fn trim_override(&self) -> Option<bool> {
        match (self.trim, self.no_trim) {
            (true, _) => Some(true),
            (false, true) => Some(false),
            (false, false) => None,
        }
    }
}

/// Run the CLI application
pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = cli.config.as_deref();

    match cli.command {
        Commands::Encode(args) => encode::run_encode(&args, config),
        Commands::Svg(args) => svg::run_svg(&args, config),
        Commands::Gif(args) => animate::run_gif(&args, config),
        Commands::Export(args) => export::run_export(&args, config),
        Commands::Emoji(args) => emoji::run_emoji(&args, config),
        Commands::Decode(args) => decode::run_decode(&args),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .target(env_logger::Target::Stderr)
        .format_timestamp(None)
        .init();
}

/// Load pxr.toml (or defaults), apply command-line overrides and validate
/// the result. Errors are printed; the exit code is returned.
pub(crate) fn load_settings(path: Option<&Path>, overrides: &CliOverrides) -> Result<PxrConfig, ExitCode> {
    let mut config = match load_config(path) {
        Ok(config) => config,
        Err(e @ ConfigError::Validation(_)) => {
            eprintln!("Error: {}", e);
            return Err(ExitCode::from(EXIT_INVALID_ARGS));
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            return Err(ExitCode::from(EXIT_ERROR));
        }
    };
    merge_cli_overrides(&mut config, overrides);

    let errors = config.validate();
    if !errors.is_empty() {
        for e in errors {
            eprintln!("Error: {}", e);
        }
        return Err(ExitCode::from(EXIT_INVALID_ARGS));
    }
    Ok(config)
}

/// Exit code for a finished batch, printing its summary when it had more
/// than one item or any failure.
pub(crate) fn report_exit(report: &BatchReport) -> ExitCode {
    if report.succeeded + report.failed > 1 || !report.is_success() {
        println!("{}", report);
    }
    if report.is_success() {
        ExitCode::from(EXIT_SUCCESS)
    } else {
        ExitCode::from(EXIT_ERROR)
    }
}
