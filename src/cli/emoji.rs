//! Emoji command: terminal preview and emoji-grid SVG

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Args;

use crate::color::Rgb;
use crate::config::CliOverrides;
use crate::emoji::{render_emoji_art, render_emoji_svg, EmojiMapping, EmojiSvgOptions};
use crate::output::{output_path, write_text};
use crate::source::load_source;

use super::{load_settings, EXIT_ERROR, EXIT_SUCCESS};

#[derive(Args, Debug)]
pub struct EmojiArgs {
    /// PNG file or layer directory
    pub input: PathBuf,

    /// Output SVG (default: {input_stem}.emoji.svg next to the input)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Cell size in pixels
    #[arg(long, default_value_t = 16, value_parser = clap::value_parser!(u32).range(1..=512))]
    pub scale: u32,

    /// Use this glyph for every visible pixel
    #[arg(long, conflicts_with = "nearest")]
    pub glyph: Option<String>,

    /// Pick the emoji with the nearest color instead of by hue
    #[arg(long)]
    pub nearest: bool,

    /// Print to the terminal instead of writing SVG
    #[arg(long)]
    pub preview: bool,

    /// Minimum alpha of a visible pixel
    #[arg(long)]
    pub alpha: Option<u8>,

    /// Background fill behind the grid
    #[arg(long)]
    pub bg: Option<Rgb>,
}

/// Execute the emoji command
pub fn run_emoji(args: &EmojiArgs, config_path: Option<&Path>) -> ExitCode {
    let overrides = CliOverrides { alpha_threshold: args.alpha, background: args.bg, ..Default::default() };
    let config = match load_settings(config_path, &overrides) {
        Ok(config) => config,
        Err(code) => return code,
    };

    let image = match load_source(&args.input) {
        Ok(image) => image,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let mapping = match (&args.glyph, args.nearest) {
        (Some(glyph), _) => EmojiMapping::Glyph(glyph.clone()),
        (None, true) => EmojiMapping::Nearest,
        (None, false) => EmojiMapping::Hue,
    };

    if args.preview {
        print!("{}", render_emoji_art(&image, &mapping, config.encode.alpha_threshold));
        return ExitCode::from(EXIT_SUCCESS);
    }

    let options = EmojiSvgOptions {
        scale: args.scale,
        mapping,
        alpha_threshold: config.encode.alpha_threshold,
        background: config.svg.background,
        title: None,
    };
    let svg = match render_emoji_svg(&image, &options) {
        Ok(svg) => svg,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let path = output_path(&args.input, args.output.as_deref(), "emoji.svg", true);
    if let Err(e) = write_text(&path, &svg) {
        eprintln!("Error: Failed to write {}: {}", path.display(), e);
        return ExitCode::from(EXIT_ERROR);
    }
    println!("{}x{} -> {}", image.width(), image.height(), path.display());
    ExitCode::from(EXIT_SUCCESS)
}
