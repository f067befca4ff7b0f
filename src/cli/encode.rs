//! Encode command: image or layer stack to runs, payload and snippet

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Args;

use crate::bootloader::build_snippet;
use crate::color::Rgb;
use crate::config::CliOverrides;
use crate::encoder::encode;
use crate::error::Error;
use crate::output::write_text;
use crate::payload::PayloadError;
use crate::quantize::Quantizer;
use crate::source::load_source;

use super::{load_settings, TrimArgs, EXIT_ERROR, EXIT_SUCCESS};

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// PNG file, or a directory of PNG layers stacked in file-name order
    pub input: PathBuf,

    /// Output directory (default: out/{input_stem})
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Quantize to at most this many colors
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
    pub max_colors: Option<u16>,

    /// Palette reduction algorithm
    #[arg(long, value_enum)]
    pub quantizer: Option<Quantizer>,

    #[command(flatten)]
    pub trim: TrimArgs,

    /// Color for transparent pixels (default: leave them out)
    #[arg(long)]
    pub bg: Option<Rgb>,

    /// Minimum alpha of a visible pixel
    #[arg(long)]
    pub alpha: Option<u8>,

    /// Refuse palettes larger than this in the snippet
    #[arg(long)]
    pub max_palette: Option<usize>,
}

/// Execute the encode command
pub fn run_encode(args: &EncodeArgs, config_path: Option<&Path>) -> ExitCode {
    let overrides = CliOverrides {
        max_colors: args.max_colors.map(usize::from),
        quantizer: args.quantizer,
        trim: args.trim.trim_override(),
        substitute: args.bg,
        alpha_threshold: args.alpha,
        max_palette: args.max_palette,
        ..Default::default()
    };
    let config = match load_settings(config_path, &overrides) {
        Ok(config) => config,
        Err(code) => return code,
    };

    let out_dir = args.output.clone().unwrap_or_else(|| {
        let stem = args.input.file_stem().and_then(|s| s.to_str()).unwrap_or("output");
        Path::new("out").join(stem)
    });

    let image = match load_source(&args.input) {
        Ok(image) => image,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };
    let model = match encode(&image, &config.encode_options()) {
        Ok(model) => model,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let runs_path = out_dir.join("runs.json");
    if let Err(e) = write_text(&runs_path, &model.to_json()) {
        eprintln!("Error: Failed to write {}: {}", runs_path.display(), e);
        return ExitCode::from(EXIT_ERROR);
    }

    let snippet = match build_snippet(&model, &config.bootloader()) {
        Ok(snippet) => snippet,
        Err(Error::PayloadParse(PayloadError::InteriorGap { row })) => {
            eprintln!(
                "Error: row {} has transparent pixels before a run; pass --bg to fill them (runs.json was still written)",
                row
            );
            return ExitCode::from(EXIT_ERROR);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };
    let stats = snippet.stats(&model);
    let stats_json = match serde_json::to_string_pretty(&stats) {
        Ok(json) => json,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let artifacts = [
        ("packed.txt", snippet.payload.as_str()),
        ("bootloader.js", snippet.source.as_str()),
        ("bootloader.min.js", snippet.minified.as_str()),
        ("stats.json", stats_json.as_str()),
    ];
    for (name, contents) in artifacts {
        let path = out_dir.join(name);
        if let Err(e) = write_text(&path, contents) {
            eprintln!("Error: Failed to write {}: {}", path.display(), e);
            return ExitCode::from(EXIT_ERROR);
        }
    }

    println!(
        "{}x{} palette={} runs={} -> {}",
        stats.width,
        stats.height,
        stats.palette_size,
        stats.runs,
        out_dir.display()
    );
    println!(
        "payload={}B snippet={}B min={}B",
        stats.payload_bytes, stats.snippet_bytes, stats.snippet_min_bytes
    );
    ExitCode::from(EXIT_SUCCESS)
}
