//! Decode command: packed payload to runs.json

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Args;

use crate::output::{output_path, write_text};
use crate::payload::unpack;

use super::{EXIT_ERROR, EXIT_SUCCESS};

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Packed payload file
    pub input: PathBuf,

    /// Output file (default: input with a .json extension)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Execute the decode command
pub fn run_decode(args: &DecodeArgs) -> ExitCode {
    let text = match std::fs::read_to_string(&args.input) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("Error: Cannot read {}: {}", args.input.display(), e);
            return ExitCode::from(EXIT_ERROR);
        }
    };
    let model = match unpack(text.trim()) {
        Ok(model) => model,
        Err(e) => {
            eprintln!("Error: {}: {}", args.input.display(), e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let path = output_path(&args.input, args.output.as_deref(), "json", true);
    if path == args.input {
        eprintln!("Error: refusing to overwrite the input {}", path.display());
        return ExitCode::from(EXIT_ERROR);
    }
    if let Err(e) = write_text(&path, &model.to_json()) {
        eprintln!("Error: Failed to write {}: {}", path.display(), e);
        return ExitCode::from(EXIT_ERROR);
    }

    println!(
        "{}x{} palette={} runs={} -> {}",
        model.width(),
        model.height(),
        model.palette().len(),
        model.run_count(),
        path.display()
    );
    ExitCode::from(EXIT_SUCCESS)
}
