//! pxr - Command-line tool for encoding and rendering pixel art runs

use std::process::ExitCode;

use pixelrun::cli;

fn main() -> ExitCode {
    cli::run()
}
