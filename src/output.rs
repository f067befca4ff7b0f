//! File output and output path generation

use image::imageops::FilterType;
use image::RgbaImage;
use std::io;
use std::path::{Path, PathBuf};

/// Error type for output operations
#[derive(Debug)]
pub enum OutputError {
    /// IO error during file operations
    Io(io::Error),
    /// Image encoding error
    Image(image::ImageError),
}

impl std::fmt::Display for OutputError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputError::Io(e) => write!(f, "IO error: {}", e),
            OutputError::Image(e) => write!(f, "Image error: {}", e),
        }
    }
}

impl std::error::Error for OutputError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            OutputError::Io(e) => Some(e),
            OutputError::Image(e) => Some(e),
        }
    }
}

impl From<io::Error> for OutputError {
    fn from(e: io::Error) -> Self {
        OutputError::Io(e)
    }
}

impl From<image::ImageError> for OutputError {
    fn from(e: image::ImageError) -> Self {
        OutputError::Image(e)
    }
}

/// Create the parent directories of `path` if they don't exist.
pub fn ensure_parent(path: &Path) -> Result<(), OutputError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Save an RGBA image to a PNG file, creating parent directories.
pub fn save_png(image: &RgbaImage, path: &Path) -> Result<(), OutputError> {
    ensure_parent(path)?;
    image.save(path)?;
    log::info!("wrote {}", path.display());
    Ok(())
}

/// Write a text artifact (SVG, JSON, payload, script), creating parent
/// directories.
pub fn write_text(path: &Path, contents: &str) -> Result<(), OutputError> {
    ensure_parent(path)?;
    std::fs::write(path, contents)?;
    log::info!("wrote {} ({} bytes)", path.display(), contents.len());
    Ok(())
}

/// Scale image by integer factor using nearest-neighbor interpolation.
///
/// This preserves crisp pixel edges for pixel art. Factors of 0 and 1
/// return the image unchanged.
pub fn scale_image(image: RgbaImage, factor: u32) -> RgbaImage {
    if factor <= 1 {
        return image;
    }
    let (w, h) = image.dimensions();
    image::imageops::resize(&image, w * factor, h * factor, FilterType::Nearest)
}

/// Output path for the artifact rendered from `input`.
///
/// | Scenario | Output |
/// |----------|--------|
/// | No `-o` | `input` with its extension replaced by `ext` |
/// | `-o out.svg` (single input) | `out.svg` |
/// | `-o out.svg` (several inputs) | `out_{input_stem}.svg` |
/// | `-o dir/` or existing directory | `dir/{input_stem}.{ext}` |
pub fn output_path(input: &Path, output_arg: Option<&Path>, ext: &str, is_single_input: bool) -> PathBuf {
    let input_stem = input.file_stem().and_then(|s| s.to_str()).unwrap_or("output");
    match output_arg {
        Some(output) => {
            let is_dir = output.as_os_str().to_string_lossy().ends_with('/') || output.is_dir();
            if is_dir {
                output.join(format!("{}.{}", input_stem, ext))
            } else if is_single_input {
                output.to_path_buf()
            } else {
                let stem = output.file_stem().and_then(|s| s.to_str()).unwrap_or("output");
                let out_ext = output.extension().and_then(|s| s.to_str()).unwrap_or(ext);
                let parent = output.parent().unwrap_or(Path::new(""));
                parent.join(format!("{}_{}.{}", stem, input_stem, out_ext))
            }
        }
        None => input.with_extension(ext),
    }
}

/// Path of the 1-based variant `index` in `dir` (`img_001.svg`, ...).
pub fn variant_path(dir: &Path, index: usize, ext: &str) -> PathBuf {
    dir.join(format!("img_{:03}.{}", index, ext))
}
