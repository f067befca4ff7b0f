//! Input loading: raster images, layer stacks, and saved run models.

use std::path::{Path, PathBuf};

use glob::{glob_with, MatchOptions};
use image::{imageops, RgbaImage};

use crate::encoder::{encode, EncodeOptions};
use crate::error::{Error, Result};
use crate::models::RunModel;
use crate::payload;

/// Load an image as RGBA. Animated inputs yield their first frame.
pub fn load_image_rgba(path: &Path) -> Result<RgbaImage> {
    let image = image::open(path)?.to_rgba8();
    if image.width() == 0 || image.height() == 0 {
        return Err(Error::invalid_image(format!("{} has zero size", path.display())));
    }
    Ok(image)
}

/// Alpha-composite same-size layers in order, first layer at the bottom.
pub fn stack_layers(paths: &[PathBuf]) -> Result<RgbaImage> {
    let (first, rest) = paths.split_first().ok_or_else(|| Error::invalid_image("no layer images given"))?;
    let mut base = load_image_rgba(first)?;
    let expected = base.dimensions();
    for path in rest {
        let layer = load_image_rgba(path)?;
        if layer.dimensions() != expected {
            return Err(Error::LayerSizeMismatch {
                name: path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default(),
                expected,
                found: layer.dimensions(),
            });
        }
        imageops::overlay(&mut base, &layer, 0, 0);
    }
    log::debug!("stacked {} layers at {}x{}", paths.len(), expected.0, expected.1);
    Ok(base)
}

/// PNG files directly inside `dir`, sorted by file name. The extension
/// match ignores case.
pub fn find_png_files(dir: &Path) -> Vec<PathBuf> {
    let options = MatchOptions { case_sensitive: false, ..MatchOptions::new() };
    let pattern = format!("{}/*.png", glob::Pattern::escape(&dir.display().to_string()));
    let mut files: Vec<PathBuf> = match glob_with(&pattern, options) {
        Ok(paths) => paths.filter_map(std::result::Result::ok).filter(|p| p.is_file()).collect(),
        Err(_) => Vec::new(),
    };
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    files
}

/// A single image file, or a directory of PNG layers stacked bottom to top
/// in file-name order.
pub fn load_source(path: &Path) -> Result<RgbaImage> {
    if path.is_dir() {
        let layers = find_png_files(path);
        if layers.is_empty() {
            return Err(Error::invalid_image(format!("no PNG layers in {}", path.display())));
        }
        stack_layers(&layers)
    } else {
        load_image_rgba(path)
    }
}

/// Replace directories by the PNG files they contain.
pub fn expand_inputs(inputs: &[PathBuf]) -> Vec<PathBuf> {
    inputs
        .iter()
        .flat_map(|p| if p.is_dir() { find_png_files(p) } else { vec![p.clone()] })
        .collect()
}

/// What an input path holds, judged by its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// Run model JSON interchange (`*.json`)
    RunsJson,
    /// Packed payload text (`*.txt`)
    Payload,
    /// Anything else is decoded as an image
    Raster,
}

impl InputKind {
    pub fn of(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref() {
            Some("json") => InputKind::RunsJson,
            Some("txt") => InputKind::Payload,
            _ => InputKind::Raster,
        }
    }
}

/// Load a run model from JSON, a packed payload, or by encoding an image.
pub fn load_model(path: &Path, options: &EncodeOptions) -> Result<RunModel> {
    match InputKind::of(path) {
        InputKind::RunsJson => RunModel::from_json(&std::fs::read_to_string(path)?),
        InputKind::Payload => Ok(payload::unpack(std::fs::read_to_string(path)?.trim())?),
        InputKind::Raster => encode(&load_source(path)?, options),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use tempfile::tempdir;

    #[test]
    fn test_stack_layers_composites_in_order() {
        let dir = tempdir().unwrap();
        let bottom = RgbaImage::from_pixel(2, 1, Rgba([255, 0, 0, 255]));
        let mut top = RgbaImage::new(2, 1);
        top.put_pixel(1, 0, Rgba([0, 0, 255, 255]));
        bottom.save(dir.path().join("01_body.png")).unwrap();
        top.save(dir.path().join("02_hat.PNG")).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "x").unwrap();

        let files = find_png_files(dir.path());
        assert_eq!(files.len(), 2);
        assert!(files[0].ends_with("01_body.png"));

        let stacked = load_source(dir.path()).unwrap();
        assert_eq!(*stacked.get_pixel(0, 0), Rgba([255, 0, 0, 255]));
        assert_eq!(*stacked.get_pixel(1, 0), Rgba([0, 0, 255, 255]));
    }

    #[test]
    fn test_stack_layers_size_mismatch() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.png");
        let b = dir.path().join("b.png");
        RgbaImage::new(2, 2).save(&a).unwrap();
        RgbaImage::new(3, 2).save(&b).unwrap();
        let err = stack_layers(&[a, b]).unwrap_err();
        assert!(matches!(err, Error::LayerSizeMismatch { expected: (2, 2), found: (3, 2), .. }));
    }

    #[test]
    fn test_empty_layer_dir() {
        let dir = tempdir().unwrap();
        assert!(matches!(load_source(dir.path()), Err(Error::InvalidImage(_))));
    }

    #[test]
    fn test_input_kind() {
        assert_eq!(InputKind::of(Path::new("out/runs.json")), InputKind::RunsJson);
        assert_eq!(InputKind::of(Path::new("packed.TXT")), InputKind::Payload);
        assert_eq!(InputKind::of(Path::new("frog.png")), InputKind::Raster);
    }

    #[test]
    fn test_load_model_from_payload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("packed.txt");
        std::fs::write(&path, "2,2|P:#ff0000,#0000ff|R:2.0;1.1,1.0\n").unwrap();
        let model = load_model(&path, &EncodeOptions::default()).unwrap();
        assert_eq!(model.run_count(), 3);
    }
}
