//! Configuration loading and discovery for `pxr.toml`
//!
//! Provides functions to find, load, and merge configuration.

use super::schema::PxrConfig;
use crate::color::Rgb;
use crate::quantize::Quantizer;
use crate::svg::SvgFilter;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name looked up by [`find_config`]
pub const CONFIG_FILE: &str = "pxr.toml";

/// Configuration loading error
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// File I/O error
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error
    #[error("Failed to parse pxr.toml: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error
    #[error("Config validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    Validation(Vec<String>),
}

/// CLI arguments that can override config values
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub scale: Option<u32>,
    pub alpha_threshold: Option<u8>,
    pub max_colors: Option<usize>,
    pub quantizer: Option<Quantizer>,
    pub trim: Option<bool>,
    /// Substitute for invisible pixels when encoding
    pub substitute: Option<Rgb>,
    /// SVG/PNG background fill
    pub background: Option<Rgb>,
    pub filter: Option<SvgFilter>,
    pub max_palette: Option<usize>,
    pub fps: Option<f64>,
    pub max_frames: Option<usize>,
    pub static_base: Option<bool>,
    pub frames: Option<usize>,
    pub frame_ms: Option<u32>,
}

/// Find pxr.toml by walking up from the current working directory.
///
/// Search order:
/// 1. Walk up from current directory looking for pxr.toml
/// 2. Check XDG_CONFIG_HOME/pixelrun/pxr.toml (or ~/.config/pixelrun/pxr.toml)
pub fn find_config() -> Option<PathBuf> {
    if let Ok(cwd) = env::current_dir() {
        if let Some(path) = find_config_from(cwd) {
            return Some(path);
        }
    }
    find_xdg_config()
}

/// Find pxr.toml in the XDG config directory.
pub fn find_xdg_config() -> Option<PathBuf> {
    let xdg_config = env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|_| env::var("HOME").map(|h| PathBuf::from(h).join(".config")))
        .ok()?;

    let config_path = xdg_config.join("pixelrun").join(CONFIG_FILE);
    if config_path.exists() {
        Some(config_path)
    } else {
        None
    }
}

/// Find pxr.toml by walking up from a specific directory.
pub fn find_config_from(start: PathBuf) -> Option<PathBuf> {
    let mut current = start;

    loop {
        let config_path = current.join(CONFIG_FILE);
        if config_path.exists() {
            return Some(config_path);
        }
        if !current.pop() {
            return None;
        }
    }
}

/// Load configuration from a pxr.toml file.
///
/// If a path is provided, loads from that file. Otherwise, uses `find_config()`
/// to locate the config file. If no config file is found, returns the default
/// configuration.
pub fn load_config(path: Option<&Path>) -> Result<PxrConfig, ConfigError> {
    let config_path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => find_config(),
    };

    match config_path {
        Some(p) => load_config_file(&p),
        None => Ok(PxrConfig::default()),
    }
}

fn load_config_file(path: &Path) -> Result<PxrConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    let config: PxrConfig = toml::from_str(&contents)?;

    let errors = config.validate();
    if !errors.is_empty() {
        return Err(ConfigError::Validation(errors.into_iter().map(|e| e.to_string()).collect()));
    }

    log::debug!("loaded config from {}", path.display());
    Ok(config)
}

/// Merge CLI overrides into a configuration.
///
/// CLI arguments take precedence over config file values.
pub fn merge_cli_overrides(config: &mut PxrConfig, overrides: &CliOverrides) {
    if let Some(scale) = overrides.scale {
        config.svg.scale = scale;
    }
    if let Some(alpha) = overrides.alpha_threshold {
        config.encode.alpha_threshold = alpha;
    }
    if let Some(max_colors) = overrides.max_colors {
        config.encode.max_colors = Some(max_colors);
    }
    if let Some(quantizer) = overrides.quantizer {
        config.encode.quantizer = quantizer;
    }
    if let Some(trim) = overrides.trim {
        config.encode.trim = trim;
    }
    if let Some(substitute) = overrides.substitute {
        config.encode.background = Some(substitute);
    }
    if let Some(background) = overrides.background {
        config.svg.background = Some(background);
    }
    if let Some(filter) = overrides.filter {
        config.svg.filter = Some(filter);
    }
    if let Some(max_palette) = overrides.max_palette {
        config.encode.max_palette = Some(max_palette);
    }
    if let Some(fps) = overrides.fps {
        config.animation.fps = Some(fps);
    }
    if let Some(max_frames) = overrides.max_frames {
        config.animation.max_frames = Some(max_frames);
    }
    if let Some(static_base) = overrides.static_base {
        config.animation.static_base = static_base;
    }
    if let Some(frames) = overrides.frames {
        config.animation.frames = frames;
    }
    if let Some(frame_ms) = overrides.frame_ms {
        config.animation.frame_ms = frame_ms;
    }
}
