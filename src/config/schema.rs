//! Configuration schema types for `pxr.toml`
//!
//! Every section is optional; missing keys take the defaults below.

use serde::{Deserialize, Serialize};

use crate::bootloader::BootloaderConfig;
use crate::color::Rgb;
use crate::encoder::EncodeOptions;
use crate::palette::PaletteVariation;
use crate::quantize::Quantizer;
use crate::svg::{SvgFilter, VoxelConfig};
use crate::transforms::OrientationOdds;

/// SVG units (or PNG pixels) per source pixel
pub const DEFAULT_SCALE: u32 = crate::svg::DEFAULT_SCALE;
/// Minimum alpha of a visible pixel
pub const DEFAULT_ALPHA_THRESHOLD: u8 = crate::encoder::DEFAULT_ALPHA_THRESHOLD;
/// Frames in a hue-sweep GIF
pub const DEFAULT_GIF_FRAMES: usize = 12;
/// Delay between hue-sweep GIF frames
pub const DEFAULT_FRAME_MS: u32 = 100;
/// Crop transparent borders before encoding
pub const DEFAULT_TRIM: bool = true;
/// Animated SVGs draw unchanging pixels once
pub const DEFAULT_STATIC_BASE: bool = true;

/// `[encode]`: raster to run model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodeConfig {
    pub max_colors: Option<usize>,
    pub quantizer: Quantizer,
    /// Crop to the non-transparent bounding box
    pub trim: bool,
    /// Substitute for invisible pixels
    pub background: Option<Rgb>,
    pub alpha_threshold: u8,
    /// Largest palette the bootloader snippet may embed
    pub max_palette: Option<usize>,
}

impl Default for EncodeConfig {
    fn default() -> Self {
        Self {
            max_colors: None,
            quantizer: Quantizer::default(),
            trim: DEFAULT_TRIM,
            background: None,
            alpha_threshold: DEFAULT_ALPHA_THRESHOLD,
            max_palette: None,
        }
    }
}

/// `[svg]`: document settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SvgConfig {
    pub scale: u32,
    pub filter: Option<SvgFilter>,
    pub background: Option<Rgb>,
}

impl Default for SvgConfig {
    fn default() -> Self {
        Self { scale: DEFAULT_SCALE, filter: None, background: None }
    }
}

/// `[variation]`: seeded palette and orientation variants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VariationConfig {
    pub hue_min: f64,
    pub hue_max: f64,
    pub sat_min: f64,
    pub sat_max: f64,
    pub lum_min: f64,
    pub lum_max: f64,
    pub flip_x: f64,
    pub flip_y: f64,
    pub rot90: f64,
}

impl Default for VariationConfig {
    fn default() -> Self {
        let p = PaletteVariation::default();
        let o = OrientationOdds::default();
        Self {
            hue_min: p.hue_min,
            hue_max: p.hue_max,
            sat_min: p.sat_min,
            sat_max: p.sat_max,
            lum_min: p.lum_min,
            lum_max: p.lum_max,
            flip_x: o.flip_x,
            flip_y: o.flip_y,
            rot90: o.rot90,
        }
    }
}

impl VariationConfig {
    pub fn palette(&self) -> PaletteVariation {
        PaletteVariation {
            hue_min: self.hue_min,
            hue_max: self.hue_max,
            sat_min: self.sat_min,
            sat_max: self.sat_max,
            lum_min: self.lum_min,
            lum_max: self.lum_max,
        }
    }

    pub fn odds(&self) -> OrientationOdds {
        OrientationOdds { flip_x: self.flip_x, flip_y: self.flip_y, rot90: self.rot90 }
    }
}

/// `[animation]`: animated SVG and GIF output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Playback rate; derived from the source delays when unset
    pub fps: Option<f64>,
    /// Read at most this many source frames
    pub max_frames: Option<usize>,
    pub static_base: bool,
    /// Frames per hue-sweep GIF
    pub frames: usize,
    pub frame_ms: u32,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            fps: None,
            max_frames: None,
            static_base: DEFAULT_STATIC_BASE,
            frames: DEFAULT_GIF_FRAMES,
            frame_ms: DEFAULT_FRAME_MS,
        }
    }
}

/// Complete pxr.toml configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PxrConfig {
    pub encode: EncodeConfig,
    pub svg: SvgConfig,
    pub voxel: VoxelConfig,
    pub variation: VariationConfig,
    pub animation: AnimationConfig,
}

/// Configuration validation error
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    /// Path to the invalid field (e.g., "voxel.thickness")
    pub field: String,
    /// Error message
    pub message: String,
}

impl ConfigValidationError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self { field: field.to_string(), message: message.into() }
    }
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "pxr.toml: '{}' {}", self.field, self.message)
    }
}

impl PxrConfig {
    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();

        if self.encode.max_colors == Some(0) {
            errors.push(ConfigValidationError::new("encode.max_colors", "must be at least 1"));
        }
        if self.encode.max_palette == Some(0) {
            errors.push(ConfigValidationError::new("encode.max_palette", "must be at least 1"));
        }
        if self.svg.scale == 0 {
            errors.push(ConfigValidationError::new("svg.scale", "must be a positive integer"));
        }
        if let Err(message) = self.voxel.validate() {
            errors.push(ConfigValidationError::new("voxel", message));
        }
        if let Err(message) = self.variation.palette().validate() {
            errors.push(ConfigValidationError::new("variation", message));
        }
        let odds = [
            ("variation.flip_x", self.variation.flip_x),
            ("variation.flip_y", self.variation.flip_y),
            ("variation.rot90", self.variation.rot90),
        ];
        for (field, p) in odds {
            if !(0.0..=1.0).contains(&p) {
                errors.push(ConfigValidationError::new(field, "must be a probability between 0 and 1"));
            }
        }
        if let Some(fps) = self.animation.fps {
            if !(fps.is_finite() && fps > 0.0) {
                errors.push(ConfigValidationError::new("animation.fps", "must be a positive number"));
            }
        }
        if self.animation.max_frames == Some(0) {
            errors.push(ConfigValidationError::new("animation.max_frames", "must be at least 1"));
        }
        if self.animation.frames == 0 {
            errors.push(ConfigValidationError::new("animation.frames", "must be at least 1"));
        }
        if self.animation.frame_ms < 10 {
            errors.push(ConfigValidationError::new("animation.frame_ms", "must be at least 10 (GIF delays are centiseconds)"));
        }

        errors
    }

    /// Check if validation passed
    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }

    pub fn encode_options(&self) -> EncodeOptions {
        EncodeOptions {
            max_colors: self.encode.max_colors,
            quantizer: self.encode.quantizer,
            trim_transparent: self.encode.trim,
            transparent_substitute: self.encode.background,
            alpha_threshold: self.encode.alpha_threshold,
        }
    }

    pub fn bootloader(&self) -> BootloaderConfig {
        BootloaderConfig {
            max_palette: self.encode.max_palette,
            variation: self.variation.palette(),
            odds: self.variation.odds(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_parse() {
        let config: PxrConfig = toml::from_str("").unwrap();
        assert_eq!(config, PxrConfig::default());
        assert_eq!(config.svg.scale, 10);
        assert_eq!(config.voxel.thickness, 3);
        assert_eq!(config.variation.sat_max, 2.05);
        assert!(config.animation.static_base);
        assert!(config.encode.trim);
        assert!(config.encode_options().trim_transparent);
        assert!(config.is_valid());
    }

    #[test]
    fn test_full_config_parse() {
        let toml = r##"
[encode]
max_colors = 32
quantizer = "octree"
trim = false
background = "#112233"
alpha_threshold = 128
max_palette = 64

[svg]
scale = 4
filter = "grain"
background = "black"

[voxel]
thickness = 5
dx = 0.5

[variation]
hue_min = 90
hue_max = 180
rot90 = 0.25

[animation]
fps = 12.5
max_frames = 40
static_base = false
frames = 24
frame_ms = 80
"##;
        let config: PxrConfig = toml::from_str(toml).unwrap();

        assert_eq!(config.encode.max_colors, Some(32));
        assert_eq!(config.encode.quantizer, Quantizer::Octree);
        assert_eq!(config.encode.background, Some(Rgb::new(0x11, 0x22, 0x33)));
        assert_eq!(config.svg.filter, Some(SvgFilter::Grain));
        assert_eq!(config.svg.background, Some(Rgb::BLACK));
        assert_eq!(config.voxel.thickness, 5);
        assert_eq!(config.voxel.dy, -0.55);
        assert_eq!(config.variation.palette().hue_max, 180.0);
        assert_eq!(config.variation.odds().rot90, 0.25);
        assert_eq!(config.animation.fps, Some(12.5));
        assert!(!config.animation.static_base);
        assert!(config.is_valid());

        let options = config.encode_options();
        assert!(!options.trim_transparent);
        assert_eq!(options.alpha_threshold, 128);
        assert_eq!(config.bootloader().max_palette, Some(64));
    }

    #[test]
    fn test_validation_errors() {
        let toml = r#"
[encode]
max_colors = 0

[svg]
scale = 0

[voxel]
thickness = 0

[variation]
sat_min = 3.0
flip_x = 1.5

[animation]
fps = 0
frame_ms = 5
"#;
        let config: PxrConfig = toml::from_str(toml).unwrap();
        let fields: Vec<String> = config.validate().into_iter().map(|e| e.field).collect();
        for field in
            ["encode.max_colors", "svg.scale", "voxel", "variation", "variation.flip_x", "animation.fps", "animation.frame_ms"]
        {
            assert!(fields.iter().any(|f| f == field), "missing {}", field);
        }
    }

    #[test]
    fn test_unknown_quantizer_rejected() {
        let result: Result<PxrConfig, _> = toml::from_str("[encode]\nquantizer = \"kmeans\"\n");
        assert!(result.is_err());
    }
}
