//! Pixelrun - palette-indexed run-length codec and renderer for pixel art
//!
//! This library provides functionality to:
//! - Encode RGBA rasters into a palette plus per-row runs ([`encoder`])
//! - Pack and unpack the compact base-36 payload ([`payload`])
//! - Render run models as static, voxel-look or animated SVG ([`svg`]), PNG
//!   ([`raster`]) and GIF ([`gif`])
//! - Embed a payload in a self-decoding JavaScript snippet ([`bootloader`])
//! - Rotate palettes in HSL space, bit-identically to the snippet ([`palette`])

pub mod base36;
pub mod batch;
pub mod bootloader;
pub mod cli;
pub mod color;
pub mod config;
pub mod emoji;
pub mod encoder;
pub mod error;
pub mod gif;
pub mod models;
pub mod output;
pub mod palette;
pub mod payload;
pub mod quantize;
pub mod raster;
pub mod source;
pub mod svg;
pub mod transforms;

pub use error::{Error, Result};
