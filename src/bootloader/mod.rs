//! Self-decoding JavaScript snippet generation.
//!
//! The snippet is `decoder.js` with the packed payload, the palette variation
//! ranges and the orientation odds spliced in. At load time it draws one
//! palette shift and one orientation from `BTLDR.rnd` (or `Math.random`) in
//! the same order as [`PaletteVariation::sample`] followed by
//! [`OrientationOdds::sample`], and builds the SVG under `BTLDR.svg`.
//!
//! `palette.js` holds the HSL rotation used by the snippet. It must stay
//! numerically identical to [`crate::palette::rotate`]; both are checked
//! against `tests/fixtures/hsl_vectors.json`.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::RunModel;
use crate::palette::PaletteVariation;
use crate::payload;
use crate::transforms::OrientationOdds;

const DECODER_TEMPLATE: &str = include_str!("decoder.js");

/// HSL rotation shared with the decoder template.
pub const PALETTE_JS: &str = include_str!("palette.js");

static WHITESPACE: OnceLock<Regex> = OnceLock::new();

/// Snippet generation settings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BootloaderConfig {
    /// Refuse models whose palette is larger than this
    pub max_palette: Option<usize>,
    pub variation: PaletteVariation,
    pub odds: OrientationOdds,
}

/// Generated decoder source, readable and minified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snippet {
    pub payload: String,
    pub source: String,
    pub minified: String,
}

/// Byte counts reported next to a generated snippet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnippetStats {
    pub width: u32,
    pub height: u32,
    pub rows: usize,
    pub runs: usize,
    pub palette_size: usize,
    pub payload_bytes: usize,
    pub snippet_bytes: usize,
    pub snippet_min_bytes: usize,
}

impl Snippet {
    pub fn stats(&self, model: &RunModel) -> SnippetStats {
        SnippetStats {
            width: model.width(),
            height: model.height(),
            rows: model.rows().len(),
            runs: model.run_count(),
            palette_size: model.palette().len(),
            payload_bytes: self.payload.len(),
            snippet_bytes: self.source.len(),
            snippet_min_bytes: self.minified.len(),
        }
    }
}

/// Pack `model` and embed it in the decoder template.
///
/// Fails with [`Error::PaletteOverflow`] when the palette exceeds
/// `config.max_palette`, and with a payload error when the model has an
/// interior gap.
pub fn build_snippet(model: &RunModel, config: &BootloaderConfig) -> Result<Snippet> {
    if let Some(limit) = config.max_palette {
        let colors = model.palette().len();
        if colors > limit {
            return Err(Error::PaletteOverflow { colors, limit });
        }
    }

    let payload = payload::pack(model)?;
    let v = &config.variation;
    let ranges = serde_json::to_string(&[v.hue_min, v.hue_max, v.sat_min, v.sat_max, v.lum_min, v.lum_max])?;
    let odds = serde_json::to_string(&[config.odds.flip_x, config.odds.flip_y, config.odds.rot90])?;

    let source = DECODER_TEMPLATE
        .replace("__PALETTE_JS__", PALETTE_JS.trim_end())
        .replace("__VAR__", &ranges)
        .replace("__PROBS__", &odds)
        .replace("__PAYLOAD__", &payload);
    let minified = minify_js(&source);
    log::debug!(
        "snippet: payload {} bytes, source {} bytes, minified {} bytes",
        payload.len(),
        source.len(),
        minified.len()
    );

    Ok(Snippet { payload, source, minified })
}

/// Collapse every whitespace run to one space and trim the ends.
///
/// Only safe for sources without `//` comments or whitespace inside string
/// literals, which holds for the decoder template.
pub fn minify_js(source: &str) -> String {
    let re = WHITESPACE.get_or_init(|| Regex::new(r"\s+").expect("invalid whitespace regex"));
    re.replace_all(source, " ").trim().to_string()
}
