//! SVG output for run models.
//!
//! Documents are plain text built line by line. Every run becomes one
//! `<rect>`, grouped under one `<g fill>` per palette slot so each color is
//! written once per layer.

mod animated;
mod render;

pub use animated::{render_animated, AnimatedOptions, FrameSet, StaticBase, DEFAULT_FPS};
pub use render::{render, SvgOptions, VoxelConfig, DEFAULT_SCALE};
pub(crate) use render::resolve_palette;

use std::fmt::{self, Write};

use serde::{Deserialize, Serialize};

use crate::color::Rgb;
use crate::models::RunModel;
use crate::transforms::Orientation;

/// Cosmetic filter applied to the root group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SvgFilter {
    /// Monochrome fractal-noise grain
    Grain,
    /// Soft blur merged under the source
    Glow,
}

impl SvgFilter {
    /// Element id referenced by `filter="url(#...)"`.
    pub fn id(self) -> &'static str {
        match self {
            SvgFilter::Grain => "fx-grain",
            SvgFilter::Glow => "fx-glow",
        }
    }

    fn definition(self) -> &'static str {
        match self {
            SvgFilter::Grain => concat!(
                r#"<filter id="fx-grain" x="-10%" y="-10%" width="120%" height="120%">"#,
                r#"<feTurbulence type="fractalNoise" baseFrequency="0.8" numOctaves="1" seed="2" result="noise"/>"#,
                r#"<feColorMatrix in="noise" type="saturate" values="0"/>"#,
                r#"<feBlend in="SourceGraphic" in2="noise" mode="multiply"/>"#,
                r#"</filter>"#
            ),
            SvgFilter::Glow => concat!(
                r#"<filter id="fx-glow" x="-30%" y="-30%" width="160%" height="160%">"#,
                r#"<feGaussianBlur stdDeviation="1" result="b1"/>"#,
                r#"<feMerge><feMergeNode in="b1"/><feMergeNode in="SourceGraphic"/></feMerge>"#,
                r#"</filter>"#
            ),
        }
    }
}

impl fmt::Display for SvgFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SvgFilter::Grain => "grain",
            SvgFilter::Glow => "glow",
        })
    }
}

/// Escape text for use in element content or attribute values.
pub fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Shortest decimal form with at most 6 fractional digits (`1.5`, `3`, `-0.55`).
pub fn fmt_num(v: f64) -> String {
    let s = format!("{:.6}", v);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

/// Document-level settings shared by static and animated output.
pub(crate) struct Frame<'a> {
    pub width: u32,
    pub height: u32,
    pub background: Option<Rgb>,
    pub filter: Option<SvgFilter>,
    pub title: Option<&'a str>,
    pub desc: Option<&'a str>,
}

/// Write everything up to and including the opening root `<g>` and the
/// optional background rect.
pub(crate) fn open_document(out: &mut String, frame: &Frame<'_>) -> fmt::Result {
    let (w, h) = (frame.width, frame.height);
    writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#
    )?;
    if let Some(title) = frame.title {
        writeln!(out, "<title>{}</title>", escape_xml(title))?;
    }
    if let Some(desc) = frame.desc {
        writeln!(out, "<desc>{}</desc>", escape_xml(desc))?;
    }
    writeln!(out, "<style>*{{shape-rendering:crispEdges}}</style>")?;
    match frame.filter {
        Some(filter) => {
            writeln!(out, "<defs>{}</defs>", filter.definition())?;
            writeln!(out, r#"<g filter="url(#{})">"#, filter.id())?;
        }
        None => writeln!(out, "<g>")?,
    }
    if let Some(bg) = frame.background {
        writeln!(out, r#"<rect x="0" y="0" width="{w}" height="{h}" fill="{bg}"/>"#)?;
    }
    Ok(())
}

pub(crate) fn close_document(out: &mut String) -> fmt::Result {
    writeln!(out, "</g>")?;
    writeln!(out, "</svg>")
}

/// Write one `<g fill>` group per used palette slot, in ascending slot
/// order, each holding the rects of its runs.
pub(crate) fn write_runs(
    out: &mut String,
    model: &RunModel,
    palette: &[Rgb],
    orientation: Orientation,
    scale: u32,
) -> fmt::Result {
    let mut groups: Vec<Vec<(u32, u32, u32, u32)>> = vec![Vec::new(); palette.len()];
    for run in orientation.place(model) {
        if let Some(group) = groups.get_mut(run.index as usize) {
            group.push((run.x * scale, run.y * scale, run.width() * scale, run.height() * scale));
        }
    }

    for (color, rects) in palette.iter().zip(&groups) {
        if rects.is_empty() {
            continue;
        }
        writeln!(out, r#"<g fill="{}">"#, color)?;
        for (x, y, w, h) in rects {
            writeln!(out, r#"<rect x="{x}" y="{y}" width="{w}" height="{h}"/>"#)?;
        }
        writeln!(out, "</g>")?;
    }
    Ok(())
}
