//! Animated SVG: a majority-vote base layer plus per-frame delta layers,
//! each toggled on a repeating clock.
//!
//! Frames show through discrete `display` animations. Frame `i` of `n` is
//! visible during `[i/fps, (i+1)/fps)` of a cycle lasting `n/fps` seconds.

use std::fmt::Write;

use image::RgbaImage;

use super::render::{write_body, DEFAULT_SCALE};
use super::{close_document, fmt_num, open_document, SvgFilter, SvgOptions, VoxelConfig};
use crate::color::Rgb;
use crate::encoder::{encode_with, DEFAULT_ALPHA_THRESHOLD};
use crate::error::{Error, Result};
use crate::models::RunModel;
use crate::transforms::Orientation;

/// Frame rate used when neither an explicit rate nor usable timing exists.
pub const DEFAULT_FPS: f64 = 6.0;

/// Same-size animation frames with their source delays.
#[derive(Debug, Clone)]
pub struct FrameSet {
    frames: Vec<RgbaImage>,
    delays_ms: Vec<u32>,
}

impl FrameSet {
    /// Frames without timing information.
    pub fn new(frames: Vec<RgbaImage>) -> Result<Self> {
        Self::with_delays(frames, Vec::new())
    }

    /// Frames with per-frame delays; `delays_ms` may be empty.
    pub fn with_delays(frames: Vec<RgbaImage>, delays_ms: Vec<u32>) -> Result<Self> {
        let first = frames.first().ok_or_else(|| Error::invalid_image("animation has no frames"))?;
        let expected = first.dimensions();
        if expected.0 == 0 || expected.1 == 0 {
            return Err(Error::invalid_image("animation frames have zero size"));
        }
        if let Some((index, frame)) = frames.iter().enumerate().find(|(_, f)| f.dimensions() != expected) {
            return Err(Error::FrameSizeMismatch { index, expected, found: frame.dimensions() });
        }
        if !delays_ms.is_empty() && delays_ms.len() != frames.len() {
            return Err(Error::invalid_image(format!(
                "{} delays for {} frames",
                delays_ms.len(),
                frames.len()
            )));
        }
        Ok(Self { frames, delays_ms })
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frames(&self) -> &[RgbaImage] {
        &self.frames
    }

    pub fn delays_ms(&self) -> &[u32] {
        &self.delays_ms
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.frames[0].dimensions()
    }

    /// `explicit` when positive, else `1000 / mean delay`, else [`DEFAULT_FPS`].
    pub fn fps(&self, explicit: Option<f64>) -> f64 {
        if let Some(fps) = explicit.filter(|f| f.is_finite() && *f > 0.0) {
            return fps;
        }
        if self.delays_ms.is_empty() {
            return DEFAULT_FPS;
        }
        let mean = self.delays_ms.iter().map(|&d| d as f64).sum::<f64>() / self.delays_ms.len() as f64;
        if mean > 0.0 {
            1000.0 / mean
        } else {
            DEFAULT_FPS
        }
    }

    /// Per-pixel majority color over the visible samples of all frames.
    ///
    /// On a tie the color seen first (in frame order) among those with the
    /// highest count is kept. Pixels never visible stay transparent.
    pub fn static_base(&self, alpha_threshold: u8) -> StaticBase {
        let (width, height) = self.dimensions();
        let mut pixels = Vec::with_capacity((width * height) as usize);
        let mut counts: Vec<(Rgb, u32)> = Vec::new();
        for y in 0..height {
            for x in 0..width {
                counts.clear();
                for frame in &self.frames {
                    let px = frame.get_pixel(x, y);
                    if px[3] < alpha_threshold {
                        continue;
                    }
                    let color = Rgb::from_rgba(*px);
                    match counts.iter_mut().find(|(c, _)| *c == color) {
                        Some((_, n)) => *n += 1,
                        None => counts.push((color, 1)),
                    }
                }
                // `counts` is in first-seen order; only a strictly larger count replaces
                let best = counts.iter().fold(None, |best: Option<(Rgb, u32)>, &(c, n)| match best {
                    Some((_, bn)) if n <= bn => best,
                    _ => Some((c, n)),
                });
                pixels.push(best.map(|(c, _)| c));
            }
        }
        StaticBase { width, height, pixels }
    }

    /// Pixels of frame `index` that must be drawn over `base`: visible in the
    /// frame and either invisible or differently colored in the base.
    ///
    /// Pixels that turn invisible relative to the base have nothing to draw
    /// and stay gaps.
    pub fn delta(&self, base: &StaticBase, index: usize, alpha_threshold: u8) -> Result<RunModel> {
        let frame = self.frame(index)?;
        encode_with(base.width, base.height, |x, y| {
            let px = frame.get_pixel(x, y);
            if px[3] < alpha_threshold {
                return None;
            }
            let color = Rgb::from_rgba(*px);
            (base.get(x, y) != Some(color)).then_some(color)
        })
    }

    /// Whole frame `index` under the gap policy, unquantized.
    pub fn frame_model(&self, index: usize, alpha_threshold: u8) -> Result<RunModel> {
        let frame = self.frame(index)?;
        let (width, height) = frame.dimensions();
        encode_with(width, height, |x, y| {
            let px = frame.get_pixel(x, y);
            (px[3] >= alpha_threshold).then(|| Rgb::from_rgba(*px))
        })
    }

    fn frame(&self, index: usize) -> Result<&RgbaImage> {
        self.frames
            .get(index)
            .ok_or_else(|| Error::invalid_image(format!("frame {} out of range ({} frames)", index, self.len())))
    }
}

/// Majority-vote base layer of a [`FrameSet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticBase {
    width: u32,
    height: u32,
    pixels: Vec<Option<Rgb>>,
}

impl StaticBase {
    pub fn get(&self, x: u32, y: u32) -> Option<Rgb> {
        self.pixels[(y * self.width + x) as usize]
    }

    pub fn to_model(&self) -> Result<RunModel> {
        encode_with(self.width, self.height, |x, y| self.get(x, y))
    }
}

/// Animated render settings.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimatedOptions {
    /// Frames per second; derived from the frame delays when `None`
    pub fps: Option<f64>,
    /// Draw a majority base once and only per-frame differences on top
    pub use_static_base: bool,
    pub alpha_threshold: u8,
    pub scale: u32,
    pub orientation: Orientation,
    pub voxel: Option<VoxelConfig>,
    pub background: Option<Rgb>,
    pub filter: Option<SvgFilter>,
    pub title: Option<String>,
    pub desc: Option<String>,
}

impl Default for AnimatedOptions {
    fn default() -> Self {
        Self {
            fps: None,
            use_static_base: false,
            alpha_threshold: DEFAULT_ALPHA_THRESHOLD,
            scale: DEFAULT_SCALE,
            orientation: Orientation::default(),
            voxel: None,
            background: None,
            filter: None,
            title: None,
            desc: None,
        }
    }
}

impl AnimatedOptions {
    fn layer_options(&self) -> SvgOptions {
        SvgOptions {
            scale: self.scale,
            voxel: self.voxel,
            orientation: self.orientation,
            palette_override: None,
            background: self.background,
            filter: self.filter,
            title: self.title.clone(),
            desc: self.desc.clone(),
        }
    }
}

/// Render a frame set as a looping animated SVG document.
pub fn render_animated(frames: &FrameSet, options: &AnimatedOptions) -> Result<String> {
    let (width, height) = frames.dimensions();
    let fps = frames.fps(options.fps);
    let count = frames.len();
    let threshold = options.alpha_threshold;
    let layer = options.layer_options();

    let mut out = String::new();
    open_document(&mut out, &layer.frame(width, height))?;

    let clock = Clock { count, dur: count as f64 / fps };
    if options.use_static_base {
        let base = frames.static_base(threshold);
        let base_model = base.to_model()?;
        writeln!(out, r#"<g id="base">"#)?;
        write_body(&mut out, &base_model, base_model.palette(), &layer)?;
        writeln!(out, "</g>")?;

        let mut skipped = 0;
        for i in 0..count {
            let delta = frames.delta(&base, i, threshold)?;
            if delta.is_empty() {
                skipped += 1;
                continue;
            }
            write_toggle(&mut out, i, &clock, &delta, &layer)?;
        }
        log::debug!("static base: {} of {} frames had no delta", skipped, count);
    } else {
        for i in 0..count {
            let model = frames.frame_model(i, threshold)?;
            write_toggle(&mut out, i, &clock, &model, &layer)?;
        }
    }

    close_document(&mut out)?;
    Ok(out)
}

struct Clock {
    count: usize,
    /// Cycle length in seconds
    dur: f64,
}

fn write_toggle(
    out: &mut String,
    index: usize,
    clock: &Clock,
    model: &RunModel,
    layer: &SvgOptions,
) -> std::fmt::Result {
    let n = clock.count as f64;
    let start = index as f64 / n;
    let end = (index + 1) as f64 / n;
    writeln!(out, r#"<g id="f{}" display="none">"#, index)?;
    writeln!(
        out,
        r#"<animate attributeName="display" values="none;inline;none" keyTimes="0;{};{}" calcMode="discrete" dur="{}s" repeatCount="indefinite"/>"#,
        fmt_num(start),
        fmt_num(end),
        fmt_num(clock.dur)
    )?;
    write_body(out, model, model.palette(), layer)?;
    writeln!(out, "</g>")
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);
    const CLEAR: Rgba<u8> = Rgba([0, 0, 0, 0]);

    fn solid(w: u32, h: u32, px: Rgba<u8>) -> RgbaImage {
        RgbaImage::from_pixel(w, h, px)
    }

    #[test]
    fn test_frame_set_validation() {
        assert!(matches!(FrameSet::new(vec![]), Err(Error::InvalidImage(_))));
        let err = FrameSet::new(vec![solid(2, 2, RED), solid(2, 3, RED)]).unwrap_err();
        assert!(matches!(err, Error::FrameSizeMismatch { index: 1, expected: (2, 2), found: (2, 3) }));
        assert!(FrameSet::with_delays(vec![solid(1, 1, RED)], vec![10, 20]).is_err());
    }

    #[test]
    fn test_fps_derivation() {
        let frames = vec![solid(1, 1, RED), solid(1, 1, BLUE)];
        let set = FrameSet::with_delays(frames.clone(), vec![100, 300]).unwrap();
        assert_eq!(set.fps(None), 5.0);
        assert_eq!(set.fps(Some(12.0)), 12.0);
        assert_eq!(set.fps(Some(0.0)), 5.0);

        let set = FrameSet::with_delays(frames.clone(), vec![0, 0]).unwrap();
        assert_eq!(set.fps(None), DEFAULT_FPS);
        assert_eq!(FrameSet::new(frames).unwrap().fps(None), DEFAULT_FPS);
    }

    #[test]
    fn test_majority_base() {
        let a = RgbaImage::from_fn(3, 1, |x, _| [RED, RED, CLEAR][x as usize]);
        let b = RgbaImage::from_fn(3, 1, |x, _| [BLUE, RED, CLEAR][x as usize]);
        let c = RgbaImage::from_fn(3, 1, |x, _| [BLUE, CLEAR, CLEAR][x as usize]);
        let set = FrameSet::new(vec![a, b, c]).unwrap();
        let base = set.static_base(1);
        assert_eq!(base.get(0, 0), Some(Rgb::new(0, 0, 255)));
        assert_eq!(base.get(1, 0), Some(Rgb::new(255, 0, 0)));
        assert_eq!(base.get(2, 0), None);
    }

    #[test]
    fn test_majority_tie_keeps_first_seen() {
        let set = FrameSet::new(vec![solid(1, 1, BLUE), solid(1, 1, RED)]).unwrap();
        assert_eq!(set.static_base(1).get(0, 0), Some(Rgb::new(0, 0, 255)));

        // B reaches two first, but A was seen first and also has two
        let frames = vec![solid(1, 1, RED), solid(1, 1, BLUE), solid(1, 1, BLUE), solid(1, 1, RED)];
        let set = FrameSet::new(frames).unwrap();
        assert_eq!(set.static_base(1).get(0, 0), Some(Rgb::new(255, 0, 0)));

        // Invisible samples don't count toward first-seen order
        let frames = vec![solid(1, 1, CLEAR), solid(1, 1, BLUE), solid(1, 1, RED), solid(1, 1, RED), solid(1, 1, BLUE)];
        let set = FrameSet::new(frames).unwrap();
        assert_eq!(set.static_base(1).get(0, 0), Some(Rgb::new(0, 0, 255)));
    }

    #[test]
    fn test_delta_only_holds_changes() {
        let a = RgbaImage::from_fn(3, 1, |x, _| [RED, RED, RED][x as usize]);
        let b = RgbaImage::from_fn(3, 1, |x, _| [RED, BLUE, CLEAR][x as usize]);
        let set = FrameSet::new(vec![a.clone(), a, b]).unwrap();
        let base = set.static_base(1);

        assert!(set.delta(&base, 0, 1).unwrap().is_empty());
        let delta = set.delta(&base, 2, 1).unwrap();
        assert_eq!(delta.palette(), &[Rgb::new(0, 0, 255)]);
        assert_eq!(delta.rows()[0].len(), 1);
        assert_eq!(delta.rows()[0][0].x, 1);
    }

    #[test]
    fn test_identical_frames_emit_no_toggles() {
        let set = FrameSet::new(vec![solid(2, 2, RED); 3]).unwrap();
        let options = AnimatedOptions { use_static_base: true, ..Default::default() };
        let svg = render_animated(&set, &options).unwrap();
        assert!(svg.contains(r#"<g id="base">"#));
        assert!(!svg.contains(r#"id="f"#));
        assert!(!svg.contains("<animate"));
    }

    #[test]
    fn test_full_mode_toggles_every_frame() {
        let set = FrameSet::with_delays(vec![solid(1, 1, RED), solid(1, 1, BLUE)], vec![500, 500]).unwrap();
        let svg = render_animated(&set, &AnimatedOptions::default()).unwrap();
        assert!(!svg.contains(r#"<g id="base">"#));
        assert_eq!(svg.matches("<animate ").count(), 2);
        assert!(svg.contains(r#"<g id="f0" display="none">"#));
        assert!(svg.contains(r#"keyTimes="0;0.5;1" calcMode="discrete" dur="1s""#));
    }

    #[test]
    fn test_static_base_toggle_window() {
        let frames = vec![solid(1, 1, RED), solid(1, 1, RED), solid(1, 1, BLUE)];
        let options = AnimatedOptions { use_static_base: true, fps: Some(3.0), ..Default::default() };
        let svg = render_animated(&FrameSet::new(frames).unwrap(), &options).unwrap();
        assert_eq!(svg.matches("<animate ").count(), 1);
        assert!(svg.contains(r#"<g id="f2" display="none">"#));
        assert!(svg.contains(r#"keyTimes="0;0.666667;1""#));
        assert!(svg.contains(r#"dur="1s""#));
    }
}
