//! HSL palette rotation and seeded palette variation.
//!
//! [`rotate`] has a twin in the embedded decoder (`bootloader/palette.js`).
//! Both use the same operation order on `f64` values so they agree bit for
//! bit; `tests/fixtures/hsl_vectors.json` pins the shared results.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::color::Rgb;

/// Convert to HSL with every component in `[0, 1]`.
pub fn rgb_to_hsl(color: Rgb) -> (f64, f64, f64) {
    let r = color.r as f64 / 255.0;
    let g = color.g as f64 / 255.0;
    let b = color.b as f64 / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;
    let d = max - min;
    if d == 0.0 {
        return (0.0, 0.0, l);
    }

    let s = if l > 0.5 { d / (2.0 - max - min) } else { d / (max + min) };
    let h = if max == r {
        (g - b) / d + if g < b { 6.0 } else { 0.0 }
    } else if max == g {
        (b - r) / d + 2.0
    } else {
        (r - g) / d + 4.0
    };
    (h / 6.0, s, l)
}

/// Convert HSL (all components in `[0, 1]`) back to RGB.
pub fn hsl_to_rgb(h: f64, s: f64, l: f64) -> Rgb {
    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    let channel = |t: f64| (hue_to_rgb(p, q, t) * 255.0).round().clamp(0.0, 255.0) as u8;
    Rgb::new(channel(h + 1.0 / 3.0), channel(h), channel(h - 1.0 / 3.0))
}

fn hue_to_rgb(p: f64, q: f64, mut t: f64) -> f64 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }
    if t < 1.0 / 6.0 {
        return p + (q - p) * 6.0 * t;
    }
    if t < 0.5 {
        return q;
    }
    if t < 2.0 / 3.0 {
        return p + (q - p) * (2.0 / 3.0 - t) * 6.0;
    }
    p
}

fn clamp01(x: f64) -> f64 {
    x.clamp(0.0, 1.0)
}

/// Rotate one color's hue by `hue_deg` and scale its saturation and
/// lightness.
pub fn rotate_color(color: Rgb, hue_deg: f64, sat_scale: f64, lum_scale: f64) -> Rgb {
    let (h, s, l) = rgb_to_hsl(color);
    let h = (h + hue_deg / 360.0).rem_euclid(1.0);
    hsl_to_rgb(h, clamp01(s * sat_scale), clamp01(l * lum_scale))
}

/// Apply [`rotate_color`] to every entry, preserving order.
///
/// ```
/// use pixelrun::{color::Rgb, palette::rotate};
///
/// let red = Rgb::new(255, 0, 0);
/// assert_eq!(rotate(&[red], 120.0, 1.0, 1.0), vec![Rgb::new(0, 255, 0)]);
/// ```
pub fn rotate(palette: &[Rgb], hue_deg: f64, sat_scale: f64, lum_scale: f64) -> Vec<Rgb> {
    palette.iter().map(|&c| rotate_color(c, hue_deg, sat_scale, lum_scale)).collect()
}

/// One concrete palette transform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PaletteShift {
    pub hue_deg: f64,
    pub sat_scale: f64,
    pub lum_scale: f64,
}

impl Default for PaletteShift {
    fn default() -> Self {
        Self { hue_deg: 0.0, sat_scale: 1.0, lum_scale: 1.0 }
    }
}

impl PaletteShift {
    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply(&self, palette: &[Rgb]) -> Vec<Rgb> {
        rotate(palette, self.hue_deg, self.sat_scale, self.lum_scale)
    }
}

/// Ranges that seeded variants draw their [`PaletteShift`] from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaletteVariation {
    pub hue_min: f64,
    pub hue_max: f64,
    pub sat_min: f64,
    pub sat_max: f64,
    pub lum_min: f64,
    pub lum_max: f64,
}

impl Default for PaletteVariation {
    fn default() -> Self {
        Self { hue_min: 0.0, hue_max: 360.0, sat_min: 0.25, sat_max: 2.05, lum_min: 0.97, lum_max: 1.03 }
    }
}

fn pick_range<R: Rng + ?Sized>(rng: &mut R, lo: f64, hi: f64) -> f64 {
    lo + (hi - lo) * rng.random::<f64>()
}

impl PaletteVariation {
    /// Draw a shift; samples are taken in hue, saturation, lightness order.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> PaletteShift {
        let hue_deg = pick_range(rng, self.hue_min, self.hue_max);
        let sat_scale = pick_range(rng, self.sat_min, self.sat_max);
        let lum_scale = pick_range(rng, self.lum_min, self.lum_max);
        PaletteShift { hue_deg, sat_scale, lum_scale }
    }

    /// Shift for frame `index` of `count`: the hue sweeps the range evenly
    /// from `hue_min` to `hue_max`, saturation and lightness are still drawn
    /// from `rng`.
    pub fn hue_sweep<R: Rng + ?Sized>(&self, index: usize, count: usize, rng: &mut R) -> PaletteShift {
        let hue_deg = if count > 1 {
            let t = index as f64 / (count - 1) as f64;
            self.hue_min + (self.hue_max - self.hue_min) * t
        } else {
            self.hue_min
        };
        let sat_scale = pick_range(rng, self.sat_min, self.sat_max);
        let lum_scale = pick_range(rng, self.lum_min, self.lum_max);
        PaletteShift { hue_deg, sat_scale, lum_scale }
    }

    /// Ranges with `min > max` or negative scales.
    pub fn validate(&self) -> Result<(), String> {
        let ranges = [
            ("hue", self.hue_min, self.hue_max),
            ("sat", self.sat_min, self.sat_max),
            ("lum", self.lum_min, self.lum_max),
        ];
        for (name, lo, hi) in ranges {
            if !lo.is_finite() || !hi.is_finite() {
                return Err(format!("{} range must be finite", name));
            }
            if lo > hi {
                return Err(format!("{}_min ({}) is greater than {}_max ({})", name, lo, name, hi));
            }
        }
        if self.sat_min < 0.0 || self.lum_min < 0.0 {
            return Err("sat and lum scales must be non-negative".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn within_one(a: Rgb, b: Rgb) -> bool {
        (a.r as i16 - b.r as i16).abs() <= 1
            && (a.g as i16 - b.g as i16).abs() <= 1
            && (a.b as i16 - b.b as i16).abs() <= 1
    }

    #[test]
    fn test_rgb_to_hsl_primaries() {
        assert_eq!(rgb_to_hsl(Rgb::new(255, 0, 0)), (0.0, 1.0, 0.5));
        let (h, s, l) = rgb_to_hsl(Rgb::new(0, 0, 255));
        assert!((h - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!((s, l), (1.0, 0.5));
        assert_eq!(rgb_to_hsl(Rgb::new(128, 128, 128)).1, 0.0);
    }

    #[test]
    fn test_hue_rotation() {
        let red = Rgb::new(255, 0, 0);
        assert_eq!(rotate_color(red, 120.0, 1.0, 1.0), Rgb::new(0, 255, 0));
        assert_eq!(rotate_color(red, 240.0, 1.0, 1.0), Rgb::new(0, 0, 255));
        assert_eq!(rotate_color(red, -120.0, 1.0, 1.0), Rgb::new(0, 0, 255));
    }

    #[test]
    fn test_scales_clamp() {
        let c = Rgb::new(200, 100, 50);
        assert_eq!(rotate_color(c, 0.0, 0.0, 1.0), rotate_color(Rgb::new(125, 125, 125), 0.0, 1.0, 1.0));
        assert_eq!(rotate_color(c, 0.0, 1.0, 10.0), Rgb::new(255, 255, 255));
        assert_eq!(rotate_color(c, 0.0, 1.0, 0.0), Rgb::new(0, 0, 0));
    }

    #[test]
    fn test_full_turn_is_identity() {
        let mut rng = StdRng::seed_from_u64(42);
        let palette: Vec<Rgb> =
            (0..500).map(|_| Rgb::new(rng.random(), rng.random(), rng.random())).collect();
        for turn in [0.0, 360.0, -360.0, 720.0] {
            let rotated = rotate(&palette, turn, 1.0, 1.0);
            for (a, b) in palette.iter().zip(&rotated) {
                assert!(within_one(*a, *b), "{} -> {} at {}", a, b, turn);
            }
        }
    }

    #[test]
    fn test_sample_is_seeded_and_in_range() {
        let variation = PaletteVariation::default();
        let a = variation.sample(&mut StdRng::seed_from_u64(9));
        let b = variation.sample(&mut StdRng::seed_from_u64(9));
        assert_eq!(a, b);
        assert!((0.0..360.0).contains(&a.hue_deg));
        assert!((0.25..2.05).contains(&a.sat_scale));
        assert!((0.97..1.03).contains(&a.lum_scale));
    }

    #[test]
    fn test_hue_sweep_endpoints() {
        let variation = PaletteVariation { hue_min: 10.0, hue_max: 70.0, ..Default::default() };
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(variation.hue_sweep(0, 4, &mut rng).hue_deg, 10.0);
        assert_eq!(variation.hue_sweep(2, 4, &mut rng).hue_deg, 50.0);
        assert_eq!(variation.hue_sweep(3, 4, &mut rng).hue_deg, 70.0);
        assert_eq!(variation.hue_sweep(0, 1, &mut rng).hue_deg, 10.0);
    }

    #[test]
    fn test_validate() {
        assert!(PaletteVariation::default().validate().is_ok());
        let bad = PaletteVariation { sat_min: 3.0, ..Default::default() };
        assert!(bad.validate().unwrap_err().contains("sat_min"));
    }

    #[test]
    fn test_identity_shift() {
        assert!(PaletteShift::default().is_identity());
        let p = vec![Rgb::new(10, 20, 30)];
        assert!(within_one(PaletteShift::default().apply(&p)[0], p[0]));
    }
}
