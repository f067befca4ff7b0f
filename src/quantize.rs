//! Deterministic palette reduction.
//!
//! Two algorithms are available: median cut (RGB boxes split at the
//! pixel-count median of their widest channel) and octree (colors bucketed by
//! RGB bit prefix, deepest buckets merged first). Both consume a
//! [`BTreeMap`] histogram so the result never depends on hash order, and
//! neither dithers: every source color maps to exactly one palette color.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::color::Rgb;

/// Palette reduction algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Quantizer {
    /// Median cut in RGB space
    #[default]
    MedianCut,
    /// Octree with deepest-level merging
    Octree,
}

impl std::fmt::Display for Quantizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Quantizer::MedianCut => write!(f, "median-cut"),
            Quantizer::Octree => write!(f, "octree"),
        }
    }
}

/// Color histogram: distinct color -> pixel count.
pub type Histogram = BTreeMap<Rgb, u32>;

/// Reduce `histogram` to at most `max_colors` representative colors.
///
/// Returns the histogram's own colors unchanged when they already fit.
pub fn reduce(histogram: &Histogram, max_colors: usize, method: Quantizer) -> Vec<Rgb> {
    if max_colors == 0 || histogram.is_empty() {
        return Vec::new();
    }
    if histogram.len() <= max_colors {
        return histogram.keys().copied().collect();
    }

    match method {
        Quantizer::MedianCut => median_cut(histogram, max_colors),
        Quantizer::Octree => octree(histogram, max_colors),
    }
}

/// Maps source colors onto a reduced palette, memoizing lookups.
#[derive(Debug, Clone)]
pub struct ColorMap {
    palette: Vec<Rgb>,
    cache: HashMap<Rgb, Rgb>,
}

impl ColorMap {
    pub fn new(palette: Vec<Rgb>) -> Self {
        Self { palette, cache: HashMap::new() }
    }

    pub fn palette(&self) -> &[Rgb] {
        &self.palette
    }

    /// Nearest palette color; the input itself when the palette is empty.
    pub fn map(&mut self, color: Rgb) -> Rgb {
        if self.palette.is_empty() {
            return color;
        }
        if let Some(mapped) = self.cache.get(&color) {
            return *mapped;
        }
        let mapped = self.palette[nearest(color, &self.palette)];
        self.cache.insert(color, mapped);
        mapped
    }
}

/// Index of the palette entry closest to `color` (squared RGB distance,
/// lowest index on ties). Returns 0 for an empty palette.
pub fn nearest(color: Rgb, palette: &[Rgb]) -> usize {
    palette
        .iter()
        .enumerate()
        .min_by_key(|(i, p)| (color.distance_sq(**p), *i))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

// ============================================================================
// Median cut
// ============================================================================

#[derive(Debug, Clone, Copy)]
enum Channel {
    Red,
    Green,
    Blue,
}

/// A box of colors for the median cut algorithm.
#[derive(Debug, Clone)]
struct ColorBox {
    colors: Vec<(Rgb, u32)>,
}

impl ColorBox {
    fn new(colors: Vec<(Rgb, u32)>) -> Self {
        Self { colors }
    }

    /// Find which channel has the largest range.
    fn widest_channel(&self) -> Channel {
        let (mut min_r, mut max_r) = (255u8, 0u8);
        let (mut min_g, mut max_g) = (255u8, 0u8);
        let (mut min_b, mut max_b) = (255u8, 0u8);

        for (color, _) in &self.colors {
            min_r = min_r.min(color.r);
            max_r = max_r.max(color.r);
            min_g = min_g.min(color.g);
            max_g = max_g.max(color.g);
            min_b = min_b.min(color.b);
            max_b = max_b.max(color.b);
        }

        let range_r = max_r.saturating_sub(min_r);
        let range_g = max_g.saturating_sub(min_g);
        let range_b = max_b.saturating_sub(min_b);

        if range_r >= range_g && range_r >= range_b {
            Channel::Red
        } else if range_g >= range_b {
            Channel::Green
        } else {
            Channel::Blue
        }
    }

    /// Split the box into two along the widest channel.
    fn split(mut self) -> (ColorBox, ColorBox) {
        let channel = self.widest_channel();

        // Stable sort keeps the BTreeMap order for equal keys
        self.colors.sort_by_key(|(color, _)| match channel {
            Channel::Red => color.r,
            Channel::Green => color.g,
            Channel::Blue => color.b,
        });

        let total: u64 = self.pixel_count();
        let mut running = 0u64;
        let mut split_idx = self.colors.len() / 2;

        for (i, (_, count)) in self.colors.iter().enumerate() {
            running += *count as u64;
            if running >= total / 2 {
                split_idx = (i + 1).min(self.colors.len() - 1);
                break;
            }
        }

        // Never produce an empty box
        split_idx = split_idx.max(1).min(self.colors.len() - 1);

        let right = self.colors.split_off(split_idx);
        (ColorBox::new(self.colors), ColorBox::new(right))
    }

    /// Pixel-count weighted average color, rounded to nearest.
    fn average_color(&self) -> Rgb {
        let total = self.pixel_count();
        if total == 0 {
            return Rgb::BLACK;
        }

        let channel_avg = |f: fn(&Rgb) -> u8| {
            let sum: u64 = self.colors.iter().map(|(c, n)| f(c) as u64 * *n as u64).sum();
            ((sum + total / 2) / total) as u8
        };
        Rgb::new(channel_avg(|c| c.r), channel_avg(|c| c.g), channel_avg(|c| c.b))
    }

    fn pixel_count(&self) -> u64 {
        self.colors.iter().map(|(_, count)| *count as u64).sum()
    }
}

fn median_cut(histogram: &Histogram, max_colors: usize) -> Vec<Rgb> {
    let mut boxes = vec![ColorBox::new(histogram.iter().map(|(c, n)| (*c, *n)).collect())];

    while boxes.len() < max_colors {
        // Split the most populated box that can still be split
        let Some((idx, _)) = boxes
            .iter()
            .enumerate()
            .filter(|(_, b)| b.colors.len() > 1)
            .max_by_key(|(i, b)| (b.pixel_count(), std::cmp::Reverse(*i)))
        else {
            break;
        };

        let box_to_split = boxes.remove(idx);
        let (left, right) = box_to_split.split();
        boxes.push(left);
        boxes.push(right);
    }

    boxes.iter().map(ColorBox::average_color).collect()
}

// ============================================================================
// Octree
// ============================================================================

const OCTREE_DEPTH: usize = 8;

#[derive(Debug, Clone, Default)]
struct OctreeNode {
    children: [Option<usize>; 8],
    pixels: u64,
    r: u64,
    g: u64,
    b: u64,
    leaf: bool,
}

impl OctreeNode {
    fn average(&self) -> Rgb {
        let n = self.pixels.max(1);
        let avg = |sum: u64| ((sum + n / 2) / n) as u8;
        Rgb::new(avg(self.r), avg(self.g), avg(self.b))
    }
}

struct Octree {
    nodes: Vec<OctreeNode>,
    /// Internal node ids per depth, in creation order
    levels: Vec<Vec<usize>>,
    leaves: usize,
}

impl Octree {
    fn new() -> Self {
        Self { nodes: vec![OctreeNode::default()], levels: vec![vec![0]; 1], leaves: 0 }
    }

    fn child_slot(color: Rgb, depth: usize) -> usize {
        let shift = 7 - depth;
        (((color.r >> shift) & 1) << 2 | ((color.g >> shift) & 1) << 1 | ((color.b >> shift) & 1))
            as usize
    }

    fn insert(&mut self, color: Rgb, count: u32) {
        let count = count as u64;
        let mut node = 0;
        for depth in 0..=OCTREE_DEPTH {
            let n = &mut self.nodes[node];
            n.pixels += count;
            n.r += color.r as u64 * count;
            n.g += color.g as u64 * count;
            n.b += color.b as u64 * count;

            if depth == OCTREE_DEPTH {
                if !n.leaf {
                    n.leaf = true;
                    self.leaves += 1;
                }
                return;
            }

            let slot = Self::child_slot(color, depth);
            let existing = self.nodes[node].children[slot];
            node = match existing {
                Some(child) => child,
                None => {
                    let child = self.nodes.len();
                    self.nodes.push(OctreeNode::default());
                    self.nodes[node].children[slot] = Some(child);
                    if depth + 1 < OCTREE_DEPTH {
                        if self.levels.len() <= depth + 1 {
                            self.levels.push(Vec::new());
                        }
                        self.levels[depth + 1].push(child);
                    }
                    child
                }
            };
        }
    }

    /// Merge the least populated internal node at the deepest level that
    /// still has one. Its children are all leaves at that point.
    fn reduce_once(&mut self) -> bool {
        for depth in (0..self.levels.len()).rev() {
            let candidate = self.levels[depth]
                .iter()
                .copied()
                .filter(|&id| !self.nodes[id].leaf)
                .min_by_key(|&id| (self.nodes[id].pixels, id));

            if let Some(id) = candidate {
                let merged = self.nodes[id].children.iter().flatten().count();
                self.nodes[id].children = [None; 8];
                self.nodes[id].leaf = true;
                self.leaves = self.leaves + 1 - merged;
                return true;
            }
        }
        false
    }

    /// Leaf colors in depth-first child order.
    fn palette(&self) -> Vec<Rgb> {
        let mut out = Vec::with_capacity(self.leaves);
        let mut stack = vec![0usize];
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id];
            if node.leaf {
                out.push(node.average());
                continue;
            }
            stack.extend(node.children.iter().rev().flatten());
        }
        out
    }
}

fn octree(histogram: &Histogram, max_colors: usize) -> Vec<Rgb> {
    let mut tree = Octree::new();
    for (color, count) in histogram {
        tree.insert(*color, *count);
    }
    while tree.leaves > max_colors {
        if !tree.reduce_once() {
            break;
        }
    }
    tree.palette()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(n: u8) -> Histogram {
        (0..n).map(|i| (Rgb::new(i * 10, i * 5, 255 - i * 2), 1 + i as u32)).collect()
    }

    #[test]
    fn test_no_reduction_needed() {
        let hist: Histogram = [(Rgb::new(255, 0, 0), 3), (Rgb::new(0, 0, 255), 1)].into();
        for method in [Quantizer::MedianCut, Quantizer::Octree] {
            assert_eq!(reduce(&hist, 4, method).len(), 2);
        }
    }

    #[test]
    fn test_median_cut_respects_limit() {
        let result = reduce(&gradient(20), 4, Quantizer::MedianCut);
        assert_eq!(result.len(), 4);
    }

    #[test]
    fn test_octree_respects_limit() {
        for max in [1, 2, 3, 5, 8] {
            let result = reduce(&gradient(20), max, Quantizer::Octree);
            assert!(!result.is_empty());
            assert!(result.len() <= max, "{} colors for max {}", result.len(), max);
        }
    }

    #[test]
    fn test_single_color_octree_is_average() {
        let hist: Histogram = [(Rgb::new(10, 20, 30), 1), (Rgb::new(30, 40, 50), 1)].into();
        assert_eq!(reduce(&hist, 1, Quantizer::Octree), vec![Rgb::new(20, 30, 40)]);
    }

    #[test]
    fn test_median_cut_separates_clusters() {
        let mut hist = Histogram::new();
        for i in 0..5 {
            hist.insert(Rgb::new(250 - i, 0, 0), 10);
            hist.insert(Rgb::new(0, 0, 250 - i), 10);
        }
        let palette = reduce(&hist, 2, Quantizer::MedianCut);
        assert_eq!(palette.len(), 2);
        assert!(palette.iter().any(|c| c.r > 200 && c.b == 0));
        assert!(palette.iter().any(|c| c.b > 200 && c.r == 0));
    }

    #[test]
    fn test_reduction_is_deterministic() {
        for method in [Quantizer::MedianCut, Quantizer::Octree] {
            let a = reduce(&gradient(25), 6, method);
            let b = reduce(&gradient(25), 6, method);
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_nearest_prefers_lowest_index_on_tie() {
        let palette = vec![Rgb::new(0, 0, 0), Rgb::new(20, 0, 0), Rgb::new(0, 0, 0)];
        assert_eq!(nearest(Rgb::new(10, 0, 0), &palette), 0);
        assert_eq!(nearest(Rgb::new(15, 0, 0), &palette), 1);
    }

    #[test]
    fn test_color_map_caches() {
        let mut map = ColorMap::new(vec![Rgb::new(0, 0, 0), Rgb::new(255, 255, 255)]);
        assert_eq!(map.map(Rgb::new(30, 30, 30)), Rgb::new(0, 0, 0));
        assert_eq!(map.map(Rgb::new(200, 220, 210)), Rgb::new(255, 255, 255));
        assert_eq!(map.map(Rgb::new(30, 30, 30)), Rgb::new(0, 0, 0));
    }
}
