//! Flip and quarter-turn placement of runs.
//!
//! Transforms never re-encode a model: each run is placed in output
//! coordinates from its row index, start column and the model size. Under a
//! quarter turn, horizontal runs become vertical strips.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::models::RunModel;

/// Output orientation of a rendered model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Orientation {
    #[serde(default)]
    pub flip_x: bool,
    #[serde(default)]
    pub flip_y: bool,
    #[serde(default)]
    pub rot90: bool,
}

/// Per-variant probabilities of each orientation flag.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct OrientationOdds {
    #[serde(default)]
    pub flip_x: f64,
    #[serde(default)]
    pub flip_y: f64,
    #[serde(default)]
    pub rot90: f64,
}

impl OrientationOdds {
    /// Draw one orientation, consuming three uniform samples in
    /// `flip_x, flip_y, rot90` order.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Orientation {
        let flip_x = rng.random::<f64>() < self.flip_x;
        let flip_y = rng.random::<f64>() < self.flip_y;
        let rot90 = rng.random::<f64>() < self.rot90;
        Orientation { flip_x, flip_y, rot90 }
    }
}

/// A run placed in output coordinates (pixel units).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacedRun {
    pub x: u32,
    pub y: u32,
    pub len: u32,
    pub index: u32,
    /// False when a quarter turn made the run a vertical strip
    pub horizontal: bool,
}

impl PlacedRun {
    pub fn width(&self) -> u32 {
        if self.horizontal {
            self.len
        } else {
            1
        }
    }

    pub fn height(&self) -> u32 {
        if self.horizontal {
            1
        } else {
            self.len
        }
    }
}

impl Orientation {
    pub const IDENTITY: Orientation = Orientation { flip_x: false, flip_y: false, rot90: false };

    /// Output `(width, height)` for a `width x height` source.
    pub fn output_size(&self, width: u32, height: u32) -> (u32, u32) {
        if self.rot90 {
            (height, width)
        } else {
            (width, height)
        }
    }

    /// Place every run of `model`, row by row, left to right.
    pub fn place<'a>(&self, model: &'a RunModel) -> impl Iterator<Item = PlacedRun> + 'a {
        let o = *self;
        let (w, h) = (model.width(), model.height());
        model.rows().iter().enumerate().flat_map(move |(row, runs)| {
            let row = row as u32;
            runs.iter().map(move |run| o.place_run(w, h, row, run.x, run.len, run.index))
        })
    }

    fn place_run(&self, w: u32, h: u32, row: u32, x: u32, len: u32, index: u32) -> PlacedRun {
        if !self.rot90 {
            let px = if self.flip_x { w - (x + len) } else { x };
            let py = if self.flip_y { h - 1 - row } else { row };
            PlacedRun { x: px, y: py, len, index, horizontal: true }
        } else {
            let mut nx = h - 1 - row;
            let mut ny = x;
            if self.flip_x {
                nx = h - 1 - nx;
            }
            if self.flip_y {
                ny = w - len - ny;
            }
            PlacedRun { x: nx, y: ny, len, index, horizontal: false }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgb;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// 3x2 model: row 0 = [2 x A][1 x B], row 1 = [3 x B]
    fn model() -> RunModel {
        RunModel::from_lengths(
            3,
            2,
            vec![Rgb::new(1, 1, 1), Rgb::new(2, 2, 2)],
            vec![vec![(2, 0), (1, 1)], vec![(3, 1)]],
        )
        .unwrap()
    }

    fn placed(o: Orientation) -> Vec<(u32, u32, u32, u32)> {
        o.place(&model()).map(|p| (p.x, p.y, p.width(), p.height())).collect()
    }

    #[test]
    fn test_identity() {
        assert_eq!(placed(Orientation::IDENTITY), vec![(0, 0, 2, 1), (2, 0, 1, 1), (0, 1, 3, 1)]);
    }

    #[test]
    fn test_flip_x() {
        let o = Orientation { flip_x: true, ..Default::default() };
        assert_eq!(placed(o), vec![(1, 0, 2, 1), (0, 0, 1, 1), (0, 1, 3, 1)]);
    }

    #[test]
    fn test_flip_y() {
        let o = Orientation { flip_y: true, ..Default::default() };
        assert_eq!(placed(o), vec![(0, 1, 2, 1), (2, 1, 1, 1), (0, 0, 3, 1)]);
    }

    #[test]
    fn test_rot90() {
        let o = Orientation { rot90: true, ..Default::default() };
        assert_eq!(o.output_size(3, 2), (2, 3));
        // Row 0 ends up in the right column, running downward
        assert_eq!(placed(o), vec![(1, 0, 1, 2), (1, 2, 1, 1), (0, 0, 1, 3)]);
    }

    #[test]
    fn test_rot90_with_flips() {
        let o = Orientation { flip_x: true, flip_y: true, rot90: true };
        assert_eq!(placed(o), vec![(0, 1, 1, 2), (0, 0, 1, 1), (1, 0, 1, 3)]);
    }

    #[test]
    fn test_odds_extremes() {
        let mut rng = StdRng::seed_from_u64(7);
        let never = OrientationOdds::default();
        assert_eq!(never.sample(&mut rng), Orientation::IDENTITY);

        let always = OrientationOdds { flip_x: 1.0, flip_y: 1.0, rot90: 1.0 };
        assert_eq!(always.sample(&mut rng), Orientation { flip_x: true, flip_y: true, rot90: true });
    }
}
