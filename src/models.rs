//! Palette/run model: the in-memory form of an encoded image.
//!
//! A [`RunModel`] is built once (by the encoder or by unpacking a payload)
//! and never mutated afterwards. Every constructor validates the row
//! invariants, so renderers and the packer can index without checks.

use serde::{Deserialize, Serialize};

use crate::color::Rgb;
use crate::payload::PayloadError;

/// One horizontal run of identically colored pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Run {
    /// Start column
    pub x: u32,
    /// Run length in pixels, at least 1
    pub len: u32,
    /// Palette slot
    pub index: u32,
}

impl Run {
    pub fn new(x: u32, len: u32, index: u32) -> Self {
        Self { x, len, index }
    }

    /// Column just past the end of the run.
    pub fn end(&self) -> u32 {
        self.x + self.len
    }
}

/// Quantized image as width, height, ordered palette and per-row runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RunModelJson", into = "RunModelJson")]
pub struct RunModel {
    width: u32,
    height: u32,
    palette: Vec<Rgb>,
    rows: Vec<Vec<Run>>,
}

impl RunModel {
    /// Build a model from explicit runs, validating every invariant:
    /// non-zero size, one row per image row, runs of length >= 1 sorted by
    /// column without overlap and inside the width, indices inside the
    /// palette.
    pub fn new(
        width: u32,
        height: u32,
        palette: Vec<Rgb>,
        rows: Vec<Vec<Run>>,
    ) -> Result<Self, PayloadError> {
        if width == 0 || height == 0 {
            return Err(PayloadError::ZeroDimension { width, height });
        }
        if rows.len() != height as usize {
            return Err(PayloadError::RowCount { expected: height as usize, found: rows.len() });
        }

        for (y, row) in rows.iter().enumerate() {
            let mut cursor = 0u32;
            for run in row {
                if run.len == 0 {
                    return Err(PayloadError::ZeroLengthRun { row: y });
                }
                if run.index as usize >= palette.len() {
                    return Err(PayloadError::IndexOutOfRange {
                        row: y,
                        index: run.index,
                        palette_len: palette.len(),
                    });
                }
                if run.x < cursor {
                    return Err(PayloadError::OverlappingRuns { row: y });
                }
                cursor = run.x.checked_add(run.len).ok_or(PayloadError::RowOverflow { row: y, width })?;
                if cursor > width {
                    return Err(PayloadError::RowOverflow { row: y, width });
                }
            }
        }

        Ok(Self { width, height, palette, rows })
    }

    /// Build a model from `(len, index)` pairs laid out contiguously from
    /// column 0, the shape used by the payload and the JSON interchange.
    pub fn from_lengths(
        width: u32,
        height: u32,
        palette: Vec<Rgb>,
        rows: Vec<Vec<(u32, u32)>>,
    ) -> Result<Self, PayloadError> {
        let rows = rows
            .into_iter()
            .enumerate()
            .map(|(y, pairs)| {
                let mut x = 0u32;
                pairs
                    .into_iter()
                    .map(|(len, index)| {
                        let run = Run::new(x, len, index);
                        x = x.checked_add(len).ok_or(PayloadError::RowOverflow { row: y, width })?;
                        Ok(run)
                    })
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(width, height, palette, rows)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn palette(&self) -> &[Rgb] {
        &self.palette
    }

    pub fn rows(&self) -> &[Vec<Run>] {
        &self.rows
    }

    /// Total number of runs over all rows.
    pub fn run_count(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    /// True when no row has any run (fully invisible image or empty delta).
    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(Vec::is_empty)
    }

    /// True when every row's run lengths sum exactly to the width.
    pub fn is_full_coverage(&self) -> bool {
        self.rows.iter().all(|row| row.iter().map(|r| r.len as u64).sum::<u64>() == self.width as u64)
    }

    /// First row whose runs do not start at column 0 or leave a hole between
    /// two runs. Trailing holes are not reported.
    pub fn first_interior_gap(&self) -> Option<usize> {
        self.rows.iter().position(|row| {
            let mut x = 0;
            row.iter().any(|run| {
                let gap = run.x != x;
                x = run.end();
                gap
            })
        })
    }

    /// Copy of the model with its palette replaced one-for-one by index.
    pub fn with_palette(&self, palette: Vec<Rgb>) -> Result<Self, crate::Error> {
        if palette.len() != self.palette.len() {
            return Err(crate::Error::PaletteSizeMismatch {
                expected: self.palette.len(),
                found: palette.len(),
            });
        }
        Ok(Self { palette, ..self.clone() })
    }

    /// Compact JSON interchange (`{"w":..,"h":..,"palette":[..],"runs":[..]}`).
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn from_json(s: &str) -> Result<Self, crate::Error> {
        Ok(serde_json::from_str(s)?)
    }
}

/// Wire shape of the JSON interchange.
///
/// Runs are `[len, idx]`; a run preceded by a gap is written as
/// `[len, idx, x]`.
#[derive(Serialize, Deserialize)]
struct RunModelJson {
    w: u32,
    h: u32,
    palette: Vec<Rgb>,
    runs: Vec<Vec<Vec<u32>>>,
}

impl From<RunModel> for RunModelJson {
    fn from(model: RunModel) -> Self {
        let runs = model
            .rows
            .iter()
            .map(|row| {
                let mut x = 0;
                row.iter()
                    .map(|run| {
                        let entry = if run.x == x {
                            vec![run.len, run.index]
                        } else {
                            vec![run.len, run.index, run.x]
                        };
                        x = run.end();
                        entry
                    })
                    .collect()
            })
            .collect();
        Self { w: model.width, h: model.height, palette: model.palette, runs }
    }
}

impl TryFrom<RunModelJson> for RunModel {
    type Error = PayloadError;

    fn try_from(json: RunModelJson) -> Result<Self, Self::Error> {
        let rows = json
            .runs
            .into_iter()
            .enumerate()
            .map(|(y, row)| {
                let mut x = 0u32;
                row.into_iter()
                    .map(|entry| {
                        let run = match entry.as_slice() {
                            [len, index] => Run::new(x, *len, *index),
                            [len, index, start] => Run::new(*start, *len, *index),
                            _ => return Err(PayloadError::MalformedRun { row: y, token: format!("{:?}", entry) }),
                        };
                        x = run.x.saturating_add(run.len);
                        Ok(run)
                    })
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;
        RunModel::new(json.w, json.h, json.palette, rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgb = Rgb::new(255, 0, 0);
    const BLUE: Rgb = Rgb::new(0, 0, 255);

    fn two_by_two() -> RunModel {
        RunModel::from_lengths(2, 2, vec![RED, BLUE], vec![vec![(2, 0)], vec![(1, 1), (1, 0)]])
            .unwrap()
    }

    #[test]
    fn test_from_lengths_accumulates_columns() {
        let model = two_by_two();
        assert_eq!(model.rows()[1], vec![Run::new(0, 1, 1), Run::new(1, 1, 0)]);
        assert!(model.is_full_coverage());
        assert_eq!(model.first_interior_gap(), None);
        assert_eq!(model.run_count(), 3);
    }

    #[test]
    fn test_rejects_zero_dimension() {
        let err = RunModel::new(0, 1, vec![], vec![vec![]]).unwrap_err();
        assert_eq!(err, PayloadError::ZeroDimension { width: 0, height: 1 });
    }

    #[test]
    fn test_rejects_bad_rows() {
        let err = RunModel::from_lengths(2, 2, vec![RED], vec![vec![(2, 0)]]).unwrap_err();
        assert_eq!(err, PayloadError::RowCount { expected: 2, found: 1 });

        let err = RunModel::from_lengths(2, 1, vec![RED], vec![vec![(3, 0)]]).unwrap_err();
        assert_eq!(err, PayloadError::RowOverflow { row: 0, width: 2 });

        let err = RunModel::from_lengths(2, 1, vec![RED], vec![vec![(1, 1)]]).unwrap_err();
        assert_eq!(err, PayloadError::IndexOutOfRange { row: 0, index: 1, palette_len: 1 });

        let err = RunModel::from_lengths(2, 1, vec![RED], vec![vec![(0, 0)]]).unwrap_err();
        assert_eq!(err, PayloadError::ZeroLengthRun { row: 0 });

        let err = RunModel::new(4, 1, vec![RED], vec![vec![Run::new(1, 2, 0), Run::new(2, 1, 0)]])
            .unwrap_err();
        assert_eq!(err, PayloadError::OverlappingRuns { row: 0 });
    }

    #[test]
    fn test_gaps_are_detected() {
        let model = RunModel::new(5, 2, vec![RED], vec![vec![Run::new(0, 2, 0)], vec![Run::new(2, 1, 0)]])
            .unwrap();
        assert!(!model.is_full_coverage());
        assert_eq!(model.first_interior_gap(), Some(1));
    }

    #[test]
    fn test_json_interchange_format() {
        let json = two_by_two().to_json();
        assert_eq!(json, r##"{"w":2,"h":2,"palette":["#ff0000","#0000ff"],"runs":[[[2,0]],[[1,1],[1,0]]]}"##);
        assert_eq!(RunModel::from_json(&json).unwrap(), two_by_two());
    }

    #[test]
    fn test_json_keeps_gap_positions() {
        let model = RunModel::new(4, 1, vec![BLUE], vec![vec![Run::new(1, 1, 0), Run::new(3, 1, 0)]])
            .unwrap();
        let json = model.to_json();
        assert!(json.contains("[[1,0,1],[1,0,3]]"));
        assert_eq!(RunModel::from_json(&json).unwrap(), model);
    }

    #[test]
    fn test_json_rejects_invalid_model() {
        let bad = r##"{"w":1,"h":1,"palette":["#ff0000"],"runs":[[[1,3]]]}"##;
        assert!(RunModel::from_json(bad).is_err());
        let bad = r##"{"w":1,"h":1,"palette":[],"runs":[[[1]]]}"##;
        assert!(RunModel::from_json(bad).is_err());
    }

    #[test]
    fn test_with_palette() {
        let model = two_by_two();
        let swapped = model.with_palette(vec![BLUE, RED]).unwrap();
        assert_eq!(swapped.palette(), &[BLUE, RED]);
        assert_eq!(swapped.rows(), model.rows());

        let err = model.with_palette(vec![BLUE]).unwrap_err();
        assert!(matches!(err, crate::Error::PaletteSizeMismatch { expected: 2, found: 1 }));
    }
}
