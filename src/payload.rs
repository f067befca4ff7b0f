//! Packed payload: the compact text form of a [`RunModel`].
//!
//! ```text
//! <W_b36>,<H_b36>|P:<hex6>,<hex6>,...|R:<row>;<row>;...
//!   row := <len_b36>.<idx_b36>,<len_b36>.<idx_b36>,...   (empty if no runs)
//! ```
//!
//! Runs carry no start column; the decoder places them back to back from
//! column 0. A row may stop short of the width (trailing transparency) but
//! cannot skip columns before a run.

use thiserror::Error;

use crate::base36::{self, Base36Error};
use crate::color::{parse_palette_hex, ColorError};
use crate::models::RunModel;

/// Malformed payload or run-model data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadError {
    #[error("expected 3 '|'-separated sections, found {0}")]
    SectionCount(usize),
    #[error("header must be '<width>,<height>', got '{0}'")]
    Header(String),
    #[error("section must start with '{0}'")]
    MissingPrefix(&'static str),
    #[error("bad number '{token}': {source}")]
    Number {
        token: String,
        #[source]
        source: Base36Error,
    },
    #[error("number '{0}' is not in canonical base-36 form")]
    NonCanonicalNumber(String),
    #[error("bad palette color '{token}': {source}")]
    Color {
        token: String,
        #[source]
        source: ColorError,
    },
    #[error("row {row}: malformed run '{token}'")]
    MalformedRun { row: usize, token: String },
    #[error("image size must be non-zero, got {width}x{height}")]
    ZeroDimension { width: u32, height: u32 },
    #[error("expected {expected} rows, found {found}")]
    RowCount { expected: usize, found: usize },
    #[error("row {row}: zero-length run")]
    ZeroLengthRun { row: usize },
    #[error("row {row}: palette index {index} out of range (palette has {palette_len})")]
    IndexOutOfRange { row: usize, index: u32, palette_len: usize },
    #[error("row {row}: runs overlap")]
    OverlappingRuns { row: usize },
    #[error("row {row}: runs exceed width {width}")]
    RowOverflow { row: usize, width: u32 },
    #[error("row {row}: gap before a run cannot be packed")]
    InteriorGap { row: usize },
}

/// Serialize a model into the packed payload string.
///
/// Fails with [`PayloadError::InteriorGap`] when a row has transparent
/// columns before one of its runs; trailing gaps pack as short rows.
///
/// ```
/// use pixelrun::{color::Rgb, models::RunModel, payload::pack};
///
/// let model = RunModel::from_lengths(
///     2, 2,
///     vec![Rgb::new(255, 0, 0), Rgb::new(0, 0, 255)],
///     vec![vec![(2, 0)], vec![(1, 1), (1, 0)]],
/// ).unwrap();
/// assert_eq!(pack(&model).unwrap(), "2,2|P:#ff0000,#0000ff|R:2.0;1.1,1.0");
/// ```
pub fn pack(model: &RunModel) -> Result<String, PayloadError> {
    if let Some(row) = model.first_interior_gap() {
        return Err(PayloadError::InteriorGap { row });
    }

    let palette: Vec<String> = model.palette().iter().map(|c| c.to_hex()).collect();
    let rows: Vec<String> = model
        .rows()
        .iter()
        .map(|row| {
            row.iter()
                .map(|run| format!("{}.{}", base36::encode_u32(run.len), base36::encode_u32(run.index)))
                .collect::<Vec<_>>()
                .join(",")
        })
        .collect();

    Ok(format!(
        "{},{}|P:{}|R:{}",
        base36::encode_u32(model.width()),
        base36::encode_u32(model.height()),
        palette.join(","),
        rows.join(";")
    ))
}

/// Parse a packed payload back into a model.
///
/// Every token is validated; nothing falls back to a default value.
pub fn unpack(s: &str) -> Result<RunModel, PayloadError> {
    let sections: Vec<&str> = s.split('|').collect();
    let [header, palette, rows] = sections.as_slice() else {
        return Err(PayloadError::SectionCount(sections.len()));
    };

    let (w, h) = header.split_once(',').ok_or_else(|| PayloadError::Header(header.to_string()))?;
    let width = number(w)?;
    let height = number(h)?;

    let palette = palette.strip_prefix("P:").ok_or(PayloadError::MissingPrefix("P:"))?;
    let palette = if palette.is_empty() {
        Vec::new()
    } else {
        palette
            .split(',')
            .map(|token| {
                parse_palette_hex(token)
                    .map_err(|source| PayloadError::Color { token: token.to_string(), source })
            })
            .collect::<Result<Vec<_>, _>>()?
    };

    let rows = rows.strip_prefix("R:").ok_or(PayloadError::MissingPrefix("R:"))?;
    let rows = rows
        .split(';')
        .enumerate()
        .map(|(y, row)| {
            if row.is_empty() {
                return Ok(Vec::new());
            }
            row.split(',')
                .map(|token| {
                    let (len, index) = token
                        .split_once('.')
                        .ok_or_else(|| PayloadError::MalformedRun { row: y, token: token.to_string() })?;
                    Ok((number(len)?, number(index)?))
                })
                .collect::<Result<Vec<_>, _>>()
        })
        .collect::<Result<Vec<_>, _>>()?;

    RunModel::from_lengths(width, height, palette, rows)
}

/// Decode a length, index or dimension. Leading zeros and `-0` are refused so
/// that a payload re-packs to the same bytes.
fn number(token: &str) -> Result<u32, PayloadError> {
    let value = base36::decode_u32(token)
        .map_err(|source| PayloadError::Number { token: token.to_string(), source })?;
    if base36::encode_u32(value) != token {
        return Err(PayloadError::NonCanonicalNumber(token.to_string()));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgb;
    use crate::models::Run;

    const SCENARIO: &str = "2,2|P:#ff0000,#0000ff|R:2.0;1.1,1.0";

    #[test]
    fn test_unpack_scenario() {
        let model = unpack(SCENARIO).unwrap();
        assert_eq!(model.width(), 2);
        assert_eq!(model.palette(), &[Rgb::new(255, 0, 0), Rgb::new(0, 0, 255)]);
        assert_eq!(model.rows()[1], vec![Run::new(0, 1, 1), Run::new(1, 1, 0)]);
        assert_eq!(pack(&model).unwrap(), SCENARIO);
    }

    #[test]
    fn test_empty_palette_and_rows() {
        let model = unpack("3,3|P:|R:;;").unwrap();
        assert!(model.palette().is_empty());
        assert!(model.is_empty());
        assert_eq!(pack(&model).unwrap(), "3,3|P:|R:;;");
    }

    #[test]
    fn test_base36_lengths() {
        let model = unpack("10,1|P:#000000|R:10.0").unwrap();
        assert_eq!(model.width(), 36);
        assert_eq!(model.rows()[0][0].len, 36);
    }

    #[test]
    fn test_trailing_gap_packs_as_short_row() {
        let model =
            RunModel::new(4, 1, vec![Rgb::new(1, 2, 3)], vec![vec![Run::new(0, 2, 0)]]).unwrap();
        assert_eq!(pack(&model).unwrap(), "4,1|P:#010203|R:2.0");
    }

    #[test]
    fn test_interior_gap_is_rejected() {
        let model =
            RunModel::new(4, 1, vec![Rgb::new(1, 2, 3)], vec![vec![Run::new(1, 2, 0)]]).unwrap();
        assert_eq!(pack(&model), Err(PayloadError::InteriorGap { row: 0 }));
    }

    #[test]
    fn test_section_errors() {
        assert_eq!(unpack("2,2|P:#ff0000"), Err(PayloadError::SectionCount(2)));
        assert_eq!(unpack("2,2|P:|R:|x"), Err(PayloadError::SectionCount(4)));
        assert_eq!(unpack("22|P:|R:;"), Err(PayloadError::Header("22".to_string())));
        assert_eq!(unpack("1,1|#ff0000|R:1.0"), Err(PayloadError::MissingPrefix("P:")));
        assert_eq!(unpack("1,1|P:#ff0000|1.0"), Err(PayloadError::MissingPrefix("R:")));
    }

    #[test]
    fn test_token_errors() {
        assert!(matches!(unpack("1,1|P:#ff0000|R:1.Z"), Err(PayloadError::Number { .. })));
        assert!(matches!(unpack("1,1|P:#ff0000|R:1"), Err(PayloadError::MalformedRun { row: 0, .. })));
        assert!(matches!(unpack("1,1|P:#ff0000|R:1.0,"), Err(PayloadError::MalformedRun { .. })));
        assert!(matches!(unpack("1,1|P:red|R:1.0"), Err(PayloadError::Color { .. })));
        assert!(matches!(unpack("1,1|P:#ff0000,|R:1.0"), Err(PayloadError::Color { .. })));
        assert!(matches!(unpack("x!,1|P:|R:"), Err(PayloadError::Number { .. })));
    }

    #[test]
    fn test_leading_zero_tokens_are_rejected() {
        assert_eq!(
            unpack("02,2|P:#ff0000,#0000ff|R:2.0;1.1,1.0"),
            Err(PayloadError::NonCanonicalNumber("02".to_string()))
        );
        assert_eq!(
            unpack("2,2|P:#ff0000,#0000ff|R:2.00;1.1,1.0"),
            Err(PayloadError::NonCanonicalNumber("00".to_string()))
        );
        assert_eq!(
            unpack("2,2|P:#ff0000,#0000ff|R:02.0;1.1,1.0"),
            Err(PayloadError::NonCanonicalNumber("02".to_string()))
        );
        assert_eq!(
            unpack("2,2|P:#ff0000,#0000ff|R:2.-0;1.1,1.0"),
            Err(PayloadError::NonCanonicalNumber("-0".to_string()))
        );
    }

    #[test]
    fn test_accepted_payloads_repack_byte_for_byte() {
        for payload in [SCENARIO, "a,1|P:#000000,#ffffff|R:5.0,5.1", "10,1|P:#000000|R:10.0", "1,3|P:#123456|R:;1.0;"] {
            assert_eq!(pack(&unpack(payload).unwrap()).unwrap(), payload);
        }
    }

    #[test]
    fn test_structural_errors() {
        assert_eq!(
            unpack("1,2|P:#ff0000|R:1.0"),
            Err(PayloadError::RowCount { expected: 2, found: 1 })
        );
        assert_eq!(
            unpack("1,1|P:#ff0000|R:1.1"),
            Err(PayloadError::IndexOutOfRange { row: 0, index: 1, palette_len: 1 })
        );
        assert_eq!(unpack("1,1|P:#ff0000|R:2.0"), Err(PayloadError::RowOverflow { row: 0, width: 1 }));
        assert_eq!(unpack("1,1|P:#ff0000|R:0.0"), Err(PayloadError::ZeroLengthRun { row: 0 }));
        assert_eq!(unpack("0,1|P:|R:"), Err(PayloadError::ZeroDimension { width: 0, height: 1 }));
    }
}
