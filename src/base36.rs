//! Base-36 integers as used by the packed payload.
//!
//! Digits are `0-9a-z` (lowercase only), zero is `"0"`, negative values carry
//! a leading `-`.

use thiserror::Error;

const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Base36Error {
    #[error("empty base-36 token")]
    Empty,
    #[error("invalid base-36 digit '{0}'")]
    InvalidDigit(char),
    #[error("base-36 value '{0}' is out of range")]
    Overflow(String),
}

/// Encode a signed integer.
///
/// ```
/// assert_eq!(pixelrun::base36::encode(0), "0");
/// assert_eq!(pixelrun::base36::encode(35), "z");
/// assert_eq!(pixelrun::base36::encode(-36), "-10");
/// ```
pub fn encode(n: i64) -> String {
    if n == 0 {
        return "0".to_string();
    }

    let mut m = n.unsigned_abs();
    let mut buf = Vec::with_capacity(14);
    while m > 0 {
        buf.push(DIGITS[(m % 36) as usize]);
        m /= 36;
    }
    if n < 0 {
        buf.push(b'-');
    }
    buf.reverse();
    // Only ASCII digits and '-' were pushed
    String::from_utf8(buf).unwrap_or_default()
}

/// Encode an unsigned value (lengths, indices, dimensions).
pub fn encode_u32(n: u32) -> String {
    encode(n as i64)
}

/// Decode a signed base-36 token.
///
/// Strict: uppercase digits, whitespace, `+` and a bare `-` are rejected.
pub fn decode(s: &str) -> Result<i64, Base36Error> {
    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    if digits.is_empty() {
        return Err(Base36Error::Empty);
    }

    let mut value: i64 = 0;
    for c in digits.chars() {
        let d = match c {
            '0'..='9' => c as i64 - '0' as i64,
            'a'..='z' => c as i64 - 'a' as i64 + 10,
            _ => return Err(Base36Error::InvalidDigit(c)),
        };
        value = value
            .checked_mul(36)
            .and_then(|v| v.checked_add(d))
            .ok_or_else(|| Base36Error::Overflow(s.to_string()))?;
    }

    Ok(if negative { -value } else { value })
}

/// Decode a token that must fit a non-negative `u32`.
pub fn decode_u32(s: &str) -> Result<u32, Base36Error> {
    let value = decode(s)?;
    u32::try_from(value).map_err(|_| Base36Error::Overflow(s.to_string()))
}
