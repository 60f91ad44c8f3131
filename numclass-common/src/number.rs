//! Number token validation
//!
//! Accepts an optional leading `-` followed by one or more ASCII decimal
//! digits. Anything else (whitespace, `+`, decimal points, exponents) is
//! rejected. Values outside the `i64` range are rejected as well.

use crate::{Error, Result};

/// Parse a raw `number` token into a signed integer
pub fn parse_number_token(raw: &str) -> Result<i64> {
    let digits = raw.strip_prefix('-').unwrap_or(raw);

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::InvalidInput(format!("not an integer: {:?}", raw)));
    }

    // Grammar already checked, so the only remaining failure is overflow
    raw.parse::<i64>()
        .map_err(|_| Error::InvalidInput(format!("integer out of range: {:?}", raw)))
}
