use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Error returned when a base-unit string is not a non-negative integer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid base-unit amount '{0}'")]
pub struct AmountError(pub String);

/// Fixed-point token quantity with 8 decimal places, stored as base units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(u64);

impl Amount {
    pub const DECIMALS: u32 = 8;
    const SCALE: u64 = 10u64.pow(Self::DECIMALS);

    pub const ZERO: Amount = Amount(0);

    pub fn from_base_units(value: u64) -> Self {
        Amount(value)
    }

    /// Parse an integer string of base units, as the ledger encodes u64 values.
    pub fn parse_base_units(raw: &str) -> Result<Self, AmountError> {
        parse_digits(raw)
            .map(Amount)
            .ok_or_else(|| AmountError(raw.to_string()))
    }

    pub fn base_units(&self) -> u64 {
        self.0
    }

    /// Whole-token value for presentation. Lossy above 2^53 base units.
    pub fn to_f64(&self) -> f64 {
        self.0 as f64 / Self::SCALE as f64
    }
}

/// Unsigned decimal integer made of ASCII digits only; `u64::from_str`
/// alone would also take a leading `+`.
pub(crate) fn parse_digits(raw: &str) -> Option<u64> {
    let digits = raw.trim();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Locale-independent, trailing zeros trimmed: `2.5`, `100`, `0.00000001`.
impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / Self::SCALE;
        let frac = self.0 % Self::SCALE;
        if frac == 0 {
            return write!(f, "{whole}");
        }
        let digits = format!("{frac:08}");
        write!(f, "{whole}.{}", digits.trim_end_matches('0'))
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    /// Parse a whole-token decimal such as `1.5` without going through floats.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || AmountError(s.to_string());
        let trimmed = s.trim();
        let (whole, frac) = trimmed.split_once('.').unwrap_or((trimmed, ""));
        if whole.is_empty() && frac.is_empty() {
            return Err(err());
        }
        if frac.len() > Self::DECIMALS as usize
            || !whole.bytes().all(|b| b.is_ascii_digit())
            || !frac.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(err());
        }

        let whole: u64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| err())?
        };
        let frac: u64 = if frac.is_empty() {
            0
        } else {
            let padded = format!("{frac:0<8}");
            padded.parse().map_err(|_| err())?
        };

        whole
            .checked_mul(Self::SCALE)
            .and_then(|scaled| scaled.checked_add(frac))
            .map(Amount)
            .ok_or_else(err)
    }
}
