//! Amount resolution.
//!
//! User input arrives either as the literal `max` or as a decimal number of
//! whole tokens. Both are turned into an integer number of the token's
//! smallest units; decimal input is scaled by `10^decimals` and truncated
//! toward zero. No floating point is involved at any step.

use std::fmt;
use std::str::FromStr;

use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};
use tracing::debug;

use crate::error::{JettonError, JettonResult};

/// Largest accepted exponent magnitude in `1.5e3` style input.
const MAX_EXPONENT: i64 = 255;

/// Non-negative token quantity in the token's smallest unit.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TokenAmount(BigUint);

impl TokenAmount {
    /// Wrap an integer quantity.
    pub fn new(value: BigUint) -> Self {
        Self(value)
    }

    /// Zero tokens.
    pub fn zero() -> Self {
        Self(BigUint::zero())
    }

    /// Returns the inner integer.
    pub fn as_biguint(&self) -> &BigUint {
        &self.0
    }

    /// Consumes self and returns the inner integer.
    pub fn into_inner(self) -> BigUint {
        self.0
    }

    /// The quantity as `u128`, if it fits.
    pub fn to_u128(&self) -> Option<u128> {
        self.0.to_u128()
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl From<BigUint> for TokenAmount {
    fn from(value: BigUint) -> Self {
        Self(value)
    }
}

impl From<u64> for TokenAmount {
    fn from(value: u64) -> Self {
        Self(BigUint::from(value))
    }
}

impl From<u128> for TokenAmount {
    fn from(value: u128) -> Self {
        Self(BigUint::from(value))
    }
}

/// Parses an integer string of smallest units, as balances are reported.
impl FromStr for TokenAmount {
    type Err = JettonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(JettonError::InvalidAmount(format!(
                "balance must be a non-negative integer: {s:?}"
            )));
        }
        BigUint::parse_bytes(s.as_bytes(), 10)
            .map(Self)
            .ok_or_else(|| JettonError::InvalidAmount(format!("unparsable balance: {s:?}")))
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How much of a token the user wants to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AmountRequest {
    /// The whole balance.
    Max,
    /// A decimal number of whole tokens, e.g. `"1.5"`.
    Exact(String),
}

impl AmountRequest {
    /// Resolve to smallest units.
    ///
    /// `Max` yields `balance` unchanged; `decimals` is ignored for it.
    pub fn resolve(&self, decimals: u8, balance: &TokenAmount) -> JettonResult<TokenAmount> {
        let amount = match self {
            AmountRequest::Max => balance.clone(),
            AmountRequest::Exact(input) => parse_decimal(input, decimals)?,
        };
        debug!(
            %amount,
            decimals,
            max = matches!(self, AmountRequest::Max),
            "resolved jetton amount"
        );
        Ok(amount)
    }
}

impl FromStr for AmountRequest {
    type Err = JettonError;

    /// `max` (any case) selects the whole balance; anything else must be a
    /// decimal number and is validated here.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("max") {
            return Ok(AmountRequest::Max);
        }
        parse_decimal(s, 0)?;
        Ok(AmountRequest::Exact(s.to_string()))
    }
}

/// Parse a decimal token amount and scale it by `10^decimals`.
///
/// Accepts surrounding whitespace, spaces used for digit grouping, `,` as
/// the decimal separator and an `e`/`E` exponent. Digits past the token's
/// precision are truncated.
pub fn parse_decimal(input: &str, decimals: u8) -> JettonResult<TokenAmount> {
    let invalid = |reason: &str| JettonError::InvalidAmount(format!("{reason}: {input:?}"));

    let normalized: String = input
        .trim()
        .chars()
        .filter(|c| *c != ' ')
        .map(|c| if c == ',' { '.' } else { c })
        .collect();

    if normalized.is_empty() {
        return Err(invalid("empty amount"));
    }
    if normalized.starts_with('-') {
        return Err(invalid("negative amount"));
    }

    let (mantissa, exponent) = match normalized.find(['e', 'E']) {
        Some(pos) => {
            let exponent =
                parse_exponent(&normalized[pos + 1..]).ok_or_else(|| invalid("bad exponent"))?;
            (&normalized[..pos], exponent)
        }
        None => (normalized.as_str(), 0),
    };

    let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    if frac_part.contains('.') {
        return Err(invalid("more than one decimal separator"));
    }
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(invalid("no digits"));
    }
    if !int_part.bytes().chain(frac_part.bytes()).all(|b| b.is_ascii_digit()) {
        return Err(invalid("unexpected character"));
    }

    let digits = format!("{int_part}{frac_part}");
    let value = BigUint::parse_bytes(digits.as_bytes(), 10).ok_or_else(|| invalid("no digits"))?;

    let scale = i64::from(decimals) + exponent - frac_part.len() as i64;
    let factor = |power: i64| {
        u32::try_from(power)
            .map(|p| BigUint::from(10u32).pow(p))
            .map_err(|_| invalid("amount out of range"))
    };
    let scaled = if scale >= 0 {
        value * factor(scale)?
    } else {
        value / factor(-scale)?
    };

    Ok(TokenAmount(scaled))
}

fn parse_exponent(s: &str) -> Option<i64> {
    let (negative, digits) = match s.as_bytes().first()? {
        b'+' => (false, &s[1..]),
        b'-' => (true, &s[1..]),
        _ => (false, s),
    };
    if digits.is_empty() || digits.len() > 3 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let magnitude: i64 = digits.parse().ok()?;
    if magnitude > MAX_EXPONENT {
        return None;
    }
    Some(if negative { -magnitude } else { magnitude })
}
