//! 18-decimal fixed point used for redemption and exchange rates

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use std::fmt;

const PRECISION: u128 = 1_000_000_000_000_000_000;
const DECIMALS: usize = 18;

/// Unsigned fixed-point number with 18 fractional digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dec(u128);

impl Dec {
    pub const fn zero() -> Self {
        Dec(0)
    }

    pub const fn one() -> Self {
        Dec(PRECISION)
    }

    /// Build from the raw scaled representation.
    pub const fn from_atomics(atomics: u128) -> Self {
        Dec(atomics)
    }

    pub fn atomics(&self) -> u128 {
        self.0
    }

    pub fn from_int(value: u128) -> Option<Self> {
        value.checked_mul(PRECISION).map(Dec)
    }

    /// `numerator / denominator`, truncated. `None` on a zero denominator or
    /// overflow.
    pub fn from_ratio(numerator: u128, denominator: u128) -> Option<Self> {
        mul_div(numerator, PRECISION, denominator).map(Dec)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Multiply an integer amount, truncating the fractional part.
    pub fn mul_int_truncate(&self, amount: u128) -> Option<u128> {
        mul_div(amount, self.0, PRECISION)
    }

    pub fn checked_mul(&self, other: Dec) -> Option<Self> {
        mul_div(self.0, other.0, PRECISION).map(Dec)
    }

    /// `self / other`, truncated. `None` when `other` is zero.
    pub fn checked_div(&self, other: Dec) -> Option<Self> {
        mul_div(self.0, PRECISION, other.0).map(Dec)
    }

    /// Integer part
    pub fn to_int_truncate(&self) -> u128 {
        self.0 / PRECISION
    }
}

/// `a * b / c` with a 256-bit intermediate. `None` when `c` is zero or the
/// quotient does not fit in 128 bits.
fn mul_div(a: u128, b: u128, c: u128) -> Option<u128> {
    if c == 0 {
        return None;
    }
    let quotient = BigUint::from(a) * BigUint::from(b) / BigUint::from(c);
    u128::try_from(quotient).ok()
}

impl fmt::Display for Dec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{:0width$}",
            self.0 / PRECISION,
            self.0 % PRECISION,
            width = DECIMALS
        )
    }
}
