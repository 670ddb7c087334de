//! Fixed-point amounts
//!
//! Values are signed counts of sela; one coin is 10^8 sela.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

/// Sela per coin
pub const SELA_PER_COIN: i64 = 100_000_000;

/// Amount with eight implied decimal places
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Fixed64(pub i64);

impl Fixed64 {
    pub const ZERO: Fixed64 = Fixed64(0);

    pub fn from_sela(sela: i64) -> Self {
        Self(sela)
    }

    pub fn sela(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for Fixed64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let whole = abs / SELA_PER_COIN as u64;
        let fraction = abs % SELA_PER_COIN as u64;

        if fraction == 0 {
            write!(f, "{sign}{whole}")
        } else {
            let digits = format!("{fraction:08}");
            write!(f, "{sign}{whole}.{}", digits.trim_end_matches('0'))
        }
    }
}

impl Add for Fixed64 {
    type Output = Fixed64;

    fn add(self, rhs: Fixed64) -> Fixed64 {
        Fixed64(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Fixed64 {
    fn add_assign(&mut self, rhs: Fixed64) {
        *self = *self + rhs;
    }
}

impl Sum for Fixed64 {
    fn sum<I: Iterator<Item = Fixed64>>(iter: I) -> Fixed64 {
        iter.fold(Fixed64::ZERO, Add::add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Fixed64(500_000_000).to_string(), "5");
        assert_eq!(Fixed64(150_000_000).to_string(), "1.5");
        assert_eq!(Fixed64(1).to_string(), "0.00000001");
        assert_eq!(Fixed64(0).to_string(), "0");
        assert_eq!(Fixed64(-250_000_000).to_string(), "-2.5");
    }

    #[test]
    fn test_sum() {
        let total: Fixed64 = [Fixed64(1), Fixed64(2), Fixed64(SELA_PER_COIN)]
            .into_iter()
            .sum();
        assert_eq!(total, Fixed64(SELA_PER_COIN + 3));
    }

    #[test]
    fn test_serializes_as_number() {
        assert_eq!(serde_json::to_string(&Fixed64(42)).unwrap(), "42");
    }
}
