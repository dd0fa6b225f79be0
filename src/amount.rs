use std::fmt;
use std::iter::Sum;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Fixed-point decimal with 4 decimal places, stored as a scaled integer.
///
/// Persisted as a plain JSON number so the stored layout stays a mapping of
/// head names to numeric balances. Magnitudes are capped at [`Amount::MAX`],
/// below which every value survives the trip through `f64` unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(i64);

impl Amount {
    const SCALE: i64 = 10_000;

    /// 2^50 scaled units, roughly 112 billion.
    const MAX_SCALED: i64 = 1 << 50;

    pub const ZERO: Amount = Amount(0);

    pub const MAX: Amount = Amount(Self::MAX_SCALED);

    pub fn from_float(value: f64) -> Self {
        Amount((value * Self::SCALE as f64).round() as i64)
    }

    /// Convert a user supplied number, rejecting NaN, infinities and values
    /// beyond [`Amount::MAX`].
    pub fn try_from_float(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        let scaled = (value * Self::SCALE as f64).round();
        if scaled.abs() > Self::MAX_SCALED as f64 {
            return None;
        }
        Some(Amount(scaled as i64))
    }

    /// Sum that stays within [`Amount::MAX`] in magnitude.
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0
            .checked_add(rhs.0)
            .filter(|sum| sum.abs() <= Self::MAX_SCALED)
            .map(Amount)
    }

    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.checked_add(-rhs)
    }

    pub fn from_scaled(value: i64) -> Self {
        Amount(value)
    }

    pub fn to_float(self) -> f64 {
        self.0 as f64 / Self::SCALE as f64
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn abs(self) -> Self {
        Amount(self.0.abs())
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let scale = Self::SCALE as u64;
        let whole = abs / scale;
        let frac = abs % scale;
        if frac == 0 {
            return write!(f, "{sign}{whole}");
        }
        let digits = format!("{frac:04}");
        write!(f, "{sign}{whole}.{}", digits.trim_end_matches('0'))
    }
}

impl std::ops::Add for Amount {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Amount(self.0.saturating_add(rhs.0))
    }
}

impl std::ops::Sub for Amount {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Amount(self.0.saturating_sub(rhs.0))
    }
}

impl std::ops::Neg for Amount {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Amount(self.0.saturating_neg())
    }
}

impl std::ops::AddAssign for Amount {
    fn add_assign(&mut self, rhs: Self) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}

impl std::ops::SubAssign for Amount {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 = self.0.saturating_sub(rhs.0);
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Amount::ZERO, |acc, amount| acc + amount)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0 % Self::SCALE == 0 {
            serializer.serialize_i64(self.0 / Self::SCALE)
        } else {
            serializer.serialize_f64(self.to_float())
        }
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Amount::try_from_float(value)
            .ok_or_else(|| serde::de::Error::custom(format!("amount {value} is not representable")))
    }
}
