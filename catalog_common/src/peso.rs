use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Mul, Neg, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

//--------------------------------------       Peso          ---------------------------------------------------------
/// An amount of Chilean pesos. CLP is a zero-decimal currency, so whole pesos are the smallest unit.
#[derive(Debug, Clone, Copy, Default, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Peso(i64);

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in pesos: {0}")]
pub struct PesoConversionError(String);

impl From<i64> for Peso {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl PartialEq for Peso {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Peso {}

impl TryFrom<u64> for Peso {
    type Error = PesoConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(PesoConversionError(format!("Value {} is too large to convert to Peso", value)))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            Ok(Self(value as i64))
        }
    }
}

impl Add for Peso {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Peso {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl SubAssign for Peso {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Neg for Peso {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

impl Mul<i64> for Peso {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from(self.value() * rhs)
    }
}

impl Sum for Peso {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

impl Display for Peso {
    /// Renders the amount the way Chilean storefronts do: `$` followed by dot-grouped whole pesos,
    /// no decimals. e.g. `Peso::from(1234)` renders as `$1.234`.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0 < 0 {
            write!(f, "-${}", group_thousands(self.0.unsigned_abs()))
        } else {
            write!(f, "${}", group_thousands(self.0 as u64))
        }
    }
}

impl Peso {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut result = String::with_capacity(digits.len() + digits.len() / 3);
    let first = digits.len() % 3;
    for (i, c) in digits.chars().enumerate() {
        if i != 0 && (i + 3 - first) % 3 == 0 {
            result.push('.');
        }
        result.push(c);
    }
    result
}
