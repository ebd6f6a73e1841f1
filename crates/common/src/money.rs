//! Fixed-point monetary amounts and quantities.

use serde::{Deserialize, Serialize};

/// Monetary amount in minor units (two decimal places).
///
/// `Money::from_minor(130000)` is `1300.00`. All arithmetic is integer
/// arithmetic; amounts are never represented as floating point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money {
    minor: i64,
}

impl Money {
    /// Creates an amount from minor units (e.g. 50000 = 500.00).
    pub fn from_minor(minor: i64) -> Self {
        Self { minor }
    }

    /// Creates an amount from whole major units (e.g. 500 = 500.00).
    pub fn from_major(major: i64) -> Self {
        Self { minor: major * 100 }
    }

    /// Returns zero.
    pub fn zero() -> Self {
        Self { minor: 0 }
    }

    /// Returns the amount in minor units.
    pub fn minor(&self) -> i64 {
        self.minor
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.minor == 0
    }

    /// Returns true if the amount is strictly positive.
    pub fn is_positive(&self) -> bool {
        self.minor > 0
    }

    /// Multiplies the amount by a fixed-point quantity.
    ///
    /// Exact when `unit * quantity` lands on a minor unit (e.g.
    /// `400.00 * 2.50`); otherwise truncates toward zero.
    pub fn times(&self, quantity: Quantity) -> Money {
        Money {
            minor: self.minor * quantity.hundredths() / 100,
        }
    }

    /// Applies a rate expressed in basis points, rounding half up.
    pub fn apply_rate_bps(&self, bps: u32) -> Money {
        Money {
            minor: (self.minor * i64::from(bps) + 5_000) / 10_000,
        }
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.minor < 0 {
            write!(f, "-{}.{:02}", (-self.minor) / 100, (-self.minor) % 100)
        } else {
            write!(f, "{}.{:02}", self.minor / 100, self.minor % 100)
        }
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money {
            minor: self.minor + rhs.minor,
        }
    }
}

impl std::ops::Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Self) -> Self::Output {
        Money {
            minor: self.minor - rhs.minor,
        }
    }
}

impl std::ops::AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.minor += rhs.minor;
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

/// Ordered quantity with two decimal places (produce is sold by weight).
///
/// `Quantity::from_hundredths(250)` is `2.50`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity {
    hundredths: i64,
}

impl Quantity {
    /// Creates a quantity from hundredths of a unit.
    pub fn from_hundredths(hundredths: i64) -> Self {
        Self { hundredths }
    }

    /// Creates a whole-number quantity.
    pub fn from_whole(units: i64) -> Self {
        Self {
            hundredths: units * 100,
        }
    }

    /// Returns the quantity in hundredths of a unit.
    pub fn hundredths(&self) -> i64 {
        self.hundredths
    }

    /// Returns true if the quantity is strictly positive.
    pub fn is_positive(&self) -> bool {
        self.hundredths > 0
    }
}

impl std::fmt::Display for Quantity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{:02}", self.hundredths / 100, self.hundredths % 100)
    }
}

impl std::ops::Add for Quantity {
    type Output = Quantity;

    fn add(self, rhs: Self) -> Self::Output {
        Quantity {
            hundredths: self.hundredths + rhs.hundredths,
        }
    }
}

impl std::ops::Sub for Quantity {
    type Output = Quantity;

    fn sub(self, rhs: Self) -> Self::Output {
        Quantity {
            hundredths: self.hundredths - rhs.hundredths,
        }
    }
}
