//! Fixed-point monetary type.
//!
//! All prices are integer cents of the platform currency. Integer arithmetic
//! avoids floating-point drift on money-bearing paths; additions on bid paths
//! are checked so an overflow surfaces as `None` instead of wrapping.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An amount of money in integer cents.
///
/// # Examples
/// - `Money::from_cents(100)` = $1.00
/// - `Money::from_cents(5_250)` = $52.50
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Money(u64);

impl Money {
    /// Zero amount.
    pub const ZERO: Money = Money(0);

    /// Constructs an amount from integer cents.
    #[must_use]
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// Returns the raw cent count.
    #[must_use]
    pub const fn cents(self) -> u64 {
        self.0
    }

    /// Returns true for a zero amount.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Checked addition; `None` on overflow.
    #[must_use]
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    /// Saturating subtraction.
    #[must_use]
    pub fn saturating_sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}.{:02}", self.0 / 100, self.0 % 100)
    }
}
