//! Money in Ariary (MGA). The currency has no minor unit in circulation, so
//! amounts are whole numbers.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::value_object::ValueObject;

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ariary(pub i64);

impl ValueObject for Ariary {}

impl Ariary {
    pub const ZERO: Ariary = Ariary(0);

    pub fn amount(self) -> i64 {
        self.0
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub fn checked_add(self, other: Ariary) -> DomainResult<Ariary> {
        self.0
            .checked_add(other.0)
            .map(Ariary)
            .ok_or_else(|| DomainError::invariant("amount overflow"))
    }

    pub fn checked_sub(self, other: Ariary) -> DomainResult<Ariary> {
        self.0
            .checked_sub(other.0)
            .map(Ariary)
            .ok_or_else(|| DomainError::invariant("amount overflow"))
    }

    pub fn checked_mul(self, count: u32) -> DomainResult<Ariary> {
        self.0
            .checked_mul(i64::from(count))
            .map(Ariary)
            .ok_or_else(|| DomainError::invariant("amount overflow"))
    }

    /// `percent`% of this amount, rounded toward zero.
    pub fn percent_of(self, percent: u8) -> Ariary {
        Ariary(self.0 * i64::from(percent) / 100)
    }

    /// Sum an iterator of amounts, failing on overflow.
    pub fn sum<I: IntoIterator<Item = Ariary>>(iter: I) -> DomainResult<Ariary> {
        iter.into_iter()
            .try_fold(Ariary::ZERO, |acc, a| acc.checked_add(a))
    }
}

impl core::fmt::Display for Ariary {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} Ar", self.0)
    }
}
