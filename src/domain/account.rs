use crate::domain::operation::DeclineReason;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use std::fmt;

/// Smallest remainder a withdrawal may leave behind.
///
/// A withdrawal is refused when `balance - amount <= WITHDRAWAL_FLOOR`, so the
/// card can never be drained to exactly zero.
pub const WITHDRAWAL_FLOOR: Decimal = dec!(0.001);

/// Amount that is never accepted as a top-up.
pub const FORBIDDEN_AMOUNT: Decimal = Decimal::MAX;

/// The monetary value held by a cashcard.
///
/// This is a wrapper around `rust_decimal::Decimal` so every balance change goes
/// through the validation rules below. The transitions are pure: they hand back
/// the next balance and leave `self` alone, which lets the caller decide when
/// to commit.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize)]
pub struct Balance(pub Decimal);

impl Balance {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Returns the balance after topping up `amount`.
    ///
    /// The forbidden sentinel is refused outright; any other amount whose sum
    /// is not representable is refused the same way.
    pub fn credited(self, amount: Decimal) -> Result<Self, DeclineReason> {
        if amount == FORBIDDEN_AMOUNT {
            return Err(DeclineReason::InvalidAmount);
        }
        self.0
            .checked_add(amount)
            .map(Self)
            .ok_or(DeclineReason::InvalidAmount)
    }

    /// Returns the balance after withdrawing `amount`, provided the remainder
    /// stays strictly above [`WITHDRAWAL_FLOOR`].
    pub fn debited(self, amount: Decimal) -> Result<Self, DeclineReason> {
        let remainder = self
            .0
            .checked_sub(amount)
            .ok_or(DeclineReason::InvalidAmount)?;
        if remainder <= WITHDRAWAL_FLOOR {
            return Err(DeclineReason::InsufficientFunds);
        }
        Ok(Self(remainder))
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
