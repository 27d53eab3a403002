use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Identity token presented with every balance mutation.
pub type Pin = i64;

#[derive(Debug, Deserialize, Serialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Topup,
    Withdraw,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::Topup => f.write_str("topup"),
            OperationKind::Withdraw => f.write_str("withdraw"),
        }
    }
}

/// A single request against a cashcard.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct Operation {
    pub op: OperationKind,
    pub pin: Pin,
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    pub timeout_ms: u64,
}

impl Operation {
    pub fn topup(pin: Pin, amount: Decimal, timeout: Duration) -> Self {
        Self::new(OperationKind::Topup, pin, amount, timeout)
    }

    pub fn withdraw(pin: Pin, amount: Decimal, timeout: Duration) -> Self {
        Self::new(OperationKind::Withdraw, pin, amount, timeout)
    }

    fn new(op: OperationKind, pin: Pin, amount: Decimal, timeout: Duration) -> Self {
        Self {
            op,
            pin,
            amount,
            timeout_ms: timeout.as_millis().try_into().unwrap_or(u64::MAX),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Why a completed operation left the balance untouched.
#[derive(Error, Debug, PartialEq, Eq, Clone, Copy)]
pub enum DeclineReason {
    #[error("PIN verification failed")]
    VerificationFailed,
    #[error("Amount cannot be applied to the balance")]
    InvalidAmount,
    #[error("Insufficient funds")]
    InsufficientFunds,
}

/// Result of an operation whose verification finished in time.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Outcome {
    Approved,
    Declined(DeclineReason),
}

impl Outcome {
    pub fn is_approved(&self) -> bool {
        matches!(self, Outcome::Approved)
    }
}
