use super::cancellation::CancelSignal;
use super::operation::Pin;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Reported by a verifier that gave up because its cancel signal fired.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("verification cancelled")]
pub struct Cancelled;

/// External service that checks a PIN before a balance mutation.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, pin: Pin, cancel: CancelSignal) -> Result<bool, Cancelled>;
}

pub type IdentityVerifierRef = Arc<dyn IdentityVerifier>;
