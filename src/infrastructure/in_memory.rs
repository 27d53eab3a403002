use crate::domain::cancellation::CancelSignal;
use crate::domain::operation::Pin;
use crate::domain::ports::{Cancelled, IdentityVerifier};
use async_trait::async_trait;
use std::collections::HashSet;
use std::time::Duration;
use tokio::sync::RwLock;

/// Which PINs an [`InMemoryPinVerifier`] accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PinPolicy {
    AcceptAll,
    RejectAll,
    AcceptOnly(HashSet<Pin>),
}

impl PinPolicy {
    pub fn accepts(&self, pin: Pin) -> bool {
        match self {
            PinPolicy::AcceptAll => true,
            PinPolicy::RejectAll => false,
            PinPolicy::AcceptOnly(pins) => pins.contains(&pin),
        }
    }
}

/// A PIN verifier backed by an in-process accept list.
///
/// Answers after a configurable latency and gives up with [`Cancelled`] if the
/// caller's signal fires first. Policy and latency can be changed while the
/// verifier is shared, which makes it a convenient stand-in for a remote
/// service in tests and in the command-line driver.
#[derive(Debug)]
pub struct InMemoryPinVerifier {
    policy: RwLock<PinPolicy>,
    latency: RwLock<Duration>,
}

impl InMemoryPinVerifier {
    pub fn new(policy: PinPolicy) -> Self {
        Self {
            policy: RwLock::new(policy),
            latency: RwLock::new(Duration::ZERO),
        }
    }

    pub fn accept_all() -> Self {
        Self::new(PinPolicy::AcceptAll)
    }

    pub fn reject_all() -> Self {
        Self::new(PinPolicy::RejectAll)
    }

    pub fn accept_only(pins: impl IntoIterator<Item = Pin>) -> Self {
        Self::new(PinPolicy::AcceptOnly(pins.into_iter().collect()))
    }

    pub fn with_latency(self, latency: Duration) -> Self {
        Self {
            latency: RwLock::new(latency),
            ..self
        }
    }

    pub async fn set_policy(&self, policy: PinPolicy) {
        *self.policy.write().await = policy;
    }

    pub async fn set_latency(&self, latency: Duration) {
        *self.latency.write().await = latency;
    }
}

#[async_trait]
impl IdentityVerifier for InMemoryPinVerifier {
    async fn verify(&self, pin: Pin, cancel: CancelSignal) -> Result<bool, Cancelled> {
        let latency = *self.latency.read().await;
        if !latency.is_zero() {
            tokio::select! {
                _ = tokio::time::sleep(latency) => {}
                _ = cancel.cancelled() => return Err(Cancelled),
            }
        }
        Ok(self.policy.read().await.accepts(pin))
    }
}
