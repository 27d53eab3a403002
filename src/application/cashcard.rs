use crate::domain::account::Balance;
use crate::domain::cancellation::CancellationController;
use crate::domain::operation::{DeclineReason, Operation, OperationKind, Outcome, Pin};
use crate::domain::ports::{Cancelled, IdentityVerifierRef};
use crate::error::{CashcardError, Result};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::time::Duration;
use tracing::{debug, info, warn};

/// A stored-value card whose every mutation is gated by PIN verification.
///
/// Verification runs outside the balance lock, so any number of calls can wait
/// on the verifier at once. Only the final "validate amount, then write" step
/// is serialized, which gives balance changes a total order without a slow
/// verifier blocking other callers.
///
/// Share a card between tasks by wrapping it in an `Arc`.
pub struct Cashcard {
    balance: Mutex<Balance>,
    verifier: IdentityVerifierRef,
}

impl Cashcard {
    /// Creates a card with a zero balance.
    pub fn new(verifier: IdentityVerifierRef) -> Self {
        Self {
            balance: Mutex::new(Balance::ZERO),
            verifier,
        }
    }

    /// Returns a consistent snapshot of the current balance.
    pub fn get_balance(&self) -> Decimal {
        self.balance.lock().value()
    }

    /// Tops up the card by `amount` once `pin` has been verified.
    ///
    /// Returns `Ok(false)` when verification is refused or the amount cannot be
    /// applied, and [`CashcardError::Timeout`] when the verifier does not answer
    /// within `timeout`. The balance only changes on `Ok(true)`.
    pub async fn credit(&self, pin: Pin, amount: Decimal, timeout: Duration) -> Result<bool> {
        Ok(self.process_topup(pin, amount, timeout).await?.is_approved())
    }

    /// Withdraws `amount` once `pin` has been verified.
    ///
    /// Refused unless the remaining balance stays strictly above
    /// [`WITHDRAWAL_FLOOR`](crate::domain::account::WITHDRAWAL_FLOOR).
    /// Timeouts are reported the same way as for [`Cashcard::credit`].
    pub async fn withdraw(&self, pin: Pin, amount: Decimal, timeout: Duration) -> Result<bool> {
        Ok(self
            .process_withdrawal(pin, amount, timeout)
            .await?
            .is_approved())
    }

    /// Runs a scripted operation and reports why it was declined, if it was.
    pub async fn submit(&self, operation: &Operation) -> Result<Outcome> {
        match operation.op {
            OperationKind::Topup => {
                self.process_topup(operation.pin, operation.amount, operation.timeout())
                    .await
            }
            OperationKind::Withdraw => {
                self.process_withdrawal(operation.pin, operation.amount, operation.timeout())
                    .await
            }
        }
    }

    async fn process_topup(&self, pin: Pin, amount: Decimal, timeout: Duration) -> Result<Outcome> {
        if !self.authorize(pin, timeout).await? {
            return Ok(declined(OperationKind::Topup, DeclineReason::VerificationFailed));
        }
        let outcome = self.apply(|balance| balance.credited(amount));
        Ok(report(OperationKind::Topup, amount, outcome))
    }

    async fn process_withdrawal(
        &self,
        pin: Pin,
        amount: Decimal,
        timeout: Duration,
    ) -> Result<Outcome> {
        if !self.authorize(pin, timeout).await? {
            return Ok(declined(OperationKind::Withdraw, DeclineReason::VerificationFailed));
        }
        let outcome = self.apply(|balance| balance.debited(amount));
        Ok(report(OperationKind::Withdraw, amount, outcome))
    }

    /// Asks the verifier about `pin`, abandoning the request after `timeout`.
    ///
    /// The controller lives only for this call and its timer is disarmed when
    /// it goes out of scope, whichever branch finishes first.
    async fn authorize(&self, pin: Pin, timeout: Duration) -> Result<bool> {
        let controller = CancellationController::with_timeout(timeout);
        let signal = controller.signal();
        debug!(?timeout, "verifying PIN");

        // The verifier may ignore its signal; the deadline still wins the race.
        let verdict = tokio::select! {
            biased;
            verdict = self.verifier.verify(pin, signal.clone()) => verdict,
            _ = signal.cancelled() => Err(Cancelled),
        };
        // A verifier that held the thread past the deadline can still answer
        // before the timer task gets to run.
        let verdict = match verdict {
            Ok(_) if controller.has_expired() => Err(Cancelled),
            verdict => verdict,
        };
        drop(controller);

        match verdict {
            Ok(verified) => {
                debug!(verified, "PIN verification finished");
                Ok(verified)
            }
            Err(Cancelled) => {
                warn!(?timeout, "PIN verification timed out");
                Err(CashcardError::Timeout(timeout))
            }
        }
    }

    /// Validates and commits a balance transition under the card lock.
    fn apply(
        &self,
        transition: impl FnOnce(Balance) -> std::result::Result<Balance, DeclineReason>,
    ) -> std::result::Result<Balance, DeclineReason> {
        let mut balance = self.balance.lock();
        let next = transition(*balance)?;
        *balance = next;
        Ok(next)
    }
}

fn report(
    kind: OperationKind,
    amount: Decimal,
    outcome: std::result::Result<Balance, DeclineReason>,
) -> Outcome {
    match outcome {
        Ok(balance) => {
            info!(%kind, %amount, %balance, "balance updated");
            Outcome::Approved
        }
        Err(reason) => declined(kind, reason),
    }
}

fn declined(kind: OperationKind, reason: DeclineReason) -> Outcome {
    debug!(%kind, %reason, "operation declined");
    Outcome::Declined(reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::account::FORBIDDEN_AMOUNT;
    use crate::infrastructure::in_memory::{InMemoryPinVerifier, PinPolicy};
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    const TIMEOUT: Duration = Duration::from_millis(100);

    fn card_with(verifier: InMemoryPinVerifier) -> (Cashcard, Arc<InMemoryPinVerifier>) {
        let verifier = Arc::new(verifier);
        (Cashcard::new(verifier.clone()), verifier)
    }

    #[tokio::test]
    async fn test_new_card_is_empty() {
        let (card, _) = card_with(InMemoryPinVerifier::accept_all());
        assert_eq!(card.get_balance(), Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_topup_arbitrary_amount() {
        let (card, _) = card_with(InMemoryPinVerifier::accept_all());
        let before = card.get_balance();

        let result = card.credit(500, dec!(200), Duration::from_millis(200)).await;

        assert!(result.unwrap());
        assert_eq!(card.get_balance(), before + dec!(200));
    }

    #[tokio::test]
    async fn test_topup_refuses_sentinel_amount() {
        let (card, _) = card_with(InMemoryPinVerifier::accept_all());

        assert!(!card.credit(500, FORBIDDEN_AMOUNT, TIMEOUT).await.unwrap());
        assert_eq!(card.get_balance(), Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_topup_refused_on_failed_verification() {
        let (card, _) = card_with(InMemoryPinVerifier::reject_all());

        assert!(!card.credit(500, dec!(200), TIMEOUT).await.unwrap());
        assert_eq!(card.get_balance(), Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_verification_failure_reported_before_amount() {
        let (card, _) = card_with(InMemoryPinVerifier::reject_all());

        let outcome = card
            .submit(&Operation::topup(500, FORBIDDEN_AMOUNT, TIMEOUT))
            .await
            .unwrap();
        assert_eq!(
            outcome,
            Outcome::Declined(DeclineReason::VerificationFailed)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_topup_times_out() {
        let (card, _) = card_with(
            InMemoryPinVerifier::accept_all().with_latency(Duration::from_millis(200)),
        );

        let err = card.credit(500, dec!(200), TIMEOUT).await.unwrap_err();

        assert!(matches!(err, CashcardError::Timeout(t) if t == TIMEOUT));
        assert_eq!(card.get_balance(), Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_withdraw_with_sufficient_balance() {
        let (card, _) = card_with(InMemoryPinVerifier::accept_all());
        assert!(card.credit(500, dec!(200), TIMEOUT).await.unwrap());

        assert!(card.withdraw(500, dec!(100), TIMEOUT).await.unwrap());
        assert_eq!(card.get_balance(), dec!(100));
    }

    #[tokio::test]
    async fn test_withdraw_refused_on_failed_verification() {
        let (card, verifier) = card_with(InMemoryPinVerifier::accept_all());
        assert!(card.credit(500, dec!(200), TIMEOUT).await.unwrap());

        verifier.set_policy(PinPolicy::RejectAll).await;

        assert!(!card.withdraw(500, dec!(100), TIMEOUT).await.unwrap());
        assert_eq!(card.get_balance(), dec!(200));
    }

    #[tokio::test]
    async fn test_withdraw_refused_on_insufficient_balance() {
        let (card, _) = card_with(InMemoryPinVerifier::accept_all());
        assert!(card.credit(500, dec!(200), TIMEOUT).await.unwrap());

        let outcome = card
            .submit(&Operation::withdraw(500, dec!(400), TIMEOUT))
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::Declined(DeclineReason::InsufficientFunds));
        assert_eq!(card.get_balance(), dec!(200));
    }

    #[tokio::test]
    async fn test_withdraw_entire_balance_is_refused() {
        let (card, _) = card_with(InMemoryPinVerifier::accept_all());
        assert!(card.credit(500, dec!(200), TIMEOUT).await.unwrap());

        assert!(!card.withdraw(500, dec!(200), TIMEOUT).await.unwrap());
        assert!(!card.withdraw(500, dec!(199.999), TIMEOUT).await.unwrap());
        assert!(card.withdraw(500, dec!(199.9989), TIMEOUT).await.unwrap());
        assert_eq!(card.get_balance(), dec!(0.0011));
    }

    #[tokio::test(start_paused = true)]
    async fn test_withdraw_times_out() {
        let (card, verifier) = card_with(InMemoryPinVerifier::accept_all());
        assert!(card.credit(500, dec!(200), TIMEOUT).await.unwrap());

        verifier.set_latency(TIMEOUT * 3).await;

        let err = card.withdraw(500, dec!(100), TIMEOUT).await.unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(card.get_balance(), dec!(200));
    }

    #[tokio::test]
    async fn test_pins_are_not_bound_to_the_card() {
        let (card, _) = card_with(InMemoryPinVerifier::accept_only([525, 625]));

        assert!(card.credit(525, dec!(10), TIMEOUT).await.unwrap());
        assert!(card.credit(625, dec!(10), TIMEOUT).await.unwrap());
        assert!(!card.credit(725, dec!(10), TIMEOUT).await.unwrap());
        assert_eq!(card.get_balance(), dec!(20));
    }
}
