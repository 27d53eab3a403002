//! Per-call cancellation for PIN verification.
//!
//! A [`CancellationController`] is armed with a deadline when a top-up or
//! withdrawal starts. It hands out [`CancelSignal`]s that verifiers can poll or
//! await. Dropping the controller disarms its timer, so a finished call never
//! leaves a pending timer behind.

use std::future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Owns the cancellation state of one in-flight verification.
///
/// Must be created inside a tokio runtime: the deadline is driven by a spawned
/// timer task. The deadline itself is fixed at creation, so a timer task that
/// is polled late still fires at the right instant.
pub struct CancellationController {
    state: Arc<watch::Sender<bool>>,
    deadline: Instant,
    timer: JoinHandle<()>,
}

impl CancellationController {
    /// Creates a controller that cancels itself once `timeout` has elapsed.
    pub fn with_timeout(timeout: Duration) -> Self {
        let deadline = Instant::now() + timeout;
        let (state, _) = watch::channel(false);
        let state = Arc::new(state);
        let timer_state = Arc::clone(&state);
        let timer = tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            timer_state.send_replace(true);
        });
        Self {
            state,
            deadline,
            timer,
        }
    }

    /// True once the deadline has been reached, whether or not the timer task
    /// has run yet.
    pub fn has_expired(&self) -> bool {
        Instant::now() >= self.deadline
    }

    /// Returns an observer for this controller.
    pub fn signal(&self) -> CancelSignal {
        CancelSignal {
            state: self.state.subscribe(),
        }
    }
}

impl Drop for CancellationController {
    fn drop(&mut self) {
        self.timer.abort();
    }
}

/// Read side of a [`CancellationController`].
#[derive(Clone, Debug)]
pub struct CancelSignal {
    state: watch::Receiver<bool>,
}

impl CancelSignal {
    pub fn is_cancelled(&self) -> bool {
        *self.state.borrow()
    }

    /// Resolves once the controller fires.
    ///
    /// Never resolves if the controller is dropped without firing.
    pub async fn cancelled(&self) {
        let mut state = self.state.clone();
        if state.wait_for(|cancelled| *cancelled).await.is_err() {
            future::pending::<()>().await;
        }
    }
}
