#![allow(dead_code)]

use async_trait::async_trait;
use cashcard::domain::cancellation::CancelSignal;
use cashcard::domain::operation::Pin;
use cashcard::domain::ports::{Cancelled, IdentityVerifier};
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::NamedTempFile;

/// A verifier that answers with a fixed verdict after a fixed delay.
///
/// When `ignores_cancel` is set it keeps waiting after its signal fires, like a
/// remote service that does not support cancellation.
pub struct ScriptedVerifier {
    pub verdict: bool,
    pub delay: Duration,
    pub ignores_cancel: bool,
    pub calls: AtomicUsize,
}

impl ScriptedVerifier {
    pub fn new(verdict: bool, delay: Duration) -> Self {
        Self {
            verdict,
            delay,
            ignores_cancel: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn ignoring_cancel(mut self) -> Self {
        self.ignores_cancel = true;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityVerifier for ScriptedVerifier {
    async fn verify(&self, _pin: Pin, cancel: CancelSignal) -> Result<bool, Cancelled> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.ignores_cancel {
            tokio::time::sleep(self.delay).await;
            return Ok(self.verdict);
        }
        tokio::select! {
            _ = tokio::time::sleep(self.delay) => Ok(self.verdict),
            _ = cancel.cancelled() => Err(Cancelled),
        }
    }
}

/// Writes an operation script with the standard header.
pub fn write_script(rows: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create script");
    writeln!(file, "op, pin, amount, timeout_ms").unwrap();
    for row in rows {
        writeln!(file, "{}", row).unwrap();
    }
    file.flush().unwrap();
    file
}
