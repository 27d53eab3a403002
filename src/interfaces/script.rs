use crate::application::cashcard::Cashcard;
use crate::domain::operation::Operation;
use crate::error::{CashcardError, Result};
use crate::interfaces::csv::outcome_writer::{OutcomeRecord, Resolution};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::debug;

/// Replays numbered operations against a single card.
///
/// Sequential replay awaits each operation before starting the next one.
/// Concurrent replay submits every operation at once, so their verifications
/// overlap and only the balance updates are ordered. Records always come back
/// sorted by sequence number.
pub struct ScriptRunner {
    card: Arc<Cashcard>,
    concurrent: bool,
}

impl ScriptRunner {
    pub fn new(card: Arc<Cashcard>, concurrent: bool) -> Self {
        Self { card, concurrent }
    }

    pub async fn run(&self, operations: Vec<(usize, Operation)>) -> Result<Vec<OutcomeRecord>> {
        debug!(
            count = operations.len(),
            concurrent = self.concurrent,
            "replaying operations"
        );
        if self.concurrent {
            self.run_concurrently(operations).await
        } else {
            self.run_sequentially(operations).await
        }
    }

    async fn run_sequentially(
        &self,
        operations: Vec<(usize, Operation)>,
    ) -> Result<Vec<OutcomeRecord>> {
        let mut records = Vec::with_capacity(operations.len());
        for (seq, operation) in operations {
            let resolution = Resolution::from_submission(self.card.submit(&operation).await)?;
            records.push(OutcomeRecord::new(seq, &operation, resolution));
        }
        Ok(records)
    }

    async fn run_concurrently(
        &self,
        operations: Vec<(usize, Operation)>,
    ) -> Result<Vec<OutcomeRecord>> {
        let mut tasks = JoinSet::new();
        for (seq, operation) in operations {
            let card = Arc::clone(&self.card);
            tasks.spawn(async move {
                let result = card.submit(&operation).await;
                (seq, operation, result)
            });
        }

        let mut records = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            let (seq, operation, result) =
                joined.map_err(|e| CashcardError::OperationError(e.to_string()))?;
            records.push(OutcomeRecord::new(
                seq,
                &operation,
                Resolution::from_submission(result)?,
            ));
        }
        records.sort_by_key(|record| record.seq);
        Ok(records)
    }
}
