use crate::domain::account::Balance;
use crate::domain::operation::{DeclineReason, Operation, OperationKind, Outcome, Pin};
use crate::error::{CashcardError, Result};
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::Write;

/// Final state of one scripted operation, as shown to the user.
#[derive(Debug, Serialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    Approved,
    VerificationFailed,
    InvalidAmount,
    InsufficientFunds,
    Timeout,
}

impl Resolution {
    /// Maps the result of [`Cashcard::submit`](crate::application::cashcard::Cashcard::submit).
    ///
    /// Errors other than a timeout are not resolutions and are handed back.
    pub fn from_submission(result: Result<Outcome>) -> Result<Self> {
        match result {
            Ok(Outcome::Approved) => Ok(Resolution::Approved),
            Ok(Outcome::Declined(reason)) => Ok(reason.into()),
            Err(CashcardError::Timeout(_)) => Ok(Resolution::Timeout),
            Err(e) => Err(e),
        }
    }
}

impl From<DeclineReason> for Resolution {
    fn from(reason: DeclineReason) -> Self {
        match reason {
            DeclineReason::VerificationFailed => Resolution::VerificationFailed,
            DeclineReason::InvalidAmount => Resolution::InvalidAmount,
            DeclineReason::InsufficientFunds => Resolution::InsufficientFunds,
        }
    }
}

#[derive(Debug, Serialize, PartialEq, Clone)]
pub struct OutcomeRecord {
    pub seq: usize,
    pub op: OperationKind,
    pub pin: Pin,
    pub amount: Decimal,
    pub result: Resolution,
}

impl OutcomeRecord {
    pub fn new(seq: usize, operation: &Operation, result: Resolution) -> Self {
        Self {
            seq,
            op: operation.op,
            pin: operation.pin,
            amount: operation.amount,
            result,
        }
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    operations: &'a [OutcomeRecord],
    balance: Balance,
}

/// Output layout selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ReportFormat {
    #[default]
    Csv,
    Json,
}

/// Writes the outcome of a replayed script followed by the final balance.
pub struct OutcomeWriter<W: Write> {
    writer: W,
    format: ReportFormat,
}

impl<W: Write> OutcomeWriter<W> {
    pub fn new(writer: W, format: ReportFormat) -> Self {
        Self { writer, format }
    }

    pub fn write_report(&mut self, records: &[OutcomeRecord], balance: Balance) -> Result<()> {
        match self.format {
            ReportFormat::Csv => self.write_csv(records, balance),
            ReportFormat::Json => self.write_json(records, balance),
        }
    }

    fn write_csv(&mut self, records: &[OutcomeRecord], balance: Balance) -> Result<()> {
        let mut wtr = csv::WriterBuilder::new()
            .flexible(true)
            .from_writer(&mut self.writer);
        // An empty script still gets a header.
        if records.is_empty() {
            wtr.write_record(["seq", "op", "pin", "amount", "result"])?;
        }
        for record in records {
            wtr.serialize(record)?;
        }
        wtr.write_record(["balance".to_string(), balance.to_string()])?;
        wtr.flush()?;
        Ok(())
    }

    fn write_json(&mut self, records: &[OutcomeRecord], balance: Balance) -> Result<()> {
        let report = JsonReport {
            operations: records,
            balance,
        };
        serde_json::to_writer_pretty(&mut self.writer, &report)?;
        writeln!(self.writer)?;
        Ok(())
    }
}
