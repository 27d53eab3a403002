use crate::domain::operation::Operation;
use crate::error::{CashcardError, Result};
use std::io::Read;

/// Reads scripted cashcard operations from a CSV source.
///
/// Expects the header `op, pin, amount, timeout_ms`. Whitespace around fields
/// is trimmed and short rows are passed on to deserialization, which reports
/// them as errors instead of aborting the whole stream.
pub struct OperationReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> OperationReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Returns an iterator that lazily reads and deserializes operations.
    pub fn operations(self) -> impl Iterator<Item = Result<Operation>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(CashcardError::from))
    }
}
