//! Error taxonomy for the aggregation pipeline.
//!
//! - [`RecordError`]: a row failed validation; dropped and counted.
//! - [`SourceError`]: the source failed; `Io` is terminal, `Corrupt` is a
//!   single undecodable row and is handled like a [`RecordError`].
//! - [`SinkError`]: a finalized result could not be written; may be retried.
//! - [`PipelineError`]: the pipeline as a whole could not run to completion.
//!
//! Late data is not represented here: it is an
//! [`UpdateOutcome`](crate::state::UpdateOutcome) and a counter.

use thiserror::Error;

/// A source row that violates the input contract.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecordError {
    #[error("missing field `{field}`")]
    MissingField { field: &'static str },

    #[error("invalid timestamp {value:?}: {reason}")]
    InvalidTimestamp { value: String, reason: String },

    #[error("invalid number {value:?} in field `{field}`")]
    InvalidNumber { field: &'static str, value: String },

    #[error("negative value {value} in field `{field}`")]
    NegativeValue { field: &'static str, value: f64 },
}

/// Failure reported by a [`Source`](crate::connector::Source).
#[derive(Debug, Error)]
pub enum SourceError {
    /// The underlying transport failed; no further rows can be read.
    #[error("source I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// One row could not be decoded; reading may continue.
    #[error("corrupt row at line {line}: {reason}")]
    Corrupt { line: u64, reason: String },
}

impl SourceError {
    /// Return true if the source cannot produce any further rows.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SourceError::Io(_))
    }
}

/// Failure reported by a [`Sink`](crate::connector::Sink).
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("sink I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("sink CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The sink refused the result; retrying will not help.
    #[error("sink rejected result: {0}")]
    Rejected(String),
}

impl SinkError {
    /// Return true if writing the same result again may succeed.
    ///
    /// Each `(meter, window)` result is emitted exactly once, so a retried
    /// write never produces a second, different row for the same window.
    pub fn is_retryable(&self) -> bool {
        match self {
            SinkError::Io(_) => true,
            SinkError::Csv(e) => matches!(e.kind(), csv::ErrorKind::Io(_)),
            SinkError::Rejected(_) => false,
        }
    }
}

/// Failure of the pipeline run itself.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("sink failed after {attempts} attempt(s): {source}")]
    Sink {
        attempts: u32,
        #[source]
        source: SinkError,
    },

    #[error("partition {partition} failed: {reason}")]
    Partition { partition: usize, reason: String },

    #[error("sink writer thread panicked")]
    SinkPanicked,
}
