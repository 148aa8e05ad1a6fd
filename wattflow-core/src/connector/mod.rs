//! # Connectors
//!
//! The pipeline reads from a [`Source`] and writes to a [`Sink`]; both are
//! collaborators outside the aggregation core.
//!
//! - [`Ingress`]: wraps a source, validates rows, counts what it drops.
//! - [`CsvSource`] / [`CsvSink`]: filesystem CSV tables.
//! - [`VecSource`] and `Vec<AggregateResult>`: in-memory ends for tests and
//!   embedding.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

use serde::Serialize;

use crate::config::CsvOptions;
use crate::error::{SinkError, SourceError};
use crate::record::{AggregateResult, MeterReading, RawReading};
use crate::time::format_event_time;

mod csv;
mod ingress;
mod memory;

pub use self::csv::*;
pub use ingress::*;
pub use memory::*;

/// An ordered-enough stream of raw rows.
pub trait Source {
    /// Return the next row, or `Ok(None)` at end of stream.
    ///
    /// May block waiting for data. After a fatal error
    /// ([`SourceError::is_fatal`]) the source is not polled again.
    fn next_row(&mut self) -> Result<Option<RawReading>, SourceError>;
}

/// Append-only destination for finalized window results.
///
/// Results of one meter arrive in ascending window order; the sink must
/// keep that order.
pub trait Sink {
    /// Write one result. On a retryable error the same result is offered again.
    fn write(&mut self, result: &AggregateResult) -> Result<(), SinkError>;

    /// Flush buffered output. Called once at shutdown.
    fn flush(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/connector_tests.rs"]
mod tests;
