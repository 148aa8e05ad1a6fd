//! Event-time windowing.
//!
//! - [`TimeWindow`]: half-open `[start, end)` interval, closed once the
//!   watermark reaches `end`.
//! - [`TumblingEventTimeWindows`]: maps an event time to its single
//!   epoch-aligned window.
//! - [`WindowAggregator`]: the per-partition operator that accumulates
//!   readings and fires closed windows on watermark advance.

use std::time::Duration;

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

use crate::record::{AggregateResult, MeterReading};
use crate::report::PartitionReport;
use crate::state::{AggregationStateStore, UpdateOutcome, WindowKey};
use crate::time::EVENT_TIME_MIN;
use crate::types::{EventTime, StreamElement};

mod assigners;
mod operator;
mod primitives;

pub use assigners::*;
pub use operator::*;
pub use primitives::*;

#[cfg(test)]
#[path = "tests/window_tests.rs"]
mod tests;
