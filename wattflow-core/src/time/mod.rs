//! Event-time progress: the watermark tracker, the timer index of open
//! windows, and the naive timestamp text format used by the connectors.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use chrono::{DateTime, NaiveDateTime};

use crate::types::{EventTime, Watermark};

mod format;
mod timer_service;
mod tracker;

pub use format::*;
pub use timer_service::*;
pub use tracker::*;

/// Minimum possible event time. Used as the "unbounded past" watermark.
pub const EVENT_TIME_MIN: EventTime = i64::MIN;

/// Maximum possible event time.
pub const EVENT_TIME_MAX: EventTime = i64::MAX;

#[cfg(test)]
#[path = "tests/time_tests.rs"]
mod tests;
