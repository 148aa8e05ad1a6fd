//! # Aggregation State
//!
//! Keyed, per-window accumulators for one partition.
//!
//! - [`WindowAccumulator`]: O(1) running aggregate for one `(meter, window)`.
//! - [`AggregationStateStore`]: map from [`WindowKey`] to accumulator, plus
//!   the event-time timer index used to find windows a watermark closes.
//!
//! The store is owned by a single partition worker, so `update` and
//! `take_and_remove` are serialized by `&mut self`; no locks are needed.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::record::{AggregateResult, MeterReading};
use crate::time::{EVENT_TIME_MAX, EVENT_TIME_MIN, TimerService};
use crate::types::EventTime;
use crate::window::TimeWindow;

mod accumulator;
mod store;

pub use accumulator::*;
pub use store::*;

/// Identity of a window's state: the group key and the window.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WindowKey {
    pub meter: String,
    pub window: TimeWindow,
}

impl WindowKey {
    pub fn new(meter: impl Into<String>, window: TimeWindow) -> Self {
        Self {
            meter: meter.into(),
            window,
        }
    }
}

impl std::fmt::Display for WindowKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.meter, self.window)
    }
}

#[cfg(test)]
#[path = "tests/state_tests.rs"]
mod tests;
