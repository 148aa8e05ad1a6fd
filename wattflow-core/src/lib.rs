//! # Wattflow Core
//!
//! Tumbling-window aggregation of meter readings with event-time
//! watermarks.
//!
//! Readings are grouped by meter and by fixed, epoch-aligned windows (one
//! hour by default). Once the watermark (newest event time minus the
//! allowed lateness) passes a window's end, the window emits exactly one
//! [`AggregateResult`](record::AggregateResult): energy consumed, and mean,
//! min and max power.
//!
//! - [`types`]: [`StreamElement`](types::StreamElement),
//!   [`Watermark`](types::Watermark), [`EventTime`](types::EventTime).
//! - [`record`]: raw, validated and aggregated rows.
//! - [`time`]: [`WatermarkTracker`](time::WatermarkTracker),
//!   [`TimerService`](time::TimerService), timestamp parsing.
//! - [`window`]: [`TumblingEventTimeWindows`](window::TumblingEventTimeWindows)
//!   and the per-partition [`WindowAggregator`](window::WindowAggregator).
//! - [`state`]: [`AggregationStateStore`](state::AggregationStateStore).
//! - [`connector`]: [`Source`](connector::Source) / [`Sink`](connector::Sink)
//!   and their CSV and in-memory implementations.
//! - [`pipeline`]: the partitioned, threaded [`Pipeline`](pipeline::Pipeline).
//! - [`job`]: [`MeterAggregationJob`](job::MeterAggregationJob), CSV in, CSV out.

pub mod channel;
pub mod config;
pub mod connector;
pub mod error;
pub mod job;
pub mod partitioner;
pub mod pipeline;
pub mod record;
pub mod report;
pub mod state;
pub mod time;
pub mod types;
pub mod window;
