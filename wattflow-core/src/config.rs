//! Pipeline configuration.

use std::time::Duration;

use crate::error::PipelineError;

/// Default tumbling window size: one hour.
pub const DEFAULT_WINDOW_INTERVAL: Duration = Duration::from_secs(3600);

/// Default allowed lateness behind the newest event time.
pub const DEFAULT_LATENESS_BOUND: Duration = Duration::from_secs(30);

/// Default bounded channel size between pipeline stages.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Retry behaviour for retryable sink failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per result, including the first.
    pub max_attempts: u32,
    /// Pause between attempts.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_millis(100),
        }
    }
}

/// Configuration passed to [`Pipeline::new`](crate::pipeline::Pipeline::new).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Size of each tumbling window.
    pub window_interval: Duration,
    /// How far behind the newest event time the watermark trails.
    pub lateness_bound: Duration,
    /// Number of key partitions, each run by its own worker.
    pub partition_count: usize,
    /// Capacity of each bounded channel (backpressure).
    pub channel_capacity: usize,
    pub sink_retry: RetryPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            window_interval: DEFAULT_WINDOW_INTERVAL,
            lateness_bound: DEFAULT_LATENESS_BOUND,
            partition_count: 1,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            sink_retry: RetryPolicy::default(),
        }
    }
}

impl PipelineConfig {
    pub fn with_window_interval(mut self, window_interval: Duration) -> Self {
        self.window_interval = window_interval;
        self
    }

    pub fn with_lateness_bound(mut self, lateness_bound: Duration) -> Self {
        self.lateness_bound = lateness_bound;
        self
    }

    pub fn with_partition_count(mut self, partition_count: usize) -> Self {
        self.partition_count = partition_count;
        self
    }

    pub fn with_channel_capacity(mut self, channel_capacity: usize) -> Self {
        self.channel_capacity = channel_capacity;
        self
    }

    pub fn with_sink_retry(mut self, sink_retry: RetryPolicy) -> Self {
        self.sink_retry = sink_retry;
        self
    }

    /// Check the configuration before any worker starts.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.window_interval < Duration::from_millis(1) {
            return Err(PipelineError::Config(format!(
                "window interval must be at least 1ms, got {:?}",
                self.window_interval
            )));
        }
        if i64::try_from(self.window_interval.as_millis()).is_err() {
            return Err(PipelineError::Config(format!(
                "window interval {:?} does not fit in millisecond event time",
                self.window_interval
            )));
        }
        if self.partition_count == 0 {
            return Err(PipelineError::Config(
                "partition count must be positive".to_string(),
            ));
        }
        if self.channel_capacity == 0 {
            return Err(PipelineError::Config(
                "channel capacity must be positive".to_string(),
            ));
        }
        if self.sink_retry.max_attempts == 0 {
            return Err(PipelineError::Config(
                "sink retry needs at least one attempt".to_string(),
            ));
        }
        Ok(())
    }
}

/// Options shared by the CSV source and sink.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CsvOptions {
    /// Whether the first row is a header (read side: skipped; write side: written).
    pub has_headers: bool,
}
