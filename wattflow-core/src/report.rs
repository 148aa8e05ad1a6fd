//! Counters reported when a partition or the whole pipeline shuts down.
//!
//! Every record that does not reach an emitted window is accounted for in
//! one of these counters: malformed, late, or discarded with an open window
//! at drain.

use crate::state::WindowKey;
use crate::time::format_event_time;
use crate::types::EventTime;

/// Shutdown summary of one partition worker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartitionReport {
    pub partition: usize,
    /// Readings merged into a window.
    pub records_accepted: u64,
    /// Readings dropped because their window was already closed.
    pub late_dropped: u64,
    pub windows_emitted: u64,
    /// Windows still open at drain; reported, never emitted.
    pub discarded_open_windows: Vec<WindowKey>,
    pub final_watermark: Option<EventTime>,
}

/// Why ingress stopped reading.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Termination {
    /// The source reached end-of-stream.
    #[default]
    Exhausted,
    /// Shutdown was requested through a [`ShutdownSignal`](crate::pipeline::ShutdownSignal).
    Cancelled,
    /// The source failed fatally.
    SourceFailed(String),
    /// A partition worker or the sink failed; the run returns that error.
    Aborted,
}

/// Shutdown summary of a pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineReport {
    /// Rows pulled from the source, valid or not.
    pub records_read: u64,
    pub malformed_dropped: u64,
    pub records_accepted: u64,
    pub late_dropped: u64,
    pub windows_emitted: u64,
    pub results_written: u64,
    pub sink_retries: u64,
    pub discarded_open_windows: usize,
    pub final_watermark: Option<EventTime>,
    pub termination: Termination,
}

impl PipelineReport {
    /// Fold a partition summary into the totals.
    pub fn absorb(&mut self, partition: &PartitionReport) {
        self.records_accepted += partition.records_accepted;
        self.late_dropped += partition.late_dropped;
        self.windows_emitted += partition.windows_emitted;
        self.discarded_open_windows += partition.discarded_open_windows.len();
        self.final_watermark = self.final_watermark.max(partition.final_watermark);
    }

    /// Return true if the source was read to its end.
    pub fn is_complete(&self) -> bool {
        self.termination == Termination::Exhausted
    }

    /// Log the summary at shutdown.
    pub fn log(&self) {
        let watermark = self
            .final_watermark
            .map(format_event_time)
            .unwrap_or_else(|| "none".to_string());
        tracing::info!(
            "pipeline finished ({:?}): read={} accepted={} malformed={} late={} emitted={} written={} sink_retries={} watermark={}",
            self.termination,
            self.records_read,
            self.records_accepted,
            self.malformed_dropped,
            self.late_dropped,
            self.windows_emitted,
            self.results_written,
            self.sink_retries,
            watermark
        );
        if self.discarded_open_windows > 0 {
            tracing::warn!(
                "{} window(s) still open at shutdown were discarded, not emitted",
                self.discarded_open_windows
            );
        }
        if let Termination::SourceFailed(reason) = &self.termination {
            tracing::error!("source failed: {}", reason);
        }
    }
}
