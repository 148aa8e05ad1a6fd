//! Partitioned pipeline runtime.
//!
//! ```text
//!            ┌── hash(meter) ──> partition 0 ──┐
//! Source ─> Ingress ────────────> partition 1 ──┼──> sink writer ─> Sink
//!            └── watermark broadcast ─> ...  ───┘
//! ```
//!
//! Ingress runs on the calling thread and owns the single
//! [`WatermarkTracker`]. Each partition is a single-threaded event loop that
//! owns its [`WindowAggregator`]; no aggregation state is shared between
//! threads. A dedicated writer thread feeds the [`Sink`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use anyhow::anyhow;
use crossbeam_channel::{Receiver, Sender, bounded};

use crate::channel::{LocalChannelReceiver, LocalChannelSender, local_channel};
use crate::config::{PipelineConfig, RetryPolicy};
use crate::connector::{Ingress, Sink, Source};
use crate::error::{PipelineError, SinkError};
use crate::partitioner::{Partitioner, meter_partitioner};
use crate::record::{AggregateResult, MeterReading};
use crate::report::{PartitionReport, PipelineReport, Termination};
use crate::time::WatermarkTracker;
use crate::types::StreamElement;
use crate::window::WindowAggregator;

/// Cloneable handle that asks a running pipeline to stop reading.
///
/// Ingress checks it before pulling each row; a source blocked inside
/// `next_row` is not interrupted.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    flag: Arc<AtomicBool>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// A configured aggregation pipeline.
pub struct Pipeline {
    config: PipelineConfig,
    shutdown: ShutdownSignal,
}

impl Pipeline {
    /// Validate `config` and build a pipeline.
    pub fn new(config: PipelineConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self {
            config,
            shutdown: ShutdownSignal::new(),
        })
    }

    /// Share an externally owned shutdown signal.
    pub fn with_shutdown(mut self, shutdown: ShutdownSignal) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Handle for cancelling [`run`](Self::run) from another thread.
    pub fn shutdown_handle(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    /// Run the pipeline until the source is exhausted, fails, or shutdown
    /// is requested.
    ///
    /// Every partition drains before this returns: windows the watermark
    /// closed have been written, windows still open are discarded and
    /// counted in the report. Fatal source errors end the run normally with
    /// [`Termination::SourceFailed`]; sink and worker failures are returned
    /// as errors.
    pub fn run<S, K>(&self, source: S, sink: &mut K) -> Result<PipelineReport, PipelineError>
    where
        S: Source,
        K: Sink + Send,
    {
        let partitions = self.config.partition_count;
        let capacity = self.config.channel_capacity;
        let (senders, receivers): (Vec<_>, Vec<_>) =
            (0..partitions).map(|_| local_channel(capacity)).unzip();
        let (result_tx, result_rx) = bounded::<AggregateResult>(capacity);

        tracing::info!(
            "starting pipeline: partitions={} window={:?} lateness={:?}",
            partitions,
            self.config.window_interval,
            self.config.lateness_bound
        );

        // Raised by a failing worker or sink so ingress stops pulling rows.
        let abort = ShutdownSignal::new();

        thread::scope(|scope| {
            let retry = self.config.sink_retry;
            let writer_abort = abort.clone();
            let writer = scope.spawn(move || {
                let outcome = write_results(result_rx, sink, retry);
                if outcome.is_err() {
                    writer_abort.trigger();
                }
                outcome
            });

            let workers: Vec<_> = receivers
                .into_iter()
                .enumerate()
                .map(|(partition, input)| {
                    let output = result_tx.clone();
                    let window_interval = self.config.window_interval;
                    let abort = abort.clone();
                    scope.spawn(move || {
                        let outcome = run_partition(partition, window_interval, input, output);
                        if outcome.is_err() {
                            abort.trigger();
                        }
                        outcome
                    })
                })
                .collect();
            drop(result_tx);

            let mut report = self.ingest(source, &senders, &abort);
            for sender in &senders {
                // A closed channel means the worker already failed; its join reports why.
                let _ = sender.send(StreamElement::End);
            }
            drop(senders);

            let mut failure = None;
            for (partition, worker) in workers.into_iter().enumerate() {
                match worker.join() {
                    Ok(Ok(partition_report)) => report.absorb(&partition_report),
                    Ok(Err(e)) => {
                        failure.get_or_insert(PipelineError::Partition {
                            partition,
                            reason: format!("{e:#}"),
                        });
                    }
                    Err(_) => {
                        failure.get_or_insert(PipelineError::Partition {
                            partition,
                            reason: "worker panicked".to_string(),
                        });
                    }
                }
            }

            // A dead sink makes the workers fail too; report the sink.
            match writer.join() {
                Ok(Ok(stats)) => {
                    report.results_written = stats.written;
                    report.sink_retries = stats.retries;
                }
                Ok(Err(e)) => return Err(e),
                Err(_) => return Err(PipelineError::SinkPanicked),
            }
            if let Some(e) = failure {
                return Err(e);
            }

            report.log();
            Ok(report)
        })
    }

    /// Pull readings, route them by meter, and broadcast watermark advances.
    ///
    /// A record is enqueued before the watermark it produced, so each
    /// partition sees the same relative order as the source.
    fn ingest<S: Source>(
        &self,
        source: S,
        senders: &[LocalChannelSender<MeterReading>],
        abort: &ShutdownSignal,
    ) -> PipelineReport {
        let partitioner = meter_partitioner();
        let mut ingress = Ingress::new(source);
        let mut tracker = WatermarkTracker::new(self.config.lateness_bound);

        let termination = loop {
            if abort.is_triggered() {
                break Termination::Aborted;
            }
            if self.shutdown.is_triggered() {
                tracing::info!("shutdown requested, stopping ingress");
                break Termination::Cancelled;
            }
            let reading = match ingress.next_reading() {
                Ok(Some(reading)) => reading,
                Ok(None) => break Termination::Exhausted,
                Err(e) => break Termination::SourceFailed(e.to_string()),
            };

            // A send fails only if the worker died; its join reports the error.
            let event_time = reading.event_time;
            let target = partitioner.partition(&reading, senders.len());
            if senders[target].send(StreamElement::record(reading)).is_err() {
                tracing::error!("partition {} stopped accepting records", target);
                break Termination::Aborted;
            }
            if let Some(watermark) = tracker.observe(event_time) {
                tracing::trace!("broadcast {}", watermark);
                if broadcast(senders, StreamElement::Watermark(watermark)).is_err() {
                    tracing::error!("a partition stopped accepting watermarks");
                    break Termination::Aborted;
                }
            }
        };

        PipelineReport {
            records_read: ingress.rows_read(),
            malformed_dropped: ingress.malformed(),
            termination,
            ..PipelineReport::default()
        }
    }
}

fn broadcast(
    senders: &[LocalChannelSender<MeterReading>],
    element: StreamElement<MeterReading>,
) -> anyhow::Result<()> {
    for sender in senders {
        sender.send(element.clone())?;
    }
    Ok(())
}

/// Event loop of one partition worker.
fn run_partition(
    partition: usize,
    window_interval: std::time::Duration,
    input: LocalChannelReceiver<MeterReading>,
    output: Sender<AggregateResult>,
) -> anyhow::Result<PartitionReport> {
    let mut aggregator = WindowAggregator::new(window_interval)?;
    loop {
        let element = input.recv()?;
        if element.is_end() {
            break;
        }
        for result in aggregator.process(element) {
            output
                .send(result)
                .map_err(|_| anyhow!("result channel closed"))?;
        }
    }

    let report = aggregator.drain(partition);
    tracing::info!(
        "partition {} drained: accepted={} late={} emitted={} discarded_open={}",
        partition,
        report.records_accepted,
        report.late_dropped,
        report.windows_emitted,
        report.discarded_open_windows.len()
    );
    Ok(report)
}

#[derive(Debug, Default)]
struct SinkStats {
    written: u64,
    retries: u64,
}

/// Drain the result channel into the sink, then flush it.
fn write_results<K: Sink>(
    results: Receiver<AggregateResult>,
    sink: &mut K,
    policy: RetryPolicy,
) -> Result<SinkStats, PipelineError> {
    let mut stats = SinkStats::default();
    for result in results.iter() {
        stats.retries += write_with_retry(sink, &result, policy)?;
        stats.written += 1;
    }
    stats.retries += with_retry(policy, || "flush".to_string(), || sink.flush())?;
    Ok(stats)
}

/// Write one result, retrying retryable failures. Returns the retry count.
fn write_with_retry<K: Sink>(
    sink: &mut K,
    result: &AggregateResult,
    policy: RetryPolicy,
) -> Result<u64, PipelineError> {
    with_retry(
        policy,
        || format!("write of {}@{}", result.meter, result.window_start),
        || sink.write(result),
    )
}

/// Run a sink operation under `policy`. Returns the retry count.
fn with_retry(
    policy: RetryPolicy,
    describe: impl Fn() -> String,
    mut op: impl FnMut() -> Result<(), SinkError>,
) -> Result<u64, PipelineError> {
    let mut attempt = 1;
    loop {
        match op() {
            Ok(()) => return Ok(u64::from(attempt - 1)),
            Err(e) if e.is_retryable() && attempt < policy.max_attempts => {
                tracing::warn!(
                    "sink {} failed (attempt {}/{}): {}",
                    describe(),
                    attempt,
                    policy.max_attempts,
                    e
                );
                thread::sleep(policy.backoff);
                attempt += 1;
            }
            Err(source) => {
                return Err(PipelineError::Sink {
                    attempts: attempt,
                    source,
                });
            }
        }
    }
}
