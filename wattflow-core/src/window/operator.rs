use super::*;

// ── WindowAggregator ──────────────────────────────────────────────────────────

/// Per-partition tumbling-window operator.
///
/// Accepts [`StreamElement<MeterReading>`] items and returns the
/// [`AggregateResult`]s produced by each one.
///
/// # Processing model
///
/// - **Records**: assigned to their tumbling window and folded into the
///   `(meter, window)` accumulator. Records for a closed window are dropped.
/// - **Watermarks**: if the watermark advances, every open window with
///   `end <= watermark` fires exactly once and is evicted.
/// - **End**: nothing is fired; [`drain`](Self::drain) reports the windows
///   that are still open.
///
/// One instance is owned by one worker thread, so record updates and window
/// firing never interleave.
#[derive(Debug)]
pub struct WindowAggregator {
    assigner: TumblingEventTimeWindows,
    store: AggregationStateStore,
    current_watermark: EventTime,
    records_accepted: u64,
    windows_emitted: u64,
}

impl WindowAggregator {
    /// Create an aggregator over tumbling windows of `window_interval`.
    pub fn new(window_interval: Duration) -> Result<Self> {
        Ok(Self {
            assigner: TumblingEventTimeWindows::of(window_interval)?,
            store: AggregationStateStore::new(),
            current_watermark: EVENT_TIME_MIN,
            records_accepted: 0,
            windows_emitted: 0,
        })
    }

    /// Process one stream element and return any window results produced.
    pub fn process(&mut self, elem: StreamElement<MeterReading>) -> Vec<AggregateResult> {
        match elem {
            StreamElement::Record(reading) => {
                self.process_record(&reading);
                Vec::new()
            }
            StreamElement::Watermark(wm) => self.advance_watermark(wm.timestamp),
            StreamElement::End => Vec::new(),
        }
    }

    /// Assign a reading to its window and accumulate it.
    pub fn process_record(&mut self, reading: &MeterReading) -> UpdateOutcome {
        let window = self.assigner.assign(reading.event_time);
        let outcome = self.store.update(&reading.meter, window, reading);
        if outcome != UpdateOutcome::DroppedLate {
            self.records_accepted += 1;
        }
        outcome
    }

    /// Advance event time and fire every window it closes.
    ///
    /// A watermark at or below the current one is ignored.
    pub fn advance_watermark(&mut self, watermark: EventTime) -> Vec<AggregateResult> {
        if watermark <= self.current_watermark {
            return Vec::new();
        }
        self.current_watermark = watermark;
        self.store.advance_watermark(watermark);
        self.fire()
    }

    /// Finalize and evict every open window closed by the current watermark.
    ///
    /// Scans only open windows. Results are ordered by window end, then
    /// meter, so each meter's windows come out in ascending start order.
    pub fn fire(&mut self) -> Vec<AggregateResult> {
        let mut output = Vec::new();
        for key in self.store.due_windows() {
            if let Some(result) = self.store.take_and_remove(&key) {
                output.push(result);
            }
        }
        self.windows_emitted += output.len() as u64;
        output
    }

    /// Shut down: discard the windows the watermark has not closed and
    /// report them alongside the partition counters.
    ///
    /// Open windows are never force-emitted.
    pub fn drain(&mut self, partition: usize) -> PartitionReport {
        let discarded = self.store.discard_open();
        for key in &discarded {
            tracing::warn!(
                "partition {}: discarding open window {} at drain (watermark={})",
                partition,
                key,
                self.current_watermark
            );
        }
        PartitionReport {
            partition,
            records_accepted: self.records_accepted,
            late_dropped: self.store.late_dropped(),
            windows_emitted: self.windows_emitted,
            discarded_open_windows: discarded,
            final_watermark: (self.current_watermark != EVENT_TIME_MIN)
                .then_some(self.current_watermark),
        }
    }

    /// The watermark this operator has fired up to.
    pub fn current_watermark(&self) -> EventTime {
        self.current_watermark
    }

    /// Number of currently open `(meter, window)` pairs.
    pub fn open_window_count(&self) -> usize {
        self.store.len()
    }

    /// Return the open windows in firing order.
    pub fn open_windows(&self) -> Vec<WindowKey> {
        let mut keys: Vec<WindowKey> = self.store.keys().cloned().collect();
        keys.sort_by(|a, b| (a.window.end, &a.meter).cmp(&(b.window.end, &b.meter)));
        keys
    }
}
