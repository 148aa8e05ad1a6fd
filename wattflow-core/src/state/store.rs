use super::*;

/// What [`AggregationStateStore::update`] did with a reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// First reading of the window; a new accumulator was created.
    Opened,
    /// Folded into an existing open window.
    Merged,
    /// The window is already closed; the reading was dropped and counted.
    DroppedLate,
}

/// Per-partition aggregation state keyed by `(meter, window)`.
///
/// Windows exist only while open: created by the first reading mapped into
/// them, removed by [`take_and_remove`](Self::take_and_remove). The store
/// remembers the watermark it has been advanced to, so a reading for a
/// window that watermark already closed is rejected instead of reopening it.
#[derive(Debug)]
pub struct AggregationStateStore {
    windows: HashMap<WindowKey, WindowAccumulator>,
    /// Open windows indexed by end time.
    timers: TimerService<WindowKey>,
    closed_through: EventTime,
    late_dropped: u64,
}

impl AggregationStateStore {
    pub fn new() -> Self {
        Self {
            windows: HashMap::new(),
            timers: TimerService::new(),
            closed_through: EVENT_TIME_MIN,
            late_dropped: 0,
        }
    }

    /// Accumulate `reading` into the `(key, window)` state.
    pub fn update(
        &mut self,
        key: &str,
        window: TimeWindow,
        reading: &MeterReading,
    ) -> UpdateOutcome {
        if window.is_closed_by(self.closed_through) {
            self.late_dropped += 1;
            tracing::debug!(
                "drop late reading meter={} event_time={} for closed {} (watermark={})",
                key,
                reading.event_time,
                window,
                self.closed_through
            );
            return UpdateOutcome::DroppedLate;
        }

        let map_key = WindowKey::new(key, window);
        match self.windows.get_mut(&map_key) {
            Some(acc) => {
                acc.add(reading);
                UpdateOutcome::Merged
            }
            None => {
                self.timers.register(map_key.clone(), window.end);
                self.windows.insert(map_key, WindowAccumulator::seeded(reading));
                UpdateOutcome::Opened
            }
        }
    }

    /// Move the store's watermark forward. Never moves it backward.
    pub fn advance_watermark(&mut self, watermark: EventTime) {
        self.closed_through = self.closed_through.max(watermark);
    }

    /// Return the open windows the current watermark has closed, removing
    /// them from the timer index.
    ///
    /// Ordered by ascending window end, then meter; for one meter this is
    /// ascending window start.
    pub fn due_windows(&mut self) -> Vec<WindowKey> {
        self.timers
            .drain_due(self.closed_through)
            .into_iter()
            .map(|(key, _)| key)
            .collect()
    }

    /// Finalize and evict one window.
    ///
    /// Returns `None` if the window is not open (never opened, or already
    /// taken), so a window can produce at most one result.
    pub fn take_and_remove(&mut self, key: &WindowKey) -> Option<AggregateResult> {
        let acc = self.windows.remove(key)?;
        self.timers.delete(key, key.window.end);
        Some(acc.finish(key.clone()))
    }

    /// Remove every open window without finalizing it.
    ///
    /// Returns the discarded keys in timer order.
    pub fn discard_open(&mut self) -> Vec<WindowKey> {
        let keys = self.timers.drain_due(EVENT_TIME_MAX);
        self.windows.clear();
        keys.into_iter().map(|(key, _)| key).collect()
    }

    /// Return the accumulator of an open window.
    pub fn get(&self, key: &WindowKey) -> Option<&WindowAccumulator> {
        self.windows.get(key)
    }

    /// Iterate the keys of all open windows, in no particular order.
    pub fn keys(&self) -> impl Iterator<Item = &WindowKey> {
        self.windows.keys()
    }

    /// The watermark the store has been advanced to.
    pub fn watermark(&self) -> EventTime {
        self.closed_through
    }

    /// Number of readings dropped because their window was closed.
    pub fn late_dropped(&self) -> u64 {
        self.late_dropped
    }

    /// Number of currently open windows.
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}

impl Default for AggregationStateStore {
    fn default() -> Self {
        Self::new()
    }
}
