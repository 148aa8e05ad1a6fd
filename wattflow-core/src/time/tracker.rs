use super::*;

/// Tracks event-time progress for a stream with bounded lateness.
///
/// The watermark is `max_seen - lateness`: a window may close once the
/// watermark reaches its end, so records up to `lateness` behind the
/// newest one still land in open windows.
///
/// Before the first observation [`current`](Self::current) returns
/// [`EVENT_TIME_MIN`], which closes nothing.
#[derive(Debug, Clone)]
pub struct WatermarkTracker {
    lateness_ms: i64,
    max_seen: EventTime,
    /// Last value handed out by `current`; the watermark never regresses.
    current: EventTime,
}

impl WatermarkTracker {
    /// Create a tracker with the given allowed lateness.
    pub fn new(lateness: Duration) -> Self {
        Self {
            lateness_ms: i64::try_from(lateness.as_millis()).unwrap_or(i64::MAX),
            max_seen: EVENT_TIME_MIN,
            current: EVENT_TIME_MIN,
        }
    }

    /// Observe a record's event time.
    ///
    /// Returns `Some(watermark)` if the watermark advanced, `None` otherwise.
    /// Late records (older than the newest seen) never move it backward.
    pub fn observe(&mut self, event_time: EventTime) -> Option<Watermark> {
        if event_time <= self.max_seen {
            return None;
        }
        self.max_seen = event_time;
        let candidate = event_time.saturating_sub(self.lateness_ms);
        if candidate > self.current {
            self.current = candidate;
            Some(Watermark::new(candidate))
        } else {
            None
        }
    }

    /// Return the current watermark timestamp.
    pub fn current(&self) -> EventTime {
        self.current
    }

    /// Return the largest event time observed so far, if any.
    pub fn max_seen(&self) -> Option<EventTime> {
        (self.max_seen != EVENT_TIME_MIN).then_some(self.max_seen)
    }
}
