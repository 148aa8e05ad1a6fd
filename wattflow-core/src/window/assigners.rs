use super::*;

/// Fixed-size, non-overlapping event-time windows aligned to multiples of
/// `size` since the Unix epoch.
///
/// Assignment is a pure function of the timestamp, so out-of-order and
/// late records land in the same window they would have in order.
#[derive(Debug, Clone, Copy)]
pub struct TumblingEventTimeWindows {
    size_ms: i64,
}

impl TumblingEventTimeWindows {
    /// Create tumbling windows of the given `size`.
    ///
    /// The size must be at least one millisecond.
    pub fn of(size: Duration) -> Result<Self> {
        let size_ms = i64::try_from(size.as_millis())?;
        if size_ms <= 0 {
            bail!("window size must be at least 1ms, got {:?}", size);
        }
        Ok(Self { size_ms })
    }

    /// Return the window containing `timestamp`.
    pub fn assign(&self, timestamp: EventTime) -> TimeWindow {
        // rem_euclid keeps pre-epoch timestamps flooring toward -inf.
        let start = timestamp - timestamp.rem_euclid(self.size_ms);
        TimeWindow::new(start, start.saturating_add(self.size_ms))
    }
}
