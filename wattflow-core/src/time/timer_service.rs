use super::*;

/// Event-time index of the windows currently open in one partition.
///
/// Timers are sorted by fire time in a `BTreeMap`, so collecting the
/// windows a watermark closes is a range scan over exactly the due
/// entries, not over a calendar grid.
///
/// # Invariant
/// A `(key, fire_at)` pair is registered at most once; re-registering
/// the same pair is idempotent.
#[derive(Debug, Clone)]
pub struct TimerService<K: Ord> {
    timers: BTreeMap<EventTime, BTreeSet<K>>,
}

impl<K: Ord> TimerService<K> {
    /// Create an empty `TimerService`.
    pub fn new() -> Self {
        Self {
            timers: BTreeMap::new(),
        }
    }

    /// Register a timer for `key` to fire at `fire_at`.
    pub fn register(&mut self, key: K, fire_at: EventTime) {
        self.timers.entry(fire_at).or_default().insert(key);
    }

    /// Cancel a timer. No-op if the pair was not registered.
    pub fn delete(&mut self, key: &K, fire_at: EventTime) {
        if let Some(keys) = self.timers.get_mut(&fire_at) {
            keys.remove(key);
            if keys.is_empty() {
                self.timers.remove(&fire_at);
            }
        }
    }

    /// Drain and return all timers with `fire_at <= watermark_ts`.
    ///
    /// Pairs come back in ascending `fire_at` order, then ascending key.
    pub fn drain_due(&mut self, watermark_ts: EventTime) -> Vec<(K, EventTime)> {
        let pending = match watermark_ts.checked_add(1) {
            Some(split_at) => self.timers.split_off(&split_at),
            None => BTreeMap::new(),
        };
        let due = std::mem::replace(&mut self.timers, pending);

        let mut fired = Vec::new();
        for (fire_at, keys) in due {
            for key in keys {
                fired.push((key, fire_at));
            }
        }
        fired
    }

    /// Return the total count of registered `(key, fire_at)` pairs.
    pub fn len(&self) -> usize {
        self.timers.values().map(|keys| keys.len()).sum()
    }

    /// Return `true` if no timers are registered.
    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }
}

impl<K: Ord> Default for TimerService<K> {
    fn default() -> Self {
        Self::new()
    }
}
