use super::*;

/// Running aggregate for one `(meter, window)`.
///
/// `first_*`/`last_*` follow event time, not arrival order: a reading
/// replaces `first` only if strictly earlier, and replaces `last` if at
/// least as late (ties go to the later arrival).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowAccumulator {
    first_time: EventTime,
    first_energy: f64,
    last_time: EventTime,
    last_energy: f64,
    power_sum: f64,
    power_count: u64,
    power_min: f64,
    power_max: f64,
}

impl WindowAccumulator {
    /// Create an accumulator holding exactly `reading`.
    pub fn seeded(reading: &MeterReading) -> Self {
        Self {
            first_time: reading.event_time,
            first_energy: reading.energy,
            last_time: reading.event_time,
            last_energy: reading.energy,
            power_sum: reading.power,
            power_count: 1,
            power_min: reading.power,
            power_max: reading.power,
        }
    }

    /// Fold one more reading into the aggregate.
    pub fn add(&mut self, reading: &MeterReading) {
        self.power_sum += reading.power;
        self.power_count += 1;
        self.power_min = self.power_min.min(reading.power);
        self.power_max = self.power_max.max(reading.power);

        if reading.event_time < self.first_time {
            self.first_time = reading.event_time;
            self.first_energy = reading.energy;
        }
        if reading.event_time >= self.last_time {
            self.last_time = reading.event_time;
            self.last_energy = reading.energy;
        }
    }

    /// Number of readings folded in.
    pub fn count(&self) -> u64 {
        self.power_count
    }

    /// Convert the accumulator into the window result.
    pub fn finish(self, key: WindowKey) -> AggregateResult {
        AggregateResult {
            meter: key.meter,
            window_start: key.window.start,
            window_end: key.window.end,
            energy_consumption: self.last_energy - self.first_energy,
            mean_power: self.power_sum / self.power_count as f64,
            min_power: self.power_min,
            max_power: self.power_max,
        }
    }
}
