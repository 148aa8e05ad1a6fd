//! Data carried through the pipeline.
//!
//! - [`RawReading`]: an untyped row as a source produced it.
//! - [`MeterReading`]: a validated reading, the unit the windows aggregate.
//! - [`AggregateResult`]: one finalized `(meter, window)` row.

use serde::{Deserialize, Serialize};

use crate::error::RecordError;
use crate::time::{format_event_time, parse_event_time};
use crate::types::EventTime;

/// A source row before validation. Every field is kept as text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawReading {
    pub meter: String,
    pub event_time: String,
    pub energy: String,
    pub power: String,
    /// Position in the source, for diagnostics.
    pub line: Option<u64>,
}

impl RawReading {
    pub fn new(
        meter: impl Into<String>,
        event_time: impl Into<String>,
        energy: impl Into<String>,
        power: impl Into<String>,
    ) -> Self {
        Self {
            meter: meter.into(),
            event_time: event_time.into(),
            energy: energy.into(),
            power: power.into(),
            line: None,
        }
    }

    pub fn at_line(mut self, line: u64) -> Self {
        self.line = Some(line);
        self
    }
}

/// A validated meter reading.
///
/// Invariants: `meter` is non-empty; `energy` and `power` are finite and
/// non-negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeterReading {
    pub meter: String,
    pub event_time: EventTime,
    pub energy: f64,
    pub power: f64,
}

impl MeterReading {
    /// Build a reading from already-typed values, checking the invariants.
    pub fn new(
        meter: impl Into<String>,
        event_time: EventTime,
        energy: f64,
        power: f64,
    ) -> Result<Self, RecordError> {
        let meter = meter.into();
        if meter.is_empty() {
            return Err(RecordError::MissingField { field: "meter" });
        }
        Ok(Self {
            meter,
            event_time,
            energy: check_measurement("energy", energy)?,
            power: check_measurement("power", power)?,
        })
    }
}

impl TryFrom<&RawReading> for MeterReading {
    type Error = RecordError;

    fn try_from(raw: &RawReading) -> Result<Self, Self::Error> {
        let meter = required("meter", &raw.meter)?;
        let event_time = required("event_time", &raw.event_time)?;
        let event_time =
            parse_event_time(event_time).map_err(|e| RecordError::InvalidTimestamp {
                value: event_time.to_string(),
                reason: e.to_string(),
            })?;
        let energy = parse_measurement("energy", &raw.energy)?;
        let power = parse_measurement("power", &raw.power)?;
        MeterReading::new(meter, event_time, energy, power)
    }
}

fn required<'a>(field: &'static str, value: &'a str) -> Result<&'a str, RecordError> {
    let value = value.trim();
    if value.is_empty() {
        Err(RecordError::MissingField { field })
    } else {
        Ok(value)
    }
}

fn parse_measurement(field: &'static str, value: &str) -> Result<f64, RecordError> {
    let value = required(field, value)?;
    value
        .parse::<f64>()
        .map_err(|_| RecordError::InvalidNumber {
            field,
            value: value.to_string(),
        })
}

fn check_measurement(field: &'static str, value: f64) -> Result<f64, RecordError> {
    if !value.is_finite() {
        return Err(RecordError::InvalidNumber {
            field,
            value: value.to_string(),
        });
    }
    if value < 0.0 {
        return Err(RecordError::NegativeValue { field, value });
    }
    Ok(value)
}

/// Finalized aggregate for one meter over one window `[window_start, window_end)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
    pub meter: String,
    pub window_start: EventTime,
    pub window_end: EventTime,
    /// Energy at the latest event time minus energy at the earliest.
    pub energy_consumption: f64,
    pub mean_power: f64,
    pub min_power: f64,
    pub max_power: f64,
}

impl std::fmt::Display for AggregateResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}, {}) energy={} power(mean={}, min={}, max={})",
            self.meter,
            format_event_time(self.window_start),
            format_event_time(self.window_end),
            self.energy_consumption,
            self.mean_power,
            self.min_power,
            self.max_power
        )
    }
}
