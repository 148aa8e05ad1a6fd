use serde::{Deserialize, Serialize};

/// Event time in milliseconds since the Unix epoch.
pub type EventTime = i64;

/// Watermark indicates that no window ending at or before this value will
/// receive further elements.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct Watermark {
    pub timestamp: EventTime,
}

impl Watermark {
    /// Create a new watermark at the given timestamp.
    pub fn new(timestamp: EventTime) -> Self {
        Self { timestamp }
    }
}

impl std::fmt::Display for Watermark {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Watermark({}ms)", self.timestamp)
    }
}

/// The unit flowing from ingress to a partition worker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum StreamElement<T> {
    /// A validated data record.
    Record(T),
    /// Event-time progress broadcast by ingress.
    Watermark(Watermark),
    /// End of stream; the worker drains and exits.
    End,
}

impl<T> StreamElement<T> {
    /// Create a record element.
    pub fn record(value: T) -> Self {
        Self::Record(value)
    }

    /// Create a watermark element.
    pub fn watermark(timestamp: EventTime) -> Self {
        Self::Watermark(Watermark::new(timestamp))
    }

    /// Return true for the end-of-stream marker.
    pub fn is_end(&self) -> bool {
        matches!(self, Self::End)
    }
}
