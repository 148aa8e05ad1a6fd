use super::*;

/// Validating adapter over a [`Source`].
///
/// Malformed rows (empty meter, bad or timezone-qualified timestamp,
/// negative or non-numeric measurement, undecodable row) are dropped and
/// counted; they never end the stream.
pub struct Ingress<S> {
    source: S,
    rows_read: u64,
    malformed: u64,
}

impl<S: Source> Ingress<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            rows_read: 0,
            malformed: 0,
        }
    }

    /// Return the next valid reading, or `Ok(None)` at end of stream.
    ///
    /// Only fatal source errors are returned.
    pub fn next_reading(&mut self) -> Result<Option<MeterReading>, SourceError> {
        loop {
            match self.source.next_row() {
                Ok(None) => return Ok(None),
                Ok(Some(raw)) => {
                    self.rows_read += 1;
                    match MeterReading::try_from(&raw) {
                        Ok(reading) => return Ok(Some(reading)),
                        Err(err) => {
                            self.malformed += 1;
                            tracing::debug!(
                                "drop malformed row (line {}): {}",
                                raw.line.map_or_else(|| "?".to_string(), |l| l.to_string()),
                                err
                            );
                        }
                    }
                }
                Err(err) if !err.is_fatal() => {
                    self.rows_read += 1;
                    self.malformed += 1;
                    tracing::debug!("drop undecodable row: {}", err);
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Rows pulled from the source, valid or not.
    pub fn rows_read(&self) -> u64 {
        self.rows_read
    }

    /// Rows dropped by validation.
    pub fn malformed(&self) -> u64 {
        self.malformed
    }
}
