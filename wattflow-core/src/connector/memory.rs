use super::*;

/// In-memory source over a fixed list of rows.
#[derive(Debug, Clone, Default)]
pub struct VecSource {
    rows: VecDeque<RawReading>,
}

impl VecSource {
    pub fn new(rows: impl IntoIterator<Item = RawReading>) -> Self {
        Self {
            rows: rows.into_iter().collect(),
        }
    }
}

impl Source for VecSource {
    fn next_row(&mut self) -> Result<Option<RawReading>, SourceError> {
        Ok(self.rows.pop_front())
    }
}

/// Collects results in emission order.
impl Sink for Vec<AggregateResult> {
    fn write(&mut self, result: &AggregateResult) -> Result<(), SinkError> {
        self.push(result.clone());
        Ok(())
    }
}
