use super::*;

/// Reads `meter,event_time,energy,power` rows from CSV.
///
/// Fields are trimmed; short rows are passed on with empty fields so that
/// validation reports the missing column.
pub struct CsvSource<R: Read> {
    reader: ::csv::Reader<R>,
    record: ::csv::StringRecord,
}

impl CsvSource<File> {
    /// Open a CSV file.
    pub fn open(path: impl AsRef<Path>, options: CsvOptions) -> Result<Self, SourceError> {
        let file = File::open(path)?;
        Ok(Self::from_reader(file, options))
    }
}

impl<R: Read> CsvSource<R> {
    pub fn from_reader(reader: R, options: CsvOptions) -> Self {
        let reader = ::csv::ReaderBuilder::new()
            .has_headers(options.has_headers)
            .flexible(true)
            .trim(::csv::Trim::All)
            .from_reader(reader);
        Self {
            reader,
            record: ::csv::StringRecord::new(),
        }
    }
}

impl<R: Read> Source for CsvSource<R> {
    fn next_row(&mut self) -> Result<Option<RawReading>, SourceError> {
        match self.reader.read_record(&mut self.record) {
            Ok(false) => Ok(None),
            Ok(true) => {
                let field = |i: usize| self.record.get(i).unwrap_or_default();
                let raw = RawReading::new(field(0), field(1), field(2), field(3));
                Ok(Some(match self.record.position() {
                    Some(pos) => raw.at_line(pos.line()),
                    None => raw,
                }))
            }
            Err(err) => Err(source_error(err)),
        }
    }
}

fn source_error(err: ::csv::Error) -> SourceError {
    let line = err.position().map_or(0, |p| p.line());
    let reason = err.to_string();
    match err.into_kind() {
        ::csv::ErrorKind::Io(e) => SourceError::Io(e),
        _ => SourceError::Corrupt { line, reason },
    }
}

/// One output row: `meter,start_time,end_time,energy_consumption,mean_power,min_power,max_power`.
#[derive(Debug, Serialize)]
struct OutputRow<'a> {
    meter: &'a str,
    start_time: String,
    end_time: String,
    energy_consumption: f64,
    mean_power: f64,
    min_power: f64,
    max_power: f64,
}

impl<'a> From<&'a AggregateResult> for OutputRow<'a> {
    fn from(result: &'a AggregateResult) -> Self {
        Self {
            meter: &result.meter,
            start_time: format_event_time(result.window_start),
            end_time: format_event_time(result.window_end),
            energy_consumption: result.energy_consumption,
            mean_power: result.mean_power,
            min_power: result.min_power,
            max_power: result.max_power,
        }
    }
}

/// Appends window results to a CSV table.
///
/// Each row is encoded in memory and pushed to the underlying writer before
/// `write` returns, so I/O errors surface per result. Bytes of a failed row
/// are kept; the retry of that same result resumes after the last byte
/// accepted, so a row is never written twice or left half-written.
pub struct CsvSink<W: Write> {
    out: W,
    has_headers: bool,
    header_encoded: bool,
    /// Encoded row not yet fully accepted by `out`.
    pending: Vec<u8>,
    /// Bytes of `pending` already written.
    written: usize,
}

impl CsvSink<File> {
    /// Create (or truncate) a CSV file, creating parent directories.
    pub fn create(path: impl AsRef<Path>, options: CsvOptions) -> Result<Self, SinkError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        Ok(Self::from_writer(File::create(path)?, options))
    }
}

impl<W: Write> CsvSink<W> {
    pub fn from_writer(out: W, options: CsvOptions) -> Self {
        Self {
            out,
            has_headers: options.has_headers,
            header_encoded: false,
            pending: Vec::new(),
            written: 0,
        }
    }

    /// Return the underlying writer.
    pub fn into_inner(mut self) -> Result<W, SinkError> {
        self.out.flush()?;
        Ok(self.out)
    }

    /// Encode one result (preceded by the header row the first time).
    fn encode(&mut self, result: &AggregateResult) -> Result<(), SinkError> {
        let mut encoder = ::csv::WriterBuilder::new()
            .has_headers(self.has_headers && !self.header_encoded)
            .from_writer(Vec::new());
        encoder.serialize(OutputRow::from(result))?;
        self.pending = encoder
            .into_inner()
            .map_err(|e| SinkError::Io(e.into_error()))?;
        self.written = 0;
        self.header_encoded = true;
        Ok(())
    }

    /// Push the rest of `pending` to `out` and flush it.
    fn push_pending(&mut self) -> Result<(), SinkError> {
        while self.written < self.pending.len() {
            match self.out.write(&self.pending[self.written..]) {
                Ok(0) => return Err(SinkError::Io(io::ErrorKind::WriteZero.into())),
                Ok(n) => self.written += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }
        self.out.flush()?;
        self.pending.clear();
        self.written = 0;
        Ok(())
    }
}

impl<W: Write> Sink for CsvSink<W> {
    /// Write one row. After an error the same result must be offered again;
    /// the retry finishes the row already in flight.
    fn write(&mut self, result: &AggregateResult) -> Result<(), SinkError> {
        if self.pending.is_empty() {
            self.encode(result)?;
        }
        self.push_pending()
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        self.push_pending()
    }
}
