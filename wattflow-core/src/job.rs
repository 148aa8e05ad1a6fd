//! The meter aggregation job: one CSV input, one transform, one CSV output.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::config::{CsvOptions, PipelineConfig};
use crate::connector::{CsvSink, CsvSource};
use crate::pipeline::{Pipeline, ShutdownSignal};
use crate::report::PipelineReport;

/// Hourly (by default) per-meter energy and power aggregation over CSV files.
#[derive(Debug, Clone)]
pub struct MeterAggregationJob {
    pub input: PathBuf,
    pub output: PathBuf,
    pub input_options: CsvOptions,
    pub output_options: CsvOptions,
    pub config: PipelineConfig,
}

impl MeterAggregationJob {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            input_options: CsvOptions::default(),
            output_options: CsvOptions::default(),
            config: PipelineConfig::default(),
        }
    }

    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_input_options(mut self, options: CsvOptions) -> Self {
        self.input_options = options;
        self
    }

    pub fn with_output_options(mut self, options: CsvOptions) -> Self {
        self.output_options = options;
        self
    }

    /// Run to completion.
    pub fn run(&self) -> Result<PipelineReport> {
        self.run_with_shutdown(&ShutdownSignal::new())
    }

    /// Run until the input is exhausted or `shutdown` is triggered.
    pub fn run_with_shutdown(&self, shutdown: &ShutdownSignal) -> Result<PipelineReport> {
        let pipeline = Pipeline::new(self.config.clone())?.with_shutdown(shutdown.clone());
        let source = CsvSource::open(&self.input, self.input_options)
            .with_context(|| format!("failed to open input {}", self.input.display()))?;
        let mut sink = CsvSink::create(&self.output, self.output_options)
            .with_context(|| format!("failed to create output {}", self.output.display()))?;

        tracing::info!(
            "running meter aggregation: {} -> {}",
            self.input.display(),
            self.output.display()
        );
        let report = pipeline.run(source, &mut sink)?;
        Ok(report)
    }
}
