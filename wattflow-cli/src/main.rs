use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use wattflow_core::config::{CsvOptions, PipelineConfig};
use wattflow_core::connector::{CsvSource, Ingress};
use wattflow_core::job::MeterAggregationJob;
use wattflow_core::report::{PipelineReport, Termination};
use wattflow_core::time::format_event_time;

#[derive(Parser, Debug)]
#[command(name = "wattflow")]
#[command(about = "Per-meter tumbling-window energy aggregation", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Aggregate a CSV of readings into a CSV of window results
    Run {
        #[arg(long)]
        input: PathBuf,
        #[arg(long, default_value = "./tmp/data/event_agg")]
        output: PathBuf,
        #[arg(long, default_value_t = 3600)]
        window_secs: u64,
        #[arg(long, default_value_t = 30)]
        lateness_secs: u64,
        #[arg(long, default_value_t = 1)]
        partitions: usize,
        /// Input has a header row and output gets one
        #[arg(long)]
        headers: bool,
    },
    /// Print the validated readings of a CSV file
    Inspect {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        headers: bool,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Run {
            input,
            output,
            window_secs,
            lateness_secs,
            partitions,
            headers,
        } => {
            let config = PipelineConfig::default()
                .with_window_interval(Duration::from_secs(window_secs))
                .with_lateness_bound(Duration::from_secs(lateness_secs))
                .with_partition_count(partitions);
            let options = CsvOptions {
                has_headers: headers,
            };
            let job = MeterAggregationJob::new(input, output)
                .with_config(config)
                .with_input_options(options)
                .with_output_options(options);

            let report = job.run()?;
            print_report(&report);
            if let Termination::SourceFailed(_) = report.termination {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Inspect {
            input,
            headers,
            limit,
        } => {
            let source = CsvSource::open(&input, CsvOptions {
                has_headers: headers,
            })?;
            let mut ingress = Ingress::new(source);
            let mut shown = 0;
            while shown < limit {
                let Some(reading) = ingress.next_reading()? else {
                    break;
                };
                println!(
                    "{},{},{},{}",
                    reading.meter,
                    format_event_time(reading.event_time),
                    reading.energy,
                    reading.power
                );
                shown += 1;
            }
            println!(
                "shown={} read={} malformed={}",
                shown,
                ingress.rows_read(),
                ingress.malformed()
            );
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn print_report(report: &PipelineReport) {
    let watermark = report
        .final_watermark
        .map(format_event_time)
        .unwrap_or_else(|| "none".to_string());
    println!("termination:        {:?}", report.termination);
    println!("records read:       {}", report.records_read);
    println!("records accepted:   {}", report.records_accepted);
    println!("malformed dropped:  {}", report.malformed_dropped);
    println!("late dropped:       {}", report.late_dropped);
    println!("windows emitted:    {}", report.windows_emitted);
    println!("results written:    {}", report.results_written);
    println!("sink retries:       {}", report.sink_retries);
    println!("open at shutdown:   {}", report.discarded_open_windows);
    println!("final watermark:    {}", watermark);
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        "wattflow=debug,wattflow_core=debug"
    } else {
        "wattflow=info,wattflow_core=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
