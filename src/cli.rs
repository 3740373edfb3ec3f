use crate::error::AppError;
use crate::output::{Formatter, JsonFormatter, SummaryBuilder, TextFormatter};
use crate::protocol::{LengthMode, WireFormat};
use crate::report::{ChannelReporter, OutcomeRecord, OutcomeSink};
use crate::simulator::config::{DriverConfig, OperationWeights, ThinkTime, WorkloadConfig};
use crate::simulator::simulator::Simulator;
use crate::target::TargetCell;
use crate::transport::{SessionOptions, TcpConnector};
/// CLI argument parsing and command execution.
use clap::{Parser, Subcommand, ValueEnum};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// Default run length when neither a request budget nor a duration is given.
const DEFAULT_DURATION_SECS: u64 = 10;

/// Kvdrive - Concurrent load generation for TCP key-value stores.
#[derive(Parser, Debug)]
#[command(name = "kvdrive")]
#[command(about = "Drive concurrent synthetic PUT/GET traffic against a key-value server")]
#[command(
    long_about = r#"Kvdrive - A load-generation client for TCP key-value stores

Spawns many simulated clients, each owning one persistent TCP connection
and issuing a weighted mix of PUT/GET operations with randomized
think-time pacing. Every operation's latency, response size, and outcome
is reported and summarized.

FEATURES:
  • Two wire encodings: newline-terminated commands or RESP-like multibulk
  • Weighted operation mix with configurable PUT/GET weights
  • Randomized think time drawn from a configurable range
  • Per-operation latency at sub-millisecond precision
  • Text or JSON run summaries

EXAMPLES:
  # 10 clients for 10 seconds against the default target
  kvdrive run

  # Explicit target, request budget per client
  kvdrive run --target tcp://cache.internal:7171 --clients 50 --requests 1000

  # RESP-like framing, GET-heavy mix, 50-200ms think time
  kvdrive run --wire-format multibulk --put-weight 1 --get-weight 4 --think-time 50-200ms

The target falls back to the REDIS_HOST/REDIS_PORT environment variables
(default localhost:7171) when --target is not given."#
)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a load-generation session
    Run {
        /// Connection target, e.g. tcp://host:7171 (port defaults to 7171)
        #[arg(short, long)]
        target: Option<String>,

        /// Number of concurrent simulated clients
        #[arg(short, long, default_value = "10")]
        clients: usize,

        /// Operations per client (runs until --duration when omitted)
        #[arg(short, long)]
        requests: Option<usize>,

        /// Run duration in seconds
        #[arg(short, long)]
        duration: Option<u64>,

        /// Wire encoding for commands
        #[arg(short, long, value_enum, default_value = "newline")]
        wire_format: WireFormatArg,

        /// Length prefix unit for multibulk frames
        #[arg(long, value_enum, default_value = "bytes")]
        length_mode: LengthModeArg,

        /// Relative weight of PUT operations
        #[arg(long, default_value = "1")]
        put_weight: u32,

        /// Relative weight of GET operations
        #[arg(long, default_value = "1")]
        get_weight: u32,

        /// Think time between operations (e.g. "0-5ms" or "100ms")
        #[arg(long)]
        think_time: Option<String>,

        /// Response read buffer capacity in bytes
        #[arg(long, default_value = "4096")]
        read_buffer: usize,

        /// Read timeout in milliseconds (unbounded when omitted)
        #[arg(long)]
        read_timeout: Option<u64>,

        /// Value payload for PUT operations
        #[arg(long, default_value = "test_value")]
        value: String,

        /// Output format for the run summary
        #[arg(short, long, value_enum, default_value = "text")]
        output_format: RunOutputFormat,

        /// Suppress the progress bar
        #[arg(short, long)]
        quiet: bool,
    },
}

/// Wire format CLI choice.
#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum WireFormatArg {
    Newline,
    Multibulk,
}

impl From<WireFormatArg> for WireFormat {
    fn from(arg: WireFormatArg) -> Self {
        match arg {
            WireFormatArg::Newline => WireFormat::Newline,
            WireFormatArg::Multibulk => WireFormat::Multibulk,
        }
    }
}

/// Multibulk length unit CLI choice.
#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum LengthModeArg {
    /// Byte-accurate lengths
    Bytes,
    /// Legacy character-count lengths
    Chars,
}

impl From<LengthModeArg> for LengthMode {
    fn from(arg: LengthModeArg) -> Self {
        match arg {
            LengthModeArg::Bytes => LengthMode::Bytes,
            LengthModeArg::Chars => LengthMode::Chars,
        }
    }
}

/// Summary output format.
#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum RunOutputFormat {
    Text,
    Json,
}

struct RunArgs {
    target: Option<String>,
    clients: usize,
    requests: Option<usize>,
    duration: Option<u64>,
    wire_format: WireFormatArg,
    length_mode: LengthModeArg,
    put_weight: u32,
    get_weight: u32,
    think_time: Option<String>,
    read_buffer: usize,
    read_timeout: Option<u64>,
    value: String,
    output_format: RunOutputFormat,
    quiet: bool,
}

impl Cli {
    pub fn run(self) -> Result<(), AppError> {
        match self.command {
            Command::Run {
                target,
                clients,
                requests,
                duration,
                wire_format,
                length_mode,
                put_weight,
                get_weight,
                think_time,
                read_buffer,
                read_timeout,
                value,
                output_format,
                quiet,
            } => Self::run_load(RunArgs {
                target,
                clients,
                requests,
                duration,
                wire_format,
                length_mode,
                put_weight,
                get_weight,
                think_time,
                read_buffer,
                read_timeout,
                value,
                output_format,
                quiet,
            }),
        }
    }

    /// Run the load-generation session.
    fn run_load(args: RunArgs) -> Result<(), AppError> {
        let config = Self::build_config(&args)?;

        // Resolve the target once, before any client spawns, so a
        // malformed spec fails the run immediately. Client connect paths
        // hit the same cell and reuse this result.
        let cell = Arc::new(TargetCell::new());
        let target = cell.resolve(args.target.as_deref())?;

        eprintln!(
            "Starting load against {} with {} clients ({} mode)",
            target.addr(),
            config.clients,
            match config.requests_per_client {
                Some(n) => format!("{} requests/client", n),
                None => format!(
                    "{}s duration",
                    config.duration.unwrap_or_default().as_secs()
                ),
            }
        );

        let connector = Arc::new(TcpConnector::new(
            args.target.clone(),
            Arc::clone(&cell),
            config.session.clone(),
        ));
        let simulator = Simulator::new(config.clone());

        let rt = tokio::runtime::Runtime::new()
            .map_err(|e| AppError::Config(format!("Failed to create async runtime: {}", e)))?;

        let progress_bar = if args.quiet {
            None
        } else {
            let total = config
                .requests_per_client
                .map(|r| (r * config.clients) as u64);
            Some(Arc::new(Self::make_progress_bar(total)))
        };

        let (reporter, rx) = ChannelReporter::new();
        let sink: Arc<dyn OutcomeSink> = Arc::new(reporter);

        let collector_progress = progress_bar.clone();
        let summary = rt.block_on(async move {
            let collector = tokio::spawn(collect_outcomes(rx, collector_progress));
            let started = Instant::now();
            simulator.run(connector, Arc::clone(&sink)).await?;
            // The clients' sink clones are gone once run() returns;
            // dropping the last sender lets the collector drain and stop.
            drop(sink);
            let elapsed = started.elapsed();
            let builder = collector
                .await
                .map_err(|e| AppError::Config(format!("Collector task failed: {}", e)))?;
            Ok::<_, AppError>(builder.finish(elapsed))
        })?;

        if let Some(ref pb) = progress_bar {
            pb.finish_with_message("Load test completed");
        }

        let formatter: Box<dyn Formatter> = match args.output_format {
            RunOutputFormat::Text => Box::new(TextFormatter),
            RunOutputFormat::Json => Box::new(JsonFormatter),
        };
        println!("{}", formatter.format(&summary)?);

        Ok(())
    }

    fn build_config(args: &RunArgs) -> Result<DriverConfig, AppError> {
        let weights =
            OperationWeights::new(args.put_weight, args.get_weight).map_err(AppError::Config)?;
        let think_time = match &args.think_time {
            Some(raw) => Some(ThinkTime::parse(raw).map_err(AppError::Config)?),
            None => None,
        };

        let workload = WorkloadConfig {
            wire_format: args.wire_format.into(),
            length_mode: args.length_mode.into(),
            weights,
            think_time,
            value: args.value.clone(),
        };
        let session = SessionOptions {
            read_buffer_size: args.read_buffer,
            read_timeout: args.read_timeout.map(Duration::from_millis),
        };

        let duration = args
            .duration
            .or(if args.requests.is_none() {
                Some(DEFAULT_DURATION_SECS)
            } else {
                None
            })
            .map(Duration::from_secs);

        let mut config = DriverConfig::new(args.clients);
        config.requests_per_client = args.requests;
        config.duration = duration;
        config.workload = workload;
        config.session = session;
        config.validate().map_err(AppError::Config)?;
        Ok(config)
    }

    fn make_progress_bar(total: Option<u64>) -> indicatif::ProgressBar {
        match total {
            Some(total) => {
                let pb = indicatif::ProgressBar::new(total);
                pb.set_style(
                    indicatif::ProgressStyle::default_bar()
                        .template(
                            "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}",
                        )
                        .expect("valid progress bar template")
                        .progress_chars("#>-"),
                );
                pb
            }
            None => {
                let pb = indicatif::ProgressBar::new_spinner();
                pb.set_style(
                    indicatif::ProgressStyle::default_spinner()
                        .template("{spinner:.green} [{elapsed_precise}] {pos} ops {msg}")
                        .expect("valid progress bar template"),
                );
                pb
            }
        }
    }
}

/// Drain the reporter channel, folding records into a summary and
/// feeding the live progress display.
async fn collect_outcomes(
    mut rx: mpsc::UnboundedReceiver<OutcomeRecord>,
    progress: Option<Arc<indicatif::ProgressBar>>,
) -> SummaryBuilder {
    let mut builder = SummaryBuilder::new();
    let mut succeeded: u64 = 0;
    let mut failed: u64 = 0;
    while let Some(record) = rx.recv().await {
        if record.failed() {
            failed += 1;
        } else {
            succeeded += 1;
        }
        builder.observe(&record);
        if let Some(ref pb) = progress {
            pb.inc(1);
            pb.set_message(format!("Success: {} | Failed: {}", succeeded, failed));
        }
    }
    builder
}
