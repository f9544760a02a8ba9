//! Deepwork CLI - Command-line interface for Synheart Deepwork
//!
//! Commands:
//! - analyze: Score activity records (metrics or a full report)
//! - anomalies: Detect anomalous days from records or daily aggregates
//! - energy: Predict current energy and the next 24 hours
//! - validate: Validate activity records
//! - baseline: Learn a personalized baseline and persist it

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use synheart_deepwork::baseline::{BaselineStore, DEFAULT_BASELINE_WINDOW};
use synheart_deepwork::encoder::ReportEncoder;
use synheart_deepwork::normalizer::ActivityNormalizer;
use synheart_deepwork::pipeline::parse_reference_time;
use synheart_deepwork::types::{ActivityRecord, DailyAggregate};
use synheart_deepwork::{AnalyzerConfig, ComputeError, DeepWorkAnalyzer, DEEPWORK_VERSION};

/// Deepwork - On-device productivity analytics engine
#[derive(Parser)]
#[command(name = "deepwork")]
#[command(author = "Synheart AI Inc")]
#[command(version = DEEPWORK_VERSION)]
#[command(about = "Turn activity records into deep work, energy and anomaly signals")]
#[command(long_about = None)]
struct Cli {
    #[command(flatten)]
    settings: Settings,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command
#[derive(Args)]
struct Settings {
    /// Analyzer configuration file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the session gap threshold (seconds)
    #[arg(long, global = true)]
    gap_secs: Option<i64>,

    /// Override the UTC offset used for hour and day bucketing (minutes)
    #[arg(long, global = true, allow_hyphen_values = true)]
    utc_offset_minutes: Option<i32>,
}

/// Where records come from
#[derive(Args)]
struct InputArgs {
    /// Input file path (use - for stdin)
    #[arg(short, long, default_value = "-")]
    input: PathBuf,

    /// Input format
    #[arg(long, default_value = "ndjson")]
    input_format: InputFormat,
}

/// Where results go
#[derive(Args)]
struct OutputArgs {
    /// Output file path (use - for stdout)
    #[arg(short, long, default_value = "-")]
    output: PathBuf,

    /// Output format
    #[arg(long, default_value = "json-pretty")]
    output_format: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Score activity records
    Analyze {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        output: OutputArgs,

        /// Reference time (RFC 3339); defaults to the end of the last record
        #[arg(long)]
        now: Option<String>,

        /// Use the baseline learned in this store file
        #[arg(long)]
        baseline: Option<PathBuf>,

        /// Emit a full report (metrics, anomalies, energy) instead of metrics only
        #[arg(long)]
        report: bool,
    },

    /// Detect anomalous days
    Anomalies {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        output: OutputArgs,

        /// Input holds daily aggregates instead of activity records
        #[arg(long)]
        aggregates: bool,
    },

    /// Predict current energy and the next 24 hours
    Energy {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        output: OutputArgs,

        /// Reference time (RFC 3339); defaults to the end of the last record
        #[arg(long)]
        now: Option<String>,
    },

    /// Validate activity records
    Validate {
        #[command(flatten)]
        input: InputArgs,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Learn a personalized baseline and save the store
    Baseline {
        #[command(flatten)]
        input: InputArgs,

        /// Baseline store file; loaded when present, written after the update
        #[arg(long)]
        store: PathBuf,

        /// Baseline window in days (new stores only)
        #[arg(long, default_value_t = DEFAULT_BASELINE_WINDOW)]
        window_days: usize,
    },
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Newline-delimited JSON (one record per line)
    Ndjson,
    /// JSON array of records
    Json,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Newline-delimited JSON (one item per line)
    Ndjson,
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), DeepworkCliError> {
    let config = load_config(&cli.settings)?;

    match cli.command {
        Commands::Analyze {
            input,
            output,
            now,
            baseline,
            report,
        } => cmd_analyze(config, &input, &output, now.as_deref(), baseline.as_deref(), report),

        Commands::Anomalies {
            input,
            output,
            aggregates,
        } => cmd_anomalies(config, &input, &output, aggregates),

        Commands::Energy { input, output, now } => {
            cmd_energy(config, &input, &output, now.as_deref())
        }

        Commands::Validate { input, json } => cmd_validate(&input, json),

        Commands::Baseline {
            input,
            store,
            window_days,
        } => cmd_baseline(&config, &input, &store, window_days),
    }
}

fn load_config(settings: &Settings) -> Result<AnalyzerConfig, DeepworkCliError> {
    let mut config = match &settings.config {
        Some(path) => AnalyzerConfig::from_json(&fs::read_to_string(path)?)?,
        None => AnalyzerConfig::default(),
    };

    if let Some(gap) = settings.gap_secs {
        config.session_gap_secs = gap;
    }
    if let Some(offset) = settings.utc_offset_minutes {
        config.utc_offset_minutes = offset;
    }

    config.validate()?;
    Ok(config)
}

fn cmd_analyze(
    config: AnalyzerConfig,
    input: &InputArgs,
    output: &OutputArgs,
    now: Option<&str>,
    baseline: Option<&Path>,
    report: bool,
) -> Result<(), DeepworkCliError> {
    let records: Vec<ActivityRecord> = read_items(input)?;
    let now = reference_time(now, &records)?;

    let mut analyzer = DeepWorkAnalyzer::new(config)?;
    if let Some(path) = baseline {
        let store = BaselineStore::from_json(&fs::read_to_string(path)?)?;
        analyzer.replace_baseline(store.baseline());
    }

    if report {
        let parts = analyzer.build_report(&records, now)?;
        let report = ReportEncoder::new().encode(parts)?;
        write_output(output, &format_one(&report, &output.output_format)?)
    } else {
        let metrics = analyzer.analyze(&records, now)?;
        write_output(output, &format_one(&metrics, &output.output_format)?)
    }
}

fn cmd_anomalies(
    config: AnalyzerConfig,
    input: &InputArgs,
    output: &OutputArgs,
    aggregates: bool,
) -> Result<(), DeepworkCliError> {
    let analyzer = DeepWorkAnalyzer::new(config)?;

    let anomalies = if aggregates {
        let days: Vec<DailyAggregate> = read_items(input)?;
        analyzer.detect_anomalies(&days)
    } else {
        let records: Vec<ActivityRecord> = read_items(input)?;
        analyzer.detect_anomalies_from_records(&records)?
    };

    write_output(output, &format_many(&anomalies, &output.output_format)?)
}

fn cmd_energy(
    config: AnalyzerConfig,
    input: &InputArgs,
    output: &OutputArgs,
    now: Option<&str>,
) -> Result<(), DeepworkCliError> {
    let records: Vec<ActivityRecord> = read_items(input)?;
    let now = reference_time(now, &records)?;

    let prediction = DeepWorkAnalyzer::new(config)?.predict_energy(&records, now)?;
    write_output(output, &format_one(&prediction, &output.output_format)?)
}

fn cmd_validate(input: &InputArgs, json: bool) -> Result<(), DeepworkCliError> {
    let records: Vec<ActivityRecord> = read_items(input)?;

    let errors: Vec<ValidationErrorDetail> = records
        .iter()
        .enumerate()
        .filter_map(|(index, record)| {
            ActivityNormalizer::validate(index, record, None)
                .err()
                .map(|e| ValidationErrorDetail {
                    index,
                    app_name: record.app_name.clone(),
                    error: e.to_string(),
                })
        })
        .collect();

    let report = ValidationReport {
        total_records: records.len(),
        valid_records: records.len() - errors.len(),
        invalid_records: errors.len(),
        errors,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total records:   {}", report.total_records);
        println!("Valid records:   {}", report.valid_records);
        println!("Invalid records: {}", report.invalid_records);

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                println!("  - {} (index {}): {}", err.app_name, err.index, err.error);
            }
        }
    }

    if report.invalid_records > 0 {
        Err(DeepworkCliError::ValidationFailed(report.invalid_records))
    } else {
        Ok(())
    }
}

fn cmd_baseline(
    config: &AnalyzerConfig,
    input: &InputArgs,
    store_path: &Path,
    window_days: usize,
) -> Result<(), DeepworkCliError> {
    let records: Vec<ActivityRecord> = read_items(input)?;

    let mut store = if store_path.exists() {
        BaselineStore::from_json(&fs::read_to_string(store_path)?)?
    } else {
        tracing::info!(path = %store_path.display(), "creating new baseline store");
        BaselineStore::new(window_days)
    };

    let baseline = store.update(&records, config)?;
    fs::write(store_path, store.to_json()?)?;

    println!("{}", serde_json::to_string_pretty(&baseline)?);
    Ok(())
}

// Helper functions

fn read_input(path: &Path) -> Result<String, DeepworkCliError> {
    if path.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(path)?)
    }
}

fn read_items<T: DeserializeOwned>(input: &InputArgs) -> Result<Vec<T>, DeepworkCliError> {
    let data = read_input(&input.input)?;

    match input.input_format {
        InputFormat::Json => Ok(serde_json::from_str(&data)?),
        InputFormat::Ndjson => data
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(n, line)| {
                serde_json::from_str(line).map_err(|e| {
                    DeepworkCliError::ParseError(format!("line {}: {}", n + 1, e))
                })
            })
            .collect(),
    }
}

/// Explicit `--now`, else the latest record end
fn reference_time(
    now: Option<&str>,
    records: &[ActivityRecord],
) -> Result<chrono::DateTime<chrono::Utc>, DeepworkCliError> {
    if let Some(value) = now {
        return Ok(parse_reference_time(value)?);
    }
    records
        .iter()
        .map(|r| r.ended_at())
        .max()
        .ok_or(DeepworkCliError::NoReferenceTime)
}

fn format_one<T: Serialize>(value: &T, format: &OutputFormat) -> Result<String, DeepworkCliError> {
    Ok(match format {
        OutputFormat::Ndjson | OutputFormat::Json => serde_json::to_string(value)? + "\n",
        OutputFormat::JsonPretty => serde_json::to_string_pretty(value)? + "\n",
    })
}

fn format_many<T: Serialize>(
    values: &[T],
    format: &OutputFormat,
) -> Result<String, DeepworkCliError> {
    match format {
        OutputFormat::Ndjson => {
            let mut lines: Vec<String> = Vec::new();
            for value in values {
                lines.push(serde_json::to_string(value)?);
            }
            Ok(lines.join("\n") + "\n")
        }
        OutputFormat::Json => Ok(serde_json::to_string(values)? + "\n"),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(values)? + "\n"),
    }
}

fn write_output(output: &OutputArgs, data: &str) -> Result<(), DeepworkCliError> {
    if output.output.to_string_lossy() == "-" {
        print!("{}", data);
    } else {
        fs::write(&output.output, data)?;
    }
    Ok(())
}

// Error handling

#[derive(Debug)]
enum DeepworkCliError {
    Io(io::Error),
    Compute(ComputeError),
    Json(serde_json::Error),
    NoReferenceTime,
    ValidationFailed(usize),
    ParseError(String),
}

impl From<io::Error> for DeepworkCliError {
    fn from(e: io::Error) -> Self {
        DeepworkCliError::Io(e)
    }
}

impl From<ComputeError> for DeepworkCliError {
    fn from(e: ComputeError) -> Self {
        DeepworkCliError::Compute(e)
    }
}

impl From<serde_json::Error> for DeepworkCliError {
    fn from(e: serde_json::Error) -> Self {
        DeepworkCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<DeepworkCliError> for CliError {
    fn from(e: DeepworkCliError) -> Self {
        match e {
            DeepworkCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            DeepworkCliError::Compute(ComputeError::Validation(e)) => CliError {
                code: "VALIDATION_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Run 'deepwork validate' for details".to_string()),
            },
            DeepworkCliError::Compute(ComputeError::InvalidConfig(msg)) => CliError {
                code: "CONFIG_ERROR".to_string(),
                message: msg,
                hint: Some("Check --config and override flags".to_string()),
            },
            DeepworkCliError::Compute(e) => CliError {
                code: "COMPUTE_ERROR".to_string(),
                message: e.to_string(),
                hint: None,
            },
            DeepworkCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            DeepworkCliError::NoReferenceTime => CliError {
                code: "NO_REFERENCE_TIME".to_string(),
                message: "No records to derive a reference time from".to_string(),
                hint: Some("Pass --now with an RFC 3339 timestamp".to_string()),
            },
            DeepworkCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} records failed validation", count),
                hint: Some("Fix validation errors and retry".to_string()),
            },
            DeepworkCliError::ParseError(msg) => CliError {
                code: "PARSE_ERROR".to_string(),
                message: msg,
                hint: Some("Ensure each line is one activity record".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    total_records: usize,
    valid_records: usize,
    invalid_records: usize,
    errors: Vec<ValidationErrorDetail>,
}

#[derive(serde::Serialize)]
struct ValidationErrorDetail {
    index: usize,
    app_name: String,
    error: String,
}
