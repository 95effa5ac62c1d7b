use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use schema_contract_core::{diff, infer, normalize, DiffReport};
use serde_json::Value;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[command(name = "schema-contract")]
#[command(about = "Diff producer JSON Schema changes against a consumer contract")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare a baseline schema against a next schema and report breaking changes
    Diff {
        /// Baseline (previously agreed) JSON Schema file
        base: PathBuf,

        /// Candidate next JSON Schema file
        next: PathBuf,

        /// Output report file (defaults to stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Pretty)]
        format: OutputFormat,
    },

    /// Infer a JSON Schema from a single sample payload
    Infer {
        /// Sample payload JSON file
        input: PathBuf,

        /// Output inferred schema file (defaults to stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Pretty)]
        format: OutputFormat,
    },

    /// Rewrite a schema into canonical form
    Normalize {
        /// Input JSON Schema file
        input: PathBuf,

        /// Output normalized schema file (defaults to stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Pretty)]
        format: OutputFormat,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum OutputFormat {
    Pretty,
    Compact,
}

/// Exit code 2 is reserved for usage/input errors (bad path, malformed JSON), distinct from
/// the diff outcome codes 0 (no breaking changes) and 1 (at least one breaking change).
const USAGE_ERROR_EXIT_CODE: i32 = 2;

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { LevelFilter::DEBUG } else { LevelFilter::WARN };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .init();

    match run(cli.command) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("Error: {err:#}");
            std::process::exit(USAGE_ERROR_EXIT_CODE);
        }
    }
}

fn run(command: Commands) -> Result<i32> {
    match command {
        Commands::Diff { base, next, output, format } => {
            let base_schema = read_json(&base)?;
            let next_schema = read_json(&next)?;
            let report = diff(&base_schema, &next_schema);
            write_json(&report, output.as_ref(), format)?;
            Ok(exit_code_for(&report))
        }
        Commands::Infer { input, output, format } => {
            let payload = read_json(&input)?;
            let schema = infer(&payload);
            write_json(&schema, output.as_ref(), format)?;
            Ok(0)
        }
        Commands::Normalize { input, output, format } => {
            let schema = read_json(&input)?;
            let normalized = normalize(&schema);
            write_json(&normalized, output.as_ref(), format)?;
            Ok(0)
        }
    }
}

/// 0: no breaking changes. 1: at least one breaking change.
fn exit_code_for(report: &DiffReport) -> i32 {
    if report.breaking_count > 0 {
        1
    } else {
        0
    }
}

fn read_json(input: &Path) -> Result<Value> {
    let file = File::open(input).with_context(|| format!("Failed to open input file: {}", input.display()))?;
    let reader = BufReader::new(file);
    serde_json::from_reader(reader).with_context(|| format!("Failed to parse JSON from: {}", input.display()))
}

fn write_json<T: serde::Serialize>(val: &T, path: Option<&PathBuf>, format: OutputFormat) -> Result<()> {
    let mut writer: Box<dyn Write> = if let Some(p) = path {
        let file = File::create(p).with_context(|| format!("Failed to create output file: {}", p.display()))?;
        Box::new(BufWriter::new(file))
    } else {
        Box::new(BufWriter::new(io::stdout()))
    };

    match format {
        OutputFormat::Pretty => {
            serde_json::to_writer_pretty(&mut writer, val).context("Failed to write JSON")?;
        }
        OutputFormat::Compact => {
            serde_json::to_writer(&mut writer, val).context("Failed to write JSON")?;
        }
    }

    writeln!(writer).context("Failed to write trailing newline")?;
    Ok(())
}
