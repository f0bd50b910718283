//! CLI entry point for the rubric report tool.
//!
//! Provides subcommands for printing per-student reports, exporting the merged
//! table, and summarizing score statistics for a directory of evaluation exports.

use anyhow::Result;
use clap::{Parser, Subcommand};
use rubric_merge::{
    CompiledTable, ExportFormat, Sid,
    discovery::{discover, extract_all, load_directory, load_directory_concurrent},
    merger::compile,
    output::{print_json, reports_json, write_merged_csv, write_reports},
    stats::{ProblemStats, TotalStats},
};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "rubric_merge")]
#[command(about = "Merge per-problem grading exports into per-student reports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the synthesized report for every student (or one)
    Report {
        /// Directory holding the `{n}_{problem}.csv` exports
        #[arg(value_name = "DIR")]
        dir: PathBuf,

        /// Only print the report for this SID
        #[arg(long, allow_negative_numbers = true)]
        sid: Option<i64>,

        /// JSON file overriding export column names / footer row count
        #[arg(short, long)]
        format_config: Option<PathBuf>,

        /// Number of export files to parse at once
        #[arg(short, long, default_value_t = 1)]
        concurrency: usize,
    },
    /// Write the merged table and reports to a directory
    Export {
        /// Directory holding the `{n}_{problem}.csv` exports
        #[arg(value_name = "DIR")]
        dir: PathBuf,

        /// Where `merged.csv`, `reports.json` and `reports/` are written
        #[arg(short, long, default_value = "out")]
        out_dir: PathBuf,

        /// JSON file overriding export column names / footer row count
        #[arg(short, long)]
        format_config: Option<PathBuf>,

        /// Number of export files to parse at once
        #[arg(short, long, default_value_t = 1)]
        concurrency: usize,
    },
    /// Log per-problem score and rubric statistics as JSON
    Stats {
        /// Directory holding the `{n}_{problem}.csv` exports
        #[arg(value_name = "DIR")]
        dir: PathBuf,

        /// JSON file overriding export column names / footer row count
        #[arg(short, long)]
        format_config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/rubric_merge.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("rubric_merge.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Report {
            dir,
            sid,
            format_config,
            concurrency,
        } => {
            let format = ExportFormat::load_or_default(format_config.as_deref())?;
            let compiled = load(dir, format, concurrency).await?;

            match sid {
                Some(sid) => match compiled.report_for(Sid(sid)) {
                    Some(report) => println!("{report}"),
                    None => warn!(sid, "No student with this SID in any export"),
                },
                None => {
                    for report in compiled.reports.values() {
                        println!("{report}");
                    }
                }
            }
        }
        Commands::Export {
            dir,
            out_dir,
            format_config,
            concurrency,
        } => {
            let format = ExportFormat::load_or_default(format_config.as_deref())?;
            let compiled = load(dir, format, concurrency).await?;

            std::fs::create_dir_all(&out_dir)?;
            write_merged_csv(&out_dir.join("merged.csv"), &compiled)?;
            std::fs::write(out_dir.join("reports.json"), reports_json(&compiled)?)?;
            write_reports(&out_dir.join("reports"), &compiled)?;

            info!(out_dir = %out_dir.display(), students = compiled.reports.len(), "Export complete");
        }
        Commands::Stats { dir, format_config } => {
            let format = ExportFormat::load_or_default(format_config.as_deref())?;
            let files = discover(&dir)?;
            let tables = extract_all(&files, &format)?;

            for table in &tables {
                print_json(&ProblemStats::from_table(table))?;
            }

            let compiled = compile(tables)?;
            print_json(&TotalStats::from_compiled(&compiled))?;
        }
    }

    Ok(())
}

/// Loads a directory sequentially, or on the blocking pool when `concurrency > 1`.
async fn load(dir: PathBuf, format: ExportFormat, concurrency: usize) -> Result<CompiledTable> {
    let compiled = if concurrency > 1 {
        load_directory_concurrent(dir, format, concurrency).await?
    } else {
        load_directory(&dir, &format)?
    };
    Ok(compiled)
}
