//! Invoice Lookup CLI
//!
//! Looks up the registered name and address of every company in a CSV file
//! or workbook and writes the result back.
//!
//! Usage:
//!   HOUJIN_BANGOU_APP_ID=... cargo run --bin invoice_lookup -- csv \
//!     --input csv/target__corporations.csv \
//!     --output csv/fetch_result.csv
//!
//!   cargo run --bin invoice_lookup -- --config lookup.yaml xlsx \
//!     --workbook csv/sample_excel_copy.xlsx --sheet 登録番号

use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;

use invoice_lookup::records::{csv_store, xlsx_store};
use invoice_lookup::{
    run_lookup, AppConfig, CsvRecordStore, HoujinClient, LookupAggregator, RecordStore,
    RunReport, StoreError, XlsxRecordStore,
};

/// Look up registered corporate name and address for invoice registration numbers
#[derive(Parser, Debug)]
#[command(name = "invoice_lookup", version)]
struct Args {
    /// YAML config file (registry and lookup settings)
    #[arg(long, short = 'c', env = "INVOICE_LOOKUP_CONFIG")]
    config: Option<PathBuf>,

    /// Corporate numbers per request (1-10)
    #[arg(long, short = 'b')]
    batch_size: Option<usize>,

    /// Batches in flight at once
    #[arg(long, short = 'j')]
    concurrency: Option<usize>,

    /// Abort unfinished requests after this many seconds
    #[arg(long)]
    run_timeout: Option<u64>,

    /// Output the run summary as JSON
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Read a CSV file and write the result to another CSV file
    Csv {
        #[arg(long, short = 'i', default_value = csv_store::DEFAULT_SOURCE)]
        input: PathBuf,
        #[arg(long, short = 'o', default_value = csv_store::DEFAULT_DESTINATION)]
        output: PathBuf,
    },
    /// Read a worksheet and write the result back into the same workbook
    Xlsx {
        #[arg(long, short = 'w', default_value = xlsx_store::DEFAULT_WORKBOOK)]
        workbook: PathBuf,
        #[arg(long, short = 's', default_value = xlsx_store::DEFAULT_SHEET)]
        sheet: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => AppConfig::from_yaml_file(path)?,
        None => AppConfig::default(),
    };
    config.apply_env();
    if let Some(batch_size) = args.batch_size {
        config.lookup.batch_size = batch_size;
    }
    if let Some(concurrency) = args.concurrency {
        config.lookup.concurrency = concurrency;
    }
    if let Some(secs) = args.run_timeout {
        config.lookup.run_timeout_secs = Some(secs);
    }

    let client = HoujinClient::new(&config.registry).context("Failed to set up registry client")?;
    let aggregator = LookupAggregator::from_settings(Arc::new(client), &config.lookup);

    let store: Box<dyn RecordStore> = match args.command {
        Command::Csv { input, output } => Box::new(CsvRecordStore::new(input, output)),
        Command::Xlsx { workbook, sheet } => Box::new(XlsxRecordStore::new(workbook, sheet)),
    };

    let report = match run_lookup(store.as_ref(), &aggregator).await {
        Ok(report) => report,
        Err(StoreError::SourceNotFound(path)) => {
            eprintln!("{} {} was not found.", "ERROR:".red().bold(), path.display());
            process::exit(1);
        }
        Err(StoreError::OutputLocked(path)) => {
            eprintln!(
                "{} {} is open in another program. Close it and run again.",
                "ERROR:".red().bold(),
                path.display()
            );
            process::exit(1);
        }
        Err(err) => return Err(err).with_context(|| format!("Lookup failed for {}", store.describe())),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report.summary())?);
    } else {
        print_report(&report, config.lookup.run_timeout());
    }

    Ok(())
}

fn print_report(report: &RunReport, run_timeout: Option<Duration>) {
    if report.is_empty() {
        println!("{} No input rows were found.", "WARNING:".yellow().bold());
        return;
    }

    println!(
        "\n{} {} rows, {} registered, {} not registered ({} numbers in {} batches)",
        "Result:".cyan().bold(),
        report.rows,
        report.registered,
        report.rows - report.registered,
        report.requested,
        report.batches
    );

    if !report.skipped_rows.is_empty() {
        println!(
            "\n{} {} rows have a malformed registration number:",
            "Skipped:".yellow().bold(),
            report.skipped_rows.len()
        );
        for skipped in &report.skipped_rows {
            println!(
                "  row {} ({}): {}",
                skipped.row + 1,
                skipped.display_name,
                skipped.error
            );
        }
    }

    if !report.failures.is_empty() {
        println!(
            "\n{} {} batches could not be looked up:",
            "Failed:".red().bold(),
            report.failures.len()
        );
        for failure in &report.failures {
            println!("  {}", failure);
        }
        if let Some(timeout) = run_timeout {
            println!("  (run timeout: {}s)", timeout.as_secs());
        }
    }

    if report.is_complete() {
        println!("\n{} Lookup completed.", "✓".green().bold());
    } else {
        println!(
            "\n{} Lookup completed with partial results.",
            "!".yellow().bold()
        );
    }
}
