//! CLI entry point for the PUMS vehicle tabulator.
//!
//! Provides subcommands for fetching household microdata from the Census
//! API and for building the vehicle-availability spreadsheet report from a
//! cached extract or directly from an API URL.

mod infra;
mod services;

use crate::infra::census::client::CensusPumsClient;
use crate::services::microdata_api::MicrodataApi;
use anyhow::Result;
use clap::{Parser, Subcommand};
use pums_vehicle_tabulator::{
    fetch::{BasicClient, auth::UrlParam, fetch_bytes},
    loader::{parse_api_table, read_records_csv, write_records_csv},
    model::HouseholdRecord,
    normalize::normalize,
    report::{write_table_csv, write_workbook},
    tabulate::build_report_tables,
};
use std::ffi::OsStr;
use std::path::Path;
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "pums_vehicle_tabulator")]
#[command(about = "Tabulates household vehicle availability from census microdata", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch raw household rows from the Census API and cache them as CSV
    Fetch {
        /// CSV file to write raw rows to
        #[arg(short, long, default_value = "data/households.csv")]
        output: String,

        /// ACS 1-year sample year
        #[arg(short, long, default_value_t = 2023)]
        year: u16,

        /// State FIPS code
        #[arg(short, long, default_value = "41")]
        state: String,

        /// Comma-separated PUMA codes, or "*" for all PUMAs in the state
        #[arg(short, long, default_value = "*")]
        pumas: String,
    },
    /// Build the vehicle-availability report
    Report {
        /// Path to a cached CSV extract, or a Census API URL to fetch
        #[arg(value_name = "FILE_OR_URL")]
        source: String,

        /// Spreadsheet file to write
        #[arg(short, long, default_value = "vehicles_by_income.xlsx")]
        output: String,

        /// Directory to also write each table as CSV
        #[arg(long)]
        csv_dir: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/pums_vehicle_tabulator.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("pums_vehicle_tabulator.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse().unwrap()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse().unwrap()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Fetch {
            output,
            year,
            state,
            pumas,
        } => {
            let api_key = std::env::var("CENSUS_API_KEY").ok();
            if api_key.is_none() {
                info!("CENSUS_API_KEY not set, fetching without a key");
            }

            let client = CensusPumsClient::new(year, state, pumas, api_key);
            let records = client.fetch_households().await?;
            info!(rows = records.len(), "Microdata fetched");

            if let Some(parent) = Path::new(&output).parent()
                && !parent.as_os_str().is_empty()
            {
                std::fs::create_dir_all(parent)?;
            }
            write_records_csv(&output, &records)?;
            info!(path = %output, "Raw rows cached");
        }
        Commands::Report {
            source,
            output,
            csv_dir,
        } => {
            let records = load_records(&source).await?;
            info!(rows = records.len(), "Raw rows loaded");

            let normalized = normalize(&records)?;
            info!(households = normalized.len(), "Households normalized");

            let tables = build_report_tables(&normalized)?;

            if let Some(dir) = csv_dir {
                std::fs::create_dir_all(&dir)?;
                write_table_csv(&format!("{dir}/renter_by_puma.csv"), &tables.renter_by_subarea)?;
                write_table_csv(&format!("{dir}/renter_summary.csv"), &tables.renter_rollup)?;
                write_table_csv(&format!("{dir}/owner_by_puma.csv"), &tables.owner_by_subarea)?;
                write_table_csv(&format!("{dir}/owner_summary.csv"), &tables.owner_rollup)?;
            }

            write_workbook(&output, &tables)?;
            info!(path = %output, "Report complete");
        }
    }

    Ok(())
}

/// Loads raw rows from a local CSV cache or fetches them from an API URL.
#[tracing::instrument(fields(source = %source))]
async fn load_records(source: &String) -> Result<Vec<HouseholdRecord>> {
    let records = if source.starts_with("http") {
        let bytes = match std::env::var("CENSUS_API_KEY") {
            Ok(key) => {
                let client = UrlParam {
                    inner: BasicClient::new(),
                    param_name: "key".to_string(),
                    key,
                };
                fetch_bytes(&client, source).await?
            }
            Err(_) => fetch_bytes(&BasicClient::new(), source).await?,
        };
        parse_api_table(&bytes)?
    } else {
        read_records_csv(source)?
    };
    Ok(records)
}
