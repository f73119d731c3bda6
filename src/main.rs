//! CLI entry point for the transfer-station statistics tool.
//!
//! Provides subcommands mirroring the dashboard's views: time-slot load
//! charts, the hourly intake table, quarterly/half-year/annual period
//! tables, source-district breakdowns, and CSV upload ingestion.

use std::ffi::OsStr;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Datelike, Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

use rts_stats::aggregate::{
    aggregate_categorical, aggregate_time_series, day_count, CategoricalView, TimeSeriesView,
    WeightPolicy,
};
use rts_stats::cache::CacheManager;
use rts_stats::classify::{
    hourly_slots, in_chart_scope, in_hourly_scope, is_weekend, minute_of_day, time_slot,
    HOURLY_SLOT_LABELS, TIME_SLOT_LABELS,
};
use rts_stats::fetch::{
    auth::{ApiKey, UrlParam},
    BasicClient, HttpPartitionSource, PartitionSource,
};
use rts_stats::model::{merge_records, Record, StationId};
use rts_stats::output::{
    print_json, write_categorical_csv, write_period_csv, write_series_csv,
};
use rts_stats::parser::parse_csv_upload;
use rts_stats::rollup::{period_report, Period};
use rts_stats::store::FileStore;

const DEFAULT_BASE_URL: &str = "https://rts-data.example.hk/records";

#[derive(Parser)]
#[command(name = "rts_stats")]
#[command(about = "A tool to analyze transfer-station weighbridge records", long_about = None)]
struct Cli {
    /// Directory backing the persistent record store
    #[arg(long, global = true, default_value = "data")]
    data_dir: String,

    /// Base URL hosting the yearly partition files
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
enum DayFilter {
    #[default]
    All,
    Weekday,
    Weekend,
}

impl std::fmt::Display for DayFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            DayFilter::All => "all",
            DayFilter::Weekday => "weekday",
            DayFilter::Weekend => "weekend",
        })
    }
}

impl DayFilter {
    fn accepts(&self, record: &Record) -> bool {
        match self {
            DayFilter::All => true,
            DayFilter::Weekday => !is_weekend(record.date),
            DayFilter::Weekend => is_weekend(record.date),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum PeriodArg {
    Q1,
    Q2,
    Q3,
    Q4,
    H1,
    H2,
    Annual,
}

impl From<PeriodArg> for Period {
    fn from(arg: PeriodArg) -> Self {
        match arg {
            PeriodArg::Q1 => Period::Q1,
            PeriodArg::Q2 => Period::Q2,
            PeriodArg::Q3 => Period::Q3,
            PeriodArg::Q4 => Period::Q4,
            PeriodArg::H1 => Period::H1,
            PeriodArg::H2 => Period::H2,
            PeriodArg::Annual => Period::Annual,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Time-slot load/tonnage series for a station and date range
    Report {
        /// Station code (IETS, IWTS, NLTS, NWNTTS, OITF, STTS, WKTS)
        station: String,

        /// Range start, YYYY-MM-DD (defaults to the current year)
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Range end, YYYY-MM-DD
        #[arg(long)]
        to: Option<NaiveDate>,

        /// Restrict to weekdays or weekends
        #[arg(long, value_enum, default_value_t)]
        days: DayFilter,

        /// CSV file to write instead of printing JSON
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Hourly intake table for a station and date range
    Hourly {
        station: String,

        #[arg(long)]
        from: Option<NaiveDate>,

        #[arg(long)]
        to: Option<NaiveDate>,

        #[arg(short, long)]
        output: Option<String>,
    },
    /// Quarterly/half-year/annual summary table
    Period {
        station: String,

        /// Which period to summarize
        #[arg(value_enum)]
        period: PeriodArg,

        /// Pin to one year; otherwise the three trailing years with
        /// data are reported independently
        #[arg(long)]
        year: Option<i32>,

        #[arg(short, long)]
        output: Option<String>,
    },
    /// Source-district breakdown
    Districts {
        station: String,

        #[arg(long)]
        from: Option<NaiveDate>,

        #[arg(long)]
        to: Option<NaiveDate>,

        #[arg(short, long)]
        output: Option<String>,
    },
    /// Vehicle-task breakdown
    Tasks {
        station: String,

        #[arg(long)]
        from: Option<NaiveDate>,

        #[arg(long)]
        to: Option<NaiveDate>,

        #[arg(short, long)]
        output: Option<String>,
    },
    /// Merge a CSV upload into a station's yearly partition
    Ingest {
        station: String,

        /// Year of the partition to merge into
        year: i32,

        /// CSV file with the wire columns
        file: String,
    },
    /// Drop every cached partition from the persistent store
    ClearCache,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/rts_stats.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("rts_stats.log"));

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

    let base_url = cli
        .base_url
        .clone()
        .or_else(|| std::env::var("DATA_BASE_URL").ok())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    let store = Arc::new(FileStore::new(&cli.data_dir));
    let cache = Arc::new(CacheManager::new(store, build_source(&base_url)));

    match cli.command {
        Commands::Report {
            station,
            from,
            to,
            days,
            output,
        } => {
            let station: StationId = station.parse()?;
            let records = in_range(
                cache.load_range(station, from, to).await?,
                from,
                to,
            );
            let records: Vec<Record> = records
                .into_iter()
                .filter(in_chart_scope)
                .filter(|r| days.accepts(r))
                .collect();

            let policy = WeightPolicy::detect(&records);
            let series = aggregate_time_series(
                &records,
                &TIME_SLOT_LABELS,
                |r| minute_of_day(&r.intake_time).and_then(time_slot),
                &policy,
            );
            let view = TimeSeriesView::build(series, day_count(from, to));

            info!(%station, records = records.len(), "time-slot series ready");
            match output {
                Some(path) => write_series_csv(&path, &view)?,
                None => print_json(&view)?,
            }
        }
        Commands::Hourly {
            station,
            from,
            to,
            output,
        } => {
            let station: StationId = station.parse()?;
            let records = in_range(
                cache.load_range(station, from, to).await?,
                from,
                to,
            );
            let records: Vec<Record> =
                records.into_iter().filter(in_hourly_scope).collect();

            let policy = WeightPolicy::detect(&records);
            let series = aggregate_time_series(
                &records,
                &HOURLY_SLOT_LABELS,
                |r| {
                    minute_of_day(&r.intake_time)
                        .map(hourly_slots)
                        .unwrap_or_default()
                },
                &policy,
            );
            let view = TimeSeriesView::build(series, day_count(from, to));

            info!(%station, records = records.len(), "hourly table ready");
            match output {
                Some(path) => write_series_csv(&path, &view)?,
                None => print_json(&view)?,
            }
        }
        Commands::Period {
            station,
            period,
            year,
            output,
        } => {
            let station: StationId = station.parse()?;
            let years = match year {
                Some(year) => vec![year],
                None => {
                    let current = Local::now().year();
                    vec![current, current - 1, current - 2]
                }
            };

            let mut per_year = Vec::new();
            for year in years {
                per_year.push((year, cache.load(station, year).await));
            }

            let report = period_report(period.into(), &per_year);
            if report.is_empty() {
                info!(%station, ?period, "no data for any candidate year");
            }

            match output {
                Some(path) => {
                    for summary in &report {
                        let path = if report.len() == 1 {
                            path.clone()
                        } else {
                            suffix_path(&path, summary.year)
                        };
                        write_period_csv(&path, summary)?;
                    }
                }
                None => print_json(&report)?,
            }
        }
        Commands::Districts {
            station,
            from,
            to,
            output,
        } => {
            let station: StationId = station.parse()?;
            let records = in_range(
                cache.load_range(station, from, to).await?,
                from,
                to,
            );
            let records: Vec<Record> =
                records.into_iter().filter(in_chart_scope).collect();

            let policy = WeightPolicy::detect(&records);
            let view = CategoricalView::from(aggregate_categorical(
                &records,
                |r| {
                    let district = r.source_district.trim();
                    (!district.is_empty()).then(|| district.to_string())
                },
                &policy,
            ));

            info!(%station, categories = view.categories.len(), "district breakdown ready");
            match output {
                Some(path) => write_categorical_csv(&path, &view)?,
                None => print_json(&view)?,
            }
        }
        Commands::Tasks {
            station,
            from,
            to,
            output,
        } => {
            let station: StationId = station.parse()?;
            let records = in_range(
                cache.load_range(station, from, to).await?,
                from,
                to,
            );
            let records: Vec<Record> = records
                .into_iter()
                .filter(|r| r.delivery_status.is_completed())
                .collect();

            let policy = WeightPolicy::detect(&records);
            let view = CategoricalView::from(aggregate_categorical(
                &records,
                |r| {
                    let task = r.vehicle_task.trim();
                    (!task.is_empty()).then(|| task.to_string())
                },
                &policy,
            ));

            info!(%station, categories = view.categories.len(), "task breakdown ready");
            match output {
                Some(path) => write_categorical_csv(&path, &view)?,
                None => print_json(&view)?,
            }
        }
        Commands::Ingest {
            station,
            year,
            file,
        } => {
            let station: StationId = station.parse()?;
            let bytes = std::fs::read(&file)
                .with_context(|| format!("reading upload file {file}"))?;
            let incoming = parse_csv_upload(station, &bytes)?;

            let existing = cache.load(station, year).await;
            let before = existing.len();
            let merged = merge_records(existing, incoming);
            let added = merged.len() - before;

            cache.save(station, year, merged).await?;
            info!(%station, year, before, added, "upload merged");
            println!("{before} existing, {added} new records merged");
        }
        Commands::ClearCache => {
            cache.clear().await?;
            info!("persistent store cleared");
        }
    }

    Ok(())
}

/// Builds the partition source, wrapping the HTTP client in an auth
/// decorator when the data host requires a key.
fn build_source(base_url: &str) -> Arc<dyn PartitionSource> {
    let key = std::env::var("DATA_API_KEY").ok();
    let mode = std::env::var("DATA_API_KEY_MODE").unwrap_or_default();

    match key {
        Some(key) if mode == "query" => {
            let param_name =
                std::env::var("DATA_API_KEY_PARAM").unwrap_or_else(|_| "key".to_string());
            Arc::new(HttpPartitionSource::new(
                UrlParam {
                    inner: BasicClient::new(),
                    param_name,
                    key,
                },
                base_url,
            ))
        }
        Some(key) => Arc::new(HttpPartitionSource::new(
            ApiKey::bearer(BasicClient::new(), key),
            base_url,
        )),
        None => Arc::new(HttpPartitionSource::new(BasicClient::new(), base_url)),
    }
}

/// Keeps only records inside the inclusive date range, when one is set.
fn in_range(records: Vec<Record>, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Vec<Record> {
    match (from, to) {
        (Some(from), Some(to)) => records
            .into_iter()
            .filter(|r| r.date >= from && r.date <= to)
            .collect(),
        _ => records,
    }
}

/// `report.csv` → `report-2024.csv` for multi-year period exports.
fn suffix_path(path: &str, year: i32) -> String {
    match path.rsplit_once('.') {
        Some((stem, ext)) => format!("{stem}-{year}.{ext}"),
        None => format!("{path}-{year}"),
    }
}
