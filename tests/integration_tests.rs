//! End-to-end pipeline tests over an on-disk fixture partition.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use rts_stats::aggregate::{aggregate_time_series, WeightPolicy};
use rts_stats::cache::CacheManager;
use rts_stats::classify::{hourly_slots, in_hourly_scope, minute_of_day, HOURLY_SLOT_LABELS};
use rts_stats::error::FetchError;
use rts_stats::fetch::PartitionSource;
use rts_stats::model::{merge_records, Record, StationId};
use rts_stats::parser::parse_partition;
use rts_stats::rollup::{summarize_period, Period};
use rts_stats::store::FileStore;

const FIXTURE: &[u8] = include_bytes!("fixtures/wkts2025.json");

fn fixture_records() -> Vec<Record> {
    parse_partition(StationId::Wkts, FIXTURE).expect("fixture parses")
}

/// Serves the fixture for (WKTS, 2025) and nothing else, counting
/// fetches.
struct FixtureSource {
    fetches: AtomicUsize,
}

impl FixtureSource {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            fetches: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl PartitionSource for FixtureSource {
    async fn fetch(
        &self,
        station: StationId,
        year: i32,
    ) -> Result<Option<Vec<Record>>, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if station == StationId::Wkts && year == 2025 {
            Ok(Some(fixture_records()))
        } else {
            Ok(None)
        }
    }
}

fn temp_store(name: &str) -> (FileStore, std::path::PathBuf) {
    let dir = std::env::temp_dir().join(format!("rts_stats_it_{name}"));
    let _ = std::fs::remove_dir_all(&dir);
    (FileStore::new(&dir), dir)
}

#[test]
fn test_fixture_parses_completely() {
    let records = fixture_records();
    assert_eq!(records.len(), 9);
    // The cancelled delivery is parsed but not completed.
    assert_eq!(
        records
            .iter()
            .filter(|r| r.delivery_status.is_completed())
            .count(),
        8
    );
}

#[test]
fn test_full_rollup_pipeline() {
    let records = fixture_records();
    let summary = summarize_period(Period::Q1, 2025, &records).expect("Q1 has data");

    assert_eq!(summary.total_days, 2);
    assert_eq!(summary.months.len(), 1);
    assert_eq!(summary.months[0].month, 3);

    let t = &summary.totals;
    assert_eq!(t.public_normal_loads, 3);
    assert!((t.public_normal_tonnes - 6.5).abs() < 1e-6);
    assert_eq!(t.domestic_waste_loads, 1);
    assert_eq!(t.gully_waste_loads, 1);
    assert!((t.gully_waste_tonnes - 1.2).abs() < 1e-6);
    assert_eq!(t.private_normal_loads, 1);
    assert_eq!(t.grease_trap_loads, 1);
    assert_eq!(t.extended_loads, 2);
    assert_eq!(t.daily_total_loads, 6);
    assert!((t.daily_total_tonnes - 12.8).abs() < 1e-6);

    // The intake split also counts the P99 with an unusable time.
    assert_eq!(t.total_msw_loads, 7);
    assert_eq!(t.total_waste_intake_loads, 8);
    assert!((t.total_waste_intake_tonnes - 14.4).abs() < 1e-6);

    // Averages are per data day, not per calendar day.
    assert!((summary.daily_averages.daily_total_loads - 3.0).abs() < 1e-9);
}

#[test]
fn test_hourly_table_counts_overlap_slot() {
    let records: Vec<Record> = fixture_records()
        .into_iter()
        .filter(in_hourly_scope)
        .collect();
    assert_eq!(records.len(), 7);

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

    assert_eq!(series.counts_per_slot[0], 2); // 0430-0659
    assert_eq!(series.counts_per_slot[2], 2); // 0800-0859
    assert_eq!(series.counts_per_slot[7], 1); // 1300-1359
    // 23:45 lands in both the hourly slot and the overnight slot.
    assert_eq!(series.counts_per_slot[17], 1);
    assert_eq!(series.counts_per_slot[18], 1);
    assert_eq!(series.counts_per_slot.iter().sum::<u64>(), 7);
}

#[tokio::test]
async fn test_cache_fetches_once_and_persists() {
    let (store, dir) = temp_store("persist");
    let store = Arc::new(store);
    let source = FixtureSource::new();
    let cache = CacheManager::new(store.clone(), source.clone());

    let records = cache.load(StationId::Wkts, 2025).await;
    assert_eq!(records.len(), 9);
    assert_eq!(source.fetches.load(Ordering::SeqCst), 1);

    // A fresh process (new in-memory cache, same store) is served from
    // the persistent tier without another fetch.
    let source2 = FixtureSource::new();
    let cache2 = CacheManager::new(store, source2.clone());
    let records2 = cache2.load(StationId::Wkts, 2025).await;

    assert_eq!(records2.len(), 9);
    assert_eq!(source2.fetches.load(Ordering::SeqCst), 0);

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn test_merge_and_save_is_idempotent() {
    let (store, dir) = temp_store("merge");
    let source = FixtureSource::new();
    let cache = CacheManager::new(Arc::new(store), source);

    let first = merge_records(Vec::new(), fixture_records());
    cache
        .save(StationId::Wkts, 2025, first.clone())
        .await
        .unwrap();

    // Re-ingesting the same upload adds nothing.
    let existing = cache.load(StationId::Wkts, 2025).await;
    let merged = merge_records(existing, fixture_records());
    assert_eq!(merged.len(), first.len());

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn test_missing_year_is_empty_not_error() {
    let (store, dir) = temp_store("missing");
    let source = FixtureSource::new();
    let cache = CacheManager::new(Arc::new(store), source);

    let records = cache.load(StationId::Iets, 2030).await;
    assert!(records.is_empty());

    let _ = std::fs::remove_dir_all(&dir);
}
