//! Layered read/write path for partitioned record data.
//!
//! Read tiers: in-memory entry (subject to a freshness window) → record
//! store → network fetch, with write-back of non-empty network results.
//! Absence of data at every tier is a normal state and returns an empty
//! sequence, never an error. At most one fill is in flight per partition
//! key; concurrent callers await the same result.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{Datelike, Local, NaiveDate};
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, warn};

use crate::error::DataError;
use crate::fetch::PartitionSource;
use crate::model::{partition_key, Record, StationId};
use crate::store::RecordStore;

/// How long an in-memory entry stays valid before the next access
/// refills it from the store/network tiers.
pub const FRESHNESS_WINDOW: Duration = Duration::from_secs(5 * 60);

struct CacheEntry {
    records: Vec<Record>,
    last_updated: Instant,
}

/// Single read/write path for partition data. Constructed once at
/// process start and shared by reference; the only mutator of the
/// in-memory map and the store connection.
pub struct CacheManager {
    store: Arc<dyn RecordStore>,
    source: Arc<dyn PartitionSource>,
    freshness: Duration,
    entries: Mutex<HashMap<String, CacheEntry>>,
    inflight: Mutex<HashMap<String, Arc<OnceCell<Vec<Record>>>>>,
}

impl CacheManager {
    pub fn new(store: Arc<dyn RecordStore>, source: Arc<dyn PartitionSource>) -> Self {
        Self::with_freshness(store, source, FRESHNESS_WINDOW)
    }

    /// Like [`CacheManager::new`] with an explicit freshness window.
    pub fn with_freshness(
        store: Arc<dyn RecordStore>,
        source: Arc<dyn PartitionSource>,
        freshness: Duration,
    ) -> Self {
        Self {
            store,
            source,
            freshness,
            entries: Mutex::new(HashMap::new()),
            inflight: Mutex::new(HashMap::new()),
        }
    }

    /// Loads one `(station, year)` partition through the tier chain.
    ///
    /// Tier failures (store unavailable, network error, malformed
    /// payload) are logged and fall through to the next tier; a
    /// partition with no data anywhere yields an empty vec.
    pub async fn load(&self, station: StationId, year: i32) -> Vec<Record> {
        let key = partition_key(station, year);

        if let Some(records) = self.fresh_entry(&key).await {
            debug!(%key, "cache hit");
            return records;
        }

        // Coalesce concurrent fills for the same key onto one cell.
        let cell = {
            let mut inflight = self.inflight.lock().await;
            inflight
                .entry(key.clone())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };

        let records = cell
            .get_or_init(|| self.fill(station, year, &key))
            .await
            .clone();

        // Retire the cell so a later stale read starts a new fill.
        let mut inflight = self.inflight.lock().await;
        if let Some(current) = inflight.get(&key) {
            if Arc::ptr_eq(current, &cell) {
                inflight.remove(&key);
            }
        }

        records
    }

    /// Loads every year touched by `[start, end]` (inclusive) and
    /// concatenates the results in ascending-year order. Years are
    /// fetched concurrently; one empty year does not affect the others.
    /// With no range given, loads the current year only.
    pub async fn load_range(
        self: &Arc<Self>,
        station: StationId,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<Record>, DataError> {
        let (Some(start), Some(end)) = (start, end) else {
            let year = Local::now().year();
            return Ok(self.load(station, year).await);
        };

        if start > end {
            return Err(DataError::InvalidRange(format!("{start} > {end}")));
        }

        let mut handles = Vec::new();
        for year in start.year()..=end.year() {
            let this = Arc::clone(self);
            handles.push((
                year,
                tokio::spawn(async move { this.load(station, year).await }),
            ));
        }

        let mut out = Vec::new();
        for (year, handle) in handles {
            match handle.await {
                Ok(records) => out.extend(records),
                Err(e) => warn!(year, error = %e, "year load task failed"),
            }
        }

        Ok(out)
    }

    /// Writes a partition through to both the in-memory entry and the
    /// store, unconditionally replacing whatever was there. Callers are
    /// responsible for pre-merging/deduplicating.
    pub async fn save(
        &self,
        station: StationId,
        year: i32,
        records: Vec<Record>,
    ) -> Result<(), DataError> {
        let key = partition_key(station, year);
        self.store.put(&key, &records).await?;
        self.remember(&key, records).await;
        Ok(())
    }

    /// Drops every in-memory entry and every stored partition.
    pub async fn clear(&self) -> Result<(), DataError> {
        self.entries.lock().await.clear();
        self.store.clear().await?;
        Ok(())
    }

    async fn fresh_entry(&self, key: &str) -> Option<Vec<Record>> {
        let entries = self.entries.lock().await;
        let entry = entries.get(key)?;
        if entry.last_updated.elapsed() < self.freshness {
            Some(entry.records.clone())
        } else {
            None
        }
    }

    async fn remember(&self, key: &str, records: Vec<Record>) {
        self.entries.lock().await.insert(
            key.to_string(),
            CacheEntry {
                records,
                last_updated: Instant::now(),
            },
        );
    }

    /// Store tier, then network tier with store write-back. Every
    /// failure here downgrades to "no data" — the outcome is always a
    /// record sequence, possibly empty, memorized with a fresh
    /// timestamp. Empty results are never written back to the store.
    async fn fill(&self, station: StationId, year: i32, key: &str) -> Vec<Record> {
        match self.store.get(key).await {
            Ok(Some(records)) if !records.is_empty() => {
                debug!(key, count = records.len(), "filled from store");
                self.remember(key, records.clone()).await;
                return records;
            }
            Ok(_) => {}
            Err(e) => warn!(key, error = %e, "store read failed, trying network"),
        }

        let records = match self.source.fetch(station, year).await {
            Ok(Some(records)) => {
                if !records.is_empty() {
                    if let Err(e) = self.store.put(key, &records).await {
                        warn!(key, error = %e, "store write-back failed");
                    }
                }
                records
            }
            Ok(None) => {
                debug!(key, "no partition at source");
                Vec::new()
            }
            Err(e) => {
                warn!(key, error = %e, "network fetch failed");
                Vec::new()
            }
        };

        self.remember(key, records.clone()).await;
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{FetchError, StoreError};
    use crate::model::DeliveryStatus;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn record_for(year: i32) -> Record {
        Record {
            station: StationId::Wkts,
            date: NaiveDate::from_ymd_opt(year, 6, 1).unwrap(),
            intake_time: "08:00:00".to_string(),
            delivery_status: DeliveryStatus::Completed,
            vehicle_task: "C31 垃圾收集".to_string(),
            waste_type: "D01.00".to_string(),
            weight: Some(2.0),
            source_district: "油尖旺區".to_string(),
        }
    }

    #[derive(Default)]
    struct MockStore {
        data: Mutex<HashMap<String, Vec<Record>>>,
        gets: AtomicUsize,
        puts: AtomicUsize,
    }

    #[async_trait]
    impl RecordStore for MockStore {
        async fn get(&self, key: &str) -> Result<Option<Vec<Record>>, StoreError> {
            self.gets.fetch_add(1, Ordering::SeqCst);
            Ok(self.data.lock().await.get(key).cloned())
        }

        async fn put(&self, key: &str, records: &[Record]) -> Result<(), StoreError> {
            self.puts.fetch_add(1, Ordering::SeqCst);
            self.data
                .lock()
                .await
                .insert(key.to_string(), records.to_vec());
            Ok(())
        }

        async fn delete(&self, key: &str) -> Result<(), StoreError> {
            self.data.lock().await.remove(key);
            Ok(())
        }

        async fn clear(&self) -> Result<(), StoreError> {
            self.data.lock().await.clear();
            Ok(())
        }
    }

    struct MockSource {
        fetches: AtomicUsize,
        records_per_year: usize,
        delay: Duration,
        fail: bool,
    }

    impl MockSource {
        fn with_records(records_per_year: usize) -> Self {
            Self {
                fetches: AtomicUsize::new(0),
                records_per_year,
                delay: Duration::ZERO,
                fail: false,
            }
        }

        fn not_found() -> Self {
            Self::with_records(0)
        }
    }

    #[async_trait]
    impl PartitionSource for MockSource {
        async fn fetch(
            &self,
            _station: StationId,
            year: i32,
        ) -> Result<Option<Vec<Record>>, FetchError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.delay > Duration::ZERO {
                tokio::time::sleep(self.delay).await;
            }
            if self.fail {
                return Err(FetchError::Status(500));
            }
            if self.records_per_year == 0 {
                return Ok(None);
            }
            Ok(Some(vec![record_for(year); self.records_per_year]))
        }
    }

    fn manager(store: Arc<MockStore>, source: Arc<MockSource>) -> Arc<CacheManager> {
        Arc::new(CacheManager::new(store, source))
    }

    #[tokio::test]
    async fn test_second_load_within_window_does_no_io() {
        let store = Arc::new(MockStore::default());
        let source = Arc::new(MockSource::with_records(2));
        let cache = manager(store.clone(), source.clone());

        let first = cache.load(StationId::Wkts, 2025).await;
        let second = cache.load(StationId::Wkts, 2025).await;

        assert_eq!(first.len(), 2);
        assert_eq!(second, first);
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
        assert_eq!(store.gets.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_elapsed_window_triggers_refill() {
        let store = Arc::new(MockStore::default());
        let source = Arc::new(MockSource::not_found());
        let cache = Arc::new(CacheManager::with_freshness(
            store.clone(),
            source.clone(),
            Duration::ZERO,
        ));

        cache.load(StationId::Iets, 2025).await;
        cache.load(StationId::Iets, 2025).await;

        assert_eq!(source.fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_store_tier_satisfies_load_without_fetch() {
        let store = Arc::new(MockStore::default());
        store
            .data
            .lock()
            .await
            .insert("STTS2024".to_string(), vec![record_for(2024)]);
        let source = Arc::new(MockSource::with_records(5));
        let cache = manager(store, source.clone());

        let records = cache.load(StationId::Stts, 2024).await;

        assert_eq!(records.len(), 1);
        assert_eq!(source.fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_network_result_written_back_to_store() {
        let store = Arc::new(MockStore::default());
        let source = Arc::new(MockSource::with_records(3));
        let cache = manager(store.clone(), source);

        cache.load(StationId::Nlts, 2025).await;

        assert_eq!(store.puts.load(Ordering::SeqCst), 1);
        assert_eq!(store.data.lock().await.get("NLTS2025").unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_missing_partition_is_empty_and_not_persisted() {
        // Scenario: network 404 for a future year.
        let store = Arc::new(MockStore::default());
        let source = Arc::new(MockSource::not_found());
        let cache = manager(store.clone(), source);

        let records = cache.load(StationId::Iets, 2030).await;

        assert!(records.is_empty());
        assert_eq!(store.puts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_fetch_failure_downgrades_to_empty() {
        let store = Arc::new(MockStore::default());
        let source = Arc::new(MockSource {
            fetches: AtomicUsize::new(0),
            records_per_year: 1,
            delay: Duration::ZERO,
            fail: true,
        });
        let cache = manager(store.clone(), source);

        let records = cache.load(StationId::Oitf, 2025).await;

        assert!(records.is_empty());
        assert_eq!(store.puts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_concurrent_loads_coalesce_to_one_fetch() {
        let store = Arc::new(MockStore::default());
        let source = Arc::new(MockSource {
            fetches: AtomicUsize::new(0),
            records_per_year: 2,
            delay: Duration::from_millis(50),
            fail: false,
        });
        let cache = manager(store, source.clone());

        let (a, b, c) = tokio::join!(
            cache.load(StationId::Wkts, 2025),
            cache.load(StationId::Wkts, 2025),
            cache.load(StationId::Wkts, 2025),
        );

        assert_eq!(a.len(), 2);
        assert_eq!(b, a);
        assert_eq!(c, a);
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_load_range_spans_years_in_order() {
        // Scenario: 15 Dec 2024 – 10 Jan 2025 touches exactly two years.
        let store = Arc::new(MockStore::default());
        let source = Arc::new(MockSource::with_records(1));
        let cache = manager(store, source.clone());

        let records = cache
            .load_range(
                StationId::Wkts,
                NaiveDate::from_ymd_opt(2024, 12, 15),
                NaiveDate::from_ymd_opt(2025, 1, 10),
            )
            .await
            .unwrap();

        assert_eq!(source.fetches.load(Ordering::SeqCst), 2);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].date.year(), 2024);
        assert_eq!(records[1].date.year(), 2025);
    }

    #[tokio::test]
    async fn test_load_range_rejects_inverted_range() {
        let store = Arc::new(MockStore::default());
        let source = Arc::new(MockSource::not_found());
        let cache = manager(store, source);

        let err = cache
            .load_range(
                StationId::Wkts,
                NaiveDate::from_ymd_opt(2025, 2, 1),
                NaiveDate::from_ymd_opt(2025, 1, 1),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, DataError::InvalidRange(_)));
    }

    #[tokio::test]
    async fn test_save_writes_through() {
        let store = Arc::new(MockStore::default());
        let source = Arc::new(MockSource::not_found());
        let cache = manager(store.clone(), source.clone());

        cache
            .save(StationId::Wkts, 2025, vec![record_for(2025)])
            .await
            .unwrap();

        assert_eq!(store.puts.load(Ordering::SeqCst), 1);
        // The saved partition is served from memory without re-reading.
        let records = cache.load(StationId::Wkts, 2025).await;
        assert_eq!(records.len(), 1);
        assert_eq!(store.gets.load(Ordering::SeqCst), 0);
        assert_eq!(source.fetches.load(Ordering::SeqCst), 0);
    }
}
