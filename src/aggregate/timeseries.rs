//! Time-bucketed load and tonnage series.

use chrono::NaiveDate;
use serde::Serialize;

use super::weight::WeightPolicy;
use crate::model::Record;

/// Per-slot counts and weight sums for one bucketing scheme.
#[derive(Debug, Serialize)]
pub struct TimeSeries {
    pub time_slots: Vec<String>,
    pub counts_per_slot: Vec<u64>,
    pub weight_per_slot: Vec<f64>,
}

/// Folds records into per-slot counts and weight sums in a single pass.
///
/// `bucket_fn` yields the slot indices a record belongs to — none for an
/// unbucketable time, one for the chart scheme, possibly two for the
/// hourly scheme (whose late-evening slots overlap).
pub fn aggregate_time_series<F, B>(
    records: &[Record],
    labels: &[&str],
    bucket_fn: F,
    policy: &WeightPolicy,
) -> TimeSeries
where
    F: Fn(&Record) -> B,
    B: IntoIterator<Item = usize>,
{
    let mut counts = vec![0u64; labels.len()];
    let mut weights = vec![0f64; labels.len()];

    for record in records {
        let weight = policy.resolve(record);
        for slot in bucket_fn(record) {
            counts[slot] += 1;
            weights[slot] += weight;
        }
    }

    TimeSeries {
        time_slots: labels.iter().map(|s| s.to_string()).collect(),
        counts_per_slot: counts,
        weight_per_slot: weights,
    }
}

/// Per-slot and headline per-day averages.
#[derive(Debug, Serialize)]
pub struct SeriesAverages {
    pub counts_per_day: Vec<f64>,
    pub weights_per_day: Vec<f64>,
    pub total_per_day: f64,
    pub weight_per_day: f64,
}

/// Number of calendar days in an inclusive range, never less than 1.
/// With no range given the series is treated as a single day.
pub fn day_count(start: Option<NaiveDate>, end: Option<NaiveDate>) -> i64 {
    match (start, end) {
        (Some(start), Some(end)) => ((end - start).num_days() + 1).max(1),
        _ => 1,
    }
}

pub fn averages_per_day(series: &TimeSeries, days: i64) -> SeriesAverages {
    let days = days.max(1) as f64;

    SeriesAverages {
        counts_per_day: series
            .counts_per_slot
            .iter()
            .map(|&c| c as f64 / days)
            .collect(),
        weights_per_day: series.weight_per_slot.iter().map(|&w| w / days).collect(),
        total_per_day: series.counts_per_slot.iter().sum::<u64>() as f64 / days,
        weight_per_day: series.weight_per_slot.iter().sum::<f64>() / days,
    }
}

/// Suggested chart axis maximum for an observed peak value: generous
/// headroom for small peaks, tighter for large ones, floor of 5. An
/// all-zero series gets a fixed axis of 10.
pub fn scale_max(observed: f64) -> f64 {
    if observed == 0.0 {
        return 10.0;
    }
    let headroom = if observed < 50.0 { 1.2 } else { 1.1 };
    (observed * headroom).ceil().max(5.0)
}

/// Complete time-series payload consumed by the presentation layer.
#[derive(Debug, Serialize)]
pub struct TimeSeriesView {
    #[serde(flatten)]
    pub series: TimeSeries,
    pub averages: SeriesAverages,
    pub scale_max: f64,
}

impl TimeSeriesView {
    pub fn build(series: TimeSeries, days: i64) -> Self {
        let averages = averages_per_day(&series, days);
        let peak = series.counts_per_slot.iter().copied().max().unwrap_or(0);
        Self {
            averages,
            scale_max: scale_max(peak as f64),
            series,
        }
    }
}
