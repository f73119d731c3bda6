//! Derived-statistics folds over filtered record sequences.
//!
//! Everything in this module is a synchronous pure computation: records
//! in, counts and sums out. Bucketing schemes come from the classifier;
//! callers pre-filter the record set (completion, station scope, date
//! range) before aggregating.

mod categorical;
mod timeseries;
mod weight;

pub use categorical::{aggregate_categorical, CategoricalView, CategoryStat};
pub use timeseries::{
    aggregate_time_series, averages_per_day, day_count, scale_max, SeriesAverages, TimeSeries,
    TimeSeriesView,
};
pub use weight::{WeightPolicy, FALLBACK_WEIGHT};
