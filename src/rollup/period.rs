//! Month and period composition over daily summaries.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use tracing::debug;

use super::daily::daily_summary;
use super::types::{DayAggregate, DayTotals, MonthSummary, Period, PeriodSummary};
use crate::aggregate::WeightPolicy;
use crate::model::Record;

/// Sums daily aggregates into a month row. `None` for a month with no
/// days — an empty month never contributes a zero row.
pub fn month_summary(year: i32, month: u32, days: &[DayAggregate]) -> Option<MonthSummary> {
    if days.is_empty() {
        return None;
    }

    let mut totals = DayTotals::default();
    for day in days {
        totals.accumulate(&day.totals);
    }

    Some(MonthSummary {
        year,
        month,
        day_count: days.len() as u64,
        totals,
    })
}

/// Groups a record set down to one month's daily summaries and sums
/// them. Records outside `(year, month)` are ignored.
pub fn summarize_month(
    year: i32,
    month: u32,
    records: &[Record],
    policy: &WeightPolicy,
) -> Option<MonthSummary> {
    let mut by_day: BTreeMap<NaiveDate, Vec<&Record>> = BTreeMap::new();
    for record in records {
        if record.date.year() == year && record.date.month() == month {
            by_day.entry(record.date).or_default().push(record);
        }
    }

    let days: Vec<DayAggregate> = by_day
        .into_iter()
        .map(|(date, day_records)| {
            let owned: Vec<Record> = day_records.into_iter().cloned().collect();
            daily_summary(date, &owned, policy)
        })
        .collect();

    month_summary(year, month, &days)
}

/// Sums month rows into a period table. `None` when the period has no
/// data days at all — the caller renders that as "no data", never as a
/// zero-average table.
pub fn period_summary(period: Period, year: i32, months: Vec<MonthSummary>) -> Option<PeriodSummary> {
    let total_days: u64 = months.iter().map(|m| m.day_count).sum();
    if total_days == 0 {
        return None;
    }

    let mut totals = DayTotals::default();
    for month in &months {
        totals.accumulate(&month.totals);
    }
    let daily_averages = totals.averages(total_days);

    Some(PeriodSummary {
        period,
        year,
        total_days,
        months,
        totals,
        daily_averages,
    })
}

/// Builds the full period table for one year from that year's record
/// set. The weight policy is detected once for the whole run.
pub fn summarize_period(period: Period, year: i32, records: &[Record]) -> Option<PeriodSummary> {
    let policy = WeightPolicy::detect(records);

    let months: Vec<MonthSummary> = period
        .months()
        .filter_map(|month| summarize_month(year, month, records, &policy))
        .collect();

    period_summary(period, year, months)
}

/// Evaluates the period independently for each `(year, records)` pair
/// and keeps only the years that have data. Years are never merged.
pub fn period_report(period: Period, per_year: &[(i32, Vec<Record>)]) -> Vec<PeriodSummary> {
    per_year
        .iter()
        .filter_map(|(year, records)| {
            let summary = summarize_period(period, *year, records);
            if summary.is_none() {
                debug!(year, ?period, "no data for period");
            }
            summary
        })
        .collect()
}
