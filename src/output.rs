//! Output formatting and export for derived statistics.
//!
//! Supports pretty-printed JSON to stdout and CSV export of the
//! time-series and period tables.

use anyhow::Result;
use serde::Serialize;
use std::fs::File;
use std::path::Path;
use tracing::debug;

use crate::aggregate::{CategoricalView, TimeSeriesView};
use crate::rollup::PeriodSummary;

/// Prints any derived view as pretty JSON to stdout.
pub fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Writes a time-series view as CSV: one row per slot with count,
/// weight sum and per-day averages.
pub fn write_series_csv(path: &str, view: &TimeSeriesView) -> Result<()> {
    let mut writer = csv::Writer::from_writer(File::create(path)?);

    writer.write_record(["time_slot", "loads", "weight", "loads_per_day", "weight_per_day"])?;

    for i in 0..view.series.time_slots.len() {
        writer.write_record([
            view.series.time_slots[i].clone(),
            view.series.counts_per_slot[i].to_string(),
            format!("{:.2}", view.series.weight_per_slot[i]),
            format!("{:.2}", view.averages.counts_per_day[i]),
            format!("{:.2}", view.averages.weights_per_day[i]),
        ])?;
    }
    writer.flush()?;

    debug!(path, "series CSV written");
    Ok(())
}

/// Writes a categorical view as CSV, in display order.
pub fn write_categorical_csv(path: &str, view: &CategoricalView) -> Result<()> {
    let mut writer = csv::Writer::from_writer(File::create(path)?);

    writer.write_record(["category", "loads", "weight"])?;
    for i in 0..view.categories.len() {
        writer.write_record([
            view.categories[i].clone(),
            view.counts[i].to_string(),
            format!("{:.2}", view.weights[i]),
        ])?;
    }
    writer.flush()?;

    debug!(path, "categorical CSV written");
    Ok(())
}

/// Writes a period table as CSV: one row per month, then a totals row
/// and a per-day averages row. Tonnage is displayed to 2 decimals.
pub fn write_period_csv(path: &str, summary: &PeriodSummary) -> Result<()> {
    let mut writer = csv::Writer::from_writer(File::create(path)?);

    writer.write_record([
        "row",
        "days",
        "domestic_loads",
        "domestic_tonnes",
        "gully_loads",
        "gully_tonnes",
        "public_normal_loads",
        "public_normal_tonnes",
        "private_normal_loads",
        "private_normal_tonnes",
        "grease_trap_loads",
        "grease_trap_tonnes",
        "daily_total_loads",
        "daily_total_tonnes",
        "total_msw_loads",
        "total_msw_tonnes",
        "total_intake_loads",
        "total_intake_tonnes",
    ])?;

    for month in &summary.months {
        let t = &month.totals;
        writer.write_record([
            format!("{}-{:02}", month.year, month.month),
            month.day_count.to_string(),
            t.domestic_waste_loads.to_string(),
            format!("{:.2}", t.domestic_waste_tonnes),
            t.gully_waste_loads.to_string(),
            format!("{:.2}", t.gully_waste_tonnes),
            t.public_normal_loads.to_string(),
            format!("{:.2}", t.public_normal_tonnes),
            t.private_normal_loads.to_string(),
            format!("{:.2}", t.private_normal_tonnes),
            t.grease_trap_loads.to_string(),
            format!("{:.2}", t.grease_trap_tonnes),
            t.daily_total_loads.to_string(),
            format!("{:.2}", t.daily_total_tonnes),
            t.total_msw_loads.to_string(),
            format!("{:.2}", t.total_msw_tonnes),
            t.total_waste_intake_loads.to_string(),
            format!("{:.2}", t.total_waste_intake_tonnes),
        ])?;
    }

    let t = &summary.totals;
    writer.write_record([
        "total".to_string(),
        summary.total_days.to_string(),
        t.domestic_waste_loads.to_string(),
        format!("{:.2}", t.domestic_waste_tonnes),
        t.gully_waste_loads.to_string(),
        format!("{:.2}", t.gully_waste_tonnes),
        t.public_normal_loads.to_string(),
        format!("{:.2}", t.public_normal_tonnes),
        t.private_normal_loads.to_string(),
        format!("{:.2}", t.private_normal_tonnes),
        t.grease_trap_loads.to_string(),
        format!("{:.2}", t.grease_trap_tonnes),
        t.daily_total_loads.to_string(),
        format!("{:.2}", t.daily_total_tonnes),
        t.total_msw_loads.to_string(),
        format!("{:.2}", t.total_msw_tonnes),
        t.total_waste_intake_loads.to_string(),
        format!("{:.2}", t.total_waste_intake_tonnes),
    ])?;

    let a = &summary.daily_averages;
    writer.write_record([
        "per_day".to_string(),
        summary.total_days.to_string(),
        format!("{:.2}", a.domestic_waste_loads),
        format!("{:.2}", a.domestic_waste_tonnes),
        format!("{:.2}", a.gully_waste_loads),
        format!("{:.2}", a.gully_waste_tonnes),
        format!("{:.2}", a.public_normal_loads),
        format!("{:.2}", a.public_normal_tonnes),
        format!("{:.2}", a.private_normal_loads),
        format!("{:.2}", a.private_normal_tonnes),
        format!("{:.2}", a.grease_trap_loads),
        format!("{:.2}", a.grease_trap_tonnes),
        format!("{:.2}", a.daily_total_loads),
        format!("{:.2}", a.daily_total_tonnes),
        format!("{:.2}", a.total_msw_loads),
        format!("{:.2}", a.total_msw_tonnes),
        format!("{:.2}", a.total_waste_intake_loads),
        format!("{:.2}", a.total_waste_intake_tonnes),
    ])?;

    writer.flush()?;

    debug!(path, "period CSV written");
    Ok(())
}
