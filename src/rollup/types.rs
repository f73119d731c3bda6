//! Data types for the daily/monthly/period tables.

use chrono::NaiveDate;
use serde::{Serialize, Serializer};

/// Tonnage values are carried unrounded through every sum and only
/// rounded to two decimals when serialized for display.
fn two_dp<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64((value * 100.0).round() / 100.0)
}

/// Loads and tonnage per category for one day (or summed over a month
/// or period — the fields are all linear, so sums of summaries equal
/// summaries of sums).
///
/// The first block is the MSW time-window split; the second is the
/// waste-intake split keyed off the task code alone. Grease trap (P97)
/// is shared by both.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DayTotals {
    pub domestic_waste_loads: u64,
    #[serde(serialize_with = "two_dp")]
    pub domestic_waste_tonnes: f64,
    pub gully_waste_loads: u64,
    #[serde(serialize_with = "two_dp")]
    pub gully_waste_tonnes: f64,
    pub extended_loads: u64,
    #[serde(serialize_with = "two_dp")]
    pub extended_tonnes: f64,
    pub public_normal_loads: u64,
    #[serde(serialize_with = "two_dp")]
    pub public_normal_tonnes: f64,
    pub private_normal_loads: u64,
    #[serde(serialize_with = "two_dp")]
    pub private_normal_tonnes: f64,
    pub grease_trap_loads: u64,
    #[serde(serialize_with = "two_dp")]
    pub grease_trap_tonnes: f64,
    pub daily_total_loads: u64,
    #[serde(serialize_with = "two_dp")]
    pub daily_total_tonnes: f64,

    pub public_am_loads: u64,
    #[serde(serialize_with = "two_dp")]
    pub public_am_tonnes: f64,
    pub public_contractor_loads: u64,
    #[serde(serialize_with = "two_dp")]
    pub public_contractor_tonnes: f64,
    pub private_msw_loads: u64,
    #[serde(serialize_with = "two_dp")]
    pub private_msw_tonnes: f64,
    pub total_msw_loads: u64,
    #[serde(serialize_with = "two_dp")]
    pub total_msw_tonnes: f64,
    pub total_waste_intake_loads: u64,
    #[serde(serialize_with = "two_dp")]
    pub total_waste_intake_tonnes: f64,
}

impl DayTotals {
    /// Field-wise accumulation.
    pub fn accumulate(&mut self, other: &DayTotals) {
        self.domestic_waste_loads += other.domestic_waste_loads;
        self.domestic_waste_tonnes += other.domestic_waste_tonnes;
        self.gully_waste_loads += other.gully_waste_loads;
        self.gully_waste_tonnes += other.gully_waste_tonnes;
        self.extended_loads += other.extended_loads;
        self.extended_tonnes += other.extended_tonnes;
        self.public_normal_loads += other.public_normal_loads;
        self.public_normal_tonnes += other.public_normal_tonnes;
        self.private_normal_loads += other.private_normal_loads;
        self.private_normal_tonnes += other.private_normal_tonnes;
        self.grease_trap_loads += other.grease_trap_loads;
        self.grease_trap_tonnes += other.grease_trap_tonnes;
        self.daily_total_loads += other.daily_total_loads;
        self.daily_total_tonnes += other.daily_total_tonnes;
        self.public_am_loads += other.public_am_loads;
        self.public_am_tonnes += other.public_am_tonnes;
        self.public_contractor_loads += other.public_contractor_loads;
        self.public_contractor_tonnes += other.public_contractor_tonnes;
        self.private_msw_loads += other.private_msw_loads;
        self.private_msw_tonnes += other.private_msw_tonnes;
        self.total_msw_loads += other.total_msw_loads;
        self.total_msw_tonnes += other.total_msw_tonnes;
        self.total_waste_intake_loads += other.total_waste_intake_loads;
        self.total_waste_intake_tonnes += other.total_waste_intake_tonnes;
    }

    /// Per-day averages over `total_days` (caller guards zero).
    pub fn averages(&self, total_days: u64) -> AverageTotals {
        let d = total_days as f64;
        AverageTotals {
            domestic_waste_loads: self.domestic_waste_loads as f64 / d,
            domestic_waste_tonnes: self.domestic_waste_tonnes / d,
            gully_waste_loads: self.gully_waste_loads as f64 / d,
            gully_waste_tonnes: self.gully_waste_tonnes / d,
            extended_loads: self.extended_loads as f64 / d,
            extended_tonnes: self.extended_tonnes / d,
            public_normal_loads: self.public_normal_loads as f64 / d,
            public_normal_tonnes: self.public_normal_tonnes / d,
            private_normal_loads: self.private_normal_loads as f64 / d,
            private_normal_tonnes: self.private_normal_tonnes / d,
            grease_trap_loads: self.grease_trap_loads as f64 / d,
            grease_trap_tonnes: self.grease_trap_tonnes / d,
            daily_total_loads: self.daily_total_loads as f64 / d,
            daily_total_tonnes: self.daily_total_tonnes / d,
            public_am_loads: self.public_am_loads as f64 / d,
            public_am_tonnes: self.public_am_tonnes / d,
            public_contractor_loads: self.public_contractor_loads as f64 / d,
            public_contractor_tonnes: self.public_contractor_tonnes / d,
            private_msw_loads: self.private_msw_loads as f64 / d,
            private_msw_tonnes: self.private_msw_tonnes / d,
            total_msw_loads: self.total_msw_loads as f64 / d,
            total_msw_tonnes: self.total_msw_tonnes / d,
            total_waste_intake_loads: self.total_waste_intake_loads as f64 / d,
            total_waste_intake_tonnes: self.total_waste_intake_tonnes / d,
        }
    }
}

/// [`DayTotals`] divided by a day count.
#[derive(Debug, Clone, Serialize)]
pub struct AverageTotals {
    #[serde(serialize_with = "two_dp")]
    pub domestic_waste_loads: f64,
    #[serde(serialize_with = "two_dp")]
    pub domestic_waste_tonnes: f64,
    #[serde(serialize_with = "two_dp")]
    pub gully_waste_loads: f64,
    #[serde(serialize_with = "two_dp")]
    pub gully_waste_tonnes: f64,
    #[serde(serialize_with = "two_dp")]
    pub extended_loads: f64,
    #[serde(serialize_with = "two_dp")]
    pub extended_tonnes: f64,
    #[serde(serialize_with = "two_dp")]
    pub public_normal_loads: f64,
    #[serde(serialize_with = "two_dp")]
    pub public_normal_tonnes: f64,
    #[serde(serialize_with = "two_dp")]
    pub private_normal_loads: f64,
    #[serde(serialize_with = "two_dp")]
    pub private_normal_tonnes: f64,
    #[serde(serialize_with = "two_dp")]
    pub grease_trap_loads: f64,
    #[serde(serialize_with = "two_dp")]
    pub grease_trap_tonnes: f64,
    #[serde(serialize_with = "two_dp")]
    pub daily_total_loads: f64,
    #[serde(serialize_with = "two_dp")]
    pub daily_total_tonnes: f64,
    #[serde(serialize_with = "two_dp")]
    pub public_am_loads: f64,
    #[serde(serialize_with = "two_dp")]
    pub public_am_tonnes: f64,
    #[serde(serialize_with = "two_dp")]
    pub public_contractor_loads: f64,
    #[serde(serialize_with = "two_dp")]
    pub public_contractor_tonnes: f64,
    #[serde(serialize_with = "two_dp")]
    pub private_msw_loads: f64,
    #[serde(serialize_with = "two_dp")]
    pub private_msw_tonnes: f64,
    #[serde(serialize_with = "two_dp")]
    pub total_msw_loads: f64,
    #[serde(serialize_with = "two_dp")]
    pub total_msw_tonnes: f64,
    #[serde(serialize_with = "two_dp")]
    pub total_waste_intake_loads: f64,
    #[serde(serialize_with = "two_dp")]
    pub total_waste_intake_tonnes: f64,
}

/// One day's classified totals.
#[derive(Debug, Clone, Serialize)]
pub struct DayAggregate {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub totals: DayTotals,
}

/// One month's summed totals.
#[derive(Debug, Clone, Serialize)]
pub struct MonthSummary {
    pub year: i32,
    pub month: u32,
    pub day_count: u64,
    #[serde(flatten)]
    pub totals: DayTotals,
}

/// Reporting period selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Period {
    Q1,
    Q2,
    Q3,
    Q4,
    H1,
    H2,
    Annual,
}

impl Period {
    pub fn months(&self) -> std::ops::RangeInclusive<u32> {
        match self {
            Period::Q1 => 1..=3,
            Period::Q2 => 4..=6,
            Period::Q3 => 7..=9,
            Period::Q4 => 10..=12,
            Period::H1 => 1..=6,
            Period::H2 => 7..=12,
            Period::Annual => 1..=12,
        }
    }
}

/// Complete period table for one year: per-month rows, grand totals and
/// per-day averages. Only produced when the period actually has data.
#[derive(Debug, Clone, Serialize)]
pub struct PeriodSummary {
    pub period: Period,
    pub year: i32,
    pub total_days: u64,
    pub months: Vec<MonthSummary>,
    pub totals: DayTotals,
    pub daily_averages: AverageTotals,
}
