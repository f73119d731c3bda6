//! Pure categorization rules for weighbridge records.
//!
//! Everything here is stateless and total over its inputs: a record with
//! an unparseable time simply lands in no time bucket, it is never an
//! error. The rules are exact reproductions of the dashboard's domain
//! logic, boundaries included.

use chrono::{Datelike, NaiveDate, Weekday};

use crate::model::{Record, StationId};

/// Minute-of-day bounds of the early-morning municipal window
/// (04:25–07:25 inclusive).
const MORNING_START: u16 = 265;
const MORNING_END: u16 = 445;
/// Start of the normal daytime window (07:26).
const DAYTIME_START: u16 = 446;
const LAST_MINUTE: u16 = 1439;

/// Waste type code marking gully waste within C31 tasks.
const GULLY_WASTE_TYPE: &str = "D06.00";

/// Normalizes a raw intake-time string to a minute-of-day.
///
/// Accepts `HH:MM`, `HH:MM:SS`, and bare numeric `HHMM` (zero-padded or
/// not). Returns `None` for anything out of range or unparseable; such
/// records are excluded from time-bucketed views only.
pub fn minute_of_day(raw: &str) -> Option<u16> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let (hour, minute) = if let Some((h, rest)) = raw.split_once(':') {
        let m = rest.split(':').next().unwrap_or("");
        (h.parse::<u16>().ok()?, m.parse::<u16>().ok()?)
    } else {
        // Bare numeric HHMM, e.g. "730" for 07:30.
        if !raw.chars().all(|c| c.is_ascii_digit()) || raw.len() > 4 {
            return None;
        }
        let value = raw.parse::<u16>().ok()?;
        (value / 100, value % 100)
    };

    if hour > 23 || minute > 59 {
        return None;
    }
    Some(hour * 60 + minute)
}

/// Station-scoped task filter for the general load/tonnage charts:
/// WKTS accepts only C31/G01/P99 tasks, every other station accepts any
/// C/G/P task.
pub fn task_in_station_scope(station: StationId, task: &str) -> bool {
    if station == StationId::Wkts {
        task.starts_with("C31") || task.starts_with("G01") || task.starts_with("P99")
    } else {
        task.starts_with('C') || task.starts_with('G') || task.starts_with('P')
    }
}

/// A record counts toward the general charts iff it is completed and its
/// task is in scope for its station.
pub fn in_chart_scope(record: &Record) -> bool {
    record.delivery_status.is_completed()
        && task_in_station_scope(record.station, &record.vehicle_task)
}

/// Grease-trap record: completed delivery with a P97 task.
pub fn is_grease_trap(record: &Record) -> bool {
    record.delivery_status.is_completed() && record.vehicle_task.starts_with("P97")
}

/// Municipal-solid-waste category split used by the daily/period
/// summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MswCategory {
    /// C31 in the morning window, waste type other than gully.
    DomesticWaste,
    /// C31 in the morning window carrying gully waste (D06.00).
    GullyWaste,
    /// C31 or G01 during normal daytime hours.
    PublicNormal,
    /// P99 during normal daytime hours.
    PrivateNormal,
    /// P97, unconditional on time.
    GreaseTrap,
}

/// Classifies a record into its MSW category, or `None` when it falls
/// outside every window. The categories are mutually exclusive.
pub fn msw_category(record: &Record) -> Option<MswCategory> {
    let task = record.vehicle_task.as_str();

    if task.starts_with("P97") {
        return Some(MswCategory::GreaseTrap);
    }

    let m = minute_of_day(&record.intake_time)?;

    if task.starts_with("C31") {
        if (MORNING_START..=MORNING_END).contains(&m) {
            return if record.waste_type == GULLY_WASTE_TYPE {
                Some(MswCategory::GullyWaste)
            } else {
                Some(MswCategory::DomesticWaste)
            };
        }
        if (DAYTIME_START..=LAST_MINUTE).contains(&m) {
            return Some(MswCategory::PublicNormal);
        }
        return None;
    }

    if task.starts_with("G01") && (DAYTIME_START..=LAST_MINUTE).contains(&m) {
        return Some(MswCategory::PublicNormal);
    }
    if task.starts_with("P99") && (DAYTIME_START..=LAST_MINUTE).contains(&m) {
        return Some(MswCategory::PrivateNormal);
    }

    None
}

/// Waste-intake category split used by the monthly/period tables.
/// Mutually exclusive per record, keyed off the task code alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntakeCategory {
    /// P97 – grease trap waste.
    GreaseTrapWaste,
    /// G01 – public AM vehicles.
    PublicAmVehicle,
    /// C31 – public contractors.
    PublicContractor,
    /// P99 – private MSW.
    PrivateMsw,
}

pub fn intake_category(task: &str) -> Option<IntakeCategory> {
    if task.starts_with("P97") {
        Some(IntakeCategory::GreaseTrapWaste)
    } else if task.starts_with("G01") {
        Some(IntakeCategory::PublicAmVehicle)
    } else if task.starts_with("C31") {
        Some(IntakeCategory::PublicContractor)
    } else if task.starts_with("P99") {
        Some(IntakeCategory::PrivateMsw)
    } else {
        None
    }
}

/// The 24 one-hour chart slots, beginning at 04:30 and wrapping past
/// midnight. Together they cover every minute of the day exactly once.
pub const TIME_SLOT_LABELS: [&str; 24] = [
    "0430-0529", "0530-0629", "0630-0729", "0730-0829", "0830-0929", "0930-1029", "1030-1129",
    "1130-1229", "1230-1329", "1330-1429", "1430-1529", "1530-1629", "1630-1729", "1730-1829",
    "1830-1929", "1930-2029", "2030-2129", "2130-2229", "2230-2329", "2330-0029", "0030-0129",
    "0130-0229", "0230-0329", "0330-0429",
];

/// Inclusive minute-of-day ranges matching [`TIME_SLOT_LABELS`]; the
/// `2330-0029` slot wraps midnight.
const TIME_SLOT_RANGES: [(u16, u16); 24] = [
    (270, 329),
    (330, 389),
    (390, 449),
    (450, 509),
    (510, 569),
    (570, 629),
    (630, 689),
    (690, 749),
    (750, 809),
    (810, 869),
    (870, 929),
    (930, 989),
    (990, 1049),
    (1050, 1109),
    (1110, 1169),
    (1170, 1229),
    (1230, 1289),
    (1290, 1349),
    (1350, 1409),
    (1410, 29),
    (30, 89),
    (90, 149),
    (150, 209),
    (210, 269),
];

fn slot_contains(range: (u16, u16), m: u16) -> bool {
    let (start, end) = range;
    if start <= end {
        (start..=end).contains(&m)
    } else {
        m >= start || m <= end
    }
}

/// Maps a minute-of-day to its chart slot index. Every minute in
/// 0..=1439 lands in exactly one slot.
pub fn time_slot(m: u16) -> Option<usize> {
    if m > LAST_MINUTE {
        return None;
    }
    TIME_SLOT_RANGES.iter().position(|&r| slot_contains(r, m))
}

/// Slots of the hourly intake table: one wide early-morning slot,
/// seventeen hourly slots, and an overnight slot. Unlike the chart
/// slots these may overlap — 23:30–23:59 belongs to both the last
/// hourly slot and the overnight slot.
pub const HOURLY_SLOT_LABELS: [&str; 19] = [
    "0430-0659", "0700-0759", "0800-0859", "0900-0959", "1000-1059", "1100-1159", "1200-1259",
    "1300-1359", "1400-1459", "1500-1559", "1600-1659", "1700-1759", "1800-1859", "1900-1959",
    "2000-2059", "2100-2159", "2200-2259", "2300-2359", "2330-0429",
];

const HOURLY_SLOT_RANGES: [(u16, u16); 19] = [
    (270, 419),
    (420, 479),
    (480, 539),
    (540, 599),
    (600, 659),
    (660, 719),
    (720, 779),
    (780, 839),
    (840, 899),
    (900, 959),
    (960, 1019),
    (1020, 1079),
    (1080, 1139),
    (1140, 1199),
    (1200, 1259),
    (1260, 1319),
    (1320, 1379),
    (1380, 1439),
    (1410, 269),
];

/// Every hourly-table slot containing the given minute.
pub fn hourly_slots(m: u16) -> Vec<usize> {
    if m > LAST_MINUTE {
        return Vec::new();
    }
    HOURLY_SLOT_RANGES
        .iter()
        .enumerate()
        .filter(|&(_, &r)| slot_contains(r, m))
        .map(|(i, _)| i)
        .collect()
}

/// Only completed C31/G01/P99 deliveries appear in the hourly table.
pub fn in_hourly_scope(record: &Record) -> bool {
    record.delivery_status.is_completed()
        && (record.vehicle_task.starts_with("C31")
            || record.vehicle_task.starts_with("G01")
            || record.vehicle_task.starts_with("P99"))
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}
