//! Domain types for weighbridge transaction records.
//!
//! A [`Record`] is one weighbridge transaction at a refuse transfer
//! station. Records are immutable once stored; a partition (one station,
//! one calendar year) is only ever replaced wholesale.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::DataError;

/// The fixed set of refuse transfer stations.
///
/// Maps directly to the `StationId` field in the yearly partition files:
/// - `IETS` – Island East Transfer Station
/// - `IWTS` – Island West Transfer Station
/// - `NLTS` – North Lantau Transfer Station
/// - `NWNTTS` – North West New Territories Transfer Station
/// - `OITF` – Outlying Islands Transfer Facilities
/// - `STTS` – Sha Tin Transfer Station
/// - `WKTS` – West Kowloon Transfer Station
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StationId {
    Iets,
    Iwts,
    Nlts,
    Nwntts,
    Oitf,
    Stts,
    Wkts,
}

impl StationId {
    pub const ALL: [StationId; 7] = [
        StationId::Iets,
        StationId::Iwts,
        StationId::Nlts,
        StationId::Nwntts,
        StationId::Oitf,
        StationId::Stts,
        StationId::Wkts,
    ];

    /// Canonical upper-case code, as used in partition keys.
    pub fn code(&self) -> &'static str {
        match self {
            StationId::Iets => "IETS",
            StationId::Iwts => "IWTS",
            StationId::Nlts => "NLTS",
            StationId::Nwntts => "NWNTTS",
            StationId::Oitf => "OITF",
            StationId::Stts => "STTS",
            StationId::Wkts => "WKTS",
        }
    }

    /// Lower-case code, as used in yearly file names (`wkts2025.json`).
    pub fn file_prefix(&self) -> String {
        self.code().to_lowercase()
    }
}

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for StationId {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "IETS" => Ok(StationId::Iets),
            "IWTS" => Ok(StationId::Iwts),
            "NLTS" => Ok(StationId::Nlts),
            "NWNTTS" => Ok(StationId::Nwntts),
            "OITF" => Ok(StationId::Oitf),
            "STTS" => Ok(StationId::Stts),
            "WKTS" => Ok(StationId::Wkts),
            other => Err(DataError::InvalidStationId(other.to_string())),
        }
    }
}

/// Delivery status of a transaction. Only completed deliveries
/// participate in any aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryStatus {
    Completed,
    Other,
}

impl DeliveryStatus {
    /// Wire value `完成` means completed; everything else is lumped
    /// together as `Other`.
    pub fn from_wire(s: &str) -> Self {
        if s.trim() == "完成" {
            DeliveryStatus::Completed
        } else {
            DeliveryStatus::Other
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, DeliveryStatus::Completed)
    }
}

/// One weighbridge transaction.
///
/// `intake_time` keeps the raw wire text (`HH:MM:SS`, `HH:MM` or a bare
/// `HHMM`); it is normalized on demand by the classifier so that a record
/// with an unparseable time still counts toward non-time-bucketed views.
///
/// `weight` is `None` when the wire field is absent or unparseable; the
/// aggregator's weight policy decides what that means for a whole run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub station: StationId,
    pub date: NaiveDate,
    pub intake_time: String,
    pub delivery_status: DeliveryStatus,
    pub vehicle_task: String,
    pub waste_type: String,
    pub weight: Option<f64>,
    pub source_district: String,
}

/// Identity of a transaction for dedup purposes.
///
/// Deliberately excludes weight and waste type: two genuinely distinct
/// deliveries sharing date, time and task collide and the later one is
/// dropped on merge.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordKey {
    pub date: NaiveDate,
    pub intake_time: String,
    pub vehicle_task: String,
}

impl Record {
    pub fn key(&self) -> RecordKey {
        RecordKey {
            date: self.date,
            intake_time: self.intake_time.clone(),
            vehicle_task: self.vehicle_task.clone(),
        }
    }
}

/// Storage/cache key for one `(station, year)` partition, e.g. `WKTS2025`.
pub fn partition_key(station: StationId, year: i32) -> String {
    format!("{}{}", station.code(), year)
}

/// Merges `incoming` into `existing`, keeping the first occurrence of
/// every dedup key. Ingesting the same set twice is a no-op.
pub fn merge_records(existing: Vec<Record>, incoming: Vec<Record>) -> Vec<Record> {
    let mut seen: std::collections::HashSet<RecordKey> =
        existing.iter().map(Record::key).collect();
    let mut merged = existing;

    for record in incoming {
        if seen.insert(record.key()) {
            merged.push(record);
        }
    }

    merged
}
