//! Parsing of yearly partition payloads and CSV uploads into [`Record`]s.
//!
//! The wire format uses the weighbridge system's own field names
//! (`日期`, `交收狀態`, `車輛任務`, `入磅時間`, `物料重量`, `廢物類別`,
//! `來源`); this module is the single place where those names are mapped
//! onto the fixed record schema. Individual rows with an unparseable
//! date are dropped; a structurally malformed payload is an error.

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::debug;

use crate::model::{DeliveryStatus, Record, StationId};

const DATE_FORMAT: &str = "%d/%m/%Y";

/// One row as it appears in a yearly partition file. The weight field
/// arrives as a number, a numeric string, or not at all.
#[derive(Debug, Deserialize)]
struct WireRecord {
    #[serde(rename = "StationId", default)]
    station_id: Option<String>,
    #[serde(rename = "日期", default)]
    date: String,
    #[serde(rename = "交收狀態", default)]
    status: String,
    #[serde(rename = "車輛任務", default)]
    vehicle_task: String,
    #[serde(rename = "入磅時間", default)]
    intake_time: String,
    #[serde(rename = "物料重量", default)]
    weight: Option<serde_json::Value>,
    #[serde(rename = "廢物類別", default)]
    waste_type: String,
    #[serde(rename = "來源", default)]
    source_district: String,
}

fn weight_from_value(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn record_from_wire(partition_station: StationId, wire: WireRecord) -> Option<Record> {
    let date = match NaiveDate::parse_from_str(wire.date.trim(), DATE_FORMAT) {
        Ok(date) => date,
        Err(_) => {
            debug!(date = %wire.date, "dropping row with unparseable date");
            return None;
        }
    };

    // Rows normally carry their own StationId; fall back to the
    // partition's station when it is missing or unknown.
    let station = wire
        .station_id
        .as_deref()
        .and_then(|s| s.parse::<StationId>().ok())
        .unwrap_or(partition_station);

    Some(Record {
        station,
        date,
        intake_time: wire.intake_time.trim().to_string(),
        delivery_status: DeliveryStatus::from_wire(&wire.status),
        vehicle_task: wire.vehicle_task.trim().to_string(),
        waste_type: wire.waste_type.trim().to_string(),
        weight: wire.weight.as_ref().and_then(weight_from_value),
        source_district: wire.source_district.trim().to_string(),
    })
}

/// Decodes a yearly partition payload (a JSON array of wire rows).
///
/// # Errors
///
/// Returns an error if the payload is not a JSON array of objects.
/// Individual rows with a bad date are dropped, not errors.
pub fn parse_partition(
    station: StationId,
    bytes: &[u8],
) -> Result<Vec<Record>, serde_json::Error> {
    let wire: Vec<WireRecord> = serde_json::from_slice(bytes)?;
    Ok(wire
        .into_iter()
        .filter_map(|w| record_from_wire(station, w))
        .collect())
}

/// Parses a CSV upload into records.
///
/// The header row must name the same wire columns as the JSON format.
/// Rows whose column count does not match the header are dropped
/// silently, matching the upload collaborator's contract.
pub fn parse_csv_upload(station: StationId, bytes: &[u8]) -> anyhow::Result<Vec<Record>> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(bytes);

    let headers = reader.headers()?.clone();
    let column = |name: &str| headers.iter().position(|h| h.trim() == name);

    let date_col =
        column("日期").ok_or_else(|| anyhow::anyhow!("CSV upload is missing the 日期 column"))?;
    let status_col = column("交收狀態");
    let task_col = column("車輛任務");
    let time_col = column("入磅時間");
    let weight_col = column("物料重量");
    let waste_col = column("廢物類別");
    let district_col = column("來源");
    let station_col = column("StationId");

    let field = |row: &csv::StringRecord, col: Option<usize>| -> String {
        col.and_then(|i| row.get(i))
            .unwrap_or_default()
            .trim()
            .to_string()
    };

    let mut records = Vec::new();
    let mut dropped = 0usize;

    for row in reader.records() {
        let row = match row {
            Ok(row) => row,
            Err(_) => {
                dropped += 1;
                continue;
            }
        };
        if row.len() != headers.len() {
            dropped += 1;
            continue;
        }

        let wire = WireRecord {
            station_id: Some(field(&row, station_col)).filter(|s| !s.is_empty()),
            date: field(&row, Some(date_col)),
            status: field(&row, status_col),
            vehicle_task: field(&row, task_col),
            intake_time: field(&row, time_col),
            weight: Some(field(&row, weight_col))
                .filter(|s| !s.is_empty())
                .map(serde_json::Value::String),
            waste_type: field(&row, waste_col),
            source_district: field(&row, district_col),
        };

        if let Some(record) = record_from_wire(station, wire) {
            records.push(record);
        }
    }

    if dropped > 0 {
        debug!(dropped, "dropped malformed CSV rows");
    }

    Ok(records)
}
