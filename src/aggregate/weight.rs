use crate::model::Record;

/// Substitute weight for datasets recorded without a weight column, so
/// load counts are never lost from tonnage views.
pub const FALLBACK_WEIGHT: f64 = 10.0;

/// Per-run weight resolution.
///
/// Whether the fallback applies is decided once per aggregation run from
/// the FIRST record's weight presence, not per record — datasets either
/// carry weights or they don't, and a mixed dataset follows its first
/// row. With the fallback off, a record with no parseable weight
/// contributes 0 to sums (but still counts as a load).
#[derive(Debug, Clone, Copy)]
pub struct WeightPolicy {
    use_fallback: bool,
}

impl WeightPolicy {
    pub fn detect(records: &[Record]) -> Self {
        Self {
            use_fallback: records.first().is_some_and(|r| r.weight.is_none()),
        }
    }

    pub fn resolve(&self, record: &Record) -> f64 {
        if self.use_fallback {
            FALLBACK_WEIGHT
        } else {
            record.weight.unwrap_or(0.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DeliveryStatus, StationId};
    use chrono::NaiveDate;

    fn record(weight: Option<f64>) -> Record {
        Record {
            station: StationId::Iets,
            date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            intake_time: "08:00:00".to_string(),
            delivery_status: DeliveryStatus::Completed,
            vehicle_task: "C31".to_string(),
            waste_type: String::new(),
            weight,
            source_district: String::new(),
        }
    }

    #[test]
    fn test_fallback_applies_to_every_record() {
        // First record has no weight field → the whole run falls back,
        // even for records that do carry one.
        let records = vec![record(None), record(Some(3.0)), record(None)];
        let policy = WeightPolicy::detect(&records);

        for r in &records {
            let w = policy.resolve(r);
            assert_eq!(w, FALLBACK_WEIGHT);
            assert!(w.is_finite());
        }
    }

    #[test]
    fn test_weighted_dataset_uses_record_weights() {
        let records = vec![record(Some(2.5)), record(None)];
        let policy = WeightPolicy::detect(&records);

        assert_eq!(policy.resolve(&records[0]), 2.5);
        assert_eq!(policy.resolve(&records[1]), 0.0);
    }

    #[test]
    fn test_empty_dataset_does_not_fall_back() {
        let policy = WeightPolicy::detect(&[]);
        assert_eq!(policy.resolve(&record(Some(1.5))), 1.5);
    }
}
