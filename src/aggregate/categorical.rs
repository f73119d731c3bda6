//! Categorical breakdowns (source district, vehicle task).

use serde::Serialize;
use std::collections::HashMap;

use super::weight::WeightPolicy;
use crate::model::Record;

/// One category's totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryStat {
    pub category: String,
    pub count: u64,
    pub weight: f64,
}

/// Folds records into per-category counts and weight sums.
///
/// `key_fn` yields the record's category, or `None` to leave it out.
/// Display order is descending count, ties broken by first appearance
/// in the input.
pub fn aggregate_categorical<F>(
    records: &[Record],
    key_fn: F,
    policy: &WeightPolicy,
) -> Vec<CategoryStat>
where
    F: Fn(&Record) -> Option<String>,
{
    struct Slot {
        first_seen: usize,
        count: u64,
        weight: f64,
    }

    let mut slots: HashMap<String, Slot> = HashMap::new();

    for record in records {
        let Some(category) = key_fn(record) else {
            continue;
        };
        let next_index = slots.len();
        let slot = slots.entry(category).or_insert(Slot {
            first_seen: next_index,
            count: 0,
            weight: 0.0,
        });
        slot.count += 1;
        slot.weight += policy.resolve(record);
    }

    let mut stats: Vec<(String, Slot)> = slots.into_iter().collect();
    stats.sort_by(|(_, a), (_, b)| b.count.cmp(&a.count).then(a.first_seen.cmp(&b.first_seen)));

    stats
        .into_iter()
        .map(|(category, slot)| CategoryStat {
            category,
            count: slot.count,
            weight: slot.weight,
        })
        .collect()
}

/// Column-oriented categorical payload consumed by the presentation
/// layer.
#[derive(Debug, Serialize)]
pub struct CategoricalView {
    pub categories: Vec<String>,
    pub counts: Vec<u64>,
    pub weights: Vec<f64>,
}

impl From<Vec<CategoryStat>> for CategoricalView {
    fn from(stats: Vec<CategoryStat>) -> Self {
        Self {
            categories: stats.iter().map(|s| s.category.clone()).collect(),
            counts: stats.iter().map(|s| s.count).collect(),
            weights: stats.iter().map(|s| s.weight).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DeliveryStatus, StationId};
    use chrono::NaiveDate;

    fn record(district: &str, weight: f64) -> Record {
        Record {
            station: StationId::Iets,
            date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            intake_time: "08:00:00".to_string(),
            delivery_status: DeliveryStatus::Completed,
            vehicle_task: "C31 垃圾收集".to_string(),
            waste_type: String::new(),
            weight: Some(weight),
            source_district: district.to_string(),
        }
    }

    fn by_district(r: &Record) -> Option<String> {
        if r.source_district.is_empty() {
            None
        } else {
            Some(r.source_district.clone())
        }
    }

    #[test]
    fn test_counts_weights_and_order() {
        // Districts A, A, B with weights 1, 2, 3.
        let records = vec![record("A", 1.0), record("A", 2.0), record("B", 3.0)];
        let policy = WeightPolicy::detect(&records);

        let stats = aggregate_categorical(&records, by_district, &policy);

        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].category, "A");
        assert_eq!(stats[0].count, 2);
        assert_eq!(stats[0].weight, 3.0);
        assert_eq!(stats[1].category, "B");
        assert_eq!(stats[1].count, 1);
        assert_eq!(stats[1].weight, 3.0);
    }

    #[test]
    fn test_ties_keep_first_seen_order() {
        let records = vec![
            record("九龍城區", 1.0),
            record("深水埗區", 1.0),
            record("元朗區", 1.0),
        ];
        let policy = WeightPolicy::detect(&records);

        let stats = aggregate_categorical(&records, by_district, &policy);
        let order: Vec<&str> = stats.iter().map(|s| s.category.as_str()).collect();
        assert_eq!(order, ["九龍城區", "深水埗區", "元朗區"]);
    }

    #[test]
    fn test_none_key_excluded() {
        let records = vec![record("", 1.0), record("東區", 2.0)];
        let policy = WeightPolicy::detect(&records);

        let stats = aggregate_categorical(&records, by_district, &policy);
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].category, "東區");
    }

    #[test]
    fn test_view_columns_align() {
        let records = vec![record("A", 1.0), record("B", 2.0), record("B", 2.0)];
        let policy = WeightPolicy::detect(&records);
        let view = CategoricalView::from(aggregate_categorical(&records, by_district, &policy));

        assert_eq!(view.categories, ["B", "A"]);
        assert_eq!(view.counts, [2, 1]);
        assert_eq!(view.weights, [4.0, 1.0]);
    }
}
