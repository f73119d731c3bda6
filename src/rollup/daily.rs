//! Per-day classification fold.

use chrono::NaiveDate;

use super::types::{DayAggregate, DayTotals};
use crate::aggregate::WeightPolicy;
use crate::classify::{intake_category, msw_category, IntakeCategory, MswCategory};
use crate::model::Record;

/// Folds one day's records into a [`DayAggregate`] using the MSW and
/// waste-intake splits.
///
/// Only completed deliveries count. Tonnage sums stay unrounded here;
/// rounding happens at serialization. Records outside every MSW window
/// still contribute to the intake split when their task code matches.
pub fn daily_summary(date: NaiveDate, records: &[Record], policy: &WeightPolicy) -> DayAggregate {
    let mut t = DayTotals::default();

    for record in records {
        if !record.delivery_status.is_completed() {
            continue;
        }
        let weight = policy.resolve(record);

        match msw_category(record) {
            Some(MswCategory::DomesticWaste) => {
                t.domestic_waste_loads += 1;
                t.domestic_waste_tonnes += weight;
            }
            Some(MswCategory::GullyWaste) => {
                t.gully_waste_loads += 1;
                t.gully_waste_tonnes += weight;
            }
            Some(MswCategory::PublicNormal) => {
                t.public_normal_loads += 1;
                t.public_normal_tonnes += weight;
            }
            Some(MswCategory::PrivateNormal) => {
                t.private_normal_loads += 1;
                t.private_normal_tonnes += weight;
            }
            Some(MswCategory::GreaseTrap) => {
                t.grease_trap_loads += 1;
                t.grease_trap_tonnes += weight;
            }
            None => {}
        }

        match intake_category(&record.vehicle_task) {
            Some(IntakeCategory::PublicAmVehicle) => {
                t.public_am_loads += 1;
                t.public_am_tonnes += weight;
            }
            Some(IntakeCategory::PublicContractor) => {
                t.public_contractor_loads += 1;
                t.public_contractor_tonnes += weight;
            }
            Some(IntakeCategory::PrivateMsw) => {
                t.private_msw_loads += 1;
                t.private_msw_tonnes += weight;
            }
            // Grease trap is already counted by the MSW split above.
            Some(IntakeCategory::GreaseTrapWaste) | None => {}
        }
    }

    t.extended_loads = t.domestic_waste_loads + t.gully_waste_loads;
    t.extended_tonnes = t.domestic_waste_tonnes + t.gully_waste_tonnes;
    t.daily_total_loads = t.extended_loads + t.public_normal_loads + t.private_normal_loads;
    t.daily_total_tonnes = t.extended_tonnes + t.public_normal_tonnes + t.private_normal_tonnes;
    t.total_msw_loads = t.public_am_loads + t.public_contractor_loads + t.private_msw_loads;
    t.total_msw_tonnes = t.public_am_tonnes + t.public_contractor_tonnes + t.private_msw_tonnes;
    t.total_waste_intake_loads = t.total_msw_loads + t.grease_trap_loads;
    t.total_waste_intake_tonnes = t.total_msw_tonnes + t.grease_trap_tonnes;

    DayAggregate { date, totals: t }
}
