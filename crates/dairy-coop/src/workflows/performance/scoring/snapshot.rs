use std::collections::BTreeSet;

use super::MILLIS_PER_DAY;
use crate::workflows::farmers::FarmerId;
use crate::workflows::performance::domain::{CollectionRecord, FarmerPerformanceSnapshot};

const MILLIS_PER_WEEK: f64 = (7 * MILLIS_PER_DAY) as f64;

const VOLUME_WEIGHT: f64 = 0.3;
const QUALITY_WEIGHT: f64 = 0.3;
const FREQUENCY_WEIGHT: f64 = 0.2;
const CONSISTENCY_WEIGHT: f64 = 0.2;

pub(super) fn compute(
    farmer_id: FarmerId,
    collections: &[CollectionRecord],
) -> FarmerPerformanceSnapshot {
    let mut ordered: Vec<&CollectionRecord> = collections.iter().collect();
    ordered.sort_by(|left, right| right.collection_date.cmp(&left.collection_date));

    let (Some(latest), Some(earliest)) = (ordered.first(), ordered.last()) else {
        return FarmerPerformanceSnapshot::empty(farmer_id);
    };

    let collections_count = ordered.len();
    let count = collections_count as f64;

    let total_liters: f64 = ordered.iter().map(|record| record.liters).sum();
    let total_earnings: f64 = ordered.iter().map(|record| record.total_amount).sum();
    let avg_quality_score =
        ordered.iter().map(|record| record.quality_grade.score()).sum::<f64>() / count;

    let span_millis = (latest.collection_date - earliest.collection_date).num_milliseconds();
    let weeks_active = (span_millis as f64 / MILLIS_PER_WEEK).max(1.0);
    let collection_frequency_per_week = count / weeks_active;

    let collection_days: BTreeSet<_> = ordered
        .iter()
        .map(|record| record.collection_date.date_naive())
        .collect();
    let consistency_score_percent = collection_days.len() as f64 / weeks_active * 100.0;

    let volume_score = (total_liters / 1000.0 * 10.0).min(100.0);
    let quality_score = avg_quality_score * 25.0;
    let frequency_score = (collection_frequency_per_week * 10.0).min(100.0);

    let weighted = volume_score * VOLUME_WEIGHT
        + quality_score * QUALITY_WEIGHT
        + frequency_score * FREQUENCY_WEIGHT
        + consistency_score_percent * CONSISTENCY_WEIGHT;

    FarmerPerformanceSnapshot {
        farmer_id,
        performance_score: weighted.round().max(0.0) as u32,
        total_liters,
        total_earnings,
        avg_quality_score,
        collections_count,
        collection_frequency_per_week,
        consistency_score_percent,
        last_collection_date: Some(latest.collection_date),
    }
}
