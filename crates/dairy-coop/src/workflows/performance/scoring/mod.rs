mod risk;
mod snapshot;

use chrono::{DateTime, Utc};

use super::domain::{CollectionRecord, FarmerPerformanceSnapshot, RiskAssessment};
use crate::workflows::farmers::FarmerId;

pub(crate) const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Stateless scorer turning collection history into snapshots and risk assessments.
#[derive(Debug, Default, Clone, Copy)]
pub struct FarmerScoringEngine;

impl FarmerScoringEngine {
    pub fn new() -> Self {
        Self
    }

    /// Build a snapshot from one farmer's collections. Input order does not matter.
    pub fn compute_snapshot(
        &self,
        farmer_id: FarmerId,
        collections: &[CollectionRecord],
    ) -> FarmerPerformanceSnapshot {
        snapshot::compute(farmer_id, collections)
    }

    pub fn compute_risk(
        &self,
        snapshot: &FarmerPerformanceSnapshot,
        now: DateTime<Utc>,
    ) -> RiskAssessment {
        risk::assess(snapshot, now)
    }
}

/// Whole days elapsed since the farmer's last collection, `None` if they never delivered.
pub(crate) fn days_since(
    last_collection: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Option<i64> {
    last_collection.map(|last| (now - last).num_milliseconds().div_euclid(MILLIS_PER_DAY))
}
