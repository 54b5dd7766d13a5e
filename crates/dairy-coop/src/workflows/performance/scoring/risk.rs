use chrono::{DateTime, Utc};

use super::days_since;
use crate::workflows::performance::domain::{
    FarmerPerformanceSnapshot, RiskAssessment, RiskLevel,
};

const RETAINED_FACTORS: usize = 2;
const NEVER_COLLECTED_DAYS: i64 = 30;

struct RiskTally {
    score: u32,
    factors: Vec<String>,
}

impl RiskTally {
    fn new() -> Self {
        Self {
            score: 0,
            factors: Vec::new(),
        }
    }

    fn add(&mut self, weight: u32, factor: impl Into<String>) {
        self.score += weight;
        self.factors.push(factor.into());
    }
}

pub(super) fn assess(snapshot: &FarmerPerformanceSnapshot, now: DateTime<Utc>) -> RiskAssessment {
    let mut tally = RiskTally::new();

    if snapshot.performance_score < 50 {
        tally.add(30, "Poor overall performance");
    } else if snapshot.performance_score < 70 {
        tally.add(15, "Below average performance");
    }

    if snapshot.collection_frequency_per_week < 0.5 {
        tally.add(20, "Infrequent collections");
    } else if snapshot.collection_frequency_per_week < 1.0 {
        tally.add(10, "Low collection frequency");
    }

    if snapshot.avg_quality_score < 1.5 {
        tally.add(15, "Consistently poor quality");
    } else if snapshot.avg_quality_score < 2.5 {
        tally.add(7, "Variable quality");
    }

    if snapshot.consistency_score_percent < 40.0 {
        tally.add(15, "Irregular collection pattern");
    } else if snapshot.consistency_score_percent < 70.0 {
        tally.add(7, "Moderate consistency issues");
    }

    let idle_days =
        days_since(snapshot.last_collection_date, now).unwrap_or(NEVER_COLLECTED_DAYS);
    if idle_days > 30 {
        tally.add(20, format!("Inactive for {idle_days} days"));
    } else if idle_days > 14 {
        tally.add(10, format!("Inactive for {idle_days} days"));
    }

    let RiskTally { score, mut factors } = tally;
    factors.truncate(RETAINED_FACTORS);

    RiskAssessment {
        risk_level: RiskLevel::from_score(score),
        risk_score: score,
        risk_factors: factors,
    }
}
