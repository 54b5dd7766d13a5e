use super::common::*;

use crate::workflows::farmers::FarmerId;
use crate::workflows::performance::domain::{FarmerPerformanceSnapshot, RiskLevel};
use crate::workflows::performance::scoring::FarmerScoringEngine;

fn healthy_snapshot() -> FarmerPerformanceSnapshot {
    FarmerPerformanceSnapshot {
        farmer_id: FarmerId::new("f-001"),
        performance_score: 90,
        total_liters: 12_000.0,
        total_earnings: 600_000.0,
        avg_quality_score: 3.5,
        collections_count: 30,
        collection_frequency_per_week: 7.0,
        consistency_score_percent: 95.0,
        last_collection_date: Some(days_ago(1)),
    }
}

#[test]
fn worked_example_is_medium_risk_with_one_factor() {
    let engine = FarmerScoringEngine::new();
    let snapshot = engine.compute_snapshot(FarmerId::new("f-002"), &two_collection_history("f-002"));
    let risk = engine.compute_risk(&snapshot, now());

    assert_eq!(risk.risk_score, 15);
    assert_eq!(risk.risk_level, RiskLevel::Medium);
    assert_eq!(risk.risk_factors, vec!["Below average performance"]);
}

#[test]
fn never_collected_farmer_is_critical_and_keeps_first_two_factors() {
    let engine = FarmerScoringEngine::new();
    let snapshot = engine.compute_snapshot(FarmerId::new("f-404"), &[]);
    let risk = engine.compute_risk(&snapshot, now());

    assert_eq!(risk.risk_score, 90);
    assert_eq!(risk.risk_level, RiskLevel::Critical);
    assert_eq!(
        risk.risk_factors,
        vec!["Poor overall performance", "Infrequent collections"]
    );
}

#[test]
fn healthy_farmer_is_low_risk() {
    let risk = FarmerScoringEngine::new().compute_risk(&healthy_snapshot(), now());

    assert_eq!(risk.risk_score, 0);
    assert_eq!(risk.risk_level, RiskLevel::Low);
    assert!(risk.risk_factors.is_empty());
}

#[test]
fn inactivity_uses_whole_elapsed_days() {
    let engine = FarmerScoringEngine::new();
    let mut snapshot = healthy_snapshot();

    snapshot.last_collection_date = Some(days_ago(31) + chrono::Duration::hours(1));
    let risk = engine.compute_risk(&snapshot, now());
    assert_eq!(risk.risk_score, 10);
    assert_eq!(risk.risk_factors, vec!["Inactive for 30 days"]);

    snapshot.last_collection_date = Some(days_ago(31));
    let risk = engine.compute_risk(&snapshot, now());
    assert_eq!(risk.risk_score, 20);
    assert_eq!(risk.risk_factors, vec!["Inactive for 31 days"]);
    assert_eq!(risk.risk_level, RiskLevel::Medium);

    snapshot.last_collection_date = Some(days_ago(14));
    assert_eq!(engine.compute_risk(&snapshot, now()).risk_score, 0);
}

#[test]
fn moderate_thresholds_add_lighter_weights() {
    let engine = FarmerScoringEngine::new();
    let snapshot = FarmerPerformanceSnapshot {
        performance_score: 60,
        collection_frequency_per_week: 0.75,
        avg_quality_score: 2.0,
        consistency_score_percent: 50.0,
        ..healthy_snapshot()
    };

    let risk = engine.compute_risk(&snapshot, now());
    assert_eq!(risk.risk_score, 15 + 10 + 7 + 7);
    assert_eq!(risk.risk_level, RiskLevel::High);
    assert_eq!(
        risk.risk_factors,
        vec!["Below average performance", "Low collection frequency"]
    );
}

#[test]
fn risk_factors_never_exceed_two() {
    let engine = FarmerScoringEngine::new();
    for score in [0, 45, 65, 85] {
        for quality in [0.5, 2.0, 3.5] {
            let snapshot = FarmerPerformanceSnapshot {
                performance_score: score,
                avg_quality_score: quality,
                collection_frequency_per_week: 0.2,
                consistency_score_percent: 10.0,
                last_collection_date: Some(days_ago(45)),
                ..healthy_snapshot()
            };
            assert!(engine.compute_risk(&snapshot, now()).risk_factors.len() <= 2);
        }
    }
}

#[test]
fn worse_quality_never_lowers_risk() {
    let engine = FarmerScoringEngine::new();
    let scores: Vec<u32> = [3.0, 2.49, 2.0, 1.49, 1.0]
        .into_iter()
        .map(|avg_quality_score| {
            let snapshot = FarmerPerformanceSnapshot {
                avg_quality_score,
                ..healthy_snapshot()
            };
            engine.compute_risk(&snapshot, now()).risk_score
        })
        .collect();

    assert!(scores.windows(2).all(|pair| pair[0] <= pair[1]), "{scores:?}");
    assert_eq!(scores, vec![0, 7, 7, 15, 15]);
}
