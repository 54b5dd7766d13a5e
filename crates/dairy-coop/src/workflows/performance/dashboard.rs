use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{CollectionRecord, FarmerPerformanceSnapshot, RiskAssessment, RiskLevel};
use super::scoring::{days_since, FarmerScoringEngine};
use crate::config::DashboardConfig;
use crate::workflows::farmers::{FarmerId, FarmerRef};

/// Farmer flagged for follow-up by field staff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtRiskFarmer {
    pub farmer_id: FarmerId,
    pub name: String,
    pub score: u32,
    pub risk: RiskLevel,
    pub risk_score: u32,
    pub risk_factors: Vec<String>,
    pub issue: String,
    pub volume: i64,
    pub avg_quality: f64,
    pub days_since_last_collection: Option<i64>,
    pub last_collection: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Badge {
    Gold,
    Silver,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopPerformer {
    pub farmer_id: FarmerId,
    pub name: String,
    pub score: u32,
    pub volume: f64,
    pub avg_quality: f64,
    pub collections: usize,
    pub earnings: f64,
    pub badge: Badge,
}

/// Farmer counts bucketed by days since their last delivery.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InactivityBreakdown {
    /// 7 to 14 days.
    pub slightly: usize,
    /// 15 to 30 days.
    pub moderately: usize,
    /// 31 to 60 days.
    pub highly: usize,
    /// 61 to 90 days.
    pub dormant: usize,
    /// 91 days or more, or never delivered.
    pub lost: usize,
}

impl InactivityBreakdown {
    fn record(&mut self, idle_days: Option<i64>) {
        match idle_days {
            None => self.lost += 1,
            Some(days) if (7..15).contains(&days) => self.slightly += 1,
            Some(days) if (15..31).contains(&days) => self.moderately += 1,
            Some(days) if (31..61).contains(&days) => self.highly += 1,
            Some(days) if (61..91).contains(&days) => self.dormant += 1,
            Some(days) if days >= 91 => self.lost += 1,
            Some(_) => {}
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceStats {
    pub total_farmers: usize,
    pub active_farmers: usize,
    pub at_risk_farmers: usize,
    pub critical_risk: usize,
    pub high_risk: usize,
    pub medium_risk: usize,
    pub avg_performance_score: u32,
    pub churn_rate: u32,
    pub retention_rate: u32,
}

/// Cooperative-wide performance overview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceDashboard {
    pub stats: PerformanceStats,
    pub at_risk_farmers: Vec<AtRiskFarmer>,
    pub top_performers: Vec<TopPerformer>,
    pub inactivity: InactivityBreakdown,
    pub last_refreshed: DateTime<Utc>,
}

struct ScoredFarmer<'a> {
    farmer: &'a FarmerRef,
    snapshot: FarmerPerformanceSnapshot,
}

/// Score every farmer and assemble the dashboard lists and counters.
pub fn build_dashboard(
    engine: &FarmerScoringEngine,
    farmers: &[FarmerRef],
    collections: &HashMap<FarmerId, Vec<CollectionRecord>>,
    now: DateTime<Utc>,
    config: &DashboardConfig,
) -> PerformanceDashboard {
    let scored: Vec<ScoredFarmer<'_>> = farmers
        .iter()
        .map(|farmer| {
            let history = collections
                .get(&farmer.id)
                .map(Vec::as_slice)
                .unwrap_or_default();
            ScoredFarmer {
                farmer,
                snapshot: engine.compute_snapshot(farmer.id.clone(), history),
            }
        })
        .collect();

    let at_risk_farmers = at_risk(engine, &scored, now, config);
    let top_performers = top_performers(&scored, config.top_performer_limit);

    let mut inactivity = InactivityBreakdown::default();
    for entry in &scored {
        inactivity.record(days_since(entry.snapshot.last_collection_date, now));
    }

    let stats = summarize(&scored, &at_risk_farmers);

    PerformanceDashboard {
        stats,
        at_risk_farmers,
        top_performers,
        inactivity,
        last_refreshed: now,
    }
}

fn at_risk(
    engine: &FarmerScoringEngine,
    scored: &[ScoredFarmer<'_>],
    now: DateTime<Utc>,
    config: &DashboardConfig,
) -> Vec<AtRiskFarmer> {
    let mut flagged: Vec<AtRiskFarmer> = scored
        .iter()
        .filter(|entry| entry.snapshot.performance_score < config.at_risk_score_threshold)
        .map(|entry| {
            let assessment = engine.compute_risk(&entry.snapshot, now);
            at_risk_entry(entry, assessment, now)
        })
        .collect();

    flagged.sort_by(|left, right| right.risk_score.cmp(&left.risk_score));
    flagged.truncate(config.at_risk_limit);
    flagged
}

fn at_risk_entry(
    entry: &ScoredFarmer<'_>,
    assessment: RiskAssessment,
    now: DateTime<Utc>,
) -> AtRiskFarmer {
    let snapshot = &entry.snapshot;
    let issue = if snapshot.collections_count == 0 {
        "No collections recorded".to_string()
    } else {
        assessment
            .risk_factors
            .first()
            .cloned()
            .unwrap_or_else(|| "Low performance".to_string())
    };

    let idle_days = days_since(snapshot.last_collection_date, now);
    let last_collection = match idle_days {
        Some(days) => format!("{days} days ago"),
        None => "Never".to_string(),
    };

    AtRiskFarmer {
        farmer_id: snapshot.farmer_id.clone(),
        name: entry.farmer.full_name.clone(),
        score: snapshot.performance_score,
        risk: assessment.risk_level,
        risk_score: assessment.risk_score,
        risk_factors: assessment.risk_factors,
        issue,
        volume: snapshot.total_liters.round() as i64,
        avg_quality: round_to_tenth(snapshot.avg_quality_score),
        days_since_last_collection: idle_days,
        last_collection,
    }
}

fn top_performers(scored: &[ScoredFarmer<'_>], limit: usize) -> Vec<TopPerformer> {
    let mut ranked: Vec<&ScoredFarmer<'_>> = scored.iter().collect();
    ranked.sort_by(|left, right| {
        right
            .snapshot
            .performance_score
            .cmp(&left.snapshot.performance_score)
    });

    ranked
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(rank, entry)| TopPerformer {
            farmer_id: entry.snapshot.farmer_id.clone(),
            name: entry.farmer.full_name.clone(),
            score: entry.snapshot.performance_score,
            volume: entry.snapshot.total_liters,
            avg_quality: round_to_tenth(entry.snapshot.avg_quality_score),
            collections: entry.snapshot.collections_count,
            earnings: entry.snapshot.total_earnings,
            badge: if rank < 3 { Badge::Gold } else { Badge::Silver },
        })
        .collect()
}

fn summarize(scored: &[ScoredFarmer<'_>], at_risk: &[AtRiskFarmer]) -> PerformanceStats {
    let total_farmers = scored.len();
    let at_risk_farmers = at_risk.len();
    let count_level = |level: RiskLevel| at_risk.iter().filter(|farmer| farmer.risk == level).count();

    let avg_performance_score = if total_farmers == 0 {
        0
    } else {
        let sum: u64 = scored
            .iter()
            .map(|entry| u64::from(entry.snapshot.performance_score))
            .sum();
        (sum as f64 / total_farmers as f64).round() as u32
    };

    let (churn_rate, retention_rate) = if total_farmers == 0 {
        (0, 0)
    } else {
        let total = total_farmers as f64;
        (
            (at_risk_farmers as f64 / total * 100.0).round() as u32,
            ((total_farmers - at_risk_farmers) as f64 / total * 100.0).round() as u32,
        )
    };

    PerformanceStats {
        total_farmers,
        active_farmers: scored.iter().filter(|entry| entry.farmer.is_active()).count(),
        at_risk_farmers,
        critical_risk: count_level(RiskLevel::Critical),
        high_risk: count_level(RiskLevel::High),
        medium_risk: count_level(RiskLevel::Medium),
        avg_performance_score,
        churn_rate,
        retention_rate,
    }
}

fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
