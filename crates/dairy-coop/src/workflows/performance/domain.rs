use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::workflows::farmers::FarmerId;

/// Milk quality grade assigned at the collection point.
///
/// Unrecognised grades are kept verbatim so they can be audited; they score zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QualityGrade {
    APlus,
    A,
    B,
    C,
    Unknown(String),
}

impl QualityGrade {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "A+" => QualityGrade::APlus,
            "A" => QualityGrade::A,
            "B" => QualityGrade::B,
            "C" => QualityGrade::C,
            other => QualityGrade::Unknown(other.to_string()),
        }
    }

    /// Numeric value on the 0–4 scale used by the performance score.
    pub fn score(&self) -> f64 {
        match self {
            QualityGrade::APlus => 4.0,
            QualityGrade::A => 3.0,
            QualityGrade::B => 2.0,
            QualityGrade::C => 1.0,
            QualityGrade::Unknown(_) => 0.0,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            QualityGrade::APlus => "A+",
            QualityGrade::A => "A",
            QualityGrade::B => "B",
            QualityGrade::C => "C",
            QualityGrade::Unknown(raw) => raw,
        }
    }
}

impl fmt::Display for QualityGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for QualityGrade {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for QualityGrade {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(QualityGrade::parse(&raw))
    }
}

/// A single logged milk delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionRecord {
    pub farmer_id: FarmerId,
    pub liters: f64,
    pub quality_grade: QualityGrade,
    pub total_amount: f64,
    pub collection_date: DateTime<Utc>,
}

/// Derived per-farmer metrics, recomputed on every scoring run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FarmerPerformanceSnapshot {
    pub farmer_id: FarmerId,
    pub performance_score: u32,
    pub total_liters: f64,
    pub total_earnings: f64,
    pub avg_quality_score: f64,
    pub collections_count: usize,
    pub collection_frequency_per_week: f64,
    /// Distinct collection days per active week, as a percentage. Not clamped.
    pub consistency_score_percent: f64,
    pub last_collection_date: Option<DateTime<Utc>>,
}

impl FarmerPerformanceSnapshot {
    pub fn empty(farmer_id: FarmerId) -> Self {
        Self {
            farmer_id,
            performance_score: 0,
            total_liters: 0.0,
            total_earnings: 0.0,
            avg_quality_score: 0.0,
            collections_count: 0,
            collection_frequency_per_week: 0.0,
            consistency_score_percent: 0.0,
            last_collection_date: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn from_score(risk_score: u32) -> Self {
        if risk_score >= 50 {
            RiskLevel::Critical
        } else if risk_score >= 30 {
            RiskLevel::High
        } else if risk_score >= 15 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }
}

/// Risk classification derived from a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub risk_level: RiskLevel,
    pub risk_score: u32,
    /// At most two messages, in rule evaluation order.
    pub risk_factors: Vec<String>,
}
