//! Farmer performance scoring, churn-risk assessment, and the cooperative dashboard.

pub mod cache;
pub mod dashboard;
pub mod domain;
pub mod importer;
pub mod router;
pub mod scoring;
pub mod service;

#[cfg(test)]
mod tests;

pub use cache::TtlCache;
pub use dashboard::{
    build_dashboard, AtRiskFarmer, Badge, InactivityBreakdown, PerformanceDashboard,
    PerformanceStats, TopPerformer,
};
pub use domain::{
    CollectionRecord, FarmerPerformanceSnapshot, QualityGrade, RiskAssessment, RiskLevel,
};
pub use importer::{CollectionImportError, CollectionImporter};
pub use router::{performance_router, CollectionDateQuery};
pub use scoring::FarmerScoringEngine;
pub use service::{FarmerPerformance, PerformanceService, PerformanceServiceError};
