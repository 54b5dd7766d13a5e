use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::cache::TtlCache;
use super::dashboard::{build_dashboard, PerformanceDashboard};
use super::domain::{FarmerPerformanceSnapshot, RiskAssessment};
use super::scoring::FarmerScoringEngine;
use crate::clock::Clock;
use crate::config::DashboardConfig;
use crate::gateway::{DataGateway, GatewayError};
use crate::workflows::farmers::{FarmerId, FarmerRef};

const DASHBOARD_KEY: &str = "performance_dashboard";

/// Scored view of a single farmer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FarmerPerformance {
    pub farmer: FarmerRef,
    pub snapshot: FarmerPerformanceSnapshot,
    pub risk: RiskAssessment,
}

#[derive(Debug, thiserror::Error)]
pub enum PerformanceServiceError {
    #[error("farmer {0} not found")]
    FarmerNotFound(FarmerId),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Service composing the gateway, scoring engine, and dashboard cache.
pub struct PerformanceService<G> {
    gateway: Arc<G>,
    clock: Arc<dyn Clock>,
    engine: FarmerScoringEngine,
    config: DashboardConfig,
    cache: TtlCache<&'static str, PerformanceDashboard>,
}

impl<G> PerformanceService<G>
where
    G: DataGateway + 'static,
{
    pub fn new(gateway: Arc<G>, clock: Arc<dyn Clock>, config: DashboardConfig) -> Self {
        let cache = TtlCache::new(config.cache_ttl, clock.clone());
        Self {
            gateway,
            clock,
            engine: FarmerScoringEngine::new(),
            config,
            cache,
        }
    }

    pub fn farmer_performance(
        &self,
        farmer_id: &FarmerId,
    ) -> Result<FarmerPerformance, PerformanceServiceError> {
        let farmer = self
            .gateway
            .fetch_farmer(farmer_id)?
            .ok_or_else(|| PerformanceServiceError::FarmerNotFound(farmer_id.clone()))?;
        let collections = self.gateway.fetch_farmer_collections(farmer_id)?;

        let snapshot = self
            .engine
            .compute_snapshot(farmer.id.clone(), &collections);
        let risk = self.engine.compute_risk(&snapshot, self.clock.now());

        Ok(FarmerPerformance {
            farmer,
            snapshot,
            risk,
        })
    }

    /// Cached dashboard; rebuilt once the configured TTL has elapsed.
    pub fn dashboard(&self) -> Result<PerformanceDashboard, PerformanceServiceError> {
        self.cache
            .get_or_try_insert_with(&DASHBOARD_KEY, || self.build())
    }

    /// Drop the cached dashboard and rebuild it immediately.
    pub fn refresh_dashboard(&self) -> Result<PerformanceDashboard, PerformanceServiceError> {
        self.cache.invalidate(&DASHBOARD_KEY);
        let dashboard = self.build()?;
        self.cache.insert(DASHBOARD_KEY, dashboard.clone());
        Ok(dashboard)
    }

    /// Whether a collection is already logged for the farmer on `date`.
    pub fn collection_exists(
        &self,
        farmer_id: &FarmerId,
        date: NaiveDate,
    ) -> Result<bool, PerformanceServiceError> {
        Ok(self.gateway.has_collection_on(farmer_id, date)?)
    }

    fn build(&self) -> Result<PerformanceDashboard, PerformanceServiceError> {
        let farmers = self.gateway.fetch_all_farmers()?;
        let mut collections = HashMap::with_capacity(farmers.len());
        for farmer in &farmers {
            collections.insert(
                farmer.id.clone(),
                self.gateway.fetch_farmer_collections(&farmer.id)?,
            );
        }

        let dashboard = build_dashboard(
            &self.engine,
            &farmers,
            &collections,
            self.clock.now(),
            &self.config,
        );
        info!(
            total_farmers = dashboard.stats.total_farmers,
            at_risk = dashboard.stats.at_risk_farmers,
            "performance dashboard rebuilt"
        );
        Ok(dashboard)
    }
}
