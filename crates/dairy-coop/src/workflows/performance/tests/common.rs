use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

use crate::clock::FixedClock;
use crate::config::DashboardConfig;
use crate::gateway::InMemoryGateway;
use crate::workflows::farmers::{FarmerId, FarmerRef, KycStatus};
use crate::workflows::performance::domain::{CollectionRecord, QualityGrade};
use crate::workflows::performance::service::PerformanceService;

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0)
        .single()
        .expect("valid instant")
}

pub(super) fn days_ago(days: i64) -> DateTime<Utc> {
    now() - Duration::days(days)
}

pub(super) fn collection(
    farmer_id: &str,
    liters: f64,
    grade: &str,
    at: DateTime<Utc>,
) -> CollectionRecord {
    CollectionRecord {
        farmer_id: FarmerId::new(farmer_id),
        liters,
        quality_grade: QualityGrade::parse(grade),
        total_amount: liters * 50.0,
        collection_date: at,
    }
}

/// Two deliveries a week apart: 500 L grade A and 300 L grade B.
pub(super) fn two_collection_history(farmer_id: &str) -> Vec<CollectionRecord> {
    vec![
        collection(farmer_id, 500.0, "A", days_ago(10)),
        collection(farmer_id, 300.0, "B", days_ago(3)),
    ]
}

/// Daily grade A+ deliveries of 400 L over the last four weeks.
pub(super) fn steady_history(farmer_id: &str) -> Vec<CollectionRecord> {
    (1..=28)
        .map(|day| collection(farmer_id, 400.0, "A+", days_ago(day)))
        .collect()
}

pub(super) fn farmer(id: &str, name: &str, kyc_status: KycStatus) -> FarmerRef {
    FarmerRef {
        id: FarmerId::new(id),
        full_name: name.to_string(),
        registration_number: format!("REG-{id}"),
        kyc_status,
    }
}

pub(super) fn group(records: Vec<CollectionRecord>) -> HashMap<FarmerId, Vec<CollectionRecord>> {
    let mut grouped: HashMap<FarmerId, Vec<CollectionRecord>> = HashMap::new();
    for record in records {
        grouped
            .entry(record.farmer_id.clone())
            .or_default()
            .push(record);
    }
    grouped
}

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) struct Harness {
    pub(super) service: Arc<PerformanceService<InMemoryGateway>>,
    pub(super) gateway: Arc<InMemoryGateway>,
    pub(super) clock: Arc<FixedClock>,
}

/// Three farmers: a steady supplier, a weekly supplier, and one who never delivered.
pub(super) fn harness() -> Harness {
    let gateway = Arc::new(InMemoryGateway::new());
    gateway.add_farmer(farmer("f-001", "Wanjiru Kamau", KycStatus::Approved));
    gateway.add_farmer(farmer("f-002", "Otieno Ochieng", KycStatus::Approved));
    gateway.add_farmer(farmer("f-003", "Achieng Atieno", KycStatus::Pending));
    gateway.add_collections(steady_history("f-001"));
    gateway.add_collections(two_collection_history("f-002"));

    let clock = Arc::new(FixedClock::new(now()));
    let service = Arc::new(PerformanceService::new(
        gateway.clone(),
        clock.clone(),
        DashboardConfig::default(),
    ));
    Harness {
        service,
        gateway,
        clock,
    }
}
