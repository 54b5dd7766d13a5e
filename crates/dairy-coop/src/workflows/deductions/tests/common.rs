use std::sync::{Arc, Mutex};

use chrono::{DateTime, NaiveDate, Utc};

use crate::clock::FixedClock;
use crate::gateway::{DataGateway, GatewayError, InMemoryGateway};
use crate::workflows::deductions::audit::{AuditEntry, AuditError, AuditPublisher};
use crate::workflows::deductions::domain::{
    DeductionRecord, DeductionType, DeductionTypeDraft, DeductionTypeId, FarmerDeduction,
    FarmerDeductionRequest, NewDeductionRecord, RecurringDeductionRequest,
};
use crate::workflows::deductions::service::DeductionService;
use crate::workflows::farmers::{FarmerId, FarmerRef, KycStatus};
use crate::workflows::performance::domain::CollectionRecord;

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn today() -> NaiveDate {
    date(2024, 3, 15)
}

pub(super) fn farmer(id: &str, name: &str) -> FarmerRef {
    FarmerRef {
        id: FarmerId::new(id),
        full_name: name.to_string(),
        registration_number: format!("REG-{id}"),
        kyc_status: KycStatus::Approved,
    }
}

pub(super) fn seeded_gateway() -> InMemoryGateway {
    let gateway = InMemoryGateway::new();
    for (id, name) in [
        ("f-001", "Wanjiru Kamau"),
        ("f-002", "Otieno Ochieng"),
        ("f-003", "Achieng Atieno"),
        ("f-004", "Mutua Musyoka"),
        ("f-005", "Chebet Kiprono"),
    ] {
        gateway.add_farmer(farmer(id, name));
    }
    gateway
}

pub(super) fn transport_levy() -> DeductionTypeDraft {
    DeductionTypeDraft {
        name: "Transport levy".to_string(),
        description: "Collection route transport".to_string(),
    }
}

pub(super) fn farmer_request(
    farmer_id: &str,
    type_id: &DeductionTypeId,
    amount: f64,
    frequency: &str,
) -> FarmerDeductionRequest {
    FarmerDeductionRequest {
        farmer_id: FarmerId::new(farmer_id),
        deduction_type_id: type_id.clone(),
        amount,
        frequency: frequency.to_string(),
        next_apply_date: Some(today()),
    }
}

pub(super) fn recurring_request(type_id: &DeductionTypeId) -> RecurringDeductionRequest {
    RecurringDeductionRequest {
        deduction_type_id: type_id.clone(),
        amount: 250.0,
        frequency: "monthly".to_string(),
        start_date: Some(date(2024, 4, 1)),
    }
}

#[derive(Default)]
pub(super) struct MemoryAudit {
    entries: Mutex<Vec<AuditEntry>>,
}

impl AuditPublisher for MemoryAudit {
    fn publish(&self, entry: AuditEntry) -> Result<(), AuditError> {
        self.entries
            .lock()
            .expect("audit mutex poisoned")
            .push(entry);
        Ok(())
    }
}

impl MemoryAudit {
    pub(super) fn entries(&self) -> Vec<AuditEntry> {
        self.entries.lock().expect("audit mutex poisoned").clone()
    }
}

pub(super) struct FailingAudit;

impl AuditPublisher for FailingAudit {
    fn publish(&self, _entry: AuditEntry) -> Result<(), AuditError> {
        Err(AuditError::Transport("audit table offline".to_string()))
    }
}

pub(super) type TestService = DeductionService<InMemoryGateway, MemoryAudit>;

pub(super) struct Harness {
    pub(super) service: Arc<TestService>,
    pub(super) gateway: Arc<InMemoryGateway>,
    pub(super) audit: Arc<MemoryAudit>,
}

pub(super) fn harness() -> Harness {
    let gateway = Arc::new(seeded_gateway());
    let audit = Arc::new(MemoryAudit::default());
    let clock = Arc::new(FixedClock::at_date(today()));
    let service = Arc::new(DeductionService::new(
        gateway.clone(),
        audit.clone(),
        clock,
    ));
    Harness {
        service,
        gateway,
        audit,
    }
}

/// Gateway that delegates to memory but refuses writes for one farmer.
pub(super) struct FlakyGateway {
    pub(super) inner: InMemoryGateway,
    pub(super) failing_farmer: FarmerId,
    pub(super) fail_schedule_updates: bool,
}

impl FlakyGateway {
    pub(super) fn failing_for(farmer_id: &str) -> Self {
        Self {
            inner: seeded_gateway(),
            failing_farmer: FarmerId::new(farmer_id),
            fail_schedule_updates: false,
        }
    }

    fn refuse(&self, farmer_id: &FarmerId) -> Result<(), GatewayError> {
        if farmer_id == &self.failing_farmer {
            Err(GatewayError::Unavailable("write timeout".to_string()))
        } else {
            Ok(())
        }
    }
}

impl DataGateway for FlakyGateway {
    fn fetch_farmer_collections(
        &self,
        farmer_id: &FarmerId,
    ) -> Result<Vec<CollectionRecord>, GatewayError> {
        self.inner.fetch_farmer_collections(farmer_id)
    }

    fn fetch_all_farmers(&self) -> Result<Vec<FarmerRef>, GatewayError> {
        self.inner.fetch_all_farmers()
    }

    fn fetch_farmer(&self, farmer_id: &FarmerId) -> Result<Option<FarmerRef>, GatewayError> {
        self.inner.fetch_farmer(farmer_id)
    }

    fn has_collection_on(&self, farmer_id: &FarmerId, date: NaiveDate) -> Result<bool, GatewayError> {
        self.inner.has_collection_on(farmer_id, date)
    }

    fn list_deduction_types(&self) -> Result<Vec<DeductionType>, GatewayError> {
        self.inner.list_deduction_types()
    }

    fn fetch_deduction_type(
        &self,
        id: &DeductionTypeId,
    ) -> Result<Option<DeductionType>, GatewayError> {
        self.inner.fetch_deduction_type(id)
    }

    fn insert_deduction_type(
        &self,
        draft: DeductionTypeDraft,
        created_at: DateTime<Utc>,
    ) -> Result<DeductionType, GatewayError> {
        self.inner.insert_deduction_type(draft, created_at)
    }

    fn update_deduction_type(&self, deduction_type: DeductionType) -> Result<(), GatewayError> {
        self.inner.update_deduction_type(deduction_type)
    }

    fn delete_deduction_type(&self, id: &DeductionTypeId) -> Result<(), GatewayError> {
        self.inner.delete_deduction_type(id)
    }

    fn deduction_type_in_use(&self, id: &DeductionTypeId) -> Result<bool, GatewayError> {
        self.inner.deduction_type_in_use(id)
    }

    fn fetch_farmer_deduction(
        &self,
        farmer_id: &FarmerId,
        deduction_type_id: &DeductionTypeId,
    ) -> Result<Option<FarmerDeduction>, GatewayError> {
        self.inner.fetch_farmer_deduction(farmer_id, deduction_type_id)
    }

    fn upsert_farmer_deduction(&self, deduction: FarmerDeduction) -> Result<(), GatewayError> {
        self.refuse(&deduction.farmer_id)?;
        self.inner.upsert_farmer_deduction(deduction)
    }

    fn delete_farmer_deduction(
        &self,
        farmer_id: &FarmerId,
        deduction_type_id: &DeductionTypeId,
    ) -> Result<(), GatewayError> {
        self.inner.delete_farmer_deduction(farmer_id, deduction_type_id)
    }

    fn list_farmer_deductions(&self) -> Result<Vec<FarmerDeduction>, GatewayError> {
        self.inner.list_farmer_deductions()
    }

    fn fetch_active_farmer_deductions(
        &self,
        farmer_id: &FarmerId,
    ) -> Result<Vec<FarmerDeduction>, GatewayError> {
        self.inner.fetch_active_farmer_deductions(farmer_id)
    }

    fn fetch_due_farmer_deductions(
        &self,
        as_of: NaiveDate,
    ) -> Result<Vec<FarmerDeduction>, GatewayError> {
        self.inner.fetch_due_farmer_deductions(as_of)
    }

    fn update_next_apply_date(
        &self,
        farmer_id: &FarmerId,
        deduction_type_id: &DeductionTypeId,
        next_apply_date: NaiveDate,
    ) -> Result<(), GatewayError> {
        if self.fail_schedule_updates {
            return Err(GatewayError::Unavailable("schedule table locked".to_string()));
        }
        self.inner
            .update_next_apply_date(farmer_id, deduction_type_id, next_apply_date)
    }

    fn insert_deduction_record(
        &self,
        record: NewDeductionRecord,
    ) -> Result<DeductionRecord, GatewayError> {
        if let Some(farmer_id) = &record.farmer_id {
            self.refuse(farmer_id)?;
        }
        self.inner.insert_deduction_record(record)
    }

    fn list_deduction_records(&self) -> Result<Vec<DeductionRecord>, GatewayError> {
        self.inner.list_deduction_records()
    }

    fn fetch_system_wide_deduction_records(&self) -> Result<Vec<DeductionRecord>, GatewayError> {
        self.inner.fetch_system_wide_deduction_records()
    }
}

pub(super) fn flaky_service(
    gateway: Arc<FlakyGateway>,
) -> DeductionService<FlakyGateway, MemoryAudit> {
    DeductionService::new(
        gateway,
        Arc::new(MemoryAudit::default()),
        Arc::new(FixedClock::at_date(today())),
    )
}

pub(super) async fn read_json_body(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) fn json_request(
    method: axum::http::Method,
    uri: &str,
    body: serde_json::Value,
) -> axum::http::Request<axum::body::Body> {
    axum::http::Request::builder()
        .method(method)
        .uri(uri)
        .header(axum::http::header::CONTENT_TYPE, "application/json")
        .header(crate::workflows::deductions::router::ACTOR_HEADER, "admin-1")
        .body(axum::body::Body::from(
            serde_json::to_vec(&body).expect("serialize body"),
        ))
        .expect("request builds")
}
