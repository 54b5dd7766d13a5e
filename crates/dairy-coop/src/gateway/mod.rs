//! Persistence boundary shared by the scoring and deduction workflows.
//!
//! Workflows only ever borrow snapshots from the gateway for the duration of a
//! call; nothing is cached across calls except through an explicit cache.

mod memory;

pub use memory::InMemoryGateway;

use chrono::{DateTime, NaiveDate, Utc};

use crate::workflows::deductions::domain::{
    DeductionRecord, DeductionType, DeductionTypeDraft, DeductionTypeId, FarmerDeduction,
    NewDeductionRecord,
};
use crate::workflows::farmers::{FarmerId, FarmerRef};
use crate::workflows::performance::domain::CollectionRecord;

/// Storage abstraction so services can be exercised against any backend.
pub trait DataGateway: Send + Sync {
    fn fetch_farmer_collections(
        &self,
        farmer_id: &FarmerId,
    ) -> Result<Vec<CollectionRecord>, GatewayError>;
    fn fetch_all_farmers(&self) -> Result<Vec<FarmerRef>, GatewayError>;
    fn fetch_farmer(&self, farmer_id: &FarmerId) -> Result<Option<FarmerRef>, GatewayError>;
    /// Whether the farmer already has a collection logged on `date` (UTC).
    fn has_collection_on(&self, farmer_id: &FarmerId, date: NaiveDate)
        -> Result<bool, GatewayError>;

    fn list_deduction_types(&self) -> Result<Vec<DeductionType>, GatewayError>;
    fn fetch_deduction_type(
        &self,
        id: &DeductionTypeId,
    ) -> Result<Option<DeductionType>, GatewayError>;
    fn insert_deduction_type(
        &self,
        draft: DeductionTypeDraft,
        created_at: DateTime<Utc>,
    ) -> Result<DeductionType, GatewayError>;
    fn update_deduction_type(&self, deduction_type: DeductionType) -> Result<(), GatewayError>;
    fn delete_deduction_type(&self, id: &DeductionTypeId) -> Result<(), GatewayError>;
    /// Whether any standing deduction, active or not, references the type.
    fn deduction_type_in_use(&self, id: &DeductionTypeId) -> Result<bool, GatewayError>;

    fn fetch_farmer_deduction(
        &self,
        farmer_id: &FarmerId,
        deduction_type_id: &DeductionTypeId,
    ) -> Result<Option<FarmerDeduction>, GatewayError>;
    /// Insert or overwrite the row keyed by `(farmer_id, deduction_type_id)`.
    fn upsert_farmer_deduction(&self, deduction: FarmerDeduction) -> Result<(), GatewayError>;
    fn delete_farmer_deduction(
        &self,
        farmer_id: &FarmerId,
        deduction_type_id: &DeductionTypeId,
    ) -> Result<(), GatewayError>;
    fn list_farmer_deductions(&self) -> Result<Vec<FarmerDeduction>, GatewayError>;
    fn fetch_active_farmer_deductions(
        &self,
        farmer_id: &FarmerId,
    ) -> Result<Vec<FarmerDeduction>, GatewayError>;
    /// Active standing deductions whose `next_apply_date` is on or before `as_of`.
    fn fetch_due_farmer_deductions(
        &self,
        as_of: NaiveDate,
    ) -> Result<Vec<FarmerDeduction>, GatewayError>;
    fn update_next_apply_date(
        &self,
        farmer_id: &FarmerId,
        deduction_type_id: &DeductionTypeId,
        next_apply_date: NaiveDate,
    ) -> Result<(), GatewayError>;

    fn insert_deduction_record(
        &self,
        record: NewDeductionRecord,
    ) -> Result<DeductionRecord, GatewayError>;
    fn list_deduction_records(&self) -> Result<Vec<DeductionRecord>, GatewayError>;
    fn fetch_system_wide_deduction_records(&self) -> Result<Vec<DeductionRecord>, GatewayError>;
}

/// Error enumeration for gateway failures.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("gateway unavailable: {0}")]
    Unavailable(String),
}
