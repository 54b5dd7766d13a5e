use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, NaiveDate, Utc};

use super::{DataGateway, GatewayError};
use crate::workflows::deductions::domain::{
    DeductionRecord, DeductionType, DeductionTypeDraft, DeductionTypeId, FarmerDeduction,
    NewDeductionRecord,
};
use crate::workflows::farmers::{FarmerId, FarmerRef};
use crate::workflows::performance::domain::CollectionRecord;

type DeductionKey = (FarmerId, DeductionTypeId);

#[derive(Default)]
struct GatewayState {
    farmers: Vec<FarmerRef>,
    collections: Vec<CollectionRecord>,
    deduction_types: BTreeMap<DeductionTypeId, DeductionType>,
    farmer_deductions: BTreeMap<DeductionKey, FarmerDeduction>,
    records: Vec<DeductionRecord>,
    type_sequence: u64,
    record_sequence: u64,
}

/// Process-local gateway used by the demo server, CLI, and tests.
#[derive(Default)]
pub struct InMemoryGateway {
    state: Mutex<GatewayState>,
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, GatewayState> {
        self.state.lock().expect("gateway mutex poisoned")
    }

    /// Register a farmer, replacing any existing farmer with the same id.
    pub fn add_farmer(&self, farmer: FarmerRef) {
        let mut state = self.state();
        match state.farmers.iter_mut().find(|known| known.id == farmer.id) {
            Some(existing) => *existing = farmer,
            None => state.farmers.push(farmer),
        }
    }

    pub fn add_collection(&self, record: CollectionRecord) {
        self.state().collections.push(record);
    }

    pub fn add_collections(&self, records: impl IntoIterator<Item = CollectionRecord>) {
        self.state().collections.extend(records);
    }

    pub fn farmer_deduction_count(&self) -> usize {
        self.state().farmer_deductions.len()
    }
}

impl DataGateway for InMemoryGateway {
    fn fetch_farmer_collections(
        &self,
        farmer_id: &FarmerId,
    ) -> Result<Vec<CollectionRecord>, GatewayError> {
        Ok(self
            .state()
            .collections
            .iter()
            .filter(|record| &record.farmer_id == farmer_id)
            .cloned()
            .collect())
    }

    fn fetch_all_farmers(&self) -> Result<Vec<FarmerRef>, GatewayError> {
        Ok(self.state().farmers.clone())
    }

    fn fetch_farmer(&self, farmer_id: &FarmerId) -> Result<Option<FarmerRef>, GatewayError> {
        Ok(self
            .state()
            .farmers
            .iter()
            .find(|farmer| &farmer.id == farmer_id)
            .cloned())
    }

    fn has_collection_on(
        &self,
        farmer_id: &FarmerId,
        date: NaiveDate,
    ) -> Result<bool, GatewayError> {
        Ok(self.state().collections.iter().any(|record| {
            &record.farmer_id == farmer_id && record.collection_date.date_naive() == date
        }))
    }

    fn list_deduction_types(&self) -> Result<Vec<DeductionType>, GatewayError> {
        let mut types: Vec<DeductionType> =
            self.state().deduction_types.values().cloned().collect();
        types.sort_by(|left, right| left.name.cmp(&right.name));
        Ok(types)
    }

    fn fetch_deduction_type(
        &self,
        id: &DeductionTypeId,
    ) -> Result<Option<DeductionType>, GatewayError> {
        Ok(self.state().deduction_types.get(id).cloned())
    }

    fn insert_deduction_type(
        &self,
        draft: DeductionTypeDraft,
        created_at: DateTime<Utc>,
    ) -> Result<DeductionType, GatewayError> {
        let mut state = self.state();
        state.type_sequence += 1;
        let id = DeductionTypeId(format!("dt-{:04}", state.type_sequence));
        if state.deduction_types.contains_key(&id) {
            return Err(GatewayError::Conflict);
        }

        let deduction_type = DeductionType {
            id: id.clone(),
            name: draft.name,
            description: draft.description,
            is_active: true,
            created_at,
            updated_at: created_at,
        };
        state.deduction_types.insert(id, deduction_type.clone());
        Ok(deduction_type)
    }

    fn update_deduction_type(&self, deduction_type: DeductionType) -> Result<(), GatewayError> {
        let mut state = self.state();
        match state.deduction_types.get_mut(&deduction_type.id) {
            Some(existing) => {
                *existing = deduction_type;
                Ok(())
            }
            None => Err(GatewayError::NotFound),
        }
    }

    fn delete_deduction_type(&self, id: &DeductionTypeId) -> Result<(), GatewayError> {
        self.state()
            .deduction_types
            .remove(id)
            .map(|_| ())
            .ok_or(GatewayError::NotFound)
    }

    fn deduction_type_in_use(&self, id: &DeductionTypeId) -> Result<bool, GatewayError> {
        Ok(self
            .state()
            .farmer_deductions
            .keys()
            .any(|(_, type_id)| type_id == id))
    }

    fn fetch_farmer_deduction(
        &self,
        farmer_id: &FarmerId,
        deduction_type_id: &DeductionTypeId,
    ) -> Result<Option<FarmerDeduction>, GatewayError> {
        Ok(self
            .state()
            .farmer_deductions
            .get(&(farmer_id.clone(), deduction_type_id.clone()))
            .cloned())
    }

    fn upsert_farmer_deduction(&self, mut deduction: FarmerDeduction) -> Result<(), GatewayError> {
        let key = (
            deduction.farmer_id.clone(),
            deduction.deduction_type_id.clone(),
        );
        let mut state = self.state();
        if let Some(existing) = state.farmer_deductions.get(&key) {
            deduction.created_at = existing.created_at;
        }
        state.farmer_deductions.insert(key, deduction);
        Ok(())
    }

    fn delete_farmer_deduction(
        &self,
        farmer_id: &FarmerId,
        deduction_type_id: &DeductionTypeId,
    ) -> Result<(), GatewayError> {
        self.state()
            .farmer_deductions
            .remove(&(farmer_id.clone(), deduction_type_id.clone()))
            .map(|_| ())
            .ok_or(GatewayError::NotFound)
    }

    fn list_farmer_deductions(&self) -> Result<Vec<FarmerDeduction>, GatewayError> {
        let mut deductions: Vec<FarmerDeduction> =
            self.state().farmer_deductions.values().cloned().collect();
        deductions.sort_by(|left, right| right.created_at.cmp(&left.created_at));
        Ok(deductions)
    }

    fn fetch_active_farmer_deductions(
        &self,
        farmer_id: &FarmerId,
    ) -> Result<Vec<FarmerDeduction>, GatewayError> {
        Ok(self
            .state()
            .farmer_deductions
            .values()
            .filter(|deduction| &deduction.farmer_id == farmer_id && deduction.is_active)
            .cloned()
            .collect())
    }

    fn fetch_due_farmer_deductions(
        &self,
        as_of: NaiveDate,
    ) -> Result<Vec<FarmerDeduction>, GatewayError> {
        Ok(self
            .state()
            .farmer_deductions
            .values()
            .filter(|deduction| deduction.is_active && deduction.next_apply_date <= as_of)
            .cloned()
            .collect())
    }

    fn update_next_apply_date(
        &self,
        farmer_id: &FarmerId,
        deduction_type_id: &DeductionTypeId,
        next_apply_date: NaiveDate,
    ) -> Result<(), GatewayError> {
        let mut state = self.state();
        match state
            .farmer_deductions
            .get_mut(&(farmer_id.clone(), deduction_type_id.clone()))
        {
            Some(deduction) => {
                deduction.next_apply_date = next_apply_date;
                Ok(())
            }
            None => Err(GatewayError::NotFound),
        }
    }

    fn insert_deduction_record(
        &self,
        record: NewDeductionRecord,
    ) -> Result<DeductionRecord, GatewayError> {
        let mut state = self.state();
        state.record_sequence += 1;
        let stored = DeductionRecord {
            id: format!("rec-{:06}", state.record_sequence),
            deduction_type_id: record.deduction_type_id,
            farmer_id: record.farmer_id,
            amount: record.amount,
            reason: record.reason,
            applied_by: record.applied_by,
            applied_at: record.applied_at,
        };
        state.records.push(stored.clone());
        Ok(stored)
    }

    fn list_deduction_records(&self) -> Result<Vec<DeductionRecord>, GatewayError> {
        let mut records = self.state().records.clone();
        records.sort_by(|left, right| right.applied_at.cmp(&left.applied_at));
        Ok(records)
    }

    fn fetch_system_wide_deduction_records(&self) -> Result<Vec<DeductionRecord>, GatewayError> {
        Ok(self
            .state()
            .records
            .iter()
            .filter(|record| record.is_system_wide())
            .cloned()
            .collect())
    }
}
