use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use super::audit::{AuditAction, AuditEntry, AuditPublisher};
use super::domain::{
    DeductionRecord, DeductionRecordView, DeductionType, DeductionTypeDraft, DeductionTypeId,
    DueApplicationOutcome, FarmerDeduction, FarmerDeductionRequest, FarmerDeductionSummary,
    FarmerDeductionView, Frequency, ImmediateDeductionRequest, NewDeductionRecord,
    RecurringBatchOutcome, RecurringDeductionRequest,
};
use super::validation::{
    validate_deduction_type, validate_farmer_deduction, validate_immediate_deduction,
    validate_recurring_deduction, ValidationFailed,
};
use crate::clock::Clock;
use crate::gateway::{DataGateway, GatewayError};
use crate::workflows::farmers::{FarmerId, FarmerRef};

/// Entity a deduction operation expected to find.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MissingEntity {
    Farmer(FarmerId),
    DeductionType(DeductionTypeId),
    FarmerDeduction(FarmerId, DeductionTypeId),
}

impl std::fmt::Display for MissingEntity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MissingEntity::Farmer(_) => write!(f, "Farmer not found"),
            MissingEntity::DeductionType(_) => write!(f, "Deduction type not found"),
            MissingEntity::FarmerDeduction(farmer_id, type_id) => write!(
                f,
                "Farmer deduction not found for farmer {farmer_id} and type {type_id}"
            ),
        }
    }
}

/// Error raised by the deduction service.
#[derive(Debug, thiserror::Error)]
pub enum DeductionServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationFailed),
    #[error("{0}")]
    NotFound(MissingEntity),
    #[error("Cannot delete deduction type that is in use by farmers")]
    InUse(DeductionTypeId),
    #[error("No farmers found")]
    NoFarmers,
    #[error("schedule overflow advancing {0} deduction")]
    ScheduleOverflow(Frequency),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Service composing the gateway, audit hook, and clock for deduction management.
pub struct DeductionService<G, A> {
    gateway: Arc<G>,
    audit: Arc<A>,
    clock: Arc<dyn Clock>,
}

impl<G, A> DeductionService<G, A>
where
    G: DataGateway + 'static,
    A: AuditPublisher + 'static,
{
    pub fn new(gateway: Arc<G>, audit: Arc<A>, clock: Arc<dyn Clock>) -> Self {
        Self {
            gateway,
            audit,
            clock,
        }
    }

    /// Calendar date used when a caller does not pin one.
    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn list_deduction_types(&self) -> Result<Vec<DeductionType>, DeductionServiceError> {
        Ok(self.gateway.list_deduction_types()?)
    }

    pub fn create_deduction_type(
        &self,
        draft: DeductionTypeDraft,
        actor: Option<&str>,
    ) -> Result<DeductionType, DeductionServiceError> {
        validate_deduction_type(&draft).into_result()?;

        let created = self
            .gateway
            .insert_deduction_type(draft, self.clock.now())?;

        self.record_audit(
            AuditAction::CreateDeductionType,
            actor,
            None,
            Some(json!({ "name": created.name, "description": created.description })),
        );
        Ok(created)
    }

    pub fn update_deduction_type(
        &self,
        id: &DeductionTypeId,
        draft: DeductionTypeDraft,
        actor: Option<&str>,
    ) -> Result<DeductionType, DeductionServiceError> {
        validate_deduction_type(&draft).into_result()?;
        if id.is_blank() {
            return Err(ValidationFailed {
                errors: vec!["Deduction type ID is required".to_string()],
            }
            .into());
        }

        let existing = self.require_deduction_type(id)?;
        let updated = DeductionType {
            name: draft.name,
            description: draft.description,
            updated_at: self.clock.now(),
            ..existing.clone()
        };
        self.gateway.update_deduction_type(updated.clone())?;

        self.record_audit(
            AuditAction::UpdateDeductionType,
            actor,
            to_value(&existing),
            Some(json!({ "id": id, "name": updated.name, "description": updated.description })),
        );
        Ok(updated)
    }

    /// Delete a deduction type. Refused while any standing deduction references it.
    pub fn delete_deduction_type(
        &self,
        id: &DeductionTypeId,
        actor: Option<&str>,
    ) -> Result<(), DeductionServiceError> {
        if id.is_blank() {
            return Err(ValidationFailed {
                errors: vec!["Deduction type ID is required".to_string()],
            }
            .into());
        }

        if self.gateway.deduction_type_in_use(id)? {
            return Err(DeductionServiceError::InUse(id.clone()));
        }

        let existing = self.require_deduction_type(id)?;
        self.gateway.delete_deduction_type(id)?;

        self.record_audit(
            AuditAction::DeleteDeductionType,
            actor,
            to_value(&existing),
            None,
        );
        Ok(())
    }

    /// Create or overwrite the standing deduction for `(farmer, type)`.
    pub fn save_farmer_deduction(
        &self,
        request: FarmerDeductionRequest,
        actor: Option<&str>,
    ) -> Result<FarmerDeduction, DeductionServiceError> {
        validate_farmer_deduction(&request).into_result()?;
        let (frequency, next_apply_date) = parsed_schedule(&request.frequency, request.next_apply_date)?;

        self.require_farmer(&request.farmer_id)?;
        self.require_deduction_type(&request.deduction_type_id)?;

        let existing = self
            .gateway
            .fetch_farmer_deduction(&request.farmer_id, &request.deduction_type_id)?;

        let now = self.clock.now();
        let deduction = FarmerDeduction {
            farmer_id: request.farmer_id,
            deduction_type_id: request.deduction_type_id,
            amount: request.amount,
            frequency,
            next_apply_date,
            is_active: true,
            created_at: existing.as_ref().map_or(now, |current| current.created_at),
            updated_at: now,
        };
        self.gateway.upsert_farmer_deduction(deduction.clone())?;

        let action = if existing.is_some() {
            AuditAction::UpdateFarmerDeduction
        } else {
            AuditAction::CreateFarmerDeduction
        };
        self.record_audit(
            action,
            actor,
            existing.as_ref().and_then(to_value),
            to_value(&deduction),
        );
        Ok(deduction)
    }

    pub fn delete_farmer_deduction(
        &self,
        farmer_id: &FarmerId,
        deduction_type_id: &DeductionTypeId,
        actor: Option<&str>,
    ) -> Result<(), DeductionServiceError> {
        let existing = self
            .gateway
            .fetch_farmer_deduction(farmer_id, deduction_type_id)?
            .ok_or_else(|| {
                DeductionServiceError::NotFound(MissingEntity::FarmerDeduction(
                    farmer_id.clone(),
                    deduction_type_id.clone(),
                ))
            })?;
        self.gateway
            .delete_farmer_deduction(farmer_id, deduction_type_id)?;

        let farmer_name = self.farmer_names()?.remove(farmer_id);
        let type_name = self.type_names()?.remove(deduction_type_id);
        self.record_audit(
            AuditAction::DeleteFarmerDeduction,
            actor,
            Some(json!({
                "farmer_name": farmer_name.unwrap_or_else(|| "Unknown Farmer".to_string()),
                "deduction_type_name": type_name.unwrap_or_else(|| "Unknown Type".to_string()),
                "amount": existing.amount,
            })),
            None,
        );
        Ok(())
    }

    /// Standing deductions, newest first, with farmer and type names.
    pub fn list_farmer_deductions(&self) -> Result<Vec<FarmerDeductionView>, DeductionServiceError> {
        let farmer_names = self.farmer_names()?;
        let type_names = self.type_names()?;

        Ok(self
            .gateway
            .list_farmer_deductions()?
            .into_iter()
            .map(|deduction| FarmerDeductionView {
                farmer_name: farmer_names
                    .get(&deduction.farmer_id)
                    .cloned()
                    .unwrap_or_else(|| "Unknown Farmer".to_string()),
                deduction_type_name: type_names
                    .get(&deduction.deduction_type_id)
                    .cloned()
                    .unwrap_or_else(|| "Unknown Type".to_string()),
                deduction,
            })
            .collect())
    }

    /// Ledger entries, newest first, with farmer and type names.
    pub fn list_deduction_records(&self) -> Result<Vec<DeductionRecordView>, DeductionServiceError> {
        let farmer_names = self.farmer_names()?;
        let type_names = self.type_names()?;

        Ok(self
            .gateway
            .list_deduction_records()?
            .into_iter()
            .map(|record| DeductionRecordView {
                farmer_name: match &record.farmer_id {
                    Some(farmer_id) => farmer_names
                        .get(farmer_id)
                        .cloned()
                        .unwrap_or_else(|| "Unknown Farmer".to_string()),
                    None => "All Farmers".to_string(),
                },
                deduction_type_name: type_names
                    .get(&record.deduction_type_id)
                    .cloned()
                    .unwrap_or_else(|| "Unknown Type".to_string()),
                record,
            })
            .collect())
    }

    /// Give every farmer the same standing deduction starting on `start_date`.
    ///
    /// Preconditions (input, type, at least one farmer) abort the call. After that
    /// each farmer is attempted; failures are reported in the outcome and do not
    /// stop the batch.
    pub fn create_recurring_deduction_for_all_farmers(
        &self,
        request: RecurringDeductionRequest,
        actor: Option<&str>,
    ) -> Result<RecurringBatchOutcome, DeductionServiceError> {
        validate_recurring_deduction(&request).into_result()?;
        let (frequency, start_date) = parsed_schedule(&request.frequency, request.start_date)?;

        self.require_deduction_type(&request.deduction_type_id)?;

        let farmers = self.gateway.fetch_all_farmers()?;
        if farmers.is_empty() {
            return Err(DeductionServiceError::NoFarmers);
        }

        let now = self.clock.now();
        let mut created_count = 0;
        let mut errors = Vec::new();

        for farmer in &farmers {
            let deduction = FarmerDeduction {
                farmer_id: farmer.id.clone(),
                deduction_type_id: request.deduction_type_id.clone(),
                amount: request.amount,
                frequency,
                next_apply_date: start_date,
                is_active: true,
                created_at: now,
                updated_at: now,
            };

            match self.gateway.upsert_farmer_deduction(deduction) {
                Ok(()) => created_count += 1,
                Err(err) => {
                    warn!(farmer_id = %farmer.id, error = %err, "recurring deduction upsert failed");
                    errors.push(format!(
                        "Failed to create deduction for farmer {}: {}",
                        farmer.id, err
                    ));
                }
            }
        }

        self.record_audit(
            AuditAction::CreateRecurringDeductionAllFarmers,
            actor,
            None,
            Some(json!({
                "deduction_type_id": request.deduction_type_id,
                "amount": request.amount,
                "frequency": frequency,
                "start_date": start_date,
                "created_count": created_count,
            })),
        );
        info!(
            deduction_type_id = %request.deduction_type_id,
            created_count,
            failed = errors.len(),
            "recurring deduction batch finished"
        );

        Ok(RecurringBatchOutcome {
            success: true,
            created_count,
            errors,
        })
    }

    /// Record a one-off charge that applies to every farmer.
    pub fn apply_immediate_deduction(
        &self,
        request: ImmediateDeductionRequest,
        applied_by: &str,
    ) -> Result<DeductionRecord, DeductionServiceError> {
        validate_immediate_deduction(&request).into_result()?;
        self.require_deduction_type(&request.deduction_type_id)?;

        let record = self.gateway.insert_deduction_record(NewDeductionRecord {
            deduction_type_id: request.deduction_type_id,
            farmer_id: None,
            amount: request.amount,
            reason: request.reason,
            applied_by: applied_by.to_string(),
            applied_at: self.clock.now(),
        })?;

        self.record_audit(
            AuditAction::ApplyImmediateDeduction,
            Some(applied_by),
            None,
            to_value(&record),
        );
        Ok(record)
    }

    pub fn active_deductions_for_farmer(
        &self,
        farmer_id: &FarmerId,
    ) -> Result<Vec<FarmerDeduction>, DeductionServiceError> {
        require_farmer_id(farmer_id)?;
        Ok(self.gateway.fetch_active_farmer_deductions(farmer_id)?)
    }

    /// Charge every active standing deduction due on or before `today`.
    ///
    /// The ledger insert and the schedule update are separate gateway writes. If the
    /// update fails after the insert succeeded, the deduction stays due and will be
    /// charged again on the next run (at-least-once).
    pub fn apply_due_recurring_deductions(
        &self,
        applied_by: &str,
        today: NaiveDate,
    ) -> Result<DueApplicationOutcome, DeductionServiceError> {
        let due = self.gateway.fetch_due_farmer_deductions(today)?;
        let mut type_names: HashMap<DeductionTypeId, Option<String>> = HashMap::new();
        let mut applied_count = 0;
        let mut errors = Vec::new();

        for deduction in due {
            let type_name = match type_names.get(&deduction.deduction_type_id) {
                Some(name) => name.clone(),
                None => {
                    let name = self
                        .gateway
                        .fetch_deduction_type(&deduction.deduction_type_id)
                        .ok()
                        .flatten()
                        .map(|deduction_type| deduction_type.name);
                    type_names.insert(deduction.deduction_type_id.clone(), name.clone());
                    name
                }
            };

            match self.apply_one(&deduction, type_name.as_deref(), applied_by) {
                Ok(()) => applied_count += 1,
                Err(err) => {
                    warn!(
                        farmer_id = %deduction.farmer_id,
                        deduction_type_id = %deduction.deduction_type_id,
                        error = %err,
                        "recurring deduction not applied"
                    );
                    errors.push(format!(
                        "Failed to apply deduction for farmer {}: {}",
                        deduction.farmer_id, err
                    ));
                }
            }
        }

        info!(%today, applied_count, failed = errors.len(), "due deductions applied");

        Ok(DueApplicationOutcome {
            success: true,
            applied_count,
            errors,
        })
    }

    fn apply_one(
        &self,
        deduction: &FarmerDeduction,
        type_name: Option<&str>,
        applied_by: &str,
    ) -> Result<(), DeductionServiceError> {
        let next_apply_date = deduction
            .frequency
            .advance(deduction.next_apply_date)
            .ok_or(DeductionServiceError::ScheduleOverflow(deduction.frequency))?;

        self.gateway.insert_deduction_record(NewDeductionRecord {
            deduction_type_id: deduction.deduction_type_id.clone(),
            farmer_id: Some(deduction.farmer_id.clone()),
            amount: deduction.amount,
            reason: format!(
                "Recurring {} - {} deduction",
                type_name.unwrap_or("deduction"),
                deduction.frequency
            ),
            applied_by: applied_by.to_string(),
            applied_at: self.clock.now(),
        })?;

        self.gateway.update_next_apply_date(
            &deduction.farmer_id,
            &deduction.deduction_type_id,
            next_apply_date,
        )?;
        Ok(())
    }

    /// Active standing amounts for the farmer plus every system-wide ledger charge.
    ///
    /// The two terms are different quantities (scheduled vs. already charged); the
    /// sum is the figure the payments screens have always shown.
    pub fn calculate_total_deductions_for_farmer(
        &self,
        farmer_id: &FarmerId,
    ) -> Result<f64, DeductionServiceError> {
        let standing: f64 = self
            .active_deductions_for_farmer(farmer_id)?
            .iter()
            .map(|deduction| deduction.amount)
            .sum();
        Ok(standing + self.system_wide_total()?)
    }

    /// Every farmer, ordered by name, with active deductions and combined totals.
    pub fn farmers_with_deductions(
        &self,
    ) -> Result<Vec<FarmerDeductionSummary>, DeductionServiceError> {
        let mut farmers = self.gateway.fetch_all_farmers()?;
        farmers.sort_by(|left, right| left.full_name.cmp(&right.full_name));

        let mut by_farmer: HashMap<FarmerId, Vec<FarmerDeduction>> = HashMap::new();
        for deduction in self.gateway.list_farmer_deductions()? {
            if deduction.is_active {
                by_farmer
                    .entry(deduction.farmer_id.clone())
                    .or_default()
                    .push(deduction);
            }
        }
        let system_wide = self.system_wide_total()?;

        Ok(farmers
            .into_iter()
            .map(|farmer| {
                let deductions = by_farmer.remove(&farmer.id).unwrap_or_default();
                let standing: f64 = deductions.iter().map(|deduction| deduction.amount).sum();
                FarmerDeductionSummary {
                    farmer_id: farmer.id,
                    full_name: farmer.full_name,
                    deductions,
                    total_deductions: standing + system_wide,
                }
            })
            .collect())
    }

    fn system_wide_total(&self) -> Result<f64, DeductionServiceError> {
        Ok(self
            .gateway
            .fetch_system_wide_deduction_records()?
            .iter()
            .map(|record| record.amount)
            .sum())
    }

    fn require_farmer(&self, farmer_id: &FarmerId) -> Result<FarmerRef, DeductionServiceError> {
        self.gateway
            .fetch_farmer(farmer_id)?
            .ok_or_else(|| DeductionServiceError::NotFound(MissingEntity::Farmer(farmer_id.clone())))
    }

    fn require_deduction_type(
        &self,
        id: &DeductionTypeId,
    ) -> Result<DeductionType, DeductionServiceError> {
        self.gateway.fetch_deduction_type(id)?.ok_or_else(|| {
            DeductionServiceError::NotFound(MissingEntity::DeductionType(id.clone()))
        })
    }

    fn farmer_names(&self) -> Result<HashMap<FarmerId, String>, DeductionServiceError> {
        Ok(self
            .gateway
            .fetch_all_farmers()?
            .into_iter()
            .map(|farmer| (farmer.id, farmer.full_name))
            .collect())
    }

    fn type_names(&self) -> Result<HashMap<DeductionTypeId, String>, DeductionServiceError> {
        Ok(self
            .gateway
            .list_deduction_types()?
            .into_iter()
            .map(|deduction_type| (deduction_type.id, deduction_type.name))
            .collect())
    }

    fn record_audit(
        &self,
        action: AuditAction,
        actor: Option<&str>,
        old_data: Option<Value>,
        new_data: Option<Value>,
    ) {
        let entry = AuditEntry {
            action,
            actor: actor.map(str::to_string),
            old_data,
            new_data,
            recorded_at: self.clock.now(),
        };
        if let Err(err) = self.audit.publish(entry) {
            warn!(?action, error = %err, "failed to record deduction audit entry");
        }
    }
}

fn require_farmer_id(farmer_id: &FarmerId) -> Result<(), ValidationFailed> {
    if farmer_id.is_blank() {
        return Err(ValidationFailed {
            errors: vec!["Farmer ID is required".to_string()],
        });
    }
    Ok(())
}

/// Frequency and date after a gate has accepted them.
fn parsed_schedule(
    frequency: &str,
    date: Option<NaiveDate>,
) -> Result<(Frequency, NaiveDate), ValidationFailed> {
    match (Frequency::parse(frequency), date) {
        (Some(frequency), Some(date)) => Ok((frequency, date)),
        _ => Err(ValidationFailed {
            errors: vec!["Invalid schedule".to_string()],
        }),
    }
}

fn to_value<T: Serialize>(value: &T) -> Option<Value> {
    serde_json::to_value(value).ok()
}
