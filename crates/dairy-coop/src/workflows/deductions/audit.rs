use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Administrative change captured for the deductions audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    CreateDeductionType,
    UpdateDeductionType,
    DeleteDeductionType,
    CreateFarmerDeduction,
    UpdateFarmerDeduction,
    DeleteFarmerDeduction,
    CreateRecurringDeductionAllFarmers,
    ApplyImmediateDeduction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub action: AuditAction,
    pub actor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_data: Option<Value>,
    pub recorded_at: DateTime<Utc>,
}

/// Outbound hook for audit entries (database table, log shipper, ...).
pub trait AuditPublisher: Send + Sync {
    fn publish(&self, entry: AuditEntry) -> Result<(), AuditError>;
}

#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("audit sink unavailable: {0}")]
    Transport(String),
}
