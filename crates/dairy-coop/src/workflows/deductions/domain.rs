use chrono::{DateTime, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::workflows::farmers::FarmerId;

/// Identifier wrapper for admin-defined deduction categories.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeductionTypeId(pub String);

impl DeductionTypeId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for DeductionTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Category of charge (e.g. transport levy, AI services, feed credit).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionType {
    pub id: DeductionTypeId,
    pub name: String,
    pub description: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields an admin supplies when creating or renaming a deduction type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionTypeDraft {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Recurrence interval of a standing deduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "daily" => Some(Frequency::Daily),
            "weekly" => Some(Frequency::Weekly),
            "monthly" => Some(Frequency::Monthly),
            "yearly" => Some(Frequency::Yearly),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
            Frequency::Yearly => "yearly",
        }
    }

    /// The date one period after `from`. Month arithmetic clamps to the last day
    /// of a shorter month, so Jan 31 + 1 month is Feb 28 (or 29).
    pub fn advance(self, from: NaiveDate) -> Option<NaiveDate> {
        match self {
            Frequency::Daily => from.checked_add_days(chrono::Days::new(1)),
            Frequency::Weekly => from.checked_add_days(chrono::Days::new(7)),
            Frequency::Monthly => from.checked_add_months(Months::new(1)),
            Frequency::Yearly => from.checked_add_months(Months::new(12)),
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Standing instruction to charge a farmer on a recurring schedule.
///
/// At most one exists per `(farmer_id, deduction_type_id)` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FarmerDeduction {
    pub farmer_id: FarmerId,
    pub deduction_type_id: DeductionTypeId,
    pub amount: f64,
    pub frequency: Frequency,
    pub next_apply_date: NaiveDate,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Append-only ledger entry for an applied charge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeductionRecord {
    pub id: String,
    pub deduction_type_id: DeductionTypeId,
    /// `None` marks a system-wide charge that applies to every farmer.
    pub farmer_id: Option<FarmerId>,
    pub amount: f64,
    pub reason: String,
    pub applied_by: String,
    pub applied_at: DateTime<Utc>,
}

impl DeductionRecord {
    pub fn is_system_wide(&self) -> bool {
        self.farmer_id.is_none()
    }
}

/// Ledger entry before the gateway assigns its identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDeductionRecord {
    pub deduction_type_id: DeductionTypeId,
    pub farmer_id: Option<FarmerId>,
    pub amount: f64,
    pub reason: String,
    pub applied_by: String,
    pub applied_at: DateTime<Utc>,
}

/// Request to create or overwrite one farmer's standing deduction.
///
/// Frequency stays textual until validation so bad input yields a readable message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FarmerDeductionRequest {
    pub farmer_id: FarmerId,
    pub deduction_type_id: DeductionTypeId,
    pub amount: f64,
    pub frequency: String,
    #[serde(default)]
    pub next_apply_date: Option<NaiveDate>,
}

/// Request to give every farmer the same standing deduction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringDeductionRequest {
    pub deduction_type_id: DeductionTypeId,
    pub amount: f64,
    pub frequency: String,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
}

/// Request for a one-off, cooperative-wide charge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImmediateDeductionRequest {
    pub deduction_type_id: DeductionTypeId,
    pub amount: f64,
    pub reason: String,
}

/// Result of the all-farmers batch. `success` means the batch ran, not that it was clean.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurringBatchOutcome {
    pub success: bool,
    pub created_count: usize,
    pub errors: Vec<String>,
}

/// Result of a due-deduction run, with per-deduction failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DueApplicationOutcome {
    pub success: bool,
    pub applied_count: usize,
    pub errors: Vec<String>,
}

/// Standing deduction joined with display names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FarmerDeductionView {
    #[serde(flatten)]
    pub deduction: FarmerDeduction,
    pub farmer_name: String,
    pub deduction_type_name: String,
}

/// Ledger entry joined with display names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeductionRecordView {
    #[serde(flatten)]
    pub record: DeductionRecord,
    pub farmer_name: String,
    pub deduction_type_name: String,
}

/// A farmer with their active deductions and the combined total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FarmerDeductionSummary {
    pub farmer_id: FarmerId,
    pub full_name: String,
    pub deductions: Vec<FarmerDeduction>,
    pub total_deductions: f64,
}
