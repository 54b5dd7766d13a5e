use serde::{Deserialize, Serialize};

use super::domain::{
    DeductionTypeDraft, FarmerDeductionRequest, Frequency, ImmediateDeductionRequest,
    RecurringDeductionRequest,
};

pub const MAX_DEDUCTION_AMOUNT: f64 = 1_000_000.0;
const MAX_NAME_CHARS: usize = 100;
const MAX_TEXT_CHARS: usize = 500;

/// Outcome of a validation gate. Gates collect every failed rule instead of stopping early.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

impl ValidationReport {
    fn from_errors(errors: Vec<String>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }
}

/// Error returned by services when a gate rejects the input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Validation failed: {}", .errors.join(", "))]
pub struct ValidationFailed {
    pub errors: Vec<String>,
}

impl ValidationReport {
    pub fn into_result(self) -> Result<(), ValidationFailed> {
        if self.is_valid {
            Ok(())
        } else {
            Err(ValidationFailed {
                errors: self.errors,
            })
        }
    }
}

fn char_len(value: &str) -> usize {
    value.chars().count()
}

fn check_amount(amount: f64, errors: &mut Vec<String>) {
    // NaN slips past both bounds unless rejected here.
    if amount.is_nan() || amount <= 0.0 {
        errors.push("Amount must be greater than zero".to_string());
    }
    if amount > MAX_DEDUCTION_AMOUNT {
        errors.push("Amount cannot exceed 1,000,000".to_string());
    }
}

fn check_frequency(frequency: &str, errors: &mut Vec<String>) {
    if Frequency::parse(frequency).is_none() {
        errors.push("Invalid frequency. Must be daily, weekly, monthly, or yearly".to_string());
    }
}

pub fn validate_deduction_type(draft: &DeductionTypeDraft) -> ValidationReport {
    let mut errors = Vec::new();

    if draft.name.trim().is_empty() {
        errors.push("Deduction type name is required".to_string());
    }
    if char_len(&draft.name) > MAX_NAME_CHARS {
        errors.push("Deduction type name must be less than 100 characters".to_string());
    }
    if char_len(&draft.description) > MAX_TEXT_CHARS {
        errors.push("Description must be less than 500 characters".to_string());
    }

    ValidationReport::from_errors(errors)
}

pub fn validate_farmer_deduction(request: &FarmerDeductionRequest) -> ValidationReport {
    let mut errors = Vec::new();

    if request.farmer_id.is_blank() {
        errors.push("Farmer ID is required".to_string());
    }
    if request.deduction_type_id.is_blank() {
        errors.push("Deduction type ID is required".to_string());
    }
    check_amount(request.amount, &mut errors);
    check_frequency(&request.frequency, &mut errors);
    if request.next_apply_date.is_none() {
        errors.push("Next apply date is required".to_string());
    }

    ValidationReport::from_errors(errors)
}

pub fn validate_recurring_deduction(request: &RecurringDeductionRequest) -> ValidationReport {
    let mut errors = Vec::new();

    if request.deduction_type_id.is_blank() {
        errors.push("Deduction type ID is required".to_string());
    }
    check_amount(request.amount, &mut errors);
    check_frequency(&request.frequency, &mut errors);
    if request.start_date.is_none() {
        errors.push("Start date is required".to_string());
    }

    ValidationReport::from_errors(errors)
}

pub fn validate_immediate_deduction(request: &ImmediateDeductionRequest) -> ValidationReport {
    let mut errors = Vec::new();

    if request.deduction_type_id.is_blank() {
        errors.push("Deduction type ID is required".to_string());
    }
    check_amount(request.amount, &mut errors);
    if request.reason.trim().is_empty() {
        errors.push("Reason is required".to_string());
    }
    if char_len(&request.reason) > MAX_TEXT_CHARS {
        errors.push("Reason must be less than 500 characters".to_string());
    }

    ValidationReport::from_errors(errors)
}
