//! Deduction types, standing farmer deductions, and the ledger they feed.
//!
//! Single-entity operations fail fast; the all-farmers batch and the due run
//! keep going past individual failures and report them in their outcome.

pub mod audit;
pub mod domain;
pub mod router;
pub mod service;
pub mod validation;

#[cfg(test)]
mod tests;

pub use audit::{AuditAction, AuditEntry, AuditError, AuditPublisher};
pub use domain::{
    DeductionRecord, DeductionRecordView, DeductionType, DeductionTypeDraft, DeductionTypeId,
    DueApplicationOutcome, FarmerDeduction, FarmerDeductionRequest, FarmerDeductionSummary,
    FarmerDeductionView, Frequency, ImmediateDeductionRequest, NewDeductionRecord,
    RecurringBatchOutcome, RecurringDeductionRequest,
};
pub use router::{deduction_router, ApplyDueRequest, ACTOR_HEADER};
pub use service::{DeductionService, DeductionServiceError, MissingEntity};
pub use validation::{
    validate_deduction_type, validate_farmer_deduction, validate_immediate_deduction,
    validate_recurring_deduction, ValidationFailed, ValidationReport, MAX_DEDUCTION_AMOUNT,
};
