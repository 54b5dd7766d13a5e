use super::common::*;

use crate::workflows::deductions::domain::{
    DeductionTypeDraft, DeductionTypeId, ImmediateDeductionRequest,
};
use crate::workflows::deductions::validation::{
    validate_deduction_type, validate_farmer_deduction, validate_immediate_deduction,
    validate_recurring_deduction,
};

#[test]
fn amount_upper_bound_is_inclusive() {
    let type_id = DeductionTypeId::new("dt-0001");

    let at_limit = farmer_request("f-001", &type_id, 1_000_000.0, "monthly");
    assert!(validate_farmer_deduction(&at_limit).is_valid);

    let over_limit = farmer_request("f-001", &type_id, 1_000_001.0, "monthly");
    let report = validate_farmer_deduction(&over_limit);
    assert!(!report.is_valid);
    assert_eq!(report.errors, vec!["Amount cannot exceed 1,000,000"]);
}

#[test]
fn farmer_deduction_collects_every_failure() {
    let mut request = farmer_request("  ", &DeductionTypeId::new(""), 0.0, "fortnightly");
    request.next_apply_date = None;

    let report = validate_farmer_deduction(&request);
    assert_eq!(
        report.errors,
        vec![
            "Farmer ID is required",
            "Deduction type ID is required",
            "Amount must be greater than zero",
            "Invalid frequency. Must be daily, weekly, monthly, or yearly",
            "Next apply date is required",
        ]
    );
}

#[test]
fn nan_amount_is_rejected() {
    let request = farmer_request("f-001", &DeductionTypeId::new("dt-0001"), f64::NAN, "daily");
    let report = validate_farmer_deduction(&request);
    assert_eq!(report.errors, vec!["Amount must be greater than zero"]);
}

#[test]
fn deduction_type_name_length_counts_characters() {
    let draft = DeductionTypeDraft {
        name: "é".repeat(100),
        description: String::new(),
    };
    assert!(validate_deduction_type(&draft).is_valid);

    let too_long = DeductionTypeDraft {
        name: "a".repeat(101),
        description: "d".repeat(501),
    };
    assert_eq!(
        validate_deduction_type(&too_long).errors,
        vec![
            "Deduction type name must be less than 100 characters",
            "Description must be less than 500 characters",
        ]
    );

    let blank = DeductionTypeDraft {
        name: "   ".to_string(),
        description: String::new(),
    };
    assert_eq!(
        validate_deduction_type(&blank).errors,
        vec!["Deduction type name is required"]
    );
}

#[test]
fn recurring_request_requires_start_date() {
    let mut request = recurring_request(&DeductionTypeId::new("dt-0001"));
    assert!(validate_recurring_deduction(&request).is_valid);

    request.start_date = None;
    assert_eq!(
        validate_recurring_deduction(&request).errors,
        vec!["Start date is required"]
    );
}

#[test]
fn immediate_deduction_requires_reason() {
    let request = ImmediateDeductionRequest {
        deduction_type_id: DeductionTypeId::new("dt-0001"),
        amount: 50.0,
        reason: " ".to_string(),
    };
    assert_eq!(
        validate_immediate_deduction(&request).errors,
        vec!["Reason is required"]
    );

    let verbose = ImmediateDeductionRequest {
        reason: "r".repeat(501),
        ..request
    };
    assert_eq!(
        validate_immediate_deduction(&verbose).errors,
        vec!["Reason must be less than 500 characters"]
    );
}

#[test]
fn rejected_report_converts_to_error_with_joined_message() {
    let request = farmer_request("", &DeductionTypeId::new("dt-0001"), -5.0, "weekly");
    let error = validate_farmer_deduction(&request)
        .into_result()
        .expect_err("invalid request");

    assert_eq!(
        error.to_string(),
        "Validation failed: Farmer ID is required, Amount must be greater than zero"
    );
}
