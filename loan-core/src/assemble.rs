//! Builds the submission payload from accumulated wizard data.
//!
//! Coercion order: trim strings, parse numerics, drop fields whose parse
//! failed or whose value is blank, then evaluate gating booleans and drop
//! dependent fields whose gate is not affirmatively set. The result is
//! deterministic: the same input always yields the same record.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::fields::{clean, parse_optional_count, parse_optional_decimal, parse_yes_no};
use crate::models::SubmissionRecord;

/// Mandatory fields that must survive coercion before a record can be built.
const REQUIRED_FIELDS: [&str; 5] = [
    "first_name",
    "last_name",
    "email",
    "loan_amount",
    "loan_term",
];

/// The aggregate is missing (or has unparseable values for) mandatory
/// fields. Local and recoverable by user edit; never sent over the wire.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("missing required fields: {}", missing.join(", "))]
pub struct ValidationError {
    pub missing: Vec<String>,
}

/// Assembles the flattened field map into a [`SubmissionRecord`].
///
/// `data` is the union of all completed steps (see `Wizard::flattened`).
/// Optional fields that are absent, blank or unparseable are omitted from
/// the record; they are never null or not-a-number.
pub fn assemble(data: &BTreeMap<String, String>) -> Result<SubmissionRecord, ValidationError> {
    let text = |name: &str| data.get(name).and_then(|v| clean(v));
    let decimal = |name: &str| data.get(name).and_then(|v| parse_optional_decimal(v));
    let count = |name: &str| data.get(name).and_then(|v| parse_optional_count(v));
    let yes_no = |name: &str| data.get(name).and_then(|v| parse_yes_no(v));

    let first_name = text("first_name");
    let last_name = text("last_name");
    let email = text("email");
    let loan_amount = decimal("loan_amount");
    let loan_term = count("loan_term");

    let missing: Vec<String> = REQUIRED_FIELDS
        .iter()
        .filter(|&&name| match name {
            "first_name" => first_name.is_none(),
            "last_name" => last_name.is_none(),
            "email" => email.is_none(),
            "loan_amount" => loan_amount.is_none(),
            "loan_term" => loan_term.is_none(),
            _ => unreachable!(),
        })
        .map(|&name| name.to_string())
        .collect();

    if !missing.is_empty() {
        tracing::debug!(?missing, "assembly rejected");
        return Err(ValidationError { missing });
    }

    // Gating booleans. Dependent fields are meaningless unless the gate is
    // affirmatively "yes": an unanswered or "no" gate drops them even when
    // a value was entered.
    let has_past_debts = yes_no("has_past_debts");
    let number_of_debts = if has_past_debts == Some(true) {
        count("number_of_debts")
    } else {
        None
    };
    let has_emi = yes_no("has_emi");
    let emi_amount = if has_emi == Some(true) {
        decimal("emi_amount")
    } else {
        None
    };

    Ok(SubmissionRecord {
        first_name: first_name.unwrap_or_default(),
        last_name: last_name.unwrap_or_default(),
        email: email.unwrap_or_default(),
        phone: text("phone"),
        date_of_birth: text("date_of_birth"),
        address: text("address"),
        city: text("city"),
        state: text("state"),
        zip_code: text("zip_code"),
        employment_status: text("employment_status"),
        employer: text("employer"),
        job_title: text("job_title"),
        monthly_income: decimal("monthly_income"),
        employment_duration: text("employment_duration"),
        loan_amount: loan_amount.unwrap_or_default(),
        loan_purpose: text("loan_purpose"),
        loan_term: loan_term.unwrap_or_default(),
        total_assets: decimal("total_assets"),
        has_past_debts,
        number_of_debts,
        has_emi,
        emi_amount,
        transaction_file_url: None,
        transaction_file_name: None,
    })
}
