use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Review status assigned to an application by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    UnderReview,
    Approved,
    Rejected,
}

/// The normalized, flattened application payload sent to the persistence
/// endpoint.
///
/// Optional fields that were never answered (or whose input failed to parse)
/// are `None` and are omitted from the serialized object entirely; the
/// persistence layer rejects explicit nulls for some optional columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    // Applicant identity
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,

    // Employment
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employment_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_income: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employment_duration: Option<String>,

    // Loan terms
    pub loan_amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loan_purpose: Option<String>,
    pub loan_term: u32,

    // Financial position
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_assets: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_past_debts: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_of_debts: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_emi: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emi_amount: Option<Decimal>,

    // File linkage, set by the patch endpoint after upload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_file_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_file_name: Option<String>,
}

/// An application as returned by the persistence endpoint: the submitted
/// record plus the server-generated identifier, status and timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredApplication {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ApplicationStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub record: SubmissionRecord,
}
