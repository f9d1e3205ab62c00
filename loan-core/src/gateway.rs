//! Submission gateway contract.
//!
//! The gateway is the only component that talks to the persistence backend.
//! It is a trait so the same wizard/assembler core works against any backend
//! (hosted REST service, local test double) behind one three-operation
//! contract plus the read paths the dashboard needs.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::models::{NewTransactionRecord, StoredApplication, SubmissionRecord, TransactionRecord};

/// Largest accepted transaction file. The storage backend enforces its own
/// cap; this keeps obviously oversized payloads off the wire.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// A field-level message attached to a remote rejection.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FieldRejection {
    pub field: Option<String>,
    pub message: String,
}

/// Failures crossing the gateway boundary.
///
/// The core performs no silent retries; whether and when to retry is the
/// caller's decision, guided by the variant.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Transport-level failure. The request may never have reached the
    /// backend; the caller may retry unchanged.
    #[error("network error: {0}")]
    Network(String),

    /// The backend confirmed the payload invalid. Not retryable without
    /// user correction.
    #[error("submission rejected: {message}")]
    Rejected {
        message: String,
        field_errors: Vec<FieldRejection>,
    },

    /// Credential missing or expired. Requires re-authentication.
    #[error("missing or expired credential")]
    Auth,

    /// File-specific failure, independent of the record submission outcome.
    #[error("file upload failed: {0}")]
    Upload(String),
}

/// Supplies the bearer credential attached to every gateway call.
///
/// The core never acquires or refreshes credentials; it only consumes this
/// getter. `None` means "no credential", which the gateway surfaces as
/// [`GatewayError::Auth`] on the next call.
pub trait CredentialProvider: Send + Sync {
    fn bearer_token(&self) -> Option<String>;
}

/// A fixed token, for tools and tests.
#[derive(Debug, Clone)]
pub struct StaticCredentials(pub String);

impl CredentialProvider for StaticCredentials {
    fn bearer_token(&self) -> Option<String> {
        Some(self.0.clone())
    }
}

/// The explicit "no credential" state.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCredentials;

impl CredentialProvider for NoCredentials {
    fn bearer_token(&self) -> Option<String> {
        None
    }
}

/// A transaction file handed to [`SubmissionGateway::upload_file`].
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl FileUpload {
    pub fn csv(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type: "text/csv".to_string(),
            bytes,
        }
    }
}

/// A stored file reference returned by the storage endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StoredFile {
    pub url: String,
    pub name: String,
}

/// Checks a file against the storage backend's constraints before any
/// network call: tabular (CSV) content only, bounded size.
pub fn validate_upload(file: &FileUpload) -> Result<(), GatewayError> {
    let is_csv = file.content_type.eq_ignore_ascii_case("text/csv")
        || file.name.to_ascii_lowercase().ends_with(".csv");
    if !is_csv {
        return Err(GatewayError::Upload(format!(
            "only CSV files are accepted, got '{}'",
            file.content_type
        )));
    }
    if file.bytes.is_empty() {
        return Err(GatewayError::Upload("file is empty".to_string()));
    }
    if file.bytes.len() > MAX_UPLOAD_BYTES {
        return Err(GatewayError::Upload(format!(
            "file exceeds the {} byte limit",
            MAX_UPLOAD_BYTES
        )));
    }
    Ok(())
}

/// Persistence operations for loan applications.
///
/// `submit`, `upload_file` and `attach_file` are deliberately not
/// transactional: a created record with a failed file attach is a valid
/// partial outcome (see `submit::submit_application`).
#[async_trait]
pub trait SubmissionGateway: Send + Sync {
    /// Persists a new application and returns it with its generated id.
    async fn submit(&self, record: &SubmissionRecord) -> Result<StoredApplication, GatewayError>;

    /// Uploads a transaction file owned by an existing application.
    async fn upload_file(
        &self,
        file: &FileUpload,
        application_id: &str,
    ) -> Result<StoredFile, GatewayError>;

    /// Patches an application with the reference to an uploaded file.
    async fn attach_file(
        &self,
        application_id: &str,
        url: &str,
        name: &str,
    ) -> Result<StoredApplication, GatewayError>;

    /// Fetches a single application by id.
    async fn application(&self, id: &str) -> Result<StoredApplication, GatewayError>;

    /// Lists a user's applications, newest first.
    async fn applications_for(&self, email: &str)
    -> Result<Vec<StoredApplication>, GatewayError>;

    /// Stores parsed transaction rows under an application.
    async fn store_transactions(
        &self,
        application_id: &str,
        rows: &[NewTransactionRecord],
    ) -> Result<Vec<TransactionRecord>, GatewayError>;
}
