//! Submission orchestration: persist the record, then (optionally) upload
//! and attach the transaction file.
//!
//! The three gateway calls are awaited sequentially and are not a
//! transaction. Once the record exists, a later file failure is reported as
//! a partial success ("submitted, file pending"), never rolled back and
//! never surfaced as a failure of the whole operation.

use crate::gateway::{FileUpload, GatewayError, StoredFile, SubmissionGateway, validate_upload};
use crate::models::{StoredApplication, SubmissionRecord};

/// What happened to the transaction file, independent of the record.
#[derive(Debug)]
pub enum FileOutcome {
    /// No file accompanied the submission.
    NotRequested,
    /// Uploaded and attached to the record.
    Attached(StoredFile),
    /// The record was created but the file step failed; the caller should
    /// offer a retry of the file step only.
    Pending { file: String, error: GatewayError },
}

impl FileOutcome {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending { .. })
    }
}

/// Result of a successful submission, including any file partial-failure.
#[derive(Debug)]
pub struct SubmissionOutcome {
    pub application: StoredApplication,
    pub file: FileOutcome,
}

/// Submits an assembled record, then uploads and attaches `file` if given.
///
/// Fails only when the record itself could not be created; every file-side
/// failure after that point is folded into [`FileOutcome::Pending`]. No
/// retries happen here — retry policy belongs to the caller.
pub async fn submit_application(
    gateway: &dyn SubmissionGateway,
    record: &SubmissionRecord,
    file: Option<FileUpload>,
) -> Result<SubmissionOutcome, GatewayError> {
    let application = gateway.submit(record).await?;
    tracing::info!(id = %application.id, "application submitted");

    let Some(file) = file else {
        return Ok(SubmissionOutcome {
            application,
            file: FileOutcome::NotRequested,
        });
    };

    if let Err(error) = validate_upload(&file) {
        tracing::warn!(id = %application.id, %error, "transaction file rejected locally");
        return Ok(SubmissionOutcome {
            application,
            file: FileOutcome::Pending {
                file: file.name,
                error,
            },
        });
    }

    let stored = match gateway.upload_file(&file, &application.id).await {
        Ok(stored) => stored,
        Err(error) => {
            tracing::warn!(id = %application.id, %error, "transaction file upload failed");
            return Ok(SubmissionOutcome {
                application,
                file: FileOutcome::Pending {
                    file: file.name,
                    error,
                },
            });
        }
    };

    match gateway
        .attach_file(&application.id, &stored.url, &stored.name)
        .await
    {
        Ok(updated) => {
            tracing::info!(id = %updated.id, file = %stored.name, "transaction file attached");
            Ok(SubmissionOutcome {
                application: updated,
                file: FileOutcome::Attached(stored),
            })
        }
        Err(error) => {
            tracing::warn!(id = %application.id, %error, "file attach failed after upload");
            Ok(SubmissionOutcome {
                application,
                file: FileOutcome::Pending {
                    file: stored.name,
                    error,
                },
            })
        }
    }
}
