//! End-to-end flow tests: wizard -> assembler -> gateway orchestration,
//! using an in-memory gateway double.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;

use loan_core::gateway::{FileUpload, GatewayError, StoredFile, SubmissionGateway};
use loan_core::models::{
    NewTransactionRecord, StoredApplication, SubmissionRecord, TransactionRecord,
};
use loan_core::submit::{FileOutcome, submit_application};
use loan_core::wizard::{Advance, Wizard, loan_steps};
use loan_core::{assemble, csv_import};

/// Which gateway operation should fail, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fail {
    Nothing,
    Submit,
    Upload,
    Attach,
}

struct MemoryGateway {
    fail: Fail,
    submitted: Mutex<Vec<SubmissionRecord>>,
    attached: Mutex<Vec<(String, String, String)>>,
    transactions: Mutex<Vec<TransactionRecord>>,
    next_id: AtomicUsize,
}

impl MemoryGateway {
    fn new(fail: Fail) -> Self {
        Self {
            fail,
            submitted: Mutex::new(Vec::new()),
            attached: Mutex::new(Vec::new()),
            transactions: Mutex::new(Vec::new()),
            next_id: AtomicUsize::new(1),
        }
    }

    fn stored(&self, id: &str, record: SubmissionRecord) -> StoredApplication {
        StoredApplication {
            id: id.to_string(),
            status: None,
            created_at: None,
            updated_at: None,
            record,
        }
    }
}

#[async_trait]
impl SubmissionGateway for MemoryGateway {
    async fn submit(&self, record: &SubmissionRecord) -> Result<StoredApplication, GatewayError> {
        if self.fail == Fail::Submit {
            return Err(GatewayError::Auth);
        }
        let id = format!("app-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        self.submitted.lock().unwrap().push(record.clone());
        Ok(self.stored(&id, record.clone()))
    }

    async fn upload_file(
        &self,
        file: &FileUpload,
        application_id: &str,
    ) -> Result<StoredFile, GatewayError> {
        if self.fail == Fail::Upload {
            return Err(GatewayError::Upload("storage rejected the file".to_string()));
        }
        Ok(StoredFile {
            url: format!("https://files.test/{application_id}/{}", file.name),
            name: file.name.clone(),
        })
    }

    async fn attach_file(
        &self,
        application_id: &str,
        url: &str,
        name: &str,
    ) -> Result<StoredApplication, GatewayError> {
        if self.fail == Fail::Attach {
            return Err(GatewayError::Network("connection reset".to_string()));
        }
        self.attached.lock().unwrap().push((
            application_id.to_string(),
            url.to_string(),
            name.to_string(),
        ));
        let mut record = self.submitted.lock().unwrap().last().unwrap().clone();
        record.transaction_file_url = Some(url.to_string());
        record.transaction_file_name = Some(name.to_string());
        Ok(self.stored(application_id, record))
    }

    async fn application(&self, id: &str) -> Result<StoredApplication, GatewayError> {
        let record = self.submitted.lock().unwrap().last().cloned();
        record
            .map(|r| self.stored(id, r))
            .ok_or_else(|| GatewayError::Rejected {
                message: "application not found".to_string(),
                field_errors: Vec::new(),
            })
    }

    async fn applications_for(
        &self,
        email: &str,
    ) -> Result<Vec<StoredApplication>, GatewayError> {
        Ok(self
            .submitted
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.email == email)
            .cloned()
            .map(|r| self.stored("app-listed", r))
            .collect())
    }

    async fn store_transactions(
        &self,
        application_id: &str,
        rows: &[NewTransactionRecord],
    ) -> Result<Vec<TransactionRecord>, GatewayError> {
        let mut stored = self.transactions.lock().unwrap();
        let result: Vec<TransactionRecord> = rows
            .iter()
            .enumerate()
            .map(|(i, row)| TransactionRecord {
                id: format!("tx-{i}"),
                application_id: application_id.to_string(),
                created_at: None,
                row: row.clone(),
            })
            .collect();
        stored.extend(result.iter().cloned());
        Ok(result)
    }
}

fn input(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Drives the default wizard through all four steps with a realistic answer
/// set and returns the assembled record.
fn complete_wizard() -> SubmissionRecord {
    let mut wizard = Wizard::new(loan_steps());

    let advanced = wizard
        .advance(&input(&[
            ("first_name", "John"),
            ("last_name", "Doe"),
            ("email", "john@x.com"),
            ("phone", "5551234567"),
            ("city", "New York"),
        ]))
        .expect("personal step should validate");
    assert_eq!(advanced, Advance::Next(2));

    wizard
        .advance(&input(&[
            ("employment_status", "employed"),
            ("monthly_income", "5000"),
        ]))
        .expect("employment step should validate");

    wizard
        .advance(&input(&[
            ("loan_amount", "10000"),
            ("loan_term", "24"),
            ("loan_purpose", "Home renovation"),
            ("has_past_debts", "yes"),
            ("number_of_debts", "2"),
            ("has_emi", "no"),
            ("emi_amount", "500"),
        ]))
        .expect("loan step should validate");

    let ready = wizard
        .advance(&BTreeMap::new())
        .expect("documents step has no rules");
    assert_eq!(ready, Advance::ReadyToSubmit);

    assemble(&wizard.flattened()).expect("completed wizard should assemble")
}

#[test]
fn completed_wizard_assembles_with_gating_applied() {
    let record = complete_wizard();

    assert_eq!(record.first_name, "John");
    assert_eq!(record.loan_amount, dec!(10000));
    assert_eq!(record.loan_term, 24);
    assert_eq!(record.monthly_income, Some(dec!(5000)));
    assert_eq!(record.has_past_debts, Some(true));
    assert_eq!(record.number_of_debts, Some(2));
    // The EMI amount was entered anyway, but its gate says "no".
    assert_eq!(record.has_emi, Some(false));
    assert_eq!(record.emi_amount, None);
}

#[tokio::test]
async fn submission_without_file_succeeds() {
    let gateway = MemoryGateway::new(Fail::Nothing);
    let record = complete_wizard();

    let outcome = submit_application(&gateway, &record, None)
        .await
        .expect("submission should succeed");

    assert_eq!(outcome.application.id, "app-1");
    assert!(matches!(outcome.file, FileOutcome::NotRequested));
    assert_eq!(gateway.submitted.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn submission_with_file_attaches_it() {
    let gateway = MemoryGateway::new(Fail::Nothing);
    let record = complete_wizard();
    let file = FileUpload::csv("statement.csv", b"transaction_date\n2026-01-15\n".to_vec());

    let outcome = submit_application(&gateway, &record, Some(file))
        .await
        .expect("submission should succeed");

    let FileOutcome::Attached(stored) = &outcome.file else {
        panic!("expected attached file, got {:?}", outcome.file);
    };
    assert_eq!(stored.name, "statement.csv");
    assert_eq!(
        outcome.application.record.transaction_file_name,
        Some("statement.csv".to_string())
    );
    assert_eq!(gateway.attached.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn failed_submit_propagates_and_skips_file_steps() {
    let gateway = MemoryGateway::new(Fail::Submit);
    let record = complete_wizard();
    let file = FileUpload::csv("statement.csv", b"x\n1\n".to_vec());

    let err = submit_application(&gateway, &record, Some(file))
        .await
        .expect_err("submit failure must propagate");

    assert!(matches!(err, GatewayError::Auth));
    assert!(gateway.attached.lock().unwrap().is_empty());
}

#[tokio::test]
async fn failed_upload_reports_partial_success() {
    let gateway = MemoryGateway::new(Fail::Upload);
    let record = complete_wizard();
    let file = FileUpload::csv("statement.csv", b"x\n1\n".to_vec());

    let outcome = submit_application(&gateway, &record, Some(file))
        .await
        .expect("record creation succeeded, so the overall call must too");

    assert_eq!(outcome.application.id, "app-1");
    assert!(outcome.file.is_pending());
    let FileOutcome::Pending { file, error } = &outcome.file else {
        unreachable!()
    };
    assert_eq!(file, "statement.csv");
    assert!(matches!(error, GatewayError::Upload(_)));
}

#[tokio::test]
async fn failed_attach_reports_partial_success_with_original_record() {
    let gateway = MemoryGateway::new(Fail::Attach);
    let record = complete_wizard();
    let file = FileUpload::csv("statement.csv", b"x\n1\n".to_vec());

    let outcome = submit_application(&gateway, &record, Some(file))
        .await
        .expect("record creation succeeded");

    assert!(outcome.file.is_pending());
    // The record exists but without the file linkage.
    assert_eq!(outcome.application.record.transaction_file_url, None);
}

#[tokio::test]
async fn locally_invalid_file_becomes_pending_without_network_calls() {
    let gateway = MemoryGateway::new(Fail::Nothing);
    let record = complete_wizard();
    let file = FileUpload {
        name: "statement.pdf".to_string(),
        content_type: "application/pdf".to_string(),
        bytes: vec![1, 2, 3],
    };

    let outcome = submit_application(&gateway, &record, Some(file))
        .await
        .expect("record creation succeeded");

    assert!(outcome.file.is_pending());
    assert!(gateway.attached.lock().unwrap().is_empty());
}

#[tokio::test]
async fn parsed_transactions_can_be_stored_for_an_application() {
    let gateway = MemoryGateway::new(Fail::Nothing);
    let record = complete_wizard();
    let outcome = submit_application(&gateway, &record, None).await.unwrap();

    let rows = csv_import::load_from_str(
        "transaction_date,description,amount,transaction_type,balance,category\n\
         2026-01-15,Salary,5000.00,credit,7200.00,income\n",
    )
    .unwrap();
    let stored = gateway
        .store_transactions(&outcome.application.id, &rows)
        .await
        .unwrap();

    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].application_id, "app-1");
    assert_eq!(stored[0].row.description, Some("Salary".to_string()));
}

#[tokio::test]
async fn applications_are_listed_by_email() {
    let gateway = MemoryGateway::new(Fail::Nothing);
    let record = complete_wizard();
    submit_application(&gateway, &record, None).await.unwrap();

    let mine = gateway.applications_for("john@x.com").await.unwrap();
    let theirs = gateway.applications_for("other@x.com").await.unwrap();

    assert_eq!(mine.len(), 1);
    assert!(theirs.is_empty());
}
