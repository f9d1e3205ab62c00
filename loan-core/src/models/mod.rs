pub mod application;
pub mod transaction;

pub use application::{ApplicationStatus, StoredApplication, SubmissionRecord};
pub use transaction::{NewTransactionRecord, TransactionRecord, TransactionType};
