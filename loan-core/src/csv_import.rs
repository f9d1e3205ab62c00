//! CSV import for bank transaction exports.
//!
//! ## CSV Format
//!
//! Headers are matched by name; column order does not matter. All columns
//! are optional except `transaction_type`, which must be `credit` or `debit`
//! when present. Empty cells become `None`.
//!
//! | Column             | Type       | Notes                              |
//! |--------------------|------------|------------------------------------|
//! | `transaction_date` | date       | ISO 8601, e.g. `2026-01-15`        |
//! | `description`      | string     |                                    |
//! | `amount`           | decimal    |                                    |
//! | `transaction_type` | string     | `credit` or `debit`                |
//! | `balance`          | decimal    |                                    |
//! | `category`         | string     |                                    |
//!
//! ### Minimal example
//!
//! ```csv
//! transaction_date,description,amount,transaction_type,balance,category
//! 2026-01-15,Salary,5000.00,credit,7200.00,income
//! 2026-01-18,Groceries,120.50,debit,7079.50,
//! ```

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::models::{NewTransactionRecord, TransactionType};

// Serde-compatible row that mirrors the CSV layout exactly. The type column
// is validated separately so bad values get a row number in the error.
#[derive(Debug, Deserialize)]
struct CsvRow {
    transaction_date: Option<NaiveDate>,
    description: Option<String>,
    amount: Option<Decimal>,
    transaction_type: Option<String>,
    balance: Option<Decimal>,
    category: Option<String>,
}

/// Errors that can occur while importing transaction CSV data.
#[derive(Debug, thiserror::Error)]
pub enum CsvImportError {
    /// The underlying CSV deserialisation failed (bad structure, type
    /// mismatch, etc.).
    #[error("CSV parse error: {0}")]
    Parse(#[from] csv::Error),

    /// A `transaction_type` cell contained something other than `credit` or
    /// `debit`. `row` is 1-based (header = row 0).
    #[error("unrecognised transaction type '{value}' on row {row}")]
    InvalidTransactionType { value: String, row: usize },
}

fn convert_row(row: CsvRow, row_number: usize) -> Result<NewTransactionRecord, CsvImportError> {
    let transaction_type = match row.transaction_type.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(value) => Some(TransactionType::parse(value).ok_or_else(|| {
            CsvImportError::InvalidTransactionType {
                value: value.to_string(),
                row: row_number,
            }
        })?),
    };

    Ok(NewTransactionRecord {
        transaction_date: row.transaction_date,
        description: row.description.filter(|d| !d.is_empty()),
        amount: row.amount,
        transaction_type,
        balance: row.balance,
        category: row.category.filter(|c| !c.is_empty()),
    })
}

/// Parses CSV text (the full file contents) into transaction rows, in file
/// order.
///
/// # Errors
///
/// * [`CsvImportError::Parse`] – structurally invalid CSV or a cell that
///   cannot be deserialised.
/// * [`CsvImportError::InvalidTransactionType`] – an unrecognised
///   `transaction_type` value.
pub fn load_from_str(input: &str) -> Result<Vec<NewTransactionRecord>, CsvImportError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All) // tolerate whitespace around values
        .flexible(false) // strict column count
        .from_reader(input.as_bytes());

    reader
        .deserialize::<CsvRow>()
        .enumerate()
        .map(|(idx, result)| {
            let row = result?;
            convert_row(row, idx + 1) // 1-based for user-facing messages
        })
        .collect()
}
