use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CostReportError {
    #[error("no {0} loaded")]
    InputMissing(&'static str),
    #[error(
        "categorized costs do not add up to total bill (grouped {grouped:.4}, billed {baseline:.4})"
    )]
    ReconciliationMismatch { grouped: f64, baseline: f64 },
    #[error("account {0} appears more than once in the account directory")]
    DuplicateAccount(String),
    #[error("invalid {table} row {row}: {message}")]
    InvalidRow {
        table: &'static str,
        row: usize,
        message: String,
    },
    #[error("invalid billing period: {0}")]
    InvalidPeriod(String),
    #[error("no bucket found in event or configuration")]
    BucketMissing,
    #[error("config path unavailable (no home directory)")]
    ConfigPathUnavailable,
    #[error("object not found: {0}")]
    ObjectMissing(PathBuf),
}
