//! Error types for announce-linker
//!
//! Per-facility outcomes (no confident match, operator skipped a prompt) are
//! not errors; they are reported through `LinkOutcome` / `ManualOutcome`.
//! Everything here aborts the current run.

use crate::services::asset_scanner::ScanError;
use thiserror::Error;

/// Linker error type
#[derive(Debug, Error)]
pub enum LinkerError {
    /// Upstream record missing a required field or carrying a bad value
    #[error("Malformed {kind} record ({reason}): {record}")]
    MalformedRecord {
        /// Record type ("stop", "route", "route section", ...)
        kind: &'static str,
        /// Offending record, serialized
        record: String,
        /// What was wrong with it
        reason: String,
    },

    /// Same stop id more than once in one upstream page
    #[error("Duplicate stop ids in page {page}: {}", .ids.join(", "))]
    DuplicateStops { page: u32, ids: Vec<String> },

    /// Upstream API request failed
    #[error("Transit API error: {0}")]
    Api(String),

    /// Operator input stream closed while a prompt was waiting
    #[error("Operator input closed")]
    InputClosed,

    /// Recording directory scan failed
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// announce-common error (store, configuration)
    #[error(transparent)]
    Common(#[from] announce_common::Error),
}

impl From<sqlx::Error> for LinkerError {
    fn from(err: sqlx::Error) -> Self {
        LinkerError::Common(announce_common::Error::Database(err))
    }
}

impl LinkerError {
    /// Build a malformed-record error for `record`
    pub fn malformed(
        kind: &'static str,
        record: &serde_json::Value,
        reason: impl Into<String>,
    ) -> Self {
        LinkerError::MalformedRecord {
            kind,
            record: record.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type for linker operations
pub type LinkerResult<T> = Result<T, LinkerError>;
