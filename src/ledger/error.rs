//! Error types for ledger operations.

use thiserror::Error;

use crate::model::RecordId;
use crate::store::StoreError;

/// Collection a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Referral,
    Referrer,
    Booking,
}

/// Top-level error returned by [`Ledger`](super::Ledger) operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("invalid submission: {0}")]
    Validation(#[from] ValidationError),

    #[error("submission failed: {0}")]
    Submission(#[from] SubmissionError),

    #[error("{0:?} {1} not found")]
    NotFound(RecordKind, RecordId),

    #[error("'{1}' is not a valid {0:?} status")]
    InvalidStatus(RecordKind, String),

    #[error("{0}")]
    Storage(StoreError),
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { kind, id } => LedgerError::NotFound(kind, id),
            other => LedgerError::Storage(other),
        }
    }
}

impl LedgerError {
    /// Whether the same request may succeed if sent again later.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LedgerError::Submission(_) | LedgerError::Storage(StoreError::Unavailable(_))
        )
    }
}

/// A required form field was missing.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{0} must not be empty")]
    EmptyField(&'static str),
}

/// The referral could not be committed; nothing was written.
#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("referrer '{referrer}' still contended after {attempts} attempts")]
    RetriesExhausted { referrer: String, attempts: u32 },

    #[error("{0}")]
    Store(#[from] StoreError),
}
