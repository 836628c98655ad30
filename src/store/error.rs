//! Errors reported by a [`DocumentStore`](super::DocumentStore).

use thiserror::Error;

use crate::ledger::RecordKind;
use crate::model::RecordId;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The referrer aggregate changed between read and commit.
    #[error("concurrent write to referrer '{referrer}'")]
    Conflict { referrer: String },

    #[error("{kind:?} {id} not found")]
    NotFound { kind: RecordKind, id: RecordId },

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Whether re-reading and committing again may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_conflicts_are_retryable() {
        let conflict = StoreError::Conflict {
            referrer: "Max M.".to_string(),
        };
        assert!(conflict.is_retryable());
        assert!(!StoreError::Unavailable("offline".to_string()).is_retryable());
        assert!(
            !StoreError::NotFound {
                kind: RecordKind::Referral,
                id: RecordId::nil(),
            }
            .is_retryable()
        );
    }
}
