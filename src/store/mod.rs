//! Storage client abstraction for the referral ledger.
//!
//! The ledger never talks to a concrete database; it receives a
//! [`DocumentStore`] and relies on it for identity, timestamps and the
//! compare-and-commit primitive behind referral submissions.

use async_trait::async_trait;

use crate::model::{
    BookingDraft, BookingRequest, BookingStatus, RecordId, Referral, ReferralDraft,
    ReferralStatus, ReferrerAggregate,
};

mod error;
pub use error::StoreError;

mod memory;
pub use memory::InMemoryStore;

pub type Result<T> = std::result::Result<T, StoreError>;

/// A record together with the store version it was read at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Versioned<T> {
    pub record: T,
    pub version: u64,
}

/// Aggregate half of a referral commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AggregateWrite {
    /// Create the aggregate for `name` with a count of 1.
    /// Conflicts if an aggregate with that exact name exists at commit time.
    Create { name: String },
    /// Overwrite the count of aggregate `id`.
    /// Conflicts if its version is no longer `expected_version`.
    SetCount {
        id: RecordId,
        expected_version: u64,
        referral_count: u32,
    },
}

/// Persistent document store holding referrals, referrer aggregates and
/// booking requests.
///
/// Implementations assign record ids and submission timestamps; timestamps
/// never decrease with insertion order. List methods return records in
/// insertion order, the ledger applies display ordering.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Append a referral with no aggregate interaction.
    async fn insert_referral(&self, draft: ReferralDraft) -> Result<Referral>;

    /// Look up the aggregate whose name equals `name` exactly.
    async fn find_referrer(&self, name: &str) -> Result<Option<Versioned<ReferrerAggregate>>>;

    /// Append a referral and apply `aggregate` as one atomic unit.
    ///
    /// Returns [`StoreError::Conflict`] without writing anything when the
    /// aggregate precondition does not hold.
    async fn commit_referral(
        &self,
        draft: ReferralDraft,
        aggregate: AggregateWrite,
    ) -> Result<Referral>;

    async fn insert_booking(&self, draft: BookingDraft) -> Result<BookingRequest>;

    async fn update_referral_status(
        &self,
        id: RecordId,
        status: ReferralStatus,
    ) -> Result<Referral>;

    async fn update_booking_status(
        &self,
        id: RecordId,
        status: BookingStatus,
    ) -> Result<BookingRequest>;

    async fn referrals(&self) -> Result<Vec<Referral>>;

    async fn referrers(&self) -> Result<Vec<ReferrerAggregate>>;

    async fn booking_requests(&self) -> Result<Vec<BookingRequest>>;
}
