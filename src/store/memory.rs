//! In-memory [`DocumentStore`] used by the CLI and by tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{AggregateWrite, DocumentStore, Result, StoreError, Versioned};
use crate::ledger::RecordKind;
use crate::model::{
    BookingDraft, BookingRequest, BookingStatus, RecordId, Referral, ReferralDraft,
    ReferralStatus, ReferrerAggregate,
};

#[derive(Default)]
struct State {
    referrals: Vec<Referral>,
    referrers: Vec<Versioned<ReferrerAggregate>>,
    bookings: Vec<BookingRequest>,
    last_timestamp: Option<DateTime<Utc>>,
}

impl State {
    /// Wall-clock time, clamped so it never goes backwards.
    fn next_timestamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let timestamp = match self.last_timestamp {
            Some(last) if last > now => last,
            _ => now,
        };
        self.last_timestamp = Some(timestamp);
        timestamp
    }

    fn apply_aggregate(&mut self, write: AggregateWrite) -> Result<()> {
        match write {
            AggregateWrite::Create { name } => {
                if self.referrers.iter().any(|r| r.record.name == name) {
                    return Err(StoreError::Conflict { referrer: name });
                }
                self.referrers.push(Versioned {
                    record: ReferrerAggregate {
                        id: Uuid::new_v4(),
                        name,
                        referral_count: 1,
                    },
                    version: 1,
                });
            }
            AggregateWrite::SetCount {
                id,
                expected_version,
                referral_count,
            } => {
                let entry = self
                    .referrers
                    .iter_mut()
                    .find(|r| r.record.id == id)
                    .ok_or(StoreError::NotFound {
                        kind: RecordKind::Referrer,
                        id,
                    })?;
                if entry.version != expected_version {
                    return Err(StoreError::Conflict {
                        referrer: entry.record.name.clone(),
                    });
                }
                entry.record.referral_count = referral_count;
                entry.version += 1;
            }
        }
        Ok(())
    }
}

/// Store that keeps every collection in memory.
///
/// Each commit runs under a single write guard, so a referral and its
/// aggregate update become visible together. Failure switches and conflict
/// injection let tests simulate an unreachable backend and contention.
#[derive(Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
    fail_on_write: RwLock<bool>,
    fail_on_read: RwLock<bool>,
    injected_conflicts: RwLock<u32>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_fail_on_write(&self, fail: bool) {
        *self.fail_on_write.write().await = fail;
    }

    pub async fn set_fail_on_read(&self, fail: bool) {
        *self.fail_on_read.write().await = fail;
    }

    /// Make the next `count` calls to `commit_referral` report a conflict.
    pub async fn inject_conflicts(&self, count: u32) {
        *self.injected_conflicts.write().await = count;
    }

    async fn check_write(&self) -> Result<()> {
        if *self.fail_on_write.read().await {
            return Err(StoreError::Unavailable("write rejected".to_string()));
        }
        Ok(())
    }

    async fn check_read(&self) -> Result<()> {
        if *self.fail_on_read.read().await {
            return Err(StoreError::Unavailable("read rejected".to_string()));
        }
        Ok(())
    }

    async fn take_injected_conflict(&self) -> bool {
        let mut remaining = self.injected_conflicts.write().await;
        if *remaining == 0 {
            return false;
        }
        *remaining -= 1;
        true
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn insert_referral(&self, draft: ReferralDraft) -> Result<Referral> {
        self.check_write().await?;
        let mut state = self.state.write().await;
        let submitted_at = state.next_timestamp();
        let referral = draft.into_record(Uuid::new_v4(), submitted_at);
        state.referrals.push(referral.clone());
        Ok(referral)
    }

    async fn find_referrer(&self, name: &str) -> Result<Option<Versioned<ReferrerAggregate>>> {
        self.check_read().await?;
        let state = self.state.read().await;
        Ok(state
            .referrers
            .iter()
            .find(|r| r.record.name == name)
            .cloned())
    }

    async fn commit_referral(
        &self,
        draft: ReferralDraft,
        aggregate: AggregateWrite,
    ) -> Result<Referral> {
        self.check_write().await?;
        if self.take_injected_conflict().await {
            return Err(StoreError::Conflict {
                referrer: draft.referrer_name,
            });
        }

        let mut state = self.state.write().await;
        // Aggregate first: a failed precondition must leave the referrals untouched.
        state.apply_aggregate(aggregate)?;
        let submitted_at = state.next_timestamp();
        let referral = draft.into_record(Uuid::new_v4(), submitted_at);
        state.referrals.push(referral.clone());
        Ok(referral)
    }

    async fn insert_booking(&self, draft: BookingDraft) -> Result<BookingRequest> {
        self.check_write().await?;
        let mut state = self.state.write().await;
        let submitted_at = state.next_timestamp();
        let booking = draft.into_record(Uuid::new_v4(), submitted_at);
        state.bookings.push(booking.clone());
        Ok(booking)
    }

    async fn update_referral_status(
        &self,
        id: RecordId,
        status: ReferralStatus,
    ) -> Result<Referral> {
        self.check_write().await?;
        let mut state = self.state.write().await;
        let referral = state
            .referrals
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(StoreError::NotFound {
                kind: RecordKind::Referral,
                id,
            })?;
        referral.status = status;
        Ok(referral.clone())
    }

    async fn update_booking_status(
        &self,
        id: RecordId,
        status: BookingStatus,
    ) -> Result<BookingRequest> {
        self.check_write().await?;
        let mut state = self.state.write().await;
        let booking = state
            .bookings
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or(StoreError::NotFound {
                kind: RecordKind::Booking,
                id,
            })?;
        booking.status = status;
        Ok(booking.clone())
    }

    async fn referrals(&self) -> Result<Vec<Referral>> {
        self.check_read().await?;
        Ok(self.state.read().await.referrals.clone())
    }

    async fn referrers(&self) -> Result<Vec<ReferrerAggregate>> {
        self.check_read().await?;
        Ok(self
            .state
            .read()
            .await
            .referrers
            .iter()
            .map(|r| r.record.clone())
            .collect())
    }

    async fn booking_requests(&self) -> Result<Vec<BookingRequest>> {
        self.check_read().await?;
        Ok(self.state.read().await.bookings.clone())
    }
}
