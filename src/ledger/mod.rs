//! Referral ledger.
//!
//! Records referral and booking submissions through a [`DocumentStore`],
//! keeps one running referral count per referrer name, and serves the
//! ordered views and status changes of the admin dashboard.
//! Also supports an async stream of submissions.

use std::collections::HashMap;
use std::fmt::Display;

use serde::Serialize;
use backon::BackoffBuilder;
use tokio_stream::{Stream, StreamExt};
use tracing::{debug, info, warn};

use crate::config::LedgerConfig;
use crate::model::{
    BookingRequest, BookingStatus, NewBooking, NewReferral, RecordId, Referral, ReferralStatus,
    ReferrerAggregate, Submission,
};
use crate::store::{AggregateWrite, DocumentStore};
use crate::tier::{BadgeTier, resolve_tier};

mod error;
pub use error::{LedgerError, RecordKind, SubmissionError, ValidationError};

/// One row of the referrer ranking board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedReferrer {
    /// 1-based rank.
    pub position: usize,
    pub name: String,
    pub referral_count: u32,
    pub tier: BadgeTier,
}

/// Referral totals shown on the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferralStats {
    pub total: usize,
    by_status: HashMap<ReferralStatus, usize>,
}

impl ReferralStats {
    pub fn count(&self, status: ReferralStatus) -> usize {
        self.by_status.get(&status).copied().unwrap_or(0)
    }
}

/// The referral ledger.
///
/// Owns the injected store and the retry policy for contended referrer
/// aggregates. Share it across tasks behind an `Arc`.
pub struct Ledger<S> {
    store: S,
    config: LedgerConfig,
}

/// Public API
impl<S: DocumentStore> Ledger<S> {
    pub fn new(store: S, config: LedgerConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run the ledger over the given submission stream
    pub async fn run(&self, mut stream: impl Stream<Item = Submission> + Unpin) {
        while let Some(submission) = stream.next().await {
            // a rejected submission must not stop the stream; it is logged in `apply`
            let _ = self.apply(submission).await;
        }
    }

    /// Record a single form submission
    pub async fn apply(&self, submission: Submission) -> Result<(), LedgerError> {
        match submission {
            Submission::Referral(referral) => {
                let subject = referral.recommended_name().to_string();
                let result = self.submit_referral(referral).await;
                Self::log_result("referral", &subject, &result);
                result?;
            }
            Submission::Booking(booking) => {
                let subject = booking.name().to_string();
                let result = self.submit_booking(booking).await;
                Self::log_result("booking", &subject, &result);
                result?;
            }
        }
        Ok(())
    }

    /// Record a referral.
    ///
    /// Anonymous referrals are a single insert. Attributed referrals are
    /// committed together with their referrer aggregate: created with a count
    /// of 1 for an unseen name, otherwise incremented from the count read in
    /// the same attempt. Conflicting commits are retried per the configured
    /// [`RetryConfig`](crate::config::RetryConfig).
    pub async fn submit_referral(&self, referral: NewReferral) -> Result<Referral, LedgerError> {
        let recorded = match referral.referrer() {
            None => self
                .store
                .insert_referral(referral.to_draft())
                .await
                .map_err(SubmissionError::from)?,
            Some(referrer) => self.commit_attributed(&referral, referrer).await?,
        };
        Ok(recorded)
    }

    /// Record an appointment request with status `Neu`.
    pub async fn submit_booking(&self, booking: NewBooking) -> Result<BookingRequest, LedgerError> {
        let recorded = self
            .store
            .insert_booking(booking.to_draft())
            .await
            .map_err(SubmissionError::from)?;
        Ok(recorded)
    }

    /// Overwrite the status of one referral. Referrer counts are untouched.
    pub async fn set_referral_status(
        &self,
        id: RecordId,
        status: ReferralStatus,
    ) -> Result<Referral, LedgerError> {
        let result = self.store.update_referral_status(id, status).await;
        if let Err(e) = &result {
            info!(id = %id, status = %status, reason = %e, "referral status update refused");
        }
        Ok(result?)
    }

    /// [`set_referral_status`](Self::set_referral_status) for a status given
    /// by its display value.
    pub async fn set_referral_status_str(
        &self,
        id: RecordId,
        status: &str,
    ) -> Result<Referral, LedgerError> {
        self.set_referral_status(id, status.parse()?).await
    }

    /// Overwrite the status of one booking request.
    pub async fn set_booking_status(
        &self,
        id: RecordId,
        status: BookingStatus,
    ) -> Result<BookingRequest, LedgerError> {
        let result = self.store.update_booking_status(id, status).await;
        if let Err(e) = &result {
            info!(id = %id, status = %status, reason = %e, "booking status update refused");
        }
        Ok(result?)
    }

    pub async fn set_booking_status_str(
        &self,
        id: RecordId,
        status: &str,
    ) -> Result<BookingRequest, LedgerError> {
        self.set_booking_status(id, status.parse()?).await
    }

    /// All referrals, most recent first.
    pub async fn list_referrals(&self) -> Result<Vec<Referral>, LedgerError> {
        let mut referrals = self.store.referrals().await?;
        // newest first among equal timestamps too
        referrals.reverse();
        referrals.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        Ok(referrals)
    }

    /// All referrer aggregates, highest count first.
    pub async fn list_referrers(&self) -> Result<Vec<ReferrerAggregate>, LedgerError> {
        let mut referrers = self.store.referrers().await?;
        referrers.sort_by(|a, b| b.referral_count.cmp(&a.referral_count));
        Ok(referrers)
    }

    /// All booking requests, most recent first.
    pub async fn list_booking_requests(&self) -> Result<Vec<BookingRequest>, LedgerError> {
        let mut bookings = self.store.booking_requests().await?;
        bookings.reverse();
        bookings.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        Ok(bookings)
    }

    /// Referrers in ranking order with their badge tier.
    pub async fn ranking(&self) -> Result<Vec<RankedReferrer>, LedgerError> {
        Ok(self
            .list_referrers()
            .await?
            .into_iter()
            .enumerate()
            .map(|(idx, referrer)| RankedReferrer {
                position: idx + 1,
                tier: resolve_tier(referrer.referral_count),
                name: referrer.name,
                referral_count: referrer.referral_count,
            })
            .collect())
    }

    pub async fn referral_stats(&self) -> Result<ReferralStats, LedgerError> {
        let referrals = self.store.referrals().await?;
        let mut stats = ReferralStats {
            total: referrals.len(),
            ..Default::default()
        };
        for referral in &referrals {
            *stats.by_status.entry(referral.status).or_default() += 1;
        }
        Ok(stats)
    }

    /// Booking requests nobody has answered yet.
    pub async fn open_booking_count(&self) -> Result<usize, LedgerError> {
        Ok(self
            .store
            .booking_requests()
            .await?
            .iter()
            .filter(|b| b.status == BookingStatus::New)
            .count())
    }
}

/// Private API
impl<S: DocumentStore> Ledger<S> {
    /// Small helper to log `apply` results
    fn log_result<T, E: Display>(kind: &str, subject: &str, result: &Result<T, E>) {
        match result {
            Ok(_) => info!(subject, "{kind} recorded"),
            Err(e) => warn!(subject, reason = %e, "{kind} skipped"),
        }
    }

    /// Compare-and-commit loop for a referral naming `referrer`:
    /// - Read the aggregate for the exact name
    /// - Commit the referral with a create or a versioned count update
    /// - On conflict, back off and start over with a fresh read
    async fn commit_attributed(
        &self,
        referral: &NewReferral,
        referrer: &str,
    ) -> Result<Referral, SubmissionError> {
        let mut delays = self.config.retry.backoff().build();
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            let write = match self.store.find_referrer(referrer).await? {
                None => AggregateWrite::Create {
                    name: referrer.to_string(),
                },
                Some(current) => AggregateWrite::SetCount {
                    id: current.record.id,
                    expected_version: current.version,
                    referral_count: current.record.referral_count.saturating_add(1),
                },
            };

            match self.store.commit_referral(referral.to_draft(), write).await {
                Ok(recorded) => return Ok(recorded),
                Err(e) if e.is_retryable() => match delays.next() {
                    Some(delay) => {
                        debug!(referrer, attempts, ?delay, "referrer changed during commit, retrying");
                        tokio::time::sleep(delay).await;
                    }
                    None => {
                        warn!(referrer, attempts, "referrer still contended, giving up");
                        return Err(SubmissionError::RetriesExhausted {
                            referrer: referrer.to_string(),
                            attempts,
                        });
                    }
                },
                Err(e) => return Err(e.into()),
            }
        }
    }
}
