//! Core domain types for the referral ledger.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ledger::{LedgerError, RecordKind, ValidationError};

/// Opaque identifier assigned by the store at creation.
pub type RecordId = Uuid;

/// Referrer name recorded for submissions that name nobody.
pub const ANONYMOUS_REFERRER: &str = "Anonym";

/// Follow-up state of a referral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ReferralStatus {
    #[default]
    #[serde(rename = "Neu")]
    New,
    #[serde(rename = "Kontaktiert")]
    Contacted,
    #[serde(rename = "Termin vereinbart")]
    AppointmentScheduled,
    #[serde(rename = "Abgeschlossen")]
    Closed,
    #[serde(rename = "Nicht erreicht")]
    NotReached,
}

impl ReferralStatus {
    pub const ALL: [ReferralStatus; 5] = [
        ReferralStatus::New,
        ReferralStatus::Contacted,
        ReferralStatus::AppointmentScheduled,
        ReferralStatus::Closed,
        ReferralStatus::NotReached,
    ];

    /// Persisted and displayed value.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ReferralStatus::New => "Neu",
            ReferralStatus::Contacted => "Kontaktiert",
            ReferralStatus::AppointmentScheduled => "Termin vereinbart",
            ReferralStatus::Closed => "Abgeschlossen",
            ReferralStatus::NotReached => "Nicht erreicht",
        }
    }
}

impl fmt::Display for ReferralStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReferralStatus {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| LedgerError::InvalidStatus(RecordKind::Referral, s.to_string()))
    }
}

/// Confirmation state of a booking request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BookingStatus {
    #[default]
    #[serde(rename = "Neu")]
    New,
    #[serde(rename = "Bestätigt")]
    Confirmed,
    #[serde(rename = "Abgelehnt")]
    Declined,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 3] = [
        BookingStatus::New,
        BookingStatus::Confirmed,
        BookingStatus::Declined,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::New => "Neu",
            BookingStatus::Confirmed => "Bestätigt",
            BookingStatus::Declined => "Abgelehnt",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| LedgerError::InvalidStatus(RecordKind::Booking, s.to_string()))
    }
}

/// One recorded recommendation of a new contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Referral {
    pub id: RecordId,
    pub recommended_name: String,
    /// [`ANONYMOUS_REFERRER`] when the submitter named nobody.
    pub referrer_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_date: Option<String>,
    #[serde(rename = "submissionDate")]
    pub submitted_at: DateTime<Utc>,
    pub status: ReferralStatus,
}

impl Referral {
    pub fn is_anonymous(&self) -> bool {
        self.referrer_name == ANONYMOUS_REFERRER
    }

    /// Submission date as `YYYY-MM-DD`.
    pub fn submission_day(&self) -> String {
        self.submitted_at.format("%Y-%m-%d").to_string()
    }
}

/// Running tally of referrals attributed to one referrer name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferrerAggregate {
    pub id: RecordId,
    pub name: String,
    pub referral_count: u32,
}

/// One appointment request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub id: RecordId,
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub requested_slot: String,
    #[serde(rename = "submissionDate")]
    pub submitted_at: DateTime<Utc>,
    pub status: BookingStatus,
}

impl BookingRequest {
    pub fn submission_day(&self) -> String {
        self.submitted_at.format("%Y-%m-%d").to_string()
    }
}

fn required(field: &'static str, value: impl Into<String>) -> Result<String, ValidationError> {
    let value = value.into();
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    Ok(value)
}

/// A validated referral submission from the public form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReferral {
    recommended_name: String,
    referrer_name: Option<String>,
    preferred_date: Option<String>,
}

impl NewReferral {
    /// Validate a referral submission.
    ///
    /// Only `recommended_name` is required. An empty referrer name is kept as
    /// absent; a whitespace-only one counts as present and is stored verbatim.
    pub fn new(
        recommended_name: impl Into<String>,
        referrer_name: Option<String>,
        preferred_date: Option<String>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            recommended_name: required("recommendedName", recommended_name)?,
            referrer_name: referrer_name.filter(|name| !name.is_empty()),
            preferred_date: preferred_date.filter(|date| !date.is_empty()),
        })
    }

    pub fn recommended_name(&self) -> &str {
        &self.recommended_name
    }

    /// The named referrer, or `None` for an anonymous submission.
    pub fn referrer(&self) -> Option<&str> {
        self.referrer_name.as_deref()
    }

    /// Fields the store persists for this submission, status `Neu`.
    pub fn to_draft(&self) -> ReferralDraft {
        ReferralDraft {
            recommended_name: self.recommended_name.clone(),
            referrer_name: self
                .referrer_name
                .clone()
                .unwrap_or_else(|| ANONYMOUS_REFERRER.to_string()),
            preferred_date: self.preferred_date.clone(),
            status: ReferralStatus::New,
        }
    }
}

/// A validated booking request from the public form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBooking {
    name: String,
    email: String,
    phone_number: String,
    requested_slot: String,
}

impl NewBooking {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        phone_number: impl Into<String>,
        requested_slot: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            name: required("name", name)?,
            email: required("email", email)?,
            phone_number: required("phoneNumber", phone_number)?,
            requested_slot: required("requestedSlot", requested_slot)?,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn requested_slot(&self) -> &str {
        &self.requested_slot
    }

    pub fn to_draft(&self) -> BookingDraft {
        BookingDraft {
            name: self.name.clone(),
            email: self.email.clone(),
            phone_number: self.phone_number.clone(),
            requested_slot: self.requested_slot.clone(),
            status: BookingStatus::New,
        }
    }
}

/// Referral fields before the store assigns identity and timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferralDraft {
    pub recommended_name: String,
    pub referrer_name: String,
    pub preferred_date: Option<String>,
    pub status: ReferralStatus,
}

impl ReferralDraft {
    pub fn into_record(self, id: RecordId, submitted_at: DateTime<Utc>) -> Referral {
        Referral {
            id,
            recommended_name: self.recommended_name,
            referrer_name: self.referrer_name,
            preferred_date: self.preferred_date,
            submitted_at,
            status: self.status,
        }
    }
}

/// Booking fields before the store assigns identity and timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingDraft {
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub requested_slot: String,
    pub status: BookingStatus,
}

impl BookingDraft {
    pub fn into_record(self, id: RecordId, submitted_at: DateTime<Utc>) -> BookingRequest {
        BookingRequest {
            id,
            name: self.name,
            email: self.email,
            phone_number: self.phone_number,
            requested_slot: self.requested_slot,
            submitted_at,
            status: self.status,
        }
    }
}

/// A public form submission, the input of [`Ledger::run`](crate::Ledger::run).
#[derive(Debug, Clone)]
pub enum Submission {
    Referral(NewReferral),
    Booking(NewBooking),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn referral_status_round_trips_through_display_value() {
        for status in ReferralStatus::ALL {
            assert_eq!(status.as_str().parse::<ReferralStatus>().unwrap(), status);
        }
    }

    #[test]
    fn unknown_referral_status_is_rejected() {
        let err = "Erledigt".parse::<ReferralStatus>().unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InvalidStatus(RecordKind::Referral, ref value) if value == "Erledigt"
        ));
    }

    #[test]
    fn booking_status_values() {
        assert_eq!(BookingStatus::Confirmed.to_string(), "Bestätigt");
        assert_eq!("Abgelehnt".parse::<BookingStatus>().unwrap(), BookingStatus::Declined);
        assert!(matches!(
            "Neu ".parse::<BookingStatus>(),
            Err(LedgerError::InvalidStatus(RecordKind::Booking, _))
        ));
    }

    #[test]
    fn initial_statuses_are_new() {
        assert_eq!(ReferralStatus::default(), ReferralStatus::New);
        assert_eq!(BookingStatus::default(), BookingStatus::New);
    }

    #[test]
    fn new_referral_requires_recommended_name() {
        let err = NewReferral::new("  ", None, None).unwrap_err();
        assert!(matches!(err, ValidationError::EmptyField("recommendedName")));
    }

    #[test]
    fn empty_referrer_is_anonymous() {
        let referral = NewReferral::new("Anna K.", Some(String::new()), None).unwrap();
        assert_eq!(referral.referrer(), None);
        assert_eq!(referral.to_draft().referrer_name, ANONYMOUS_REFERRER);
    }

    #[test]
    fn whitespace_referrer_is_kept_verbatim() {
        let referral = NewReferral::new("Anna K.", Some("  ".to_string()), None).unwrap();
        assert_eq!(referral.referrer(), Some("  "));
    }

    #[test]
    fn draft_starts_as_new() {
        let referral =
            NewReferral::new("Anna K.", Some("Max M.".to_string()), Some("2024-05-01".into()))
                .unwrap();
        let draft = referral.to_draft();
        assert_eq!(draft.status, ReferralStatus::New);
        assert_eq!(draft.referrer_name, "Max M.");
        assert_eq!(draft.preferred_date.as_deref(), Some("2024-05-01"));
    }

    #[test]
    fn new_booking_requires_every_field() {
        let err = NewBooking::new("Lea", "lea@example.com", "", "Montag").unwrap_err();
        assert!(matches!(err, ValidationError::EmptyField("phoneNumber")));
        assert!(NewBooking::new("Lea", "lea@example.com", "0171", "Montag").is_ok());
    }

    #[test]
    fn submission_day_is_iso_date() {
        let submitted_at = DateTime::parse_from_rfc3339("2024-03-07T23:15:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let referral = NewReferral::new("Anna K.", None, None)
            .unwrap()
            .to_draft()
            .into_record(Uuid::new_v4(), submitted_at);
        assert_eq!(referral.submission_day(), "2024-03-07");
        assert!(referral.is_anonymous());

        let booking = NewBooking::new("Lea", "lea@example.com", "0171", "Montag")
            .unwrap()
            .to_draft()
            .into_record(Uuid::new_v4(), submitted_at);
        assert_eq!(booking.submission_day(), "2024-03-07");
        assert_eq!(booking.status, BookingStatus::New);
    }
}
