pub mod config;
pub mod csv;
pub mod ledger;
pub mod model;
pub mod slots;
pub mod store;
pub mod tier;

pub use crate::config::{ConfigError, LedgerConfig, RetryConfig};
pub use ledger::{Ledger, LedgerError};
pub use model::{
    BookingRequest, BookingStatus, NewBooking, NewReferral, RecordId, Referral, ReferralStatus,
    ReferrerAggregate, Submission,
};
pub use store::{DocumentStore, InMemoryStore};
pub use tier::{BadgeTier, resolve_tier};
