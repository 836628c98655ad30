use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;
use thiserror::Error;

use crate::ledger::{RankedReferrer, ValidationError};
use crate::model::{NewBooking, NewReferral, Submission};

/// Errors that can occur when reading submission rows
#[derive(Debug, Error)]
pub enum CsvError {
    #[error("failed to open input: {0}")]
    Open(csv::Error),

    #[error("line {line}: failed to parse row: {source}")]
    Parse { line: usize, source: csv::Error },

    #[error("line {line}: unrecognized submission type '{kind}'")]
    UnrecognizedType { line: usize, kind: String },

    #[error("line {line}: {source}")]
    Invalid {
        line: usize,
        source: ValidationError,
    },
}

#[derive(Debug, Deserialize)]
struct InputRow {
    r#type: String,
    name: String,
    referrer: Option<String>,
    preferred_date: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    slot: Option<String>,
}

impl InputRow {
    /// Trim every field except the referrer, which is matched verbatim.
    fn trimmed(self) -> Self {
        Self {
            r#type: self.r#type.trim().to_string(),
            name: self.name.trim().to_string(),
            referrer: self.referrer,
            preferred_date: trim_optional(self.preferred_date),
            email: trim_optional(self.email),
            phone: trim_optional(self.phone),
            slot: trim_optional(self.slot),
        }
    }
}

fn trim_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Debug, Serialize)]
struct OutputRow<'a> {
    rank: usize,
    name: &'a str,
    referrals: u32,
    tier: &'static str,
}

/// Read form submissions from a csv file
pub fn read_submissions(
    path: impl AsRef<Path>,
) -> Result<impl Iterator<Item = Result<Submission, CsvError>>, CsvError> {
    let reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_path(path)
        .map_err(CsvError::Open)?;

    Ok(reader
        .into_deserialize::<InputRow>()
        .enumerate()
        .map(|(idx, result)| {
            let line = idx + 2; // 1-indexed, skip header
            let row = result
                .map_err(|source| CsvError::Parse { line, source })?
                .trimmed();
            let submission = match row.r#type.as_str() {
                "referral" => {
                    NewReferral::new(row.name, row.referrer, row.preferred_date)
                        .map(Submission::Referral)
                }
                "booking" => NewBooking::new(
                    row.name,
                    row.email.unwrap_or_default(),
                    row.phone.unwrap_or_default(),
                    row.slot.unwrap_or_default(),
                )
                .map(Submission::Booking),
                other => {
                    return Err(CsvError::UnrecognizedType {
                        line,
                        kind: other.to_string(),
                    });
                }
            };
            submission.map_err(|source| CsvError::Invalid { line, source })
        }))
}

/// Write the referrer ranking in csv format
pub fn write_ranking<'a>(
    writer: impl io::Write,
    ranking: impl IntoIterator<Item = &'a RankedReferrer>,
) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(writer);

    for entry in ranking {
        writer.serialize(OutputRow {
            rank: entry.position,
            name: &entry.name,
            referrals: entry.referral_count,
            tier: entry.tier.label(),
        })?;
    }

    writer.flush()?;
    Ok(())
}
