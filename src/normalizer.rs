//! Activity stream normalization
//!
//! Validates raw activity records and orders them by start time. Invalid
//! records are rejected with the index of the offending record; nothing is
//! silently dropped or clamped.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::types::ActivityRecord;

/// Longest single record accepted (7 days)
pub const MAX_RECORD_DURATION_SECS: i64 = 7 * 24 * 3600;

/// Why an activity record was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("record {index}: duration must be positive, got {duration_seconds}s")]
    NonPositiveDuration { index: usize, duration_seconds: i64 },

    /// Longer than [`MAX_RECORD_DURATION_SECS`], or ending past chrono's range
    #[error("record {index}: duration {duration_seconds}s is out of range")]
    DurationOutOfRange { index: usize, duration_seconds: i64 },

    #[error("record {index}: app name is empty")]
    EmptyAppName { index: usize },

    #[error("record {index}: starts at {started_at}, after reference time {reference}")]
    StartsAfterReference {
        index: usize,
        started_at: DateTime<Utc>,
        reference: DateTime<Utc>,
    },
}

/// Normalizer for activity streams
pub struct ActivityNormalizer;

impl ActivityNormalizer {
    /// Validate a single record at position `index` of the caller's input
    pub fn validate(
        index: usize,
        record: &ActivityRecord,
        reference: Option<DateTime<Utc>>,
    ) -> Result<(), ValidationError> {
        if record.duration_seconds <= 0 {
            return Err(ValidationError::NonPositiveDuration {
                index,
                duration_seconds: record.duration_seconds,
            });
        }

        if record.duration_seconds > MAX_RECORD_DURATION_SECS
            || record.checked_ended_at().is_none()
        {
            return Err(ValidationError::DurationOutOfRange {
                index,
                duration_seconds: record.duration_seconds,
            });
        }

        if record.app_name.trim().is_empty() {
            return Err(ValidationError::EmptyAppName { index });
        }

        if let Some(reference) = reference {
            if record.started_at > reference {
                return Err(ValidationError::StartsAfterReference {
                    index,
                    started_at: record.started_at,
                    reference,
                });
            }
        }

        Ok(())
    }

    /// Validate every record and return a copy sorted ascending by start time.
    ///
    /// The sort is stable, so records sharing a start time keep their input order.
    pub fn normalize(
        records: &[ActivityRecord],
        reference: Option<DateTime<Utc>>,
    ) -> Result<Vec<ActivityRecord>, ValidationError> {
        for (index, record) in records.iter().enumerate() {
            Self::validate(index, record, reference)?;
        }

        let mut sorted = records.to_vec();
        sorted.sort_by_key(|r| r.started_at);
        Ok(sorted)
    }
}
