//! Session segmentation
//!
//! Partitions a start-sorted record sequence into sessions: a new session
//! starts whenever the idle gap between a record's end and the next record's
//! start exceeds the threshold.

use crate::types::{ActivityRecord, Session};

/// Split sorted records into sessions with a single left-to-right scan.
///
/// Every record lands in exactly one session and sessions keep input order.
pub fn segment_sessions(records: &[ActivityRecord], gap_threshold_secs: i64) -> Vec<Session<'_>> {
    let mut sessions = Vec::new();
    if records.is_empty() {
        return sessions;
    }

    let mut session_start = 0;
    for (i, pair) in records.windows(2).enumerate() {
        if pair[0].gap_to(&pair[1]) > gap_threshold_secs {
            sessions.push(Session::new(&records[session_start..=i]));
            session_start = i + 1;
        }
    }
    sessions.push(Session::new(&records[session_start..]));

    tracing::trace!(
        records = records.len(),
        sessions = sessions.len(),
        "segmented activity stream"
    );

    sessions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ActivityType;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap() + Duration::seconds(secs)
    }

    fn record(start: i64, duration: i64) -> ActivityRecord {
        ActivityRecord::new(at(start), duration, ActivityType::Code, "Code")
    }

    #[test]
    fn test_empty_input() {
        assert!(segment_sessions(&[], 300).is_empty());
    }

    #[test]
    fn test_single_record() {
        let records = vec![record(0, 60)];
        let sessions = segment_sessions(&records, 300);
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].len(), 1);
    }

    #[test]
    fn test_gap_at_threshold_stays_in_session() {
        // gap = 360 - (0 + 60) = 300, not above threshold
        let records = vec![record(0, 60), record(360, 60)];
        assert_eq!(segment_sessions(&records, 300).len(), 1);
    }

    #[test]
    fn test_gap_above_threshold_splits() {
        let records = vec![record(0, 60), record(361, 60), record(430, 60)];
        let sessions = segment_sessions(&records, 300);
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].len(), 1);
        assert_eq!(sessions[1].len(), 2);
    }

    #[test]
    fn test_partition_law() {
        let records: Vec<_> = [0, 100, 900, 950, 3000, 3100, 3200, 9000]
            .iter()
            .map(|&s| record(s, 60))
            .collect();

        let sessions = segment_sessions(&records, 300);

        // Concatenating the sessions reproduces the input exactly
        let rejoined: Vec<_> = sessions
            .iter()
            .flat_map(|s| s.records().iter().cloned())
            .collect();
        assert_eq!(rejoined, records);

        // Within a session every gap respects the threshold
        for session in &sessions {
            for pair in session.records().windows(2) {
                assert!(pair[0].gap_to(&pair[1]) <= 300);
            }
        }

        // Between sessions the gap exceeds it
        for pair in sessions.windows(2) {
            let last = pair[0].records().last().unwrap();
            let first = &pair[1].records()[0];
            assert!(last.gap_to(first) > 300);
        }
    }

    #[test]
    fn test_overlapping_records_stay_together() {
        let records = vec![record(0, 600), record(100, 60)];
        let sessions = segment_sessions(&records, 300);
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].span_seconds(), 600);
    }
}
