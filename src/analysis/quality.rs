//! Activity quality scoring
//!
//! Score = duration-weighted mean productivity weight × 100, plus up to
//! 20 points for the share of time spent in deep work.

use crate::types::ActivityRecord;

/// Maximum bonus for time spent in deep work types
const DEEP_WORK_BONUS: f64 = 20.0;

/// Score the activity mix of a set of records (0-100).
///
/// Returns 0 when the records cover no time.
pub fn activity_quality_score<'a>(records: impl IntoIterator<Item = &'a ActivityRecord>) -> f64 {
    let mut total_secs = 0.0;
    let mut weighted_secs = 0.0;
    let mut deep_secs = 0.0;

    for record in records {
        let secs = record.duration_seconds as f64;
        total_secs += secs;
        weighted_secs += record.weighted_seconds();
        if record.activity_type.is_deep_work() {
            deep_secs += secs;
        }
    }

    if total_secs <= 0.0 {
        return 0.0;
    }

    let base = (weighted_secs / total_secs) * 100.0;
    let bonus = DEEP_WORK_BONUS * (deep_secs / total_secs);
    (base + bonus).clamp(0.0, 100.0)
}
