//! Day-to-day consistency
//!
//! Consistency = max(0, 100 − 2 × stddev(daily quality scores)). Stable
//! routines score higher than volatile ones.

use crate::analysis::{quality::activity_quality_score, split_by_day, std_dev};
use crate::config::AnalyzerConfig;
use crate::types::ActivityRecord;

/// Score used when fewer than two days are available to compare
pub const NEUTRAL_CONSISTENCY: f64 = 50.0;

/// Score day-to-day stability of activity quality (0-100)
pub fn consistency_score(records: &[ActivityRecord], config: &AnalyzerConfig) -> f64 {
    let daily: Vec<f64> = split_by_day(records, config)
        .into_iter()
        .map(|(_, day)| activity_quality_score(day))
        .collect();

    if daily.len() < 2 {
        return NEUTRAL_CONSISTENCY;
    }

    (100.0 - 2.0 * std_dev(&daily)).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ActivityType;
    use chrono::{TimeZone, Utc};

    fn day(d: u32, ty: ActivityType) -> ActivityRecord {
        ActivityRecord::new(
            Utc.with_ymd_and_hms(2024, 1, d, 10, 0, 0).unwrap(),
            3600,
            ty,
            "app",
        )
    }

    #[test]
    fn test_single_day_is_neutral() {
        let records = vec![day(15, ActivityType::Code)];
        assert_eq!(
            consistency_score(&records, &AnalyzerConfig::default()),
            NEUTRAL_CONSISTENCY
        );
    }

    #[test]
    fn test_identical_days_are_perfect() {
        let records: Vec<_> = (15..20).map(|d| day(d, ActivityType::Code)).collect();
        assert_eq!(consistency_score(&records, &AnalyzerConfig::default()), 100.0);
    }

    #[test]
    fn test_volatile_days_score_lower() {
        // daily scores alternate 100 and 0: stddev 50 → 100 - 100 = 0
        let records: Vec<_> = (15..21)
            .map(|d| {
                if d % 2 == 0 {
                    day(d, ActivityType::Code)
                } else {
                    day(d, ActivityType::Entertainment)
                }
            })
            .collect();
        assert_eq!(consistency_score(&records, &AnalyzerConfig::default()), 0.0);
    }
}
