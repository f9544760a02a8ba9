//! Time optimization
//!
//! Compares when productive work happens against a circadian reference curve.
//! Working at the hours one is naturally most productive scores higher than
//! simply working more.

use crate::config::AnalyzerConfig;
use crate::types::{ActivityRecord, DEFAULT_PEAK_HOURS};

/// Expected productivity ratio for each hour of the day (local time).
///
/// Peaks mid-morning and mid-afternoon, troughs overnight.
pub const CIRCADIAN_CURVE: [f64; 24] = [
    0.20, 0.15, 0.10, 0.10, 0.15, 0.25, // 00-05
    0.40, 0.55, 0.70, 0.85, 0.95, 0.90, // 06-11
    0.70, 0.65, 0.80, 0.85, 0.80, 0.70, // 12-17
    0.60, 0.50, 0.45, 0.40, 0.30, 0.25, // 18-23
];

/// Maximum bonus for the share of time inside canonical peak hours
const PEAK_HOUR_BONUS: f64 = 20.0;

/// Seconds of activity per local hour of day, bucketed by record start
#[derive(Debug, Clone, PartialEq)]
pub struct HourlyProfile {
    /// Raw seconds per hour
    pub total: [f64; 24],
    /// Seconds weighted by productivity weight
    pub weighted: [f64; 24],
    /// Seconds of productive activity types
    pub productive: [f64; 24],
}

impl HourlyProfile {
    pub fn from_records<'a>(
        records: impl IntoIterator<Item = &'a ActivityRecord>,
        config: &AnalyzerConfig,
    ) -> Self {
        let mut profile = Self {
            total: [0.0; 24],
            weighted: [0.0; 24],
            productive: [0.0; 24],
        };

        for record in records {
            let hour = config.local_hour(record.started_at) as usize;
            let secs = record.duration_seconds as f64;
            profile.total[hour] += secs;
            profile.weighted[hour] += record.weighted_seconds();
            if record.activity_type.is_productive() {
                profile.productive[hour] += secs;
            }
        }

        profile
    }

    pub fn total_seconds(&self) -> f64 {
        self.total.iter().sum()
    }

    /// Weighted / raw time for an hour, `None` when the hour has no activity
    pub fn productivity_ratio(&self, hour: usize) -> Option<f64> {
        (self.total[hour] > 0.0).then(|| self.weighted[hour] / self.total[hour])
    }

    /// Productive / raw time for an hour, `None` when the hour has no activity
    pub fn productive_share(&self, hour: usize) -> Option<f64> {
        (self.total[hour] > 0.0).then(|| self.productive[hour] / self.total[hour])
    }
}

/// Score alignment with the circadian curve (0-100); 0 without activity
pub fn time_optimization_score(profile: &HourlyProfile) -> f64 {
    let total = profile.total_seconds();
    if total <= 0.0 {
        return 0.0;
    }

    let alignment: f64 = (0..24)
        .filter_map(|hour| {
            profile.productivity_ratio(hour).map(|actual| {
                let share = profile.total[hour] / total;
                (1.0 - (actual - CIRCADIAN_CURVE[hour]).abs()) * share
            })
        })
        .sum();

    let peak_secs: f64 = DEFAULT_PEAK_HOURS
        .iter()
        .map(|&h| profile.total[h as usize])
        .sum();

    (alignment * 100.0 + PEAK_HOUR_BONUS * (peak_secs / total)).clamp(0.0, 100.0)
}
