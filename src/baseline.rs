//! Baseline management
//!
//! This module learns a personalized baseline from a rolling window of daily
//! activity profiles. The store is owned and persisted by the caller; the
//! analyzer only ever sees immutable `PersonalizedBaseline` snapshots.

use std::collections::VecDeque;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::analysis::{estimate_cognitive_load, mean, split_by_day, std_dev};
use crate::config::AnalyzerConfig;
use crate::error::ComputeError;
use crate::normalizer::ActivityNormalizer;
use crate::segmenter::segment_sessions;
use crate::types::{ActivityRecord, PersonalizedBaseline, PRODUCTIVE_WEIGHT_THRESHOLD};

/// Default baseline window in days
pub const DEFAULT_BASELINE_WINDOW: usize = 30;

/// Days of history needed before the learned profile replaces the default
pub const MIN_BASELINE_DAYS: usize = 7;

/// Observed seconds an hour needs across the window to be classified
const MIN_HOUR_OBSERVED_SECS: f64 = 15.0 * 60.0;

/// Productivity ratio below which an hour counts as low-energy
const LOW_ENERGY_RATIO: f64 = 0.4;

const MAX_PEAK_HOURS: usize = 6;
const MIN_PEAK_HOURS: usize = 3;

/// Bounds of the learned context switch tolerance
const MIN_TOLERANCE: f64 = 0.2;
const MAX_TOLERANCE: f64 = 0.9;

/// One day of activity reduced to what the baseline needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayProfile {
    pub date: NaiveDate,
    /// Seconds per local hour
    pub hourly_total: [f64; 24],
    /// Productivity-weighted seconds per local hour
    pub hourly_weighted: [f64; 24],
    /// Mean session length (minutes)
    pub mean_session_minutes: f64,
    /// Overall cognitive load of the day (0-1)
    pub cognitive_load: f64,
}

impl DayProfile {
    fn from_day(date: NaiveDate, records: &[ActivityRecord], config: &AnalyzerConfig) -> Self {
        let mut hourly_total = [0.0; 24];
        let mut hourly_weighted = [0.0; 24];
        for record in records {
            let hour = config.local_hour(record.started_at) as usize;
            hourly_total[hour] += record.duration_seconds as f64;
            hourly_weighted[hour] += record.weighted_seconds();
        }

        let session_minutes: Vec<f64> = segment_sessions(records, config.session_gap_secs)
            .iter()
            .map(|s| s.span_seconds() as f64 / 60.0)
            .collect();

        Self {
            date,
            hourly_total,
            hourly_weighted,
            mean_session_minutes: mean(&session_minutes),
            cognitive_load: estimate_cognitive_load(records, config).overall_load,
        }
    }
}

/// Baseline store for managing the rolling window of day profiles
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaselineStore {
    /// Day profiles in ascending date order
    days: VecDeque<DayProfile>,
    /// Maximum window size
    window_size: usize,
}

impl Default for BaselineStore {
    fn default() -> Self {
        Self::new(DEFAULT_BASELINE_WINDOW)
    }
}

impl BaselineStore {
    /// Create a new baseline store with specified window size
    pub fn new(window_size: usize) -> Self {
        Self {
            days: VecDeque::with_capacity(window_size),
            window_size,
        }
    }

    /// Fold new activity into the window and return the resulting baseline.
    ///
    /// A day already in the store is replaced by the new profile for that date.
    pub fn update(
        &mut self,
        records: &[ActivityRecord],
        config: &AnalyzerConfig,
    ) -> Result<PersonalizedBaseline, ComputeError> {
        let sorted = ActivityNormalizer::normalize(records, None)?;

        for (date, day) in split_by_day(&sorted, config) {
            let profile = DayProfile::from_day(date, day, config);
            match self.days.binary_search_by_key(&date, |d| d.date) {
                Ok(pos) => self.days[pos] = profile,
                Err(pos) => self.days.insert(pos, profile),
            }
        }

        while self.days.len() > self.window_size {
            self.days.pop_front();
        }

        tracing::debug!(days = self.days.len(), "baseline store updated");
        Ok(self.baseline())
    }

    /// The learned baseline, or the default until enough days are stored
    pub fn baseline(&self) -> PersonalizedBaseline {
        if self.days.len() < MIN_BASELINE_DAYS {
            return PersonalizedBaseline::default();
        }

        let defaults = PersonalizedBaseline::default();
        let ratios = self.hourly_ratios();

        let mut peaks: Vec<(u32, f64)> = ratios
            .iter()
            .enumerate()
            .filter_map(|(hour, ratio)| ratio.map(|r| (hour as u32, r)))
            .filter(|(_, r)| *r >= PRODUCTIVE_WEIGHT_THRESHOLD)
            .collect();
        peaks.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        peaks.truncate(MAX_PEAK_HOURS);
        let peak_hours = if peaks.len() >= MIN_PEAK_HOURS {
            let mut hours: Vec<u32> = peaks.into_iter().map(|(h, _)| h).collect();
            hours.sort_unstable();
            hours
        } else {
            tracing::warn!(
                qualifying = peaks.len(),
                "too few productive hours, keeping default peak hours"
            );
            defaults.peak_hours
        };

        let low: Vec<u32> = ratios
            .iter()
            .enumerate()
            .filter(|(_, ratio)| matches!(ratio, Some(r) if *r < LOW_ENERGY_RATIO))
            .map(|(hour, _)| hour as u32)
            .collect();
        let low_energy_hours = if low.is_empty() {
            defaults.low_energy_hours
        } else {
            low
        };

        let session_minutes: Vec<f64> = self
            .days
            .iter()
            .map(|d| d.mean_session_minutes)
            .filter(|m| *m > 0.0)
            .collect();
        let preferred_session_minutes = if session_minutes.is_empty() {
            defaults.preferred_session_minutes
        } else {
            mean(&session_minutes)
        };

        // Typical load plus one standard deviation is still "normal" for this user
        let loads: Vec<f64> = self.days.iter().map(|d| d.cognitive_load).collect();
        let context_switch_tolerance =
            (mean(&loads) + std_dev(&loads)).clamp(MIN_TOLERANCE, MAX_TOLERANCE);

        PersonalizedBaseline {
            peak_hours,
            low_energy_hours,
            preferred_session_minutes,
            context_switch_tolerance,
        }
    }

    /// Weighted / raw time per hour across the window; `None` when under-observed
    fn hourly_ratios(&self) -> [Option<f64>; 24] {
        let mut ratios = [None; 24];
        for (hour, ratio) in ratios.iter_mut().enumerate() {
            let total: f64 = self.days.iter().map(|d| d.hourly_total[hour]).sum();
            if total >= MIN_HOUR_OBSERVED_SECS {
                let weighted: f64 = self.days.iter().map(|d| d.hourly_weighted[hour]).sum();
                *ratio = Some(weighted / total);
            }
        }
        ratios
    }

    /// Number of days currently in the window
    pub fn day_count(&self) -> usize {
        self.days.len()
    }

    /// Stored day profiles, oldest first
    pub fn days(&self) -> impl Iterator<Item = &DayProfile> {
        self.days.iter()
    }

    pub fn clear(&mut self) {
        self.days.clear();
    }

    /// Load baseline store from JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize baseline store to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ActivityType;
    use chrono::{Datelike, TimeZone, Utc};
    use pretty_assertions::assert_eq;

    /// Coding 9-12 and 14-15, social media at 20:00
    fn make_day(day: u32) -> Vec<ActivityRecord> {
        let at = |hour| Utc.with_ymd_and_hms(2024, 1, day, hour, 0, 0).unwrap();
        vec![
            ActivityRecord::new(at(9), 3600, ActivityType::Code, "Code"),
            ActivityRecord::new(at(10), 3600, ActivityType::Code, "Code"),
            ActivityRecord::new(at(11), 3600, ActivityType::Debug, "Code"),
            ActivityRecord::new(at(14), 3600, ActivityType::Test, "Code"),
            ActivityRecord::new(at(20), 1800, ActivityType::Social, "Twitter"),
        ]
    }

    fn make_days(days: std::ops::RangeInclusive<u32>) -> Vec<ActivityRecord> {
        days.flat_map(make_day).collect()
    }

    #[test]
    fn test_default_until_enough_days() {
        let mut store = BaselineStore::default();
        let baseline = store
            .update(&make_days(1..=6), &AnalyzerConfig::default())
            .unwrap();

        assert_eq!(store.day_count(), 6);
        assert_eq!(baseline, PersonalizedBaseline::default());
    }

    #[test]
    fn test_learns_peak_and_low_hours() {
        let mut store = BaselineStore::default();
        let baseline = store
            .update(&make_days(1..=8), &AnalyzerConfig::default())
            .unwrap();

        assert_eq!(baseline.peak_hours, vec![9, 10, 11, 14]);
        assert_eq!(baseline.low_energy_hours, vec![20]);
        assert!(baseline.context_switch_tolerance >= MIN_TOLERANCE);
        assert!(baseline.context_switch_tolerance <= MAX_TOLERANCE);
        // 9-12 is one 180 minute session, 14:00 and 20:00 are 60 and 30 minutes
        assert!((baseline.preferred_session_minutes - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_baseline_accumulation() {
        let config = AnalyzerConfig::default();
        let mut store = BaselineStore::new(7);

        store.update(&make_days(1..=5), &config).unwrap();
        assert_eq!(store.day_count(), 5);

        store.update(&make_days(6..=10), &config).unwrap();
        assert_eq!(store.day_count(), 7);

        let first = store.days().next().unwrap();
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2024, 1, 4).unwrap());
    }

    #[test]
    fn test_same_day_is_replaced() {
        let config = AnalyzerConfig::default();
        let mut store = BaselineStore::default();
        store.update(&make_day(3), &config).unwrap();
        store.update(&make_day(1), &config).unwrap();
        store.update(&make_day(3), &config).unwrap();

        let dates: Vec<u32> = store.days().map(|d| d.date.day()).collect();
        assert_eq!(dates, vec![1, 3]);
    }

    #[test]
    fn test_update_rejects_invalid_records() {
        let mut records = make_day(1);
        records[2].duration_seconds = 0;

        let mut store = BaselineStore::default();
        let result = store.update(&records, &AnalyzerConfig::default());
        assert!(matches!(result, Err(ComputeError::Validation(_))));
        assert_eq!(store.day_count(), 0);
    }

    #[test]
    fn test_serialization() {
        let mut store = BaselineStore::default();
        store
            .update(&make_days(1..=8), &AnalyzerConfig::default())
            .unwrap();

        let json = store.to_json().unwrap();
        let restored = BaselineStore::from_json(&json).unwrap();

        assert_eq!(restored.day_count(), store.day_count());
        let (before, after) = (store.baseline(), restored.baseline());
        assert_eq!(after.peak_hours, before.peak_hours);
        assert_eq!(after.low_energy_hours, before.low_energy_hours);
        assert!((after.context_switch_tolerance - before.context_switch_tolerance).abs() < 1e-9);
    }

    #[test]
    fn test_clear() {
        let mut store = BaselineStore::default();
        store
            .update(&make_days(1..=8), &AnalyzerConfig::default())
            .unwrap();
        store.clear();
        assert_eq!(store.day_count(), 0);
        assert_eq!(store.baseline(), PersonalizedBaseline::default());
    }
}
