//! Energy prediction
//!
//! Blends a historical hour-of-day productivity baseline with recent cognitive
//! load to estimate current energy and project the next 24 hours.

use chrono::{DateTime, Duration, Utc};

use crate::analysis::{estimate_cognitive_load, HourlyProfile};
use crate::config::AnalyzerConfig;
use crate::types::{ActivityRecord, EnergyPrediction, HourlyEnergy, TaskTiming};

/// Baseline energy for hours without history
pub const DEFAULT_HOURLY_ENERGY: f64 = 0.5;

/// Bounds of the current energy level
const MIN_ENERGY: f64 = 0.1;
const MAX_ENERGY: f64 = 1.0;

/// Current level below which recovery is recommended
const RECOVERY_LEVEL: f64 = 0.3;

/// Projection thresholds for task timing
const DEEP_WORK_LEVEL: f64 = 0.8;
const LEARNING_LEVEL: f64 = 0.6;
const MEETING_LEVEL: f64 = 0.4;

/// Energy predictor
pub struct EnergyPredictor<'a> {
    config: &'a AnalyzerConfig,
}

impl<'a> EnergyPredictor<'a> {
    pub fn new(config: &'a AnalyzerConfig) -> Self {
        Self { config }
    }

    /// Predict energy from start-sorted records as of the reference time `now`
    pub fn predict(&self, records: &[ActivityRecord], now: DateTime<Utc>) -> EnergyPrediction {
        let energy = &self.config.energy;
        let baseline = baseline_curve(&HourlyProfile::from_records(records, self.config));

        // Recent load and productivity
        let recent_start = window_start(now, energy.recent_window_secs);
        let recent: Vec<ActivityRecord> = records
            .iter()
            .filter(|r| r.started_at >= recent_start && r.started_at <= now)
            .cloned()
            .collect();
        let recent_cognitive_load = estimate_cognitive_load(&recent, self.config).overall_load;
        let recent_productivity = productive_fraction(&recent);

        let current_level = (0.8 - 0.5 * recent_cognitive_load + 0.3 * recent_productivity)
            .clamp(MIN_ENERGY, MAX_ENERGY);

        // Intensive time overlapping the trailing window
        let intensive_start = window_start(now, energy.intensive_window_secs);
        let intensive_seconds: i64 = records
            .iter()
            .filter(|r| r.activity_type.is_intensive())
            .map(|r| overlap_seconds(r, intensive_start, now))
            .sum();

        let current_hour = self.config.local_hour(now);
        let projection = self.project(&baseline, current_hour);
        let optimal_timing = task_timing(&projection);

        let recovery_needed =
            current_level < RECOVERY_LEVEL || intensive_seconds > energy.intensive_limit_secs;

        tracing::debug!(
            current_level,
            recent_cognitive_load,
            intensive_seconds,
            recovery_needed,
            "energy predicted"
        );

        EnergyPrediction {
            current_level,
            current_hour,
            baseline: baseline.to_vec(),
            projection,
            optimal_timing,
            recovery_needed,
            recent_cognitive_load,
            recent_productivity,
            intensive_seconds,
        }
    }

    /// Project the next 24 hours from the baseline with a fatigue multiplier
    fn project(&self, baseline: &[f64; 24], current_hour: u32) -> Vec<HourlyEnergy> {
        (0..24u32)
            .map(|offset| {
                let hour = (current_hour + offset) % 24;
                HourlyEnergy {
                    hour,
                    level: baseline[hour as usize] * self.fatigue(offset),
                }
            })
            .collect()
    }

    /// 1.0 until onset, then linear decay to the floor
    fn fatigue(&self, hours_ahead: u32) -> f64 {
        let energy = &self.config.energy;
        if hours_ahead < energy.fatigue_onset_hours {
            return 1.0;
        }
        let hours_fatigued = (hours_ahead - energy.fatigue_onset_hours + 1) as f64;
        (1.0 - energy.fatigue_decay_per_hour * hours_fatigued).max(energy.fatigue_floor)
    }
}

/// Productive share of time per hour of day; hours without data get 0.5
pub fn baseline_curve(profile: &HourlyProfile) -> [f64; 24] {
    let mut curve = [DEFAULT_HOURLY_ENERGY; 24];
    for (hour, level) in curve.iter_mut().enumerate() {
        if let Some(share) = profile.productive_share(hour) {
            *level = share;
        }
    }
    curve
}

fn productive_fraction(records: &[ActivityRecord]) -> f64 {
    let total: i64 = records.iter().map(|r| r.duration_seconds).sum();
    if total <= 0 {
        return 0.0;
    }
    let productive: i64 = records
        .iter()
        .filter(|r| r.activity_type.is_productive())
        .map(|r| r.duration_seconds)
        .sum();
    productive as f64 / total as f64
}

/// Start of a trailing window ending at `now`, clamped to chrono's lower bound
fn window_start(now: DateTime<Utc>, window_secs: i64) -> DateTime<Utc> {
    Duration::try_seconds(window_secs)
        .and_then(|window| now.checked_sub_signed(window))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

fn overlap_seconds(record: &ActivityRecord, start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    let from = record.started_at.max(start);
    let to = record.ended_at().min(end);
    (to - from).num_seconds().max(0)
}

fn task_timing(projection: &[HourlyEnergy]) -> TaskTiming {
    let mut timing = TaskTiming::default();
    for slot in projection {
        if slot.level > DEEP_WORK_LEVEL {
            timing.deep_work.push(slot.hour);
            timing.creative.push(slot.hour);
        } else if slot.level > LEARNING_LEVEL {
            timing.learning.push(slot.hour);
            timing.creative.push(slot.hour);
        } else if slot.level > MEETING_LEVEL {
            timing.meetings.push(slot.hour);
        } else {
            timing.administrative.push(slot.hour);
        }
    }
    timing
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ActivityType;
    use chrono::TimeZone;

    fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, hour, minute, 0).unwrap()
    }

    fn predict(records: &[ActivityRecord], now: DateTime<Utc>) -> EnergyPrediction {
        let config = AnalyzerConfig::default();
        EnergyPredictor::new(&config).predict(records, now)
    }

    #[test]
    fn test_no_history() {
        let prediction = predict(&[], at(15, 9, 0));

        assert_eq!(prediction.baseline, vec![0.5; 24]);
        assert_eq!(prediction.current_hour, 9);
        // no recent load, no recent productivity
        assert!((prediction.current_level - 0.8).abs() < 1e-9);
        assert!(!prediction.recovery_needed);
        assert_eq!(prediction.projection.len(), 24);
        assert_eq!(prediction.projection[0].hour, 9);
        assert_eq!(prediction.projection[23].hour, 8);
    }

    #[test]
    fn test_unbounded_window_does_not_overflow() {
        let mut config = AnalyzerConfig::default();
        config.energy.recent_window_secs = i64::MAX;
        config.energy.intensive_window_secs = i64::MAX;
        let records = vec![ActivityRecord::new(at(15, 8, 0), 3600, ActivityType::Code, "Code")];

        let prediction = EnergyPredictor::new(&config).predict(&records, at(15, 10, 0));
        assert_eq!(prediction.intensive_seconds, 3600);
        assert!(prediction.recent_productivity > 0.99);
    }

    #[test]
    fn test_fatigue_decay() {
        let prediction = predict(&[], at(15, 0, 0));
        let levels: Vec<f64> = prediction.projection.iter().map(|p| p.level).collect();

        for level in &levels[..12] {
            assert!((level - 0.5).abs() < 1e-9);
        }
        // first fatigued hour: 1 - 0.06
        assert!((levels[12] - 0.5 * 0.94).abs() < 1e-9);
        // decays monotonically and never below the floor
        assert!(levels[12..].windows(2).all(|w| w[1] <= w[0]));
        assert!(levels.iter().all(|&l| l >= 0.5 * 0.3 - 1e-9));
    }

    #[test]
    fn test_baseline_from_history() {
        let records = vec![
            ActivityRecord::new(at(15, 9, 0), 1800, ActivityType::Code, "Code"),
            ActivityRecord::new(at(15, 9, 30), 1800, ActivityType::Social, "Twitter"),
        ];
        let prediction = predict(&records, at(15, 12, 0));
        assert!((prediction.baseline[9] - 0.5).abs() < 1e-9);

        let records = vec![ActivityRecord::new(at(15, 10, 0), 3600, ActivityType::Code, "Code")];
        let prediction = predict(&records, at(15, 12, 0));
        assert_eq!(prediction.baseline[10], 1.0);
    }

    #[test]
    fn test_recent_productivity_raises_level() {
        let records = vec![ActivityRecord::new(at(15, 11, 0), 3600, ActivityType::Code, "Code")];
        let prediction = predict(&records, at(15, 12, 0));
        // single record: load = 0.3 (multitasking only), productivity 1.0
        assert!((prediction.recent_cognitive_load - 0.3).abs() < 1e-9);
        assert!((prediction.current_level - (0.8 - 0.15 + 0.3)).abs() < 1e-9);
    }

    #[test]
    fn test_recovery_after_long_intensive_stretch() {
        // 5 hours of coding ending now
        let records: Vec<_> = (0..5)
            .map(|h| ActivityRecord::new(at(15, 8 + h, 0), 3600, ActivityType::Code, "Code"))
            .collect();
        let prediction = predict(&records, at(15, 13, 0));
        assert_eq!(prediction.intensive_seconds, 5 * 3600);
        assert!(prediction.recovery_needed);
    }

    #[test]
    fn test_intensive_time_is_clipped_to_window() {
        // 10 hour record, only the last 6 hours count
        let records = vec![ActivityRecord::new(
            at(15, 3, 0),
            10 * 3600,
            ActivityType::Debug,
            "gdb",
        )];
        let prediction = predict(&records, at(15, 13, 0));
        assert_eq!(prediction.intensive_seconds, 6 * 3600);
    }

    #[test]
    fn test_task_timing_buckets() {
        let projection = vec![
            HourlyEnergy { hour: 9, level: 0.9 },
            HourlyEnergy { hour: 10, level: 0.7 },
            HourlyEnergy { hour: 11, level: 0.5 },
            HourlyEnergy { hour: 12, level: 0.2 },
        ];
        let timing = task_timing(&projection);
        assert_eq!(timing.deep_work, vec![9]);
        assert_eq!(timing.learning, vec![10]);
        assert_eq!(timing.creative, vec![9, 10]);
        assert_eq!(timing.meetings, vec![11]);
        assert_eq!(timing.administrative, vec![12]);
    }
}
