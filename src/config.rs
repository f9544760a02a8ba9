//! Engine configuration
//!
//! Every tunable threshold of the analysis lives here. All structs carry a
//! `Default` with the standard values and deserialize from partial JSON, so a
//! caller only needs to spell out what it overrides.

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ComputeError;

/// Default inactivity gap that ends a session (5 minutes)
pub const DEFAULT_SESSION_GAP_SECS: i64 = 300;

/// Default record count for full confidence
pub const DEFAULT_MIN_DATA_POINTS: usize = 50;

/// Largest UTC offset accepted (14 hours)
const MAX_UTC_OFFSET_MINUTES: u32 = 14 * 60;

/// Longest trailing window the energy predictor looks back over (7 days)
pub const MAX_ENERGY_WINDOW_SECS: i64 = 7 * 24 * 3600;

/// Fatigue onset must fall inside the 24-hour projection
const MAX_FATIGUE_ONSET_HOURS: u32 = 24;

/// Top-level analyzer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Inactivity gap (seconds) above which a new session starts
    pub session_gap_secs: i64,
    /// Record count at which the data-volume share of confidence saturates
    pub min_data_points: usize,
    /// Window size (seconds) for the multitasking index
    pub multitask_window_secs: i64,
    /// Idle time (seconds) after which a switch no longer carries full residue
    pub recovery_gap_secs: i64,
    /// Sessions longer than this (seconds) earn the focus bonus
    pub long_session_secs: i64,
    /// Fixed offset used for hour-of-day and calendar-day bucketing
    pub utc_offset_minutes: i32,
    pub energy: EnergyConfig,
    pub anomaly: AnomalyConfig,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            session_gap_secs: DEFAULT_SESSION_GAP_SECS,
            min_data_points: DEFAULT_MIN_DATA_POINTS,
            multitask_window_secs: 300,
            recovery_gap_secs: 300,
            long_session_secs: 1800,
            utc_offset_minutes: 0,
            energy: EnergyConfig::default(),
            anomaly: AnomalyConfig::default(),
        }
    }
}

impl AnalyzerConfig {
    /// Load configuration from JSON; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, ComputeError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Reject values that would make the formulas degenerate
    pub fn validate(&self) -> Result<(), ComputeError> {
        if self.session_gap_secs <= 0 {
            return Err(ComputeError::InvalidConfig(
                "session_gap_secs must be positive".to_string(),
            ));
        }
        if self.min_data_points == 0 {
            return Err(ComputeError::InvalidConfig(
                "min_data_points must be positive".to_string(),
            ));
        }
        if self.multitask_window_secs <= 0 {
            return Err(ComputeError::InvalidConfig(
                "multitask_window_secs must be positive".to_string(),
            ));
        }
        if self.recovery_gap_secs <= 0 {
            return Err(ComputeError::InvalidConfig(
                "recovery_gap_secs must be positive".to_string(),
            ));
        }
        if self.utc_offset_minutes.unsigned_abs() > MAX_UTC_OFFSET_MINUTES {
            return Err(ComputeError::InvalidConfig(format!(
                "utc_offset_minutes {} outside ±{}",
                self.utc_offset_minutes, MAX_UTC_OFFSET_MINUTES
            )));
        }
        self.energy.validate()?;
        self.anomaly.validate()
    }

    /// The configured offset as a chrono `FixedOffset`
    pub fn offset(&self) -> FixedOffset {
        // validate() bounds the offset well inside chrono's ±24h range
        FixedOffset::east_opt(self.utc_offset_minutes * 60)
            .unwrap_or_else(|| Utc.fix())
    }

    /// Local hour of day (0-23) for a timestamp
    pub fn local_hour(&self, ts: DateTime<Utc>) -> u32 {
        ts.with_timezone(&self.offset()).hour()
    }

    /// Local calendar date for a timestamp
    pub fn local_date(&self, ts: DateTime<Utc>) -> NaiveDate {
        ts.with_timezone(&self.offset()).date_naive()
    }
}

/// Energy predictor tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnergyConfig {
    /// Trailing window (seconds) for current load and productivity
    pub recent_window_secs: i64,
    /// Trailing window (seconds) for intensive-activity accounting
    pub intensive_window_secs: i64,
    /// Intensive seconds in the window above which recovery is needed
    pub intensive_limit_secs: i64,
    /// Projected hours before fatigue sets in
    pub fatigue_onset_hours: u32,
    /// Linear fatigue decay per hour after onset
    pub fatigue_decay_per_hour: f64,
    /// Lowest fatigue multiplier
    pub fatigue_floor: f64,
}

impl Default for EnergyConfig {
    fn default() -> Self {
        Self {
            recent_window_secs: 2 * 3600,
            intensive_window_secs: 6 * 3600,
            intensive_limit_secs: 4 * 3600,
            fatigue_onset_hours: 12,
            fatigue_decay_per_hour: 0.06,
            fatigue_floor: 0.3,
        }
    }
}

impl EnergyConfig {
    fn validate(&self) -> Result<(), ComputeError> {
        let windows = [self.recent_window_secs, self.intensive_window_secs];
        if windows.iter().any(|w| *w <= 0 || *w > MAX_ENERGY_WINDOW_SECS) {
            return Err(ComputeError::InvalidConfig(format!(
                "energy windows must be within 1-{MAX_ENERGY_WINDOW_SECS}s"
            )));
        }
        if self.intensive_limit_secs < 0 {
            return Err(ComputeError::InvalidConfig(
                "intensive_limit_secs must not be negative".to_string(),
            ));
        }
        if self.fatigue_onset_hours > MAX_FATIGUE_ONSET_HOURS {
            return Err(ComputeError::InvalidConfig(format!(
                "fatigue_onset_hours must be at most {MAX_FATIGUE_ONSET_HOURS}"
            )));
        }
        if !(0.0..=1.0).contains(&self.fatigue_decay_per_hour) {
            return Err(ComputeError::InvalidConfig(
                "fatigue_decay_per_hour must be within 0-1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.fatigue_floor) {
            return Err(ComputeError::InvalidConfig(
                "fatigue_floor must be within 0-1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Anomaly detector tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnomalyConfig {
    /// Days of history required before anything is flagged
    pub min_history_days: usize,
    /// Most recent days kept in the rolling baseline
    pub window_days: usize,
    /// Deviation (in standard deviations) that flags a day
    pub sigma_threshold: f64,
    /// Share of a day's records in late hours that flags unusual timing
    pub late_hour_share: f64,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            min_history_days: 7,
            window_days: 30,
            sigma_threshold: 2.0,
            late_hour_share: 0.3,
        }
    }
}

impl AnomalyConfig {
    fn validate(&self) -> Result<(), ComputeError> {
        if self.sigma_threshold <= 0.0 {
            return Err(ComputeError::InvalidConfig(
                "sigma_threshold must be positive".to_string(),
            ));
        }
        if self.window_days < self.min_history_days {
            return Err(ComputeError::InvalidConfig(
                "window_days must cover min_history_days".to_string(),
            ));
        }
        Ok(())
    }
}
