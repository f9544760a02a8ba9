//! Anomaly detection
//!
//! Flags days whose aggregates deviate from the mean of the rolling history
//! by more than the configured number of standard deviations, plus days with
//! an unusual share of late-night work.
//!
//! Severity of a σ-test anomaly grows with its deviation: medium up to 3σ,
//! high above 3σ. Deviations above 4σ get an extra `Critical` tier on top of
//! that scale, so callers expecting only medium and high should treat
//! `Critical` as high. Unusual timing is always high.

use std::cmp::Reverse;

use crate::analysis::{is_late_hour, mean, split_by_day, std_dev};
use crate::config::{AnalyzerConfig, AnomalyConfig};
use crate::types::{
    ActivityRecord, AnomalyKind, AnomalyMetrics, AnomalyRecord, DailyAggregate, Severity,
};

const SECS_PER_HOUR: f64 = 3600.0;

/// Total time on a dip day must reach this share of the mean total
const DIP_MIN_TOTAL_SHARE: f64 = 0.5;

/// Fold start-sorted records into one aggregate per local calendar day
pub fn build_daily_aggregates(
    records: &[ActivityRecord],
    config: &AnalyzerConfig,
) -> Vec<DailyAggregate> {
    split_by_day(records, config)
        .into_iter()
        .map(|(date, day)| DailyAggregate {
            date,
            total_seconds: day.iter().map(|r| r.duration_seconds).sum(),
            productive_seconds: day
                .iter()
                .filter(|r| r.activity_type.is_productive())
                .map(|r| r.duration_seconds)
                .sum(),
            activity_count: day.len() as u32,
            record_hours: day.iter().map(|r| config.local_hour(r.started_at)).collect(),
        })
        .collect()
}

/// Share of a day's records that started in late hours (0 for no records)
pub fn late_share(day: &DailyAggregate) -> f64 {
    if day.record_hours.is_empty() {
        return 0.0;
    }
    let late = day.record_hours.iter().filter(|&&h| is_late_hour(h)).count();
    late as f64 / day.record_hours.len() as f64
}

/// Mean and population standard deviation of one metric across the window
#[derive(Debug, Clone, Copy)]
struct SeriesStats {
    mean: f64,
    std_dev: f64,
}

impl SeriesStats {
    fn of(values: &[f64]) -> Self {
        Self {
            mean: mean(values),
            std_dev: std_dev(values),
        }
    }

    /// Signed deviation in standard deviations; `None` for a flat series
    fn sigma(&self, value: f64) -> Option<f64> {
        (self.std_dev > 0.0).then(|| (value - self.mean) / self.std_dev)
    }
}

/// Anomaly detector over daily aggregates
pub struct AnomalyDetector {
    config: AnomalyConfig,
}

impl Default for AnomalyDetector {
    fn default() -> Self {
        Self::new(AnomalyConfig::default())
    }
}

impl AnomalyDetector {
    pub fn new(config: AnomalyConfig) -> Self {
        Self { config }
    }

    /// Detect anomalies in the most recent `window_days` aggregates.
    ///
    /// Returns nothing when fewer than `min_history_days` days are available.
    /// Results are ordered by severity, then most recent first.
    pub fn detect(&self, aggregates: &[DailyAggregate]) -> Vec<AnomalyRecord> {
        let mut days = aggregates.to_vec();
        days.sort_by_key(|d| d.date);
        if days.len() > self.config.window_days {
            days.drain(..days.len() - self.config.window_days);
        }

        if days.len() < self.config.min_history_days {
            tracing::debug!(
                days = days.len(),
                required = self.config.min_history_days,
                "not enough history for anomaly detection"
            );
            return Vec::new();
        }

        let hours = |secs: i64| secs as f64 / SECS_PER_HOUR;
        let total_hours: Vec<f64> = days.iter().map(|d| hours(d.total_seconds)).collect();
        let total = SeriesStats::of(&total_hours);
        let productive = SeriesStats::of(
            &days
                .iter()
                .map(|d| hours(d.productive_seconds))
                .collect::<Vec<_>>(),
        );
        let count = SeriesStats::of(
            &days
                .iter()
                .map(|d| d.activity_count as f64)
                .collect::<Vec<_>>(),
        );
        let mean_late_share = mean(&days.iter().map(late_share).collect::<Vec<_>>());

        let threshold = self.config.sigma_threshold;
        let mut anomalies = Vec::new();

        for day in &days {
            let productive_hours = hours(day.productive_seconds);
            if let Some(dev) = productive.sigma(productive_hours) {
                if dev > threshold {
                    anomalies.push(deviation_anomaly(
                        day,
                        Deviation::Spike,
                        productive_hours,
                        productive.mean,
                        dev,
                    ));
                } else if dev < -threshold
                    && hours(day.total_seconds) >= DIP_MIN_TOTAL_SHARE * total.mean
                {
                    anomalies.push(deviation_anomaly(
                        day,
                        Deviation::Dip,
                        productive_hours,
                        productive.mean,
                        dev,
                    ));
                }
            }

            let activity_count = day.activity_count as f64;
            if let Some(dev) = count.sigma(activity_count) {
                if dev > threshold {
                    anomalies.push(deviation_anomaly(
                        day,
                        Deviation::PatternBreak,
                        activity_count,
                        count.mean,
                        dev,
                    ));
                }
            }

            let share = late_share(day);
            if share >= self.config.late_hour_share {
                anomalies.push(timing_anomaly(day, share, mean_late_share));
            }
        }

        anomalies.sort_by_key(|a| (Reverse(a.severity), Reverse(a.date)));

        tracing::debug!(
            days = days.len(),
            anomalies = anomalies.len(),
            "anomaly detection complete"
        );

        anomalies
    }
}

/// Deviation above which a σ-test anomaly is high severity
const HIGH_SIGMA: f64 = 3.0;

/// Deviation above which a σ-test anomaly is critical
const CRITICAL_SIGMA: f64 = 4.0;

fn severity_for(deviation_sigma: f64) -> Severity {
    let magnitude = deviation_sigma.abs();
    if magnitude > CRITICAL_SIGMA {
        Severity::Critical
    } else if magnitude > HIGH_SIGMA {
        Severity::High
    } else {
        Severity::Medium
    }
}

/// Anomaly kinds raised by the σ test
#[derive(Debug, Clone, Copy)]
enum Deviation {
    Spike,
    Dip,
    PatternBreak,
}

impl Deviation {
    fn kind(self) -> AnomalyKind {
        match self {
            Self::Spike => AnomalyKind::Spike,
            Self::Dip => AnomalyKind::Dip,
            Self::PatternBreak => AnomalyKind::PatternBreak,
        }
    }

    fn describe(self, actual: f64, expected: f64) -> String {
        match self {
            Self::Spike => format!(
                "Productive time of {actual:.1}h is well above the usual {expected:.1}h"
            ),
            Self::Dip => format!(
                "Productive time of {actual:.1}h is well below the usual {expected:.1}h \
                 despite normal working time"
            ),
            Self::PatternBreak => format!(
                "{actual:.0} activities against a usual {expected:.0}: excessive task switching"
            ),
        }
    }

    fn insights(self) -> &'static [&'static str] {
        match self {
            Self::Spike => &[
                "Unusually long productive day",
                "Sustained output at this level raises burnout risk",
            ],
            Self::Dip => &[
                "Time was spent but little of it was productive",
                "Possible distraction, fatigue or blocked work",
            ],
            Self::PatternBreak => &[
                "Work was fragmented across many short activities",
                "Frequent switching leaves attention residue",
            ],
        }
    }

    fn recommendations(self) -> &'static [&'static str] {
        match self {
            Self::Spike => &[
                "Schedule recovery time over the next day",
                "Check whether the extra hours were planned",
            ],
            Self::Dip => &[
                "Review what interrupted focused work on this day",
                "Protect a focus block for your most important task",
            ],
            Self::PatternBreak => &[
                "Batch communication into fixed slots",
                "Silence notifications during focus blocks",
            ],
        }
    }
}

fn to_strings(lines: &[&str]) -> Vec<String> {
    lines.iter().map(|s| s.to_string()).collect()
}

fn deviation_anomaly(
    day: &DailyAggregate,
    deviation: Deviation,
    actual: f64,
    expected: f64,
    deviation_sigma: f64,
) -> AnomalyRecord {
    AnomalyRecord {
        date: day.date,
        kind: deviation.kind(),
        severity: severity_for(deviation_sigma),
        metrics: AnomalyMetrics {
            actual,
            expected,
            deviation_sigma,
        },
        confidence: (0.5 + 0.1 * deviation_sigma.abs()).min(0.95),
        description: deviation.describe(actual, expected),
        insights: to_strings(deviation.insights()),
        recommendations: to_strings(deviation.recommendations()),
    }
}

fn timing_anomaly(day: &DailyAggregate, share: f64, mean_share: f64) -> AnomalyRecord {
    AnomalyRecord {
        date: day.date,
        kind: AnomalyKind::UnusualTiming,
        severity: Severity::High,
        metrics: AnomalyMetrics {
            actual: share * 100.0,
            expected: mean_share * 100.0,
            deviation_sigma: 0.0,
        },
        confidence: (0.6 + 0.5 * share).min(0.95),
        description: format!(
            "{:.0}% of activities started late at night or before dawn",
            share * 100.0
        ),
        insights: to_strings(&[
            "Late-night work disrupts sleep and next-day focus",
            "Working outside regular hours often signals deadline pressure",
        ]),
        recommendations: to_strings(&[
            "Move demanding work into daytime peak hours",
            "Set a fixed end time for the working day",
        ]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ActivityType;
    use chrono::{NaiveDate, TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn aggregate(day: u32, productive_hours: i64, count: u32) -> DailyAggregate {
        DailyAggregate {
            date: date(day),
            total_seconds: (productive_hours + 2) * 3600,
            productive_seconds: productive_hours * 3600,
            activity_count: count,
            record_hours: vec![10; count as usize],
        }
    }

    #[test]
    fn test_insufficient_history() {
        let days: Vec<_> = (1..=6).map(|d| aggregate(d, 4, 20)).collect();
        assert!(AnomalyDetector::default().detect(&days).is_empty());
    }

    #[test]
    fn test_productive_spike() {
        let mut days: Vec<_> = (1..=9).map(|d| aggregate(d, 4, 20)).collect();
        days.push(aggregate(10, 10, 20));

        let anomalies = AnomalyDetector::default().detect(&days);
        assert_eq!(anomalies.len(), 1);

        let spike = &anomalies[0];
        assert_eq!(spike.kind, AnomalyKind::Spike);
        assert_eq!(spike.date, date(10));
        assert!(spike.metrics.deviation_sigma > 2.0);
        assert_eq!(spike.metrics.actual, 10.0);
        assert!((spike.metrics.expected - 4.6).abs() < 1e-9);
        assert!(!spike.insights.is_empty());
        assert!(!spike.recommendations.is_empty());
    }

    #[test]
    fn test_dip_requires_normal_total_time() {
        let mut days: Vec<_> = (1..=9).map(|d| aggregate(d, 6, 20)).collect();
        // Worked the usual 8h but only 1h was productive
        days.push(DailyAggregate {
            total_seconds: 8 * 3600,
            ..aggregate(10, 1, 20)
        });

        let anomalies = AnomalyDetector::default().detect(&days);
        assert_eq!(anomalies.len(), 1);
        assert_eq!(anomalies[0].kind, AnomalyKind::Dip);
        assert!(anomalies[0].metrics.deviation_sigma < -2.0);

        // A day off is not a dip
        let mut days: Vec<_> = (1..=9).map(|d| aggregate(d, 6, 20)).collect();
        days.push(DailyAggregate {
            total_seconds: 3600,
            ..aggregate(10, 1, 20)
        });
        assert!(AnomalyDetector::default().detect(&days).is_empty());
    }

    #[test]
    fn test_pattern_break() {
        let mut days: Vec<_> = (1..=9).map(|d| aggregate(d, 4, 20)).collect();
        days.push(aggregate(10, 4, 120));

        let anomalies = AnomalyDetector::default().detect(&days);
        assert_eq!(anomalies.len(), 1);
        assert_eq!(anomalies[0].kind, AnomalyKind::PatternBreak);
        assert_eq!(anomalies[0].metrics.actual, 120.0);
    }

    #[test]
    fn test_unusual_timing_from_records() {
        let config = AnalyzerConfig::default();
        let mut records = Vec::new();
        for day in 1..=7 {
            for i in 0..10u32 {
                // On the last day, four records start in the evening
                let hour = if day == 7 && i >= 6 { 20 + (i - 6) } else { 9 + i };
                records.push(ActivityRecord::new(
                    Utc.with_ymd_and_hms(2024, 1, day, hour, 0, 0).unwrap(),
                    1800,
                    ActivityType::Code,
                    "Code",
                ));
            }
        }
        records.sort_by_key(|r| r.started_at);

        let aggregates = build_daily_aggregates(&records, &config);
        assert_eq!(aggregates.len(), 7);
        assert_eq!(aggregates[6].activity_count, 10);

        let anomalies = AnomalyDetector::new(config.anomaly.clone()).detect(&aggregates);
        let timing: Vec<_> = anomalies
            .iter()
            .filter(|a| a.kind == AnomalyKind::UnusualTiming)
            .collect();
        assert_eq!(timing.len(), 1);
        assert_eq!(timing[0].date, date(7));
        assert_eq!(timing[0].severity, Severity::High);
        assert!((timing[0].metrics.actual - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_ordering_by_severity_then_recency() {
        let mut days: Vec<_> = (1..=20).map(|d| aggregate(d, 4, 20)).collect();
        // Huge spike early, late-night day later
        days[2] = aggregate(3, 20, 20);
        days[15].record_hours = vec![22; 20];

        let anomalies = AnomalyDetector::default().detect(&days);
        assert_eq!(anomalies.len(), 2);
        assert_eq!(anomalies[0].kind, AnomalyKind::Spike);
        assert_eq!(anomalies[0].severity, Severity::Critical);
        assert_eq!(anomalies[1].kind, AnomalyKind::UnusualTiming);
        assert!(anomalies.windows(2).all(|w| w[0].severity >= w[1].severity));
    }

    #[test]
    fn test_window_keeps_most_recent_days() {
        let config = AnomalyConfig {
            window_days: 10,
            ..AnomalyConfig::default()
        };
        // Old spike falls outside the window
        let mut days: Vec<_> = (1..=25).map(|d| aggregate(d, 4, 20)).collect();
        days[0] = aggregate(1, 12, 20);
        assert!(AnomalyDetector::new(config).detect(&days).is_empty());
    }

    #[test]
    fn test_severity_tiers() {
        assert_eq!(severity_for(2.5), Severity::Medium);
        assert_eq!(severity_for(-3.0), Severity::Medium);
        assert_eq!(severity_for(3.2), Severity::High);
        assert_eq!(severity_for(-3.5), Severity::High);
        assert_eq!(severity_for(4.6), Severity::Critical);
    }

    #[test]
    fn test_flat_series_never_flags() {
        let days: Vec<_> = (1..=10).map(|d| aggregate(d, 4, 20)).collect();
        assert!(AnomalyDetector::default().detect(&days).is_empty());
    }
}
