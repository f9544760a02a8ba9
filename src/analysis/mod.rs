//! Productivity scoring
//!
//! Each submodule computes one facet of the analysis from normalized
//! (validated, start-sorted) activity records:
//!
//! - `quality`: duration-weighted productivity of the activity mix
//! - `focus`: how sustained and high-value sessions are
//! - `timing`: alignment of working hours with a circadian reference curve
//! - `cognitive`: context switching, multitasking and attention residue
//! - `consistency`: day-to-day stability of quality
//! - `composite`: weighted deep work score and confidence
//! - `insights`: rule table mapping scores to structured insights
//! - `flow`: detection of sessions in flow
//! - `predictions`: optimal hours, burnout risk and weekly capacity

pub mod cognitive;
pub mod composite;
pub mod consistency;
pub mod flow;
pub mod focus;
pub mod insights;
pub mod predictions;
pub mod quality;
pub mod timing;

pub use cognitive::estimate_cognitive_load;
pub use composite::{composite_score, confidence};
pub use consistency::consistency_score;
pub use flow::detect_flow_states;
pub use focus::focus_effectiveness_score;
pub use insights::{generate_insights, no_data_insight, InsightContext, InsightRule, INSIGHT_RULES};
pub use predictions::{late_night_share, predict};
pub use quality::activity_quality_score;
pub use timing::{time_optimization_score, HourlyProfile};

use chrono::NaiveDate;

use crate::config::AnalyzerConfig;
use crate::types::ActivityRecord;

/// Hours of day (local) treated as late-night work: 20:00-05:59
pub fn is_late_hour(hour: u32) -> bool {
    hour >= 20 || hour <= 5
}

/// Split start-sorted records into contiguous per-day runs, keyed by local date.
///
/// Days are returned in ascending order. Input must be sorted by start time.
pub fn split_by_day<'a>(
    records: &'a [ActivityRecord],
    config: &AnalyzerConfig,
) -> Vec<(NaiveDate, &'a [ActivityRecord])> {
    let mut days = Vec::new();
    let mut run_start = 0;

    for i in 1..=records.len() {
        let run_date = config.local_date(records[run_start].started_at);
        if i == records.len() || config.local_date(records[i].started_at) != run_date {
            days.push((run_date, &records[run_start..i]));
            run_start = i;
        }
    }

    days
}

/// Arithmetic mean (0 for an empty slice)
pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (0 for fewer than two values)
pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mu = mean(values);
    let variance = values.iter().map(|v| (v - mu).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Round to one decimal place
pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
