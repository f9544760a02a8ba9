//! Forward-looking predictions
//!
//! - optimal hours: best observed hours by productivity ratio, falling back to
//!   the baseline's peak hours when history is thin
//! - burnout risk: `40 × load + 30 × lateNightShare + 30 × overwork`
//! - weekly capacity: `avgDailyProductiveHours × 5 × (1 − burnout / 200)`

use crate::analysis::{is_late_hour, round1, timing::HourlyProfile};
use crate::types::{PersonalizedBaseline, Predictions};

/// Observed seconds an hour needs before it can be recommended
const MIN_HOUR_OBSERVATION_SECS: f64 = 15.0 * 60.0;

/// Productivity ratio an hour needs before it can be recommended
const MIN_OPTIMAL_RATIO: f64 = 0.7;

const MAX_OPTIMAL_HOURS: usize = 6;
const MIN_OPTIMAL_HOURS: usize = 3;

/// Daily active hours above which overwork starts to count
const SUSTAINABLE_DAILY_HOURS: f64 = 8.0;

/// Hours beyond the sustainable level at which overwork saturates
const OVERWORK_SPAN_HOURS: f64 = 4.0;

const WORKING_DAYS_PER_WEEK: f64 = 5.0;

/// Build predictions from the hourly profile of the analyzed window
pub fn predict(
    profile: &HourlyProfile,
    days_spanned: usize,
    cognitive_load: f64,
    baseline: &PersonalizedBaseline,
) -> Predictions {
    let total = profile.total_seconds();
    if total <= 0.0 || days_spanned == 0 {
        return Predictions {
            optimal_hours: baseline.peak_hours.clone(),
            ..Predictions::default()
        };
    }

    let optimal_hours = optimal_hours(profile, baseline);

    let late_night_share = late_night_share(profile);

    let days = days_spanned as f64;
    let avg_daily_hours = total / days / 3600.0;
    let overwork =
        ((avg_daily_hours - SUSTAINABLE_DAILY_HOURS) / OVERWORK_SPAN_HOURS).clamp(0.0, 1.0);

    let load = cognitive_load.clamp(0.0, 1.0);
    let burnout = (40.0 * load + 30.0 * late_night_share + 30.0 * overwork)
        .round()
        .clamp(0.0, 100.0);

    let productive_secs: f64 = profile.productive.iter().sum();
    let avg_daily_productive_hours = productive_secs / days / 3600.0;
    let weekly_capacity_hours =
        round1(avg_daily_productive_hours * WORKING_DAYS_PER_WEEK * (1.0 - burnout / 200.0));

    Predictions {
        optimal_hours,
        burnout_risk: burnout as u8,
        weekly_capacity_hours,
    }
}

/// Share of active time started in late-night hours
pub fn late_night_share(profile: &HourlyProfile) -> f64 {
    let total = profile.total_seconds();
    if total <= 0.0 {
        return 0.0;
    }
    let late: f64 = (0..24u32)
        .filter(|&h| is_late_hour(h))
        .map(|h| profile.total[h as usize])
        .sum();
    late / total
}

fn optimal_hours(profile: &HourlyProfile, baseline: &PersonalizedBaseline) -> Vec<u32> {
    let mut candidates: Vec<(u32, f64)> = (0..24usize)
        .filter(|&h| profile.total[h] >= MIN_HOUR_OBSERVATION_SECS)
        .filter_map(|h| profile.productivity_ratio(h).map(|ratio| (h as u32, ratio)))
        .filter(|&(_, ratio)| ratio >= MIN_OPTIMAL_RATIO)
        .collect();

    if candidates.len() < MIN_OPTIMAL_HOURS {
        tracing::debug!(
            qualifying = candidates.len(),
            "too few productive hours observed, using baseline peak hours"
        );
        return baseline.peak_hours.clone();
    }

    candidates.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    let mut hours: Vec<u32> = candidates
        .into_iter()
        .take(MAX_OPTIMAL_HOURS)
        .map(|(h, _)| h)
        .collect();
    hours.sort_unstable();
    hours
}
