//! Flow-state detection
//!
//! A session is in flow when it is long, dominated by a single activity type,
//! rarely interrupted and cognitively calm. Detection needs at least three
//! days of history; with less, nothing is reported.

use std::collections::BTreeMap;

use crate::analysis::cognitive::{estimate_cognitive_load, is_context_switch};
use crate::config::AnalyzerConfig;
use crate::types::{ActivityType, FlowSession, Session};

/// Distinct days required before flow detection runs
pub const MIN_FLOW_DAYS: usize = 3;

const MIN_FLOW_DURATION_SECS: i64 = 25 * 60;
const MIN_TYPE_CONSISTENCY: f64 = 0.7;
const MAX_INTERRUPTIONS_PER_HOUR: f64 = 6.0;
const MAX_FLOW_LOAD: f64 = 0.4;

/// Duration (seconds) at which the duration component of the flow score saturates
const FLOW_DURATION_TARGET_SECS: f64 = 90.0 * 60.0;

/// Find sessions that qualify as flow states
pub fn detect_flow_states(
    sessions: &[Session<'_>],
    days_spanned: usize,
    config: &AnalyzerConfig,
) -> Vec<FlowSession> {
    if days_spanned < MIN_FLOW_DAYS {
        return Vec::new();
    }

    sessions
        .iter()
        .filter_map(|session| evaluate_session(session, config))
        .collect()
}

fn evaluate_session(session: &Session<'_>, config: &AnalyzerConfig) -> Option<FlowSession> {
    let span = session.span_seconds();
    if span < MIN_FLOW_DURATION_SECS {
        return None;
    }

    let (dominant_type, type_consistency) = dominant_type(session)?;
    if type_consistency < MIN_TYPE_CONSISTENCY {
        return None;
    }

    let switches = session
        .records()
        .windows(2)
        .filter(|pair| is_context_switch(&pair[0], &pair[1]))
        .count();
    let interruptions_per_hour = switches as f64 / (span as f64 / 3600.0);
    if interruptions_per_hour > MAX_INTERRUPTIONS_PER_HOUR {
        return None;
    }

    let cognitive_load = estimate_cognitive_load(session.records(), config).overall_load;
    if cognitive_load > MAX_FLOW_LOAD {
        return None;
    }

    let duration_component = (span as f64 / FLOW_DURATION_TARGET_SECS).min(1.0);
    let flow_score =
        40.0 * type_consistency + 30.0 * duration_component + 30.0 * (1.0 - cognitive_load);

    Some(FlowSession {
        start: session.start(),
        end: session.end(),
        duration_seconds: span,
        dominant_type,
        type_consistency,
        interruptions_per_hour,
        cognitive_load,
        flow_score: flow_score.round().clamp(0.0, 100.0) as u8,
    })
}

/// Activity type with the most time in the session, and its share of active time
fn dominant_type(session: &Session<'_>) -> Option<(ActivityType, f64)> {
    let mut seconds: BTreeMap<ActivityType, i64> = BTreeMap::new();
    for record in session.records() {
        *seconds.entry(record.activity_type).or_insert(0) += record.duration_seconds;
    }

    let active = session.active_seconds();
    if active <= 0 {
        return None;
    }

    seconds
        .into_iter()
        .max_by_key(|(_, secs)| *secs)
        .map(|(ty, secs)| (ty, secs as f64 / active as f64))
}
