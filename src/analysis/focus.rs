//! Focus effectiveness
//!
//! Rewards sustained, uninterrupted, high-value sessions over fragmented ones.

use crate::types::Session;

/// Maximum bonus for the share of long sessions
const LONG_SESSION_BONUS: f64 = 15.0;

/// Session length (hours) at which the duration component saturates
const DURATION_CAP_HOURS: f64 = 2.0;

/// Score one session (0-100).
///
/// `0.7 × focusRatio × 100 + 0.3 × min(100, hours × 50)` with hours capped at 2.
pub fn session_score(session: &Session<'_>) -> f64 {
    let hours = (session.span_seconds() as f64 / 3600.0).min(DURATION_CAP_HOURS);
    let duration_score = (hours * 50.0).min(100.0);
    0.7 * session.focus_ratio() * 100.0 + 0.3 * duration_score
}

/// Score focus effectiveness across sessions (0-100); 0 without sessions
pub fn focus_effectiveness_score(sessions: &[Session<'_>], long_session_secs: i64) -> f64 {
    if sessions.is_empty() {
        return 0.0;
    }

    let n = sessions.len() as f64;
    let mean_score = sessions.iter().map(session_score).sum::<f64>() / n;
    let long_sessions = sessions
        .iter()
        .filter(|s| s.span_seconds() > long_session_secs)
        .count();

    (mean_score + LONG_SESSION_BONUS * (long_sessions as f64 / n)).clamp(0.0, 100.0)
}
