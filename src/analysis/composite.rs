//! Composite deep work score and confidence

use crate::analysis::round1;
use crate::types::ScoreBreakdown;

/// Composite weights: quality, focus, timing, switching, consistency
const WEIGHT_QUALITY: f64 = 0.30;
const WEIGHT_FOCUS: f64 = 0.25;
const WEIGHT_TIMING: f64 = 0.20;
const WEIGHT_SWITCHING: f64 = 0.15;
const WEIGHT_CONSISTENCY: f64 = 0.10;

/// Weighted combination of the five sub-scores, rounded and clamped to 0-100.
///
/// ```text
/// score = 0.30 × quality + 0.25 × focus + 0.20 × timeOpt
///       + 0.15 × (100 − cognitiveLoad × 100) + 0.10 × consistency
/// ```
pub fn composite_score(breakdown: &ScoreBreakdown) -> u8 {
    let score = WEIGHT_QUALITY * breakdown.activity_quality
        + WEIGHT_FOCUS * breakdown.focus_effectiveness
        + WEIGHT_TIMING * breakdown.time_optimization
        + WEIGHT_SWITCHING * breakdown.context_switching
        + WEIGHT_CONSISTENCY * breakdown.consistency;
    score.round().clamp(0.0, 100.0) as u8
}

/// Confidence in the score (0-100) from data volume and days spanned.
///
/// `min(100, 60 × records / minDataPoints + min(40, 2 × days))`
pub fn confidence(record_count: usize, days_spanned: usize, min_data_points: usize) -> u8 {
    if record_count == 0 {
        return 0;
    }
    let volume = 60.0 * record_count as f64 / min_data_points.max(1) as f64;
    let span = (2.0 * days_spanned as f64).min(40.0);
    (volume + span).min(100.0).round() as u8
}

impl ScoreBreakdown {
    /// Copy with every sub-score rounded to one decimal
    pub fn rounded(self) -> Self {
        Self {
            activity_quality: round1(self.activity_quality),
            focus_effectiveness: round1(self.focus_effectiveness),
            time_optimization: round1(self.time_optimization),
            context_switching: round1(self.context_switching),
            consistency: round1(self.consistency),
        }
    }
}
