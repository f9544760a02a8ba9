//! Insight generation
//!
//! A deterministic rule table maps score thresholds to structured insights.
//! Every rule is evaluated independently; matches are sorted by descending
//! confidence (ties keep table order). Add a rule by appending to
//! [`INSIGHT_RULES`].

use crate::types::{
    CognitiveLoadMetrics, Insight, InsightCategory, InsightType, PersonalizedBaseline,
    ScoreBreakdown,
};

/// Everything a rule may look at
#[derive(Debug, Clone, Copy)]
pub struct InsightContext<'a> {
    pub breakdown: &'a ScoreBreakdown,
    pub cognitive: &'a CognitiveLoadMetrics,
    pub baseline: &'a PersonalizedBaseline,
    pub flow_sessions: usize,
    /// Share of active time started in late-night hours (0-1)
    pub late_night_share: f64,
}

/// One row of the rule table
#[derive(Clone, Copy)]
pub struct InsightRule {
    pub id: &'static str,
    pub insight_type: InsightType,
    pub category: InsightCategory,
    pub title: &'static str,
    pub description: &'static str,
    pub confidence: f64,
    pub recommendation: Option<&'static str>,
    pub applies: fn(&InsightContext<'_>) -> bool,
}

impl InsightRule {
    fn to_insight(&self) -> Insight {
        Insight {
            id: self.id.to_string(),
            insight_type: self.insight_type,
            category: self.category,
            title: self.title.to_string(),
            description: self.description.to_string(),
            confidence: self.confidence,
            recommendation: self.recommendation.map(str::to_string),
        }
    }
}

pub static INSIGHT_RULES: &[InsightRule] = &[
    InsightRule {
        id: "focus_interrupted",
        insight_type: InsightType::Negative,
        category: InsightCategory::Focus,
        title: "Focus is frequently interrupted",
        description: "Sessions are short or mixed with low-value activity.",
        confidence: 0.85,
        recommendation: Some("Block 90-minute focus periods and silence notifications."),
        applies: |ctx| ctx.breakdown.focus_effectiveness < 60.0,
    },
    InsightRule {
        id: "sustained_focus",
        insight_type: InsightType::Positive,
        category: InsightCategory::Focus,
        title: "Sustained focus sessions",
        description: "Most sessions are long and dominated by deep work.",
        confidence: 0.8,
        recommendation: None,
        applies: |ctx| ctx.breakdown.focus_effectiveness >= 80.0,
    },
    InsightRule {
        id: "flow_achieved",
        insight_type: InsightType::Positive,
        category: InsightCategory::Focus,
        title: "Flow states detected",
        description: "A long session with one dominant activity and low cognitive load.",
        confidence: 0.8,
        recommendation: Some("Keep flow conditions stable: same time, same tools, no meetings."),
        applies: |ctx| ctx.flow_sessions > 0,
    },
    InsightRule {
        id: "excessive_switching",
        insight_type: InsightType::Negative,
        category: InsightCategory::Efficiency,
        title: "Excessive context switching",
        description: "Frequent app and activity switches leave attention residue.",
        confidence: 0.9,
        recommendation: Some("Batch communication into fixed slots and close unrelated apps."),
        applies: |ctx| ctx.breakdown.context_switching < 50.0,
    },
    InsightRule {
        id: "load_above_tolerance",
        insight_type: InsightType::Neutral,
        category: InsightCategory::Efficiency,
        title: "Cognitive load above your usual tolerance",
        description: "Switching is moderate overall but higher than what you normally sustain.",
        confidence: 0.65,
        recommendation: Some("Plan a lighter block after intense periods to recover."),
        applies: |ctx| {
            ctx.breakdown.context_switching >= 50.0
                && ctx.cognitive.overall_load > ctx.baseline.context_switch_tolerance
        },
    },
    InsightRule {
        id: "strong_consistency",
        insight_type: InsightType::Positive,
        category: InsightCategory::Patterns,
        title: "Strong consistency",
        description: "Daily quality is stable from one day to the next.",
        confidence: 0.85,
        recommendation: None,
        applies: |ctx| ctx.breakdown.consistency > 80.0,
    },
    InsightRule {
        id: "irregular_routine",
        insight_type: InsightType::Negative,
        category: InsightCategory::Patterns,
        title: "Irregular routine",
        description: "Daily quality swings widely, which makes output hard to predict.",
        confidence: 0.75,
        recommendation: Some("Anchor each day with a fixed first deep work block."),
        applies: |ctx| ctx.breakdown.consistency < 50.0,
    },
    InsightRule {
        id: "well_timed",
        insight_type: InsightType::Positive,
        category: InsightCategory::Timing,
        title: "Work aligned with peak hours",
        description: "Demanding work happens when energy is naturally highest.",
        confidence: 0.75,
        recommendation: None,
        applies: |ctx| ctx.breakdown.time_optimization >= 75.0,
    },
    InsightRule {
        id: "misaligned_timing",
        insight_type: InsightType::Negative,
        category: InsightCategory::Timing,
        title: "Work misaligned with natural rhythm",
        description: "High-value work often lands in low-energy hours.",
        confidence: 0.7,
        recommendation: Some("Move coding and design into 09:00-11:00 and 14:00-16:00."),
        applies: |ctx| ctx.breakdown.time_optimization < 50.0,
    },
    InsightRule {
        id: "high_value_mix",
        insight_type: InsightType::Positive,
        category: InsightCategory::Balance,
        title: "High-value activity mix",
        description: "Most tracked time goes to high-value activity.",
        confidence: 0.8,
        recommendation: None,
        applies: |ctx| ctx.breakdown.activity_quality >= 80.0,
    },
    InsightRule {
        id: "low_value_mix",
        insight_type: InsightType::Negative,
        category: InsightCategory::Balance,
        title: "Low-value activity dominates",
        description: "Browsing, social and entertainment take a large share of tracked time.",
        confidence: 0.8,
        recommendation: Some("Set app limits for social and entertainment during working hours."),
        applies: |ctx| ctx.breakdown.activity_quality < 50.0,
    },
    InsightRule {
        id: "late_night_work",
        insight_type: InsightType::Negative,
        category: InsightCategory::Balance,
        title: "Late-night work",
        description: "A large share of activity happens between 20:00 and 06:00.",
        confidence: 0.8,
        recommendation: Some("Set a hard evening stop to protect sleep and next-day energy."),
        applies: |ctx| ctx.late_night_share > 0.3,
    },
];

/// Evaluate every rule and return matches sorted by descending confidence
pub fn generate_insights(ctx: &InsightContext<'_>) -> Vec<Insight> {
    let mut insights: Vec<Insight> = INSIGHT_RULES
        .iter()
        .filter(|rule| (rule.applies)(ctx))
        .map(InsightRule::to_insight)
        .collect();

    insights.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    insights
}

/// The single insight returned when there is nothing to analyze
pub fn no_data_insight() -> Insight {
    Insight {
        id: "no_data".to_string(),
        insight_type: InsightType::Neutral,
        category: InsightCategory::Focus,
        title: "No activity data".to_string(),
        description: "No activity was recorded in the analyzed window.".to_string(),
        confidence: 1.0,
        recommendation: Some("Keep activity tracking running to receive insights.".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breakdown(focus: f64, switching: f64, consistency: f64) -> ScoreBreakdown {
        ScoreBreakdown {
            activity_quality: 65.0,
            focus_effectiveness: focus,
            time_optimization: 60.0,
            context_switching: switching,
            consistency,
        }
    }

    fn run(breakdown: &ScoreBreakdown) -> Vec<Insight> {
        let cognitive = CognitiveLoadMetrics {
            overall_load: 1.0 - breakdown.context_switching / 100.0,
            ..CognitiveLoadMetrics::default()
        };
        let baseline = PersonalizedBaseline::default();
        generate_insights(&InsightContext {
            breakdown,
            cognitive: &cognitive,
            baseline: &baseline,
            flow_sessions: 0,
            late_night_share: 0.0,
        })
    }

    fn ids(insights: &[Insight]) -> Vec<&str> {
        insights.iter().map(|i| i.id.as_str()).collect()
    }

    #[test]
    fn test_rules_fire_independently_and_sort_by_confidence() {
        let insights = run(&breakdown(40.0, 30.0, 90.0));
        assert_eq!(
            ids(&insights),
            vec!["excessive_switching", "focus_interrupted", "strong_consistency"]
        );
        assert!(insights
            .windows(2)
            .all(|pair| pair[0].confidence >= pair[1].confidence));
    }

    #[test]
    fn test_focus_interrupted_details() {
        let insights = run(&breakdown(59.9, 70.0, 70.0));
        let focus = insights.iter().find(|i| i.id == "focus_interrupted").unwrap();
        assert_eq!(focus.insight_type, InsightType::Negative);
        assert_eq!(focus.category, InsightCategory::Focus);
        assert_eq!(focus.confidence, 0.85);
        assert!(focus.recommendation.is_some());
    }

    #[test]
    fn test_thresholds_are_strict() {
        let insights = run(&breakdown(60.0, 50.0, 80.0));
        let ids = ids(&insights);
        assert!(!ids.contains(&"focus_interrupted"));
        assert!(!ids.contains(&"excessive_switching"));
        assert!(!ids.contains(&"strong_consistency"));
    }

    #[test]
    fn test_tolerance_rule_uses_baseline() {
        // switching 55 → load 0.45; default tolerance 0.5 does not fire
        assert!(!ids(&run(&breakdown(70.0, 55.0, 70.0))).contains(&"load_above_tolerance"));

        let strict = PersonalizedBaseline {
            context_switch_tolerance: 0.3,
            ..PersonalizedBaseline::default()
        };
        let b = breakdown(70.0, 55.0, 70.0);
        let cognitive = CognitiveLoadMetrics {
            overall_load: 0.45,
            ..CognitiveLoadMetrics::default()
        };
        let insights = generate_insights(&InsightContext {
            breakdown: &b,
            cognitive: &cognitive,
            baseline: &strict,
            flow_sessions: 0,
            late_night_share: 0.0,
        });
        assert!(ids(&insights).contains(&"load_above_tolerance"));
    }

    #[test]
    fn test_rule_ids_are_unique() {
        let mut ids: Vec<_> = INSIGHT_RULES.iter().map(|r| r.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), INSIGHT_RULES.len());
    }

    #[test]
    fn test_no_data_insight_shape() {
        let insight = no_data_insight();
        assert_eq!(insight.insight_type, InsightType::Neutral);
        assert_eq!(insight.category, InsightCategory::Focus);
    }
}
