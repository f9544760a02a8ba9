//! Pipeline orchestration
//!
//! This module provides the public API for Synheart Deepwork.
//! It orchestrates the full pipeline from raw activity records to metrics.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::analysis::{
    self, activity_quality_score, composite_score, consistency_score, detect_flow_states,
    estimate_cognitive_load, focus_effectiveness_score, generate_insights, late_night_share,
    no_data_insight, predict, split_by_day, time_optimization_score, HourlyProfile,
    InsightContext,
};
use crate::anomaly::{build_daily_aggregates, AnomalyDetector};
use crate::config::AnalyzerConfig;
use crate::encoder::{ReportEncoder, ReportParts};
use crate::energy::EnergyPredictor;
use crate::error::ComputeError;
use crate::normalizer::ActivityNormalizer;
use crate::segmenter::segment_sessions;
use crate::types::{
    ActivityRecord, AnomalyRecord, CognitiveLoadMetrics, DailyAggregate, DeepWorkMetrics,
    EnergyPrediction, PersonalizedBaseline, Predictions, ReportWindow, ScoreBreakdown,
};

/// Analyze activity records with the default configuration and baseline.
///
/// # Arguments
/// * `records` - Activity records in any order
/// * `now` - Reference time; records starting after it are rejected
///
/// # Example
/// ```ignore
/// let metrics = analyze(&records, Utc::now())?;
/// println!("deep work score: {}", metrics.score);
/// ```
pub fn analyze(
    records: &[ActivityRecord],
    now: DateTime<Utc>,
) -> Result<DeepWorkMetrics, ComputeError> {
    DeepWorkAnalyzer::default().analyze(records, now)
}

/// Detect anomalies in daily aggregates with the default configuration.
pub fn detect_anomalies(aggregates: &[DailyAggregate]) -> Vec<AnomalyRecord> {
    DeepWorkAnalyzer::default().detect_anomalies(aggregates)
}

/// Predict energy with the default configuration.
pub fn predict_energy(
    records: &[ActivityRecord],
    now: DateTime<Utc>,
) -> Result<EnergyPrediction, ComputeError> {
    DeepWorkAnalyzer::default().predict_energy(records, now)
}

/// Parse an RFC 3339 reference time
pub fn parse_reference_time(value: &str) -> Result<DateTime<Utc>, ComputeError> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| ComputeError::ParseError(format!("invalid reference time '{value}': {e}")))
}

/// Parse a JSON array of activity records
pub fn parse_records_json(json: &str) -> Result<Vec<ActivityRecord>, ComputeError> {
    serde_json::from_str(json).map_err(|e| ComputeError::ParseError(e.to_string()))
}

/// Analyze records and encode metrics, anomalies and energy into a JSON report.
///
/// # Returns
/// Pretty-printed report JSON
pub fn activity_to_report_json(
    records: &[ActivityRecord],
    now: DateTime<Utc>,
) -> Result<String, ComputeError> {
    let parts = DeepWorkAnalyzer::default().build_report(records, now)?;
    ReportEncoder::new().encode_to_json(parts)
}

/// Analyzer holding configuration and a personalized baseline.
///
/// The baseline is shared read-only; updating it means swapping in a new
/// `Arc` with [`DeepWorkAnalyzer::replace_baseline`]. Every entry point is a
/// pure function of its inputs, so independent analyzers may run in parallel.
#[derive(Debug, Clone)]
pub struct DeepWorkAnalyzer {
    config: AnalyzerConfig,
    baseline: Arc<PersonalizedBaseline>,
}

impl Default for DeepWorkAnalyzer {
    fn default() -> Self {
        Self {
            config: AnalyzerConfig::default(),
            baseline: Arc::new(PersonalizedBaseline::default()),
        }
    }
}

impl DeepWorkAnalyzer {
    /// Create an analyzer with a validated configuration
    pub fn new(config: AnalyzerConfig) -> Result<Self, ComputeError> {
        config.validate()?;
        Ok(Self {
            config,
            baseline: Arc::new(PersonalizedBaseline::default()),
        })
    }

    /// Use a specific baseline
    pub fn with_baseline(mut self, baseline: impl Into<Arc<PersonalizedBaseline>>) -> Self {
        self.baseline = baseline.into();
        self
    }

    /// Swap in a new baseline, returning the previous one
    pub fn replace_baseline(
        &mut self,
        baseline: impl Into<Arc<PersonalizedBaseline>>,
    ) -> Arc<PersonalizedBaseline> {
        std::mem::replace(&mut self.baseline, baseline.into())
    }

    pub fn baseline(&self) -> Arc<PersonalizedBaseline> {
        Arc::clone(&self.baseline)
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Run the full analysis.
    ///
    /// Pipeline stages:
    /// 1. ActivityNormalizer - Validate and sort records
    /// 2. segment_sessions - Split into sessions on idle gaps
    /// 3. analysis - Component scores, cognitive load, flow, predictions
    /// 4. composite - Weighted score and confidence
    /// 5. insights - Rule table over the breakdown
    pub fn analyze(
        &self,
        records: &[ActivityRecord],
        now: DateTime<Utc>,
    ) -> Result<DeepWorkMetrics, ComputeError> {
        let records = ActivityNormalizer::normalize(records, Some(now))?;
        if records.is_empty() {
            tracing::debug!("no activity records, returning empty metrics");
            return Ok(self.empty_metrics(now));
        }

        let config = &self.config;

        let sessions = segment_sessions(&records, config.session_gap_secs);
        let days_analyzed = split_by_day(&records, config).len();
        tracing::debug!(
            records = records.len(),
            sessions = sessions.len(),
            days = days_analyzed,
            "activity normalized and segmented"
        );

        let profile = HourlyProfile::from_records(&records, config);
        let cognitive_load = estimate_cognitive_load(&records, config);

        let breakdown = ScoreBreakdown {
            activity_quality: activity_quality_score(&records),
            focus_effectiveness: focus_effectiveness_score(&sessions, config.long_session_secs),
            time_optimization: time_optimization_score(&profile),
            context_switching: (100.0 - cognitive_load.overall_load * 100.0).clamp(0.0, 100.0),
            consistency: consistency_score(&records, config),
        };
        let score = composite_score(&breakdown);
        let confidence = analysis::confidence(records.len(), days_analyzed, config.min_data_points);
        tracing::debug!(score, confidence, ?breakdown, "component scores computed");

        let flow_sessions = detect_flow_states(&sessions, days_analyzed, config);
        let predictions = predict(
            &profile,
            days_analyzed,
            cognitive_load.overall_load,
            &self.baseline,
        );

        let insights = generate_insights(&InsightContext {
            breakdown: &breakdown,
            cognitive: &cognitive_load,
            baseline: &self.baseline,
            flow_sessions: flow_sessions.len(),
            late_night_share: late_night_share(&profile),
        });
        tracing::debug!(
            flow_sessions = flow_sessions.len(),
            insights = insights.len(),
            "analysis complete"
        );

        Ok(DeepWorkMetrics {
            score,
            confidence,
            breakdown: breakdown.rounded(),
            insights,
            predictions,
            cognitive_load,
            flow_sessions,
            record_count: records.len(),
            days_analyzed,
            computed_at: now,
        })
    }

    /// Detect anomalies in pre-built daily aggregates
    pub fn detect_anomalies(&self, aggregates: &[DailyAggregate]) -> Vec<AnomalyRecord> {
        AnomalyDetector::new(self.config.anomaly.clone()).detect(aggregates)
    }

    /// Build daily aggregates from raw records, then detect anomalies
    pub fn detect_anomalies_from_records(
        &self,
        records: &[ActivityRecord],
    ) -> Result<Vec<AnomalyRecord>, ComputeError> {
        let records = ActivityNormalizer::normalize(records, None)?;
        let aggregates = build_daily_aggregates(&records, &self.config);
        Ok(self.detect_anomalies(&aggregates))
    }

    /// Predict current and upcoming energy as of `now`
    pub fn predict_energy(
        &self,
        records: &[ActivityRecord],
        now: DateTime<Utc>,
    ) -> Result<EnergyPrediction, ComputeError> {
        let records = ActivityNormalizer::normalize(records, Some(now))?;
        Ok(EnergyPredictor::new(&self.config).predict(&records, now))
    }

    /// Run every analysis over the same records, ready for [`ReportEncoder`]
    pub fn build_report(
        &self,
        records: &[ActivityRecord],
        now: DateTime<Utc>,
    ) -> Result<ReportParts, ComputeError> {
        let metrics = self.analyze(records, now)?;
        let anomalies = self.detect_anomalies_from_records(records)?;
        let energy = self.predict_energy(records, now)?;
        let window = ReportWindow::from_records(records, metrics.days_analyzed, &self.config);

        Ok(ReportParts {
            window,
            metrics,
            anomalies,
            energy: Some(energy),
        })
    }

    fn empty_metrics(&self, now: DateTime<Utc>) -> DeepWorkMetrics {
        DeepWorkMetrics {
            score: 0,
            confidence: 0,
            breakdown: ScoreBreakdown::default(),
            insights: vec![no_data_insight()],
            predictions: Predictions {
                optimal_hours: self.baseline.peak_hours.clone(),
                ..Predictions::default()
            },
            cognitive_load: CognitiveLoadMetrics::default(),
            flow_sessions: Vec::new(),
            record_count: 0,
            days_analyzed: 0,
            computed_at: now,
        }
    }
}
