//! Report encoding
//!
//! This module wraps analysis results into a versioned JSON report with
//! producer metadata. The report timestamp is the caller's reference time,
//! never the wall clock, so identical inputs encode identically.

use uuid::Uuid;

use crate::config::AnalyzerConfig;
use crate::error::ComputeError;
use crate::types::{
    ActivityRecord, AnomalyRecord, DeepWorkMetrics, DeepWorkReport, EnergyPrediction,
    ReportProducer, ReportWindow,
};
use crate::{DEEPWORK_VERSION, PRODUCER_NAME};

/// Current report schema version
pub const REPORT_VERSION: &str = "1.0.0";

/// Everything that goes into one report
#[derive(Debug, Clone)]
pub struct ReportParts {
    pub window: ReportWindow,
    pub metrics: DeepWorkMetrics,
    pub anomalies: Vec<AnomalyRecord>,
    pub energy: Option<EnergyPrediction>,
}

impl ReportWindow {
    /// Window spanned by `records` (any order)
    pub fn from_records(
        records: &[ActivityRecord],
        days_analyzed: usize,
        config: &AnalyzerConfig,
    ) -> Self {
        let start = records.iter().map(|r| r.started_at).min();
        let end = records.iter().map(|r| r.ended_at()).max();
        Self {
            start_utc: start.map(|t| t.to_rfc3339()),
            end_utc: end.map(|t| t.to_rfc3339()),
            utc_offset_minutes: config.utc_offset_minutes,
            record_count: records.len(),
            days_analyzed,
        }
    }
}

/// Report encoder for producing JSON reports
pub struct ReportEncoder {
    instance_id: String,
}

impl Default for ReportEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// Encode analysis results into a report
    pub fn encode(&self, parts: ReportParts) -> Result<DeepWorkReport, ComputeError> {
        if parts.window.record_count != parts.metrics.record_count {
            return Err(ComputeError::EncodingError(format!(
                "window covers {} records but metrics were computed from {}",
                parts.window.record_count, parts.metrics.record_count
            )));
        }

        let producer = ReportProducer {
            name: PRODUCER_NAME.to_string(),
            version: DEEPWORK_VERSION.to_string(),
            instance_id: self.instance_id.clone(),
        };

        Ok(DeepWorkReport {
            report_version: REPORT_VERSION.to_string(),
            producer,
            computed_at_utc: parts.metrics.computed_at.to_rfc3339(),
            window: parts.window,
            metrics: parts.metrics,
            anomalies: parts.anomalies,
            energy: parts.energy,
        })
    }

    /// Encode to JSON string
    pub fn encode_to_json(&self, parts: ReportParts) -> Result<String, ComputeError> {
        let report = self.encode(parts)?;
        serde_json::to_string_pretty(&report).map_err(ComputeError::JsonError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::analyze;
    use crate::types::ActivityType;
    use chrono::{TimeZone, Utc};

    fn make_parts() -> ReportParts {
        let records = vec![
            ActivityRecord::new(
                Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap(),
                3600,
                ActivityType::Code,
                "Code",
            ),
            ActivityRecord::new(
                Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap(),
                1800,
                ActivityType::Review,
                "GitHub",
            ),
        ];
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
        let metrics = analyze(&records, now).unwrap();
        let window =
            ReportWindow::from_records(&records, metrics.days_analyzed, &AnalyzerConfig::default());

        ReportParts {
            window,
            metrics,
            anomalies: Vec::new(),
            energy: None,
        }
    }

    #[test]
    fn test_encode_report() {
        let encoder = ReportEncoder::with_instance_id("test-instance".to_string());
        let report = encoder.encode(make_parts()).unwrap();

        assert_eq!(report.report_version, REPORT_VERSION);
        assert_eq!(report.producer.name, PRODUCER_NAME);
        assert_eq!(report.producer.version, DEEPWORK_VERSION);
        assert_eq!(report.producer.instance_id, "test-instance");

        assert_eq!(report.computed_at_utc, "2024-01-15T12:00:00+00:00");
        assert_eq!(
            report.window.start_utc.as_deref(),
            Some("2024-01-15T09:00:00+00:00")
        );
        assert_eq!(
            report.window.end_utc.as_deref(),
            Some("2024-01-15T10:30:00+00:00")
        );
        assert_eq!(report.window.record_count, 2);
        assert_eq!(report.window.days_analyzed, 1);
    }

    #[test]
    fn test_encode_to_json() {
        let encoder = ReportEncoder::new();
        let json = encoder.encode_to_json(make_parts()).unwrap();

        // Verify it's valid JSON
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(parsed.get("report_version").is_some());
        assert!(parsed.get("producer").is_some());
        assert!(parsed.get("window").is_some());
        assert!(parsed["metrics"].get("score").is_some());
        assert!(parsed["anomalies"].as_array().unwrap().is_empty());
        assert!(parsed.get("energy").is_none());
    }

    #[test]
    fn test_mismatched_window_rejected() {
        let mut parts = make_parts();
        parts.window.record_count = 5;

        let result = ReportEncoder::new().encode(parts);
        assert!(matches!(result, Err(ComputeError::EncodingError(_))));
    }

    #[test]
    fn test_empty_window() {
        let window = ReportWindow::from_records(&[], 0, &AnalyzerConfig::default());
        assert!(window.start_utc.is_none());
        assert!(window.end_utc.is_none());
        assert_eq!(window.record_count, 0);
    }
}
