//! Core data types
//!
//! This module defines the activity records consumed by the engine and the
//! metric objects it produces. Records are immutable facts supplied by an
//! external activity monitor; every output type is created fresh per call.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Productivity weight at or above which an activity counts as productive time
pub const PRODUCTIVE_WEIGHT_THRESHOLD: f64 = 0.7;

/// Complexity at or above which an activity counts as cognitively intensive
pub const INTENSIVE_COMPLEXITY_THRESHOLD: f64 = 0.7;

/// Canonical peak hours used when no personalized data exists
pub const DEFAULT_PEAK_HOURS: [u32; 6] = [9, 10, 11, 14, 15, 16];

/// Activity taxonomy reported by the activity monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    Code,
    Build,
    Test,
    Debug,
    Design,
    Research,
    Document,
    Review,
    Meeting,
    Communication,
    Browse,
    Social,
    Entertainment,
    Other,
    /// Any category string the engine does not recognise.
    ///
    /// Unknown categories are scored with the neutral 0.5 weight rather than
    /// being rejected, so newer monitors can report categories this build
    /// predates.
    #[serde(other)]
    Unknown,
}

impl ActivityType {
    /// Every variant, in declaration order
    pub const ALL: [ActivityType; 15] = [
        ActivityType::Code,
        ActivityType::Build,
        ActivityType::Test,
        ActivityType::Debug,
        ActivityType::Design,
        ActivityType::Research,
        ActivityType::Document,
        ActivityType::Review,
        ActivityType::Meeting,
        ActivityType::Communication,
        ActivityType::Browse,
        ActivityType::Social,
        ActivityType::Entertainment,
        ActivityType::Other,
        ActivityType::Unknown,
    ];

    /// Intrinsic productivity value of the activity (0-1)
    pub fn productivity_weight(self) -> f64 {
        match self {
            ActivityType::Code => 1.0,
            ActivityType::Build => 0.9,
            ActivityType::Test => 0.9,
            ActivityType::Debug => 0.85,
            ActivityType::Design => 0.85,
            ActivityType::Review => 0.8,
            ActivityType::Research => 0.75,
            ActivityType::Document => 0.7,
            ActivityType::Meeting => 0.5,
            ActivityType::Communication => 0.4,
            ActivityType::Browse => 0.3,
            ActivityType::Social => 0.1,
            ActivityType::Entertainment => 0.0,
            ActivityType::Other | ActivityType::Unknown => 0.5,
        }
    }

    /// Cognitive complexity of the activity (0-1), used for switch costs
    pub fn complexity(self) -> f64 {
        match self {
            ActivityType::Debug => 1.0,
            ActivityType::Code => 0.9,
            ActivityType::Design => 0.8,
            ActivityType::Test => 0.7,
            ActivityType::Research => 0.7,
            ActivityType::Review => 0.7,
            ActivityType::Build => 0.6,
            ActivityType::Document => 0.6,
            ActivityType::Meeting => 0.5,
            ActivityType::Communication => 0.3,
            ActivityType::Browse => 0.2,
            ActivityType::Social => 0.1,
            ActivityType::Entertainment => 0.1,
            ActivityType::Other | ActivityType::Unknown => 0.5,
        }
    }

    /// Deep work subset: code, build, test, debug, design
    pub fn is_deep_work(self) -> bool {
        matches!(
            self,
            ActivityType::Code
                | ActivityType::Build
                | ActivityType::Test
                | ActivityType::Debug
                | ActivityType::Design
        )
    }

    pub fn is_productive(self) -> bool {
        self.productivity_weight() >= PRODUCTIVE_WEIGHT_THRESHOLD
    }

    pub fn is_intensive(self) -> bool {
        self.complexity() >= INTENSIVE_COMPLEXITY_THRESHOLD
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ActivityType::Code => "code",
            ActivityType::Build => "build",
            ActivityType::Test => "test",
            ActivityType::Debug => "debug",
            ActivityType::Design => "design",
            ActivityType::Research => "research",
            ActivityType::Document => "document",
            ActivityType::Review => "review",
            ActivityType::Meeting => "meeting",
            ActivityType::Communication => "communication",
            ActivityType::Browse => "browse",
            ActivityType::Social => "social",
            ActivityType::Entertainment => "entertainment",
            ActivityType::Other => "other",
            ActivityType::Unknown => "unknown",
        }
    }
}

/// A single timestamped activity observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    /// When the activity started
    #[serde(alias = "startedAt")]
    pub started_at: DateTime<Utc>,
    /// Duration in seconds (must be positive)
    #[serde(alias = "durationSeconds")]
    pub duration_seconds: i64,
    /// Activity category
    #[serde(alias = "activityType")]
    pub activity_type: ActivityType,
    /// Foreground application name
    #[serde(alias = "appName")]
    pub app_name: String,
    /// Optional project the activity was attributed to
    #[serde(default, alias = "projectId", skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
}

impl ActivityRecord {
    pub fn new(
        started_at: DateTime<Utc>,
        duration_seconds: i64,
        activity_type: ActivityType,
        app_name: impl Into<String>,
    ) -> Self {
        Self {
            started_at,
            duration_seconds,
            activity_type,
            app_name: app_name.into(),
            project_id: None,
        }
    }

    pub fn with_project(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    /// End of the activity (start + duration), saturating at chrono's upper bound
    pub fn ended_at(&self) -> DateTime<Utc> {
        self.checked_ended_at().unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// End of the activity, or `None` when it falls outside chrono's range
    pub fn checked_ended_at(&self) -> Option<DateTime<Utc>> {
        Duration::try_seconds(self.duration_seconds)
            .and_then(|duration| self.started_at.checked_add_signed(duration))
    }

    /// Idle seconds between the end of this record and the start of `next`.
    ///
    /// Negative when the records overlap.
    pub fn gap_to(&self, next: &ActivityRecord) -> i64 {
        (next.started_at - self.ended_at()).num_seconds()
    }

    /// Duration weighted by the activity's productivity weight
    pub fn weighted_seconds(&self) -> f64 {
        self.duration_seconds as f64 * self.activity_type.productivity_weight()
    }
}

/// A maximal run of records with no inter-record gap above the threshold.
///
/// Sessions borrow a contiguous slice of the normalized record sequence, so the
/// sessions of one segmentation partition their input exactly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Session<'a> {
    records: &'a [ActivityRecord],
}

impl<'a> Session<'a> {
    /// Wrap a non-empty, start-sorted slice of records
    pub(crate) fn new(records: &'a [ActivityRecord]) -> Self {
        debug_assert!(!records.is_empty());
        Self { records }
    }

    pub fn records(&self) -> &'a [ActivityRecord] {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.records[0].started_at
    }

    /// Latest end among the session's records
    pub fn end(&self) -> DateTime<Utc> {
        self.records
            .iter()
            .map(ActivityRecord::ended_at)
            .max()
            .unwrap_or_else(|| self.start())
    }

    /// Wall-clock span from first start to last end, in seconds
    pub fn span_seconds(&self) -> i64 {
        (self.end() - self.start()).num_seconds()
    }

    /// Sum of record durations, in seconds
    pub fn active_seconds(&self) -> i64 {
        self.records.iter().map(|r| r.duration_seconds).sum()
    }

    /// Fraction of records whose type is deep work
    pub fn focus_ratio(&self) -> f64 {
        let deep = self
            .records
            .iter()
            .filter(|r| r.activity_type.is_deep_work())
            .count();
        deep as f64 / self.records.len() as f64
    }
}

/// The five sub-scores behind the composite score (each 0-100)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub activity_quality: f64,
    pub focus_effectiveness: f64,
    pub time_optimization: f64,
    /// Inverse of cognitive load: `100 - load * 100`
    pub context_switching: f64,
    pub consistency: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightType {
    Positive,
    Neutral,
    Negative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightCategory {
    Focus,
    Timing,
    Balance,
    Efficiency,
    Patterns,
}

/// A structured observation about the analyzed window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    /// Stable identifier of the rule that produced the insight
    pub id: String,
    #[serde(rename = "type")]
    pub insight_type: InsightType,
    pub category: InsightCategory,
    pub title: String,
    pub description: String,
    /// Confidence weight (0-1)
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
}

/// Forward-looking estimates derived from the analyzed window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Predictions {
    /// Hours of day (0-23, ascending) best suited for focused work
    pub optimal_hours: Vec<u32>,
    /// Burnout risk (0-100)
    pub burnout_risk: u8,
    /// Sustainable productive hours per working week
    pub weekly_capacity_hours: f64,
}

impl Default for Predictions {
    fn default() -> Self {
        Self {
            optimal_hours: DEFAULT_PEAK_HOURS.to_vec(),
            burnout_risk: 0,
            weekly_capacity_hours: 0.0,
        }
    }
}

/// Cognitive load sub-metrics
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CognitiveLoadMetrics {
    /// Adjacent transitions where app or activity type changed
    pub context_switches: u32,
    /// Context switches per record
    pub switch_rate: f64,
    /// Mean variety per fixed time window (0-1)
    pub multitasking_index: f64,
    /// Mean complexity-weighted switch cost (0-1)
    pub attention_residue: f64,
    /// Combined load (0-1)
    pub overall_load: f64,
}

/// A session that exhibited flow characteristics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowSession {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub duration_seconds: i64,
    pub dominant_type: ActivityType,
    /// Share of session time spent in the dominant type (0-1)
    pub type_consistency: f64,
    pub interruptions_per_hour: f64,
    pub cognitive_load: f64,
    /// Flow quality (0-100)
    pub flow_score: u8,
}

/// Result of a deep work analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeepWorkMetrics {
    /// Composite deep work score (0-100)
    pub score: u8,
    /// Confidence in the score (0-100)
    pub confidence: u8,
    pub breakdown: ScoreBreakdown,
    /// Insights ordered by descending confidence
    pub insights: Vec<Insight>,
    pub predictions: Predictions,
    pub cognitive_load: CognitiveLoadMetrics,
    pub flow_sessions: Vec<FlowSession>,
    pub record_count: usize,
    pub days_analyzed: usize,
    /// Reference time supplied by the caller
    pub computed_at: DateTime<Utc>,
}

/// Reference profile used to personalize predictions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalizedBaseline {
    pub peak_hours: Vec<u32>,
    pub low_energy_hours: Vec<u32>,
    pub preferred_session_minutes: f64,
    /// Overall cognitive load (0-1) the user sustains without degradation
    pub context_switch_tolerance: f64,
}

impl Default for PersonalizedBaseline {
    fn default() -> Self {
        Self {
            peak_hours: DEFAULT_PEAK_HOURS.to_vec(),
            low_energy_hours: vec![0, 1, 2, 3, 4, 5],
            preferred_session_minutes: 90.0,
            context_switch_tolerance: 0.5,
        }
    }
}

/// Projected energy for one upcoming hour
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HourlyEnergy {
    pub hour: u32,
    pub level: f64,
}

/// Hours of the projection suited to each kind of task
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TaskTiming {
    pub deep_work: Vec<u32>,
    pub learning: Vec<u32>,
    pub creative: Vec<u32>,
    pub meetings: Vec<u32>,
    pub administrative: Vec<u32>,
}

/// Energy projection for the next 24 hours
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyPrediction {
    /// Current energy level (0.1-1.0)
    pub current_level: f64,
    pub current_hour: u32,
    /// Historical productive share per hour of day (24 entries)
    pub baseline: Vec<f64>,
    /// Next 24 hours, starting at the current hour
    pub projection: Vec<HourlyEnergy>,
    pub optimal_timing: TaskTiming,
    pub recovery_needed: bool,
    pub recent_cognitive_load: f64,
    pub recent_productivity: f64,
    /// Seconds of intensive activity in the trailing intensive window
    pub intensive_seconds: i64,
}

/// Per-day aggregate used by the anomaly detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyAggregate {
    pub date: NaiveDate,
    pub total_seconds: i64,
    pub productive_seconds: i64,
    pub activity_count: u32,
    /// Local hour-of-day at which each record started
    #[serde(default)]
    pub record_hours: Vec<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    Spike,
    Dip,
    PatternBreak,
    UnusualTiming,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// Observed vs expected values for an anomaly
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnomalyMetrics {
    pub actual: f64,
    pub expected: f64,
    /// Distance from the expected value in standard deviations
    pub deviation_sigma: f64,
}

/// A day whose aggregate behaviour deviated from its baseline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyRecord {
    pub date: NaiveDate,
    pub kind: AnomalyKind,
    pub severity: Severity,
    pub metrics: AnomalyMetrics,
    /// Confidence (0-1)
    pub confidence: f64,
    pub description: String,
    pub insights: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Top-level report produced by the encoder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeepWorkReport {
    pub report_version: String,
    pub producer: ReportProducer,
    /// Reference time of the analysis (RFC 3339)
    pub computed_at_utc: String,
    pub window: ReportWindow,
    pub metrics: DeepWorkMetrics,
    #[serde(default)]
    pub anomalies: Vec<AnomalyRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy: Option<EnergyPrediction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Time span covered by the analyzed records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportWindow {
    /// Earliest record start (RFC 3339), absent without records
    pub start_utc: Option<String>,
    /// Latest record end (RFC 3339), absent without records
    pub end_utc: Option<String>,
    pub utc_offset_minutes: i32,
    pub record_count: usize,
    pub days_analyzed: usize,
}
