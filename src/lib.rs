//! Synheart Deepwork - On-device productivity analytics engine
//!
//! Deepwork turns a stream of timestamped activity records into productivity
//! signals through a deterministic pipeline: normalization → session
//! segmentation → component scoring → composite score, insights and
//! predictions.
//!
//! ## Modules
//!
//! - **Analysis**: Deep work score, cognitive load, flow states and predictions
//! - **Energy**: Current energy level and a 24-hour projection
//! - **Anomaly**: Days that deviate from the rolling history
//! - **Baseline**: Learns a personalized baseline from past days
//!
//! Every entry point takes the reference time explicitly; nothing reads the
//! wall clock.

pub mod analysis;
pub mod anomaly;
pub mod baseline;
pub mod config;
pub mod encoder;
pub mod energy;
pub mod error;
pub mod normalizer;
pub mod pipeline;
pub mod segmenter;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use baseline::BaselineStore;
pub use config::{AnalyzerConfig, AnomalyConfig, EnergyConfig};
pub use encoder::ReportEncoder;
pub use error::ComputeError;
pub use normalizer::ValidationError;
pub use pipeline::{analyze, detect_anomalies, predict_energy, DeepWorkAnalyzer};
pub use types::{
    ActivityRecord, ActivityType, AnomalyRecord, DailyAggregate, DeepWorkMetrics,
    EnergyPrediction, PersonalizedBaseline,
};

/// Deepwork version embedded in all reports
pub const DEEPWORK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for reports
pub const PRODUCER_NAME: &str = "synheart-deepwork";
