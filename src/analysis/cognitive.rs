//! Cognitive load estimation
//!
//! Three sub-metrics over a start-sorted record sequence:
//!
//! - context switches: adjacent transitions where app or activity type changes
//! - multitasking index: mean `(unique apps + unique types) / (records + 1)`
//!   over fixed time windows
//! - attention residue: mean complexity gap between adjacent records, scaled
//!   up when the switch happens without time to recover
//!
//! ```text
//! load = clamp(0.4 × switchRate + 0.3 × multitaskingIndex + 0.3 × attentionResidue, 0, 1)
//! ```

use std::collections::{BTreeMap, HashSet};

use crate::config::AnalyzerConfig;
use crate::types::{ActivityRecord, ActivityType, CognitiveLoadMetrics};

/// Estimate cognitive load for a start-sorted record sequence
pub fn estimate_cognitive_load(
    records: &[ActivityRecord],
    config: &AnalyzerConfig,
) -> CognitiveLoadMetrics {
    if records.is_empty() {
        return CognitiveLoadMetrics::default();
    }

    let context_switches = count_context_switches(records);
    let switch_rate = context_switches as f64 / records.len() as f64;
    let multitasking_index = compute_multitasking_index(records, config.multitask_window_secs);
    let attention_residue = compute_attention_residue(records, config.recovery_gap_secs);

    let overall_load =
        (0.4 * switch_rate + 0.3 * multitasking_index + 0.3 * attention_residue).clamp(0.0, 1.0);

    CognitiveLoadMetrics {
        context_switches,
        switch_rate,
        multitasking_index,
        attention_residue,
        overall_load,
    }
}

/// Whether moving from `prev` to `next` changes app or activity type
pub fn is_context_switch(prev: &ActivityRecord, next: &ActivityRecord) -> bool {
    prev.app_name != next.app_name || prev.activity_type != next.activity_type
}

fn count_context_switches(records: &[ActivityRecord]) -> u32 {
    records
        .windows(2)
        .filter(|pair| is_context_switch(&pair[0], &pair[1]))
        .count() as u32
}

/// Mean variety per fixed-size window, measured from the first record's start.
///
/// Empty windows are skipped. Capped at 1.0.
fn compute_multitasking_index(records: &[ActivityRecord], window_secs: i64) -> f64 {
    let origin = records[0].started_at;
    let mut windows: BTreeMap<i64, (HashSet<&str>, HashSet<ActivityType>, usize)> =
        BTreeMap::new();

    for record in records {
        let offset = (record.started_at - origin).num_seconds();
        let window = windows.entry(offset / window_secs).or_default();
        window.0.insert(record.app_name.as_str());
        window.1.insert(record.activity_type);
        window.2 += 1;
    }

    let total: f64 = windows
        .values()
        .map(|(apps, types, count)| (apps.len() + types.len()) as f64 / (*count as f64 + 1.0))
        .sum();

    (total / windows.len() as f64).clamp(0.0, 1.0)
}

/// Residue multiplier for the idle time before a switch.
///
/// 1.0 for back-to-back switches, falling to 0.5 at the recovery threshold
/// and decaying beyond it.
fn gap_penalty(gap_secs: i64, recovery_secs: i64) -> f64 {
    let gap = gap_secs.max(0) as f64;
    let recovery = recovery_secs as f64;
    if gap < recovery {
        1.0 - 0.5 * (gap / recovery)
    } else {
        0.5 * (recovery / gap)
    }
}

fn compute_attention_residue(records: &[ActivityRecord], recovery_secs: i64) -> f64 {
    if records.len() < 2 {
        return 0.0;
    }

    let total: f64 = records
        .windows(2)
        .map(|pair| {
            let cost =
                (pair[0].activity_type.complexity() - pair[1].activity_type.complexity()).abs();
            cost * gap_penalty(pair[0].gap_to(&pair[1]), recovery_secs)
        })
        .sum();

    (total / (records.len() - 1) as f64).clamp(0.0, 1.0)
}
