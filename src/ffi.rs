//! FFI bindings for Synheart Deepwork
//!
//! This module provides C-compatible functions for calling Deepwork from other
//! languages. Inputs and outputs are JSON in null-terminated C strings; every
//! returned string is allocated here and must be freed by the caller using
//! `deepwork_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use serde::Serialize;

use crate::config::AnalyzerConfig;
use crate::error::ComputeError;
use crate::pipeline::{
    activity_to_report_json, analyze, detect_anomalies, parse_records_json,
    parse_reference_time, predict_energy, DeepWorkAnalyzer,
};
use crate::types::{DailyAggregate, PersonalizedBaseline};

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Set the last error message
fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

/// Clear the last error message
fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Helper to convert C string to Rust string
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// Read a required string argument, recording an error when it is missing
unsafe fn required_arg(ptr: *const c_char, name: &str) -> Option<String> {
    let value = cstr_to_string(ptr);
    if value.is_none() {
        set_last_error(&format!("Invalid {name} string pointer"));
    }
    value
}

/// Serialize a result, or record its error and return NULL
fn json_result<T: Serialize>(result: Result<T, ComputeError>) -> *mut c_char {
    match result.and_then(|value| serde_json::to_string(&value).map_err(ComputeError::from)) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Stateless API
// ============================================================================

/// Analyze a JSON array of activity records and return metrics JSON.
///
/// # Safety
/// - `records_json` and `now_rfc3339` must be valid null-terminated C strings.
/// - Returns a newly allocated string that must be freed with `deepwork_free_string`.
/// - Returns NULL on error; call `deepwork_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn deepwork_analyze(
    records_json: *const c_char,
    now_rfc3339: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let Some(records_str) = required_arg(records_json, "records_json") else {
        return ptr::null_mut();
    };
    let Some(now_str) = required_arg(now_rfc3339, "now_rfc3339") else {
        return ptr::null_mut();
    };

    json_result(
        parse_records_json(&records_str)
            .and_then(|records| Ok((records, parse_reference_time(&now_str)?)))
            .and_then(|(records, now)| analyze(&records, now)),
    )
}

/// Detect anomalies in a JSON array of daily aggregates.
///
/// # Safety
/// - `aggregates_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `deepwork_free_string`.
/// - Returns NULL on error; call `deepwork_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn deepwork_detect_anomalies(aggregates_json: *const c_char) -> *mut c_char {
    clear_last_error();

    let Some(json) = required_arg(aggregates_json, "aggregates_json") else {
        return ptr::null_mut();
    };

    json_result(
        serde_json::from_str::<Vec<DailyAggregate>>(&json)
            .map_err(|e| ComputeError::ParseError(e.to_string()))
            .map(|aggregates| detect_anomalies(&aggregates)),
    )
}

/// Predict energy from a JSON array of activity records.
///
/// # Safety
/// - `records_json` and `now_rfc3339` must be valid null-terminated C strings.
/// - Returns a newly allocated string that must be freed with `deepwork_free_string`.
/// - Returns NULL on error; call `deepwork_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn deepwork_predict_energy(
    records_json: *const c_char,
    now_rfc3339: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let Some(records_str) = required_arg(records_json, "records_json") else {
        return ptr::null_mut();
    };
    let Some(now_str) = required_arg(now_rfc3339, "now_rfc3339") else {
        return ptr::null_mut();
    };

    json_result(
        parse_records_json(&records_str)
            .and_then(|records| Ok((records, parse_reference_time(&now_str)?)))
            .and_then(|(records, now)| predict_energy(&records, now)),
    )
}

/// Produce a full report (metrics, anomalies, energy) as JSON.
///
/// # Safety
/// - `records_json` and `now_rfc3339` must be valid null-terminated C strings.
/// - Returns a newly allocated string that must be freed with `deepwork_free_string`.
/// - Returns NULL on error; call `deepwork_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn deepwork_report(
    records_json: *const c_char,
    now_rfc3339: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let Some(records_str) = required_arg(records_json, "records_json") else {
        return ptr::null_mut();
    };
    let Some(now_str) = required_arg(now_rfc3339, "now_rfc3339") else {
        return ptr::null_mut();
    };

    let result = parse_records_json(&records_str)
        .and_then(|records| Ok((records, parse_reference_time(&now_str)?)))
        .and_then(|(records, now)| activity_to_report_json(&records, now));

    match result {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Stateful Analyzer API
// ============================================================================

/// Opaque handle to a DeepWorkAnalyzer
pub struct DeepWorkAnalyzerHandle {
    analyzer: DeepWorkAnalyzer,
}

/// Create an analyzer from optional configuration JSON.
///
/// # Safety
/// - `config_json` must be NULL (defaults) or a valid null-terminated C string.
/// - Must be freed with `deepwork_analyzer_free`.
/// - Returns NULL on error; call `deepwork_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn deepwork_analyzer_new(
    config_json: *const c_char,
) -> *mut DeepWorkAnalyzerHandle {
    clear_last_error();

    let config = match cstr_to_string(config_json) {
        Some(json) => AnalyzerConfig::from_json(&json),
        None => Ok(AnalyzerConfig::default()),
    };

    match config.and_then(DeepWorkAnalyzer::new) {
        Ok(analyzer) => Box::into_raw(Box::new(DeepWorkAnalyzerHandle { analyzer })),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Free an analyzer.
///
/// # Safety
/// - `analyzer` must be a valid pointer returned by `deepwork_analyzer_new`.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn deepwork_analyzer_free(analyzer: *mut DeepWorkAnalyzerHandle) {
    if !analyzer.is_null() {
        drop(Box::from_raw(analyzer));
    }
}

/// Replace the analyzer's personalized baseline.
///
/// # Safety
/// - `analyzer` must be a valid pointer returned by `deepwork_analyzer_new`.
/// - `baseline_json` must be a valid null-terminated C string.
/// - Returns 0 on success, -1 on error.
#[no_mangle]
pub unsafe extern "C" fn deepwork_analyzer_set_baseline(
    analyzer: *mut DeepWorkAnalyzerHandle,
    baseline_json: *const c_char,
) -> i32 {
    clear_last_error();

    if analyzer.is_null() {
        set_last_error("Null analyzer pointer");
        return -1;
    }

    let handle = &mut *analyzer;

    let Some(json) = required_arg(baseline_json, "baseline_json") else {
        return -1;
    };

    match serde_json::from_str::<PersonalizedBaseline>(&json) {
        Ok(baseline) => {
            handle.analyzer.replace_baseline(baseline);
            0
        }
        Err(e) => {
            set_last_error(&e.to_string());
            -1
        }
    }
}

/// Analyze records with a configured analyzer.
///
/// # Safety
/// - `analyzer` must be a valid pointer returned by `deepwork_analyzer_new`.
/// - `records_json` and `now_rfc3339` must be valid null-terminated C strings.
/// - Returns a newly allocated string that must be freed with `deepwork_free_string`.
/// - Returns NULL on error; call `deepwork_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn deepwork_analyzer_analyze(
    analyzer: *const DeepWorkAnalyzerHandle,
    records_json: *const c_char,
    now_rfc3339: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if analyzer.is_null() {
        set_last_error("Null analyzer pointer");
        return ptr::null_mut();
    }

    let handle = &*analyzer;

    let Some(records_str) = required_arg(records_json, "records_json") else {
        return ptr::null_mut();
    };
    let Some(now_str) = required_arg(now_rfc3339, "now_rfc3339") else {
        return ptr::null_mut();
    };

    json_result(
        parse_records_json(&records_str)
            .and_then(|records| Ok((records, parse_reference_time(&now_str)?)))
            .and_then(|(records, now)| handle.analyzer.analyze(&records, now)),
    )
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by Deepwork functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a Deepwork function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn deepwork_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next Deepwork function call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn deepwork_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the Deepwork library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn deepwork_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_records_json() -> CString {
        CString::new(
            r#"[
                {"started_at": "2024-01-15T09:00:00Z", "duration_seconds": 3600,
                 "activity_type": "code", "app_name": "Code"},
                {"started_at": "2024-01-15T10:00:00Z", "duration_seconds": 600,
                 "activity_type": "communication", "app_name": "Slack"},
                {"started_at": "2024-01-15T10:15:00Z", "duration_seconds": 1800,
                 "activity_type": "debug", "app_name": "Code"}
            ]"#,
        )
        .unwrap()
    }

    fn now() -> CString {
        CString::new("2024-01-15T12:00:00Z").unwrap()
    }

    unsafe fn take_string(ptr: *mut c_char) -> String {
        assert!(!ptr.is_null());
        let s = CStr::from_ptr(ptr).to_str().unwrap().to_string();
        deepwork_free_string(ptr);
        s
    }

    #[test]
    fn test_ffi_analyze() {
        let records = sample_records_json();
        let now = now();

        unsafe {
            let json = take_string(deepwork_analyze(records.as_ptr(), now.as_ptr()));
            let metrics: serde_json::Value = serde_json::from_str(&json).unwrap();
            assert_eq!(metrics["record_count"], 3);
            assert!(metrics["score"].as_u64().unwrap() <= 100);
        }
    }

    #[test]
    fn test_ffi_predict_energy_and_report() {
        let records = sample_records_json();
        let now = now();

        unsafe {
            let json = take_string(deepwork_predict_energy(records.as_ptr(), now.as_ptr()));
            let energy: serde_json::Value = serde_json::from_str(&json).unwrap();
            assert_eq!(energy["current_hour"], 12);

            let json = take_string(deepwork_report(records.as_ptr(), now.as_ptr()));
            assert!(json.contains("report_version"));
        }
    }

    #[test]
    fn test_ffi_detect_anomalies() {
        let aggregates = CString::new(
            r#"[{"date": "2024-01-15", "total_seconds": 3600,
                 "productive_seconds": 1800, "activity_count": 4}]"#,
        )
        .unwrap();

        unsafe {
            let json = take_string(deepwork_detect_anomalies(aggregates.as_ptr()));
            assert_eq!(json, "[]");
        }
    }

    #[test]
    fn test_ffi_analyzer_lifecycle() {
        let records = sample_records_json();
        let now = now();

        unsafe {
            let analyzer = deepwork_analyzer_new(ptr::null());
            assert!(!analyzer.is_null());

            let baseline = CString::new(
                r#"{"peak_hours": [7, 8, 13], "low_energy_hours": [0, 1],
                    "preferred_session_minutes": 60.0, "context_switch_tolerance": 0.4}"#,
            )
            .unwrap();
            assert_eq!(deepwork_analyzer_set_baseline(analyzer, baseline.as_ptr()), 0);

            let json = take_string(deepwork_analyzer_analyze(
                analyzer,
                records.as_ptr(),
                now.as_ptr(),
            ));
            let metrics: serde_json::Value = serde_json::from_str(&json).unwrap();
            // Too few observed hours, so the baseline's peaks are used
            assert_eq!(metrics["predictions"]["optimal_hours"], serde_json::json!([7, 8, 13]));

            deepwork_analyzer_free(analyzer);
        }
    }

    #[test]
    fn test_ffi_invalid_config() {
        let config = CString::new(r#"{"session_gap_secs": 0}"#).unwrap();
        unsafe {
            let analyzer = deepwork_analyzer_new(config.as_ptr());
            assert!(analyzer.is_null());
            assert!(!deepwork_last_error().is_null());
        }
    }

    #[test]
    fn test_ffi_error_handling() {
        let invalid_json = CString::new("not json").unwrap();
        let now = now();

        unsafe {
            let result = deepwork_analyze(invalid_json.as_ptr(), now.as_ptr());
            assert!(result.is_null());

            let error = deepwork_last_error();
            assert!(!error.is_null());

            let error_str = CStr::from_ptr(error).to_str().unwrap();
            assert!(!error_str.is_empty());

            let result = deepwork_analyze(ptr::null(), now.as_ptr());
            assert!(result.is_null());
            let error_str = CStr::from_ptr(deepwork_last_error()).to_str().unwrap();
            assert!(error_str.contains("records_json"));
        }
    }

    #[test]
    fn test_ffi_rejects_oversized_inputs() {
        let records = CString::new(
            r#"[{"started_at": "2024-01-15T09:00:00Z", "duration_seconds": 10000000000000,
                 "activity_type": "code", "app_name": "Code"}]"#,
        )
        .unwrap();
        let now = now();
        let config_json = r#"{"energy": {"recent_window_secs": 9223372036854775807}}"#;
        let config = CString::new(config_json).unwrap();

        unsafe {
            assert!(deepwork_analyze(records.as_ptr(), now.as_ptr()).is_null());
            let error_str = CStr::from_ptr(deepwork_last_error()).to_str().unwrap();
            assert!(error_str.contains("out of range"));

            assert!(deepwork_analyzer_new(config.as_ptr()).is_null());
        }
    }

    #[test]
    fn test_ffi_version() {
        unsafe {
            let version = deepwork_version();
            assert!(!version.is_null());

            let version_str = CStr::from_ptr(version).to_str().unwrap();
            assert!(!version_str.is_empty());
        }
    }
}
