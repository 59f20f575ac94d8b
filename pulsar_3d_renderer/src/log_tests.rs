/// Tests for the logging system
///
/// Tests that swap the global logger are serialized: the logger slot is
/// process-wide.

use super::*;
use serial_test::serial;
use std::sync::{Arc, Mutex};

/// Test sink that captures entries instead of printing them
struct CaptureLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl Logger for CaptureLogger {
    fn log(&self, entry: &LogEntry) {
        self.entries.lock().unwrap().push(entry.clone());
    }
}

// ============================================================================
// Tests: severity levels
// ============================================================================

#[test]
fn test_severity_ordering() {
    assert!(LogSeverity::Trace < LogSeverity::Debug);
    assert!(LogSeverity::Debug < LogSeverity::Info);
    assert!(LogSeverity::Info < LogSeverity::Warn);
    assert!(LogSeverity::Warn < LogSeverity::Error);
}

#[test]
fn test_severity_labels() {
    assert_eq!(LogSeverity::Trace.label(), "TRACE");
    assert_eq!(LogSeverity::Error.label(), "ERROR");
    // Labels are fixed-width for column alignment.
    for severity in [
        LogSeverity::Trace,
        LogSeverity::Debug,
        LogSeverity::Info,
        LogSeverity::Warn,
        LogSeverity::Error,
    ] {
        assert_eq!(severity.label().len(), 5);
    }
}

// ============================================================================
// Tests: default logger
// ============================================================================

#[test]
fn test_default_logger_handles_plain_entry() {
    DefaultLogger.log(&LogEntry {
        severity: LogSeverity::Info,
        timestamp: std::time::SystemTime::now(),
        source: "pulsar3d::tests".to_string(),
        message: "plain entry".to_string(),
        file: None,
        line: None,
    });
}

#[test]
fn test_default_logger_handles_detailed_entry() {
    DefaultLogger.log(&LogEntry {
        severity: LogSeverity::Error,
        timestamp: std::time::SystemTime::now(),
        source: "pulsar3d::tests".to_string(),
        message: "detailed entry".to_string(),
        file: Some(file!()),
        line: Some(line!()),
    });
}

// ============================================================================
// Tests: global dispatch and macros
// ============================================================================

#[test]
#[serial]
fn test_macros_reach_installed_logger() {
    let entries = Arc::new(Mutex::new(Vec::new()));
    set_logger(CaptureLogger { entries: entries.clone() });

    crate::engine_info!("pulsar3d::tests", "hello {}", "world");
    crate::engine_warn!("pulsar3d::tests", "watch out");

    reset_logger();

    let captured = entries.lock().unwrap();
    assert_eq!(captured.len(), 2);
    assert_eq!(captured[0].severity, LogSeverity::Info);
    assert_eq!(captured[0].source, "pulsar3d::tests");
    assert_eq!(captured[0].message, "hello world");
    assert!(captured[0].file.is_none());
    assert_eq!(captured[1].severity, LogSeverity::Warn);
}

#[test]
#[serial]
fn test_error_macro_attaches_file_and_line() {
    let entries = Arc::new(Mutex::new(Vec::new()));
    set_logger(CaptureLogger { entries: entries.clone() });

    crate::engine_error!("pulsar3d::tests", "failure {}", 7);

    reset_logger();

    let captured = entries.lock().unwrap();
    assert_eq!(captured.len(), 1);
    assert_eq!(captured[0].severity, LogSeverity::Error);
    assert_eq!(captured[0].message, "failure 7");
    assert!(captured[0].file.is_some());
    assert!(captured[0].line.is_some());
}
