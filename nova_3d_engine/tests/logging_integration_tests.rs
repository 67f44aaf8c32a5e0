//! Integration tests for the injected logging handle
//!
//! No GPU required.
//!
//! Run with: cargo test --test logging_integration_tests

use std::sync::{Arc, Mutex};

use nova_3d_engine::nova3d::log::{LogEntry, LogSeverity, LogSink, Logger, MemoryLogger};
use nova_3d_engine::nova3d::Error;
use nova_3d_engine::{engine_bail, engine_debug, engine_err, engine_error, engine_info, engine_warn};

/// Logger that only keeps `(severity, source, message)`
struct TestLogger {
    entries: Arc<Mutex<Vec<(LogSeverity, String, String)>>>,
}

impl Logger for TestLogger {
    fn log(&self, entry: &LogEntry) {
        self.entries
            .lock()
            .unwrap()
            .push((entry.severity, entry.source.clone(), entry.message.clone()));
    }
}

#[test]
fn test_integration_custom_logger() {
    let entries = Arc::new(Mutex::new(Vec::new()));
    let sink = LogSink::new(Arc::new(TestLogger { entries: entries.clone() }));

    engine_info!(sink, "test::module", "Test info message");
    engine_warn!(sink, "test::module", "Test warning {}", 2);
    engine_error!(sink, "test::module", "Test error message");

    let captured = entries.lock().unwrap();
    assert_eq!(captured.len(), 3);
    assert_eq!(captured[0], (LogSeverity::Info, "test::module".to_string(), "Test info message".to_string()));
    assert_eq!(captured[1].0, LogSeverity::Warn);
    assert_eq!(captured[1].2, "Test warning 2");
    assert_eq!(captured[2].0, LogSeverity::Error);
}

#[test]
fn test_integration_min_severity_filters() {
    let memory = Arc::new(MemoryLogger::new());
    let sink = LogSink::new(memory.clone()).with_min_severity(LogSeverity::Warn);

    engine_debug!(sink, "test::filter", "hidden");
    engine_info!(sink, "test::filter", "hidden too");
    engine_warn!(sink, "test::filter", "shown");

    assert_eq!(memory.entries().len(), 1);
    assert!(memory.contains("shown"));
    assert!(!memory.contains("hidden"));
}

#[test]
fn test_integration_sinks_are_independent() {
    let first = Arc::new(MemoryLogger::new());
    let second = Arc::new(MemoryLogger::new());
    let sink_a = LogSink::new(first.clone());
    let sink_b = LogSink::new(second.clone()).with_min_severity(LogSeverity::Error);

    engine_warn!(sink_a, "test::a", "only in first");
    engine_warn!(sink_b, "test::b", "filtered in second");

    assert_eq!(first.count(LogSeverity::Warn), 1);
    assert!(second.entries().is_empty());
}

fn failing_operation(sink: &LogSink) -> nova_3d_engine::nova3d::Result<()> {
    engine_bail!(sink, "test::bail", "device lost at frame {}", 7);
}

#[test]
fn test_integration_error_macros_log_and_build_errors() {
    let memory = Arc::new(MemoryLogger::new());
    let sink = LogSink::new(memory.clone());

    let err = engine_err!(sink, "test::err", "queue submit failed");
    assert_eq!(err, Error::BackendError("queue submit failed".to_string()));

    let bailed = failing_operation(&sink);
    assert_eq!(bailed, Err(Error::BackendError("device lost at frame 7".to_string())));

    assert_eq!(memory.count(LogSeverity::Error), 2);
    let detailed = memory.entries();
    assert!(detailed.iter().all(|entry| entry.file.is_some() && entry.line.is_some()));
}
