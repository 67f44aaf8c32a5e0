//! Logging for the Nova3D engine
//!
//! Loggers are injected, never global:
//! - `Logger` trait for custom sinks (console, memory, `log` facade, ...)
//! - Severity levels (Trace, Debug, Info, Warn, Error)
//! - `LogSink`: a cloneable handle (logger + minimum severity) passed to every
//!   component that reports anything
//! - File and line information for ERROR entries

use colored::*;
use chrono::{DateTime, Local};
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

/// Logger trait for custom logging implementations
///
/// # Example
///
/// ```no_run
/// use nova_3d_engine::nova3d::log::{Logger, LogEntry};
///
/// struct FileLogger {
///     file: std::fs::File,
/// }
///
/// impl Logger for FileLogger {
///     fn log(&self, entry: &LogEntry) {
///         // Write to file...
///     }
/// }
/// ```
pub trait Logger: Send + Sync {
    /// Log an entry
    fn log(&self, entry: &LogEntry);
}

/// Log entry containing all information about a log message
#[derive(Debug, Clone)]
pub struct LogEntry {
    /// Severity level (Trace, Debug, Info, Warn, Error)
    pub severity: LogSeverity,

    /// Timestamp when the log was created
    pub timestamp: SystemTime,

    /// Source component (e.g., "nova3d::Swapchain", "nova3d::vulkan")
    pub source: String,

    /// Log message
    pub message: String,

    /// Source file (only for detailed ERROR logs)
    pub file: Option<&'static str>,

    /// Source line (only for detailed ERROR logs)
    pub line: Option<u32>,
}

/// Log severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogSeverity {
    /// Very verbose debug information (per-frame traffic)
    Trace,

    /// Development/debugging information
    Debug,

    /// Important informational messages
    Info,

    /// Warning messages (potential issues)
    Warn,

    /// Error messages (with file:line details)
    Error,
}

// ===== CONSOLE LOGGER =====

/// Colored console logger
///
/// Format:
/// - Normal: `[timestamp] [SEVERITY] [source] message`
/// - Error: `[timestamp] [ERROR] [source] message (file:line)`
pub struct DefaultLogger;

impl Logger for DefaultLogger {
    fn log(&self, entry: &LogEntry) {
        let datetime: DateTime<Local> = entry.timestamp.into();
        let timestamp = datetime.format("%Y-%m-%d %H:%M:%S%.3f").to_string();

        let severity_str = match entry.severity {
            LogSeverity::Trace => "TRACE".bright_black(),
            LogSeverity::Debug => "DEBUG".cyan(),
            LogSeverity::Info => "INFO ".green(),
            LogSeverity::Warn => "WARN ".yellow(),
            LogSeverity::Error => "ERROR".red().bold(),
        };

        let source = entry.source.bright_blue();

        match (entry.file, entry.line) {
            (Some(file), Some(line)) => println!(
                "[{}] [{}] [{}] {} ({}:{})",
                timestamp, severity_str, source, entry.message, file, line
            ),
            _ => println!(
                "[{}] [{}] [{}] {}",
                timestamp, severity_str, source, entry.message
            ),
        }
    }
}

// ===== MEMORY LOGGER =====

/// Logger that keeps every entry in memory
///
/// Used by tests to assert on what a component reported.
#[derive(Default)]
pub struct MemoryLogger {
    entries: Mutex<Vec<LogEntry>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all entries logged so far
    pub fn entries(&self) -> Vec<LogEntry> {
        match self.entries.lock() {
            Ok(entries) => entries.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Number of entries at the given severity
    pub fn count(&self, severity: LogSeverity) -> usize {
        self.entries().iter().filter(|e| e.severity == severity).count()
    }

    /// True if any entry message contains `needle`
    pub fn contains(&self, needle: &str) -> bool {
        self.entries().iter().any(|e| e.message.contains(needle))
    }
}

impl Logger for MemoryLogger {
    fn log(&self, entry: &LogEntry) {
        match self.entries.lock() {
            Ok(mut entries) => entries.push(entry.clone()),
            Err(poisoned) => poisoned.into_inner().push(entry.clone()),
        }
    }
}

// ===== LOG FACADE BRIDGE =====

/// Forwards entries to the `log` crate facade
///
/// Lets a host application that already installed `env_logger` (or any other
/// `log` backend) receive engine messages through its own pipeline.
pub struct FacadeLogger;

impl Logger for FacadeLogger {
    fn log(&self, entry: &LogEntry) {
        let level = match entry.severity {
            LogSeverity::Trace => ::log::Level::Trace,
            LogSeverity::Debug => ::log::Level::Debug,
            LogSeverity::Info => ::log::Level::Info,
            LogSeverity::Warn => ::log::Level::Warn,
            LogSeverity::Error => ::log::Level::Error,
        };
        ::log::logger().log(
            &::log::Record::builder()
                .level(level)
                .target(&entry.source)
                .file(entry.file)
                .line(entry.line)
                .args(format_args!("{}", entry.message))
                .build(),
        );
    }
}

// ===== LOG SINK =====

/// Injected logging handle
///
/// Every component that logs receives a `LogSink` at construction. Cloning is
/// cheap (shared logger).
#[derive(Clone)]
pub struct LogSink {
    logger: Arc<dyn Logger>,
    min_severity: LogSeverity,
}

impl LogSink {
    /// Sink forwarding everything at or above `Trace`
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self {
            logger,
            min_severity: LogSeverity::Trace,
        }
    }

    /// Colored console sink
    pub fn console() -> Self {
        Self::new(Arc::new(DefaultLogger))
    }

    /// Drop entries below `severity`
    pub fn with_min_severity(mut self, severity: LogSeverity) -> Self {
        self.min_severity = severity;
        self
    }

    pub fn min_severity(&self) -> LogSeverity {
        self.min_severity
    }

    pub fn enabled(&self, severity: LogSeverity) -> bool {
        severity >= self.min_severity
    }

    pub fn log(&self, severity: LogSeverity, source: &str, message: String) {
        if !self.enabled(severity) {
            return;
        }
        self.logger.log(&LogEntry {
            severity,
            timestamp: SystemTime::now(),
            source: source.to_string(),
            message,
            file: None,
            line: None,
        });
    }

    pub fn log_detailed(
        &self,
        severity: LogSeverity,
        source: &str,
        message: String,
        file: &'static str,
        line: u32,
    ) {
        if !self.enabled(severity) {
            return;
        }
        self.logger.log(&LogEntry {
            severity,
            timestamp: SystemTime::now(),
            source: source.to_string(),
            message,
            file: Some(file),
            line: Some(line),
        });
    }
}

impl Default for LogSink {
    fn default() -> Self {
        Self::console()
    }
}

impl fmt::Debug for LogSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogSink")
            .field("min_severity", &self.min_severity)
            .finish_non_exhaustive()
    }
}

// ===== LOGGING MACROS =====

/// Log a TRACE message
///
/// ```no_run
/// # use nova_3d_engine::{engine_trace, nova3d::log::LogSink};
/// # let sink = LogSink::console();
/// engine_trace!(sink, "nova3d::Model", "Recording mesh {}", 3);
/// ```
#[macro_export]
macro_rules! engine_trace {
    ($sink:expr, $source:expr, $($arg:tt)*) => {
        $sink.log($crate::log::LogSeverity::Trace, $source, format!($($arg)*))
    };
}

/// Log a DEBUG message
#[macro_export]
macro_rules! engine_debug {
    ($sink:expr, $source:expr, $($arg:tt)*) => {
        $sink.log($crate::log::LogSeverity::Debug, $source, format!($($arg)*))
    };
}

/// Log an INFO message
#[macro_export]
macro_rules! engine_info {
    ($sink:expr, $source:expr, $($arg:tt)*) => {
        $sink.log($crate::log::LogSeverity::Info, $source, format!($($arg)*))
    };
}

/// Log a WARN message
#[macro_export]
macro_rules! engine_warn {
    ($sink:expr, $source:expr, $($arg:tt)*) => {
        $sink.log($crate::log::LogSeverity::Warn, $source, format!($($arg)*))
    };
}

/// Log an ERROR message with file:line information
#[macro_export]
macro_rules! engine_error {
    ($sink:expr, $source:expr, $($arg:tt)*) => {
        $sink.log_detailed(
            $crate::log::LogSeverity::Error,
            $source,
            format!($($arg)*),
            file!(),
            line!()
        )
    };
}

/// Log an ERROR and build the matching `Error::BackendError`
///
/// ```no_run
/// # use nova_3d_engine::{engine_err, nova3d::{Error, log::LogSink}};
/// # let sink = LogSink::console();
/// let err: Error = engine_err!(sink, "nova3d::vulkan", "vkCreateBuffer failed: {}", -2);
/// ```
#[macro_export]
macro_rules! engine_err {
    ($sink:expr, $source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $sink.log_detailed(
            $crate::log::LogSeverity::Error,
            $source,
            message.clone(),
            file!(),
            line!()
        );
        $crate::nova3d::Error::BackendError(message)
    }};
}

/// Log an ERROR and return `Err(Error::BackendError)` from the current function
#[macro_export]
macro_rules! engine_bail {
    ($sink:expr, $source:expr, $($arg:tt)*) => {
        return Err($crate::engine_err!($sink, $source, $($arg)*))
    };
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
