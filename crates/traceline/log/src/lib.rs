//! Trace-correlated structured logging.
//!
//! Every line carries the identity of whichever span is active on the
//! calling unit's [`TraceScope`] at the moment of the call — late binding,
//! so one logger instance serves every request. With no active span the
//! trace fields render empty rather than disappearing, keeping the line
//! shape stable for downstream parsers.

#![deny(unsafe_code)]

use chrono::{SecondsFormat, Utc};
use parking_lot::Mutex;
use std::fmt;
use std::io::Write;
use std::sync::Arc;
use traceline_core::TraceScope;

/// Log severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        };
        f.write_str(name)
    }
}

/// Destination for formatted log lines.
pub trait LogSink: Send + Sync {
    fn write_line(&self, line: &str);
}

/// Writes lines to stdout.
#[derive(Debug, Default)]
pub struct StdoutSink;

impl LogSink for StdoutSink {
    fn write_line(&self, line: &str) {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        // A failed diagnostic write must never take the process down.
        let _ = writeln!(handle, "{}", line);
    }
}

/// Keeps lines in memory for assertions.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }
}

impl LogSink for MemorySink {
    fn write_line(&self, line: &str) {
        self.lines.lock().push(line.to_string());
    }
}

/// Logger whose lines are stamped with the caller's active span identity.
pub struct CorrelatedLogger {
    sink: Arc<dyn LogSink>,
}

impl CorrelatedLogger {
    /// Logger writing to stdout.
    pub fn new() -> Self {
        Self::with_sink(Arc::new(StdoutSink))
    }

    pub fn with_sink(sink: Arc<dyn LogSink>) -> Self {
        Self { sink }
    }

    /// Emit one line. The span identity is read from `scope` now, not at
    /// logger construction, so the line reflects whichever span is active
    /// for this call.
    pub fn log(&self, scope: &TraceScope, level: LogLevel, message: &str) {
        let (trace_id, span_id) = match scope.current() {
            Some(ctx) => (ctx.trace_id.to_string(), ctx.span_id.to_string()),
            None => (String::new(), String::new()),
        };
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);

        let line = format!(
            "[{}] [{}] [{}] [trace_id={}, span_id={}] [{}]",
            timestamp,
            level,
            scope.unit_id(),
            trace_id,
            span_id,
            message
        );
        self.sink.write_line(&line);
    }

    pub fn debug(&self, scope: &TraceScope, message: &str) {
        self.log(scope, LogLevel::Debug, message);
    }

    pub fn info(&self, scope: &TraceScope, message: &str) {
        self.log(scope, LogLevel::Info, message);
    }

    pub fn warn(&self, scope: &TraceScope, message: &str) {
        self.log(scope, LogLevel::Warn, message);
    }

    pub fn error(&self, scope: &TraceScope, message: &str) {
        self.log(scope, LogLevel::Error, message);
    }
}

impl Default for CorrelatedLogger {
    fn default() -> Self {
        Self::new()
    }
}
