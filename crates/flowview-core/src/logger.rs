//! Logging collaborator used by the resolver and the flow state machines.

use std::fmt::Debug;

/// Log level for runtime diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    /// Trace level - very detailed information
    Trace,
    /// Debug level - debug information
    Debug,
    /// Info level - general information
    Info,
    /// Warn level - warnings
    Warn,
    /// Error level - errors
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

impl From<tracing::Level> for LogLevel {
    fn from(level: tracing::Level) -> Self {
        if level == tracing::Level::TRACE {
            LogLevel::Trace
        } else if level == tracing::Level::DEBUG {
            LogLevel::Debug
        } else if level == tracing::Level::INFO {
            LogLevel::Info
        } else if level == tracing::Level::WARN {
            LogLevel::Warn
        } else {
            LogLevel::Error
        }
    }
}

/// Sink for diagnostics emitted while resolving views and navigating flows.
///
/// Implementors only need [`Logger::log`]; the level helpers forward to it.
pub trait Logger: Debug {
    /// Record a message with the given level
    fn log(&self, level: LogLevel, message: &str);

    /// Record an error message
    fn error(&self, message: &str) {
        self.log(LogLevel::Error, message);
    }

    /// Record a warning
    fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, message);
    }

    /// Record an informational message
    fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    /// Record a debug message
    fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }
}

/// Default logger that forwards everything to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Error => tracing::error!(target: "flowview", "{}", message),
            LogLevel::Warn => tracing::warn!(target: "flowview", "{}", message),
            LogLevel::Info => tracing::info!(target: "flowview", "{}", message),
            LogLevel::Debug => tracing::debug!(target: "flowview", "{}", message),
            LogLevel::Trace => tracing::trace!(target: "flowview", "{}", message),
        }
    }
}
