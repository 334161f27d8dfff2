//! Log capture for tests.

use flowview_core::{LogLevel, Logger};
use std::cell::RefCell;
use tracing_subscriber::EnvFilter;

/// Install a `tracing` subscriber writing through the test harness.
///
/// Honors `RUST_LOG`. Safe to call from every test; only the first call
/// installs anything.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Logger keeping every message it receives
#[derive(Debug, Default)]
pub struct RecordingLogger {
    entries: RefCell<Vec<(LogLevel, String)>>,
}

impl RecordingLogger {
    /// Create an empty logger
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything logged so far, oldest first
    pub fn entries(&self) -> Vec<(LogLevel, String)> {
        self.entries.borrow().clone()
    }

    /// Messages logged at `level`
    pub fn messages(&self, level: LogLevel) -> Vec<String> {
        self.entries
            .borrow()
            .iter()
            .filter(|(logged, _)| *logged == level)
            .map(|(_, message)| message.clone())
            .collect()
    }

    /// Whether a message at `level` contains `needle`
    pub fn contains(&self, level: LogLevel, needle: &str) -> bool {
        self.messages(level)
            .iter()
            .any(|message| message.contains(needle))
    }
}

impl Logger for RecordingLogger {
    fn log(&self, level: LogLevel, message: &str) {
        tracing::trace!("recorded {:?}: {}", level, message);
        self.entries.borrow_mut().push((level, message.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_records_by_level() {
        init_tracing();
        let logger = RecordingLogger::new();

        logger.warn("Duplicate id 'a'");
        logger.info("started");
        logger.warn("Duplicate id 'b'");

        assert_eq!(logger.entries().len(), 3);
        assert_eq!(
            logger.messages(LogLevel::Warn),
            vec!["Duplicate id 'a'".to_string(), "Duplicate id 'b'".to_string()]
        );
        assert!(logger.contains(LogLevel::Info, "start"));
        assert!(!logger.contains(LogLevel::Error, "start"));
    }
}
