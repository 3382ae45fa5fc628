//! # Output Writer
//!
//! Producer side of the output manager. Each component receives exactly one
//! writer, scoped to its registered name, when it is attached to an
//! environment.

use crate::manager::OutputManager;
use crate::record::LogRecord;
use chrono::{DateTime, Local};
use std::sync::Arc;

/// Log sink for a single component.
#[derive(Clone)]
pub struct Writer {
    component: Arc<str>,
    manager: OutputManager,
}

impl Writer {
    pub(crate) fn new(component: String, manager: OutputManager) -> Self {
        Self {
            component: component.into(),
            manager,
        }
    }

    /// Name of the component this writer belongs to.
    #[must_use]
    pub fn component(&self) -> &str {
        &self.component
    }

    /// Append raw output stamped with the current time.
    pub async fn write(&self, bytes: &[u8]) {
        self.write_with_time(Local::now(), bytes).await;
    }

    /// Append text stamped with the current time.
    pub async fn write_string(&self, text: &str) {
        self.write_string_with_time(Local::now(), text).await;
    }

    /// Append raw output with a caller-supplied time.
    ///
    /// Invalid UTF-8 is replaced rather than rejected.
    pub async fn write_with_time(&self, time: DateTime<Local>, bytes: &[u8]) {
        self.write_string_with_time(time, &String::from_utf8_lossy(bytes))
            .await;
    }

    /// Append text with a caller-supplied time.
    pub async fn write_string_with_time(&self, time: DateTime<Local>, text: &str) {
        let record = LogRecord::new(self.component.as_ref(), time, text);
        self.manager.write_record(&record).await;
    }
}

impl std::fmt::Debug for Writer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Writer")
            .field("component", &self.component)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::LogLine;
    use chrono::TimeZone;

    #[tokio::test]
    async fn test_writer_scopes_component_name() {
        let manager = OutputManager::new();
        let writer = manager.writer("db");
        assert_eq!(writer.component(), "db");

        writer.write(b"ready\n").await;

        let history = manager.history().await;
        let line = LogLine::parse(&history[0]).unwrap();
        assert_eq!(line.component, "db");
        assert_eq!(line.text, "ready");
    }

    #[tokio::test]
    async fn test_write_with_time_uses_given_time() {
        let manager = OutputManager::new();
        let writer = manager.writer("seed");
        let time = Local.with_ymd_and_hms(2023, 11, 2, 8, 30, 0).unwrap();

        writer.write_string_with_time(time, "done\r\n").await;

        let history = manager.history().await;
        let line = LogLine::parse(&history[0]).unwrap();
        assert_eq!(line.timestamp, time.fixed_offset());
        assert_eq!(line.text, "done");
    }

    #[tokio::test]
    async fn test_lossy_bytes() {
        let manager = OutputManager::new();
        manager.writer("bin").write(&[0x66, 0xff, 0x6f]).await;

        let history = manager.history().await;
        let line = LogLine::parse(&history[0]).unwrap();
        assert_eq!(line.text, "f\u{fffd}o");
    }
}
