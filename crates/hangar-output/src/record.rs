//! # Log Records
//!
//! Encoding and decoding of the line format shared by the manager, readers
//! and any tooling that consumes the stream.

use bytes::Bytes;
use chrono::{DateTime, FixedOffset, Local};
use thiserror::Error;

/// Timestamp rendering used on the wire: local time, nanosecond precision,
/// always the same width.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.9f%:z";

const COMPONENT_TAG: &str = "<component>";
const TIME_TAG: &str = "<time>";
const MSG_TAG: &str = "<msg>";

/// Errors from the output subsystem.
#[derive(Debug, Error)]
pub enum OutputError {
    /// The line is not valid UTF-8.
    #[error("log line is not valid UTF-8")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    /// A required tag is missing or out of order.
    #[error("malformed log line: missing {0}")]
    MissingTag(&'static str),

    /// The timestamp section did not parse.
    #[error("invalid timestamp {value:?}: {source}")]
    InvalidTimestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

/// Strip at most one trailing line terminator (`\r\n` or `\n`).
#[must_use]
pub fn strip_line_terminator(text: &str) -> &str {
    text.strip_suffix("\r\n")
        .or_else(|| text.strip_suffix('\n'))
        .unwrap_or(text)
}

/// A single unit of component output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// Name the component is registered under.
    pub component: String,
    /// When the output was produced.
    pub timestamp: DateTime<Local>,
    /// Output text without its trailing terminator.
    pub text: String,
}

impl LogRecord {
    /// Build a record, dropping one trailing terminator from `text`.
    pub fn new(component: impl Into<String>, timestamp: DateTime<Local>, text: &str) -> Self {
        Self {
            component: component.into(),
            timestamp,
            text: strip_line_terminator(text).to_string(),
        }
    }

    /// Encode into the wire format, newline included.
    #[must_use]
    pub fn encode(&self) -> Bytes {
        Bytes::from(format!(
            "{COMPONENT_TAG}{}{TIME_TAG}{}{MSG_TAG}{}\n",
            self.component,
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.text
        ))
    }
}

/// A decoded wire line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub component: String,
    pub timestamp: DateTime<FixedOffset>,
    pub text: String,
}

impl LogLine {
    /// Decode one encoded line. A single trailing `\n` is accepted and removed.
    pub fn parse(line: &[u8]) -> Result<Self, OutputError> {
        let line = std::str::from_utf8(line)?;
        let line = line.strip_suffix('\n').unwrap_or(line);

        let rest = line
            .strip_prefix(COMPONENT_TAG)
            .ok_or(OutputError::MissingTag(COMPONENT_TAG))?;
        let (component, rest) = rest
            .split_once(TIME_TAG)
            .ok_or(OutputError::MissingTag(TIME_TAG))?;
        let (timestamp, text) = rest
            .split_once(MSG_TAG)
            .ok_or(OutputError::MissingTag(MSG_TAG))?;

        let parsed = DateTime::parse_from_rfc3339(timestamp).map_err(|source| {
            OutputError::InvalidTimestamp {
                value: timestamp.to_string(),
                source,
            }
        })?;

        Ok(Self {
            component: component.to_string(),
            timestamp: parsed,
            text: text.to_string(),
        })
    }
}
