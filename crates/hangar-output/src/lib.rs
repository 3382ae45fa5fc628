//! # Hangar Output - Multiplexed Component Logs
//!
//! Every component in an environment writes its textual output through a
//! [`Writer`] scoped to its name. The [`OutputManager`] merges those writes
//! into one ordered, in-memory history and broadcasts each line to every
//! active [`Reader`].
//!
//! ```text
//! ┌──────────┐ write()                            ┌──────────┐
//! │ Writer   │ ──────┐                    ┌─────▶ │ Reader 1 │
//! │  "db"    │       │                    │       └──────────┘
//! └──────────┘       ▼                    │
//!              ┌─────────────────────┐    │       ┌──────────┐
//!              │   OutputManager     │ ───┼─────▶ │ Reader 2 │
//!              │ history + readers   │    │       └──────────┘
//!              └─────────────────────┘    │
//! ┌──────────┐       ▲                    │       ┌──────────┐
//! │ Writer   │ ──────┘                    └─────▶ │ Reader N │
//! │  "seed"  │                                    └──────────┘
//! └──────────┘
//! ```
//!
//! ## Guarantees
//!
//! - A reader created after output already exists receives the full history
//!   first, then the live tail. Lines are never dropped.
//! - History is append-only for the lifetime of the manager.
//! - Delivery happens under the manager lock into bounded queues, so a reader
//!   that stops consuming eventually stalls every writer.
//! - Closing a reader never waits on the manager, and releases any writer
//!   stalled on that reader.
//!
//! ## Wire Format
//!
//! ```text
//! <component>{name}<time>{timestamp}<msg>{text}\n
//! ```

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod manager;
pub mod reader;
pub mod record;
pub mod writer;

// Re-export main types
pub use manager::OutputManager;
pub use reader::{Reader, ReaderStream};
pub use record::{strip_line_terminator, LogLine, LogRecord, OutputError, TIMESTAMP_FORMAT};
pub use writer::Writer;

/// Lines buffered per reader before delivery blocks the writer.
pub const DEFAULT_READER_CAPACITY: usize = 100;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_capacity() {
        assert_eq!(DEFAULT_READER_CAPACITY, 100);
    }
}
