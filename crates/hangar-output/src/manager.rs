//! # Output Manager
//!
//! Owns the history and the broadcast list. One manager exists per
//! environment; [`Writer`] and [`Reader`] handles hold a cheap clone of it.

use crate::reader::Reader;
use crate::record::LogRecord;
use crate::writer::Writer;
use crate::DEFAULT_READER_CAPACITY;
use bytes::Bytes;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::debug;

struct ReaderSlot {
    id: u64,
    sender: mpsc::Sender<Bytes>,
}

#[derive(Default)]
struct State {
    /// Every encoded line ever written, in write order.
    history: Vec<Bytes>,
    /// Readers receiving the live tail.
    readers: Vec<ReaderSlot>,
}

struct Shared {
    state: Mutex<State>,
    next_reader_id: AtomicU64,
    capacity: usize,
}

/// Multiplexes component output into one ordered stream.
///
/// Cloning yields another handle to the same history and reader list.
#[derive(Clone)]
pub struct OutputManager {
    shared: Arc<Shared>,
}

impl OutputManager {
    /// Create a manager with the default per-reader capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_READER_CAPACITY)
    }

    /// Create a manager whose readers buffer `capacity` lines.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "reader capacity must be positive");
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State::default()),
                next_reader_id: AtomicU64::new(0),
                capacity,
            }),
        }
    }

    /// Per-reader queue capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    /// Create the writer handle for one component.
    #[must_use]
    pub fn writer(&self, component: impl Into<String>) -> Writer {
        Writer::new(component.into(), self.clone())
    }

    /// Append a record to the history and deliver it to every reader.
    ///
    /// The manager lock is held until every reader queue accepted the line.
    /// Readers whose consumer has gone away are dropped from the list.
    pub async fn write_record(&self, record: &LogRecord) {
        let line = record.encode();
        let mut state = self.shared.state.lock().await;
        state.history.push(line.clone());

        let mut disconnected = Vec::new();
        for slot in &state.readers {
            if slot.sender.send(line.clone()).await.is_err() {
                disconnected.push(slot.id);
            }
        }

        if !disconnected.is_empty() {
            state.readers.retain(|slot| !disconnected.contains(&slot.id));
            debug!(
                readers = ?disconnected,
                "Dropped disconnected output readers"
            );
        }
    }

    /// Register a new reader.
    ///
    /// The reader first receives every line already in the history, then the
    /// live tail. History is replayed by a background task so the manager lock
    /// is only held for the snapshot.
    pub async fn reader(&self) -> Reader {
        let id = self.shared.next_reader_id.fetch_add(1, Ordering::Relaxed);
        let (live_tx, live_rx) = mpsc::channel(self.shared.capacity);
        let (out_tx, out_rx) = mpsc::channel(self.shared.capacity);
        let closed = CancellationToken::new();

        let history = {
            let mut state = self.shared.state.lock().await;
            state.readers.push(ReaderSlot {
                id,
                sender: live_tx,
            });
            state.history.clone()
        };

        debug!(reader = id, replay = history.len(), "Output reader registered");
        tokio::spawn(forward(id, history, live_rx, out_tx, closed.clone()));

        Reader::new(id, out_rx, self.clone(), closed)
    }

    /// Remove a reader from the broadcast list if the lock is free.
    ///
    /// Returns `None` when a writer holds the lock. The reader's live queue is
    /// already closed by then, so that writer prunes the slot itself.
    pub(crate) fn try_deregister(&self, id: u64) -> Option<bool> {
        let mut state = self.shared.state.try_lock().ok()?;
        let before = state.readers.len();
        state.readers.retain(|slot| slot.id != id);
        Some(before != state.readers.len())
    }

    /// Number of readers currently receiving the live tail.
    pub async fn reader_count(&self) -> usize {
        self.shared.state.lock().await.readers.len()
    }

    /// Number of lines in the history.
    pub async fn history_len(&self) -> usize {
        self.shared.state.lock().await.history.len()
    }

    /// Copy of the full history.
    pub async fn history(&self) -> Vec<Bytes> {
        self.shared.state.lock().await.history.clone()
    }
}

impl Default for OutputManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for OutputManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputManager")
            .field("capacity", &self.shared.capacity)
            .finish_non_exhaustive()
    }
}

/// Feed one reader: the history snapshot, then the live queue until it closes.
///
/// Once `closed` fires the live queue is closed, which fails any writer
/// blocked on it. Lines it already buffered are moved over only while the
/// reader's queue has room.
async fn forward(
    id: u64,
    history: Vec<Bytes>,
    mut live: mpsc::Receiver<Bytes>,
    out: mpsc::Sender<Bytes>,
    closed: CancellationToken,
) {
    let mut pending = history.into_iter();

    loop {
        let line = match pending.next() {
            Some(line) => line,
            None => tokio::select! {
                biased;
                () = closed.cancelled() => break,
                line = live.recv() => match line {
                    Some(line) => line,
                    None => return,
                },
            },
        };

        tokio::select! {
            biased;
            sent = out.send(line.clone()) => {
                if sent.is_err() {
                    debug!(reader = id, "Reader went away");
                    return;
                }
            }
            () = closed.cancelled() => {
                let _ = out.try_send(line);
                break;
            }
        }
    }

    live.close();
    while let Ok(line) = live.try_recv() {
        if out.try_send(line).is_err() {
            break;
        }
    }
    debug!(reader = id, "Reader closed, forwarding stopped");
}
