//! # Output Reader
//!
//! Subscriber side of the output manager.

use crate::manager::OutputManager;
use bytes::Bytes;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::Stream;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// A subscription to the combined output of an environment.
///
/// Yields encoded lines: the history that existed when the reader was
/// created, followed by everything written afterwards.
pub struct Reader {
    id: u64,
    receiver: mpsc::Receiver<Bytes>,
    manager: OutputManager,
    closed: CancellationToken,
}

impl Reader {
    pub(crate) fn new(
        id: u64,
        receiver: mpsc::Receiver<Bytes>,
        manager: OutputManager,
        closed: CancellationToken,
    ) -> Self {
        Self {
            id,
            receiver,
            manager,
            closed,
        }
    }

    /// Identifier of this reader within its manager.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Receive the next line.
    ///
    /// Returns `None` once the reader is closed and its queue is drained.
    pub async fn recv(&mut self) -> Option<Bytes> {
        self.receiver.recv().await
    }

    /// Receive a line if one is already queued.
    pub fn try_recv(&mut self) -> Option<Bytes> {
        self.receiver.try_recv().ok()
    }

    /// The underlying channel, for use in `select!` loops.
    pub fn receiver(&mut self) -> &mut mpsc::Receiver<Bytes> {
        &mut self.receiver
    }

    /// Stop receiving new lines.
    ///
    /// Lines already queued stay available through [`Reader::recv`]. Never
    /// waits on the manager lock, so it also releases a writer stalled on
    /// this reader's full queue. Closing twice is a no-op.
    pub fn close(&mut self) {
        if self.closed.is_cancelled() {
            return;
        }
        self.closed.cancel();
        let removed = self.manager.try_deregister(self.id);
        debug!(reader = self.id, ?removed, "Output reader closed");
    }

    /// Whether [`Reader::close`] has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    /// Convert into a [`Stream`] of lines.
    #[must_use]
    pub fn into_stream(self) -> ReaderStream {
        ReaderStream {
            id: self.id,
            inner: ReceiverStream::new(self.receiver),
        }
    }
}

impl std::fmt::Debug for Reader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reader")
            .field("id", &self.id)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

/// Stream adapter over a [`Reader`].
///
/// Dropping the stream disconnects the reader; the manager prunes it on the
/// next write.
pub struct ReaderStream {
    id: u64,
    inner: ReceiverStream<Bytes>,
}

impl ReaderStream {
    /// Identifier of the underlying reader.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Stream for ReaderStream {
    type Item = Bytes;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
