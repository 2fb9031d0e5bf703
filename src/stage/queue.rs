//! Bounded FIFO row queues between stages.
//!
//! A queue has exactly one producer handle and one consumer handle. Rows
//! arrive in the order they were pushed. Pushing to a full queue blocks
//! (backpressure); the wait is sliced so a bound [`StopSignal`] is observed
//! within one wait granularity. Closing is terminal and idempotent, and
//! dropping either handle closes the queue too, so a crashed stage never
//! leaves its neighbor blocked forever.

use crate::error::{Error, Result};
use crate::schema::Row;
use crate::stage::StopSignal;
use crossbeam_channel::{Receiver, RecvTimeoutError, SendTimeoutError, Sender};
use std::time::Duration;

/// How long a blocked push or pop waits between stop-signal checks.
const WAIT_SLICE: Duration = Duration::from_millis(100);

/// Create a bounded row queue holding at most `capacity` rows.
pub fn bounded(capacity: usize) -> (RowProducer, RowConsumer) {
    let (tx, rx) = crossbeam_channel::bounded(capacity);
    (
        RowProducer { tx: Some(tx), stop: None },
        RowConsumer { rx },
    )
}

/// Producing end of a row queue.
pub struct RowProducer {
    tx: Option<Sender<Row>>,
    stop: Option<StopSignal>,
}

impl RowProducer {
    /// Make blocked pushes observe `stop` and give up when it fires.
    pub fn bind_stop(&mut self, stop: StopSignal) {
        self.stop = Some(stop);
    }

    /// Push one row, blocking while the queue is full.
    ///
    /// # Errors
    /// [`Error::Interrupted`] when the consumer side is gone, the queue was
    /// closed, or a bound stop signal fires during the wait.
    pub fn push(&self, row: Row) -> Result<()> {
        let Some(tx) = &self.tx else {
            return Err(Error::Interrupted("push on closed row queue".into()));
        };
        let mut row = row;
        loop {
            match tx.send_timeout(row, WAIT_SLICE) {
                Ok(()) => return Ok(()),
                Err(SendTimeoutError::Timeout(returned)) => {
                    if self.stop.as_ref().is_some_and(StopSignal::is_stopped) {
                        return Err(Error::Interrupted("stage stopped during push".into()));
                    }
                    row = returned;
                }
                Err(SendTimeoutError::Disconnected(_)) => {
                    return Err(Error::Interrupted("row queue consumer went away".into()));
                }
            }
        }
    }

    /// Signal that no further rows will ever be pushed. Idempotent.
    pub fn close(&mut self) {
        self.tx = None;
    }

    /// Whether [`RowProducer::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.tx.is_none()
    }
}

/// Consuming end of a row queue.
pub struct RowConsumer {
    rx: Receiver<Row>,
}

impl RowConsumer {
    /// Receive the next row, blocking while the queue is empty.
    ///
    /// Returns `None` once the queue is closed and drained.
    pub fn pop(&self) -> Option<Row> {
        self.rx.recv().ok()
    }

    /// Receive with a deadline; `Ok(None)` means closed-and-drained,
    /// `Err(())` means the deadline passed with the queue still open.
    pub fn pop_timeout(&self, timeout: Duration) -> std::result::Result<Option<Row>, ()> {
        match self.rx.recv_timeout(timeout) {
            Ok(row) => Ok(Some(row)),
            Err(RecvTimeoutError::Disconnected) => Ok(None),
            Err(RecvTimeoutError::Timeout) => Err(()),
        }
    }

    /// Rows currently buffered in the queue.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}
