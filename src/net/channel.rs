//! One-directional bounded message pipe.
//!
//! # Read State Machine
//! ```text
//! FastCheck: deadline already past → Timeout
//! Waiting:   message queued        → Ok(n)
//!            closed and drained    → Ok(0) (EOF)
//!            deadline timer fired  → Timeout
//!            deadline changed      → re-arm or drop the timer, keep waiting
//! ```
//!
//! # Design Decisions
//! - Each write is one message; a write never partially enqueues
//! - Messages queued before close are still readable, then EOF
//! - Deadline setters wake parked tasks; the task re-reads the deadline
//!   after registering its waker, so a concurrent change is never missed
//! - Timers belong to the caller, not the channel, so each reader keeps
//!   its own `Sleep` across polls

use std::future::{poll_fn, Future};
use std::pin::Pin;
use std::sync::{Mutex, MutexGuard};
use std::task::{Context, Poll};

use bytes::Bytes;
use tokio::io::ReadBuf;
use tokio::time::{self, Instant, Sleep};

use crate::config::{ConnectionConfig, OversizePolicy};
use crate::net::error::ConnError;
use crate::net::queue::BoundedQueue;

/// Deadline timer kept by whoever polls a channel.
pub type DeadlineTimer = Option<Pin<Box<Sleep>>>;

/// A bounded, one-directional pipe of byte messages.
#[derive(Debug)]
pub struct Channel {
    queue: BoundedQueue<Bytes>,
    deadlines: Mutex<Deadlines>,
    oversize: OversizePolicy,
}

#[derive(Debug, Default)]
struct Deadlines {
    read: Option<Instant>,
    write: Option<Instant>,
}

impl Channel {
    /// Create a channel holding at most `capacity` undelivered messages.
    pub fn new(capacity: usize, oversize: OversizePolicy) -> Self {
        Self {
            queue: BoundedQueue::new(capacity),
            deadlines: Mutex::new(Deadlines::default()),
            oversize,
        }
    }

    pub fn from_config(config: &ConnectionConfig) -> Self {
        Self::new(config.capacity, config.oversize)
    }

    fn deadlines(&self) -> MutexGuard<'_, Deadlines> {
        self.deadlines.lock().expect("deadline mutex poisoned")
    }

    pub fn capacity(&self) -> usize {
        self.queue.capacity()
    }

    /// Number of written but not yet read messages.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn read_deadline(&self) -> Option<Instant> {
        self.deadlines().read
    }

    pub fn write_deadline(&self) -> Option<Instant> {
        self.deadlines().write
    }

    /// Set or clear (`None`) the read deadline and wake blocked readers.
    pub fn set_read_deadline(&self, deadline: Option<Instant>) {
        {
            let mut deadlines = self.deadlines();
            if deadlines.read == deadline {
                return;
            }
            deadlines.read = deadline;
        }
        self.queue.wake_receivers();
    }

    /// Set or clear (`None`) the write deadline and wake blocked writers.
    pub fn set_write_deadline(&self, deadline: Option<Instant>) {
        {
            let mut deadlines = self.deadlines();
            if deadlines.write == deadline {
                return;
            }
            deadlines.write = deadline;
        }
        self.queue.wake_senders();
    }

    /// Close the channel. Returns `true` for the call that closed it.
    pub fn close(&self) -> bool {
        self.queue.close()
    }

    pub fn is_closed(&self) -> bool {
        self.queue.is_closed()
    }

    /// Poll for the next message.
    ///
    /// Completes with nothing written to `buf` at end of stream.
    pub fn poll_read(
        &self,
        cx: &mut Context<'_>,
        timer: &mut DeadlineTimer,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<Result<(), ConnError>> {
        if is_past(self.read_deadline()) {
            *timer = None;
            return Poll::Ready(Err(ConnError::Timeout));
        }
        if buf.remaining() == 0 {
            return Poll::Ready(Ok(()));
        }

        let oversize = self.oversize;
        match self.queue.poll_front(cx, |message| deliver(message, buf, oversize)) {
            Poll::Ready(Some(result)) => {
                *timer = None;
                return Poll::Ready(result);
            }
            Poll::Ready(None) => {
                *timer = None;
                return Poll::Ready(Ok(()));
            }
            Poll::Pending => {}
        }

        poll_deadline(cx, timer, self.read_deadline()).map(Err)
    }

    /// Poll to enqueue `buf` as one message.
    pub fn poll_write(
        &self,
        cx: &mut Context<'_>,
        timer: &mut DeadlineTimer,
        buf: &[u8],
    ) -> Poll<Result<usize, ConnError>> {
        if self.is_closed() {
            *timer = None;
            return Poll::Ready(Err(ConnError::Closed));
        }
        if buf.is_empty() {
            return Poll::Ready(Ok(0));
        }
        if is_past(self.write_deadline()) {
            *timer = None;
            return Poll::Ready(Err(ConnError::Timeout));
        }

        match self.queue.poll_push_with(cx, || Bytes::copy_from_slice(buf)) {
            Poll::Ready(result) => {
                *timer = None;
                return Poll::Ready(result.map(|()| buf.len()));
            }
            Poll::Pending => {}
        }

        poll_deadline(cx, timer, self.write_deadline()).map(Err)
    }

    /// Read the next message into `buf`. Returns `Ok(0)` at end of stream.
    pub async fn read(&self, buf: &mut [u8]) -> Result<usize, ConnError> {
        let mut timer = None;
        let mut buf = ReadBuf::new(buf);
        poll_fn(|cx| self.poll_read(cx, &mut timer, &mut buf)).await?;
        Ok(buf.filled().len())
    }

    /// Write `buf` as one message, waiting for capacity.
    pub async fn write(&self, buf: &[u8]) -> Result<usize, ConnError> {
        let mut timer = None;
        poll_fn(|cx| self.poll_write(cx, &mut timer, buf)).await
    }
}

/// Copy `message` into `buf`. Returns the outcome and whether the message
/// was used up.
fn deliver(message: &mut Bytes, buf: &mut ReadBuf<'_>, oversize: OversizePolicy) -> (Result<(), ConnError>, bool) {
    if message.len() <= buf.remaining() {
        buf.put_slice(&message[..]);
        return (Ok(()), true);
    }

    match oversize {
        OversizePolicy::Split => {
            let head = message.split_to(buf.remaining());
            buf.put_slice(&head);
            (Ok(()), false)
        }
        OversizePolicy::Reject => {
            let err = ConnError::MessageTooLarge {
                len: message.len(),
                capacity: buf.remaining(),
            };
            (Err(err), true)
        }
    }
}

fn is_past(deadline: Option<Instant>) -> bool {
    deadline.is_some_and(|deadline| deadline <= Instant::now())
}

/// Arm `timer` for `deadline` and poll it. Ready means the deadline passed.
fn poll_deadline(cx: &mut Context<'_>, timer: &mut DeadlineTimer, deadline: Option<Instant>) -> Poll<ConnError> {
    let Some(deadline) = deadline else {
        *timer = None;
        return Poll::Pending;
    };

    let sleep = timer.get_or_insert_with(|| Box::pin(time::sleep_until(deadline)));
    if sleep.deadline() != deadline {
        sleep.as_mut().reset(deadline);
    }
    let fired = sleep.as_mut().poll(cx).is_ready();
    if fired {
        *timer = None;
        return Poll::Ready(ConnError::Timeout);
    }
    Poll::Pending
}
