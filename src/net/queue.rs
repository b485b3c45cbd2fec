//! Bounded FIFO with waker-based blocking push and pop.
//!
//! # Responsibilities
//! - Hold at most `capacity` items
//! - Park producers while full and consumers while empty
//! - One-shot close that wakes every parked task
//!
//! # Design Decisions
//! - Used for both channel messages and the listener backlog
//! - `close` keeps queued items poppable; `close_and_take` empties the queue
//! - Wakers are collected under the lock and woken after it is released
//! - A woken task always re-evaluates state, so spurious wakes are harmless

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use std::task::{Context, Poll, Waker};

use crate::net::error::ConnError;

/// Returned by [`BoundedQueue::try_push`], handing the item back.
#[derive(Debug)]
pub enum TryPushError<T> {
    /// The queue holds `capacity` items.
    Full(T),
    /// The queue is closed.
    Closed(T),
}

/// A bounded multi-producer, multi-consumer FIFO.
#[derive(Debug)]
pub struct BoundedQueue<T> {
    state: Mutex<State<T>>,
    capacity: usize,
}

#[derive(Debug)]
struct State<T> {
    items: VecDeque<T>,
    closed: bool,
    /// Tasks waiting for free space.
    senders: Vec<Waker>,
    /// Tasks waiting for an item.
    receivers: Vec<Waker>,
}

impl<T> BoundedQueue<T> {
    /// Create a queue holding at most `capacity` items (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            state: Mutex::new(State {
                items: VecDeque::with_capacity(capacity),
                closed: false,
                senders: Vec::new(),
                receivers: Vec::new(),
            }),
            capacity,
        }
    }

    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().expect("queue mutex poisoned")
    }

    /// Maximum number of queued items.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of items currently queued.
    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Push the item taken from `slot` once there is room.
    ///
    /// `slot` is only emptied on success, so a caller may keep polling with
    /// the same slot. An already empty slot completes immediately.
    pub fn poll_push(&self, cx: &mut Context<'_>, slot: &mut Option<T>) -> Poll<Result<(), ConnError>> {
        self.poll_push_from(cx, || slot.take())
    }

    /// Push the item built by `make` once there is room.
    ///
    /// `make` only runs when the item is actually enqueued.
    pub fn poll_push_with(&self, cx: &mut Context<'_>, make: impl FnOnce() -> T) -> Poll<Result<(), ConnError>> {
        self.poll_push_from(cx, || Some(make()))
    }

    fn poll_push_from(&self, cx: &mut Context<'_>, take: impl FnOnce() -> Option<T>) -> Poll<Result<(), ConnError>> {
        let mut state = self.lock();
        if state.closed {
            return Poll::Ready(Err(ConnError::Closed));
        }
        if state.items.len() >= self.capacity {
            register(&mut state.senders, cx.waker());
            return Poll::Pending;
        }
        if let Some(item) = take() {
            state.items.push_back(item);
            let wakers = std::mem::take(&mut state.receivers);
            drop(state);
            wake_all(wakers);
        }
        Poll::Ready(Ok(()))
    }

    /// Push without waiting.
    pub fn try_push(&self, item: T) -> Result<(), TryPushError<T>> {
        let mut state = self.lock();
        if state.closed {
            return Err(TryPushError::Closed(item));
        }
        if state.items.len() >= self.capacity {
            return Err(TryPushError::Full(item));
        }
        state.items.push_back(item);
        let wakers = std::mem::take(&mut state.receivers);
        drop(state);
        wake_all(wakers);
        Ok(())
    }

    /// Pop the oldest item.
    ///
    /// Resolves to `None` once the queue is closed and empty.
    pub fn poll_pop(&self, cx: &mut Context<'_>) -> Poll<Option<T>> {
        let mut state = self.lock();
        match state.items.pop_front() {
            Some(item) => {
                let wakers = std::mem::take(&mut state.senders);
                drop(state);
                wake_all(wakers);
                Poll::Ready(Some(item))
            }
            None if state.closed => Poll::Ready(None),
            None => {
                register(&mut state.receivers, cx.waker());
                Poll::Pending
            }
        }
    }

    /// Inspect the oldest item in place.
    ///
    /// `f` returns its output and whether the item was used up; a used-up
    /// item is removed and frees a slot. Resolves to `None` once the queue
    /// is closed and empty.
    pub fn poll_front<R>(&self, cx: &mut Context<'_>, f: impl FnOnce(&mut T) -> (R, bool)) -> Poll<Option<R>> {
        let mut state = self.lock();
        if let Some(front) = state.items.front_mut() {
            let (out, consumed) = f(front);
            if consumed {
                state.items.pop_front();
                let wakers = std::mem::take(&mut state.senders);
                drop(state);
                wake_all(wakers);
            }
            return Poll::Ready(Some(out));
        }

        if state.closed {
            return Poll::Ready(None);
        }
        register(&mut state.receivers, cx.waker());
        Poll::Pending
    }

    /// Close the queue. Returns `true` for the call that closed it.
    pub fn close(&self) -> bool {
        self.shut(false).is_some()
    }

    /// Close the queue and take every item still in it.
    ///
    /// Returns `None` if the queue was already closed.
    pub fn close_and_take(&self) -> Option<Vec<T>> {
        self.shut(true)
    }

    fn shut(&self, take: bool) -> Option<Vec<T>> {
        let mut state = self.lock();
        if state.closed {
            return None;
        }
        state.closed = true;
        let items = if take { state.items.drain(..).collect() } else { Vec::new() };
        let mut wakers = std::mem::take(&mut state.senders);
        wakers.append(&mut state.receivers);
        drop(state);
        wake_all(wakers);
        Some(items)
    }

    /// Wake parked consumers so they re-check external conditions.
    pub fn wake_receivers(&self) {
        let wakers = std::mem::take(&mut self.lock().receivers);
        wake_all(wakers);
    }

    /// Wake parked producers so they re-check external conditions.
    pub fn wake_senders(&self) {
        let wakers = std::mem::take(&mut self.lock().senders);
        wake_all(wakers);
    }
}

fn register(wakers: &mut Vec<Waker>, waker: &Waker) {
    if !wakers.iter().any(|w| w.will_wake(waker)) {
        wakers.push(waker.clone());
    }
}

fn wake_all(wakers: Vec<Waker>) {
    for waker in wakers {
        waker.wake();
    }
}
