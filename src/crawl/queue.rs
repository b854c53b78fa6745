// src/crawl/queue.rs
// =============================================================================
// This module implements the shared FIFO queue that both worker pools read from.
//
// The same type serves two roles:
// - The Frontier: URLs waiting to be crawled (popped with a lease)
// - The Output Channel: report records waiting to be written (plain pops)
//
// How it works:
// 1. Entries live in a VecDeque behind a Mutex
// 2. push() appends and wakes one sleeping popper through a tokio Notify
// 3. pop() waits asynchronously until an entry is there, never "empty"
// 4. A shutdown entry tells exactly one worker to stop
//
// Termination:
// - pop_leased() counts the popped item as "in flight" under the same lock
//   that guards the deque
// - The returned InFlight lease decrements that counter when dropped
// - When the deque is empty and nothing is in flight, the queue is quiescent
//   and wait_quiescent() returns
//
// Rust concepts:
// - Mutex + Notify: a blocking queue for async tasks
// - Drop: run bookkeeping on every exit path, including early returns
// - Generics: one queue type for URLs and report records
// =============================================================================

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;

// An entry in the queue: either real work or a request for one worker to stop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message<T> {
    /// A unit of work
    Item(T),
    /// Stop signal for exactly one worker
    Shutdown,
}

// Everything that must change together lives behind one lock
struct QueueState<T> {
    entries: VecDeque<Message<T>>,
    // Items handed out by pop_leased() whose lease has not been dropped yet
    in_flight: usize,
    // Latched once the queue has been seen empty with nothing in flight
    quiescent: bool,
}

/// Unbounded FIFO with per-worker shutdown signals and quiescence detection.
pub struct WorkQueue<T> {
    state: Mutex<QueueState<T>>,
    // Wakes a popper waiting for an entry
    available: Notify,
    // Wakes whoever waits for quiescence
    idle: Notify,
}

impl<T> WorkQueue<T> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                entries: VecDeque::new(),
                in_flight: 0,
                quiescent: false,
            }),
            available: Notify::new(),
            idle: Notify::new(),
        }
    }

    // A panic in another worker must not wedge the whole crawl,
    // so a poisoned lock is simply taken over
    fn lock(&self) -> MutexGuard<'_, QueueState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // Appends an item to the tail. Never blocks, always succeeds.
    pub fn push(&self, item: T) {
        self.lock().entries.push_back(Message::Item(item));
        self.available.notify_one();
    }

    // Appends one shutdown signal. Call once per worker that should stop.
    pub fn close_for_worker(&self) {
        self.lock().entries.push_back(Message::Shutdown);
        self.available.notify_one();
    }

    // Forced shutdown: discards every pending item and puts `workers`
    // shutdown signals at the head of the queue, in one critical section.
    //
    // Items pushed afterwards by workers that are still busy end up behind
    // the shutdown signals, so every worker stops at its next pop.
    //
    // Returns the number of discarded items.
    pub fn shutdown_now(&self, workers: usize) -> usize {
        let discarded = {
            let mut state = self.lock();
            let before = state.entries.len();
            state.entries.retain(|entry| matches!(entry, Message::Shutdown));
            let discarded = before - state.entries.len();
            for _ in 0..workers {
                state.entries.push_front(Message::Shutdown);
            }
            discarded
        };
        for _ in 0..workers {
            self.available.notify_one();
        }
        discarded
    }

    // Waits until an entry is available and removes it from the head.
    pub async fn pop(&self) -> Message<T> {
        self.next(false).await
    }

    async fn next(&self, lease: bool) -> Message<T> {
        loop {
            // Register interest before looking at the deque, so a push that
            // lands between the check and the await still wakes us
            let notified = self.available.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut state = self.lock();
                if let Some(message) = state.entries.pop_front() {
                    if lease && matches!(message, Message::Item(_)) {
                        state.in_flight += 1;
                    }
                    return message;
                }
            }

            notified.await;
        }
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    pub fn in_flight(&self) -> usize {
        self.lock().in_flight
    }

    pub fn is_quiescent(&self) -> bool {
        self.lock().quiescent
    }

    // Resolves once the queue is empty and no lease is outstanding.
    //
    // Quiescence is only evaluated when a lease is released, so the queue
    // has to be seeded before anyone waits on it.
    pub async fn wait_quiescent(&self) {
        loop {
            let notified = self.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.is_quiescent() {
                return;
            }

            notified.await;
        }
    }

    fn release(&self) {
        let now_quiescent = {
            let mut state = self.lock();
            state.in_flight = state.in_flight.saturating_sub(1);
            if state.in_flight == 0 && state.entries.is_empty() {
                state.quiescent = true;
            }
            state.quiescent
        };
        if now_quiescent {
            self.idle.notify_one();
        }
    }
}

impl<T> Default for WorkQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> WorkQueue<T> {
    // Like pop(), but an item comes with an InFlight lease.
    //
    // The counter is raised in the same critical section that removes the
    // item, so there is no instant where the item is neither queued nor
    // counted.
    pub async fn pop_leased(self: &Arc<Self>) -> Message<(T, InFlight<T>)> {
        match self.next(true).await {
            Message::Item(item) => Message::Item((
                item,
                InFlight {
                    queue: Arc::clone(self),
                },
            )),
            Message::Shutdown => Message::Shutdown,
        }
    }
}

/// Proof that a popped item is still being processed.
///
/// Hold it until every push caused by the item has been made, then drop it.
#[must_use = "dropping the lease immediately marks the item as finished"]
pub struct InFlight<T> {
    queue: Arc<WorkQueue<T>>,
}

impl<T> Drop for InFlight<T> {
    fn drop(&mut self) {
        self.queue.release();
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why not just check "is the queue empty?" to know we are done?
//    - A worker may have just popped the last URL and still be fetching it
//    - That fetch can discover new links and push them
//    - So "empty" only means "done" when nothing is in flight as well
//
// 2. Why a std Mutex inside async code?
//    - The lock is never held across an .await
//    - Critical sections are a few instructions long
//    - It also lets Drop (which cannot be async) take the lock
//
// 3. What is tokio::pin! and enable()?
//    - notified() returns a future that must be pinned before polling
//    - enable() registers it as a waiter right away, so a notify_one()
//      that happens before we actually .await is not lost
//
// 4. Why Drop for the lease?
//    - Drop runs on every way out of a scope: normal end, early return,
//      even a panic unwinding through the task
//    - That guarantees the in-flight counter always goes back down
// -----------------------------------------------------------------------------
