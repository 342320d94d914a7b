//! Schedule - Deferred job queue for host-turn boundaries.
//!
//! The core is single-threaded and synchronous, with one exception: the
//! "added to document" notification is deferred to the next turn of the
//! host's task queue rather than fired inside the mutating call, so a
//! lifecycle callback never re-enters a tree that is still being built.
//!
//! Embedders drive the queue: call `flush()` once per host task-queue turn.
//! Tests call it directly.

use std::cell::RefCell;
use std::collections::VecDeque;

thread_local! {
    static QUEUE: RefCell<VecDeque<Box<dyn FnOnce()>>> = RefCell::new(VecDeque::new());
}

/// Enqueue a job for the next `flush`.
pub fn defer(job: impl FnOnce() + 'static) {
    QUEUE.with(|queue| queue.borrow_mut().push_back(Box::new(job)));
}

/// Run every pending job, including jobs enqueued by jobs run during this
/// flush. Returns the number of jobs executed.
pub fn flush() -> usize {
    let mut ran = 0;
    loop {
        let job = QUEUE.with(|queue| queue.borrow_mut().pop_front());
        match job {
            Some(job) => {
                job();
                ran += 1;
            }
            None => return ran,
        }
    }
}

/// Number of jobs currently waiting.
pub fn pending() -> usize {
    QUEUE.with(|queue| queue.borrow().len())
}

/// Drop all pending jobs without running them (for testing).
pub fn reset_schedule() {
    QUEUE.with(|queue| queue.borrow_mut().clear());
}
