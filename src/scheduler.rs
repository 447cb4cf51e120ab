//! Cancellable delayed-task scheduler.
//!
//! Debounced work (history commits for continuous pan/zoom, search
//! highlighting while typing) is modeled as explicit delayed tasks keyed
//! by slot. Scheduling into an occupied slot replaces the pending task
//! wholesale, which is the debounce: only the last task of a burst
//! survives the quiet period. The host event loop drives `poll` with the
//! current time; there is no background thread.

use std::collections::HashMap;

use web_time::{Duration, Instant};

/// A pending delayed task.
#[derive(Debug, Clone)]
struct DelayedTask<T> {
    deadline: Instant,
    payload: T,
}

/// Scheduler for keyed, cancellable delayed tasks.
#[derive(Debug)]
pub struct TaskScheduler<T> {
    slots: HashMap<&'static str, DelayedTask<T>>,
}

impl<T> Default for TaskScheduler<T> {
    fn default() -> Self {
        Self {
            slots: HashMap::new(),
        }
    }
}

impl<T> TaskScheduler<T> {
    /// Create an empty scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `payload` to become due after `delay`, replacing any task
    /// already pending in the same slot.
    pub fn schedule(&mut self, slot: &'static str, delay: Duration, now: Instant, payload: T) {
        self.slots.insert(
            slot,
            DelayedTask {
                deadline: now + delay,
                payload,
            },
        );
    }

    /// Drop the pending task of a slot, if any. Returns the cancelled
    /// payload.
    pub fn cancel(&mut self, slot: &'static str) -> Option<T> {
        self.slots.remove(slot).map(|t| t.payload)
    }

    /// Whether a slot currently holds a pending task.
    pub fn is_pending(&self, slot: &'static str) -> bool {
        self.slots.contains_key(slot)
    }

    /// Remove and return every task whose deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Vec<T> {
        let due: Vec<&'static str> = self
            .slots
            .iter()
            .filter(|(_, task)| task.deadline <= now)
            .map(|(slot, _)| *slot)
            .collect();
        due.into_iter()
            .filter_map(|slot| self.slots.remove(slot))
            .map(|task| task.payload)
            .collect()
    }
}
