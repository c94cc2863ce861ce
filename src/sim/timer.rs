//! Scheduled task queue on a virtual clock
//!
//! Every delayed action in the simulation (spawn intervals, shield durations,
//! effect expiry, heightened stages) is a task registered here. Advancing the
//! clock returns the tasks that came due, so a timer firing is just a value
//! the tick loop handles like any other input.

use serde::{Deserialize, Serialize};

/// Handle to a scheduled task, used for cancellation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimerHandle(u64);

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Entry<T> {
    handle: TimerHandle,
    due: f32,
    task: T,
}

/// Virtual-clock scheduler
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scheduler<T> {
    now: f32,
    next_handle: u64,
    /// Pending entries, kept sorted by (due, handle) so ties fire in schedule order
    entries: Vec<Entry<T>>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            now: 0.0,
            next_handle: 1,
            entries: Vec::new(),
        }
    }

    /// Current virtual time in seconds
    pub fn now(&self) -> f32 {
        self.now
    }

    /// Number of pending tasks
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Schedule `task` to fire `delay` seconds from now.
    ///
    /// Negative or non-finite delays fire on the next advance.
    pub fn schedule(&mut self, delay: f32, task: T) -> TimerHandle {
        let delay = if delay.is_finite() { delay.max(0.0) } else { 0.0 };
        let handle = TimerHandle(self.next_handle);
        self.next_handle += 1;
        let due = self.now + delay;
        let pos = self
            .entries
            .partition_point(|e| e.due < due || (e.due == due && e.handle.0 < handle.0));
        self.entries.insert(pos, Entry { handle, due, task });
        handle
    }

    /// Cancel a pending task. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        if let Some(idx) = self.entries.iter().position(|e| e.handle == handle) {
            self.entries.remove(idx);
            true
        } else {
            false
        }
    }

    /// Whether the handle still refers to a pending task
    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.entries.iter().any(|e| e.handle == handle)
    }

    /// Seconds until the task fires, if still pending
    pub fn remaining(&self, handle: TimerHandle) -> Option<f32> {
        self.entries
            .iter()
            .find(|e| e.handle == handle)
            .map(|e| (e.due - self.now).max(0.0))
    }

    /// Advance the clock by `dt` and return every task that came due, in due order
    pub fn advance(&mut self, dt: f32) -> Vec<T> {
        if dt.is_finite() && dt > 0.0 {
            self.now += dt;
        }
        let split = self.entries.partition_point(|e| e.due <= self.now);
        self.entries.drain(..split).map(|e| e.task).collect()
    }

    /// Drop every pending task
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
