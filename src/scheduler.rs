//! Periodic task scheduler.
//!
//! A fixed slot table of `(period, last fire, task)` entries polled on
//! every pass of the main loop.  Nothing blocks: a task is "waiting"
//! simply because its elapsed time is still below its period.  When a
//! task is due the scheduler notifies a [`TaskDelegate`]; the device core
//! implements the delegate to run its sampling and emission passes.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │  poll loop ──▶ Scheduler.tick(now_ms)                  │
//! │                   │                                    │
//! │                   ├─ Sample (10 ms) ─▶ on_task_due()   │
//! │                   └─ Emit   (50 ms) ─▶ on_task_due()   │
//! └────────────────────────────────────────────────────────┘
//! ```
//!
//! Elapsed time is `now.wrapping_sub(last_fire)`, so a 32-bit millisecond
//! clock rolling over is harmless.  There is no catch-up: a task overdue
//! by several periods fires once and re-arms from `now`.

use crate::app::ports::{TaskDelegate, TaskId};
use log::{info, trace};

// ═══════════════════════════════════════════════════════════════
//  Task entries
// ═══════════════════════════════════════════════════════════════

/// A single periodic task.
#[derive(Debug, Clone, Copy)]
pub struct PeriodicTask {
    pub task: TaskId,
    pub period_ms: u32,
    /// Timestamp of the last fire (or the re-arm reference).
    last_fire_ms: u32,
}

impl PeriodicTask {
    pub fn new(task: TaskId, period_ms: u32, last_fire_ms: u32) -> Self {
        Self {
            task,
            period_ms,
            last_fire_ms,
        }
    }

    /// Whether at least one full period has elapsed since the last fire.
    pub fn is_due(&self, now_ms: u32) -> bool {
        now_ms.wrapping_sub(self.last_fire_ms) >= self.period_ms
    }

    pub fn last_fire_ms(&self) -> u32 {
        self.last_fire_ms
    }
}

// ═══════════════════════════════════════════════════════════════
//  Scheduler engine
// ═══════════════════════════════════════════════════════════════

/// Maximum number of concurrent tasks (stack-allocated).
const MAX_TASKS: usize = 4;

pub struct Scheduler {
    tasks: [Option<PeriodicTask>; MAX_TASKS],
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            tasks: [None; MAX_TASKS],
        }
    }

    /// Add a task.  Returns the slot index, or `None` if full.
    pub fn add(&mut self, task: PeriodicTask) -> Option<usize> {
        for (i, slot) in self.tasks.iter_mut().enumerate() {
            if slot.is_none() {
                info!(
                    "Scheduler: added {:?} every {}ms at slot {}",
                    task.task, task.period_ms, i
                );
                *slot = Some(task);
                return Some(i);
            }
        }
        None // All slots full.
    }

    /// Move the last-fire reference of every entry for `task` to `at_ms`.
    pub fn rearm(&mut self, task: TaskId, at_ms: u32) {
        for entry in self.tasks.iter_mut().flatten() {
            if entry.task == task {
                entry.last_fire_ms = at_ms;
            }
        }
    }

    /// Poll every task once.  Call on every pass of the main loop.
    ///
    /// Due tasks fire in slot order; each is re-armed at `now_ms` after
    /// its delegate call returns.
    pub fn tick(&mut self, now_ms: u32, delegate: &mut dyn TaskDelegate) {
        for entry in self.tasks.iter_mut().flatten() {
            if !entry.is_due(now_ms) {
                continue;
            }
            trace!(
                "Scheduler: {:?} due ({}ms since last)",
                entry.task,
                now_ms.wrapping_sub(entry.last_fire_ms)
            );
            delegate.on_task_due(entry.task, now_ms);
            entry.last_fire_ms = now_ms;
        }
    }

    /// Look up the entry for `task`.
    pub fn get(&self, task: TaskId) -> Option<&PeriodicTask> {
        self.tasks.iter().flatten().find(|t| t.task == task)
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
