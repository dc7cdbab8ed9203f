// SPDX-License-Identifier: MIT OR Apache-2.0

//! Virtual-time scheduler for deferred game transitions
//!
//! Roll settling, move timeouts and the roll-of-1 chain are queued here as
//! plain data instead of ambient timers. The owner advances the clock and
//! dispatches whatever falls due, which keeps every transition on a single
//! writer and makes cancellation explicit.

use crate::PlayerId;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

/// Handle for cancelling a scheduled task
pub type TimerId = u64;

/// Deferred work. `epoch` is the turn epoch the task was scheduled under;
/// the session drops tasks whose epoch is stale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduledTask {
    /// Commit a thrown die value to the turn
    ResolveRoll { epoch: u64, value: u8 },
    /// Raise the timeout warning
    TimeoutWarning { epoch: u64 },
    /// Force the turn to end
    TimeoutExpired { epoch: u64 },
    /// Next step of the roll-of-1 chain; `next_seat` indexes the player list
    ForcedHomeExit {
        epoch: u64,
        roller: PlayerId,
        next_seat: usize,
    },
    /// End a turn that had no legal move once the roll has been shown
    AutoEndTurn { epoch: u64 },
}

impl ScheduledTask {
    pub fn epoch(&self) -> u64 {
        match self {
            ScheduledTask::ResolveRoll { epoch, .. }
            | ScheduledTask::TimeoutWarning { epoch }
            | ScheduledTask::TimeoutExpired { epoch }
            | ScheduledTask::ForcedHomeExit { epoch, .. }
            | ScheduledTask::AutoEndTurn { epoch } => *epoch,
        }
    }
}

/// Ordered timer queue on a virtual millisecond clock
#[derive(Debug, Default)]
pub struct Scheduler {
    now_ms: u64,
    next_id: TimerId,
    /// Keyed by (due time, id) so ties run in scheduling order
    queue: BTreeMap<(u64, TimerId), ScheduledTask>,
    due_times: HashMap<TimerId, u64>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current clock value in milliseconds
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Queue `task` to run `delay` from now
    pub fn schedule(&mut self, delay: Duration, task: ScheduledTask) -> TimerId {
        let id = self.next_id;
        self.next_id += 1;
        let due = self.now_ms.saturating_add(delay.as_millis() as u64);
        self.queue.insert((due, id), task);
        self.due_times.insert(id, due);
        id
    }

    /// Cancel a pending task. Returns false if it already ran or was cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        match self.due_times.remove(&id) {
            Some(due) => self.queue.remove(&(due, id)).is_some(),
            None => false,
        }
    }

    /// Drop every pending task
    pub fn cancel_all(&mut self) {
        self.queue.clear();
        self.due_times.clear();
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.due_times.contains_key(&id)
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Pop the earliest task due at or before `until_ms`, moving the clock to
    /// its due time
    pub fn pop_due(&mut self, until_ms: u64) -> Option<(TimerId, ScheduledTask)> {
        let (&(due, id), _) = self.queue.iter().next()?;
        if due > until_ms {
            return None;
        }
        let task = self.queue.remove(&(due, id))?;
        self.due_times.remove(&id);
        self.now_ms = self.now_ms.max(due);
        Some((id, task))
    }

    /// Move the clock forward without dispatching anything
    pub fn advance_to(&mut self, until_ms: u64) {
        self.now_ms = self.now_ms.max(until_ms);
    }
}
