use std::cmp::Reverse;
use std::collections::BinaryHeap;

use log::debug;
use serde::Serialize;

use crate::engine::reconcile::Delays;

/// Length of one element transition.
pub const TRANSITION_MS: u64 = 1000;
pub const REORDER_SETTLE_MS: u64 = 2500;
pub const LARGE_REORDER_SETTLE_MS: u64 = 250;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Idle,
    Exiting,
    Entering,
    Settled,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TransitionTask {
    Exit { generation: u64 },
    Update { generation: u64 },
    Enter { generation: u64 },
    Settle { generation: u64 },
    ClearRunning,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TransitionEvent {
    ExitStarted { at_ms: u64, generation: u64 },
    UpdateStarted { at_ms: u64, generation: u64 },
    EnterStarted { at_ms: u64, generation: u64 },
    Settled { at_ms: u64, generation: u64 },
    RunningCleared { at_ms: u64 },
}

/// Timer queue the transition machine schedules its phases on.
pub trait Scheduler {
    fn now_ms(&self) -> u64;

    fn schedule(&mut self, delay_ms: u64, task: TransitionTask);

    /// Removes the earliest task due at or before `until_ms` and moves the
    /// clock to its due time.
    fn pop_due(&mut self, until_ms: u64) -> Option<(u64, TransitionTask)>;

    /// Moves the clock forward; never backwards.
    fn advance(&mut self, to_ms: u64);

    fn pending(&self) -> usize;
}

/// Virtual-clock [`Scheduler`]; tasks due at the same time run in the order
/// they were scheduled.
#[derive(Clone, Debug, Default)]
pub struct TaskQueue {
    now_ms: u64,
    sequence: u64,
    heap: BinaryHeap<Reverse<(u64, u64, TransitionTask)>>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Scheduler for TaskQueue {
    fn now_ms(&self) -> u64 {
        self.now_ms
    }

    fn schedule(&mut self, delay_ms: u64, task: TransitionTask) {
        let due = self.now_ms.saturating_add(delay_ms);
        self.heap.push(Reverse((due, self.sequence, task)));
        self.sequence += 1;
    }

    fn pop_due(&mut self, until_ms: u64) -> Option<(u64, TransitionTask)> {
        let Reverse((due, _, _)) = self.heap.peek()?;
        if *due > until_ms {
            return None;
        }
        let Reverse((due, _, task)) = self.heap.pop()?;
        self.now_ms = self.now_ms.max(due);
        Some((due, task))
    }

    fn advance(&mut self, to_ms: u64) {
        self.now_ms = self.now_ms.max(to_ms);
    }

    fn pending(&self) -> usize {
        self.heap.len()
    }
}

/// Staged phases of a reconciliation or reorder, guarded by one running flag.
///
/// Nothing is cancelled: a new transition bumps the generation and schedules
/// fresh timers, while older timers still fire. Stale phase timers only
/// produce events; stale clear timers still clear the flag.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransitionMachine {
    phase: Phase,
    running: bool,
    animate: bool,
    generation: u64,
}

impl TransitionMachine {
    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Whether the latest transition tweens; large matrices jump straight to the end.
    pub fn animates(&self) -> bool {
        self.animate
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn start_reconcile(&mut self, delays: Delays, scheduler: &mut impl Scheduler) -> u64 {
        let generation = self.begin(delays.animate);
        let settle_ms = if delays.animate {
            delays.enter_ms + TRANSITION_MS
        } else {
            0
        };

        scheduler.schedule(0, TransitionTask::Exit { generation });
        scheduler.schedule(delays.exit_ms, TransitionTask::Update { generation });
        scheduler.schedule(delays.enter_ms, TransitionTask::Enter { generation });
        scheduler.schedule(settle_ms, TransitionTask::Settle { generation });
        scheduler.schedule(settle_ms, TransitionTask::ClearRunning);

        debug!(
            "transition {generation}: exit {}ms, enter {}ms, settle {settle_ms}ms",
            delays.exit_ms, delays.enter_ms
        );
        generation
    }

    /// Tiles move in place; the flag clears after `settle_ms`.
    pub fn start_reorder(&mut self, settle_ms: u64, animate: bool, scheduler: &mut impl Scheduler) -> u64 {
        let generation = self.begin(animate);
        self.phase = Phase::Entering;
        scheduler.schedule(0, TransitionTask::Update { generation });
        scheduler.schedule(settle_ms, TransitionTask::Settle { generation });
        scheduler.schedule(settle_ms, TransitionTask::ClearRunning);
        debug!("reorder {generation}: settle {settle_ms}ms");
        generation
    }

    fn begin(&mut self, animate: bool) -> u64 {
        self.generation += 1;
        self.running = true;
        self.animate = animate;
        self.phase = Phase::Exiting;
        self.generation
    }

    fn current(&self, generation: u64) -> bool {
        generation == self.generation
    }

    pub fn fire(&mut self, at_ms: u64, task: TransitionTask) -> TransitionEvent {
        match task {
            TransitionTask::Exit { generation } => {
                if self.current(generation) {
                    self.phase = Phase::Exiting;
                }
                TransitionEvent::ExitStarted { at_ms, generation }
            }
            TransitionTask::Update { generation } => {
                TransitionEvent::UpdateStarted { at_ms, generation }
            }
            TransitionTask::Enter { generation } => {
                if self.current(generation) {
                    self.phase = Phase::Entering;
                }
                TransitionEvent::EnterStarted { at_ms, generation }
            }
            TransitionTask::Settle { generation } => {
                if self.current(generation) {
                    self.phase = Phase::Settled;
                }
                TransitionEvent::Settled { at_ms, generation }
            }
            TransitionTask::ClearRunning => {
                self.running = false;
                TransitionEvent::RunningCleared { at_ms }
            }
        }
    }

    /// Fires every task due by `now_ms`, in time order.
    pub fn advance_to(&mut self, now_ms: u64, scheduler: &mut impl Scheduler) -> Vec<TransitionEvent> {
        let mut events = Vec::new();
        while let Some((due, task)) = scheduler.pop_due(now_ms) {
            events.push(self.fire(due, task));
        }
        scheduler.advance(now_ms);
        events
    }
}
