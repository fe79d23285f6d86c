//! Earliest-deadline-first scheduler: a single ready queue per core used
//! for IPC command processing, telemetry, DMA-trace flush, module-adapter
//! callbacks, and IDC-dispatched cross-core work (spec §4.D).
//!
//! Tasks may preempt one another *logically* (the next-deadline lookup
//! happens on every yield/completion/new-enqueue) but not physically: the
//! underlying implementation is cooperative, each task runs to completion.
//!
//! Deadlines are tracked against an internal monotonic clock rather than
//! `Instant::now()` directly, so the scheduler (and its tests) don't depend
//! on real wall-clock timing: [`EdfScheduler::advance`] moves the clock
//! forward explicitly, matching how the platform facade's timer tick would
//! drive it in production.

use std::{cmp::Ordering as CmpOrdering, collections::BinaryHeap, time::Duration};

use crate::{
    error::{Result, SchedError},
    ops::SchedulerOps,
    task::{SchedulerClass, Task, TaskId, TaskResult, TaskState},
};

struct ReadyEntry {
    id: TaskId,
    deadline: Duration,
    priority: u8,
}

impl PartialEq for ReadyEntry {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.priority == other.priority
    }
}
impl Eq for ReadyEntry {}

impl PartialOrd for ReadyEntry {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl Ord for ReadyEntry {
    /// `BinaryHeap` is a max-heap; we want earliest deadline first,
    /// priority breaking ties for coincident deadlines.
    fn cmp(&self, other: &Self) -> CmpOrdering {
        other.deadline.cmp(&self.deadline).then_with(|| self.priority.cmp(&other.priority))
    }
}

struct Entry {
    task: Task,
}

pub struct EdfScheduler {
    tasks: Vec<Entry>,
    ready: BinaryHeap<ReadyEntry>,
    now: Duration,
}

impl Default for EdfScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl EdfScheduler {
    pub fn new() -> Self {
        Self { tasks: Vec::new(), ready: BinaryHeap::new(), now: Duration::ZERO }
    }

    /// Move the scheduler's internal clock forward. Deadlines computed by
    /// [`Self::enqueue`] are relative to this clock.
    pub fn advance(&mut self, by: Duration) {
        self.now += by;
    }

    fn entry_mut(&mut self, id: TaskId) -> Result<&mut Entry> {
        self.tasks.iter_mut().find(|e| e.task.id() == id).ok_or(SchedError::UnknownTask)
    }

    fn entry(&self, id: TaskId) -> Option<&Entry> {
        self.tasks.iter().find(|e| e.task.id() == id)
    }

    /// Enqueue a task with a deadline `relative_deadline` from the
    /// scheduler's current clock (spec: "an EDF task has a declared
    /// deadline relative to enqueue time").
    pub fn enqueue(&mut self, id: TaskId, relative_deadline: Duration) -> Result<()> {
        let now = self.now;
        let entry = self.entry_mut(id)?;
        entry.task.set_state(TaskState::Queued);
        let priority = entry.task.priority();
        self.ready.push(ReadyEntry { id, deadline: now + relative_deadline, priority });
        Ok(())
    }

    /// Run every ready task to completion in deadline order, re-examining
    /// the ready set after each completion (the "logical preemption" the
    /// spec describes: a newly-enqueued, earlier-deadline task runs next).
    pub fn run_to_completion(&mut self) {
        while let Some(ReadyEntry { id, .. }) = self.ready.pop() {
            let Some(entry) = self.tasks.iter_mut().find(|e| e.task.id() == id) else {
                continue;
            };
            if entry.task.state() != TaskState::Queued {
                continue;
            }
            entry.task.set_state(TaskState::Running);
            let result = entry.task.run();
            match result {
                TaskResult::Ok => entry.task.set_state(TaskState::Completed),
                TaskResult::Cancel => entry.task.set_state(TaskState::Free),
            }
        }
    }
}

impl SchedulerOps for EdfScheduler {
    fn task_init(&mut self, task: Task) -> Result<()> {
        if task.class() != SchedulerClass::Edf {
            return Err(SchedError::WrongClass);
        }
        if self.entry(task.id()).is_some() {
            return Err(SchedError::TaskIdExists);
        }
        self.tasks.push(Entry { task });
        Ok(())
    }

    fn task_free(&mut self, id: TaskId) -> Result<()> {
        let before = self.tasks.len();
        self.tasks.retain(|e| e.task.id() != id);
        if self.tasks.len() == before {
            return Err(SchedError::UnknownTask);
        }
        Ok(())
    }

    fn schedule_task(&mut self, id: TaskId) -> Result<()> {
        // Default relative deadline for a bare `schedule_task` call (no
        // explicit deadline given): run it "now". Callers needing a
        // specific deadline should use `enqueue` directly.
        self.enqueue(id, Duration::ZERO)
    }

    fn reschedule_task(&mut self, id: TaskId) -> Result<()> {
        let deadline = self.entry(id).ok_or(SchedError::UnknownTask)?.task.budget();
        self.enqueue(id, deadline)
    }

    fn cancel_task(&mut self, id: TaskId) -> Result<()> {
        self.entry_mut(id)?.task.set_state(TaskState::Cancel);
        Ok(())
    }

    fn task_running(&self, id: TaskId) -> bool {
        self.entry(id).map(|e| e.task.state() == TaskState::Running).unwrap_or(false)
    }

    fn task_state(&self, id: TaskId) -> Option<TaskState> {
        self.entry(id).map(|e| e.task.state())
    }

    fn run(&mut self) {
        self.run_to_completion();
    }
}
