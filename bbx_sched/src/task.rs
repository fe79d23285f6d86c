//! Scheduler task: the unit of work both schedulers in a core run.
//!
//! Generalizes the reference firmware's function-pointer-plus-opaque-
//! argument task (`struct task` / `ops`) into a boxed closure, the same
//! closed-dispatch idiom `bbx_dsp::block::BlockType` uses for its per-kind
//! behaviour — here there is only one "kind" (a runnable unit), so the
//! closure itself is the dispatch target instead of an enum `match`.

use std::time::Duration;

/// Which scheduler a task is pinned to at creation. Tasks never migrate
/// between classes or cores (spec §5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerClass {
    LowLatency,
    Edf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Init,
    Queued,
    Pending,
    Running,
    Preempted,
    Completed,
    Free,
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub u32);

/// Outcome of one invocation of a task's function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskResult {
    /// Task did its work and should be rescheduled for its next period
    /// (low-latency) or is done until the next external enqueue (EDF).
    Ok,
    /// Task asked to be removed from the scheduler.
    Cancel,
}

/// A schedulable unit of work.
///
/// A low-latency task's function **must not block** (spec §4.D, §5):
/// the only blocking primitives in this core are IDC `send(BLOCKING)` and
/// the IPC page-table DMA fetch, and both only ever run from EDF-scheduled
/// IPC handling, never from a low-latency task.
pub struct Task {
    id: TaskId,
    class: SchedulerClass,
    priority: u8,
    state: TaskState,
    /// Low-latency: period. EDF: relative deadline from enqueue time.
    budget: Duration,
    /// DMA-multi-channel domain: which channel's completion this task is
    /// bound to. `None` for timer-domain and EDF tasks.
    channel: Option<u32>,
    func: Box<dyn FnMut() -> TaskResult + Send>,
}

impl Task {
    pub fn new<F>(id: TaskId, class: SchedulerClass, priority: u8, budget: Duration, func: F) -> Self
    where
        F: FnMut() -> TaskResult + Send + 'static,
    {
        Self {
            id,
            class,
            priority,
            state: TaskState::Init,
            budget,
            channel: None,
            func: Box::new(func),
        }
    }

    /// Bind this task to a DMA channel for a [`crate::domain::SchedulingDomain::DmaMultiChannel`] domain.
    pub fn with_channel(mut self, channel: u32) -> Self {
        self.channel = Some(channel);
        self
    }

    pub fn channel(&self) -> Option<u32> {
        self.channel
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn class(&self) -> SchedulerClass {
        self.class
    }

    pub fn priority(&self) -> u8 {
        self.priority
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    pub fn set_state(&mut self, state: TaskState) {
        self.state = state;
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    pub(crate) fn run(&mut self) -> TaskResult {
        (self.func)()
    }
}
