//! Common ops interface both schedulers implement (spec §4.D: "both
//! implementing a common ops interface: `task_init`, `task_free`,
//! `schedule_task`, `reschedule_task`, `cancel_task`, `task_running`,
//! `task_complete`, `run`").
//!
//! Generalizes the reference firmware's per-scheduler-class `struct
//! scheduler_ops` function-pointer table into a trait, the same
//! redesign the engine crate applies to `struct comp_driver` (see
//! `bbx_engine::component::ComponentKind`).

use crate::{
    error::Result,
    task::{Task, TaskId, TaskState},
};

pub trait SchedulerOps {
    /// Register a task with this scheduler. Does not make it runnable.
    fn task_init(&mut self, task: Task) -> Result<()>;

    /// Remove a task and invoke its owning core's free hook.
    fn task_free(&mut self, id: TaskId) -> Result<()>;

    /// Make a registered task runnable.
    fn schedule_task(&mut self, id: TaskId) -> Result<()>;

    /// Re-arm a task that already ran (low-latency: for its next period;
    /// EDF: not used directly, callers re-enqueue with a fresh deadline).
    fn reschedule_task(&mut self, id: TaskId) -> Result<()>;

    /// Cancel a task. Synchronous on the owning core (spec §4.D); the
    /// cross-core asynchronous path is layered on top by the caller via IDC.
    fn cancel_task(&mut self, id: TaskId) -> Result<()>;

    fn task_running(&self, id: TaskId) -> bool;

    fn task_state(&self, id: TaskId) -> Option<TaskState>;

    /// Invoked once a task's function has returned and its state has been
    /// moved to `Completed`; the default no-op is sufficient for EDF
    /// one-shot work, low-latency tasks override to re-arm for next period.
    fn task_complete(&mut self, _id: TaskId) -> Result<()> {
        Ok(())
    }

    /// Drive one scheduling pass. Low-latency: one tick. EDF: drain the
    /// ready queue in deadline order.
    fn run(&mut self);
}
