//! The low-latency scheduler: cooperative, non-preemptive across its own
//! tasks on a core, driven by a timer or DMA-multi-channel domain (spec §4.D).
//!
//! A tick is "delivered" by the platform interrupt handler calling
//! [`LowLatencyScheduler::tick`] with the set of DMA channels that
//! completed this interrupt (empty/ignored for a timer domain). Missed
//! ticks — the domain fires again while a task from the previous tick is
//! still `Running` — are detected and counted as pipeline delay, never
//! recovered (spec §4.D "Missed ticks").

use std::time::{Duration, Instant};

use crate::{
    domain::SchedulingDomain,
    error::{Result, SchedError},
    ops::SchedulerOps,
    task::{SchedulerClass, Task, TaskId, TaskResult, TaskState},
};

struct Slot {
    task: Task,
    /// Cycles (approximated here by wall-clock) budget-overrun counter.
    overruns: u32,
    /// Ticks dropped because the task was still running when the domain
    /// fired again.
    dropped_ticks: u32,
}

pub struct LowLatencyScheduler {
    domain: SchedulingDomain,
    slots: Vec<Slot>,
}

impl LowLatencyScheduler {
    pub fn new(domain: SchedulingDomain) -> Self {
        Self { domain, slots: Vec::new() }
    }

    pub fn period(&self) -> Duration {
        self.domain.period()
    }

    fn slot_mut(&mut self, id: TaskId) -> Result<&mut Slot> {
        self.slots.iter_mut().find(|s| s.task.id() == id).ok_or(SchedError::UnknownTask)
    }

    fn slot(&self, id: TaskId) -> Option<&Slot> {
        self.slots.iter().find(|s| s.task.id() == id)
    }

    pub fn overrun_count(&self, id: TaskId) -> u32 {
        self.slot(id).map(|s| s.overruns).unwrap_or(0)
    }

    pub fn dropped_tick_count(&self, id: TaskId) -> u32 {
        self.slot(id).map(|s| s.dropped_ticks).unwrap_or(0)
    }

    /// Run all tasks bound to the channels that fired this interrupt
    /// (ignored for a timer domain, where every queued task fires), in
    /// priority order (higher priority value first), measuring elapsed
    /// time against each task's declared period.
    pub fn tick(&mut self, fired_channels: &[u32]) {
        let mut ready: Vec<usize> = self
            .slots
            .iter()
            .enumerate()
            .filter(|(_, s)| {
                matches!(s.task.state(), TaskState::Queued | TaskState::Pending) && self.domain.channel_ready(fired_channels, s.task.channel())
            })
            .map(|(i, _)| i)
            .collect();
        ready.sort_by(|&a, &b| self.slots[b].task.priority().cmp(&self.slots[a].task.priority()));

        for idx in ready {
            let slot = &mut self.slots[idx];
            if slot.task.state() == TaskState::Running {
                slot.dropped_ticks += 1;
                log::warn!("low-latency task {:?} missed tick: still running", slot.task.id());
                continue;
            }

            slot.task.set_state(TaskState::Running);
            let period = slot.task.budget();
            let start = Instant::now();
            let result = slot.task.run();
            let elapsed = start.elapsed();

            if elapsed > period {
                slot.overruns += 1;
                log::warn!("low-latency task {:?} budget overrun: {:?} > {:?}", slot.task.id(), elapsed, period);
            }

            match result {
                TaskResult::Ok => slot.task.set_state(TaskState::Queued),
                TaskResult::Cancel => slot.task.set_state(TaskState::Free),
            }
        }
    }
}

impl SchedulerOps for LowLatencyScheduler {
    fn task_init(&mut self, task: Task) -> Result<()> {
        if task.class() != SchedulerClass::LowLatency {
            return Err(SchedError::WrongClass);
        }
        if self.slot(task.id()).is_some() {
            return Err(SchedError::TaskIdExists);
        }
        self.slots.push(Slot { task, overruns: 0, dropped_ticks: 0 });
        Ok(())
    }

    fn task_free(&mut self, id: TaskId) -> Result<()> {
        let before = self.slots.len();
        self.slots.retain(|s| s.task.id() != id);
        if self.slots.len() == before {
            return Err(SchedError::UnknownTask);
        }
        Ok(())
    }

    fn schedule_task(&mut self, id: TaskId) -> Result<()> {
        self.slot_mut(id)?.task.set_state(TaskState::Queued);
        Ok(())
    }

    fn reschedule_task(&mut self, id: TaskId) -> Result<()> {
        self.schedule_task(id)
    }

    fn cancel_task(&mut self, id: TaskId) -> Result<()> {
        self.slot_mut(id)?.task.set_state(TaskState::Cancel);
        Ok(())
    }

    fn task_running(&self, id: TaskId) -> bool {
        self.slot(id).map(|s| s.task.state() == TaskState::Running).unwrap_or(false)
    }

    fn task_state(&self, id: TaskId) -> Option<TaskState> {
        self.slot(id).map(|s| s.task.state())
    }

    fn run(&mut self) {
        self.tick(&[]);
    }
}
