//! # BBX Sched
//!
//! The two cooperating per-core schedulers (spec module D): the
//! low-latency scheduler driving audio pipelines off a timer or DMA-tick
//! domain, and the earliest-deadline-first scheduler driving control-plane
//! work (IPC, telemetry, IDC-dispatched items). Both share the
//! [`ops::SchedulerOps`] interface; neither migrates tasks between cores
//! or between scheduler classes once created.

pub mod domain;
pub mod edf;
pub mod error;
pub mod low_latency;
pub mod ops;
pub mod task;

pub use domain::SchedulingDomain;
pub use edf::EdfScheduler;
pub use error::{Result, SchedError};
pub use low_latency::LowLatencyScheduler;
pub use ops::SchedulerOps;
pub use task::{SchedulerClass, Task, TaskId, TaskResult, TaskState};
