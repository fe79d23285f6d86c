//! Scheduler error taxonomy (spec §7: cross-core errors are logged and
//! surfaced as a generic failure, never propagated onto the audio path).

pub type Result<T> = core::result::Result<T, SchedError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SchedError {
    #[error("task id already registered with this scheduler")]
    TaskIdExists,

    #[error("no task with that id is registered with this scheduler")]
    UnknownTask,

    #[error("task belongs to the wrong scheduler class for this call")]
    WrongClass,

    #[error("cross-core cancel did not acknowledge within IDC_TIMEOUT")]
    CancelTimeout,
}
