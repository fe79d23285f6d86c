//! Error taxonomy for the component/buffer/pipeline engine.
//!
//! Mirrors §7 of the firmware spec: configuration, resource, and
//! state-machine errors are all recoverable and carry no side effects — the
//! object they were raised against is left exactly as it was before the
//! call. Runtime data errors (xrun) are never represented as `Err` here;
//! they are counted and reported as notifications by the caller.

pub type Result<T> = core::result::Result<T, EngineError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("invalid configuration for component (size, ABI version, or unsupported format)")]
    InvalidConfiguration,

    #[error("component {0:?} does not support the requested audio format")]
    UnsupportedFormat(crate::ComponentId),

    #[error("format mismatch between connected pins")]
    FormatMismatch,

    #[error("command is not legal in the component's current state")]
    InvalidState,

    #[error("resource id {0} already exists")]
    ResourceIdExists(u32),

    #[error("resource id {0} does not exist")]
    InvalidResourceId(u32),

    #[error("out of memory in the component-RAM zone")]
    OutOfMemory,

    #[error("no free DMA channel")]
    NoFreeDma,

    #[error("pipeline graph contains a cycle at component {0:?}")]
    GraphContainsCycle(crate::ComponentId),

    #[error("pipeline has no resolvable source/sink/scheduling component")]
    PipelineIncomplete,

    #[error("a reservation is already outstanding on this side of the buffer")]
    ReservationOutstanding,

    #[error("not enough data/space in buffer for the requested reservation")]
    InsufficientSpace,

    #[error("operation requires component to be on the local core")]
    WrongCore,

    #[error("component does not support attribute key {0:#x}")]
    UnsupportedAttribute(u32),
}
