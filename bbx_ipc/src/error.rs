//! Unified IPC error taxonomy (spec §6 "Exit codes in replies", §7).
//!
//! Dialect 3 replies a POSIX-style errno; dialect 4 replies a richer
//! `ipc4_status` catalogue. Both map onto this one enum so the engine has
//! a single error type to build either wire reply from.

pub type Result<T> = core::result::Result<T, IpcError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum IpcError {
    #[error("out of memory")]
    OutOfMemory,
    #[error("resource busy")]
    Busy,
    #[error("invalid request")]
    InvalidRequest,
    #[error("invalid resource id")]
    InvalidResourceId,
    #[error("resource id already exists")]
    ResourceIdExists,
    #[error("invalid resource state for the requested operation")]
    InvalidResourceState,
    #[error("power transition failed")]
    PowerTransitionFailed,
    #[error("invalid manifest")]
    InvalidManifest,
    #[error("invalid module/component id")]
    ModInvalidId,
    #[error("invalid queue id")]
    QueueInvalidId,
    #[error("gateway error")]
    GatewayError,
    #[error("clock already running")]
    ClockAlreadyRunning,
    #[error("pipeline state not set")]
    PipelineStateNotSet,
    #[error("cross-core delegation timed out")]
    IdcTimeout,
    #[error("payload exceeds the mailbox and no page-table descriptor was supplied")]
    PayloadTooLarge,
}

impl IpcError {
    /// POSIX-style errno used by dialect 3 replies.
    pub fn posix_errno(self) -> i32 {
        match self {
            IpcError::OutOfMemory => -12,          // ENOMEM
            IpcError::Busy => -16,                 // EBUSY
            IpcError::InvalidRequest => -22,        // EINVAL
            IpcError::InvalidResourceId => -2,      // ENOENT
            IpcError::ResourceIdExists => -17,      // EEXIST
            IpcError::InvalidResourceState => -22,  // EINVAL
            IpcError::PowerTransitionFailed => -5,  // EIO
            IpcError::InvalidManifest => -22,       // EINVAL
            IpcError::ModInvalidId => -2,           // ENOENT
            IpcError::QueueInvalidId => -2,         // ENOENT
            IpcError::GatewayError => -5,           // EIO
            IpcError::ClockAlreadyRunning => -16,   // EBUSY
            IpcError::PipelineStateNotSet => -22,   // EINVAL
            IpcError::IdcTimeout => -110,           // ETIMEDOUT
            IpcError::PayloadTooLarge => -90,       // EMSGSIZE
        }
    }

    /// Dialect-4 `ipc4_status` catalogue code.
    pub fn ipc4_status(self) -> u32 {
        match self {
            IpcError::OutOfMemory => 4,
            IpcError::Busy => 5,
            IpcError::InvalidRequest => 6,
            IpcError::InvalidResourceId => 7,
            IpcError::ResourceIdExists => 8,
            IpcError::InvalidResourceState => 9,
            IpcError::PowerTransitionFailed => 10,
            IpcError::InvalidManifest => 11,
            IpcError::ModInvalidId => 12,
            IpcError::QueueInvalidId => 13,
            IpcError::GatewayError => 14,
            IpcError::ClockAlreadyRunning => 15,
            IpcError::PipelineStateNotSet => 16,
            IpcError::IdcTimeout => 17,
            IpcError::PayloadTooLarge => 18,
        }
    }
}

impl From<bbx_engine::EngineError> for IpcError {
    fn from(e: bbx_engine::EngineError) -> Self {
        use bbx_engine::EngineError::*;
        match e {
            InvalidConfiguration => IpcError::InvalidManifest,
            UnsupportedFormat(_) | FormatMismatch => IpcError::InvalidRequest,
            InvalidState => IpcError::InvalidResourceState,
            ResourceIdExists(_) => IpcError::ResourceIdExists,
            InvalidResourceId(_) => IpcError::InvalidResourceId,
            OutOfMemory => IpcError::OutOfMemory,
            NoFreeDma => IpcError::GatewayError,
            GraphContainsCycle(_) | PipelineIncomplete => IpcError::InvalidManifest,
            ReservationOutstanding | InsufficientSpace => IpcError::Busy,
            WrongCore => IpcError::InvalidRequest,
            UnsupportedAttribute(_) => IpcError::InvalidRequest,
        }
    }
}

impl From<bbx_idc::IdcError> for IpcError {
    fn from(_: bbx_idc::IdcError) -> Self {
        IpcError::IdcTimeout
    }
}
