//! Platform call failures (spec §4.G). Kept separate from
//! `bbx_engine::EngineError`/`bbx_ipc::IpcError`: a platform failure is a
//! hardware/mock-environment fact, not a graph or protocol one, and gets
//! its own taxonomy the callers translate as they see fit.

pub type Result<T> = core::result::Result<T, PlatformError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PlatformError {
    #[error("no DMA channel available")]
    ChannelUnavailable,
    #[error("DMA channel id is not currently owned")]
    UnknownChannel,
    #[error("DAI instance id is unknown")]
    UnknownDai,
    #[error("mailbox region is not configured")]
    RegionNotConfigured,
    #[error("platform call timed out")]
    Timeout,
    #[error("debug stream record is too big for its section")]
    DebugRecordTooBig,
    #[error("debug stream core section does not exist")]
    UnknownDebugSection,
}
