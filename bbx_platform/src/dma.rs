//! DMA platform calls (spec §4.G): request/configure/start/stop/status/
//! release a channel, plus the blocking `request_copy` used by the IPC
//! large-payload path (spec §4.E).

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DmaChannelId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DmaDirection {
    MemToDev,
    DevToMem,
    MemToMem,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DmaStatus {
    Idle,
    Running,
    Stopped,
}

/// One segment of a scatter-gather list: byte offset and length within
/// the channel's configured address space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DmaSegment {
    pub offset: usize,
    pub len: usize,
}

pub trait DmaPlatform: Send + Sync {
    fn request_channel(&self, direction: DmaDirection, device: u32) -> Result<DmaChannelId>;

    fn configure_scatter_gather(&self, channel: DmaChannelId, segments: &[DmaSegment]) -> Result<()>;

    fn start(&self, channel: DmaChannelId) -> Result<()>;

    fn stop(&self, channel: DmaChannelId) -> Result<()>;

    fn status(&self, channel: DmaChannelId) -> Result<DmaStatus>;

    fn release(&self, channel: DmaChannelId) -> Result<()>;

    /// Blocking copy (spec §4.G "DMA copy is blocking"). Used on the
    /// control path only, e.g. the IPC page-table large-payload fetch.
    fn request_copy(&self, channel: DmaChannelId, src: &[u8], dst: &mut [u8]) -> Result<()>;
}
