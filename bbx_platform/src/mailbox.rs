//! Mailbox region read/write (spec §4.G): the raw platform-memory layer
//! underneath `bbx_ipc::Mailbox`'s staging buffer and the debug-stream
//! slot. Six named regions, each a fixed-size window into shared memory.

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MailboxRegion {
    DspBox,
    HostBox,
    Debug,
    Stream,
    Trace,
    Exception,
}

pub trait MailboxPlatform: Send + Sync {
    fn region_size(&self, region: MailboxRegion) -> usize;

    fn read(&self, region: MailboxRegion, offset: usize, len: usize) -> Result<Vec<u8>>;

    fn write(&self, region: MailboxRegion, offset: usize, bytes: &[u8]) -> Result<()>;
}
