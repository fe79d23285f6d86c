//! DAI platform calls (spec §4.G): start/stop/configure/get-position per
//! DAI instance.

use bbx_core::AudioFormat;

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DaiId(pub u32);

pub trait DaiPlatform: Send + Sync {
    fn start(&self, dai: DaiId) -> Result<()>;

    fn stop(&self, dai: DaiId) -> Result<()>;

    fn configure(&self, dai: DaiId, format: AudioFormat) -> Result<()>;

    /// Hardware frame position since `start`, platform-defined units.
    fn position(&self, dai: DaiId) -> Result<u64>;
}
