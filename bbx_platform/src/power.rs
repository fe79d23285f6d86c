//! Power platform calls (spec §4.G): wake a secondary core, request a
//! core enter deep sleep.

use crate::error::Result;

pub trait PowerPlatform: Send + Sync {
    fn wake_core(&self, core: u32) -> Result<()>;

    fn sleep_core(&self, core: u32) -> Result<()>;
}
