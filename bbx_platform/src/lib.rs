//! Platform facade: the thin seam between the audio DSP core and the
//! hardware it runs on (spec §4.G) — timer, DMA, DAI, cache maintenance,
//! mailbox regions, a fixed-width log sink, and per-core power control.
//! `bbx_fw::CoreRuntime` is generic over these traits; [`MockPlatform`]
//! is the one concrete implementation this workspace ships, for tests
//! and the demo firmware binary.

pub mod cache;
pub mod dai;
pub mod debug_stream;
pub mod dma;
pub mod error;
pub mod log_sink;
pub mod mailbox;
pub mod mock;
pub mod power;
pub mod timer;

pub use cache::CachePlatform;
pub use dai::{DaiId, DaiPlatform};
pub use debug_stream::{DebugStreamSlot, SectionDescriptor, MAGIC as DEBUG_STREAM_MAGIC};
pub use dma::{DmaChannelId, DmaDirection, DmaPlatform, DmaSegment, DmaStatus};
pub use error::{PlatformError, Result};
pub use log_sink::LogSink;
pub use mailbox::{MailboxPlatform, MailboxRegion};
pub use mock::MockPlatform;
pub use power::PowerPlatform;
pub use timer::TimerPlatform;
