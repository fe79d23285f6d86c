//! A single in-memory implementation of every platform trait, for host
//! tests and the demo firmware binary's `--platform mock` mode (spec §4.G,
//! SPEC_FULL's `bbx_daisy`-style "mock impl for host testing").
//!
//! Everything here is a plain `Mutex`-guarded in-memory stand-in: DMA
//! channels just remember their configuration and copy bytes directly,
//! DAIs loop samples back to a small queue, mailboxes are `Vec<u8>`
//! windows. None of it is fast or realistic; it exists so the rest of
//! the crate can be exercised without real hardware.

use std::{
    collections::HashMap,
    sync::atomic::{AtomicU32, AtomicU64, Ordering},
    time::Duration,
};

use bbx_core::AudioFormat;
use parking_lot::Mutex;

use crate::{
    cache::CachePlatform,
    dai::{DaiId, DaiPlatform},
    dma::{DmaChannelId, DmaDirection, DmaPlatform, DmaSegment, DmaStatus},
    error::{PlatformError, Result},
    log_sink::LogSink,
    mailbox::{MailboxPlatform, MailboxRegion},
    power::PowerPlatform,
    timer::TimerPlatform,
};

const DEFAULT_MAILBOX_SIZE: usize = 4096;

struct DmaChannelState {
    direction: DmaDirection,
    device: u32,
    status: DmaStatus,
}

#[derive(Default)]
struct DaiState {
    format: Option<AudioFormat>,
    running: bool,
    position: u64,
}

pub struct MockPlatform {
    tick: AtomicU64,
    timer_period: Mutex<Option<Duration>>,
    deadline: Mutex<Option<Duration>>,
    next_channel: AtomicU32,
    dma_channels: Mutex<HashMap<DmaChannelId, DmaChannelState>>,
    dai_state: Mutex<HashMap<DaiId, DaiState>>,
    mailboxes: Mutex<HashMap<MailboxRegion, Vec<u8>>>,
    core_power: Mutex<HashMap<u32, bool>>,
}

impl Default for MockPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPlatform {
    pub fn new() -> Self {
        let mut mailboxes = HashMap::new();
        for region in [
            MailboxRegion::DspBox,
            MailboxRegion::HostBox,
            MailboxRegion::Debug,
            MailboxRegion::Stream,
            MailboxRegion::Trace,
            MailboxRegion::Exception,
        ] {
            mailboxes.insert(region, vec![0u8; DEFAULT_MAILBOX_SIZE]);
        }
        Self {
            tick: AtomicU64::new(0),
            timer_period: Mutex::new(None),
            deadline: Mutex::new(None),
            next_channel: AtomicU32::new(0),
            dma_channels: Mutex::new(HashMap::new()),
            dai_state: Mutex::new(HashMap::new()),
            mailboxes: Mutex::new(mailboxes),
            core_power: Mutex::new(HashMap::new()),
        }
    }

    /// Advance the mock tick counter. Test-only knob: real hardware
    /// drives `read_tick` from a free-running counter, this lets tests
    /// control it deterministically.
    pub fn advance_tick(&self, by: u64) {
        self.tick.fetch_add(by, Ordering::SeqCst);
    }

    pub fn is_core_awake(&self, core: u32) -> bool {
        *self.core_power.lock().get(&core).unwrap_or(&(core == 0))
    }
}

impl TimerPlatform for MockPlatform {
    fn start(&self, period: Duration) {
        *self.timer_period.lock() = Some(period);
    }

    fn stop(&self) {
        *self.timer_period.lock() = None;
    }

    fn set_deadline(&self, at: Duration) {
        *self.deadline.lock() = Some(at);
    }

    fn read_tick(&self) -> u64 {
        self.tick.load(Ordering::SeqCst)
    }
}

impl DmaPlatform for MockPlatform {
    fn request_channel(&self, direction: DmaDirection, device: u32) -> Result<DmaChannelId> {
        let id = DmaChannelId(self.next_channel.fetch_add(1, Ordering::SeqCst));
        self.dma_channels.lock().insert(id, DmaChannelState { direction, device, status: DmaStatus::Idle });
        Ok(id)
    }

    fn configure_scatter_gather(&self, channel: DmaChannelId, _segments: &[DmaSegment]) -> Result<()> {
        self.dma_channels.lock().get(&channel).map(|_| ()).ok_or(PlatformError::UnknownChannel)
    }

    fn start(&self, channel: DmaChannelId) -> Result<()> {
        let mut channels = self.dma_channels.lock();
        let state = channels.get_mut(&channel).ok_or(PlatformError::UnknownChannel)?;
        state.status = DmaStatus::Running;
        Ok(())
    }

    fn stop(&self, channel: DmaChannelId) -> Result<()> {
        let mut channels = self.dma_channels.lock();
        let state = channels.get_mut(&channel).ok_or(PlatformError::UnknownChannel)?;
        state.status = DmaStatus::Stopped;
        Ok(())
    }

    fn status(&self, channel: DmaChannelId) -> Result<DmaStatus> {
        self.dma_channels.lock().get(&channel).map(|s| s.status).ok_or(PlatformError::UnknownChannel)
    }

    fn release(&self, channel: DmaChannelId) -> Result<()> {
        self.dma_channels.lock().remove(&channel).map(|_| ()).ok_or(PlatformError::UnknownChannel)
    }

    fn request_copy(&self, channel: DmaChannelId, src: &[u8], dst: &mut [u8]) -> Result<()> {
        if !self.dma_channels.lock().contains_key(&channel) {
            return Err(PlatformError::UnknownChannel);
        }
        let n = src.len().min(dst.len());
        dst[..n].copy_from_slice(&src[..n]);
        Ok(())
    }
}

impl DaiPlatform for MockPlatform {
    fn start(&self, dai: DaiId) -> Result<()> {
        self.dai_state.lock().get_mut(&dai).ok_or(PlatformError::UnknownDai)?.running = true;
        Ok(())
    }

    fn stop(&self, dai: DaiId) -> Result<()> {
        self.dai_state.lock().get_mut(&dai).ok_or(PlatformError::UnknownDai)?.running = false;
        Ok(())
    }

    /// The only call that brings a DAI instance into existence; start/stop/
    /// position against an unconfigured id are rejected.
    fn configure(&self, dai: DaiId, format: AudioFormat) -> Result<()> {
        self.dai_state.lock().entry(dai).or_default().format = Some(format);
        Ok(())
    }

    fn position(&self, dai: DaiId) -> Result<u64> {
        self.dai_state.lock().get(&dai).map(|s| s.position).ok_or(PlatformError::UnknownDai)
    }
}

impl CachePlatform for MockPlatform {
    fn flush_range(&self, addr_hint: usize, len: usize) {
        log::trace!("mock cache flush 0x{addr_hint:x}..+{len}");
    }

    fn invalidate_range(&self, addr_hint: usize, len: usize) {
        log::trace!("mock cache invalidate 0x{addr_hint:x}..+{len}");
    }
}

impl MailboxPlatform for MockPlatform {
    fn region_size(&self, region: MailboxRegion) -> usize {
        self.mailboxes.lock().get(&region).map(Vec::len).unwrap_or(0)
    }

    fn read(&self, region: MailboxRegion, offset: usize, len: usize) -> Result<Vec<u8>> {
        let mailboxes = self.mailboxes.lock();
        let bytes = mailboxes.get(&region).ok_or(PlatformError::RegionNotConfigured)?;
        if offset + len > bytes.len() {
            return Err(PlatformError::RegionNotConfigured);
        }
        Ok(bytes[offset..offset + len].to_vec())
    }

    fn write(&self, region: MailboxRegion, offset: usize, data: &[u8]) -> Result<()> {
        let mut mailboxes = self.mailboxes.lock();
        let bytes = mailboxes.get_mut(&region).ok_or(PlatformError::RegionNotConfigured)?;
        if offset + data.len() > bytes.len() {
            return Err(PlatformError::RegionNotConfigured);
        }
        bytes[offset..offset + data.len()].copy_from_slice(data);
        Ok(())
    }
}

impl LogSink for MockPlatform {
    fn emit(&self, level: log::Level, class: u32, params: [u32; 4]) {
        log::log!(level, "platform record class={class} params={params:?}");
    }
}

impl PowerPlatform for MockPlatform {
    fn wake_core(&self, core: u32) -> Result<()> {
        self.core_power.lock().insert(core, true);
        Ok(())
    }

    fn sleep_core(&self, core: u32) -> Result<()> {
        self.core_power.lock().insert(core, false);
        Ok(())
    }
}
