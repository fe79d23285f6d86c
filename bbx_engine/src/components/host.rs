//! Host endpoint: sources/sinks samples to/from the host's shared-memory
//! ring, per spec §4.A.
//!
//! The "host ring" a real target DMA-scatters host pages into is, in this
//! hosted implementation, just another [`Buffer`] — owned by the `Host`
//! component itself rather than threaded through the pipeline's internal
//! source/sink arrays, because unlike an inter-component buffer it has no
//! second component on its far side: the IPC/platform layer deposits or
//! drains it directly (standing in for the host's DMA engine). Call
//! [`Host::ring`] to reach it from outside the component.

use bbx_core::AudioFormat;

use crate::{
    buffer::Buffer,
    component::{CopyStatus, PrepareStatus},
    error::Result,
    ids::{BufferId, ComponentId},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Playback,
    Capture,
}

/// What happens when the host misses a deadline: `ReportAndContinue`
/// inserts silence and posts an xrun notification; `StopOnXrun` propagates
/// the xrun as a hard error for the pipeline to act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XrunPolicy {
    ReportAndContinue,
    StopOnXrun,
}

pub struct Host {
    direction: Direction,
    xrun_policy: XrunPolicy,
    ring: Buffer,
    period_frames: usize,
    xrun_count: u32,
    frames_processed: u64,
}

impl Host {
    pub fn new(
        id: ComponentId,
        direction: Direction,
        ring_size_bytes: usize,
        format: AudioFormat,
        period_frames: usize,
        xrun_policy: XrunPolicy,
    ) -> Self {
        // The ring's nominal producer/consumer ids are this component on
        // both ends: the real far side is the host, outside this arena.
        let ring = Buffer::new(BufferId(u32::MAX - id.0), id, id, format, ring_size_bytes, false, true, true);
        Self {
            direction,
            xrun_policy,
            ring,
            period_frames,
            xrun_count: 0,
            frames_processed: 0,
        }
    }

    /// The host-facing ring; the IPC layer deposits pages here (playback)
    /// or drains it (capture).
    pub fn ring(&self) -> &Buffer {
        &self.ring
    }

    pub fn xrun_count(&self) -> u32 {
        self.xrun_count
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    pub fn period_frames(&self) -> usize {
        self.period_frames
    }

    pub(crate) fn prepare(&mut self, _format: AudioFormat) -> Result<PrepareStatus> {
        Ok(PrepareStatus::Ready)
    }

    pub(crate) fn copy(&mut self, sources: &[&Buffer], sinks: &[&Buffer]) -> Result<CopyStatus> {
        match self.direction {
            Direction::Playback => self.copy_playback(sinks),
            Direction::Capture => self.copy_capture(sources),
        }
    }

    fn copy_playback(&mut self, sinks: &[&Buffer]) -> Result<CopyStatus> {
        let Some(sink) = sinks.first() else {
            return Ok(CopyStatus::Idle);
        };
        let frame_bytes = self.ring.format().frame_bytes() as usize;
        let wanted_frames = self.period_frames.min(sink.free_frames());
        if wanted_frames == 0 {
            return Ok(CopyStatus::Idle);
        }
        let available = self.ring.available_frames();
        let frames = available.min(wanted_frames);

        if frames < wanted_frames {
            self.xrun_count += 1;
            if self.xrun_policy == XrunPolicy::StopOnXrun {
                return Ok(CopyStatus::Underrun { frames: frames as u32 });
            }
        }

        let bytes = frames * frame_bytes;
        let mut staging = vec![0u8; bytes];
        if bytes > 0 {
            let rr = self.ring.read_reserve(bytes)?;
            self.ring.read_from(&rr, &mut staging);
            self.ring.read_commit(bytes);
        }

        // Pad the remainder of the period with silence so the sink always
        // receives a full period; missing frames were already counted above.
        let silence_frames = wanted_frames - frames;
        let mut out = staging;
        out.extend(std::iter::repeat(0u8).take(silence_frames * frame_bytes));

        let wr = sink.write_reserve(out.len())?;
        sink.write_into(&wr, &out);
        sink.write_commit(out.len());

        self.frames_processed += wanted_frames as u64;
        if frames < wanted_frames {
            Ok(CopyStatus::Underrun { frames: frames as u32 })
        } else {
            Ok(CopyStatus::Ok { frames: frames as u32 })
        }
    }

    fn copy_capture(&mut self, sources: &[&Buffer]) -> Result<CopyStatus> {
        let Some(source) = sources.first() else {
            return Ok(CopyStatus::Idle);
        };
        let frame_bytes = source.format().frame_bytes() as usize;
        let frames = source.available_frames().min(self.ring.free_frames());
        if frames == 0 {
            return Ok(CopyStatus::Idle);
        }
        let bytes = frames * frame_bytes;

        let rr = source.read_reserve(bytes)?;
        let mut staging = vec![0u8; bytes];
        source.read_from(&rr, &mut staging);
        source.read_commit(bytes);

        let wr = self.ring.write_reserve(bytes)?;
        self.ring.write_into(&wr, &staging);
        self.ring.write_commit(bytes);

        self.frames_processed += frames as u64;
        Ok(CopyStatus::Ok { frames: frames as u32 })
    }

    pub(crate) fn reset(&mut self) {
        self.xrun_count = 0;
        self.frames_processed = 0;
    }
}

#[cfg(test)]
mod tests {
    use bbx_core::FrameFormat;

    use super::*;
    use crate::ids::BufferId as BId;

    fn fmt() -> AudioFormat {
        AudioFormat::new(FrameFormat::S16Le, 48_000, 2, true)
    }

    #[test]
    fn playback_with_full_deposit_is_lossless() {
        let mut host = Host::new(ComponentId(10), Direction::Playback, 768, fmt(), 48, XrunPolicy::ReportAndContinue);
        let sink = Buffer::new(BId(20), ComponentId(10), ComponentId(11), fmt(), 768, false, false, false);

        let period_bytes = fmt().period_bytes(48) as usize;
        let r = host.ring().write_reserve(period_bytes).unwrap();
        let payload = vec![7u8; period_bytes];
        host.ring().write_into(&r, &payload);
        host.ring().write_commit(period_bytes);

        let status = host.copy(&[], &[&sink]).unwrap();
        assert_eq!(status, CopyStatus::Ok { frames: 48 });
        assert_eq!(host.xrun_count(), 0);
    }

    #[test]
    fn playback_without_deposit_reports_xrun_and_fills_silence() {
        let mut host = Host::new(ComponentId(10), Direction::Playback, 768, fmt(), 48, XrunPolicy::ReportAndContinue);
        let sink = Buffer::new(BId(20), ComponentId(10), ComponentId(11), fmt(), 768, false, false, false);

        let status = host.copy(&[], &[&sink]).unwrap();
        assert_eq!(status, CopyStatus::Underrun { frames: 0 });
        assert_eq!(host.xrun_count(), 1);

        let period_bytes = fmt().period_bytes(48) as usize;
        let rr = sink.read_reserve(period_bytes).unwrap();
        let mut out = vec![1u8; period_bytes];
        sink.read_from(&rr, &mut out);
        assert!(out.iter().all(|&b| b == 0), "sink must be filled with silence on xrun");
    }
}
