//! DAI endpoint: sources/sinks samples to/from the codec/DAI hardware ring.
//!
//! Same shape as [`super::host::Host`] — a component-owned ring the
//! platform layer's DMA drains or fills — minus the host's configurable
//! stop-on-xrun policy: a DAI is real hardware that keeps ticking
//! regardless, so a DAI-side xrun is always counted and papered over with
//! silence, never escalated to a hard error at the component level.

use bbx_core::AudioFormat;

use crate::{
    buffer::Buffer,
    component::{CopyStatus, PrepareStatus},
    error::Result,
    ids::{BufferId, ComponentId},
};

pub use super::host::Direction;

pub struct Dai {
    direction: Direction,
    ring: Buffer,
    period_frames: usize,
    xrun_count: u32,
    frames_processed: u64,
}

impl Dai {
    pub fn new(id: ComponentId, direction: Direction, ring_size_bytes: usize, format: AudioFormat, period_frames: usize) -> Self {
        let ring = Buffer::new(BufferId(u32::MAX / 2 - id.0), id, id, format, ring_size_bytes, false, true, true);
        Self {
            direction,
            ring,
            period_frames,
            xrun_count: 0,
            frames_processed: 0,
        }
    }

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
            Direction::Playback => self.drain_into_hardware(sources),
            Direction::Capture => self.fill_from_hardware(sinks),
        }
    }

    /// Playback: the DAI is the downstream-most component, pulling
    /// processed audio out of the pipeline and into the hardware ring.
    fn drain_into_hardware(&mut self, sources: &[&Buffer]) -> Result<CopyStatus> {
        let Some(source) = sources.first() else {
            return Ok(CopyStatus::Idle);
        };
        let frame_bytes = source.format().frame_bytes() as usize;
        let wanted = self.period_frames.min(self.ring.free_frames());
        let frames = source.available_frames().min(wanted);
        if frames < wanted {
            self.xrun_count += 1;
        }
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

    /// Capture: the DAI is the upstream-most component, feeding hardware
    /// samples into the pipeline.
    fn fill_from_hardware(&mut self, sinks: &[&Buffer]) -> Result<CopyStatus> {
        let Some(sink) = sinks.first() else {
            return Ok(CopyStatus::Idle);
        };
        let frame_bytes = self.ring.format().frame_bytes() as usize;
        let wanted = self.period_frames.min(sink.free_frames());
        let frames = self.ring.available_frames().min(wanted);
        if frames < wanted {
            self.xrun_count += 1;
        }
        let bytes = frames * frame_bytes;
        let mut staging = vec![0u8; bytes];
        if bytes > 0 {
            let rr = self.ring.read_reserve(bytes)?;
            self.ring.read_from(&rr, &mut staging);
            self.ring.read_commit(bytes);
        }
        let silence_frames = wanted - frames;
        staging.extend(std::iter::repeat(0u8).take(silence_frames * frame_bytes));

        let wr = sink.write_reserve(staging.len())?;
        sink.write_into(&wr, &staging);
        sink.write_commit(staging.len());

        self.frames_processed += frames as u64;
        if frames < wanted {
            Ok(CopyStatus::Underrun { frames: frames as u32 })
        } else {
            Ok(CopyStatus::Ok { frames: frames as u32 })
        }
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
    fn playback_drains_full_period_into_hardware_ring() {
        let mut dai = Dai::new(ComponentId(11), Direction::Playback, 768, fmt(), 48);
        let source = Buffer::new(BId(20), ComponentId(10), ComponentId(11), fmt(), 768, false, false, false);

        let period_bytes = fmt().period_bytes(48) as usize;
        let r = source.write_reserve(period_bytes).unwrap();
        source.write_into(&r, &vec![3u8; period_bytes]);
        source.write_commit(period_bytes);

        let status = dai.copy(&[&source], &[]).unwrap();
        assert_eq!(status, CopyStatus::Ok { frames: 48 });
        assert_eq!(dai.ring().available_frames(), 48);
    }
}
