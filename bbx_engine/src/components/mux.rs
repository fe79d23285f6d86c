//! Mux component: routes one of N selectable sources to a single sink.
//!
//! Grounded on `ChannelRouterBlock`'s mode-selected routing, generalized
//! from a fixed stereo L/R selector to an arbitrary source index picked at
//! runtime via [`set_attribute`](Mux::set_active_source).

use bbx_core::AudioFormat;

use crate::{
    buffer::Buffer,
    component::{CopyStatus, PrepareStatus},
    components::passthrough_frames,
    error::Result,
};

pub struct Mux {
    active: usize,
    format: Option<AudioFormat>,
}

impl Mux {
    pub fn new() -> Self {
        Self { active: 0, format: None }
    }

    pub fn set_active_source(&mut self, index: usize) {
        self.active = index;
    }

    pub fn active_source(&self) -> usize {
        self.active
    }

    pub(crate) fn prepare(&mut self, format: AudioFormat) -> Result<PrepareStatus> {
        if self.format == Some(format) {
            return Ok(PrepareStatus::Ready);
        }
        self.format = Some(format);
        Ok(PrepareStatus::Ready)
    }

    pub(crate) fn copy(&mut self, sources: &[&Buffer], sinks: &[&Buffer]) -> Result<CopyStatus> {
        let (Some(source), Some(sink)) = (sources.get(self.active), sinks.first()) else {
            return Ok(CopyStatus::Idle);
        };
        let frames = passthrough_frames(source, sink)?;
        if frames == 0 {
            Ok(CopyStatus::Idle)
        } else {
            Ok(CopyStatus::Ok { frames })
        }
    }

    pub(crate) fn reset(&mut self) {}
}

impl Default for Mux {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use bbx_core::FrameFormat;

    use super::*;
    use crate::ids::{BufferId, ComponentId};

    fn fmt() -> AudioFormat {
        AudioFormat::new(FrameFormat::S16Le, 48_000, 1, true)
    }

    #[test]
    fn routes_the_active_source_only() {
        let mut mux = Mux::new();
        mux.prepare(fmt()).unwrap();
        mux.set_active_source(1);

        let a = Buffer::new(BufferId(1), ComponentId(1), ComponentId(3), fmt(), 64, false, false, false);
        let b = Buffer::new(BufferId(2), ComponentId(2), ComponentId(3), fmt(), 64, false, false, false);
        let sink = Buffer::new(BufferId(3), ComponentId(3), ComponentId(4), fmt(), 64, false, false, false);

        let ra = a.write_reserve(2).unwrap();
        a.write_into(&ra, &111i16.to_le_bytes());
        a.write_commit(2);

        let rb = b.write_reserve(2).unwrap();
        b.write_into(&rb, &222i16.to_le_bytes());
        b.write_commit(2);

        mux.copy(&[&a, &b], &[&sink]).unwrap();

        let rr = sink.read_reserve(2).unwrap();
        let mut out = [0u8; 2];
        sink.read_from(&rr, &mut out);
        assert_eq!(i16::from_le_bytes(out), 222);
    }
}
