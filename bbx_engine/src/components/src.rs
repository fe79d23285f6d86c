//! Sample-rate converter: black-box per §1 scope (resampling algorithms are
//! individual DSP algorithms, out of scope), kept as its own named kind
//! rather than folded into [`super::blackbox::BlackBox`] since the spec's
//! catalogue (§4.A REDESIGN notes) lists `Src` explicitly and a real
//! implementation would need the format-negotiation seam this struct
//! reserves (`prepare` is where a real SRC would pick its input/output
//! frame ratio).

use bbx_core::AudioFormat;

use crate::{
    buffer::Buffer,
    component::{CopyStatus, PrepareStatus},
    components::passthrough_frames,
    error::Result,
};

pub struct SampleRateConverter {
    format: Option<AudioFormat>,
}

impl SampleRateConverter {
    pub fn new() -> Self {
        Self { format: None }
    }

    pub(crate) fn prepare(&mut self, format: AudioFormat) -> Result<PrepareStatus> {
        // A real implementation negotiates a distinct output rate here and
        // sizes a polyphase filter's delay line; this placeholder passes
        // the input format straight through (1:1 ratio).
        self.format = Some(format);
        Ok(PrepareStatus::Ready)
    }

    pub(crate) fn copy(&mut self, sources: &[&Buffer], sinks: &[&Buffer]) -> Result<CopyStatus> {
        let (Some(source), Some(sink)) = (sources.first(), sinks.first()) else {
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

impl Default for SampleRateConverter {
    fn default() -> Self {
        Self::new()
    }
}
