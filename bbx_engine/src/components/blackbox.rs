//! Black-box passthrough for every component kind whose defining behaviour
//! is a specific DSP algorithm out of this crate's scope (§1): EQ (FIR/IIR),
//! DRC, tone generation, smart-amp protection, crossover, beamforming
//! (TDFB), MFCC feature extraction, acoustic echo cancellation, the
//! keyword-phrase buffer, keyword detection, and the generic pipeline
//! endpoint marker.
//!
//! Each still participates correctly in the state machine, buffer contract
//! and scheduling — only the sample math is elided, in the spirit of the
//! reference tree's own `*_mock.c` bench scaffolding for these algorithms
//! (see spec Open Questions).

use bbx_core::AudioFormat;

use crate::{
    buffer::Buffer,
    component::{CopyStatus, PrepareStatus},
    components::passthrough_frames,
    error::Result,
};

/// The specific algorithm this instance stands in for. Carried only for
/// logging/diagnostics — behaviourally every variant is identical.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    EqFir,
    EqIir,
    Drc,
    Tone,
    SmartAmp,
    Crossover,
    Tdfb,
    Mfcc,
    Aec,
    Kpb,
    KwdDetect,
    PipelineEndpoint,
}

impl Algorithm {
    pub const fn name(self) -> &'static str {
        match self {
            Algorithm::EqFir => "eq-fir",
            Algorithm::EqIir => "eq-iir",
            Algorithm::Drc => "drc",
            Algorithm::Tone => "tone",
            Algorithm::SmartAmp => "smart-amp",
            Algorithm::Crossover => "crossover",
            Algorithm::Tdfb => "tdfb",
            Algorithm::Mfcc => "mfcc",
            Algorithm::Aec => "aec",
            Algorithm::Kpb => "kpb",
            Algorithm::KwdDetect => "kwd-detect",
            Algorithm::PipelineEndpoint => "pipeline-endpoint",
        }
    }
}

pub struct BlackBox {
    algorithm: Algorithm,
    format: Option<AudioFormat>,
    /// Opaque config blob set via `set_attribute`'s large-payload path (spec
    /// §4.A `set_attribute`, §4.E large payloads: "EQ coefficient blob").
    /// The algorithm itself is out of scope, so this is stored, not parsed.
    config_blob: Vec<u8>,
}

impl BlackBox {
    pub fn new(algorithm: Algorithm) -> Self {
        Self { algorithm, format: None, config_blob: Vec::new() }
    }

    pub fn algorithm_name(&self) -> &'static str {
        self.algorithm.name()
    }

    pub fn set_config_blob(&mut self, blob: Vec<u8>) {
        self.config_blob = blob;
    }

    pub fn config_blob(&self) -> &[u8] {
        &self.config_blob
    }

    pub(crate) fn prepare(&mut self, format: AudioFormat) -> Result<PrepareStatus> {
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

#[cfg(test)]
mod tests {
    use bbx_core::FrameFormat;

    use super::*;
    use crate::ids::{BufferId, ComponentId};

    #[test]
    fn passthrough_is_lossless() {
        let fmt = AudioFormat::new(FrameFormat::S16Le, 16_000, 1, true);
        let mut bb = BlackBox::new(Algorithm::Aec);
        bb.prepare(fmt).unwrap();

        let src = Buffer::new(BufferId(1), ComponentId(1), ComponentId(2), fmt, 64, false, false, false);
        let sink = Buffer::new(BufferId(2), ComponentId(2), ComponentId(3), fmt, 64, false, false, false);

        let r = src.write_reserve(4).unwrap();
        src.write_into(&r, &[1, 2, 3, 4]);
        src.write_commit(4);

        bb.copy(&[&src], &[&sink]).unwrap();

        let rr = sink.read_reserve(4).unwrap();
        let mut out = [0u8; 4];
        sink.read_from(&rr, &mut out);
        assert_eq!(out, [1, 2, 3, 4]);
    }

    #[test]
    fn algorithm_name_round_trips() {
        assert_eq!(BlackBox::new(Algorithm::KwdDetect).algorithm_name(), "kwd-detect");
    }
}
