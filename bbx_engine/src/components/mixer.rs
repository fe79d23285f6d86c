//! Mixer component: sums N source buffers into one sink, per channel.
//!
//! Grounded on `MixerBlock`'s channel-wise summing shape, generalized from
//! typed sample slices to this crate's byte-ring `Buffer`. Saturates to the
//! sink format's range rather than normalizing, matching the reference
//! firmware's fixed-point mixer (no automatic gain compensation — that is
//! a volume-component concern).

use bbx_core::AudioFormat;

use crate::{
    buffer::Buffer,
    component::{CopyStatus, PrepareStatus},
    components::{decode_samples, encode_samples},
    error::Result,
};

pub struct Mixer {
    format: Option<AudioFormat>,
}

impl Mixer {
    pub fn new() -> Self {
        Self { format: None }
    }

    pub(crate) fn prepare(&mut self, format: AudioFormat) -> Result<PrepareStatus> {
        if self.format == Some(format) {
            return Ok(PrepareStatus::Ready);
        }
        self.format = Some(format);
        Ok(PrepareStatus::Ready)
    }

    /// One input, unity gain: the lossless pass-through case the spec's
    /// idempotence properties require to be exactly equal to its input.
    pub(crate) fn copy(&mut self, sources: &[&Buffer], sinks: &[&Buffer]) -> Result<CopyStatus> {
        let Some(sink) = sinks.first() else {
            return Ok(CopyStatus::Idle);
        };
        if sources.is_empty() {
            return Ok(CopyStatus::Idle);
        }
        let format = sources[0].format();

        let frames = sources.iter().map(|b| b.available_frames()).min().unwrap_or(0).min(sink.free_frames());
        if frames == 0 {
            return Ok(CopyStatus::Idle);
        }
        let frame_bytes = format.frame_bytes() as usize;
        let bytes = frames * frame_bytes;
        let samples_per_source = frames * format.channels as usize;

        let mut acc = vec![0i64; samples_per_source];
        for source in sources {
            let rr = source.read_reserve(bytes)?;
            let mut raw = vec![0u8; bytes];
            source.read_from(&rr, &mut raw);
            source.read_commit(bytes);

            let samples = decode_samples(&raw, format, frames);
            for (a, s) in acc.iter_mut().zip(samples.iter()) {
                *a += *s as i64;
            }
        }

        let out: Vec<i32> = acc.into_iter().map(|v| bbx_core::sat_i32(v)).collect();
        let encoded = encode_samples(&out, format);

        let wr = sink.write_reserve(encoded.len())?;
        sink.write_into(&wr, &encoded);
        sink.write_commit(encoded.len());

        Ok(CopyStatus::Ok { frames: frames as u32 })
    }

    pub(crate) fn reset(&mut self) {}
}

impl Default for Mixer {
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
    fn single_unity_source_is_lossless() {
        let mut mixer = Mixer::new();
        mixer.prepare(fmt()).unwrap();

        let src = Buffer::new(BufferId(1), ComponentId(1), ComponentId(3), fmt(), 64, false, false, false);
        let sink = Buffer::new(BufferId(2), ComponentId(3), ComponentId(4), fmt(), 64, false, false, false);

        let samples: [i16; 3] = [10, -20, 30];
        let bytes: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        let r = src.write_reserve(bytes.len()).unwrap();
        src.write_into(&r, &bytes);
        src.write_commit(bytes.len());

        mixer.copy(&[&src], &[&sink]).unwrap();

        let rr = sink.read_reserve(bytes.len()).unwrap();
        let mut out = vec![0u8; bytes.len()];
        sink.read_from(&rr, &mut out);
        assert_eq!(out, bytes);
    }

    #[test]
    fn two_sources_sum() {
        let mut mixer = Mixer::new();
        mixer.prepare(fmt()).unwrap();

        let a = Buffer::new(BufferId(1), ComponentId(1), ComponentId(3), fmt(), 64, false, false, false);
        let b = Buffer::new(BufferId(2), ComponentId(2), ComponentId(3), fmt(), 64, false, false, false);
        let sink = Buffer::new(BufferId(3), ComponentId(3), ComponentId(4), fmt(), 64, false, false, false);

        for (buf, val) in [(&a, 100i16), (&b, 50i16)] {
            let r = buf.write_reserve(2).unwrap();
            buf.write_into(&r, &val.to_le_bytes());
            buf.write_commit(2);
        }

        mixer.copy(&[&a, &b], &[&sink]).unwrap();

        let rr = sink.read_reserve(2).unwrap();
        let mut out = [0u8; 2];
        sink.read_from(&rr, &mut out);
        assert_eq!(i16::from_le_bytes(out), 150);
    }

    #[test]
    fn saturates_instead_of_overflowing() {
        let mut mixer = Mixer::new();
        mixer.prepare(fmt()).unwrap();

        let a = Buffer::new(BufferId(1), ComponentId(1), ComponentId(3), fmt(), 64, false, false, false);
        let b = Buffer::new(BufferId(2), ComponentId(2), ComponentId(3), fmt(), 64, false, false, false);
        let sink = Buffer::new(BufferId(3), ComponentId(3), ComponentId(4), fmt(), 64, false, false, false);

        for buf in [&a, &b] {
            let r = buf.write_reserve(2).unwrap();
            buf.write_into(&r, &i16::MAX.to_le_bytes());
            buf.write_commit(2);
        }

        mixer.copy(&[&a, &b], &[&sink]).unwrap();

        let rr = sink.read_reserve(2).unwrap();
        let mut out = [0u8; 2];
        sink.read_from(&rr, &mut out);
        assert_eq!(i16::from_le_bytes(out), i16::MAX);
    }
}
