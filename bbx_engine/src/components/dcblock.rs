//! DC blocker component: one-pole high-pass, fixed-point.
//!
//! Direct fixed-point translation of the teacher workspace's
//! `DcBlockerBlock` (`y[n] = x[n] - x[n-1] + R*y[n-1]`), with the
//! coefficient `R` carried as Q16.16 instead of a float so the whole
//! component stays inside the engine's integer sample path.

use bbx_core::AudioFormat;

use crate::{
    buffer::Buffer,
    component::{CopyStatus, PrepareStatus},
    components::{decode_samples, encode_samples},
    error::Result,
};

const UNITY_Q16: i64 = 1 << 16;
/// R = 0.995 in Q16.16, matching the teacher's `default_coeff`.
const DEFAULT_COEFF_Q16: i64 = 65208;

pub struct DcBlock {
    coeff_q16: i64,
    x_prev: Vec<i32>,
    y_prev: Vec<i32>,
    format: Option<AudioFormat>,
}

impl DcBlock {
    pub fn new() -> Self {
        Self {
            coeff_q16: DEFAULT_COEFF_Q16,
            x_prev: Vec::new(),
            y_prev: Vec::new(),
            format: None,
        }
    }

    pub fn with_coefficient(coeff: f32) -> Self {
        Self {
            coeff_q16: (coeff as f64 * UNITY_Q16 as f64) as i64,
            ..Self::new()
        }
    }

    pub(crate) fn prepare(&mut self, format: AudioFormat) -> Result<PrepareStatus> {
        if self.format == Some(format) {
            return Ok(PrepareStatus::Ready);
        }
        let channels = format.channels as usize;
        self.x_prev = vec![0; channels.max(1)];
        self.y_prev = vec![0; channels.max(1)];
        self.format = Some(format);
        Ok(PrepareStatus::Ready)
    }

    pub(crate) fn copy(&mut self, sources: &[&Buffer], sinks: &[&Buffer]) -> Result<CopyStatus> {
        let (Some(source), Some(sink)) = (sources.first(), sinks.first()) else {
            return Ok(CopyStatus::Idle);
        };
        let format = source.format();
        let channels = format.channels as usize;
        let frames = source.available_frames().min(sink.free_frames());
        if frames == 0 {
            return Ok(CopyStatus::Idle);
        }
        let frame_bytes = format.frame_bytes() as usize;
        let bytes = frames * frame_bytes;

        let rr = source.read_reserve(bytes)?;
        let mut raw = vec![0u8; bytes];
        source.read_from(&rr, &mut raw);
        source.read_commit(bytes);

        let samples = decode_samples(&raw, format, frames);
        let mut out = Vec::with_capacity(samples.len());
        for (i, &x) in samples.iter().enumerate() {
            let ch = i % channels;
            let y = x as i64 - self.x_prev[ch] as i64 + ((self.coeff_q16 * self.y_prev[ch] as i64) >> 16);
            let y = bbx_core::sat_i32(y);
            self.x_prev[ch] = x;
            self.y_prev[ch] = y;
            out.push(y);
        }
        let encoded = encode_samples(&out, format);

        let wr = sink.write_reserve(encoded.len())?;
        sink.write_into(&wr, &encoded);
        sink.write_commit(encoded.len());

        Ok(CopyStatus::Ok { frames: frames as u32 })
    }

    pub(crate) fn reset(&mut self) {
        self.x_prev.iter_mut().for_each(|v| *v = 0);
        self.y_prev.iter_mut().for_each(|v| *v = 0);
    }
}

impl Default for DcBlock {
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
    fn removes_dc_offset_over_time() {
        let mut dc = DcBlock::new();
        dc.prepare(fmt()).unwrap();

        let src = Buffer::new(BufferId(1), ComponentId(1), ComponentId(2), fmt(), 8192, false, false, false);
        let sink = Buffer::new(BufferId(2), ComponentId(2), ComponentId(3), fmt(), 8192, false, false, false);

        let samples = vec![1000i16; 2000];
        let bytes: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        let r = src.write_reserve(bytes.len()).unwrap();
        src.write_into(&r, &bytes);
        src.write_commit(bytes.len());

        dc.copy(&[&src], &[&sink]).unwrap();

        let rr = sink.read_reserve(bytes.len()).unwrap();
        let mut out = vec![0u8; bytes.len()];
        sink.read_from(&rr, &mut out);
        let decoded: Vec<i16> = out.chunks_exact(2).map(|c| i16::from_le_bytes([c[0], c[1]])).collect();

        let tail_avg: f64 = decoded[1800..].iter().map(|&v| v as f64).sum::<f64>() / 200.0;
        assert!(tail_avg.abs() < 50.0, "DC offset not attenuated: avg={tail_avg}");
    }

    #[test]
    fn reset_clears_filter_state() {
        let mut dc = DcBlock::new();
        dc.prepare(fmt()).unwrap();
        dc.x_prev[0] = 500;
        dc.y_prev[0] = 300;
        dc.reset();
        assert_eq!(dc.x_prev[0], 0);
        assert_eq!(dc.y_prev[0], 0);
    }
}
