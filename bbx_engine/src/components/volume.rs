//! Volume component: per-channel fixed-point gain.
//!
//! Grounded on the reference firmware's volume ramp (a per-sample multiply
//! against a Q-format gain) but simplified to an instantaneous gain change
//! on `set_attribute` — ramping is DSP-algorithm territory the spec treats
//! as a black box; only the component-contract shape (gain storage,
//! mute, per-channel fan-out) is in scope here.

use bbx_core::AudioFormat;

use crate::{
    buffer::Buffer,
    component::{CopyStatus, PrepareStatus},
    components::{decode_samples, encode_samples},
    error::Result,
};

/// Q16.16 fixed-point gain: `1 << 16` is unity.
const UNITY_GAIN_Q16: i64 = 1 << 16;

pub struct Volume {
    /// One Q16.16 gain per channel; resized to the negotiated channel count
    /// in `prepare`.
    gain_q16: Vec<i64>,
    muted: bool,
    format: Option<AudioFormat>,
}

impl Volume {
    pub fn new(initial_gain: f32) -> Self {
        Self {
            gain_q16: vec![(initial_gain as f64 * UNITY_GAIN_Q16 as f64) as i64],
            muted: false,
            format: None,
        }
    }

    pub fn set_channel_gain(&mut self, channel: usize, gain: f32) {
        if let Some(slot) = self.gain_q16.get_mut(channel) {
            *slot = (gain as f64 * UNITY_GAIN_Q16 as f64) as i64;
        }
    }

    pub fn set_mute(&mut self, muted: bool) {
        self.muted = muted;
    }

    /// Q16.16 gain currently set on `channel`, or unity if the channel index
    /// is out of range (mirrors `set_channel_gain`'s silent-clamp behaviour).
    pub fn channel_gain_q16(&self, channel: usize) -> i64 {
        self.gain_q16.get(channel).copied().unwrap_or(UNITY_GAIN_Q16)
    }

    pub fn muted(&self) -> bool {
        self.muted
    }

    pub(crate) fn prepare(&mut self, format: AudioFormat) -> Result<PrepareStatus> {
        if self.format == Some(format) {
            return Ok(PrepareStatus::Ready);
        }
        let channels = format.channels as usize;
        let default_gain = self.gain_q16.first().copied().unwrap_or(UNITY_GAIN_Q16);
        self.gain_q16.resize(channels.max(1), default_gain);
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
        for (i, &s) in samples.iter().enumerate() {
            let gain = if self.muted { 0 } else { self.gain_q16[i % channels] };
            let scaled = (s as i64 * gain) >> 16;
            out.push(bbx_core::sat_i32(scaled));
        }
        let encoded = encode_samples(&out, format);

        let wr = sink.write_reserve(encoded.len())?;
        sink.write_into(&wr, &encoded);
        sink.write_commit(encoded.len());

        Ok(CopyStatus::Ok { frames: frames as u32 })
    }

    pub(crate) fn reset(&mut self) {
        self.muted = false;
    }
}
