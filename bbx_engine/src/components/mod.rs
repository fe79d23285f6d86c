//! The component kind catalogue.
//!
//! Each submodule implements one [`crate::component::ComponentKind`] variant.
//! `mixer`, `mux`, `volume`, `dcblock`, `host`, `dai` and `src` carry real,
//! if intentionally small, fixed-point processing; everything whose defining
//! behaviour is a specific DSP algorithm (equalizers, dynamic range control,
//! acoustic echo cancellation, beamforming, keyword spotting, ...) is an
//! explicit [`blackbox::BlackBox`] passthrough, matching this project's
//! scope: the graph, buffering and scheduling substrate, not the menagerie
//! of algorithms that plug into it.

pub mod blackbox;
pub mod dai;
pub mod dcblock;
pub mod host;
pub mod mixer;
pub mod mux;
pub mod src;
pub mod volume;

use bbx_core::{AudioFormat, FrameFormat};

/// Shared helper: copy `len` frames worth of bytes straight through,
/// honouring whichever of source/sink is smaller.
pub(crate) fn passthrough_frames(
    source: &crate::buffer::Buffer,
    sink: &crate::buffer::Buffer,
) -> crate::error::Result<u32> {
    let frame_bytes = source.format().frame_bytes() as usize;
    let frames = source.available_frames().min(sink.free_frames());
    if frames == 0 {
        return Ok(0);
    }
    let bytes = frames * frame_bytes;

    let rr = source.read_reserve(bytes)?;
    let mut staging = vec![0u8; bytes];
    source.read_from(&rr, &mut staging);

    let wr = sink.write_reserve(bytes)?;
    sink.write_into(&wr, &staging);

    source.read_commit(bytes);
    sink.write_commit(bytes);
    Ok(frames as u32)
}

/// Decode `frames` whole frames out of `raw` (as laid out by `format`) into
/// one `i32` per channel sample, sign-extended to full width. This is the
/// common currency every sample-touching component (volume, mixer, dcblock)
/// computes in, regardless of wire container width.
pub(crate) fn decode_samples(raw: &[u8], format: AudioFormat, frames: usize) -> Vec<i32> {
    let channels = format.channels as usize;
    let mut out = Vec::with_capacity(frames * channels);
    match format.frame_format {
        FrameFormat::S16Le => {
            for chunk in raw.chunks_exact(2).take(frames * channels) {
                out.push(i16::from_le_bytes([chunk[0], chunk[1]]) as i32);
            }
        }
        FrameFormat::S24In32Le => {
            for chunk in raw.chunks_exact(4).take(frames * channels) {
                out.push(bbx_core::sign_extend_s24(i32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]])));
            }
        }
        FrameFormat::S32Le => {
            for chunk in raw.chunks_exact(4).take(frames * channels) {
                out.push(i32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
            }
        }
    }
    out
}

/// Inverse of [`decode_samples`]: pack full-width samples back into the
/// wire container width, saturating where the container is narrower.
pub(crate) fn encode_samples(samples: &[i32], format: AudioFormat) -> Vec<u8> {
    let mut out = Vec::with_capacity(samples.len() * format.sample_bytes() as usize);
    match format.frame_format {
        FrameFormat::S16Le => {
            for &s in samples {
                out.extend_from_slice(&bbx_core::sat_i16(s).to_le_bytes());
            }
        }
        FrameFormat::S24In32Le => {
            for &s in samples {
                out.extend_from_slice(&bbx_core::sat_i24(s).to_le_bytes());
            }
        }
        FrameFormat::S32Le => {
            for &s in samples {
                out.extend_from_slice(&s.to_le_bytes());
            }
        }
    }
    out
}
