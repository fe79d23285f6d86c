//! Log sink platform call (spec §4.G): "emit a log record with level,
//! class, and up to four 32-bit parameters" — the fixed-width record the
//! reference firmware uses so the trace never allocates or formats
//! strings on the audio path.
//!
//! This crate's own diagnostics go through the `log` facade directly
//! (matching the teacher's logging throughout); `LogSink` exists for the
//! one call site that must stay allocation-free, `bbx_fw`'s panic path
//! and per-tick scheduler overrun reporting.

pub trait LogSink: Send + Sync {
    fn emit(&self, level: log::Level, class: u32, params: [u32; 4]);
}
