//! Receiver-side dispatch (spec §4.F "Receiver ISR").
//!
//! The fabric only moves bytes and handshakes BUSY/done; routing a
//! message's `msg_type` to IPC, pipeline-trigger, component-op, power
//! management, etc. is the owning core's business. [`bbx_fw::CoreRuntime`]
//! implements this trait once per core.

use bbx_engine::CoreId;

use crate::message::IdcMessage;

/// Status code a handler hands back; `0` means success, matching the
/// reference firmware's convention of using the target's status register
/// value as the BLOCKING send's return.
pub type IdcStatus = i32;

pub const IDC_STATUS_OK: IdcStatus = 0;

pub trait IdcHandler {
    /// Called from the receiving core's IDC ISR-equivalent for every
    /// message addressed to it. Must not block.
    fn handle_idc(&mut self, from: CoreId, msg: &IdcMessage) -> IdcStatus;
}
