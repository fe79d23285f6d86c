//! Wire shape of an IDC message (spec §3, §6).
//!
//! The reference register layout packs a 24-bit header (type in the high
//! byte) plus a BUSY bit into `ITC`/`TFC`, and a 30-bit extension into
//! `IETC`/`TEFC`. This models the same fields as a plain struct; the
//! BUSY/done handshake itself lives in [`crate::fabric::IdcFabric`], not in
//! the message shape, since on real hardware BUSY is a register bit, not
//! message content.

use bbx_engine::{ComponentId, PipelineId};
use bbx_sched::{SchedulerClass, TaskId};

/// `IDC_MAX_PAYLOAD_SIZE = 2 * cache_line_size` (spec §4.F); a 64-byte
/// cache line is what the reference Xtensa HiFi target uses.
pub const CACHE_LINE_SIZE: usize = 64;
pub const IDC_MAX_PAYLOAD_SIZE: usize = 2 * CACHE_LINE_SIZE;

/// Bounded wait for a BLOCKING `send_msg` (spec §4.F, §5). The POWER_UP
/// variant uses the same bound to poll the target's boot-trace register.
pub const IDC_TIMEOUT: std::time::Duration = std::time::Duration::from_millis(10);

/// How long `send_msg` waits for the target to acknowledge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendMode {
    Blocking,
    NonBlocking,
    PowerUp,
}

/// High-byte `type` discriminant of the IDC `header` field, matching the
/// reference `idc_msg_type` catalogue (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdcMsgType {
    /// Delegate an IPC command to this core (`MSG_IPC`).
    Ipc,
    /// A component lifecycle op: params/prepare/trigger/reset/bind/unbind/
    /// get-attribute on a component owned by the target core.
    ComponentOp,
    /// A pipeline state transition crossing a core boundary (`MSG_PPL_STATE`).
    PipelineState,
    PowerUp,
    PowerDown,
    /// Slot for an asynchronous DSP-initiated notification routed through
    /// the target core's IPC outgoing queue.
    AsyncMessage,
    /// `MSG_SECONDARY_CORE_CRASHED`: reason is watchdog or exception.
    SecondaryCoreCrashed,
    Notify,
    /// Forward a `cancel_task` call to the scheduler that owns the task.
    TaskCancel,
}

/// Component-op sub-commands carried by an [`IdcMsgType::ComponentOp`]
/// message's payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentOpKind {
    Params,
    Prepare,
    Trigger,
    Reset,
    Bind,
    Unbind,
    GetAttribute,
    /// `set_attribute` (spec §4.A) delegated to the component's owning core.
    SetValue { key: u32, value: i32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrashReason {
    Watchdog,
    Exception,
}

/// Typed payload carried by an IDC message. The reference firmware packs
/// these into a raw byte buffer behind `extension`/`payload`; this crate
/// keeps the same size ceiling (`IDC_MAX_PAYLOAD_SIZE`) but models the
/// contents as a closed enum instead of a union, per REDESIGN FLAGS §9.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdcPayload {
    Ipc { command_class: u32, command_id: u32 },
    ComponentOp { component: ComponentId, op: ComponentOpKind },
    PipelineState { pipeline: PipelineId, phase: u32 },
    Power { core_mask: u32 },
    AsyncMessage { slot: u32 },
    SecondaryCoreCrashed { reason: CrashReason },
    Notify { code: u32 },
    TaskCancel { task: TaskId, class: SchedulerClass },
}

/// One IDC message: `header` (type, carried out-of-band from the BUSY bit
/// by [`crate::fabric::IdcFabric`]), `extension`, target `core`, `size` and
/// `payload` (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdcMessage {
    pub msg_type: IdcMsgType,
    pub extension: u32,
    pub size: u16,
    pub payload: IdcPayload,
}

impl IdcMessage {
    pub fn new(msg_type: IdcMsgType, extension: u32, payload: IdcPayload) -> Self {
        Self { msg_type, extension, size: core::mem::size_of::<IdcPayload>() as u16, payload }
    }
}
