//! Host IPC wire format: two dialects behind one header shape (spec §6).
//!
//! Both dialects share a 32-bit header whose high bits carry the command
//! class/type and whose low bits carry the command id, plus a reply bit
//! the host clears and the DSP sets. This module hand-rolls the bit
//! layout rather than deriving `serde::Serialize` for it: the wire ABI is
//! a fixed-size C struct layout, not a self-describing format, and a
//! `serde` derive would imply a flexibility (field reordering, optional
//! fields) the real ABI doesn't have.

use bbx_core::AudioFormat;
use bbx_engine::{BufferId, ComponentId, PipelineId};

/// Bit 31 of the header word: set by the DSP on the reply, cleared by the
/// host on a fresh command.
const REPLY_BIT: u32 = 1 << 31;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpcDialect {
    Three,
    Four,
}

/// The 32-bit header every message begins with (spec §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IpcHeader {
    pub dialect: IpcDialect,
    pub class: u8,
    pub command: u16,
    pub reply: bool,
}

impl IpcHeader {
    /// Pack into the 32-bit wire word: `[reply:1][dialect:1][class:8][command:16]`.
    /// The dialect bit isn't part of the reference ABI (both dialects reuse
    /// the same register); it's threaded through the in-memory `IpcHeader`
    /// so this crate's single dispatcher can tell them apart without
    /// re-deriving it from the class/command values.
    pub fn encode(self) -> u32 {
        let dialect_bit = match self.dialect {
            IpcDialect::Three => 0,
            IpcDialect::Four => 1,
        };
        let mut word = (self.class as u32) << 16 | self.command as u32;
        if self.reply {
            word |= REPLY_BIT;
        }
        word |= dialect_bit << 30;
        word
    }

    pub fn decode(word: u32) -> Self {
        let reply = word & REPLY_BIT != 0;
        let dialect = if (word >> 30) & 1 == 1 { IpcDialect::Four } else { IpcDialect::Three };
        let class = ((word >> 16) & 0xFF) as u8;
        let command = (word & 0xFFFF) as u16;
        Self { dialect, class, command, reply }
    }
}

/// Dialect 3 command classes (`GLB_*`, spec §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Glb3Class {
    Reply = 0,
    Compound = 1,
    Tplg = 2,
    Pm = 3,
    Comp = 4,
    Stream = 5,
    Dai = 6,
    Trace = 7,
    GdbDebug = 8,
    Test = 9,
}

/// Dialect 4 command groups, spec §6.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Glb4Class {
    InitInstance = 0,
    Bind = 1,
    Unbind = 2,
    SetPipelineState = 3,
    GetPipelineState = 4,
    LargeConfigSet = 5,
    LargeConfigGet = 6,
    ModuleNotification = 7,
}

/// Per-pipeline state exposed by dialect 4 (spec §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ipc4PipelineState {
    Created,
    Running,
    Paused,
    Eos,
    ErrorStop,
    Saved,
    Restored,
}

/// Component kind tag carried in `new_component`'s payload; maps 1:1 to
/// [`bbx_engine::ComponentKind`] variant construction in
/// `crate::topology::apply_new_component`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentTypeTag {
    Host,
    Dai,
    Mixer,
    Mux,
    Volume,
    Src,
    DcBlock,
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

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Playback,
    Capture,
}

/// GLB_TPLG_MSG / dialect-4 `init_instance` payload: one command struct
/// per topology operation. Only the fields the engine actually needs are
/// modeled; the real ABI carries additional vendor/ABI-version fields this
/// crate treats as opaque and validates in `new_component`/`new_pipeline`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopologyCommand {
    NewComponent {
        id: ComponentId,
        core: u32,
        kind: ComponentTypeTag,
        direction: Direction,
        format: AudioFormat,
        period_frames: u32,
    },
    FreeComponent {
        id: ComponentId,
    },
    NewBuffer {
        id: BufferId,
        producer: ComponentId,
        consumer: ComponentId,
        format: AudioFormat,
        size_bytes: u32,
        shared: bool,
    },
    Connect {
        buffer: BufferId,
    },
    NewPipeline {
        id: PipelineId,
        core: u32,
        period_us: u32,
        priority: u8,
        frames_per_period: u32,
    },
    PipelineComplete {
        id: PipelineId,
        source: ComponentId,
        sink: ComponentId,
    },
    FreePipeline {
        id: PipelineId,
    },
    BindComponentToPipeline {
        component: ComponentId,
        pipeline: PipelineId,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamTriggerCmd {
    Start,
    Stop,
    Pause,
    Release,
    Reset,
}

/// GLB_STREAM_MSG / dialect-4 stream lifecycle payload.
#[derive(Debug, Clone)]
pub enum StreamCommand {
    PcmParams { pipeline: PipelineId, format: AudioFormat },
    PcmFree { pipeline: PipelineId },
    Trigger { pipeline: PipelineId, cmd: StreamTriggerCmd },
    PositionUpdate { pipeline: PipelineId },
}

/// GLB_COMP_MSG component control payload.
#[derive(Debug, Clone)]
pub enum CompCommand {
    SetValue { component: ComponentId, key: u32, value: i32 },
    GetValue { component: ComponentId, key: u32 },
    /// Large binary blob (e.g. EQ coefficients), already assembled by the
    /// page-table DMA fetch (spec §4.E "Large payloads").
    SetData { component: ComponentId, key: u32, blob: Vec<u8> },
}

/// A fully parsed incoming message: header plus typed payload.
#[derive(Debug, Clone)]
pub enum IpcRequest {
    Topology(TopologyCommand),
    Stream(StreamCommand),
    Comp(CompCommand),
    PowerTransition { d3: bool },
    FwReady,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_roundtrips_through_encode_decode() {
        let h = IpcHeader { dialect: IpcDialect::Four, class: Glb4Class::SetPipelineState as u8, command: 7, reply: false };
        let decoded = IpcHeader::decode(h.encode());
        assert_eq!(decoded, h);
    }

    #[test]
    fn reply_bit_survives_roundtrip() {
        let h = IpcHeader { dialect: IpcDialect::Three, class: Glb3Class::Stream as u8, command: 1, reply: true };
        assert!(IpcHeader::decode(h.encode()).reply);
    }

    #[test]
    fn dialect_bit_distinguishes_three_from_four() {
        let h3 = IpcHeader { dialect: IpcDialect::Three, class: 0, command: 0, reply: false };
        let h4 = IpcHeader { dialect: IpcDialect::Four, class: 0, command: 0, reply: false };
        assert_eq!(IpcHeader::decode(h3.encode()).dialect, IpcDialect::Three);
        assert_eq!(IpcHeader::decode(h4.encode()).dialect, IpcDialect::Four);
    }
}
