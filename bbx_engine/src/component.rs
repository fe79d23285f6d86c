//! Component state machine and the closed-enum kind dispatch.
//!
//! The reference firmware dispatches per-component operations through a
//! function-pointer vtable (`struct comp_driver`) built from a global,
//! mutable driver table populated at boot. Per the redesign this crate
//! closes that over a `ComponentKind` enum fixed at compile time and
//! resolved once in a [`crate::registry`]; there is no way to register a
//! kind at runtime, and `match`ing it is exhaustive.

use bbx_core::AudioFormat;

use crate::{
    buffer::Buffer,
    components::{
        blackbox::BlackBox, dai::Dai, dcblock::DcBlock, host::Host, mixer::Mixer, mux::Mux, src::SampleRateConverter,
        volume::Volume,
    },
    error::{EngineError, Result},
    ids::{ComponentId, CoreId, PipelineId},
};

/// Centralized component lifecycle state.
///
/// Legal transitions (see spec section 4.A): `Init -> Ready` on construction,
/// `Ready -> Paused` on `prepare`, `Paused -> Active` on `trigger(Start |
/// Release)`, `Active -> Paused` on `trigger(Pause | Stop)`, any state
/// `-> Ready` on `trigger(Reset)`. There is no `Destroyed` state modeled
/// here: freeing a component removes it from the arena instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentState {
    Init,
    Ready,
    Paused,
    Active,
}

/// `set_attribute`/`get_attribute` key layout (spec §4.A, GLB_COMP
/// `set_value`/`get_value`): the high 16 bits select the control, the low
/// 16 bits select a channel where the control is per-channel. Mirrors the
/// reference firmware's control-index convention of packing a channel
/// number alongside the control id rather than one key per channel.
pub const ATTR_VOLUME_GAIN_Q16: u16 = 1;
pub const ATTR_VOLUME_MUTE: u16 = 2;
pub const ATTR_MUX_ACTIVE_SOURCE: u16 = 3;

fn attr_id(key: u32) -> u16 {
    (key >> 16) as u16
}

fn attr_channel(key: u32) -> usize {
    (key & 0xFFFF) as usize
}

/// Commands accepted by [`Component::trigger`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerCmd {
    Start,
    Stop,
    Pause,
    Release,
    Reset,
    PreLoad,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrepareStatus {
    Ready,
    /// Pipeline should wait for another component's prepare before retrying.
    PendingSiblings,
}

/// Outcome of a single `copy()` call against this component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyStatus {
    /// Processed `frames` frames with no boundary condition.
    Ok { frames: u32 },
    /// Source had fewer frames available than requested; undersized copy.
    Underrun { frames: u32 },
    /// Sink had less free space than requested; undersized copy.
    Overrun { frames: u32 },
    /// Nothing to do this tick (e.g. source end-of-pipeline with no data).
    Idle,
}

/// The closed set of component behaviours the engine knows how to run.
///
/// Individual DSP algorithms (EQ coefficients, AEC adaptive filter, beamformer
/// weights, ...) are explicitly out of scope; kinds that would carry one are
/// modeled as [`BlackBox`] passthroughs that still participate correctly in
/// the state machine, buffer contract, and scheduling.
pub enum ComponentKind {
    Host(Host),
    Dai(Dai),
    Mixer(Mixer),
    Mux(Mux),
    Volume(Volume),
    Src(SampleRateConverter),
    DcBlock(DcBlock),
    /// EqFir, EqIir, Drc, Tone, SmartAmp, Crossover, Tdfb, Mfcc, Aec, Kpb,
    /// KwdDetect and PipelineEndpoint all share this passthrough shape.
    BlackBox(BlackBox),
}

impl ComponentKind {
    fn prepare(&mut self, format: AudioFormat) -> Result<PrepareStatus> {
        match self {
            ComponentKind::Host(c) => c.prepare(format),
            ComponentKind::Dai(c) => c.prepare(format),
            ComponentKind::Mixer(c) => c.prepare(format),
            ComponentKind::Mux(c) => c.prepare(format),
            ComponentKind::Volume(c) => c.prepare(format),
            ComponentKind::Src(c) => c.prepare(format),
            ComponentKind::DcBlock(c) => c.prepare(format),
            ComponentKind::BlackBox(c) => c.prepare(format),
        }
    }

    fn copy(&mut self, sources: &[&Buffer], sinks: &[&Buffer]) -> Result<CopyStatus> {
        match self {
            ComponentKind::Host(c) => c.copy(sources, sinks),
            ComponentKind::Dai(c) => c.copy(sources, sinks),
            ComponentKind::Mixer(c) => c.copy(sources, sinks),
            ComponentKind::Mux(c) => c.copy(sources, sinks),
            ComponentKind::Volume(c) => c.copy(sources, sinks),
            ComponentKind::Src(c) => c.copy(sources, sinks),
            ComponentKind::DcBlock(c) => c.copy(sources, sinks),
            ComponentKind::BlackBox(c) => c.copy(sources, sinks),
        }
    }

    fn reset(&mut self) {
        match self {
            ComponentKind::Host(c) => c.reset(),
            ComponentKind::Dai(c) => c.reset(),
            ComponentKind::Mixer(c) => c.reset(),
            ComponentKind::Mux(c) => c.reset(),
            ComponentKind::Volume(c) => c.reset(),
            ComponentKind::Src(c) => c.reset(),
            ComponentKind::DcBlock(c) => c.reset(),
            ComponentKind::BlackBox(c) => c.reset(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ComponentKind::Host(_) => "host",
            ComponentKind::Dai(_) => "dai",
            ComponentKind::Mixer(_) => "mixer",
            ComponentKind::Mux(_) => "mux",
            ComponentKind::Volume(_) => "volume",
            ComponentKind::Src(_) => "src",
            ComponentKind::DcBlock(_) => "dcblock",
            ComponentKind::BlackBox(c) => c.algorithm_name(),
        }
    }

    /// Whether this kind is the scheduling-driving component of its
    /// pipeline (exactly one per pipeline: a Host or a Dai).
    pub fn is_scheduling_source(&self) -> bool {
        matches!(self, ComponentKind::Host(_) | ComponentKind::Dai(_))
    }

    /// Frames moved through this component's ring so far, for a `Host` or
    /// `Dai` endpoint (spec §4.C "position reporting": host/dai frame
    /// counters). `None` for every other kind — only the two endpoint
    /// kinds own a host-/hardware-facing ring to count.
    pub fn frames_processed(&self) -> Option<u64> {
        match self {
            ComponentKind::Host(c) => Some(c.frames_processed()),
            ComponentKind::Dai(c) => Some(c.frames_processed()),
            _ => None,
        }
    }

    /// Xruns counted by this component, for a `Host` or `Dai` endpoint.
    pub fn endpoint_xrun_count(&self) -> Option<u32> {
        match self {
            ComponentKind::Host(c) => Some(c.xrun_count()),
            ComponentKind::Dai(c) => Some(c.xrun_count()),
            _ => None,
        }
    }

    /// The host-facing ring a `Host` endpoint sources from/sinks into
    /// (spec §4.A: "sources samples from the host's shared-memory ring,
    /// which the host DMA-scatters pages into"). This is the seam the IPC
    /// layer's page-table DMA fetch (spec §4.E) and a capture stream's
    /// drain both write/read through; every other kind has no such ring.
    pub fn host_ring(&self) -> Option<&Buffer> {
        match self {
            ComponentKind::Host(c) => Some(c.ring()),
            _ => None,
        }
    }

    /// One period's worth of bytes on a `Host`/`Dai` endpoint's ring, for
    /// sizing the `xrun_size` field of a notification (spec §8 scenario 2:
    /// "xrun_size = -period_bytes").
    pub fn endpoint_period_bytes(&self) -> Option<u32> {
        match self {
            ComponentKind::Host(c) => Some(c.period_frames() as u32 * c.ring().format().frame_bytes()),
            ComponentKind::Dai(c) => Some(c.period_frames() as u32 * c.ring().format().frame_bytes()),
            _ => None,
        }
    }

    /// `set_attribute` (spec §4.A: "setter for runtime controls (volume
    /// channel gain, EQ coefficient blob, mute, bypass, etc.)"). Each kind
    /// that carries a runtime control answers for its own keys; everything
    /// else rejects with `UnsupportedAttribute` rather than silently
    /// discarding the write.
    pub fn set_attribute(&mut self, key: u32, value: i32) -> Result<()> {
        match (self, attr_id(key)) {
            (ComponentKind::Volume(v), ATTR_VOLUME_GAIN_Q16) => {
                v.set_channel_gain(attr_channel(key), value as f32 / UNITY_GAIN_Q16 as f32);
                Ok(())
            }
            (ComponentKind::Volume(v), ATTR_VOLUME_MUTE) => {
                v.set_mute(value != 0);
                Ok(())
            }
            (ComponentKind::Mux(m), ATTR_MUX_ACTIVE_SOURCE) => {
                m.set_active_source(value.max(0) as usize);
                Ok(())
            }
            _ => Err(EngineError::UnsupportedAttribute(key)),
        }
    }

    /// `get_attribute`/GLB_COMP `get_value`: the read-side counterpart of
    /// [`ComponentKind::set_attribute`], same key layout.
    pub fn get_attribute(&self, key: u32) -> Result<i32> {
        match (self, attr_id(key)) {
            (ComponentKind::Volume(v), ATTR_VOLUME_GAIN_Q16) => Ok(v.channel_gain_q16(attr_channel(key)) as i32),
            (ComponentKind::Volume(v), ATTR_VOLUME_MUTE) => Ok(v.muted() as i32),
            (ComponentKind::Mux(m), ATTR_MUX_ACTIVE_SOURCE) => Ok(m.active_source() as i32),
            _ => Err(EngineError::UnsupportedAttribute(key)),
        }
    }

    /// `set_data`/GLB_COMP `set_data`: the large-payload counterpart of
    /// `set_attribute`, used for blobs too big for a single `i32` (spec
    /// §4.A, §4.E "EQ coefficient blob"). Only the `BlackBox` catch-all
    /// kinds (EqFir, EqIir, Drc, ...) carry an opaque config blob; every
    /// other kind's controls are single-value and go through
    /// `set_attribute` instead.
    pub fn set_data(&mut self, key: u32, blob: &[u8]) -> Result<()> {
        match self {
            ComponentKind::BlackBox(b) => {
                b.set_config_blob(blob.to_vec());
                Ok(())
            }
            _ => Err(EngineError::UnsupportedAttribute(key)),
        }
    }
}

/// Q16.16 fixed-point gain unity value, matching [`components::volume::Volume`]'s
/// internal representation — the wire value for `ATTR_VOLUME_GAIN_Q16` is the
/// same Q16.16 int the component stores, not a float.
const UNITY_GAIN_Q16: i64 = 1 << 16;

/// A single node in the component graph.
pub struct Component {
    id: ComponentId,
    core: CoreId,
    pipeline: Option<PipelineId>,
    state: ComponentState,
    kind: ComponentKind,
}

impl Component {
    pub fn new(id: ComponentId, core: CoreId, kind: ComponentKind) -> Self {
        Self { id, core, pipeline: None, state: ComponentState::Ready, kind }
    }

    pub fn id(&self) -> ComponentId {
        self.id
    }

    pub fn core(&self) -> CoreId {
        self.core
    }

    pub fn state(&self) -> ComponentState {
        self.state
    }

    pub fn kind(&self) -> &ComponentKind {
        &self.kind
    }

    pub fn kind_mut(&mut self) -> &mut ComponentKind {
        &mut self.kind
    }

    pub fn pipeline(&self) -> Option<PipelineId> {
        self.pipeline
    }

    pub fn bind_pipeline(&mut self, pipeline: PipelineId) {
        self.pipeline = Some(pipeline);
    }

    /// Negotiate formats and move `Ready -> Paused`.
    pub fn prepare(&mut self, format: AudioFormat) -> Result<PrepareStatus> {
        if self.state != ComponentState::Ready {
            return Err(EngineError::InvalidState);
        }
        let status = self.kind.prepare(format)?;
        if status == PrepareStatus::Ready {
            self.state = ComponentState::Paused;
        }
        Ok(status)
    }

    /// Apply a trigger command, enforcing the state machine.
    pub fn trigger(&mut self, cmd: TriggerCmd) -> Result<()> {
        use ComponentState::*;
        use TriggerCmd::*;

        let next = match (self.state, cmd) {
            (_, Reset) => Ready,
            (Paused, Start) | (Paused, Release) => Active,
            (Active, Stop) | (Active, Pause) => Paused,
            (Ready, PreLoad) => Ready,
            _ => return Err(EngineError::InvalidState),
        };

        if cmd == Reset {
            self.kind.reset();
        }
        self.state = next;
        Ok(())
    }

    /// Run one tick of this component's processing.
    ///
    /// Only legal while `Active`; callers (the scheduler, via the pipeline)
    /// are responsible for not calling `copy` on paused components.
    pub fn copy(&mut self, sources: &[&Buffer], sinks: &[&Buffer]) -> Result<CopyStatus> {
        if self.state != ComponentState::Active {
            return Err(EngineError::InvalidState);
        }
        self.kind.copy(sources, sinks)
    }
}
