//! Pipeline: a connected subgraph of components sharing one scheduling
//! period and driving endpoint (spec §3/§4.C).

use crate::{
    component::TriggerCmd,
    ids::{ComponentId, CoreId, PipelineId},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeDomain {
    Timer,
    DmaTick,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Init,
    Prepared,
    Active,
    Paused,
    ErrorStop,
}

/// Snapshot posted to the notification mailbox on tick boundaries,
/// opportunistically — never on the critical path (spec §4.C "Position
/// reporting").
#[derive(Debug, Clone, Copy, Default)]
pub struct StreamPosition {
    pub host_frames: u64,
    pub dai_frames: u64,
    pub xrun_count: u32,
    pub valid: bool,
}

pub struct Pipeline {
    id: PipelineId,
    core: CoreId,
    priority: u8,
    period_us: u32,
    time_domain: TimeDomain,
    frames_per_period: u32,

    members: Vec<ComponentId>,
    execution_order: Vec<ComponentId>,
    source: Option<ComponentId>,
    sink: Option<ComponentId>,
    scheduling_component: Option<ComponentId>,

    state: PipelineState,
    position: StreamPosition,
}

impl Pipeline {
    pub fn new(id: PipelineId, core: CoreId, period_us: u32, time_domain: TimeDomain, frames_per_period: u32, priority: u8) -> Self {
        Self {
            id,
            core,
            priority,
            period_us,
            time_domain,
            frames_per_period,
            members: Vec::new(),
            execution_order: Vec::new(),
            source: None,
            sink: None,
            scheduling_component: None,
            state: PipelineState::Init,
            position: StreamPosition::default(),
        }
    }

    pub fn id(&self) -> PipelineId {
        self.id
    }

    pub fn core(&self) -> CoreId {
        self.core
    }

    pub fn priority(&self) -> u8 {
        self.priority
    }

    pub fn period_us(&self) -> u32 {
        self.period_us
    }

    pub fn time_domain(&self) -> TimeDomain {
        self.time_domain
    }

    pub fn frames_per_period(&self) -> u32 {
        self.frames_per_period
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn members(&self) -> &[ComponentId] {
        &self.members
    }

    pub fn add_member(&mut self, id: ComponentId) {
        if !self.members.contains(&id) {
            self.members.push(id);
        }
    }

    pub fn execution_order(&self) -> &[ComponentId] {
        &self.execution_order
    }

    pub fn scheduling_component(&self) -> Option<ComponentId> {
        self.scheduling_component
    }

    pub fn source(&self) -> Option<ComponentId> {
        self.source
    }

    pub fn sink(&self) -> Option<ComponentId> {
        self.sink
    }

    pub(crate) fn set_topology(&mut self, order: Vec<ComponentId>, source: ComponentId, sink: ComponentId, scheduling: ComponentId) {
        self.execution_order = order;
        self.source = Some(source);
        self.sink = Some(sink);
        self.scheduling_component = Some(scheduling);
    }

    pub(crate) fn set_state(&mut self, state: PipelineState) {
        self.state = state;
    }

    pub(crate) fn apply_trigger(&mut self, cmd: TriggerCmd) {
        self.state = match cmd {
            TriggerCmd::Start | TriggerCmd::Release => PipelineState::Active,
            TriggerCmd::Stop | TriggerCmd::Pause => PipelineState::Paused,
            TriggerCmd::Reset => PipelineState::Prepared,
            TriggerCmd::PreLoad => self.state,
        };
    }

    pub fn position(&self) -> StreamPosition {
        self.position
    }

    pub fn update_position(&mut self, host_frames: u64, dai_frames: u64, xrun_count: u32) {
        self.position = StreamPosition {
            host_frames,
            dai_frames,
            xrun_count,
            valid: true,
        };
    }

    pub fn mark_error_stop(&mut self) {
        self.state = PipelineState::ErrorStop;
    }
}
