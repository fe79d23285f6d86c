//! Applies a parsed [`TopologyCommand`] to a [`bbx_engine::Graph`]
//! (spec §6 `GLB_TPLG`, §4.C `pipeline_complete`).
//!
//! Resource errors leave no partial state behind (spec §7 "any partially
//! created object is torn down before reply"): every arm here either fully
//! succeeds or returns before touching the graph.

use bbx_engine::{
    Buffer, ComponentKind, Graph, Pipeline,
    components::{
        blackbox::{Algorithm, BlackBox},
        dai::Dai,
        dcblock::DcBlock,
        host::{Host, XrunPolicy},
        mixer::Mixer,
        mux::Mux,
        src::SampleRateConverter,
        volume::Volume,
    },
    pipeline::TimeDomain,
};

use crate::{
    error::{IpcError, Result},
    message::{ComponentTypeTag, Direction, TopologyCommand},
};

fn engine_direction(d: Direction) -> bbx_engine::components::host::Direction {
    match d {
        Direction::Playback => bbx_engine::components::host::Direction::Playback,
        Direction::Capture => bbx_engine::components::host::Direction::Capture,
    }
}

fn build_kind(
    id: bbx_engine::ComponentId,
    kind: ComponentTypeTag,
    direction: Direction,
    format: bbx_core::AudioFormat,
    period_frames: u32,
) -> ComponentKind {
    let ring_bytes = format.period_bytes(period_frames) as usize * 4;
    match kind {
        ComponentTypeTag::Host => ComponentKind::Host(Host::new(
            id,
            engine_direction(direction),
            ring_bytes,
            format,
            period_frames as usize,
            XrunPolicy::ReportAndContinue,
        )),
        ComponentTypeTag::Dai => {
            ComponentKind::Dai(Dai::new(id, engine_direction(direction), ring_bytes, format, period_frames as usize))
        }
        ComponentTypeTag::Mixer => ComponentKind::Mixer(Mixer::new()),
        ComponentTypeTag::Mux => ComponentKind::Mux(Mux::new()),
        ComponentTypeTag::Volume => ComponentKind::Volume(Volume::new(1.0)),
        ComponentTypeTag::Src => ComponentKind::Src(SampleRateConverter::new()),
        ComponentTypeTag::DcBlock => ComponentKind::DcBlock(DcBlock::new()),
        ComponentTypeTag::EqFir => ComponentKind::BlackBox(BlackBox::new(Algorithm::EqFir)),
        ComponentTypeTag::EqIir => ComponentKind::BlackBox(BlackBox::new(Algorithm::EqIir)),
        ComponentTypeTag::Drc => ComponentKind::BlackBox(BlackBox::new(Algorithm::Drc)),
        ComponentTypeTag::Tone => ComponentKind::BlackBox(BlackBox::new(Algorithm::Tone)),
        ComponentTypeTag::SmartAmp => ComponentKind::BlackBox(BlackBox::new(Algorithm::SmartAmp)),
        ComponentTypeTag::Crossover => ComponentKind::BlackBox(BlackBox::new(Algorithm::Crossover)),
        ComponentTypeTag::Tdfb => ComponentKind::BlackBox(BlackBox::new(Algorithm::Tdfb)),
        ComponentTypeTag::Mfcc => ComponentKind::BlackBox(BlackBox::new(Algorithm::Mfcc)),
        ComponentTypeTag::Aec => ComponentKind::BlackBox(BlackBox::new(Algorithm::Aec)),
        ComponentTypeTag::Kpb => ComponentKind::BlackBox(BlackBox::new(Algorithm::Kpb)),
        ComponentTypeTag::KwdDetect => ComponentKind::BlackBox(BlackBox::new(Algorithm::KwdDetect)),
        ComponentTypeTag::PipelineEndpoint => ComponentKind::BlackBox(BlackBox::new(Algorithm::PipelineEndpoint)),
    }
}

pub fn apply(graph: &mut Graph, cmd: TopologyCommand, local_core: bbx_engine::CoreId) -> Result<()> {
    match cmd {
        TopologyCommand::NewComponent { id, core, kind, direction, format, period_frames } => {
            if core != local_core.0 {
                return Err(IpcError::InvalidRequest);
            }
            let built = build_kind(id, kind, direction, format, period_frames);
            graph.new_component(id, local_core, built)?;
            Ok(())
        }
        TopologyCommand::FreeComponent { id } => Ok(graph.free_component(id)?),
        TopologyCommand::NewBuffer { id, producer, consumer, format, size_bytes, shared } => {
            let buffer = Buffer::new(id, producer, consumer, format, size_bytes as usize, shared, true, true);
            Ok(graph.new_buffer(buffer)?)
        }
        TopologyCommand::Connect { buffer } => Ok(graph.connect(buffer)?),
        TopologyCommand::NewPipeline { id, core, period_us, priority, frames_per_period } => {
            // Unlike `NewComponent`, a pipeline record may legitimately be
            // registered on a core that doesn't own it: a gateway core
            // (spec §8 scenario 3, `CoreRuntime::dispatch_trigger`) needs
            // `graph.pipeline(id).core()` to resolve where to trampoline a
            // trigger, without ever owning that pipeline's members.
            let pipeline = Pipeline::new(id, bbx_engine::CoreId(core), period_us, TimeDomain::Timer, frames_per_period, priority);
            Ok(graph.new_pipeline(pipeline)?)
        }
        TopologyCommand::PipelineComplete { id, source, sink } => Ok(graph.pipeline_complete(id, source, sink)?),
        TopologyCommand::FreePipeline { id } => Ok(graph.free_pipeline(id)?),
        TopologyCommand::BindComponentToPipeline { component, pipeline } => Ok(graph.bind_component_to_pipeline(component, pipeline)?),
    }
}

#[cfg(test)]
mod tests {
    use bbx_core::FrameFormat;
    use bbx_engine::{BufferId, ComponentId, CoreId, PipelineId};

    use super::*;

    fn fmt() -> bbx_core::AudioFormat {
        bbx_core::AudioFormat::new(FrameFormat::S16Le, 48_000, 2, true)
    }

    #[test]
    fn full_two_component_pipeline_build_from_commands() {
        let mut graph = Graph::new();
        let core = CoreId::PRIMARY;

        apply(
            &mut graph,
            TopologyCommand::NewPipeline { id: PipelineId(1), core: 0, period_us: 1000, priority: 0, frames_per_period: 48 },
            core,
        )
        .unwrap();

        apply(
            &mut graph,
            TopologyCommand::NewComponent {
                id: ComponentId(10),
                core: 0,
                kind: ComponentTypeTag::Host,
                direction: Direction::Playback,
                format: fmt(),
                period_frames: 48,
            },
            core,
        )
        .unwrap();
        apply(
            &mut graph,
            TopologyCommand::NewComponent {
                id: ComponentId(11),
                core: 0,
                kind: ComponentTypeTag::Dai,
                direction: Direction::Playback,
                format: fmt(),
                period_frames: 48,
            },
            core,
        )
        .unwrap();

        apply(
            &mut graph,
            TopologyCommand::NewBuffer {
                id: BufferId(20),
                producer: ComponentId(10),
                consumer: ComponentId(11),
                format: fmt(),
                size_bytes: 768,
                shared: false,
            },
            core,
        )
        .unwrap();
        apply(&mut graph, TopologyCommand::Connect { buffer: BufferId(20) }, core).unwrap();

        apply(&mut graph, TopologyCommand::BindComponentToPipeline { component: ComponentId(10), pipeline: PipelineId(1) }, core).unwrap();
        apply(&mut graph, TopologyCommand::BindComponentToPipeline { component: ComponentId(11), pipeline: PipelineId(1) }, core).unwrap();

        apply(
            &mut graph,
            TopologyCommand::PipelineComplete { id: PipelineId(1), source: ComponentId(10), sink: ComponentId(11) },
            core,
        )
        .unwrap();

        assert_eq!(graph.pipeline(PipelineId(1)).unwrap().execution_order(), &[ComponentId(10), ComponentId(11)]);
    }

    #[test]
    fn connect_before_new_buffer_is_invalid_resource_id() {
        let mut graph = Graph::new();
        let err = apply(&mut graph, TopologyCommand::Connect { buffer: BufferId(20) }, CoreId::PRIMARY).unwrap_err();
        assert_eq!(err, IpcError::InvalidResourceId);
    }
}
