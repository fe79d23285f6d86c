//! The component/buffer/pipeline arena.
//!
//! Generalizes `bbx_dsp::graph::Graph`'s Kahn's-algorithm topological sort
//! from a single-owner `Vec<BlockType<S>>` to this crate's cross-referenced
//! arena: components, buffers and pipelines each live in their own
//! `HashMap` keyed by the spec's stable 32-bit ids (REDESIGN FLAGS §9 —
//! "arena of components and an arena of buffers ... cross-references are
//! indices, never owning pointers").

use std::collections::HashMap;

use bbx_core::AudioFormat;

use crate::{
    buffer::Buffer,
    component::{Component, ComponentKind, TriggerCmd},
    error::{EngineError, Result},
    ids::{BufferId, ComponentId, CoreId, PipelineId},
    pipeline::{Pipeline, PipelineState},
};

/// Tracks which buffer ids feed into / out of a component's pins. A
/// component's `sources` are buffers it reads (consumer side), `sinks` are
/// buffers it writes (producer side).
#[derive(Default, Clone)]
struct Pins {
    sources: Vec<BufferId>,
    sinks: Vec<BufferId>,
}

#[derive(Default)]
pub struct Graph {
    components: HashMap<ComponentId, Component>,
    buffers: HashMap<BufferId, Buffer>,
    pipelines: HashMap<PipelineId, Pipeline>,
    pins: HashMap<ComponentId, Pins>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- GLB_TPLG: component lifecycle ----------------------------------

    pub fn new_component(&mut self, id: ComponentId, core: CoreId, kind: ComponentKind) -> Result<()> {
        if self.components.contains_key(&id) {
            return Err(EngineError::ResourceIdExists(id.0));
        }
        self.components.insert(id, Component::new(id, core, kind));
        self.pins.insert(id, Pins::default());
        Ok(())
    }

    pub fn free_component(&mut self, id: ComponentId) -> Result<()> {
        self.components.remove(&id).ok_or(EngineError::InvalidResourceId(id.0))?;
        self.pins.remove(&id);
        Ok(())
    }

    pub fn component(&self, id: ComponentId) -> Result<&Component> {
        self.components.get(&id).ok_or(EngineError::InvalidResourceId(id.0))
    }

    pub fn component_mut(&mut self, id: ComponentId) -> Result<&mut Component> {
        self.components.get_mut(&id).ok_or(EngineError::InvalidResourceId(id.0))
    }

    /// The host-facing ring of a `Host` endpoint (spec §4.A), for the IPC
    /// layer's page-table DMA fetch to deposit playback pages into, or a
    /// capture stream's `position_update`/drain path to read out of.
    /// `write_reserve`/`write_commit`/`read_reserve`/`read_commit` all take
    /// `&self` on `Buffer`, so this only needs a shared borrow of the graph.
    pub fn host_ring(&self, id: ComponentId) -> Result<&Buffer> {
        self.component(id)?.kind().host_ring().ok_or(EngineError::InvalidResourceId(id.0))
    }

    // ---- GLB_TPLG: buffer lifecycle -------------------------------------

    pub fn new_buffer(&mut self, buffer: Buffer) -> Result<()> {
        let id = buffer.id();
        if self.buffers.contains_key(&id) {
            return Err(EngineError::ResourceIdExists(id.0));
        }
        self.buffers.insert(id, buffer);
        Ok(())
    }

    pub fn free_buffer(&mut self, id: BufferId) -> Result<()> {
        self.buffers.remove(&id).ok_or(EngineError::InvalidResourceId(id.0))?;
        Ok(())
    }

    pub fn buffer(&self, id: BufferId) -> Result<&Buffer> {
        self.buffers.get(&id).ok_or(EngineError::InvalidResourceId(id.0))
    }

    /// Every buffer currently in the arena, for telemetry sampling.
    pub fn buffers(&self) -> impl Iterator<Item = &Buffer> {
        self.buffers.values()
    }

    /// `connect(producer, buffer, consumer)`: record that `buffer` is a
    /// sink of `producer` and a source of `consumer`. The buffer itself
    /// already carries its producer/consumer ids (§3); this just indexes
    /// them for pipeline traversal and `copy()` dispatch.
    pub fn connect(&mut self, buffer_id: BufferId) -> Result<()> {
        let buffer = self.buffers.get(&buffer_id).ok_or(EngineError::InvalidResourceId(buffer_id.0))?;
        let (producer, consumer) = (buffer.producer(), buffer.consumer());

        let producer_pins = self.pins.get_mut(&producer).ok_or(EngineError::InvalidResourceId(producer.0))?;
        producer_pins.sinks.push(buffer_id);

        let consumer_pins = self.pins.get_mut(&consumer).ok_or(EngineError::InvalidResourceId(consumer.0))?;
        consumer_pins.sources.push(buffer_id);

        Ok(())
    }

    // ---- GLB_TPLG: pipeline lifecycle ------------------------------------

    pub fn new_pipeline(&mut self, pipeline: Pipeline) -> Result<()> {
        let id = pipeline.id();
        if self.pipelines.contains_key(&id) {
            return Err(EngineError::ResourceIdExists(id.0));
        }
        self.pipelines.insert(id, pipeline);
        Ok(())
    }

    pub fn free_pipeline(&mut self, id: PipelineId) -> Result<()> {
        self.pipelines.remove(&id).ok_or(EngineError::InvalidResourceId(id.0))?;
        Ok(())
    }

    pub fn pipeline(&self, id: PipelineId) -> Result<&Pipeline> {
        self.pipelines.get(&id).ok_or(EngineError::InvalidResourceId(id.0))
    }

    pub fn pipeline_mut(&mut self, id: PipelineId) -> Result<&mut Pipeline> {
        self.pipelines.get_mut(&id).ok_or(EngineError::InvalidResourceId(id.0))
    }

    pub fn bind_component_to_pipeline(&mut self, component_id: ComponentId, pipeline_id: PipelineId) -> Result<()> {
        if !self.pipelines.contains_key(&pipeline_id) {
            return Err(EngineError::InvalidResourceId(pipeline_id.0));
        }
        self.component_mut(component_id)?.bind_pipeline(pipeline_id);
        self.pipeline_mut(pipeline_id)?.add_member(component_id);
        Ok(())
    }

    /// Walk the member set reachable from `source` to `sink`, verify
    /// acyclicity, compute topological order, and pick the scheduling
    /// component (the Host or Dai endpoint on the pipeline's external
    /// boundary).
    pub fn pipeline_complete(&mut self, pipeline_id: PipelineId, source: ComponentId, sink: ComponentId) -> Result<()> {
        let members: Vec<ComponentId> = self.pipeline(pipeline_id)?.members().to_vec();
        let order = self.topological_order(&members)?;

        let scheduling = order
            .iter()
            .copied()
            .find(|id| {
                self.components
                    .get(id)
                    .map(|c| c.kind().is_scheduling_source())
                    .unwrap_or(false)
            })
            .ok_or(EngineError::PipelineIncomplete)?;

        let pipeline = self.pipeline_mut(pipeline_id)?;
        pipeline.set_topology(order, source, sink, scheduling);
        Ok(())
    }

    /// Kahn's algorithm over the subgraph induced by `members`, generalized
    /// from `bbx_dsp::graph::Graph::topological_sort`'s block-id version.
    fn topological_order(&self, members: &[ComponentId]) -> Result<Vec<ComponentId>> {
        let member_set: std::collections::HashSet<ComponentId> = members.iter().copied().collect();
        let mut in_degree: HashMap<ComponentId, usize> = members.iter().map(|&id| (id, 0)).collect();
        let mut adjacency: HashMap<ComponentId, Vec<ComponentId>> = HashMap::new();

        for &id in members {
            let pins = self.pins.get(&id).cloned().unwrap_or_default();
            for sink_buf in &pins.sinks {
                if let Ok(buf) = self.buffer(*sink_buf) {
                    let downstream = buf.consumer();
                    if member_set.contains(&downstream) {
                        adjacency.entry(id).or_default().push(downstream);
                        *in_degree.get_mut(&downstream).unwrap() += 1;
                    }
                }
            }
        }

        let mut queue: Vec<ComponentId> = in_degree.iter().filter(|&(_, &d)| d == 0).map(|(&id, _)| id).collect();
        queue.sort_by_key(|id| id.0);
        let mut order = Vec::with_capacity(members.len());

        while let Some(id) = queue.pop() {
            order.push(id);
            if let Some(neighbors) = adjacency.get(&id) {
                for &next in neighbors {
                    let degree = in_degree.get_mut(&next).unwrap();
                    *degree -= 1;
                    if *degree == 0 {
                        queue.push(next);
                    }
                }
            }
        }

        if order.len() != members.len() {
            let stuck = members.iter().find(|id| !order.contains(id)).copied().unwrap_or(members[0]);
            return Err(EngineError::GraphContainsCycle(stuck));
        }
        Ok(order)
    }

    // ---- Stream control ---------------------------------------------------

    /// Propagate a negotiated format across every member in topological
    /// order, calling each component's `prepare`.
    pub fn pipeline_params(&mut self, pipeline_id: PipelineId, format: AudioFormat) -> Result<()> {
        let order = self.pipeline(pipeline_id)?.execution_order().to_vec();
        for id in order {
            self.component_mut(id)?.prepare(format)?;
        }
        self.pipeline_mut(pipeline_id)?.set_state(PipelineState::Prepared);
        Ok(())
    }

    /// Dispatch `trigger(cmd)` across members in the order the spec's
    /// §4.C pipeline_trigger mandates.
    pub fn pipeline_trigger(&mut self, pipeline_id: PipelineId, cmd: TriggerCmd) -> Result<()> {
        let order = self.trigger_order(pipeline_id, cmd)?;
        for id in order {
            self.component_mut(id)?.trigger(cmd)?;
        }
        self.pipeline_mut(pipeline_id)?.apply_trigger(cmd);
        Ok(())
    }

    fn trigger_order(&self, pipeline_id: PipelineId, cmd: TriggerCmd) -> Result<Vec<ComponentId>> {
        let pipeline = self.pipeline(pipeline_id)?;
        let mut order = pipeline.execution_order().to_vec();
        match cmd {
            TriggerCmd::Start | TriggerCmd::Release => {} // upstream-first: execution order is already upstream-first
            TriggerCmd::Stop | TriggerCmd::Pause => order.reverse(),
            TriggerCmd::Reset | TriggerCmd::PreLoad => {} // per-component, order irrelevant
        }
        Ok(order)
    }

    /// Run one tick of every member's `copy()`, topologically ordered, then
    /// refresh the pipeline's `StreamPosition` from its Host/Dai endpoints
    /// (spec §4.C "on each tick, the pipeline updates a caller-supplied
    /// `stream_position` record"). Position refresh never fails the tick:
    /// a pipeline with no Host or no Dai member (e.g. a single-endpoint
    /// pipeline under test) simply reports 0 for the side it lacks.
    pub fn pipeline_tick(&mut self, pipeline_id: PipelineId) -> Result<()> {
        let order = self.pipeline(pipeline_id)?.execution_order().to_vec();
        for id in order {
            let pins = self.pins.get(&id).cloned().unwrap_or_default();
            let sources: Vec<&Buffer> = pins.sources.iter().filter_map(|bid| self.buffers.get(bid)).collect();
            let sinks: Vec<&Buffer> = pins.sinks.iter().filter_map(|bid| self.buffers.get(bid)).collect();

            let status = self.components.get_mut(&id).ok_or(EngineError::InvalidResourceId(id.0))?.copy(&sources, &sinks);
            match status {
                Ok(_) => {}
                Err(EngineError::InvalidState) => {
                    // Component isn't Active this tick (e.g. not yet started); skip it.
                }
                Err(e) => return Err(e),
            }
        }

        let (mut host_frames, mut dai_frames, mut xrun_count) = (0u64, 0u64, 0u32);
        for id in self.pipeline(pipeline_id)?.members() {
            let Some(component) = self.components.get(id) else { continue };
            match component.kind() {
                ComponentKind::Host(_) => host_frames = component.kind().frames_processed().unwrap_or(0),
                ComponentKind::Dai(_) => dai_frames = component.kind().frames_processed().unwrap_or(0),
                _ => continue,
            }
            xrun_count += component.kind().endpoint_xrun_count().unwrap_or(0);
        }
        self.pipeline_mut(pipeline_id)?.update_position(host_frames, dai_frames, xrun_count);
        Ok(())
    }
}
