//! One core's runtime: a low-latency scheduler, an EDF scheduler, this
//! core's [`IpcEngine`], and its endpoint on the shared [`IdcFabric`]
//! (spec §5 "Each core hosts one low-latency scheduler and one EDF
//! scheduler").
//!
//! Command processing that targets a pipeline owned by a different core
//! is trampolined through IDC (spec §4.F) rather than touching that
//! core's graph directly — matching "only the owning core may mutate a
//! component's private state; other cores request work via IDC."

use std::sync::Arc;

use bbx_engine::{CoreId, PipelineId, TriggerCmd};
use bbx_idc::{IDC_STATUS_OK, IdcError, IdcFabric, IdcHandler, IdcMessage, IdcMsgType, IdcPayload, IdcStatus, SendMode};
use bbx_ipc::{IpcEngine, IpcError, IpcHeader, IpcReply, IpcRequest, Notification, StreamCommand, StreamTriggerCmd};
use bbx_sched::{EdfScheduler, LowLatencyScheduler, SchedError, SchedulerClass, SchedulerOps, SchedulingDomain, TaskId};

fn trigger_to_phase(cmd: StreamTriggerCmd) -> u32 {
    match cmd {
        StreamTriggerCmd::Start => 0,
        StreamTriggerCmd::Stop => 1,
        StreamTriggerCmd::Pause => 2,
        StreamTriggerCmd::Release => 3,
        StreamTriggerCmd::Reset => 4,
    }
}

fn phase_to_trigger(phase: u32) -> Option<TriggerCmd> {
    match phase {
        0 => Some(TriggerCmd::Start),
        1 => Some(TriggerCmd::Stop),
        2 => Some(TriggerCmd::Pause),
        3 => Some(TriggerCmd::Release),
        4 => Some(TriggerCmd::Reset),
        _ => None,
    }
}

pub struct CoreRuntime {
    core: CoreId,
    low_latency: LowLatencyScheduler,
    edf: EdfScheduler,
    ipc: IpcEngine,
    idc: Arc<IdcFabric>,
}

impl CoreRuntime {
    pub fn new(core: CoreId, idc: Arc<IdcFabric>, low_latency_domain: SchedulingDomain, mailbox_capacity: usize) -> Self {
        Self { core, low_latency: LowLatencyScheduler::new(low_latency_domain), edf: EdfScheduler::new(), ipc: IpcEngine::new(core, mailbox_capacity), idc }
    }

    pub fn core(&self) -> CoreId {
        self.core
    }

    pub fn ipc(&self) -> &IpcEngine {
        &self.ipc
    }

    pub fn ipc_mut(&mut self) -> &mut IpcEngine {
        &mut self.ipc
    }

    pub fn low_latency_mut(&mut self) -> &mut LowLatencyScheduler {
        &mut self.low_latency
    }

    pub fn edf_mut(&mut self) -> &mut EdfScheduler {
        &mut self.edf
    }

    /// Answer a topology/power/fw-ready request: always local, these
    /// never cross cores on their own (spec §6 `new_component`/
    /// `new_pipeline` carry their own target core and are rejected by
    /// `bbx_ipc::topology::apply` if it doesn't match).
    pub fn dispatch(&mut self, header: IpcHeader, request: IpcRequest) -> IpcReply {
        self.ipc.dispatch(header, request)
    }

    /// Trigger a pipeline, trampolining via IDC if it's owned by a peer
    /// core (spec §8 scenario 3).
    pub fn dispatch_trigger(&mut self, header: IpcHeader, pipeline: PipelineId, cmd: StreamTriggerCmd) -> IpcReply {
        let mut reply_header = header;
        reply_header.reply = true;

        let owner = match self.ipc.graph().pipeline(pipeline) {
            Ok(p) => p.core(),
            Err(e) => return IpcReply { header: reply_header, error: Some(e.into()), value: None },
        };

        if owner == self.core {
            return self.ipc.dispatch(header, IpcRequest::Stream(StreamCommand::Trigger { pipeline, cmd }));
        }

        let phase = trigger_to_phase(cmd);
        let msg = IdcMessage::new(IdcMsgType::PipelineState, 0, IdcPayload::PipelineState { pipeline, phase });
        match self.idc.send(self.core, owner, msg, SendMode::Blocking) {
            Ok(status) if status == IDC_STATUS_OK => IpcReply { header: reply_header, error: None, value: None },
            Ok(_) => IpcReply { header: reply_header, error: Some(IpcError::InvalidRequest), value: None },
            Err(e) => {
                log::warn!("core {:?}: trigger trampoline to core {:?} failed: {e}", self.core, owner);
                IpcReply { header: reply_header, error: Some(e.into()), value: None }
            }
        }
    }

    /// Cancel a task owned by a peer core (spec §4.D "Cancellation":
    /// synchronous on the owning core, asynchronous across cores, bounded
    /// by `IDC_TIMEOUT`). Tasks owned by this core are cancelled directly
    /// through the matching scheduler's `SchedulerOps::cancel_task`.
    pub fn cancel_task_cross_core(&mut self, owner: CoreId, task: TaskId, class: SchedulerClass) -> bbx_sched::Result<()> {
        if owner == self.core {
            return match class {
                SchedulerClass::LowLatency => self.low_latency.cancel_task(task),
                SchedulerClass::Edf => self.edf.cancel_task(task),
            };
        }

        let msg = IdcMessage::new(IdcMsgType::TaskCancel, 0, IdcPayload::TaskCancel { task, class });
        match self.idc.send(self.core, owner, msg, SendMode::Blocking) {
            Ok(status) if status == IDC_STATUS_OK => Ok(()),
            Ok(_) => Err(SchedError::UnknownTask),
            Err(IdcError::Timeout) => Err(SchedError::CancelTimeout),
            Err(e) => {
                log::warn!("core {:?}: cancel trampoline to core {:?} failed: {e}", self.core, owner);
                Err(SchedError::CancelTimeout)
            }
        }
    }

    /// Drain every peer's IDC slot addressed to this core (spec §4.F
    /// "Receiver ISR"). Call once per scheduler tick, not on the audio
    /// path itself.
    pub fn drain_idc_inbox(&mut self) {
        let idc = self.idc.clone();
        idc.drain_inbox(self.core, |from, msg| self.handle_idc(from, msg));
    }
}

impl IdcHandler for CoreRuntime {
    fn handle_idc(&mut self, from: CoreId, msg: &IdcMessage) -> IdcStatus {
        match (msg.msg_type, msg.payload) {
            (IdcMsgType::PipelineState, IdcPayload::PipelineState { pipeline, phase }) => match phase_to_trigger(phase) {
                Some(cmd) => match self.ipc.graph_mut().pipeline_trigger(pipeline, cmd) {
                    Ok(()) => IDC_STATUS_OK,
                    Err(e) => {
                        log::warn!("core {:?}: delegated trigger for pipeline {:?} failed: {e}", self.core, pipeline);
                        -1
                    }
                },
                None => -1,
            },
            (IdcMsgType::TaskCancel, IdcPayload::TaskCancel { task, class }) => {
                let result = match class {
                    SchedulerClass::LowLatency => self.low_latency.cancel_task(task),
                    SchedulerClass::Edf => self.edf.cancel_task(task),
                };
                match result {
                    Ok(()) => IDC_STATUS_OK,
                    Err(e) => {
                        log::warn!("core {:?}: cross-core cancel of {task:?} failed: {e}", self.core);
                        -1
                    }
                }
            }
            (IdcMsgType::ComponentOp, IdcPayload::ComponentOp { component, op }) => match op {
                bbx_idc::ComponentOpKind::SetValue { key, value } => {
                    let result = self.ipc.graph_mut().component_mut(component).and_then(|c| c.kind_mut().set_attribute(key, value));
                    match result {
                        Ok(()) => IDC_STATUS_OK,
                        Err(e) => {
                            log::warn!("core {:?}: delegated set_attribute on {component:?} failed: {e}", self.core);
                            -1
                        }
                    }
                }
                other => {
                    log::debug!("core {:?}: received component op {other:?} for {component:?} from {from:?}", self.core);
                    IDC_STATUS_OK
                }
            },
            (IdcMsgType::SecondaryCoreCrashed, IdcPayload::SecondaryCoreCrashed { reason }) => {
                log::error!("core {:?}: secondary core {from:?} crashed: {reason:?}", self.core);
                self.ipc.notifications_mut().post(Notification::SecondaryCoreCrashed {
                    core: from.0,
                    reason: match reason {
                        bbx_idc::CrashReason::Watchdog => "watchdog",
                        bbx_idc::CrashReason::Exception => "exception",
                    },
                });
                IDC_STATUS_OK
            }
            _ => {
                log::warn!("core {:?}: unhandled idc message type {:?} from {from:?}", self.core, msg.msg_type);
                -1
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use bbx_core::{AudioFormat, FrameFormat};
    use bbx_engine::ComponentId;
    use bbx_ipc::{ComponentTypeTag, Direction, TopologyCommand};

    use super::*;

    fn fmt() -> AudioFormat {
        AudioFormat::new(FrameFormat::S16Le, 48_000, 2, true)
    }

    fn build_single_component_pipeline(runtime: &mut CoreRuntime, pipeline: PipelineId, component: ComponentId) {
        let header = IpcHeader { dialect: bbx_ipc::IpcDialect::Four, class: 0, command: 0, reply: false };
        for cmd in [
            TopologyCommand::NewPipeline { id: pipeline, core: runtime.core().0, period_us: 1000, priority: 0, frames_per_period: 48 },
            TopologyCommand::NewComponent {
                id: component,
                core: runtime.core().0,
                kind: ComponentTypeTag::Host,
                direction: Direction::Playback,
                format: fmt(),
                period_frames: 48,
            },
            TopologyCommand::BindComponentToPipeline { component, pipeline },
        ] {
            let reply = runtime.dispatch(header, IpcRequest::Topology(cmd));
            assert!(reply.is_ok(), "{:?}", reply.error);
        }
        // A single-member pipeline's source and sink are the same component.
        let reply = runtime.dispatch(
            header,
            IpcRequest::Topology(TopologyCommand::PipelineComplete { id: pipeline, source: component, sink: component }),
        );
        assert!(reply.is_ok(), "{:?}", reply.error);

        let reply = runtime.dispatch(header, IpcRequest::Stream(StreamCommand::PcmParams { pipeline, format: fmt() }));
        assert!(reply.is_ok(), "{:?}", reply.error);
    }

    /// Scenario 3 (spec §8): a host trigger for a pipeline owned by core 1
    /// is trampolined from core 0 over IDC and applied on core 1's graph.
    #[test]
    fn cross_core_trigger_is_trampolined_over_idc() {
        let fabric = Arc::new(IdcFabric::new(2));
        let mut core0 = CoreRuntime::new(CoreId(0), fabric.clone(), SchedulingDomain::Timer { period: std::time::Duration::from_millis(1) }, 512);
        let mut core1 = CoreRuntime::new(CoreId(1), fabric.clone(), SchedulingDomain::Timer { period: std::time::Duration::from_millis(1) }, 512);
        fabric.mark_booted(CoreId(1));

        build_single_component_pipeline(&mut core1, PipelineId(1), ComponentId(10));

        // Core 0 only ever saw the pipeline's topology announcement, never
        // its components: enough to resolve ownership for the trampoline.
        let header = IpcHeader { dialect: bbx_ipc::IpcDialect::Four, class: 0, command: 0, reply: false };
        let reply = core0.dispatch(
            header,
            IpcRequest::Topology(TopologyCommand::NewPipeline { id: PipelineId(1), core: 1, period_us: 1000, priority: 0, frames_per_period: 48 }),
        );
        assert!(reply.is_ok(), "{:?}", reply.error);

        let receiver = std::thread::spawn(move || {
            loop {
                core1.drain_idc_inbox();
                if core1.ipc().graph().pipeline(PipelineId(1)).unwrap().state() == bbx_engine::PipelineState::Active {
                    return core1;
                }
                std::thread::yield_now();
            }
        });

        let header = IpcHeader { dialect: bbx_ipc::IpcDialect::Four, class: 0, command: 0, reply: false };
        let reply = core0.dispatch_trigger(header, PipelineId(1), StreamTriggerCmd::Start);
        assert!(reply.is_ok(), "{:?}", reply.error);

        let core1 = receiver.join().unwrap();
        assert_eq!(core1.ipc().graph().pipeline(PipelineId(1)).unwrap().state(), bbx_engine::PipelineState::Active);
    }

    /// Cancelling a task owned by this core takes effect synchronously,
    /// no IDC round trip involved (spec §4.D "synchronous on the owning core").
    #[test]
    fn local_cancel_is_synchronous() {
        let fabric = Arc::new(IdcFabric::new(1));
        let mut core0 = CoreRuntime::new(CoreId(0), fabric, SchedulingDomain::Timer { period: std::time::Duration::from_millis(1) }, 512);
        core0
            .low_latency_mut()
            .task_init(bbx_sched::Task::new(TaskId(1), SchedulerClass::LowLatency, 0, std::time::Duration::from_micros(1000), || {
                bbx_sched::TaskResult::Ok
            }))
            .unwrap();

        core0.cancel_task_cross_core(CoreId(0), TaskId(1), SchedulerClass::LowLatency).unwrap();
        assert_eq!(core0.low_latency_mut().task_state(TaskId(1)), Some(bbx_sched::TaskState::Cancel));
    }

    /// Scenario (spec §4.D): cancelling a task owned by a peer core is
    /// forwarded via IDC and blocks until the target core acknowledges.
    #[test]
    fn cross_core_cancel_is_trampolined_over_idc() {
        let fabric = Arc::new(IdcFabric::new(2));
        let mut core0 = CoreRuntime::new(CoreId(0), fabric.clone(), SchedulingDomain::Timer { period: std::time::Duration::from_millis(1) }, 512);
        let mut core1 = CoreRuntime::new(CoreId(1), fabric.clone(), SchedulingDomain::Timer { period: std::time::Duration::from_millis(1) }, 512);
        fabric.mark_booted(CoreId(1));

        core1
            .edf_mut()
            .task_init(bbx_sched::Task::new(TaskId(7), SchedulerClass::Edf, 0, std::time::Duration::from_millis(50), || {
                bbx_sched::TaskResult::Ok
            }))
            .unwrap();

        let receiver = std::thread::spawn(move || {
            loop {
                core1.drain_idc_inbox();
                if core1.edf_mut().task_state(TaskId(7)) == Some(bbx_sched::TaskState::Cancel) {
                    return core1;
                }
                std::thread::yield_now();
            }
        });

        core0.cancel_task_cross_core(CoreId(1), TaskId(7), SchedulerClass::Edf).unwrap();
        let mut core1 = receiver.join().unwrap();
        assert_eq!(core1.edf_mut().task_state(TaskId(7)), Some(bbx_sched::TaskState::Cancel));
    }

    /// A BLOCKING cancel with no receiver draining its inbox times out
    /// and maps onto `SchedError::CancelTimeout` (spec §4.D, §7: cross-core
    /// timeouts are logged and surfaced, never silently dropped).
    #[test]
    fn cross_core_cancel_times_out_with_no_receiver() {
        let fabric = Arc::new(IdcFabric::new(2));
        let mut core0 = CoreRuntime::new(CoreId(0), fabric.clone(), SchedulingDomain::Timer { period: std::time::Duration::from_millis(1) }, 512);
        fabric.mark_booted(CoreId(1));

        let result = core0.cancel_task_cross_core(CoreId(1), TaskId(3), SchedulerClass::LowLatency);
        assert!(matches!(result, Err(SchedError::CancelTimeout)));
    }
}
