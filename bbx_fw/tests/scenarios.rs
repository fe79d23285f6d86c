//! End-to-end tests for the six numbered scenarios in spec §8, driven
//! through the fully assembled [`CoreRuntime`] (boot sequence, IPC
//! dispatch, IDC fabric) rather than against a bare `Graph` — the same
//! "build a topology, dispatch over the doorbell, observe the result"
//! shape `bbx_fw_demo`'s main loop uses. Narrower, crate-local unit tests
//! for the same invariants also live alongside each module
//! (`bbx_engine::buffer` for scenario 5, `bbx_idc::fabric` for scenario 6,
//! `bbx_ipc::engine` for scenarios 1/2/4); these exercise the same
//! behaviour through the top-level seam a host integration would use.

use std::{sync::Arc, time::Duration};

use bbx_core::{AudioFormat, FrameFormat};
use bbx_engine::{BufferId, ComponentId, CoreId, PipelineId};
use bbx_fw::boot_core;
use bbx_idc::IdcFabric;
use bbx_ipc::{
    ComponentTypeTag, Direction, IpcDialect, IpcHeader, IpcRequest, Notification, StreamCommand, StreamTriggerCmd, TopologyCommand,
};
use bbx_platform::MockPlatform;
use bbx_sched::SchedulingDomain;

fn fmt() -> AudioFormat {
    AudioFormat::new(FrameFormat::S16Le, 48_000, 2, true)
}

fn header() -> IpcHeader {
    IpcHeader { dialect: IpcDialect::Four, class: 0, command: 0, reply: false }
}

fn timer_domain() -> SchedulingDomain {
    SchedulingDomain::Timer { period: Duration::from_micros(1000) }
}

/// Build a one-core host->DAI playback pipeline (host=10, dai=11,
/// buffer=20, pipeline=1) on an already-booted runtime, through the same
/// IPC command sequence a host driver would send (spec §8 scenario 1's
/// opening command list).
fn build_playback_pipeline(core: &mut bbx_fw::CoreRuntime) {
    let commands = [
        TopologyCommand::NewPipeline { id: PipelineId(1), core: core.core().0, period_us: 1000, priority: 0, frames_per_period: 48 },
        TopologyCommand::NewComponent {
            id: ComponentId(10),
            core: core.core().0,
            kind: ComponentTypeTag::Host,
            direction: Direction::Playback,
            format: fmt(),
            period_frames: 48,
        },
        TopologyCommand::NewComponent {
            id: ComponentId(11),
            core: core.core().0,
            kind: ComponentTypeTag::Dai,
            direction: Direction::Playback,
            format: fmt(),
            period_frames: 48,
        },
        TopologyCommand::NewBuffer {
            id: BufferId(20),
            producer: ComponentId(10),
            consumer: ComponentId(11),
            format: fmt(),
            size_bytes: 768,
            shared: false,
        },
        TopologyCommand::Connect { buffer: BufferId(20) },
        TopologyCommand::BindComponentToPipeline { component: ComponentId(10), pipeline: PipelineId(1) },
        TopologyCommand::BindComponentToPipeline { component: ComponentId(11), pipeline: PipelineId(1) },
        TopologyCommand::PipelineComplete { id: PipelineId(1), source: ComponentId(10), sink: ComponentId(11) },
    ];
    for cmd in commands {
        let reply = core.dispatch(header(), IpcRequest::Topology(cmd));
        assert!(reply.is_ok(), "topology command failed: {:?}", reply.error);
    }
    let reply = core.dispatch(header(), IpcRequest::Stream(StreamCommand::PcmParams { pipeline: PipelineId(1), format: fmt() }));
    assert!(reply.is_ok(), "pcm_params failed: {:?}", reply.error);
}

/// Deposit one full period's worth of non-zero bytes into the host
/// component's ring, standing in for the host's DMA scatter into shared
/// memory (spec §4.A, §6 "the host ring a real target DMA-scatters host
/// pages into").
fn deposit_one_period(core: &bbx_fw::CoreRuntime, host: ComponentId) {
    let ring = core.ipc().graph().host_ring(host).unwrap();
    let period_bytes = fmt().period_bytes(48) as usize;
    let r = ring.write_reserve(period_bytes).unwrap();
    ring.write_into(&r, &vec![0x5Au8; period_bytes]);
    ring.write_commit(period_bytes);
}

/// Scenario 1 (spec §8): host playback, two-component pipeline. All
/// replies carry error=0, and within a couple of ticks a stream-position
/// notification carries `dai_frames >= 48` and `host_frames >= 48`.
#[test]
fn scenario_1_host_playback_two_component_pipeline() {
    let platform = MockPlatform::new();
    let idc = Arc::new(IdcFabric::new(1));
    let mut core = boot_core(CoreId::PRIMARY, &platform, idc, timer_domain());

    build_playback_pipeline(&mut core);
    deposit_one_period(&core, ComponentId(10));
    deposit_one_period(&core, ComponentId(10));

    let reply = core.dispatch(header(), IpcRequest::Stream(StreamCommand::Trigger { pipeline: PipelineId(1), cmd: StreamTriggerCmd::Start }));
    assert!(reply.is_ok(), "trigger(START) failed: {:?}", reply.error);

    core.ipc_mut().tick_pipeline(PipelineId(1)).unwrap();
    core.ipc_mut().tick_pipeline(PipelineId(1)).unwrap();

    let reply = core.dispatch(header(), IpcRequest::Stream(StreamCommand::PositionUpdate { pipeline: PipelineId(1) }));
    assert!(reply.is_ok());

    let mut saw_position = false;
    while let Some(n) = core.ipc_mut().notifications_mut().drain_one() {
        if let Notification::StreamPosition { pipeline, position } = n {
            assert_eq!(pipeline, PipelineId(1));
            assert!(position.host_frames >= 48, "host_frames = {}", position.host_frames);
            assert!(position.dai_frames >= 48, "dai_frames = {}", position.dai_frames);
            saw_position = true;
        }
    }
    assert!(saw_position, "expected a StreamPosition notification after position_update");
}

/// Scenario 2 (spec §8): xrun propagation. The host withholds every
/// period's deposit; starting immediately, every tick produces exactly
/// one `Notification::Xrun` for the host component, the DAI keeps
/// ticking, and nothing panics.
#[test]
fn scenario_2_xrun_propagation() {
    let platform = MockPlatform::new();
    let idc = Arc::new(IdcFabric::new(1));
    let mut core = boot_core(CoreId::PRIMARY, &platform, idc, timer_domain());

    build_playback_pipeline(&mut core);
    let reply = core.dispatch(header(), IpcRequest::Stream(StreamCommand::Trigger { pipeline: PipelineId(1), cmd: StreamTriggerCmd::Start }));
    assert!(reply.is_ok());

    for _ in 0..4 {
        core.ipc_mut().tick_pipeline(PipelineId(1)).unwrap();
    }

    let mut xrun_count = 0;
    while let Some(n) = core.ipc_mut().notifications_mut().drain_one() {
        if let Notification::Xrun { component, xrun_size } = n {
            assert_eq!(component, ComponentId(10));
            assert!(xrun_size < 0);
            xrun_count += 1;
        }
    }
    assert_eq!(xrun_count, 4);
    assert_eq!(core.ipc().graph().pipeline(PipelineId(1)).unwrap().state(), bbx_engine::PipelineState::Active);
}

/// Scenario 3 (spec §8): a pipeline owned by core 1 is triggered from
/// core 0's dispatch and takes effect across the IDC trampoline within
/// one reply.
#[test]
fn scenario_3_cross_core_pipeline_trigger() {
    let idc = Arc::new(IdcFabric::new(2));
    let platform0 = MockPlatform::new();
    let platform1 = MockPlatform::new();
    let mut core0 = boot_core(CoreId(0), &platform0, idc.clone(), timer_domain());
    let mut core1 = boot_core(CoreId(1), &platform1, idc.clone(), timer_domain());

    let commands = [
        TopologyCommand::NewPipeline { id: PipelineId(2), core: 1, period_us: 1000, priority: 0, frames_per_period: 48 },
        TopologyCommand::NewComponent {
            id: ComponentId(30),
            core: 1,
            kind: ComponentTypeTag::Host,
            direction: Direction::Playback,
            format: fmt(),
            period_frames: 48,
        },
        TopologyCommand::BindComponentToPipeline { component: ComponentId(30), pipeline: PipelineId(2) },
    ];
    for cmd in commands {
        assert!(core1.dispatch(header(), IpcRequest::Topology(cmd)).is_ok());
    }
    assert!(
        core1
            .dispatch(header(), IpcRequest::Topology(TopologyCommand::PipelineComplete { id: PipelineId(2), source: ComponentId(30), sink: ComponentId(30) }))
            .is_ok()
    );
    assert!(core1.dispatch(header(), IpcRequest::Stream(StreamCommand::PcmParams { pipeline: PipelineId(2), format: fmt() })).is_ok());

    // Core 0 never owns pipeline 2's components, only its topology
    // announcement — enough for `dispatch_trigger` to resolve the owner.
    assert!(
        core0
            .dispatch(header(), IpcRequest::Topology(TopologyCommand::NewPipeline { id: PipelineId(2), core: 1, period_us: 1000, priority: 0, frames_per_period: 48 }))
            .is_ok()
    );

    let receiver = std::thread::spawn(move || {
        loop {
            core1.drain_idc_inbox();
            if core1.ipc().graph().pipeline(PipelineId(2)).unwrap().state() == bbx_engine::PipelineState::Active {
                return core1;
            }
            std::thread::yield_now();
        }
    });

    let reply = core0.dispatch_trigger(header(), PipelineId(2), StreamTriggerCmd::Start);
    assert!(reply.is_ok(), "cross-core trigger failed: {:?}", reply.error);

    let core1 = receiver.join().expect("receiver thread panicked");
    assert_eq!(core1.ipc().graph().pipeline(PipelineId(2)).unwrap().state(), bbx_engine::PipelineState::Active);
}

/// Scenario 4 (spec §8): topology error — `connect` before the target
/// buffer exists is rejected with no state created, and the identical
/// command sequence then succeeds once the buffer is created.
#[test]
fn scenario_4_topology_error_then_recovery() {
    let platform = MockPlatform::new();
    let idc = Arc::new(IdcFabric::new(1));
    let mut core = boot_core(CoreId::PRIMARY, &platform, idc, timer_domain());

    let reply = core.dispatch(header(), IpcRequest::Topology(TopologyCommand::Connect { buffer: BufferId(20) }));
    assert!(!reply.is_ok());

    for cmd in [
        TopologyCommand::NewComponent {
            id: ComponentId(10),
            core: 0,
            kind: ComponentTypeTag::Host,
            direction: Direction::Playback,
            format: fmt(),
            period_frames: 48,
        },
        TopologyCommand::NewComponent {
            id: ComponentId(11),
            core: 0,
            kind: ComponentTypeTag::Dai,
            direction: Direction::Playback,
            format: fmt(),
            period_frames: 48,
        },
        TopologyCommand::NewBuffer {
            id: BufferId(20),
            producer: ComponentId(10),
            consumer: ComponentId(11),
            format: fmt(),
            size_bytes: 768,
            shared: false,
        },
    ] {
        assert!(core.dispatch(header(), IpcRequest::Topology(cmd)).is_ok());
    }

    let reply = core.dispatch(header(), IpcRequest::Topology(TopologyCommand::Connect { buffer: BufferId(20) }));
    assert!(reply.is_ok(), "connect should succeed once the buffer exists: {:?}", reply.error);
}

/// Scenario 5 (spec §8): a producer commits exactly `size(B)` bytes, then
/// a further 1-byte reservation fails with no pointer moving past the
/// end, against a buffer reached through the assembled runtime (not a
/// bare `Buffer` constructed in isolation).
#[test]
fn scenario_5_ring_buffer_full_at_boundary() {
    let platform = MockPlatform::new();
    let idc = Arc::new(IdcFabric::new(1));
    let mut core = boot_core(CoreId::PRIMARY, &platform, idc, timer_domain());

    for cmd in [
        TopologyCommand::NewComponent {
            id: ComponentId(10),
            core: 0,
            kind: ComponentTypeTag::Host,
            direction: Direction::Playback,
            format: fmt(),
            period_frames: 48,
        },
        TopologyCommand::NewComponent {
            id: ComponentId(11),
            core: 0,
            kind: ComponentTypeTag::Dai,
            direction: Direction::Playback,
            format: fmt(),
            period_frames: 48,
        },
        TopologyCommand::NewBuffer {
            id: BufferId(20),
            producer: ComponentId(10),
            consumer: ComponentId(11),
            format: fmt(),
            size_bytes: 768,
            shared: false,
        },
        TopologyCommand::Connect { buffer: BufferId(20) },
    ] {
        assert!(core.dispatch(header(), IpcRequest::Topology(cmd)).is_ok());
    }

    let buffer = core.ipc().graph().buffer(BufferId(20)).unwrap();
    let r = buffer.write_reserve(768).unwrap();
    buffer.write_into(&r, &vec![1u8; 768]);
    buffer.write_commit(768);

    assert_eq!(buffer.available_data(), 768);
    assert_eq!(buffer.free_space(), 0);
    assert!(buffer.write_reserve(1).is_err(), "a full ring must reject a further reservation, not wrap past the end");
}

/// Scenario 6 (spec §8): a BLOCKING IDC send to a core that never drains
/// its inbox (standing in for "in an infinite loop with interrupts
/// disabled") times out at `IDC_TIMEOUT` and is reported as an error; the
/// target core is not forcibly reset by this subsystem — that is host
/// policy, out of scope here.
#[test]
fn scenario_6_idc_timeout_with_unresponsive_core() {
    let idc = Arc::new(IdcFabric::new(2));
    let platform0 = MockPlatform::new();
    let mut core0 = boot_core(CoreId(0), &platform0, idc.clone(), timer_domain());
    idc.mark_booted(CoreId(1)); // booted, but nothing ever calls drain_idc_inbox for it

    // Core 0's only knowledge of pipeline 9 is its ownership announcement;
    // it is never actually built on core 1, which never wakes up.
    let reply = core0.dispatch(
        header(),
        IpcRequest::Topology(TopologyCommand::NewPipeline { id: PipelineId(9), core: 1, period_us: 1000, priority: 0, frames_per_period: 48 }),
    );
    assert!(reply.is_ok(), "{:?}", reply.error);

    let started = std::time::Instant::now();
    let reply = core0.dispatch_trigger(header(), PipelineId(9), StreamTriggerCmd::Start);
    let elapsed = started.elapsed();

    assert!(!reply.is_ok(), "a send with no receiver draining it must surface as an error");
    assert!(elapsed >= bbx_idc::IDC_TIMEOUT, "must not return before the timeout elapses: {elapsed:?}");
    assert!(elapsed < bbx_idc::IDC_TIMEOUT + Duration::from_millis(50), "must not hang well past the timeout: {elapsed:?}");
}
