//! Boot sequence (SPEC_FULL §6, "known base addresses for each window"):
//! the order this crate brings a core's runtime up in, once past the
//! out-of-scope firmware-image load.
//!
//! Real hardware interleaves this with MMU/cache-line setup and a
//! platform-specific clock tree; the order itself — cache lines, clock,
//! timers, schedulers, IPC, IDC, then an empty component graph ready for
//! the host's topology — is what's preserved here.

use std::sync::Arc;

use bbx_engine::CoreId;
use bbx_idc::IdcFabric;
use bbx_platform::{CachePlatform, PowerPlatform, TimerPlatform};
use bbx_sched::SchedulingDomain;

use crate::core_runtime::CoreRuntime;

pub const DEFAULT_MAILBOX_CAPACITY: usize = 4096;

/// Bring one core's runtime up in the documented order and return it
/// ready to accept topology commands.
pub fn boot_core<P>(core: CoreId, platform: &P, idc: Arc<IdcFabric>, low_latency_domain: SchedulingDomain) -> CoreRuntime
where
    P: CachePlatform + TimerPlatform + PowerPlatform,
{
    log::info!("core {core:?}: boot start");

    // 1. Cache lines: nothing to invalidate yet, but this is the point a
    //    real target would reset its cache controller.
    platform.flush_invalidate_range(0, 0);
    log::debug!("core {core:?}: cache lines reset");

    // 2. Platform clock / timers.
    platform.start(low_latency_domain.period());
    log::debug!("core {core:?}: timer armed at {:?}", low_latency_domain.period());

    // 3. Wake the core on the power rail (no-op for the primary core,
    //    which the platform brings up awake).
    if !core.is_primary() {
        if let Err(e) = platform.wake_core(core.0) {
            log::warn!("core {core:?}: wake_core failed: {e}");
        }
    }

    // 4. Schedulers, IPC engine, IDC endpoint: all constructed together,
    //    spec's ordering is a logical one (a scheduler with nothing to
    //    run is inert either way).
    let runtime = CoreRuntime::new(core, idc.clone(), low_latency_domain, DEFAULT_MAILBOX_CAPACITY);

    // 5. Announce this core as booted so PowerUp-mode IDC sends targeting
    //    it no longer block.
    idc.mark_booted(core);

    log::info!("core {core:?}: boot complete, component graph empty");
    runtime
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use bbx_platform::MockPlatform;

    use super::*;

    #[test]
    fn boot_core_marks_itself_booted_on_the_fabric() {
        let platform = MockPlatform::new();
        let idc = Arc::new(IdcFabric::new(2));
        let runtime = boot_core(CoreId(1), &platform, idc.clone(), SchedulingDomain::Timer { period: Duration::from_micros(1000) });
        assert_eq!(runtime.core(), CoreId(1));
        assert!(platform.is_core_awake(1));
    }
}
