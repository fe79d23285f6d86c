//! Scheduling domains backing the low-latency scheduler (spec §4.D).
//!
//! A domain is the hardware source of periodic ticks. On real hardware this
//! is a timer peripheral or a set of DMA channels in scatter-gather mode;
//! here it is modeled as the shape of "what fired this interrupt", decoupled
//! from the actual timer/DMA register programming, which lives behind
//! [`bbx_platform`]'s `TimerPlatform`/`DmaPlatform` traits.

use std::time::Duration;

/// Which hardware source drives a low-latency scheduler's periodic tick.
#[derive(Debug, Clone)]
pub enum SchedulingDomain {
    /// A single hardware timer fires every `period`.
    Timer { period: Duration },
    /// A set of DMA channels collectively fire every `period`; each
    /// channel completion delivers one period's worth of data for the
    /// task(s) bound to it.
    DmaMultiChannel { period: Duration, channels: Vec<u32> },
}

impl SchedulingDomain {
    pub fn period(&self) -> Duration {
        match self {
            SchedulingDomain::Timer { period } => *period,
            SchedulingDomain::DmaMultiChannel { period, .. } => *period,
        }
    }

    /// Whether the tick delivered for `channel` satisfies this domain's
    /// readiness condition. Timer domains have no channel concept, so
    /// every task bound to them is ready on every tick.
    pub fn channel_ready(&self, fired: &[u32], channel: Option<u32>) -> bool {
        match (self, channel) {
            (SchedulingDomain::Timer { .. }, _) => true,
            (SchedulingDomain::DmaMultiChannel { .. }, None) => true,
            (SchedulingDomain::DmaMultiChannel { .. }, Some(ch)) => fired.contains(&ch),
        }
    }
}
