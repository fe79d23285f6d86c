//! DSP-initiated notifications posted to the outgoing mailbox (spec §4.E,
//! §7): stream position, xrun, keyword detection. Drained FIFO, but a
//! pending reply may jump the queue if one is urgently needed — replies
//! answer a specific host command and must not be delayed behind a batch
//! of opportunistic notifications.

use std::collections::VecDeque;

use bbx_engine::{ComponentId, PipelineId, StreamPosition};

#[derive(Debug, Clone)]
pub enum Notification {
    StreamPosition { pipeline: PipelineId, position: StreamPosition },
    Xrun { component: ComponentId, xrun_size: i32 },
    KeywordDetected { component: ComponentId, confidence: u16 },
    SecondaryCoreCrashed { core: u32, reason: &'static str },
}

#[derive(Default)]
pub struct NotificationQueue {
    queue: VecDeque<Notification>,
}

impl NotificationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn post(&mut self, notification: Notification) {
        self.queue.push_back(notification);
    }

    /// Drain one notification FIFO. Callers drain this between replies;
    /// a reply in flight is handled separately by the engine and always
    /// takes priority over calling this.
    pub fn drain_one(&mut self) -> Option<Notification> {
        self.queue.pop_front()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drains_in_fifo_order() {
        let mut q = NotificationQueue::new();
        q.post(Notification::Xrun { component: ComponentId(1), xrun_size: -100 });
        q.post(Notification::Xrun { component: ComponentId(2), xrun_size: -200 });

        let first = q.drain_one().unwrap();
        assert!(matches!(first, Notification::Xrun { component: ComponentId(1), .. }));
    }
}
