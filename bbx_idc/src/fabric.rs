//! Point-to-point IDC channel fabric (spec §4.F, §6).
//!
//! Each core owns one payload slot per peer core. This hosted
//! implementation models all cores as OS threads sharing one
//! [`IdcFabric`], so "the target core's IDC register" becomes one
//! [`Slot`] per ordered `(from, to)` pair, guarded by the same
//! BUSY-then-done handshake the reference firmware runs over real
//! registers. There is deliberately no lock on the hot path: the slot's
//! payload is behind a `Mutex` only because this is a hosted
//! simulation standing in for memory-mapped registers + cache
//! maintenance, never touched by the audio `copy()` path itself.

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicI32, Ordering},
    },
    time::{Duration, Instant},
};

use bbx_engine::CoreId;

use crate::{
    error::{IdcError, Result},
    handler::{IDC_STATUS_OK, IdcStatus},
    message::{IDC_TIMEOUT, IdcMessage, SendMode},
};

struct Slot {
    payload: Mutex<Option<IdcMessage>>,
    busy: AtomicBool,
    done: AtomicBool,
    status: AtomicI32,
}

impl Slot {
    fn new() -> Self {
        Self {
            payload: Mutex::new(None),
            busy: AtomicBool::new(false),
            done: AtomicBool::new(false),
            status: AtomicI32::new(0),
        }
    }
}

/// The shared fabric every core's IDC endpoint sends through and polls.
/// Construct one per firmware instance (spec: "a fixed point-to-point
/// channel between every pair of cores").
pub struct IdcFabric {
    core_count: u32,
    slots: HashMap<(CoreId, CoreId), Slot>,
    booted: HashMap<CoreId, AtomicBool>,
}

impl IdcFabric {
    pub fn new(core_count: u32) -> Self {
        let mut slots = HashMap::new();
        let mut booted = HashMap::new();
        for from in 0..core_count {
            booted.insert(CoreId(from), AtomicBool::new(from == 0));
            for to in 0..core_count {
                if from == to {
                    continue;
                }
                slots.insert((CoreId(from), CoreId(to)), Slot::new());
            }
        }
        Self { core_count, slots, booted }
    }

    pub fn core_count(&self) -> u32 {
        self.core_count
    }

    pub fn mark_booted(&self, core: CoreId) {
        if let Some(flag) = self.booted.get(&core) {
            flag.store(true, Ordering::Release);
        }
    }

    fn slot(&self, from: CoreId, to: CoreId) -> Result<&Slot> {
        self.slots.get(&(from, to)).ok_or(IdcError::UnknownCore)
    }

    /// `send_msg` (spec §4.F): clear stale done, publish the payload,
    /// raise BUSY, then wait according to `mode`.
    pub fn send(&self, from: CoreId, to: CoreId, msg: IdcMessage, mode: SendMode) -> Result<IdcStatus> {
        let slot = self.slot(from, to)?;

        slot.done.store(false, Ordering::Relaxed);
        *slot.payload.lock().unwrap() = Some(msg);
        log::trace!("idc: core {:?} -> core {:?} payload flushed", from, to);
        slot.busy.store(true, Ordering::Release);

        match mode {
            SendMode::NonBlocking => Ok(IDC_POSTED),
            SendMode::Blocking => self.poll_done(slot, IDC_TIMEOUT).ok_or(IdcError::Timeout).map(|_| slot.status.load(Ordering::Acquire)),
            SendMode::PowerUp => {
                let booted = self.booted.get(&to).ok_or(IdcError::UnknownCore)?;
                let deadline = Instant::now() + IDC_TIMEOUT;
                while !booted.load(Ordering::Acquire) {
                    if Instant::now() >= deadline {
                        return Err(IdcError::BootTimeout);
                    }
                    std::thread::yield_now();
                }
                Ok(IDC_STATUS_OK)
            }
        }
    }

    fn poll_done(&self, slot: &Slot, timeout: Duration) -> Option<()> {
        let deadline = Instant::now() + timeout;
        loop {
            if slot.done.load(Ordering::Acquire) {
                return Some(());
            }
            if Instant::now() >= deadline {
                return None;
            }
            std::thread::yield_now();
        }
    }

    /// Receiver ISR equivalent: drain every peer slot addressed to `me`
    /// that is currently BUSY, invoking `dispatch` for each and completing
    /// the handshake (spec §4.F "Receiver ISR").
    pub fn drain_inbox<F>(&self, me: CoreId, mut dispatch: F)
    where
        F: FnMut(CoreId, &IdcMessage) -> IdcStatus,
    {
        for from in 0..self.core_count {
            let from = CoreId(from);
            if from == me {
                continue;
            }
            let Ok(slot) = self.slot(from, me) else { continue };
            if !slot.busy.load(Ordering::Acquire) {
                continue;
            }

            log::trace!("idc: core {:?} invalidating slot from core {:?}", me, from);
            let msg = slot.payload.lock().unwrap().take();
            if let Some(msg) = msg {
                let status = dispatch(from, &msg);
                slot.status.store(status, Ordering::Relaxed);
            }
            slot.busy.store(false, Ordering::Relaxed);
            slot.done.store(true, Ordering::Release);
        }
    }
}

/// Returned by a NON_BLOCKING send: the message was posted but no reply
/// was waited for.
pub const IDC_POSTED: IdcStatus = IDC_STATUS_OK;
