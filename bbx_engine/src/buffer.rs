//! Lockless single-producer/single-consumer ring buffer between two
//! components.
//!
//! This generalizes [`bbx_core::spsc`]'s cache-padded release/acquire
//! discipline from a typed element ring to the firmware's raw byte ring:
//! reservations are variable-sized, and the `shared` flavour interleaves a
//! cache flush/invalidate around the pointer handoff instead of relying on
//! the host's cache coherency. Same two atomics, same "logical position can
//! run to 2xsize so that `write == read` is unambiguously empty" trick as
//! the reference ring_buffer implementation.

#[cfg(not(loom))]
use std::sync::atomic::{AtomicUsize, Ordering};

#[cfg(loom)]
use loom::sync::atomic::{AtomicUsize, Ordering};

use bbx_core::AudioFormat;

use crate::{
    error::{EngineError, Result},
    ids::{BufferId, ComponentId},
};

const NONE_RESERVATION: usize = usize::MAX;

#[repr(align(64))]
struct CachePadded<T>(T);

impl<T> core::ops::Deref for CachePadded<T> {
    type Target = T;
    #[inline]
    fn deref(&self) -> &T {
        &self.0
    }
}

/// A contiguous byte range handed to the producer or consumer.
///
/// `wrap_start`/`wrap_size` describe a second contiguous region at the start
/// of the ring when the first region runs off the end; callers loop over
/// both to fill/drain a reservation that straddles the wrap point.
pub struct Reservation {
    pub offset: usize,
    pub size: usize,
    pub wrap_offset: usize,
    pub wrap_size: usize,
}

/// Fixed-size byte ring connecting exactly one producer component to one
/// consumer component.
pub struct Buffer {
    id: BufferId,
    producer: ComponentId,
    consumer: ComponentId,
    format: AudioFormat,
    data: Box<[u8]>,
    size: usize,

    /// Logical positions range over `[0, 2*size)`; `write == read` means
    /// empty, `write == read + size` means full. See the reference
    /// `ring_buffer.h` rationale this mirrors.
    read_pos: CachePadded<AtomicUsize>,
    write_pos: CachePadded<AtomicUsize>,

    write_reserved: AtomicUsize,
    read_reserved: AtomicUsize,

    min_free_space: usize,
    min_available: usize,
    shared: bool,
    overrun_permitted: bool,
    underrun_permitted: bool,
}

// SAFETY: the byte storage is only ever touched through the reserve/commit
// API, which the single-outstanding-reservation invariant keeps exclusive
// per side; the ring pointers are atomics with release/acquire ordering.
unsafe impl Send for Buffer {}
unsafe impl Sync for Buffer {}

impl Buffer {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: BufferId,
        producer: ComponentId,
        consumer: ComponentId,
        format: AudioFormat,
        size: usize,
        shared: bool,
        underrun_permitted: bool,
        overrun_permitted: bool,
    ) -> Self {
        Self {
            id,
            producer,
            consumer,
            format,
            data: vec![0u8; size].into_boxed_slice(),
            size,
            read_pos: CachePadded(AtomicUsize::new(0)),
            write_pos: CachePadded(AtomicUsize::new(0)),
            write_reserved: AtomicUsize::new(NONE_RESERVATION),
            read_reserved: AtomicUsize::new(NONE_RESERVATION),
            min_free_space: 0,
            min_available: 0,
            shared,
            underrun_permitted,
            overrun_permitted,
        }
    }

    pub fn id(&self) -> BufferId {
        self.id
    }

    pub fn producer(&self) -> ComponentId {
        self.producer
    }

    pub fn consumer(&self) -> ComponentId {
        self.consumer
    }

    pub fn format(&self) -> AudioFormat {
        self.format
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn set_hints(&mut self, min_free_space: usize, min_available: usize) {
        self.min_free_space = min_free_space;
        self.min_available = min_available;
    }

    pub fn underrun_permitted(&self) -> bool {
        self.underrun_permitted
    }

    pub fn overrun_permitted(&self) -> bool {
        self.overrun_permitted
    }

    /// Bytes available for the consumer to read right now.
    #[inline]
    pub fn available_data(&self) -> usize {
        let w = self.write_pos.load(Ordering::Acquire);
        let r = self.read_pos.load(Ordering::Acquire);
        w.wrapping_sub(r)
    }

    /// Bytes the producer can write right now.
    #[inline]
    pub fn free_space(&self) -> usize {
        self.size - self.available_data()
    }

    pub fn available_frames(&self) -> usize {
        self.available_data() / self.format.frame_bytes() as usize
    }

    pub fn free_frames(&self) -> usize {
        self.free_space() / self.format.frame_bytes() as usize
    }

    /// Hand the producer a contiguous region of at least `size` bytes.
    ///
    /// Only one reservation may be outstanding at a time on the write side.
    pub fn write_reserve(&self, size: usize) -> Result<Reservation> {
        if self.write_reserved.load(Ordering::Relaxed) != NONE_RESERVATION {
            return Err(EngineError::ReservationOutstanding);
        }
        if size > self.free_space() {
            return Err(EngineError::InsufficientSpace);
        }

        let w = self.write_pos.load(Ordering::Relaxed);
        let offset = w % self.size;
        let first = size.min(self.size - offset);
        let rest = size - first;

        self.write_reserved.store(size, Ordering::Relaxed);
        Ok(Reservation {
            offset,
            size: first,
            wrap_offset: 0,
            wrap_size: rest,
        })
    }

    /// Publish `min(actual, reserved)` bytes and advance the write pointer.
    ///
    /// If the buffer is cross-core, flush the written range before the
    /// release-order pointer store so the consumer's subsequent invalidate
    /// sees committed data, never a torn write.
    pub fn write_commit(&self, actual: usize) {
        let reserved = self.write_reserved.swap(NONE_RESERVATION, Ordering::Relaxed);
        if reserved == NONE_RESERVATION {
            return;
        }
        let actual = actual.min(reserved);

        if self.shared {
            self.flush_range();
        }

        let w = self.write_pos.load(Ordering::Relaxed);
        self.write_pos.store(w.wrapping_add(actual), Ordering::Release);
    }

    /// Hand the consumer a contiguous region of at least `size` bytes.
    pub fn read_reserve(&self, size: usize) -> Result<Reservation> {
        if self.read_reserved.load(Ordering::Relaxed) != NONE_RESERVATION {
            return Err(EngineError::ReservationOutstanding);
        }
        if size > self.available_data() {
            return Err(EngineError::InsufficientSpace);
        }

        if self.shared {
            self.invalidate_range();
        }

        let r = self.read_pos.load(Ordering::Relaxed);
        let offset = r % self.size;
        let first = size.min(self.size - offset);
        let rest = size - first;

        self.read_reserved.store(size, Ordering::Relaxed);
        Ok(Reservation {
            offset,
            size: first,
            wrap_offset: 0,
            wrap_size: rest,
        })
    }

    pub fn read_commit(&self, actual: usize) {
        let reserved = self.read_reserved.swap(NONE_RESERVATION, Ordering::Relaxed);
        if reserved == NONE_RESERVATION {
            return;
        }
        let actual = actual.min(reserved);
        let r = self.read_pos.load(Ordering::Relaxed);
        self.read_pos.store(r.wrapping_add(actual), Ordering::Release);
    }

    /// Copy bytes into the region described by a prior [`write_reserve`].
    ///
    /// # Safety
    /// Caller must pass the `Reservation` returned by a still-outstanding
    /// `write_reserve` on this buffer and a `src` slice no longer than its
    /// total size.
    pub fn write_into(&self, reservation: &Reservation, src: &[u8]) {
        let data = self.data_mut_slice();
        let first = reservation.size.min(src.len());
        data[reservation.offset..reservation.offset + first].copy_from_slice(&src[..first]);
        if reservation.wrap_size > 0 && src.len() > first {
            let remaining = (src.len() - first).min(reservation.wrap_size);
            data[0..remaining].copy_from_slice(&src[first..first + remaining]);
        }
    }

    /// Copy bytes out of the region described by a prior [`read_reserve`].
    pub fn read_from(&self, reservation: &Reservation, dst: &mut [u8]) {
        let data = self.data_slice();
        let first = reservation.size.min(dst.len());
        dst[..first].copy_from_slice(&data[reservation.offset..reservation.offset + first]);
        if reservation.wrap_size > 0 && dst.len() > first {
            let remaining = (dst.len() - first).min(reservation.wrap_size);
            dst[first..first + remaining].copy_from_slice(&data[0..remaining]);
        }
    }

    #[allow(clippy::mut_from_ref)]
    fn data_mut_slice(&self) -> &mut [u8] {
        // SAFETY: exclusive to the single outstanding write reservation.
        unsafe { core::slice::from_raw_parts_mut(self.data.as_ptr() as *mut u8, self.data.len()) }
    }

    fn data_slice(&self) -> &[u8] {
        &self.data
    }

    /// Cache maintenance is a platform facade concern on real hardware; this
    /// hosted implementation only records that the discipline point was hit
    /// (useful for tests asserting ordering), since cached/shared memory are
    /// not actually distinct here.
    fn flush_range(&self) {
        log::trace!("buffer {:?}: flush before write-pointer release", self.id);
    }

    fn invalidate_range(&self) {
        log::trace!("buffer {:?}: invalidate before read-pointer acquire", self.id);
    }
}

/// Third buffer flavour: sized `2*max(IBS, OBS)` to absorb the worst-case
/// occupation swing when producer and consumer run on independent periods
/// (e.g. an asynchronous AEC). Shares the same reserve/commit contract.
pub struct DpQueue {
    inner: Buffer,
}

impl DpQueue {
    pub fn with_ibs_obs(
        id: BufferId,
        producer: ComponentId,
        consumer: ComponentId,
        format: AudioFormat,
        ibs_bytes: usize,
        obs_bytes: usize,
    ) -> Self {
        let size = 2 * ibs_bytes.max(obs_bytes);
        Self {
            inner: Buffer::new(id, producer, consumer, format, size, true, false, false),
        }
    }

    pub fn buffer(&self) -> &Buffer {
        &self.inner
    }
}

#[cfg(test)]
mod tests {
    use bbx_core::FrameFormat;

    use super::*;

    fn fmt() -> AudioFormat {
        AudioFormat::new(FrameFormat::S16Le, 48_000, 2, true)
    }

    #[test]
    fn empty_then_full_boundary() {
        let buf = Buffer::new(BufferId(1), ComponentId(1), ComponentId(2), fmt(), 16, false, false, false);
        assert_eq!(buf.available_data(), 0);
        assert_eq!(buf.free_space(), 16);

        let r = buf.write_reserve(16).unwrap();
        buf.write_into(&r, &[1u8; 16]);
        buf.write_commit(16);

        assert_eq!(buf.available_data(), 16);
        assert_eq!(buf.free_space(), 0);

        // A further reservation must fail, not wrap past the end.
        assert!(matches!(buf.write_reserve(1), Err(EngineError::InsufficientSpace)));
    }

    #[test]
    fn invariant_available_plus_free_equals_size() {
        let buf = Buffer::new(BufferId(1), ComponentId(1), ComponentId(2), fmt(), 32, false, false, false);
        for n in [4, 8, 16, 2, 1] {
            let r = buf.write_reserve(n).unwrap();
            buf.write_into(&r, &vec![0xAAu8; n]);
            buf.write_commit(n);
            assert_eq!(buf.available_data() + buf.free_space(), 32);
        }
    }

    #[test]
    fn roundtrip_with_wraparound() {
        let buf = Buffer::new(BufferId(1), ComponentId(1), ComponentId(2), fmt(), 8, false, false, false);

        // Fill then drain most of it so the next write straddles the wrap point.
        let r = buf.write_reserve(8).unwrap();
        buf.write_into(&r, &[0, 1, 2, 3, 4, 5, 6, 7]);
        buf.write_commit(8);

        let r = buf.read_reserve(6).unwrap();
        let mut out = [0u8; 6];
        buf.read_from(&r, &mut out);
        buf.read_commit(6);
        assert_eq!(out, [0, 1, 2, 3, 4, 5]);

        let r = buf.write_reserve(6).unwrap();
        assert_eq!(r.size + r.wrap_size, 6);
        buf.write_into(&r, &[8, 9, 10, 11, 12, 13]);
        buf.write_commit(6);

        let r = buf.read_reserve(8).unwrap();
        let mut out = [0u8; 8];
        buf.read_from(&r, &mut out);
        buf.read_commit(8);
        assert_eq!(out, [6, 7, 8, 9, 10, 11, 12, 13]);
    }

    #[test]
    fn single_outstanding_reservation_per_side() {
        let buf = Buffer::new(BufferId(1), ComponentId(1), ComponentId(2), fmt(), 16, false, false, false);
        let _r1 = buf.write_reserve(4).unwrap();
        assert!(matches!(buf.write_reserve(4), Err(EngineError::ReservationOutstanding)));
    }

    #[test]
    fn dp_queue_sizing_is_2x_max_ibs_obs() {
        let q = DpQueue::with_ibs_obs(BufferId(1), ComponentId(1), ComponentId(2), fmt(), 192, 96);
        assert_eq!(q.buffer().size(), 384);
    }
}

#[cfg(loom)]
mod loom_tests {
    use loom::sync::Arc;
    use loom::thread;

    use super::*;

    fn fmt() -> AudioFormat {
        AudioFormat::new(bbx_core::FrameFormat::S16Le, 48_000, 2, true)
    }

    /// One producer reserving/committing concurrently with one consumer
    /// draining: `available_data() + free_space() == size` must hold no
    /// matter how the release/acquire pair interleaves.
    #[test]
    fn loom_concurrent_reserve_commit_never_corrupts_accounting() {
        loom::model(|| {
            let buf = Arc::new(Buffer::new(BufferId(1), ComponentId(1), ComponentId(2), fmt(), 8, false, true, false));

            let producer = {
                let buf = buf.clone();
                thread::spawn(move || {
                    if let Ok(r) = buf.write_reserve(4) {
                        buf.write_into(&r, &[1, 2, 3, 4]);
                        buf.write_commit(4);
                    }
                })
            };

            let consumer = {
                let buf = buf.clone();
                thread::spawn(move || {
                    if let Ok(r) = buf.read_reserve(4) {
                        let mut out = [0u8; 4];
                        buf.read_from(&r, &mut out);
                        buf.read_commit(4);
                    }
                })
            };

            producer.join().unwrap();
            consumer.join().unwrap();
            assert_eq!(buf.available_data() + buf.free_space(), 8);
        });
    }
}
