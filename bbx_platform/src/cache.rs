//! Cache maintenance calls (spec §4.G, §3 buffer invariants): flush
//! before a shared buffer's producer advances its write pointer,
//! invalidate before the consumer reads.

pub trait CachePlatform: Send + Sync {
    fn flush_range(&self, addr_hint: usize, len: usize);

    fn invalidate_range(&self, addr_hint: usize, len: usize);

    fn flush_invalidate_range(&self, addr_hint: usize, len: usize) {
        self.flush_range(addr_hint, len);
        self.invalidate_range(addr_hint, len);
    }
}
