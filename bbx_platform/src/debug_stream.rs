//! Debug stream slot (SPEC_FULL §6, grounded on `debug_stream_slot.c`
//! supplementing the distilled spec): a header plus one per-core circular
//! word buffer in the debug mailbox region, written by the DSP and
//! scanned by the host. Scanning works forwards (follow `w_ptr`) or
//! backwards from an overrun (each record's size word is duplicated
//! immediately after the record).

use crate::error::{PlatformError, Result};

/// Debug stream slot header magic, spelled out as four bytes so it reads
/// the same regardless of the host's endianness assumptions.
pub const MAGIC: [u8; 4] = *b"\0GOL";

/// Fixed per-record header: `id`, `seqno`, `size_words` (the size
/// written *before* the payload; a matching copy follows it).
const RECORD_HEADER_WORDS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionDescriptor {
    pub core_id: u32,
    pub buf_words: u32,
    pub offset: u32,
}

/// One core's circular buffer of 32-bit words.
struct CircularSection {
    core_id: u32,
    data: Vec<u32>,
    next_seqno: u32,
    w_ptr: usize,
}

impl CircularSection {
    fn new(core_id: u32, buf_words: usize) -> Self {
        Self { core_id, data: vec![0; buf_words], next_seqno: 0, w_ptr: 0 }
    }

    fn descriptor(&self, offset: u32) -> SectionDescriptor {
        SectionDescriptor { core_id: self.core_id, buf_words: self.data.len() as u32, offset }
    }

    /// Write `[id, seqno, size_words, payload..., size_words]`, wrapping
    /// around the circular buffer as needed. `w_ptr` only advances once
    /// the whole record (including the trailing duplicate) is written,
    /// matching the reference "update w_ptr last" rule.
    fn send_record(&mut self, id: u32, payload: &[u32]) -> Result<()> {
        let buf_words = self.data.len();
        let record_words = RECORD_HEADER_WORDS + payload.len();
        if record_words >= buf_words {
            return Err(PlatformError::DebugRecordTooBig);
        }

        let seqno = self.next_seqno;
        self.next_seqno = self.next_seqno.wrapping_add(1);
        let size_words = (record_words + 1) as u32; // +1 for the trailing duplicate

        let mut words = Vec::with_capacity(record_words + 1);
        words.push(id);
        words.push(seqno);
        words.push(size_words);
        words.extend_from_slice(payload);
        words.push(size_words);

        let start = self.w_ptr;
        for (i, word) in words.iter().enumerate() {
            self.data[(start + i) % buf_words] = *word;
        }
        self.w_ptr = (start + words.len()) % buf_words;
        Ok(())
    }

    /// Read the record starting at word `start`, for host-side scanning
    /// tests. Returns `(id, seqno, payload)`.
    fn read_record_at(&self, start: usize) -> (u32, u32, Vec<u32>) {
        let buf_words = self.data.len();
        let word = |i: usize| self.data[(start + i) % buf_words];
        let id = word(0);
        let seqno = word(1);
        let size_words = word(2) as usize;
        let payload_len = size_words - RECORD_HEADER_WORDS - 1;
        let payload = (0..payload_len).map(|i| word(RECORD_HEADER_WORDS + i)).collect();
        (id, seqno, payload)
    }
}

/// The full slot: a header plus one circular section per core.
pub struct DebugStreamSlot {
    sections: Vec<CircularSection>,
}

impl DebugStreamSlot {
    pub fn new(core_count: u32, words_per_core: usize) -> Self {
        let sections = (0..core_count).map(|core| CircularSection::new(core, words_per_core)).collect();
        Self { sections }
    }

    pub fn section_descriptors(&self) -> Vec<SectionDescriptor> {
        let mut offset = 0u32;
        self.sections
            .iter()
            .map(|s| {
                let desc = s.descriptor(offset);
                offset += s.data.len() as u32 * 4;
                desc
            })
            .collect()
    }

    pub fn send_record(&mut self, core: u32, id: u32, payload: &[u32]) -> Result<()> {
        self.sections.get_mut(core as usize).ok_or(PlatformError::UnknownDebugSection)?.send_record(id, payload)
    }

    /// Read back the most recently written record for a core, for tests
    /// and host-side tooling; not used by the firmware itself.
    pub fn last_record(&self, core: u32) -> Result<Option<(u32, u32, Vec<u32>)>> {
        let section = self.sections.get(core as usize).ok_or(PlatformError::UnknownDebugSection)?;
        if section.next_seqno == 0 {
            return Ok(None);
        }
        // w_ptr points one past the trailing duplicate size word; walk
        // back using that duplicate to find the record start.
        let buf_words = section.data.len();
        let trailer_idx = (section.w_ptr + buf_words - 1) % buf_words;
        let size_words = section.data[trailer_idx] as usize;
        let start = (section.w_ptr + buf_words - size_words) % buf_words;
        Ok(Some(section.read_record_at(start)))
    }
}
