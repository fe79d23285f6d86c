//! Periodic core-load / buffer-occupancy snapshots posted to a dedicated
//! window slot (SPEC_FULL §6, grounded on the reference `telemetry.c`
//! sampling it supplements the distilled spec with). Posted
//! opportunistically, same as stream position — never on the critical
//! path.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BufferOccupancy {
    pub buffer_id: u32,
    pub available_bytes: u32,
    pub free_bytes: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TelemetryRecord {
    pub core: u32,
    pub sample_seq: u64,
    /// Approximate core load in the last sampling window, 0..=100.
    pub core_load_pct: u8,
    pub buffers: Vec<BufferOccupancy>,
}

impl TelemetryRecord {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn telemetry_record_roundtrips_through_json() {
        let record = TelemetryRecord {
            core: 0,
            sample_seq: 42,
            core_load_pct: 37,
            buffers: vec![BufferOccupancy { buffer_id: 20, available_bytes: 256, free_bytes: 512 }],
        };
        let json = record.to_json().unwrap();
        let back = TelemetryRecord::from_json(&json).unwrap();
        assert_eq!(back, record);
    }
}
