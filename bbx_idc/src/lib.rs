//! # BBX IDC
//!
//! The inter-DSP-core message channel (spec module F): a fixed
//! point-to-point slot between every pair of cores, a BUSY/done
//! handshake, and BLOCKING/NON_BLOCKING/POWER_UP send semantics bounded by
//! [`message::IDC_TIMEOUT`]. Cores are modeled as OS threads sharing one
//! [`fabric::IdcFabric`]; production targets would back the same
//! `IdcFabric` API with real memory-mapped registers and cache
//! maintenance through `bbx_platform`.

pub mod error;
pub mod fabric;
pub mod handler;
pub mod message;

pub use error::{IdcError, Result};
pub use fabric::IdcFabric;
pub use handler::{IDC_STATUS_OK, IdcHandler, IdcStatus};
pub use message::{CACHE_LINE_SIZE, ComponentOpKind, CrashReason, IDC_MAX_PAYLOAD_SIZE, IDC_TIMEOUT, IdcMessage, IdcMsgType, IdcPayload, SendMode};
