//! Host IPC engine: mailbox parsing, topology/stream/component command
//! dispatch against a [`bbx_engine::Graph`], and the two host wire
//! dialects this firmware answers (spec §6).

pub mod engine;
pub mod error;
pub mod mailbox;
pub mod message;
pub mod notify;
pub mod telemetry;
pub mod topology;

pub use engine::{IpcEngine, IpcReply};
pub use error::{IpcError, Result};
pub use mailbox::{Mailbox, PageTableDescriptor, fetch_large_payload};
pub use message::{
    CompCommand, ComponentTypeTag, Direction, Glb3Class, Glb4Class, Ipc4PipelineState, IpcDialect, IpcHeader,
    IpcRequest, StreamCommand, StreamTriggerCmd, TopologyCommand,
};
pub use notify::{Notification, NotificationQueue};
pub use telemetry::{BufferOccupancy, TelemetryRecord};
