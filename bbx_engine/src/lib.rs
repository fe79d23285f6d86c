//! # BBX Engine
//!
//! The component/buffer/pipeline graph engine: spec modules A (Component),
//! B (Buffer) and C (Pipeline). A closed `ComponentKind` enum stands in for
//! the reference firmware's per-type function-pointer vtable (§9 REDESIGN
//! FLAGS); every cross-reference between components, buffers and pipelines
//! is a stable 32-bit id resolved through [`graph::Graph`], never an owning
//! pointer.

pub mod buffer;
pub mod component;
pub mod components;
pub mod error;
pub mod graph;
pub mod ids;
pub mod pipeline;

pub use buffer::{Buffer, DpQueue, Reservation};
pub use component::{Component, ComponentKind, ComponentState, CopyStatus, PrepareStatus, TriggerCmd};
pub use error::{EngineError, Result};
pub use graph::Graph;
pub use ids::{BufferId, ComponentId, CoreId, PipelineId};
pub use pipeline::{Pipeline, PipelineState, StreamPosition, TimeDomain};
