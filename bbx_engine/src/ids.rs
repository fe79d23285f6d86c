//! Stable 32-bit identifiers for graph objects.
//!
//! Components, buffers and pipelines never hold owning references to each
//! other; every cross-reference is one of these ids, resolved through the
//! arena in [`crate::graph::Graph`]. This keeps the component/buffer graph
//! acyclic at the borrow-checker level even though the logical graph it
//! describes can (legitimately) have fan-in and fan-out.

/// Identifies a component instance, assigned by the host at `new_component`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(pub u32);

/// Identifies a buffer, assigned by the host at `new_buffer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(pub u32);

/// Identifies a pipeline, assigned by the host at `new_pipeline`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PipelineId(pub u32);

/// Identifies a DSP core. Core 0 is always the primary core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CoreId(pub u32);

impl CoreId {
    pub const PRIMARY: CoreId = CoreId(0);

    #[inline]
    pub const fn is_primary(self) -> bool {
        self.0 == 0
    }
}
