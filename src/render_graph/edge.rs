//! Edges connecting exactly one resource node and one pass node

use crate::backend::types::ResourceState;

/// Where a pass binds the resource
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BindingSlot {
    /// Descriptor `(set, binding)` pair
    Set { set: u32, binding: u32 },
    /// Reflection name in the bound root signature
    Name(String),
    /// MRT attachment index on a render pass
    Attachment(u32),
    /// Depth/stencil attachment on a render pass
    DepthStencil,
    /// Pipeline-stage buffer (vertex/index/indirect), no descriptor slot
    Pipeline,
}

/// Access variant an edge encodes.
///
/// `Read` and `PipelineBuffer` edges run resource -> pass in the dependency
/// graph; `Write` and `ReadWrite` edges run pass -> resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    Read,
    Write,
    ReadWrite,
    PipelineBuffer,
}

/// A declared read/write relationship carrying a binding locator and the
/// resource state the pass requires at execution time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderGraphEdge {
    pub kind: EdgeKind,
    pub slot: BindingSlot,
    pub state: ResourceState,
}
