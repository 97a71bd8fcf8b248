//! Declarative frame scheduler
//!
//! Describe a frame as passes and the resources they touch; compilation culls
//! unreferenced work, orders the survivors and resolves every resource state
//! transition, and execution drives a [`RenderBackend`](crate::backend::RenderBackend)
//! through the result.

pub mod blackboard;
pub mod builders;
pub mod compiler;
pub mod edge;
pub mod executor;
pub mod graph;
pub mod node;
pub mod profiler;
pub mod view_pool;
pub mod viz;

pub use builders::{
    BufferBuilder, ComputePassBuilder, CopyPassBuilder, PresentPassBuilder, RenderPassBuilder,
    TextureBuilder,
};
pub use edge::{BindingSlot, EdgeKind};
pub use executor::{PassContext, MAX_FRAMES_IN_FLIGHT};
pub use graph::{RenderGraph, RenderGraphBuilder, RenderGraphError};
pub use node::{BufferHandle, PassHandle, TextureHandle, MAX_MRT_COUNT};
pub use profiler::RenderGraphProfiler;
pub use view_pool::TextureViewPool;
