//! Render graph - a declarative GPU frame scheduler
//!
//! Each frame, application code declares passes and the logical resources they
//! read and write. The graph compiles that declaration into an executable
//! schedule: unreferenced work is culled, surviving passes are topologically
//! ordered, and the minimal sequence of resource state transitions is resolved
//! ahead of execution. A pluggable [`backend::RenderBackend`] carries out the
//! schedule, so the frontend never assumes a specific graphics API.
//!
//! # Example
//!
//! ```no_run
//! use render_graph::RenderGraph;
//! use render_graph::backend::{LoadAction, StoreAction, TextureFormat};
//!
//! let mut graph = RenderGraph::new(|b| {
//!     b.frontend_only();
//! });
//!
//! let color = graph.create_texture(|t| {
//!     t.set_name("color")
//!         .extent(800, 600, 1)
//!         .format(TextureFormat::Rgba8Unorm)
//!         .allow_render_target()
//!         .exported();
//! });
//!
//! graph.add_render_pass(
//!     |p| {
//!         p.set_name("main")
//!             .write(0, color, LoadAction::Clear([0.0; 4]), StoreAction::Store);
//!     },
//!     |_ctx| {
//!         // record draws here
//!     },
//! );
//!
//! graph.compile().unwrap();
//! graph.execute_frontend_only().unwrap();
//! ```

pub mod backend;
pub mod graph;
pub mod render_graph;

pub use backend::{BackendError, BackendResult, RenderBackend};
pub use render_graph::{
    BufferHandle, PassContext, PassHandle, RenderGraph, RenderGraphError, RenderGraphProfiler,
    TextureHandle, MAX_FRAMES_IN_FLIGHT, MAX_MRT_COUNT,
};
