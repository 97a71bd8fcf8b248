//! Render graph facade: population, compilation, execution, garbage collection

use crate::backend::types::ResourceState;
use crate::backend::{BackendError, DeviceId, RenderBackend};
use crate::graph::{DependencyGraph, NodeId};
use crate::render_graph::blackboard::Blackboard;
use crate::render_graph::compiler::{self, CompiledGraph};
use crate::render_graph::edge::RenderGraphEdge;
use crate::render_graph::executor::{self, FrameExecutors};
use crate::render_graph::node::*;
use crate::render_graph::profiler::RenderGraphProfiler;
use crate::render_graph::view_pool::TextureViewPool;
use thiserror::Error;

/// Frontend failure taxonomy.
///
/// Invalid handles are not represented here: dereferencing a handle from a
/// discarded population is a programming error and panics instead.
#[derive(Error, Debug)]
pub enum RenderGraphError {
    #[error("cyclic dependency among live passes: {passes:?}")]
    CyclicDependency { passes: Vec<String> },
    #[error("pass `{pass}` declared no access to resource `{resource}`")]
    UnresolvedDependency { pass: String, resource: String },
    #[error("graph has not been compiled this frame")]
    NotCompiled,
    #[error("graph was built frontend-only and cannot drive a backend")]
    FrontendOnly,
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Configuration surface handed to the [`RenderGraph::new`] setup closure
pub struct RenderGraphBuilder {
    pub(crate) frontend_only: bool,
    pub(crate) memory_aliasing: bool,
    pub(crate) device: DeviceId,
}

impl RenderGraphBuilder {
    /// Graph structure only, no backend will ever be attached
    pub fn frontend_only(&mut self) -> &mut Self {
        self.frontend_only = true;
        self
    }

    /// Allow transient resources with disjoint live ranges to share backing memory
    pub fn enable_memory_aliasing(&mut self) -> &mut Self {
        self.memory_aliasing = true;
        self
    }

    pub fn with_device(&mut self, device: DeviceId) -> &mut Self {
        self.device = device;
        self
    }
}

/// Declarative scheduler for one frame of GPU work.
///
/// Populate with `add_*_pass`/`create_*` once per logical pass/resource each
/// frame, then [`compile`](Self::compile) and [`execute`](Self::execute).
/// Execution resets the population; handles from the previous frame must not
/// be dereferenced afterwards.
pub struct RenderGraph {
    pub(crate) dep_graph: DependencyGraph<RenderGraphNode, RenderGraphEdge>,
    pub(crate) blackboard: Blackboard,
    pub(crate) passes: Vec<NodeId>,
    pub(crate) resources: Vec<NodeId>,
    pub(crate) culled_passes: Vec<NodeId>,
    pub(crate) culled_resources: Vec<NodeId>,
    pub(crate) compiled: Option<CompiledGraph>,
    pub(crate) frames: FrameExecutors,
    pub(crate) view_pool: TextureViewPool,
    pub(crate) frame_index: u64,
    pub(crate) aliasing_enabled: bool,
    pub(crate) frontend_only: bool,
    pub(crate) device: DeviceId,
}

impl RenderGraph {
    pub fn new(setup: impl FnOnce(&mut RenderGraphBuilder)) -> Self {
        let mut builder = RenderGraphBuilder {
            frontend_only: false,
            memory_aliasing: false,
            device: DeviceId(0),
        };
        setup(&mut builder);
        Self {
            dep_graph: DependencyGraph::new(),
            blackboard: Blackboard::new(),
            passes: Vec::new(),
            resources: Vec::new(),
            culled_passes: Vec::new(),
            culled_resources: Vec::new(),
            compiled: None,
            frames: FrameExecutors::new(),
            view_pool: TextureViewPool::new(builder.device),
            frame_index: 0,
            aliasing_enabled: builder.memory_aliasing,
            frontend_only: builder.frontend_only,
            device: builder.device,
        }
    }

    /// Cull unreachable work and resolve resource state transitions.
    ///
    /// Must be called after population and before [`execute`](Self::execute);
    /// a graph with a cycle among live passes fails here and must not be
    /// executed.
    pub fn compile(&mut self) -> Result<(), RenderGraphError> {
        let compiled = compiler::compile(
            &self.dep_graph,
            &self.passes,
            &self.resources,
            &mut self.culled_passes,
            &mut self.culled_resources,
        )?;
        log::debug!(
            "compiled graph: {} live passes, {} culled passes, {} culled resources",
            compiled.schedule.len(),
            self.culled_passes.len(),
            self.culled_resources.len()
        );
        self.compiled = Some(compiled);
        Ok(())
    }

    /// Run every surviving pass in dependency order against `backend`,
    /// advance the frame counter once and reset the population.
    ///
    /// Returns the new frame index.
    pub fn execute(
        &mut self,
        backend: &mut dyn RenderBackend,
        profiler: Option<&mut dyn RenderGraphProfiler>,
    ) -> Result<u64, RenderGraphError> {
        if self.frontend_only {
            return Err(RenderGraphError::FrontendOnly);
        }
        executor::execute_frame(self, backend, profiler)?;
        self.frame_index += 1;
        self.reset_population();
        Ok(self.frame_index)
    }

    /// Frontend-only frame turnover: advances the frame counter and discards
    /// the population without touching any backend. Requires a prior
    /// successful [`compile`](Self::compile).
    pub fn execute_frontend_only(&mut self) -> Result<u64, RenderGraphError> {
        if self.compiled.take().is_none() {
            return Err(RenderGraphError::NotCompiled);
        }
        self.frame_index += 1;
        self.reset_population();
        Ok(self.frame_index)
    }

    /// State `texture` is guaranteed to be in immediately before `pending` runs
    pub fn latest_texture_state(
        &self,
        texture: TextureHandle,
        pending: PassHandle,
    ) -> Result<ResourceState, RenderGraphError> {
        self.latest_state(texture.0, pending.0)
    }

    /// State `buffer` is guaranteed to be in immediately before `pending` runs
    pub fn latest_buffer_state(
        &self,
        buffer: BufferHandle,
        pending: PassHandle,
    ) -> Result<ResourceState, RenderGraphError> {
        self.latest_state(buffer.0, pending.0)
    }

    fn latest_state(&self, resource: NodeId, pending: NodeId) -> Result<ResourceState, RenderGraphError> {
        let compiled = self.compiled.as_ref().ok_or(RenderGraphError::NotCompiled)?;
        compiler::latest_state(compiled, &self.dep_graph, resource, pending)
    }

    /// Look up a texture registered in the blackboard
    pub fn get_texture(&self, name: &str) -> Option<TextureHandle> {
        self.blackboard.texture(name).map(TextureHandle)
    }

    /// Look up a buffer registered in the blackboard
    pub fn get_buffer(&self, name: &str) -> Option<BufferHandle> {
        self.blackboard.buffer(name).map(BufferHandle)
    }

    /// Look up a pass registered in the blackboard
    pub fn get_pass(&self, name: &str) -> Option<PassHandle> {
        self.blackboard.pass(name).map(PassHandle)
    }

    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    pub fn enable_memory_aliasing(&mut self, enabled: bool) -> bool {
        self.aliasing_enabled = enabled;
        self.aliasing_enabled
    }

    pub fn pass_count(&self) -> usize {
        self.passes.len()
    }

    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    pub fn culled_pass_count(&self) -> usize {
        self.culled_passes.len()
    }

    pub fn culled_resource_count(&self) -> usize {
        self.culled_resources.len()
    }

    /// True if `pass` was removed by compilation
    pub fn is_pass_culled(&self, pass: PassHandle) -> bool {
        self.culled_passes.contains(&pass.0)
    }

    /// True if `texture` was removed by compilation
    pub fn is_texture_culled(&self, texture: TextureHandle) -> bool {
        self.culled_resources.contains(&texture.0)
    }

    /// True if `buffer` was removed by compilation
    pub fn is_buffer_culled(&self, buffer: BufferHandle) -> bool {
        self.culled_resources.contains(&buffer.0)
    }

    /// Release cached views whose last use predates `critical_frame`
    pub fn collect_garbage(&mut self, backend: &mut dyn RenderBackend, critical_frame: u64) -> u32 {
        let collected = self.view_pool.collect_garbage(backend, critical_frame);
        if collected > 0 {
            log::debug!("collected {collected} aged texture views");
        }
        collected
    }

    /// Release every cached view and all in-flight transient allocations
    pub fn finalize(&mut self, backend: &mut dyn RenderBackend) {
        self.frames.destroy_all(backend, &self.view_pool);
        self.view_pool.finalize(backend);
    }

    pub(crate) fn resource_node(&self, id: NodeId) -> &ResourceNode {
        self.dep_graph
            .node_at(id)
            .as_resource()
            .expect("handle does not name a resource node")
    }

    pub(crate) fn pass_node(&self, id: NodeId) -> &PassNode {
        self.dep_graph
            .node_at(id)
            .as_pass()
            .expect("handle does not name a pass node")
    }

    pub(crate) fn node_label(&self, id: NodeId) -> String {
        match self.dep_graph.node_at(id).name() {
            Some(name) => name.to_string(),
            None => format!("#{}", id.index()),
        }
    }

    fn reset_population(&mut self) {
        self.dep_graph.clear();
        self.blackboard.clear();
        self.passes.clear();
        self.resources.clear();
        self.culled_passes.clear();
        self.culled_resources.clear();
        self.compiled = None;
    }
}
