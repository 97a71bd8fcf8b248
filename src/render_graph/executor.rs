//! Render graph executor
//!
//! Resolves logical resources to physical ones, emits the state transitions
//! computed at compile time, and drives pass callbacks in schedule order.
//! Each in-flight frame owns its transient allocations; the slot is reclaimed
//! when the frame counter wraps back onto it.

use crate::backend::traits::*;
use crate::backend::types::*;
use crate::graph::NodeId;
use crate::render_graph::compiler::CompiledGraph;
use crate::render_graph::edge::{BindingSlot, EdgeKind, RenderGraphEdge};
use crate::render_graph::graph::{RenderGraph, RenderGraphError};
use crate::render_graph::node::*;
use crate::render_graph::profiler::RenderGraphProfiler;
use crate::render_graph::view_pool::TextureViewPool;
use std::collections::HashMap;

/// Number of frames that may be recorded while earlier ones are still in
/// flight on the GPU
pub const MAX_FRAMES_IN_FLIGHT: u32 = 3;

/// Caller-supplied executor callback, invoked once while the pass runs
pub type PassExecuteFn = Box<dyn FnMut(&mut PassContext<'_>)>;

/// Resolved bindings handed to a pass callback.
///
/// Lookups mirror the binding locators declared through the builder; the
/// callback must not retain the command-recording context past the call.
pub struct PassContext<'a> {
    pub backend: &'a mut dyn RenderBackend,
    bindings: &'a ResolvedBindings,
}

impl PassContext<'_> {
    pub fn texture_view(&self, set: u32, binding: u32) -> Option<TextureViewId> {
        self.bindings.texture_views.get(&(set, binding)).copied()
    }

    pub fn texture_view_named(&self, name: &str) -> Option<TextureViewId> {
        self.bindings.named_texture_views.get(name).copied()
    }

    pub fn buffer(&self, set: u32, binding: u32) -> Option<BufferId> {
        self.bindings.buffers.get(&(set, binding)).copied()
    }

    pub fn buffer_named(&self, name: &str) -> Option<BufferId> {
        self.bindings.named_buffers.get(name).copied()
    }

    /// Buffers bound through `use_buffer`, in declaration order
    pub fn pipeline_buffers(&self) -> &[(BufferId, ResourceState)] {
        &self.bindings.pipeline_buffers
    }
}

#[derive(Default)]
struct ResolvedBindings {
    texture_views: HashMap<(u32, u32), TextureViewId>,
    named_texture_views: HashMap<String, TextureViewId>,
    buffers: HashMap<(u32, u32), BufferId>,
    named_buffers: HashMap<String, BufferId>,
    pipeline_buffers: Vec<(BufferId, ResourceState)>,
}

#[derive(Default)]
struct FrameSlot {
    textures: Vec<TextureId>,
    buffers: Vec<BufferId>,
}

/// Per-slot transient allocations for the frames in flight
pub(crate) struct FrameExecutors {
    slots: Vec<FrameSlot>,
}

impl FrameExecutors {
    pub(crate) fn new() -> Self {
        Self {
            slots: (0..MAX_FRAMES_IN_FLIGHT).map(|_| FrameSlot::default()).collect(),
        }
    }

    /// Destroy the transients a slot still holds from its previous frame.
    /// The backend has retired that frame by the time the counter wraps.
    ///
    /// Cached views projecting a destroyed texture are erased first; the
    /// backend may hand the freed id to a future allocation, and a stale
    /// cache entry would then alias the new texture.
    fn reclaim(&mut self, slot: usize, backend: &mut dyn RenderBackend, views: &TextureViewPool) {
        let frame = &mut self.slots[slot];
        for texture in frame.textures.drain(..) {
            views.erase(backend, texture);
            backend.destroy_texture(texture);
        }
        for buffer in frame.buffers.drain(..) {
            backend.destroy_buffer(buffer);
        }
    }

    pub(crate) fn destroy_all(&mut self, backend: &mut dyn RenderBackend, views: &TextureViewPool) {
        for slot in 0..self.slots.len() {
            self.reclaim(slot, backend, views);
        }
    }
}

/// Descriptor identity used to recycle aliasable transient textures
#[derive(PartialEq, Eq, Hash)]
struct AliasKey {
    width: u32,
    height: u32,
    depth: u32,
    array_layers: u32,
    mip_levels: u32,
    format: TextureFormat,
    usage: TextureUsage,
    sample_count: SampleCount,
}

impl AliasKey {
    fn new(desc: &TextureDescriptor) -> Self {
        Self {
            width: desc.width,
            height: desc.height,
            depth: desc.depth,
            array_layers: desc.array_layers,
            mip_levels: desc.mip_levels,
            format: desc.format,
            usage: desc.usage,
            sample_count: desc.sample_count,
        }
    }
}

pub(crate) fn execute_frame(
    graph: &mut RenderGraph,
    backend: &mut dyn RenderBackend,
    mut profiler: Option<&mut dyn RenderGraphProfiler>,
) -> Result<(), RenderGraphError> {
    let compiled = graph.compiled.take().ok_or(RenderGraphError::NotCompiled)?;
    let frame_index = graph.frame_index;
    let slot = (frame_index % MAX_FRAMES_IN_FLIGHT as u64) as usize;

    graph.frames.reclaim(slot, backend, &graph.view_pool);
    if let Some(p) = profiler.as_deref_mut() {
        p.on_acquire_executor(frame_index, slot as u32);
    }

    backend.begin_commands(slot as u32)?;
    if let Some(p) = profiler.as_deref_mut() {
        p.on_cmd_begin(frame_index);
    }

    let mut physical_textures: HashMap<NodeId, TextureId> = HashMap::new();
    let mut physical_buffers: HashMap<NodeId, BufferId> = HashMap::new();
    let mut recycle: HashMap<AliasKey, Vec<TextureId>> = HashMap::new();
    let mut presents: Vec<(SwapchainId, u32)> = Vec::new();

    for (pos, &pass_id) in compiled.schedule.iter().enumerate() {
        let touched = touched_resources(graph, pass_id);

        for &(resource, _) in touched.iter() {
            resolve_physical(
                graph,
                backend,
                resource,
                slot,
                &mut physical_textures,
                &mut physical_buffers,
                &mut recycle,
            )?;
        }

        emit_barriers(
            graph,
            backend,
            &compiled,
            pass_id,
            &touched,
            &physical_textures,
            &physical_buffers,
        );

        // Copy and present passes have no shader bindings to resolve.
        let needs_bindings = matches!(
            graph.pass_node(pass_id).kind,
            PassKind::Render(_) | PassKind::Compute(_)
        );
        let bindings = if needs_bindings {
            resolve_bindings(
                graph,
                backend,
                frame_index,
                &touched,
                &physical_textures,
                &physical_buffers,
            )?
        } else {
            ResolvedBindings::default()
        };

        let pass_label = graph.node_label(pass_id);
        if let Some(p) = profiler.as_deref_mut() {
            p.on_pass_begin(&pass_label);
        }

        dispatch_pass(
            graph,
            backend,
            frame_index,
            pass_id,
            &pass_label,
            &bindings,
            &physical_textures,
            &physical_buffers,
            &mut presents,
        )?;

        if let Some(p) = profiler.as_deref_mut() {
            p.on_pass_end(&pass_label);
        }

        if graph.aliasing_enabled {
            release_ended_transients(graph, &compiled, pos, &touched, &physical_textures, &mut recycle);
        }
    }

    if let Some(p) = profiler.as_deref_mut() {
        p.on_cmd_end(frame_index);
        p.before_commit(frame_index);
    }
    backend.submit()?;
    if let Some(p) = profiler.as_deref_mut() {
        p.after_commit(frame_index);
    }

    for (swapchain, index) in presents {
        backend.present(swapchain, index)?;
    }

    Ok(())
}

/// Every resource the pass touches, with the edge that touches it.
/// Incoming edges carry reads, outgoing edges carry writes.
fn touched_resources(graph: &RenderGraph, pass: NodeId) -> Vec<(NodeId, RenderGraphEdge)> {
    let mut touched: Vec<(NodeId, RenderGraphEdge)> = Vec::new();
    for (_, resource, edge) in graph.dep_graph.incoming_edges(pass) {
        touched.push((resource, edge.clone()));
    }
    for (_, resource, edge) in graph.dep_graph.outgoing_edges(pass) {
        touched.push((resource, edge.clone()));
    }
    touched
}

/// Allocate the physical resource on first use; imported nodes reuse their
/// caller-supplied backing
fn resolve_physical(
    graph: &mut RenderGraph,
    backend: &mut dyn RenderBackend,
    resource: NodeId,
    slot: usize,
    physical_textures: &mut HashMap<NodeId, TextureId>,
    physical_buffers: &mut HashMap<NodeId, BufferId>,
    recycle: &mut HashMap<AliasKey, Vec<TextureId>>,
) -> Result<(), RenderGraphError> {
    enum Backing {
        Texture(TextureDescriptor, Option<TextureId>),
        Buffer(BufferDescriptor, Option<BufferId>),
    }
    let backing = match &graph.resource_node(resource).kind {
        ResourceKind::Texture { desc, imported } => Backing::Texture(desc.clone(), *imported),
        ResourceKind::Buffer { desc, imported } => Backing::Buffer(desc.clone(), *imported),
    };
    match backing {
        Backing::Texture(desc, imported) => {
            if physical_textures.contains_key(&resource) {
                return Ok(());
            }
            let id = if let Some(id) = imported {
                id
            } else if let Some(id) = recycled_texture(graph, &desc, recycle) {
                id
            } else {
                let id = backend.create_texture(&desc)?;
                graph.frames.slots[slot].textures.push(id);
                id
            };
            physical_textures.insert(resource, id);
        }
        Backing::Buffer(desc, imported) => {
            if physical_buffers.contains_key(&resource) {
                return Ok(());
            }
            let id = if let Some(id) = imported {
                id
            } else {
                let id = backend.create_buffer(&desc)?;
                graph.frames.slots[slot].buffers.push(id);
                id
            };
            physical_buffers.insert(resource, id);
        }
    }
    Ok(())
}

fn recycled_texture(
    graph: &RenderGraph,
    desc: &TextureDescriptor,
    recycle: &mut HashMap<AliasKey, Vec<TextureId>>,
) -> Option<TextureId> {
    if !graph.aliasing_enabled || desc.owns_memory {
        return None;
    }
    recycle.get_mut(&AliasKey::new(desc)).and_then(Vec::pop)
}

/// Transient textures whose live range ended at `pos` become available for
/// aliasing by later passes. Sharing backing memory never changes logical
/// identity; the timeline still transitions the handle per consumer.
fn release_ended_transients(
    graph: &RenderGraph,
    compiled: &CompiledGraph,
    pos: usize,
    touched: &[(NodeId, RenderGraphEdge)],
    physical_textures: &HashMap<NodeId, TextureId>,
    recycle: &mut HashMap<AliasKey, Vec<TextureId>>,
) {
    for &(resource, _) in touched {
        let node = graph.resource_node(resource);
        if node.is_imported() {
            continue;
        }
        let Some(desc) = node.texture_desc() else { continue };
        if desc.owns_memory {
            continue;
        }
        let ended = compiled
            .lifetimes
            .get(&resource)
            .is_some_and(|lifetime| lifetime.last_use == pos);
        if ended {
            if let Some(&id) = physical_textures.get(&resource) {
                recycle.entry(AliasKey::new(desc)).or_default().push(id);
            }
        }
    }
}

/// Emit the transitions scheduled for this pass, batched into one barrier call
fn emit_barriers(
    graph: &RenderGraph,
    backend: &mut dyn RenderBackend,
    compiled: &CompiledGraph,
    pass: NodeId,
    touched: &[(NodeId, RenderGraphEdge)],
    physical_textures: &HashMap<NodeId, TextureId>,
    physical_buffers: &HashMap<NodeId, BufferId>,
) {
    let mut barriers: Vec<ResourceBarrier> = Vec::new();
    let mut seen: Vec<NodeId> = Vec::new();

    for &(resource, _) in touched {
        if seen.contains(&resource) {
            continue;
        }
        seen.push(resource);

        let Some(timeline) = compiled.timelines.get(&resource) else { continue };
        let Some(index) = timeline.touches.iter().position(|t| t.pass == pass) else {
            continue;
        };
        let src_state = if index == 0 {
            timeline.init_state
        } else {
            timeline.touches[index - 1].state
        };
        let dst_state = timeline.touches[index].state;
        if src_state == dst_state {
            continue;
        }

        if graph.resource_node(resource).is_texture() {
            if let Some(&texture) = physical_textures.get(&resource) {
                barriers.push(ResourceBarrier::Texture(TextureBarrier {
                    texture,
                    src_state,
                    dst_state,
                }));
            }
        } else if let Some(&buffer) = physical_buffers.get(&resource) {
            barriers.push(ResourceBarrier::Buffer(BufferBarrier {
                buffer,
                src_state,
                dst_state,
            }));
        }
    }

    if !barriers.is_empty() {
        backend.resource_barrier(&barriers);
    }
}

fn resolve_bindings(
    graph: &RenderGraph,
    backend: &mut dyn RenderBackend,
    frame_index: u64,
    touched: &[(NodeId, RenderGraphEdge)],
    physical_textures: &HashMap<NodeId, TextureId>,
    physical_buffers: &HashMap<NodeId, BufferId>,
) -> Result<ResolvedBindings, RenderGraphError> {
    let mut bindings = ResolvedBindings::default();

    for (resource, edge) in touched {
        let node = graph.resource_node(*resource);
        match (&node.kind, &edge.slot) {
            (ResourceKind::Texture { desc, .. }, BindingSlot::Set { set, binding }) => {
                let texture = physical_textures[resource];
                let view_desc = shader_view_desc(texture, desc, edge.kind);
                let view = graph.view_pool.allocate(backend, &view_desc, frame_index)?;
                bindings.texture_views.insert((*set, *binding), view);
            }
            (ResourceKind::Texture { desc, .. }, BindingSlot::Name(name)) => {
                let texture = physical_textures[resource];
                let view_desc = shader_view_desc(texture, desc, edge.kind);
                let view = graph.view_pool.allocate(backend, &view_desc, frame_index)?;
                bindings.named_texture_views.insert(name.clone(), view);
            }
            (ResourceKind::Buffer { .. }, BindingSlot::Set { set, binding }) => {
                bindings.buffers.insert((*set, *binding), physical_buffers[resource]);
            }
            (ResourceKind::Buffer { .. }, BindingSlot::Name(name)) => {
                bindings.named_buffers.insert(name.clone(), physical_buffers[resource]);
            }
            (ResourceKind::Buffer { .. }, BindingSlot::Pipeline) => {
                bindings
                    .pipeline_buffers
                    .push((physical_buffers[resource], edge.state));
            }
            // Attachments are resolved when the render pass begins.
            _ => {}
        }
    }

    Ok(bindings)
}

/// View projecting a whole texture for shader access
fn shader_view_desc(texture: TextureId, desc: &TextureDescriptor, kind: EdgeKind) -> TextureViewDescriptor {
    let usage = match kind {
        EdgeKind::Read => TextureViewUsage::SRV,
        _ => TextureViewUsage::UAV,
    };
    let aspect = if desc.format.is_depth() {
        TextureAspect::DEPTH
    } else {
        TextureAspect::COLOR
    };
    TextureViewDescriptor {
        texture,
        format: desc.format,
        usage,
        aspect,
        dims: if desc.array_layers > 1 { TextureDimension::D2Array } else { TextureDimension::D2 },
        base_mip_level: 0,
        mip_level_count: desc.mip_levels,
        base_array_layer: 0,
        array_layer_count: desc.array_layers,
    }
}

/// View projecting mip 0 / layer 0 for attachment use
fn attachment_view_desc(texture: TextureId, desc: &TextureDescriptor) -> TextureViewDescriptor {
    let aspect = if desc.format.is_depth() {
        let mut aspect = TextureAspect::DEPTH;
        if desc.format.has_stencil() {
            aspect = aspect | TextureAspect::STENCIL;
        }
        aspect
    } else {
        TextureAspect::COLOR
    };
    TextureViewDescriptor {
        texture,
        format: desc.format,
        usage: TextureViewUsage::RTV_DSV,
        aspect,
        dims: TextureDimension::D2,
        base_mip_level: 0,
        mip_level_count: 1,
        base_array_layer: 0,
        array_layer_count: 1,
    }
}

#[allow(clippy::too_many_arguments)]
fn dispatch_pass(
    graph: &mut RenderGraph,
    backend: &mut dyn RenderBackend,
    frame_index: u64,
    pass_id: NodeId,
    pass_label: &str,
    bindings: &ResolvedBindings,
    physical_textures: &HashMap<NodeId, TextureId>,
    physical_buffers: &HashMap<NodeId, BufferId>,
    presents: &mut Vec<(SwapchainId, u32)>,
) -> Result<(), RenderGraphError> {
    match &graph.pass_node(pass_id).kind {
        PassKind::Render(data) => {
            let pipeline = data.pipeline;
            let load_actions = data.load_actions;
            let store_actions = data.store_actions;
            let depth_actions = (
                data.depth_load_action,
                data.depth_store_action,
                data.stencil_load_action,
                data.stencil_store_action,
            );

            let mut colors: Vec<(u32, NodeId)> = Vec::new();
            let mut depth_stencil: Option<NodeId> = None;
            for (_, resource, edge) in graph.dep_graph.outgoing_edges(pass_id) {
                match edge.slot {
                    BindingSlot::Attachment(index) => colors.push((index, resource)),
                    BindingSlot::DepthStencil => depth_stencil = Some(resource),
                    _ => {}
                }
            }
            colors.sort_by_key(|(index, _)| *index);

            let mut desc = RenderPassDescriptor {
                label: Some(pass_label.to_string()),
                ..Default::default()
            };
            for (index, resource) in colors {
                let node = graph.resource_node(resource);
                let tex_desc = node.texture_desc().expect("attachment is a texture");
                let view_desc = attachment_view_desc(physical_textures[&resource], tex_desc);
                let view = graph.view_pool.allocate(backend, &view_desc, frame_index)?;
                desc.color_attachments.push(ColorAttachment {
                    view,
                    load_action: load_actions[index as usize],
                    store_action: store_actions[index as usize],
                });
            }
            if let Some(resource) = depth_stencil {
                let node = graph.resource_node(resource);
                let tex_desc = node.texture_desc().expect("depth target is a texture");
                let view_desc = attachment_view_desc(physical_textures[&resource], tex_desc);
                let view = graph.view_pool.allocate(backend, &view_desc, frame_index)?;
                desc.depth_stencil_attachment = Some(DepthStencilAttachment {
                    view,
                    depth_load_action: depth_actions.0,
                    depth_store_action: depth_actions.1,
                    stencil_load_action: depth_actions.2,
                    stencil_store_action: depth_actions.3,
                });
            }

            backend.begin_render_pass(&desc);
            if let Some(pipeline) = pipeline {
                backend.set_render_pipeline(pipeline);
            }
            if let Some(mut executor) = pass_executor(graph, pass_id) {
                executor(&mut PassContext {
                    backend: &mut *backend,
                    bindings,
                });
            }
            backend.end_render_pass();
        }
        PassKind::Compute(data) => {
            let pipeline = data.pipeline;
            backend.begin_compute_pass(Some(pass_label));
            if let Some(pipeline) = pipeline {
                backend.set_compute_pipeline(pipeline);
            }
            if let Some(mut executor) = pass_executor(graph, pass_id) {
                executor(&mut PassContext {
                    backend: &mut *backend,
                    bindings,
                });
            }
            backend.end_compute_pass();
        }
        PassKind::Copy(data) => {
            let texture_copies = data.texture_copies.clone();
            let buffer_copies = data.buffer_copies.clone();
            for (src, dst) in texture_copies {
                backend.copy_texture_to_texture(&TextureCopy {
                    src: physical_textures[&src.0],
                    dst: physical_textures[&dst.0],
                    mip_level: 0,
                    array_layer: 0,
                });
            }
            for (src, dst) in buffer_copies {
                let size = graph
                    .resource_node(src.0)
                    .buffer_desc()
                    .map(|desc| desc.size)
                    .unwrap_or(0);
                backend.copy_buffer_to_buffer(&BufferCopy {
                    src: physical_buffers[&src.0],
                    src_offset: 0,
                    dst: physical_buffers[&dst.0],
                    dst_offset: 0,
                    size,
                });
            }
        }
        PassKind::Present(data) => {
            // The backbuffer barrier to Present was emitted with this pass's
            // transitions; the queue present happens after submission.
            if let Some(swapchain) = data.swapchain {
                presents.push((swapchain, data.index));
            }
        }
    }
    Ok(())
}

fn pass_executor(graph: &mut RenderGraph, pass: NodeId) -> Option<PassExecuteFn> {
    graph
        .dep_graph
        .node_at_mut(pass)
        .as_pass_mut()
        .expect("schedule holds pass nodes")
        .take_executor()
}
