//! Pass and resource builders
//!
//! One builder per pass/resource kind. Builders are constructed by the owning
//! graph, handed by reference into a single setup closure and discarded when
//! it returns; declaring a read or write links the edge into the dependency
//! graph immediately, so the pass's full edge set exists by the time the
//! closure returns.

use crate::backend::types::*;
use crate::backend::{BufferId, ComputePipelineId, RenderPipelineId, RootSignatureId, SwapchainId, TextureId};
use crate::graph::NodeId;
use crate::render_graph::edge::{BindingSlot, EdgeKind, RenderGraphEdge};
use crate::render_graph::executor::{PassContext, PassExecuteFn};
use crate::render_graph::graph::RenderGraph;
use crate::render_graph::node::*;

impl RenderGraph {
    pub fn add_render_pass(
        &mut self,
        setup: impl FnOnce(&mut RenderPassBuilder),
        executor: impl FnMut(&mut PassContext<'_>) + 'static,
    ) -> PassHandle {
        let id = self.insert_pass(PassKind::Render(RenderPassData::default()));
        setup(&mut RenderPassBuilder { graph: self, pass: id });
        self.render_data_mut(id).executor = Some(Box::new(executor) as PassExecuteFn);
        PassHandle(id)
    }

    pub fn add_compute_pass(
        &mut self,
        setup: impl FnOnce(&mut ComputePassBuilder),
        executor: impl FnMut(&mut PassContext<'_>) + 'static,
    ) -> PassHandle {
        let id = self.insert_pass(PassKind::Compute(ComputePassData::default()));
        setup(&mut ComputePassBuilder { graph: self, pass: id });
        self.compute_data_mut(id).executor = Some(Box::new(executor) as PassExecuteFn);
        PassHandle(id)
    }

    pub fn add_copy_pass(&mut self, setup: impl FnOnce(&mut CopyPassBuilder)) -> PassHandle {
        let id = self.insert_pass(PassKind::Copy(CopyPassData::default()));
        setup(&mut CopyPassBuilder { graph: self, pass: id });
        PassHandle(id)
    }

    pub fn add_present_pass(&mut self, setup: impl FnOnce(&mut PresentPassBuilder)) -> PassHandle {
        let id = self.insert_pass(PassKind::Present(PresentPassData::default()));
        setup(&mut PresentPassBuilder { graph: self, pass: id });
        PassHandle(id)
    }

    pub fn create_texture(&mut self, setup: impl FnOnce(&mut TextureBuilder)) -> TextureHandle {
        let id = self.dep_graph.insert(RenderGraphNode::Resource(ResourceNode {
            kind: ResourceKind::Texture {
                desc: TextureDescriptor::default(),
                imported: None,
            },
            init_state: ResourceState::Undefined,
            exported: false,
            name: None,
        }));
        self.resources.push(id);
        setup(&mut TextureBuilder { graph: self, node: id });
        TextureHandle(id)
    }

    pub fn create_buffer(&mut self, setup: impl FnOnce(&mut BufferBuilder)) -> BufferHandle {
        let id = self.dep_graph.insert(RenderGraphNode::Resource(ResourceNode {
            kind: ResourceKind::Buffer {
                desc: BufferDescriptor::default(),
                imported: None,
            },
            init_state: ResourceState::Undefined,
            exported: false,
            name: None,
        }));
        self.resources.push(id);
        setup(&mut BufferBuilder { graph: self, node: id });
        BufferHandle(id)
    }

    fn insert_pass(&mut self, kind: PassKind) -> NodeId {
        let order = self.passes.len() as u32;
        let id = self.dep_graph.insert(RenderGraphNode::Pass(PassNode {
            kind,
            order,
            name: None,
        }));
        self.passes.push(id);
        id
    }

    fn render_data_mut(&mut self, id: NodeId) -> &mut RenderPassData {
        match &mut self.dep_graph.node_at_mut(id).as_pass_mut().unwrap().kind {
            PassKind::Render(data) => data,
            _ => unreachable!("node inserted as render pass"),
        }
    }

    fn compute_data_mut(&mut self, id: NodeId) -> &mut ComputePassData {
        match &mut self.dep_graph.node_at_mut(id).as_pass_mut().unwrap().kind {
            PassKind::Compute(data) => data,
            _ => unreachable!("node inserted as compute pass"),
        }
    }

    fn copy_data_mut(&mut self, id: NodeId) -> &mut CopyPassData {
        match &mut self.dep_graph.node_at_mut(id).as_pass_mut().unwrap().kind {
            PassKind::Copy(data) => data,
            _ => unreachable!("node inserted as copy pass"),
        }
    }

    fn present_data_mut(&mut self, id: NodeId) -> &mut PresentPassData {
        match &mut self.dep_graph.node_at_mut(id).as_pass_mut().unwrap().kind {
            PassKind::Present(data) => data,
            _ => unreachable!("node inserted as present pass"),
        }
    }

    fn set_pass_name(&mut self, id: NodeId, name: &str) {
        self.dep_graph.node_at_mut(id).as_pass_mut().unwrap().name = Some(name.to_string());
        self.blackboard.add_pass(name, id);
    }

    fn resource_mut(&mut self, id: NodeId) -> &mut ResourceNode {
        self.dep_graph.node_at_mut(id).as_resource_mut().unwrap()
    }
}

/// Fluent configuration surface for a render pass
pub struct RenderPassBuilder<'a> {
    graph: &'a mut RenderGraph,
    pass: NodeId,
}

impl RenderPassBuilder<'_> {
    pub fn set_name(&mut self, name: &str) -> &mut Self {
        self.graph.set_pass_name(self.pass, name);
        self
    }

    /// Sample `texture` through descriptor slot `(set, binding)`
    pub fn read(&mut self, set: u32, binding: u32, texture: TextureHandle) -> &mut Self {
        let edge = RenderGraphEdge {
            kind: EdgeKind::Read,
            slot: BindingSlot::Set { set, binding },
            state: ResourceState::ShaderResource,
        };
        self.graph.dep_graph.link(texture.0, self.pass, edge);
        self
    }

    /// Sample `texture` through the reflection name `name`
    pub fn read_named(&mut self, name: &str, texture: TextureHandle) -> &mut Self {
        let edge = RenderGraphEdge {
            kind: EdgeKind::Read,
            slot: BindingSlot::Name(name.to_string()),
            state: ResourceState::ShaderResource,
        };
        self.graph.dep_graph.link(texture.0, self.pass, edge);
        self
    }

    /// Attach `texture` as color target `mrt_index`
    pub fn write(
        &mut self,
        mrt_index: u32,
        texture: TextureHandle,
        load_action: LoadAction,
        store_action: StoreAction,
    ) -> &mut Self {
        assert!(
            (mrt_index as usize) < MAX_MRT_COUNT,
            "mrt index {} out of range: at most {} color attachments",
            mrt_index,
            MAX_MRT_COUNT
        );
        let edge = RenderGraphEdge {
            kind: EdgeKind::Write,
            slot: BindingSlot::Attachment(mrt_index),
            state: ResourceState::RenderTarget,
        };
        self.graph.dep_graph.link(self.pass, texture.0, edge);
        let data = self.graph.render_data_mut(self.pass);
        data.load_actions[mrt_index as usize] = load_action;
        data.store_actions[mrt_index as usize] = store_action;
        self
    }

    pub fn set_depth_stencil(
        &mut self,
        texture: TextureHandle,
        depth_load: LoadAction,
        depth_store: StoreAction,
        stencil_load: LoadAction,
        stencil_store: StoreAction,
    ) -> &mut Self {
        let edge = RenderGraphEdge {
            kind: EdgeKind::Write,
            slot: BindingSlot::DepthStencil,
            state: ResourceState::DepthWrite,
        };
        self.graph.dep_graph.link(self.pass, texture.0, edge);
        let data = self.graph.render_data_mut(self.pass);
        data.depth_load_action = depth_load;
        data.depth_store_action = depth_store;
        data.stencil_load_action = stencil_load;
        data.stencil_store_action = stencil_store;
        self
    }

    pub fn read_buffer(&mut self, set: u32, binding: u32, buffer: BufferHandle) -> &mut Self {
        let edge = RenderGraphEdge {
            kind: EdgeKind::Read,
            slot: BindingSlot::Set { set, binding },
            state: ResourceState::ShaderResource,
        };
        self.graph.dep_graph.link(buffer.0, self.pass, edge);
        self
    }

    pub fn read_buffer_named(&mut self, name: &str, buffer: BufferHandle) -> &mut Self {
        let edge = RenderGraphEdge {
            kind: EdgeKind::Read,
            slot: BindingSlot::Name(name.to_string()),
            state: ResourceState::ShaderResource,
        };
        self.graph.dep_graph.link(buffer.0, self.pass, edge);
        self
    }

    pub fn write_buffer(&mut self, set: u32, binding: u32, buffer: BufferHandle) -> &mut Self {
        let edge = RenderGraphEdge {
            kind: EdgeKind::Write,
            slot: BindingSlot::Set { set, binding },
            state: ResourceState::UnorderedAccess,
        };
        self.graph.dep_graph.link(self.pass, buffer.0, edge);
        self
    }

    pub fn write_buffer_named(&mut self, name: &str, buffer: BufferHandle) -> &mut Self {
        let edge = RenderGraphEdge {
            kind: EdgeKind::Write,
            slot: BindingSlot::Name(name.to_string()),
            state: ResourceState::UnorderedAccess,
        };
        self.graph.dep_graph.link(self.pass, buffer.0, edge);
        self
    }

    /// Bind `buffer` to a fixed pipeline stage (vertex/index/indirect) in `state`
    pub fn use_buffer(&mut self, buffer: BufferHandle, state: ResourceState) -> &mut Self {
        let edge = RenderGraphEdge {
            kind: EdgeKind::PipelineBuffer,
            slot: BindingSlot::Pipeline,
            state,
        };
        self.graph.dep_graph.link(buffer.0, self.pass, edge);
        self
    }

    pub fn set_pipeline(&mut self, pipeline: RenderPipelineId) -> &mut Self {
        self.graph.render_data_mut(self.pass).pipeline = Some(pipeline);
        self
    }

    pub fn set_root_signature(&mut self, signature: RootSignatureId) -> &mut Self {
        self.graph.render_data_mut(self.pass).root_signature = Some(signature);
        self
    }
}

/// Fluent configuration surface for a compute pass
pub struct ComputePassBuilder<'a> {
    graph: &'a mut RenderGraph,
    pass: NodeId,
}

impl ComputePassBuilder<'_> {
    pub fn set_name(&mut self, name: &str) -> &mut Self {
        self.graph.set_pass_name(self.pass, name);
        self
    }

    pub fn read(&mut self, set: u32, binding: u32, texture: TextureHandle) -> &mut Self {
        let edge = RenderGraphEdge {
            kind: EdgeKind::Read,
            slot: BindingSlot::Set { set, binding },
            state: ResourceState::ShaderResource,
        };
        self.graph.dep_graph.link(texture.0, self.pass, edge);
        self
    }

    pub fn read_named(&mut self, name: &str, texture: TextureHandle) -> &mut Self {
        let edge = RenderGraphEdge {
            kind: EdgeKind::Read,
            slot: BindingSlot::Name(name.to_string()),
            state: ResourceState::ShaderResource,
        };
        self.graph.dep_graph.link(texture.0, self.pass, edge);
        self
    }

    pub fn readwrite(&mut self, set: u32, binding: u32, texture: TextureHandle) -> &mut Self {
        let edge = RenderGraphEdge {
            kind: EdgeKind::ReadWrite,
            slot: BindingSlot::Set { set, binding },
            state: ResourceState::UnorderedAccess,
        };
        self.graph.dep_graph.link(self.pass, texture.0, edge);
        self
    }

    pub fn readwrite_named(&mut self, name: &str, texture: TextureHandle) -> &mut Self {
        let edge = RenderGraphEdge {
            kind: EdgeKind::ReadWrite,
            slot: BindingSlot::Name(name.to_string()),
            state: ResourceState::UnorderedAccess,
        };
        self.graph.dep_graph.link(self.pass, texture.0, edge);
        self
    }

    pub fn read_buffer(&mut self, set: u32, binding: u32, buffer: BufferHandle) -> &mut Self {
        let edge = RenderGraphEdge {
            kind: EdgeKind::Read,
            slot: BindingSlot::Set { set, binding },
            state: ResourceState::ShaderResource,
        };
        self.graph.dep_graph.link(buffer.0, self.pass, edge);
        self
    }

    pub fn read_buffer_named(&mut self, name: &str, buffer: BufferHandle) -> &mut Self {
        let edge = RenderGraphEdge {
            kind: EdgeKind::Read,
            slot: BindingSlot::Name(name.to_string()),
            state: ResourceState::ShaderResource,
        };
        self.graph.dep_graph.link(buffer.0, self.pass, edge);
        self
    }

    pub fn readwrite_buffer(&mut self, set: u32, binding: u32, buffer: BufferHandle) -> &mut Self {
        let edge = RenderGraphEdge {
            kind: EdgeKind::ReadWrite,
            slot: BindingSlot::Set { set, binding },
            state: ResourceState::UnorderedAccess,
        };
        self.graph.dep_graph.link(self.pass, buffer.0, edge);
        self
    }

    pub fn readwrite_buffer_named(&mut self, name: &str, buffer: BufferHandle) -> &mut Self {
        let edge = RenderGraphEdge {
            kind: EdgeKind::ReadWrite,
            slot: BindingSlot::Name(name.to_string()),
            state: ResourceState::UnorderedAccess,
        };
        self.graph.dep_graph.link(self.pass, buffer.0, edge);
        self
    }

    pub fn set_pipeline(&mut self, pipeline: ComputePipelineId) -> &mut Self {
        self.graph.compute_data_mut(self.pass).pipeline = Some(pipeline);
        self
    }

    pub fn set_root_signature(&mut self, signature: RootSignatureId) -> &mut Self {
        self.graph.compute_data_mut(self.pass).root_signature = Some(signature);
        self
    }
}

/// Fluent configuration surface for a copy pass
pub struct CopyPassBuilder<'a> {
    graph: &'a mut RenderGraph,
    pass: NodeId,
}

impl CopyPassBuilder<'_> {
    pub fn set_name(&mut self, name: &str) -> &mut Self {
        self.graph.set_pass_name(self.pass, name);
        self
    }

    pub fn texture_to_texture(&mut self, src: TextureHandle, dst: TextureHandle) -> &mut Self {
        let in_edge = RenderGraphEdge {
            kind: EdgeKind::Read,
            slot: BindingSlot::Set { set: 0, binding: 0 },
            state: ResourceState::CopySource,
        };
        let out_edge = RenderGraphEdge {
            kind: EdgeKind::ReadWrite,
            slot: BindingSlot::Set { set: 0, binding: 0 },
            state: ResourceState::CopyDest,
        };
        self.graph.dep_graph.link(src.0, self.pass, in_edge);
        self.graph.dep_graph.link(self.pass, dst.0, out_edge);
        self.graph.copy_data_mut(self.pass).texture_copies.push((src, dst));
        self
    }

    pub fn buffer_to_buffer(&mut self, src: BufferHandle, dst: BufferHandle) -> &mut Self {
        let in_edge = RenderGraphEdge {
            kind: EdgeKind::Read,
            slot: BindingSlot::Set { set: 0, binding: 0 },
            state: ResourceState::CopySource,
        };
        let out_edge = RenderGraphEdge {
            kind: EdgeKind::ReadWrite,
            slot: BindingSlot::Set { set: 0, binding: 0 },
            state: ResourceState::CopyDest,
        };
        self.graph.dep_graph.link(src.0, self.pass, in_edge);
        self.graph.dep_graph.link(self.pass, dst.0, out_edge);
        self.graph.copy_data_mut(self.pass).buffer_copies.push((src, dst));
        self
    }
}

/// Fluent configuration surface for a present pass
pub struct PresentPassBuilder<'a> {
    graph: &'a mut RenderGraph,
    pass: NodeId,
}

impl PresentPassBuilder<'_> {
    pub fn set_name(&mut self, name: &str) -> &mut Self {
        self.graph.set_pass_name(self.pass, name);
        self
    }

    pub fn swapchain(&mut self, chain: SwapchainId, index: u32) -> &mut Self {
        let data = self.graph.present_data_mut(self.pass);
        data.swapchain = Some(chain);
        data.index = index;
        self
    }

    /// Declare the backbuffer texture this pass presents
    pub fn texture(&mut self, texture: TextureHandle) -> &mut Self {
        let edge = RenderGraphEdge {
            kind: EdgeKind::Read,
            slot: BindingSlot::Set { set: 0, binding: 0 },
            state: ResourceState::Present,
        };
        self.graph.dep_graph.link(texture.0, self.pass, edge);
        self
    }
}

/// Fluent configuration surface for a texture resource
pub struct TextureBuilder<'a> {
    graph: &'a mut RenderGraph,
    node: NodeId,
}

impl TextureBuilder<'_> {
    pub fn set_name(&mut self, name: &str) -> &mut Self {
        self.graph.resource_mut(self.node).name = Some(name.to_string());
        self.graph.blackboard.add_texture(name, self.node);
        self
    }

    /// Back this node with an externally owned texture; the descriptor is
    /// pre-filled from the physical resource's actual properties and the
    /// graph will never allocate for it
    pub fn import(
        &mut self,
        texture: TextureId,
        desc: TextureDescriptor,
        init_state: ResourceState,
    ) -> &mut Self {
        let node = self.graph.resource_mut(self.node);
        node.kind = ResourceKind::Texture {
            desc,
            imported: Some(texture),
        };
        node.init_state = init_state;
        self
    }

    pub fn extent(&mut self, width: u32, height: u32, depth: u32) -> &mut Self {
        let desc = self.desc_mut();
        desc.width = width;
        desc.height = height;
        desc.depth = depth;
        self
    }

    pub fn format(&mut self, format: TextureFormat) -> &mut Self {
        self.desc_mut().format = format;
        self
    }

    pub fn array(&mut self, layers: u32) -> &mut Self {
        self.desc_mut().array_layers = layers;
        self
    }

    pub fn mip_levels(&mut self, levels: u32) -> &mut Self {
        self.desc_mut().mip_levels = levels;
        self
    }

    pub fn sample_count(&mut self, count: SampleCount) -> &mut Self {
        self.desc_mut().sample_count = count;
        self
    }

    pub fn allow_render_target(&mut self) -> &mut Self {
        self.desc_mut().usage |= TextureUsage::RENDER_TARGET;
        self
    }

    pub fn allow_depth_stencil(&mut self) -> &mut Self {
        self.desc_mut().usage |= TextureUsage::DEPTH_STENCIL;
        self
    }

    pub fn allow_readwrite(&mut self) -> &mut Self {
        self.desc_mut().usage |= TextureUsage::STORAGE;
        self
    }

    pub fn owns_memory(&mut self) -> &mut Self {
        self.desc_mut().owns_memory = true;
        self
    }

    /// Mark this texture as externally observed: it joins the culling root
    /// set even when no present pass consumes it
    pub fn exported(&mut self) -> &mut Self {
        self.graph.resource_mut(self.node).exported = true;
        self
    }

    fn desc_mut(&mut self) -> &mut TextureDescriptor {
        match &mut self.graph.resource_mut(self.node).kind {
            ResourceKind::Texture { desc, .. } => desc,
            _ => unreachable!("node inserted as texture"),
        }
    }
}

/// Fluent configuration surface for a buffer resource
pub struct BufferBuilder<'a> {
    graph: &'a mut RenderGraph,
    node: NodeId,
}

impl BufferBuilder<'_> {
    pub fn set_name(&mut self, name: &str) -> &mut Self {
        self.graph.resource_mut(self.node).name = Some(name.to_string());
        self.graph.blackboard.add_buffer(name, self.node);
        self
    }

    /// Back this node with an externally owned buffer, pre-filling the
    /// descriptor from the physical resource's properties
    pub fn import(
        &mut self,
        buffer: BufferId,
        desc: BufferDescriptor,
        init_state: ResourceState,
    ) -> &mut Self {
        let node = self.graph.resource_mut(self.node);
        node.kind = ResourceKind::Buffer {
            desc,
            imported: Some(buffer),
        };
        node.init_state = init_state;
        self
    }

    pub fn size(&mut self, size: u64) -> &mut Self {
        self.desc_mut().size = size;
        self
    }

    pub fn structured(&mut self, first_element: u64, element_count: u64, element_stride: u64) -> &mut Self {
        let desc = self.desc_mut();
        desc.first_element = first_element;
        desc.element_count = element_count;
        desc.element_stride = element_stride;
        self
    }

    pub fn memory_usage(&mut self, usage: MemoryUsage) -> &mut Self {
        self.desc_mut().memory_usage = usage;
        self
    }

    pub fn allow_shader_read(&mut self) -> &mut Self {
        self.desc_mut().usage |= BufferUsage::UNIFORM;
        self
    }

    pub fn allow_shader_readwrite(&mut self) -> &mut Self {
        self.desc_mut().usage |= BufferUsage::STORAGE;
        self
    }

    pub fn as_upload_buffer(&mut self) -> &mut Self {
        {
            let desc = self.desc_mut();
            desc.usage |= BufferUsage::PERSISTENT_MAP | BufferUsage::COPY_SRC;
            desc.memory_usage = MemoryUsage::CpuOnly;
        }
        self.graph.resource_mut(self.node).init_state = ResourceState::CopySource;
        self
    }

    pub fn as_vertex_buffer(&mut self) -> &mut Self {
        self.desc_mut().usage |= BufferUsage::VERTEX | BufferUsage::COPY_DST;
        self.graph.resource_mut(self.node).init_state = ResourceState::CopyDest;
        self
    }

    pub fn as_index_buffer(&mut self) -> &mut Self {
        self.desc_mut().usage |= BufferUsage::INDEX | BufferUsage::COPY_DST;
        self.graph.resource_mut(self.node).init_state = ResourceState::CopyDest;
        self
    }

    pub fn prefer_on_device(&mut self) -> &mut Self {
        self.desc_mut().memory_usage = MemoryUsage::GpuOnly;
        self
    }

    pub fn prefer_on_host(&mut self) -> &mut Self {
        self.desc_mut().memory_usage = MemoryUsage::CpuToGpu;
        self
    }

    pub fn owns_memory(&mut self) -> &mut Self {
        self.desc_mut().owns_memory = true;
        self
    }

    /// Mark this buffer as externally observed, joining the culling root set
    pub fn exported(&mut self) -> &mut Self {
        self.graph.resource_mut(self.node).exported = true;
        self
    }

    fn desc_mut(&mut self) -> &mut BufferDescriptor {
        match &mut self.graph.resource_mut(self.node).kind {
            ResourceKind::Buffer { desc, .. } => desc,
            _ => unreachable!("node inserted as buffer"),
        }
    }
}
