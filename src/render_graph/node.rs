//! Resource and pass nodes stored in the dependency graph arena

use crate::backend::types::*;
use crate::backend::{BufferId, ComputePipelineId, RenderPipelineId, RootSignatureId, SwapchainId, TextureId};
use crate::graph::NodeId;
use crate::render_graph::executor::PassExecuteFn;

/// Maximum number of simultaneous color attachments on a render pass
pub const MAX_MRT_COUNT: usize = 8;

/// Opaque reference to a texture node, valid for the current population cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub(crate) NodeId);

/// Opaque reference to a buffer node, valid for the current population cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub(crate) NodeId);

/// Opaque reference to a pass node, valid for the current population cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PassHandle(pub(crate) NodeId);

/// Node payload: either a logical resource or a unit of GPU work
pub enum RenderGraphNode {
    Resource(ResourceNode),
    Pass(PassNode),
}

impl RenderGraphNode {
    pub fn name(&self) -> Option<&str> {
        match self {
            RenderGraphNode::Resource(r) => r.name.as_deref(),
            RenderGraphNode::Pass(p) => p.name.as_deref(),
        }
    }

    pub fn as_resource(&self) -> Option<&ResourceNode> {
        match self {
            RenderGraphNode::Resource(r) => Some(r),
            RenderGraphNode::Pass(_) => None,
        }
    }

    pub fn as_resource_mut(&mut self) -> Option<&mut ResourceNode> {
        match self {
            RenderGraphNode::Resource(r) => Some(r),
            RenderGraphNode::Pass(_) => None,
        }
    }

    pub fn as_pass(&self) -> Option<&PassNode> {
        match self {
            RenderGraphNode::Pass(p) => Some(p),
            RenderGraphNode::Resource(_) => None,
        }
    }

    pub fn as_pass_mut(&mut self) -> Option<&mut PassNode> {
        match self {
            RenderGraphNode::Pass(p) => Some(p),
            RenderGraphNode::Resource(_) => None,
        }
    }
}

/// Logical texture or buffer declared for one frame population
pub struct ResourceNode {
    pub kind: ResourceKind,
    /// State the physical resource is in when the frame begins
    pub init_state: ResourceState,
    /// Externally observed output, always part of the culling root set
    pub exported: bool,
    pub name: Option<String>,
}

/// Tagged resource variant
pub enum ResourceKind {
    Texture {
        desc: TextureDescriptor,
        /// Physical backing supplied by the caller, `None` until the executor
        /// allocates one for internally created resources
        imported: Option<TextureId>,
    },
    Buffer {
        desc: BufferDescriptor,
        imported: Option<BufferId>,
    },
}

impl ResourceNode {
    pub fn is_imported(&self) -> bool {
        match &self.kind {
            ResourceKind::Texture { imported, .. } => imported.is_some(),
            ResourceKind::Buffer { imported, .. } => imported.is_some(),
        }
    }

    pub fn is_texture(&self) -> bool {
        matches!(self.kind, ResourceKind::Texture { .. })
    }

    pub fn texture_desc(&self) -> Option<&TextureDescriptor> {
        match &self.kind {
            ResourceKind::Texture { desc, .. } => Some(desc),
            ResourceKind::Buffer { .. } => None,
        }
    }

    pub fn buffer_desc(&self) -> Option<&BufferDescriptor> {
        match &self.kind {
            ResourceKind::Buffer { desc, .. } => Some(desc),
            ResourceKind::Texture { .. } => None,
        }
    }
}

/// Unit of GPU work declared for one frame population
pub struct PassNode {
    pub kind: PassKind,
    /// Deterministic tie-break order among passes with no path between them
    pub order: u32,
    pub name: Option<String>,
}

/// Tagged pass variant
pub enum PassKind {
    Render(RenderPassData),
    Compute(ComputePassData),
    Copy(CopyPassData),
    Present(PresentPassData),
}

impl PassNode {
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            PassKind::Render(_) => "render",
            PassKind::Compute(_) => "compute",
            PassKind::Copy(_) => "copy",
            PassKind::Present(_) => "present",
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self.kind, PassKind::Present(_))
    }

    pub(crate) fn take_executor(&mut self) -> Option<PassExecuteFn> {
        match &mut self.kind {
            PassKind::Render(data) => data.executor.take(),
            PassKind::Compute(data) => data.executor.take(),
            PassKind::Copy(_) | PassKind::Present(_) => None,
        }
    }
}

pub struct RenderPassData {
    pub pipeline: Option<RenderPipelineId>,
    pub root_signature: Option<RootSignatureId>,
    pub load_actions: [LoadAction; MAX_MRT_COUNT],
    pub store_actions: [StoreAction; MAX_MRT_COUNT],
    pub depth_load_action: LoadAction,
    pub depth_store_action: StoreAction,
    pub stencil_load_action: LoadAction,
    pub stencil_store_action: StoreAction,
    pub(crate) executor: Option<PassExecuteFn>,
}

impl Default for RenderPassData {
    fn default() -> Self {
        Self {
            pipeline: None,
            root_signature: None,
            load_actions: [LoadAction::DontCare; MAX_MRT_COUNT],
            store_actions: [StoreAction::Store; MAX_MRT_COUNT],
            depth_load_action: LoadAction::DontCare,
            depth_store_action: StoreAction::Store,
            stencil_load_action: LoadAction::DontCare,
            stencil_store_action: StoreAction::Store,
            executor: None,
        }
    }
}

#[derive(Default)]
pub struct ComputePassData {
    pub pipeline: Option<ComputePipelineId>,
    pub root_signature: Option<RootSignatureId>,
    pub(crate) executor: Option<PassExecuteFn>,
}

/// Whole-subresource copy requests recorded by the copy-pass builder
#[derive(Default)]
pub struct CopyPassData {
    pub texture_copies: Vec<(TextureHandle, TextureHandle)>,
    pub buffer_copies: Vec<(BufferHandle, BufferHandle)>,
}

#[derive(Default)]
pub struct PresentPassData {
    pub swapchain: Option<SwapchainId>,
    pub index: u32,
}
