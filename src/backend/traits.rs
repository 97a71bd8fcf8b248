//! Core backend abstraction traits
//!
//! The graph drives the GPU exclusively through [`RenderBackend`]; it never
//! assumes a specific native graphics API.

use crate::backend::types::*;
use thiserror::Error;

/// Backend error type
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Failed to create buffer: {0}")]
    BufferCreationFailed(String),
    #[error("Failed to create texture: {0}")]
    TextureCreationFailed(String),
    #[error("Failed to create texture view: {0}")]
    TextureViewCreationFailed(String),
    #[error("Failed to begin command recording: {0}")]
    CommandBeginFailed(String),
    #[error("Failed to submit commands: {0}")]
    SubmitFailed(String),
    #[error("Failed to present: {0}")]
    PresentFailed(String),
    #[error("Descriptor pool exhausted: {0}")]
    DescriptorPoolExhausted(String),
    #[error("Out of memory")]
    OutOfMemory,
    #[error("Device lost")]
    DeviceLost,
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Identity of the device a backend wraps, part of every view-cache key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceId(pub u64);

/// Handle to a GPU buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(pub u64);

/// Handle to a GPU texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub u64);

/// Handle to a texture view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureViewId(pub u64);

/// Handle to a swapchain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SwapchainId(pub u64);

/// Handle to a render pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderPipelineId(pub u64);

/// Handle to a compute pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ComputePipelineId(pub u64);

/// Handle to a root signature / pipeline layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RootSignatureId(pub u64);

/// A single texture state transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureBarrier {
    pub texture: TextureId,
    pub src_state: ResourceState,
    pub dst_state: ResourceState,
}

/// A single buffer state transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferBarrier {
    pub buffer: BufferId,
    pub src_state: ResourceState,
    pub dst_state: ResourceState,
}

/// Barrier batch entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceBarrier {
    Texture(TextureBarrier),
    Buffer(BufferBarrier),
}

/// Color attachment for a physical render pass
#[derive(Debug, Clone)]
pub struct ColorAttachment {
    pub view: TextureViewId,
    pub load_action: LoadAction,
    pub store_action: StoreAction,
}

/// Depth/stencil attachment for a physical render pass
#[derive(Debug, Clone)]
pub struct DepthStencilAttachment {
    pub view: TextureViewId,
    pub depth_load_action: LoadAction,
    pub depth_store_action: StoreAction,
    pub stencil_load_action: LoadAction,
    pub stencil_store_action: StoreAction,
}

/// Physical render pass descriptor handed to the backend
#[derive(Debug, Clone, Default)]
pub struct RenderPassDescriptor {
    pub label: Option<String>,
    pub color_attachments: Vec<ColorAttachment>,
    pub depth_stencil_attachment: Option<DepthStencilAttachment>,
}

/// Texture-to-texture copy region, whole subresource granularity
#[derive(Debug, Clone, Copy)]
pub struct TextureCopy {
    pub src: TextureId,
    pub dst: TextureId,
    pub mip_level: u32,
    pub array_layer: u32,
}

/// Buffer-to-buffer copy region
#[derive(Debug, Clone, Copy)]
pub struct BufferCopy {
    pub src: BufferId,
    pub src_offset: u64,
    pub dst: BufferId,
    pub dst_offset: u64,
    pub size: u64,
}

/// Device/queue capability set the graph executes against.
///
/// Object safe on purpose: the executor stores it as `&mut dyn RenderBackend`
/// so pass callbacks can record commands without knowing the concrete API.
pub trait RenderBackend {
    /// Stable identity of the underlying device, used in view-cache keys
    fn device_id(&self) -> DeviceId;

    // Resource creation / destruction

    fn create_texture(&mut self, desc: &TextureDescriptor) -> BackendResult<TextureId>;
    fn destroy_texture(&mut self, texture: TextureId);

    fn create_buffer(&mut self, desc: &BufferDescriptor) -> BackendResult<BufferId>;
    fn destroy_buffer(&mut self, buffer: BufferId);

    fn create_texture_view(
        &mut self,
        desc: &TextureViewDescriptor,
    ) -> BackendResult<TextureViewId>;
    fn destroy_texture_view(&mut self, view: TextureViewId);

    // Command recording

    /// Begin recording into the given in-flight frame's command context
    fn begin_commands(&mut self, frame_slot: u32) -> BackendResult<()>;

    /// Record a batch of state transitions
    fn resource_barrier(&mut self, barriers: &[ResourceBarrier]);

    fn begin_render_pass(&mut self, desc: &RenderPassDescriptor);
    fn end_render_pass(&mut self);

    fn begin_compute_pass(&mut self, label: Option<&str>);
    fn end_compute_pass(&mut self);

    fn set_render_pipeline(&mut self, pipeline: RenderPipelineId);
    fn set_compute_pipeline(&mut self, pipeline: ComputePipelineId);

    fn copy_texture_to_texture(&mut self, copy: &TextureCopy);
    fn copy_buffer_to_buffer(&mut self, copy: &BufferCopy);

    // Submission

    fn submit(&mut self) -> BackendResult<()>;
    fn present(&mut self, swapchain: SwapchainId, index: u32) -> BackendResult<()>;
}
