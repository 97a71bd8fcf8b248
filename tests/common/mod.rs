//! Shared test fixtures

use render_graph::backend::*;

/// Everything a backend was asked to do, in call order
#[derive(Debug)]
pub enum Call {
    CreateTexture(TextureId),
    DestroyTexture(TextureId),
    CreateBuffer(BufferId),
    DestroyBuffer(BufferId),
    CreateTextureView(TextureViewId),
    DestroyTextureView(TextureViewId),
    BeginCommands(u32),
    Barriers(Vec<ResourceBarrier>),
    BeginRenderPass {
        label: Option<String>,
        color_count: usize,
        has_depth: bool,
    },
    EndRenderPass,
    BeginComputePass(Option<String>),
    EndComputePass,
    SetRenderPipeline(RenderPipelineId),
    SetComputePipeline(ComputePipelineId),
    CopyTexture(TextureCopy),
    CopyBuffer(BufferCopy),
    Submit,
    Present(SwapchainId, u32),
}

/// Backend double that hands out monotonically increasing ids and records
/// every call for later assertion
pub struct RecordingBackend {
    next_id: u64,
    recycle_texture_ids: bool,
    free_texture_ids: Vec<TextureId>,
    pub calls: Vec<Call>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        env_logger::builder().is_test(true).try_init().ok();
        Self {
            next_id: 1,
            recycle_texture_ids: false,
            free_texture_ids: Vec::new(),
            calls: Vec::new(),
        }
    }

    /// Backend that hands freed texture ids to later allocations, the way
    /// real allocators reuse slots
    pub fn with_texture_id_recycling() -> Self {
        Self {
            recycle_texture_ids: true,
            ..Self::new()
        }
    }

    fn fresh(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Every barrier recorded across all batches, flattened
    pub fn barriers(&self) -> Vec<ResourceBarrier> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::Barriers(batch) => Some(batch.clone()),
                _ => None,
            })
            .flatten()
            .collect()
    }

    pub fn texture_barriers_for(&self, texture: TextureId) -> Vec<TextureBarrier> {
        self.barriers()
            .into_iter()
            .filter_map(|barrier| match barrier {
                ResourceBarrier::Texture(b) if b.texture == texture => Some(b),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.calls.iter().filter(|call| predicate(call)).count()
    }

    pub fn position(&self, predicate: impl Fn(&Call) -> bool) -> Option<usize> {
        self.calls.iter().position(|call| predicate(call))
    }
}

impl RenderBackend for RecordingBackend {
    fn device_id(&self) -> DeviceId {
        DeviceId(0)
    }

    fn create_texture(&mut self, _desc: &TextureDescriptor) -> BackendResult<TextureId> {
        let id = match self.free_texture_ids.pop() {
            Some(id) if self.recycle_texture_ids => id,
            _ => TextureId(self.fresh()),
        };
        self.calls.push(Call::CreateTexture(id));
        Ok(id)
    }

    fn destroy_texture(&mut self, texture: TextureId) {
        if self.recycle_texture_ids {
            self.free_texture_ids.push(texture);
        }
        self.calls.push(Call::DestroyTexture(texture));
    }

    fn create_buffer(&mut self, _desc: &BufferDescriptor) -> BackendResult<BufferId> {
        let id = BufferId(self.fresh());
        self.calls.push(Call::CreateBuffer(id));
        Ok(id)
    }

    fn destroy_buffer(&mut self, buffer: BufferId) {
        self.calls.push(Call::DestroyBuffer(buffer));
    }

    fn create_texture_view(
        &mut self,
        _desc: &TextureViewDescriptor,
    ) -> BackendResult<TextureViewId> {
        let id = TextureViewId(self.fresh());
        self.calls.push(Call::CreateTextureView(id));
        Ok(id)
    }

    fn destroy_texture_view(&mut self, view: TextureViewId) {
        self.calls.push(Call::DestroyTextureView(view));
    }

    fn begin_commands(&mut self, frame_slot: u32) -> BackendResult<()> {
        self.calls.push(Call::BeginCommands(frame_slot));
        Ok(())
    }

    fn resource_barrier(&mut self, barriers: &[ResourceBarrier]) {
        self.calls.push(Call::Barriers(barriers.to_vec()));
    }

    fn begin_render_pass(&mut self, desc: &RenderPassDescriptor) {
        self.calls.push(Call::BeginRenderPass {
            label: desc.label.clone(),
            color_count: desc.color_attachments.len(),
            has_depth: desc.depth_stencil_attachment.is_some(),
        });
    }

    fn end_render_pass(&mut self) {
        self.calls.push(Call::EndRenderPass);
    }

    fn begin_compute_pass(&mut self, label: Option<&str>) {
        self.calls.push(Call::BeginComputePass(label.map(String::from)));
    }

    fn end_compute_pass(&mut self) {
        self.calls.push(Call::EndComputePass);
    }

    fn set_render_pipeline(&mut self, pipeline: RenderPipelineId) {
        self.calls.push(Call::SetRenderPipeline(pipeline));
    }

    fn set_compute_pipeline(&mut self, pipeline: ComputePipelineId) {
        self.calls.push(Call::SetComputePipeline(pipeline));
    }

    fn copy_texture_to_texture(&mut self, copy: &TextureCopy) {
        self.calls.push(Call::CopyTexture(*copy));
    }

    fn copy_buffer_to_buffer(&mut self, copy: &BufferCopy) {
        self.calls.push(Call::CopyBuffer(*copy));
    }

    fn submit(&mut self) -> BackendResult<()> {
        self.calls.push(Call::Submit);
        Ok(())
    }

    fn present(&mut self, swapchain: SwapchainId, index: u32) -> BackendResult<()> {
        self.calls.push(Call::Present(swapchain, index));
        Ok(())
    }
}
