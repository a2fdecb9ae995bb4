/// Mock GraphicsDevice for unit tests (no GPU required)
///
/// Hands out monotonically numbered handles, tracks every live object so
/// tests can assert against leaks, records all recorded commands and
/// submissions into an inspectable log, and lets tests script the surface
/// status returned by acquire/present.

use rustc_hash::FxHashMap;
use std::collections::VecDeque;

use crate::error::Result;
use crate::engine_bail;
use super::graphics_device::*;

/// Everything the mock device observed, in call order
#[derive(Debug, Clone, PartialEq)]
pub enum MockCommand {
    BeginCommandBuffer(CommandBufferHandle),
    EndCommandBuffer(CommandBufferHandle),
    BeginRenderPass {
        cmd: CommandBufferHandle,
        pass: PassHandle,
        framebuffer: FramebufferHandle,
        clear_count: usize,
    },
    NextSubpass(CommandBufferHandle),
    EndRenderPass(CommandBufferHandle),
    SetViewport(CommandBufferHandle, ViewportRect),
    SetScissor(CommandBufferHandle, Rect2D),
    SetLineWidth(CommandBufferHandle, f32),
    BindPipeline {
        cmd: CommandBufferHandle,
        bind_point: PipelineBindPoint,
        pipeline: PipelineHandle,
    },
    BindDescriptorSet {
        cmd: CommandBufferHandle,
        bind_point: PipelineBindPoint,
        slot: DescriptorSlot,
        set: DescriptorSetHandle,
    },
    Draw {
        cmd: CommandBufferHandle,
        vertex_count: u32,
    },
    Dispatch {
        cmd: CommandBufferHandle,
        x: u32,
        y: u32,
        z: u32,
    },
    Submit(SubmitInfo),
    Present {
        wait_semaphore: SemaphoreHandle,
        image_index: u32,
    },
    QueueWaitIdle,
}

pub struct MockDevice {
    next_id: u64,

    // Live objects
    images: FxHashMap<u64, ImageDesc>,
    buffers: FxHashMap<u64, u64>,
    passes: FxHashMap<u64, RenderPassDesc>,
    framebuffers: FxHashMap<u64, FramebufferDesc>,
    pipelines: FxHashMap<u64, PipelineBindPoint>,
    descriptor_sets: FxHashMap<u64, DescriptorWrites>,
    semaphores: FxHashMap<u64, ()>,
    fences: FxHashMap<u64, bool>,
    command_buffers: FxHashMap<u64, ()>,

    // Swapchain state
    pub surface_width: u32,
    pub surface_height: u32,
    pub swap_image_count: usize,
    swapchain_images: Vec<ImageHandle>,
    swapchain_format: ImageFormat,
    acquire_count: u64,

    // Scripted surface statuses (front popped first; Optimal when empty)
    pub acquire_statuses: VecDeque<SurfaceStatus>,
    pub present_statuses: VecDeque<SurfaceStatus>,
    /// When true, every queue_submit fails
    pub fail_submits: bool,

    // Observation log
    pub commands: Vec<MockCommand>,
    pub descriptor_write_log: Vec<(DescriptorSetHandle, DescriptorWrites)>,
    pub buffer_write_log: Vec<(BufferHandle, u64, usize)>,
}

impl MockDevice {
    pub fn new() -> Self {
        Self::with_surface(1920, 1080)
    }

    pub fn with_surface(width: u32, height: u32) -> Self {
        Self {
            next_id: 1,
            images: FxHashMap::default(),
            buffers: FxHashMap::default(),
            passes: FxHashMap::default(),
            framebuffers: FxHashMap::default(),
            pipelines: FxHashMap::default(),
            descriptor_sets: FxHashMap::default(),
            semaphores: FxHashMap::default(),
            fences: FxHashMap::default(),
            command_buffers: FxHashMap::default(),
            surface_width: width,
            surface_height: height,
            swap_image_count: 3,
            swapchain_images: Vec::new(),
            swapchain_format: ImageFormat::Bgra8Unorm,
            acquire_count: 0,
            acquire_statuses: VecDeque::new(),
            present_statuses: VecDeque::new(),
            fail_submits: false,
            commands: Vec::new(),
            descriptor_write_log: Vec::new(),
            buffer_write_log: Vec::new(),
        }
    }

    fn alloc_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    // ----- inspection helpers -----

    pub fn live_image_count(&self) -> usize {
        self.images.len()
    }

    pub fn live_framebuffer_count(&self) -> usize {
        self.framebuffers.len()
    }

    pub fn live_pass_count(&self) -> usize {
        self.passes.len()
    }

    pub fn live_pipeline_count(&self) -> usize {
        self.pipelines.len()
    }

    pub fn live_buffer_count(&self) -> usize {
        self.buffers.len()
    }

    pub fn live_descriptor_set_count(&self) -> usize {
        self.descriptor_sets.len()
    }

    pub fn live_semaphore_count(&self) -> usize {
        self.semaphores.len()
    }

    pub fn live_fence_count(&self) -> usize {
        self.fences.len()
    }

    pub fn live_command_buffer_count(&self) -> usize {
        self.command_buffers.len()
    }

    pub fn image_desc(&self, image: ImageHandle) -> Option<&ImageDesc> {
        self.images.get(&image.0)
    }

    pub fn framebuffer_desc(&self, framebuffer: FramebufferHandle) -> Option<&FramebufferDesc> {
        self.framebuffers.get(&framebuffer.0)
    }

    /// Accumulated state of a descriptor set (all writes merged)
    pub fn descriptor_state(&self, set: DescriptorSetHandle) -> Option<&DescriptorWrites> {
        self.descriptor_sets.get(&set.0)
    }

    pub fn fence_signaled(&self, fence: FenceHandle) -> bool {
        self.fences.get(&fence.0).copied().unwrap_or(false)
    }

    pub fn signaled_fence_count(&self) -> usize {
        self.fences.values().filter(|signaled| **signaled).count()
    }

    /// All queue submissions in order
    pub fn submits(&self) -> Vec<SubmitInfo> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                MockCommand::Submit(info) => Some(*info),
                _ => None,
            })
            .collect()
    }

    /// All present calls in order
    pub fn presents(&self) -> Vec<(SemaphoreHandle, u32)> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                MockCommand::Present {
                    wait_semaphore,
                    image_index,
                } => Some((*wait_semaphore, *image_index)),
                _ => None,
            })
            .collect()
    }

    /// Commands recorded into one specific command buffer, in order
    pub fn commands_for(&self, cmd: CommandBufferHandle) -> Vec<&MockCommand> {
        self.commands
            .iter()
            .filter(|c| match c {
                MockCommand::BeginCommandBuffer(h)
                | MockCommand::EndCommandBuffer(h)
                | MockCommand::NextSubpass(h)
                | MockCommand::EndRenderPass(h)
                | MockCommand::SetViewport(h, _)
                | MockCommand::SetScissor(h, _)
                | MockCommand::SetLineWidth(h, _)
                | MockCommand::Draw { cmd: h, .. }
                | MockCommand::Dispatch { cmd: h, .. }
                | MockCommand::BeginRenderPass { cmd: h, .. }
                | MockCommand::BindPipeline { cmd: h, .. }
                | MockCommand::BindDescriptorSet { cmd: h, .. } => *h == cmd,
                _ => false,
            })
            .collect()
    }

    pub fn clear_log(&mut self) {
        self.commands.clear();
        self.descriptor_write_log.clear();
        self.buffer_write_log.clear();
    }
}

impl Default for MockDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphicsDevice for MockDevice {
    fn create_image(&mut self, desc: &ImageDesc) -> Result<ImageHandle> {
        let id = self.alloc_id();
        self.images.insert(id, *desc);
        Ok(ImageHandle(id))
    }

    fn destroy_image(&mut self, image: ImageHandle) {
        assert!(
            self.images.remove(&image.0).is_some(),
            "destroy of unknown image {:?}",
            image
        );
    }

    fn create_buffer(&mut self, size: u64) -> Result<BufferHandle> {
        let id = self.alloc_id();
        self.buffers.insert(id, size);
        Ok(BufferHandle(id))
    }

    fn write_buffer(&mut self, buffer: BufferHandle, offset: u64, data: &[u8]) -> Result<()> {
        if !self.buffers.contains_key(&buffer.0) {
            engine_bail!("nova3d::mock", "write to unknown buffer {:?}", buffer);
        }
        self.buffer_write_log.push((buffer, offset, data.len()));
        Ok(())
    }

    fn destroy_buffer(&mut self, buffer: BufferHandle) {
        assert!(
            self.buffers.remove(&buffer.0).is_some(),
            "destroy of unknown buffer {:?}",
            buffer
        );
    }

    fn create_render_pass(&mut self, desc: &RenderPassDesc) -> Result<PassHandle> {
        let id = self.alloc_id();
        self.passes.insert(id, desc.clone());
        Ok(PassHandle(id))
    }

    fn destroy_render_pass(&mut self, pass: PassHandle) {
        assert!(
            self.passes.remove(&pass.0).is_some(),
            "destroy of unknown render pass {:?}",
            pass
        );
    }

    fn create_framebuffer(&mut self, desc: &FramebufferDesc) -> Result<FramebufferHandle> {
        for attachment in &desc.attachments {
            if !self.images.contains_key(&attachment.0) {
                engine_bail!(
                    "nova3d::mock",
                    "framebuffer references destroyed image {:?}",
                    attachment
                );
            }
        }
        let id = self.alloc_id();
        self.framebuffers.insert(id, desc.clone());
        Ok(FramebufferHandle(id))
    }

    fn destroy_framebuffer(&mut self, framebuffer: FramebufferHandle) {
        assert!(
            self.framebuffers.remove(&framebuffer.0).is_some(),
            "destroy of unknown framebuffer {:?}",
            framebuffer
        );
    }

    fn create_graphics_pipeline(
        &mut self,
        _desc: &PipelineDesc,
        pass: PassHandle,
    ) -> Result<PipelineHandle> {
        if !self.passes.contains_key(&pass.0) {
            engine_bail!("nova3d::mock", "pipeline references unknown pass {:?}", pass);
        }
        let id = self.alloc_id();
        self.pipelines.insert(id, PipelineBindPoint::Graphics);
        Ok(PipelineHandle(id))
    }

    fn create_compute_pipeline(&mut self, _shader: ShaderKey) -> Result<PipelineHandle> {
        let id = self.alloc_id();
        self.pipelines.insert(id, PipelineBindPoint::Compute);
        Ok(PipelineHandle(id))
    }

    fn destroy_pipeline(&mut self, pipeline: PipelineHandle) {
        assert!(
            self.pipelines.remove(&pipeline.0).is_some(),
            "destroy of unknown pipeline {:?}",
            pipeline
        );
    }

    fn create_descriptor_set(&mut self) -> Result<DescriptorSetHandle> {
        let id = self.alloc_id();
        self.descriptor_sets.insert(id, DescriptorWrites::default());
        Ok(DescriptorSetHandle(id))
    }

    fn update_descriptor_set(
        &mut self,
        set: DescriptorSetHandle,
        writes: &DescriptorWrites,
    ) -> Result<()> {
        let Some(state) = self.descriptor_sets.get_mut(&set.0) else {
            engine_bail!("nova3d::mock", "update of unknown descriptor set {:?}", set);
        };
        if writes.environment_buffer.is_some() {
            state.environment_buffer = writes.environment_buffer;
        }
        if writes.lights_buffer.is_some() {
            state.lights_buffer = writes.lights_buffer;
        }
        if writes.param_buffer.is_some() {
            state.param_buffer = writes.param_buffer;
        }
        if writes.input_image.is_some() {
            state.input_image = writes.input_image;
        }
        if writes.storage_image.is_some() {
            state.storage_image = writes.storage_image;
        }
        if writes.model_buffer.is_some() {
            state.model_buffer = writes.model_buffer;
        }
        self.descriptor_write_log.push((set, *writes));
        Ok(())
    }

    fn destroy_descriptor_set(&mut self, set: DescriptorSetHandle) {
        assert!(
            self.descriptor_sets.remove(&set.0).is_some(),
            "destroy of unknown descriptor set {:?}",
            set
        );
    }

    fn create_semaphore(&mut self) -> Result<SemaphoreHandle> {
        let id = self.alloc_id();
        self.semaphores.insert(id, ());
        Ok(SemaphoreHandle(id))
    }

    fn destroy_semaphore(&mut self, semaphore: SemaphoreHandle) {
        assert!(
            self.semaphores.remove(&semaphore.0).is_some(),
            "destroy of unknown semaphore {:?}",
            semaphore
        );
    }

    fn create_fence(&mut self) -> Result<FenceHandle> {
        let id = self.alloc_id();
        // Created signaled, so the first frame's wait returns immediately
        self.fences.insert(id, true);
        Ok(FenceHandle(id))
    }

    fn destroy_fence(&mut self, fence: FenceHandle) {
        assert!(
            self.fences.remove(&fence.0).is_some(),
            "destroy of unknown fence {:?}",
            fence
        );
    }

    fn wait_fence(&mut self, fence: FenceHandle, _timeout_ns: u64) -> Result<()> {
        match self.fences.get(&fence.0) {
            Some(true) => Ok(()),
            Some(false) => {
                engine_bail!("nova3d::mock", "wait on pending fence {:?} would block", fence)
            }
            None => engine_bail!("nova3d::mock", "wait on unknown fence {:?}", fence),
        }
    }

    fn reset_fence(&mut self, fence: FenceHandle) -> Result<()> {
        let Some(state) = self.fences.get_mut(&fence.0) else {
            engine_bail!("nova3d::mock", "reset of unknown fence {:?}", fence);
        };
        *state = false;
        Ok(())
    }

    fn create_swapchain(&mut self) -> Result<SwapchainInfo> {
        let desc = ImageDesc {
            width: self.surface_width,
            height: self.surface_height,
            format: self.swapchain_format,
            usage: ImageUsage::COLOR_ATTACHMENT,
            samples: 1,
        };
        let mut images = Vec::with_capacity(self.swap_image_count);
        for _ in 0..self.swap_image_count {
            images.push(self.create_image(&desc)?);
        }
        self.swapchain_images = images.clone();
        Ok(SwapchainInfo {
            images,
            format: self.swapchain_format,
            width: self.surface_width,
            height: self.surface_height,
        })
    }

    fn destroy_swapchain(&mut self) {
        let images = std::mem::take(&mut self.swapchain_images);
        for image in images {
            self.destroy_image(image);
        }
    }

    fn acquire_next_image(
        &mut self,
        _signal_semaphore: SemaphoreHandle,
        signal_fence: FenceHandle,
    ) -> Result<(u32, SurfaceStatus)> {
        let status = self
            .acquire_statuses
            .pop_front()
            .unwrap_or(SurfaceStatus::Optimal);
        let index = (self.acquire_count % self.swapchain_images.len().max(1) as u64) as u32;
        self.acquire_count += 1;
        if status != SurfaceStatus::OutOfDate {
            // The image became ready; the fence signals like the semaphore
            if let Some(state) = self.fences.get_mut(&signal_fence.0) {
                *state = true;
            }
        }
        Ok((index, status))
    }

    fn present(
        &mut self,
        wait_semaphore: SemaphoreHandle,
        image_index: u32,
    ) -> Result<SurfaceStatus> {
        self.commands.push(MockCommand::Present {
            wait_semaphore,
            image_index,
        });
        Ok(self
            .present_statuses
            .pop_front()
            .unwrap_or(SurfaceStatus::Optimal))
    }

    fn create_command_buffer(&mut self) -> Result<CommandBufferHandle> {
        let id = self.alloc_id();
        self.command_buffers.insert(id, ());
        Ok(CommandBufferHandle(id))
    }

    fn destroy_command_buffer(&mut self, cmd: CommandBufferHandle) {
        assert!(
            self.command_buffers.remove(&cmd.0).is_some(),
            "destroy of unknown command buffer {:?}",
            cmd
        );
    }

    fn begin_command_buffer(&mut self, cmd: CommandBufferHandle) -> Result<()> {
        self.commands.push(MockCommand::BeginCommandBuffer(cmd));
        Ok(())
    }

    fn end_command_buffer(&mut self, cmd: CommandBufferHandle) -> Result<()> {
        self.commands.push(MockCommand::EndCommandBuffer(cmd));
        Ok(())
    }

    fn cmd_begin_render_pass(
        &mut self,
        cmd: CommandBufferHandle,
        pass: PassHandle,
        framebuffer: FramebufferHandle,
        _render_area: Rect2D,
        clear_values: &[ClearValue],
    ) {
        self.commands.push(MockCommand::BeginRenderPass {
            cmd,
            pass,
            framebuffer,
            clear_count: clear_values.len(),
        });
    }

    fn cmd_next_subpass(&mut self, cmd: CommandBufferHandle) {
        self.commands.push(MockCommand::NextSubpass(cmd));
    }

    fn cmd_end_render_pass(&mut self, cmd: CommandBufferHandle) {
        self.commands.push(MockCommand::EndRenderPass(cmd));
    }

    fn cmd_set_viewport(&mut self, cmd: CommandBufferHandle, viewport: ViewportRect) {
        self.commands.push(MockCommand::SetViewport(cmd, viewport));
    }

    fn cmd_set_scissor(&mut self, cmd: CommandBufferHandle, scissor: Rect2D) {
        self.commands.push(MockCommand::SetScissor(cmd, scissor));
    }

    fn cmd_set_line_width(&mut self, cmd: CommandBufferHandle, width: f32) {
        self.commands.push(MockCommand::SetLineWidth(cmd, width));
    }

    fn cmd_bind_pipeline(
        &mut self,
        cmd: CommandBufferHandle,
        bind_point: PipelineBindPoint,
        pipeline: PipelineHandle,
    ) {
        self.commands.push(MockCommand::BindPipeline {
            cmd,
            bind_point,
            pipeline,
        });
    }

    fn cmd_bind_descriptor_set(
        &mut self,
        cmd: CommandBufferHandle,
        bind_point: PipelineBindPoint,
        slot: DescriptorSlot,
        set: DescriptorSetHandle,
    ) {
        self.commands.push(MockCommand::BindDescriptorSet {
            cmd,
            bind_point,
            slot,
            set,
        });
    }

    fn cmd_draw(&mut self, cmd: CommandBufferHandle, vertex_count: u32, _first_vertex: u32) {
        self.commands.push(MockCommand::Draw { cmd, vertex_count });
    }

    fn cmd_dispatch(&mut self, cmd: CommandBufferHandle, x: u32, y: u32, z: u32) {
        self.commands.push(MockCommand::Dispatch { cmd, x, y, z });
    }

    fn queue_submit(&mut self, submit: &SubmitInfo) -> Result<()> {
        if self.fail_submits {
            engine_bail!("nova3d::mock", "scripted submit failure");
        }
        self.commands.push(MockCommand::Submit(*submit));
        Ok(())
    }

    fn queue_wait_idle(&mut self) -> Result<()> {
        self.commands.push(MockCommand::QueueWaitIdle);
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "mock_device_tests.rs"]
mod tests;
