/// GraphicsDevice trait - boundary to the graphics-API backend
///
/// The render graph only ever talks to the GPU through this trait. Handles
/// are opaque and copyable; the backend owns the underlying API objects and
/// destroys them when asked. A mock implementation (`MockDevice`) backs the
/// unit tests.

use crate::error::Result;

// ============================================================================
// Opaque handles
// ============================================================================

macro_rules! define_handle {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(pub u64);
    };
}

define_handle!(
    /// GPU image (color, depth/stencil, storage)
    ImageHandle
);
define_handle!(
    /// GPU buffer (uniform, storage)
    BufferHandle
);
define_handle!(
    /// Render pass object
    PassHandle
);
define_handle!(
    /// Framebuffer bound to one render pass
    FramebufferHandle
);
define_handle!(
    /// Command buffer (allocated once, re-recorded every frame)
    CommandBufferHandle
);
define_handle!(
    /// Graphics or compute pipeline
    PipelineHandle
);
define_handle!(
    /// Descriptor set
    DescriptorSetHandle
);
define_handle!(
    /// Semaphore for GPU-GPU ordering
    SemaphoreHandle
);
define_handle!(
    /// Fence for GPU-CPU ordering
    FenceHandle
);
define_handle!(
    /// Shader module resolved by the asset layer from a logical key
    ShaderKey
);

// ============================================================================
// Geometry
// ============================================================================

/// Pixel viewport rectangle with depth range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

impl Default for ViewportRect {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }
}

/// Integer scissor rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect2D {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

// ============================================================================
// Images
// ============================================================================

/// Pixel formats crossing the device boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    /// High-precision intermediate color (scene targets, ping-pong images)
    Rgba16Float,
    /// Swapchain presentation format
    Bgra8Unorm,
    /// Combined depth/stencil
    Depth24Stencil8,
}

bitflags::bitflags! {
    /// How an image will be used; determines backend allocation flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ImageUsage: u32 {
        const COLOR_ATTACHMENT = 1 << 0;
        const DEPTH_STENCIL    = 1 << 1;
        const SAMPLED          = 1 << 2;
        const STORAGE          = 1 << 3;
    }
}

/// Image creation descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDesc {
    pub width: u32,
    pub height: u32,
    pub format: ImageFormat,
    pub usage: ImageUsage,
    pub samples: u32,
}

// ============================================================================
// Passes, framebuffers, pipelines
// ============================================================================

/// Render pass descriptor: attachment formats in binding order plus the
/// number of logical subpasses the pass contains
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderPassDesc {
    pub formats: Vec<ImageFormat>,
    pub subpass_count: u32,
}

/// Framebuffer descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramebufferDesc {
    pub pass: PassHandle,
    pub width: u32,
    pub height: u32,
    pub attachments: Vec<ImageHandle>,
}

/// Where a pipeline or descriptor set is bound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineBindPoint {
    Graphics,
    Compute,
}

/// Graphics pipeline descriptor
///
/// Pipelines are pooled and cached by this descriptor together with the
/// render pass they target.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PipelineDesc {
    pub shader: ShaderKey,
    pub subpass: u32,
    pub sample_count: u32,
    pub blend: bool,
}

// ============================================================================
// Descriptor sets
// ============================================================================

/// Fixed descriptor set slots shared by every pipeline layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorSlot {
    /// Per-viewport environment + lights
    Common = 0,
    /// Per-subpass post-processing input
    Postprocessing = 1,
    /// Per-viewport ray-tracing compute inputs
    Raytracing = 2,
}

/// Sparse descriptor update; `None` fields are left untouched
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DescriptorWrites {
    pub environment_buffer: Option<BufferHandle>,
    pub lights_buffer: Option<BufferHandle>,
    pub param_buffer: Option<BufferHandle>,
    pub input_image: Option<ImageHandle>,
    pub storage_image: Option<ImageHandle>,
    pub model_buffer: Option<BufferHandle>,
}

// ============================================================================
// Swapchain and submission
// ============================================================================

/// Swapchain state returned by `create_swapchain`
#[derive(Debug, Clone)]
pub struct SwapchainInfo {
    pub images: Vec<ImageHandle>,
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
}

/// Presentation-surface status from acquire/present
///
/// Never surfaced to callers as an error: `OutOfDate` and `Suboptimal`
/// trigger a full rebuild on the next frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceStatus {
    Optimal,
    Suboptimal,
    OutOfDate,
}

/// One queue submission: a single command buffer chained between two
/// semaphores
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitInfo {
    pub command_buffer: CommandBufferHandle,
    pub wait_semaphore: SemaphoreHandle,
    pub signal_semaphore: SemaphoreHandle,
}

/// Attachment clear value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClearValue {
    Color([f32; 4]),
    DepthStencil { depth: f32, stencil: u32 },
}

// ============================================================================
// GraphicsDevice trait
// ============================================================================

/// Boundary trait to the graphics backend
///
/// All methods run on the single render thread that drives the frame loop;
/// implementations do not need internal locking. Destroy methods are
/// infallible: a backend that cannot destroy an object has already lost the
/// device.
pub trait GraphicsDevice {
    // ----- images -----
    fn create_image(&mut self, desc: &ImageDesc) -> Result<ImageHandle>;
    fn destroy_image(&mut self, image: ImageHandle);

    // ----- buffers -----
    fn create_buffer(&mut self, size: u64) -> Result<BufferHandle>;
    fn write_buffer(&mut self, buffer: BufferHandle, offset: u64, data: &[u8]) -> Result<()>;
    fn destroy_buffer(&mut self, buffer: BufferHandle);

    // ----- passes and framebuffers -----
    fn create_render_pass(&mut self, desc: &RenderPassDesc) -> Result<PassHandle>;
    fn destroy_render_pass(&mut self, pass: PassHandle);
    fn create_framebuffer(&mut self, desc: &FramebufferDesc) -> Result<FramebufferHandle>;
    fn destroy_framebuffer(&mut self, framebuffer: FramebufferHandle);

    // ----- pipelines -----
    fn create_graphics_pipeline(&mut self, desc: &PipelineDesc, pass: PassHandle)
        -> Result<PipelineHandle>;
    fn create_compute_pipeline(&mut self, shader: ShaderKey) -> Result<PipelineHandle>;
    fn destroy_pipeline(&mut self, pipeline: PipelineHandle);

    // ----- descriptor sets -----
    fn create_descriptor_set(&mut self) -> Result<DescriptorSetHandle>;
    fn update_descriptor_set(
        &mut self,
        set: DescriptorSetHandle,
        writes: &DescriptorWrites,
    ) -> Result<()>;
    fn destroy_descriptor_set(&mut self, set: DescriptorSetHandle);

    // ----- synchronization -----
    fn create_semaphore(&mut self) -> Result<SemaphoreHandle>;
    fn destroy_semaphore(&mut self, semaphore: SemaphoreHandle);
    fn create_fence(&mut self) -> Result<FenceHandle>;
    fn destroy_fence(&mut self, fence: FenceHandle);
    /// Block until the fence signals or the timeout (nanoseconds) expires
    fn wait_fence(&mut self, fence: FenceHandle, timeout_ns: u64) -> Result<()>;
    fn reset_fence(&mut self, fence: FenceHandle) -> Result<()>;

    // ----- swapchain -----
    fn create_swapchain(&mut self) -> Result<SwapchainInfo>;
    fn destroy_swapchain(&mut self);
    /// Acquire the next swap image; signals both sync objects when the image
    /// is ready. Returns the image index and the surface status.
    fn acquire_next_image(
        &mut self,
        signal_semaphore: SemaphoreHandle,
        signal_fence: FenceHandle,
    ) -> Result<(u32, SurfaceStatus)>;
    fn present(
        &mut self,
        wait_semaphore: SemaphoreHandle,
        image_index: u32,
    ) -> Result<SurfaceStatus>;

    // ----- command recording -----
    fn create_command_buffer(&mut self) -> Result<CommandBufferHandle>;
    fn destroy_command_buffer(&mut self, cmd: CommandBufferHandle);
    fn begin_command_buffer(&mut self, cmd: CommandBufferHandle) -> Result<()>;
    fn end_command_buffer(&mut self, cmd: CommandBufferHandle) -> Result<()>;
    fn cmd_begin_render_pass(
        &mut self,
        cmd: CommandBufferHandle,
        pass: PassHandle,
        framebuffer: FramebufferHandle,
        render_area: Rect2D,
        clear_values: &[ClearValue],
    );
    fn cmd_next_subpass(&mut self, cmd: CommandBufferHandle);
    fn cmd_end_render_pass(&mut self, cmd: CommandBufferHandle);
    fn cmd_set_viewport(&mut self, cmd: CommandBufferHandle, viewport: ViewportRect);
    fn cmd_set_scissor(&mut self, cmd: CommandBufferHandle, scissor: Rect2D);
    fn cmd_set_line_width(&mut self, cmd: CommandBufferHandle, width: f32);
    fn cmd_bind_pipeline(
        &mut self,
        cmd: CommandBufferHandle,
        bind_point: PipelineBindPoint,
        pipeline: PipelineHandle,
    );
    fn cmd_bind_descriptor_set(
        &mut self,
        cmd: CommandBufferHandle,
        bind_point: PipelineBindPoint,
        slot: DescriptorSlot,
        set: DescriptorSetHandle,
    );
    fn cmd_draw(&mut self, cmd: CommandBufferHandle, vertex_count: u32, first_vertex: u32);
    fn cmd_dispatch(&mut self, cmd: CommandBufferHandle, x: u32, y: u32, z: u32);

    // ----- submission -----
    fn queue_submit(&mut self, submit: &SubmitInfo) -> Result<()>;
    /// Block until all submitted GPU work completes
    fn queue_wait_idle(&mut self) -> Result<()>;
}
