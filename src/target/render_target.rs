/// Render target descriptions: what a target owns, not how it is built.
///
/// The pass builder in `graph` fills these structures in; the frame driver
/// reads them while recording and submitting.

use glam::Vec4;

use crate::device::{
    CommandBufferHandle, DescriptorSetHandle, FramebufferHandle, GraphicsDevice, ImageHandle,
    PassHandle, PipelineDesc, Rect2D, SemaphoreHandle, ViewportRect,
};
use crate::pool::PoolHandle;
use crate::scene::CameraId;

// ============================================================================
// Target kinds
// ============================================================================

/// The fixed set of render targets a frame can contain.
///
/// Discriminants double as registry slots. Recording and submission walk
/// kinds in descending order so scene targets finish before the composite
/// pass that samples them; presentation always waits on `Composite`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum TargetKind {
    /// Swapchain-facing post-processing chain; the only target that presents
    Composite = 0,
    /// Offscreen overlay layer composited over the scene
    Ui = 1,
    /// Secondary offscreen scene view (mirrors, picture-in-picture)
    OffscreenColor = 2,
    /// Primary scene target; the only one that may multisample
    MainScene = 3,
}

impl TargetKind {
    pub const ALL: [TargetKind; 4] = [
        TargetKind::Composite,
        TargetKind::Ui,
        TargetKind::OffscreenColor,
        TargetKind::MainScene,
    ];

    pub fn slot(self) -> usize {
        self as usize
    }

    /// True for targets that render a 3D scene through viewport tiles
    pub fn is_scene(self) -> bool {
        matches!(self, TargetKind::OffscreenColor | TargetKind::MainScene)
    }

    pub fn name(self) -> &'static str {
        match self {
            TargetKind::Composite => "composite",
            TargetKind::Ui => "ui",
            TargetKind::OffscreenColor => "offscreen_color",
            TargetKind::MainScene => "main_scene",
        }
    }
}

// ============================================================================
// Attachments
// ============================================================================

/// Images owned by one render target.
///
/// `color`/`color2` ping-pong between post-processing stages; `storage` only
/// exists for ray-traced viewports.
#[derive(Debug, Default, Clone, Copy)]
pub struct Attachments {
    pub color: Option<ImageHandle>,
    pub color2: Option<ImageHandle>,
    pub multisample_color: Option<ImageHandle>,
    pub depth_stencil: Option<ImageHandle>,
    pub storage: Option<ImageHandle>,
}

impl Attachments {
    /// Destroy every owned image and clear the handles
    pub fn destroy_all(&mut self, device: &mut dyn GraphicsDevice) {
        for image in [
            self.color.take(),
            self.color2.take(),
            self.multisample_color.take(),
            self.depth_stencil.take(),
            self.storage.take(),
        ]
        .into_iter()
        .flatten()
        {
            device.destroy_image(image);
        }
    }
}

// ============================================================================
// Viewport tiles and subpasses
// ============================================================================

/// One camera's tile inside a scene target
#[derive(Debug, Default, Clone, Copy)]
pub struct ViewportTile {
    pub rect: ViewportRect,
    pub scissor: Rect2D,
    pub camera: Option<CameraId>,
    /// Pooled uniform buffer holding camera + environment data for this tile
    pub environment_buffer: Option<PoolHandle>,
    pub common_set: Option<DescriptorSetHandle>,
    /// Ray-tracing resources; both set only while the tile's camera traces
    pub compute_pipeline: Option<PoolHandle>,
    pub compute_set: Option<DescriptorSetHandle>,
}

/// One post-processing stage of a target's render pass.
///
/// `pipeline_desc` and `params` are declarative and survive rebuilds;
/// everything else is re-created by the pass builder.
#[derive(Debug, Clone)]
pub struct Subpass {
    pub index: u32,
    pub pipeline_desc: PipelineDesc,
    pub params: Vec4,
    pub pipeline: Option<PoolHandle>,
    pub descriptor_set: Option<DescriptorSetHandle>,
    pub param_buffer: Option<PoolHandle>,
}

impl Subpass {
    pub fn new(index: u32, pipeline_desc: PipelineDesc, params: Vec4) -> Self {
        Self {
            index,
            pipeline_desc,
            params,
            pipeline: None,
            descriptor_set: None,
            param_buffer: None,
        }
    }
}

// ============================================================================
// Render target
// ============================================================================

/// A render target: pass, per-swap-image framebuffers and command buffers,
/// attachments, viewport tiles and its post-processing chain
pub struct RenderTarget {
    pub kind: TargetKind,
    /// Default camera new viewport tiles start with
    pub camera: Option<CameraId>,
    /// Full-target viewport, used by non-scene targets
    pub viewport: ViewportRect,
    pub scissor: Rect2D,
    pub viewports: Vec<ViewportTile>,
    pub subpasses: Vec<Subpass>,
    pub pass: Option<PassHandle>,
    pub framebuffers: Vec<FramebufferHandle>,
    pub command_buffers: Vec<CommandBufferHandle>,
    pub semaphore: Option<SemaphoreHandle>,
    pub attachments: Attachments,
}

impl RenderTarget {
    pub fn new(kind: TargetKind, camera: Option<CameraId>) -> Self {
        Self {
            kind,
            camera,
            viewport: ViewportRect::default(),
            scissor: Rect2D::default(),
            // Every target starts with one tile covering it
            viewports: vec![ViewportTile {
                camera,
                ..ViewportTile::default()
            }],
            subpasses: Vec::new(),
            pass: None,
            framebuffers: Vec::new(),
            command_buffers: Vec::new(),
            semaphore: None,
            attachments: Attachments::default(),
        }
    }

    /// True when any viewport tile renders through the compute path
    pub fn has_raytraced_viewport(&self) -> bool {
        self.viewports.iter().any(|v| v.compute_pipeline.is_some())
    }

    /// Destroy pass-scoped device objects: pass, framebuffers and descriptor
    /// sets. Attachment teardown is a per-kind decision made by the pass
    /// builder; command buffers are allocated once and reused across
    /// rebuilds; semaphores and pooled objects belong to the frame driver.
    pub fn destroy_pass_objects(&mut self, device: &mut dyn GraphicsDevice) {
        for fb in self.framebuffers.drain(..) {
            device.destroy_framebuffer(fb);
        }
        if let Some(pass) = self.pass.take() {
            device.destroy_render_pass(pass);
        }
        for subpass in &mut self.subpasses {
            if let Some(set) = subpass.descriptor_set.take() {
                device.destroy_descriptor_set(set);
            }
        }
        for tile in &mut self.viewports {
            if let Some(set) = tile.common_set.take() {
                device.destroy_descriptor_set(set);
            }
            if let Some(set) = tile.compute_set.take() {
                device.destroy_descriptor_set(set);
            }
        }
    }

    /// Full teardown at shutdown; leaves only the declarative structure
    pub fn destroy_device_objects(&mut self, device: &mut dyn GraphicsDevice) {
        self.destroy_pass_objects(device);
        self.attachments.destroy_all(device);
        for cmd in self.command_buffers.drain(..) {
            device.destroy_command_buffer(cmd);
        }
        if let Some(semaphore) = self.semaphore.take() {
            device.destroy_semaphore(semaphore);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "render_target_tests.rs"]
mod tests;
