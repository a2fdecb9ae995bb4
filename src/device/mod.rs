//! Graphics device boundary module
//!
//! Defines the `GraphicsDevice` trait — the interface this crate expects from
//! a low-level graphics-API backend — together with the opaque handle and
//! descriptor types that cross that boundary.

mod graphics_device;
#[cfg(test)]
pub mod mock_device;

pub use graphics_device::{
    GraphicsDevice,
    ImageHandle, BufferHandle, PassHandle, FramebufferHandle,
    CommandBufferHandle, PipelineHandle, DescriptorSetHandle,
    SemaphoreHandle, FenceHandle, ShaderKey,
    ImageDesc, ImageFormat, ImageUsage,
    RenderPassDesc, FramebufferDesc, PipelineDesc, PipelineBindPoint,
    DescriptorSlot, DescriptorWrites,
    SwapchainInfo, SurfaceStatus, SubmitInfo, ClearValue,
    ViewportRect, Rect2D,
};
