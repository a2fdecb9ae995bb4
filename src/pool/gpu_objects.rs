/// Pooled wrappers for the GPU-object categories the render graph recycles.

use crate::device::{BufferHandle, GraphicsDevice, PassHandle, PipelineDesc, PipelineHandle, ShaderKey};
use crate::error::{Error, Result};

use super::object_pool::PoolObject;

/// Initialization data for a pooled pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineParams {
    Graphics { desc: PipelineDesc, pass: PassHandle },
    Compute { shader: ShaderKey },
}

/// Pooled graphics or compute pipeline
#[derive(Default)]
pub struct PipelineObject {
    handle: Option<PipelineHandle>,
}

impl PipelineObject {
    pub fn handle(&self) -> Option<PipelineHandle> {
        self.handle
    }
}

impl PoolObject for PipelineObject {
    type Params = PipelineParams;

    fn initialize(
        &mut self,
        device: &mut dyn GraphicsDevice,
        params: &Self::Params,
    ) -> Result<()> {
        let handle = match params {
            PipelineParams::Graphics { desc, pass } => {
                device.create_graphics_pipeline(desc, *pass)?
            }
            PipelineParams::Compute { shader } => device.create_compute_pipeline(*shader)?,
        };
        self.handle = Some(handle);
        Ok(())
    }

    fn cleanup(&mut self, device: &mut dyn GraphicsDevice) {
        if let Some(handle) = self.handle.take() {
            device.destroy_pipeline(handle);
        }
    }
}

/// Pooled uniform buffer of a fixed byte size
#[derive(Default)]
pub struct UniformBufferObject {
    handle: Option<BufferHandle>,
    size: u64,
}

impl UniformBufferObject {
    pub fn handle(&self) -> Option<BufferHandle> {
        self.handle
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Write `data` at offset 0
    pub fn write(&self, device: &mut dyn GraphicsDevice, data: &[u8]) -> Result<()> {
        let Some(handle) = self.handle else {
            return Err(Error::InvalidResource(
                "write to uninitialized uniform buffer".to_string(),
            ));
        };
        device.write_buffer(handle, 0, data)
    }
}

impl PoolObject for UniformBufferObject {
    type Params = u64;

    fn initialize(&mut self, device: &mut dyn GraphicsDevice, size: &u64) -> Result<()> {
        self.handle = Some(device.create_buffer(*size)?);
        self.size = *size;
        Ok(())
    }

    fn cleanup(&mut self, device: &mut dyn GraphicsDevice) {
        if let Some(handle) = self.handle.take() {
            device.destroy_buffer(handle);
        }
        self.size = 0;
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "gpu_objects_tests.rs"]
mod tests;
