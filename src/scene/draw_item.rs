/// Drawable boundary: the graph drives recording, models record themselves.

use glam::Vec3;

use crate::device::{CommandBufferHandle, DescriptorSetHandle, GraphicsDevice};
use crate::error::Result;
use crate::scene::CameraId;
use crate::target::TargetKind;

/// Per-draw state handed to a recorder
#[derive(Debug, Clone, Copy)]
pub struct DrawContext {
    /// Target being recorded
    pub target: TargetKind,
    /// Camera of the viewport tile being recorded, if any
    pub camera: Option<CameraId>,
    /// Common descriptor set already bound for the tile
    pub common_set: Option<DescriptorSetHandle>,
}

/// Records the device commands for one drawable.
///
/// Implemented by the model layer; the graph only decides ordering and
/// which command buffer is live.
pub trait DrawRecorder {
    fn record(
        &self,
        device: &mut dyn GraphicsDevice,
        cmd: CommandBufferHandle,
        ctx: &DrawContext,
    ) -> Result<()>;
}

/// A drawable plus the world position the transparency sorter keys on
pub struct DrawItem {
    pub position: Vec3,
    pub recorder: Box<dyn DrawRecorder>,
}

impl DrawItem {
    pub fn new(position: Vec3, recorder: Box<dyn DrawRecorder>) -> Self {
        Self { position, recorder }
    }
}
