use bytemuck::{Pod, Zeroable};
use glam::Vec4;

/// GPU-side light record; sixteen-byte aligned fields only.
///
/// `param.x` carries the light type, the remaining components are
/// type-specific (spot angles, attenuation).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct LightData {
    pub position: Vec4,
    pub direction: Vec4,
    pub color: Vec4,
    pub param: Vec4,
}

impl Default for LightData {
    fn default() -> Self {
        Self {
            position: Vec4::new(0.0, 0.0, 0.0, 1.0),
            direction: Vec4::new(0.0, -1.0, 0.0, 0.0),
            color: Vec4::ONE,
            param: Vec4::ZERO,
        }
    }
}
