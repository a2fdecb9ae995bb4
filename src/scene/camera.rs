/// Camera and post-processing component boundary.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3, Vec4};

use crate::device::ShaderKey;

/// Identifier for a camera component owned by the scene layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CameraId(pub u32);

/// Identifier for a post-processing component owned by the scene layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EffectId(pub u32);

/// Snapshot of a camera's render-relevant state.
///
/// Looked up by id every frame; the scene layer keeps ownership.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraInfo {
    pub position: Vec3,
    pub view: Mat4,
    /// Vertical field of view in radians
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
    pub aspect: f32,
    /// When true this camera renders through the compute ray-tracing path
    pub raytracing: bool,
}

impl CameraInfo {
    /// Packed uniform payload for the per-viewport environment buffer
    pub fn uniform(&self) -> CameraUniform {
        CameraUniform {
            view: self.view,
            projection: Mat4::perspective_rh(self.fov_y, self.aspect.max(f32::EPSILON), self.near, self.far),
            position: self.position.extend(1.0),
        }
    }
}

impl Default for CameraInfo {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            view: Mat4::IDENTITY,
            fov_y: 45f32.to_radians(),
            near: 0.1,
            far: 1000.0,
            aspect: 1.0,
            raytracing: false,
        }
    }
}

/// GPU-side camera data (std140-compatible: matrices then a vec4)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct CameraUniform {
    pub view: Mat4,
    pub projection: Mat4,
    pub position: Vec4,
}

/// What a post-processing effect expands into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostEffectKind {
    /// Single full-screen stage
    Simple,
    /// Multi-stage blur chain; `params.x` is the stage count when > 1 and
    /// each stage's `params.x` is rewritten to its stage number
    Bloom,
}

/// Post-processing component snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct PostEffectInfo {
    pub shader_key: String,
    pub params: Vec4,
    pub kind: PostEffectKind,
}

/// Component lookups the render graph performs against the scene layer
pub trait SceneComponents {
    /// Look up a camera by id; `None` when the component no longer exists
    fn camera(&self, id: CameraId) -> Option<CameraInfo>;

    /// Push a viewport tile's aspect ratio into the camera's projection
    fn set_camera_aspect(&mut self, id: CameraId, aspect: f32);

    /// Record the pixel resolution a camera renders at
    fn set_camera_render_size(&mut self, id: CameraId, width: u32, height: u32);

    /// Look up a post-processing component by id
    fn post_effect(&self, id: EffectId) -> Option<PostEffectInfo>;
}

/// Shader lookups against the asset layer, by logical key
/// (e.g. "postprocessing", "raytracing", material-specific keys)
pub trait ShaderLibrary {
    fn shader(&self, key: &str) -> Option<ShaderKey>;
}
