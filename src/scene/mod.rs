//! Scene and asset layer boundary
//!
//! The render graph never owns cameras, post-processing components or
//! shaders; it looks them up by id through the traits defined here. Weak
//! references are "id + lookup each frame" on purpose: a camera may be
//! destroyed and recreated between frames without dangling anything.

mod camera;
mod draw_item;
mod light;
mod settings;
#[cfg(test)]
pub mod mock_scene;

pub use camera::{
    CameraId, CameraInfo, CameraUniform, EffectId, PostEffectInfo, PostEffectKind,
    SceneComponents, ShaderLibrary,
};
pub use draw_item::{DrawContext, DrawItem, DrawRecorder};
pub use light::LightData;
pub use settings::RenderSettings;
