/// In-memory scene and shader stand-ins for graph tests.

use glam::Vec4;
use rustc_hash::FxHashMap;

use crate::device::ShaderKey;
use crate::scene::{
    CameraId, CameraInfo, EffectId, PostEffectInfo, PostEffectKind, SceneComponents, ShaderLibrary,
};

/// Scene stub backing `SceneComponents` with hash maps and call logs
#[derive(Default)]
pub struct TestScene {
    pub cameras: FxHashMap<CameraId, CameraInfo>,
    pub effects: FxHashMap<EffectId, PostEffectInfo>,
    /// (id, aspect) pairs in call order
    pub aspect_updates: Vec<(CameraId, f32)>,
    pub render_size_updates: Vec<(CameraId, u32, u32)>,
}

impl TestScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_camera(&mut self, id: u32) -> CameraId {
        let camera = CameraId(id);
        self.cameras.insert(camera, CameraInfo::default());
        camera
    }

    pub fn add_raytracing_camera(&mut self, id: u32) -> CameraId {
        let camera = CameraId(id);
        self.cameras.insert(
            camera,
            CameraInfo {
                raytracing: true,
                ..CameraInfo::default()
            },
        );
        camera
    }

    pub fn add_effect(
        &mut self,
        id: u32,
        shader_key: &str,
        params: Vec4,
        kind: PostEffectKind,
    ) -> EffectId {
        let effect = EffectId(id);
        self.effects.insert(
            effect,
            PostEffectInfo {
                shader_key: shader_key.to_string(),
                params,
                kind,
            },
        );
        effect
    }
}

impl SceneComponents for TestScene {
    fn camera(&self, id: CameraId) -> Option<CameraInfo> {
        self.cameras.get(&id).copied()
    }

    fn set_camera_aspect(&mut self, id: CameraId, aspect: f32) {
        if let Some(camera) = self.cameras.get_mut(&id) {
            camera.aspect = aspect;
            self.aspect_updates.push((id, aspect));
        }
    }

    fn set_camera_render_size(&mut self, id: CameraId, width: u32, height: u32) {
        if self.cameras.contains_key(&id) {
            self.render_size_updates.push((id, width, height));
        }
    }

    fn post_effect(&self, id: EffectId) -> Option<PostEffectInfo> {
        self.effects.get(&id).cloned()
    }
}

/// Shader-library stub; ships with the two shaders every frame needs
pub struct TestShaders {
    pub shaders: FxHashMap<String, ShaderKey>,
}

impl TestShaders {
    pub fn new() -> Self {
        let mut shaders = FxHashMap::default();
        shaders.insert("postprocessing".to_string(), ShaderKey(1));
        shaders.insert("raytracing".to_string(), ShaderKey(2));
        Self { shaders }
    }

    pub fn add(&mut self, key: &str, shader: ShaderKey) {
        self.shaders.insert(key.to_string(), shader);
    }
}

impl Default for TestShaders {
    fn default() -> Self {
        Self::new()
    }
}

impl ShaderLibrary for TestShaders {
    fn shader(&self, key: &str) -> Option<ShaderKey> {
        self.shaders.get(key).copied()
    }
}
