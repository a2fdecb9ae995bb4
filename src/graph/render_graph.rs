/// RenderGraph - the per-frame state machine.
///
/// Owns the target registry, the GPU-object pools and the swapchain-scoped
/// synchronization objects. A frame runs as:
///
/// ```text
/// Invalid -> Building -> Ready -> Recording -> Submitted -> Presented
///                          ^                                    |
///                          +---- (Optimal) ----------------------+
///                          |
///                       Invalid  (out-of-date / suboptimal surface)
/// ```
///
/// `build_frame` handles Invalid -> Ready (teardown + rebuild), `submit_frame`
/// drives one Ready -> Presented cycle. Everything runs on the single thread
/// that owns the frame loop.

use bytemuck::{Pod, Zeroable};
use glam::{Vec3, Vec4};
use rustc_hash::FxHashMap;

use crate::device::{
    ClearValue, CommandBufferHandle, DescriptorSlot, GraphicsDevice, PassHandle,
    PipelineBindPoint, PipelineDesc, PipelineHandle, SemaphoreHandle, ShaderKey, SubmitInfo,
    SurfaceStatus, SwapchainInfo,
};
use crate::error::{Error, Result};
use crate::graph::transparency::sort_back_to_front;
use crate::pool::{ObjectPool, PipelineObject, PoolHandle, UniformBufferObject};
use crate::scene::{
    CameraId, CameraUniform, DrawContext, DrawItem, EffectId, LightData, PostEffectKind,
    RenderSettings, SceneComponents, ShaderLibrary,
};
use crate::target::{RenderTarget, Subpass, TargetKind, TargetRegistry};
use crate::{engine_bail, engine_debug, engine_error, engine_info, engine_trace, engine_warn};

const SRC: &str = "nova3d::RenderGraph";

/// Light slots in the per-frame lights buffer
pub const MAX_LIGHTS: usize = 8;

// ============================================================================
// Frame state
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    /// Needs a full rebuild before anything can be recorded
    Invalid,
    /// Teardown + swapchain/pass/layout recreation in progress
    Building,
    /// Built and waiting for the next frame
    Ready,
    Recording,
    Submitted,
    Presented,
}

// ============================================================================
// Per-viewport environment uniform
// ============================================================================

/// GPU layout of the per-viewport environment buffer: camera matrices plus
/// `(gamma, exposure, light_count, 0)`
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct EnvironmentUniform {
    pub camera: CameraUniform,
    pub render: Vec4,
}

// ============================================================================
// RenderGraph
// ============================================================================

pub struct RenderGraph {
    pub(crate) registry: TargetRegistry,
    pub(crate) pipelines: ObjectPool<PipelineObject>,
    pub(crate) uniform_buffers: ObjectPool<UniformBufferObject>,
    /// Graphics pipelines deduplicated per (descriptor, pass); cleared on
    /// rebuild because pass handles die with the swapchain
    pub(crate) pipeline_cache: FxHashMap<(PipelineDesc, PassHandle), PoolHandle>,
    pub(crate) compute_cache: FxHashMap<ShaderKey, PoolHandle>,

    state: FrameState,
    pub(crate) swapchain: Option<SwapchainInfo>,
    image_acquired: Option<SemaphoreHandle>,
    fences: Vec<crate::device::FenceHandle>,
    frame_index: usize,

    pub(crate) settings: RenderSettings,
    active_camera: Option<CameraId>,

    lights: Vec<LightData>,
    lights_dirty: bool,
    pub(crate) lights_buffer: Option<PoolHandle>,

    opaque_items: Vec<DrawItem>,
    alpha_items: Vec<DrawItem>,
    ui_items: Vec<DrawItem>,
}

impl RenderGraph {
    pub fn new(settings: RenderSettings) -> Self {
        Self {
            registry: TargetRegistry::new(),
            pipelines: ObjectPool::new(),
            uniform_buffers: ObjectPool::new(),
            pipeline_cache: FxHashMap::default(),
            compute_cache: FxHashMap::default(),
            state: FrameState::Invalid,
            swapchain: None,
            image_acquired: None,
            fences: Vec::new(),
            frame_index: 0,
            settings,
            active_camera: None,
            lights: Vec::new(),
            lights_dirty: false,
            lights_buffer: None,
            opaque_items: Vec::new(),
            alpha_items: Vec::new(),
            ui_items: Vec::new(),
        }
    }

    /// Create the baseline targets every frame needs. UI and offscreen
    /// targets are opt-in through `create_target`.
    pub fn initialize(&mut self) -> Result<()> {
        engine_info!(SRC, "initializing render graph");
        self.registry.create(TargetKind::Composite, None)?;
        self.registry.create(TargetKind::MainScene, self.active_camera)?;
        self.state = FrameState::Invalid;
        Ok(())
    }

    pub fn create_target(&mut self, kind: TargetKind, camera: Option<CameraId>) -> Result<()> {
        self.registry.create(kind, camera)?;
        engine_debug!(SRC, "created render target '{}'", kind.name());
        self.invalidate();
        Ok(())
    }

    // ----- accessors -----

    pub fn state(&self) -> FrameState {
        self.state
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    /// Replace render settings; a sample-count change forces a rebuild
    pub fn set_settings(&mut self, settings: RenderSettings) {
        if settings.sample_count != self.settings.sample_count {
            self.invalidate();
        }
        self.settings = settings;
    }

    pub fn registry(&self) -> &TargetRegistry {
        &self.registry
    }

    pub fn swapchain(&self) -> Option<&SwapchainInfo> {
        self.swapchain.as_ref()
    }

    pub fn target_camera(&self) -> Option<CameraId> {
        self.active_camera
    }

    /// Mark the graph for a full rebuild on the next `build_frame`
    pub fn invalidate(&mut self) {
        self.state = FrameState::Invalid;
    }

    // ----- viewport and camera management -----

    /// Select the camera that newly added viewports and the main scene
    /// target bind to
    pub fn set_target_camera(&mut self, camera: CameraId) {
        self.active_camera = Some(camera);
        if let Some(target) = self.registry.get_mut(TargetKind::MainScene) {
            target.camera = Some(camera);
            for tile in &mut target.viewports {
                if tile.camera.is_none() {
                    tile.camera = Some(camera);
                }
            }
        }
        self.invalidate();
    }

    /// Add one viewport tile to a scene target, bound to the active camera
    pub fn add_viewport(&mut self, kind: TargetKind) -> Result<()> {
        if !kind.is_scene() {
            engine_error!(SRC, "target '{}' does not support extra viewports", kind.name());
            return Err(Error::InvalidResource(format!(
                "target '{}' does not support extra viewports",
                kind.name()
            )));
        }
        let camera = self.active_camera;
        let Some(target) = self.registry.get_mut(kind) else {
            return Err(Error::UnknownHandle(format!("render target '{}'", kind.name())));
        };
        target.viewports.push(crate::target::ViewportTile {
            camera: camera.or(target.camera),
            ..Default::default()
        });
        engine_debug!(
            SRC,
            "target '{}' now has {} viewports",
            kind.name(),
            target.viewports.len()
        );
        self.invalidate();
        Ok(())
    }

    /// Remove the most recently added viewport tile. Every target keeps at
    /// least one tile; removing the last is refused.
    pub fn remove_viewport(&mut self, device: &mut dyn GraphicsDevice, kind: TargetKind) -> Result<()> {
        let Self {
            registry,
            uniform_buffers,
            ..
        } = self;
        let Some(target) = registry.get_mut(kind) else {
            return Err(Error::UnknownHandle(format!("render target '{}'", kind.name())));
        };
        if target.viewports.len() <= 1 {
            engine_warn!(SRC, "target '{}' keeps its last viewport", kind.name());
            return Ok(());
        }
        if let Some(mut tile) = target.viewports.pop() {
            if let Some(buffer) = tile.environment_buffer.take() {
                uniform_buffers.release(device, buffer)?;
            }
            if let Some(set) = tile.common_set.take() {
                device.destroy_descriptor_set(set);
            }
            if let Some(set) = tile.compute_set.take() {
                device.destroy_descriptor_set(set);
            }
        }
        self.invalidate();
        Ok(())
    }

    // ----- post-processing -----

    /// Attach a post-processing effect to a scene target's subpass chain.
    ///
    /// Returns false (and logs) when the effect, its shader or the camera
    /// cannot be resolved; a missing effect never fails the frame. A bloom
    /// effect with `params.x > 1` expands into that many stages, each stage's
    /// `params.x` rewritten to its 1-based stage number.
    pub fn attach_post_processing(
        &mut self,
        scene: &dyn SceneComponents,
        shaders: &dyn ShaderLibrary,
        kind: TargetKind,
        camera: CameraId,
        effect: EffectId,
    ) -> bool {
        if !kind.is_scene() {
            engine_warn!(SRC, "post-processing only attaches to scene targets");
            return false;
        }
        if scene.camera(camera).is_none() {
            engine_warn!(SRC, "post-processing camera {:?} not found", camera);
            return false;
        }
        let Some(info) = scene.post_effect(effect) else {
            engine_warn!(SRC, "post-processing effect {:?} not found", effect);
            return false;
        };
        let Some(shader) = shaders.shader(&info.shader_key) else {
            engine_warn!(SRC, "shader '{}' not found for effect {:?}", info.shader_key, effect);
            return false;
        };
        let Some(target) = self.registry.get_mut(kind) else {
            engine_warn!(SRC, "render target '{}' not found", kind.name());
            return false;
        };

        let stages = match info.kind {
            PostEffectKind::Bloom if info.params.x > 1.0 => info.params.x as u32,
            _ => 1,
        };
        for stage in 0..stages {
            let mut params = info.params;
            if stages > 1 {
                params.x = (stage + 1) as f32;
            }
            // Subpass 0 is the raster pass; post stages start at 1
            let index = target.subpasses.len() as u32 + 1;
            target.subpasses.push(Subpass::new(
                index,
                PipelineDesc {
                    shader,
                    subpass: index,
                    sample_count: 1,
                    blend: false,
                },
                params,
            ));
        }
        engine_debug!(
            SRC,
            "attached '{}' ({} stage(s)) to target '{}'",
            info.shader_key,
            stages,
            kind.name()
        );
        self.invalidate();
        true
    }

    // ----- lights -----

    pub fn add_light(&mut self, light: LightData) -> usize {
        if self.lights.len() >= MAX_LIGHTS {
            engine_warn!(SRC, "light limit {} reached; light stored but not uploaded", MAX_LIGHTS);
        }
        self.lights.push(light);
        self.lights_dirty = true;
        self.lights.len() - 1
    }

    pub fn remove_light(&mut self, index: usize) -> Result<()> {
        if index >= self.lights.len() {
            return Err(Error::UnknownHandle(format!("light index {index}")));
        }
        self.lights.remove(index);
        self.lights_dirty = true;
        Ok(())
    }

    pub fn light_count(&self) -> usize {
        self.lights.len()
    }

    // ----- draw items -----

    pub fn add_opaque_item(&mut self, item: DrawItem) {
        self.opaque_items.push(item);
    }

    pub fn add_alpha_item(&mut self, item: DrawItem) {
        self.alpha_items.push(item);
    }

    pub fn add_ui_item(&mut self, item: DrawItem) {
        self.ui_items.push(item);
    }

    pub fn clear_draw_items(&mut self) {
        self.opaque_items.clear();
        self.alpha_items.clear();
        self.ui_items.clear();
    }

    // ========================================================================
    // Frame driver
    // ========================================================================

    /// Pre-update step: if the graph is invalid, tear down and rebuild the
    /// swapchain, passes, framebuffers and viewport layout
    pub fn build_frame(
        &mut self,
        device: &mut dyn GraphicsDevice,
        scene: &mut dyn SceneComponents,
        shaders: &dyn ShaderLibrary,
    ) -> Result<()> {
        if self.state != FrameState::Invalid {
            return Ok(());
        }
        self.state = FrameState::Building;
        engine_debug!(SRC, "rebuilding frame resources");

        // No in-flight work may outlive the objects destroyed below
        device.queue_wait_idle()?;

        for target in self.registry.iter_mut() {
            target.destroy_pass_objects(device);
        }
        if let Some(semaphore) = self.image_acquired.take() {
            device.destroy_semaphore(semaphore);
        }
        // A fence left pending by an abandoned acquire can never signal;
        // the queue is idle here, so recreating the whole set is safe
        for fence in self.fences.drain(..) {
            device.destroy_fence(fence);
        }
        self.frame_index = 0;
        if self.swapchain.take().is_some() {
            device.destroy_swapchain();
        }
        // Pipelines reference the destroyed passes; stale pool handles in
        // subpasses and tiles are cleared with them
        self.pipelines.release_all(device);
        self.pipeline_cache.clear();
        self.compute_cache.clear();
        for target in self.registry.iter_mut() {
            for subpass in &mut target.subpasses {
                subpass.pipeline = None;
            }
            for tile in &mut target.viewports {
                tile.compute_pipeline = None;
            }
        }

        let swapchain = device.create_swapchain()?;
        engine_debug!(
            SRC,
            "swapchain {}x{}, {} images",
            swapchain.width,
            swapchain.height,
            swapchain.images.len()
        );
        self.image_acquired = Some(device.create_semaphore()?);
        if self.fences.is_empty() {
            for _ in 0..swapchain.images.len() {
                self.fences.push(device.create_fence()?);
            }
        }
        self.swapchain = Some(swapchain);

        self.rebuild_targets(device, scene, shaders)?;
        self.update_viewport_layout(device, scene, shaders)?;

        self.state = FrameState::Ready;
        Ok(())
    }

    /// Post-update step: record, submit and present one frame.
    ///
    /// A non-optimal surface from acquire or present invalidates the graph
    /// and abandons the rest of the frame; nothing is partially submitted.
    pub fn submit_frame(
        &mut self,
        device: &mut dyn GraphicsDevice,
        scene: &dyn SceneComponents,
    ) -> Result<()> {
        if self.state != FrameState::Ready {
            engine_trace!(SRC, "frame skipped in state {:?}", self.state);
            return Ok(());
        }
        let Some(acquire_semaphore) = self.image_acquired else {
            engine_bail!(SRC, "ready without an image-acquired semaphore");
        };
        if self.fences.is_empty() {
            engine_bail!(SRC, "ready without frame fences");
        }

        self.state = FrameState::Recording;
        self.update_buffers(device, scene)?;

        // The slot's previous frame must be off the GPU before its command
        // buffers are re-recorded
        let fence = self.fences[self.frame_index];
        device.wait_fence(fence, u64::MAX)?;
        device.reset_fence(fence)?;

        let (image_index, status) = device.acquire_next_image(acquire_semaphore, fence)?;
        if status != SurfaceStatus::Optimal {
            engine_warn!(SRC, "surface {:?} on acquire, frame abandoned", status);
            self.state = FrameState::Invalid;
            return Ok(());
        }

        self.record_targets(device, scene, image_index as usize)?;

        // Submission chain: first target waits on image acquisition, each
        // signals its own semaphore, present waits on the composite's
        self.state = FrameState::Submitted;
        let mut wait = acquire_semaphore;
        for kind in self.registry.kinds_descending() {
            let Some(target) = self.registry.get(kind) else {
                continue;
            };
            let Some(signal) = target.semaphore else {
                engine_bail!(SRC, "target '{}' has no semaphore", kind.name());
            };
            let Some(&command_buffer) = target.command_buffers.get(image_index as usize) else {
                engine_bail!(SRC, "target '{}' has no command buffer for image {}", kind.name(), image_index);
            };
            let submit = SubmitInfo {
                command_buffer,
                wait_semaphore: wait,
                signal_semaphore: signal,
            };
            if let Err(err) = device.queue_submit(&submit) {
                engine_error!(SRC, "submit failed for target '{}': {}", kind.name(), err);
                self.state = FrameState::Invalid;
                return Ok(());
            }
            wait = signal;
        }

        let status = device.present(wait, image_index)?;
        self.state = FrameState::Presented;

        self.frame_index = (self.frame_index + 1) % self.fences.len();
        // Conservative: serialize CPU and GPU rather than risk reusing
        // resources the GPU still reads
        device.queue_wait_idle()?;

        if status == SurfaceStatus::Optimal {
            self.state = FrameState::Ready;
        } else {
            engine_warn!(SRC, "surface {:?} on present, rebuilding next frame", status);
            self.state = FrameState::Invalid;
        }
        Ok(())
    }

    /// Release every device object the graph owns
    pub fn shutdown(&mut self, device: &mut dyn GraphicsDevice) {
        engine_info!(SRC, "shutting down render graph");
        if let Err(err) = device.queue_wait_idle() {
            engine_error!(SRC, "queue idle wait failed during shutdown: {}", err);
        }
        for target in self.registry.iter_mut() {
            for tile in &mut target.viewports {
                tile.environment_buffer = None;
                tile.compute_pipeline = None;
            }
            for subpass in &mut target.subpasses {
                subpass.pipeline = None;
                subpass.param_buffer = None;
            }
            target.destroy_device_objects(device);
        }
        self.pipelines.clear(device);
        self.uniform_buffers.clear(device);
        self.pipeline_cache.clear();
        self.compute_cache.clear();
        self.lights_buffer = None;
        for fence in self.fences.drain(..) {
            device.destroy_fence(fence);
        }
        if let Some(semaphore) = self.image_acquired.take() {
            device.destroy_semaphore(semaphore);
        }
        if self.swapchain.take().is_some() {
            device.destroy_swapchain();
        }
        self.frame_index = 0;
        self.state = FrameState::Invalid;
    }

    // ========================================================================
    // Buffer updates and command recording
    // ========================================================================

    fn update_buffers(&mut self, device: &mut dyn GraphicsDevice, scene: &dyn SceneComponents) -> Result<()> {
        let Self {
            registry,
            uniform_buffers,
            settings,
            lights,
            lights_dirty,
            lights_buffer,
            ..
        } = self;

        if *lights_dirty {
            if let Some(buffer) = lights_buffer.and_then(|h| uniform_buffers.lookup(h)) {
                let mut packed = [LightData::default(); MAX_LIGHTS];
                let count = lights.len().min(MAX_LIGHTS);
                packed[..count].copy_from_slice(&lights[..count]);
                buffer.write(device, bytemuck::cast_slice(&packed))?;
                *lights_dirty = false;
            }
        }
        let light_count = lights.len().min(MAX_LIGHTS) as f32;

        for target in registry.iter() {
            for tile in &target.viewports {
                let (Some(camera), Some(handle)) = (tile.camera, tile.environment_buffer) else {
                    continue;
                };
                let Some(info) = scene.camera(camera) else {
                    engine_trace!(SRC, "camera {:?} gone, environment update skipped", camera);
                    continue;
                };
                let env = EnvironmentUniform {
                    camera: info.uniform(),
                    render: Vec4::new(settings.gamma, settings.exposure, light_count, 0.0),
                };
                if let Some(buffer) = uniform_buffers.lookup(handle) {
                    buffer.write(device, bytemuck::bytes_of(&env))?;
                }
            }
            for subpass in &target.subpasses {
                if let Some(buffer) = subpass.param_buffer.and_then(|h| uniform_buffers.lookup(h)) {
                    buffer.write(device, bytemuck::bytes_of(&subpass.params))?;
                }
            }
        }
        Ok(())
    }

    fn record_targets(
        &mut self,
        device: &mut dyn GraphicsDevice,
        scene: &dyn SceneComponents,
        image_index: usize,
    ) -> Result<()> {
        let Self {
            registry,
            pipelines,
            settings,
            opaque_items,
            alpha_items,
            ui_items,
            ..
        } = self;
        for kind in registry.kinds_descending() {
            let Some(target) = registry.get(kind) else {
                continue;
            };
            record_target(
                device,
                scene,
                pipelines,
                target,
                image_index,
                settings,
                opaque_items,
                alpha_items,
                ui_items,
            )?;
        }
        Ok(())
    }
}

// ============================================================================
// Recording helpers
// ============================================================================

fn resolve_pipeline(
    pipelines: &ObjectPool<PipelineObject>,
    handle: Option<PoolHandle>,
) -> Option<PipelineHandle> {
    handle
        .and_then(|h| pipelines.lookup(h))
        .and_then(|object| object.handle())
}

/// Clear values in attachment order for a target's render pass
fn clear_values(target: &RenderTarget, settings: &RenderSettings) -> Vec<ClearValue> {
    let color = ClearValue::Color(settings.clear_color.to_array());
    match target.kind {
        // [input_0 .. input_{s-1}, output color]
        TargetKind::Composite | TargetKind::Ui => {
            let inputs = target.subpasses.len();
            vec![color; inputs + 1]
        }
        // [depth, (msaa), input_0 .. input_{s-1}, color]
        TargetKind::OffscreenColor | TargetKind::MainScene => {
            let mut clears = vec![ClearValue::DepthStencil {
                depth: 1.0,
                stencil: 0,
            }];
            if target.attachments.multisample_color.is_some() {
                clears.push(color);
            }
            for _ in 0..target.subpasses.len() {
                clears.push(color);
            }
            clears.push(color);
            clears
        }
    }
}

fn record_post_stage(
    device: &mut dyn GraphicsDevice,
    pipelines: &ObjectPool<PipelineObject>,
    cmd: CommandBufferHandle,
    subpass: &Subpass,
) {
    let Some(pipeline) = resolve_pipeline(pipelines, subpass.pipeline) else {
        engine_warn!(SRC, "post stage {} has no pipeline, skipped", subpass.index);
        return;
    };
    device.cmd_bind_pipeline(cmd, PipelineBindPoint::Graphics, pipeline);
    if let Some(set) = subpass.descriptor_set {
        device.cmd_bind_descriptor_set(cmd, PipelineBindPoint::Graphics, DescriptorSlot::Postprocessing, set);
    }
    // Full-screen pass: single vertex expanded by the geometry stage
    device.cmd_draw(cmd, 1, 0);
}

fn record_raytracing(
    device: &mut dyn GraphicsDevice,
    pipelines: &ObjectPool<PipelineObject>,
    target: &RenderTarget,
    cmd: CommandBufferHandle,
) {
    for tile in &target.viewports {
        let Some(pipeline) = resolve_pipeline(pipelines, tile.compute_pipeline) else {
            continue;
        };
        device.cmd_bind_pipeline(cmd, PipelineBindPoint::Compute, pipeline);
        if let Some(set) = tile.compute_set {
            device.cmd_bind_descriptor_set(cmd, PipelineBindPoint::Compute, DescriptorSlot::Raytracing, set);
        }
        // Dispatch covers the tile's pixel extent
        device.cmd_dispatch(cmd, tile.rect.width as u32, tile.rect.height as u32, 1);
    }
}

#[allow(clippy::too_many_arguments)]
fn record_target(
    device: &mut dyn GraphicsDevice,
    scene: &dyn SceneComponents,
    pipelines: &ObjectPool<PipelineObject>,
    target: &RenderTarget,
    image_index: usize,
    settings: &RenderSettings,
    opaque: &[DrawItem],
    alpha: &mut [DrawItem],
    ui: &[DrawItem],
) -> Result<()> {
    let Some(&cmd) = target.command_buffers.get(image_index) else {
        engine_bail!(
            SRC,
            "target '{}' has no command buffer for image {}",
            target.kind.name(),
            image_index
        );
    };
    device.begin_command_buffer(cmd)?;

    // Ray-traced targets render through compute only; the raster pass does
    // not exist for them
    if target.has_raytraced_viewport() {
        record_raytracing(device, pipelines, target, cmd);
        device.end_command_buffer(cmd)?;
        return Ok(());
    }

    let Some(pass) = target.pass else {
        engine_bail!(SRC, "target '{}' recorded without a pass", target.kind.name());
    };
    let Some(&framebuffer) = target.framebuffers.get(image_index) else {
        engine_bail!(
            SRC,
            "target '{}' has no framebuffer for image {}",
            target.kind.name(),
            image_index
        );
    };
    let clears = clear_values(target, settings);
    device.cmd_begin_render_pass(cmd, pass, framebuffer, target.scissor, &clears);

    match target.kind {
        TargetKind::Composite | TargetKind::Ui => {
            device.cmd_set_viewport(cmd, target.viewport);
            device.cmd_set_scissor(cmd, target.scissor);
            for (stage, subpass) in target.subpasses.iter().enumerate() {
                if stage > 0 {
                    device.cmd_next_subpass(cmd);
                }
                record_post_stage(device, pipelines, cmd, subpass);
            }
            if target.kind == TargetKind::Ui {
                let ctx = DrawContext {
                    target: target.kind,
                    camera: None,
                    common_set: target.viewports.first().and_then(|t| t.common_set),
                };
                for item in ui {
                    item.recorder.record(device, cmd, &ctx)?;
                }
            }
        }
        TargetKind::OffscreenColor | TargetKind::MainScene => {
            device.cmd_set_line_width(cmd, settings.line_width);
            for tile in &target.viewports {
                device.cmd_set_viewport(cmd, tile.rect);
                device.cmd_set_scissor(cmd, tile.scissor);
                if let Some(set) = tile.common_set {
                    device.cmd_bind_descriptor_set(cmd, PipelineBindPoint::Graphics, DescriptorSlot::Common, set);
                }
                let ctx = DrawContext {
                    target: target.kind,
                    camera: tile.camera,
                    common_set: tile.common_set,
                };
                for item in opaque {
                    item.recorder.record(device, cmd, &ctx)?;
                }
                if !alpha.is_empty() {
                    let camera_position = tile
                        .camera
                        .and_then(|id| scene.camera(id))
                        .map(|c| c.position)
                        .unwrap_or(Vec3::ZERO);
                    sort_back_to_front(alpha, camera_position);
                    for item in alpha.iter() {
                        item.recorder.record(device, cmd, &ctx)?;
                    }
                }
            }
            // Post-processing chain after the raster subpass
            for subpass in &target.subpasses {
                device.cmd_next_subpass(cmd);
                device.cmd_set_viewport(cmd, target.viewport);
                device.cmd_set_scissor(cmd, target.scissor);
                record_post_stage(device, pipelines, cmd, subpass);
            }
        }
    }

    device.cmd_end_render_pass(cmd);
    device.end_command_buffer(cmd)?;
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "render_graph_tests.rs"]
mod tests;
