/// Pass building: (re)creates passes, attachments, framebuffers and the
/// post-processing subpass wiring for every target, and lays viewport tiles
/// out after a rebuild.
///
/// Targets rebuild in submission order (main scene first, composite last) so
/// each overlay pass can bind the color image of the target submitted before
/// it. Ping-pong wiring keys off subpass-count parity: with `k = s % 2`,
/// stage `j` reads the primary color image when `(k + j) % 2 == 0` and the
/// secondary one otherwise, which guarantees the final stage always writes
/// the primary image that downstream targets sample.

use glam::Vec4;

use crate::device::{
    DescriptorWrites, FramebufferDesc, GraphicsDevice, ImageDesc, ImageFormat, ImageHandle,
    ImageUsage, PassHandle, PipelineDesc, Rect2D, RenderPassDesc, SwapchainInfo, ViewportRect,
};
use crate::error::Result;
use crate::graph::render_graph::{EnvironmentUniform, RenderGraph, MAX_LIGHTS};
use crate::graph::viewport_packer::{pack, scissor_for};
use crate::pool::{ObjectPool, PipelineObject, PipelineParams, PoolHandle, UniformBufferObject};
use crate::scene::{LightData, RenderSettings, SceneComponents, ShaderLibrary};
use crate::target::{RenderTarget, Subpass, TargetKind, ViewportTile};
use crate::{engine_bail, engine_trace, engine_warn};

const SRC: &str = "nova3d::PassBuilder";

type GraphicsCache = rustc_hash::FxHashMap<(PipelineDesc, PassHandle), PoolHandle>;

impl RenderGraph {
    /// Rebuild every target's pass-scoped objects against the current
    /// swapchain. Only called from `build_frame`, after teardown.
    pub(crate) fn rebuild_targets(
        &mut self,
        device: &mut dyn GraphicsDevice,
        scene: &dyn SceneComponents,
        shaders: &dyn ShaderLibrary,
    ) -> Result<()> {
        let Some(swap) = self.swapchain.clone() else {
            engine_bail!(SRC, "rebuild requested without a swapchain");
        };
        for kind in self.registry.kinds_descending() {
            self.rebuild_target(device, scene, shaders, kind, &swap)?;
        }
        Ok(())
    }

    fn rebuild_target(
        &mut self,
        device: &mut dyn GraphicsDevice,
        scene: &dyn SceneComponents,
        shaders: &dyn ShaderLibrary,
        kind: TargetKind,
        swap: &SwapchainInfo,
    ) -> Result<()> {
        // Inputs come from targets already rebuilt this pass
        let scene_input = self.registry.scene_color();
        let composite_input = self.registry.composite_input();

        let Self {
            registry,
            pipelines,
            uniform_buffers,
            pipeline_cache,
            settings,
            ..
        } = self;
        let Some(target) = registry.get_mut(kind) else {
            return Ok(());
        };

        target.viewport = ViewportRect {
            x: 0.0,
            y: 0.0,
            width: swap.width as f32,
            height: swap.height as f32,
            ..ViewportRect::default()
        };
        target.scissor = Rect2D {
            x: 0,
            y: 0,
            width: swap.width,
            height: swap.height,
        };
        if target.semaphore.is_none() {
            target.semaphore = Some(device.create_semaphore()?);
        }
        ensure_command_buffers(device, target, swap.images.len())?;

        match kind {
            TargetKind::MainScene | TargetKind::OffscreenColor => rebuild_scene_target(
                device,
                scene,
                pipelines,
                pipeline_cache,
                uniform_buffers,
                settings,
                target,
                swap,
            ),
            TargetKind::Ui => rebuild_overlay_target(
                device,
                shaders,
                pipelines,
                pipeline_cache,
                uniform_buffers,
                target,
                swap,
                scene_input,
            ),
            TargetKind::Composite => rebuild_overlay_target(
                device,
                shaders,
                pipelines,
                pipeline_cache,
                uniform_buffers,
                target,
                swap,
                composite_input,
            ),
        }
    }

    /// Tile viewports across the surface, push aspect ratios into cameras
    /// and wire per-tile descriptor resources (environment buffer, common
    /// set, ray-tracing compute set where the camera traces).
    pub fn update_viewport_layout(
        &mut self,
        device: &mut dyn GraphicsDevice,
        scene: &mut dyn SceneComponents,
        shaders: &dyn ShaderLibrary,
    ) -> Result<()> {
        let Some(swap) = self.swapchain.clone() else {
            // Nothing to lay out before the first build
            return Ok(());
        };

        if self.lights_buffer.is_none() {
            let size = (MAX_LIGHTS * std::mem::size_of::<LightData>()) as u64;
            self.lights_buffer = Some(self.uniform_buffers.acquire(device, &size)?);
        }
        let lights_handle = self
            .lights_buffer
            .and_then(|h| self.uniform_buffers.lookup(h))
            .and_then(|b| b.handle());

        let Self {
            registry,
            pipelines,
            uniform_buffers,
            compute_cache,
            ..
        } = self;
        let (width, height) = (swap.width as f32, swap.height as f32);

        for target in registry.iter_mut() {
            let RenderTarget {
                kind,
                camera,
                viewport,
                scissor,
                viewports,
                attachments,
                ..
            } = target;

            if !kind.is_scene() {
                // Overlay targets keep one full-surface tile
                viewports.truncate(1);
                if viewports.is_empty() {
                    viewports.push(ViewportTile::default());
                }
                viewports[0].rect = *viewport;
                viewports[0].scissor = *scissor;
                continue;
            }

            if viewports.is_empty() {
                viewports.push(ViewportTile {
                    camera: *camera,
                    ..ViewportTile::default()
                });
            }
            let rects = pack(width, height, viewports.len());
            for (tile, rect) in viewports.iter_mut().zip(rects) {
                tile.rect = rect;
                tile.scissor = scissor_for(&rect);
            }

            for tile in viewports.iter_mut() {
                let Some(camera_id) = tile.camera else {
                    continue;
                };
                let Some(info) = scene.camera(camera_id) else {
                    engine_trace!(SRC, "camera {:?} gone, tile keeps its layout", camera_id);
                    continue;
                };
                scene.set_camera_aspect(camera_id, tile.rect.width / tile.rect.height);
                scene.set_camera_render_size(
                    camera_id,
                    tile.rect.width as u32,
                    tile.rect.height as u32,
                );

                if tile.environment_buffer.is_none() {
                    let size = std::mem::size_of::<EnvironmentUniform>() as u64;
                    tile.environment_buffer = Some(uniform_buffers.acquire(device, &size)?);
                }
                let env_handle = tile
                    .environment_buffer
                    .and_then(|h| uniform_buffers.lookup(h))
                    .and_then(|b| b.handle());

                if tile.common_set.is_none() {
                    tile.common_set = Some(device.create_descriptor_set()?);
                }
                if let Some(set) = tile.common_set {
                    device.update_descriptor_set(
                        set,
                        &DescriptorWrites {
                            environment_buffer: env_handle,
                            lights_buffer: lights_handle,
                            ..DescriptorWrites::default()
                        },
                    )?;
                }

                if info.raytracing {
                    let Some(shader) = shaders.shader("raytracing") else {
                        engine_warn!(SRC, "camera {:?} traces but no raytracing shader exists", camera_id);
                        continue;
                    };
                    if !compute_cache.contains_key(&shader) {
                        let handle =
                            pipelines.acquire(device, &PipelineParams::Compute { shader })?;
                        compute_cache.insert(shader, handle);
                    }
                    tile.compute_pipeline = compute_cache.get(&shader).copied();

                    if tile.compute_set.is_none() {
                        tile.compute_set = Some(device.create_descriptor_set()?);
                    }
                    if let Some(set) = tile.compute_set {
                        device.update_descriptor_set(
                            set,
                            &DescriptorWrites {
                                storage_image: attachments.storage,
                                input_image: attachments.color,
                                environment_buffer: env_handle,
                                ..DescriptorWrites::default()
                            },
                        )?;
                    }
                }
            }
        }
        Ok(())
    }
}

// ============================================================================
// Per-kind rebuild helpers
// ============================================================================

fn image_desc(swap: &SwapchainInfo, format: ImageFormat, usage: ImageUsage, samples: u32) -> ImageDesc {
    ImageDesc {
        width: swap.width,
        height: swap.height,
        format,
        usage,
        samples,
    }
}

fn ensure_command_buffers(
    device: &mut dyn GraphicsDevice,
    target: &mut RenderTarget,
    count: usize,
) -> Result<()> {
    if target.command_buffers.len() == count {
        return Ok(());
    }
    for cmd in target.command_buffers.drain(..) {
        device.destroy_command_buffer(cmd);
    }
    for _ in 0..count {
        target.command_buffers.push(device.create_command_buffer()?);
    }
    Ok(())
}

fn ensure_graphics_pipeline(
    device: &mut dyn GraphicsDevice,
    pipelines: &mut ObjectPool<PipelineObject>,
    cache: &mut GraphicsCache,
    desc: &PipelineDesc,
    pass: PassHandle,
) -> Result<PoolHandle> {
    let key = (desc.clone(), pass);
    if let Some(&handle) = cache.get(&key) {
        return Ok(handle);
    }
    let handle = pipelines.acquire(
        device,
        &PipelineParams::Graphics {
            desc: desc.clone(),
            pass,
        },
    )?;
    cache.insert(key, handle);
    Ok(handle)
}

fn ensure_param_buffer(
    device: &mut dyn GraphicsDevice,
    uniform_buffers: &mut ObjectPool<UniformBufferObject>,
    subpass: &mut Subpass,
) -> Result<Option<crate::device::BufferHandle>> {
    if subpass.param_buffer.is_none() {
        let size = std::mem::size_of::<Vec4>() as u64;
        subpass.param_buffer = Some(uniform_buffers.acquire(device, &size)?);
    }
    Ok(subpass
        .param_buffer
        .and_then(|h| uniform_buffers.lookup(h))
        .and_then(|b| b.handle()))
}

/// Scene target rebuild: raster path with optional multisampling and a
/// ping-pong post-processing chain, or the compute ray-tracing path when any
/// tile's camera traces.
#[allow(clippy::too_many_arguments)]
fn rebuild_scene_target(
    device: &mut dyn GraphicsDevice,
    scene: &dyn SceneComponents,
    pipelines: &mut ObjectPool<PipelineObject>,
    cache: &mut GraphicsCache,
    uniform_buffers: &mut ObjectPool<UniformBufferObject>,
    settings: &RenderSettings,
    target: &mut RenderTarget,
    swap: &SwapchainInfo,
) -> Result<()> {
    let raytracing = target.viewports.iter().any(|tile| {
        tile.camera
            .and_then(|id| scene.camera(id))
            .is_some_and(|c| c.raytracing)
    });

    // The main scene recreates its images on every rebuild; the offscreen
    // target creates lazily and keeps what it has
    if target.kind == TargetKind::MainScene {
        target.attachments.destroy_all(device);
    }

    if raytracing {
        if target.attachments.color.is_none() {
            target.attachments.color = Some(device.create_image(&image_desc(
                swap,
                ImageFormat::Rgba16Float,
                ImageUsage::COLOR_ATTACHMENT | ImageUsage::SAMPLED,
                1,
            ))?);
        }
        if target.attachments.storage.is_none() {
            target.attachments.storage = Some(device.create_image(&image_desc(
                swap,
                ImageFormat::Rgba16Float,
                ImageUsage::STORAGE | ImageUsage::SAMPLED,
                1,
            ))?);
        }
        // No raster pass exists for a traced target
        return Ok(());
    }

    if let Some(storage) = target.attachments.storage.take() {
        device.destroy_image(storage);
    }

    let stages = target.subpasses.len();
    let msaa = settings.sample_count > 1;

    if target.attachments.depth_stencil.is_none() {
        target.attachments.depth_stencil = Some(device.create_image(&image_desc(
            swap,
            ImageFormat::Depth24Stencil8,
            ImageUsage::DEPTH_STENCIL,
            settings.sample_count,
        ))?);
    }
    if msaa && target.attachments.multisample_color.is_none() {
        target.attachments.multisample_color = Some(device.create_image(&image_desc(
            swap,
            ImageFormat::Rgba16Float,
            ImageUsage::COLOR_ATTACHMENT,
            settings.sample_count,
        ))?);
    }
    if !msaa {
        if let Some(image) = target.attachments.multisample_color.take() {
            device.destroy_image(image);
        }
    }
    if target.attachments.color.is_none() {
        target.attachments.color = Some(device.create_image(&image_desc(
            swap,
            ImageFormat::Rgba16Float,
            ImageUsage::COLOR_ATTACHMENT | ImageUsage::SAMPLED,
            1,
        ))?);
    }
    if stages > 0 && target.attachments.color2.is_none() {
        target.attachments.color2 = Some(device.create_image(&image_desc(
            swap,
            ImageFormat::Rgba16Float,
            ImageUsage::COLOR_ATTACHMENT | ImageUsage::SAMPLED,
            1,
        ))?);
    }

    let (Some(depth), Some(color)) = (target.attachments.depth_stencil, target.attachments.color)
    else {
        engine_bail!(SRC, "scene target '{}' missing attachments", target.kind.name());
    };

    // [depth, (msaa), stage inputs, color]
    let mut formats = vec![ImageFormat::Depth24Stencil8];
    if msaa {
        formats.push(ImageFormat::Rgba16Float);
    }
    formats.extend(std::iter::repeat(ImageFormat::Rgba16Float).take(stages + 1));
    let pass = device.create_render_pass(&RenderPassDesc {
        formats,
        subpass_count: (stages + 1) as u32,
    })?;
    target.pass = Some(pass);

    let mut views = vec![depth];
    if let Some(ms) = target.attachments.multisample_color {
        views.push(ms);
    }
    for stage in 0..stages {
        views.push(stage_input(target, stage, color));
    }
    views.push(color);
    for _ in 0..swap.images.len() {
        target.framebuffers.push(device.create_framebuffer(&FramebufferDesc {
            pass,
            width: swap.width,
            height: swap.height,
            attachments: views.clone(),
        })?);
    }

    for stage in 0..target.subpasses.len() {
        let input = stage_input(target, stage, color);
        let subpass = &mut target.subpasses[stage];
        let param_handle = ensure_param_buffer(device, uniform_buffers, subpass)?;
        let set = device.create_descriptor_set()?;
        device.update_descriptor_set(
            set,
            &DescriptorWrites {
                input_image: Some(input),
                param_buffer: param_handle,
                ..DescriptorWrites::default()
            },
        )?;
        subpass.descriptor_set = Some(set);
        subpass.pipeline = Some(ensure_graphics_pipeline(
            device,
            pipelines,
            cache,
            &subpass.pipeline_desc.clone(),
            pass,
        )?);
    }
    Ok(())
}

/// The image post stage `j` reads. Parity is anchored on the stage count so
/// the final stage always writes the primary color image.
fn stage_input(target: &RenderTarget, stage: usize, color: ImageHandle) -> ImageHandle {
    let stages = target.subpasses.len();
    let reads_primary = (stages % 2 + stage) % 2 == 0;
    if reads_primary {
        color
    } else {
        target.attachments.color2.unwrap_or(color)
    }
}

/// Composite and UI: a single full-screen post-processing subpass reading
/// the previous target's color image. Composite writes the swapchain image,
/// UI writes its own color image.
#[allow(clippy::too_many_arguments)]
fn rebuild_overlay_target(
    device: &mut dyn GraphicsDevice,
    shaders: &dyn ShaderLibrary,
    pipelines: &mut ObjectPool<PipelineObject>,
    cache: &mut GraphicsCache,
    uniform_buffers: &mut ObjectPool<UniformBufferObject>,
    target: &mut RenderTarget,
    swap: &SwapchainInfo,
    input: Option<ImageHandle>,
) -> Result<()> {
    let presents = target.kind == TargetKind::Composite;

    if !presents {
        target.attachments.destroy_all(device);
        target.attachments.color = Some(device.create_image(&image_desc(
            swap,
            ImageFormat::Rgba16Float,
            ImageUsage::COLOR_ATTACHMENT | ImageUsage::SAMPLED,
            1,
        ))?);
    }

    // Exactly one camera-less viewport
    target.viewports.truncate(1);
    if target.viewports.is_empty() {
        target.viewports.push(ViewportTile::default());
    }
    target.viewports[0].camera = None;

    if target.subpasses.is_empty() {
        let Some(shader) = shaders.shader("postprocessing") else {
            engine_bail!(SRC, "postprocessing shader missing, cannot build '{}'", target.kind.name());
        };
        target.subpasses.push(Subpass::new(
            0,
            PipelineDesc {
                shader,
                subpass: 0,
                sample_count: 1,
                blend: false,
            },
            Vec4::ZERO,
        ));
    }

    let output_format = if presents {
        swap.format
    } else {
        ImageFormat::Rgba16Float
    };
    let mut formats = Vec::new();
    if input.is_some() {
        formats.push(ImageFormat::Rgba16Float);
    }
    formats.push(output_format);
    let pass = device.create_render_pass(&RenderPassDesc {
        formats,
        subpass_count: 1,
    })?;
    target.pass = Some(pass);

    for index in 0..swap.images.len() {
        let output = if presents {
            swap.images[index]
        } else {
            match target.attachments.color {
                Some(color) => color,
                None => engine_bail!(SRC, "overlay target '{}' missing color image", target.kind.name()),
            }
        };
        let mut attachments = Vec::new();
        if let Some(input) = input {
            attachments.push(input);
        }
        attachments.push(output);
        target.framebuffers.push(device.create_framebuffer(&FramebufferDesc {
            pass,
            width: swap.width,
            height: swap.height,
            attachments,
        })?);
    }

    let subpass = &mut target.subpasses[0];
    let param_handle = ensure_param_buffer(device, uniform_buffers, subpass)?;
    let set = device.create_descriptor_set()?;
    device.update_descriptor_set(
        set,
        &DescriptorWrites {
            input_image: input,
            param_buffer: param_handle,
            ..DescriptorWrites::default()
        },
    )?;
    subpass.descriptor_set = Some(set);
    let desc = subpass.pipeline_desc.clone();
    target.subpasses[0].pipeline = Some(ensure_graphics_pipeline(device, pipelines, cache, &desc, pass)?);
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "pass_builder_tests.rs"]
mod tests;
