use crate::core::model::CpuMesh;
use crate::core::{PassKind, SceneState};
use web_sys as web;

mod helpers;
mod particles;
mod post;
mod scene;
mod targets;
use targets::RenderTargets;

/// Which colour format a scene pass is drawn into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum FormatSlot {
    Offscreen = 0,
    Surface = 1,
}

#[inline]
pub(crate) fn srgb_to_linear(c: [f32; 3]) -> [f32; 3] {
    c.map(|v| v.max(0.0).powf(2.2))
}

pub struct GpuState<'a> {
    surface: wgpu::Surface<'a>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    targets: RenderTargets,
    linear_sampler: wgpu::Sampler,
    post_shader: wgpu::ShaderModule,
    post: post::PostResources,
    scene: scene::SceneResources,
    particles: particles::ParticleResources,
    width: u32,
    height: u32,
}

impl<'a> GpuState<'a> {
    pub async fn new(canvas: &'a web::HtmlCanvasElement, state: &SceneState) -> anyhow::Result<Self> {
        let width = canvas.width().max(1);
        let height = canvas.height().max(1);

        let instance = wgpu::Instance::default();
        let surface = instance.create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone()))?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| anyhow::anyhow!("No WebGPU adapter"))?;
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::Performance,
                    label: None,
                },
                None,
            )
            .await
            .map_err(|e| anyhow::anyhow!(format!("request_device error: {:?}", e)))?;
        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|f| {
                matches!(
                    f,
                    wgpu::TextureFormat::Bgra8UnormSrgb | wgpu::TextureFormat::Rgba8UnormSrgb
                )
            })
            .or_else(|| caps.formats.first().copied())
            .ok_or_else(|| anyhow::anyhow!("surface reports no formats"))?;
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width,
            height,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let targets = RenderTargets::new(&device, width, height);
        let linear_sampler =
            helpers::linear_sampler(&device, "linear_sampler", wgpu::AddressMode::ClampToEdge);
        let post_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("post_shader"),
            source: wgpu::ShaderSource::Wgsl(crate::core::POST_WGSL.into()),
        });
        let post = post::create_post_resources(
            &device,
            &post_shader,
            &targets,
            &linear_sampler,
            &state.post,
            format,
        );
        let scene = scene::create_scene_resources(&device, &queue, &state.environment, format);
        let particles = particles::create_particle_resources(&device, &queue, state, format);
        log::info!("[gpu] surface {}x{} format {:?}", width, height, format);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            targets,
            linear_sampler,
            post_shader,
            post,
            scene,
            particles,
            width,
            height,
        })
    }

    pub fn set_mesh(&mut self, mesh: &CpuMesh) {
        self.scene.set_mesh(&self.device, mesh);
    }

    pub fn resize_if_needed(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        if width != self.width || height != self.height {
            self.width = width;
            self.height = height;
            self.config.width = width;
            self.config.height = height;
            self.surface.configure(&self.device, &self.config);
            self.targets.recreate(&self.device, width, height);
            self.post.rebind(&self.device, &self.targets, &self.linear_sampler);
        }
    }

    /// Rebuild every post pass and both targets when the chain changed.
    fn sync_post_chain(&mut self, state: &SceneState) {
        if self.post.generation == state.post.generation() {
            return;
        }
        self.targets.recreate(&self.device, self.width, self.height);
        self.post = post::create_post_resources(
            &self.device,
            &self.post_shader,
            &self.targets,
            &self.linear_sampler,
            &state.post,
            self.config.format,
        );
    }

    pub fn render(&mut self, state: &mut SceneState) -> Result<(), wgpu::SurfaceError> {
        self.sync_post_chain(state);
        if self
            .scene
            .sync_environment(&self.device, &self.queue, &state.environment)
        {
            for m in state.materials.iter_mut() {
                m.needs_update = false;
            }
        }
        let su = scene::SceneUniforms::from_scene(state);
        self.queue
            .write_buffer(&self.scene.uniform_buffer, 0, bytemuck::bytes_of(&su));
        self.particles.prepare(&self.queue, state);
        self.queue.write_buffer(
            &self.post.uniform_buffer,
            0,
            bytemuck::bytes_of(&state.post.uniforms()),
        );

        let frame = self.surface.get_current_texture()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("encoder"),
            });
        let bg = srgb_to_linear(state.background);
        let clear = wgpu::Color {
            r: bg[0] as f64,
            g: bg[1] as f64,
            b: bg[2] as f64,
            a: 1.0,
        };

        if state.post_enabled {
            for pass in self.post.schedule() {
                let target = self.targets.view(pass.write).unwrap_or(&view);
                match pass.kind {
                    PassKind::Scene => {
                        self.scene_pass(&mut encoder, target, clear, state, FormatSlot::Offscreen);
                    }
                    kind => {
                        let (Some(pipeline), Some(read)) = (
                            self.post.pipeline(kind),
                            pass.read.and_then(|r| self.post.read_group(r)),
                        ) else {
                            log::warn!("[post] pass {} has no resources", kind.label());
                            continue;
                        };
                        post::blit(
                            &mut encoder,
                            kind.label(),
                            target,
                            wgpu::Color::BLACK,
                            pipeline,
                            read,
                        );
                    }
                }
            }
        } else {
            self.scene_pass(&mut encoder, &view, clear, state, FormatSlot::Surface);
        }

        self.queue.submit(Some(encoder.finish()));
        frame.present();
        Ok(())
    }

    fn scene_pass(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        clear: wgpu::Color,
        state: &SceneState,
        slot: FormatSlot,
    ) {
        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("scene_pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.targets.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        self.scene.draw(&mut rpass, slot);
        self.particles.draw(&mut rpass, state, slot);
    }
}
