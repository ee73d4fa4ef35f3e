use super::helpers;
use super::FormatSlot;
use crate::constants::{MARKER_COLOR, MARKER_SIZE};
use crate::core::{
    radial_sprite, EffectKind, EffectSystem, ParticleInstance, SceneState, SPRITE_SIZE,
};
use glam::Vec3;
use wgpu::util::DeviceExt;

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct ParticleUniforms {
    view_proj: [[f32; 4]; 4],
    cam_right: [f32; 4],
    cam_up: [f32; 4],
    params: [f32; 4],
}

struct EffectSlot {
    kind: EffectKind,
    instances: wgpu::Buffer,
    count: u32,
    uniform: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

struct PipelinePair {
    additive: wgpu::RenderPipeline,
    alpha: wgpu::RenderPipeline,
}

/// One instance buffer per effect, baked once; the trigger markers are the
/// only buffer rewritten every frame.
pub(crate) struct ParticleResources {
    slots: Vec<EffectSlot>,
    pipelines: [PipelinePair; 2],
}

const ADDITIVE: wgpu::BlendState = wgpu::BlendState {
    color: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::SrcAlpha,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    },
    alpha: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::Zero,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    },
};

pub(crate) fn create_particle_resources(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    scene: &SceneState,
    swap_format: wgpu::TextureFormat,
) -> ParticleResources {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("particles_shader"),
        source: wgpu::ShaderSource::Wgsl(crate::core::PARTICLES_WGSL.into()),
    });
    let bgl = helpers::texture_uniform_layout(
        device,
        "particles_bgl0",
        0,
        wgpu::ShaderStages::VERTEX_FRAGMENT,
    );
    let sampler = helpers::linear_sampler(device, "sprite_sampler", wgpu::AddressMode::ClampToEdge);
    let (_, sprite_view) = helpers::upload_rgba_texture(
        device,
        queue,
        "sprite_tex",
        SPRITE_SIZE,
        &radial_sprite(SPRITE_SIZE),
    );

    let make_slot = |kind: EffectKind, instances: &[ParticleInstance], dynamic: bool| {
        let usage = if dynamic {
            wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST
        } else {
            wgpu::BufferUsages::VERTEX
        };
        let instances_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(kind.name()),
            contents: bytemuck::cast_slice(instances),
            usage,
        });
        let uniform = helpers::uniform_buffer(
            device,
            "particle_uniforms",
            std::mem::size_of::<ParticleUniforms>(),
        );
        let bind_group = helpers::texture_uniform_bind_group(
            device,
            "particles_bg0",
            &bgl,
            0,
            &sprite_view,
            &sampler,
            &uniform,
        );
        EffectSlot {
            kind,
            instances: instances_buf,
            count: instances.len() as u32,
            uniform,
            bind_group,
        }
    };

    let mut slots: Vec<EffectSlot> = scene
        .particles
        .systems
        .iter()
        .chain(scene.weather.effects.iter())
        .map(|s| make_slot(s.kind, &s.instances, false))
        .collect();
    slots.push(make_slot(
        EffectKind::TriggerMarker,
        &marker_instances(scene),
        true,
    ));

    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("pl_particles"),
        bind_group_layouts: &[&bgl],
        push_constant_ranges: &[],
    });
    let pair = |format: wgpu::TextureFormat| PipelinePair {
        additive: make_particle_pipeline(device, &layout, &shader, format, ADDITIVE),
        alpha: make_particle_pipeline(
            device,
            &layout,
            &shader,
            format,
            wgpu::BlendState::ALPHA_BLENDING,
        ),
    };
    ParticleResources {
        slots,
        pipelines: [pair(helpers::HDR_FORMAT), pair(swap_format)],
    }
}

fn make_particle_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    blend: wgpu::BlendState,
) -> wgpu::RenderPipeline {
    const ATTRS: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
        0 => Float32x3, 1 => Float32, 2 => Float32x3, 3 => Float32, 4 => Float32x4
    ];
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("particle_pipeline"),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<ParticleInstance>() as u64,
                step_mode: wgpu::VertexStepMode::Instance,
                attributes: &ATTRS,
            }],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        primitive: wgpu::PrimitiveState::default(),
        // particles test against the head but never occlude each other
        depth_stencil: Some(wgpu::DepthStencilState {
            format: helpers::DEPTH_FORMAT,
            depth_write_enabled: false,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(blend),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        cache: None,
        multiview: None,
    })
}

fn marker_instances(scene: &SceneState) -> Vec<ParticleInstance> {
    scene
        .triggers
        .triggers
        .iter()
        .map(|t| ParticleInstance {
            origin: t.position.to_array(),
            size: MARKER_SIZE,
            velocity: [0.0; 3],
            seed: t.spin,
            color: [MARKER_COLOR[0], MARKER_COLOR[1], MARKER_COLOR[2], t.opacity],
        })
        .collect()
}

fn camera_basis(scene: &SceneState) -> (Vec3, Vec3) {
    let forward = scene.camera.forward();
    let right = forward.cross(scene.camera.up).normalize_or_zero();
    let up = right.cross(forward).normalize_or_zero();
    (right, up)
}

impl ParticleResources {
    /// Push this frame's uniforms and marker state.
    pub(crate) fn prepare(&self, queue: &wgpu::Queue, scene: &SceneState) {
        let (right, up) = camera_basis(scene);
        let view_proj = scene.camera.view_projection().to_cols_array_2d();
        let time_s = scene
            .particles
            .systems
            .first()
            .map_or(0.0, |s| s.time_s);
        for slot in &self.slots {
            let params = match find_system(scene, slot.kind) {
                Some(s) => s.params(),
                None => [time_s, 1.0, slot.kind as u32 as f32, 0.0],
            };
            let u = ParticleUniforms {
                view_proj,
                cam_right: right.extend(0.0).to_array(),
                cam_up: up.extend(0.0).to_array(),
                params,
            };
            queue.write_buffer(&slot.uniform, 0, bytemuck::bytes_of(&u));
            if slot.kind == EffectKind::TriggerMarker {
                queue.write_buffer(
                    &slot.instances,
                    0,
                    bytemuck::cast_slice(&marker_instances(scene)),
                );
            }
        }
    }

    pub(crate) fn draw(&self, rpass: &mut wgpu::RenderPass<'_>, scene: &SceneState, slot: FormatSlot) {
        let pair = &self.pipelines[slot as usize];
        for effect in &self.slots {
            let visible = match find_system(scene, effect.kind) {
                Some(s) => s.visible,
                None => effect.kind == EffectKind::TriggerMarker,
            };
            if !visible || effect.count == 0 {
                continue;
            }
            let pipeline = if effect.kind.additive() {
                &pair.additive
            } else {
                &pair.alpha
            };
            rpass.set_pipeline(pipeline);
            rpass.set_bind_group(0, &effect.bind_group, &[]);
            rpass.set_vertex_buffer(0, effect.instances.slice(..));
            rpass.draw(0..6, 0..effect.count);
        }
    }
}

fn find_system(scene: &SceneState, kind: EffectKind) -> Option<&EffectSystem> {
    scene
        .particles
        .systems
        .iter()
        .chain(scene.weather.effects.iter())
        .find(|s| s.kind == kind)
}
