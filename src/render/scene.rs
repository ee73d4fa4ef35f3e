use super::helpers;
use super::FormatSlot;
use crate::constants::{
    FILL_LIGHT_DIR, FILL_LIGHT_INTENSITY, HEMI_GROUND, HEMI_INTENSITY, HEMI_SKY, KEY_LIGHT_DIR,
    KEY_LIGHT_INTENSITY, TONE_EXPOSURE,
};
use crate::core::model::{CpuMesh, MeshVertex};
use crate::core::{EnvironmentManager, SceneState, ENV_TEXTURE_SIZE};
use wgpu::util::DeviceExt;

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub(crate) struct SceneUniforms {
    view_proj: [[f32; 4]; 4],
    eye: [f32; 4],
    hemi_sky: [f32; 4],
    hemi_ground: [f32; 4],
    key_light: [f32; 4],
    fill_light: [f32; 4],
    fog_color: [f32; 4],
    fog_params: [f32; 4],
}

impl SceneUniforms {
    pub(crate) fn from_scene(scene: &SceneState) -> Self {
        let [fog_color, fog_params] = scene.environment.current().fog.uniform();
        let fog_rgb = super::srgb_to_linear([fog_color[0], fog_color[1], fog_color[2]]);
        let eye = scene.camera.eye;
        Self {
            view_proj: scene.camera.view_projection().to_cols_array_2d(),
            eye: [eye.x, eye.y, eye.z, 1.0],
            hemi_sky: [HEMI_SKY[0], HEMI_SKY[1], HEMI_SKY[2], HEMI_INTENSITY],
            hemi_ground: [HEMI_GROUND[0], HEMI_GROUND[1], HEMI_GROUND[2], 0.0],
            key_light: [KEY_LIGHT_DIR[0], KEY_LIGHT_DIR[1], KEY_LIGHT_DIR[2], KEY_LIGHT_INTENSITY],
            fill_light: [
                FILL_LIGHT_DIR[0],
                FILL_LIGHT_DIR[1],
                FILL_LIGHT_DIR[2],
                FILL_LIGHT_INTENSITY,
            ],
            fog_color: [fog_rgb[0], fog_rgb[1], fog_rgb[2], fog_color[3]],
            fog_params: [fog_params[0], fog_params[1], fog_params[2], TONE_EXPOSURE],
        }
    }
}

struct MeshBuffers {
    vertex: wgpu::Buffer,
    index: wgpu::Buffer,
    index_count: u32,
}

pub(crate) struct SceneResources {
    bgl: wgpu::BindGroupLayout,
    pub(crate) uniform_buffer: wgpu::Buffer,
    env_sampler: wgpu::Sampler,
    bind_group: wgpu::BindGroup,
    env_generation: Option<u64>,
    pipelines: [wgpu::RenderPipeline; 2],
    mesh: Option<MeshBuffers>,
}

pub(crate) fn create_scene_resources(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    env: &EnvironmentManager,
    swap_format: wgpu::TextureFormat,
) -> SceneResources {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("scene_shader"),
        source: wgpu::ShaderSource::Wgsl(crate::core::SCENE_WGSL.into()),
    });
    let bgl = helpers::texture_uniform_layout(
        device,
        "scene_bgl0",
        0,
        wgpu::ShaderStages::VERTEX_FRAGMENT,
    );
    let uniform_buffer =
        helpers::uniform_buffer(device, "scene_uniforms", std::mem::size_of::<SceneUniforms>());
    let env_sampler = helpers::linear_sampler(device, "env_sampler", wgpu::AddressMode::Repeat);
    let (_, env_view) = helpers::upload_rgba_texture(
        device,
        queue,
        "env_tex",
        ENV_TEXTURE_SIZE,
        &env.current().pixels,
    );
    let bind_group = helpers::texture_uniform_bind_group(
        device,
        "scene_bg0",
        &bgl,
        0,
        &env_view,
        &env_sampler,
        &uniform_buffer,
    );
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("pl_scene"),
        bind_group_layouts: &[&bgl],
        push_constant_ranges: &[],
    });
    let pipelines = [
        make_scene_pipeline(device, &layout, &shader, helpers::HDR_FORMAT),
        make_scene_pipeline(device, &layout, &shader, swap_format),
    ];
    SceneResources {
        bgl,
        uniform_buffer,
        env_sampler,
        bind_group,
        env_generation: Some(env.generation()),
        pipelines,
        mesh: None,
    }
}

fn make_scene_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    const ATTRS: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x4];
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("scene_pipeline"),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<MeshVertex>() as u64,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &ATTRS,
            }],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        primitive: wgpu::PrimitiveState {
            cull_mode: None,
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: helpers::DEPTH_FORMAT,
            depth_write_enabled: true,
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
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        cache: None,
        multiview: None,
    })
}

impl SceneResources {
    pub(crate) fn set_mesh(&mut self, device: &wgpu::Device, mesh: &CpuMesh) {
        let vertex = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("head_vertices"),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("head_indices"),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        self.mesh = Some(MeshBuffers {
            vertex,
            index,
            index_count: mesh.indices.len() as u32,
        });
    }

    /// Re-upload the environment map when the preset changed.
    pub(crate) fn sync_environment(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        env: &EnvironmentManager,
    ) -> bool {
        if self.env_generation == Some(env.generation()) {
            return false;
        }
        let (_, view) = helpers::upload_rgba_texture(
            device,
            queue,
            "env_tex",
            ENV_TEXTURE_SIZE,
            &env.current().pixels,
        );
        self.bind_group = helpers::texture_uniform_bind_group(
            device,
            "scene_bg0",
            &self.bgl,
            0,
            &view,
            &self.env_sampler,
            &self.uniform_buffer,
        );
        self.env_generation = Some(env.generation());
        log::info!("[environment] uploaded '{}'", env.current_environment());
        true
    }

    pub(crate) fn draw(&self, rpass: &mut wgpu::RenderPass<'_>, slot: FormatSlot) {
        let Some(mesh) = &self.mesh else {
            return;
        };
        rpass.set_pipeline(&self.pipelines[slot as usize]);
        rpass.set_bind_group(0, &self.bind_group, &[]);
        rpass.set_vertex_buffer(0, mesh.vertex.slice(..));
        rpass.set_index_buffer(mesh.index.slice(..), wgpu::IndexFormat::Uint32);
        rpass.draw_indexed(0..mesh.index_count, 0, 0..1);
    }
}
