use super::helpers;
use super::targets::RenderTargets;
use crate::core::{PassKind, PostChain, PostUniforms, ScheduledPass, Target};
use smallvec::SmallVec;

/// GPU side of the post chain. Rebuilt wholesale whenever the chain's
/// generation moves on (effect toggles) or the targets are resized.
pub(crate) struct PostResources {
    pub(crate) generation: u64,
    pub(crate) uniform_buffer: wgpu::Buffer,
    bgl: wgpu::BindGroupLayout,
    bg_read_a: wgpu::BindGroup,
    bg_read_b: wgpu::BindGroup,
    pipelines: SmallVec<[(PassKind, wgpu::RenderPipeline); 6]>,
    schedule: SmallVec<[ScheduledPass; 6]>,
}

pub(crate) fn create_post_resources(
    device: &wgpu::Device,
    shader: &wgpu::ShaderModule,
    targets: &RenderTargets,
    sampler: &wgpu::Sampler,
    chain: &PostChain,
    swap_format: wgpu::TextureFormat,
) -> PostResources {
    let bgl = helpers::texture_uniform_layout(device, "post_bgl0", 2, wgpu::ShaderStages::FRAGMENT);
    let uniform_buffer =
        helpers::uniform_buffer(device, "post_uniforms", std::mem::size_of::<PostUniforms>());
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("pl_post"),
        bind_group_layouts: &[&bgl],
        push_constant_ranges: &[],
    });
    let schedule = chain.schedule();
    let mut pipelines = SmallVec::new();
    for pass in &schedule {
        let Some(entry) = pass.kind.fragment_entry() else {
            continue;
        };
        let format = match pass.write {
            Target::Screen => swap_format,
            _ => helpers::HDR_FORMAT,
        };
        let blend = matches!(pass.write, Target::Screen).then_some(wgpu::BlendState::REPLACE);
        pipelines.push((
            pass.kind,
            helpers::make_post_pipeline(device, &layout, shader, entry, format, blend),
        ));
    }
    let (bg_read_a, bg_read_b) = read_bind_groups(device, &bgl, targets, sampler, &uniform_buffer);
    log::info!(
        "[post] built {} passes (generation {})",
        schedule.len(),
        chain.generation()
    );
    PostResources {
        generation: chain.generation(),
        uniform_buffer,
        bgl,
        bg_read_a,
        bg_read_b,
        pipelines,
        schedule,
    }
}

fn read_bind_groups(
    device: &wgpu::Device,
    bgl: &wgpu::BindGroupLayout,
    targets: &RenderTargets,
    sampler: &wgpu::Sampler,
    uniform: &wgpu::Buffer,
) -> (wgpu::BindGroup, wgpu::BindGroup) {
    let a = helpers::texture_uniform_bind_group(
        device,
        "bg_read_a",
        bgl,
        2,
        &targets.a_view,
        sampler,
        uniform,
    );
    let b = helpers::texture_uniform_bind_group(
        device,
        "bg_read_b",
        bgl,
        2,
        &targets.b_view,
        sampler,
        uniform,
    );
    (a, b)
}

impl PostResources {
    /// Target views changed: only the bind groups need to follow.
    pub(crate) fn rebind(
        &mut self,
        device: &wgpu::Device,
        targets: &RenderTargets,
        sampler: &wgpu::Sampler,
    ) {
        (self.bg_read_a, self.bg_read_b) =
            read_bind_groups(device, &self.bgl, targets, sampler, &self.uniform_buffer);
    }

    pub(crate) fn schedule(&self) -> &[ScheduledPass] {
        &self.schedule
    }

    pub(crate) fn pipeline(&self, kind: PassKind) -> Option<&wgpu::RenderPipeline> {
        self.pipelines
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, p)| p)
    }

    pub(crate) fn read_group(&self, target: Target) -> Option<&wgpu::BindGroup> {
        match target {
            Target::A => Some(&self.bg_read_a),
            Target::B => Some(&self.bg_read_b),
            Target::Screen => None,
        }
    }
}

pub(crate) fn blit(
    encoder: &mut wgpu::CommandEncoder,
    label: &str,
    target: &wgpu::TextureView,
    clear: wgpu::Color,
    pipeline: &wgpu::RenderPipeline,
    bg0: &wgpu::BindGroup,
) {
    let mut r = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: target,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(clear),
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
    });
    r.set_pipeline(pipeline);
    r.set_bind_group(0, bg0, &[]);
    r.draw(0..3, 0..1);
    drop(r);
}
