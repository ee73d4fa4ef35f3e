use super::helpers;

/// Offscreen ping-pong pair for the post chain plus the shared depth buffer.
///
/// `a`/`b` are full-resolution `Rgba16Float` colour targets. The scene pass
/// always writes `a`; effect passes alternate between them.
pub(crate) struct RenderTargets {
    pub(crate) a: wgpu::Texture,
    pub(crate) a_view: wgpu::TextureView,
    pub(crate) b: wgpu::Texture,
    pub(crate) b_view: wgpu::TextureView,
    pub(crate) depth: wgpu::Texture,
    pub(crate) depth_view: wgpu::TextureView,
}

impl RenderTargets {
    pub(crate) fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let (a, a_view) = color_target(device, "post_target_a", width, height);
        let (b, b_view) = color_target(device, "post_target_b", width, height);
        let (depth, depth_view) = helpers::create_depth_texture(device, width, height);
        Self {
            a,
            a_view,
            b,
            b_view,
            depth,
            depth_view,
        }
    }

    pub(crate) fn recreate(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        *self = Self::new(device, width, height);
    }

    pub(crate) fn view(&self, target: crate::core::Target) -> Option<&wgpu::TextureView> {
        match target {
            crate::core::Target::A => Some(&self.a_view),
            crate::core::Target::B => Some(&self.b_view),
            crate::core::Target::Screen => None,
        }
    }
}

fn color_target(
    device: &wgpu::Device,
    label: &str,
    width: u32,
    height: u32,
) -> (wgpu::Texture, wgpu::TextureView) {
    helpers::create_color_texture_device(
        device,
        label,
        width,
        height,
        helpers::HDR_FORMAT,
        wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
    )
}
