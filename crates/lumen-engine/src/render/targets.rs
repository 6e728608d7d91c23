use super::RenderCtx;

/// Color format of the offscreen scene image.
pub(super) const SCENE_COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
pub(super) const DEPTH_STENCIL_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24PlusStencil8;

/// Offscreen attachments the scene pass draws into and the post pass reads.
///
/// Recreated whenever the drawable size changes; `generation` lets
/// dependants rebuild bind groups that reference the old views.
#[derive(Default)]
pub(super) struct FrameTargets {
    size: (u32, u32),
    generation: u64,

    color: Option<wgpu::Texture>,
    color_view: Option<wgpu::TextureView>,
    depth: Option<wgpu::Texture>,
    depth_view: Option<wgpu::TextureView>,
}

impl FrameTargets {
    pub(super) fn ensure(&mut self, ctx: &RenderCtx<'_>) {
        let size = (ctx.size.0.max(1), ctx.size.1.max(1));
        if self.size == size && self.color_view.is_some() && self.depth_view.is_some() {
            return;
        }

        self.release();

        let extent = wgpu::Extent3d {
            width: size.0,
            height: size.1,
            depth_or_array_layers: 1,
        };

        let color = ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("lumen scene color"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: SCENE_COLOR_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });

        let depth = ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("lumen scene depth/stencil"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_STENCIL_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });

        self.color_view = Some(color.create_view(&wgpu::TextureViewDescriptor::default()));
        self.depth_view = Some(depth.create_view(&wgpu::TextureViewDescriptor::default()));
        self.color = Some(color);
        self.depth = Some(depth);
        self.size = size;
        self.generation += 1;

        log::debug!("frame targets recreated at {}x{}", size.0, size.1);
    }

    #[inline]
    pub(super) fn generation(&self) -> u64 {
        self.generation
    }

    #[inline]
    pub(super) fn color_view(&self) -> Option<&wgpu::TextureView> {
        self.color_view.as_ref()
    }

    #[inline]
    pub(super) fn depth_view(&self) -> Option<&wgpu::TextureView> {
        self.depth_view.as_ref()
    }

    fn release(&mut self) {
        self.color_view = None;
        self.depth_view = None;
        if let Some(t) = self.color.take() {
            t.destroy();
        }
        if let Some(t) = self.depth.take() {
            t.destroy();
        }
    }
}

impl Drop for FrameTargets {
    fn drop(&mut self) {
        self.release();
    }
}
