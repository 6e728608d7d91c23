/// One acquired swapchain image plus the encoder recording into it.
///
/// Consumed by [`Gpu::submit`](super::Gpu::submit); a frame must not be held
/// across iterations of the loop.
pub struct GpuFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
}
