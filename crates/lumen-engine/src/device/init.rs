/// Parameters for bringing up the GPU layer.
#[derive(Debug, Clone)]
pub struct GpuInit {
    /// Ask for an sRGB swapchain.
    ///
    /// Off by default: the scene shader gamma-corrects with a configurable
    /// exponent and an sRGB surface would encode twice.
    pub prefer_srgb: bool,

    /// Swap behaviour. FIFO is available everywhere.
    pub present_mode: wgpu::PresentMode,

    /// Preferred alpha mode; replaced by a supported one when unavailable.
    pub alpha_mode: Option<wgpu::CompositeAlphaMode>,

    pub required_features: wgpu::Features,
    pub required_limits: wgpu::Limits,

    /// Latency hint for the surface.
    pub desired_maximum_frame_latency: u32,
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            prefer_srgb: false,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: None,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            desired_maximum_frame_latency: 2,
        }
    }
}
