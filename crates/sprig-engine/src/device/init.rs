/// Device and surface creation parameters.
#[derive(Debug, Clone)]
pub struct GpuInit {
    /// Backends wgpu may choose from.
    pub backends: wgpu::Backends,

    pub power_preference: wgpu::PowerPreference,

    /// Pick an sRGB surface format when one is offered.
    ///
    /// Render targets share the surface format, so this also decides whether
    /// blending in the logical frame happens in linear space.
    pub prefer_srgb: bool,

    /// `Fifo` is the only mode every platform supports.
    pub present_mode: wgpu::PresentMode,

    /// Requested alpha mode; ignored when the surface does not support it.
    pub alpha_mode: Option<wgpu::CompositeAlphaMode>,

    pub required_features: wgpu::Features,
    pub required_limits: wgpu::Limits,

    /// Frame latency hint passed to the surface.
    pub desired_maximum_frame_latency: u32,
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            backends: wgpu::Backends::all(),
            power_preference: wgpu::PowerPreference::default(),
            prefer_srgb: true,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: None,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            desired_maximum_frame_latency: 2,
        }
    }
}
