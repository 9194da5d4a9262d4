use super::CapabilityLevel;

/// Number of presentable images and frame slots (triple buffering).
pub const FRAME_COUNT: usize = 3;

/// Presentation surface parameters.
#[derive(Debug, Clone)]
pub struct SurfaceInit {
    /// Formats tried in order before falling back to the surface's first
    /// supported format.
    pub preferred_formats: Vec<wgpu::TextureFormat>,
}

impl Default for SurfaceInit {
    fn default() -> Self {
        Self {
            preferred_formats: vec![
                wgpu::TextureFormat::Rgba8Unorm,
                wgpu::TextureFormat::Bgra8Unorm,
            ],
        }
    }
}

/// Initialization parameters for the GPU layer.
///
/// Keep this structure stable and minimal. Add configuration flags only when a
/// concrete platform or backend requirement exists.
#[derive(Debug, Clone)]
pub struct GpuInit {
    /// Backends the instance may enumerate adapters from.
    pub backends: wgpu::Backends,

    /// Minimum capability level an adapter must meet to be selected.
    pub capability: CapabilityLevel,

    /// Presentation surface configuration.
    pub surface: SurfaceInit,

    /// Sync interval passed to every present; 1 waits for vertical blank.
    pub sync_interval: u32,

    /// Color the back buffer is cleared to each frame.
    pub clear_color: [f32; 4],
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            backends: wgpu::Backends::from_env().unwrap_or(wgpu::Backends::all()),
            capability: CapabilityLevel::Downlevel,
            surface: SurfaceInit::default(),
            sync_interval: 1,
            clear_color: [0.0, 0.2, 0.4, 1.0],
        }
    }
}
