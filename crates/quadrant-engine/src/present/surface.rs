use anyhow::{Context, Result};
use winit::dpi::PhysicalSize;

use crate::device::{Gpu, GpuFault, SurfaceInit};

use super::SwapChain;

struct AcquiredImage {
    texture: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
}

/// Window surface configured as an N-image flip chain.
///
/// wgpu does not expose which back buffer an acquired texture is, so the
/// reported index walks the rotation in present order. Nothing downstream
/// relies on that order.
pub struct PresentationSurface<'w> {
    surface: wgpu::Surface<'w>,
    device: wgpu::Device,
    config: wgpu::SurfaceConfiguration,

    /// Present modes supported by this surface on the selected adapter.
    present_modes: Vec<wgpu::PresentMode>,

    image_count: usize,
    current: usize,
    acquired: Option<AcquiredImage>,
}

impl<'w> PresentationSurface<'w> {
    /// Configures `surface` for `image_count` render-target images.
    pub fn create(
        surface: wgpu::Surface<'w>,
        gpu: &Gpu,
        size: PhysicalSize<u32>,
        image_count: usize,
        init: &SurfaceInit,
        sync_interval: u32,
    ) -> Result<Self> {
        anyhow::ensure!(image_count >= 2, "a flip chain needs at least two images");
        anyhow::ensure!(size.width > 0 && size.height > 0, "surface has zero size");

        let caps = surface.get_capabilities(gpu.adapter());
        let format = choose_surface_format(&caps.formats, &init.preferred_formats)
            .context("no supported surface formats")?;
        anyhow::ensure!(
            caps.usages.contains(wgpu::TextureUsages::RENDER_ATTACHMENT),
            "surface images cannot be used as render targets"
        );

        let alpha_mode = if caps.alpha_modes.contains(&wgpu::CompositeAlphaMode::Opaque) {
            wgpu::CompositeAlphaMode::Opaque
        } else {
            caps.alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto)
        };

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width,
            height: size.height,
            present_mode: choose_present_mode(&caps.present_modes, sync_interval),
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: (image_count - 1) as u32,
        };

        surface.configure(gpu.device(), &config);

        log::info!(
            "surface configured: {}x{} {:?}, {:?}, {image_count} images",
            config.width,
            config.height,
            config.format,
            config.present_mode
        );

        Ok(Self {
            surface,
            device: gpu.device().clone(),
            config,
            present_modes: caps.present_modes,
            image_count,
            current: 0,
            acquired: None,
        })
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        PhysicalSize::new(self.config.width, self.config.height)
    }

    pub fn present_mode(&self) -> wgpu::PresentMode {
        self.config.present_mode
    }
}

impl SwapChain for PresentationSurface<'_> {
    type Image = wgpu::TextureView;

    fn image_count(&self) -> usize {
        self.image_count
    }

    fn current_index(&self) -> usize {
        self.current
    }

    fn acquire(&mut self) -> Result<&wgpu::TextureView, GpuFault> {
        let image = match self.acquired.take() {
            Some(image) => image,
            None => {
                let texture = self.surface.get_current_texture()?;
                if texture.suboptimal {
                    log::debug!("acquired suboptimal surface image");
                }
                let view = texture
                    .texture
                    .create_view(&wgpu::TextureViewDescriptor::default());
                AcquiredImage { texture, view }
            }
        };
        Ok(&self.acquired.insert(image).view)
    }

    /// A changed sync interval takes effect from the next acquired image.
    fn present(&mut self, sync_interval: u32) -> Result<(), GpuFault> {
        let AcquiredImage { texture, view } =
            self.acquired.take().ok_or(GpuFault::NothingToPresent)?;
        drop(view);
        texture.present();

        let mode = choose_present_mode(&self.present_modes, sync_interval);
        if mode != self.config.present_mode {
            log::debug!("present mode {:?} -> {mode:?}", self.config.present_mode);
            self.config.present_mode = mode;
            self.surface.configure(&self.device, &self.config);
        }

        self.current = (self.current + 1) % self.image_count;
        Ok(())
    }
}

/// Picks the first preferred format the surface supports, else its first format.
pub(crate) fn choose_surface_format(
    supported: &[wgpu::TextureFormat],
    preferred: &[wgpu::TextureFormat],
) -> Option<wgpu::TextureFormat> {
    preferred
        .iter()
        .copied()
        .find(|f| supported.contains(f))
        .or_else(|| supported.first().copied())
}

/// Interval 0 flips without waiting for vertical blank when the surface allows it.
pub(crate) fn choose_present_mode(
    supported: &[wgpu::PresentMode],
    sync_interval: u32,
) -> wgpu::PresentMode {
    if sync_interval == 0 {
        for mode in [wgpu::PresentMode::Immediate, wgpu::PresentMode::Mailbox] {
            if supported.contains(&mode) {
                return mode;
            }
        }
    }
    wgpu::PresentMode::Fifo
}
