use anyhow::{Context, Result};
use winit::window::Window;

use crate::device::{FRAME_COUNT, Gpu, GpuFault, GpuInit};
use crate::frame::{FrameDesc, FrameLoop};
use crate::present::PresentationSurface;
use crate::render::{Geometry, Pipeline, PipelineDesc, QUAD_INDICES, QUAD_VERTICES, WgpuExecutor};
use crate::sync::{PacingStats, WgpuFence};
use crate::time::FrameTime;

type SurfaceFrameLoop<'w> =
    FrameLoop<WgpuExecutor, WgpuFence, PresentationSurface<'w>, FRAME_COUNT>;

/// Triple-buffered renderer drawing one indexed quad per frame.
///
/// Field order is drop order: the frame loop drains and releases the surface
/// before the device owner goes away.
pub struct QuadApp<'w> {
    frames: SurfaceFrameLoop<'w>,
    gpu: Gpu,

    first_slot: usize,
    last_frame: u64,
}

impl<'w> QuadApp<'w> {
    /// Builds every GPU object for `window` and drains the setup work.
    pub fn init(window: &'w Window, init: &GpuInit) -> Result<Self> {
        let size = window.inner_size();
        anyhow::ensure!(size.width > 0 && size.height > 0, "window has zero size");

        let instance = Gpu::create_instance(init);

        // Surface lifetime is tied to `window` via `'w`.
        let surface = instance
            .create_surface(window)
            .context("failed to create wgpu surface")?;

        let gpu = pollster::block_on(Gpu::new(instance, &surface, init))?;

        let presentation = PresentationSurface::create(
            surface,
            &gpu,
            size,
            FRAME_COUNT,
            &init.surface,
            init.sync_interval,
        )
        .context("failed to configure presentation surface")?;

        let pipeline = Pipeline::build(gpu.device(), &PipelineDesc::quad(), presentation.format());

        let (geometry, staging) =
            Geometry::upload(gpu.device(), gpu.queue(), &QUAD_VERTICES, &QUAD_INDICES)
                .context("failed to upload quad geometry")?;

        let desc = FrameDesc::new(
            size.width,
            size.height,
            init.clear_color,
            geometry.vertex_view(),
            geometry.index_view(),
        );

        let executor = WgpuExecutor::new(
            gpu.device().clone(),
            gpu.queue().clone(),
            pipeline,
            geometry,
        );

        let mut frames = FrameLoop::new(
            executor,
            presentation,
            gpu.create_fence(),
            desc,
            init.sync_interval,
        )
        .context("failed to assemble frame loop")?;

        let first_slot = frames.start().context("initial GPU drain failed")?;

        // The copy has retired; upload buffers are no longer read.
        log::debug!("releasing {} bytes of upload buffers", staging.size());
        drop(staging);

        Ok(Self {
            frames,
            gpu,
            first_slot,
            last_frame: 0,
        })
    }

    /// Slot of the first frame after setup.
    pub fn first_slot(&self) -> usize {
        self.first_slot
    }

    /// Per-frame bookkeeping. Nothing in the scene animates.
    pub fn update(&mut self, time: &FrameTime) {
        self.last_frame = time.frame_index;
    }

    /// Renders into `slot` and returns the slot for the next frame.
    pub fn render(&mut self, slot: usize) -> Result<usize, GpuFault> {
        self.frames.render(slot)
    }

    /// Waits for all GPU work; GPU objects are released when `self` drops.
    pub fn destroy(&mut self) -> Result<(), GpuFault> {
        self.frames.shutdown()?;
        let stats = self.frames.stats();
        log::info!(
            "renderer drained after {} frames ({} blocking waits, last frame index {})",
            stats.frames,
            stats.stalls,
            self.last_frame
        );
        Ok(())
    }

    pub fn gpu(&self) -> &Gpu {
        &self.gpu
    }

    pub fn pacing_stats(&self) -> PacingStats {
        self.frames.stats()
    }

    /// Frames submitted but not yet retired by the GPU.
    pub fn in_flight(&self) -> u64 {
        self.frames.synchronizer().in_flight()
    }
}
