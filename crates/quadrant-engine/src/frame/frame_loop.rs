use crate::device::GpuFault;
use crate::present::SwapChain;
use crate::sync::{Fence, FrameSynchronizer, PacingStats};

use super::command::CommandBatch;
use super::recorder::{FrameDesc, record_frame};
use super::slot::{FramePool, FrameSlot};

/// Consumer of closed command batches.
pub trait ExecutionQueue {
    /// Render target handle, shared with the swap chain.
    type Image;

    /// Submits `batch` for execution against `image`. Work is executed in
    /// submission order.
    fn execute(&mut self, batch: &CommandBatch<'_>, image: &Self::Image) -> Result<(), GpuFault>;
}

/// The per-frame protocol: wait for the slot, record, submit, present, signal.
///
/// Owns the frame pool and the synchronizer. The slot index for the next
/// frame is threaded through `render` rather than cached, so a caller always
/// renders into the slot that `begin_frame` last cleared.
pub struct FrameLoop<Q, F, S, const N: usize>
where
    Q: ExecutionQueue<Image = S::Image>,
    F: Fence,
    S: SwapChain,
{
    queue: Q,
    swapchain: S,
    sync: FrameSynchronizer<F>,
    pool: FramePool<N>,
    desc: FrameDesc,
    sync_interval: u32,

    /// No submission since the last full drain.
    drained: bool,
}

impl<Q, F, S, const N: usize> FrameLoop<Q, F, S, N>
where
    Q: ExecutionQueue<Image = S::Image>,
    F: Fence,
    S: SwapChain,
{
    pub fn new(
        queue: Q,
        swapchain: S,
        fence: F,
        desc: FrameDesc,
        sync_interval: u32,
    ) -> Result<Self, GpuFault> {
        let images = swapchain.image_count();
        if images != N {
            return Err(GpuFault::ImageCountMismatch { images, slots: N });
        }

        Ok(Self {
            queue,
            swapchain,
            sync: FrameSynchronizer::new(fence),
            pool: FramePool::new(),
            desc,
            sync_interval,
            drained: false,
        })
    }

    /// Drains setup work and returns the slot of the first frame.
    pub fn start(&mut self) -> Result<usize, GpuFault> {
        self.sync.drain_all()?;
        self.drained = true;

        let first = self.swapchain.current_index();
        self.sync.begin_frame(self.pool.slot(first)?)?;
        log::debug!("frame loop started on slot {first}");
        Ok(first)
    }

    /// Renders one frame from `slot` and returns the slot for the next one.
    pub fn render(&mut self, slot: usize) -> Result<usize, GpuFault> {
        debug_assert_eq!(slot, self.swapchain.current_index());

        let completed = self.sync.completed_value();
        let frame = self.pool.slot_mut(slot)?;
        let target = frame.image();
        let batch = record_frame(frame.begin_recording(completed)?, &self.desc, target);

        let image = self.swapchain.acquire()?;
        self.queue.execute(&batch, image)?;
        self.drained = false;

        self.swapchain.present(self.sync_interval)?;

        let frame = self.pool.slot_mut(slot)?;
        self.sync.end_frame(frame)?;

        let next = self.swapchain.current_index();
        self.sync.begin_frame(self.pool.slot(next)?)?;
        Ok(next)
    }

    /// Waits for every submitted frame to retire.
    pub fn shutdown(&mut self) -> Result<u64, GpuFault> {
        let value = self.sync.drain_all()?;
        self.drained = true;
        log::info!("frame loop drained at fence value {value}");
        Ok(value)
    }

    pub fn set_sync_interval(&mut self, sync_interval: u32) {
        self.sync_interval = sync_interval;
    }

    pub fn sync_interval(&self) -> u32 {
        self.sync_interval
    }

    pub fn stats(&self) -> PacingStats {
        self.sync.stats()
    }

    pub fn synchronizer(&self) -> &FrameSynchronizer<F> {
        &self.sync
    }

    pub fn slot(&self, index: usize) -> Result<&FrameSlot, GpuFault> {
        self.pool.slot(index)
    }

    pub fn pool(&self) -> &FramePool<N> {
        &self.pool
    }

    pub fn queue(&self) -> &Q {
        &self.queue
    }

    pub fn swapchain(&self) -> &S {
        &self.swapchain
    }
}

impl<Q, F, S, const N: usize> Drop for FrameLoop<Q, F, S, N>
where
    Q: ExecutionQueue<Image = S::Image>,
    F: Fence,
    S: SwapChain,
{
    fn drop(&mut self) {
        if self.drained {
            return;
        }
        if let Err(err) = self.sync.drain_all() {
            log::warn!("frame loop dropped without draining: {err}");
        }
    }
}
