use crate::device::GpuFault;

/// Rotating set of presentable images.
///
/// `current_index` is whatever the presentation mechanism reports and has to
/// be re-queried after every `present`; it is not guaranteed to advance by one.
pub trait SwapChain {
    /// Image handle handed to the execution queue as render target.
    type Image;

    fn image_count(&self) -> usize;

    /// Index of the image the CPU records into next.
    fn current_index(&self) -> usize;

    /// Returns the image at `current_index`, acquiring it on first use.
    fn acquire(&mut self) -> Result<&Self::Image, GpuFault>;

    /// Queues the acquired image for display and moves to the next one.
    fn present(&mut self, sync_interval: u32) -> Result<(), GpuFault>;
}
