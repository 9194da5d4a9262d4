use crate::device::GpuFault;

use super::command::{CommandAllocator, ImageId, RecordingContext};

/// Per-frame-in-flight resources.
///
/// The allocator is exclusively the CPU's between `begin_frame` and
/// submission, and the GPU's from submission until the fence reaches
/// `required_completion_value`.
#[derive(Debug)]
pub struct FrameSlot {
    index: usize,
    image: ImageId,
    allocator: CommandAllocator,
    required_completion_value: u64,
}

impl FrameSlot {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            image: ImageId(index),
            allocator: CommandAllocator::default(),
            required_completion_value: 0,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Presentable image this slot records into.
    pub fn image(&self) -> ImageId {
        self.image
    }

    pub fn allocator(&self) -> &CommandAllocator {
        &self.allocator
    }

    /// Fence value that has to be reached before this slot may be reused.
    pub fn required_completion_value(&self) -> u64 {
        self.required_completion_value
    }

    pub(crate) fn set_required_completion_value(&mut self, value: u64) {
        debug_assert!(value >= self.required_completion_value);
        self.required_completion_value = self.required_completion_value.max(value);
    }

    /// Resets the allocator and opens a recording against the shared pipeline.
    ///
    /// `completed` is the fence's completed value; resetting before the GPU
    /// retired this slot's last batch is refused.
    pub fn begin_recording(&mut self, completed: u64) -> Result<RecordingContext<'_>, GpuFault> {
        if completed < self.required_completion_value {
            return Err(GpuFault::AllocatorInUse {
                slot: self.index,
                required: self.required_completion_value,
                completed,
            });
        }
        Ok(self.allocator.reset())
    }
}

/// Fixed ring of frame slots, indexed by presentable image.
#[derive(Debug)]
pub struct FramePool<const N: usize> {
    slots: [FrameSlot; N],
}

impl<const N: usize> FramePool<N> {
    pub fn new() -> Self {
        Self {
            slots: std::array::from_fn(FrameSlot::new),
        }
    }

    pub const fn len(&self) -> usize {
        N
    }

    pub const fn is_empty(&self) -> bool {
        N == 0
    }

    pub fn slot(&self, index: usize) -> Result<&FrameSlot, GpuFault> {
        self.slots
            .get(index)
            .ok_or(GpuFault::SlotOutOfRange { index, count: N })
    }

    pub fn slot_mut(&mut self, index: usize) -> Result<&mut FrameSlot, GpuFault> {
        self.slots
            .get_mut(index)
            .ok_or(GpuFault::SlotOutOfRange { index, count: N })
    }

    pub fn iter(&self) -> impl Iterator<Item = &FrameSlot> {
        self.slots.iter()
    }
}

impl<const N: usize> Default for FramePool<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_slots_map_to_matching_images() {
        let pool = FramePool::<3>::new();
        let images: Vec<_> = pool.iter().map(|s| s.image()).collect();
        assert_eq!(images, vec![ImageId(0), ImageId(1), ImageId(2)]);
        assert!(pool.iter().all(|s| s.required_completion_value() == 0));
    }

    #[test]
    fn out_of_range_slot_is_rejected() {
        let mut pool = FramePool::<3>::new();
        assert!(matches!(
            pool.slot(3),
            Err(GpuFault::SlotOutOfRange { index: 3, count: 3 })
        ));
        assert!(pool.slot_mut(7).is_err());
    }

    #[test]
    fn recording_refused_while_gpu_may_read_allocator() {
        let mut slot = FrameSlot::new(1);
        slot.set_required_completion_value(5);

        let err = slot.begin_recording(4).unwrap_err();
        assert!(matches!(
            err,
            GpuFault::AllocatorInUse { slot: 1, required: 5, completed: 4 }
        ));
        assert_eq!(slot.allocator().resets(), 0);

        assert!(slot.begin_recording(5).is_ok());
        assert_eq!(slot.allocator().resets(), 1);
    }

    #[test]
    fn required_value_never_decreases() {
        let mut slot = FrameSlot::new(0);
        slot.set_required_completion_value(7);
        slot.set_required_completion_value(9);
        assert_eq!(slot.required_completion_value(), 9);
    }
}
