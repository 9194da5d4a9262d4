use crate::device::GpuFault;
use crate::frame::FrameSlot;

use super::Fence;

/// How `begin_frame` got hold of its slot.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SlotWait {
    /// The slot's previous work had already retired.
    Ready,
    /// The CPU blocked until the slot's previous work retired.
    Blocked,
}

/// Counters describing how often the CPU had to wait on the GPU.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct PacingStats {
    /// Frames whose completion target was scheduled with `end_frame`.
    pub frames: u64,
    /// `begin_frame` calls that blocked.
    pub stalls: u64,
    /// Full drains performed.
    pub drains: u64,
}

/// Paces the CPU against the GPU with a single monotonic fence.
///
/// Each frame slot remembers the fence value that has to be reached before its
/// allocator may be reset. `begin_frame` is the only steady-state blocking
/// point; `drain_all` is the stop-the-world wait used at startup and shutdown.
pub struct FrameSynchronizer<F: Fence> {
    fence: F,
    /// Next value to schedule; always one past the last scheduled value.
    next_value: u64,
    stats: PacingStats,
}

impl<F: Fence> FrameSynchronizer<F> {
    pub fn new(fence: F) -> Self {
        let next_value = fence.completed_value() + 1;
        Self {
            fence,
            next_value,
            stats: PacingStats::default(),
        }
    }

    /// Schedules a signal and blocks until the GPU reaches it.
    ///
    /// Returns the value waited on. Afterwards every submitted batch has retired.
    pub fn drain_all(&mut self) -> Result<u64, GpuFault> {
        let target = self.next_value;
        self.fence.signal(target)?;
        self.next_value += 1;
        self.fence.wait_until(target)?;
        self.stats.drains += 1;
        log::debug!("drained GPU timeline at fence value {target}");
        Ok(target)
    }

    /// Blocks until the GPU has finished the work last recorded into `slot`.
    pub fn begin_frame(&mut self, slot: &FrameSlot) -> Result<SlotWait, GpuFault> {
        let required = slot.required_completion_value();
        if self.fence.completed_value() >= required {
            return Ok(SlotWait::Ready);
        }

        log::trace!(
            "slot {} waits for fence value {required} ({} in flight)",
            slot.index(),
            self.in_flight()
        );
        self.fence.wait_until(required)?;
        self.stats.stalls += 1;
        Ok(SlotWait::Blocked)
    }

    /// Schedules the completion target for the batch just submitted from `slot`.
    ///
    /// Returns the value the slot now waits on before its next reuse.
    pub fn end_frame(&mut self, slot: &mut FrameSlot) -> Result<u64, GpuFault> {
        let fence_to_signal = self.next_value;
        self.fence.signal(fence_to_signal)?;
        self.next_value += 1;
        slot.set_required_completion_value(fence_to_signal);
        self.stats.frames += 1;
        Ok(fence_to_signal)
    }

    pub fn completed_value(&self) -> u64 {
        self.fence.completed_value()
    }

    pub fn next_value(&self) -> u64 {
        self.next_value
    }

    /// Highest value scheduled so far (0 before the first signal).
    pub fn last_scheduled(&self) -> u64 {
        self.next_value - 1
    }

    /// Scheduled signals the GPU has not reached yet.
    pub fn in_flight(&self) -> u64 {
        self.last_scheduled()
            .saturating_sub(self.fence.completed_value())
    }

    pub fn stats(&self) -> PacingStats {
        self.stats
    }

    pub fn fence(&self) -> &F {
        &self.fence
    }
}
