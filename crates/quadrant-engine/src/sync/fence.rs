use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use crate::device::GpuFault;

/// Monotonic completion counter shared between the CPU and the GPU timeline.
///
/// The CPU only schedules signals; the completed value is advanced by the GPU
/// side as it retires work. Values passed to `signal` must be strictly
/// increasing.
pub trait Fence {
    /// Schedules `value` to be reached once all previously submitted work retires.
    fn signal(&self, value: u64) -> Result<(), GpuFault>;

    /// Highest value the GPU has reached so far.
    fn completed_value(&self) -> u64;

    /// Blocks the calling thread until `completed_value() >= value`.
    fn wait_until(&self, value: u64) -> Result<(), GpuFault>;
}

struct PendingSignal {
    value: u64,
    submission: wgpu::SubmissionIndex,
}

/// Fence over a wgpu queue.
///
/// A signal is an empty submission plus a work-done callback that raises the
/// shared completion cell. Waiting polls the device until the submission that
/// carries the requested value has retired.
pub struct WgpuFence {
    device: wgpu::Device,
    queue: wgpu::Queue,

    /// Written only from queue completion callbacks.
    completed: Arc<AtomicU64>,

    /// Set by the device-lost callback.
    lost: Arc<OnceLock<String>>,

    /// Signals not yet observed as complete, in submission order.
    pending: RefCell<VecDeque<PendingSignal>>,

    last_scheduled: Cell<u64>,
}

impl WgpuFence {
    pub(crate) fn new(
        device: wgpu::Device,
        queue: wgpu::Queue,
        lost: Arc<OnceLock<String>>,
    ) -> Self {
        Self {
            device,
            queue,
            completed: Arc::new(AtomicU64::new(0)),
            lost,
            pending: RefCell::new(VecDeque::new()),
            last_scheduled: Cell::new(0),
        }
    }

    fn check_device(&self) -> Result<(), GpuFault> {
        match self.lost.get() {
            Some(reason) => Err(GpuFault::DeviceLost {
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }

    fn retire(&self, completed: u64) {
        let mut pending = self.pending.borrow_mut();
        while pending.front().is_some_and(|p| p.value <= completed) {
            pending.pop_front();
        }
    }
}

impl Fence for WgpuFence {
    fn signal(&self, value: u64) -> Result<(), GpuFault> {
        self.check_device()?;
        debug_assert!(value > self.last_scheduled.get(), "fence values must increase");

        let submission = self.queue.submit(std::iter::empty());
        let completed = Arc::clone(&self.completed);
        self.queue.on_submitted_work_done(move || {
            completed.fetch_max(value, Ordering::AcqRel);
        });

        self.pending
            .borrow_mut()
            .push_back(PendingSignal { value, submission });
        self.last_scheduled.set(value);
        Ok(())
    }

    fn completed_value(&self) -> u64 {
        // Non-blocking; fires any work-done callbacks that are ready.
        if let Err(err) = self.device.poll(wgpu::PollType::Poll) {
            log::warn!("non-blocking device poll failed: {err}");
        }
        let completed = self.completed.load(Ordering::Acquire);
        self.retire(completed);
        completed
    }

    fn wait_until(&self, value: u64) -> Result<(), GpuFault> {
        self.check_device()?;
        if self.completed_value() >= value {
            return Ok(());
        }

        let submission = self
            .pending
            .borrow()
            .iter()
            .find(|p| p.value >= value)
            .map(|p| p.submission.clone())
            .ok_or(GpuFault::UnscheduledWait {
                value,
                last_scheduled: self.last_scheduled.get(),
            })?;

        self.device
            .poll(wgpu::PollType::Wait {
                submission_index: Some(submission),
                timeout: None,
            })
            .map_err(|err| GpuFault::WaitFailed {
                value,
                message: err.to_string(),
            })?;

        self.check_device()?;
        let completed = self.completed_value();
        if completed < value {
            return Err(GpuFault::WaitFailed {
                value,
                message: format!("device idle at fence value {completed}"),
            });
        }
        Ok(())
    }
}

impl Drop for WgpuFence {
    fn drop(&mut self) {
        let outstanding = self.pending.get_mut().len();
        if outstanding > 0 {
            log::warn!("fence released with {outstanding} signal(s) outstanding");
        } else {
            log::debug!(
                "fence released at value {}",
                self.completed.load(Ordering::Acquire)
            );
        }
    }
}
