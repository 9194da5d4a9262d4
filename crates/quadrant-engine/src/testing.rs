//! In-process doubles for the fence, execution queue and swap chain.

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::device::GpuFault;
use crate::frame::{Command, CommandBatch, ExecutionQueue};
use crate::present::SwapChain;
use crate::sync::Fence;

#[derive(Default)]
struct Timeline {
    completed: u64,
    scheduled: VecDeque<u64>,
    last_scheduled: u64,
    lost: Option<String>,
    blocked_waits: u64,
    stop: bool,
}

struct Shared {
    state: Mutex<Timeline>,
    cond: Condvar,
    /// Signals complete as soon as they are scheduled.
    instant: bool,
}

impl Shared {
    fn new(instant: bool) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(Timeline::default()),
            cond: Condvar::new(),
            instant,
        })
    }

    fn lock(&self) -> MutexGuard<'_, Timeline> {
        self.state.lock().unwrap()
    }
}

/// Fence whose GPU side is driven by a `SimGpu` handle or completes instantly.
pub(crate) struct SimFence {
    shared: Arc<Shared>,
}

impl SimFence {
    pub(crate) fn instant() -> Self {
        Self { shared: Shared::new(true) }
    }

    pub(crate) fn deferred() -> (Self, SimGpu) {
        let shared = Shared::new(false);
        (Self { shared: Arc::clone(&shared) }, SimGpu { shared })
    }

    /// Number of `wait_until` calls that actually had to sleep.
    pub(crate) fn blocked_waits(&self) -> u64 {
        self.shared.lock().blocked_waits
    }
}

impl Fence for SimFence {
    fn signal(&self, value: u64) -> Result<(), GpuFault> {
        let mut tl = self.shared.lock();
        if let Some(reason) = &tl.lost {
            return Err(GpuFault::DeviceLost { reason: reason.clone() });
        }
        assert!(value > tl.last_scheduled, "fence values must increase");
        tl.last_scheduled = value;
        if self.shared.instant {
            tl.completed = value;
        } else {
            tl.scheduled.push_back(value);
        }
        self.shared.cond.notify_all();
        Ok(())
    }

    fn completed_value(&self) -> u64 {
        self.shared.lock().completed
    }

    fn wait_until(&self, value: u64) -> Result<(), GpuFault> {
        let mut tl = self.shared.lock();
        if value > tl.last_scheduled {
            return Err(GpuFault::UnscheduledWait {
                value,
                last_scheduled: tl.last_scheduled,
            });
        }
        if tl.completed < value {
            tl.blocked_waits += 1;
        }
        loop {
            if let Some(reason) = &tl.lost {
                return Err(GpuFault::DeviceLost { reason: reason.clone() });
            }
            if tl.completed >= value {
                return Ok(());
            }
            tl = self.shared.cond.wait(tl).unwrap();
        }
    }
}

/// GPU side of a deferred `SimFence`.
#[derive(Clone)]
pub(crate) struct SimGpu {
    shared: Arc<Shared>,
}

impl SimGpu {
    /// Retires the oldest scheduled signal. Returns its value.
    pub(crate) fn complete_next(&self) -> Option<u64> {
        let mut tl = self.shared.lock();
        let value = tl.scheduled.pop_front()?;
        tl.completed = tl.completed.max(value);
        self.shared.cond.notify_all();
        Some(value)
    }

    pub(crate) fn lose_device(&self, reason: &str) {
        self.shared.lock().lost = Some(reason.to_owned());
        self.shared.cond.notify_all();
    }

    /// Retires scheduled signals in order, one per `latency`, on a worker thread.
    pub(crate) fn run_with_latency(&self, latency: Duration) -> GpuWorker {
        let shared = Arc::clone(&self.shared);
        let handle = std::thread::spawn(move || {
            loop {
                let mut tl = shared.lock();
                while tl.scheduled.is_empty() && !tl.stop {
                    tl = shared.cond.wait(tl).unwrap();
                }
                if tl.stop {
                    return;
                }
                drop(tl);

                std::thread::sleep(latency);

                let mut tl = shared.lock();
                if let Some(value) = tl.scheduled.pop_front() {
                    tl.completed = tl.completed.max(value);
                }
                shared.cond.notify_all();
            }
        });
        GpuWorker {
            shared: Arc::clone(&self.shared),
            handle: Some(handle),
        }
    }
}

pub(crate) struct GpuWorker {
    shared: Arc<Shared>,
    handle: Option<JoinHandle<()>>,
}

impl GpuWorker {
    pub(crate) fn stop(mut self) {
        self.join();
    }

    fn join(&mut self) {
        self.shared.lock().stop = true;
        self.shared.cond.notify_all();
        if let Some(handle) = self.handle.take() {
            handle.join().unwrap();
        }
    }
}

impl Drop for GpuWorker {
    fn drop(&mut self) {
        self.join();
    }
}

/// Execution queue that keeps a copy of every batch it is handed.
#[derive(Default)]
pub(crate) struct SimQueue {
    pub(crate) executed: Vec<(Vec<Command>, usize)>,
}

impl ExecutionQueue for SimQueue {
    type Image = usize;

    fn execute(&mut self, batch: &CommandBatch<'_>, image: &usize) -> Result<(), GpuFault> {
        self.executed.push((batch.commands().to_vec(), *image));
        Ok(())
    }
}

/// Swap chain whose next index after each present can be scripted.
pub(crate) struct SimSwapChain {
    count: usize,
    current: usize,
    script: VecDeque<usize>,
    acquired: Option<usize>,
    pub(crate) presents: Vec<(usize, u32)>,
}

impl SimSwapChain {
    pub(crate) fn new(count: usize) -> Self {
        Self {
            count,
            current: 0,
            script: VecDeque::new(),
            acquired: None,
            presents: Vec::new(),
        }
    }

    /// Index reported after each of the next presents, in order.
    pub(crate) fn scripted(count: usize, order: impl IntoIterator<Item = usize>) -> Self {
        let mut chain = Self::new(count);
        chain.script = order.into_iter().collect();
        chain
    }
}

impl SwapChain for SimSwapChain {
    type Image = usize;

    fn image_count(&self) -> usize {
        self.count
    }

    fn current_index(&self) -> usize {
        self.current
    }

    fn acquire(&mut self) -> Result<&usize, GpuFault> {
        let current = self.current;
        Ok(self.acquired.insert(current))
    }

    fn present(&mut self, sync_interval: u32) -> Result<(), GpuFault> {
        let image = self.acquired.take().ok_or(GpuFault::NothingToPresent)?;
        self.presents.push((image, sync_interval));
        self.current = self
            .script
            .pop_front()
            .unwrap_or((self.current + 1) % self.count);
        Ok(())
    }
}
