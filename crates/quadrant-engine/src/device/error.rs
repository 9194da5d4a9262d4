use std::fmt;

/// Fault raised by the per-frame GPU protocol.
///
/// Every variant is fatal. Nothing in the engine retries after a fault; the
/// runtime logs it and shuts down.
#[derive(Debug)]
pub enum GpuFault {
    /// The device was removed or reset by the platform.
    DeviceLost { reason: String },

    /// The platform rejected a wait on the completion fence.
    WaitFailed { value: u64, message: String },

    /// A wait was requested for a fence value that no signal will ever reach.
    UnscheduledWait { value: u64, last_scheduled: u64 },

    /// A slot's allocator was reset while the GPU may still read from it.
    AllocatorInUse {
        slot: usize,
        required: u64,
        completed: u64,
    },

    /// A slot index outside the frame pool was requested.
    SlotOutOfRange { index: usize, count: usize },

    /// The swap chain and the frame pool disagree on the number of images.
    ImageCountMismatch { images: usize, slots: usize },

    /// A closed batch violated the recording protocol.
    InvalidBatch(&'static str),

    /// The presentation surface failed to hand out an image.
    Surface(wgpu::SurfaceError),

    /// `present` was called without an acquired image.
    NothingToPresent,
}

impl fmt::Display for GpuFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeviceLost { reason } => write!(f, "GPU device lost: {reason}"),
            Self::WaitFailed { value, message } => {
                write!(f, "waiting for fence value {value} failed: {message}")
            }
            Self::UnscheduledWait {
                value,
                last_scheduled,
            } => write!(
                f,
                "fence value {value} was never scheduled (last scheduled: {last_scheduled})"
            ),
            Self::AllocatorInUse {
                slot,
                required,
                completed,
            } => write!(
                f,
                "frame slot {slot} reset before GPU completion (needs {required}, completed {completed})"
            ),
            Self::SlotOutOfRange { index, count } => {
                write!(f, "frame slot {index} out of range (pool holds {count})")
            }
            Self::ImageCountMismatch { images, slots } => write!(
                f,
                "swap chain has {images} images but the frame pool holds {slots} slots"
            ),
            Self::InvalidBatch(why) => write!(f, "invalid command batch: {why}"),
            Self::Surface(err) => write!(f, "surface acquisition failed: {err}"),
            Self::NothingToPresent => write!(f, "present requested without an acquired image"),
        }
    }
}

impl std::error::Error for GpuFault {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Surface(err) => Some(err),
            _ => None,
        }
    }
}

impl From<wgpu::SurfaceError> for GpuFault {
    fn from(err: wgpu::SurfaceError) -> Self {
        Self::Surface(err)
    }
}
