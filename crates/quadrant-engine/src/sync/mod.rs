//! CPU/GPU synchronization.
//!
//! A single monotonic fence orders all GPU work:
//! - `Fence` abstracts the signal/wait primitive
//! - `FrameSynchronizer` paces frame slots against it

mod fence;
mod pacing;

pub use fence::{Fence, WgpuFence};
pub use pacing::{FrameSynchronizer, PacingStats, SlotWait};
