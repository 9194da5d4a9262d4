//! Time subsystem.
//!
//! - one `FrameClock` per render loop
//! - call `tick()` once per presented frame to obtain `FrameTime`
//! - `take_report()` yields throughput once per reporting interval

mod frame_clock;

pub use frame_clock::{FrameClock, FrameReport, FrameTime};
