//! GPU device management.
//!
//! This module is responsible for:
//! - selecting a hardware adapter at a requested capability level
//! - creating the wgpu Device/Queue and tracking device loss
//! - the fault type shared by the frame protocol

mod error;
mod gpu;
mod init;
mod select;

pub use error::GpuFault;
pub use gpu::Gpu;
pub use init::{FRAME_COUNT, GpuInit, SurfaceInit};
pub use select::{AdapterProbe, AdapterSummary, CapabilityLevel, select_adapter};
