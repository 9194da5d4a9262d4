//! Quadrant engine crate.
//!
//! A triple-buffered renderer that paces the CPU against the GPU with a single
//! monotonic fence, plus the window runtime that drives it.

pub mod core;
pub mod device;
pub mod frame;
pub mod logging;
pub mod present;
pub mod render;
pub mod sync;
pub mod time;
pub mod window;

#[cfg(test)]
pub(crate) mod testing;
