//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and the single window, and drives the renderer.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig};
