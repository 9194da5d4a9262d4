//! Presentation.
//!
//! - `SwapChain` abstracts the rotating image set
//! - `PresentationSurface` implements it over a wgpu window surface

mod surface;
mod swapchain;

pub use surface::PresentationSurface;
pub use swapchain::SwapChain;
