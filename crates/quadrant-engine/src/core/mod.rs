//! The renderer driven by the window runtime.

mod app;

pub use app::QuadApp;
