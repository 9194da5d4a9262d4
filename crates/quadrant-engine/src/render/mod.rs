//! GPU rendering subsystem.
//!
//! Everything here consumes the backend-neutral frame stream and owns the
//! wgpu resources it refers to: the quad pipeline, the device-local geometry,
//! and the executor that turns batches into submissions.

mod execute;
mod geometry;
mod pipeline;

pub use execute::WgpuExecutor;
pub use geometry::{Geometry, QUAD_INDICES, QUAD_VERTICES, StagingUpload, Vertex};
pub use pipeline::{Pipeline, PipelineDesc};
