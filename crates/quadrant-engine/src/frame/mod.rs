//! Frame recording and the per-frame protocol.
//!
//! - `command`: backend-neutral command stream and per-slot storage
//! - `slot`: frame slots and the fixed pool indexed by presentable image
//! - `recorder`: records the fixed clear + quad frame
//! - `frame_loop`: paces recording against the GPU through the fence

pub mod command;
mod frame_loop;
mod recorder;
mod slot;

pub use command::{
    Command, CommandAllocator, CommandBatch, DrawIndexed, ImageId, ImageState, IndexBufferView,
    RecordingContext, ScissorRect, VertexBufferView, Viewport,
};
pub use frame_loop::{ExecutionQueue, FrameLoop};
pub use recorder::{FrameDesc, record_frame};
pub use slot::{FramePool, FrameSlot};
