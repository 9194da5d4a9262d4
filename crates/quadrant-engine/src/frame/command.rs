//! Backend-neutral command stream.
//!
//! A frame is recorded as a flat list of `Command`s into storage owned by its
//! frame slot, then closed into an immutable `CommandBatch` that an execution
//! queue translates for the GPU.

/// Rasterizer viewport in pixels.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

impl Viewport {
    /// Full-target viewport with the default depth range.
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: width as f32,
            height: height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }
}

/// Clip rectangle in pixels; fragments outside it are discarded.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ScissorRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl ScissorRect {
    pub fn full(width: u32, height: u32) -> Self {
        Self { x: 0, y: 0, width, height }
    }
}

/// Index of a presentable image in the swap chain.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ImageId(pub usize);

/// Usage state of a presentable image.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ImageState {
    Present,
    RenderTarget,
}

/// Vertex buffer binding: byte range plus per-vertex stride.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct VertexBufferView {
    pub offset: u64,
    pub stride: u64,
    pub size: u64,
}

impl VertexBufferView {
    pub fn vertex_count(&self) -> u64 {
        if self.stride == 0 { 0 } else { self.size / self.stride }
    }
}

/// Index buffer binding: byte range plus element format.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct IndexBufferView {
    pub offset: u64,
    pub format: wgpu::IndexFormat,
    pub size: u64,
}

impl IndexBufferView {
    pub fn index_count(&self) -> u32 {
        let width = match self.format {
            wgpu::IndexFormat::Uint16 => 2,
            wgpu::IndexFormat::Uint32 => 4,
        };
        (self.size / width) as u32
    }
}

/// Arguments of an indexed, instanced draw.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct DrawIndexed {
    pub index_count: u32,
    pub instance_count: u32,
    pub first_index: u32,
    pub base_vertex: i32,
    pub first_instance: u32,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Command {
    /// Initial pipeline state; always the first command of a batch.
    SetPipeline,
    SetBindingLayout,
    SetViewport(Viewport),
    SetScissor(ScissorRect),
    Transition {
        image: ImageId,
        before: ImageState,
        after: ImageState,
    },
    SetRenderTarget(ImageId),
    Clear {
        image: ImageId,
        color: [f32; 4],
    },
    SetTopology(wgpu::PrimitiveTopology),
    SetVertexBuffer(VertexBufferView),
    SetIndexBuffer(IndexBufferView),
    DrawIndexed(DrawIndexed),
}

/// Command storage owned by one frame slot.
///
/// Resetting keeps the capacity, so steady-state recording does not allocate.
#[derive(Debug, Default)]
pub struct CommandAllocator {
    commands: Vec<Command>,
    resets: u64,
}

impl CommandAllocator {
    pub(crate) fn reset(&mut self) -> RecordingContext<'_> {
        self.commands.clear();
        self.resets += 1;
        self.commands.push(Command::SetPipeline);
        RecordingContext {
            commands: &mut self.commands,
        }
    }

    /// Number of times this storage has been reset for a new frame.
    pub fn resets(&self) -> u64 {
        self.resets
    }

    pub fn capacity(&self) -> usize {
        self.commands.capacity()
    }
}

/// Open recording context borrowing a slot's allocator.
#[derive(Debug)]
pub struct RecordingContext<'a> {
    commands: &'a mut Vec<Command>,
}

impl<'a> RecordingContext<'a> {
    pub fn set_binding_layout(&mut self) {
        self.commands.push(Command::SetBindingLayout);
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.commands.push(Command::SetViewport(viewport));
    }

    pub fn set_scissor(&mut self, scissor: ScissorRect) {
        self.commands.push(Command::SetScissor(scissor));
    }

    pub fn transition(&mut self, image: ImageId, before: ImageState, after: ImageState) {
        self.commands.push(Command::Transition { image, before, after });
    }

    pub fn set_render_target(&mut self, image: ImageId) {
        self.commands.push(Command::SetRenderTarget(image));
    }

    pub fn clear(&mut self, image: ImageId, color: [f32; 4]) {
        self.commands.push(Command::Clear { image, color });
    }

    pub fn set_topology(&mut self, topology: wgpu::PrimitiveTopology) {
        self.commands.push(Command::SetTopology(topology));
    }

    pub fn set_vertex_buffer(&mut self, view: VertexBufferView) {
        self.commands.push(Command::SetVertexBuffer(view));
    }

    pub fn set_index_buffer(&mut self, view: IndexBufferView) {
        self.commands.push(Command::SetIndexBuffer(view));
    }

    pub fn draw_indexed(&mut self, draw: DrawIndexed) {
        self.commands.push(Command::DrawIndexed(draw));
    }

    /// Finalizes the recording into an immutable batch.
    pub fn close(self) -> CommandBatch<'a> {
        let commands: &'a Vec<Command> = self.commands;
        CommandBatch {
            commands: commands.as_slice(),
        }
    }
}

/// Closed, submittable recording. Borrows the slot's allocator until submitted.
#[derive(Debug, Copy, Clone)]
pub struct CommandBatch<'a> {
    commands: &'a [Command],
}

impl<'a> CommandBatch<'a> {
    pub fn commands(&self) -> &'a [Command] {
        self.commands
    }

    pub fn draws(&self) -> impl Iterator<Item = &'a DrawIndexed> + 'a {
        self.commands.iter().filter_map(|cmd| match cmd {
            Command::DrawIndexed(draw) => Some(draw),
            _ => None,
        })
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
