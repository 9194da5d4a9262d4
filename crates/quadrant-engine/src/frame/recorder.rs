use super::command::{
    CommandBatch, DrawIndexed, ImageId, ImageState, IndexBufferView, RecordingContext,
    ScissorRect, VertexBufferView, Viewport,
};

/// Frame state that is identical every frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameDesc {
    pub viewport: Viewport,
    pub scissor: ScissorRect,
    pub clear_color: [f32; 4],
    pub topology: wgpu::PrimitiveTopology,
    pub vertices: VertexBufferView,
    pub indices: IndexBufferView,
}

impl FrameDesc {
    /// Full-target viewport and scissor over a `width` x `height` image.
    pub fn new(
        width: u32,
        height: u32,
        clear_color: [f32; 4],
        vertices: VertexBufferView,
        indices: IndexBufferView,
    ) -> Self {
        Self {
            viewport: Viewport::full(width, height),
            scissor: ScissorRect::full(width, height),
            clear_color,
            topology: wgpu::PrimitiveTopology::TriangleList,
            vertices,
            indices,
        }
    }
}

/// Records one self-contained frame into `ctx` and closes it.
///
/// The target image enters and leaves the batch in the `Present` state.
pub fn record_frame<'a>(
    mut ctx: RecordingContext<'a>,
    desc: &FrameDesc,
    target: ImageId,
) -> CommandBatch<'a> {
    ctx.set_binding_layout();
    ctx.set_viewport(desc.viewport);
    ctx.set_scissor(desc.scissor);

    ctx.transition(target, ImageState::Present, ImageState::RenderTarget);

    ctx.set_render_target(target);
    ctx.clear(target, desc.clear_color);

    ctx.set_topology(desc.topology);
    ctx.set_vertex_buffer(desc.vertices);
    ctx.set_index_buffer(desc.indices);
    ctx.draw_indexed(DrawIndexed {
        index_count: desc.indices.index_count(),
        instance_count: 1,
        first_index: 0,
        base_vertex: 0,
        first_instance: 0,
    });

    ctx.transition(target, ImageState::RenderTarget, ImageState::Present);

    ctx.close()
}
