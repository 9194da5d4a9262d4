//! Translation of closed command batches into wgpu submissions.
//!
//! A batch describes at most one render pass: it opens when the target moves
//! from `Present` to `RenderTarget` and is encoded when it moves back. wgpu
//! tracks resource states itself, so the transitions only delimit the pass.

use crate::device::GpuFault;
use crate::frame::{
    Command, CommandBatch, DrawIndexed, ExecutionQueue, ImageId, ImageState, IndexBufferView,
    ScissorRect, VertexBufferView, Viewport,
};

use super::geometry::Geometry;
use super::pipeline::Pipeline;

/// Render pass extracted from a batch.
#[derive(Debug, Clone, PartialEq)]
struct PassPlan {
    target: ImageId,
    clear: Option<[f32; 4]>,
    viewport: Viewport,
    scissor: ScissorRect,
    vertices: Option<VertexBufferView>,
    indices: Option<IndexBufferView>,
    draws: Vec<DrawIndexed>,
}

#[derive(Default)]
struct PlanState {
    viewport: Option<Viewport>,
    scissor: Option<ScissorRect>,
    topology: Option<wgpu::PrimitiveTopology>,
    vertices: Option<VertexBufferView>,
    indices: Option<IndexBufferView>,
    open: Option<ImageId>,
    target: Option<ImageId>,
    clear: Option<[f32; 4]>,
    draws: Vec<DrawIndexed>,
}

/// Checks the recording protocol and extracts the render pass.
///
/// `Ok(None)` means the batch never touched a render target.
fn plan_pass(
    commands: &[Command],
    topology: wgpu::PrimitiveTopology,
) -> Result<Option<PassPlan>, GpuFault> {
    if commands.first() != Some(&Command::SetPipeline) {
        return Err(GpuFault::InvalidBatch("batch does not start with pipeline state"));
    }

    let mut st = PlanState::default();
    let mut plan = None;

    for cmd in &commands[1..] {
        match *cmd {
            Command::SetPipeline => {
                return Err(GpuFault::InvalidBatch("pipeline state set twice"));
            }
            Command::SetBindingLayout => {}
            Command::SetViewport(v) => st.viewport = Some(v),
            Command::SetScissor(s) => st.scissor = Some(s),
            Command::SetTopology(t) => {
                if t != topology {
                    return Err(GpuFault::InvalidBatch("topology differs from pipeline"));
                }
                st.topology = Some(t);
            }
            Command::SetVertexBuffer(v) => st.vertices = Some(v),
            Command::SetIndexBuffer(i) => st.indices = Some(i),

            Command::Transition {
                image,
                before: ImageState::Present,
                after: ImageState::RenderTarget,
            } => {
                if st.open.is_some() || plan.is_some() {
                    return Err(GpuFault::InvalidBatch("more than one render pass"));
                }
                st.open = Some(image);
            }
            Command::Transition {
                image,
                before: ImageState::RenderTarget,
                after: ImageState::Present,
            } => {
                if st.open != Some(image) {
                    return Err(GpuFault::InvalidBatch("image returned to present without a pass"));
                }
                let target = st
                    .target
                    .ok_or(GpuFault::InvalidBatch("render pass without a render target"))?;
                let viewport = st
                    .viewport
                    .ok_or(GpuFault::InvalidBatch("render pass without a viewport"))?;
                let scissor = st
                    .scissor
                    .ok_or(GpuFault::InvalidBatch("render pass without a scissor rect"))?;

                st.open = None;
                plan = Some(PassPlan {
                    target,
                    clear: st.clear.take(),
                    viewport,
                    scissor,
                    vertices: st.vertices,
                    indices: st.indices,
                    draws: std::mem::take(&mut st.draws),
                });
            }
            Command::Transition { .. } => {
                return Err(GpuFault::InvalidBatch("transition to the same state"));
            }

            Command::SetRenderTarget(image) => {
                if st.open != Some(image) {
                    return Err(GpuFault::InvalidBatch("render target not in render-target state"));
                }
                st.target = Some(image);
            }
            Command::Clear { image, color } => {
                if st.target != Some(image) || st.open != Some(image) {
                    return Err(GpuFault::InvalidBatch("clear of an unbound render target"));
                }
                st.clear = Some(color);
            }
            Command::DrawIndexed(draw) => {
                if st.target.is_none() || st.open.is_none() {
                    return Err(GpuFault::InvalidBatch("draw outside a render pass"));
                }
                if st.topology.is_none() {
                    return Err(GpuFault::InvalidBatch("draw without a topology"));
                }
                let vertices = st
                    .vertices
                    .ok_or(GpuFault::InvalidBatch("draw without a vertex buffer"))?;
                let indices = st
                    .indices
                    .ok_or(GpuFault::InvalidBatch("draw without an index buffer"))?;
                if vertices.vertex_count() == 0 {
                    return Err(GpuFault::InvalidBatch("vertex buffer is empty"));
                }
                let end = u64::from(draw.first_index) + u64::from(draw.index_count);
                if end > u64::from(indices.index_count()) {
                    return Err(GpuFault::InvalidBatch("draw reads past the index buffer"));
                }
                st.draws.push(draw);
            }
        }
    }

    if st.open.is_some() {
        return Err(GpuFault::InvalidBatch("image left in render-target state"));
    }
    Ok(plan)
}

/// Execution queue over a wgpu device.
///
/// Owns the pipeline and the geometry the batches refer to.
pub struct WgpuExecutor {
    device: wgpu::Device,
    queue: wgpu::Queue,
    pipeline: Pipeline,
    geometry: Geometry,
    submitted: u64,
}

impl WgpuExecutor {
    pub fn new(
        device: wgpu::Device,
        queue: wgpu::Queue,
        pipeline: Pipeline,
        geometry: Geometry,
    ) -> Self {
        Self {
            device,
            queue,
            pipeline,
            geometry,
            submitted: 0,
        }
    }

    /// Batches submitted so far.
    pub fn submitted(&self) -> u64 {
        self.submitted
    }

    fn encode_pass(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        plan: &PassPlan,
        view: &wgpu::TextureView,
    ) {
        log::trace!("encoding pass into image {}", plan.target.0);

        let load = match plan.clear {
            Some([r, g, b, a]) => wgpu::LoadOp::Clear(wgpu::Color {
                r: r as f64,
                g: g as f64,
                b: b as f64,
                a: a as f64,
            }),
            None => wgpu::LoadOp::Load,
        };

        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("quadrant frame pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        if plan.draws.is_empty() {
            return;
        }

        let vp = plan.viewport;
        let sc = plan.scissor;
        rpass.set_pipeline(self.pipeline.raw());
        rpass.set_viewport(vp.x, vp.y, vp.width, vp.height, vp.min_depth, vp.max_depth);
        rpass.set_scissor_rect(sc.x, sc.y, sc.width, sc.height);

        if let Some(v) = plan.vertices {
            rpass.set_vertex_buffer(
                0,
                self.geometry.vertex_buffer().slice(v.offset..v.offset + v.size),
            );
        }
        if let Some(i) = plan.indices {
            rpass.set_index_buffer(
                self.geometry.index_buffer().slice(i.offset..i.offset + i.size),
                i.format,
            );
        }

        for draw in &plan.draws {
            rpass.draw_indexed(
                draw.first_index..draw.first_index + draw.index_count,
                draw.base_vertex,
                draw.first_instance..draw.first_instance + draw.instance_count,
            );
        }
    }
}

impl ExecutionQueue for WgpuExecutor {
    type Image = wgpu::TextureView;

    fn execute(
        &mut self,
        batch: &CommandBatch<'_>,
        image: &wgpu::TextureView,
    ) -> Result<(), GpuFault> {
        let plan = plan_pass(batch.commands(), self.pipeline.topology())?;

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("quadrant frame encoder"),
            });
        if let Some(plan) = &plan {
            self.encode_pass(&mut encoder, plan, image);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        self.submitted += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{FrameDesc, FrameSlot, record_frame};

    const TRIANGLES: wgpu::PrimitiveTopology = wgpu::PrimitiveTopology::TriangleList;

    fn quad_desc() -> FrameDesc {
        FrameDesc::new(
            320,
            240,
            [0.0, 0.2, 0.4, 1.0],
            VertexBufferView { offset: 0, stride: 28, size: 112 },
            IndexBufferView { offset: 0, format: wgpu::IndexFormat::Uint32, size: 24 },
        )
    }

    fn recorded(desc: &FrameDesc) -> Vec<Command> {
        let mut slot = FrameSlot::new(1);
        let batch = record_frame(slot.begin_recording(0).unwrap(), desc, ImageId(1));
        batch.commands().to_vec()
    }

    // ── accepted batches ──────────────────────────────────────────────────

    #[test]
    fn recorded_frame_plans_one_cleared_pass() {
        let desc = quad_desc();
        let plan = plan_pass(&recorded(&desc), TRIANGLES).unwrap().unwrap();

        assert_eq!(plan.target, ImageId(1));
        assert_eq!(plan.clear, Some([0.0, 0.2, 0.4, 1.0]));
        assert_eq!(plan.viewport, Viewport::full(320, 240));
        assert_eq!(plan.scissor, ScissorRect::full(320, 240));
        assert_eq!(plan.vertices, Some(desc.vertices));
        assert_eq!(plan.draws.len(), 1);
        assert_eq!(plan.draws[0].index_count, 6);
    }

    #[test]
    fn batch_without_pass_submits_nothing_to_draw() {
        let plan = plan_pass(&[Command::SetPipeline, Command::SetBindingLayout], TRIANGLES);
        assert_eq!(plan.unwrap(), None);
    }

    // ── rejected batches ──────────────────────────────────────────────────

    #[test]
    fn batch_must_open_with_pipeline_state() {
        let mut commands = recorded(&quad_desc());
        commands.remove(0);
        assert!(matches!(
            plan_pass(&commands, TRIANGLES),
            Err(GpuFault::InvalidBatch(_))
        ));
    }

    #[test]
    fn target_must_return_to_present() {
        let mut commands = recorded(&quad_desc());
        commands.pop();
        assert!(matches!(
            plan_pass(&commands, TRIANGLES),
            Err(GpuFault::InvalidBatch("image left in render-target state"))
        ));
    }

    #[test]
    fn draw_before_transition_is_rejected() {
        let desc = quad_desc();
        let commands = [
            Command::SetPipeline,
            Command::SetTopology(TRIANGLES),
            Command::SetVertexBuffer(desc.vertices),
            Command::SetIndexBuffer(desc.indices),
            Command::DrawIndexed(DrawIndexed {
                index_count: 6,
                instance_count: 1,
                first_index: 0,
                base_vertex: 0,
                first_instance: 0,
            }),
        ];
        assert!(matches!(
            plan_pass(&commands, TRIANGLES),
            Err(GpuFault::InvalidBatch("draw outside a render pass"))
        ));
    }

    #[test]
    fn draw_past_index_buffer_is_rejected() {
        let mut commands = recorded(&quad_desc());
        for cmd in &mut commands {
            if let Command::DrawIndexed(draw) = cmd {
                draw.first_index = 3;
            }
        }
        assert!(matches!(
            plan_pass(&commands, TRIANGLES),
            Err(GpuFault::InvalidBatch("draw reads past the index buffer"))
        ));
    }

    #[test]
    fn topology_must_match_pipeline() {
        let commands = recorded(&quad_desc());
        assert!(matches!(
            plan_pass(&commands, wgpu::PrimitiveTopology::LineList),
            Err(GpuFault::InvalidBatch("topology differs from pipeline"))
        ));
    }

    #[test]
    fn clear_requires_bound_target() {
        let commands = [
            Command::SetPipeline,
            Command::Transition {
                image: ImageId(0),
                before: ImageState::Present,
                after: ImageState::RenderTarget,
            },
            Command::Clear { image: ImageId(0), color: [0.0; 4] },
        ];
        assert!(matches!(
            plan_pass(&commands, TRIANGLES),
            Err(GpuFault::InvalidBatch("clear of an unbound render target"))
        ));
    }
}
