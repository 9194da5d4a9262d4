use super::geometry::Vertex;

const QUAD_SHADER: &str = include_str!("shaders/quad.wgsl");

/// Plain-data description of a render pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineDesc {
    pub label: &'static str,
    pub shader_source: &'static str,
    pub vertex_entry: &'static str,
    pub fragment_entry: &'static str,
    pub topology: wgpu::PrimitiveTopology,
    pub front_face: wgpu::FrontFace,
    pub cull_mode: Option<wgpu::Face>,
    pub blend: wgpu::BlendState,
}

impl PipelineDesc {
    /// Vertex-colored triangles, clockwise front faces, back faces culled,
    /// no blending.
    pub fn quad() -> Self {
        Self {
            label: "quadrant quad pipeline",
            shader_source: QUAD_SHADER,
            vertex_entry: "vs_main",
            fragment_entry: "fs_main",
            topology: wgpu::PrimitiveTopology::TriangleList,
            front_face: wgpu::FrontFace::Cw,
            cull_mode: Some(wgpu::Face::Back),
            blend: wgpu::BlendState::REPLACE,
        }
    }
}

/// Immutable pipeline every frame draws with.
///
/// No bind groups: vertex positions are already in clip space and colors come
/// from the vertex stream.
pub struct Pipeline {
    pipeline: wgpu::RenderPipeline,
    topology: wgpu::PrimitiveTopology,
    format: wgpu::TextureFormat,
}

impl Pipeline {
    pub fn build(device: &wgpu::Device, desc: &PipelineDesc, format: wgpu::TextureFormat) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(desc.label),
            source: wgpu::ShaderSource::Wgsl(desc.shader_source.into()),
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("quadrant pipeline layout"),
            bind_group_layouts: &[],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(desc.label),
            layout: Some(&layout),

            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some(desc.vertex_entry),
                compilation_options: Default::default(),
                buffers: &[Vertex::layout()],
            },

            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some(desc.fragment_entry),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(desc.blend),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: desc.topology,
                strip_index_format: None,
                front_face: desc.front_face,
                cull_mode: desc.cull_mode,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        log::debug!("{} built for {format:?}", desc.label);

        Self {
            pipeline,
            topology: desc.topology,
            format,
        }
    }

    pub fn raw(&self) -> &wgpu::RenderPipeline {
        &self.pipeline
    }

    /// Topology baked into the pipeline; batches may not select another.
    pub fn topology(&self) -> wgpu::PrimitiveTopology {
        self.topology
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quad_desc_entry_points_exist_in_shader() {
        let desc = PipelineDesc::quad();
        assert!(desc.shader_source.contains(&format!("fn {}(", desc.vertex_entry)));
        assert!(desc.shader_source.contains(&format!("fn {}(", desc.fragment_entry)));
    }

    #[test]
    fn shader_inputs_match_vertex_layout() {
        assert!(QUAD_SHADER.contains("@location(0) position: vec3<f32>"));
        assert!(QUAD_SHADER.contains("@location(1) color: vec4<f32>"));
    }

    #[test]
    fn quad_desc_culls_counter_clockwise_faces() {
        let desc = PipelineDesc::quad();
        assert_eq!(desc.front_face, wgpu::FrontFace::Cw);
        assert_eq!(desc.cull_mode, Some(wgpu::Face::Back));
        assert_eq!(desc.blend, wgpu::BlendState::REPLACE);
        assert_eq!(desc.topology, wgpu::PrimitiveTopology::TriangleList);
    }
}
