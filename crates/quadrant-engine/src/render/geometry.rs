use anyhow::Result;
use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::frame::{IndexBufferView, VertexBufferView};

// ── vertex format ─────────────────────────────────────────────────────────

/// Position in clip space plus a linear RGBA color.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

impl Vertex {
    const ATTRS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
        0 => Float32x3, // position
        1 => Float32x4  // color
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

const GREEN: [f32; 4] = [0.0, 1.0, 0.0, 1.0];

pub const QUAD_VERTICES: [Vertex; 4] = [
    Vertex { position: [-0.5, 0.5, 0.0], color: GREEN },
    Vertex { position: [0.5, -0.5, 0.0], color: GREEN },
    Vertex { position: [-0.5, -0.5, 0.0], color: GREEN },
    Vertex { position: [0.5, 0.5, 0.0], color: GREEN },
];

/// Two clockwise triangles sharing the 0-1 diagonal.
pub const QUAD_INDICES: [u32; 6] = [0, 1, 2, 0, 3, 1];

// ── device buffers ────────────────────────────────────────────────────────

/// Device-local vertex and index buffers for one mesh.
pub struct Geometry {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    vertex_view: VertexBufferView,
    index_view: IndexBufferView,
}

/// Upload-side buffers of a pending copy.
///
/// Must be held until the copy has retired on the GPU.
pub struct StagingUpload {
    vertices: wgpu::Buffer,
    indices: wgpu::Buffer,
}

impl StagingUpload {
    pub fn size(&self) -> u64 {
        self.vertices.size() + self.indices.size()
    }
}

impl Geometry {
    /// Copies `vertices` and `indices` into device-local buffers through
    /// upload buffers and submits the copy.
    pub fn upload(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        vertices: &[Vertex],
        indices: &[u32],
    ) -> Result<(Self, StagingUpload)> {
        validate_mesh(vertices, indices)?;

        let vertex_view = vertex_view(vertices);
        let index_view = index_view(indices);

        let vertex_staging = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("quadrant vertex upload"),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::COPY_SRC,
        });
        let index_staging = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("quadrant index upload"),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::COPY_SRC,
        });

        let vertex_size = copy_size(vertex_view.size);
        let index_size = copy_size(index_view.size);

        let vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("quadrant vbo"),
            size: vertex_size,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let index_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("quadrant ibo"),
            size: index_size,
            usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("quadrant geometry upload"),
        });
        encoder.copy_buffer_to_buffer(&vertex_staging, 0, &vertex_buffer, 0, vertex_size);
        encoder.copy_buffer_to_buffer(&index_staging, 0, &index_buffer, 0, index_size);
        queue.submit(std::iter::once(encoder.finish()));

        log::debug!(
            "uploaded {} vertices / {} indices ({vertex_size} + {index_size} bytes)",
            vertices.len(),
            indices.len()
        );

        Ok((
            Self {
                vertex_buffer,
                index_buffer,
                vertex_view,
                index_view,
            },
            StagingUpload {
                vertices: vertex_staging,
                indices: index_staging,
            },
        ))
    }

    pub fn vertex_view(&self) -> VertexBufferView {
        self.vertex_view
    }

    pub fn index_view(&self) -> IndexBufferView {
        self.index_view
    }

    pub fn vertex_buffer(&self) -> &wgpu::Buffer {
        &self.vertex_buffer
    }

    pub fn index_buffer(&self) -> &wgpu::Buffer {
        &self.index_buffer
    }
}

fn validate_mesh(vertices: &[Vertex], indices: &[u32]) -> Result<()> {
    anyhow::ensure!(!vertices.is_empty(), "mesh has no vertices");
    anyhow::ensure!(!indices.is_empty(), "mesh has no indices");
    if let Some(bad) = indices.iter().find(|&&i| i as usize >= vertices.len()) {
        anyhow::bail!("index {bad} out of range for {} vertices", vertices.len());
    }
    Ok(())
}

fn vertex_view(vertices: &[Vertex]) -> VertexBufferView {
    VertexBufferView {
        offset: 0,
        stride: std::mem::size_of::<Vertex>() as u64,
        size: std::mem::size_of_val(vertices) as u64,
    }
}

fn index_view(indices: &[u32]) -> IndexBufferView {
    IndexBufferView {
        offset: 0,
        format: wgpu::IndexFormat::Uint32,
        size: std::mem::size_of_val(indices) as u64,
    }
}

/// Buffer copies must be a multiple of `COPY_BUFFER_ALIGNMENT`.
fn copy_size(bytes: u64) -> u64 {
    wgpu::util::align_to(bytes, wgpu::COPY_BUFFER_ALIGNMENT)
}
