//! GPU geometry: device-local vertex and index buffers with their counts
//!
//! Two vertex variants share the same upload and draw path:
//! - `StaticVertex`: position + color
//! - `SkinnedVertex`: position, normal, uv, bone weights and bone ids
//!
//! Both buffers are immutable after upload and are drawn with one indexed
//! draw using 32-bit indices.

use std::io::Read;
use std::marker::PhantomData;
use std::sync::Arc;
use bytemuck::{Pod, Zeroable};
use crate::asset::read_geometry_data;
use crate::engine_trace;
use crate::error::{Error, Result};
use crate::graphics_device::{
    Buffer, BufferFormat, BufferUsage, CommandList, GraphicsDevice, IndexType, VertexAttribute,
    VertexLayout,
};
use crate::log::LogSink;
use crate::resource::staging::StagedUpload;

// ============================================================================
// VERTEX VARIANTS
// ============================================================================

/// Vertex type storable in a `Geometry`
pub trait MeshVertex: Pod {
    /// Whether meshes of this variant carry a fragment material uniform
    const HAS_MATERIAL_UNIFORM: bool;

    /// Pipeline vertex input layout
    fn layout() -> VertexLayout;
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct StaticVertex {
    pub position: [f32; 4],
    pub color: [f32; 4],
}

impl MeshVertex for StaticVertex {
    const HAS_MATERIAL_UNIFORM: bool = false;

    fn layout() -> VertexLayout {
        VertexLayout {
            stride: std::mem::size_of::<Self>() as u32,
            attributes: vec![
                VertexAttribute { location: 0, format: BufferFormat::R32G32B32A32_SFLOAT, offset: 0 },
                VertexAttribute { location: 1, format: BufferFormat::R32G32B32A32_SFLOAT, offset: 16 },
            ],
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct SkinnedVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
    pub bone_weights: [f32; 4],
    pub bone_ids: [u32; 4],
}

impl MeshVertex for SkinnedVertex {
    const HAS_MATERIAL_UNIFORM: bool = true;

    fn layout() -> VertexLayout {
        VertexLayout {
            stride: std::mem::size_of::<Self>() as u32,
            attributes: vec![
                VertexAttribute { location: 0, format: BufferFormat::R32G32B32_SFLOAT, offset: 0 },
                VertexAttribute { location: 1, format: BufferFormat::R32G32B32_SFLOAT, offset: 12 },
                VertexAttribute { location: 2, format: BufferFormat::R32G32_SFLOAT, offset: 24 },
                VertexAttribute { location: 3, format: BufferFormat::R32G32B32A32_SFLOAT, offset: 32 },
                VertexAttribute { location: 4, format: BufferFormat::R32G32B32A32_UINT, offset: 48 },
            ],
        }
    }
}

const _: () = assert!(std::mem::size_of::<StaticVertex>() == 32);
const _: () = assert!(std::mem::size_of::<SkinnedVertex>() == 64);

// ============================================================================
// GEOMETRY
// ============================================================================

pub struct Geometry<V: MeshVertex> {
    vertex_buffer: Arc<dyn Buffer>,
    index_buffer: Arc<dyn Buffer>,
    vertex_count: u32,
    index_count: u32,
    _vertex: PhantomData<fn() -> V>,
}

pub type StaticGeometry = Geometry<StaticVertex>;
pub type SkinnedGeometry = Geometry<SkinnedVertex>;

impl<V: MeshVertex> Geometry<V> {
    /// Upload vertices and indices in one staged submission
    pub fn from_data(
        device: &dyn GraphicsDevice,
        logger: &LogSink,
        vertices: &[V],
        indices: &[u32],
    ) -> Result<Self> {
        if vertices.is_empty() || indices.is_empty() {
            return Err(Error::InvalidResource(format!(
                "geometry needs vertices and indices (got {} and {})",
                vertices.len(),
                indices.len()
            )));
        }

        let mut upload = StagedUpload::batch(device, logger);
        let vertex_buffer = upload.stage(bytemuck::cast_slice(vertices), BufferUsage::VERTEX)?;
        let index_buffer = upload.stage(bytemuck::cast_slice(indices), BufferUsage::INDEX)?;
        upload.submit()?;

        engine_trace!(
            logger,
            "nova3d::Geometry",
            "Uploaded {} vertices ({} bytes each), {} indices",
            vertices.len(),
            std::mem::size_of::<V>(),
            indices.len()
        );

        Ok(Self {
            vertex_buffer,
            index_buffer,
            vertex_count: vertices.len() as u32,
            index_count: indices.len() as u32,
            _vertex: PhantomData,
        })
    }

    /// Read `[vertex count][index count][vertices][indices]` and upload
    pub fn from_reader<R: Read>(device: &dyn GraphicsDevice, logger: &LogSink, reader: &mut R) -> Result<Self> {
        let (vertices, indices) = read_geometry_data::<V, R>(reader)?;
        Self::from_data(device, logger, &vertices, &indices)
    }

    /// Bind both buffers and issue one indexed draw
    pub fn render(&self, cmd: &mut dyn CommandList) -> Result<()> {
        cmd.bind_vertex_buffer(&self.vertex_buffer, 0)?;
        cmd.bind_index_buffer(&self.index_buffer, 0, IndexType::U32)?;
        cmd.draw_indexed(self.index_count, 1, 0, 0, 0)
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    pub fn vertex_buffer(&self) -> &Arc<dyn Buffer> {
        &self.vertex_buffer
    }

    pub fn index_buffer(&self) -> &Arc<dyn Buffer> {
        &self.index_buffer
    }
}

#[cfg(test)]
#[path = "geometry_tests.rs"]
mod tests;
