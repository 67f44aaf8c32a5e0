//! Mesh: uploaded geometry plus, for skinned meshes, a fragment-stage
//! material uniform

use std::io::Read;
use crate::error::Result;
use crate::graphics_device::{BufferDescriptorInfo, CommandList, GraphicsDevice};
use crate::log::LogSink;
use crate::resource::geometry::{Geometry, MeshVertex, SkinnedVertex, StaticVertex};
use crate::resource::material::Material;
use crate::resource::uniform::{MaterialUniform, UniformBlock};

/// Fields drop in declaration order: uniform before geometry
pub struct Mesh<V: MeshVertex> {
    material_uniform: Option<UniformBlock<MaterialUniform>>,
    geometry: Geometry<V>,
}

pub type StaticMesh = Mesh<StaticVertex>;
pub type SkinnedMesh = Mesh<SkinnedVertex>;

impl<V: MeshVertex> Mesh<V> {
    /// Wrap uploaded geometry, creating the material uniform when the
    /// variant has one
    pub fn new(device: &dyn GraphicsDevice, geometry: Geometry<V>) -> Result<Self> {
        let material_uniform = if V::HAS_MATERIAL_UNIFORM {
            Some(UniformBlock::new(device, &MaterialUniform::default())?)
        } else {
            None
        };
        Ok(Self { material_uniform, geometry })
    }

    /// Read one mesh record's geometry and upload it
    pub fn from_reader<R: Read>(device: &dyn GraphicsDevice, logger: &LogSink, reader: &mut R) -> Result<Self> {
        let geometry = Geometry::from_reader(device, logger, reader)?;
        Self::new(device, geometry)
    }

    /// Copy the material scalars into the material uniform
    ///
    /// Must run before the descriptor rewrite and draw of the frame. No-op for
    /// variants without a material uniform.
    pub fn update_uniform_buffer(&self, material: &Material) -> Result<()> {
        match &self.material_uniform {
            Some(block) => block.update(&material.uniform()),
            None => Ok(()),
        }
    }

    pub fn material_buffer_info(&self) -> Option<&BufferDescriptorInfo> {
        self.material_uniform.as_ref().map(|block| block.descriptor_info())
    }

    pub fn geometry(&self) -> &Geometry<V> {
        &self.geometry
    }

    pub fn render(&self, cmd: &mut dyn CommandList) -> Result<()> {
        self.geometry.render(cmd)
    }
}

#[cfg(test)]
#[path = "mesh_tests.rs"]
mod tests;
