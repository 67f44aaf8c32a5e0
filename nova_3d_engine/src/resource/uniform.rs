//! Uniform blocks: host-visible buffers holding one `#[repr(C)]` struct
//!
//! Layouts match the std140 blocks declared by the shaders.

use std::marker::PhantomData;
use std::sync::Arc;
use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use crate::error::Result;
use crate::graphics_device::{
    Buffer, BufferDesc, BufferDescriptorInfo, BufferUsage, GraphicsDevice, MemoryProperties,
};

/// Vertex-stage model transform (binding 0)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct TransformUniform {
    pub world: Mat4,
    pub mvp: Mat4,
}

impl TransformUniform {
    /// `projection * view * world`
    pub fn new(world: Mat4, view: Mat4, projection: Mat4) -> Self {
        Self {
            world,
            mvp: projection * view * world,
        }
    }
}

impl Default for TransformUniform {
    fn default() -> Self {
        Self {
            world: Mat4::IDENTITY,
            mvp: Mat4::IDENTITY,
        }
    }
}

/// Fragment-stage material scalars (geometry pass binding 3)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct MaterialUniform {
    pub specular_strength: f32,
    pub shininess: f32,
    pub padding: [f32; 2],
}

impl MaterialUniform {
    pub fn new(specular_strength: f32, shininess: f32) -> Self {
        Self {
            specular_strength,
            shininess,
            padding: [0.0; 2],
        }
    }
}

const _: () = assert!(std::mem::size_of::<TransformUniform>() == 128);
const _: () = assert!(std::mem::size_of::<MaterialUniform>() == 16);

/// Host-visible + host-coherent buffer sized for one `T`
///
/// No staging: `update` maps, copies and unmaps directly. Writes must happen
/// before the frame that reads them is submitted.
pub struct UniformBlock<T: Pod> {
    buffer: Arc<dyn Buffer>,
    size: u64,
    info: BufferDescriptorInfo,
    _value: PhantomData<fn() -> T>,
}

impl<T: Pod> UniformBlock<T> {
    /// Create the buffer and write `initial`
    pub fn new(device: &dyn GraphicsDevice, initial: &T) -> Result<Self> {
        let size = std::mem::size_of::<T>() as u64;
        let buffer = device.create_buffer(&BufferDesc {
            size,
            usage: BufferUsage::UNIFORM,
            memory: MemoryProperties::HOST_VISIBLE | MemoryProperties::HOST_COHERENT,
        })?;
        buffer.write(0, bytemuck::bytes_of(initial))?;
        let info = BufferDescriptorInfo {
            buffer: buffer.clone(),
            offset: 0,
            range: size,
        };
        Ok(Self {
            buffer,
            size,
            info,
            _value: PhantomData,
        })
    }

    /// Copy `value` into the buffer
    pub fn update(&self, value: &T) -> Result<()> {
        self.buffer.write(0, bytemuck::bytes_of(value))
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn buffer(&self) -> &Arc<dyn Buffer> {
        &self.buffer
    }

    /// Buffer + offset + range for descriptor writes
    pub fn descriptor_info(&self) -> &BufferDescriptorInfo {
        &self.info
    }
}

#[cfg(test)]
#[path = "uniform_tests.rs"]
mod tests;
