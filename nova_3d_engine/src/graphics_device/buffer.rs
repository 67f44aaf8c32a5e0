/// Buffer trait, usage/memory flags and buffer descriptor

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use bitflags::bitflags;
use crate::error::Result;

bitflags! {
    /// How a buffer is used by the GPU
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BufferUsage: u32 {
        /// Source of a transfer (staging buffers)
        const TRANSFER_SRC = 1 << 0;
        /// Destination of a transfer (device-local targets)
        const TRANSFER_DST = 1 << 1;
        /// Uniform buffer
        const UNIFORM = 1 << 2;
        /// Index buffer
        const INDEX = 1 << 3;
        /// Vertex buffer
        const VERTEX = 1 << 4;
    }
}

bitflags! {
    /// Memory properties a buffer allocation must satisfy
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MemoryProperties: u32 {
        /// Fast GPU memory, not host accessible
        const DEVICE_LOCAL = 1 << 0;
        /// Mappable by the host
        const HOST_VISIBLE = 1 << 1;
        /// Host writes visible without explicit flush
        const HOST_COHERENT = 1 << 2;
    }
}

/// Descriptor for creating a buffer
#[derive(Debug, Clone, Copy)]
pub struct BufferDesc {
    /// Size in bytes
    pub size: u64,
    /// Buffer usage
    pub usage: BufferUsage,
    /// Required memory properties
    pub memory: MemoryProperties,
}

/// GPU buffer with its backing allocation
///
/// Memory is bound at creation. Dropping the buffer frees the allocation and
/// then destroys the buffer handle.
pub trait Buffer: Send + Sync {
    /// Size in bytes
    fn size(&self) -> u64;

    /// Usage flags the buffer was created with
    fn usage(&self) -> BufferUsage;

    /// Memory properties of the backing allocation
    fn memory_properties(&self) -> MemoryProperties;

    /// Copy `data` into the buffer at `offset` (map, copy, unmap)
    ///
    /// Only valid for host-visible buffers.
    fn write(&self, offset: u64, data: &[u8]) -> Result<()>;

    /// Downcast support for backends
    fn as_any(&self) -> &dyn Any;
}

/// Buffer range as seen by a descriptor (buffer + offset + range)
#[derive(Clone)]
pub struct BufferDescriptorInfo {
    pub buffer: Arc<dyn Buffer>,
    pub offset: u64,
    pub range: u64,
}

impl BufferDescriptorInfo {
    /// Range covering the whole buffer
    pub fn whole(buffer: Arc<dyn Buffer>) -> Self {
        let range = buffer.size();
        Self { buffer, offset: 0, range }
    }
}

impl fmt::Debug for BufferDescriptorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferDescriptorInfo")
            .field("offset", &self.offset)
            .field("range", &self.range)
            .finish_non_exhaustive()
    }
}
