/// Buffer - Vulkan implementation of the engine Buffer trait

use nova_3d_engine::nova3d::{Error, Result};
use nova_3d_engine::nova3d::render::{Buffer as EngineBuffer, BufferUsage, MemoryProperties};
use nova_3d_engine::engine_err;
use ash::vk;
use gpu_allocator::vulkan::Allocation;
use std::any::Any;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;

const SOURCE: &str = "nova3d::vulkan::Buffer";

/// Vulkan buffer with its gpu-allocator allocation
pub struct Buffer {
    ctx: Arc<GpuContext>,
    pub(crate) buffer: vk::Buffer,
    /// `None` only while dropping
    allocation: Option<Allocation>,
    size: u64,
    usage: BufferUsage,
    memory: MemoryProperties,
}

impl Buffer {
    pub(crate) fn new(
        ctx: Arc<GpuContext>,
        buffer: vk::Buffer,
        allocation: Allocation,
        size: u64,
        usage: BufferUsage,
        memory: MemoryProperties,
    ) -> Self {
        Self {
            ctx,
            buffer,
            allocation: Some(allocation),
            size,
            usage,
            memory,
        }
    }
}

impl EngineBuffer for Buffer {
    fn size(&self) -> u64 {
        self.size
    }

    fn usage(&self) -> BufferUsage {
        self.usage
    }

    fn memory_properties(&self) -> MemoryProperties {
        self.memory
    }

    fn write(&self, offset: u64, data: &[u8]) -> Result<()> {
        let end = offset
            .checked_add(data.len() as u64)
            .filter(|end| *end <= self.size)
            .ok_or_else(|| {
                Error::InvalidResource(format!(
                    "write of {} bytes at offset {} overflows a {}-byte buffer",
                    data.len(),
                    offset,
                    self.size
                ))
            })?;
        if !self.memory.contains(MemoryProperties::HOST_VISIBLE) {
            return Err(Error::InvalidResource(format!(
                "buffer with {:?} memory is not host-writable",
                self.memory
            )));
        }
        let allocation = self
            .allocation
            .as_ref()
            .ok_or_else(|| engine_err!(self.ctx.logger, SOURCE, "Buffer write failed: no GPU allocation"))?;
        let mapped = allocation
            .mapped_ptr()
            .ok_or_else(|| engine_err!(self.ctx.logger, SOURCE, "Buffer is not host-visible ({:?})", self.memory))?;

        // Allocations are persistently mapped; host-visible memory here is coherent
        unsafe {
            let dst = (mapped.as_ptr() as *mut u8).add(offset as usize);
            std::ptr::copy_nonoverlapping(data.as_ptr(), dst, (end - offset) as usize);
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        if let Some(allocation) = self.allocation.take() {
            self.ctx.free(allocation);
        }
        unsafe {
            self.ctx.device.destroy_buffer(self.buffer, None);
        }
    }
}
