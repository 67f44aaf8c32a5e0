/// Framebuffer - Vulkan implementation of the engine Framebuffer trait
///
/// Keeps its attachments alive: the image views must outlive the
/// VkFramebuffer that references them.

use nova_3d_engine::nova3d::render::{Framebuffer as EngineFramebuffer, RenderTarget as EngineRenderTarget};
use ash::vk;
use std::any::Any;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;

pub struct Framebuffer {
    ctx: Arc<GpuContext>,
    pub(crate) framebuffer: vk::Framebuffer,
    width: u32,
    height: u32,
    /// Declared after the handle: dropped once it is destroyed
    _attachments: Vec<Arc<dyn EngineRenderTarget>>,
}

impl Framebuffer {
    pub(crate) fn new(
        ctx: Arc<GpuContext>,
        framebuffer: vk::Framebuffer,
        width: u32,
        height: u32,
        attachments: Vec<Arc<dyn EngineRenderTarget>>,
    ) -> Self {
        Self {
            ctx,
            framebuffer,
            width,
            height,
            _attachments: attachments,
        }
    }
}

impl EngineFramebuffer for Framebuffer {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for Framebuffer {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_framebuffer(self.framebuffer, None);
        }
    }
}
