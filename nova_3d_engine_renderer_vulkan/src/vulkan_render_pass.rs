/// RenderPass - Vulkan implementation of the engine RenderPass trait

use nova_3d_engine::nova3d::render::{RenderPass as EngineRenderPass, RenderPassDesc};
use ash::vk;
use std::any::Any;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;

/// vk::RenderPass plus the descriptor it was built from
pub struct RenderPass {
    ctx: Arc<GpuContext>,
    pub(crate) render_pass: vk::RenderPass,
    desc: RenderPassDesc,
}

impl RenderPass {
    pub(crate) fn new(ctx: Arc<GpuContext>, render_pass: vk::RenderPass, desc: RenderPassDesc) -> Self {
        Self { ctx, render_pass, desc }
    }
}

impl EngineRenderPass for RenderPass {
    fn desc(&self) -> &RenderPassDesc {
        &self.desc
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for RenderPass {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_render_pass(self.render_pass, None);
        }
    }
}
