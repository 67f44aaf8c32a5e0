/// Texture - Vulkan implementation of the engine Texture trait

use nova_3d_engine::nova3d::render::{Texture as EngineTexture, TextureFormat};
use ash::vk;
use gpu_allocator::vulkan::Allocation;
use std::any::Any;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;
use crate::vulkan_sampler::Sampler;

/// Sampled 2D image in SHADER_READ_ONLY_OPTIMAL layout
pub struct Texture {
    ctx: Arc<GpuContext>,
    pub(crate) image: vk::Image,
    pub(crate) view: vk::ImageView,
    pub(crate) sampler: Arc<Sampler>,
    allocation: Option<Allocation>,
    width: u32,
    height: u32,
    format: TextureFormat,
}

impl Texture {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        ctx: Arc<GpuContext>,
        image: vk::Image,
        view: vk::ImageView,
        sampler: Arc<Sampler>,
        allocation: Allocation,
        width: u32,
        height: u32,
        format: TextureFormat,
    ) -> Self {
        Self {
            ctx,
            image,
            view,
            sampler,
            allocation: Some(allocation),
            width,
            height,
            format,
        }
    }
}

impl EngineTexture for Texture {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn format(&self) -> TextureFormat {
        self.format
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_image_view(self.view, None);
            if let Some(allocation) = self.allocation.take() {
                self.ctx.free(allocation);
            }
            self.ctx.device.destroy_image(self.image, None);
        }
    }
}
