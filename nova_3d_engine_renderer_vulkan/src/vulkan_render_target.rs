/// RenderTarget - Vulkan implementation of the engine RenderTarget trait
///
/// Either a view onto a swapchain image (the presentation engine owns the
/// image) or a depth buffer that owns its image and memory as well.

use nova_3d_engine::nova3d::render::{RenderTarget as EngineRenderTarget, TextureFormat};
use ash::vk;
use gpu_allocator::vulkan::Allocation;
use std::any::Any;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;

/// Image and memory owned by a depth target
struct OwnedImage {
    image: vk::Image,
    allocation: Allocation,
}

pub struct RenderTarget {
    ctx: Arc<GpuContext>,
    width: u32,
    height: u32,
    format: TextureFormat,
    pub(crate) image_view: vk::ImageView,
    owned: Option<OwnedImage>,
}

impl RenderTarget {
    /// View onto a swapchain image; only the view is destroyed on drop
    pub(crate) fn swapchain_image(
        ctx: Arc<GpuContext>,
        width: u32,
        height: u32,
        format: TextureFormat,
        image_view: vk::ImageView,
    ) -> Self {
        Self {
            ctx,
            width,
            height,
            format,
            image_view,
            owned: None,
        }
    }

    /// Depth buffer owning `image` and `allocation`
    pub(crate) fn depth_buffer(
        ctx: Arc<GpuContext>,
        width: u32,
        height: u32,
        format: TextureFormat,
        image: vk::Image,
        allocation: Allocation,
        image_view: vk::ImageView,
    ) -> Self {
        Self {
            ctx,
            width,
            height,
            format,
            image_view,
            owned: Some(OwnedImage { image, allocation }),
        }
    }
}

impl EngineRenderTarget for RenderTarget {
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

impl Drop for RenderTarget {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_image_view(self.image_view, None);
            if let Some(owned) = self.owned.take() {
                self.ctx.free(owned.allocation);
                self.ctx.device.destroy_image(owned.image, None);
            }
        }
    }
}
