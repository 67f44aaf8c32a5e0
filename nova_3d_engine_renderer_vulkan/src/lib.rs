/*!
# Nova3D Engine - Vulkan Backend

Vulkan implementation of the `nova_3d_engine` device traits, using Ash for
the Vulkan bindings and gpu-allocator for memory management.

- `VulkanGraphicsDevice` implements `GraphicsDevice`
- `VulkanPresenter` implements `PresentationDevice` for one window surface

```no_run
use std::sync::Arc;
use nova_3d_engine::nova3d::Config;
use nova_3d_engine::nova3d::log::LogSink;
use nova_3d_engine::nova3d::presentation::Swapchain;
use nova_3d_engine_renderer_vulkan::nova3d::VulkanGraphicsDevice;
# fn run(window: &winit::window::Window) -> nova_3d_engine::nova3d::Result<()> {
let config = Config::default();
let device = Arc::new(VulkanGraphicsDevice::new(window, &config, LogSink::console())?);
let presenter = device.create_presenter(window)?;
let swapchain = Swapchain::new(device, Box::new(presenter), &config, LogSink::console());
# Ok(())
# }
```
*/

mod vulkan;
mod vulkan_context;
mod vulkan_format;
mod vulkan_buffer;
mod vulkan_texture;
mod vulkan_sampler;
mod vulkan_pipeline;
mod vulkan_command_list;
mod vulkan_descriptor_set;
mod vulkan_render_target;
mod vulkan_render_pass;
mod vulkan_frame_buffer;
mod vulkan_swapchain;

#[cfg(feature = "vulkan-validation")]
mod vulkan_debug;

pub mod nova3d {
    pub use crate::vulkan::VulkanGraphicsDevice;
    pub use crate::vulkan_swapchain::VulkanPresenter;
}

pub use vulkan::VulkanGraphicsDevice;
pub use vulkan_swapchain::VulkanPresenter;
