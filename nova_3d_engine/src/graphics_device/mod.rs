/// Graphics device module - all GPU-facing types and traits

pub mod graphics_device;
pub mod buffer;
pub mod texture;
pub mod pipeline;
pub mod command_list;
pub mod descriptor_set;
pub mod render_target;
pub mod render_pass;
pub mod frame_buffer;
pub mod swapchain;

pub use graphics_device::*;
pub use buffer::*;
pub use texture::*;
pub use pipeline::*;
pub use command_list::*;
pub use descriptor_set::*;
pub use render_target::*;
pub use render_pass::*;
pub use frame_buffer::*;
pub use swapchain::*;

// Mock graphics device for tests (no GPU required)
#[cfg(test)]
pub mod mock_graphics_device;
