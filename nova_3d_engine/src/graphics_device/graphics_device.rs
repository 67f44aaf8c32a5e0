/// GraphicsDevice trait - factory for GPU resources
///
/// Implemented by each backend. All created objects own their handles and
/// release them on `Drop`.

use std::sync::Arc;
use crate::error::Result;
use crate::graphics_device::{
    Buffer, BufferDesc, CommandList, CommandListLevel, DescriptorSet, DescriptorSetLayout,
    DescriptorSetLayoutDesc, Framebuffer, FramebufferDesc, Pipeline, PipelineDesc, RenderPass,
    RenderPassDesc, RenderTarget, Texture, TextureDesc, TextureFormat,
};

/// Main graphics device trait
pub trait GraphicsDevice: Send + Sync {
    /// Create a buffer with memory satisfying `desc.memory`, bound at creation
    fn create_buffer(&self, desc: &BufferDesc) -> Result<Arc<dyn Buffer>>;

    fn create_command_list(&self, level: CommandListLevel) -> Result<Box<dyn CommandList>>;

    /// Record a primary list with `record`, submit it and block until the
    /// GPU has finished executing it
    fn submit_one_shot(&self, record: &mut dyn FnMut(&mut dyn CommandList) -> Result<()>) -> Result<()>;

    fn create_descriptor_set_layout(&self, desc: &DescriptorSetLayoutDesc) -> Result<Arc<dyn DescriptorSetLayout>>;

    fn create_descriptor_set(&self, layout: &Arc<dyn DescriptorSetLayout>) -> Result<Box<dyn DescriptorSet>>;

    fn create_render_pass(&self, desc: &RenderPassDesc) -> Result<Arc<dyn RenderPass>>;

    fn create_framebuffer(&self, desc: &FramebufferDesc) -> Result<Arc<dyn Framebuffer>>;

    /// Depth/stencil attachment with its own image and memory
    fn create_depth_target(&self, width: u32, height: u32, format: TextureFormat) -> Result<Arc<dyn RenderTarget>>;

    /// Sampled texture; pixel data is uploaded through a staging buffer
    fn create_texture(&self, desc: &TextureDesc) -> Result<Arc<dyn Texture>>;

    fn create_pipeline(&self, desc: &PipelineDesc) -> Result<Arc<dyn Pipeline>>;

    /// Block until the device is idle
    fn wait_idle(&self) -> Result<()>;
}
