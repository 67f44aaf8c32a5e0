/// CommandList - Vulkan implementation of the engine CommandList trait
///
/// Each list owns a command pool (RESET_COMMAND_BUFFER) with a single
/// command buffer, so `begin` can re-record it every frame.

use nova_3d_engine::nova3d::{Error, Result};
use nova_3d_engine::nova3d::render::{
    Buffer as EngineBuffer, BufferCopy, ClearValue, CommandList as EngineCommandList, CommandListInheritance,
    CommandListLevel, DescriptorSet as EngineDescriptorSet, Framebuffer as EngineFramebuffer, IndexType,
    Pipeline as EnginePipeline, Rect2D, RenderPass as EngineRenderPass, SubpassContents, Viewport,
};
use nova_3d_engine::engine_err;
use ash::vk;
use std::any::Any;
use std::sync::Arc;

use crate::vulkan_buffer::Buffer;
use crate::vulkan_context::{vulkan_object, GpuContext};
use crate::vulkan_descriptor_set::DescriptorSet;
use crate::vulkan_format::index_type_to_vk;
use crate::vulkan_frame_buffer::Framebuffer;
use crate::vulkan_pipeline::Pipeline;
use crate::vulkan_render_pass::RenderPass;

const SOURCE: &str = "nova3d::vulkan::CommandList";

pub struct CommandList {
    ctx: Arc<GpuContext>,
    command_pool: vk::CommandPool,
    command_buffer: vk::CommandBuffer,
    level: CommandListLevel,
    is_recording: bool,
    /// Inside a render pass begun on this list
    in_render_pass: bool,
    /// Secondary list continuing an inherited render pass
    continues_render_pass: bool,
}

impl CommandList {
    pub(crate) fn new(ctx: Arc<GpuContext>, level: CommandListLevel) -> Result<Self> {
        let pool_info = vk::CommandPoolCreateInfo::default()
            .queue_family_index(ctx.graphics_queue_family)
            .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);

        let command_pool = unsafe { ctx.device.create_command_pool(&pool_info, None) }
            .map_err(|e| engine_err!(ctx.logger, SOURCE, "Failed to create command pool: {:?}", e))?;

        let alloc_info = vk::CommandBufferAllocateInfo::default()
            .command_pool(command_pool)
            .level(match level {
                CommandListLevel::Primary => vk::CommandBufferLevel::PRIMARY,
                CommandListLevel::Secondary => vk::CommandBufferLevel::SECONDARY,
            })
            .command_buffer_count(1);

        let command_buffer = match unsafe { ctx.device.allocate_command_buffers(&alloc_info) } {
            Ok(buffers) => buffers[0],
            Err(e) => {
                unsafe { ctx.device.destroy_command_pool(command_pool, None) };
                return Err(engine_err!(ctx.logger, SOURCE, "Failed to allocate command buffer: {:?}", e));
            }
        };

        Ok(Self {
            ctx,
            command_pool,
            command_buffer,
            level,
            is_recording: false,
            in_render_pass: false,
            continues_render_pass: false,
        })
    }

    /// Underlying Vulkan command buffer
    pub(crate) fn command_buffer(&self) -> vk::CommandBuffer {
        self.command_buffer
    }

    /// Fail unless the list is recording
    pub(crate) fn require_recording(&self) -> Result<()> {
        if self.is_recording {
            Ok(())
        } else {
            Err(Error::InvalidState("command list is not recording".to_string()))
        }
    }

    fn require_render_pass(&self) -> Result<()> {
        self.require_recording()?;
        if self.in_render_pass || self.continues_render_pass {
            Ok(())
        } else {
            Err(Error::InvalidState("not inside a render pass".to_string()))
        }
    }
}

impl EngineCommandList for CommandList {
    fn level(&self) -> CommandListLevel {
        self.level
    }

    fn begin(&mut self, inheritance: Option<&CommandListInheritance>) -> Result<()> {
        if self.is_recording {
            return Err(Error::InvalidState("command list already recording".to_string()));
        }
        if inheritance.is_some() && self.level == CommandListLevel::Primary {
            return Err(Error::InvalidState("primary command lists do not inherit a render pass".to_string()));
        }

        unsafe {
            self.ctx
                .device
                .reset_command_buffer(self.command_buffer, vk::CommandBufferResetFlags::empty())
                .map_err(|e| engine_err!(self.ctx.logger, SOURCE, "Failed to reset command buffer: {:?}", e))?;

            match inheritance {
                Some(inherited) => {
                    let render_pass = vulkan_object::<RenderPass>(inherited.render_pass.as_any(), "render pass")?;
                    let framebuffer = vulkan_object::<Framebuffer>(inherited.framebuffer.as_any(), "framebuffer")?;
                    let inheritance_info = vk::CommandBufferInheritanceInfo::default()
                        .render_pass(render_pass.render_pass)
                        .subpass(inherited.subpass)
                        .framebuffer(framebuffer.framebuffer);
                    let begin_info = vk::CommandBufferBeginInfo::default()
                        .flags(vk::CommandBufferUsageFlags::RENDER_PASS_CONTINUE)
                        .inheritance_info(&inheritance_info);
                    self.ctx
                        .device
                        .begin_command_buffer(self.command_buffer, &begin_info)
                        .map_err(|e| engine_err!(self.ctx.logger, SOURCE, "Failed to begin command buffer: {:?}", e))?;
                }
                None => {
                    let inheritance_info = vk::CommandBufferInheritanceInfo::default();
                    let mut begin_info = vk::CommandBufferBeginInfo::default()
                        .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
                    if self.level == CommandListLevel::Secondary {
                        begin_info = begin_info.inheritance_info(&inheritance_info);
                    }
                    self.ctx
                        .device
                        .begin_command_buffer(self.command_buffer, &begin_info)
                        .map_err(|e| engine_err!(self.ctx.logger, SOURCE, "Failed to begin command buffer: {:?}", e))?;
                }
            }
        }

        self.is_recording = true;
        self.in_render_pass = false;
        self.continues_render_pass = inheritance.is_some();
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        self.require_recording()?;
        if self.in_render_pass {
            return Err(Error::InvalidState("render pass not ended before ending command list".to_string()));
        }

        unsafe { self.ctx.device.end_command_buffer(self.command_buffer) }
            .map_err(|e| engine_err!(self.ctx.logger, SOURCE, "Failed to end command buffer: {:?}", e))?;

        self.is_recording = false;
        self.continues_render_pass = false;
        Ok(())
    }

    fn begin_render_pass(
        &mut self,
        render_pass: &Arc<dyn EngineRenderPass>,
        framebuffer: &Arc<dyn EngineFramebuffer>,
        render_area: Rect2D,
        clear_values: &[ClearValue],
        contents: SubpassContents,
    ) -> Result<()> {
        self.require_recording()?;
        if self.level != CommandListLevel::Primary {
            return Err(Error::InvalidState("render passes begin on primary command lists".to_string()));
        }
        if self.in_render_pass {
            return Err(Error::InvalidState("already inside a render pass".to_string()));
        }

        let vk_render_pass = vulkan_object::<RenderPass>(render_pass.as_any(), "render pass")?;
        let vk_framebuffer = vulkan_object::<Framebuffer>(framebuffer.as_any(), "framebuffer")?;

        let vk_clear_values: Vec<vk::ClearValue> = clear_values
            .iter()
            .map(|value| match value {
                ClearValue::Color(color) => vk::ClearValue {
                    color: vk::ClearColorValue { float32: *color },
                },
                ClearValue::DepthStencil { depth, stencil } => vk::ClearValue {
                    depth_stencil: vk::ClearDepthStencilValue {
                        depth: *depth,
                        stencil: *stencil,
                    },
                },
            })
            .collect();

        let begin_info = vk::RenderPassBeginInfo::default()
            .render_pass(vk_render_pass.render_pass)
            .framebuffer(vk_framebuffer.framebuffer)
            .render_area(vk::Rect2D {
                offset: vk::Offset2D { x: render_area.x, y: render_area.y },
                extent: vk::Extent2D {
                    width: render_area.width,
                    height: render_area.height,
                },
            })
            .clear_values(&vk_clear_values);

        let vk_contents = match contents {
            SubpassContents::Inline => vk::SubpassContents::INLINE,
            SubpassContents::SecondaryCommandLists => vk::SubpassContents::SECONDARY_COMMAND_BUFFERS,
        };

        unsafe {
            self.ctx.device.cmd_begin_render_pass(self.command_buffer, &begin_info, vk_contents);
        }
        self.in_render_pass = true;
        Ok(())
    }

    fn end_render_pass(&mut self) -> Result<()> {
        self.require_recording()?;
        if !self.in_render_pass {
            return Err(Error::InvalidState("not inside a render pass".to_string()));
        }
        unsafe {
            self.ctx.device.cmd_end_render_pass(self.command_buffer);
        }
        self.in_render_pass = false;
        Ok(())
    }

    fn set_viewport(&mut self, viewport: Viewport) -> Result<()> {
        self.require_recording()?;
        let vk_viewport = vk::Viewport::default()
            .x(viewport.x)
            .y(viewport.y)
            .width(viewport.width)
            .height(viewport.height)
            .min_depth(viewport.min_depth)
            .max_depth(viewport.max_depth);
        unsafe {
            self.ctx.device.cmd_set_viewport(self.command_buffer, 0, &[vk_viewport]);
        }
        Ok(())
    }

    fn set_scissor(&mut self, scissor: Rect2D) -> Result<()> {
        self.require_recording()?;
        let vk_scissor = vk::Rect2D::default()
            .offset(vk::Offset2D { x: scissor.x, y: scissor.y })
            .extent(vk::Extent2D { width: scissor.width, height: scissor.height });
        unsafe {
            self.ctx.device.cmd_set_scissor(self.command_buffer, 0, &[vk_scissor]);
        }
        Ok(())
    }

    fn bind_pipeline(&mut self, pipeline: &Arc<dyn EnginePipeline>) -> Result<()> {
        self.require_recording()?;
        let vk_pipeline = vulkan_object::<Pipeline>(pipeline.as_any(), "pipeline")?;
        unsafe {
            self.ctx.device.cmd_bind_pipeline(
                self.command_buffer,
                vk::PipelineBindPoint::GRAPHICS,
                vk_pipeline.pipeline,
            );
        }
        Ok(())
    }

    fn bind_descriptor_set(&mut self, pipeline: &Arc<dyn EnginePipeline>, set: &dyn EngineDescriptorSet) -> Result<()> {
        self.require_recording()?;
        let vk_pipeline = vulkan_object::<Pipeline>(pipeline.as_any(), "pipeline")?;
        let vk_set = vulkan_object::<DescriptorSet>(set.as_any(), "descriptor set")?;
        unsafe {
            self.ctx.device.cmd_bind_descriptor_sets(
                self.command_buffer,
                vk::PipelineBindPoint::GRAPHICS,
                vk_pipeline.pipeline_layout,
                0,
                &[vk_set.set],
                &[],
            );
        }
        Ok(())
    }

    fn bind_vertex_buffer(&mut self, buffer: &Arc<dyn EngineBuffer>, offset: u64) -> Result<()> {
        self.require_recording()?;
        let vk_buffer = vulkan_object::<Buffer>(buffer.as_any(), "vertex buffer")?;
        unsafe {
            self.ctx
                .device
                .cmd_bind_vertex_buffers(self.command_buffer, 0, &[vk_buffer.buffer], &[offset]);
        }
        Ok(())
    }

    fn bind_index_buffer(&mut self, buffer: &Arc<dyn EngineBuffer>, offset: u64, index_type: IndexType) -> Result<()> {
        self.require_recording()?;
        let vk_buffer = vulkan_object::<Buffer>(buffer.as_any(), "index buffer")?;
        unsafe {
            self.ctx.device.cmd_bind_index_buffer(
                self.command_buffer,
                vk_buffer.buffer,
                offset,
                index_type_to_vk(index_type),
            );
        }
        Ok(())
    }

    fn draw_indexed(
        &mut self,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    ) -> Result<()> {
        self.require_render_pass()?;
        unsafe {
            self.ctx.device.cmd_draw_indexed(
                self.command_buffer,
                index_count,
                instance_count,
                first_index,
                vertex_offset,
                first_instance,
            );
        }
        Ok(())
    }

    fn copy_buffer(&mut self, src: &Arc<dyn EngineBuffer>, dst: &Arc<dyn EngineBuffer>, region: BufferCopy) -> Result<()> {
        self.require_recording()?;
        if self.in_render_pass {
            return Err(Error::InvalidState("buffer copies are not allowed inside a render pass".to_string()));
        }
        let vk_src = vulkan_object::<Buffer>(src.as_any(), "copy source")?;
        let vk_dst = vulkan_object::<Buffer>(dst.as_any(), "copy destination")?;
        let copy = vk::BufferCopy {
            src_offset: region.src_offset,
            dst_offset: region.dst_offset,
            size: region.size,
        };
        unsafe {
            self.ctx
                .device
                .cmd_copy_buffer(self.command_buffer, vk_src.buffer, vk_dst.buffer, &[copy]);
        }
        Ok(())
    }

    fn execute_commands(&mut self, secondaries: &[&dyn EngineCommandList]) -> Result<()> {
        self.require_render_pass()?;
        if self.level != CommandListLevel::Primary {
            return Err(Error::InvalidState("only primary command lists execute secondaries".to_string()));
        }
        let buffers = secondaries
            .iter()
            .map(|list| {
                let list = vulkan_object::<CommandList>(list.as_any(), "secondary command list")?;
                if list.level != CommandListLevel::Secondary || list.is_recording {
                    return Err(Error::InvalidState("executed lists must be finished secondaries".to_string()));
                }
                Ok(list.command_buffer)
            })
            .collect::<Result<Vec<_>>>()?;
        unsafe {
            self.ctx.device.cmd_execute_commands(self.command_buffer, &buffers);
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for CommandList {
    fn drop(&mut self) {
        // Destroying the pool frees its command buffer
        unsafe {
            self.ctx.device.destroy_command_pool(self.command_pool, None);
        }
    }
}
