/// VulkanGraphicsDevice - Vulkan implementation of the engine GraphicsDevice
///
/// Creates the instance, picks the GPU and queue families, creates the
/// logical device and the gpu-allocator, then hands out GPU objects that
/// share one `GpuContext`.

use nova_3d_engine::nova3d::{Config, Error, GraphicsDevice, Result};
use nova_3d_engine::nova3d::log::LogSink;
use nova_3d_engine::nova3d::render::{
    Buffer as EngineBuffer, BufferDesc, CommandList as EngineCommandList, CommandListLevel,
    DescriptorSet as EngineDescriptorSet, DescriptorSetLayout as EngineDescriptorSetLayout, DescriptorSetLayoutDesc,
    Framebuffer as EngineFramebuffer, FramebufferDesc, Pipeline as EnginePipeline, PipelineDesc,
    RenderPass as EngineRenderPass, RenderPassDesc, RenderTarget as EngineRenderTarget, Texture as EngineTexture,
    TextureDesc, TextureFormat,
};
use nova_3d_engine::{engine_bail, engine_debug, engine_err, engine_error, engine_info, engine_warn};
use ash::vk;
use gpu_allocator::vulkan::{Allocator, AllocatorCreateDesc};
use gpu_allocator::MemoryLocation;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use std::sync::Arc;

use crate::vulkan_buffer::Buffer;
use crate::vulkan_command_list::CommandList;
use crate::vulkan_context::{vulkan_object, DebugMessenger, GpuContext};
use crate::vulkan_descriptor_set::{DescriptorSet, DescriptorSetLayout};
use crate::vulkan_format::{
    aspect_mask_for, buffer_format_to_vk, buffer_usage_to_vk, cull_mode_to_vk, image_layout_to_vk, load_op_to_vk,
    memory_location_for, sample_count_to_vk, store_op_to_vk, texture_format_to_vk,
};
use crate::vulkan_frame_buffer::Framebuffer;
use crate::vulkan_pipeline::Pipeline;
use crate::vulkan_render_pass::RenderPass;
use crate::vulkan_render_target::RenderTarget;
use crate::vulkan_sampler::Sampler;
use crate::vulkan_swapchain::VulkanPresenter;
use crate::vulkan_texture::Texture;

const SOURCE: &str = "nova3d::vulkan";

/// Vulkan graphics device
pub struct VulkanGraphicsDevice {
    ctx: Arc<GpuContext>,
    /// Shared by every texture
    sampler: Arc<Sampler>,
}

/// Log an initialization failure and build the matching error
fn init_failed(logger: &LogSink, what: &str, detail: impl std::fmt::Debug) -> Error {
    engine_error!(logger, SOURCE, "{}: {:?}", what, detail);
    Error::InitializationFailed(format!("{}: {:?}", what, detail))
}

impl VulkanGraphicsDevice {
    /// Create a device able to present to `window`
    ///
    /// The window is only used to pick a queue family that can present to
    /// it; surfaces are created later by `create_presenter`.
    pub fn new<W: HasDisplayHandle + HasWindowHandle>(window: &W, config: &Config, logger: LogSink) -> Result<Self> {
        unsafe {
            let entry = ash::Entry::load().map_err(|e| init_failed(&logger, "Failed to load Vulkan library", e))?;

            let app_name = std::ffi::CString::new(config.app_name.as_str())
                .map_err(|e| Error::InitializationFailed(format!("invalid application name: {}", e)))?;
            let (major, minor, patch) = config.app_version;
            let app_info = vk::ApplicationInfo::default()
                .application_name(&app_name)
                .application_version(vk::make_api_version(0, major, minor, patch))
                .engine_name(c"Nova3D")
                .engine_version(vk::make_api_version(0, 0, 1, 0))
                .api_version(vk::API_VERSION_1_2);

            let display_handle = window
                .display_handle()
                .map_err(|e| init_failed(&logger, "Failed to get display handle", e))?;
            let mut extension_names = ash_window::enumerate_required_extensions(display_handle.as_raw())
                .map_err(|e| init_failed(&logger, "Failed to get required extensions", e))?
                .to_vec();

            let validation = Self::validation_enabled(config, &logger);
            let mut layer_names = Vec::new();
            if validation {
                extension_names.push(ash::ext::debug_utils::NAME.as_ptr());
                #[cfg(feature = "vulkan-validation")]
                layer_names.push(crate::vulkan_debug::VALIDATION_LAYER.as_ptr());
            }

            let create_info = vk::InstanceCreateInfo::default()
                .application_info(&app_info)
                .enabled_layer_names(&layer_names)
                .enabled_extension_names(&extension_names);
            let instance = entry
                .create_instance(&create_info, None)
                .map_err(|e| init_failed(&logger, "Failed to create Vulkan instance", e))?;

            let debug = match Self::create_debug(&entry, &instance, validation, &logger) {
                Ok(debug) => debug,
                Err(e) => {
                    instance.destroy_instance(None);
                    return Err(e);
                }
            };

            match Self::create_context(entry.clone(), instance.clone(), debug, window, &logger) {
                Ok(ctx) => {
                    let ctx = Arc::new(ctx);
                    let anisotropy = Self::max_anisotropy(&ctx);
                    let sampler = Arc::new(Sampler::linear_repeat(Arc::clone(&ctx), anisotropy)?);
                    engine_info!(logger, SOURCE, "Vulkan device ready (validation: {})", validation);
                    Ok(Self { ctx, sampler })
                }
                Err((debug, e)) => {
                    if let Some(debug) = debug {
                        debug.loader.destroy_debug_utils_messenger(debug.messenger, None);
                    }
                    instance.destroy_instance(None);
                    Err(e)
                }
            }
        }
    }

    fn validation_enabled(config: &Config, logger: &LogSink) -> bool {
        if !config.enable_validation {
            return false;
        }
        if cfg!(feature = "vulkan-validation") {
            true
        } else {
            engine_warn!(
                logger,
                SOURCE,
                "Validation requested but the vulkan-validation feature is not compiled in"
            );
            false
        }
    }

    #[cfg(feature = "vulkan-validation")]
    fn create_debug(
        entry: &ash::Entry,
        instance: &ash::Instance,
        validation: bool,
        logger: &LogSink,
    ) -> Result<Option<DebugMessenger>> {
        if validation {
            crate::vulkan_debug::create_debug_messenger(entry, instance, logger.clone()).map(Some)
        } else {
            Ok(None)
        }
    }

    #[cfg(not(feature = "vulkan-validation"))]
    fn create_debug(
        _entry: &ash::Entry,
        _instance: &ash::Instance,
        _validation: bool,
        _logger: &LogSink,
    ) -> Result<Option<DebugMessenger>> {
        Ok(None)
    }

    /// Physical device, queues, logical device and allocator
    ///
    /// On failure the debug messenger is handed back so the caller can
    /// destroy it before the instance.
    unsafe fn create_context<W: HasDisplayHandle + HasWindowHandle>(
        entry: ash::Entry,
        instance: ash::Instance,
        debug: Option<DebugMessenger>,
        window: &W,
        logger: &LogSink,
    ) -> std::result::Result<GpuContext, (Option<DebugMessenger>, Error)> {
        macro_rules! try_init {
            ($expr:expr, $what:expr) => {
                match $expr {
                    Ok(value) => value,
                    Err(e) => return Err((debug, init_failed(logger, $what, e))),
                }
            };
        }

        let display_handle = try_init!(window.display_handle(), "Failed to get display handle");
        let window_handle = try_init!(window.window_handle(), "Failed to get window handle");

        // Temporary surface, only to find a family that can present
        let surface = try_init!(
            ash_window::create_surface(&entry, &instance, display_handle.as_raw(), window_handle.as_raw(), None),
            "Failed to create surface"
        );
        let surface_loader = ash::khr::surface::Instance::new(&entry, &instance);

        let selection = Self::pick_physical_device(&instance, &surface_loader, surface);
        surface_loader.destroy_surface(surface, None);
        let (physical_device, graphics_family, present_family) = match selection {
            Some(selection) => selection,
            None => {
                engine_error!(logger, SOURCE, "No Vulkan GPU with graphics and present queues found");
                return Err((
                    debug,
                    Error::InitializationFailed("No Vulkan GPU with graphics and present queues found".to_string()),
                ));
            }
        };

        let properties = instance.get_physical_device_properties(physical_device);
        if let Ok(name) = properties.device_name_as_c_str() {
            engine_info!(logger, SOURCE, "Using GPU {:?}", name);
        }

        let queue_priorities = [1.0];
        let mut queue_create_infos = vec![vk::DeviceQueueCreateInfo::default()
            .queue_family_index(graphics_family)
            .queue_priorities(&queue_priorities)];
        if present_family != graphics_family {
            queue_create_infos.push(
                vk::DeviceQueueCreateInfo::default()
                    .queue_family_index(present_family)
                    .queue_priorities(&queue_priorities),
            );
        }

        let supported = instance.get_physical_device_features(physical_device);
        let device_features = vk::PhysicalDeviceFeatures::default().sampler_anisotropy(supported.sampler_anisotropy == vk::TRUE);
        let device_extension_names = [ash::khr::swapchain::NAME.as_ptr()];
        let device_create_info = vk::DeviceCreateInfo::default()
            .queue_create_infos(&queue_create_infos)
            .enabled_extension_names(&device_extension_names)
            .enabled_features(&device_features);

        let device = try_init!(
            instance.create_device(physical_device, &device_create_info, None),
            "Failed to create logical device"
        );

        let allocator = match Allocator::new(&AllocatorCreateDesc {
            instance: instance.clone(),
            device: device.clone(),
            physical_device,
            debug_settings: Default::default(),
            buffer_device_address: false,
            allocation_sizes: Default::default(),
        }) {
            Ok(allocator) => allocator,
            Err(e) => {
                device.destroy_device(None);
                return Err((debug, init_failed(logger, "Failed to create GPU allocator", e)));
            }
        };

        Ok(GpuContext::new(
            entry,
            instance,
            debug,
            physical_device,
            device,
            allocator,
            graphics_family,
            present_family,
            logger.clone(),
        ))
    }

    /// First GPU with a graphics family and a family presenting to `surface`
    unsafe fn pick_physical_device(
        instance: &ash::Instance,
        surface_loader: &ash::khr::surface::Instance,
        surface: vk::SurfaceKHR,
    ) -> Option<(vk::PhysicalDevice, u32, u32)> {
        let physical_devices = instance.enumerate_physical_devices().ok()?;
        physical_devices.into_iter().find_map(|physical_device| {
            let families = instance.get_physical_device_queue_family_properties(physical_device);
            let graphics = families
                .iter()
                .position(|family| family.queue_flags.contains(vk::QueueFlags::GRAPHICS))? as u32;
            let can_present = |index: u32| {
                surface_loader
                    .get_physical_device_surface_support(physical_device, index, surface)
                    .unwrap_or(false)
            };
            let present = if can_present(graphics) {
                graphics
            } else {
                (0..families.len() as u32).find(|&index| can_present(index))?
            };
            Some((physical_device, graphics, present))
        })
    }

    fn max_anisotropy(ctx: &GpuContext) -> Option<f32> {
        unsafe {
            let features = ctx.instance.get_physical_device_features(ctx.physical_device);
            if features.sampler_anisotropy == vk::TRUE {
                let limits = ctx.instance.get_physical_device_properties(ctx.physical_device).limits;
                Some(limits.max_sampler_anisotropy.min(16.0))
            } else {
                None
            }
        }
    }

    /// Create the presentation side for `window`
    ///
    /// Pass the result to the core `Swapchain`.
    pub fn create_presenter<W: HasDisplayHandle + HasWindowHandle>(&self, window: &W) -> Result<VulkanPresenter> {
        let display_handle = window
            .display_handle()
            .map_err(|e| init_failed(&self.ctx.logger, "Failed to get display handle", e))?;
        let window_handle = window
            .window_handle()
            .map_err(|e| init_failed(&self.ctx.logger, "Failed to get window handle", e))?;
        let surface = unsafe {
            ash_window::create_surface(
                &self.ctx.entry,
                &self.ctx.instance,
                display_handle.as_raw(),
                window_handle.as_raw(),
                None,
            )
        }
        .map_err(|e| init_failed(&self.ctx.logger, "Failed to create surface", e))?;
        VulkanPresenter::new(Arc::clone(&self.ctx), surface)
    }

    /// Record with direct access to the Vulkan command buffer, submit, wait
    fn one_shot(&self, record: &mut dyn FnMut(&mut CommandList) -> Result<()>) -> Result<()> {
        let mut cmd = CommandList::new(Arc::clone(&self.ctx), CommandListLevel::Primary)?;
        cmd.begin(None)?;
        record(&mut cmd)?;
        cmd.end()?;

        let command_buffers = [cmd.command_buffer()];
        let submit_info = vk::SubmitInfo::default().command_buffers(&command_buffers);
        unsafe {
            self.ctx
                .device
                .queue_submit(self.ctx.graphics_queue, &[submit_info], vk::Fence::null())
                .map_err(|e| engine_err!(self.ctx.logger, SOURCE, "Failed to submit one-shot commands: {:?}", e))?;
            self.ctx
                .device
                .queue_wait_idle(self.ctx.graphics_queue)
                .map_err(|e| engine_err!(self.ctx.logger, SOURCE, "Failed to wait for one-shot commands: {:?}", e))?;
        }
        Ok(())
    }

    /// 2D image with memory bound and a view over its whole aspect
    fn create_image(
        &self,
        name: &str,
        width: u32,
        height: u32,
        format: TextureFormat,
        usage: vk::ImageUsageFlags,
    ) -> Result<(vk::Image, gpu_allocator::vulkan::Allocation, vk::ImageView)> {
        let vk_format = texture_format_to_vk(format);
        let image_info = vk::ImageCreateInfo::default()
            .image_type(vk::ImageType::TYPE_2D)
            .format(vk_format)
            .extent(vk::Extent3D { width, height, depth: 1 })
            .mip_levels(1)
            .array_layers(1)
            .samples(vk::SampleCountFlags::TYPE_1)
            .tiling(vk::ImageTiling::OPTIMAL)
            .usage(usage)
            .sharing_mode(vk::SharingMode::EXCLUSIVE)
            .initial_layout(vk::ImageLayout::UNDEFINED);

        let device = &self.ctx.device;
        unsafe {
            let image = device
                .create_image(&image_info, None)
                .map_err(|e| engine_err!(self.ctx.logger, SOURCE, "Failed to create {} image {}x{}: {:?}", name, width, height, e))?;

            let requirements = device.get_image_memory_requirements(image);
            let allocation = match self.ctx.allocate(name, requirements, MemoryLocation::GpuOnly, false) {
                Ok(allocation) => allocation,
                Err(e) => {
                    device.destroy_image(image, None);
                    return Err(e);
                }
            };
            if let Err(e) = device.bind_image_memory(image, allocation.memory(), allocation.offset()) {
                self.ctx.free(allocation);
                device.destroy_image(image, None);
                engine_bail!(self.ctx.logger, SOURCE, "Failed to bind {} image memory: {:?}", name, e);
            }

            let view_info = vk::ImageViewCreateInfo::default()
                .image(image)
                .view_type(vk::ImageViewType::TYPE_2D)
                .format(vk_format)
                .subresource_range(vk::ImageSubresourceRange {
                    aspect_mask: aspect_mask_for(format),
                    base_mip_level: 0,
                    level_count: 1,
                    base_array_layer: 0,
                    layer_count: 1,
                });
            match device.create_image_view(&view_info, None) {
                Ok(view) => Ok((image, allocation, view)),
                Err(e) => {
                    self.ctx.free(allocation);
                    device.destroy_image(image, None);
                    Err(engine_err!(self.ctx.logger, SOURCE, "Failed to create {} image view: {:?}", name, e))
                }
            }
        }
    }

    fn create_shader_module(&self, words: &[u32], stage: &str) -> Result<vk::ShaderModule> {
        if words.is_empty() {
            return Err(Error::InvalidResource(format!("empty {} shader", stage)));
        }
        let create_info = vk::ShaderModuleCreateInfo::default().code(words);
        unsafe { self.ctx.device.create_shader_module(&create_info, None) }
            .map_err(|e| engine_err!(self.ctx.logger, SOURCE, "Failed to create {} shader module: {:?}", stage, e))
    }
}

impl GraphicsDevice for VulkanGraphicsDevice {
    fn create_buffer(&self, desc: &BufferDesc) -> Result<Arc<dyn EngineBuffer>> {
        if desc.size == 0 {
            return Err(Error::InvalidResource("buffer size must be non-zero".to_string()));
        }
        let device = &self.ctx.device;
        let create_info = vk::BufferCreateInfo::default()
            .size(desc.size)
            .usage(buffer_usage_to_vk(desc.usage))
            .sharing_mode(vk::SharingMode::EXCLUSIVE);

        unsafe {
            let buffer = device
                .create_buffer(&create_info, None)
                .map_err(|e| engine_err!(self.ctx.logger, SOURCE, "Failed to create buffer of size {} bytes: {:?}", desc.size, e))?;

            let requirements = device.get_buffer_memory_requirements(buffer);
            let allocation = match self.ctx.allocate("buffer", requirements, memory_location_for(desc.memory), true) {
                Ok(allocation) => allocation,
                Err(e) => {
                    device.destroy_buffer(buffer, None);
                    return Err(e);
                }
            };
            if let Err(e) = device.bind_buffer_memory(buffer, allocation.memory(), allocation.offset()) {
                self.ctx.free(allocation);
                device.destroy_buffer(buffer, None);
                engine_bail!(self.ctx.logger, SOURCE, "Failed to bind buffer memory: {:?}", e);
            }

            Ok(Arc::new(Buffer::new(
                Arc::clone(&self.ctx),
                buffer,
                allocation,
                desc.size,
                desc.usage,
                desc.memory,
            )))
        }
    }

    fn create_command_list(&self, level: CommandListLevel) -> Result<Box<dyn EngineCommandList>> {
        Ok(Box::new(CommandList::new(Arc::clone(&self.ctx), level)?))
    }

    fn submit_one_shot(&self, record: &mut dyn FnMut(&mut dyn EngineCommandList) -> Result<()>) -> Result<()> {
        self.one_shot(&mut |cmd| record(cmd))
    }

    fn create_descriptor_set_layout(&self, desc: &DescriptorSetLayoutDesc) -> Result<Arc<dyn EngineDescriptorSetLayout>> {
        Ok(Arc::new(DescriptorSetLayout::new(Arc::clone(&self.ctx), desc)?))
    }

    fn create_descriptor_set(&self, layout: &Arc<dyn EngineDescriptorSetLayout>) -> Result<Box<dyn EngineDescriptorSet>> {
        Ok(Box::new(DescriptorSet::new(Arc::clone(&self.ctx), layout)?))
    }

    fn create_render_pass(&self, desc: &RenderPassDesc) -> Result<Arc<dyn EngineRenderPass>> {
        let attachment_desc = |attachment: &nova_3d_engine::nova3d::render::AttachmentDesc| {
            vk::AttachmentDescription::default()
                .format(texture_format_to_vk(attachment.format))
                .samples(sample_count_to_vk(attachment.samples))
                .load_op(load_op_to_vk(attachment.load_op))
                .store_op(store_op_to_vk(attachment.store_op))
                .stencil_load_op(load_op_to_vk(attachment.stencil_load_op))
                .stencil_store_op(store_op_to_vk(attachment.stencil_store_op))
                .initial_layout(image_layout_to_vk(attachment.initial_layout))
                .final_layout(image_layout_to_vk(attachment.final_layout))
        };

        let mut attachments: Vec<vk::AttachmentDescription> = desc.color_attachments.iter().map(attachment_desc).collect();
        let color_refs: Vec<vk::AttachmentReference> = (0..desc.color_attachments.len() as u32)
            .map(|index| vk::AttachmentReference {
                attachment: index,
                layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
            })
            .collect();
        let depth_ref = desc.depth_attachment.as_ref().map(|depth| {
            attachments.push(attachment_desc(depth));
            vk::AttachmentReference {
                attachment: attachments.len() as u32 - 1,
                layout: vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
            }
        });

        let mut subpass = vk::SubpassDescription::default()
            .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
            .color_attachments(&color_refs);
        if let Some(depth_ref) = depth_ref.as_ref() {
            subpass = subpass.depth_stencil_attachment(depth_ref);
        }

        // External dependency covers the stages the pass writes
        let (stage_mask, access_mask) = if depth_ref.is_some() {
            (
                vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT | vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS,
                vk::AccessFlags::COLOR_ATTACHMENT_WRITE | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
            )
        } else {
            (vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT, vk::AccessFlags::COLOR_ATTACHMENT_WRITE)
        };
        let dependency = vk::SubpassDependency::default()
            .src_subpass(vk::SUBPASS_EXTERNAL)
            .dst_subpass(0)
            .src_stage_mask(stage_mask)
            .src_access_mask(vk::AccessFlags::empty())
            .dst_stage_mask(stage_mask)
            .dst_access_mask(access_mask);

        let render_pass_info = vk::RenderPassCreateInfo::default()
            .attachments(&attachments)
            .subpasses(std::slice::from_ref(&subpass))
            .dependencies(std::slice::from_ref(&dependency));

        let render_pass = unsafe { self.ctx.device.create_render_pass(&render_pass_info, None) }
            .map_err(|e| engine_err!(self.ctx.logger, SOURCE, "Failed to create render pass: {:?}", e))?;

        Ok(Arc::new(RenderPass::new(Arc::clone(&self.ctx), render_pass, desc.clone())))
    }

    fn create_framebuffer(&self, desc: &FramebufferDesc) -> Result<Arc<dyn EngineFramebuffer>> {
        let render_pass = vulkan_object::<RenderPass>(desc.render_pass.as_any(), "render pass")?;
        let expected = render_pass.desc().color_attachments.len() + usize::from(render_pass.desc().depth_attachment.is_some());
        if desc.attachments.len() != expected {
            engine_bail!(
                self.ctx.logger,
                SOURCE,
                "Framebuffer has {} attachments, its render pass expects {}",
                desc.attachments.len(),
                expected
            );
        }

        let views = desc
            .attachments
            .iter()
            .map(|target| vulkan_object::<RenderTarget>(target.as_any(), "framebuffer attachment").map(|t| t.image_view))
            .collect::<Result<Vec<_>>>()?;

        let framebuffer_info = vk::FramebufferCreateInfo::default()
            .render_pass(render_pass.render_pass)
            .attachments(&views)
            .width(desc.width)
            .height(desc.height)
            .layers(1);

        let framebuffer = unsafe { self.ctx.device.create_framebuffer(&framebuffer_info, None) }
            .map_err(|e| engine_err!(self.ctx.logger, SOURCE, "Failed to create framebuffer: {:?}", e))?;

        Ok(Arc::new(Framebuffer::new(
            Arc::clone(&self.ctx),
            framebuffer,
            desc.width,
            desc.height,
            desc.attachments.clone(),
        )))
    }

    fn create_depth_target(&self, width: u32, height: u32, format: TextureFormat) -> Result<Arc<dyn EngineRenderTarget>> {
        if !format.is_depth() {
            return Err(Error::InvalidResource(format!("{:?} is not a depth format", format)));
        }
        let (image, allocation, view) = self.create_image(
            "depth buffer",
            width,
            height,
            format,
            vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT,
        )?;
        engine_debug!(self.ctx.logger, SOURCE, "Depth buffer {}x{} ({:?})", width, height, format);
        Ok(Arc::new(RenderTarget::depth_buffer(
            Arc::clone(&self.ctx),
            width,
            height,
            format,
            image,
            allocation,
            view,
        )))
    }

    fn create_texture(&self, desc: &TextureDesc) -> Result<Arc<dyn EngineTexture>> {
        if desc.format.is_depth() {
            return Err(Error::InvalidResource(format!("sampled textures cannot use {:?}", desc.format)));
        }
        let expected = desc.width as u64 * desc.height as u64 * desc.format.bytes_per_pixel() as u64;
        if desc.width == 0 || desc.height == 0 || desc.data.len() as u64 != expected {
            return Err(Error::InvalidResource(format!(
                "texture {}x{} {:?} needs {} bytes, got {}",
                desc.width,
                desc.height,
                desc.format,
                expected,
                desc.data.len()
            )));
        }

        let staging = self.create_buffer(&BufferDesc {
            size: expected,
            usage: nova_3d_engine::nova3d::render::BufferUsage::TRANSFER_SRC,
            memory: nova_3d_engine::nova3d::render::MemoryProperties::HOST_VISIBLE
                | nova_3d_engine::nova3d::render::MemoryProperties::HOST_COHERENT,
        })?;
        staging.write(0, &desc.data)?;
        let staging_buffer = vulkan_object::<Buffer>(staging.as_any(), "staging buffer")?.buffer;

        let (image, allocation, view) = self.create_image(
            "texture",
            desc.width,
            desc.height,
            desc.format,
            vk::ImageUsageFlags::TRANSFER_DST | vk::ImageUsageFlags::SAMPLED,
        )?;
        let texture = Texture::new(
            Arc::clone(&self.ctx),
            image,
            view,
            Arc::clone(&self.sampler),
            allocation,
            desc.width,
            desc.height,
            desc.format,
        );

        let range = vk::ImageSubresourceRange {
            aspect_mask: vk::ImageAspectFlags::COLOR,
            base_mip_level: 0,
            level_count: 1,
            base_array_layer: 0,
            layer_count: 1,
        };
        let device = &self.ctx.device;
        self.one_shot(&mut |cmd| {
            let cb = cmd.command_buffer();
            let to_transfer = vk::ImageMemoryBarrier::default()
                .old_layout(vk::ImageLayout::UNDEFINED)
                .new_layout(vk::ImageLayout::TRANSFER_DST_OPTIMAL)
                .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                .image(image)
                .subresource_range(range)
                .src_access_mask(vk::AccessFlags::empty())
                .dst_access_mask(vk::AccessFlags::TRANSFER_WRITE);
            let region = vk::BufferImageCopy::default()
                .buffer_offset(0)
                .image_subresource(vk::ImageSubresourceLayers {
                    aspect_mask: vk::ImageAspectFlags::COLOR,
                    mip_level: 0,
                    base_array_layer: 0,
                    layer_count: 1,
                })
                .image_extent(vk::Extent3D {
                    width: desc.width,
                    height: desc.height,
                    depth: 1,
                });
            let to_shader = vk::ImageMemoryBarrier::default()
                .old_layout(vk::ImageLayout::TRANSFER_DST_OPTIMAL)
                .new_layout(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL)
                .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                .image(image)
                .subresource_range(range)
                .src_access_mask(vk::AccessFlags::TRANSFER_WRITE)
                .dst_access_mask(vk::AccessFlags::SHADER_READ);
            unsafe {
                device.cmd_pipeline_barrier(
                    cb,
                    vk::PipelineStageFlags::TOP_OF_PIPE,
                    vk::PipelineStageFlags::TRANSFER,
                    vk::DependencyFlags::empty(),
                    &[],
                    &[],
                    &[to_transfer],
                );
                device.cmd_copy_buffer_to_image(
                    cb,
                    staging_buffer,
                    image,
                    vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                    &[region],
                );
                device.cmd_pipeline_barrier(
                    cb,
                    vk::PipelineStageFlags::TRANSFER,
                    vk::PipelineStageFlags::FRAGMENT_SHADER,
                    vk::DependencyFlags::empty(),
                    &[],
                    &[],
                    &[to_shader],
                );
            }
            Ok(())
        })?;

        engine_debug!(self.ctx.logger, SOURCE, "Texture {}x{} ({:?}) uploaded", desc.width, desc.height, desc.format);
        Ok(Arc::new(texture))
    }

    fn create_pipeline(&self, desc: &PipelineDesc) -> Result<Arc<dyn EnginePipeline>> {
        let render_pass = vulkan_object::<RenderPass>(desc.render_pass.as_any(), "render pass")?;
        let set_layout = vulkan_object::<DescriptorSetLayout>(desc.descriptor_set_layout.as_any(), "descriptor set layout")?;
        let device = &self.ctx.device;

        let vertex_module = self.create_shader_module(&desc.vertex_shader, "vertex")?;
        let fragment_module = match desc.fragment_shader.as_deref().map(|words| self.create_shader_module(words, "fragment")) {
            Some(Ok(module)) => Some(module),
            Some(Err(e)) => {
                unsafe { device.destroy_shader_module(vertex_module, None) };
                return Err(e);
            }
            None => None,
        };
        let destroy_modules = || unsafe {
            device.destroy_shader_module(vertex_module, None);
            if let Some(module) = fragment_module {
                device.destroy_shader_module(module, None);
            }
        };

        let mut stages = vec![vk::PipelineShaderStageCreateInfo::default()
            .stage(vk::ShaderStageFlags::VERTEX)
            .module(vertex_module)
            .name(c"main")];
        if let Some(module) = fragment_module {
            stages.push(
                vk::PipelineShaderStageCreateInfo::default()
                    .stage(vk::ShaderStageFlags::FRAGMENT)
                    .module(module)
                    .name(c"main"),
            );
        }

        let bindings = [vk::VertexInputBindingDescription {
            binding: 0,
            stride: desc.vertex_layout.stride,
            input_rate: vk::VertexInputRate::VERTEX,
        }];
        let attributes: Vec<vk::VertexInputAttributeDescription> = desc
            .vertex_layout
            .attributes
            .iter()
            .map(|attribute| vk::VertexInputAttributeDescription {
                location: attribute.location,
                binding: 0,
                format: buffer_format_to_vk(attribute.format),
                offset: attribute.offset,
            })
            .collect();
        let vertex_input_state = vk::PipelineVertexInputStateCreateInfo::default()
            .vertex_binding_descriptions(&bindings)
            .vertex_attribute_descriptions(&attributes);

        let input_assembly_state = vk::PipelineInputAssemblyStateCreateInfo::default()
            .topology(vk::PrimitiveTopology::TRIANGLE_LIST)
            .primitive_restart_enable(false);

        // Viewport and scissor are dynamic
        let viewports = [vk::Viewport::default()];
        let scissors = [vk::Rect2D::default()];
        let viewport_state = vk::PipelineViewportStateCreateInfo::default()
            .viewports(&viewports)
            .scissors(&scissors);

        let rasterization_state = vk::PipelineRasterizationStateCreateInfo::default()
            .depth_clamp_enable(false)
            .rasterizer_discard_enable(false)
            .polygon_mode(vk::PolygonMode::FILL)
            .line_width(1.0)
            .cull_mode(cull_mode_to_vk(desc.cull_mode))
            .front_face(vk::FrontFace::COUNTER_CLOCKWISE)
            .depth_bias_enable(false);

        let depth_stencil_state = vk::PipelineDepthStencilStateCreateInfo::default()
            .depth_test_enable(desc.depth_test)
            .depth_write_enable(desc.depth_test)
            .depth_compare_op(vk::CompareOp::LESS)
            .depth_bounds_test_enable(false)
            .stencil_test_enable(false);

        let samples = render_pass
            .desc()
            .color_attachments
            .first()
            .or(render_pass.desc().depth_attachment.as_ref())
            .map_or(1, |attachment| attachment.samples);
        let multisample_state = vk::PipelineMultisampleStateCreateInfo::default()
            .sample_shading_enable(false)
            .rasterization_samples(sample_count_to_vk(samples));

        let blend_attachments: Vec<vk::PipelineColorBlendAttachmentState> = render_pass
            .desc()
            .color_attachments
            .iter()
            .map(|_| {
                vk::PipelineColorBlendAttachmentState::default()
                    .color_write_mask(vk::ColorComponentFlags::RGBA)
                    .blend_enable(false)
            })
            .collect();
        let color_blend_state = vk::PipelineColorBlendStateCreateInfo::default()
            .logic_op_enable(false)
            .attachments(&blend_attachments);

        let dynamic_states = [vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR];
        let dynamic_state = vk::PipelineDynamicStateCreateInfo::default().dynamic_states(&dynamic_states);

        let set_layouts = [set_layout.layout];
        let layout_info = vk::PipelineLayoutCreateInfo::default().set_layouts(&set_layouts);
        let pipeline_layout = match unsafe { device.create_pipeline_layout(&layout_info, None) } {
            Ok(layout) => layout,
            Err(e) => {
                destroy_modules();
                engine_bail!(self.ctx.logger, SOURCE, "Failed to create pipeline layout: {:?}", e);
            }
        };

        let create_info = vk::GraphicsPipelineCreateInfo::default()
            .stages(&stages)
            .vertex_input_state(&vertex_input_state)
            .input_assembly_state(&input_assembly_state)
            .viewport_state(&viewport_state)
            .rasterization_state(&rasterization_state)
            .depth_stencil_state(&depth_stencil_state)
            .multisample_state(&multisample_state)
            .color_blend_state(&color_blend_state)
            .dynamic_state(&dynamic_state)
            .layout(pipeline_layout)
            .render_pass(render_pass.render_pass)
            .subpass(0);

        let result = unsafe { device.create_graphics_pipelines(vk::PipelineCache::null(), &[create_info], None) };
        destroy_modules();
        let pipeline = match result {
            Ok(pipelines) => pipelines[0],
            Err((_, e)) => {
                unsafe { device.destroy_pipeline_layout(pipeline_layout, None) };
                engine_bail!(self.ctx.logger, SOURCE, "Failed to create {} pipeline: {:?}", desc.kind, e);
            }
        };

        engine_debug!(self.ctx.logger, SOURCE, "Created {} pipeline", desc.kind);
        Ok(Arc::new(Pipeline::new(
            Arc::clone(&self.ctx),
            pipeline,
            pipeline_layout,
            desc.kind,
            desc.descriptor_set_layout.clone(),
        )))
    }

    fn wait_idle(&self) -> Result<()> {
        self.ctx.wait_idle()
    }
}

impl Drop for VulkanGraphicsDevice {
    fn drop(&mut self) {
        // Objects still alive keep the context (and the device) around
        if let Err(e) = self.ctx.wait_idle() {
            engine_warn!(self.ctx.logger, SOURCE, "wait_idle failed while dropping the device: {}", e);
        }
    }
}
