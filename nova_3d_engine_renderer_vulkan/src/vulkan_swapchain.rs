/// VulkanPresenter - Vulkan implementation of the engine PresentationDevice
///
/// Owns the window surface, the VkSwapchainKHR and the present queue side
/// of presentation. The acquire/record/present state machine lives in the
/// core `Swapchain`; this type only forwards to the driver.

use nova_3d_engine::nova3d::{Error, Result};
use nova_3d_engine::nova3d::render::{
    CommandList as EngineCommandList, PipelineStage, PresentMode, PresentationDevice,
    RenderTarget as EngineRenderTarget, Semaphore as EngineSemaphore, SurfaceCapabilities, SwapchainDesc,
    TextureFormat,
};
use nova_3d_engine::{engine_bail, engine_debug, engine_err, engine_warn};
use ash::vk;
use std::any::Any;
use std::sync::Arc;

use crate::vulkan_command_list::CommandList;
use crate::vulkan_context::{vulkan_object, GpuContext};
use crate::vulkan_format::{
    choose_composite_alpha, choose_surface_format, extent_to_vk, pipeline_stage_to_vk, present_mode_from_vk,
    present_mode_to_vk, surface_capabilities_from_vk, surface_transform_to_vk, texture_format_from_vk,
    texture_format_to_vk,
};
use crate::vulkan_render_target::RenderTarget;

const SOURCE: &str = "nova3d::vulkan::Presenter";

// ============================================================================
// SEMAPHORE
// ============================================================================

pub struct Semaphore {
    ctx: Arc<GpuContext>,
    pub(crate) semaphore: vk::Semaphore,
}

impl EngineSemaphore for Semaphore {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for Semaphore {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_semaphore(self.semaphore, None);
        }
    }
}

// ============================================================================
// PRESENTER
// ============================================================================

pub struct VulkanPresenter {
    ctx: Arc<GpuContext>,
    surface: vk::SurfaceKHR,
    surface_loader: ash::khr::surface::Instance,
    surface_format: vk::SurfaceFormatKHR,
    engine_format: TextureFormat,
    swapchain_loader: ash::khr::swapchain::Device,
    /// Null until `create_swapchain`
    swapchain: vk::SwapchainKHR,
}

impl VulkanPresenter {
    /// Take ownership of `surface`, created from the window by the device
    pub(crate) fn new(ctx: Arc<GpuContext>, surface: vk::SurfaceKHR) -> Result<Self> {
        let surface_loader = ash::khr::surface::Instance::new(&ctx.entry, &ctx.instance);

        let supported = unsafe {
            surface_loader.get_physical_device_surface_support(ctx.physical_device, ctx.present_queue_family, surface)
        }
        .unwrap_or(false);
        if !supported {
            unsafe { surface_loader.destroy_surface(surface, None) };
            return Err(Error::InitializationFailed(format!(
                "queue family {} cannot present to this window",
                ctx.present_queue_family
            )));
        }

        let formats = match unsafe {
            surface_loader.get_physical_device_surface_formats(ctx.physical_device, surface)
        } {
            Ok(formats) => formats,
            Err(e) => {
                unsafe { surface_loader.destroy_surface(surface, None) };
                return Err(engine_err!(ctx.logger, SOURCE, "Failed to query surface formats: {:?}", e));
            }
        };
        let chosen = choose_surface_format(&formats).and_then(|format| {
            texture_format_from_vk(format.format).map(|engine_format| (format, engine_format))
        });
        let (surface_format, engine_format) = match chosen {
            Some(chosen) => chosen,
            None => {
                unsafe { surface_loader.destroy_surface(surface, None) };
                return Err(Error::InitializationFailed(format!(
                    "no supported surface format among {:?}",
                    formats.iter().map(|f| f.format).collect::<Vec<_>>()
                )));
            }
        };

        let swapchain_loader = ash::khr::swapchain::Device::new(&ctx.instance, &ctx.device);
        engine_debug!(ctx.logger, SOURCE, "Surface format {:?} ({:?})", surface_format.format, surface_format.color_space);

        Ok(Self {
            ctx,
            surface,
            surface_loader,
            surface_format,
            engine_format,
            swapchain_loader,
            swapchain: vk::SwapchainKHR::null(),
        })
    }

    fn create_image_view(&self, image: vk::Image) -> Result<vk::ImageView> {
        let create_info = vk::ImageViewCreateInfo::default()
            .image(image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(self.surface_format.format)
            .components(vk::ComponentMapping {
                r: vk::ComponentSwizzle::IDENTITY,
                g: vk::ComponentSwizzle::IDENTITY,
                b: vk::ComponentSwizzle::IDENTITY,
                a: vk::ComponentSwizzle::IDENTITY,
            })
            .subresource_range(vk::ImageSubresourceRange {
                aspect_mask: vk::ImageAspectFlags::COLOR,
                base_mip_level: 0,
                level_count: 1,
                base_array_layer: 0,
                layer_count: 1,
            });
        unsafe { self.ctx.device.create_image_view(&create_info, None) }
            .map_err(|e| engine_err!(self.ctx.logger, SOURCE, "Failed to create swapchain image view: {:?}", e))
    }
}

impl PresentationDevice for VulkanPresenter {
    fn surface_capabilities(&self) -> Result<SurfaceCapabilities> {
        let caps = unsafe {
            self.surface_loader
                .get_physical_device_surface_capabilities(self.ctx.physical_device, self.surface)
        }
        .map_err(|e| engine_err!(self.ctx.logger, SOURCE, "Failed to get surface capabilities: {:?}", e))?;
        Ok(surface_capabilities_from_vk(&caps))
    }

    fn surface_present_modes(&self) -> Result<Vec<PresentMode>> {
        let modes = unsafe {
            self.surface_loader
                .get_physical_device_surface_present_modes(self.ctx.physical_device, self.surface)
        }
        .map_err(|e| engine_err!(self.ctx.logger, SOURCE, "Failed to get surface present modes: {:?}", e))?;
        Ok(modes.into_iter().filter_map(present_mode_from_vk).collect())
    }

    fn surface_format(&self) -> TextureFormat {
        self.engine_format
    }

    fn create_swapchain(&mut self, desc: &SwapchainDesc) -> Result<Vec<Arc<dyn EngineRenderTarget>>> {
        if desc.format != self.engine_format {
            engine_bail!(
                self.ctx.logger,
                SOURCE,
                "Swapchain format {:?} differs from the surface format {:?}",
                desc.format,
                self.engine_format
            );
        }
        debug_assert_eq!(texture_format_to_vk(desc.format), self.surface_format.format);

        let caps = unsafe {
            self.surface_loader
                .get_physical_device_surface_capabilities(self.ctx.physical_device, self.surface)
        }
        .map_err(|e| engine_err!(self.ctx.logger, SOURCE, "Failed to get surface capabilities: {:?}", e))?;

        let families = [self.ctx.graphics_queue_family, self.ctx.present_queue_family];
        let old_swapchain = self.swapchain;
        let mut create_info = vk::SwapchainCreateInfoKHR::default()
            .surface(self.surface)
            .min_image_count(desc.image_count)
            .image_format(self.surface_format.format)
            .image_color_space(self.surface_format.color_space)
            .image_extent(extent_to_vk(desc.extent))
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .pre_transform(surface_transform_to_vk(desc.pre_transform))
            .composite_alpha(choose_composite_alpha(caps.supported_composite_alpha))
            .present_mode(present_mode_to_vk(desc.present_mode))
            .clipped(true)
            .old_swapchain(old_swapchain);
        create_info = if families[0] == families[1] {
            create_info.image_sharing_mode(vk::SharingMode::EXCLUSIVE)
        } else {
            create_info
                .image_sharing_mode(vk::SharingMode::CONCURRENT)
                .queue_family_indices(&families)
        };

        let swapchain = unsafe { self.swapchain_loader.create_swapchain(&create_info, None) }
            .map_err(|e| engine_err!(self.ctx.logger, SOURCE, "Failed to create swapchain: {:?}", e))?;
        if old_swapchain != vk::SwapchainKHR::null() {
            unsafe { self.swapchain_loader.destroy_swapchain(old_swapchain, None) };
        }
        self.swapchain = swapchain;

        let images = unsafe { self.swapchain_loader.get_swapchain_images(swapchain) }
            .map_err(|e| engine_err!(self.ctx.logger, SOURCE, "Failed to get swapchain images: {:?}", e))?;

        let mut targets: Vec<Arc<dyn EngineRenderTarget>> = Vec::with_capacity(images.len());
        for image in images {
            let view = self.create_image_view(image)?;
            targets.push(Arc::new(RenderTarget::swapchain_image(
                Arc::clone(&self.ctx),
                desc.extent.width,
                desc.extent.height,
                desc.format,
                view,
            )));
        }

        engine_debug!(
            self.ctx.logger,
            SOURCE,
            "Swapchain created: {} images, {}x{}, {:?}",
            targets.len(),
            desc.extent.width,
            desc.extent.height,
            desc.present_mode
        );
        Ok(targets)
    }

    fn destroy_swapchain(&mut self) {
        if self.swapchain != vk::SwapchainKHR::null() {
            unsafe { self.swapchain_loader.destroy_swapchain(self.swapchain, None) };
            self.swapchain = vk::SwapchainKHR::null();
        }
    }

    fn create_semaphore(&self) -> Result<Box<dyn EngineSemaphore>> {
        let semaphore = unsafe {
            self.ctx
                .device
                .create_semaphore(&vk::SemaphoreCreateInfo::default(), None)
        }
        .map_err(|e| engine_err!(self.ctx.logger, SOURCE, "Failed to create semaphore: {:?}", e))?;
        Ok(Box::new(Semaphore {
            ctx: Arc::clone(&self.ctx),
            semaphore,
        }))
    }

    fn acquire_next_image(&mut self, signal: &dyn EngineSemaphore) -> Result<u32> {
        if self.swapchain == vk::SwapchainKHR::null() {
            return Err(Error::InvalidState("no swapchain to acquire from".to_string()));
        }
        let signal = vulkan_object::<Semaphore>(signal.as_any(), "semaphore")?;
        let (index, suboptimal) = unsafe {
            self.swapchain_loader
                .acquire_next_image(self.swapchain, u64::MAX, signal.semaphore, vk::Fence::null())
        }
        .map_err(|e| {
            if e == vk::Result::ERROR_OUT_OF_DATE_KHR {
                engine_err!(self.ctx.logger, SOURCE, "Swapchain out of date during acquire")
            } else {
                engine_err!(self.ctx.logger, SOURCE, "Failed to acquire next swapchain image: {:?}", e)
            }
        })?;
        if suboptimal {
            engine_warn!(self.ctx.logger, SOURCE, "Swapchain is suboptimal for the surface");
        }
        Ok(index)
    }

    fn submit(
        &self,
        primary: &dyn EngineCommandList,
        wait: &dyn EngineSemaphore,
        wait_stage: PipelineStage,
        signal: &dyn EngineSemaphore,
    ) -> Result<()> {
        let primary = vulkan_object::<CommandList>(primary.as_any(), "command list")?;
        let wait = vulkan_object::<Semaphore>(wait.as_any(), "wait semaphore")?;
        let signal = vulkan_object::<Semaphore>(signal.as_any(), "signal semaphore")?;

        let wait_semaphores = [wait.semaphore];
        let wait_stages = [pipeline_stage_to_vk(wait_stage)];
        let command_buffers = [primary.command_buffer()];
        let signal_semaphores = [signal.semaphore];
        let submit_info = vk::SubmitInfo::default()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores);

        unsafe {
            self.ctx
                .device
                .queue_submit(self.ctx.graphics_queue, &[submit_info], vk::Fence::null())
        }
        .map_err(|e| engine_err!(self.ctx.logger, SOURCE, "Failed to submit frame to the graphics queue: {:?}", e))
    }

    fn present(&mut self, image_index: u32, wait: &dyn EngineSemaphore) -> Result<()> {
        let wait = vulkan_object::<Semaphore>(wait.as_any(), "wait semaphore")?;
        let wait_semaphores = [wait.semaphore];
        let swapchains = [self.swapchain];
        let image_indices = [image_index];
        let present_info = vk::PresentInfoKHR::default()
            .wait_semaphores(&wait_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        let suboptimal = unsafe { self.swapchain_loader.queue_present(self.ctx.present_queue, &present_info) }
            .map_err(|e| engine_err!(self.ctx.logger, SOURCE, "Failed to present image {}: {:?}", image_index, e))?;
        if suboptimal {
            engine_warn!(self.ctx.logger, SOURCE, "Presented to a suboptimal swapchain");
        }
        Ok(())
    }

    fn wait_idle(&self) -> Result<()> {
        unsafe { self.ctx.device.queue_wait_idle(self.ctx.present_queue) }
            .map_err(|e| engine_err!(self.ctx.logger, SOURCE, "Failed to wait for the present queue: {:?}", e))
    }
}

impl Drop for VulkanPresenter {
    fn drop(&mut self) {
        self.destroy_swapchain();
        unsafe {
            self.surface_loader.destroy_surface(self.surface, None);
        }
    }
}
