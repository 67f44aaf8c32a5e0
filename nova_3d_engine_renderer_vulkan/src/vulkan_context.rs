/// GpuContext - Vulkan objects shared by every resource of a device
///
/// Each buffer, texture, pipeline, command list and presenter holds an
/// `Arc<GpuContext>`, so the device and instance are destroyed only after
/// the last object created from them.

use nova_3d_engine::nova3d::{Error, Result};
use nova_3d_engine::nova3d::log::LogSink;
use nova_3d_engine::{engine_err, engine_error, engine_warn};
use ash::vk;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme, Allocator};
use gpu_allocator::MemoryLocation;
use std::any::Any;
use std::mem::ManuallyDrop;
use std::sync::Mutex;

const SOURCE: &str = "nova3d::vulkan";

/// Debug messenger and the sink its callback writes to
pub(crate) struct DebugMessenger {
    pub loader: ash::ext::debug_utils::Instance,
    pub messenger: vk::DebugUtilsMessengerEXT,
    /// Passed to the callback as user data; must outlive `messenger`
    pub sink: Box<LogSink>,
}

/// Shared Vulkan state
pub struct GpuContext {
    pub(crate) device: ash::Device,

    /// Dropped by hand, before the device
    allocator: ManuallyDrop<Mutex<Allocator>>,

    pub(crate) physical_device: vk::PhysicalDevice,
    pub(crate) graphics_queue: vk::Queue,
    pub(crate) graphics_queue_family: u32,
    pub(crate) present_queue: vk::Queue,
    pub(crate) present_queue_family: u32,

    pub(crate) logger: LogSink,

    pub(crate) instance: ash::Instance,
    pub(crate) entry: ash::Entry,
    debug: Option<DebugMessenger>,
}

impl GpuContext {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        entry: ash::Entry,
        instance: ash::Instance,
        debug: Option<DebugMessenger>,
        physical_device: vk::PhysicalDevice,
        device: ash::Device,
        allocator: Allocator,
        graphics_queue_family: u32,
        present_queue_family: u32,
        logger: LogSink,
    ) -> Self {
        let (graphics_queue, present_queue) = unsafe {
            (
                device.get_device_queue(graphics_queue_family, 0),
                device.get_device_queue(present_queue_family, 0),
            )
        };
        Self {
            device,
            allocator: ManuallyDrop::new(Mutex::new(allocator)),
            physical_device,
            graphics_queue,
            graphics_queue_family,
            present_queue,
            present_queue_family,
            logger,
            instance,
            entry,
            debug,
        }
    }

    /// Allocate memory for `requirements` at `location`
    pub(crate) fn allocate(
        &self,
        name: &str,
        requirements: vk::MemoryRequirements,
        location: MemoryLocation,
        linear: bool,
    ) -> Result<Allocation> {
        let mut allocator = self
            .allocator
            .lock()
            .map_err(|_| engine_err!(self.logger, SOURCE, "GPU allocator mutex poisoned"))?;
        allocator
            .allocate(&AllocationCreateDesc {
                name,
                requirements,
                location,
                linear,
                allocation_scheme: AllocationScheme::GpuAllocatorManaged,
            })
            .map_err(|e| {
                let size_mb = requirements.size as f64 / (1024.0 * 1024.0);
                engine_error!(
                    self.logger,
                    SOURCE,
                    "Out of GPU memory for {} (required: {:.2} MB): {:?}",
                    name,
                    size_mb,
                    e
                );
                Error::OutOfMemory
            })
    }

    /// Return an allocation to the allocator
    ///
    /// Never fails loudly: called from `Drop` impls.
    pub(crate) fn free(&self, allocation: Allocation) {
        if let Ok(mut allocator) = self.allocator.lock() {
            if let Err(e) = allocator.free(allocation) {
                engine_warn!(self.logger, SOURCE, "Failed to free GPU allocation: {:?}", e);
            }
        }
    }

    /// Block until the device has no work in flight
    pub(crate) fn wait_idle(&self) -> Result<()> {
        unsafe { self.device.device_wait_idle() }
            .map_err(|e| engine_err!(self.logger, SOURCE, "vkDeviceWaitIdle failed: {:?}", e))
    }
}

impl Drop for GpuContext {
    fn drop(&mut self) {
        unsafe {
            self.device.device_wait_idle().ok();

            // Allocator pages are freed while the device still exists
            ManuallyDrop::drop(&mut self.allocator);
            self.device.destroy_device(None);

            if let Some(debug) = self.debug.take() {
                debug.loader.destroy_debug_utils_messenger(debug.messenger, None);
            }
            self.instance.destroy_instance(None);
        }
    }
}

/// Downcast an engine trait object to the Vulkan type behind it
pub(crate) fn vulkan_object<'a, T: 'static>(object: &'a dyn Any, what: &str) -> Result<&'a T> {
    object
        .downcast_ref::<T>()
        .ok_or_else(|| Error::InvalidResource(format!("{} was not created by the Vulkan device", what)))
}
