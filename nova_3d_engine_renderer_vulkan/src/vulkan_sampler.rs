/// Sampler - the VkSampler shared by every texture of a device

use nova_3d_engine::nova3d::Result;
use nova_3d_engine::engine_err;
use ash::vk;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;

/// Linear filtering, repeat addressing, anisotropic when the GPU allows it
pub struct Sampler {
    ctx: Arc<GpuContext>,
    pub(crate) sampler: vk::Sampler,
}

impl Sampler {
    /// `max_anisotropy` of `None` disables anisotropic filtering
    pub(crate) fn linear_repeat(ctx: Arc<GpuContext>, max_anisotropy: Option<f32>) -> Result<Self> {
        let mut create_info = vk::SamplerCreateInfo::default()
            .mag_filter(vk::Filter::LINEAR)
            .min_filter(vk::Filter::LINEAR)
            .mipmap_mode(vk::SamplerMipmapMode::LINEAR)
            .address_mode_u(vk::SamplerAddressMode::REPEAT)
            .address_mode_v(vk::SamplerAddressMode::REPEAT)
            .address_mode_w(vk::SamplerAddressMode::REPEAT)
            .mip_lod_bias(0.0)
            .min_lod(0.0)
            .max_lod(vk::LOD_CLAMP_NONE)
            .border_color(vk::BorderColor::INT_OPAQUE_BLACK)
            .compare_enable(false)
            .compare_op(vk::CompareOp::ALWAYS)
            .unnormalized_coordinates(false);

        create_info = match max_anisotropy {
            Some(max) => create_info.anisotropy_enable(true).max_anisotropy(max),
            None => create_info.anisotropy_enable(false).max_anisotropy(1.0),
        };

        let sampler = unsafe { ctx.device.create_sampler(&create_info, None) }
            .map_err(|e| engine_err!(ctx.logger, "nova3d::vulkan", "Failed to create sampler: {:?}", e))?;
        Ok(Self { ctx, sampler })
    }
}

impl Drop for Sampler {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_sampler(self.sampler, None);
        }
    }
}
