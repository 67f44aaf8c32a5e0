/// DescriptorSetLayout / DescriptorSet - Vulkan implementations
///
/// Every set gets a pool sized for exactly one set of its layout; dropping
/// the set destroys the pool, which frees the set.

use nova_3d_engine::nova3d::{Error, Result};
use nova_3d_engine::nova3d::render::{
    DescriptorResource, DescriptorSet as EngineDescriptorSet, DescriptorSetLayout as EngineDescriptorSetLayout,
    DescriptorSetLayoutDesc, DescriptorType, DescriptorWrite,
};
use nova_3d_engine::engine_err;
use ash::vk;
use std::any::Any;
use std::sync::Arc;

use crate::vulkan_buffer::Buffer;
use crate::vulkan_context::{vulkan_object, GpuContext};
use crate::vulkan_format::{descriptor_type_to_vk, shader_stages_to_vk};
use crate::vulkan_texture::Texture;

const SOURCE: &str = "nova3d::vulkan::DescriptorSet";

// ============================================================================
// LAYOUT
// ============================================================================

pub struct DescriptorSetLayout {
    ctx: Arc<GpuContext>,
    pub(crate) layout: vk::DescriptorSetLayout,
    desc: DescriptorSetLayoutDesc,
}

impl DescriptorSetLayout {
    pub(crate) fn new(ctx: Arc<GpuContext>, desc: &DescriptorSetLayoutDesc) -> Result<Self> {
        let bindings: Vec<vk::DescriptorSetLayoutBinding> = desc
            .bindings
            .iter()
            .map(|binding| {
                vk::DescriptorSetLayoutBinding::default()
                    .binding(binding.binding)
                    .descriptor_type(descriptor_type_to_vk(binding.descriptor_type))
                    .descriptor_count(1)
                    .stage_flags(shader_stages_to_vk(binding.stages))
            })
            .collect();
        let create_info = vk::DescriptorSetLayoutCreateInfo::default().bindings(&bindings);

        let layout = unsafe { ctx.device.create_descriptor_set_layout(&create_info, None) }
            .map_err(|e| engine_err!(ctx.logger, SOURCE, "Failed to create descriptor set layout: {:?}", e))?;

        Ok(Self {
            ctx,
            layout,
            desc: desc.clone(),
        })
    }

    /// Pool sizes holding exactly one set of this layout
    fn pool_sizes(&self) -> Vec<vk::DescriptorPoolSize> {
        [DescriptorType::UniformBuffer, DescriptorType::CombinedImageSampler]
            .into_iter()
            .filter_map(|ty| {
                let count = self.desc.bindings.iter().filter(|b| b.descriptor_type == ty).count() as u32;
                (count > 0).then(|| vk::DescriptorPoolSize {
                    ty: descriptor_type_to_vk(ty),
                    descriptor_count: count,
                })
            })
            .collect()
    }
}

impl EngineDescriptorSetLayout for DescriptorSetLayout {
    fn desc(&self) -> &DescriptorSetLayoutDesc {
        &self.desc
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for DescriptorSetLayout {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_descriptor_set_layout(self.layout, None);
        }
    }
}

// ============================================================================
// SET
// ============================================================================

pub struct DescriptorSet {
    ctx: Arc<GpuContext>,
    pool: vk::DescriptorPool,
    pub(crate) set: vk::DescriptorSet,
    layout: Arc<dyn EngineDescriptorSetLayout>,
    /// Resources the set currently points at, by slot
    bound: Vec<(u32, DescriptorResource)>,
}

impl DescriptorSet {
    pub(crate) fn new(ctx: Arc<GpuContext>, layout: &Arc<dyn EngineDescriptorSetLayout>) -> Result<Self> {
        let vk_layout = vulkan_object::<DescriptorSetLayout>(layout.as_any(), "descriptor set layout")?;

        let pool_sizes = vk_layout.pool_sizes();
        let pool_info = vk::DescriptorPoolCreateInfo::default()
            .pool_sizes(&pool_sizes)
            .max_sets(1);
        let pool = unsafe { ctx.device.create_descriptor_pool(&pool_info, None) }
            .map_err(|e| engine_err!(ctx.logger, SOURCE, "Failed to create descriptor pool: {:?}", e))?;

        let set_layouts = [vk_layout.layout];
        let alloc_info = vk::DescriptorSetAllocateInfo::default()
            .descriptor_pool(pool)
            .set_layouts(&set_layouts);
        let set = match unsafe { ctx.device.allocate_descriptor_sets(&alloc_info) } {
            Ok(sets) => sets[0],
            Err(e) => {
                unsafe { ctx.device.destroy_descriptor_pool(pool, None) };
                return Err(engine_err!(ctx.logger, SOURCE, "Failed to allocate descriptor set: {:?}", e));
            }
        };

        Ok(Self {
            ctx,
            pool,
            set,
            layout: layout.clone(),
            bound: Vec::new(),
        })
    }
}

/// Where the info of one write lives while the writes are built
enum WriteInfo {
    Buffer(usize),
    Image(usize),
}

impl EngineDescriptorSet for DescriptorSet {
    fn layout(&self) -> &Arc<dyn EngineDescriptorSetLayout> {
        &self.layout
    }

    fn update(&mut self, writes: &[DescriptorWrite]) -> Result<()> {
        let mut buffer_infos = Vec::new();
        let mut image_infos = Vec::new();
        let mut slots = Vec::with_capacity(writes.len());

        for write in writes {
            let binding = self.layout.desc().binding(write.binding).ok_or_else(|| {
                Error::InvalidResource(format!("descriptor slot {} is not in the layout", write.binding))
            })?;
            if binding.descriptor_type != write.resource.descriptor_type() {
                return Err(Error::InvalidResource(format!(
                    "descriptor slot {} expects {:?}, got {:?}",
                    write.binding,
                    binding.descriptor_type,
                    write.resource.descriptor_type()
                )));
            }
            match &write.resource {
                DescriptorResource::UniformBuffer(info) => {
                    let buffer = vulkan_object::<Buffer>(info.buffer.as_any(), "uniform buffer")?;
                    buffer_infos.push(vk::DescriptorBufferInfo {
                        buffer: buffer.buffer,
                        offset: info.offset,
                        range: info.range,
                    });
                    slots.push((write.binding, WriteInfo::Buffer(buffer_infos.len() - 1)));
                }
                DescriptorResource::CombinedImageSampler(texture) => {
                    let texture = vulkan_object::<Texture>(texture.as_any(), "texture")?;
                    image_infos.push(vk::DescriptorImageInfo {
                        sampler: texture.sampler.sampler,
                        image_view: texture.view,
                        image_layout: vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
                    });
                    slots.push((write.binding, WriteInfo::Image(image_infos.len() - 1)));
                }
            }
        }

        let vk_writes: Vec<vk::WriteDescriptorSet> = slots
            .iter()
            .map(|(binding, info)| {
                let write = vk::WriteDescriptorSet::default()
                    .dst_set(self.set)
                    .dst_binding(*binding)
                    .dst_array_element(0);
                match info {
                    WriteInfo::Buffer(i) => write
                        .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                        .buffer_info(std::slice::from_ref(&buffer_infos[*i])),
                    WriteInfo::Image(i) => write
                        .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
                        .image_info(std::slice::from_ref(&image_infos[*i])),
                }
            })
            .collect();

        unsafe {
            self.ctx.device.update_descriptor_sets(&vk_writes, &[]);
        }

        // Keep every written resource alive while the set points at it
        for write in writes {
            match self.bound.iter_mut().find(|(slot, _)| *slot == write.binding) {
                Some(entry) => entry.1 = write.resource.clone(),
                None => self.bound.push((write.binding, write.resource.clone())),
            }
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for DescriptorSet {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_descriptor_pool(self.pool, None);
        }
    }
}
